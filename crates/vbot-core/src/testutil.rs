//! Hand-written port fakes shared by the core's test modules.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    dialog::FreeInput,
    domain::{Admin, Candidate, ChatId, MessageId, MessageRef, UserId, Vacancy, VacancyId},
    messaging::{port::MessagingPort, types::InlineKeyboard},
    ports::{EmailPort, OutboundEmail, StorePort},
    Error, Result,
};

pub fn free_text(user_id: UserId, chat_id: ChatId, text: &str) -> FreeInput {
    FreeInput {
        chat_id,
        user_id,
        username: Some("candidateuser".to_string()),
        text: Some(text.to_string()),
        attachment: None,
    }
}

#[derive(Default)]
struct MemoryInner {
    admins: Vec<Admin>,
    vacancies: Vec<Vacancy>,
    candidates: Vec<Candidate>,
    next_vacancy_id: i32,
    next_candidate_id: i32,
}

/// In-memory store with optional read-failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Store("injected read failure".to_string()));
        }
        Ok(())
    }

    pub async fn add_admin(&self, admin: Admin) {
        self.inner.lock().unwrap().admins.push(admin);
    }

    pub async fn add_vacancy(&self, title: &str) -> VacancyId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_vacancy_id += 1;
        let id = VacancyId(inner.next_vacancy_id);
        inner.vacancies.push(Vacancy {
            id,
            title: title.to_string(),
            description: String::new(),
            requirements: String::new(),
            image_path: None,
            created_at: Utc::now(),
        });
        id
    }

    pub async fn add_candidate(&self, vacancy_id: VacancyId, name: &str, username: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_candidate_id += 1;
        let id = inner.next_candidate_id;
        inner.candidates.push(Candidate {
            id,
            user_id: UserId(id as i64),
            username: username.map(|u| u.to_string()),
            full_name: name.to_string(),
            phone_number: "+380501234567".to_string(),
            work_experience: "досвід".to_string(),
            email: None,
            resume_path: None,
            vacancy_id,
            applied_at: Utc::now(),
        });
    }
}

#[async_trait]
impl StorePort for MemoryStore {
    async fn is_admin(&self, user_id: UserId) -> Result<bool> {
        self.check_reads()?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .admins
            .iter()
            .any(|a| a.user_id == user_id))
    }

    async fn admins(&self) -> Result<Vec<Admin>> {
        self.check_reads()?;
        Ok(self.inner.lock().unwrap().admins.clone())
    }

    async fn vacancies(&self) -> Result<Vec<Vacancy>> {
        self.check_reads()?;
        Ok(self.inner.lock().unwrap().vacancies.clone())
    }

    async fn vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>> {
        self.check_reads()?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .vacancies
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn save_vacancy(&self, mut vacancy: Vacancy) -> Result<Vacancy> {
        let mut inner = self.inner.lock().unwrap();
        if vacancy.id.0 == 0 {
            inner.next_vacancy_id += 1;
            vacancy.id = VacancyId(inner.next_vacancy_id);
            inner.vacancies.push(vacancy.clone());
        } else if let Some(slot) = inner.vacancies.iter_mut().find(|v| v.id == vacancy.id) {
            *slot = vacancy.clone();
        } else {
            inner.vacancies.push(vacancy.clone());
        }
        Ok(vacancy)
    }

    async fn delete_vacancy(&self, id: VacancyId) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.vacancies.len();
        inner.vacancies.retain(|v| v.id != id);
        Ok(inner.vacancies.len() < before)
    }

    async fn save_candidate(&self, mut candidate: Candidate) -> Result<Candidate> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_candidate_id += 1;
        candidate.id = inner.next_candidate_id;
        inner.candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn candidates_by_vacancy(&self, id: VacancyId) -> Result<Vec<Candidate>> {
        self.check_reads()?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .candidates
            .iter()
            .filter(|c| c.vacancy_id == id)
            .cloned()
            .collect())
    }

    async fn upsert_admin(&self, admin: Admin) -> Result<Admin> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(slot) = inner.admins.iter_mut().find(|a| a.user_id == admin.user_id) {
            *slot = admin.clone();
        } else {
            inner.admins.push(admin.clone());
        }
        Ok(admin)
    }
}

/// Recording messenger with per-chat and per-channel failure injection.
#[derive(Default)]
pub struct FakeMessenger {
    next_id: AtomicI32,
    texts: Mutex<Vec<(i64, String)>>,
    keyboards: Mutex<Vec<(i64, String, InlineKeyboard)>>,
    photos: Mutex<Vec<(i64, String)>>,
    documents: Mutex<Vec<(i64, String)>>,
    downloaded: Mutex<Vec<String>>,
    failing_chats: Mutex<HashSet<i64>>,
    fail_photos: AtomicBool,
}

impl FakeMessenger {
    pub fn texts(&self) -> Vec<(i64, String)> {
        self.texts.lock().unwrap().clone()
    }

    pub fn keyboards(&self) -> Vec<(i64, String, InlineKeyboard)> {
        self.keyboards.lock().unwrap().clone()
    }

    pub fn photos(&self) -> Vec<(i64, String)> {
        self.photos.lock().unwrap().clone()
    }

    pub fn documents(&self) -> Vec<(i64, String)> {
        self.documents.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }

    pub fn fail_chat(&self, chat_id: ChatId) {
        self.failing_chats.lock().unwrap().insert(chat_id.0);
    }

    pub fn fail_photos(&self, fail: bool) {
        self.fail_photos.store(fail, Ordering::SeqCst);
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)),
        }
    }

    fn check_chat(&self, chat_id: ChatId) -> Result<()> {
        if self.failing_chats.lock().unwrap().contains(&chat_id.0) {
            return Err(Error::External("injected send failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.check_chat(chat_id)?;
        self.texts
            .lock()
            .unwrap()
            .push((chat_id.0, text.to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.check_chat(chat_id)?;
        self.texts
            .lock()
            .unwrap()
            .push((chat_id.0, html.to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        path: &Path,
        _caption: Option<&str>,
        _keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.check_chat(chat_id)?;
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(Error::External("injected photo failure".to_string()));
        }
        self.photos
            .lock()
            .unwrap()
            .push((chat_id.0, path.to_string_lossy().to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        _caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.check_chat(chat_id)?;
        self.documents
            .lock()
            .unwrap()
            .push((chat_id.0, path.to_string_lossy().to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.check_chat(chat_id)?;
        self.keyboards
            .lock()
            .unwrap()
            .push((chat_id.0, text.to_string(), keyboard));
        Ok(self.alloc(chat_id))
    }

    async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn download_file(&self, file_id: &str, _dest: &Path) -> Result<()> {
        self.downloaded.lock().unwrap().push(file_id.to_string());
        Ok(())
    }
}

/// Mailer that records outbound mail and can be told to fail.
#[derive(Default)]
pub struct CountingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: AtomicBool,
}

impl CountingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailPort for CountingMailer {
    async fn send(&self, mail: OutboundEmail) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::External("injected mail failure".to_string()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}
