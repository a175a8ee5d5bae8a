//! JSON-file store adapter.
//!
//! One document on disk holds admins, vacancies and candidates; every
//! mutation rewrites the file through a temp-file rename. Suitable for the
//! single-process bot this backs; the core only sees `StorePort`.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use vbot_core::{
    domain::{Admin, Candidate, UserId, Vacancy, VacancyId},
    ports::StorePort,
    Error, Result,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    admins: Vec<Admin>,
    vacancies: Vec<Vacancy>,
    candidates: Vec<Candidate>,
    next_vacancy_id: i32,
    next_candidate_id: i32,
    next_admin_id: i32,
}

pub struct JsonStore {
    path: PathBuf,
    doc: Mutex<StoreDocument>,
}

impl JsonStore {
    /// Load the document at `path`, starting empty when the file does not
    /// exist yet.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let doc = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(err) => return Err(Error::Io(err)),
        };

        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    async fn persist(&self, doc: &StoreDocument) -> Result<()> {
        let contents = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorePort for JsonStore {
    async fn is_admin(&self, user_id: UserId) -> Result<bool> {
        Ok(self
            .doc
            .lock()
            .await
            .admins
            .iter()
            .any(|a| a.user_id == user_id))
    }

    async fn admins(&self) -> Result<Vec<Admin>> {
        Ok(self.doc.lock().await.admins.clone())
    }

    async fn vacancies(&self) -> Result<Vec<Vacancy>> {
        Ok(self.doc.lock().await.vacancies.clone())
    }

    async fn vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>> {
        Ok(self
            .doc
            .lock()
            .await
            .vacancies
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn save_vacancy(&self, mut vacancy: Vacancy) -> Result<Vacancy> {
        let mut doc = self.doc.lock().await;
        if vacancy.id.0 == 0 {
            doc.next_vacancy_id += 1;
            vacancy.id = VacancyId(doc.next_vacancy_id);
            doc.vacancies.push(vacancy.clone());
        } else if let Some(slot) = doc.vacancies.iter_mut().find(|v| v.id == vacancy.id) {
            *slot = vacancy.clone();
        } else {
            return Err(Error::NotFound(format!("vacancy {}", vacancy.id.0)));
        }
        self.persist(&doc).await?;
        Ok(vacancy)
    }

    async fn delete_vacancy(&self, id: VacancyId) -> Result<bool> {
        let mut doc = self.doc.lock().await;
        let before = doc.vacancies.len();
        doc.vacancies.retain(|v| v.id != id);
        let deleted = doc.vacancies.len() < before;
        if deleted {
            self.persist(&doc).await?;
        }
        Ok(deleted)
    }

    async fn save_candidate(&self, mut candidate: Candidate) -> Result<Candidate> {
        let mut doc = self.doc.lock().await;
        doc.next_candidate_id += 1;
        candidate.id = doc.next_candidate_id;
        doc.candidates.push(candidate.clone());
        self.persist(&doc).await?;
        Ok(candidate)
    }

    async fn candidates_by_vacancy(&self, id: VacancyId) -> Result<Vec<Candidate>> {
        Ok(self
            .doc
            .lock()
            .await
            .candidates
            .iter()
            .filter(|c| c.vacancy_id == id)
            .cloned()
            .collect())
    }

    async fn upsert_admin(&self, mut admin: Admin) -> Result<Admin> {
        let mut doc = self.doc.lock().await;
        if let Some(slot) = doc.admins.iter_mut().find(|a| a.user_id == admin.user_id) {
            admin.id = slot.id;
            *slot = admin.clone();
        } else {
            doc.next_admin_id += 1;
            admin.id = doc.next_admin_id;
            doc.admins.push(admin.clone());
        }
        self.persist(&doc).await?;
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn scratch_path(tag: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/vbot-store-{}-{tag}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("store.json")
    }

    fn candidate(vacancy_id: VacancyId) -> Candidate {
        Candidate {
            id: 0,
            user_id: UserId(555),
            username: None,
            full_name: "Кандидат".to_string(),
            phone_number: "+380501234567".to_string(),
            work_experience: String::new(),
            email: None,
            resume_path: None,
            vacancy_id,
            applied_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn assigns_ids_and_survives_reopen() {
        let path = scratch_path("reopen");

        let store = JsonStore::open(path.clone()).await.unwrap();
        let v = store
            .save_vacancy(Vacancy::draft(
                "Software Engineer".into(),
                "Опис".into(),
                "Вимоги".into(),
            ))
            .await
            .unwrap();
        assert_eq!(v.id, VacancyId(1));
        store.save_candidate(candidate(v.id)).await.unwrap();

        // A fresh handle sees the same data and keeps counting ids upward.
        let reopened = JsonStore::open(path).await.unwrap();
        assert_eq!(reopened.vacancies().await.unwrap().len(), 1);
        assert_eq!(
            reopened.candidates_by_vacancy(v.id).await.unwrap().len(),
            1
        );
        let v2 = reopened
            .save_vacancy(Vacancy::draft("QA".into(), String::new(), String::new()))
            .await
            .unwrap();
        assert_eq!(v2.id, VacancyId(2));
    }

    #[tokio::test]
    async fn updates_overwrite_and_deletes_remove() {
        let path = scratch_path("update");
        let store = JsonStore::open(path).await.unwrap();

        let mut v = store
            .save_vacancy(Vacancy::draft("Стара".into(), String::new(), String::new()))
            .await
            .unwrap();
        v.title = "Нова".to_string();
        store.save_vacancy(v.clone()).await.unwrap();
        assert_eq!(
            store.vacancy(v.id).await.unwrap().unwrap().title,
            "Нова"
        );

        assert!(store.delete_vacancy(v.id).await.unwrap());
        assert!(!store.delete_vacancy(v.id).await.unwrap());
        assert_eq!(store.vacancy(v.id).await.unwrap(), None);

        // Updating a deleted record is a store error, not a silent insert.
        assert!(store.save_vacancy(v).await.is_err());
    }

    #[tokio::test]
    async fn upsert_admin_keeps_one_record_per_user() {
        let path = scratch_path("admins");
        let store = JsonStore::open(path).await.unwrap();

        let admin = Admin {
            id: 0,
            user_id: UserId(123),
            username: None,
            email: None,
            is_super_admin: false,
        };
        let first = store.upsert_admin(admin.clone()).await.unwrap();
        assert_eq!(first.id, 1);
        assert!(store.is_admin(UserId(123)).await.unwrap());
        assert!(!store.is_admin(UserId(124)).await.unwrap());

        let second = store
            .upsert_admin(Admin {
                email: Some("hr@example.com".into()),
                ..admin
            })
            .await
            .unwrap();
        assert_eq!(second.id, 1);

        let admins = store.admins().await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email.as_deref(), Some("hr@example.com"));
    }
}
