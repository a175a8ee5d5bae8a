use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;

use crate::{
    dialog::{
        advance, materialize, DialogRegistry, DialogState, FreeInput, Progress, StepDef, StepInput,
    },
    domain::{Candidate, ChatId, UserId, VacancyId},
    messaging::port::MessagingPort,
    notify::NotificationDispatcher,
    ports::StorePort,
    Result,
};

/// Ukrainian mobile number as the original service required it.
pub fn is_valid_phone_number(input: &str) -> bool {
    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    let re = PHONE_RE.get_or_init(|| Regex::new(r"^\+380\d{9}$").expect("phone pattern"));
    re.is_match(input)
}

#[derive(Clone, Debug, Default)]
pub struct CandidateDraft {
    pub full_name: String,
    pub phone_number: String,
    pub work_experience: String,
    pub email: Option<String>,
    pub resume_path: Option<String>,
}

/// In-flight application. The vacancy id is fixed at start and carried
/// through to the persisted record unchanged.
#[derive(Clone, Debug)]
pub struct CandidateDialog {
    pub vacancy_id: VacancyId,
    pub step: usize,
    pub draft: CandidateDraft,
}

impl CandidateDialog {
    pub fn new(vacancy_id: VacancyId) -> Self {
        Self {
            vacancy_id,
            step: 0,
            draft: CandidateDraft::default(),
        }
    }
}

fn set_full_name(draft: &mut CandidateDraft, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            draft.full_name = text.clone();
            true
        }
        None => false,
    }
}

fn set_phone_number(draft: &mut CandidateDraft, input: &StepInput) -> bool {
    match input.text.as_deref() {
        Some(text) if is_valid_phone_number(text) => {
            draft.phone_number = text.to_string();
            true
        }
        _ => false,
    }
}

fn set_work_experience(draft: &mut CandidateDraft, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            draft.work_experience = text.clone();
            true
        }
        None => false,
    }
}

fn set_email(draft: &mut CandidateDraft, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            // "ні" opts out; anything else is stored verbatim.
            draft.email = if text.trim().to_lowercase() == "ні" {
                None
            } else {
                Some(text.clone())
            };
            true
        }
        None => false,
    }
}

fn set_resume(draft: &mut CandidateDraft, input: &StepInput) -> bool {
    if let Some(path) = &input.file {
        draft.resume_path = Some(path.clone());
        return true;
    }
    match input.text.as_deref() {
        Some(text) if text.trim().eq_ignore_ascii_case("skip") => {
            draft.resume_path = None;
            true
        }
        _ => false,
    }
}

const APPLICATION_FLOW: &[StepDef<CandidateDraft>] = &[
    StepDef {
        prompt: "Введіть ваше повне ім'я:",
        invalid: "Введіть ваше повне ім'я:",
        accepts_file: false,
        apply: set_full_name,
    },
    StepDef {
        prompt: "Введіть ваш номер телефону (у форматі +380XXXXXXXXX):",
        invalid: "Некоректний формат номера телефону. Спробуйте ще раз:",
        accepts_file: false,
        apply: set_phone_number,
    },
    StepDef {
        prompt: "Опишіть ваш досвід роботи:",
        invalid: "Опишіть ваш досвід роботи:",
        accepts_file: false,
        apply: set_work_experience,
    },
    StepDef {
        prompt: "Вкажіть ваш email (або введіть \"ні\", щоб пропустити):",
        invalid: "Вкажіть ваш email (або введіть \"ні\", щоб пропустити):",
        accepts_file: false,
        apply: set_email,
    },
    StepDef {
        prompt: "Надішліть ваше резюме файлом (або введіть skip, щоб пропустити):",
        invalid: "Надішліть файл резюме або введіть skip, щоб пропустити цей крок.",
        accepts_file: true,
        apply: set_resume,
    },
];

/// Drives the multi-step application flow for one user at a time.
pub struct CandidateEngine {
    store: Arc<dyn StorePort>,
    messenger: Arc<dyn MessagingPort>,
    notifier: Arc<NotificationDispatcher>,
    dialogs: Arc<DialogRegistry>,
    upload_dir: PathBuf,
}

impl CandidateEngine {
    pub fn new(
        store: Arc<dyn StorePort>,
        messenger: Arc<dyn MessagingPort>,
        notifier: Arc<NotificationDispatcher>,
        dialogs: Arc<DialogRegistry>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            messenger,
            notifier,
            dialogs,
            upload_dir,
        }
    }

    /// Begin (or restart) an application. The vacancy id is not verified
    /// here; it only surfaces as the foreign reference stored at the end.
    pub async fn start_application(
        &self,
        user_id: UserId,
        chat_id: ChatId,
        vacancy_id: VacancyId,
    ) -> Result<()> {
        self.dialogs.begin(
            user_id,
            DialogState::Candidate(CandidateDialog::new(vacancy_id)),
        );
        self.messenger
            .send_text(chat_id, APPLICATION_FLOW[0].prompt)
            .await?;
        Ok(())
    }

    /// Feed one free-form message into the dialog the router took from the
    /// registry. The dialog is re-registered unless the flow completed.
    pub async fn handle_input(&self, mut dialog: CandidateDialog, input: FreeInput) -> Result<()> {
        let accepts_file = APPLICATION_FLOW[dialog.step].accepts_file;
        let step_input = match materialize(
            self.messenger.as_ref(),
            &self.upload_dir,
            "resume",
            &input,
            accepts_file,
        )
        .await
        {
            Ok(step_input) => step_input,
            Err(err) => {
                // Keep the dialog so the user can resend the file.
                self.dialogs
                    .begin(input.user_id, DialogState::Candidate(dialog));
                return Err(err);
            }
        };

        match advance(
            APPLICATION_FLOW,
            &mut dialog.step,
            &mut dialog.draft,
            &step_input,
        ) {
            Progress::Next(prompt) => {
                self.dialogs
                    .begin(input.user_id, DialogState::Candidate(dialog));
                self.messenger.send_text(input.chat_id, prompt).await?;
            }
            Progress::Rejected(reply) => {
                self.dialogs
                    .begin(input.user_id, DialogState::Candidate(dialog));
                self.messenger.send_text(input.chat_id, reply).await?;
            }
            Progress::Done => {
                let candidate = self.complete(&input, dialog).await?;
                self.messenger
                    .send_text(input.chat_id, "Ваша заявка успішно надіслана!")
                    .await?;
                self.notifier.notify(&candidate).await;
            }
        }

        Ok(())
    }

    /// Terminal transition: the dialog is already out of the registry, so
    /// persisting here makes removal and persistence one logical step.
    async fn complete(&self, input: &FreeInput, dialog: CandidateDialog) -> Result<Candidate> {
        let draft = dialog.draft;
        let candidate = Candidate {
            id: 0,
            user_id: input.user_id,
            username: input.username.clone(),
            full_name: draft.full_name,
            phone_number: draft.phone_number,
            work_experience: draft.work_experience,
            email: draft.email,
            resume_path: draft.resume_path,
            vacancy_id: dialog.vacancy_id,
            applied_at: Utc::now(),
        };
        self.store.save_candidate(candidate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{DialogKind, FileKind, IncomingFile};
    use crate::testutil::{free_text, CountingMailer, FakeMessenger, MemoryStore};
    use crate::domain::Admin;

    const USER: UserId = UserId(555_555);
    const CHAT: ChatId = ChatId(555_555);

    fn engine(
        store: Arc<MemoryStore>,
        messenger: Arc<FakeMessenger>,
        dialogs: Arc<DialogRegistry>,
    ) -> (CandidateEngine, Arc<CountingMailer>) {
        let mailer = Arc::new(CountingMailer::default());
        let notifier = Arc::new(NotificationDispatcher::new(
            store.clone(),
            messenger.clone(),
            Some(mailer.clone()),
        ));
        let engine = CandidateEngine::new(
            store,
            messenger,
            notifier,
            dialogs,
            PathBuf::from("/tmp/vbot-test-uploads"),
        );
        (engine, mailer)
    }

    #[test]
    fn phone_validation_matches_the_required_shape() {
        assert!(is_valid_phone_number("+380501234567"));

        assert!(!is_valid_phone_number("0501234567"));
        assert!(!is_valid_phone_number("+38050123"));
        assert!(!is_valid_phone_number("+3805012345678"));
        assert!(!is_valid_phone_number("+380abcdefg"));
        assert!(!is_valid_phone_number(" +380501234567"));
    }

    #[tokio::test]
    async fn completed_flow_persists_once_and_notifies_admins() {
        let store = Arc::new(MemoryStore::default());
        store.add_vacancy("Software Engineer").await;
        store
            .add_admin(Admin {
                id: 1,
                user_id: UserId(123_456_789),
                username: Some("adminuser".into()),
                email: Some("admin@example.com".into()),
                is_super_admin: false,
            })
            .await;

        let messenger = Arc::new(FakeMessenger::default());
        let dialogs = Arc::new(DialogRegistry::new());
        let (engine, mailer) = engine(store.clone(), messenger.clone(), dialogs.clone());

        engine
            .start_application(USER, CHAT, VacancyId(1))
            .await
            .unwrap();
        assert_eq!(dialogs.kind(USER), Some(DialogKind::Candidate));

        for text in [
            "Тестовий Кандидат",
            "+380501234567",
            "2 роки в IT",
            "candidate@example.com",
            "skip",
        ] {
            let dialog = match dialogs.take(USER) {
                Some(DialogState::Candidate(d)) => d,
                other => panic!("unexpected state: {other:?}"),
            };
            engine
                .handle_input(dialog, free_text(USER, CHAT, text))
                .await
                .unwrap();
        }

        assert!(dialogs.is_empty());

        let saved = store.candidates_by_vacancy(VacancyId(1)).await.unwrap();
        assert_eq!(saved.len(), 1);
        let candidate = &saved[0];
        assert_eq!(candidate.full_name, "Тестовий Кандидат");
        assert_eq!(candidate.phone_number, "+380501234567");
        assert_eq!(candidate.email.as_deref(), Some("candidate@example.com"));
        assert_eq!(candidate.resume_path, None);

        // One email per admin with the fixed marker phrase in the subject.
        let mails = mailer.sent();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].to, "admin@example.com");
        assert!(mails[0].subject.contains("Новий кандидат"));

        assert!(messenger
            .texts()
            .iter()
            .any(|(_, t)| t == "Ваша заявка успішно надіслана!"));
    }

    async fn feed(engine: &CandidateEngine, dialogs: &DialogRegistry, text: &str) {
        let dialog = match dialogs.take(USER) {
            Some(DialogState::Candidate(d)) => d,
            other => panic!("unexpected state: {other:?}"),
        };
        engine
            .handle_input(dialog, free_text(USER, CHAT, text))
            .await
            .unwrap();
    }

    fn current_step(dialogs: &DialogRegistry) -> usize {
        match dialogs.take(USER) {
            Some(DialogState::Candidate(d)) => {
                let step = d.step;
                dialogs.begin(USER, DialogState::Candidate(d));
                step
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_phone_numbers_keep_the_dialog_on_the_same_step() {
        let store = Arc::new(MemoryStore::default());
        let messenger = Arc::new(FakeMessenger::default());
        let dialogs = Arc::new(DialogRegistry::new());
        let (engine, _) = engine(store, messenger.clone(), dialogs.clone());

        engine
            .start_application(USER, CHAT, VacancyId(9))
            .await
            .unwrap();

        feed(&engine, &dialogs, "Ім'я").await;
        feed(&engine, &dialogs, "0501234567").await;
        feed(&engine, &dialogs, "+38050123").await;
        assert_eq!(
            current_step(&dialogs),
            1,
            "still at the phone step after two bad inputs"
        );

        // A valid number now advances exactly once.
        feed(&engine, &dialogs, "+380501234567").await;
        assert_eq!(current_step(&dialogs), 2);
    }

    #[tokio::test]
    async fn resume_attachment_is_downloaded_and_referenced() {
        let store = Arc::new(MemoryStore::default());
        store.add_vacancy("QA Engineer").await;
        let messenger = Arc::new(FakeMessenger::default());
        let dialogs = Arc::new(DialogRegistry::new());
        let (engine, _) = engine(store.clone(), messenger.clone(), dialogs.clone());

        engine
            .start_application(USER, CHAT, VacancyId(1))
            .await
            .unwrap();
        for text in ["Кандидат", "+380501234567", "досвід", "ні"] {
            let dialog = match dialogs.take(USER) {
                Some(DialogState::Candidate(d)) => d,
                other => panic!("unexpected state: {other:?}"),
            };
            engine
                .handle_input(dialog, free_text(USER, CHAT, text))
                .await
                .unwrap();
        }

        let dialog = match dialogs.take(USER) {
            Some(DialogState::Candidate(d)) => d,
            other => panic!("unexpected state: {other:?}"),
        };
        let mut input = free_text(USER, CHAT, "");
        input.text = None;
        input.attachment = Some(IncomingFile {
            file_id: "file-77".into(),
            file_name: Some("cv.pdf".into()),
            kind: FileKind::Document,
        });
        engine.handle_input(dialog, input).await.unwrap();

        let saved = store.candidates_by_vacancy(VacancyId(1)).await.unwrap();
        assert_eq!(saved.len(), 1);
        let resume = saved[0].resume_path.as_deref().expect("resume stored");
        assert!(resume.ends_with("cv.pdf"));
        assert_eq!(messenger.downloads(), vec!["file-77".to_string()]);
        // "ні" on the email step left the address unset.
        assert_eq!(saved[0].email, None);
    }

    #[tokio::test]
    async fn skip_token_is_case_insensitive() {
        let store = Arc::new(MemoryStore::default());
        store.add_vacancy("DevOps").await;
        let messenger = Arc::new(FakeMessenger::default());
        let dialogs = Arc::new(DialogRegistry::new());
        let (engine, _) = engine(store.clone(), messenger, dialogs.clone());

        engine
            .start_application(USER, CHAT, VacancyId(1))
            .await
            .unwrap();
        for text in ["Кандидат", "+380501234567", "досвід", "a@b.c", "SKIP"] {
            let dialog = match dialogs.take(USER) {
                Some(DialogState::Candidate(d)) => d,
                other => panic!("unexpected state: {other:?}"),
            };
            engine
                .handle_input(dialog, free_text(USER, CHAT, text))
                .await
                .unwrap();
        }

        let saved = store.candidates_by_vacancy(VacancyId(1)).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].resume_path, None);
    }
}
