use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    domain::{Admin, Candidate, ChatId},
    messaging::port::MessagingPort,
    ports::{EmailPort, OutboundEmail, StorePort},
    utils::is_image_path,
};

/// Fans a freshly persisted application out to every admin, over chat and
/// (where an address is on file) email. Best-effort throughout: a failure for
/// one admin or one channel never blocks the rest.
pub struct NotificationDispatcher {
    store: Arc<dyn StorePort>,
    messenger: Arc<dyn MessagingPort>,
    mailer: Option<Arc<dyn EmailPort>>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn StorePort>,
        messenger: Arc<dyn MessagingPort>,
        mailer: Option<Arc<dyn EmailPort>>,
    ) -> Self {
        Self {
            store,
            messenger,
            mailer,
        }
    }

    pub async fn notify(&self, candidate: &Candidate) {
        let title = match self.store.vacancy(candidate.vacancy_id).await {
            Ok(Some(vacancy)) => vacancy.title,
            Ok(None) => "(вакансію видалено)".to_string(),
            Err(err) => {
                tracing::warn!(vacancy = candidate.vacancy_id.0, error = %err, "vacancy lookup failed for notification");
                "(вакансію видалено)".to_string()
            }
        };

        let admins = match self.store.admins().await {
            Ok(admins) => admins,
            Err(err) => {
                tracing::error!(error = %err, "admin list unavailable, skipping notifications");
                return;
            }
        };

        let summary = candidate_summary(candidate, &title);
        for admin in admins {
            self.notify_chat(&admin, candidate, &summary).await;
            self.notify_email(&admin, candidate, &title, &summary).await;
        }
    }

    async fn notify_chat(&self, admin: &Admin, candidate: &Candidate, summary: &str) {
        let chat_id = ChatId(admin.user_id.0);

        if let Err(err) = self.messenger.send_text(chat_id, summary).await {
            tracing::warn!(admin = admin.user_id.0, error = %err, "admin chat notification failed");
            return;
        }

        let Some(resume) = candidate.resume_path.as_deref() else {
            if let Err(err) = self
                .messenger
                .send_text(chat_id, "Кандидат не надав резюме.")
                .await
            {
                tracing::warn!(admin = admin.user_id.0, error = %err, "resume notice failed");
            }
            return;
        };

        let sent = if is_image_path(resume) {
            self.messenger
                .send_photo(chat_id, Path::new(resume), Some("Резюме кандидата"), None)
                .await
        } else {
            self.messenger
                .send_document(chat_id, Path::new(resume), Some("Резюме кандидата"))
                .await
        };

        if let Err(err) = sent {
            tracing::warn!(admin = admin.user_id.0, error = %err, "resume delivery failed");
            let _ = self
                .messenger
                .send_text(chat_id, "Не вдалося надіслати файл резюме.")
                .await;
        }
    }

    async fn notify_email(&self, admin: &Admin, candidate: &Candidate, title: &str, summary: &str) {
        let Some(mailer) = &self.mailer else {
            return;
        };
        let Some(to) = admin.email.as_deref().filter(|e| !e.trim().is_empty()) else {
            return;
        };

        let mail = OutboundEmail {
            to: to.to_string(),
            subject: format!("Новий кандидат: {title}"),
            body: summary.to_string(),
            attachment: candidate.resume_path.as_deref().map(PathBuf::from),
        };

        if let Err(err) = mailer.send(mail).await {
            tracing::warn!(admin = admin.user_id.0, error = %err, "admin email notification failed");
        }
    }
}

fn candidate_summary(candidate: &Candidate, vacancy_title: &str) -> String {
    format!(
        "Новий кандидат на вакансію «{vacancy_title}»!\n\n\
         Ім'я: {}\n\
         Телефон: {}\n\
         Досвід: {}\n\
         Email: {}\n\
         Username: {}",
        candidate.full_name,
        candidate.phone_number,
        candidate.work_experience,
        candidate.email.as_deref().unwrap_or("N/A"),
        candidate
            .username
            .as_deref()
            .map(|u| format!("@{u}"))
            .unwrap_or_else(|| "N/A".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Admin, UserId, VacancyId};
    use crate::testutil::{CountingMailer, FakeMessenger, MemoryStore};
    use chrono::Utc;
    use std::sync::Arc;

    fn admin(user_id: i64, email: Option<&str>) -> Admin {
        Admin {
            id: 0,
            user_id: UserId(user_id),
            username: None,
            email: email.map(|e| e.to_string()),
            is_super_admin: false,
        }
    }

    fn candidate(vacancy_id: VacancyId, resume: Option<&str>) -> Candidate {
        Candidate {
            id: 1,
            user_id: UserId(555),
            username: Some("candidateuser".to_string()),
            full_name: "Тестовий Кандидат".to_string(),
            phone_number: "+380501234567".to_string(),
            work_experience: "2 роки в IT".to_string(),
            email: Some("candidate@example.com".to_string()),
            resume_path: resume.map(|r| r.to_string()),
            vacancy_id,
            applied_at: Utc::now(),
        }
    }

    async fn setup(
        resume: Option<&str>,
    ) -> (
        NotificationDispatcher,
        Arc<MemoryStore>,
        Arc<FakeMessenger>,
        Arc<CountingMailer>,
        Candidate,
    ) {
        let store = Arc::new(MemoryStore::default());
        let id = store.add_vacancy("Software Engineer").await;
        let messenger = Arc::new(FakeMessenger::default());
        let mailer = Arc::new(CountingMailer::default());
        let dispatcher = NotificationDispatcher::new(
            store.clone(),
            messenger.clone(),
            Some(mailer.clone()),
        );
        (dispatcher, store, messenger, mailer, candidate(id, resume))
    }

    #[tokio::test]
    async fn one_failing_admin_does_not_block_the_rest() {
        let (dispatcher, store, messenger, mailer, candidate) = setup(None).await;
        store.add_admin(admin(1, Some("one@example.com"))).await;
        store.add_admin(admin(2, Some("two@example.com"))).await;

        messenger.fail_chat(ChatId(1));
        dispatcher.notify(&candidate).await;

        let texts = messenger.texts();
        assert!(texts.iter().all(|(chat, _)| *chat == 2));
        assert!(texts.iter().any(|(_, t)| t.contains("Новий кандидат")));
        assert!(texts.iter().any(|(_, t)| t == "Кандидат не надав резюме."));

        // The chat failure left the email leg untouched for both admins.
        let mails = mailer.sent();
        assert_eq!(mails.len(), 2);
        assert!(mails.iter().all(|m| m.subject == "Новий кандидат: Software Engineer"));
    }

    #[tokio::test]
    async fn email_failures_leave_the_chat_leg_intact() {
        let (dispatcher, store, messenger, mailer, candidate) = setup(None).await;
        store.add_admin(admin(1, Some("one@example.com"))).await;
        store.add_admin(admin(2, None)).await;

        mailer.fail(true);
        dispatcher.notify(&candidate).await;

        let texts = messenger.texts();
        assert!(texts.iter().any(|(chat, _)| *chat == 1));
        assert!(texts.iter().any(|(chat, _)| *chat == 2));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn resume_goes_out_as_photo_or_document_by_extension() {
        let (dispatcher, store, messenger, _, candidate) = setup(Some("/tmp/up/resume.jpg")).await;
        store.add_admin(admin(1, None)).await;
        dispatcher.notify(&candidate).await;
        assert_eq!(messenger.photos().len(), 1);
        assert!(messenger.documents().is_empty());

        let (dispatcher, store, messenger, _, candidate) = setup(Some("/tmp/up/resume.pdf")).await;
        store.add_admin(admin(1, None)).await;
        dispatcher.notify(&candidate).await;
        assert!(messenger.photos().is_empty());
        assert_eq!(messenger.documents().len(), 1);
    }

    #[tokio::test]
    async fn resume_transport_failure_falls_back_to_text() {
        let (dispatcher, store, messenger, _, candidate) = setup(Some("/tmp/up/resume.png")).await;
        store.add_admin(admin(1, None)).await;

        messenger.fail_photos(true);
        dispatcher.notify(&candidate).await;

        assert!(messenger
            .texts()
            .iter()
            .any(|(_, t)| t == "Не вдалося надіслати файл резюме."));
    }

    #[tokio::test]
    async fn email_carries_the_summary_and_the_resume_attachment() {
        let (dispatcher, store, _, mailer, candidate) = setup(Some("/tmp/up/resume.pdf")).await;
        store.add_admin(admin(1, Some("hr@example.com"))).await;

        dispatcher.notify(&candidate).await;

        let mails = mailer.sent();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].to, "hr@example.com");
        assert!(mails[0].body.contains("Тестовий Кандидат"));
        assert!(mails[0].body.contains("+380501234567"));
        assert_eq!(
            mails[0].attachment.as_deref(),
            Some(std::path::Path::new("/tmp/up/resume.pdf"))
        );
    }
}
