use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    callbacks::CallbackAction,
    catalog::VacancyCatalog,
    dialog::{
        AdminEngine, CandidateEngine, DialogRegistry, DialogState, FileKind, FreeInput,
        IncomingFile,
    },
    messaging::{
        port::MessagingPort,
        types::{CallbackChoice, Command, IncomingEvent},
    },
    notify::NotificationDispatcher,
    ports::{EmailPort, StorePort},
    Result,
};

/// Free-text menu labels that stand in for their command (reply-keyboard
/// parity with the original bot).
const MENU_VIEW_VACANCIES: &str = "Переглянути вакансії";

/// Classifies every inbound event and hands it to exactly one of the catalog,
/// the candidate engine, or the admin engine. Holds no state of its own; the
/// dialog registry is the engines' shared map.
pub struct Router {
    store: Arc<dyn StorePort>,
    messenger: Arc<dyn MessagingPort>,
    pub dialogs: Arc<DialogRegistry>,
    catalog: Arc<VacancyCatalog>,
    candidates: CandidateEngine,
    admins: AdminEngine,
}

impl Router {
    pub fn new(
        store: Arc<dyn StorePort>,
        messenger: Arc<dyn MessagingPort>,
        mailer: Option<Arc<dyn EmailPort>>,
        upload_dir: PathBuf,
    ) -> Self {
        let dialogs = Arc::new(DialogRegistry::new());
        let catalog = Arc::new(VacancyCatalog::new(store.clone(), messenger.clone()));
        let notifier = Arc::new(NotificationDispatcher::new(
            store.clone(),
            messenger.clone(),
            mailer,
        ));

        let candidates = CandidateEngine::new(
            store.clone(),
            messenger.clone(),
            notifier,
            dialogs.clone(),
            upload_dir.clone(),
        );
        let admins = AdminEngine::new(
            store.clone(),
            messenger.clone(),
            catalog.clone(),
            dialogs.clone(),
            upload_dir,
        );

        Self {
            store,
            messenger,
            dialogs,
            catalog,
            candidates,
            admins,
        }
    }

    /// Entry point, called once per inbound event in arrival order. Any error
    /// from a delegate is logged and swallowed so one bad event never blocks
    /// the stream.
    pub async fn route(&self, event: IncomingEvent) {
        let user = event.user_id();
        if let Err(err) = self.dispatch(event).await {
            tracing::error!(user = user.0, error = %err, "event dispatch failed");
        }
    }

    async fn dispatch(&self, event: IncomingEvent) -> Result<()> {
        match event {
            IncomingEvent::Command(cmd) => self.dispatch_command(cmd).await,
            IncomingEvent::Text(msg) => {
                self.dispatch_free(FreeInput {
                    chat_id: msg.chat_id,
                    user_id: msg.user_id,
                    username: msg.username,
                    text: Some(msg.text),
                    attachment: None,
                })
                .await
            }
            IncomingEvent::Photo(msg) => {
                self.dispatch_free(FreeInput {
                    chat_id: msg.chat_id,
                    user_id: msg.user_id,
                    username: msg.username,
                    text: msg.caption,
                    attachment: Some(IncomingFile {
                        file_id: msg.file_id,
                        file_name: None,
                        kind: FileKind::Photo,
                    }),
                })
                .await
            }
            IncomingEvent::Document(msg) => {
                self.dispatch_free(FreeInput {
                    chat_id: msg.chat_id,
                    user_id: msg.user_id,
                    username: msg.username,
                    text: msg.caption,
                    attachment: Some(IncomingFile {
                        file_id: msg.file_id,
                        file_name: msg.file_name,
                        kind: FileKind::Document,
                    }),
                })
                .await
            }
            IncomingEvent::Callback(choice) => self.dispatch_callback(choice).await,
        }
    }

    async fn dispatch_command(&self, cmd: Command) -> Result<()> {
        // Role is re-resolved on every command, never cached.
        let is_admin = self.store.is_admin(cmd.user_id).await?;

        match cmd.name.as_str() {
            "start" => self.catalog.show_menu(cmd.chat_id, is_admin).await,
            "addvacancy" | "editvacancy" | "deletevacancy" | "viewcandidates" if !is_admin => {
                self.messenger
                    .send_text(cmd.chat_id, "У вас немає прав адміністратора.")
                    .await?;
                Ok(())
            }
            "addvacancy" => self.admins.begin_add(cmd.user_id, cmd.chat_id).await,
            "editvacancy" => self.admins.begin_edit_select(cmd.chat_id).await,
            "deletevacancy" => self.admins.begin_delete_select(cmd.chat_id).await,
            "viewcandidates" => self.admins.begin_view_select(cmd.chat_id).await,
            _ => {
                self.messenger
                    .send_text(cmd.chat_id, "Невідома команда.")
                    .await?;
                Ok(())
            }
        }
    }

    async fn dispatch_free(&self, input: FreeInput) -> Result<()> {
        match self.dialogs.take(input.user_id) {
            Some(DialogState::Admin(dialog)) => self.admins.handle_input(dialog, input).await,
            Some(DialogState::Candidate(dialog)) => {
                self.candidates.handle_input(dialog, input).await
            }
            None => {
                if input.text.as_deref().map(str::trim) == Some(MENU_VIEW_VACANCIES) {
                    return self.catalog.show_catalog(input.chat_id).await;
                }
                // Stray free text with no active dialog is a deliberate no-op.
                tracing::debug!(user = input.user_id.0, "free input with no active dialog ignored");
                Ok(())
            }
        }
    }

    async fn dispatch_callback(&self, choice: CallbackChoice) -> Result<()> {
        if let Err(err) = self.messenger.answer_callback(&choice.callback_id, None).await {
            tracing::debug!(error = %err, "callback ack failed");
        }

        let Some(action) = CallbackAction::parse(&choice.token) else {
            tracing::debug!(user = choice.user_id.0, token = %choice.token, "unrecognized callback token ignored");
            return Ok(());
        };

        // Admin role takes precedence for every recognized token.
        if self.store.is_admin(choice.user_id).await? {
            return self
                .admins
                .handle_callback(choice.user_id, choice.chat_id, action)
                .await;
        }

        match action {
            CallbackAction::VacancyDetails(id) => self.catalog.show_details(choice.chat_id, id).await,
            CallbackAction::Apply(id) => {
                self.candidates
                    .start_application(choice.user_id, choice.chat_id, id)
                    .await
            }
            CallbackAction::BackToCatalog => self.catalog.show_catalog(choice.chat_id).await,
            CallbackAction::BackToMenu => self.catalog.show_menu(choice.chat_id, false).await,
            CallbackAction::EditVacancy(_)
            | CallbackAction::DeleteVacancy(_)
            | CallbackAction::ViewCandidates(_) => {
                tracing::debug!(user = choice.user_id.0, "admin-only token from non-admin ignored");
                Ok(())
            }
        }
    }
}
