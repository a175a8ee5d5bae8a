use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    callbacks::CallbackAction,
    catalog::{vacancy_keyboard, VacancyCatalog},
    dialog::{
        advance, materialize, DialogRegistry, DialogState, FreeInput, Progress, StepDef, StepInput,
    },
    domain::{ChatId, UserId, Vacancy, VacancyId},
    messaging::{port::MessagingPort, types::InlineKeyboard},
    ports::StorePort,
    Result,
};

#[derive(Clone, Debug, Default)]
pub struct VacancyDraft {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub image_path: Option<String>,
}

/// In-flight admin flow. Edit carries only the target id; the vacancy itself
/// is re-fetched from the store on every step.
#[derive(Clone, Debug)]
pub enum AdminDialog {
    Add { step: usize, draft: VacancyDraft },
    Edit { step: usize, vacancy_id: VacancyId },
    ViewCandidates { vacancy_id: VacancyId },
}

impl AdminDialog {
    pub fn add() -> Self {
        Self::Add {
            step: 0,
            draft: VacancyDraft::default(),
        }
    }

    pub fn edit(vacancy_id: VacancyId) -> Self {
        Self::Edit {
            step: 0,
            vacancy_id,
        }
    }
}

fn draft_title(draft: &mut VacancyDraft, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            draft.title = text.clone();
            true
        }
        None => false,
    }
}

fn draft_description(draft: &mut VacancyDraft, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            draft.description = text.clone();
            true
        }
        None => false,
    }
}

fn draft_requirements(draft: &mut VacancyDraft, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            draft.requirements = text.clone();
            true
        }
        None => false,
    }
}

fn draft_image(draft: &mut VacancyDraft, input: &StepInput) -> bool {
    if let Some(path) = &input.file {
        draft.image_path = Some(path.clone());
        return true;
    }
    match input.text.as_deref() {
        Some(text) if text.trim().eq_ignore_ascii_case("skip") => {
            draft.image_path = None;
            true
        }
        _ => false,
    }
}

fn edit_title(vacancy: &mut Vacancy, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            vacancy.title = text.clone();
            true
        }
        None => false,
    }
}

fn edit_description(vacancy: &mut Vacancy, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            vacancy.description = text.clone();
            true
        }
        None => false,
    }
}

fn edit_requirements(vacancy: &mut Vacancy, input: &StepInput) -> bool {
    match &input.text {
        Some(text) => {
            vacancy.requirements = text.clone();
            true
        }
        None => false,
    }
}

fn edit_image(vacancy: &mut Vacancy, input: &StepInput) -> bool {
    if let Some(path) = &input.file {
        vacancy.image_path = Some(path.clone());
        return true;
    }
    // "skip" here retains the existing image, unlike the add flow.
    matches!(input.text.as_deref(), Some(text) if text.trim().eq_ignore_ascii_case("skip"))
}

const ADD_FLOW: &[StepDef<VacancyDraft>] = &[
    StepDef {
        prompt: "Введіть назву вакансії:",
        invalid: "Введіть назву вакансії:",
        accepts_file: false,
        apply: draft_title,
    },
    StepDef {
        prompt: "Введіть опис вакансії:",
        invalid: "Введіть опис вакансії:",
        accepts_file: false,
        apply: draft_description,
    },
    StepDef {
        prompt: "Введіть вимоги до посади:",
        invalid: "Введіть вимоги до посади:",
        accepts_file: false,
        apply: draft_requirements,
    },
    StepDef {
        prompt: "Надішліть зображення вакансії (або надішліть skip, щоб пропустити):",
        invalid: "Надішліть зображення або введіть skip, щоб пропустити цей крок.",
        accepts_file: true,
        apply: draft_image,
    },
];

const EDIT_FLOW: &[StepDef<Vacancy>] = &[
    StepDef {
        prompt: "Введіть нову назву вакансії:",
        invalid: "Введіть нову назву вакансії:",
        accepts_file: false,
        apply: edit_title,
    },
    StepDef {
        prompt: "Введіть новий опис вакансії:",
        invalid: "Введіть новий опис вакансії:",
        accepts_file: false,
        apply: edit_description,
    },
    StepDef {
        prompt: "Введіть нові вимоги до посади:",
        invalid: "Введіть нові вимоги до посади:",
        accepts_file: false,
        apply: edit_requirements,
    },
    StepDef {
        prompt: "Надішліть нове зображення вакансії (або надішліть skip, щоб залишити поточне):",
        invalid: "Надішліть зображення або введіть skip, щоб залишити поточне.",
        accepts_file: true,
        apply: edit_image,
    },
];

/// A vacancy image must be a photo; attached documents are treated as
/// invalid input for the image step.
fn photos_only(mut input: FreeInput) -> FreeInput {
    if matches!(
        input.attachment,
        Some(crate::dialog::IncomingFile {
            kind: crate::dialog::FileKind::Document,
            ..
        })
    ) {
        input.attachment = None;
    }
    input
}

/// Drives the add/edit vacancy and view-candidates flows. Entry is gated by
/// the router's admin check; free-text continuations are not re-checked.
pub struct AdminEngine {
    store: Arc<dyn StorePort>,
    messenger: Arc<dyn MessagingPort>,
    catalog: Arc<VacancyCatalog>,
    dialogs: Arc<DialogRegistry>,
    upload_dir: PathBuf,
}

impl AdminEngine {
    pub fn new(
        store: Arc<dyn StorePort>,
        messenger: Arc<dyn MessagingPort>,
        catalog: Arc<VacancyCatalog>,
        dialogs: Arc<DialogRegistry>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            messenger,
            catalog,
            dialogs,
            upload_dir,
        }
    }

    pub async fn begin_add(&self, user_id: UserId, chat_id: ChatId) -> Result<()> {
        self.dialogs
            .begin(user_id, DialogState::Admin(AdminDialog::add()));
        self.messenger
            .send_text(chat_id, ADD_FLOW[0].prompt)
            .await?;
        Ok(())
    }

    pub async fn begin_edit_select(&self, chat_id: ChatId) -> Result<()> {
        self.select_vacancy(
            chat_id,
            CallbackAction::EditVacancy,
            "Оберіть вакансію для редагування:",
            "Наразі немає доступних вакансій для редагування.",
        )
        .await
    }

    pub async fn begin_delete_select(&self, chat_id: ChatId) -> Result<()> {
        self.select_vacancy(
            chat_id,
            CallbackAction::DeleteVacancy,
            "Оберіть вакансію для видалення:",
            "Наразі немає доступних вакансій для видалення.",
        )
        .await
    }

    pub async fn begin_view_select(&self, chat_id: ChatId) -> Result<()> {
        self.select_vacancy(
            chat_id,
            CallbackAction::ViewCandidates,
            "Оберіть вакансію для перегляду кандидатів:",
            "Наразі немає доступних вакансій.",
        )
        .await
    }

    async fn select_vacancy(
        &self,
        chat_id: ChatId,
        action: fn(VacancyId) -> CallbackAction,
        prompt: &str,
        empty: &str,
    ) -> Result<()> {
        let vacancies = self.store.vacancies().await?;
        if vacancies.is_empty() {
            self.messenger.send_text(chat_id, empty).await?;
            return Ok(());
        }

        let keyboard = vacancy_keyboard(&vacancies, action);
        self.messenger
            .send_inline_keyboard(chat_id, prompt, keyboard)
            .await?;
        Ok(())
    }

    /// Inline-choice entry point. Admins land here for every callback, so the
    /// role-neutral navigation tokens are handled too; the apply token is a
    /// deliberate no-op for admins.
    pub async fn handle_callback(
        &self,
        user_id: UserId,
        chat_id: ChatId,
        action: CallbackAction,
    ) -> Result<()> {
        match action {
            CallbackAction::EditVacancy(vacancy_id) => {
                self.dialogs
                    .begin(user_id, DialogState::Admin(AdminDialog::edit(vacancy_id)));
                self.messenger
                    .send_text(chat_id, EDIT_FLOW[0].prompt)
                    .await?;
            }
            CallbackAction::DeleteVacancy(vacancy_id) => {
                let deleted = self.store.delete_vacancy(vacancy_id).await?;
                let reply = if deleted {
                    "Вакансію видалено."
                } else {
                    "Вакансію не знайдено."
                };
                self.messenger.send_text(chat_id, reply).await?;
            }
            CallbackAction::ViewCandidates(vacancy_id) => {
                // Transient state, held only for the duration of the render.
                self.dialogs.begin(
                    user_id,
                    DialogState::Admin(AdminDialog::ViewCandidates { vacancy_id }),
                );
                let rendered = self.render_candidates(chat_id, vacancy_id).await;
                self.dialogs.take(user_id);
                rendered?;
            }
            CallbackAction::VacancyDetails(vacancy_id) => {
                self.catalog.show_details(chat_id, vacancy_id).await?;
            }
            CallbackAction::BackToCatalog => {
                self.catalog.show_catalog(chat_id).await?;
            }
            CallbackAction::BackToMenu => {
                self.catalog.show_menu(chat_id, true).await?;
            }
            CallbackAction::Apply(_) => {
                tracing::debug!(user = user_id.0, "apply token from admin ignored");
            }
        }
        Ok(())
    }

    pub async fn handle_input(&self, dialog: AdminDialog, input: FreeInput) -> Result<()> {
        match dialog {
            AdminDialog::Add { step, draft } => self.advance_add(step, draft, input).await,
            AdminDialog::Edit { step, vacancy_id } => {
                self.advance_edit(step, vacancy_id, input).await
            }
            // Never left in the registry past its render; nothing to do.
            AdminDialog::ViewCandidates { .. } => Ok(()),
        }
    }

    async fn advance_add(
        &self,
        mut step: usize,
        mut draft: VacancyDraft,
        input: FreeInput,
    ) -> Result<()> {
        let input = photos_only(input);
        let accepts_file = ADD_FLOW[step].accepts_file;
        let step_input = match materialize(
            self.messenger.as_ref(),
            &self.upload_dir,
            "vacancy",
            &input,
            accepts_file,
        )
        .await
        {
            Ok(step_input) => step_input,
            Err(err) => {
                self.dialogs
                    .begin(input.user_id, DialogState::Admin(AdminDialog::Add { step, draft }));
                return Err(err);
            }
        };

        match advance(ADD_FLOW, &mut step, &mut draft, &step_input) {
            Progress::Next(prompt) => {
                self.dialogs
                    .begin(input.user_id, DialogState::Admin(AdminDialog::Add { step, draft }));
                self.messenger.send_text(input.chat_id, prompt).await?;
            }
            Progress::Rejected(reply) => {
                self.dialogs
                    .begin(input.user_id, DialogState::Admin(AdminDialog::Add { step, draft }));
                self.messenger.send_text(input.chat_id, reply).await?;
            }
            Progress::Done => {
                let mut vacancy =
                    Vacancy::draft(draft.title, draft.description, draft.requirements);
                vacancy.image_path = draft.image_path;
                self.store.save_vacancy(vacancy).await?;
                self.messenger
                    .send_text(input.chat_id, "Вакансію успішно додано.")
                    .await?;
            }
        }
        Ok(())
    }

    async fn advance_edit(
        &self,
        mut step: usize,
        vacancy_id: VacancyId,
        input: FreeInput,
    ) -> Result<()> {
        let input = photos_only(input);

        // Fetch the target fresh on every step; a concurrent delete aborts
        // the flow here.
        let Some(mut vacancy) = self.store.vacancy(vacancy_id).await? else {
            self.messenger
                .send_text(input.chat_id, "Вакансію не знайдено.")
                .await?;
            return Ok(());
        };

        let accepts_file = EDIT_FLOW[step].accepts_file;
        let step_input = match materialize(
            self.messenger.as_ref(),
            &self.upload_dir,
            "vacancy",
            &input,
            accepts_file,
        )
        .await
        {
            Ok(step_input) => step_input,
            Err(err) => {
                self.dialogs.begin(
                    input.user_id,
                    DialogState::Admin(AdminDialog::Edit { step, vacancy_id }),
                );
                return Err(err);
            }
        };

        match advance(EDIT_FLOW, &mut step, &mut vacancy, &step_input) {
            Progress::Next(prompt) => {
                self.store.save_vacancy(vacancy).await?;
                self.dialogs.begin(
                    input.user_id,
                    DialogState::Admin(AdminDialog::Edit { step, vacancy_id }),
                );
                self.messenger.send_text(input.chat_id, prompt).await?;
            }
            Progress::Rejected(reply) => {
                self.dialogs.begin(
                    input.user_id,
                    DialogState::Admin(AdminDialog::Edit { step, vacancy_id }),
                );
                self.messenger.send_text(input.chat_id, reply).await?;
            }
            Progress::Done => {
                self.store.save_vacancy(vacancy).await?;
                self.messenger
                    .send_text(input.chat_id, "Вакансію успішно оновлено.")
                    .await?;
            }
        }
        Ok(())
    }

    /// Shared candidate listing, used by the view-candidates selection.
    async fn render_candidates(&self, chat_id: ChatId, vacancy_id: VacancyId) -> Result<()> {
        let candidates = self.store.candidates_by_vacancy(vacancy_id).await?;

        if candidates.is_empty() {
            self.messenger
                .send_text(chat_id, "Немає кандидатів на цю вакансію.")
                .await?;
        } else {
            for candidate in &candidates {
                let card = format!(
                    "Ім'я: {}\nТелефон: {}\nДосвід: {}\nEmail: {}\nРезюме: {}\nUsername: {}",
                    candidate.full_name,
                    candidate.phone_number,
                    candidate.work_experience,
                    candidate.email.as_deref().unwrap_or("N/A"),
                    candidate.resume_path.as_deref().unwrap_or("N/A"),
                    candidate
                        .username
                        .as_deref()
                        .map(|u| format!("@{u}"))
                        .unwrap_or_else(|| "N/A".to_string()),
                );
                self.messenger.send_text(chat_id, &card).await?;
            }
        }

        let keyboard = InlineKeyboard::new(vec![InlineKeyboard::button(
            "Назад до меню",
            CallbackAction::BackToMenu.token(),
        )]);
        self.messenger
            .send_inline_keyboard(chat_id, "Повернутися до меню:", keyboard)
            .await?;
        Ok(())
    }
}
