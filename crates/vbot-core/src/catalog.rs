use std::path::Path;
use std::sync::Arc;

use crate::{
    callbacks::CallbackAction,
    domain::{ChatId, Vacancy, VacancyId},
    formatting::escape_html,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    ports::StorePort,
    Result,
};

const ADMIN_MENU: &str = "Команди адміністратора:\n\
/addvacancy — додати вакансію\n\
/editvacancy — редагувати вакансію\n\
/deletevacancy — видалити вакансію\n\
/viewcandidates — переглянути кандидатів";

/// Read-side of the vacancy records: the public catalog and the menus built
/// from it. Holds no state of its own.
pub struct VacancyCatalog {
    store: Arc<dyn StorePort>,
    messenger: Arc<dyn MessagingPort>,
}

impl VacancyCatalog {
    pub fn new(store: Arc<dyn StorePort>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self { store, messenger }
    }

    /// One inline button per vacancy, leading to its details view.
    pub async fn show_catalog(&self, chat_id: ChatId) -> Result<()> {
        let vacancies = self.store.vacancies().await?;

        if vacancies.is_empty() {
            self.messenger
                .send_text(chat_id, "Наразі немає доступних вакансій.")
                .await?;
            return Ok(());
        }

        let keyboard = vacancy_keyboard(&vacancies, CallbackAction::VacancyDetails);
        self.messenger
            .send_inline_keyboard(chat_id, "Доступні вакансії:", keyboard)
            .await?;
        Ok(())
    }

    pub async fn show_menu(&self, chat_id: ChatId, is_admin: bool) -> Result<()> {
        self.show_catalog(chat_id).await?;
        if is_admin {
            self.messenger.send_text(chat_id, ADMIN_MENU).await?;
        }
        Ok(())
    }

    pub async fn show_details(&self, chat_id: ChatId, vacancy_id: VacancyId) -> Result<()> {
        let Some(vacancy) = self.store.vacancy(vacancy_id).await? else {
            self.messenger
                .send_text(chat_id, "Вакансію не знайдено.")
                .await?;
            return Ok(());
        };

        let caption = format!(
            "<b>{}</b>\n\n{}\n\nВимоги:\n{}",
            escape_html(&vacancy.title),
            escape_html(&vacancy.description),
            escape_html(&vacancy.requirements),
        );
        let keyboard = InlineKeyboard::new(vec![
            InlineKeyboard::button(
                "Подати заявку",
                CallbackAction::Apply(vacancy.id).token(),
            ),
            InlineKeyboard::button("Назад до каталогу", CallbackAction::BackToCatalog.token()),
        ]);

        if let Some(image) = vacancy.image_path.as_deref().filter(|p| Path::new(p).is_file()) {
            match self
                .messenger
                .send_photo(chat_id, Path::new(image), Some(&caption), Some(keyboard.clone()))
                .await
            {
                Ok(_) => return Ok(()),
                Err(err) => {
                    tracing::warn!(vacancy = vacancy.id.0, error = %err, "vacancy image send failed, falling back to text");
                }
            }
        }

        self.messenger
            .send_inline_keyboard(chat_id, &caption, keyboard)
            .await?;
        Ok(())
    }
}

/// "Pick a vacancy" keyboard shared by the catalog and the admin selection
/// lists.
pub fn vacancy_keyboard(
    vacancies: &[Vacancy],
    action: fn(VacancyId) -> CallbackAction,
) -> InlineKeyboard {
    InlineKeyboard::new(
        vacancies
            .iter()
            .map(|v| InlineKeyboard::button(v.title.clone(), action(v.id).token()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeMessenger, MemoryStore};

    const CHAT: ChatId = ChatId(42);

    fn catalog(store: Arc<MemoryStore>, messenger: Arc<FakeMessenger>) -> VacancyCatalog {
        VacancyCatalog::new(store, messenger)
    }

    #[tokio::test]
    async fn empty_catalog_says_so_instead_of_sending_buttons() {
        let store = Arc::new(MemoryStore::default());
        let messenger = Arc::new(FakeMessenger::default());
        catalog(store, messenger.clone())
            .show_catalog(CHAT)
            .await
            .unwrap();

        assert!(messenger.keyboards().is_empty());
        assert_eq!(
            messenger.texts().last().map(|(_, t)| t.clone()),
            Some("Наразі немає доступних вакансій.".to_string())
        );
    }

    #[tokio::test]
    async fn catalog_lists_one_details_button_per_vacancy() {
        let store = Arc::new(MemoryStore::default());
        let a = store.add_vacancy("Software Engineer").await;
        let b = store.add_vacancy("QA Engineer").await;
        let messenger = Arc::new(FakeMessenger::default());

        catalog(store, messenger.clone())
            .show_catalog(CHAT)
            .await
            .unwrap();

        let keyboards = messenger.keyboards();
        assert_eq!(keyboards.len(), 1);
        let (_, text, keyboard) = &keyboards[0];
        assert_eq!(text, "Доступні вакансії:");
        let tokens: Vec<_> = keyboard
            .buttons
            .iter()
            .map(|btn| btn.callback_data.clone())
            .collect();
        assert_eq!(
            tokens,
            vec![
                CallbackAction::VacancyDetails(a).token(),
                CallbackAction::VacancyDetails(b).token(),
            ]
        );
    }

    #[tokio::test]
    async fn details_escape_markup_and_offer_apply_and_back() {
        let store = Arc::new(MemoryStore::default());
        let id = store.add_vacancy("Rust <Senior>").await;
        let messenger = Arc::new(FakeMessenger::default());

        catalog(store, messenger.clone())
            .show_details(CHAT, id)
            .await
            .unwrap();

        let keyboards = messenger.keyboards();
        assert_eq!(keyboards.len(), 1);
        let (_, caption, keyboard) = &keyboards[0];
        assert!(caption.starts_with("<b>Rust &lt;Senior&gt;</b>"));
        assert!(caption.contains("Вимоги:"));
        assert_eq!(
            keyboard.buttons[0].callback_data,
            CallbackAction::Apply(id).token()
        );
        assert_eq!(
            keyboard.buttons[1].callback_data,
            CallbackAction::BackToCatalog.token()
        );
    }

    #[tokio::test]
    async fn missing_vacancy_details_reply_not_found() {
        let store = Arc::new(MemoryStore::default());
        let messenger = Arc::new(FakeMessenger::default());

        catalog(store, messenger.clone())
            .show_details(CHAT, VacancyId(404))
            .await
            .unwrap();

        assert_eq!(
            messenger.texts().last().map(|(_, t)| t.clone()),
            Some("Вакансію не знайдено.".to_string())
        );
    }
}
