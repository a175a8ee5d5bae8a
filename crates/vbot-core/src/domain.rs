use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Private chats share the user's id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Vacancy id (store-assigned, positive once persisted).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VacancyId(pub i32);

/// A job opening shown in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vacancy {
    /// A not-yet-persisted vacancy; the store assigns the real id on save.
    pub fn draft(title: String, description: String, requirements: String) -> Self {
        Self {
            id: VacancyId(0),
            title,
            description,
            requirements,
            image_path: None,
            created_at: Utc::now(),
        }
    }
}

/// A submitted application. Created exactly once, never mutated by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i32,
    pub user_id: UserId,
    pub username: Option<String>,
    pub full_name: String,
    pub phone_number: String,
    pub work_experience: String,
    pub email: Option<String>,
    pub resume_path: Option<String>,
    pub vacancy_id: VacancyId,
    pub applied_at: DateTime<Utc>,
}

/// Allow-list entry. The super-admin flag is stored but carries no extra
/// authorization granularity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i32,
    pub user_id: UserId,
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_super_admin: bool,
}
