use crate::domain::{ChatId, UserId};

/// Cross-messenger incoming event model.
///
/// Telegram-specific fields live in the Telegram adapter; the core only sees
/// these shapes.
#[derive(Clone, Debug)]
pub enum IncomingEvent {
    Command(Command),
    Text(TextMessage),
    Photo(PhotoMessage),
    Document(DocumentMessage),
    Callback(CallbackChoice),
}

impl IncomingEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            IncomingEvent::Command(c) => c.user_id,
            IncomingEvent::Text(t) => t.user_id,
            IncomingEvent::Photo(p) => p.user_id,
            IncomingEvent::Document(d) => d.user_id,
            IncomingEvent::Callback(q) => q.user_id,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            IncomingEvent::Command(c) => c.chat_id,
            IncomingEvent::Text(t) => t.chat_id,
            IncomingEvent::Photo(p) => p.chat_id,
            IncomingEvent::Document(d) => d.chat_id,
            IncomingEvent::Callback(q) => q.chat_id,
        }
    }
}

/// A slash command, already split into name and trailing arguments.
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub name: String,
    pub args: String,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// Highest-resolution photo of an incoming photo message.
#[derive(Clone, Debug)]
pub struct PhotoMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub file_id: String,
    pub caption: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DocumentMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub file_id: String,
    pub file_name: Option<String>,
    pub caption: Option<String>,
}

/// An inline-button press carrying an opaque action token.
#[derive(Clone, Debug)]
pub struct CallbackChoice {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub callback_id: String,
    pub token: String,
}

/// Inline keyboard (one button per row).
#[derive(Clone, Debug, PartialEq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    pub fn button(label: impl Into<String>, callback_data: impl Into<String>) -> InlineButton {
        InlineButton {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}
