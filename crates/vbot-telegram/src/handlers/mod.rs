//! Telegram update handlers: convert each update into a core event and hand
//! it to the router. All classification and state logic lives in the core.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use vbot_core::{
    domain::{ChatId, UserId},
    messaging::types::{
        CallbackChoice, Command, DocumentMessage, IncomingEvent, PhotoMessage, TextMessage,
    },
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(event) = convert_message(&msg) {
        state.router.route(event).await;
    }
    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    state.router.route(convert_callback(&q)).await;
    Ok(())
}

fn convert_message(msg: &Message) -> Option<IncomingEvent> {
    let user = msg.from()?;
    let user_id = UserId(user.id.0 as i64);
    let chat_id = ChatId(msg.chat.id.0);
    let username = user.username.clone();

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            let (name, args) = parse_command(text);
            return Some(IncomingEvent::Command(Command {
                chat_id,
                user_id,
                username,
                name,
                args,
            }));
        }
        return Some(IncomingEvent::Text(TextMessage {
            chat_id,
            user_id,
            username,
            text: text.to_string(),
        }));
    }

    if let Some(photos) = msg.photo() {
        // Highest resolution is last.
        let photo = photos.last()?;
        return Some(IncomingEvent::Photo(PhotoMessage {
            chat_id,
            user_id,
            username,
            file_id: photo.file.id.clone(),
            caption: msg.caption().map(|s| s.to_string()),
        }));
    }

    if let Some(doc) = msg.document() {
        return Some(IncomingEvent::Document(DocumentMessage {
            chat_id,
            user_id,
            username,
            file_id: doc.file.id.clone(),
            file_name: doc.file_name.clone(),
            caption: msg.caption().map(|s| s.to_string()),
        }));
    }

    // Voice, stickers, etc. have no meaning for any flow.
    None
}

fn convert_callback(q: &CallbackQuery) -> IncomingEvent {
    let user_id = UserId(q.from.id.0 as i64);
    let chat_id = q
        .message
        .as_ref()
        .map(|m| ChatId(m.chat.id.0))
        // Private chats share the user's id; keyboards only appear there.
        .unwrap_or(ChatId(user_id.0));

    IncomingEvent::Callback(CallbackChoice {
        chat_id,
        user_id,
        username: q.from.username.clone(),
        callback_id: q.id.clone(),
        token: q.data.clone().unwrap_or_default(),
    })
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_normalized() {
        assert_eq!(parse_command("/start"), ("start".into(), "".into()));
        assert_eq!(
            parse_command("/addvacancy@vacancy_bot"),
            ("addvacancy".into(), "".into())
        );
        assert_eq!(
            parse_command("/ViewCandidates  extra args "),
            ("viewcandidates".into(), "extra args".into())
        );
    }
}
