//! HTTP mail-relay adapter.
//!
//! The bot does not speak SMTP itself; it hands each message to a relay
//! endpoint as JSON and lets the relay deliver it. The relay receives the
//! local attachment path and is expected to share the filesystem with the
//! bot (same-host deployment).

use async_trait::async_trait;
use serde::Serialize;

use vbot_core::{
    ports::{EmailPort, OutboundEmail},
    Error, Result,
};

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment_path: Option<&'a str>,
}

pub struct HttpRelayMailer {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl HttpRelayMailer {
    pub fn new(relay_url: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url,
            from,
        }
    }

    fn payload<'a>(&'a self, mail: &'a OutboundEmail) -> RelayPayload<'a> {
        RelayPayload {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            body: &mail.body,
            attachment_path: mail.attachment.as_deref().and_then(|p| p.to_str()),
        }
    }
}

#[async_trait]
impl EmailPort for HttpRelayMailer {
    async fn send(&self, mail: OutboundEmail) -> Result<()> {
        let response = self
            .client
            .post(&self.relay_url)
            .json(&self.payload(&mail))
            .send()
            .await
            .map_err(|err| Error::External(format!("mail relay unreachable: {err}")))?;

        if !response.status().is_success() {
            return Err(Error::External(format!(
                "mail relay rejected message: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn payload_carries_all_fields() {
        let mailer = HttpRelayMailer::new(
            "http://localhost:8025/send".to_string(),
            "vacancy-bot@localhost".to_string(),
        );
        let mail = OutboundEmail {
            to: "admin@example.com".to_string(),
            subject: "Новий кандидат: QA".to_string(),
            body: "summary".to_string(),
            attachment: Some(PathBuf::from("/tmp/up/resume.pdf")),
        };

        let json = serde_json::to_value(mailer.payload(&mail)).unwrap();
        assert_eq!(json["from"], "vacancy-bot@localhost");
        assert_eq!(json["to"], "admin@example.com");
        assert_eq!(json["subject"], "Новий кандидат: QA");
        assert_eq!(json["attachment_path"], "/tmp/up/resume.pdf");
    }

    #[test]
    fn attachment_is_omitted_when_absent() {
        let mailer = HttpRelayMailer::new("http://relay".to_string(), "bot@host".to_string());
        let mail = OutboundEmail {
            to: "a@b".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            attachment: None,
        };

        let json = serde_json::to_value(mailer.payload(&mail)).unwrap();
        assert!(json.get("attachment_path").is_none());
    }
}
