use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment (plus an optional `.env`
/// file that never overrides already-set variables).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,

    /// Admin allow-list seeded into the store at startup.
    pub admin_users: Vec<i64>,
    /// Optional emails aligned by position with `admin_users`.
    pub admin_emails: Vec<Option<String>>,

    // Storage
    pub data_file: PathBuf,
    pub upload_dir: PathBuf,

    // Mail relay (email leg disabled when unset)
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_users = parse_csv_i64(env_str("ADMIN_USERS"));
        if admin_users.is_empty() {
            return Err(Error::Config(
                "ADMIN_USERS environment variable is required".to_string(),
            ));
        }

        // Emails are positional; short lists pad with None.
        let mut admin_emails: Vec<Option<String>> = parse_csv(env_str("ADMIN_EMAILS"))
            .into_iter()
            .map(non_empty)
            .collect();
        admin_emails.resize(admin_users.len(), None);

        let data_file = env_path("DATA_FILE")
            .unwrap_or_else(|| PathBuf::from("/tmp/vacancy-bot/store.json"));
        let upload_dir =
            env_path("UPLOAD_DIR").unwrap_or_else(|| PathBuf::from("/tmp/vacancy-bot/uploads"));

        if let Some(parent) = data_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&upload_dir)?;

        let mail_relay_url = env_str("MAIL_RELAY_URL").and_then(non_empty);
        let mail_from =
            env_str("MAIL_FROM").unwrap_or_else(|| "vacancy-bot@localhost".to_string());

        Ok(Self {
            telegram_bot_token,
            admin_users,
            admin_emails,
            data_file,
            upload_dir,
            mail_relay_url,
            mail_from,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .collect()
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so the whole load cycle lives in one test.
    #[test]
    fn load_validates_and_parses_the_environment() {
        env::remove_var("TELEGRAM_BOT_TOKEN");
        env::remove_var("ADMIN_USERS");
        env::remove_var("ADMIN_EMAILS");

        assert!(matches!(Config::load(), Err(Error::Config(_))));

        env::set_var("TELEGRAM_BOT_TOKEN", "123:token");
        assert!(matches!(Config::load(), Err(Error::Config(_))));

        env::set_var("ADMIN_USERS", "101, 202,303");
        env::set_var("ADMIN_EMAILS", "first@example.com, ");
        let cfg = Config::load().unwrap();

        assert_eq!(cfg.admin_users, vec![101, 202, 303]);
        // Short email lists pad with None for the remaining admins.
        assert_eq!(
            cfg.admin_emails,
            vec![Some("first@example.com".to_string()), None, None]
        );
        assert_eq!(cfg.mail_relay_url, None);
        assert_eq!(cfg.mail_from, "vacancy-bot@localhost");
    }
}
