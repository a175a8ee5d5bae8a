use std::sync::Arc;

use vbot_core::{
    config::Config,
    domain::{Admin, UserId},
    ports::{EmailPort, StorePort},
};
use vbot_mailer::HttpRelayMailer;
use vbot_store::JsonStore;

#[tokio::main]
async fn main() -> Result<(), vbot_core::Error> {
    vbot_core::logging::init("vbot");

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn StorePort> = Arc::new(JsonStore::open(cfg.data_file.clone()).await?);
    seed_admins(&cfg, store.as_ref()).await?;

    let mailer: Option<Arc<dyn EmailPort>> = cfg.mail_relay_url.clone().map(|url| {
        Arc::new(HttpRelayMailer::new(url, cfg.mail_from.clone())) as Arc<dyn EmailPort>
    });
    if mailer.is_none() {
        tracing::info!("MAIL_RELAY_URL not set, email notifications disabled");
    }

    vbot_telegram::router::run_polling(cfg, store, mailer)
        .await
        .map_err(|e| vbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}

/// Keep the persisted allow-list in sync with the configured one.
async fn seed_admins(cfg: &Config, store: &dyn StorePort) -> Result<(), vbot_core::Error> {
    for (idx, &user_id) in cfg.admin_users.iter().enumerate() {
        let existing = store
            .admins()
            .await?
            .into_iter()
            .find(|a| a.user_id == UserId(user_id));

        let email = cfg
            .admin_emails
            .get(idx)
            .cloned()
            .flatten()
            .or_else(|| existing.as_ref().and_then(|a| a.email.clone()));

        store
            .upsert_admin(Admin {
                id: existing.as_ref().map(|a| a.id).unwrap_or(0),
                user_id: UserId(user_id),
                username: existing.and_then(|a| a.username),
                email,
                is_super_admin: false,
            })
            .await?;
    }
    Ok(())
}
