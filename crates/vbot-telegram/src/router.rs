use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use vbot_core::{
    config::Config,
    messaging::port::MessagingPort,
    ports::{EmailPort, StorePort},
    router::Router,
};

use crate::handlers;
use crate::TelegramMessenger;

pub struct AppState {
    pub router: Router,
}

/// Build the Telegram side and run long polling until the process stops.
pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<dyn StorePort>,
    mailer: Option<Arc<dyn EmailPort>>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!(username = me.username(), "vacancy bot started");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let router = Router::new(store, messenger, mailer, cfg.upload_dir.clone());
    let state = Arc::new(AppState { router });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
