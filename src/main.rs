use actix_web::{web, App, HttpServer};
use ailza_helpdesk::notify::{LogNotifier, Notifier};
use ailza_helpdesk::responder::MessengerResponder;
use ailza_helpdesk::server::{self, AppState};
use ailza_helpdesk::store::JsonFileStore;
use ailza_helpdesk::{DialogueEngine, EngineConfig, KnowledgeBase, Settings};
use anyhow::{Context, Result};
use std::sync::Arc;

#[cfg(feature = "email")]
fn build_notifier(settings: &Settings) -> Result<Arc<dyn Notifier>> {
    if settings.notify.smtp_host.is_empty() {
        return Ok(Arc::new(LogNotifier));
    }
    let notifier = ailza_helpdesk::notify::SmtpNotifier::new(&settings.notify)
        .context("Invalid [notify] SMTP settings")?;
    log::info!("Emailing committed forms through {}", settings.notify.smtp_host);
    Ok(Arc::new(notifier))
}

#[cfg(not(feature = "email"))]
fn build_notifier(_settings: &Settings) -> Result<Arc<dyn Notifier>> {
    Ok(Arc::new(LogNotifier))
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load("Config").context("Failed to load configuration")?;

    let kb = KnowledgeBase::load_from_file(&settings.data.knowledge_base_file).with_context(|| {
        format!(
            "Failed to load knowledge base from '{}'",
            settings.data.knowledge_base_file
        )
    })?;
    log::info!(
        "Loaded {} dialogue entries and {} phrases",
        kb.len(),
        kb.phrases().len()
    );
    if !kb.dangling_replies().is_empty() {
        log::warn!(
            "{} offered replies match no question and will fall back to fuzzy lookup",
            kb.dangling_replies().len()
        );
    }

    let store = JsonFileStore::new(&settings.data.store_dir)
        .with_context(|| format!("Cannot use store directory '{}'", settings.data.store_dir))?;
    if settings.messenger.page_access_token.is_empty() {
        log::warn!("messenger.page_access_token is empty; the Send API will reject replies");
    }
    let responder = MessengerResponder::new(&settings.messenger);

    let engine = DialogueEngine::new(
        kb,
        Arc::new(responder),
        Arc::new(store),
        build_notifier(&settings)?,
        EngineConfig::from_settings(&settings),
    );
    let data = web::Data::new(AppState {
        engine: Arc::new(engine),
        verify_token: settings.messenger.verify_token.clone(),
    });

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let webhook_path = settings.server.webhook_path.clone();

    log::info!("Starting server at http://{}:{}{}", host, port, webhook_path);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(|cfg| server::configure(cfg, &webhook_path))
    })
    .bind((host, port))?
    .run()
    .await?;
    Ok(())
}
