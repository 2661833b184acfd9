use crate::conversation::DialogueEngine;
use crate::event::WebhookBatch;
use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub struct AppState {
    pub engine: Arc<DialogueEngine>,
    pub verify_token: String,
}

#[derive(Deserialize, Debug)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

async fn verify(query: web::Query<VerifyQuery>, data: web::Data<AppState>) -> impl Responder {
    let subscribed = query.mode.as_deref() == Some("subscribe")
        && query.verify_token.as_deref() == Some(data.verify_token.as_str())
        && !data.verify_token.is_empty();
    if subscribed {
        log::info!("Webhook verified");
        HttpResponse::Ok().body(query.challenge.clone().unwrap_or_default())
    } else {
        log::warn!("Webhook verification failed");
        HttpResponse::Forbidden().finish()
    }
}

async fn receive(batch: web::Json<WebhookBatch>, data: web::Data<AppState>) -> impl Responder {
    let batch = batch.into_inner();
    if !batch.is_page() {
        return HttpResponse::NotFound().finish();
    }
    for event in batch.into_events() {
        data.engine.handle_turn(event).await;
    }
    HttpResponse::Ok().body("EVENT_RECEIVED")
}

#[get("/health")]
async fn health(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "entries": data.engine.knowledge_base().len(),
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig, webhook_path: &str) {
    cfg.service(health).service(
        web::resource(webhook_path)
            .route(web::get().to(verify))
            .route(web::post().to(receive)),
    );
}
