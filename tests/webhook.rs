mod common;

use actix_web::{http::StatusCode, test, web, App};
use ailza_helpdesk::server::{self, AppState};
use ailza_helpdesk::store::StoreKind;
use common::{harness, Sent};
use serde_json::json;
use std::sync::Arc;

const TOKEN: &str = "s3cret";

fn state(engine: ailza_helpdesk::DialogueEngine) -> web::Data<AppState> {
    web::Data::new(AppState {
        engine: Arc::new(engine),
        verify_token: TOKEN.to_string(),
    })
}

#[actix_web::test]
async fn verification_echoes_the_challenge() {
    let h = harness();
    let app = test::init_service(
        App::new()
            .app_data(state(h.engine))
            .configure(|cfg| server::configure(cfg, "/webhook")),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/webhook?hub.mode=subscribe&hub.verify_token=s3cret&hub.challenge=1158201444")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "1158201444");

    let req = test::TestRequest::get()
        .uri("/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get().uri("/webhook").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn page_events_reach_the_dialogue_engine() {
    let h = harness();
    let responder = h.responder.clone();
    let sink = h.sink.clone();
    let app = test::init_service(
        App::new()
            .app_data(state(h.engine))
            .configure(|cfg| server::configure(cfg, "/webhook")),
    )
    .await;

    let batch = json!({
        "object": "page",
        "entry": [{
            "messaging": [
                {"sender": {"id": "u1"}, "message": {"text": "Admissions"}},
                {"sender": {"id": "u1"}, "message": {"text": "xyz123 qqq"}},
                {"sender": {"id": "page"}, "message": {"is_echo": true, "text": "Admissions"}},
                {"sender": {"id": "u1"}, "delivery": {"watermark": 1}}
            ]
        }]
    });
    let req = test::TestRequest::post().uri("/webhook").set_json(&batch).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "EVENT_RECEIVED");

    let messages = responder.messages();
    assert_eq!(messages.len(), 3);
    assert!(matches!(messages[1], Sent::QuickReplies(..)));
    assert_eq!(sink.records(StoreKind::ConversationLog).len(), 1);
    assert_eq!(sink.records(StoreKind::UnknownQuestions).len(), 1);
    assert!(responder.all().iter().all(|(to, _)| to == "u1"));
}

#[actix_web::test]
async fn other_objects_are_not_found() {
    let h = harness();
    let responder = h.responder.clone();
    let app = test::init_service(
        App::new()
            .app_data(state(h.engine))
            .configure(|cfg| server::configure(cfg, "/webhook")),
    )
    .await;

    let batch = json!({
        "object": "instagram",
        "entry": [{"messaging": [{"sender": {"id": "u1"}, "message": {"text": "Hi"}}]}]
    });
    let req = test::TestRequest::post().uri("/webhook").set_json(&batch).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(responder.all().is_empty());
}

#[actix_web::test]
async fn health_reports_the_knowledge_base_size() {
    let h = harness();
    let entries = h.engine.knowledge_base().len();
    let app = test::init_service(
        App::new()
            .app_data(state(h.engine))
            .configure(|cfg| server::configure(cfg, "/webhook")),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["entries"], entries);
}
