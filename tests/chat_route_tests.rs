mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{test_db, test_state, FakeLookup, TestDb};

const UID: &str = "42";

async fn test_app() -> (Router, TestDb) {
    let handle = test_db().await;
    let lookup = FakeLookup::new()
        .with("cat", "кот", &["The cat sat on the mat."])
        .with("dog", "собака", &["The dog barked all night."])
        .with("bird", "птица", &["A bird flew over the house."]);
    let state = test_state(handle.db.clone(), lookup);
    (vocabot::create_app(state), handle)
}

async fn send(app: &Router, uid: &str, text: &str) -> Vec<String> {
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "uid": uid, "text": text })).unwrap(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["messages"]
        .as_array()
        .expect("messages array")
        .iter()
        .map(|m| m.as_str().unwrap_or_default().to_string())
        .collect()
}

async fn logged_actions(db: &vocabot::db::Database, uid: &str) -> Vec<String> {
    sqlx::query_scalar(
        r#"SELECT "action" FROM "user_actions" WHERE "uid" = $1 ORDER BY "id" ASC"#,
    )
    .bind(uid)
    .fetch_all(db.pool())
    .await
    .unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _db) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn empty_uid_is_a_bad_request() {
    let (app, _db) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "uid": "  ", "text": "/start" })).unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn adding_and_listing_words_via_chat() {
    let (app, db) = test_app().await;

    let reply = send(&app, UID, "cat").await;
    assert!(reply[0].starts_with("New word:\ncat - кот"));
    assert!(reply[0].contains("The cat sat on the mat."));

    let reply = send(&app, UID, "cat").await;
    assert!(reply[0].starts_with("Already in your dictionary"));

    let reply = send(&app, UID, "/voc").await;
    assert!(reply[0].contains("1 words"));
    assert!(reply[0].contains("cat - кот"));

    let actions = logged_actions(&db.db, UID).await;
    assert_eq!(actions, vec!["add_word", "add_word", "voc"]);
}

#[tokio::test]
async fn unknown_word_suggests_manual_add() {
    let (app, db) = test_app().await;

    let reply = send(&app, UID, "frobnicate").await;
    assert!(reply[0].contains("/add"));

    let reply = send(&app, UID, "/add frobnicate - выдумывать").await;
    assert_eq!(reply[0], "Added \"frobnicate\"");

    let reply = send(&app, UID, "/voc").await;
    assert!(reply[0].contains("frobnicate - выдумывать"));

    let actions = logged_actions(&db.db, UID).await;
    assert_eq!(actions, vec!["add_word_fail", "add_manual", "voc"]);
}

#[tokio::test]
async fn deleting_an_unknown_word_reports_failure() {
    let (app, db) = test_app().await;

    let reply = send(&app, UID, "/delete cat").await;
    assert_eq!(reply[0], "I don't have that word in your dictionary.");

    let actions = logged_actions(&db.db, UID).await;
    assert_eq!(actions, vec!["delete_word_fail"]);
}

#[tokio::test]
async fn answering_without_a_quiz_is_a_gentle_nudge() {
    let (app, _db) = test_app().await;

    let reply = send(&app, UID, "2").await;
    assert_eq!(reply[0], "There is no quiz running. Send /play to start one.");
}

#[tokio::test]
async fn play_needs_three_words() {
    let (app, _db) = test_app().await;

    send(&app, UID, "cat").await;
    send(&app, UID, "dog").await;

    let reply = send(&app, UID, "/play").await;
    assert!(reply[0].contains("at least 3 words"));
}

#[tokio::test]
async fn full_quiz_exchange_over_chat() {
    let (app, _db) = test_app().await;

    for word in ["cat", "dog", "bird"] {
        send(&app, UID, word).await;
    }

    let reply = send(&app, UID, "/play").await;
    assert_eq!(reply.len(), 2);
    assert!(reply[1].contains("1. "));
    assert!(reply[1].contains("3. "));

    // Whatever we answer, the bot scores it and either continues or ends.
    let reply = send(&app, UID, "1").await;
    assert!(reply[0].contains("Score for"));
    assert!(reply.last().unwrap().contains("Send the number") || reply.last().unwrap().contains("that's it for now"));

    let reply = send(&app, UID, "0").await;
    assert_eq!(reply[0], "Come play again soon!");

    let reply = send(&app, UID, "1").await;
    assert_eq!(reply[0], "There is no quiz running. Send /play to start one.");
}

#[tokio::test]
async fn cyrillic_text_is_translated_not_stored() {
    let (app, db) = test_app().await;

    // The fake lookup knows "cat" only, so a Cyrillic word fails politely.
    let reply = send(&app, UID, "собака").await;
    assert_eq!(reply[0], "Oops, I couldn't translate that.");

    let reply = send(&app, UID, "/voc").await;
    assert!(reply[0].contains("empty"));

    let actions = logged_actions(&db.db, UID).await;
    assert_eq!(actions, vec!["translate_russian_fail", "voc"]);
}

#[tokio::test]
async fn start_registers_the_user_once() {
    let (app, db) = test_app().await;

    send(&app, UID, "/start").await;
    send(&app, UID, "/start").await;

    let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "users" WHERE "uid" = $1"#)
        .bind(UID)
        .fetch_one(db.db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn stats_over_chat_mention_counts() {
    let (app, _db) = test_app().await;

    send(&app, UID, "cat").await;
    let reply = send(&app, UID, "/stats").await;
    assert!(reply[0].contains("Out of 1 added words"));
}
