//! End-to-end tests of a small notes service through the test client.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bamboo::config::{AppConfig, HeaderEntry};
use bamboo::prelude::*;
use bamboo_test::TestClient;
use serde::{Deserialize, Serialize};
use serde_json::json;

type Store = Arc<Mutex<BTreeMap<i64, Note>>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Note {
    id: i64,
    text: String,
}

#[derive(Deserialize)]
struct NewNote {
    text: String,
}

struct Notes {
    store: Store,
}

impl Notes {
    fn list(&mut self, ctx: &mut Context) -> HandlerResult {
        let notes: Vec<Note> = self
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("store poisoned"))?
            .values()
            .cloned()
            .collect();
        ctx.send_json(&notes)?;
        Ok(())
    }

    fn create(&mut self, ctx: &mut Context) -> HandlerResult {
        let body = ctx.read_body()?;
        let new: NewNote = serde_json::from_slice(&body)
            .map_err(|e| {
                ErrorResponse::api(
                    StatusCode::BAD_REQUEST,
                    ApiError::new(4001).developer_message(format!("invalid note: {e}")),
                )
            })?;

        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("store poisoned"))?;
        let id = store.keys().next_back().map_or(1, |last| last + 1);
        let note = Note { id, text: new.text };
        store.insert(id, note.clone());

        ctx.set_status(StatusCode::CREATED);
        ctx.add_header("Location", format!("/notes/{id}"));
        ctx.send_json(&note)?;
        Ok(())
    }
}

impl Endpoint for Notes {
    fn methods() -> MethodTable<Self> {
        MethodTable::new().get(Self::list).post(Self::create)
    }
}

struct NoteItem {
    store: Store,
}

impl NoteItem {
    fn id(ctx: &Context) -> i64 {
        ctx.param_int("id").unwrap_or_default()
    }

    fn get(&mut self, ctx: &mut Context) -> HandlerResult {
        let id = Self::id(ctx);
        let note = self
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("store poisoned"))?
            .get(&id)
            .cloned()
            .ok_or_else(ErrorResponse::not_found)?;
        ctx.send_json(&note)?;
        Ok(())
    }

    fn delete(&mut self, ctx: &mut Context) -> HandlerResult {
        let id = Self::id(ctx);
        self.store
            .lock()
            .map_err(|_| anyhow::anyhow!("store poisoned"))?
            .remove(&id);
        ctx.send_only_status(StatusCode::NO_CONTENT)?;
        Ok(())
    }
}

impl Endpoint for NoteItem {
    fn methods() -> MethodTable<Self> {
        MethodTable::new().get(Self::get).delete(Self::delete)
    }
}

struct Exploding;

impl Exploding {
    fn get(&mut self, _ctx: &mut Context) -> HandlerResult {
        Err(anyhow::anyhow!("disk on fire").into())
    }
}

impl Endpoint for Exploding {
    fn methods() -> MethodTable<Self> {
        MethodTable::new().get(Self::get)
    }
}

fn notes_client(debug: bool) -> (TestClient, Arc<AtomicUsize>) {
    let config = AppConfig {
        debug,
        default_headers: vec![HeaderEntry::new("Server", "notes")],
        ..AppConfig::default()
    };
    let mut app = Application::from_config(&config);

    let failures = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&failures);
    app.set_error_hook(move |_report| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let store: Store = Arc::default();
    let list_store = Arc::clone(&store);
    app.route_versioned("/notes", &[1], move |_: &Context| Notes {
        store: Arc::clone(&list_store),
    })
    .unwrap();
    app.route_versioned("/notes/{id:int}", &[1], move |_: &Context| NoteItem {
        store: Arc::clone(&store),
    })
    .unwrap();
    app.route("/boom", |_: &Context| Exploding).unwrap();

    (TestClient::new(app), failures)
}

#[test]
fn test_create_then_fetch() {
    let (client, _) = notes_client(false);

    let created = client.post("/v1/notes").json(&json!({"text": "buy milk"})).send();
    created
        .assert_status(StatusCode::CREATED)
        .assert_header("Location", "/notes/1")
        .assert_header("Server", "notes")
        .assert_content_type("application/json");
    let note: Note = created.json().unwrap();
    assert_eq!(note, Note { id: 1, text: "buy milk".into() });

    client
        .get("/v1/notes/1")
        .send()
        .assert_status(StatusCode::OK)
        .assert_json_field("text", &json!("buy milk"));

    client
        .get("/v1/notes")
        .send()
        .assert_json_eq(&json!([{"id": 1, "text": "buy milk"}]));
}

#[test]
fn test_delete_has_no_body() {
    let (client, _) = notes_client(false);
    client.post("/v1/notes").json(&json!({"text": "x"})).send();

    let response = client.delete("/v1/notes/1").send();
    response
        .assert_status(StatusCode::NO_CONTENT)
        .assert_body_eq("");

    client
        .get("/v1/notes/1")
        .send()
        .assert_status(StatusCode::NOT_FOUND);
}

#[test]
fn test_unversioned_path_is_not_routed() {
    let (client, _) = notes_client(false);
    client
        .get("/notes")
        .send()
        .assert_status(StatusCode::NOT_FOUND)
        .assert_header("Server", "notes");
}

#[test]
fn test_non_numeric_id_is_not_found() {
    let (client, failures) = notes_client(false);
    client
        .get("/v1/notes/abc")
        .send()
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalid_payload_is_api_error() {
    let (client, failures) = notes_client(false);
    let response = client
        .post("/v1/notes")
        .content_type("application/json")
        .body("not json")
        .send();

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_body_contains("invalid note");
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[test]
fn test_method_not_allowed() {
    let (client, _) = notes_client(false);
    client
        .put("/v1/notes/1")
        .send()
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_header("Allow", "GET, DELETE");
}

#[test]
fn test_failure_hides_details_in_production() {
    let (client, failures) = notes_client(false);
    let response = client.get("/boom").send();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().unwrap().contains("disk on fire"));
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    client.get("/v1/notes").send().assert_success();
}

#[test]
fn test_failure_shows_details_in_debug() {
    let (client, failures) = notes_client(true);
    client
        .get("/boom")
        .send()
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_content_type("text/plain")
        .assert_body_contains("disk on fire");
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}
