use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::{json, Value};
use tower::ServiceExt;

use lexcheck_api_server::config::Settings;
use lexcheck_api_server::models::GeminiModel;
use lexcheck_api_server::services::llm::GenerateRequest;
use lexcheck_api_server::services::{LlmError, LlmProvider};
use lexcheck_api_server::{build_router, AppState};

const BOUNDARY: &str = "lexcheck-test-boundary";

/// Records every call and answers analysis requests with a fixed result.
#[derive(Default)]
struct StubLlm {
    calls: Mutex<Vec<(String, GenerateRequest)>>,
}

fn analysis_answer() -> Value {
    json!({
        "accident_summary": "A worker fell from a scaffold",
        "is_serious_accident": true,
        "serious_accident_reason": "One fatality",
        "core_regulations": [
            { "clause_text": "제42조(추락의 방지) ① 사업주는", "explanation": "fall" },
            { "clause_text": "제42조(추락의 방지) ② 사업주는", "explanation": "fall" },
            { "clause_text": "별표 1", "explanation": "table" }
        ],
        "related_regulations": [],
        "reference_regulations": [],
        "recommended_actions": { "office_tasks": [], "field_tasks": [], "technical_measures": [] },
        "mandatory_forms": [],
        "conditional_forms": [],
        "recommended_forms": []
    })
}

#[async_trait]
impl LlmProvider for StubLlm {
    async fn generate(&self, api_key: &str, request: GenerateRequest) -> Result<String, LlmError> {
        let answer = if request.response_schema.is_some() {
            analysis_answer().to_string()
        } else {
            "plain answer".to_string()
        };
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_string(), request));
        Ok(answer)
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<(), LlmError> {
        if api_key == "valid" {
            Ok(())
        } else {
            Err(LlmError::Unauthorized("API key not valid".to_string()))
        }
    }
}

struct TestApp {
    router: Router,
    llm: Arc<StubLlm>,
    _dir: tempfile::TempDir,
}

async fn app(server_key: Option<&str>) -> TestApp {
    app_with(server_key, |_| {}).await
}

async fn app_with(server_key: Option<&str>, configure: impl FnOnce(&mut Settings)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.gemini.api_key = server_key.map(str::to_string);
    settings.history.path = dir.path().join("history.json");
    configure(&mut settings);

    let llm = Arc::new(StubLlm::default());
    let state = AppState::new(settings, llm.clone()).await.unwrap();

    TestApp {
        router: build_router(state),
        llm,
        _dir: dir,
    }
}

fn regulation_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let lines = [
        ("Article 42 (Prevention of falls)", 700),
        ("The employer shall install guard rails.", 686),
        ("Article 43 (Openings)", 640),
    ];
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
    ];
    for (text, y) in lines {
        operations.push(Operation::new(
            "Tm",
            vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), y.into()],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations }.encode().unwrap(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let kids: Vec<Object> = vec![page_id.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 1,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn multipart_body(files: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(files: &[(&str, &str, Vec<u8>)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/documents")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value, user_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = user_key {
        builder = builder.header("x-gemini-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn upload_workspace(router: &Router) -> String {
    let (status, body) = send(
        router,
        upload_request(&[
            ("act.pdf", "application/pdf", regulation_pdf()),
            ("decree.pdf", "application/pdf", regulation_pdf()),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["workspace_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app(None).await;
    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app.router, get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["server_api_key"], false);
}

#[tokio::test]
async fn test_upload_creates_workspace() {
    let app = app(Some("server-key")).await;
    let id = upload_workspace(&app.router).await;

    let (status, body) = send(&app.router, get(&format!("/api/workspaces/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_names"], json!(["act.pdf", "decree.pdf"]));
    // Two paragraphs per document.
    assert_eq!(body["chunk_count"], 4);
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let app = app(Some("server-key")).await;
    let (status, body) = send(
        &app.router,
        upload_request(&[("notes.txt", "text/plain", b"hello".to_vec())]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("notes.txt"));
}

#[tokio::test]
async fn test_upload_over_body_limit_is_payload_too_large() {
    let app = app_with(Some("server-key"), |s| s.server.max_body_mb = 1).await;
    let mut oversized = b"%PDF-1.5\n".to_vec();
    oversized.resize(2 * 1024 * 1024, b'0');

    let (status, body) = send(
        &app.router,
        upload_request(&[("huge.pdf", "application/pdf", oversized)]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "PayloadTooLarge");
}

#[tokio::test]
async fn test_upload_rejects_corrupt_pdf() {
    let app = app(Some("server-key")).await;
    let (status, body) = send(
        &app.router,
        upload_request(&[("broken.pdf", "application/pdf", b"%PDF-1.5 nothing".to_vec())]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "UnprocessableDocument");
}

#[tokio::test]
async fn test_analyze_with_server_key_uses_flash_and_records_history() {
    let app = app(Some("server-key")).await;
    let id = upload_workspace(&app.router).await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/workspaces/{}/analyze", id),
            json!({ "query": "A worker fell from a scaffold" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["model"], "gemini-2.5-flash");
    assert_eq!(body["result"]["is_serious_accident"], true);
    assert_eq!(body["grouped_regulations"]["core"][0]["article"], "제42조(추락의 방지)");
    assert_eq!(body["grouped_regulations"]["core"][0]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["grouped_regulations"]["core"][1]["article"], "기타 조항");

    {
        let calls = app.llm.calls.lock().unwrap();
        let (key, request) = &calls[0];
        assert_eq!(key, "server-key");
        assert_eq!(request.model, GeminiModel::Flash);
        assert!(request.turns[0].text.contains("\n\n---\n\n"));
        assert!(request.turns[0].text.contains("--- START OF act.pdf ---"));
    }

    let (status, history) = send(&app.router, get("/api/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["file_name"], "act.pdf, decree.pdf");
    assert_eq!(history[0]["id"], body["history_id"]);
}

#[tokio::test]
async fn test_user_key_defaults_to_pro() {
    let app = app(None).await;
    let id = upload_workspace(&app.router).await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/workspaces/{}/analyze", id),
            json!({ "query": "fall" }),
            Some("user-key"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "gemini-2.5-pro");
    assert_eq!(app.llm.calls.lock().unwrap()[0].0, "user-key");
}

#[tokio::test]
async fn test_pro_without_user_key_is_forbidden() {
    let app = app(Some("server-key")).await;
    let id = upload_workspace(&app.router).await;

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/workspaces/{}/analyze", id),
            json!({ "query": "fall", "model": "gemini-2.5-pro" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.llm.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_key_is_unauthorized() {
    let app = app(None).await;
    let id = upload_workspace(&app.router).await;

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/workspaces/{}/analyze", id),
            json!({ "query": "fall" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_workspace() {
    let app = app(Some("server-key")).await;
    let id = upload_workspace(&app.router).await;
    let uri = format!("/api/workspaces/{}", id);

    let delete = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assistant_session_from_history() {
    let app = app(Some("server-key")).await;
    let id = upload_workspace(&app.router).await;
    let (_, analysis) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/workspaces/{}/analyze", id),
            json!({ "query": "fall" }),
            None,
        ),
    )
    .await;

    let (status, session) = send(
        &app.router,
        json_request(
            "POST",
            "/api/assistant/sessions",
            json!({ "history_id": analysis["history_id"] }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, reply) = send(
        &app.router,
        json_request(
            "POST",
            &format!(
                "/api/assistant/sessions/{}/messages",
                session["session_id"].as_str().unwrap()
            ),
            json!({ "message": "Who must be notified?" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["reply"], "plain answer");

    let calls = app.llm.calls.lock().unwrap();
    let (_, request) = calls.last().unwrap();
    assert_eq!(request.model, GeminiModel::Flash);
    assert!(request
        .system_instruction
        .as_deref()
        .unwrap()
        .contains("A worker fell from a scaffold"));
}

#[tokio::test]
async fn test_form_guide() {
    let app = app(Some("server-key")).await;
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/forms/guide",
            json!({
                "form_name": "산업재해조사표",
                "related_law": "시행규칙 제73조",
                "query": "fall",
                "template": "name: ___"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["guide"], "plain answer");
}

#[tokio::test]
async fn test_verify_api_key_and_models() {
    let app = app(Some("server-key")).await;

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/api-key/verify", json!({ "api_key": "valid" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/api-key/verify", json!({ "api_key": "nope" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "API key not valid");

    let (status, body) = send(&app.router, get("/api/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default_model"], "gemini-2.5-flash");
    assert_eq!(body["models"][0]["id"], "gemini-2.5-pro");
    assert_eq!(body["models"][0]["available"], false);
}

#[tokio::test]
async fn test_clear_history() {
    let app = app(Some("server-key")).await;
    let delete = Request::builder()
        .method("DELETE")
        .uri("/api/history")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, get(&format!("/api/history/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}
