use std::{io::Cursor, sync::Arc};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db::DBService;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use secrecy::SecretString;
use serde_json::{Value, json};
use server::{AppState, routes};
use services::services::{
    image_ingestion::MAX_UPLOAD_BYTES,
    object_storage::{LocalStorage, StorageBackend},
    response_generator::{GenerationError, GenerationRequest, ResponseGenerator},
};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----atelier-test-boundary";

struct CannedGenerator(Result<String, GenerationError>);

#[async_trait]
impl ResponseGenerator for CannedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        self.0.clone()
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    uploads: TempDir,
}

impl TestApp {
    async fn new(reply: Result<String, GenerationError>) -> Self {
        let db = DBService::new_in_memory().await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let state = AppState::new(
            db,
            Arc::new(CannedGenerator(reply)),
            StorageBackend::Local(LocalStorage::new(uploads.path(), "/uploads")),
            uploads.path().to_path_buf(),
            SecretString::from("integration-secret".to_string()),
        );
        Self {
            router: routes::router(state.clone()),
            state,
            uploads,
        }
    }

    fn admin_token(&self) -> String {
        self.state.auth.issue_token("studio").unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn start_conversation(&self) -> String {
        let (status, body) = self
            .post_json(
                "/api/chat/conversations",
                json!({ "sessionId": "session-1" }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }
}

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_fn(300, 200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn multipart_body(fields: &[(&str, &str)], file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"room.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, body: Vec<u8>) -> Request<Body> {
    Request::post("/api/gallery/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn public_settings_default_before_any_write() {
    let app = TestApp::new(Ok("unused".to_string())).await;

    let (status, body) = app.get("/api/chat/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isEnabled"], true);
    assert_eq!(body["tone"], "professional");
    assert!(!body["welcomeMessage"].as_str().unwrap().is_empty());
    assert!(body.get("restrictToRelevantTopics").is_none());
}

#[tokio::test]
async fn generation_failure_keeps_the_visitor_message() {
    let app = TestApp::new(Err(GenerationError::Timeout)).await;
    let conversation_id = app.start_conversation().await;

    let (status, body) = app
        .post_json(
            "/api/chat/messages",
            json!({
                "conversationId": conversation_id,
                "message": "Can you help with a kitchen remodel?",
                "isFromUser": true,
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to process message");
    assert_eq!(body["error"], "generation");

    let (status, history) = app
        .get(&format!("/api/chat/conversations/{conversation_id}/messages"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["isFromUser"], true);
}

#[tokio::test]
async fn reply_directives_become_structured_fields() {
    let app = TestApp::new(Ok(
        "We'd love to help!\nWHATSAPP_BUTTON:Chat on WhatsApp:https://wa.me/15550100\nSUGGESTED_ACTION:consultation"
            .to_string(),
    ))
    .await;
    let conversation_id = app.start_conversation().await;

    let (status, body) = app
        .post_json(
            "/api/chat/messages",
            json!({
                "conversationId": conversation_id,
                "message": "How do I book a consultation?",
                "isFromUser": true,
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userMessage"]["message"], "How do I book a consultation?");
    assert_eq!(body["aiMessage"]["message"], "We'd love to help!");
    assert_eq!(body["aiMessage"]["isFromUser"], false);
    assert_eq!(body["aiMessage"]["actionButton"]["type"], "whatsapp");
    assert_eq!(body["aiMessage"]["actionButton"]["label"], "Chat on WhatsApp");
    assert_eq!(
        body["aiMessage"]["actionButton"]["action"],
        "https://wa.me/15550100"
    );
    assert_eq!(body["suggestedAction"], "consultation");
}

#[tokio::test]
async fn non_visitor_messages_are_saved_without_a_reply() {
    let app = TestApp::new(Err(GenerationError::Failed("must not be called".to_string()))).await;
    let conversation_id = app.start_conversation().await;

    let (status, body) = app
        .post_json(
            "/api/chat/messages",
            json!({
                "conversationId": conversation_id,
                "message": "An agent will join shortly.",
                "isFromUser": false,
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "An agent will join shortly.");
    assert_eq!(body["conversationId"], conversation_id.as_str());
}

#[tokio::test]
async fn malformed_chat_requests_are_rejected() {
    let app = TestApp::new(Ok("unused".to_string())).await;

    let (status, body) = app
        .post_json("/api/chat/messages", json!({ "message": "hi" }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = app
        .post_json(
            "/api/chat/conversations",
            json!({ "sessionId": "   " }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .get("/api/chat/conversations/00000000-0000-0000-0000-000000000000/messages")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn admin_operations_require_a_session() {
    let app = TestApp::new(Ok("unused".to_string())).await;

    let (status, body) = app
        .send(
            Request::put("/api/chat/settings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "tone": "casual" }).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication");

    let (status, _) = app
        .send(upload_request("not-a-token", multipart_body(&[], Some(&png_bytes()))))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.admin_token();
    let (status, body) = app
        .send(
            Request::put("/api/chat/settings")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(json!({ "tone": "casual" }).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tone"], "casual");

    let (_, public) = app.get("/api/chat/settings").await;
    assert_eq!(public["tone"], "casual");
}

#[tokio::test]
async fn login_issues_a_session_token() {
    let app = TestApp::new(Ok("unused".to_string())).await;
    app.state
        .auth
        .ensure_admin("studio", "correct horse")
        .await
        .unwrap();

    let (status, _) = app
        .post_json(
            "/api/admin/login",
            json!({ "username": "studio", "password": "wrong" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post_json(
            "/api/admin/login",
            json!({ "username": "studio", "password": "correct horse" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "studio");
    let token = body["token"].as_str().unwrap();

    let (status, session) = app
        .send(
            Request::get("/api/admin/session")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["username"], "studio");
}

#[tokio::test]
async fn gallery_record_is_created_only_with_full_metadata() {
    let app = TestApp::new(Ok("unused".to_string())).await;
    let token = app.admin_token();
    let png = png_bytes();

    let (status, body) = app
        .send(upload_request(
            &token,
            multipart_body(&[("category", "residential")], Some(&png)),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["upload"]["originalUrl"].as_str().unwrap().starts_with("/uploads/"));
    assert!(body.get("galleryImage").is_none());
    let filename = body["upload"]["filename"].as_str().unwrap().to_string();
    assert!(app.uploads.path().join(&filename).exists());

    let (status, body) = app
        .send(upload_request(
            &token,
            multipart_body(
                &[
                    ("category", "residential"),
                    ("title", "Sunlit living room"),
                    ("subcategory", "living-room"),
                    ("description", "Light oak and soft linen"),
                    ("featured", "true"),
                ],
                Some(&png),
            ),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let image = &body["galleryImage"];
    assert_eq!(image["title"], "Sunlit living room");
    assert_eq!(image["category"], "residential");
    assert_eq!(image["featured"], true);
    assert_eq!(image["imageUrl"], body["upload"]["originalUrl"]);
    assert_eq!(image["thumbnailUrl"], body["upload"]["thumbnailUrl"]);

    let served = app
        .router
        .clone()
        .oneshot(
            Request::get(format!("/uploads/{filename}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);

    let (_, listing) = app.get("/api/gallery?category=residential").await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let id = image["id"].as_str().unwrap();
    let delete = || {
        Request::delete(format!("/api/gallery/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(app.send(delete()).await.0, StatusCode::OK);
    assert_eq!(app.send(delete()).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_a_file_is_a_bad_request() {
    let app = TestApp::new(Ok("unused".to_string())).await;
    let token = app.admin_token();

    let (status, body) = app
        .send(upload_request(
            &token,
            multipart_body(&[("title", "No image")], None),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file provided");
}

#[tokio::test]
async fn oversized_uploads_are_rejected_with_one_status() {
    let app = TestApp::new(Ok("unused".to_string())).await;
    let token = app.admin_token();

    for size in [MAX_UPLOAD_BYTES + 1, MAX_UPLOAD_BYTES + 128 * 1024] {
        let (status, body) = app
            .send(upload_request(
                &token,
                multipart_body(&[], Some(&vec![0u8; size])),
            ))
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "size {size}");
        assert_eq!(body["error"], "payload_too_large");
        assert_eq!(body["message"], "File exceeds the 10 MiB limit");
    }
    assert!(std::fs::read_dir(app.uploads.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn knowledge_base_entries_feed_admin_crud() {
    let app = TestApp::new(Ok("unused".to_string())).await;
    let token = app.admin_token();

    let (status, entry) = app
        .post_json(
            "/api/chat/knowledge-base",
            json!({
                "title": "Consultations",
                "content": "First consultation is free.",
                "category": "services",
            }),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["isActive"], true);

    let (status, list) = app
        .send(
            Request::get("/api/chat/knowledge-base")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/chat/knowledge-base").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new(Ok("unused".to_string())).await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
