use job_autofill::bridge::{Background, HttpBackground};
use job_autofill::config::{Endpoints, ProviderConfig};
use job_autofill::form::{FieldDescriptor, FormControl};
use job_autofill::{ApiError, BackendClient, ExtensionStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::from_control(&FormControl::input("email").with_name("email"), 0, 0),
        FieldDescriptor::from_control(&FormControl::input("text").with_id("phone-number"), 0, 1),
    ]
}

#[tokio::test]
async fn autofill_posts_descriptors_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/autofill/generate"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({
            "form_fields": [
                {"name": "email", "type": "email", "formIndex": 0, "inputIndex": 0},
                {"name": "phone-number", "type": "text", "formIndex": 0, "inputIndex": 1}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "autofill_data": {
                "email": "jane@example.com",
                "years": 7,
                "skills": ["Rust", "SQL"],
                "address": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap().authorized("tok-1");
    let data = client.generate_autofill(&descriptors()).await.unwrap();

    assert_eq!(data.get("email"), Some("jane@example.com"));
    assert_eq!(data.get("years"), Some("7"));
    assert_eq!(data.get("skills"), Some("Rust, SQL"));
    assert_eq!(data.get("address"), None);
}

#[tokio::test]
async fn missing_autofill_data_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/autofill/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap();
    assert!(client.generate_autofill(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn login_sends_credentials_and_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "jane@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-abc",
            "user_id": "u1",
            "message": "Login successful"
        })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap();
    let auth = client.login("jane@example.com", "hunter2").await.unwrap();
    assert_eq!(auth.access_token, "jwt-abc");
    assert_eq!(auth.user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn register_includes_payment_intent_when_given() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "email": "new@example.com",
            "password": "pw",
            "payment_intent_id": "pi_123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt-new"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap();
    let auth = client
        .register("new@example.com", "pw", Some("pi_123".into()))
        .await
        .unwrap();
    assert_eq!(auth.access_token, "jwt-new");
}

#[tokio::test]
async fn unauthorized_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Token has expired"})))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap().authorized("old");
    let err = client.current_user().await.unwrap_err();
    assert!(ApiError::is_unauthorized(&err));
    assert_eq!(err.to_string(), "Unauthorized: Token has expired");
}

#[tokio::test]
async fn server_error_keeps_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/stats"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Admin access required"})))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap().authorized("t");
    let err = client.admin_stats().await.unwrap_err();
    assert!(!ApiError::is_unauthorized(&err));
    assert_eq!(err.to_string(), "Backend returned 403 Forbidden: Admin access required");
}

#[tokio::test]
async fn onboarding_envelope_is_unwrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/onboarding/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"first_name": "Jane"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/onboarding/save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Missing required fields"
        })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap().authorized("t");
    assert_eq!(client.get_onboarding().await.unwrap(), json!({"first_name": "Jane"}));

    let err = client.save_onboarding(&json!({})).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing required fields");
}

#[tokio::test]
async fn cv_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cv/upload"))
        .and(body_string_contains("name=\"cv_file\""))
        .and(body_string_contains("filename=\"resume.txt\""))
        .and(body_string_contains("Jane Doe, Rust engineer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"name": "Jane Doe"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("resume.txt");
    std::fs::write(&file, "Jane Doe, Rust engineer").unwrap();

    let client = BackendClient::new(&server.uri()).unwrap().authorized("t");
    assert_eq!(client.upload_cv(&file).await.unwrap(), json!({"name": "Jane Doe"}));
}

#[tokio::test]
async fn cv_upload_accepts_scanned_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cv/upload"))
        .and(body_string_contains("filename=\"scan.jpg\""))
        .and(body_string_contains("image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"name": "Jane Doe"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("scan.jpg");
    std::fs::write(&file, "not really a jpeg").unwrap();

    let client = BackendClient::new(&server.uri()).unwrap().authorized("t");
    assert_eq!(client.upload_cv(&file).await.unwrap(), json!({"name": "Jane Doe"}));
}

#[tokio::test]
async fn cv_upload_rejects_unknown_extension_before_sending() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("resume.zip");
    std::fs::write(&file, [0u8; 4]).unwrap();

    let client = BackendClient::new(&server.uri()).unwrap();
    assert!(client.upload_cv(&file).await.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn jobs_are_grouped_by_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "https://www.example.com/careers": [
                {"title": "Rust Engineer", "link": "https://example.com/1", "is_remote": true,
                 "technologies": ["Rust"], "salary": "100k"}
            ]
        })))
        .mount(&server)
        .await;

    let client = BackendClient::new(&server.uri()).unwrap();
    let sources = client.list_jobs().await.unwrap();
    let jobs = &sources["https://www.example.com/careers"];
    assert_eq!(jobs[0].title, "Rust Engineer");
    assert!(jobs[0].is_remote);
    assert_eq!(jobs[0].extra["salary"], "100k");
}

#[tokio::test]
async fn http_background_uses_stored_token_and_unwraps_job_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/extract"))
        .and(header("authorization", "Bearer stored"))
        .and(body_partial_json(json!({
            "url": "https://jobs.example.com/1",
            "config": {"apiProvider": "openai", "apiKey": "sk"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobData": {"title": "Rust Engineer"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = ExtensionStore::in_memory();
    store.set_auth_token("stored").await.unwrap();
    let background = HttpBackground::new(
        BackendClient::new(&server.uri()).unwrap(),
        store,
        Endpoints::default(),
    );
    let config = ProviderConfig {
        api_provider: Some("openai".into()),
        api_key: Some("sk".into()),
    };

    let job = background
        .extract_job_data("Senior Rust Engineer", "https://jobs.example.com/1", &config)
        .await
        .unwrap();
    assert_eq!(job, json!({"title": "Rust Engineer"}));
}

#[tokio::test]
async fn http_background_requires_token_for_user_data() {
    let server = MockServer::start().await;
    let background = HttpBackground::new(
        BackendClient::new(&server.uri()).unwrap(),
        ExtensionStore::in_memory(),
        Endpoints::default(),
    );

    let err = background.get_user_data().await.unwrap_err();
    assert_eq!(err.to_string(), "Not authenticated");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn http_background_reads_generated_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/autofill/answer"))
        .and(body_partial_json(json!({"field": {"name": "email"}, "job": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "jane@example.com"})))
        .mount(&server)
        .await;

    let background = HttpBackground::new(
        BackendClient::new(&server.uri()).unwrap(),
        ExtensionStore::in_memory(),
        Endpoints::default(),
    );
    let answer = background
        .generate_answer(&descriptors()[0], None, &json!({}), &ProviderConfig::default())
        .await
        .unwrap();
    assert_eq!(answer, "jane@example.com");
}
