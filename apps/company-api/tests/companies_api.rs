//! HTTP-level tests against in-memory store and publisher

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use company_api::{
    auth::{issue_token, TokenVerifier},
    routes::create_router,
    AppState,
};
use company_domain::{
    company::{CompanyId, CompanyService, EventKind, ServiceConfig, UuidV7Generator},
    testing::{InMemoryCompanyRepository, RecordingPublisher},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    repository: InMemoryCompanyRepository,
    publisher: RecordingPublisher,
    token: String,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    fn with_config(config: ServiceConfig) -> Self {
        let repository = InMemoryCompanyRepository::new();
        let publisher = RecordingPublisher::new();
        let service = CompanyService::new(
            repository.clone(),
            publisher.clone(),
            UuidV7Generator,
            config,
        );
        let state = AppState::new(service, TokenVerifier::new(SECRET), CancellationToken::new());
        let token = issue_token(SECRET, "testuser", chrono::Duration::hours(1)).unwrap();

        Self {
            router: create_router(state),
            repository,
            publisher,
            token,
        }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Option<Value>) {
        let token = self.token.clone();
        self.call_with_token(method, uri, body, Some(&token)).await
    }

    async fn call_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Option<Value>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).ok();
        (status, json)
    }
}

fn acme() -> Value {
    json!({
        "name": "Acme",
        "description": "Makes everything",
        "employeeCount": 10,
        "isRegistered": true,
        "type": "NonProfit"
    })
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app
        .call_with_token(Method::GET, "/api-docs/openapi.json", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert!(body["paths"]["/companies"].is_object());
    assert!(body["paths"]["/companies/{id}"].is_object());
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .call_with_token(Method::POST, "/companies", Some(acme()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.unwrap()["error"].is_string());

    let (status, _) = app
        .call_with_token(Method::POST, "/companies", Some(acme()), Some("garbage"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = issue_token("other-secret", "mallory", chrono::Duration::hours(1)).unwrap();
    let (status, _) = app
        .call_with_token(Method::POST, "/companies", Some(acme()), Some(&foreign))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(app.repository.is_empty());
    assert!(app.publisher.messages().is_empty());
}

#[tokio::test]
async fn test_company_lifecycle() {
    let app = TestApp::new();

    let (status, created) = app.call(Method::POST, "/companies", Some(acme())).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = created.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(CompanyId::parse(&id).is_ok());
    assert_eq!(created["name"], "Acme");
    assert_eq!(created["employeeCount"], 10);
    assert_eq!(created["type"], "NonProfit");

    let (status, fetched) = app.call(Method::GET, &format!("/companies/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched.unwrap(), created);

    let (status, _) = app
        .call(
            Method::PATCH,
            &format!("/companies/{id}"),
            Some(json!({ "employeeCount": 20 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = app.call(Method::GET, &format!("/companies/{id}"), None).await;
    let fetched = fetched.unwrap();
    assert_eq!(fetched["employeeCount"], 20);
    assert_eq!(fetched["name"], "Acme");
    assert_eq!(fetched["description"], "Makes everything");

    let (status, _) = app.call(Method::DELETE, &format!("/companies/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call(Method::GET, &format!("/companies/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.unwrap()["error"].as_str().unwrap().contains(&id));

    let messages = app.publisher.messages();
    let kinds: Vec<EventKind> = messages.iter().map(|m| m.event().unwrap().kind).collect();
    assert_eq!(kinds, vec![EventKind::Created, EventKind::Updated, EventKind::Deleted]);

    let company_id = CompanyId::parse(&id).unwrap();
    for message in &messages {
        assert_eq!(message.stream, "company-events");
        assert_eq!(message.key, company_id.as_bytes().to_vec());
    }
    assert_eq!(messages[1].event().unwrap().company.employee_count(), 20);
    assert_eq!(messages[2].event().unwrap().company.employee_count(), 20);
}

#[tokio::test]
async fn test_duplicate_name_is_a_conflict() {
    let app = TestApp::new();

    let (status, _) = app.call(Method::POST, "/companies", Some(acme())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.call(Method::POST, "/companies", Some(acme())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.unwrap()["error"].as_str().unwrap().contains("Acme"));

    assert_eq!(app.repository.len(), 1);
    assert_eq!(app.publisher.messages().len(), 1);
}

#[tokio::test]
async fn test_invalid_input_is_a_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .call(Method::POST, "/companies", Some(json!({ "name": "Acme" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut blank = acme();
    blank["name"] = json!("   ");
    let (status, _) = app.call(Method::POST, "/companies", Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut negative = acme();
    negative["employeeCount"] = json!(-1);
    let (status, _) = app.call(Method::POST, "/companies", Some(negative)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call(Method::GET, "/companies/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.repository.is_empty());
    assert!(app.publisher.messages().is_empty());
}

#[tokio::test]
async fn test_bad_patches_are_rejected() {
    let app = TestApp::new();
    let (_, created) = app.call(Method::POST, "/companies", Some(acme())).await;
    let id = created.unwrap()["id"].as_str().unwrap().to_string();
    let uri = format!("/companies/{id}");

    let (status, _) = app.call(Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call(Method::PATCH, &uri, Some(json!({ "founded": 1999 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PATCH, &uri, Some(json!({ "id": CompanyId::new().to_string() })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/companies/{}", CompanyId::new());
    let (status, _) = app
        .call(Method::PATCH, &missing, Some(json!({ "employeeCount": 5 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.publisher.messages().len(), 1);
}

#[tokio::test]
async fn test_null_on_non_nullable_field_is_rejected() {
    let app = TestApp::new();
    let (_, created) = app.call(Method::POST, "/companies", Some(acme())).await;
    let id = created.unwrap()["id"].as_str().unwrap().to_string();
    let uri = format!("/companies/{id}");

    let (status, body) = app
        .call(Method::PATCH, &uri, Some(json!({ "name": null, "employeeCount": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.unwrap()["error"].as_str().unwrap().contains("'name'"));

    let (status, _) = app
        .call(Method::PATCH, &uri, Some(json!({ "isRegistered": null })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = app.call(Method::GET, &uri, None).await;
    let fetched = fetched.unwrap();
    assert_eq!(fetched["employeeCount"], 10);
    assert_eq!(fetched["isRegistered"], true);
    assert_eq!(app.publisher.messages().len(), 1);
}

#[tokio::test]
async fn test_patch_can_clear_description() {
    let app = TestApp::new();
    let (_, created) = app.call(Method::POST, "/companies", Some(acme())).await;
    let id = created.unwrap()["id"].as_str().unwrap().to_string();
    let uri = format!("/companies/{id}");

    let (status, _) = app
        .call(Method::PATCH, &uri, Some(json!({ "description": null })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = app.call(Method::GET, &uri, None).await;
    assert!(fetched.unwrap().get("description").is_none());
}

#[tokio::test]
async fn test_publish_failure_after_write_is_a_server_error() {
    let app = TestApp::new();
    app.publisher.set_failing(true);

    let (status, body) = app.call(Method::POST, "/companies", Some(acme())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.unwrap()["error"].as_str().unwrap().contains("not published"));
    assert_eq!(app.repository.len(), 1);
    assert!(app.publisher.messages().is_empty());
}

#[tokio::test]
async fn test_events_can_be_disabled() {
    let app = TestApp::with_config(ServiceConfig {
        emit_events: false,
        ..ServiceConfig::default()
    });

    let (status, _) = app.call(Method::POST, "/companies", Some(acme())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.repository.len(), 1);
    assert!(app.publisher.messages().is_empty());
}
