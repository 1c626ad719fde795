use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadflow_relay::models::WebhookAction;
use leadflow_relay::utils::verify_signature;
use leadflow_relay::{build_router, AppState, Config, RelayConfig, SigningMode};

const SECRET: &str = "test-secret";
const ALLOWED: &str = "https://leadflow.vistalivretech.com.br";

fn relay_config(server: &MockServer) -> RelayConfig {
    let mut relay = RelayConfig {
        secret: Some(SECRET.to_string()),
        ..Default::default()
    };
    for (action, route) in [
        (WebhookAction::Launch, "/hook/launch"),
        (WebhookAction::Resume, "/hook/resume"),
        (WebhookAction::ValidatePhone, "/hook/validate"),
    ] {
        relay
            .destinations
            .insert(action, format!("{}{}", server.uri(), route));
    }
    relay
}

fn app(relay: RelayConfig) -> Router {
    app_with_request_timeout(relay, 30)
}

fn app_with_request_timeout(relay: RelayConfig, request_timeout_secs: u64) -> Router {
    let config = Config {
        environment: "test".to_string(),
        port: 0,
        request_timeout_secs,
        relay,
    };
    build_router(AppState::new(config, None).unwrap())
}

fn post(uri: &str, origin: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

#[tokio::test]
async fn test_launch_is_signed_and_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook/launch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "started": true })))
        .expect(1)
        .mount(&server)
        .await;

    let body = r#"{"campaign_id":"c-1"}"#;
    let mut request = post("/webhook/launch", Some("http://localhost:5173"), body);
    request
        .headers_mut()
        .insert("cf-connecting-ip", "203.0.113.9".parse().unwrap());

    let (status, _, reply) = call(app(relay_config(&server)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        reply,
        json!({ "success": true, "status": 200, "data": { "started": true } })
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let forwarded = &received[0];
    assert_eq!(forwarded.body, body.as_bytes());
    assert_eq!(forwarded.headers["content-type"], "application/json");
    assert_eq!(forwarded.headers["x-webhook-action"], "launch");
    assert_eq!(forwarded.headers["x-forwarded-for"], "203.0.113.9");

    let timestamp: i64 = forwarded.headers["x-webhook-timestamp"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let signature = forwarded.headers["x-webhook-signature"].to_str().unwrap();
    assert!(verify_signature(SECRET, &forwarded.body, timestamp, signature));
    server.verify().await;
}

#[tokio::test]
async fn test_downstream_failure_status_and_raw_body_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook/resume"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Workflow not found"))
        .mount(&server)
        .await;

    let (status, _, reply) = call(
        app(relay_config(&server)),
        post("/webhook/resume", None, r#"{"campaign_id":"c-1"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        reply,
        json!({ "success": false, "status": 404, "data": { "raw": "Workflow not found" } })
    );
}

#[tokio::test]
async fn test_unknown_action_is_rejected_without_forwarding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _, reply) = call(
        app(relay_config(&server)),
        post("/webhook/unknown", None, "{}"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Unknown action: unknown");
    assert_eq!(
        reply["validActions"],
        json!(["launch", "pause", "resume", "validate_phone"])
    );
    server.verify().await;
}

#[tokio::test]
async fn test_unconfigured_action_is_server_error() {
    let server = MockServer::start().await;
    let (status, _, reply) = call(
        app(relay_config(&server)),
        post("/webhook/pause", None, r#"{"campaign_id":"c-1"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply, json!({ "error": "Webhook pause not configured" }));
}

#[tokio::test]
async fn test_cors_echoes_trusted_origins_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (_, headers, _) = call(
        app(relay_config(&server)),
        post("/webhook/launch", Some("http://localhost:5173"), "{}"),
    )
    .await;
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );

    let (_, headers, _) = call(
        app(relay_config(&server)),
        post("/webhook/launch", Some("https://evil.example.com"), "{}"),
    )
    .await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
}

#[tokio::test]
async fn test_cors_headers_on_gate_failures() {
    let server = MockServer::start().await;
    let (status, headers, _) = call(
        app(relay_config(&server)),
        post("/webhook/unknown", Some("http://127.0.0.1:3000"), "{}"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://127.0.0.1:3000"
    );
}

#[tokio::test]
async fn test_preflight_is_answered_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/webhook/launch")
        .header(header::ORIGIN, ALLOWED)
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = call(app(relay_config(&server)), request).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED);
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    server.verify().await;
}

#[tokio::test]
async fn test_non_post_methods_are_rejected() {
    let server = MockServer::start().await;
    for uri in ["/webhook/launch", "/somewhere/else"] {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, _, reply) = call(app(relay_config(&server)), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
        assert_eq!(reply, json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn test_post_outside_webhook_path_is_invalid_path() {
    let server = MockServer::start().await;
    for uri in ["/", "/webhook", "/webhook/launch/extra", "/webhook/launch-now"] {
        let (status, _, reply) = call(app(relay_config(&server)), post(uri, None, "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(reply, json!({ "error": "Invalid path. Use /webhook/{action}" }));
    }
}

#[tokio::test]
async fn test_missing_secret_forwards_unsigned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("x-webhook-timestamp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let relay = RelayConfig {
        secret: None,
        ..relay_config(&server)
    };
    let (status, _, _) = call(app(relay), post("/webhook/launch", None, "{}")).await;
    assert_eq!(status, StatusCode::OK);

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("x-webhook-signature").is_none());
    assert!(received[0].headers.get("x-forwarded-for").is_none());
    server.verify().await;
}

#[tokio::test]
async fn test_embedded_mode_signs_enriched_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook/launch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let relay = RelayConfig {
        signing_mode: SigningMode::Embedded,
        ..relay_config(&server)
    };
    let (status, _, _) = call(
        app(relay),
        post("/webhook/launch", None, r#"{"campaign_id":"c-9"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let received = server.received_requests().await.unwrap();
    let forwarded = &received[0];
    let timestamp: i64 = forwarded.headers["x-webhook-timestamp"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body: Value = serde_json::from_slice(&forwarded.body).unwrap();
    assert_eq!(body["campaign_id"], "c-9");
    assert_eq!(body["action"], "launch");
    assert_eq!(body["timestamp"], timestamp);

    let signature = forwarded.headers["x-webhook-signature"].to_str().unwrap();
    assert!(verify_signature(SECRET, &forwarded.body, timestamp, signature));
}

#[tokio::test]
async fn test_embedded_mode_rejects_non_object_body() {
    let server = MockServer::start().await;
    let relay = RelayConfig {
        signing_mode: SigningMode::Embedded,
        ..relay_config(&server)
    };
    let (status, _, reply) = call(app(relay), post("/webhook/launch", None, "[1,2,3]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].as_str().unwrap().starts_with("Invalid body"));
}

#[tokio::test]
async fn test_enforced_origin_blocks_third_parties() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let relay = RelayConfig {
        enforce_origin: true,
        ..relay_config(&server)
    };

    let (status, _, reply) = call(
        app(relay.clone()),
        post("/webhook/launch", Some("https://evil.example.com"), "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply, json!({ "error": "Forbidden" }));

    let (status, _, _) = call(app(relay), post("/webhook/launch", Some(ALLOWED), "{}")).await;
    assert_eq!(status, StatusCode::OK);
    server.verify().await;
}

#[tokio::test]
async fn test_validate_phone_requires_lead_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _, reply) = call(
        app(relay_config(&server)),
        post(
            "/webhook/validate_phone",
            None,
            r#"{"lead":{"id":"l-1","nome":"Ana","telefone":""}}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid validate_phone input"));

    let (status, _, reply) = call(
        app(relay_config(&server)),
        post(
            "/webhook/validate_phone",
            None,
            r#"{"lead":{"id":"l-1","nome":"Ana","telefone":"+5511999990000"}}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["data"], json!({ "valid": true }));
    server.verify().await;
}

#[tokio::test]
async fn test_slow_downstream_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let relay = RelayConfig {
        forward_timeout_secs: 1,
        ..relay_config(&server)
    };
    let (status, _, reply) = call(app(relay), post("/webhook/launch", None, "{}")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply["error"], "Failed to reach downstream");
    assert!(reply["details"].is_string());
}

#[tokio::test]
async fn test_forward_timeout_below_request_timeout_keeps_json_and_cors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(std::time::Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let relay = RelayConfig {
        forward_timeout_secs: 1,
        ..relay_config(&server)
    };
    let (status, headers, reply) = call(
        app_with_request_timeout(relay, 2),
        post("/webhook/launch", Some("http://localhost:3000"), "{}"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply["error"], "Failed to reach downstream");
    assert!(reply["details"].is_string());
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = call(app(relay_config(&server)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["signing_enabled"], true);
    assert_eq!(body["signing_mode"], "proxy");
    assert_eq!(
        body["webhooks"],
        json!({ "launch": true, "pause": false, "resume": true, "validate_phone": true })
    );
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app(relay_config(&server)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_template_preview() {
    let server = MockServer::start().await;
    let request = post(
        "/templates/preview",
        None,
        r#"{"content":"{Oi|Olá} {{nome}}!","variables":{"nome":"Ana"}}"#,
    );
    let (status, _, body) = call(app(relay_config(&server)), request).await;

    assert_eq!(status, StatusCode::OK);
    let rendered = body["rendered"].as_str().unwrap();
    assert!(rendered == "Oi Ana!" || rendered == "Olá Ana!", "{}", rendered);
    assert_eq!(body["variables"], json!(["nome"]));
    assert_eq!(body["spintext_options"], json!([["Oi", "Olá"]]));
    assert_eq!(body["validation"], json!({ "valid": true }));
}
