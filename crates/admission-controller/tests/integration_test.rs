mod common;

use std::{net::SocketAddr, time::Duration};

use admission_controller::{
    admission_review::AdmissionReviewResponse,
    policy::{INVALID_OBJECT_MESSAGE, POLICY_VIOLATION_MESSAGE},
    MAX_REQUEST_BODY_BYTES,
};
use axum::{
    body::Body,
    http::{self, header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rstest::*;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::oneshot,
};
use tower::ServiceExt;

use common::{default_test_config, friday_app, server, weekday_app};

fn validate_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri("/validate")
        .body(body.into())
        .unwrap()
}

async fn admission_review_response(app: Router, body: &'static str) -> AdmissionReviewResponse {
    let response = app.oneshot(validate_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let content_length: usize = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.len(), content_length);

    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_validate_denies_on_friday() {
    let review = admission_review_response(
        friday_app(),
        include_str!("data/deployment_web_prod.json"),
    )
    .await;

    assert_eq!(review.api_version, "admission.k8s.io/v1");
    assert_eq!(review.kind, "AdmissionReview");
    assert_eq!(review.response.uid, "abc-123");
    assert!(!review.response.allowed);
    assert_eq!(review.response.status.message, POLICY_VIOLATION_MESSAGE);
}

#[tokio::test]
async fn test_validate_allows_on_other_days() {
    let review = admission_review_response(
        weekday_app(),
        include_str!("data/deployment_web_prod.json"),
    )
    .await;

    assert_eq!(review.response.uid, "abc-123");
    assert!(review.response.allowed);
    assert_eq!(review.response.status.message, "");
}

#[tokio::test]
#[rstest]
#[case::friday(friday_app())]
#[case::other_day(weekday_app())]
async fn test_validate_invalid_deployment(#[case] app: Router) {
    let review =
        admission_review_response(app, include_str!("data/invalid_deployment.json")).await;

    assert_eq!(review.response.uid, "abc-123");
    assert!(!review.response.allowed);
    assert_eq!(review.response.status.message, INVALID_OBJECT_MESSAGE);
}

#[tokio::test]
#[rstest]
#[case::friday(friday_app(), false)]
#[case::other_day(weekday_app(), true)]
async fn test_validate_without_object(#[case] app: Router, #[case] expected_allowed: bool) {
    let review =
        admission_review_response(app, include_str!("data/delete_without_object.json")).await;

    assert_eq!(review.response.uid, "e911857d-c318-11e8-bbad-025000000001");
    assert_eq!(review.response.allowed, expected_allowed);
}

#[tokio::test]
async fn test_validate_response_shape() {
    let response = weekday_app()
        .oneshot(validate_request(include_str!("data/deployment_web_prod.json")))
        .await
        .unwrap();
    let body: serde_json::Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();

    assert_eq!(
        body,
        serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "response": {
                "uid": "abc-123",
                "allowed": true,
                "status": {"message": ""}
            }
        })
    );
}

#[tokio::test]
#[rstest]
#[case::not_json("this is not an AdmissionReview")]
#[case::empty("")]
#[case::no_request(r#"{"apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview"}"#)]
#[case::no_uid(r#"{"request": {"object": {"apiVersion": "apps/v1", "kind": "Deployment"}}}"#)]
#[case::other_version(
    r#"{"apiVersion": "admission.k8s.io/v1beta1", "kind": "AdmissionReview", "request": {"uid": "abc-123"}}"#
)]
async fn test_validate_invalid_payload(#[case] payload: &'static str) {
    let response = friday_app()
        .oneshot(validate_request(payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    assert_eq!(body["status"], 400);
    assert!(body.get("response").is_none());
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error decoding admission request"));
}

#[tokio::test]
async fn test_validate_oversized_body() {
    let payload = vec![b' '; MAX_REQUEST_BODY_BYTES + 1];

    let response = weekday_app()
        .oneshot(validate_request(payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_requires_post() {
    let request = Request::builder()
        .method(http::Method::GET)
        .uri("/validate")
        .body(Body::empty())
        .unwrap();

    let response = weekday_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_path() {
    let response = weekday_app()
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri("/mutate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_readiness() {
    let request = Request::builder()
        .uri("/readiness")
        .body(Body::empty())
        .unwrap();

    let response = weekday_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_identical_requests_get_identical_responses() {
    let app = friday_app();

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(validate_request(include_str!("data/deployment_web_prod.json")))
            .await
            .unwrap();
        bodies.push(response.into_body().collect().await.unwrap().to_bytes());
    }

    assert_eq!(bodies[0], bodies[1]);
}

fn raw_validate_request() -> Vec<u8> {
    let body = include_str!("data/deployment_web_prod.json");
    format!(
        "POST /validate HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

async fn readiness_over_tcp(addr: SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /readiness HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    reply
}

#[tokio::test(flavor = "multi_thread")]
async fn test_serve_and_shutdown() {
    let server = server(&default_test_config(), || false);
    let handle = server.handle();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let running = tokio::spawn(server.run_until(async move {
        let _ = shutdown_rx.await;
    }));

    let addr = tokio::time::timeout(Duration::from_secs(5), handle.listening())
        .await
        .expect("server should start listening")
        .expect("server should be bound to an address");

    let reply = readiness_over_tcp(addr).await;
    assert!(reply.starts_with("HTTP/1.1 200"), "unexpected reply: {reply}");

    // the client hangs up without reading its verdict
    let mut gone = TcpStream::connect(addr).await.unwrap();
    gone.write_all(&raw_validate_request()).await.unwrap();
    drop(gone);

    let reply = readiness_over_tcp(addr).await;
    assert!(reply.starts_with("HTTP/1.1 200"), "unexpected reply: {reply}");

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(15), running)
        .await
        .expect("server should shut down")
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_validate_over_tcp() {
    let server = server(&default_test_config(), || true);
    let handle = server.handle();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let running = tokio::spawn(server.run_until(async move {
        let _ = shutdown_rx.await;
    }));
    let addr = tokio::time::timeout(Duration::from_secs(5), handle.listening())
        .await
        .unwrap()
        .unwrap();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&raw_validate_request()).await.unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();

    assert!(reply.starts_with("HTTP/1.1 200"), "unexpected reply: {reply}");
    let body = reply.split("\r\n\r\n").nth(1).unwrap();
    let review: AdmissionReviewResponse = serde_json::from_str(body).unwrap();
    assert_eq!(review.response.uid, "abc-123");
    assert!(!review.response.allowed);
    assert_eq!(review.response.status.message, POLICY_VIOLATION_MESSAGE);

    shutdown_tx.send(()).unwrap();
    running.await.unwrap().unwrap();
}
