//! Integration tests for the typed client against a mock API server.

mod support;

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use auth0_transport::{
    BearerAuth, Client, RateLimitConfig, RateLimiterRegistry, RetryPolicy, RetryTransport,
    TransportDoer, TransportError,
    http::{HttpConfig, HttpTransport},
};
use serde::{Deserialize, Serialize};
use support::{MockServer, Reply};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    #[serde(rename = "user_id")]
    id: String,
    email: String,
}

#[derive(Serialize)]
struct NewUser<'a> {
    email: &'a str,
    connection: &'a str,
}

fn client(server: &MockServer, api: &str) -> Client {
    let config = HttpConfig::builder(server.url(api)).build().unwrap();
    Client::from_config(&config).unwrap()
}

fn doer_client(server: &MockServer, doer: TransportDoer<impl auth0_transport::Transport>) -> Client {
    Client::new(server.url("/api/v2"), Arc::new(doer))
}

fn http(server: &MockServer) -> HttpTransport {
    HttpTransport::new(&HttpConfig::new(server.url("/"))).unwrap()
}

#[tokio::test]
async fn test_get_decodes_user() {
    let server = MockServer::start(|req| {
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/api/v2/users/abc123");
        Reply::json(200, r#"{"user_id":"abc123","email":"a@b.com"}"#)
    })
    .await;

    let user: Option<User> = client(&server, "/api/v2").get("/users/abc123").await.unwrap();
    let user = user.unwrap();

    assert_eq!(user.id, "abc123");
    assert_eq!(user.email, "a@b.com");
}

#[tokio::test]
async fn test_error_body_is_returned_verbatim() {
    let server = MockServer::start(|_| {
        Reply::json(
            404,
            r#"{"statusCode":404,"error":"Not Found","message":"The user does not exist."}"#,
        )
    })
    .await;

    let err = client(&server, "/api/v2")
        .get::<User>("/users/missing")
        .await
        .unwrap_err();

    let api = err.api_error().unwrap();
    assert_eq!(api.status_code, 404);
    assert_eq!(api.http_error, "Not Found");
    assert_eq!(api.message, "The user does not exist.");
    assert_eq!(err.to_string(), "auth0: 404 Not Found (The user does not exist.)");
}

#[tokio::test]
async fn test_empty_error_body_uses_status_line() {
    let server = MockServer::start(|_| Reply::empty(503)).await;

    let err = client(&server, "/api/v2")
        .get::<User>("/users/abc123")
        .await
        .unwrap_err();

    let api = err.api_error().unwrap();
    assert_eq!(api.status_code, 503);
    assert_eq!(api.http_error, "503 Service Unavailable");
    assert!(api.message.is_empty());
}

#[tokio::test]
async fn test_malformed_error_body() {
    let server = MockServer::start(|_| Reply::json(500, "<html>oops</html>")).await;

    let err = client(&server, "/api/v2")
        .get::<User>("/users/abc123")
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Deserialization { .. }));
}

#[tokio::test]
async fn test_success_without_body() {
    let server = MockServer::start(|_| Reply::empty(204)).await;

    let result: Option<User> = client(&server, "/api/v2")
        .delete("/users/abc123")
        .await
        .unwrap();
    assert!(result.is_none());

    let requests = server.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_malformed_success_body_is_fatal() {
    let server = MockServer::start(|_| Reply::json(200, r#"{"user_id": 42}"#)).await;

    let err = client(&server, "/api/v2")
        .get::<User>("/users/abc123")
        .await
        .unwrap_err();

    match err {
        TransportError::Deserialization { body, .. } => {
            assert_eq!(body.as_deref(), Some(r#"{"user_id": 42}"#))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_post_sends_json() {
    let server = MockServer::start(|req| {
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.json()["email"], "new@b.com");
        Reply::json(201, r#"{"user_id":"auth0|1","email":"new@b.com"}"#)
    })
    .await;

    let created: Option<User> = client(&server, "/api/v2")
        .post(
            "/users",
            &NewUser {
                email: "new@b.com",
                connection: "Username-Password-Authentication",
            },
        )
        .await
        .unwrap();

    assert_eq!(created.unwrap().id, "auth0|1");
}

#[tokio::test]
async fn test_get_has_no_content_type() {
    let server = MockServer::start(|_| Reply::json(200, "[]")).await;

    let _: Option<Vec<User>> = client(&server, "/api/v2").get("/users").await.unwrap();

    assert!(server.requests()[0].header("content-type").is_none());
}

#[tokio::test]
async fn test_blank_headers_are_not_sent() {
    let server = MockServer::start(|_| Reply::json(200, "{}")).await;

    let mut headers = HashMap::new();
    headers.insert("X-Correlation-Id".to_string(), "abc".to_string());
    headers.insert("X-Empty".to_string(), "   ".to_string());
    headers.insert(" ".to_string(), "orphan".to_string());

    let _: Option<serde_json::Value> = client(&server, "/api/v2")
        .get_with_headers("/users", &headers)
        .await
        .unwrap();

    let request = &server.requests()[0];
    assert_eq!(request.header("x-correlation-id"), Some("abc"));
    assert!(request.header("x-empty").is_none());
    assert!(!request.headers.values().any(|v| v == "orphan"));
}

#[tokio::test]
async fn test_trailing_slash_in_base() {
    let server = MockServer::start(|_| Reply::json(200, "{}")).await;

    let _: Option<serde_json::Value> = client(&server, "/api/v2/").get("/users").await.unwrap();

    assert_eq!(server.requests()[0].path, "/api/v2/users");
}

#[tokio::test]
async fn test_repeated_get_is_independent() {
    let server = MockServer::start(|_| Reply::json(200, r#"{"user_id":"x","email":"x@b.com"}"#)).await;
    let client = client(&server, "/api/v2");

    let first: User = client.get("/users/x").await.unwrap().unwrap();
    let second: User = client.get("/users/x").await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(server.request_count(), 2);
}

#[tokio::test]
async fn test_delete_with_body() {
    let server = MockServer::start(|_| Reply::empty(204)).await;

    let _: Option<()> = client(&server, "/api/v2")
        .delete_with_body("/groups/g1/roles", &["r1", "r2"])
        .await
        .unwrap();

    let request = &server.requests()[0];
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.json(), serde_json::json!(["r1", "r2"]));
    assert!(request.header("content-type").is_none());
}

#[tokio::test]
async fn test_marshal_failure_sends_nothing() {
    let server = MockServer::start(|_| Reply::empty(204)).await;

    let mut body = BTreeMap::new();
    body.insert(vec![1u8, 2], "not a string key");

    let err = client(&server, "/api/v2")
        .post::<_, serde_json::Value>("/users", &body)
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Serialization(_)));
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn test_bearer_auth() {
    let server = MockServer::start(|req| {
        assert_eq!(req.header("authorization"), Some("Bearer mgmt-token"));
        Reply::json(200, "{}")
    })
    .await;

    let doer = TransportDoer::new(http(&server)).with_auth(Arc::new(BearerAuth::new("mgmt-token")));
    let _: Option<serde_json::Value> = doer_client(&server, doer).get("/users").await.unwrap();
}

#[tokio::test]
async fn test_retry_on_429() {
    let server = MockServer::start(|_| Reply::empty(429)).await;
    let retry = RetryTransport::new(
        http(&server),
        RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(50)),
    );

    let err = doer_client(&server, TransportDoer::new(retry))
        .get::<User>("/users/abc123")
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(429));
    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn test_retry_recovers() {
    let calls = AtomicUsize::new(0);
    let server = MockServer::start(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::empty(429).header("retry-after", "0")
        } else {
            Reply::json(200, r#"{"user_id":"abc123","email":"a@b.com"}"#)
        }
    })
    .await;
    let retry = RetryTransport::new(http(&server), RetryPolicy::default());

    let user: Option<User> = doer_client(&server, TransportDoer::new(retry))
        .get("/users/abc123")
        .await
        .unwrap();

    assert_eq!(user.unwrap().id, "abc123");
    assert_eq!(server.request_count(), 2);
}

#[tokio::test]
async fn test_server_errors_are_not_retried() {
    let server = MockServer::start(|_| Reply::empty(500)).await;
    let retry = RetryTransport::new(
        http(&server),
        RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(50)),
    );

    let err = doer_client(&server, TransportDoer::new(retry))
        .get::<User>("/users/abc123")
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn test_connection_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = HttpConfig::builder(format!("http://{addr}/api/v2"))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let err = Client::from_config(&config)
        .unwrap()
        .get::<User>("/users/abc123")
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Http { .. }));
    assert!(err.to_string().starts_with("cannot complete request"));
}

#[tokio::test]
async fn test_count() {
    let server = MockServer::start(|req| {
        assert_eq!(req.query_param("page").as_deref(), Some("0"));
        assert_eq!(req.query_param("per_page").as_deref(), Some("1"));
        assert_eq!(req.query_param("include_totals").as_deref(), Some("true"));
        match req.path.as_str() {
            "/api/v2/users" => Reply::json(200, r#"{"total":1234,"users":[{}]}"#),
            "/api/v2/logs" => Reply::json(200, "[]"),
            _ => Reply::json(200, r#"{"connections":[]}"#),
        }
    })
    .await;
    let client = client(&server, "/api/v2");

    assert_eq!(client.count("/users").await.unwrap(), 1234);

    let err = client.count("/connections").await.unwrap_err();
    assert!(err.to_string().contains("no total record count returned"));

    let err = client.count("/logs").await.unwrap_err();
    assert!(err.to_string().contains("unable to process response"));
}

#[tokio::test]
async fn test_requests_share_route_limiter() {
    let server = MockServer::start(|_| Reply::json(200, "{}")).await;
    let registry = Arc::new(RateLimiterRegistry::with_config(RateLimitConfig::new(100.0, 10)));
    let doer = TransportDoer::new(http(&server)).with_rate_limits(Arc::clone(&registry));
    let client = doer_client(&server, doer);

    for id in ["a", "b"] {
        let _: Option<serde_json::Value> = client.get(&format!("/users/{id}")).await.unwrap();
    }
    let _: Option<serde_json::Value> = client.get("/users/a").await.unwrap();

    assert_eq!(registry.len(), 2);
    registry.set_rate(1.0).unwrap();
    let limiter = registry.acquire(auth0_transport::Method::Get, "/api/v2/users/a");
    assert_eq!(limiter.rate(), 1.0);
}
