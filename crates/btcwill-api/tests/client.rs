//! ApiClient against an in-process stub HTTP server

use btcwill_api::{ApiClient, ApiError, WillBackend};
use btcwill_form::WillPayload;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct Route {
    method: &'static str,
    path: &'static str,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

fn json(method: &'static str, path: &'static str, status: u16, body: &str) -> Route {
    Route {
        method,
        path,
        status,
        content_type: "application/json",
        body: body.as_bytes().to_vec(),
    }
}

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

type Log = Arc<Mutex<Vec<Seen>>>;

/// Serve `routes` under `/api`; one request per connection
async fn serve(routes: Vec<Route>) -> (String, Log) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let seen = log.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let routes = routes.clone();
            let seen = seen.clone();
            tokio::spawn(async move { handle(stream, &routes, &seen).await });
        }
    });

    (format!("http://{}/api", addr), log)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn handle(mut stream: TcpStream, routes: &[Route], log: &Mutex<Vec<Seen>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default();
    let path = target.strip_prefix("/api").unwrap_or(target).to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    log.lock().unwrap().push(Seen {
        method: method.clone(),
        path: path.clone(),
        authorization,
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    });

    let (status, content_type, body) =
        match routes.iter().find(|r| r.method == method && r.path == path) {
            Some(r) => (r.status, r.content_type, r.body.clone()),
            None => (404, "application/json", br#"{"message":"no route"}"#.to_vec()),
        };
    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}

fn client(base: &str, token: Option<&str>) -> ApiClient {
    let mut client = ApiClient::new(base, None).unwrap();
    client.set_token(token);
    client
}

#[tokio::test]
async fn test_login_returns_token() {
    let (base, log) = serve(vec![json(
        "POST",
        "/auth/login",
        200,
        r#"{"access_token": "tok-1", "user": {"id": 3, "email": "a@example.com"}}"#,
    )])
    .await;

    let auth = client(&base, None)
        .login("a@example.com", "hunter2")
        .await
        .unwrap();
    assert_eq!(auth.access_token, "tok-1");
    assert_eq!(auth.user.unwrap().id, Some(3));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.method, "POST");
    assert!(seen.authorization.is_none());
    let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body["email"], "a@example.com");
    assert_eq!(body["password"], "hunter2");
}

#[tokio::test]
async fn test_login_failure_keeps_server_message() {
    let (base, _) = serve(vec![json(
        "POST",
        "/auth/login",
        401,
        r#"{"message": "Invalid credentials"}"#,
    )])
    .await;

    let err = client(&base, None).login("a@example.com", "x").await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_bearer_token_sent() {
    let (base, log) = serve(vec![json(
        "GET",
        "/auth/me",
        200,
        r#"{"id": 3, "email": "a@example.com"}"#,
    )])
    .await;

    let user = client(&base, Some("tok-1")).me().await.unwrap();
    assert_eq!(user.email, "a@example.com");
    assert_eq!(
        log.lock().unwrap()[0].authorization.as_deref(),
        Some("Bearer tok-1")
    );
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let (base, _) = serve(vec![json(
        "GET",
        "/will/list",
        401,
        r#"{"message": "Token expired"}"#,
    )])
    .await;

    let err = client(&base, Some("stale")).list_wills().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_list_wills_shapes() {
    let (base, _) = serve(vec![json(
        "GET",
        "/will/list",
        200,
        r#"[{"id": 1, "title": "My Will", "testator_name": "Satoshi", "status": "draft",
             "created_at": "2024-01-02T03:04:05"}]"#,
    )])
    .await;
    let wills = client(&base, Some("t")).list_wills().await.unwrap();
    assert_eq!(wills.len(), 1);
    assert_eq!(wills[0].testator_name, "Satoshi");

    let (base, _) = serve(vec![json(
        "GET",
        "/will/list",
        200,
        r#"{"wills": [{"id": 1}, {"id": 2}]}"#,
    )])
    .await;
    let wills = client(&base, Some("t")).list_wills().await.unwrap();
    assert_eq!(wills.iter().map(|w| w.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (base, _) = serve(vec![json("GET", "/subscription/status", 200, "<html>")]).await;
    let err = client(&base, Some("t"))
        .subscription_status()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
}

#[tokio::test]
async fn test_get_will_parses_lenient_record() {
    let (base, _) = serve(vec![json(
        "GET",
        "/will/7",
        200,
        r#"{"id": 7, "personal_info": "{\"full_name\": \"Satoshi\"}",
            "bitcoin_assets": {"wallets": [{"name": "Trezor", "type": "hardware"}]}}"#,
    )])
    .await;

    let record = client(&base, Some("t")).get_will(7).await.unwrap();
    assert_eq!(record.personal_info.unwrap().full_name, "Satoshi");
    assert_eq!(record.assets.unwrap().wallets[0].wallet_type, "hardware");
}

#[tokio::test]
async fn test_create_and_update_send_payload() {
    let (base, log) = serve(vec![
        json("POST", "/will/create", 201, r#"{"id": 11, "message": "created"}"#),
        json("PUT", "/will/11", 200, ""),
    ])
    .await;

    let mut payload = WillPayload::default();
    payload.personal_info.full_name = "Satoshi".into();
    payload.assets.wallets.push(btcwill_form::Wallet {
        wallet_type: "paper".into(),
        ..Default::default()
    });

    let api = client(&base, Some("t"));
    let saved = api.create_will(&payload).await.unwrap();
    assert_eq!(saved.id, Some(11));
    let updated = api.update_will(11, &payload).await.unwrap();
    assert_eq!(updated.id, Some(11));

    let seen = log.lock().unwrap().clone();
    assert_eq!(seen[1].method, "PUT");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["personal_info"]["full_name"], "Satoshi");
    assert_eq!(body["assets"]["wallets"][0]["type"], "paper");
    assert!(body["beneficiaries"]["primary"].is_array());
}

#[tokio::test]
async fn test_download_and_session_pdf() {
    let pdf = b"%PDF-1.7 fake".to_vec();
    let (base, _) = serve(vec![
        Route {
            method: "GET",
            path: "/will/5/download",
            status: 200,
            content_type: "application/pdf",
            body: pdf.clone(),
        },
        Route {
            method: "POST",
            path: "/will/generate-session",
            status: 200,
            content_type: "application/pdf",
            body: pdf.clone(),
        },
        json("GET", "/will/6/download", 500, ""),
    ])
    .await;

    let api = client(&base, Some("t"));
    assert_eq!(api.download_will(5).await.unwrap(), pdf);
    assert_eq!(
        api.generate_session_will(&WillPayload::default()).await.unwrap(),
        pdf
    );
    match api.download_will(6).await.unwrap_err() {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert!(message.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_subscription_endpoints() {
    let (base, log) = serve(vec![
        json(
            "POST",
            "/subscription/create-checkout-session",
            200,
            r#"{"checkout_url": "https://checkout.example/s1"}"#,
        ),
        json(
            "POST",
            "/subscription/create-btcpay-invoice",
            200,
            r#"{"invoice_url": "https://pay.example/i1"}"#,
        ),
        json(
            "POST",
            "/subscription/manage",
            200,
            r#"{"url": "https://billing.example/p"}"#,
        ),
        json(
            "POST",
            "/subscription/verify-payment",
            200,
            r#"{"success": true}"#,
        ),
    ])
    .await;

    let api = client(&base, Some("t"));
    let checkout = api.create_checkout_session("yearly").await.unwrap();
    assert_eq!(checkout.checkout_url, "https://checkout.example/s1");
    let invoice = api.create_btcpay_invoice("yearly").await.unwrap();
    assert_eq!(invoice.invoice_url, "https://pay.example/i1");
    let portal = api.manage_subscription().await.unwrap();
    assert_eq!(portal.url, "https://billing.example/p");
    assert!(api.verify_payment("cs_123").await.unwrap().success);

    let seen = log.lock().unwrap().clone();
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["plan_type"], "yearly");
    let body: serde_json::Value = serde_json::from_str(&seen[3].body).unwrap();
    assert_eq!(body["session_id"], "cs_123");
}

#[tokio::test]
async fn test_delete_will() {
    let (base, log) = serve(vec![json("DELETE", "/will/4", 204, "")]).await;
    client(&base, Some("t")).delete_will(4).await.unwrap();
    assert_eq!(log.lock().unwrap()[0].method, "DELETE");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr), None)
        .login("a@example.com", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}
