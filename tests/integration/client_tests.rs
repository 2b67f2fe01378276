use rustbuster::config::HttpOptions;
use rustbuster::{ClientError, ProbeClient, DEFAULT_USER_AGENT};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(options: HttpOptions) -> ProbeClient {
    ProbeClient::new(&options, CancellationToken::new()).expect("Failed to build client")
}

fn with_length() -> HttpOptions {
    HttpOptions {
        include_length: true,
        ..Default::default()
    }
}

/// Serves `body` with chunked transfer encoding on every connection
async fn serve_chunked(body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;

                let mut response = format!(
                    "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n{:x}\r\n",
                    body.len()
                )
                .into_bytes();
                response.extend_from_slice(body);
                response.extend_from_slice(b"\r\n0\r\n\r\n");

                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/", addr)
}

/// Serves `200 OK` over TLS with a freshly generated self-signed certificate
async fn serve_self_signed() -> String {
    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));
    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![certified.cert.der().clone()], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // rejected handshakes end here
                let Ok(mut stream) = acceptor.accept(socket).await else {
                    return;
                };
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("https://127.0.0.1:{}/", addr.port())
}

#[tokio::test]
async fn test_declared_content_length() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
        .mount(&mock_server)
        .await;

    let client = create_client(with_length());
    let response = client
        .probe(&format!("{}/hello", mock_server.uri()), None)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.length, Some(11));
}

#[tokio::test]
async fn test_length_not_reported_when_disabled() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
        .mount(&mock_server)
        .await;

    let client = create_client(HttpOptions::default());
    let response = client
        .probe(&format!("{}/hello", mock_server.uri()), None)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.length, None);
}

#[tokio::test]
async fn test_chunked_body_counts_code_points() {
    // one 3-byte character plus four ASCII characters
    let url = serve_chunked("€abcd".as_bytes()).await;

    let client = create_client(with_length());
    let response = client.probe(&url, None).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.length, Some(5));
}

#[tokio::test]
async fn test_chunked_binary_body_counts_bytes() {
    let url = serve_chunked(&[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]).await;

    let client = create_client(with_length());
    let response = client.probe(&url, None).await.unwrap();

    assert_eq!(response.length, Some(6));
}

#[tokio::test]
async fn test_redirect_not_followed_by_default() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = create_client(HttpOptions::default());
    let response = client
        .probe(&format!("{}/old", mock_server.uri()), None)
        .await
        .unwrap();

    assert_eq!(response.status, 301);
}

#[tokio::test]
async fn test_redirect_followed_when_enabled() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = create_client(HttpOptions {
        follow_redirect: true,
        ..Default::default()
    });
    let response = client
        .probe(&format!("{}/old", mock_server.uri()), None)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_default_headers_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = create_client(HttpOptions::default());
    let response = client
        .probe(&format!("{}/", mock_server.uri()), None)
        .await
        .unwrap();

    assert_eq!(response.status, 204);
}

#[tokio::test]
async fn test_cookie_user_agent_and_basic_auth() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("cookie", "session=abc123"))
        .and(header("user-agent", "scanner/2.0"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = create_client(HttpOptions {
        user_agent: Some("scanner/2.0".to_string()),
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        ..Default::default()
    });
    let response = client
        .probe(
            &format!("{}/private", mock_server.uri()),
            Some("session=abc123"),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_empty_cookie_not_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("cookie", ""))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = create_client(HttpOptions::default());
    let response = client
        .probe(&format!("{}/", mock_server.uri()), Some(""))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_requests_routed_through_proxy() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&proxy)
        .await;

    let client = create_client(HttpOptions {
        proxy: Some(proxy.uri()),
        ..Default::default()
    });
    let response = client
        .probe("http://target.invalid/secret", None)
        .await
        .unwrap();

    assert_eq!(response.status, 418);
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = create_client(HttpOptions {
        timeout: 1,
        ..Default::default()
    });
    let error = client
        .probe(&format!("{}/slow", mock_server.uri()), None)
        .await
        .unwrap_err();

    assert!(error.is_timeout(), "expected timeout, got {:?}", error);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = create_client(HttpOptions::default());
    let error = client
        .probe(&format!("http://{}/", addr), None)
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Request { .. }));
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let client = ProbeClient::new(
        &HttpOptions {
            timeout: 30,
            ..Default::default()
        },
        cancel.clone(),
    )
    .unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let result = client
        .probe(&format!("{}/slow", mock_server.uri()), None)
        .await;

    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_untrusted_certificate_reported_distinctly() {
    let url = serve_self_signed().await;

    let client = create_client(HttpOptions::default());
    let result = client.probe(&url, None).await;
    assert!(
        matches!(result, Err(ClientError::InvalidCertificate)),
        "expected a certificate error, got {:?}",
        result
    );
    assert_eq!(result.unwrap_err().to_string(), "invalid certificate");
}

#[tokio::test]
async fn test_untrusted_certificate_accepted_when_insecure() {
    let url = serve_self_signed().await;

    let client = create_client(HttpOptions {
        insecure_tls: true,
        include_length: true,
        ..Default::default()
    });
    let response = client.probe(&url, None).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.length, Some(2));
}
