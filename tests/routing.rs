//! End-to-end dispatch tests through a live gateway.

use reqwest::header::{HOST, SET_COOKIE, STRICT_TRANSPORT_SECURITY};

mod common;

#[tokio::test]
async fn test_host_dispatch_is_case_insensitive() {
    let backend = common::start_echo_backend("").await;
    let gateway = common::start_gateway(&format!("example.com: http://{}\n", backend), false).await;

    let res = common::client()
        .get(gateway.url("/users/7?expand=true"))
        .header(HOST, "EXAMPLE.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap();
    assert!(head.starts_with("GET /users/7?expand=true HTTP/1.1"), "{}", head);
    let lower = head.to_ascii_lowercase();
    assert!(lower.contains("host: example.com"), "{}", head);
    assert!(lower.contains("x-forwarded-proto: https"), "{}", head);
    assert!(lower.contains("x-forwarded-for: 127.0.0.1"), "{}", head);
}

#[tokio::test]
async fn test_proxied_response_carries_hsts_and_empty_user_agent() {
    let backend = common::start_echo_backend("").await;
    let gateway = common::start_gateway(&format!("example.com: http://{}\n", backend), true).await;

    let res = common::client()
        .get(gateway.url("/"))
        .header(HOST, "example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()[STRICT_TRANSPORT_SECURITY],
        "max-age=31536000; includeSubDomains; preload"
    );
    let head = res.text().await.unwrap().to_ascii_lowercase();
    assert!(head.split("\r\n").any(|line| line == "user-agent: "), "{}", head);
}

#[tokio::test]
async fn test_prefix_dispatch_strips_prefix() {
    let backend = common::start_echo_backend("").await;
    let gateway = common::start_gateway(
        &format!("/api:\n  target: http://{}/base/?key=k\n", backend),
        false,
    )
    .await;

    let res = common::client()
        .get(gateway.url("/api/users?id=1"))
        .header(HOST, "unknown.test")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap();
    assert!(head.starts_with("GET /base/users?key=k&id=1 HTTP/1.1"), "{}", head);
}

#[tokio::test]
async fn test_wildcard_then_not_found() {
    let backend = common::start_echo_backend("").await;
    let gateway = common::start_gateway(&format!("any: {}\n", backend), false).await;

    let res = common::client()
        .get(gateway.url("/whatever"))
        .header(HOST, "nobody.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let gateway = common::start_gateway(&format!("example.com: {}\n", backend), true).await;
    let res = common::client()
        .get(gateway.url("/whatever"))
        .header(HOST, "nobody.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(
        res.headers()[STRICT_TRANSPORT_SECURITY],
        "max-age=31536000; includeSubDomains; preload"
    );
    assert_eq!(res.text().await.unwrap(), "Not found");
}

#[tokio::test]
async fn test_tcp_backend_gets_inbound_host() {
    let backend = common::start_echo_backend("").await;
    let gateway = common::start_gateway(&format!("tcp.test: {}\n", backend), false).await;

    let res = common::client()
        .get(gateway.url("/x?y=1"))
        .header(HOST, "tcp.test")
        .send()
        .await
        .unwrap();

    let head = res.text().await.unwrap();
    assert!(head.starts_with("GET /x?y=1 HTTP/1.1"), "{}", head);
    let lower = head.to_ascii_lowercase();
    assert!(lower.contains("host: tcp.test"), "{}", head);
    assert!(lower.contains("x-forwarded-proto: https"), "{}", head);
}

#[tokio::test]
async fn test_unix_socket_backend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.sock");
    common::start_unix_echo_backend(&path).await;
    let gateway = common::start_gateway(&format!("unix.test: {}\n", path.display()), false).await;

    let res = common::client()
        .get(gateway.url("/hello"))
        .header(HOST, "unix.test")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap();
    assert!(head.starts_with("GET /hello HTTP/1.1"), "{}", head);
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = common::start_gateway(
        &format!("down.test: http://{}\nraw.test: {}\n", addr, addr),
        false,
    )
    .await;

    for host in ["down.test", "raw.test"] {
        let res = common::client()
            .get(gateway.url("/"))
            .header(HOST, host)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 502, "{}", host);
    }
    assert_eq!(gateway.transport.pool_resets(), 1);
}

#[tokio::test]
async fn test_set_cookie_path_rewrite() {
    let backend = common::start_echo_backend("Set-Cookie: id=42; Path=/foo; HttpOnly\r\n").await;
    let gateway = common::start_gateway(
        &format!(
            "rewrite.test:\n  target: http://{b}\n  setcookiepath: true\nplain.test:\n  target: http://{b}\n",
            b = backend
        ),
        false,
    )
    .await;

    let res = common::client()
        .get(gateway.url("/"))
        .header(HOST, "rewrite.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[SET_COOKIE], "id=42; Path=/; HttpOnly");

    let res = common::client()
        .get(gateway.url("/"))
        .header(HOST, "plain.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[SET_COOKIE], "id=42; Path=/foo; HttpOnly");
}

#[tokio::test]
async fn test_host_and_static_wildcard_scenario() {
    let backend = common::start_echo_backend("").await;
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.html"), "static home").unwrap();

    let gateway = common::start_gateway(
        &format!(
            "example.com:\n  target: http://{}\nany:\n  target: {}/\n",
            backend,
            root.path().display()
        ),
        false,
    )
    .await;

    let res = common::client()
        .get(gateway.url("/search?q=rust"))
        .header(HOST, "example.com")
        .send()
        .await
        .unwrap();
    let head = res.text().await.unwrap();
    assert!(head.starts_with("GET /search?q=rust HTTP/1.1"), "{}", head);

    let res = common::client()
        .get(gateway.url("/"))
        .header(HOST, "other.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "static home");
}
