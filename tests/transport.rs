//! Connection pool health of the shared outbound transport.

use std::sync::atomic::Ordering;
use std::time::Duration;

use reqwest::header::HOST;

mod common;

#[tokio::test]
async fn test_backend_5xx_passes_through_and_recycles_pool() {
    let (backend, connections) = common::start_keepalive_backend().await;
    let gateway = common::start_gateway(&format!("pool.test: http://{}\n", backend), false).await;
    let client = common::client();

    let res = client
        .get(gateway.url("/ok"))
        .header(HOST, "pool.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client
        .get(gateway.url("/fail"))
        .header(HOST, "pool.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), "unavailable");
    assert_eq!(gateway.transport.pool_resets(), 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let before = connections.load(Ordering::SeqCst);

    let res = client
        .get(gateway.url("/ok"))
        .header(HOST, "pool.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(connections.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn test_healthy_backend_reuses_pooled_connection() {
    let (backend, connections) = common::start_keepalive_backend().await;
    let gateway = common::start_gateway(&format!("pool.test: http://{}\n", backend), false).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client
            .get(gateway.url("/ok"))
            .header(HOST, "pool.test")
            .send()
            .await
            .unwrap();
        assert_eq!(res.text().await.unwrap(), "ok");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(connections.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.transport.pool_resets(), 0);
}
