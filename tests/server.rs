//! The server over real TCP.

use std::time::Duration;

use correlation_api::http::{ErrorBody, Greeting, HttpServer, GREETING};
use correlation_api::items::ItemRecord;
use correlation_api::lifecycle::Shutdown;
use tokio::net::TcpListener;

mod common;

#[tokio::test]
async fn test_serves_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(common::test_config());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let base = format!("http://{addr}");

    let greeting: Greeting = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(greeting.message, GREETING);

    let res = client
        .get(format!("{base}/items/42"))
        .header("X-Correlation-ID", "tcp-1")
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    let item: ItemRecord = res.json().await.unwrap();
    assert_eq!(item.id, 42);
    assert_eq!(item.name, "Product 42");

    let res = client.get(format!("{base}/error")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.detail, "An intentional server error occurred.");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}
