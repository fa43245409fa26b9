//! Integration tests for providers resolved through the registry

use sounding_domain::{CredibilityTier, ProbeError, ProbeOutcome, ProbeProvider, ProviderId};
use sounding_probe::{FetchProvider, FixtureProvider, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::test]
async fn test_registry_dispatches_to_fixture() {
    let mut docs = FixtureProvider::empty();
    docs.answer(
        "tokio latest",
        ProbeOutcome::new("tokio 1.47", "https://docs.rs/tokio"),
    );

    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(docs.clone()))
        .unwrap();

    let entry = registry.get(&ProviderId::new("docs")).unwrap();
    let outcome = entry
        .provider
        .execute("tokio latest", Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(outcome.claim, "tokio 1.47");
    assert_eq!(docs.calls(), vec!["tokio latest".to_string()]);
}

#[tokio::test]
async fn test_fetch_unreachable_host_is_unavailable() {
    let provider = FetchProvider::new();
    // Port 9 (discard) on loopback is closed in test environments
    let result = provider
        .execute("http://127.0.0.1:9/", Duration::from_secs(2))
        .await;

    match result {
        Err(ProbeError::Unavailable(_)) | Err(ProbeError::Timeout) => {}
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_stops_reading_at_raw_limit() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut body = String::from("tokio 1.47 released\n");
    body.push_str(&"x".repeat(1024 * 1024));
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        // the client hangs up early, so write errors are expected
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(body.as_bytes()).await;
    });

    let provider = FetchProvider::new().with_max_raw_bytes(1024);
    let outcome = provider
        .execute(&format!("http://{}/release", addr), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(outcome.claim, "tokio 1.47 released");
    assert_eq!(outcome.raw.len(), 1024);
    assert!(outcome.raw.starts_with("tokio 1.47 released\n"));
}
