use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;

use axum_localvideo::control::{self, ControlHandle, Source};
use axum_localvideo::{intercept, ClientId, FileEntry, Interceptor, MemoryPayload, Registry, NOT_FOUND_BODY};

async fn start() -> (SocketAddr, ControlHandle, Vec<u8>) {
    let registry = Registry::new();

    let (envelopes, receiver) = mpsc::channel(8);
    tokio::spawn(control::run(registry.clone(), receiver));

    let (mailbox, _inbox) = mpsc::unbounded_channel();
    let handle = ControlHandle::new(envelopes, Source { id: ClientId::from("tab-1"), mailbox });

    let data: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
    let file = FileEntry::new(MemoryPayload::new(data.clone(), None));
    handle.set_file("clip", file).await.unwrap();

    let app = Router::new()
        .route("/app/assets/other", get(|| async { "upstream" }))
        .fallback(|| async { (StatusCode::NOT_FOUND, "upstream not found") })
        .layer(middleware::from_fn_with_state(Interceptor::new(registry), intercept));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, handle, data)
}

fn header<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn test_serves_registered_file() {
    let (addr, handle, data) = start().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/app/__localvideo?id=clip");

    // full content without a range
    let response = client.get(&url).header("x-client-id", "tab-1").send().await.unwrap();
    assert_eq!(reqwest::StatusCode::OK, response.status());
    assert_eq!(Some("bytes"), header(&response, "accept-ranges"));
    assert_eq!(Some("no-store"), header(&response, "cache-control"));
    assert_eq!(Some("video/mp4"), header(&response, "content-type"));
    assert_eq!(Some("1000"), header(&response, "content-length"));
    assert_eq!(data, response.bytes().await.unwrap().to_vec());

    // a single range
    let response = client
        .get(&url)
        .header("x-client-id", "tab-1")
        .header("Range", "bytes=0-99")
        .send()
        .await
        .unwrap();
    assert_eq!(reqwest::StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("bytes 0-99/1000"), header(&response, "content-range"));
    assert_eq!(Some("100"), header(&response, "content-length"));
    assert_eq!(data[0..=99].to_vec(), response.bytes().await.unwrap().to_vec());

    // suffix range
    let response = client
        .get(&url)
        .header("x-client-id", "tab-1")
        .header("Range", "bytes=-10")
        .send()
        .await
        .unwrap();
    assert_eq!(reqwest::StatusCode::PARTIAL_CONTENT, response.status());
    assert_eq!(Some("bytes 990-999/1000"), header(&response, "content-range"));
    assert_eq!(data[990..].to_vec(), response.bytes().await.unwrap().to_vec());

    // an unsatisfiable range falls back to the full file
    let response = client
        .get(&url)
        .header("x-client-id", "tab-1")
        .header("Range", "bytes=500-100")
        .send()
        .await
        .unwrap();
    assert_eq!(reqwest::StatusCode::OK, response.status());
    assert_eq!(1000, response.bytes().await.unwrap().len());

    handle.remove_file("clip").await.unwrap();
    // wait for the remove to be applied
    handle.set_file("other", FileEntry::new(MemoryPayload::new(vec![1u8], None))).await.unwrap();

    let response = client.get(&url).header("x-client-id", "tab-1").send().await.unwrap();
    assert_eq!(reqwest::StatusCode::NOT_FOUND, response.status());
}

#[tokio::test]
async fn test_unknown_client_gets_not_found() {
    let (addr, _handle, _) = start().await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/app/__localvideo?id=x"))
        .header("x-client-id", "tab-2")
        .send()
        .await
        .unwrap();
    assert_eq!(reqwest::StatusCode::NOT_FOUND, response.status());
    assert_eq!(NOT_FOUND_BODY, response.text().await.unwrap());
}

#[tokio::test]
async fn test_other_paths_pass_through() {
    let (addr, _handle, _) = start().await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/app/assets/other"))
        .header("x-client-id", "tab-1")
        .send()
        .await
        .unwrap();
    assert_eq!(reqwest::StatusCode::OK, response.status());
    assert_eq!("upstream", response.text().await.unwrap());
}
