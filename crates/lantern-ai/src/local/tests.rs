//! End-to-end tests against a canned HTTP server on a loopback socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;
use crate::{
    AiError, ChatEngine, CompletionRequest, EngineFactory, EngineOptions, InitFailure,
    InitProgressReport, Message,
};

/// Serve one canned response per accepted connection, in order.
async fn serve(responses: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });
    format!("http://{addr}")
}

/// Consume headers plus a Content-Length body so the close is clean.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        if socket.read(&mut byte).await.unwrap() == 0 {
            return;
        }
        buf.push(byte[0]);
    }
    let headers = String::from_utf8_lossy(&buf).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    socket.read_exact(&mut body).await.unwrap();
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn models_response(ids: &[&str]) -> String {
    let data: Vec<_> = ids.iter().map(|id| serde_json::json!({ "id": id })).collect();
    http_response(
        "200 OK",
        "application/json",
        &serde_json::json!({ "object": "list", "data": data }).to_string(),
    )
}

fn sse_response(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let event = serde_json::json!({ "choices": [{ "delta": { "content": delta } }] });
        body.push_str(&format!("data: {event}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    http_response("200 OK", "text/event-stream", &body)
}

fn options() -> (EngineOptions, Arc<Mutex<Vec<InitProgressReport>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let options = EngineOptions {
        progress: Arc::new(move |r: InitProgressReport| sink.lock().unwrap().push(r)),
        log_level: "INFO".into(),
    };
    (options, reports)
}

fn factory(base_url: String) -> LocalServerFactory {
    LocalServerFactory::new(
        LocalServerConfig::new(base_url)
            .with_connect_timeout(Duration::from_secs(2))
            .with_request_timeout(Duration::from_secs(5)),
    )
}

fn request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message::user("Say hello")],
        stream: true,
        temperature: 0.7,
        max_tokens: 64,
    }
}

#[tokio::test]
async fn constructs_and_streams_chunks_in_order() {
    let base = serve(vec![
        models_response(&["qwen2:0.5b", "llama3.2:1b"]),
        sse_response(&["Hel", "lo", "!"]),
    ])
    .await;

    let (options, reports) = options();
    let engine = factory(base).create_engine("qwen2:0.5b", options).await.unwrap();

    let texts: Vec<String> = reports.lock().unwrap().iter().map(|r| r.text.clone()).collect();
    assert_eq!(texts.len(), 3);
    assert!(texts[0].starts_with("Connecting to inference server"));
    assert_eq!(texts[2], "Model qwen2:0.5b ready");

    let chunks: Vec<String> = engine
        .stream_completion(request())
        .await
        .unwrap()
        .map(|c| c.unwrap().delta)
        .collect()
        .await;
    assert_eq!(chunks, vec!["Hel", "lo", "!"]);
}

#[tokio::test]
async fn progress_is_monotonic() {
    let base = serve(vec![models_response(&["only-model"])]).await;
    let (options, reports) = options();
    factory(base).create_engine("anything", options).await.unwrap();

    let progress: Vec<f64> = reports.lock().unwrap().iter().map(|r| r.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last().copied(), Some(1.0));
}

#[tokio::test]
async fn unreachable_server_reports_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (options, _) = options();
    let err = match factory(format!("http://{addr}")).create_engine("m", options).await {
        Err(e) => e,
        Ok(_) => panic!("expected construction to fail"),
    };
    assert!(matches!(err, AiError::NetworkError(_)));
    assert!(err.message().contains("network"));
    assert_eq!(
        InitFailure::classify(&err.message()),
        InitFailure::NetworkOrCache
    );
}

#[tokio::test]
async fn stalled_server_reports_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Accept and hold the connection without answering
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(socket);
    });

    let slow = LocalServerFactory::new(
        LocalServerConfig::new(format!("http://{addr}"))
            .with_request_timeout(Duration::from_millis(200)),
    );
    let (options, _) = options();
    let err = match slow.create_engine("m", options).await {
        Err(e) => e,
        Ok(_) => panic!("expected construction to time out"),
    };
    assert!(matches!(err, AiError::Timeout));
    assert_eq!(
        InitFailure::classify(&err.message()),
        InitFailure::NetworkOrCache
    );
}

#[tokio::test]
async fn missing_model_fails_construction() {
    let base = serve(vec![models_response(&["a", "b"])]).await;
    let (options, _) = options();
    let err = match factory(base).create_engine("c", options).await {
        Err(e) => e,
        Ok(_) => panic!("expected construction to fail"),
    };
    assert!(err.to_string().contains("model c is not served"));
}

#[tokio::test]
async fn rate_limit_status_maps_to_rate_limited() {
    let base = serve(vec![
        models_response(&["m"]),
        http_response("429 Too Many Requests", "application/json", "{}"),
    ])
    .await;
    let (options, _) = options();
    let engine = factory(base).create_engine("m", options).await.unwrap();

    let err = match engine.stream_completion(request()).await {
        Err(e) => e,
        Ok(_) => panic!("expected request to fail"),
    };
    assert!(matches!(err, AiError::RateLimited));
}

#[tokio::test]
async fn server_error_status_includes_body() {
    let base = serve(vec![
        models_response(&["m"]),
        http_response("500 Internal Server Error", "text/plain", "kv cache full"),
    ])
    .await;
    let (options, _) = options();
    let engine = factory(base).create_engine("m", options).await.unwrap();

    let err = match engine.stream_completion(request()).await {
        Err(e) => e,
        Ok(_) => panic!("expected request to fail"),
    };
    let msg = err.to_string();
    assert!(msg.contains("500"));
    assert!(msg.contains("kv cache full"));
}
