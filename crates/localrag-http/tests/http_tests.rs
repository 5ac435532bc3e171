use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use localrag_core::BackendError;
use localrag_http::{build_client, post_json};

/// Reply to one request with `status` and `body`, ignoring what was sent.
fn reply_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap_or(0);
                }
            }
            let _ = reader.read_exact(&mut vec![0u8; content_length]);
            let mut stream = reader.into_inner();
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/api/generate")
}

#[tokio::test]
async fn error_status_keeps_the_body() {
    let url = reply_once("500 Internal Server Error", r#"{"error":"model not loaded"}"#);
    let err = post_json(&build_client().expect("client"), &url, &serde_json::json!({}), Duration::from_secs(5))
        .await
        .unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("model not loaded"));
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_reply_is_malformed() {
    let url = reply_once("200 OK", "not json");
    let err = post_json(&build_client().expect("client"), &url, &serde_json::json!({}), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Malformed(_)), "{err:?}");
}
