//! Local stand-ins for an Ollama server and for completion backends.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

use async_trait::async_trait;
use localrag_core::traits::{CompletionBackend, CompletionRequest};
use localrag_core::BackendError;

/// Answer one request with `status` and `body`; the request body is sent back on the channel.
pub fn serve_once(status: &'static str, body: String) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::channel();
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
            let mut request_body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut request_body);
            let _ = tx.send(String::from_utf8_lossy(&request_body).into_owned());
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    (format!("http://{addr}"), rx)
}

/// A listener that accepts connections but never replies. Keep it alive for the test.
pub fn silent_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    (listener, format!("http://{addr}"))
}

pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

/// Replies with a fixed answer, or a fixed error, and records every request.
#[derive(Clone, Default)]
pub struct CannedBackend {
    pub error: Option<BackendError>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl CannedBackend {
    pub fn failing(error: BackendError) -> Self {
        Self { error: Some(error), ..Self::default() }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CompletionBackend for CannedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        self.requests.lock().expect("lock").push(request.clone());
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(format!("answer from {}", request.model)),
        }
    }
}
