mod common;

use std::time::Duration;

use localrag_core::traits::Embedder;
use localrag_core::BackendError;
use localrag_embed::{FakeEmbedder, OllamaEmbedder};

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(256);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 256);
    assert_eq!(embedder.dimension(), Some(256));

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn fake_embedder_is_case_and_punctuation_insensitive() {
    let embedder = FakeEmbedder::new(128);
    assert_eq!(embedder.embed_text("Capital of France."), embedder.embed_text("capital of france"));
}

#[tokio::test]
async fn ollama_embedder_parses_batch_response() {
    let base = common::serve_once("200 OK", r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#.to_string());
    let embedder = OllamaEmbedder::new(&base, "nomic-embed-text", Duration::from_secs(5)).expect("client");
    let out = embedder
        .embed_batch(&["a".to_string(), "b".to_string()])
        .await
        .expect("embeddings");
    assert_eq!(out, vec![vec![0.1f32, 0.2], vec![0.3f32, 0.4]]);
    assert_eq!(embedder.model_id(), "nomic-embed-text");
}

#[tokio::test]
async fn ollama_embedder_rejects_count_mismatch() {
    let base = common::serve_once("200 OK", r#"{"embeddings":[[0.1,0.2]]}"#.to_string());
    let embedder = OllamaEmbedder::new(&base, "m", Duration::from_secs(5)).expect("client");
    let err = embedder.embed_batch(&["a".to_string(), "b".to_string()]).await.unwrap_err();
    assert!(matches!(err, BackendError::Malformed(_)), "{err:?}");
}

#[tokio::test]
async fn ollama_embedder_surfaces_http_status() {
    let base = common::serve_once("404 Not Found", r#"{"error":"model not found"}"#.to_string());
    let embedder = OllamaEmbedder::new(&base, "missing", Duration::from_secs(5)).expect("client");
    let err = embedder.embed_batch(&["a".to_string()]).await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 404, .. }), "{err:?}");
}

#[tokio::test]
async fn ollama_embedder_unreachable() {
    let embedder = OllamaEmbedder::new(&common::closed_port_url(), "m", Duration::from_secs(5)).expect("client");
    let err = embedder.embed_batch(&["a".to_string()]).await.unwrap_err();
    assert!(matches!(err, BackendError::Unreachable(_)), "{err:?}");
}

#[tokio::test]
async fn fake_embedder_with_zero_dimension_is_clamped() {
    let embedder = FakeEmbedder::new(0);
    assert_eq!(embedder.dimension(), Some(1));
    let embs = embedder.embed_batch(&["anything at all".to_string()]).await.expect("embed_batch");
    assert_eq!(embs[0].len(), 1);
}
