mod common;

use std::time::{Duration, Instant};

use common::mock_backend::{Behavior, live_vector, spawn_mock_backend};
use semrank::{
    EmbeddingError, EmbeddingProvider, EmbeddingSource, ProviderConfig, ProviderState,
    fallback_embedding,
};

const OPENAI_DIM: usize = 1536;

fn openai_config(base_url: &str) -> ProviderConfig {
    ProviderConfig::openai("text-embedding-3-small")
        .with_credential("sk-test")
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_live_success_reports_real_api() {
    let backend = spawn_mock_backend(Behavior::Ok, OPENAI_DIM).await.unwrap();
    let provider = EmbeddingProvider::new(openai_config(&backend.url()));
    assert_eq!(provider.state(), ProviderState::Configured);

    let batch = provider.generate_embeddings(&["cat", "horse"]).await;

    assert_eq!(batch.sources, vec![EmbeddingSource::Live; 2]);
    assert_eq!(batch.vectors[0], live_vector("cat", OPENAI_DIM));
    assert_eq!(batch.vectors[1], live_vector("horse", OPENAI_DIM));
    assert!(provider.was_real_api_used());
    assert_eq!(provider.state(), ProviderState::Succeeded);
    assert!(provider.last_error().is_none());
}

#[tokio::test]
async fn test_auth_error_falls_back_at_provider_dimension() {
    let backend = spawn_mock_backend(
        Behavior::Status {
            code: 401,
            body: r#"{"error":{"message":"Incorrect API key provided"}}"#,
        },
        OPENAI_DIM,
    )
    .await
    .unwrap();
    let provider = EmbeddingProvider::new(openai_config(&backend.url()));

    let vector = provider.generate_embedding("cat").await;

    assert_eq!(vector.len(), OPENAI_DIM);
    assert_eq!(vector, fallback_embedding("cat", OPENAI_DIM));
    assert!(!provider.was_real_api_used());
    assert_eq!(provider.state(), ProviderState::FallbackUsed);
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn test_rate_limit_and_quota_are_distinguished() {
    let limited = spawn_mock_backend(
        Behavior::Status {
            code: 429,
            body: "slow down",
        },
        OPENAI_DIM,
    )
    .await
    .unwrap();
    let provider = EmbeddingProvider::new(openai_config(&limited.url()));
    provider.generate_embedding("cat").await;
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::RateLimited { .. })
    ));

    let exhausted = spawn_mock_backend(
        Behavior::Status {
            code: 429,
            body: r#"{"error":{"code":"insufficient_quota"}}"#,
        },
        OPENAI_DIM,
    )
    .await
    .unwrap();
    let provider = EmbeddingProvider::new(openai_config(&exhausted.url()));
    provider.generate_embedding("cat").await;
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::QuotaExceeded { .. })
    ));
}

#[tokio::test]
async fn test_slow_backend_times_out_to_fallback() {
    let backend = spawn_mock_backend(Behavior::Delay(Duration::from_secs(3)), OPENAI_DIM)
        .await
        .unwrap();
    let config = openai_config(&backend.url()).with_timeout(Duration::from_millis(200));
    let provider = EmbeddingProvider::new(config);

    let vector = provider.generate_embedding("cat").await;

    assert_eq!(vector, fallback_embedding("cat", OPENAI_DIM));
    assert!(!provider.was_real_api_used());
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::Timeout {
            timeout_ms: 200,
            ..
        })
    ));
}

#[tokio::test]
async fn test_batch_requests_run_concurrently() {
    let backend = spawn_mock_backend(Behavior::Delay(Duration::from_millis(400)), OPENAI_DIM)
        .await
        .unwrap();
    let config = openai_config(&backend.url()).with_timeout(Duration::from_millis(1500));
    let provider = EmbeddingProvider::new(config);
    let texts = ["one", "two", "three", "four", "five", "six"];

    let started = Instant::now();
    let batch = provider.generate_embeddings(&texts).await;
    let elapsed = started.elapsed();

    assert!(batch.all_live());
    assert_eq!(backend.request_count(), texts.len());
    // Six sequential calls would take at least 2.4s.
    assert!(
        elapsed < Duration::from_millis(1200),
        "batch took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_partial_failure_substitutes_per_item() {
    let backend = spawn_mock_backend(Behavior::FailOn("boom"), OPENAI_DIM)
        .await
        .unwrap();
    let provider = EmbeddingProvider::new(openai_config(&backend.url()));

    let batch = provider
        .generate_embeddings(&["fine", "boom goes the text", "also fine"])
        .await;

    assert_eq!(
        batch.sources,
        vec![
            EmbeddingSource::Live,
            EmbeddingSource::Fallback,
            EmbeddingSource::Live
        ]
    );
    assert_eq!(batch.live_count(), 2);
    assert_eq!(
        batch.vectors[1],
        fallback_embedding("boom goes the text", OPENAI_DIM)
    );
    assert!(batch.vectors.iter().all(|v| v.len() == OPENAI_DIM));
    assert!(!provider.was_real_api_used());
    assert_eq!(provider.state(), ProviderState::FallbackUsed);
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::Http { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_wrong_dimension_is_rejected() {
    let backend = spawn_mock_backend(Behavior::WrongDimension, OPENAI_DIM)
        .await
        .unwrap();
    let provider = EmbeddingProvider::new(openai_config(&backend.url()));

    let batch = provider.generate_embeddings(&["cat"]).await;

    assert_eq!(batch.sources, vec![EmbeddingSource::Fallback]);
    assert_eq!(batch.vectors[0].len(), OPENAI_DIM);
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_texts_are_requested_once() {
    let backend = spawn_mock_backend(Behavior::Ok, OPENAI_DIM).await.unwrap();
    let provider = EmbeddingProvider::new(openai_config(&backend.url()));

    let batch = provider.generate_embeddings(&["cat", "cat", "dog"]).await;
    assert_eq!(batch.len(), 3);
    assert_eq!(batch.vectors[0], batch.vectors[1]);
    assert_eq!(backend.request_count(), 2);

    // Memoized within the instance.
    provider.generate_embedding("cat").await;
    assert_eq!(backend.request_count(), 2);
    assert!(provider.was_real_api_used());
}

#[tokio::test]
async fn test_cache_disabled_requests_again() {
    let backend = spawn_mock_backend(Behavior::Ok, OPENAI_DIM).await.unwrap();
    let provider =
        EmbeddingProvider::new(openai_config(&backend.url()).with_cache_capacity(0));

    provider.generate_embedding("cat").await;
    provider.generate_embedding("cat").await;
    assert_eq!(backend.request_count(), 2);
}

#[tokio::test]
async fn test_malformed_credential_never_reaches_backend() {
    let backend = spawn_mock_backend(Behavior::Ok, OPENAI_DIM).await.unwrap();
    let config = ProviderConfig::openai("text-embedding-3-small")
        .with_credential("not-an-openai-key")
        .with_base_url(backend.url());
    let provider = EmbeddingProvider::new(config);

    assert!(!provider.is_live());
    assert_eq!(provider.state(), ProviderState::Unconfigured);
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::Configuration { .. })
    ));

    let vector = provider.generate_embedding("cat").await;
    assert_eq!(vector.len(), OPENAI_DIM);
    assert_eq!(backend.request_count(), 0);
    assert!(!provider.was_real_api_used());
}

#[tokio::test]
async fn test_gemini_protocol() {
    let backend = spawn_mock_backend(Behavior::Ok, 768).await.unwrap();
    let config = ProviderConfig::gemini("models/text-embedding-004")
        .with_credential("AIza-test-key")
        .with_base_url(backend.url());
    let provider = EmbeddingProvider::new(config);
    assert_eq!(provider.dimension(), 768);

    let vector = provider.generate_embedding("hello").await;

    assert_eq!(vector, live_vector("hello", 768));
    assert!(provider.was_real_api_used());
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn test_gemini_rejected_key_falls_back() {
    let backend = spawn_mock_backend(
        Behavior::Status {
            code: 403,
            body: r#"{"error":{"status":"PERMISSION_DENIED"}}"#,
        },
        768,
    )
    .await
    .unwrap();
    let config = ProviderConfig::gemini("text-embedding-004")
        .with_credential("AIza-revoked")
        .with_base_url(backend.url());
    let provider = EmbeddingProvider::new(config);

    let vector = provider.generate_embedding("hello").await;

    assert_eq!(vector, fallback_embedding("hello", 768));
    assert!(matches!(
        provider.last_error(),
        Some(EmbeddingError::Unauthorized { .. })
    ));
}
