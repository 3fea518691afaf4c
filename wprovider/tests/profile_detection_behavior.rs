use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wprovider::prelude::*;

#[test]
fn custom_profiles_override_the_standard_table() {
    let tuned = ProviderProfile::anthropic()
        .with_chunk_buffering(ChunkBuffering::Buffered { size: 64 })
        .with_max_retries(8)
        .with_ping(Duration::from_secs(5), Duration::from_secs(2));
    let registry = ProfileRegistry::standard()
        .with_profile(tuned.clone())
        .expect("tuned profile is valid");

    let info = ProviderInfo::from_value(&json!({
        "provider": "ANTHROPIC",
        "model": "claude-opus",
        "orchestrator_type": "direct"
    }));
    let detected = detect(&registry, info.as_ref()).expect("info present");

    assert_eq!(detected.provider, ProviderId::Anthropic);
    assert_eq!(detected.model, "claude-opus");
    assert_eq!(detected.orchestrator, "direct");
    assert_eq!(*detected.profile, tuned);
    assert_eq!(registry.len(), 3);
}

#[test]
fn unrecognized_providers_fall_back_to_the_unknown_profile() {
    let conservative = ProviderProfile::unknown().with_max_retries(1);
    let registry = ProfileRegistry::standard()
        .with_profile(conservative.clone())
        .expect("valid fallback");

    let info = ProviderInfo::new("mistral", "large", "langgraph");
    let detected = detect(&registry, Some(&info)).expect("info present");

    assert_eq!(detected.provider, ProviderId::Unknown);
    assert_eq!(detected.model, "large");
    assert!(Arc::ptr_eq(&detected.profile, &registry.unknown()));
    assert_eq!(registry.unknown().max_retries, 1);
    assert!(detect(&registry, None).is_none());
}

#[test]
fn invalid_profiles_are_refused_by_the_registry() {
    let mut registry = ProfileRegistry::standard();
    let broken = ProviderProfile::openai().with_chunk_buffering(ChunkBuffering::Buffered { size: 0 });

    let error = registry.register(broken).expect_err("zero buffer must fail");
    assert_eq!(error.kind, ProfileErrorKind::InvalidBuffering);
    assert_eq!(registry.get(ProviderId::OpenAi).chunk_buffering, ChunkBuffering::Immediate);
    assert_eq!(registry.validate(), Ok(()));
}

#[test]
fn compression_defaults_to_deflate_everywhere() {
    let registry = ProfileRegistry::standard();
    for provider in ProviderId::ALL {
        assert_eq!(registry.get(provider).compression, CompressionMode::Deflate);
    }
}
