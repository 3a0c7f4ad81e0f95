//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{redact_if_sensitive, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_logging_config_defaults() {
    let config = LoggingConfig::default();

    assert_eq!(config.level, LogLevel::Info);
    assert!(config.redact_pii);
    assert!(config.filter.is_none());
    assert!(config.logger_sink.is_none());

    #[cfg(debug_assertions)]
    assert_eq!(config.format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(config.format, LogFormat::Json);
}

#[test]
fn test_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("Authorization", "Basic dXNlcg=="), "[REDACTED]");
    assert_eq!(redact_if_sensitive("api_key", "k-123"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("bearer", "abc"), "[REDACTED]");
}

#[test]
fn test_signed_url_query_is_redacted() {
    let redacted = redact_if_sensitive(
        "source",
        "https://media.example.com/tracks/42.wav?X-Amz-Signature=deadbeef",
    );

    assert_eq!(redacted, "https://media.example.com/tracks/42.wav?[REDACTED]");
    assert!(!redacted.contains("deadbeef"));
}

#[test]
fn test_plain_values_pass_through() {
    assert_eq!(redact_if_sensitive("status", "buffering"), "buffering");
    assert_eq!(redact_if_sensitive("received", "4096"), "4096");
    assert_eq!(redact_if_sensitive("query", "a?b"), "a?b");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/music/song.wav"), "song.wav");
    assert_eq!(strip_path("D:\\cache\\chunk.bin"), "chunk.bin");
    assert_eq!(strip_path("filename.wav"), "filename.wav");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true)
        .with_filter("core_playback=trace");

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
    assert_eq!(config.filter.as_deref(), Some("core_playback=trace"));
}
