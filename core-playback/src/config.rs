//! # Streamer Configuration
//!
//! Tuning knobs for buffering, decode pacing and header parsing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Streaming engine configuration.
///
/// Durations of audio are expressed in seconds of decoded canonical PCM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Seconds of PCM that must be buffered before `Buffering -> Playing`.
    ///
    /// Default: 1.0 s.
    #[serde(default = "default_preroll")]
    pub preroll: f64,

    /// Capacity of the renderer's internal buffer in seconds.
    ///
    /// Default: 2.0 s.
    #[serde(default = "default_renderer_buffer")]
    pub renderer_buffer: f64,

    /// The worker stops decoding once this many seconds of PCM wait in the
    /// queue.
    ///
    /// Default: 4.0 s.
    #[serde(default = "default_queue_high_water")]
    pub queue_high_water: f64,

    /// Number of data arrivals averaged for the download speed estimate.
    ///
    /// Default: 16.
    #[serde(default = "default_speed_window")]
    pub speed_window: usize,

    /// Pause between worker iterations when it cannot make progress.
    ///
    /// Default: 10 ms.
    #[serde(default = "default_decode_backoff")]
    pub decode_backoff: Duration,

    /// Header bytes examined before a source is declared unrecognisable.
    ///
    /// Default: 64 KiB.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,

    /// Minimum coded window handed to the codec per decode step.
    ///
    /// Default: 4096 bytes.
    #[serde(default = "default_read_window_bytes")]
    pub read_window_bytes: usize,

    /// Event bus capacity per subscriber.
    ///
    /// Default: 256.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Interval between position events while playing.
    ///
    /// Default: 250 ms.
    #[serde(default = "default_position_interval")]
    pub position_interval: Duration,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            preroll: default_preroll(),
            renderer_buffer: default_renderer_buffer(),
            queue_high_water: default_queue_high_water(),
            speed_window: default_speed_window(),
            decode_backoff: default_decode_backoff(),
            max_header_bytes: default_max_header_bytes(),
            read_window_bytes: default_read_window_bytes(),
            event_buffer: default_event_buffer(),
            position_interval: default_position_interval(),
        }
    }
}

impl StreamerConfig {
    /// Create a configuration optimized for low latency.
    ///
    /// - Short pre-roll (0.25s)
    /// - Small renderer buffer
    /// - Fast retry
    pub fn low_latency() -> Self {
        Self {
            preroll: 0.25,
            renderer_buffer: 0.5,
            queue_high_water: 1.0,
            decode_backoff: Duration::from_millis(5),
            ..Default::default()
        }
    }

    /// Create a configuration optimized for stability on poor networks.
    ///
    /// - Long pre-roll (3s)
    /// - Larger buffers
    pub fn high_quality() -> Self {
        Self {
            preroll: 3.0,
            renderer_buffer: 4.0,
            queue_high_water: 10.0,
            speed_window: 32,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.preroll > 0.0) {
            return Err("preroll must be > 0".to_string());
        }

        if !(self.renderer_buffer > 0.0) {
            return Err("renderer_buffer must be > 0".to_string());
        }

        if self.queue_high_water < self.preroll {
            return Err("queue_high_water cannot be smaller than preroll".to_string());
        }

        if self.speed_window == 0 {
            return Err("speed_window must be > 0".to_string());
        }

        if self.max_header_bytes < 12 {
            return Err("max_header_bytes must be at least 12".to_string());
        }

        if self.read_window_bytes == 0 {
            return Err("read_window_bytes must be > 0".to_string());
        }

        if self.event_buffer == 0 {
            return Err("event_buffer must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_preroll() -> f64 {
    1.0
}

fn default_renderer_buffer() -> f64 {
    2.0
}

fn default_queue_high_water() -> f64 {
    4.0
}

fn default_speed_window() -> usize {
    16
}

fn default_decode_backoff() -> Duration {
    Duration::from_millis(10)
}

fn default_max_header_bytes() -> usize {
    64 * 1024
}

fn default_read_window_bytes() -> usize {
    4096
}

fn default_event_buffer() -> usize {
    256
}

fn default_position_interval() -> Duration {
    Duration::from_millis(250)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preroll, 1.0);
        assert_eq!(config.speed_window, 16);
        assert_eq!(config.max_header_bytes, 65_536);
        assert_eq!(config.read_window_bytes, 4096);
    }

    #[test]
    fn test_presets() {
        let low = StreamerConfig::low_latency();
        let high = StreamerConfig::high_quality();
        assert!(low.validate().is_ok());
        assert!(high.validate().is_ok());
        assert!(low.preroll < StreamerConfig::default().preroll);
        assert!(high.preroll > StreamerConfig::default().preroll);
    }

    #[test]
    fn test_config_validation() {
        let mut config = StreamerConfig::default();

        config.preroll = 0.0;
        assert!(config.validate().is_err());
        config.preroll = 1.0;

        config.queue_high_water = 0.5;
        assert!(config.validate().is_err());
        config.queue_high_water = 4.0;

        config.speed_window = 0;
        assert!(config.validate().is_err());
        config.speed_window = 16;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: StreamerConfig = serde_json::from_str(r#"{"preroll": 2.5}"#).unwrap();
        assert_eq!(config.preroll, 2.5);
        assert_eq!(config.renderer_buffer, 2.0);
        assert_eq!(config.decode_backoff, Duration::from_millis(10));
    }
}
