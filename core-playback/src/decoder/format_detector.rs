//! # Format Detection Module
//!
//! Chooses which registered codec reads a stream header first, using the
//! source's file extension, the MIME type reported by the transport, and the
//! magic bytes at the start of the stream.

use bridge_traits::{AudioCodec, CodecFactory};
use std::sync::Arc;
use symphonia::core::codecs::CodecType;
use tracing::{debug, warn};

/// Hints gathered about a stream before its header is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatHint {
    pub extension: Option<String>,
    pub mime_type: Option<String>,
}

impl FormatHint {
    pub fn new(extension: Option<String>, mime_type: Option<String>) -> Self {
        Self {
            extension: extension.map(|ext| ext.to_ascii_lowercase()),
            mime_type: mime_type.map(|mime| {
                // Drop parameters such as "; codecs=1".
                mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
            }),
        }
    }
}

/// Format detector for audio streams.
pub struct FormatDetector;

impl FormatDetector {
    /// Order `factories` so the most likely codec is tried first.
    ///
    /// Factories matching the MIME type rank before those matching the
    /// extension, which rank before those matching the sniffed magic bytes.
    /// Registration order is kept within each rank.
    pub fn order_factories(
        factories: &[Arc<dyn CodecFactory>],
        hint: &FormatHint,
        head: &[u8],
    ) -> Vec<Arc<dyn CodecFactory>> {
        let sniffed = Self::sniff(head);
        let rank = |factory: &Arc<dyn CodecFactory>| -> u8 {
            if hint
                .mime_type
                .as_deref()
                .is_some_and(|mime| factory.handles_mime_type(mime))
            {
                0
            } else if hint
                .extension
                .as_deref()
                .is_some_and(|ext| factory.handles_extension(ext))
            {
                1
            } else if sniffed.as_ref() == Some(&factory.codec()) {
                2
            } else {
                3
            }
        };

        let mut ordered = factories.to_vec();
        ordered.sort_by_key(rank);
        debug!(
            ?hint,
            sniffed = ?sniffed,
            order = ?ordered.iter().map(|f| f.codec()).collect::<Vec<_>>(),
            "Codec trial order"
        );
        ordered
    }

    /// Guess the container from its leading magic bytes.
    pub fn sniff(head: &[u8]) -> Option<AudioCodec> {
        if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WAVE" {
            return Some(AudioCodec::Wav);
        }
        if head.starts_with(b"fLaC") {
            return Some(AudioCodec::Flac);
        }
        if head.starts_with(b"OggS") {
            return Some(AudioCodec::Vorbis);
        }
        if head.len() >= 8 && &head[4..8] == b"ftyp" {
            return Some(AudioCodec::Aac);
        }
        // ADTS shares the 12-bit sync with MPEG audio but carries layer 0.
        if head.len() >= 2 && head[0] == 0xFF && head[1] & 0xF6 == 0xF0 {
            return Some(AudioCodec::Aac);
        }
        if head.starts_with(b"ID3") || (head.len() >= 2 && head[0] == 0xFF && head[1] & 0xE0 == 0xE0)
        {
            return Some(AudioCodec::Mp3);
        }
        None
    }

    /// Map a Symphonia codec type to our codec family.
    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 || codec_type == CODEC_TYPE_MP2 || codec_type == CODEC_TYPE_MP1
        {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if Self::is_interleaved_pcm(codec_type) {
            AudioCodec::Wav
        } else {
            warn!("Unknown codec type: {:?}", codec_type);
            AudioCodec::Unknown
        }
    }

    /// `true` for the interleaved LPCM codec types a WAVE file can carry.
    pub fn is_interleaved_pcm(codec_type: CodecType) -> bool {
        use symphonia::core::codecs::*;

        [
            CODEC_TYPE_PCM_U8,
            CODEC_TYPE_PCM_S8,
            CODEC_TYPE_PCM_S16LE,
            CODEC_TYPE_PCM_S16BE,
            CODEC_TYPE_PCM_S24LE,
            CODEC_TYPE_PCM_S24BE,
            CODEC_TYPE_PCM_S32LE,
            CODEC_TYPE_PCM_S32BE,
            CODEC_TYPE_PCM_F32LE,
            CODEC_TYPE_PCM_F32BE,
            CODEC_TYPE_PCM_F64LE,
            CODEC_TYPE_PCM_F64BE,
            CODEC_TYPE_PCM_ALAW,
            CODEC_TYPE_PCM_MULAW,
        ]
        .contains(&codec_type)
    }

    /// Map a MIME type to a codec.
    pub fn codec_from_mime_type(mime_type: &str) -> AudioCodec {
        match mime_type.to_ascii_lowercase().as_str() {
            "audio/mpeg" | "audio/mp3" => AudioCodec::Mp3,
            "audio/mp4" | "audio/aac" | "audio/x-m4a" => AudioCodec::Aac,
            "audio/flac" | "audio/x-flac" => AudioCodec::Flac,
            "audio/ogg" | "audio/vorbis" => AudioCodec::Vorbis,
            "audio/opus" => AudioCodec::Opus,
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => AudioCodec::Wav,
            _ => AudioCodec::Unknown,
        }
    }

    /// Get the common file extension for a codec.
    pub fn codec_extension(codec: &AudioCodec) -> &'static str {
        match codec {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "m4a",
            AudioCodec::Flac => "flac",
            AudioCodec::Vorbis => "ogg",
            AudioCodec::Opus => "opus",
            AudioCodec::Wav => "wav",
            AudioCodec::Alac => "m4a",
            AudioCodec::Unknown => "bin",
            AudioCodec::Other(_) => "bin",
        }
    }

    /// Get the MIME type for a codec.
    pub fn codec_mime_type(codec: &AudioCodec) -> &'static str {
        match codec {
            AudioCodec::Mp3 => "audio/mpeg",
            AudioCodec::Aac => "audio/mp4",
            AudioCodec::Flac => "audio/flac",
            AudioCodec::Vorbis => "audio/ogg",
            AudioCodec::Opus => "audio/opus",
            AudioCodec::Wav => "audio/wav",
            AudioCodec::Alac => "audio/mp4",
            AudioCodec::Unknown => "application/octet-stream",
            AudioCodec::Other(_) => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::FrameCodec;

    struct NamedFactory {
        codec: AudioCodec,
    }

    impl CodecFactory for NamedFactory {
        fn codec(&self) -> AudioCodec {
            self.codec.clone()
        }

        fn handles_extension(&self, extension: &str) -> bool {
            extension == FormatDetector::codec_extension(&self.codec)
        }

        fn handles_mime_type(&self, mime_type: &str) -> bool {
            mime_type == FormatDetector::codec_mime_type(&self.codec)
        }

        fn create(&self) -> Box<dyn FrameCodec> {
            unimplemented!("not needed for ordering")
        }
    }

    fn factories() -> Vec<Arc<dyn CodecFactory>> {
        [AudioCodec::Mp3, AudioCodec::Flac, AudioCodec::Wav]
            .into_iter()
            .map(|codec| Arc::new(NamedFactory { codec }) as Arc<dyn CodecFactory>)
            .collect()
    }

    fn codecs(ordered: &[Arc<dyn CodecFactory>]) -> Vec<AudioCodec> {
        ordered.iter().map(|f| f.codec()).collect()
    }

    #[test]
    fn test_mime_beats_extension() {
        let hint = FormatHint::new(Some("flac".into()), Some("audio/wav; codecs=1".into()));
        let ordered = FormatDetector::order_factories(&factories(), &hint, &[]);
        assert_eq!(
            codecs(&ordered),
            vec![AudioCodec::Wav, AudioCodec::Flac, AudioCodec::Mp3]
        );
    }

    #[test]
    fn test_sniffing_breaks_ties() {
        let ordered =
            FormatDetector::order_factories(&factories(), &FormatHint::default(), b"fLaC\0\0\0\x22");
        assert_eq!(codecs(&ordered)[0], AudioCodec::Flac);
    }

    #[test]
    fn test_registration_order_without_hints() {
        let ordered = FormatDetector::order_factories(&factories(), &FormatHint::default(), &[]);
        assert_eq!(
            codecs(&ordered),
            vec![AudioCodec::Mp3, AudioCodec::Flac, AudioCodec::Wav]
        );
    }

    #[test]
    fn test_sniff() {
        assert_eq!(FormatDetector::sniff(b"RIFF\0\0\0\0WAVE"), Some(AudioCodec::Wav));
        assert_eq!(FormatDetector::sniff(b"ID3\x04"), Some(AudioCodec::Mp3));
        assert_eq!(FormatDetector::sniff(&[0xFF, 0xFB, 0x90]), Some(AudioCodec::Mp3));
        assert_eq!(FormatDetector::sniff(&[0xFF, 0xF1, 0x50]), Some(AudioCodec::Aac));
        assert_eq!(FormatDetector::sniff(b"\0\0\0\x20ftypM4A "), Some(AudioCodec::Aac));
        assert_eq!(FormatDetector::sniff(b"hello"), None);
    }

    #[test]
    fn test_detect_codec() {
        use symphonia::core::codecs::{
            CODEC_TYPE_AAC, CODEC_TYPE_FLAC, CODEC_TYPE_MP2, CODEC_TYPE_PCM_F32LE,
            CODEC_TYPE_PCM_S16LE,
        };

        assert_eq!(FormatDetector::detect_codec(CODEC_TYPE_MP2), AudioCodec::Mp3);
        assert_eq!(FormatDetector::detect_codec(CODEC_TYPE_AAC), AudioCodec::Aac);
        assert_eq!(FormatDetector::detect_codec(CODEC_TYPE_FLAC), AudioCodec::Flac);
        assert_eq!(FormatDetector::detect_codec(CODEC_TYPE_PCM_S16LE), AudioCodec::Wav);
        assert!(FormatDetector::is_interleaved_pcm(CODEC_TYPE_PCM_F32LE));
        assert!(!FormatDetector::is_interleaved_pcm(CODEC_TYPE_AAC));
    }

    #[test]
    fn test_codec_from_mime_type() {
        assert_eq!(FormatDetector::codec_from_mime_type("audio/MPEG"), AudioCodec::Mp3);
        assert_eq!(FormatDetector::codec_from_mime_type("audio/x-wav"), AudioCodec::Wav);
        assert_eq!(FormatDetector::codec_from_mime_type("text/html"), AudioCodec::Unknown);
    }

    #[test]
    fn test_codec_extension() {
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Mp3), "mp3");
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Flac), "flac");
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Vorbis), "ogg");
        assert_eq!(FormatDetector::codec_extension(&AudioCodec::Wav), "wav");
    }

    #[test]
    fn test_codec_mime_type() {
        assert_eq!(FormatDetector::codec_mime_type(&AudioCodec::Mp3), "audio/mpeg");
        assert_eq!(FormatDetector::codec_mime_type(&AudioCodec::Wav), "audio/wav");
    }
}
