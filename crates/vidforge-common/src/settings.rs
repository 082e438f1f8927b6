//! Process-wide encoder and watermark settings.
//!
//! Both structs deserialize with sensible defaults so a completely empty
//! section is valid. They are established once at startup and shared
//! read-only between jobs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Which encoder backend compiles the video stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderMode {
    /// CPU encode via libx264.
    #[default]
    #[serde(alias = "libx264")]
    Software,
    /// VAAPI-accelerated encode via h264_vaapi.
    #[serde(alias = "h264_vaapi", alias = "vaapi")]
    Hardware,
}

impl EncoderMode {
    /// Parse a mode name, accepting the encoder names as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "software" | "libx264" => Some(EncoderMode::Software),
            "hardware" | "h264_vaapi" | "vaapi" => Some(EncoderMode::Hardware),
            _ => None,
        }
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self, EncoderMode::Hardware)
    }
}

/// Encoder defaults applied when a job does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub mode: EncoderMode,
    /// Quality factor (`-crf` in software mode, `-qp` in hardware mode).
    pub crf: u32,
    /// libx264 speed preset (software mode only).
    pub preset: String,
    /// VAAPI render node (hardware mode only).
    pub hw_device: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            mode: EncoderMode::Software,
            crf: 23,
            preset: "veryfast".into(),
            hw_device: "/dev/dri/renderD128".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Watermark
// ---------------------------------------------------------------------------

/// Watermark configuration as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub enabled: bool,
    pub text: String,
    /// PNG with alpha. When set and present on disk, it replaces the text.
    pub image: Option<PathBuf>,
    pub font: PathBuf,
    pub font_size: u32,
    /// Percentage, clamped to 0..=100 on resolution.
    pub opacity: i32,
    /// Distance from the bottom-right corner, in pixels.
    pub inset: u32,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            text: "© Demo Watermark".into(),
            image: None,
            font: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            font_size: 28,
            opacity: 35,
            inset: 12,
        }
    }
}

/// The compositing strategy chosen at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Watermark {
    #[default]
    Disabled,
    Image {
        path: PathBuf,
        opacity: u8,
        inset: u32,
    },
    Text {
        text: String,
        font: PathBuf,
        font_size: u32,
        opacity: u8,
        inset: u32,
    },
}

impl WatermarkSettings {
    /// Pick the compositing strategy.
    ///
    /// The image strategy wins when a configured image exists on disk;
    /// a missing image falls back to text.
    pub fn resolve(&self) -> Watermark {
        if !self.enabled {
            tracing::info!("Watermark disabled");
            return Watermark::Disabled;
        }

        let opacity = self.opacity.clamp(0, 100) as u8;

        if let Some(ref path) = self.image {
            if path.exists() {
                tracing::info!("Using image watermark {}", path.display());
                return Watermark::Image {
                    path: path.clone(),
                    opacity,
                    inset: self.inset,
                };
            }
            tracing::warn!(
                "Watermark image {} not found; falling back to text",
                path.display()
            );
        }

        Watermark::Text {
            text: self.text.clone(),
            font: self.font.clone(),
            font_size: self.font_size,
            opacity,
            inset: self.inset,
        }
    }
}

impl Watermark {
    /// Opacity as an alpha fraction in `0.0..=1.0`.
    pub fn alpha(&self) -> f64 {
        match self {
            Watermark::Disabled => 0.0,
            Watermark::Image { opacity, .. } | Watermark::Text { opacity, .. } => {
                f64::from(*opacity) / 100.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_defaults() {
        let enc = EncoderSettings::default();
        assert_eq!(enc.mode, EncoderMode::Software);
        assert_eq!(enc.crf, 23);
        assert_eq!(enc.preset, "veryfast");
    }

    #[test]
    fn encoder_mode_aliases() {
        assert_eq!(EncoderMode::from_name("libx264"), Some(EncoderMode::Software));
        assert_eq!(EncoderMode::from_name("H264_VAAPI"), Some(EncoderMode::Hardware));
        assert_eq!(EncoderMode::from_name("hardware"), Some(EncoderMode::Hardware));
        assert_eq!(EncoderMode::from_name("nvenc"), None);

        let enc: EncoderSettings = serde_json::from_str(r#"{"mode":"h264_vaapi"}"#).unwrap();
        assert!(enc.mode.is_hardware());
        assert_eq!(enc.crf, 23);
    }

    #[test]
    fn empty_section_uses_defaults() {
        let wm: WatermarkSettings = serde_json::from_str("{}").unwrap();
        assert!(wm.enabled);
        assert_eq!(wm.font_size, 28);
        assert_eq!(wm.opacity, 35);
        assert_eq!(wm.inset, 12);
    }

    #[test]
    fn disabled_resolves_to_disabled() {
        let wm = WatermarkSettings {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(wm.resolve(), Watermark::Disabled);
    }

    #[test]
    fn missing_image_falls_back_to_text() {
        let wm = WatermarkSettings {
            image: Some(PathBuf::from("/nonexistent/wm_12345.png")),
            ..Default::default()
        };
        assert!(matches!(wm.resolve(), Watermark::Text { .. }));
    }

    #[test]
    fn existing_image_selects_image() {
        let img = tempfile::NamedTempFile::new().unwrap();
        let wm = WatermarkSettings {
            image: Some(img.path().to_path_buf()),
            ..Default::default()
        };
        match wm.resolve() {
            Watermark::Image { path, opacity, inset } => {
                assert_eq!(path, img.path());
                assert_eq!(opacity, 35);
                assert_eq!(inset, 12);
            }
            other => panic!("expected image watermark, got {other:?}"),
        }
    }

    #[test]
    fn opacity_is_clamped() {
        let high = WatermarkSettings {
            opacity: 250,
            ..Default::default()
        };
        assert_eq!(high.resolve().alpha(), 1.0);

        let low = WatermarkSettings {
            opacity: -5,
            ..Default::default()
        };
        assert_eq!(low.resolve().alpha(), 0.0);
    }
}
