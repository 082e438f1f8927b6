//! Operation descriptors to filter expressions and encode overrides.

use vidforge_common::{EncoderMode, Operation};

/// Per-job overrides of the encoder defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeOverrides {
    /// Quality factor; rendered as `-crf` or `-qp` depending on the encoder.
    pub quality: Option<String>,
    /// Speed preset (software encoders only).
    pub preset: Option<String>,
    pub video_bitrate: Option<String>,
    pub audio_bitrate: Option<String>,
}

/// Everything collected from one pass over the operation list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledOps {
    /// Linear filter expressions in client order.
    pub filters: Vec<String>,
    pub overrides: EncodeOverrides,
    /// Lower-cased `format:type=...`, last one wins.
    pub format: Option<String>,
    /// Seek position for single-frame extraction.
    pub thumbnail_at: Option<String>,
    pub audio_removed: bool,
}

impl CompiledOps {
    /// Whether the output is an HLS playlist plus segments.
    pub fn is_segmented(&self) -> bool {
        matches!(self.format.as_deref(), Some("hls" | "m3u8"))
    }

    /// The format the codec selector should target.
    ///
    /// An explicit `format` wins; otherwise a thumbnail implies `png`;
    /// otherwise `None` selects the default container.
    pub fn target_format(&self) -> Option<&str> {
        match (&self.format, &self.thumbnail_at) {
            (Some(fmt), _) => Some(fmt.as_str()),
            (None, Some(_)) => Some("png"),
            (None, None) => None,
        }
    }
}

/// Walk the operations in order and collect filters, overrides, and flags.
///
/// Unknown operation names are ignored.
pub fn compile_ops(ops: &[Operation], mode: EncoderMode) -> CompiledOps {
    let mut out = CompiledOps::default();

    for op in ops {
        match op.name.as_str() {
            "format" => {
                out.format = Some(op.value_or("type", "mp4").to_lowercase());
            }

            "resize" | "scale" => {
                // -2 keeps the aspect ratio and rounds to an even size.
                let w = op.value_or("width", "-2");
                let h = op.value_or("height", "-2");
                out.filters.push(format!("scale={w}:{h}"));
            }

            "fps" => {
                out.filters.push(format!("fps={}", op.value_or("value", "30")));
            }

            "crop" => {
                let w = op.value_or("width", "iw");
                let h = op.value_or("height", "ih");
                let x = op.value_or("x", "(iw-ow)/2");
                let y = op.value_or("y", "(ih-oh)/2");
                out.filters.push(format!("crop={w}:{h}:{x}:{y}"));
            }

            "bitrate" => {
                if let Some(v) = op.get("video") {
                    out.overrides.video_bitrate = Some(v.to_string());
                }
                if let Some(a) = op.get("audio") {
                    out.overrides.audio_bitrate = Some(a.to_string());
                }
            }

            "crf" => {
                out.overrides.quality = Some(op.value_or("value", "23"));
            }

            "preset" => {
                if mode.is_hardware() {
                    tracing::debug!("preset has no effect on the hardware encoder; ignoring");
                } else {
                    out.overrides.preset = Some(op.value_or("value", "veryfast"));
                }
            }

            "audio" => {
                if op.flag("remove") {
                    out.audio_removed = true;
                }
            }

            "rotate" => {
                let degrees = match op.get("degrees") {
                    None => 0,
                    Some(v) => match v.as_i64() {
                        Some(d) => d,
                        None => {
                            tracing::warn!("rotate: ignoring non-numeric degrees {v}");
                            continue;
                        }
                    },
                };
                if let Some(filter) = rotate_filter(degrees) {
                    out.filters.push(filter);
                }
            }

            "grayscale" | "monochrome" => {
                out.filters.push("format=gray".into());
            }

            "thumbnail" => {
                out.thumbnail_at = Some(op.value_or("at", "1"));
            }

            "fast" => {
                out.overrides.quality = Some("28".into());
                if !mode.is_hardware() {
                    out.overrides.preset = Some("ultrafast".into());
                }
            }

            other => {
                tracing::debug!("Ignoring unknown operation '{other}'");
            }
        }
    }

    out
}

/// Filter for a rotation in degrees.
///
/// Quarter turns use lossless transposes; 0 (and full turns) need no filter.
/// Anything else uses the generic rotate filter with black corners.
pub fn rotate_filter(degrees: i64) -> Option<String> {
    if degrees % 90 == 0 {
        match degrees.rem_euclid(360) {
            90 => Some("transpose=1".into()),
            180 => Some("transpose=1,transpose=1".into()),
            270 => Some("transpose=2".into()),
            _ => None,
        }
    } else {
        let radians = (degrees as f64).to_radians();
        Some(format!("rotate={radians}:fillcolor=black"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidforge_common::parse_ops;

    fn compile(raw: &[&str]) -> CompiledOps {
        compile_ops(&parse_ops(raw), EncoderMode::Software)
    }

    #[test]
    fn resize_with_explicit_dimensions() {
        let c = compile(&["resize:width=1280,height=-2"]);
        assert_eq!(c.filters, vec!["scale=1280:-2"]);
    }

    #[test]
    fn scale_defaults_keep_aspect() {
        assert_eq!(compile(&["scale"]).filters, vec!["scale=-2:-2"]);
        assert_eq!(compile(&["scale:width=640"]).filters, vec!["scale=640:-2"]);
    }

    #[test]
    fn fps_default_and_float() {
        assert_eq!(compile(&["fps"]).filters, vec!["fps=30"]);
        assert_eq!(compile(&["fps:value=29.97"]).filters, vec!["fps=29.97"]);
    }

    #[test]
    fn crop_defaults_to_centered_full_frame() {
        assert_eq!(
            compile(&["crop"]).filters,
            vec!["crop=iw:ih:(iw-ow)/2:(ih-oh)/2"]
        );
        assert_eq!(
            compile(&["crop:width=640,height=360,x=0,y=10"]).filters,
            vec!["crop=640:360:0:10"]
        );
    }

    #[test]
    fn rotate_quarter_turns() {
        assert_eq!(compile(&["rotate:degrees=90"]).filters, vec!["transpose=1"]);
        assert_eq!(
            compile(&["rotate:degrees=180"]).filters,
            vec!["transpose=1,transpose=1"]
        );
        assert_eq!(compile(&["rotate:degrees=270"]).filters, vec!["transpose=2"]);
        assert_eq!(compile(&["rotate:degrees=-90"]).filters, vec!["transpose=2"]);
    }

    #[test]
    fn rotate_identity_yields_no_filter() {
        assert!(compile(&["rotate:degrees=0"]).filters.is_empty());
        assert!(compile(&["rotate:degrees=360"]).filters.is_empty());
        assert!(compile(&["rotate"]).filters.is_empty());
    }

    #[test]
    fn rotate_arbitrary_uses_radians() {
        let c = compile(&["rotate:degrees=45"]);
        let expected = format!("rotate={}:fillcolor=black", 45f64.to_radians());
        assert_eq!(c.filters, vec![expected]);
        assert!(c.filters[0].starts_with("rotate=0.785398"));
    }

    #[test]
    fn rotate_non_numeric_is_ignored() {
        assert!(compile(&["rotate:degrees=left"]).filters.is_empty());
    }

    #[test]
    fn grayscale_aliases() {
        assert_eq!(compile(&["grayscale"]).filters, vec!["format=gray"]);
        assert_eq!(compile(&["monochrome"]).filters, vec!["format=gray"]);
    }

    #[test]
    fn filters_keep_client_order_and_duplicates() {
        let c = compile(&["fps:value=24", "grayscale", "scale:width=320", "fps:value=12"]);
        assert_eq!(
            c.filters,
            vec!["fps=24", "format=gray", "scale=320:-2", "fps=12"]
        );
    }

    #[test]
    fn unknown_operation_changes_nothing() {
        let with_unknown = compile(&["resize:width=640", "sharpen:amount=3", "bogus"]);
        let without = compile(&["resize:width=640"]);
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn format_sets_segmented_for_hls() {
        let c = compile(&["format:type=HLS"]);
        assert_eq!(c.format.as_deref(), Some("hls"));
        assert!(c.is_segmented());
        assert!(compile(&["format:type=m3u8"]).is_segmented());
        assert!(!compile(&["format:type=webm"]).is_segmented());
    }

    #[test]
    fn last_format_wins() {
        let c = compile(&["format:type=hls", "format:type=webm"]);
        assert_eq!(c.target_format(), Some("webm"));
        assert!(!c.is_segmented());
    }

    #[test]
    fn thumbnail_defaults_to_png() {
        let c = compile(&["thumbnail:at=5"]);
        assert_eq!(c.thumbnail_at.as_deref(), Some("5"));
        assert_eq!(c.target_format(), Some("png"));
    }

    #[test]
    fn explicit_format_beats_thumbnail_regardless_of_order() {
        assert_eq!(
            compile(&["thumbnail", "format:type=jpg"]).target_format(),
            Some("jpg")
        );
        assert_eq!(
            compile(&["format:type=gif", "thumbnail"]).target_format(),
            Some("gif")
        );
        assert_eq!(compile(&["thumbnail"]).thumbnail_at.as_deref(), Some("1"));
    }

    #[test]
    fn no_format_means_default_container() {
        assert_eq!(compile(&["grayscale"]).target_format(), None);
    }

    #[test]
    fn bitrate_overrides() {
        let c = compile(&["bitrate:video=2M,audio=128k"]);
        assert_eq!(c.overrides.video_bitrate.as_deref(), Some("2M"));
        assert_eq!(c.overrides.audio_bitrate.as_deref(), Some("128k"));
    }

    #[test]
    fn audio_remove_flag() {
        assert!(compile(&["audio:remove=true"]).audio_removed);
        assert!(compile(&["audio:remove"]).audio_removed);
        assert!(!compile(&["audio:remove=false"]).audio_removed);
        assert!(!compile(&["audio"]).audio_removed);
    }

    #[test]
    fn crf_and_preset_in_software_mode() {
        let c = compile(&["crf:value=18", "preset:value=slow"]);
        assert_eq!(c.overrides.quality.as_deref(), Some("18"));
        assert_eq!(c.overrides.preset.as_deref(), Some("slow"));
    }

    #[test]
    fn preset_ignored_in_hardware_mode() {
        let ops = parse_ops(["crf:value=20", "preset:value=slow"]);
        let c = compile_ops(&ops, EncoderMode::Hardware);
        assert_eq!(c.overrides.quality.as_deref(), Some("20"));
        assert!(c.overrides.preset.is_none());
    }

    #[test]
    fn fast_shortcut() {
        let c = compile(&["fast"]);
        assert_eq!(c.overrides.quality.as_deref(), Some("28"));
        assert_eq!(c.overrides.preset.as_deref(), Some("ultrafast"));

        let hw = compile_ops(&parse_ops(["fast"]), EncoderMode::Hardware);
        assert_eq!(hw.overrides.quality.as_deref(), Some("28"));
        assert!(hw.overrides.preset.is_none());
    }
}
