//! Codec and container selection.
//!
//! A pure function of (target format, encoder mode, overrides). The software
//! path encodes with libx264 using preset + CRF; the hardware path encodes
//! with h264_vaapi at a fixed QP with bitrate control disabled. Formats whose
//! codecs have no VAAPI variant (webm, gif, still images) are software in
//! both modes.

use vidforge_common::{EncoderMode, EncoderSettings};

use super::EncodeOverrides;

/// HLS segment duration in seconds.
pub const HLS_SEGMENT_SECONDS: u32 = 4;

/// Concrete encode arguments for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecProfile {
    /// Output file extension.
    pub container: String,
    pub video_args: Vec<String>,
    pub audio_args: Vec<String>,
    pub muxer_args: Vec<String>,
    /// Whether the video encoder consumes VAAPI surfaces.
    pub hw_upload: bool,
}

impl CodecProfile {
    /// Flatten into command-line arguments.
    ///
    /// Audio codec arguments are skipped when the job strips audio.
    pub fn to_args(&self, audio_removed: bool) -> Vec<String> {
        let mut args = vec!["-threads".to_string(), "0".to_string()];
        args.extend(self.video_args.iter().cloned());
        if !audio_removed {
            args.extend(self.audio_args.iter().cloned());
        }
        args.extend(self.muxer_args.iter().cloned());
        args
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Select the codec profile for a target format.
///
/// `single_frame` routes image formats (png, jpg, jpeg, webp) to a still
/// image encode. Unrecognized formats fall back to mp4.
pub fn select(
    target: Option<&str>,
    single_frame: bool,
    encoder: &EncoderSettings,
    overrides: &EncodeOverrides,
) -> CodecProfile {
    let fmt = target.unwrap_or("mp4").to_ascii_lowercase();

    if single_frame {
        if let Some(profile) = image_profile(&fmt) {
            return profile;
        }
    }

    match fmt.as_str() {
        "webm" => {
            let mut video = strings(&["-c:v", "libvpx-vp9", "-row-mt", "1"]);
            if let Some(ref q) = overrides.quality {
                video.extend(strings(&["-crf", q]));
                if overrides.video_bitrate.is_none() {
                    // Constant-quality mode needs the bitrate cap lifted.
                    video.extend(strings(&["-b:v", "0"]));
                }
            }
            if let Some(ref b) = overrides.video_bitrate {
                video.extend(strings(&["-b:v", b]));
            }
            if overrides.preset.is_some() {
                tracing::debug!("libvpx-vp9 has no preset; ignoring");
            }
            CodecProfile {
                container: "webm".into(),
                video_args: video,
                audio_args: audio("libopus", overrides),
                muxer_args: Vec::new(),
                hw_upload: false,
            }
        }

        "mkv" => {
            let (video, hw_upload) = h264_video(encoder, overrides);
            CodecProfile {
                container: "mkv".into(),
                video_args: video,
                audio_args: audio("aac", overrides),
                muxer_args: Vec::new(),
                hw_upload,
            }
        }

        "gif" => {
            if overrides != &EncodeOverrides::default() {
                tracing::debug!("gif output ignores quality and bitrate overrides");
            }
            CodecProfile {
                container: "gif".into(),
                video_args: Vec::new(),
                audio_args: strings(&["-an"]),
                muxer_args: strings(&["-loop", "0"]),
                hw_upload: false,
            }
        }

        "hls" | "m3u8" => {
            let (video, hw_upload) = h264_video(encoder, overrides);
            CodecProfile {
                container: "m3u8".into(),
                video_args: video,
                audio_args: audio("aac", overrides),
                muxer_args: vec![
                    "-f".into(),
                    "hls".into(),
                    "-hls_time".into(),
                    HLS_SEGMENT_SECONDS.to_string(),
                    "-hls_list_size".into(),
                    "0".into(),
                ],
                hw_upload,
            }
        }

        // mp4, m4v, mov, and anything unrecognized.
        other => {
            if !matches!(other, "mp4" | "m4v" | "mov") {
                tracing::debug!("Unrecognized format '{other}'; using mp4");
            }
            let (mut video, hw_upload) = h264_video(encoder, overrides);
            if !hw_upload {
                video.extend(strings(&["-pix_fmt", "yuv420p"]));
            }
            CodecProfile {
                container: "mp4".into(),
                video_args: video,
                audio_args: audio("aac", overrides),
                muxer_args: strings(&["-movflags", "+faststart"]),
                hw_upload,
            }
        }
    }
}

/// H.264 video arguments for the active encoder mode.
///
/// Returns the arguments and whether the frames must be uploaded to the
/// accelerator first.
///
/// In software mode libx264 uses CRF whenever `-crf` is present, so the rate
/// control depends on what the job asked for:
///
/// - bitrate only: average-bitrate encode, no `-crf`;
/// - quality and bitrate: CRF capped by `-maxrate`/`-bufsize`;
/// - neither: CRF at the configured default.
fn h264_video(encoder: &EncoderSettings, overrides: &EncodeOverrides) -> (Vec<String>, bool) {
    let quality = overrides
        .quality
        .clone()
        .unwrap_or_else(|| encoder.crf.to_string());

    match encoder.mode {
        EncoderMode::Software => {
            let preset = overrides.preset.as_deref().unwrap_or(&encoder.preset);
            let mut args = strings(&["-c:v", "libx264", "-preset", preset]);
            match (&overrides.quality, &overrides.video_bitrate) {
                (None, Some(b)) => args.extend(strings(&["-b:v", b])),
                (Some(q), Some(b)) => {
                    args.extend(strings(&["-crf", q, "-maxrate", b, "-bufsize", b]))
                }
                (_, None) => args.extend(strings(&["-crf", &quality])),
            }
            (args, false)
        }
        EncoderMode::Hardware => {
            let bitrate = overrides.video_bitrate.as_deref().unwrap_or("0");
            let args = strings(&["-c:v", "h264_vaapi", "-b:v", bitrate, "-qp", &quality]);
            (args, true)
        }
    }
}

fn audio(codec: &str, overrides: &EncodeOverrides) -> Vec<String> {
    let mut args = strings(&["-c:a", codec]);
    if let Some(ref b) = overrides.audio_bitrate {
        args.extend(strings(&["-b:a", b]));
    }
    args
}

/// Single-frame still image encode, bypassing the video codecs.
fn image_profile(fmt: &str) -> Option<CodecProfile> {
    let codec = match fmt {
        "png" => "png",
        "jpg" | "jpeg" => "mjpeg",
        "webp" => "libwebp",
        _ => return None,
    };
    Some(CodecProfile {
        container: fmt.to_string(),
        video_args: strings(&["-c:v", codec]),
        audio_args: strings(&["-an"]),
        muxer_args: strings(&["-update", "1"]),
        hw_upload: false,
    })
}
