//! End-to-end compilation: operation strings in, engine argv out.

use std::path::PathBuf;
use std::sync::Arc;

use vidforge_av::{TranscodeJob, TranscodeSettings, Transcoder};
use vidforge_common::{parse_ops, EncoderMode, EncoderSettings, OpValue, Watermark};

fn settings(mode: EncoderMode) -> TranscodeSettings {
    TranscodeSettings {
        encoder: EncoderSettings {
            mode,
            ..Default::default()
        },
        watermark: Watermark::Text {
            text: "© Demo Watermark".into(),
            font: PathBuf::from("/fonts/DejaVuSans.ttf"),
            font_size: 28,
            opacity: 35,
            inset: 12,
        },
    }
}

fn plan(mode: EncoderMode, ops: &[&str]) -> Vec<String> {
    let transcoder = Transcoder::new(PathBuf::from("ffmpeg"), Arc::new(settings(mode)));
    let job = TranscodeJob {
        input: PathBuf::from("/jobs/1/in"),
        operations: parse_ops(ops),
        work_dir: PathBuf::from("/jobs/1"),
    };
    transcoder.plan(&job).args
}

fn after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).map(String::as_str)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn parsing_is_deterministic() {
    let raw = ["resize:width=1280,height=-2", "fps:value=29.97", "audio:remove=true"];
    assert_eq!(parse_ops(raw), parse_ops(raw));

    let ops = parse_ops(raw);
    assert_eq!(ops[0].get("width"), Some(&OpValue::Int(1280)));
    assert_eq!(ops[1].get("value"), Some(&OpValue::Float(29.97)));
    assert_eq!(ops[2].get("remove"), Some(&OpValue::Bool(true)));
}

// ---------------------------------------------------------------------------
// Documented examples
// ---------------------------------------------------------------------------

#[test]
fn resize_is_followed_by_watermark_in_mp4() {
    let args = plan(EncoderMode::Software, &["resize:width=1280,height=-2"]);
    let vf = after(&args, "-vf").unwrap();
    let stages: Vec<&str> = vf.splitn(2, ',').collect();
    assert_eq!(stages[0], "scale=1280:-2");
    assert!(stages[1].starts_with("drawtext="));
    assert!(args.last().unwrap().ends_with(".mp4"));
    assert_eq!(after(&args, "-c:v"), Some("libx264"));
    assert_eq!(after(&args, "-c:a"), Some("aac"));
}

#[test]
fn gif_disables_audio_and_keeps_watermark() {
    let args = plan(EncoderMode::Software, &["format:type=gif"]);
    assert!(args.iter().any(|a| a == "-an"));
    assert!(after(&args, "-vf").unwrap().contains("drawtext="));
    assert!(args.last().unwrap().ends_with(".gif"));
}

#[test]
fn thumbnail_extracts_single_frame_image() {
    let args = plan(EncoderMode::Software, &["thumbnail:at=5"]);
    assert_eq!(after(&args, "-ss"), Some("5"));
    assert_eq!(after(&args, "-frames:v"), Some("1"));
    assert!(args.last().unwrap().ends_with(".png"));
}

#[test]
fn webm_selects_vp9_and_opus() {
    for mode in [EncoderMode::Software, EncoderMode::Hardware] {
        let args = plan(mode, &["format:type=webm"]);
        assert_eq!(after(&args, "-c:v"), Some("libvpx-vp9"));
        assert_eq!(after(&args, "-c:a"), Some("libopus"));
        assert!(args.last().unwrap().ends_with(".webm"));
    }
}

#[test]
fn default_codecs_follow_encoder_mode() {
    let sw = plan(EncoderMode::Software, &[]);
    assert_eq!(after(&sw, "-c:v"), Some("libx264"));
    assert_eq!(after(&sw, "-crf"), Some("23"));

    let hw = plan(EncoderMode::Hardware, &["format:type=mp4"]);
    assert_eq!(after(&hw, "-c:v"), Some("h264_vaapi"));
    assert_eq!(after(&hw, "-qp"), Some("23"));
    assert!(after(&hw, "-vf").unwrap().ends_with("format=nv12,hwupload"));
}

#[test]
fn video_bitrate_drives_software_h264_rate_control() {
    for fmt in ["mp4", "mkv", "hls"] {
        let ty = format!("format:type={fmt}");
        let args = plan(EncoderMode::Software, &[ty.as_str(), "bitrate:video=2M"]);
        assert_eq!(after(&args, "-b:v"), Some("2M"), "{fmt}");
        assert!(!args.contains(&"-crf".to_string()), "{fmt}: {args:?}");

        let capped = plan(
            EncoderMode::Software,
            &[ty.as_str(), "crf:value=20", "bitrate:video=2M"],
        );
        assert_eq!(after(&capped, "-crf"), Some("20"), "{fmt}");
        assert_eq!(after(&capped, "-maxrate"), Some("2M"), "{fmt}");
        assert!(!capped.contains(&"-b:v".to_string()), "{fmt}: {capped:?}");
    }
}

#[test]
fn hls_is_segmented() {
    let args = plan(EncoderMode::Software, &["format:type=hls"]);
    assert_eq!(after(&args, "-f"), Some("hls"));
    assert_eq!(after(&args, "-hls_time"), Some("4"));
    assert!(after(&args, "-hls_segment_filename")
        .unwrap()
        .ends_with("seg_%04d.ts"));
    assert!(args.last().unwrap().ends_with("index.m3u8"));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn rotations_map_to_one_transform() {
    let cases = [
        ("rotate:degrees=90", Some("transpose=1")),
        ("rotate:degrees=180", Some("transpose=1,transpose=1")),
        ("rotate:degrees=270", Some("transpose=2")),
        ("rotate:degrees=0", None),
    ];
    for (op, expected) in cases {
        let mut settings = settings(EncoderMode::Software);
        settings.watermark = Watermark::Disabled;
        let transcoder = Transcoder::new(PathBuf::from("ffmpeg"), Arc::new(settings));
        let job = TranscodeJob {
            input: PathBuf::from("/in"),
            operations: parse_ops([op]),
            work_dir: PathBuf::from("/tmp"),
        };
        let args = transcoder.plan(&job).args;
        assert_eq!(after(&args, "-vf"), expected, "{op}");
    }
}

#[test]
fn arbitrary_rotation_uses_radians() {
    let args = plan(EncoderMode::Software, &["rotate:degrees=30"]);
    let expected = format!("rotate={}:fillcolor=black", 30f64.to_radians());
    assert!(after(&args, "-vf").unwrap().starts_with(&expected));
}

#[test]
fn watermark_present_regardless_of_operations() {
    for ops in [
        &[][..],
        &["grayscale"][..],
        &["format:type=webm", "fast"][..],
        &["crop:width=100,height=100", "fps:value=10", "format:type=hls"][..],
    ] {
        let args = plan(EncoderMode::Software, ops);
        let vf = after(&args, "-vf").unwrap();
        assert!(vf.rsplit(',').any(|f| f.starts_with("drawtext=")), "{ops:?}");
    }
}

#[test]
fn unrecognized_operations_are_inert() {
    let base = plan(EncoderMode::Software, &["grayscale"]);
    let noisy = plan(EncoderMode::Software, &["grayscale", "vignette:angle=0.5", "sepia"]);
    assert_eq!(after(&base, "-vf"), after(&noisy, "-vf"));
}
