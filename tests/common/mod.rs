//! Shared helpers for integration tests.
//!
//! [`FakeEngine`] is a shell script standing in for ffmpeg. It records its
//! arguments, then writes whatever output the command line asks for: a
//! playlist plus two segments when `-hls_segment_filename` is present, a
//! single file otherwise.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use vidforge_av::{TranscodeSettings, Transcoder};
use vidforge_common::{EncoderSettings, Watermark};

pub struct FakeEngine {
    pub dir: TempDir,
    pub program: PathBuf,
    pub args_log: PathBuf,
}

impl FakeEngine {
    /// An engine that succeeds and writes plausible output.
    pub fn succeeding() -> Self {
        Self::with_script(
            r#"out=""
tmpl=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-hls_segment_filename" ]; then tmpl="$a"; fi
  prev="$a"
  out="$a"
done
if [ -n "$tmpl" ]; then
  printf '#EXTM3U\n' > "$out"
  printf 'ts0' > "$(printf "$tmpl" 0)"
  printf 'ts1' > "$(printf "$tmpl" 1)"
else
  printf 'media' > "$out"
fi
"#,
        )
    }

    /// An engine that exits non-zero with a diagnostic on stderr.
    pub fn failing() -> Self {
        Self::with_script("echo 'Invalid data found when processing input' >&2\nexit 1\n")
    }

    /// An engine that exits zero but writes nothing.
    pub fn silent() -> Self {
        Self::with_script("exit 0\n")
    }

    /// An engine running an arbitrary script body.
    pub fn with_script(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let program = dir.path().join("ffmpeg");
        let args_log = dir.path().join("args.txt");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}",
            args_log.display(),
            body
        );
        fs::write(&program, script).unwrap();
        make_executable(&program);
        Self {
            dir,
            program,
            args_log,
        }
    }

    /// Arguments of the last invocation.
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(&self.args_log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    pub fn transcoder(&self, settings: TranscodeSettings) -> Transcoder {
        Transcoder::new(self.program.clone(), Arc::new(settings))
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// Software encoder with a text watermark.
pub fn text_settings() -> TranscodeSettings {
    TranscodeSettings {
        encoder: EncoderSettings::default(),
        watermark: Watermark::Text {
            text: "© Demo Watermark".into(),
            font: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            font_size: 28,
            opacity: 35,
            inset: 12,
        },
    }
}
