//! The transcode executor: one job, one ffmpeg invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use vidforge_common::{EncoderSettings, Operation, Result, Watermark};

use crate::command::ToolCommand;
use crate::compiler::{codec, compile_ops, watermark};
use crate::package::{Deliverable, OutputLayout};

/// Default engine timeout: one hour.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Immutable process-wide compiler settings, selected once at startup.
#[derive(Debug, Clone, Default)]
pub struct TranscodeSettings {
    pub encoder: EncoderSettings,
    pub watermark: Watermark,
}

/// One unit of work.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub operations: Vec<Operation>,
    /// Directory that receives the output.
    pub work_dir: PathBuf,
}

/// The compiled command line and where it writes.
#[derive(Debug, Clone)]
pub struct TranscodePlan {
    /// Full argument vector, without the program.
    pub args: Vec<String>,
    pub layout: OutputLayout,
}

/// Compiles jobs into ffmpeg invocations and runs them.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    settings: Arc<TranscodeSettings>,
    timeout: Duration,
}

impl Transcoder {
    pub fn new(ffmpeg: PathBuf, settings: Arc<TranscodeSettings>) -> Self {
        Self {
            ffmpeg,
            settings,
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// Compile a job into its argument vector and output layout.
    ///
    /// Pure apart from generating unique output names.
    pub fn plan(&self, job: &TranscodeJob) -> TranscodePlan {
        let settings = &self.settings;
        let compiled = compile_ops(&job.operations, settings.encoder.mode);
        let profile = codec::select(
            compiled.target_format(),
            compiled.thumbnail_at.is_some(),
            &settings.encoder,
            &compiled.overrides,
        );
        let chain = watermark::apply(
            &settings.watermark,
            compiled.filters.clone(),
            profile.hw_upload,
        );

        let layout = if compiled.is_segmented() {
            OutputLayout::segmented(&job.work_dir)
        } else {
            OutputLayout::single(&job.work_dir, &profile.container)
        };

        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-loglevel", "error"]
            .into_iter()
            .map(String::from)
            .collect();

        if settings.encoder.mode.is_hardware() {
            args.push("-vaapi_device".into());
            args.push(settings.encoder.hw_device.clone());
        }

        args.push("-i".into());
        args.push(job.input.to_string_lossy().to_string());

        args.extend(chain.to_args(!compiled.audio_removed));

        if let Some(ref at) = compiled.thumbnail_at {
            args.extend(["-ss".to_string(), at.clone(), "-frames:v".into(), "1".into()]);
        }

        if compiled.audio_removed {
            args.push("-an".into());
        }

        args.extend(profile.to_args(compiled.audio_removed));

        if let OutputLayout::Segmented {
            ref segment_template,
            ..
        } = layout
        {
            args.push("-hls_segment_filename".into());
            args.push(segment_template.to_string_lossy().to_string());
        }

        args.push(layout.target().to_string_lossy().to_string());

        TranscodePlan { args, layout }
    }

    /// Run a job to completion.
    ///
    /// The engine runs exactly once; a non-zero exit is returned as
    /// [`vidforge_common::Error::Tool`] with the engine's stderr.
    pub async fn run(&self, job: &TranscodeJob) -> Result<Deliverable> {
        let plan = self.plan(job);
        plan.layout.prepare()?;

        tracing::debug!("ffmpeg {}", plan.args.join(" "));

        let start = Instant::now();
        ToolCommand::new(self.ffmpeg.clone())
            .args(plan.args)
            .timeout(self.timeout)
            .execute()
            .await?;
        tracing::info!("ffmpeg finished in {:.2?}", start.elapsed());

        plan.layout.finish().await
    }
}
