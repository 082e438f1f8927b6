mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use vidforge_common::EncoderMode;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./vidforge.toml",
        "~/.config/vidforge/config.toml",
        "/etc/vidforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Load config, then apply environment overrides and re-validate.
pub fn load_runtime_config(custom_path: Option<&Path>) -> Result<Config> {
    let mut config = load_config_or_default(custom_path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Apply `FFMPEG_BIN`, `VIDEO_*`, `VAAPI_DEVICE`, and `WATERMARK_*` overrides.
///
/// `lookup` returns the value of an environment variable, if set.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("FFMPEG_BIN") {
        config.tools.ffmpeg_path = Some(PathBuf::from(v));
    }

    if let Some(v) = get("VIDEO_ENCODER") {
        match EncoderMode::from_name(&v) {
            Some(mode) => config.encoder.mode = mode,
            None => tracing::warn!("Ignoring unknown VIDEO_ENCODER '{}'", v),
        }
    }
    if let Some(crf) = parse_env(&get, "VIDEO_CRF") {
        config.encoder.crf = crf;
    }
    if let Some(v) = get("VIDEO_PRESET") {
        config.encoder.preset = v;
    }
    if let Some(v) = get("VAAPI_DEVICE") {
        config.encoder.hw_device = v;
    }

    if let Some(v) = get("WATERMARK_ENABLED") {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => config.watermark.enabled = true,
            "0" | "false" | "no" | "off" => config.watermark.enabled = false,
            _ => tracing::warn!("Ignoring invalid WATERMARK_ENABLED '{}'", v),
        }
    }
    if let Some(v) = get("WATERMARK_TEXT") {
        config.watermark.text = v;
    }
    if let Some(v) = get("WATERMARK_IMAGE") {
        config.watermark.image = Some(PathBuf::from(v));
    }
    if let Some(v) = get("WATERMARK_FONT") {
        config.watermark.font = PathBuf::from(v);
    }
    if let Some(size) = parse_env(&get, "WATERMARK_POINTSIZE") {
        config.watermark.font_size = size;
    }
    if let Some(opacity) = parse_env(&get, "WATERMARK_OPACITY") {
        config.watermark.opacity = opacity;
    }
    if let Some(inset) = parse_env(&get, "WATERMARK_INSET") {
        config.watermark.inset = inset;
    }
}

fn parse_env<T, G>(get: &G, key: &str) -> Option<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring non-numeric {}='{}'", key, raw);
            None
        }
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.encoder.preset.trim().is_empty() {
        anyhow::bail!("Encoder preset cannot be empty");
    }

    if config.encoder.mode.is_hardware() && config.encoder.hw_device.trim().is_empty() {
        anyhow::bail!("Hardware encoder requires a VAAPI device");
    }

    if config.tools.timeout_secs == 0 {
        anyhow::bail!("Tool timeout cannot be 0");
    }

    if config.watermark.enabled {
        if let Some(ref image) = config.watermark.image {
            if !image.exists() {
                tracing::warn!("Watermark image does not exist: {:?}", image);
            }
        } else if !config.watermark.font.exists() {
            tracing::warn!("Watermark font does not exist: {:?}", config.watermark.font);
        }
    }

    Ok(())
}
