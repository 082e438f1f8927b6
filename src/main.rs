mod cli;

use vidforge::{config, server};
use vidforge_av::{check_tool, resolve_ffmpeg, JobWorkspace, TranscodeJob};
use vidforge_common::parse_ops;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_runtime_config(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting vidforge");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidforge=trace,vidforge_av=trace,vidforge_common=debug,tower_http=debug".to_string()
        } else {
            "vidforge=debug,vidforge_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Process { input, ops, output } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(process_file(
                &input,
                &ops,
                output.as_deref(),
                cli.config.as_deref(),
            ))
        }
        Commands::Plan { input, ops } => plan_file(&input, &ops, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn process_file(
    input: &Path,
    ops: &[String],
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let config = config::load_runtime_config(config_path)?;
    let work_base = config.server.work_dir.clone();
    let ctx = server::AppContext::from_config(config)?;

    let workspace = JobWorkspace::new(work_base.as_deref())?;
    let job = TranscodeJob {
        input: input.to_path_buf(),
        operations: parse_ops(ops),
        work_dir: workspace.path().to_path_buf(),
    };

    tracing::info!("Processing {:?} with {} operations", input, job.operations.len());
    let deliverable = ctx.transcoder.run(&job).await?;

    let dest = match output {
        Some(p) if p.is_dir() => p.join(&deliverable.file_name),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(&deliverable.file_name),
    };
    let saved = workspace
        .persist(&deliverable, &dest)
        .with_context(|| format!("Failed to write output to {:?}", dest))?;
    workspace.cleanup();

    println!("{} ({})", saved.display(), deliverable.media_type);
    Ok(())
}

fn plan_file(input: &Path, ops: &[String], config_path: Option<&Path>) -> Result<()> {
    let config = config::load_runtime_config(config_path)?;
    // Planning never runs the engine, so a missing binary is not fatal.
    let ffmpeg = resolve_ffmpeg(config.tools.ffmpeg_path.as_deref())
        .unwrap_or_else(|_| PathBuf::from("ffmpeg"));
    let work_dir = config
        .server
        .work_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let ctx = server::AppContext::with_ffmpeg(config, ffmpeg);

    let job = TranscodeJob {
        input: input.to_path_buf(),
        operations: parse_ops(ops),
        work_dir,
    };
    let plan = ctx.transcoder.plan(&job);

    let mut line = shell_quote(&ctx.transcoder.ffmpeg().to_string_lossy());
    for arg in &plan.args {
        line.push(' ');
        line.push_str(&shell_quote(arg));
    }
    println!("{}", line);
    Ok(())
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,%@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_runtime_config(config_path)?;
    let tool = check_tool("ffmpeg", config.tools.ffmpeg_path.as_deref());

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("ffmpeg is missing. Install it or set tools.ffmpeg_path / FFMPEG_BIN.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Encoder: {:?} (crf {})", config.encoder.mode, config.encoder.crf);
            println!("  Watermark enabled: {}", config.watermark.enabled);
            println!("  Engine timeout: {}s", config.tools.timeout_secs);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
