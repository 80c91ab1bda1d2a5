//! Jimaku - Japanese subtitle pipeline
//!
//! Command line entry point: loads configuration, applies flag overrides and
//! runs one pipeline stage per invocation.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use jimaku::cli::{Args, Commands, ExportArgs, TargetArgs};
use jimaku::config::{Config, ExportConfig, ProviderKind, TranslationMode};
use jimaku::error::JimakuError;
use jimaku::workflow::{OutputTarget, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Ingest { input, workdir, mono } => {
            config.media.mono |= mono;
            let workflow = Workflow::new(config);
            let audio = workflow.ingest(&input, workdir.as_deref()).await?;
            println!("Audio ready at {}", audio.display());
        }
        Commands::Import { input, workdir } => {
            let workflow = Workflow::new(config);
            let master = workflow.import(&input, &workdir)?;
            println!("Master document written to {}", master.display());
        }
        Commands::Romanize { master, input } => {
            let workflow = Workflow::new(config);
            workflow.romanize(&master, &input)?;
            println!("Romanized text added to {}", master.display());
        }
        Commands::Translate { master, to, provider, mode, block_size } => {
            if let Some(provider) = provider {
                config.translate.provider = parse_provider(&provider)?;
            }
            if let Some(mode) = mode {
                config.translate.mode = parse_translation_mode(&mode)?;
            }
            if let Some(block_size) = block_size {
                config.translate.block_size = block_size;
            }
            let target_languages = match to {
                Some(langs) => parse_languages(&langs),
                None => config.translate.target_languages.clone(),
            };

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks ({eta})")?
                    .progress_chars("#>-"),
            );

            let workflow = Workflow::new(config);
            let summary = workflow
                .translate(&master, &target_languages, &|done, total| {
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                })
                .await?;
            pb.finish_and_clear();

            println!(
                "Translated {} blocks into {} ({} failed)",
                summary.blocks,
                target_languages.join(", "),
                summary.failed_blocks
            );
        }
        Commands::Export { master, options, out } => {
            let export = apply_export_args(&config.export, options)?;
            let workflow = Workflow::new(config);
            let path = workflow.export(&master, out.as_deref(), &export)?;
            println!("Subtitle written to {}", path.display());
        }
        Commands::BatchExport { root, options, force } => {
            let export = apply_export_args(&config.export, options)?;
            let workflow = Workflow::new(config);
            let written = workflow.batch_export(&root, &export, force)?;
            println!("Exported {} subtitle files", written.len());
        }
        Commands::Sidecar { video, subtitles, target } => {
            let workflow = Workflow::new(config);
            let result = workflow.sidecar(&video, &subtitles, &output_target(target)).await?;
            println!("Subtitle copied to {}", result.display());
        }
        Commands::Softcode { video, subtitles, target, container, lang } => {
            if let Some(container) = container {
                config.media.container = container.to_lowercase();
            }
            let workflow = Workflow::new(config);
            let result = workflow
                .softcode(&video, &subtitles, &output_target(target), lang.as_deref())
                .await?;
            println!("Muxed file at {}", result.display());
        }
        Commands::Hardcode { video, subtitles, target, codec, crf, preset, font, fonts_dir, styles } => {
            if let Some(codec) = codec {
                config.media.burn_codec = codec;
            }
            if let Some(crf) = crf {
                config.media.burn_crf = crf;
            }
            if let Some(preset) = preset {
                config.media.burn_preset = preset;
            }
            if font.is_some() {
                config.media.font = font;
            }
            if fonts_dir.is_some() {
                config.media.fonts_dir = fonts_dir;
            }
            config.media.styles.extend(styles);
            let workflow = Workflow::new(config);
            let result = workflow.hardcode(&video, &subtitles, &output_target(target)).await?;
            println!("Burned file at {}", result.display());
        }
        Commands::Doctor => {
            let workflow = Workflow::new(config);
            match workflow.doctor().await {
                Ok(version) => println!("ffmpeg: {}", version),
                Err(e) => {
                    println!("ffmpeg: not available ({})", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".jimaku").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "jimaku.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("jimaku.log").display()
    );

    Ok(())
}

fn apply_export_args(base: &ExportConfig, args: ExportArgs) -> Result<ExportConfig> {
    let mut export = base.clone();
    if let Some(format) = args.format {
        export.format = format.parse()?;
    }
    if let Some(lang) = args.lang {
        export.primary_lang = lang;
    }
    if args.bilingual.is_some() {
        export.secondary_lang = args.bilingual;
    }
    if let Some(max_chars) = args.max_chars {
        export.max_chars_per_line = max_chars;
    }
    if let Some(max_lines) = args.max_lines {
        export.max_lines = max_lines;
    }
    Ok(export)
}

fn output_target(args: TargetArgs) -> OutputTarget {
    OutputTarget {
        out: args.out,
        out_dir: args.out_dir,
        same_name: args.same_name,
        suffix: args.suffix,
    }
}

fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse translation provider from string
fn parse_provider(provider: &str) -> Result<ProviderKind> {
    match provider.to_lowercase().as_str() {
        "echo" => Ok(ProviderKind::Echo),
        "api" => Ok(ProviderKind::Api),
        _ => Err(JimakuError::Config(format!(
            "Invalid translation provider '{}'. Valid providers: echo, api",
            provider
        ))
        .into()),
    }
}

/// Parse translation mode from string
fn parse_translation_mode(mode: &str) -> Result<TranslationMode> {
    match mode.to_lowercase().as_str() {
        "draft" => Ok(TranslationMode::Draft),
        "draft+postedit" => Ok(TranslationMode::DraftPostEdit),
        _ => Err(JimakuError::Config(format!(
            "Invalid translation mode '{}'. Valid modes: draft, draft+postedit",
            mode
        ))
        .into()),
    }
}
