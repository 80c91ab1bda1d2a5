use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy or extract the audio track into a work directory
    Ingest {
        /// Input audio or video file
        input: PathBuf,

        /// Work directory (default: <input dir>/_jobs/<stem>)
        #[arg(short, long)]
        workdir: Option<PathBuf>,

        /// Extract mono audio
        #[arg(long)]
        mono: bool,
    },

    /// Create master.json from an ASR transcript (JSON) or an SRT file
    Import {
        /// Transcript or SRT file
        input: PathBuf,

        /// Work directory receiving master.json
        #[arg(short, long)]
        workdir: PathBuf,
    },

    /// Merge romanized text (one line per segment) into a master document
    Romanize {
        /// master.json to update
        master: PathBuf,

        /// Text file with one romanized line per segment
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Translate a master document
    Translate {
        /// master.json to update
        master: PathBuf,

        /// Target languages (comma-separated)
        #[arg(short, long)]
        to: Option<String>,

        /// Translation provider: echo or api
        #[arg(long)]
        provider: Option<String>,

        /// Translation mode: draft or draft+postedit
        #[arg(long)]
        mode: Option<String>,

        /// Segments per provider request
        #[arg(long)]
        block_size: Option<usize>,
    },

    /// Write a subtitle file from a master document
    Export {
        /// master.json to read
        master: PathBuf,

        #[command(flatten)]
        options: ExportArgs,

        /// Output path (default: <master dir>/subs_<lang>.<format>)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export every master.json found below a directory
    BatchExport {
        /// Directory to search
        root: PathBuf,

        #[command(flatten)]
        options: ExportArgs,

        /// Re-export even when the subtitle is newer than its master
        #[arg(long)]
        force: bool,
    },

    /// Copy a subtitle file next to the video as an external track
    Sidecar {
        /// Video the subtitles belong to
        video: PathBuf,

        /// Subtitle file
        subtitles: PathBuf,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Mux subtitles into a container without re-encoding
    Softcode {
        /// Input video
        video: PathBuf,

        /// Subtitle file
        subtitles: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Output container: mkv or mp4
        #[arg(long)]
        container: Option<String>,

        /// Language tag for the subtitle stream
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Burn subtitles into the video picture
    Hardcode {
        /// Input video
        video: PathBuf,

        /// Subtitle file
        subtitles: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Video codec for the re-encode
        #[arg(long)]
        codec: Option<String>,

        /// Constant rate factor
        #[arg(long)]
        crf: Option<u32>,

        /// Encoder preset
        #[arg(long)]
        preset: Option<String>,

        /// Font name forced onto the subtitles
        #[arg(long)]
        font: Option<String>,

        /// Directory with fonts for libass
        #[arg(long)]
        fonts_dir: Option<String>,

        /// ASS style override KEY=VALUE (repeatable)
        #[arg(long = "style", value_parser = parse_style)]
        styles: Vec<(String, String)>,
    },

    /// Check that ffmpeg is available
    Doctor,
}

#[derive(clap::Args)]
pub struct ExportArgs {
    /// Subtitle format: srt, vtt or ass
    #[arg(short, long)]
    pub format: Option<String>,

    /// Primary language code
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Secondary language shown above the primary line
    #[arg(short, long)]
    pub bilingual: Option<String>,

    /// Maximum characters per line
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Maximum lines per cue
    #[arg(long)]
    pub max_lines: Option<usize>,
}

#[derive(clap::Args)]
pub struct TargetArgs {
    /// Output path, overrides the naming options
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Output directory (default: next to the video)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Name the output after the video instead of the subtitle file
    #[arg(long)]
    pub same_name: bool,

    /// Suffix inserted before the extension
    #[arg(long)]
    pub suffix: Option<String>,
}

/// Parse a `KEY=VALUE` style override
fn parse_style(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid style '{}': expected KEY=VALUE", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid style '{}': empty key", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
