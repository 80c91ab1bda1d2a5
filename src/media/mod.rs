// Modular media processing architecture
//
// ffmpeg is the only external binary the pipeline drives:
// - Commands: argument builders for extraction, muxing and burn-in
// - Processor: runs those commands and handles the file-level rules
//   (audio passthrough, container checks, output naming)

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::{JimakuError, Result};

pub const AUDIO_EXTENSIONS: [&str; 5] = ["flac", "mp3", "wav", "m4a", "mka"];
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mkv", "webm", "mov", "avi"];
pub const AUDIO_FILE_NAME: &str = "audio.flac";

/// Main trait for media processing operations
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Copy or extract the audio track into `workdir/audio.flac`
    async fn extract_audio(&self, input: &Path, workdir: &Path) -> Result<PathBuf>;

    /// Mux subtitles into a new container without re-encoding
    async fn mux_soft(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        language: Option<&str>,
    ) -> Result<PathBuf>;

    /// Re-encode the video with subtitles drawn into the picture
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf>;

    /// First line of `ffmpeg -version`
    async fn version(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessor> {
        Box::new(FfmpegProcessor::new(config))
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

pub fn is_audio(path: &Path) -> bool {
    has_extension(path, &AUDIO_EXTENSIONS)
}

pub fn is_video(path: &Path) -> bool {
    has_extension(path, &VIDEO_EXTENSIONS)
}

/// Reject container/subtitle pairs ffmpeg cannot mux.
pub fn validate_subtitle_format(container: &str, subtitle_path: &Path) -> Result<()> {
    let container = container.trim().to_lowercase();
    match container.as_str() {
        "mkv" => Ok(()),
        "mp4" if has_extension(subtitle_path, &["ass"]) => Err(JimakuError::Media(
            "MP4 does not support ASS subtitles; use MKV or convert to SRT".to_string(),
        )),
        "mp4" => Ok(()),
        other => Err(JimakuError::Media(format!(
            "Unsupported container '{}': expected mkv or mp4",
            other
        ))),
    }
}

/// Output location for a muxed or burned video.
///
/// An explicit path wins. Otherwise the file lands in `out_dir` (or next to
/// the video) as `<stem><suffix>.<container>`, where the stem comes from the
/// video when `same_name` is set and from the subtitle file otherwise.
pub fn build_output_path(
    video_path: &Path,
    subtitle_path: &Path,
    explicit: Option<&Path>,
    out_dir: Option<&Path>,
    same_name: bool,
    suffix: &str,
    container: &str,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let stem_source = if same_name { video_path } else { subtitle_path };
    let stem = stem_source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| video_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    dir.join(format!("{}{}.{}", stem, suffix, container.trim_start_matches('.')))
}
