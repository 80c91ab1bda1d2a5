use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{JimakuError, Result};

/// A single ffmpeg invocation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Select all streams of an input
    pub fn map(self, input_index: usize) -> Self {
        self.arg("-map").arg(input_index.to_string())
    }

    /// Copy every mapped stream
    pub fn copy_all(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Set subtitle codec
    pub fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:s").arg(codec)
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Run the command, failing on a non-zero exit
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }

    /// Run the command and return its stdout
    pub async fn execute_with_output(&self) -> Result<String> {
        self.run().await
    }

    async fn run(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                JimakuError::Media(format!(
                    "{} failed: {} not runnable ({}); is it on PATH?",
                    self.description, self.binary_path, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JimakuError::Media(format!(
                "{} failed with {}: {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Builder for the ffmpeg invocations used by the pipeline
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// FLAC 48 kHz audio extraction
    pub fn extract_audio<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: Q,
        mono: bool,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("flac")
            .audio_sample_rate(48_000)
            .audio_channels(if mono { 1 } else { 2 })
            .output(audio_path)
    }

    /// Mux a subtitle file as an extra stream without re-encoding
    pub fn mux_soft<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: Q,
        output_path: R,
        container: &str,
        language: Option<&str>,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Subtitle muxing")
            .overwrite()
            .input(video_path)
            .input(subtitle_path)
            .map(0)
            .map(1)
            .copy_all();

        if container.eq_ignore_ascii_case("mp4") {
            cmd = cmd.subtitle_codec("mov_text");
        }
        if let Some(lang) = language {
            cmd = cmd.arg("-metadata:s:s:0").arg(format!("language={}", lang));
        }

        cmd.output(output_path)
    }

    /// Re-encode the video with subtitles rendered into the picture
    pub fn burn_subtitles<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: Q,
        output_path: R,
        options: &BurnOptions,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle burn-in")
            .overwrite()
            .input(video_path)
            .video_filter(subtitle_filter(subtitle_path.as_ref(), options))
            .video_codec(&options.codec)
            .arg("-crf")
            .arg(options.crf.to_string())
            .arg("-preset")
            .arg(&options.preset)
            .copy_audio()
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}

/// Encoder and style settings for burn-in
#[derive(Debug, Clone, PartialEq)]
pub struct BurnOptions {
    pub codec: String,
    pub crf: u32,
    pub preset: String,
    pub font: Option<String>,
    /// Extra ASS style overrides, e.g. `Outline=2`
    pub styles: Vec<(String, String)>,
    pub fonts_dir: Option<String>,
}

/// Escape a path for use inside an ffmpeg filter argument.
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(normalized.len());
    for ch in normalized.chars() {
        if matches!(ch, ':' | ' ' | '\'' | ',' | '[' | ']' | ';') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `ass=` for ASS input, `subtitles=` for everything else.
pub fn subtitle_filter(subtitle_path: &Path, options: &BurnOptions) -> String {
    let is_ass = subtitle_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ass"));
    let name = if is_ass { "ass" } else { "subtitles" };

    let mut filter = format!("{}={}", name, escape_filter_path(subtitle_path));

    if let Some(dir) = &options.fonts_dir {
        filter.push_str(&format!(":fontsdir={}", escape_filter_path(Path::new(dir))));
    }

    let mut style: Vec<String> = Vec::new();
    if let Some(font) = &options.font {
        style.push(format!("Fontname={}", font));
    }
    style.extend(options.styles.iter().map(|(k, v)| format!("{}={}", k, v)));
    if !style.is_empty() {
        filter.push_str(&format!(":force_style='{}'", style.join(",")));
    }

    filter
}
