use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{
    AUDIO_FILE_NAME, BurnOptions, MediaCommandBuilder, MediaProcessor, is_audio, is_video,
    validate_subtitle_format,
};
use crate::config::MediaConfig;
use crate::error::{JimakuError, Result};

/// ffmpeg-backed media processor
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }

    pub fn burn_options(&self) -> BurnOptions {
        BurnOptions {
            codec: self.config.burn_codec.clone(),
            crf: self.config.burn_crf,
            preset: self.config.burn_preset.clone(),
            font: self.config.font.clone(),
            styles: self
                .config
                .styles
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            fonts_dir: self.config.fonts_dir.clone(),
        }
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(JimakuError::FileNotFound(path.display().to_string()))
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn extract_audio(&self, input: &Path, workdir: &Path) -> Result<PathBuf> {
        ensure_exists(input)?;
        tokio::fs::create_dir_all(workdir).await?;
        let audio_path = workdir.join(AUDIO_FILE_NAME);

        if is_audio(input) {
            info!("Copying audio {} to {}", input.display(), audio_path.display());
            tokio::fs::copy(input, &audio_path).await?;
            return Ok(audio_path);
        }

        if !is_video(input) {
            let ext = input
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(JimakuError::Media(format!("Unsupported media type: .{}", ext)));
        }

        info!(
            "Extracting audio from {} (FLAC 48kHz, {})",
            input.display(),
            if self.config.mono { "mono" } else { "stereo" }
        );
        self.command_builder
            .extract_audio(input, &audio_path, self.config.mono)
            .execute()
            .await?;

        info!("Audio extracted to {}", audio_path.display());
        Ok(audio_path)
    }

    async fn mux_soft(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        language: Option<&str>,
    ) -> Result<PathBuf> {
        ensure_exists(video_path)?;
        ensure_exists(subtitle_path)?;

        let container = output_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(&self.config.container);
        validate_subtitle_format(container, subtitle_path)?;

        info!(
            "Muxing {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );
        self.command_builder
            .mux_soft(video_path, subtitle_path, output_path, container, language)
            .execute()
            .await?;

        Ok(output_path.to_path_buf())
    }

    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf> {
        ensure_exists(video_path)?;
        ensure_exists(subtitle_path)?;

        info!(
            "Burning {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );
        self.command_builder
            .burn_subtitles(video_path, subtitle_path, output_path, &self.burn_options())
            .execute()
            .await?;

        info!("Subtitle burn-in completed");
        Ok(output_path.to_path_buf())
    }

    async fn version(&self) -> Result<String> {
        let stdout = self.command_builder.version_check().execute_with_output().await?;
        Ok(stdout
            .lines()
            .next()
            .unwrap_or("Unknown version")
            .trim()
            .to_string())
    }
}
