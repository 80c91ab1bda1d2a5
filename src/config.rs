use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{JimakuError, Result};
use crate::subtitle::wrap::{MAX_CHARS_PER_LINE, MAX_LINES, WrapOptions};
use crate::subtitle::SubtitleFormat;

// Default values for fields added after the first config layout
fn default_block_size() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Subtitle format: srt, vtt or ass
    pub format: SubtitleFormat,
    /// Primary subtitle language code
    pub primary_lang: String,
    /// Optional second language shown above the primary line
    pub secondary_lang: Option<String>,
    /// Maximum characters per cue line
    pub max_chars_per_line: usize,
    /// Maximum lines per cue (monolingual cues only)
    pub max_lines: usize,
}

impl ExportConfig {
    pub fn wrap_options(&self) -> WrapOptions {
        WrapOptions::new(self.max_chars_per_line, self.max_lines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Echo: return the source lines unchanged
    Echo,
    /// Api: POST blocks to a JSON translation endpoint
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationMode {
    /// Draft: one provider pass per block
    #[serde(rename = "draft")]
    Draft,
    /// DraftPostEdit: feed the draft through the provider a second time
    #[serde(rename = "draft+postedit")]
    DraftPostEdit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation provider
    pub provider: ProviderKind,
    /// Translation mode
    pub mode: TranslationMode,
    /// Languages to translate into
    pub target_languages: Vec<String>,
    /// Endpoint for the api provider
    pub api_url: Option<String>,
    /// Bearer token for the api provider
    pub api_key: Option<String>,
    /// Number of segments sent per request
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fixed term translations sent along with every block
    #[serde(default)]
    pub glossary: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Output container for soft muxing: mkv or mp4
    pub container: String,
    /// Video codec used when burning subtitles in
    pub burn_codec: String,
    /// Constant rate factor for burn-in (0-51, lower = better quality)
    pub burn_crf: u32,
    /// Encoder preset for burn-in (ultrafast ... veryslow)
    pub burn_preset: String,
    /// Font name forced onto burned subtitles
    pub font: Option<String>,
    /// Directory with fonts for libass
    pub fonts_dir: Option<String>,
    /// Extract mono instead of stereo audio
    pub mono: bool,
    /// ASS style overrides for burn-in, e.g. `Outline = "2"`
    pub styles: BTreeMap<String, String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: SubtitleFormat::Srt,
            primary_lang: "ja".to_string(),
            secondary_lang: None,
            max_chars_per_line: MAX_CHARS_PER_LINE,
            max_lines: MAX_LINES,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Echo,
            mode: TranslationMode::Draft,
            target_languages: vec!["en".to_string()],
            api_url: None,
            api_key: None,
            block_size: default_block_size(),
            timeout_secs: default_timeout_secs(),
            glossary: BTreeMap::new(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            container: "mkv".to_string(),
            burn_codec: "libx264".to_string(),
            burn_crf: 18,
            burn_preset: "slow".to_string(),
            font: None,
            fonts_dir: None,
            mono: false,
            styles: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| JimakuError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| JimakuError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| JimakuError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| JimakuError::Config(format!("Failed to create config directory: {}", e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| JimakuError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
