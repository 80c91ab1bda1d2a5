// Subtitle rendering
//
// Segments become cues through the composer, and cues are serialized by one
// renderer per grammar:
// - srt: SubRip, also the shared cue-block layout and the import parser
// - vtt: WebVTT on top of the SRT layout
// - ass: Advanced SubStation Alpha with a fixed default style

pub mod ass;
pub mod cue;
pub mod srt;
pub mod timestamp;
pub mod vtt;
pub mod wrap;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub use ass::render_ass;
pub use cue::{Cue, resolve_text, segment_payload};
pub use srt::{parse_srt, render_srt};
pub use timestamp::format_timestamp;
pub use vtt::render_vtt;
pub use wrap::{Script, WrapOptions, detect_script, wrap_text};

use crate::document::{Document, NATIVE_LANGUAGE, Segment};
use crate::error::{JimakuError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
    Ass,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
        }
    }

    /// Format implied by a file extension, if any.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn render(
        &self,
        segments: &[Segment],
        primary_lang: &str,
        secondary_lang: Option<&str>,
        options: WrapOptions,
    ) -> String {
        match self {
            Self::Srt => render_srt(segments, primary_lang, secondary_lang, options),
            Self::Vtt => render_vtt(segments, primary_lang, secondary_lang, options),
            Self::Ass => render_ass(segments, primary_lang, secondary_lang, options),
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = JimakuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            "ass" => Ok(Self::Ass),
            _ => Err(JimakuError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Render `document` in the named format and write it to `path`.
///
/// The format name is checked before anything is rendered or written, and
/// the file is written in one piece.
pub fn write_subtitles<P: AsRef<Path>>(
    document: &Document,
    path: P,
    format: &str,
    primary_lang: &str,
    secondary_lang: Option<&str>,
    options: WrapOptions,
) -> Result<PathBuf> {
    let format: SubtitleFormat = format.parse()?;
    let path = path.as_ref();

    let content = format.render(&document.segments, primary_lang, secondary_lang, options);
    std::fs::write(path, content)?;

    info!(
        "Wrote {} subtitles ({} cues, lang={}{}) to {}",
        format,
        document.segments.len(),
        primary_lang,
        secondary_lang.map(|s| format!("+{}", s)).unwrap_or_default(),
        path.display()
    );
    Ok(path.to_path_buf())
}

/// Language tag romanized text is rendered under, so it wraps as Latin.
pub const ROMANIZED_LANGUAGE: &str = "ja-Latn";

/// Write `<prefix>.txt` (one line per segment) and `<prefix>.srt` into `dir`.
///
/// The text is the transcription, or the romanized text when `romanized` is
/// set; segments without romanization fall back to the transcription.
pub fn write_transcripts<P: AsRef<Path>>(
    document: &Document,
    dir: P,
    prefix: &str,
    romanized: bool,
) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let lang = if romanized { ROMANIZED_LANGUAGE } else { NATIVE_LANGUAGE };
    let mut lines = Vec::with_capacity(document.segments.len());
    let mut segments = Vec::with_capacity(document.segments.len());

    for segment in &document.segments {
        let text = match segment.romanized_text() {
            Some(text) if romanized => text,
            _ => segment.source_text(),
        };
        lines.push(text.to_string());

        let mut copy = segment.clone();
        copy.set_translation(lang, text);
        segments.push(copy);
    }

    let text_path = dir.join(format!("{}.txt", prefix));
    let srt_path = dir.join(format!("{}.srt", prefix));
    std::fs::write(&text_path, lines.join("\n"))?;
    std::fs::write(&srt_path, render_srt(&segments, lang, None, WrapOptions::default()))?;

    info!(
        "Wrote transcripts {} and {}",
        text_path.display(),
        srt_path.display()
    );
    Ok((text_path, srt_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Meta;
    use assert_fs::TempDir;

    fn document() -> Document {
        Document::new(
            Meta::new("sample"),
            vec![
                Segment::new(1, 0.0, 1.5, "こんにちは")
                    .unwrap()
                    .with_translation("ja", "こんにちは")
                    .with_translation("en", "Hello"),
            ],
        )
    }

    #[test]
    fn test_format_names() {
        assert_eq!("SRT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
        assert_eq!(" vtt ".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Vtt);
        assert_eq!(SubtitleFormat::Ass.to_string(), "ass");
        assert_eq!(SubtitleFormat::from_path("movie.en.VTT"), Some(SubtitleFormat::Vtt));
        assert_eq!(SubtitleFormat::from_path("movie.txt"), None);
    }

    #[test]
    fn test_unsupported_format_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subs.xyz");

        let err = write_subtitles(&document(), &path, "xyz", "ja", None, WrapOptions::default())
            .unwrap_err();
        assert!(matches!(err, JimakuError::UnsupportedFormat(ref name) if name == "xyz"));
        assert!(err.to_string().contains("xyz"));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_transcripts_native_and_romanized() {
        let dir = TempDir::new().unwrap();
        let doc = Document::new(
            Meta::new("sample"),
            vec![
                Segment::new(1, 0.0, 1.5, "こんにちは")
                    .unwrap()
                    .with_romanized("konnichiwa")
                    .with_translation("ja", "stale"),
                Segment::new(2, 2.0, 3.0, "はい").unwrap(),
            ],
        );

        let (txt, srt) = write_transcripts(&doc, dir.path(), "transcript_ja", false).unwrap();
        assert_eq!(std::fs::read_to_string(txt).unwrap(), "こんにちは\nはい");
        assert!(std::fs::read_to_string(srt).unwrap().contains("00:00:00,000 --> 00:00:01,500\nこんにちは\n"));

        let (txt, srt) = write_transcripts(&doc, dir.path(), "transcript_romaji", true).unwrap();
        assert_eq!(txt, dir.path().join("transcript_romaji.txt"));
        assert_eq!(std::fs::read_to_string(txt).unwrap(), "konnichiwa\nはい");
        let srt = std::fs::read_to_string(srt).unwrap();
        assert!(srt.contains("\nkonnichiwa\n"));
        assert!(srt.ends_with("\nはい\n"));
    }

    #[test]
    fn test_write_subtitles_each_format() {
        let dir = TempDir::new().unwrap();
        let doc = document();

        let srt = write_subtitles(&doc, dir.path().join("subs_ja.srt"), "srt", "ja", None, WrapOptions::default())
            .unwrap();
        assert!(std::fs::read_to_string(srt).unwrap().contains("00:00:00,000 --> 00:00:01,500"));

        let vtt = write_subtitles(&doc, dir.path().join("subs_en.vtt"), "vtt", "en", None, WrapOptions::default())
            .unwrap();
        let vtt = std::fs::read_to_string(vtt).unwrap();
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:01.500"));

        let ass = write_subtitles(&doc, dir.path().join("subs.ass"), "ass", "en", Some("ja"), WrapOptions::default())
            .unwrap();
        assert!(std::fs::read_to_string(ass).unwrap().contains("こんにちは\\NHello"));
    }
}
