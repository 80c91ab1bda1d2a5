//! Timed segments and the master document that owns them.
//!
//! The document is the unit every stage reads and writes: ASR import fills
//! the segments, romanization and translation annotate them, and the
//! subtitle renderers borrow them read-only.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{JimakuError, Result};

/// Language code of the transcribed source text.
pub const NATIVE_LANGUAGE: &str = "ja";

/// File name of the persisted document inside a work directory.
pub const MASTER_FILE_NAME: &str = "master.json";

/// One spoken utterance with its timing and derived texts.
///
/// Timing is validated at construction and cannot be changed afterwards, so
/// every `Segment` in circulation satisfies `0 <= start <= end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    id: u32,
    start: f64,
    end: f64,
    source_text: String,
    romanized_text: Option<String>,
    translations: BTreeMap<String, String>,
}

impl Segment {
    pub fn new<S: Into<String>>(id: u32, start: f64, end: f64, source_text: S) -> Result<Self> {
        let invalid = |reason: String| JimakuError::InvalidSegment { id, reason };

        if id == 0 {
            return Err(invalid("id must be a positive integer".to_string()));
        }
        // written so that NaN fails too
        if !(start >= 0.0) || !(end >= 0.0) {
            return Err(invalid(format!(
                "start/end must be non-negative (start={}, end={})",
                start, end
            )));
        }
        if end < start {
            return Err(invalid(format!(
                "end must be greater than or equal to start (start={}, end={})",
                start, end
            )));
        }

        Ok(Self {
            id,
            start,
            end,
            source_text: source_text.into(),
            romanized_text: None,
            translations: BTreeMap::new(),
        })
    }

    pub fn with_translation<L: Into<String>, T: Into<String>>(mut self, lang: L, text: T) -> Self {
        self.translations.insert(lang.into(), text.into());
        self
    }

    pub fn with_romanized<S: Into<String>>(mut self, text: S) -> Self {
        self.romanized_text = Some(text.into());
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// `None` until a romanization step has run for this segment.
    pub fn romanized_text(&self) -> Option<&str> {
        self.romanized_text.as_deref()
    }

    pub fn translations(&self) -> &BTreeMap<String, String> {
        &self.translations
    }

    pub fn translation(&self, lang: &str) -> Option<&str> {
        self.translations.get(lang).map(String::as_str)
    }

    pub fn set_translation<L: Into<String>, T: Into<String>>(&mut self, lang: L, text: T) {
        self.translations.insert(lang.into(), text.into());
    }

    pub fn set_romanized<S: Into<String>>(&mut self, text: S) {
        self.romanized_text = Some(text.into());
    }
}

/// Provenance attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub source: String,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tool_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl Meta {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
            created_at: Utc::now(),
            tool_versions: BTreeMap::new(),
            settings: BTreeMap::new(),
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new("")
    }
}

/// Accepts RFC 3339 as well as the zone-less ISO timestamps older documents carry.
fn deserialize_created_at<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Ordered segments plus metadata. Segment order is cue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    pub meta: Meta,
    pub segments: Vec<Segment>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    segments: Vec<RawSegment>,
}

#[derive(Deserialize)]
struct RawSegment {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default, alias = "ja_raw")]
    source_text: String,
    #[serde(default, alias = "romaji")]
    romanized_text: Option<String>,
    #[serde(default)]
    translations: BTreeMap<String, String>,
}

impl TryFrom<RawDocument> for Document {
    type Error = JimakuError;

    fn try_from(raw: RawDocument) -> Result<Self> {
        let segments = raw
            .segments
            .into_iter()
            .enumerate()
            .map(|(index, seg)| {
                let id = seg.id.unwrap_or(index as u32 + 1);
                let mut segment = Segment::new(id, seg.start, seg.end, seg.source_text)?;
                segment.romanized_text = seg.romanized_text;
                segment.translations = seg.translations;
                Ok(segment)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            meta: raw.meta,
            segments,
        })
    }
}

impl Document {
    pub fn new(meta: Meta, segments: Vec<Segment>) -> Self {
        Self { meta, segments }
    }

    /// Mark `lang` as requested on every segment without touching existing text.
    pub fn ensure_translation_key(&mut self, lang: &str) {
        for segment in &mut self.segments {
            segment
                .translations
                .entry(lang.to_string())
                .or_default();
        }
    }

    /// Attach one romanized line per segment, in order.
    ///
    /// A count that does not match the segment count is rejected before any
    /// segment is touched.
    pub fn add_romanized(&mut self, romanized: Vec<String>) -> Result<()> {
        if romanized.len() != self.segments.len() {
            return Err(JimakuError::LengthMismatch {
                what: "Romanized list",
                expected: self.segments.len(),
                actual: romanized.len(),
            });
        }
        for (segment, text) in self.segments.iter_mut().zip(romanized) {
            segment.romanized_text = Some(text);
        }
        Ok(())
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(JimakuError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let document = Self::from_json(&content)?;
        debug!(
            "Loaded document {} with {} segments",
            path.display(),
            document.segments.len()
        );
        Ok(document)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!("Saved document: {}", path.display());
        Ok(())
    }

    /// Work directories are created on demand.
    pub fn master_path<P: AsRef<Path>>(workdir: P) -> Result<PathBuf> {
        let workdir = workdir.as_ref();
        std::fs::create_dir_all(workdir)?;
        Ok(workdir.join(MASTER_FILE_NAME))
    }

    pub fn load_or_create<P: AsRef<Path>>(workdir: P, source: &str) -> Result<Self> {
        let path = Self::master_path(workdir)?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::new(Meta::new(source), Vec::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn test_segment_rejects_end_before_start() {
        let err = Segment::new(1, 2.0, 1.0, "x").unwrap_err();
        assert!(matches!(err, JimakuError::InvalidSegment { id: 1, .. }));
    }

    #[test]
    fn test_segment_rejects_negative_and_nan_times() {
        assert!(Segment::new(1, -0.5, 1.0, "x").is_err());
        assert!(Segment::new(1, 0.0, f64::NAN, "x").is_err());
        assert!(Segment::new(0, 0.0, 1.0, "x").is_err());
        assert!(Segment::new(1, 1.0, 1.0, "").is_ok());
    }

    #[test]
    fn test_romanized_text_absent_until_set() {
        let mut segment = Segment::new(1, 0.0, 1.0, "テスト").unwrap();
        assert_eq!(segment.romanized_text(), None);
        segment.set_romanized("");
        assert_eq!(segment.romanized_text(), Some(""));
    }

    #[test]
    fn test_ensure_translation_key_keeps_existing_text() {
        let mut doc = Document::new(
            Meta::new("sample"),
            vec![
                Segment::new(1, 0.0, 1.0, "a").unwrap().with_translation("en", "A"),
                Segment::new(2, 1.0, 2.0, "b").unwrap(),
            ],
        );
        doc.ensure_translation_key("en");
        assert_eq!(doc.segments[0].translation("en"), Some("A"));
        assert_eq!(doc.segments[1].translation("en"), Some(""));
        assert_eq!(doc.segments[1].translation("pt-BR"), None);
    }

    #[test]
    fn test_add_romanized_length_mismatch_leaves_segments_untouched() {
        let mut doc = Document::new(
            Meta::new("sample"),
            vec![
                Segment::new(1, 0.0, 1.0, "あ").unwrap(),
                Segment::new(2, 1.0, 2.0, "い").unwrap(),
            ],
        );
        let err = doc.add_romanized(vec!["a".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            JimakuError::LengthMismatch { expected: 2, actual: 1, .. }
        ));
        assert!(doc.segments.iter().all(|s| s.romanized_text().is_none()));

        doc.add_romanized(vec!["a".to_string(), "i".to_string()]).unwrap();
        assert_eq!(doc.segments[1].romanized_text(), Some("i"));
    }

    #[test]
    fn test_legacy_schema_loads() {
        let json = r#"{
  "meta": {"source": "sample.wav", "created_at": "2024-05-01T10:20:30.123456", "tool_versions": {}, "settings": {}},
  "segments": [
    {"id": 1, "start": 0.0, "end": 1.0, "ja_raw": "テスト", "romaji": "tesuto", "translations": {"ja": "テスト"}},
    {"start": 1.0, "end": 2.0, "ja_raw": "二番"}
  ]
}"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.meta.source, "sample.wav");
        assert_eq!(doc.segments[0].source_text(), "テスト");
        assert_eq!(doc.segments[0].romanized_text(), Some("tesuto"));
        assert_eq!(doc.segments[1].id(), 2);
        assert!(doc.segments[1].translations().is_empty());
    }

    #[test]
    fn test_invalid_segment_fails_load() {
        let json = r#"{"segments": [{"id": 1, "start": 3.0, "end": 1.0, "source_text": "x"}]}"#;
        assert!(Document::from_json(json).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = Document::master_path(dir.path().join("job")).unwrap();

        let mut meta = Meta::new("movie.mkv");
        meta.settings.insert("beam_size".to_string(), "5".to_string());
        let doc = Document::new(
            meta,
            vec![Segment::new(1, 0.25, 1.75, "こんにちは")
                .unwrap()
                .with_translation("en", "Hello")],
        );
        doc.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("こんにちは"));
        assert!(raw.contains("\"romanized_text\": null"));

        let loaded = Document::load(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_or_create_returns_empty_document() {
        let dir = TempDir::new().unwrap();
        let doc = Document::load_or_create(dir.path(), "input.mp4").unwrap();
        assert_eq!(doc.meta.source, "input.mp4");
        assert!(doc.segments.is_empty());
    }
}
