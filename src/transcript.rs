//! ASR output import.
//!
//! Speech recognition runs outside this crate. Its output arrives either as
//! whisper.cpp JSON (`whisper-cli -oj`) or as a plain array of
//! `{start, end, text}` records in seconds, and is turned into a
//! [`Document`] with segments numbered from 1.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::document::{Document, Meta, NATIVE_LANGUAGE, Segment};
use crate::error::{JimakuError, Result};

// Structs for parsing whisper.cpp JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    #[serde(default)]
    pub result: Option<WhisperCppResult>,
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub offsets: WhisperCppOffsets,
    pub text: String,
}

/// Milliseconds from the start of the audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: i64,
    pub to: i64,
}

/// Engine-neutral ASR record, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    WhisperCpp(WhisperCppOutput),
    Plain(Vec<AsrSegment>),
    Wrapped { segments: Vec<AsrSegment> },
}

impl From<WhisperCppSegment> for AsrSegment {
    fn from(segment: WhisperCppSegment) -> Self {
        Self {
            start: segment.offsets.from as f64 / 1000.0,
            end: segment.offsets.to as f64 / 1000.0,
            text: segment.text,
        }
    }
}

/// Build a document from chronological ASR records.
pub fn document_from_asr(records: Vec<AsrSegment>, meta: Meta) -> Result<Document> {
    let segments = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            Segment::new(index as u32 + 1, record.start, record.end, record.text.trim())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Document::new(meta, segments))
}

/// Parse a transcript in any supported layout.
pub fn parse_transcript(content: &str, source: &str) -> Result<Document> {
    let parsed: TranscriptFile = serde_json::from_str(content).map_err(|e| {
        JimakuError::Config(format!("Unrecognized transcript layout in {}: {}", source, e))
    })?;

    let mut meta = Meta::new(source);
    let records = match parsed {
        TranscriptFile::WhisperCpp(output) => {
            meta.tool_versions
                .insert("asr".to_string(), "whisper.cpp".to_string());
            if let Some(result) = output.result {
                if result.language != NATIVE_LANGUAGE {
                    warn!(
                        "Transcript language is '{}', expected '{}'",
                        result.language, NATIVE_LANGUAGE
                    );
                }
                meta.settings.insert("language".to_string(), result.language);
            }
            output.transcription.into_iter().map(AsrSegment::from).collect()
        }
        TranscriptFile::Plain(records) | TranscriptFile::Wrapped { segments: records } => {
            meta.tool_versions.insert("asr".to_string(), "external".to_string());
            records
        }
    };

    document_from_asr(records, meta)
}

/// Read a transcript file from disk.
pub fn import_transcript<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(JimakuError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let document = parse_transcript(&content, &path.display().to_string())?;
    info!(
        "Imported {} segments from {}",
        document.segments.len(),
        path.display()
    );
    Ok(document)
}
