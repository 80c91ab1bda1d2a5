//! Jimaku - Japanese subtitle pipeline
//!
//! Turns Japanese speech transcripts into a master document of timed
//! segments, translates them, and renders SRT, WebVTT or ASS subtitles with
//! script-aware line wrapping and optional bilingual cues.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod media;
pub mod subtitle;
pub mod transcript;
pub mod translate;
pub mod workflow;
