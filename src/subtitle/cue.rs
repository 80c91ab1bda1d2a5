use crate::document::{NATIVE_LANGUAGE, Segment};

use super::wrap::{WrapOptions, wrap_text};

/// Display text for one segment in one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub lines: Vec<String>,
}

impl Cue {
    pub fn from_segment(
        segment: &Segment,
        primary_lang: &str,
        secondary_lang: Option<&str>,
        options: WrapOptions,
    ) -> Self {
        Self {
            start: segment.start(),
            end: segment.end(),
            lines: segment_payload(segment, primary_lang, secondary_lang, options),
        }
    }
}

/// Text of `segment` in `lang`.
///
/// A stored translation always wins. The native language falls back to the
/// transcription; any other missing language renders as empty text.
pub fn resolve_text<'a>(segment: &'a Segment, lang: &str) -> &'a str {
    match segment.translation(lang) {
        Some(text) => text,
        None if lang == NATIVE_LANGUAGE => segment.source_text(),
        None => "",
    }
}

/// Display lines for `segment`.
///
/// Without a secondary language the primary text is wrapped under
/// `options`. With one, the result is always two single-line entries:
/// the secondary text above the primary text.
pub fn segment_payload(
    segment: &Segment,
    primary_lang: &str,
    secondary_lang: Option<&str>,
    options: WrapOptions,
) -> Vec<String> {
    let primary = resolve_text(segment, primary_lang);

    let Some(secondary_lang) = secondary_lang else {
        return wrap_text(primary, options, Some(primary_lang));
    };

    let secondary = resolve_text(segment, secondary_lang);
    vec![
        first_line(secondary, secondary_lang, options),
        first_line(primary, primary_lang, options),
    ]
}

fn first_line(text: &str, lang: &str, options: WrapOptions) -> String {
    wrap_text(text, options.single_line(), Some(lang))
        .into_iter()
        .next()
        .unwrap_or_default()
}
