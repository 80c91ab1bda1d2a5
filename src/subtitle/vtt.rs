use crate::document::Segment;

use super::srt::cue_blocks;
use super::wrap::WrapOptions;

pub const VTT_HEADER: &str = "WEBVTT";

/// Render segments as WebVTT.
///
/// Cue blocks keep their SRT-style indices; only the timing lines switch to
/// a period separator, so commas inside cue text survive.
pub fn render_vtt(
    segments: &[Segment],
    primary_lang: &str,
    secondary_lang: Option<&str>,
    options: WrapOptions,
) -> String {
    let body = cue_blocks(segments, primary_lang, secondary_lang, options, '.');
    if body.is_empty() {
        return format!("{}\n", VTT_HEADER);
    }
    format!("{}\n\n{}\n", VTT_HEADER, body)
}
