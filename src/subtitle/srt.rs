use crate::document::Segment;
use crate::error::{JimakuError, Result};

use super::cue::Cue;
use super::timestamp::{format_timestamp, parse_timestamp};
use super::wrap::{Script, WrapOptions, detect_script};

/// Numbered cue blocks separated by blank lines, without trailing whitespace.
///
/// SRT and WebVTT share this layout and differ only in the fractional
/// separator of their timing lines.
pub(crate) fn cue_blocks(
    segments: &[Segment],
    primary_lang: &str,
    secondary_lang: Option<&str>,
    options: WrapOptions,
    sep: char,
) -> String {
    let blocks: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let cue = Cue::from_segment(segment, primary_lang, secondary_lang, options);
            format!(
                "{}\n{} --> {}\n{}\n",
                index + 1,
                format_timestamp(cue.start, sep),
                format_timestamp(cue.end, sep),
                cue.lines.join("\n")
            )
        })
        .collect();

    blocks.join("\n").trim_end().to_string()
}

/// Render segments as SubRip text ending in exactly one newline.
pub fn render_srt(
    segments: &[Segment],
    primary_lang: &str,
    secondary_lang: Option<&str>,
    options: WrapOptions,
) -> String {
    let mut content = cue_blocks(segments, primary_lang, secondary_lang, options, ',');
    content.push('\n');
    content
}

/// Read SubRip text back into segments numbered from 1.
///
/// Index lines are optional. Multi-line cue text is joined with a space,
/// or directly when both sides are CJK. A blank line inside a cue (as left
/// by an empty bilingual line) does not end it: text that is not followed
/// by a timing line belongs to the previous cue.
pub fn parse_srt(content: &str) -> Result<Vec<Segment>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut lines = content.lines().enumerate().peekable();
    let mut cues: Vec<(f64, f64, String)> = Vec::new();

    loop {
        while lines.next_if(|(_, line)| line.trim().is_empty()).is_some() {}

        let Some((line_no, line)) = lines.next() else {
            break;
        };

        let (timing_no, timing) = if is_timing_line(line) {
            (line_no, line)
        } else if let Some((next_no, next)) = lines.next_if(|(_, next)| is_timing_line(next)) {
            (next_no, next)
        } else if let Some((_, _, text)) = cues.last_mut() {
            append_text_line(text, line.trim());
            continue;
        } else {
            return Err(match lines.peek() {
                Some((next_no, _)) => JimakuError::SubtitleParse {
                    line: next_no + 1,
                    reason: "expected a timing line".to_string(),
                },
                None => JimakuError::SubtitleParse {
                    line: line_no + 1,
                    reason: "cue index without timing line".to_string(),
                },
            });
        };

        let (start, end) = parse_timing(timing).ok_or_else(|| JimakuError::SubtitleParse {
            line: timing_no + 1,
            reason: format!("malformed timing line '{}'", timing.trim()),
        })?;

        let mut text = String::new();
        while let Some((_, line)) = lines.next_if(|(_, line)| !line.trim().is_empty()) {
            append_text_line(&mut text, line.trim());
        }
        cues.push((start, end, text));
    }

    cues.into_iter()
        .enumerate()
        .map(|(index, (start, end, text))| Segment::new(index as u32 + 1, start, end, text))
        .collect()
}

fn is_timing_line(line: &str) -> bool {
    line.contains("-->")
}

fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    // WebVTT cue settings may follow the end time
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}

fn append_text_line(text: &mut String, line: &str) {
    if !text.is_empty() {
        let joins_cjk = detect_script(text, None) == Script::Cjk
            && detect_script(line, None) == Script::Cjk;
        if !joins_cjk {
            text.push(' ');
        }
    }
    text.push_str(line);
}
