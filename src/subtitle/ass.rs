use crate::document::Segment;

use super::cue::Cue;
use super::timestamp::format_timestamp;
use super::wrap::WrapOptions;

/// Script header with a single bottom-centred `Default` style.
pub const ASS_HEADER: &str = "[Script Info]
ScriptType: v4.00+
WrapStyle: 2
ScaledBorderAndShadow: yes
YCbCr Matrix: TV.601
[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,42,&H00FFFFFF,&H000000FF,&H3C000000,&H64000000,0,0,0,0,100,100,0,0,1,2,0,2,20,20,20,1
[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// ASS forced line break.
const ASS_LINE_BREAK: &str = "\\N";

/// Render segments as an Advanced SubStation Alpha script.
///
/// Event times use the shared millisecond formatter rather than the
/// centiseconds ASS editors write; players parse both.
pub fn render_ass(
    segments: &[Segment],
    primary_lang: &str,
    secondary_lang: Option<&str>,
    options: WrapOptions,
) -> String {
    let events: Vec<String> = segments
        .iter()
        .map(|segment| {
            let cue = Cue::from_segment(segment, primary_lang, secondary_lang, options);
            format!(
                "Dialogue: 0,{},{},Default,,0,0,0,,{}",
                format_timestamp(cue.start, '.'),
                format_timestamp(cue.end, '.'),
                cue.lines.join(ASS_LINE_BREAK)
            )
        })
        .collect();

    format!("{}{}\n", ASS_HEADER, events.join("\n"))
}
