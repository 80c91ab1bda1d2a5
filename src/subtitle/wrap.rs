//! Script-aware line breaking for subtitle cues.
//!
//! Japanese and other CJK text has no spaces to break on, so it is cut by
//! character count with a preference for breaking after sentence
//! punctuation. Everything else is wrapped greedily on whitespace.

use serde::{Deserialize, Serialize};

use crate::document::NATIVE_LANGUAGE;

pub const MAX_CHARS_PER_LINE: usize = 42;
pub const MAX_LINES: usize = 2;

/// Share of CJK characters from which text is wrapped as CJK.
const CJK_RATIO_THRESHOLD: f64 = 0.4;

/// Fill ratio from which a punctuation mark may end a CJK line early.
const CJK_SOFT_BREAK_RATIO: f64 = 0.6;

const CJK_BREAK_PUNCTUATION: [char; 8] = ['、', '。', '！', '？', '!', '?', '.', '…'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapOptions {
    pub max_chars_per_line: usize,
    pub max_lines: usize,
}

impl WrapOptions {
    /// Zero values are raised to one.
    pub fn new(max_chars_per_line: usize, max_lines: usize) -> Self {
        Self {
            max_chars_per_line: max_chars_per_line.max(1),
            max_lines: max_lines.max(1),
        }
    }

    /// Same width, limited to a single line.
    pub fn single_line(self) -> Self {
        Self::new(self.max_chars_per_line, 1)
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self::new(MAX_CHARS_PER_LINE, MAX_LINES)
    }
}

/// Line-breaking strategy for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Cjk,
    Latin,
}

fn is_cjk_char(ch: char) -> bool {
    matches!(ch, '\u{3000}'..='\u{9FFF}' | '\u{FF66}'..='\u{FF9D}')
}

/// Pick the wrapping strategy for `text`.
///
/// A hint naming the native language forces CJK. Otherwise the decision is
/// made on the share of CJK characters; empty text is always Latin.
pub fn detect_script(text: &str, lang: Option<&str>) -> Script {
    if lang == Some(NATIVE_LANGUAGE) {
        return Script::Cjk;
    }

    let total = text.chars().count();
    if total == 0 {
        return Script::Latin;
    }

    let cjk = text.chars().filter(|&ch| is_cjk_char(ch)).count();
    if cjk as f64 / total as f64 >= CJK_RATIO_THRESHOLD {
        Script::Cjk
    } else {
        Script::Latin
    }
}

/// Break `text` into at most `options.max_lines` lines.
///
/// Always returns at least one line; text beyond the line budget is dropped.
pub fn wrap_text(text: &str, options: WrapOptions, lang: Option<&str>) -> Vec<String> {
    let max_chars = options.max_chars_per_line.max(1);
    let max_lines = options.max_lines.max(1);

    let mut lines = match detect_script(text, lang) {
        Script::Cjk => wrap_cjk(text, max_chars, max_lines),
        Script::Latin => wrap_latin(text, max_chars, max_lines),
    };

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines.truncate(max_lines);
    lines
}

fn wrap_cjk(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let soft_limit = max_chars as f64 * CJK_SOFT_BREAK_RATIO;
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    // hard line breaks in the source are dropped; cue lines come only from wrapping
    for ch in text.chars().filter(|&ch| !matches!(ch, '\n' | '\r')) {
        current.push(ch);
        current_len += 1;

        let hard_break = current_len >= max_chars;
        let soft_break = CJK_BREAK_PUNCTUATION.contains(&ch) && current_len as f64 >= soft_limit;
        if hard_break || soft_break {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
            if lines.len() >= max_lines {
                break;
            }
        }
    }

    if lines.len() < max_lines && !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn wrap_latin(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let candidate_len = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if candidate_len <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = candidate_len;
            continue;
        }

        // an over-long word still gets a line of its own
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            if lines.len() >= max_lines {
                return lines;
            }
        }
        current.push_str(word);
        current_len = word_len;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn char_len(line: &str) -> usize {
        line.chars().count()
    }

    #[test]
    fn test_detect_script() {
        assert_eq!(detect_script("hello", Some("ja")), Script::Cjk);
        assert_eq!(detect_script("", None), Script::Latin);
        assert_eq!(detect_script("こんにちは", None), Script::Cjk);
        assert_eq!(detect_script("こんにちは", Some("en")), Script::Cjk);
        assert_eq!(detect_script("Hello there", Some("en")), Script::Latin);
        // half-width katakana counts as CJK
        assert_eq!(detect_script("ｺﾝﾆﾁﾊ", None), Script::Cjk);
    }

    #[test]
    fn test_detect_script_threshold() {
        // 4 of 10 characters
        assert_eq!(detect_script("日本語のabcdef", None), Script::Cjk);
        // 3 of 10 characters
        assert_eq!(detect_script("日本語abcdefg", None), Script::Latin);
    }

    #[test]
    fn test_wrap_japanese_without_spaces() {
        let text = "これは日本語のテキストでスペースがありませんが、適切に改行されます。さらに長くして改行を確認します。";
        let lines = wrap_text(text, WrapOptions::new(20, 2), Some("ja"));
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| char_len(line) <= 20));
    }

    #[test]
    fn test_cjk_breaks_after_punctuation_past_soft_limit() {
        // comma at position 8 of a 10-wide line (>= 6) ends the line early
        let lines = wrap_text("あいうえおかき、くけこさし", WrapOptions::new(10, 3), Some("ja"));
        assert_eq!(lines, vec!["あいうえおかき、", "くけこさし"]);
    }

    #[test]
    fn test_cjk_ignores_punctuation_before_soft_limit() {
        let lines = wrap_text("あい、うえおかきくけこさし", WrapOptions::new(10, 3), Some("ja"));
        assert_eq!(lines, vec!["あい、うえおかきくけ", "こさし"]);
    }

    #[test]
    fn test_cjk_overflow_is_dropped() {
        let text = "あ".repeat(35);
        let lines = wrap_text(&text, WrapOptions::new(10, 2), Some("ja"));
        assert_eq!(lines, vec!["あ".repeat(10), "あ".repeat(10)]);
    }

    #[test]
    fn test_latin_greedy_wrap() {
        let lines = wrap_text(
            "the quick brown fox jumps over the lazy dog",
            WrapOptions::new(15, 3),
            Some("en"),
        );
        assert_eq!(lines, vec!["the quick brown", "fox jumps over", "the lazy dog"]);
    }

    #[test]
    fn test_latin_overflow_is_dropped() {
        let lines = wrap_text("one two three four five six", WrapOptions::new(8, 2), Some("en"));
        assert_eq!(lines, vec!["one two", "three"]);
    }

    #[test]
    fn test_latin_long_word_stands_alone() {
        let lines = wrap_text(
            "a supercalifragilisticexpialidocious word",
            WrapOptions::new(10, 3),
            Some("en"),
        );
        assert_eq!(lines, vec!["a", "supercalifragilisticexpialidocious", "word"]);
        assert!(char_len(&lines[1]) > 10);
    }

    #[test]
    fn test_empty_input_yields_one_empty_line() {
        assert_eq!(wrap_text("", WrapOptions::default(), Some("ja")), vec![""]);
        assert_eq!(wrap_text("", WrapOptions::default(), Some("en")), vec![""]);
        assert_eq!(wrap_text("   ", WrapOptions::default(), Some("en")), vec![""]);
    }

    #[test]
    fn test_embedded_newlines_never_reach_output_lines() {
        let lines = wrap_text("こんにちは\r\n\n世界", WrapOptions::default(), Some("ja"));
        assert_eq!(lines, vec!["こんにちは世界"]);

        let lines = wrap_text("Hello\r\nworld", WrapOptions::default(), Some("en"));
        assert_eq!(lines, vec!["Hello world"]);

        let lines = wrap_text("あいうえお\nかきくけこ", WrapOptions::new(4, 3), Some("ja"));
        assert_eq!(lines, vec!["あいうえ", "おかきく", "けこ"]);
    }

    #[test]
    fn test_zero_options_are_clamped() {
        let options = WrapOptions::new(0, 0);
        assert_eq!(options, WrapOptions::new(1, 1));
        assert_eq!(wrap_text("あい", options, Some("ja")), vec!["あ"]);
    }

    #[test]
    fn test_random_cjk_lines_respect_bounds() {
        let alphabet: Vec<char> = "あいうえおかきくけこ日本語漢字、。！？…ｱｲｳ\n".chars().collect();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let len = rng.gen_range(0..200);
            let text: String = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            let max_chars = rng.gen_range(1..50);
            let max_lines = rng.gen_range(1..5);

            let lines = wrap_text(&text, WrapOptions::new(max_chars, max_lines), Some("ja"));
            assert!(!lines.is_empty());
            assert!(lines.len() <= max_lines);
            assert!(lines.iter().all(|line| char_len(line) <= max_chars));
            assert!(lines.iter().all(|line| !line.contains('\n')));
        }
    }

    #[test]
    fn test_random_latin_line_count_bound() {
        let words = ["a", "to", "the", "subtitle", "wrapping", "is", "greedy"];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let count = rng.gen_range(0..40);
            let text = (0..count)
                .map(|_| words[rng.gen_range(0..words.len())])
                .collect::<Vec<_>>()
                .join(" ");
            let max_lines = rng.gen_range(1..4);

            let lines = wrap_text(&text, WrapOptions::new(rng.gen_range(8..30), max_lines), Some("en"));
            assert!(!lines.is_empty());
            assert!(lines.len() <= max_lines);
        }
    }
}
