//! Reading-time estimate

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// Scripts written without spaces; every character reads as a word
    static ref CJK_CHAR: Regex =
        Regex::new(r"[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]").unwrap();
    static ref TOKEN: Regex =
        Regex::new(r"[^\s\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingTime {
    /// e.g. "3 min read"
    pub text: String,
    pub minutes: f64,
    /// Milliseconds
    pub time: u64,
    pub words: usize,
}

/// Count words: whitespace-separated tokens with at least one letter or
/// digit, plus one per CJK character
pub fn count_words(text: &str) -> usize {
    let cjk = CJK_CHAR.find_iter(text).count();
    let tokens = TOKEN
        .find_iter(text)
        .filter(|m| m.as_str().chars().any(char::is_alphanumeric))
        .count();
    cjk + tokens
}

/// Estimate reading time for a markdown body
pub fn reading_time(body: &str, words_per_minute: u32) -> ReadingTime {
    let wpm = u64::from(words_per_minute.max(1));
    let words = count_words(body);

    let minutes = words as f64 / wpm as f64;
    let time = words as u64 * 60_000 / wpm;
    let displayed = if words == 0 {
        0
    } else {
        (words as u64).div_ceil(wpm)
    };

    ReadingTime {
        text: format!("{} min read", displayed),
        minutes,
        time,
        words,
    }
}
