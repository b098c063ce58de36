//! Text transformers: the "hardly know her" joke and quotify.

use crate::random::Draw;
use regex::Regex;
use std::sync::OnceLock;

static ER_WORD: OnceLock<Regex> = OnceLock::new();

fn er_word() -> &'static Regex {
    ER_WORD.get_or_init(|| Regex::new(r"(?i)(\w+)er\b").expect("valid joke pattern"))
}

/// Build a "hardly know her" joke from the first word ending in "er".
/// The stripped base leads the reply, so its first letter is uppercased.
/// Returns `None` when no word qualifies.
pub fn hardly_know_her(text: &str) -> Option<String> {
    let caps = er_word().captures(text)?;
    let base = capitalize(&caps[1]);
    Some(format!("{} her? I hardly know her!", base))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Wrap each word of `text` in double quotes independently with probability
/// `word_probability`. Returns `None` when no word was wrapped, so an
/// unchanged-looking message is never sent.
pub fn quotify(text: &str, word_probability: f64, draw: &mut dyn Draw) -> Option<String> {
    let mut changed = false;
    let quotified: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            if draw.chance(word_probability) {
                changed = true;
                format!("\"{}\"", word)
            } else {
                word.to_string()
            }
        })
        .collect();

    if changed {
        Some(quotified.join(" "))
    } else {
        None
    }
}
