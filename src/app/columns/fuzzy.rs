//! Partial-ratio string similarity
//!
//! Scores how well the shorter string fits somewhere inside the longer one,
//! on a 0-100 scale. Every window of the longer string with the shorter
//! string's length is compared with a normalized Levenshtein similarity and
//! the best window wins.

use strsim::normalized_levenshtein;

/// Best 0-100 similarity of the shorter input against any equally long
/// window of the longer input. Works on characters, not bytes.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if shorter.is_empty() {
        return 0;
    }

    let needle: String = shorter.iter().collect();
    let best = longer
        .windows(shorter.len())
        .map(|window| {
            let candidate: String = window.iter().collect();
            normalized_levenshtein(&needle, &candidate)
        })
        .fold(0.0_f64, f64::max);

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}
