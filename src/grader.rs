//! Fuzzy answer matching for auto-grading
//!
//! Submitted guesses are compared against the canonical title/artist after
//! normalization. An answer within `threshold` edits of the canonical text is
//! treated as correct without waiting for the showmaster.

use serde::{Deserialize, Serialize};

/// Maximum number of edits still considered a correct answer
pub const DEFAULT_THRESHOLD: usize = 3;

/// Outcome of comparing one submitted field against its canonical text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResult {
    pub normalized_distance: usize,
    pub is_match: bool,
    /// Currently always equal to `is_match`
    pub auto_approved: bool,
}

/// Normalize text for comparison.
///
/// Lower-cases, drops everything but ASCII letters, digits and whitespace,
/// collapses whitespace runs to a single space and trims.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Like [`normalize`], with missing input treated as empty
pub fn normalize_opt(text: Option<&str>) -> String {
    normalize(text.unwrap_or_default())
}

/// Levenshtein distance between `a` and `b`, counted in chars.
///
/// No normalization happens here; callers normalize first.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // matrix[i][j]: distance between b[..i] and a[..j]
    let mut matrix = vec![vec![0usize; a.len() + 1]; b.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=b.len() {
        for j in 1..=a.len() {
            matrix[i][j] = if b[i - 1] == a[j - 1] {
                matrix[i - 1][j - 1]
            } else {
                let substitution = matrix[i - 1][j - 1] + 1;
                let insertion = matrix[i][j - 1] + 1;
                let deletion = matrix[i - 1][j] + 1;
                substitution.min(insertion).min(deletion)
            };
        }
    }

    matrix[b.len()][a.len()]
}

/// Check whether `answer` is close enough to `correct` to be auto-approved
pub fn fuzzy_match(answer: &str, correct: &str, threshold: usize) -> MatchResult {
    let normalized_answer = normalize(answer);
    let normalized_correct = normalize(correct);

    // Exact match, including blank vs blank
    if normalized_answer == normalized_correct {
        return MatchResult {
            normalized_distance: 0,
            is_match: true,
            auto_approved: true,
        };
    }

    let distance = edit_distance(&normalized_answer, &normalized_correct);
    let is_match = distance <= threshold;

    MatchResult {
        normalized_distance: distance,
        is_match,
        auto_approved: is_match,
    }
}
