//! # String Similarity Algorithms
//!
//! Building blocks of the fuzzy matcher. All functions work on Unicode
//! scalar values and expect already-normalized (lowercase) input.

use std::collections::BTreeSet;

/// Levenshtein distance between two strings
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// `1 - levenshtein / max_len`. Two empty strings are identical.
pub fn edit_similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f32 / max_len as f32
}

/// Intersection over union of the two character sets.
pub fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let set_a: BTreeSet<char> = a.chars().collect();
    let set_b: BTreeSet<char> = b.chars().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 1.0;
    }
    set_a.intersection(&set_b).count() as f32 / union as f32
}

fn consonant_class(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

/// Four-character phonetic code: the first letter, then the classes of the
/// following consonants with vowels dropped and adjacent repeats collapsed,
/// padded with zeros.
///
/// Returns `None` when the input has no ASCII letter.
pub fn phonetic_code(word: &str) -> Option<String> {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let first = *letters.first()?;

    let mut code = String::with_capacity(4);
    code.push(first.to_ascii_uppercase());

    let mut last = consonant_class(first);
    for class in letters[1..].iter().filter_map(|&c| consonant_class(c)) {
        if Some(class) != last {
            code.push(class);
            if code.len() == 4 {
                break;
            }
        }
        last = Some(class);
    }

    while code.len() < 4 {
        code.push('0');
    }
    Some(code)
}

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens split on whitespace, `-` and `/`, keeping those of at least
/// three characters.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .filter(|token| token.chars().count() >= 3)
        .collect()
}

/// Convert a [0, 1] similarity to the matcher's integer 0-100 scale,
/// truncating.
pub fn to_score(similarity: f32) -> u8 {
    (similarity.clamp(0.0, 1.0) * 100.0 + 1e-3).floor() as u8
}
