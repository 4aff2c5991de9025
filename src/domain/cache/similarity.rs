//! String similarity for fuzzy cache lookup

use std::collections::HashSet;

/// Trigram-overlap similarity between two normalized texts, in [0, 1].
///
/// Character trigrams are extracted over the whitespace-joined text with
/// leading/trailing padding, then compared with the Jaccard coefficient.
/// Matches the behavior of Postgres trigram similarity closely enough
/// for threshold-gated cache reuse.
pub fn trigram_similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }

    let ta = trigrams(a);
    let tb = trigrams(b);

    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let intersection = ta.intersection(&tb).count();
    let union = ta.len() + tb.len() - intersection;

    intersection as f32 / union as f32
}

fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let mut set = HashSet::new();

    for word in text.split_whitespace() {
        // Two leading pads and one trailing pad, pg_trgm style
        let padded: Vec<char> = std::iter::repeat(' ')
            .take(2)
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();

        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}
