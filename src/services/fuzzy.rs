//! Edit-distance ranking for search suggestions

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Bonus for a candidate that starts with the query
const PREFIX_BOOST: f64 = 0.2;
/// Bonus for a candidate that contains the query elsewhere
const SUBSTRING_BOOST: f64 = 0.1;

/// Lowercases, strips diacritics and trims
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Levenshtein distance between the normalized forms of `a` and `b`
pub fn levenshtein(a: &str, b: &str) -> usize {
    let s: Vec<char> = normalize(a).chars().collect();
    let t: Vec<char> = normalize(b).chars().collect();

    if s.is_empty() {
        return t.len();
    }
    if t.is_empty() {
        return s.len();
    }

    let mut row: Vec<usize> = (0..=t.len()).collect();
    for (i, sc) in s.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, tc) in t.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(sc != tc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[t.len()]
}

/// Similarity in `0.0..=1.0`, higher is closer
pub fn similarity(a: &str, b: &str) -> f64 {
    let dist = levenshtein(a, b);
    let max_len = normalize(a)
        .chars()
        .count()
        .max(normalize(b).chars().count())
        .max(1);
    1.0 - dist as f64 / max_len as f64
}

/// An item with its match score
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f64,
}

/// Scores every item against `query` and sorts best first
///
/// An item's score is the best over its `fields`. Equal scores keep their
/// input order.
pub fn rank_candidates<T>(
    query: &str,
    items: Vec<T>,
    fields: &[fn(&T) -> Option<&str>],
) -> Vec<Ranked<T>> {
    let query = normalize(query);

    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| {
            let score = fields
                .iter()
                .map(|field| {
                    let value = normalize(field(&item).unwrap_or_default());
                    let mut score = similarity(&query, &value);
                    if value.starts_with(&query) {
                        score += PREFIX_BOOST;
                    } else if value.contains(&query) {
                        score += SUBSTRING_BOOST;
                    }
                    score
                })
                .fold(0.0, f64::max);
            Ranked { item, score }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
