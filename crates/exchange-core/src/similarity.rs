//! "Did you mean" suggestions for numbers that are not in the exchange.
//!
//! Similarity is the matching-blocks ratio `2·M / (|a| + |b|)`, where `M` is
//! the total length of the blocks found by repeatedly taking the longest
//! common substring and recursing on the pieces to its left and right.

/// Candidates must score strictly above this ratio.
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

/// At most this many suggestions are returned.
pub const MAX_SUGGESTIONS: usize = 5;

/// A known number close to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub number: String,
    /// Matching-blocks ratio in `[0, 1]`.
    pub ratio: f64,
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
///
/// Among blocks of equal length the one starting earliest in `a` wins, then
/// the one starting earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // prev[j - blo + 1] = length of the common run ending at a[i - 1], b[j]
    let mut prev = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        let mut cur = vec![0usize; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                cur[j - blo + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

/// Total length of all matching blocks between `a` and `b`.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![((0, a.len()), (0, b.len()))];

    while let Some(((alo, ahi), (blo, bhi))) = queue.pop() {
        let (i, j, k) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push(((alo, i), (blo, j)));
        }
        if i + k < ahi && j + k < bhi {
            queue.push(((i + k, ahi), (j + k, bhi)));
        }
    }
    matched
}

/// Similarity of two strings in `[0, 1]`; two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

/// Up to [`MAX_SUGGESTIONS`] candidates scoring above
/// [`SIMILARITY_THRESHOLD`], best first. Equal ratios keep candidate order.
pub fn did_you_mean<'a, I>(query: &str, candidates: I) -> Vec<Suggestion>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut suggestions: Vec<Suggestion> = candidates
        .into_iter()
        .map(|number| Suggestion {
            number: number.to_string(),
            ratio: ratio(query, number),
        })
        .filter(|s| s.ratio > SIMILARITY_THRESHOLD)
        .collect();

    suggestions.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
