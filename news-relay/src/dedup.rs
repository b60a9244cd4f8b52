use crate::types::{RelayError, Result};
use tracing::debug;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Titles published so far in the current run, in publish order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedTitleHistory {
    titles: Vec<String>,
}

impl ProcessedTitleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, title: impl Into<String>) {
        self.titles.push(title.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(String::as_str)
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }
}

impl<S: Into<String>> FromIterator<S> for ProcessedTitleHistory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            titles: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A history entry that crossed the similarity threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub matched: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    threshold: f64,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl DuplicateDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Like [`DuplicateDetector::new`], but rejects thresholds outside `[0, 1]`.
    pub fn try_new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RelayError::Config(format!(
                "similarity threshold must be between 0 and 1, got {}",
                threshold
            )));
        }
        Ok(Self::new(threshold))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_duplicate(&self, title: &str, history: &ProcessedTitleHistory) -> bool {
        self.first_match(title, history).is_some()
    }

    /// First history entry, in insertion order, whose ratio strictly exceeds the threshold.
    /// Not necessarily the closest one.
    pub fn first_match(&self, title: &str, history: &ProcessedTitleHistory) -> Option<DuplicateMatch> {
        history.iter().find_map(|previous| {
            let ratio = similarity(title, previous);
            debug!("Similarity {:.3} between '{}' and '{}'", ratio, title, previous);
            (ratio > self.threshold).then(|| DuplicateMatch {
                matched: previous.to_string(),
                ratio,
            })
        })
    }
}

/// Case-insensitive Ratcliff/Obershelp ratio `2*M / T`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Sum of the sizes of the matching blocks: take the longest common block,
/// then repeat on the pieces to its left and right.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`. Ties go to the
/// block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run lengths ending at b[j - 1], offset by one so index 0 is the empty prefix
    let mut previous = vec![0usize; bhi - blo + 1];
    let mut current = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo + 1;
            current[k] = if a[i] == b[j] { previous[k - 1] + 1 } else { 0 };
            if current[k] > best_size {
                best_size = current[k];
                best_i = i + 1 - best_size;
                best_j = j + 1 - best_size;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_i, best_j, best_size)
}
