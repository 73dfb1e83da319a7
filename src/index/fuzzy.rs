//! Approximate substring matching

/// Lowercased query ready to be matched against many fields
#[derive(Debug, Clone)]
pub struct Pattern {
    chars: Vec<char>,
}

impl Pattern {
    /// Prepare `query` for case-insensitive matching
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            chars: query.trim().to_lowercase().chars().collect(),
        }
    }

    /// Number of characters in the pattern
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the pattern is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Normalized distance in `[0, 1]` between the pattern and its closest
    /// substring of `text` (already lowercased). 0 is an exact occurrence.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(&self, text: &[char]) -> f64 {
        if self.chars.is_empty() {
            return 1.0;
        }
        let errors = substring_edit_distance(&self.chars, text);
        errors as f64 / self.chars.len() as f64
    }
}

/// Fewest insertions, deletions or substitutions that turn `pattern` into
/// some substring of `text`. The substring may start anywhere.
#[must_use]
pub fn substring_edit_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }

    // column j holds the cost of matching pattern[..i] ending at text[j]
    let mut previous: Vec<usize> = (0..=m).collect();
    let mut current = vec![0usize; m + 1];
    let mut best = m;

    for &tc in text {
        current[0] = 0;
        for i in 1..=m {
            let substitution = previous[i - 1] + usize::from(pattern[i - 1] != tc);
            let deletion = previous[i] + 1;
            let insertion = current[i - 1] + 1;
            current[i] = substitution.min(deletion).min(insertion);
        }
        best = best.min(current[m]);
        std::mem::swap(&mut previous, &mut current);
    }

    best
}
