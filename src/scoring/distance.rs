//! Edit distance and the accuracy/error-rate figures derived from it.

/// Levenshtein distance (unit-cost insert/delete/substitute) over any sequence.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, x) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(x != y);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Character-level similarity in [0, 100]. Zero when either side is empty.
pub fn accuracy(hypothesis: &str, reference: &str) -> f64 {
    let hyp: Vec<char> = hypothesis.chars().collect();
    let reference: Vec<char> = reference.chars().collect();
    if hyp.is_empty() || reference.is_empty() {
        return 0.0;
    }
    let max_len = hyp.len().max(reference.len()) as f64;
    let distance = edit_distance(&hyp, &reference) as f64;
    ((max_len - distance) / max_len * 100.0).max(0.0)
}

/// Character error rate of `hypothesis` against `reference`, clamped to [0, 1].
pub fn character_error_rate(hypothesis: &str, reference: &str) -> f64 {
    let hyp: Vec<char> = hypothesis.chars().collect();
    let reference: Vec<char> = reference.chars().collect();
    rate(edit_distance(&hyp, &reference), reference.len())
}

/// Word error rate over whitespace-separated tokens, clamped to [0, 1].
pub fn word_error_rate(hypothesis: &str, reference: &str) -> f64 {
    let hyp: Vec<&str> = hypothesis.split_whitespace().collect();
    let reference: Vec<&str> = reference.split_whitespace().collect();
    rate(edit_distance(&hyp, &reference), reference.len())
}

fn rate(errors: usize, reference_len: usize) -> f64 {
    if reference_len == 0 {
        return if errors == 0 { 0.0 } else { 1.0 };
    }
    (errors as f64 / reference_len as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn classic_distances() {
        assert_eq!(edit_distance(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(edit_distance(&chars("flaw"), &chars("lawn")), 2);
        assert_eq!(edit_distance(&chars(""), &chars("abc")), 3);
        assert_eq!(edit_distance(&chars("abc"), &chars("")), 3);
        assert_eq!(edit_distance(&chars("same"), &chars("same")), 0);
    }

    #[test]
    fn distance_counts_code_points_not_bytes() {
        // "हैं" -> "हो": substitute the vowel sign, drop the nasal mark
        assert_eq!(edit_distance(&chars("हैं"), &chars("हो")), 2);
    }

    #[test]
    fn accuracy_bounds() {
        assert_eq!(accuracy("", "abc"), 0.0);
        assert_eq!(accuracy("abc", ""), 0.0);
        assert_eq!(accuracy("abc", "abc"), 100.0);
        assert_eq!(accuracy("abc", "xyz"), 0.0);
        assert!((accuracy("ab", "abcd") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn error_rates() {
        assert_eq!(word_error_rate("a b c", "a b c"), 0.0);
        assert!((word_error_rate("a x c", "a b c") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(word_error_rate("a b c d e f", "a"), 1.0);
        assert!((character_error_rate("abcx", "abcd") - 0.25).abs() < 1e-9);
        assert_eq!(character_error_rate("", ""), 0.0);
        assert_eq!(character_error_rate("a", ""), 1.0);
    }
}
