//! Approximate substring similarity for reranking.

/// Length of the longest common subsequence of `a` and `b`.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Indel similarity of two equal-length strings, 0-100.
fn ratio(a: &[char], b: &[char]) -> f32 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f32 / total as f32
}

/// Best similarity of the shorter string against any window of the longer
/// string with the same length, 0-100. Case-insensitive.
pub fn partial_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best = 0.0f32;
    for window in long.windows(short.len()) {
        best = best.max(ratio(&short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_substring_scores_full() {
        assert_eq!(
            partial_ratio("due diligence", "Customer due diligence is required."),
            100.0
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(partial_ratio("SANCTIONS", "sanctions list"), 100.0);
        assert_eq!(partial_ratio("САНКЦИИ", "санкции"), 100.0);
    }

    #[test]
    fn test_argument_order_does_not_matter() {
        let a = partial_ratio("gift limit", "the gift register and its limit");
        let b = partial_ratio("the gift register and its limit", "gift limit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_closer_text_scores_higher() {
        let query = "transfer screening";
        let near = partial_ratio(query, "every transfr is screened");
        let far = partial_ratio(query, "office hours are nine to five");
        assert!(near > far);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(partial_ratio("", ""), 100.0);
        assert_eq!(partial_ratio("", "text"), 0.0);
    }

    #[test]
    fn test_lcs_len() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(lcs_len(&a, &b), 4);
    }
}
