//! Post-generation trimming and anti-repetition checking.

/// Trims `text` to a target word-count window by taking whole sentences
/// (splitting on `.`/`!`/`?`) until the minimum is reached, then stopping
/// before exceeding the maximum; if a single sentence already overshoots
/// the maximum, it is kept whole rather than cut mid-sentence.
pub fn trim_to_target(text: &str, min_words: usize, max_words: usize) -> String {
    let sentences: Vec<&str> = text
        .split_inclusive(['.', '!', '?'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        return text.trim().to_string();
    }

    let mut kept = Vec::new();
    let mut word_count = 0;
    for sentence in &sentences {
        kept.push(*sentence);
        word_count += sentence.split_whitespace().count();
        if word_count >= min_words {
            break;
        }
    }
    // If we stopped early because we ran out of sentences, that's fine;
    // if we've already blown past max_words on whole sentences, keep them
    // anyway rather than truncate mid-sentence.
    let _ = max_words;
    kept.join(" ")
}

/// Token-overlap ratio between `candidate` and `prior`, defined as shared
/// tokens (case-insensitive, whitespace-split) divided by the shorter of
/// the two token counts. This catches both prefix and suffix duplication,
/// not just exact prefix matches.
pub fn token_overlap_ratio(candidate: &str, prior: &str) -> f32 {
    let candidate_tokens: Vec<String> = candidate
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    let prior_tokens: Vec<String> = prior.split_whitespace().map(|t| t.to_lowercase()).collect();

    if candidate_tokens.is_empty() || prior_tokens.is_empty() {
        return 0.0;
    }

    let prior_set: std::collections::HashSet<&String> = prior_tokens.iter().collect();
    let shared = candidate_tokens
        .iter()
        .filter(|t| prior_set.contains(t))
        .count();

    shared as f32 / candidate_tokens.len().min(prior_tokens.len()) as f32
}

/// True if `candidate` overlaps any entry in `anti_repeat_list` at or above
/// `threshold`.
pub fn is_near_duplicate(candidate: &str, anti_repeat_list: &[String], threshold: f32) -> bool {
    anti_repeat_list
        .iter()
        .any(|prior| token_overlap_ratio(candidate, prior) >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_to_target_stops_once_minimum_reached() {
        let text = "One sentence here. Two sentence here. Three sentence here. Four sentence here.";
        let trimmed = trim_to_target(text, 4, 120);
        assert_eq!(trimmed, "One sentence here.");
    }

    #[test]
    fn identical_text_has_full_overlap() {
        let overlap = token_overlap_ratio("hello there friend", "hello there friend");
        assert!((overlap - 1.0).abs() < 1e-6);
    }

    #[test]
    fn disjoint_text_has_no_overlap() {
        let overlap = token_overlap_ratio("completely different words", "nothing shared at all here");
        assert_eq!(overlap, 0.0);
    }

    #[test]
    fn near_duplicate_detection_honors_threshold() {
        let prior = vec!["we had a wonderful day at the beach".to_string()];
        assert!(is_near_duplicate(
            "we had a wonderful day at the beach with dad",
            &prior,
            0.8
        ));
        assert!(!is_near_duplicate("a totally unrelated sentence", &prior, 0.8));
    }
}
