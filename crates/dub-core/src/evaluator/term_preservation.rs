//! Extracts salient terms from source text and checks how many survive
//! into the translation.

use dub_protocol::TermPreservation;

const REJECT_RATIO_FLOOR: f32 = 0.30;

pub fn extract_terms(original: &str, target_is_non_latin: bool) -> Vec<String> {
    let mut terms = Vec::new();
    for (i, word) in original.split_whitespace().enumerate() {
        let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.' && c != ',');
        if trimmed.is_empty() {
            continue;
        }
        if is_number_or_date_token(trimmed) {
            terms.push(trimmed.to_string());
            continue;
        }
        if i > 0 && trimmed.chars().next().is_some_and(|c| c.is_uppercase()) && trimmed.chars().all(|c| c.is_alphabetic()) {
            terms.push(trimmed.to_string());
            continue;
        }
        if target_is_non_latin && trimmed.len() >= 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            terms.push(trimmed.to_string());
        }
    }
    terms.sort();
    terms.dedup();
    terms
}

fn is_number_or_date_token(token: &str) -> bool {
    let cleaned: String = token.chars().filter(|c| !matches!(c, '-' | '/')).collect();
    !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

/// Checks each extracted term against the translation (case-insensitive)
/// and returns the preservation report. A ratio below the reject floor is
/// surfaced so the caller can force `Recommendation::Reject`.
pub fn check_preservation(original: &str, translated: &str, target_is_non_latin: bool) -> (TermPreservation, bool) {
    let terms = extract_terms(original, target_is_non_latin);
    if terms.is_empty() {
        return (
            TermPreservation {
                score: 1.0,
                missing: Vec::new(),
            },
            false,
        );
    }

    let translated_lower = translated.to_lowercase();
    let missing: Vec<String> = terms
        .iter()
        .filter(|t| !translated_lower.contains(&t.to_lowercase()))
        .cloned()
        .collect();

    let matched = terms.len() - missing.len();
    let ratio = matched as f32 / terms.len() as f32;
    let force_reject = ratio < REJECT_RATIO_FLOOR;

    (TermPreservation { score: ratio, missing }, force_reject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_numbers_and_proper_nouns() {
        let original = "John paid 42.50 dollars in Paris on 2024-01-05";
        let translated = "juan pago 42.50 dolares en paris el 2024-01-05";
        let (report, force_reject) = check_preservation(original, translated, false);
        assert!(report.score > 0.5);
        assert!(!force_reject);
    }

    #[test]
    fn forces_reject_when_most_terms_vanish() {
        let original = "Account 99281 belongs to Marcus Webb in London";
        let translated = "a completely unrelated sentence with nothing kept";
        let (_, force_reject) = check_preservation(original, translated, false);
        assert!(force_reject);
    }

    #[test]
    fn empty_term_set_never_forces_reject() {
        let (report, force_reject) = check_preservation("hello there", "hola alli", false);
        assert_eq!(report.score, 1.0);
        assert!(!force_reject);
    }
}
