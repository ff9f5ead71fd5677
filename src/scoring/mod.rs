//! Pronunciation scoring.
//!
//! Two interchangeable strategies, both pure and deterministic:
//! - phoneme-weighted: local edit-distance accuracy over characters and, where
//!   a phoneme table exists, over phoneme sequences (0..=100);
//! - error-rate-weighted: CER/WER supplied by the transcriber (0..=1).
//!
//! The caller picks the strategy.

pub mod distance;
pub mod feedback;
pub mod phoneme;

use serde::Serialize;

pub use feedback::{Feedback, PhonemeMismatch};
pub use phoneme::PhonemeMap;

const WORD_WEIGHT: f64 = 0.3;
const PHONEME_WEIGHT: f64 = 0.7;
const CER_WEIGHT: f64 = 0.85;
const WER_WEIGHT: f64 = 0.15;

/// Character and word error rates, each a fraction in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorRates {
    pub cer: f64,
    pub wer: f64,
}

impl ErrorRates {
    /// Rates for a transcription with nothing recognized.
    pub const TOTAL_MISS: ErrorRates = ErrorRates { cer: 1.0, wer: 1.0 };

    /// Compute both rates locally against a reference.
    pub fn measure(hypothesis: &str, reference: &str) -> Self {
        Self {
            cer: distance::character_error_rate(hypothesis, reference),
            wer: distance::word_error_rate(hypothesis, reference),
        }
    }

    fn clamped(self) -> Self {
        Self {
            cer: clamp_unit(self.cer),
            wer: clamp_unit(self.wer),
        }
    }
}

fn clamp_unit(rate: f64) -> f64 {
    if rate.is_nan() {
        1.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreDetails {
    Phonemes {
        word_accuracy: f64,
        phoneme_accuracy: f64,
        transcribed_phonemes: Vec<String>,
        target_phonemes: Vec<String>,
    },
    ErrorRates {
        character_error_rate: f64,
        word_error_rate: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub transcription: String,
    pub target_phrase: String,
    /// 0..=100 for phoneme-weighted results, 0..=1 for error-rate results.
    pub score: f64,
    pub feedback: Feedback,
    pub details: ScoreDetails,
}

impl ScoreResult {
    pub fn feedback_text(&self) -> String {
        self.feedback.to_string()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn owned(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

/// Phoneme-weighted score on a 0..=100 scale.
///
/// `word_accuracy` compares the full strings character by character. When
/// `language` has a phoneme table both strings are decomposed and the joined
/// phoneme sequences are compared the same way; otherwise phoneme accuracy
/// equals word accuracy. Final score is `0.3 * word + 0.7 * phoneme`, rounded
/// to two decimals.
pub fn score_with_phonemes(transcribed: &str, target: &str, language: &str) -> ScoreResult {
    let word_accuracy = distance::accuracy(transcribed, target);

    let (transcribed_phonemes, target_phonemes, phoneme_accuracy) =
        match PhonemeMap::for_language(language) {
            Some(map) => {
                let produced = map.decompose(transcribed);
                let expected = map.decompose(target);
                let accuracy = distance::accuracy(&produced.join(" "), &expected.join(" "));
                (produced, expected, accuracy)
            }
            None => (Vec::new(), Vec::new(), word_accuracy),
        };

    let score = round_to(
        word_accuracy * WORD_WEIGHT + phoneme_accuracy * PHONEME_WEIGHT,
        2,
    )
    .clamp(0.0, 100.0);
    let feedback = feedback::for_phoneme_score(score, &transcribed_phonemes, &target_phonemes);

    ScoreResult {
        transcription: transcribed.to_string(),
        target_phrase: target.to_string(),
        score,
        feedback,
        details: ScoreDetails::Phonemes {
            word_accuracy,
            phoneme_accuracy,
            transcribed_phonemes: owned(&transcribed_phonemes),
            target_phonemes: owned(&target_phonemes),
        },
    }
}

/// Error-rate-weighted score on a 0..=1 scale: `1 - (0.85 * CER + 0.15 * WER)`,
/// floored at zero and rounded to four decimals. An empty transcription
/// short-circuits to the degraded result whatever rates are supplied.
pub fn score_with_error_rates(transcribed: &str, target: &str, rates: ErrorRates) -> ScoreResult {
    if transcribed.trim().is_empty() {
        return unheard_error_rate_result(target);
    }

    let rates = rates.clamped();
    let weighted = CER_WEIGHT * rates.cer + WER_WEIGHT * rates.wer;
    let score = round_to((1.0 - weighted).max(0.0), 4);

    ScoreResult {
        transcription: transcribed.to_string(),
        target_phrase: target.to_string(),
        score,
        feedback: feedback::for_error_rate_score(score),
        details: ScoreDetails::ErrorRates {
            character_error_rate: rates.cer,
            word_error_rate: rates.wer,
        },
    }
}

/// Fixed result when nothing usable was transcribed (error-rate scale).
pub fn unheard_error_rate_result(target: &str) -> ScoreResult {
    ScoreResult {
        transcription: String::new(),
        target_phrase: target.to_string(),
        score: 0.0,
        feedback: Feedback::CouldNotHear,
        details: ScoreDetails::ErrorRates {
            character_error_rate: ErrorRates::TOTAL_MISS.cer,
            word_error_rate: ErrorRates::TOTAL_MISS.wer,
        },
    }
}

/// Fixed result when nothing usable was transcribed (phoneme scale).
pub fn unheard_phoneme_result(target: &str, language: &str) -> ScoreResult {
    let target_phonemes = PhonemeMap::for_language(language)
        .map(|map| owned(&map.decompose(target)))
        .unwrap_or_default();
    ScoreResult {
        transcription: String::new(),
        target_phrase: target.to_string(),
        score: 0.0,
        feedback: Feedback::CouldNotHear,
        details: ScoreDetails::Phonemes {
            word_accuracy: 0.0,
            phoneme_accuracy: 0.0,
            transcribed_phonemes: Vec::new(),
            target_phonemes,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_without_phoneme_table_is_perfect() {
        let result = score_with_phonemes("good morning", "good morning", "en");
        assert_eq!(result.score, 100.0);
        assert_eq!(result.feedback, Feedback::Excellent);
        match result.details {
            ScoreDetails::Phonemes {
                word_accuracy,
                phoneme_accuracy,
                ref target_phonemes,
                ..
            } => {
                assert_eq!(word_accuracy, 100.0);
                assert_eq!(phoneme_accuracy, 100.0);
                assert!(target_phonemes.is_empty());
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn exact_match_with_phoneme_table_is_perfect() {
        let result = score_with_phonemes("नमस्ते", "नमस्ते", "hi");
        assert_eq!(result.score, 100.0);
        assert_eq!(result.feedback, Feedback::Excellent);
    }

    #[test]
    fn consonant_swap_reports_the_phoneme() {
        // word: 1 edit over 2 chars -> 50; phonemes "g m" vs "k m" -> 66.67
        let result = score_with_phonemes("गम", "कम", "hi");
        assert!((result.score - 61.67).abs() < 1e-9, "score {}", result.score);
        assert_eq!(
            result.feedback,
            Feedback::PhonemeMismatches(vec![PhonemeMismatch {
                expected: "k".into(),
                produced: "g".into(),
            }])
        );
    }

    #[test]
    fn truncated_attempt_gets_generic_feedback() {
        let result = score_with_phonemes("न", "नमस्ते", "hi");
        assert!(result.score < 80.0);
        assert_eq!(result.feedback, Feedback::KeepPracticing);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(score_with_phonemes("", "नमस्ते", "hi").score, 0.0);
        assert_eq!(score_with_phonemes("hello", "", "en").score, 0.0);
    }

    #[test]
    fn error_rate_formula() {
        let result = score_with_error_rates("abc", "abd", ErrorRates { cer: 0.1, wer: 0.2 });
        // 1 - (0.085 + 0.03)
        assert!((result.score - 0.885).abs() < 1e-9);
        assert_eq!(result.feedback, Feedback::Great);

        let perfect = score_with_error_rates("abc", "abc", ErrorRates { cer: 0.0, wer: 0.0 });
        assert_eq!(perfect.score, 1.0);
        assert_eq!(perfect.feedback, Feedback::Flawless);

        let worst = score_with_error_rates("x", "abc", ErrorRates { cer: 1.0, wer: 1.0 });
        assert_eq!(worst.score, 0.0);
        assert_eq!(worst.feedback, Feedback::ReviewExample);
    }

    #[test]
    fn error_rates_outside_unit_range_are_clamped() {
        let high = score_with_error_rates("x", "y", ErrorRates { cer: 3.0, wer: 2.0 });
        assert_eq!(high.score, 0.0);
        let negative = score_with_error_rates("x", "y", ErrorRates { cer: -1.0, wer: -1.0 });
        assert_eq!(negative.score, 1.0);
        let nan = score_with_error_rates("x", "y", ErrorRates { cer: f64::NAN, wer: 0.0 });
        assert!((nan.score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn empty_transcription_short_circuits() {
        let result = score_with_error_rates("  ", "नमस्ते", ErrorRates { cer: 0.0, wer: 0.0 });
        assert_eq!(result.score, 0.0);
        assert_eq!(result.feedback, Feedback::CouldNotHear);
        assert_eq!(
            result.details,
            ScoreDetails::ErrorRates {
                character_error_rate: 1.0,
                word_error_rate: 1.0
            }
        );
        assert_eq!(
            result.feedback_text(),
            "We couldn't hear you clearly. Please try recording the phrase again!"
        );
    }

    #[test]
    fn measured_rates() {
        let rates = ErrorRates::measure("नमस्ते आप कैसे हो", "नमस्ते आप कैसे हैं");
        assert!((rates.wer - 0.25).abs() < 1e-9);
        assert!((rates.cer - 2.0 / 18.0).abs() < 1e-9);
    }

    #[test]
    fn results_serialize_with_tagged_details() {
        let result = score_with_phonemes("कम", "कम", "hi");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["details"]["kind"], "phonemes");
        assert_eq!(json["feedback"]["kind"], "excellent");
        assert_eq!(json["details"]["target_phonemes"], serde_json::json!(["k", "m"]));
    }
}
