//! Feedback categories and the score-tier tables that select them.

use std::fmt;

use serde::Serialize;

/// A positional disagreement between expected and produced phonemes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhonemeMismatch {
    pub expected: String,
    pub produced: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "mismatches", rename_all = "snake_case")]
pub enum Feedback {
    // Phoneme-weighted tiers (0..=100 scale)
    Excellent,
    AlmostPerfect,
    PhonemeMismatches(Vec<PhonemeMismatch>),
    KeepPracticing,
    // Error-rate tiers (0..=1 scale)
    Flawless,
    Great,
    GoodAttempt,
    ReviewExample,
    /// Nothing usable was transcribed.
    CouldNotHear,
}

/// Checked top-down; the first threshold the score reaches wins.
const PHONEME_TIERS: [(f64, Feedback); 2] =
    [(95.0, Feedback::Excellent), (80.0, Feedback::AlmostPerfect)];

const ERROR_RATE_TIERS: [(f64, Feedback); 3] = [
    (0.95, Feedback::Flawless),
    (0.85, Feedback::Great),
    (0.65, Feedback::GoodAttempt),
];

const MAX_MISMATCHES: usize = 2;

fn tier(score: f64, tiers: &[(f64, Feedback)]) -> Option<Feedback> {
    tiers
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, feedback)| feedback.clone())
}

/// Feedback for a 0..=100 phoneme-weighted score. Below the praise tiers it
/// reports up to two index-aligned phoneme mismatches.
pub fn for_phoneme_score(score: f64, produced: &[&str], expected: &[&str]) -> Feedback {
    if let Some(feedback) = tier(score, &PHONEME_TIERS) {
        return feedback;
    }
    let mismatches: Vec<PhonemeMismatch> = expected
        .iter()
        .zip(produced)
        .filter(|(e, p)| e != p)
        .take(MAX_MISMATCHES)
        .map(|(e, p)| PhonemeMismatch {
            expected: e.to_string(),
            produced: p.to_string(),
        })
        .collect();
    if mismatches.is_empty() {
        Feedback::KeepPracticing
    } else {
        Feedback::PhonemeMismatches(mismatches)
    }
}

/// Feedback for a 0..=1 error-rate-weighted score.
pub fn for_error_rate_score(score: f64) -> Feedback {
    tier(score, &ERROR_RATE_TIERS).unwrap_or(Feedback::ReviewExample)
}

impl fmt::Display for PhonemeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Check your '{}' sound, you produced '{}'.",
            self.expected, self.produced
        )
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Excellent => write!(f, "Excellent pronunciation! Perfect job."),
            Feedback::AlmostPerfect => write!(f, "Great job! Almost perfect."),
            Feedback::PhonemeMismatches(mismatches) => {
                for (i, m) in mismatches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            Feedback::KeepPracticing => write!(f, "Good attempt! Keep practicing."),
            Feedback::Flawless => write!(f, "Flawless! Excellent pronunciation."),
            Feedback::Great => write!(f, "Great job! Very close to perfect."),
            Feedback::GoodAttempt => {
                write!(f, "Good attempt. Some key sounds need more practice.")
            }
            Feedback::ReviewExample => write!(
                f,
                "Keep practicing! Review the original audio example for improvement."
            ),
            Feedback::CouldNotHear => write!(
                f,
                "We couldn't hear you clearly. Please try recording the phrase again!"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phoneme_tier_edges() {
        assert_eq!(for_phoneme_score(95.0, &[], &[]), Feedback::Excellent);
        assert_eq!(for_phoneme_score(94.99, &[], &[]), Feedback::AlmostPerfect);
        assert_eq!(for_phoneme_score(80.0, &[], &[]), Feedback::AlmostPerfect);
        assert_eq!(for_phoneme_score(79.99, &[], &[]), Feedback::KeepPracticing);
    }

    #[test]
    fn at_most_two_mismatches_in_index_order() {
        let produced = ["g", "a", "x", "y"];
        let expected = ["k", "a", "t", "z"];
        let feedback = for_phoneme_score(10.0, &produced, &expected);
        assert_eq!(
            feedback,
            Feedback::PhonemeMismatches(vec![
                PhonemeMismatch {
                    expected: "k".into(),
                    produced: "g".into()
                },
                PhonemeMismatch {
                    expected: "t".into(),
                    produced: "x".into()
                },
            ])
        );
        assert_eq!(
            feedback.to_string(),
            "Check your 'k' sound, you produced 'g'. Check your 't' sound, you produced 'x'."
        );
    }

    #[test]
    fn length_only_difference_is_generic() {
        let feedback = for_phoneme_score(20.0, &["n"], &["n", "m", "s"]);
        assert_eq!(feedback, Feedback::KeepPracticing);
    }

    #[test]
    fn error_rate_tier_edges() {
        assert_eq!(for_error_rate_score(1.0), Feedback::Flawless);
        assert_eq!(for_error_rate_score(0.95), Feedback::Flawless);
        assert_eq!(for_error_rate_score(0.9), Feedback::Great);
        assert_eq!(for_error_rate_score(0.65), Feedback::GoodAttempt);
        assert_eq!(for_error_rate_score(0.6499), Feedback::ReviewExample);
        assert_eq!(for_error_rate_score(0.0), Feedback::ReviewExample);
    }
}
