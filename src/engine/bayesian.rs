use chrono::{DateTime, Utc};

use super::{bayesian_update, days_since_review, ConfidenceUpdateStrategy, DEFAULT_DECAY_RATE};
use crate::models::{Concept, ConfidenceLevel, FlashcardEvidence, QuizEvidence};

// Interior band so no prior reaches 0 or 1, where fusion can no longer move it.
const MIN_CONFIDENCE: f64 = 0.01;
const MAX_CONFIDENCE: f64 = 0.99;

const QUIZ_CORRECT_LIKELIHOOD: f64 = 0.95;
const QUIZ_INCORRECT_LIKELIHOOD: f64 = 0.1;

/// Plain Bayesian updater with exponential decay. Strong evidence moves confidence quickly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayesianStrategy {
    decay_rate: f64,
}

impl BayesianStrategy {
    pub fn new(decay_rate: f64) -> Self {
        Self { decay_rate }
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    fn flashcard_likelihood(level: ConfidenceLevel) -> f64 {
        match level {
            ConfidenceLevel::Unknown => 0.1,
            ConfidenceLevel::KnownLittle => 0.3,
            ConfidenceLevel::KnownFairly => 0.6,
            ConfidenceLevel::KnownWell => 0.8,
            ConfidenceLevel::Mastered => 0.95,
        }
    }

    fn fuse(&self, concept: &Concept, likelihood: f64, now: DateTime<Utc>) -> Concept {
        let decayed = self.apply_decay(concept, now);
        let prior = decayed.confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
        let posterior = bayesian_update(prior, likelihood);

        Concept {
            confidence: posterior.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
            last_reviewed_at: Some(now),
            ..decayed
        }
    }
}

impl Default for BayesianStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_RATE)
    }
}

impl ConfidenceUpdateStrategy for BayesianStrategy {
    fn update_from_flashcard(
        &self,
        concept: &Concept,
        evidence: &FlashcardEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        self.fuse(concept, Self::flashcard_likelihood(evidence.level), now)
    }

    fn update_from_quiz(
        &self,
        concept: &Concept,
        evidence: &QuizEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        let likelihood = if evidence.was_correct {
            QUIZ_CORRECT_LIKELIHOOD
        } else {
            QUIZ_INCORRECT_LIKELIHOOD
        };
        self.fuse(concept, likelihood, now)
    }

    fn apply_decay(&self, concept: &Concept, now: DateTime<Utc>) -> Concept {
        let Some(days) = days_since_review(concept, now) else {
            return concept.clone();
        };

        let decayed = concept.confidence * self.decay_rate.powf(days);
        Concept {
            confidence: decayed.clamp(0.0, MAX_CONFIDENCE),
            ..concept.clone()
        }
    }

    fn bounds(&self) -> (f64, f64) {
        (MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
    }

    fn concept(confidence: f64, last: Option<DateTime<Utc>>) -> Concept {
        let mut c = Concept::new(Uuid::new_v4(), "Epithelial tissue", None).unwrap();
        c.confidence = confidence;
        c.last_reviewed_at = last;
        c
    }

    mod update_tests {
        use super::*;

        #[test]
        fn known_well_from_fresh_prior() {
            let s = BayesianStrategy::default();
            let evidence = FlashcardEvidence::new(ConfidenceLevel::KnownWell, 1200);
            let updated = s.update_from_flashcard(&concept(0.3, None), &evidence, t0());
            assert!((updated.confidence - 0.6316).abs() < 1e-4);
            assert_eq!(updated.last_reviewed_at, Some(t0()));
        }

        #[test]
        fn incorrect_quiz_after_flashcard() {
            let s = BayesianStrategy::default();
            let flash = FlashcardEvidence::new(ConfidenceLevel::KnownWell, 0);
            let after_card = s.update_from_flashcard(&concept(0.3, None), &flash, t0());

            let quiz = QuizEvidence::new(false, 0);
            let after_quiz = s.update_from_quiz(&after_card, &quiz, t0());
            assert!((after_quiz.confidence - 0.1601).abs() < 1e-3);
        }

        #[test]
        fn correct_quiz_raises_confidence() {
            let s = BayesianStrategy::default();
            let updated = s.update_from_quiz(&concept(0.3, None), &QuizEvidence::new(true, 0), t0());
            assert!(updated.confidence > 0.3);
        }

        #[test]
        fn only_confidence_and_review_time_change() {
            let s = BayesianStrategy::default();
            let c = concept(0.4, None);
            let updated = s.update_from_quiz(&c, &QuizEvidence::new(true, 0), t0());
            assert_eq!(updated.id, c.id);
            assert_eq!(updated.hive_id, c.hive_id);
            assert_eq!(updated.name, c.name);
            assert_eq!(updated.description, c.description);
        }

        #[test]
        fn updates_stay_within_unit_interval() {
            let s = BayesianStrategy::default();
            let last = Some(t0() - Duration::days(3));
            for prior in [0.0, 0.01, 0.3, 0.5, 0.99, 1.0] {
                for level in ConfidenceLevel::ALL {
                    let evidence = FlashcardEvidence::new(level, 0);
                    let updated = s.update_from_flashcard(&concept(prior, last), &evidence, t0());
                    assert!((0.0..=1.0).contains(&updated.confidence));
                }
                for correct in [true, false] {
                    let evidence = QuizEvidence::new(correct, 0);
                    let updated = s.update_from_quiz(&concept(prior, last), &evidence, t0());
                    assert!((0.0..=1.0).contains(&updated.confidence));
                }
            }
        }

        #[test]
        fn saturated_confidence_still_drops_on_a_miss() {
            let s = BayesianStrategy::default();
            let mastered = FlashcardEvidence::new(ConfidenceLevel::Mastered, 0);
            let mut c = concept(0.3, None);
            for _ in 0..50 {
                c = s.update_from_flashcard(&c, &mastered, t0());
            }
            assert!(c.confidence < 1.0);
            assert_eq!(c.confidence, MAX_CONFIDENCE);

            let before = c.confidence;
            let after = s.update_from_quiz(&c, &QuizEvidence::new(false, 0), t0());
            assert!(after.confidence < before);
        }

        #[test]
        fn boundary_priors_are_pulled_inside_before_fusion() {
            let s = BayesianStrategy::default();
            let miss = QuizEvidence::new(false, 0);
            let hit = QuizEvidence::new(true, 0);
            assert!(s.update_from_quiz(&concept(1.0, None), &miss, t0()).confidence < 1.0);
            assert!(s.update_from_quiz(&concept(0.0, None), &hit, t0()).confidence > 0.0);
        }

        #[test]
        fn stronger_ratings_never_lower_the_posterior() {
            let s = BayesianStrategy::default();
            let c = concept(0.5, None);
            let posteriors: Vec<f64> = ConfidenceLevel::ALL
                .iter()
                .map(|&level| {
                    s.update_from_flashcard(&c, &FlashcardEvidence::new(level, 0), t0())
                        .confidence
                })
                .collect();
            assert!(posteriors.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    mod decay_tests {
        use super::*;

        #[test]
        fn no_decay_without_previous_review() {
            let s = BayesianStrategy::default();
            let c = concept(0.7, None);
            assert_eq!(s.apply_decay(&c, t0()), c);
        }

        #[test]
        fn no_decay_when_now_is_not_after_last_review() {
            let s = BayesianStrategy::default();
            let c = concept(0.7, Some(t0()));
            assert_eq!(s.apply_decay(&c, t0()), c);
            assert_eq!(s.apply_decay(&c, t0() - Duration::days(2)), c);
        }

        #[test]
        fn ten_days_at_default_rate() {
            let s = BayesianStrategy::default();
            let c = concept(0.8, Some(t0()));
            let decayed = s.apply_decay(&c, t0() + Duration::days(10));
            assert!((decayed.confidence - 0.8 * 0.95_f64.powi(10)).abs() < 1e-12);
            assert_eq!(decayed.last_reviewed_at, c.last_reviewed_at);
        }

        #[test]
        fn decay_is_non_increasing_over_time() {
            let s = BayesianStrategy::default();
            let c = concept(0.9, Some(t0()));
            let mut previous = c.confidence;
            for hours in (0..=24 * 60).step_by(6) {
                let now = t0() + Duration::hours(hours);
                let value = s.apply_decay(&c, now).confidence;
                assert!(value <= previous);
                previous = value;
            }
        }

        #[test]
        fn update_decays_before_fusing() {
            let s = BayesianStrategy::default();
            let stale = concept(0.6, Some(t0() - Duration::days(30)));
            let fresh = concept(0.6, Some(t0()));
            let evidence = FlashcardEvidence::new(ConfidenceLevel::KnownFairly, 0);
            let from_stale = s.update_from_flashcard(&stale, &evidence, t0());
            let from_fresh = s.update_from_flashcard(&fresh, &evidence, t0());
            assert!(from_stale.confidence < from_fresh.confidence);
        }
    }
}
