use chrono::{DateTime, Utc};

use super::{bayesian_update, days_since_review, ConfidenceUpdateStrategy, DEFAULT_DECAY_RATE};
use crate::models::{Concept, ConfidenceLevel, FlashcardEvidence, QuizEvidence};

const MIN_CONFIDENCE: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.995;

/// Above this confidence decay runs at half speed.
const SLOW_DECAY_THRESHOLD: f64 = 0.8;

/// Above this confidence a single wrong quiz answer is treated as a likely slip.
const ANOMALY_TOLERANCE_THRESHOLD: f64 = 0.75;

const QUIZ_CORRECT_LIKELIHOOD: f64 = 0.95;
const QUIZ_SLIP_LIKELIHOOD: f64 = 0.45;
const QUIZ_INCORRECT_LIKELIHOOD: f64 = 0.3;

pub const DEFAULT_INERTIA: f64 = 0.8;
pub const DEFAULT_MAX_DAILY_DELTA: f64 = 0.08;

/// Bayesian updater with inertia and a per-update delta cap.
///
/// The posterior is blended back toward the prior (`inertia`), then the change is capped at
/// `max_daily_delta`, so one review can never swing confidence far. Confidence is kept inside
/// `[0.05, 0.995]`, which keeps later fusions away from the 0/1 fixed points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampenedBayesianStrategy {
    decay_rate: f64,
    inertia: f64,
    max_daily_delta: f64,
}

impl DampenedBayesianStrategy {
    pub fn new(decay_rate: f64, inertia: f64, max_daily_delta: f64) -> Self {
        Self {
            decay_rate,
            inertia,
            max_daily_delta,
        }
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn max_daily_delta(&self) -> f64 {
        self.max_daily_delta
    }

    fn flashcard_likelihood(level: ConfidenceLevel) -> f64 {
        match level {
            ConfidenceLevel::Unknown => 0.15,
            ConfidenceLevel::KnownLittle => 0.35,
            ConfidenceLevel::KnownFairly => 0.6,
            ConfidenceLevel::KnownWell => 0.8,
            ConfidenceLevel::Mastered => 0.95,
        }
    }

    fn quiz_likelihood(was_correct: bool, prior: f64) -> f64 {
        if was_correct {
            QUIZ_CORRECT_LIKELIHOOD
        } else if prior > ANOMALY_TOLERANCE_THRESHOLD {
            QUIZ_SLIP_LIKELIHOOD
        } else {
            QUIZ_INCORRECT_LIKELIHOOD
        }
    }

    fn dampen(&self, prior: f64, posterior: f64) -> f64 {
        let blended = prior * self.inertia + posterior * (1.0 - self.inertia);
        let delta = (blended - prior).clamp(-self.max_daily_delta, self.max_daily_delta);
        (prior + delta).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    fn fuse(&self, decayed: Concept, likelihood: f64, now: DateTime<Utc>) -> Concept {
        let prior = decayed.confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
        let posterior = bayesian_update(prior, likelihood);

        Concept {
            confidence: self.dampen(prior, posterior),
            last_reviewed_at: Some(now),
            ..decayed
        }
    }
}

impl Default for DampenedBayesianStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_RATE, DEFAULT_INERTIA, DEFAULT_MAX_DAILY_DELTA)
    }
}

impl ConfidenceUpdateStrategy for DampenedBayesianStrategy {
    fn update_from_flashcard(
        &self,
        concept: &Concept,
        evidence: &FlashcardEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        let decayed = self.apply_decay(concept, now);
        self.fuse(decayed, Self::flashcard_likelihood(evidence.level), now)
    }

    fn update_from_quiz(
        &self,
        concept: &Concept,
        evidence: &QuizEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        let decayed = self.apply_decay(concept, now);
        let likelihood = Self::quiz_likelihood(evidence.was_correct, decayed.confidence);
        self.fuse(decayed, likelihood, now)
    }

    fn apply_decay(&self, concept: &Concept, now: DateTime<Utc>) -> Concept {
        let Some(days) = days_since_review(concept, now) else {
            return concept.clone();
        };

        let exponent = if concept.confidence > SLOW_DECAY_THRESHOLD {
            days * 0.5
        } else {
            days
        };
        let decayed = concept.confidence * self.decay_rate.powf(exponent);

        Concept {
            confidence: decayed.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
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
        let mut c = Concept::new(Uuid::new_v4(), "Ohm's law", None).unwrap();
        c.confidence = confidence;
        c.last_reviewed_at = last;
        c
    }

    const PRIORS: [f64; 9] = [0.05, 0.1, 0.3, 0.5, 0.7, 0.76, 0.85, 0.95, 0.995];

    mod update_tests {
        use super::*;

        #[test]
        fn single_update_moves_at_most_max_delta() {
            let s = DampenedBayesianStrategy::default();
            for prior in PRIORS {
                for last in [None, Some(t0() - Duration::days(5))] {
                    let c = concept(prior, last);
                    let decayed = s.apply_decay(&c, t0()).confidence;

                    for level in ConfidenceLevel::ALL {
                        let evidence = FlashcardEvidence::new(level, 0);
                        let updated = s.update_from_flashcard(&c, &evidence, t0());
                        assert!(
                            (updated.confidence - decayed).abs() <= s.max_daily_delta() + 1e-12,
                            "prior {} level {:?} moved too far",
                            prior,
                            level
                        );
                    }
                    for correct in [true, false] {
                        let evidence = QuizEvidence::new(correct, 0);
                        let updated = s.update_from_quiz(&c, &evidence, t0());
                        assert!(
                            (updated.confidence - decayed).abs() <= s.max_daily_delta() + 1e-12
                        );
                    }
                }
            }
        }

        #[test]
        fn updates_stay_within_bounds() {
            let s = DampenedBayesianStrategy::default();
            for prior in [0.0, 0.02, 0.5, 0.999, 1.0] {
                for level in ConfidenceLevel::ALL {
                    let evidence = FlashcardEvidence::new(level, 0);
                    let updated = s.update_from_flashcard(&concept(prior, None), &evidence, t0());
                    assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&updated.confidence));
                }
            }
        }

        #[test]
        fn inertia_blends_before_capping() {
            // 0.3 prior, known well: posterior 0.6316, blended 0.3 * 0.8 + 0.6316 * 0.2 = 0.3663,
            // delta 0.0663 is under the cap.
            let s = DampenedBayesianStrategy::default();
            let evidence = FlashcardEvidence::new(ConfidenceLevel::KnownWell, 0);
            let updated = s.update_from_flashcard(&concept(0.3, None), &evidence, t0());
            let expected = 0.3 * 0.8 + (0.24 / 0.38) * 0.2;
            assert!((updated.confidence - expected).abs() < 1e-12);
        }

        #[test]
        fn large_jump_is_capped() {
            let s = DampenedBayesianStrategy::new(0.95, 0.0, 0.08);
            let evidence = QuizEvidence::new(true, 0);
            let updated = s.update_from_quiz(&concept(0.3, None), &evidence, t0());
            assert!((updated.confidence - 0.38).abs() < 1e-12);
        }

        #[test]
        fn single_miss_after_mastery_is_gentle() {
            let s = DampenedBayesianStrategy::new(0.95, 0.0, 1.0);
            let miss = QuizEvidence::new(false, 0);

            let expert = s.update_from_quiz(&concept(0.9, None), &miss, t0());
            assert!((expert.confidence - bayesian_update(0.9, QUIZ_SLIP_LIKELIHOOD)).abs() < 1e-12);

            let novice = s.update_from_quiz(&concept(0.5, None), &miss, t0());
            assert!(
                (novice.confidence - bayesian_update(0.5, QUIZ_INCORRECT_LIKELIHOOD)).abs() < 1e-12
            );
        }

        #[test]
        fn sets_review_time() {
            let s = DampenedBayesianStrategy::default();
            let updated =
                s.update_from_quiz(&concept(0.5, None), &QuizEvidence::new(true, 0), t0());
            assert_eq!(updated.last_reviewed_at, Some(t0()));
        }
    }

    mod decay_tests {
        use super::*;

        #[test]
        fn mastered_concepts_decay_at_half_speed() {
            let s = DampenedBayesianStrategy::default();
            let later = t0() + Duration::days(4);

            let strong = s.apply_decay(&concept(0.9, Some(t0())), later);
            assert!((strong.confidence - 0.9 * 0.95_f64.powf(2.0)).abs() < 1e-12);

            let weak = s.apply_decay(&concept(0.6, Some(t0())), later);
            assert!((weak.confidence - 0.6 * 0.95_f64.powf(4.0)).abs() < 1e-12);
        }

        #[test]
        fn decay_floors_at_minimum() {
            let s = DampenedBayesianStrategy::default();
            let decayed = s.apply_decay(&concept(0.1, Some(t0())), t0() + Duration::days(365));
            assert_eq!(decayed.confidence, MIN_CONFIDENCE);
        }

        #[test]
        fn decay_is_a_noop_without_elapsed_time() {
            let s = DampenedBayesianStrategy::default();
            let unreviewed = concept(0.4, None);
            assert_eq!(s.apply_decay(&unreviewed, t0()), unreviewed);
            let reviewed = concept(0.4, Some(t0()));
            assert_eq!(s.apply_decay(&reviewed, t0() - Duration::hours(3)), reviewed);
        }

        #[test]
        fn decay_is_non_increasing_over_time() {
            let s = DampenedBayesianStrategy::default();
            for start in PRIORS {
                let c = concept(start, Some(t0()));
                let mut previous = c.confidence;
                for day in 0..120 {
                    let value = s.apply_decay(&c, t0() + Duration::days(day)).confidence;
                    assert!(value <= previous + 1e-15);
                    previous = value;
                }
            }
        }
    }
}
