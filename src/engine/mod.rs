//! Confidence tracking engine.
//!
//! A strategy maps `(concept, evidence, now)` to an updated concept. Every update first
//! decays the stored confidence for the time elapsed since the last review, then fuses the
//! evidence with a Bayesian update:
//!
//! ```text
//! posterior = (prior * L) / (prior * L + (1 - prior) * (1 - L))
//! ```
//!
//! where `L` is the probability of observing the evidence if the concept is mastered.
//! Likelihood tables never contain 0 or 1, so the denominator stays positive.
//!
//! Strategies are pure: they never touch storage and return new values.

mod bayesian;
mod dampened;
mod learning;

use chrono::{DateTime, Utc};

use crate::models::{Concept, FlashcardEvidence, QuizEvidence};

pub use bayesian::BayesianStrategy;
pub use dampened::DampenedBayesianStrategy;
pub use learning::LearningEngine;

pub const DEFAULT_DECAY_RATE: f64 = 0.95;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub trait ConfidenceUpdateStrategy {
    fn update_from_flashcard(
        &self,
        concept: &Concept,
        evidence: &FlashcardEvidence,
        now: DateTime<Utc>,
    ) -> Concept;

    fn update_from_quiz(
        &self,
        concept: &Concept,
        evidence: &QuizEvidence,
        now: DateTime<Utc>,
    ) -> Concept;

    /// Time decay only. A no-op for never-reviewed concepts and for `now` at or before the
    /// last review.
    fn apply_decay(&self, concept: &Concept, now: DateTime<Utc>) -> Concept;

    /// Inclusive range every updated confidence is clamped into.
    fn bounds(&self) -> (f64, f64);
}

/// The two shipped update strategies, chosen once when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Bayesian(BayesianStrategy),
    Dampened(DampenedBayesianStrategy),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Bayesian(_) => "baseline",
            Strategy::Dampened(_) => "dampened",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Dampened(DampenedBayesianStrategy::default())
    }
}

impl ConfidenceUpdateStrategy for Strategy {
    fn update_from_flashcard(
        &self,
        concept: &Concept,
        evidence: &FlashcardEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        match self {
            Strategy::Bayesian(s) => s.update_from_flashcard(concept, evidence, now),
            Strategy::Dampened(s) => s.update_from_flashcard(concept, evidence, now),
        }
    }

    fn update_from_quiz(
        &self,
        concept: &Concept,
        evidence: &QuizEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        match self {
            Strategy::Bayesian(s) => s.update_from_quiz(concept, evidence, now),
            Strategy::Dampened(s) => s.update_from_quiz(concept, evidence, now),
        }
    }

    fn apply_decay(&self, concept: &Concept, now: DateTime<Utc>) -> Concept {
        match self {
            Strategy::Bayesian(s) => s.apply_decay(concept, now),
            Strategy::Dampened(s) => s.apply_decay(concept, now),
        }
    }

    fn bounds(&self) -> (f64, f64) {
        match self {
            Strategy::Bayesian(s) => s.bounds(),
            Strategy::Dampened(s) => s.bounds(),
        }
    }
}

/// Fractional days since the last review, or `None` when there is nothing to decay.
pub(crate) fn days_since_review(concept: &Concept, now: DateTime<Utc>) -> Option<f64> {
    let last = concept.last_reviewed_at?;
    let days = (now - last).num_milliseconds() as f64 / MILLIS_PER_DAY;
    (days > 0.0).then_some(days)
}

pub(crate) fn bayesian_update(prior: f64, likelihood: f64) -> f64 {
    let numerator = prior * likelihood;
    let denominator = numerator + (1.0 - prior) * (1.0 - likelihood);
    if denominator > 0.0 {
        numerator / denominator
    } else {
        prior
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn concept(confidence: f64, last: Option<DateTime<Utc>>) -> Concept {
        let mut c = Concept::new(Uuid::new_v4(), "Krebs cycle", None).unwrap();
        c.confidence = confidence;
        c.last_reviewed_at = last;
        c
    }

    #[test]
    fn bayesian_update_matches_hand_computation() {
        let posterior = bayesian_update(0.3, 0.8);
        assert!((posterior - 0.24 / 0.38).abs() < 1e-12);
    }

    #[test]
    fn neutral_likelihood_keeps_prior() {
        for prior in [0.05, 0.3, 0.5, 0.9] {
            assert!((bayesian_update(prior, 0.5) - prior).abs() < 1e-12);
        }
    }

    #[test]
    fn boundary_priors_do_not_produce_nan() {
        for prior in [0.0, 1.0] {
            for l in [0.0, 0.1, 0.5, 0.95, 1.0] {
                assert!(bayesian_update(prior, l).is_finite());
            }
        }
    }

    #[test]
    fn degenerate_denominator_returns_prior() {
        assert_eq!(bayesian_update(0.0, 1.0), 0.0);
    }

    #[test]
    fn days_since_review_skips_unreviewed_and_future() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(days_since_review(&concept(0.5, None), t0).is_none());
        assert!(days_since_review(&concept(0.5, Some(t0)), t0).is_none());
        assert!(days_since_review(&concept(0.5, Some(t0)), t0 - Duration::hours(1)).is_none());
        let days = days_since_review(&concept(0.5, Some(t0)), t0 + Duration::hours(36)).unwrap();
        assert!((days - 1.5).abs() < 1e-12);
    }

    #[test]
    fn strategy_enum_dispatches_to_variant() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let c = concept(0.3, None);
        let evidence = QuizEvidence::new(true, 0);

        let baseline = Strategy::Bayesian(BayesianStrategy::default());
        let direct = BayesianStrategy::default().update_from_quiz(&c, &evidence, t0);
        assert_eq!(baseline.update_from_quiz(&c, &evidence, t0), direct);
        assert_eq!(baseline.name(), "baseline");
        assert_eq!(baseline.bounds(), (0.01, 0.99));

        let dampened = Strategy::default();
        assert_eq!(dampened.name(), "dampened");
        assert_eq!(dampened.bounds(), (0.05, 0.995));
    }
}
