use chrono::{DateTime, Utc};

use super::{BayesianStrategy, ConfidenceUpdateStrategy, DampenedBayesianStrategy, Strategy};
use crate::config::{EngineConfig, StrategyKind};
use crate::models::{Concept, FlashcardEvidence, QuizEvidence};

/// Applies evidence to concepts through one strategy fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LearningEngine {
    strategy: Strategy,
}

impl LearningEngine {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let strategy = match config.strategy {
            StrategyKind::Baseline => Strategy::Bayesian(BayesianStrategy::new(config.decay_rate)),
            StrategyKind::Dampened => Strategy::Dampened(DampenedBayesianStrategy::new(
                config.decay_rate,
                config.inertia,
                config.max_daily_delta,
            )),
        };
        Self::new(strategy)
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn apply_flashcard_evidence(
        &self,
        concept: &Concept,
        evidence: &FlashcardEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        self.strategy.update_from_flashcard(concept, evidence, now)
    }

    pub fn apply_quiz_evidence(
        &self,
        concept: &Concept,
        evidence: &QuizEvidence,
        now: DateTime<Utc>,
    ) -> Concept {
        self.strategy.update_from_quiz(concept, evidence, now)
    }

    /// Decayed confidence for display; the stored value is left alone.
    pub fn current_confidence(&self, concept: &Concept, now: DateTime<Utc>) -> f64 {
        self.strategy.apply_decay(concept, now).confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfidenceLevel;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 7, 0, 0).unwrap()
    }

    fn baseline_config() -> EngineConfig {
        EngineConfig {
            strategy: StrategyKind::Baseline,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn from_config_selects_strategy() {
        let engine = LearningEngine::from_config(&baseline_config());
        assert_eq!(engine.strategy().name(), "baseline");

        let engine = LearningEngine::from_config(&EngineConfig::default());
        assert_eq!(engine.strategy().name(), "dampened");
    }

    #[test]
    fn delegates_flashcard_and_quiz_evidence() {
        let engine = LearningEngine::from_config(&baseline_config());
        let concept = Concept::new(Uuid::new_v4(), "Photosynthesis", None).unwrap();

        let evidence = FlashcardEvidence::new(ConfidenceLevel::KnownWell, 0);
        let after_card = engine.apply_flashcard_evidence(&concept, &evidence, t0());
        assert!((after_card.confidence - 0.24 / 0.38).abs() < 1e-12);

        let after_quiz = engine.apply_quiz_evidence(&after_card, &QuizEvidence::new(false, 0), t0());
        assert!((after_quiz.confidence - 0.16).abs() < 1e-9);
    }

    #[test]
    fn current_confidence_does_not_mutate_the_concept() {
        let engine = LearningEngine::from_config(&baseline_config());
        let mut concept = Concept::new(Uuid::new_v4(), "Photosynthesis", None).unwrap();
        concept.confidence = 0.8;
        concept.last_reviewed_at = Some(t0());

        let shown = engine.current_confidence(&concept, t0() + Duration::days(2));
        assert!((shown - 0.8 * 0.95 * 0.95).abs() < 1e-12);
        assert_eq!(concept.confidence, 0.8);
    }

    #[test]
    fn config_parameters_reach_the_strategy() {
        let config = EngineConfig {
            decay_rate: 0.5,
            ..baseline_config()
        };
        let engine = LearningEngine::from_config(&config);
        let mut concept = Concept::new(Uuid::new_v4(), "Photosynthesis", None).unwrap();
        concept.confidence = 0.8;
        concept.last_reviewed_at = Some(t0());
        let shown = engine.current_confidence(&concept, t0() + Duration::days(1));
        assert!((shown - 0.4).abs() < 1e-12);
    }
}
