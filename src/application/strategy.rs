//! Model strategies: how the reasoning engine is asked to score.
//!
//! Each [`ModelType`] maps to one strategy. The strategy only shapes the
//! reasoning script; the batch contract is the same for both.

use crate::domain::{CohortConfig, ImbalanceStrategy, ModelType};

/// A scoring strategy selectable by `ModelType`.
pub trait ModelStrategy: Send + Sync {
    fn model_type(&self) -> ModelType;

    /// Reasoning instructions embedded in the scoring prompt.
    fn script(&self) -> String;
}

/// Decision-tree style reasoning with an imbalance-aware posture.
#[derive(Debug, Clone, Copy)]
pub struct TreeEnsembleStrategy {
    pub imbalance: ImbalanceStrategy,
}

impl TreeEnsembleStrategy {
    fn imbalance_posture(&self) -> &'static str {
        match self.imbalance {
            ImbalanceStrategy::ClassWeights => {
                "Progression events are the minority class. Weight them up: when evidence is \
                 mixed, lean toward flagging risk rather than dismissing it."
            }
            ImbalanceStrategy::Smote => {
                "Progression events are the minority class. Be sensitive to borderline \
                 subjects whose features resemble known progressors even if no single \
                 feature is extreme."
            }
            ImbalanceStrategy::None => "Apply no class-imbalance adjustment.",
        }
    }
}

impl ModelStrategy for TreeEnsembleStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::TreeEnsembleSimulated
    }

    fn script(&self) -> String {
        format!(
            "Act as a gradient-boosted decision tree ensemble. Split on the features in \
             order of information gain (months on current therapy, therapy line, age, \
             provider). Focus on non-linear interactions between features, for example \
             long time on therapy combined with an early line, rather than additive \
             effects. {}",
            self.imbalance_posture()
        )
    }
}

/// Guideline-based clinical reasoning.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClinicalReasoningStrategy;

impl ModelStrategy for ClinicalReasoningStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::ReasoningEngine
    }

    fn script(&self) -> String {
        "Reason like an oncologist applying current treatment guidelines. Consider expected \
         duration of response for the current line, typical progression timelines for the \
         disease and how time on therapy compares with the lookback window."
            .to_string()
    }
}

/// Select the strategy for a cohort configuration.
#[must_use]
pub fn strategy_for(config: &CohortConfig) -> Box<dyn ModelStrategy> {
    match config.model_type {
        ModelType::TreeEnsembleSimulated => Box::new(TreeEnsembleStrategy {
            imbalance: config.imbalance_strategy,
        }),
        ModelType::ReasoningEngine => Box::new(ClinicalReasoningStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_follows_model_type() {
        let tree = strategy_for(&CohortConfig::default());
        assert_eq!(tree.model_type(), ModelType::TreeEnsembleSimulated);

        let clinical = strategy_for(&CohortConfig {
            model_type: ModelType::ReasoningEngine,
            ..Default::default()
        });
        assert_eq!(clinical.model_type(), ModelType::ReasoningEngine);
        assert!(clinical.script().contains("guidelines"));
    }

    #[test]
    fn test_imbalance_posture_in_script() {
        let script = |imbalance| TreeEnsembleStrategy { imbalance }.script();

        assert!(script(ImbalanceStrategy::ClassWeights).contains("lean toward flagging risk"));
        assert!(script(ImbalanceStrategy::Smote).contains("borderline"));
        assert!(script(ImbalanceStrategy::None).contains("no class-imbalance adjustment"));
        assert!(script(ImbalanceStrategy::None).contains("non-linear interactions"));
    }
}
