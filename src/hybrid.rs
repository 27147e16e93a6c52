//! Hybrid decision engine
//!
//! Reconciles the probabilistic classifier's output with the deterministic
//! rules engine. The combine method decides who wins when they disagree;
//! the default is conservative, taking the more pessimistic view.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifier::RiskLevel;
use crate::config::{CombineMethod, RulesEngineConfig};
use crate::errors::{CdssError, CdssResult};
use crate::rules::{ClinicalRulesEngine, RuleSeverity, RulesReport};
use crate::types::PatientData;

/// Combined assessment from the model and the rules engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridDecision {
    pub ml_level: RiskLevel,
    pub ml_score: f64,
    pub rules: RulesReport,
    pub final_level: RiskLevel,
    pub final_score: f64,
    pub rationale: String,
    /// Disagreements between the model and the rules worth surfacing
    pub conflicts: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Combines ML predictions with rule-based safety checks
#[derive(Debug, Clone, Default)]
pub struct HybridDecisionEngine {
    rules_engine: ClinicalRulesEngine,
    method: CombineMethod,
}

impl HybridDecisionEngine {
    pub fn new(config: &RulesEngineConfig) -> Self {
        Self {
            rules_engine: ClinicalRulesEngine::new(config.categories),
            method: config.combine_method,
        }
    }

    /// Run the safety rules and fold them into the model's prediction
    pub fn decide(
        &self,
        patient: &PatientData,
        ml_level: RiskLevel,
        ml_score: f64,
    ) -> CdssResult<HybridDecision> {
        if !ml_score.is_finite() || !(0.0..=1.0).contains(&ml_score) {
            return Err(CdssError::invalid_input(format!(
                "ML risk score {ml_score} is not a probability in [0, 1]"
            )));
        }

        let rules = self.rules_engine.run_all_checks(patient);
        let conflicts = detect_conflicts(ml_level, &rules);
        let (final_level, final_score, rationale) =
            combine(self.method, ml_level, ml_score, &rules);
        let recommendations = build_recommendations(ml_level, &rules, &conflicts);

        info!(
            ml_level = %ml_level,
            final_level = %final_level,
            method = ?self.method,
            conflicts = conflicts.len(),
            "hybrid decision made"
        );

        Ok(HybridDecision {
            ml_level,
            ml_score,
            rules,
            final_level,
            final_score,
            rationale,
            conflicts,
            recommendations,
        })
    }
}

fn rules_adjustment(rules: &RulesReport) -> f64 {
    if rules.has_critical {
        0.4
    } else if rules.has_warnings {
        0.2
    } else if !rules.violations.is_empty() {
        0.1
    } else {
        0.0
    }
}

fn detect_conflicts(ml_level: RiskLevel, rules: &RulesReport) -> Vec<String> {
    let mut conflicts = Vec::new();
    if ml_level == RiskLevel::Low && rules.has_critical {
        conflicts.push(
            "ML predicts low risk but critical safety violations were detected".to_string(),
        );
    }
    if ml_level == RiskLevel::High && rules.violations.is_empty() {
        conflicts.push("ML predicts high risk but no rule violations were found".to_string());
    }
    conflicts
}

fn combine(
    method: CombineMethod,
    ml_level: RiskLevel,
    ml_score: f64,
    rules: &RulesReport,
) -> (RiskLevel, f64, String) {
    let adjustment = rules_adjustment(rules);
    match method {
        CombineMethod::Conservative => {
            if rules.has_critical {
                (
                    RiskLevel::High,
                    ml_score.max(0.8),
                    "Risk elevated due to critical rule violations".to_string(),
                )
            } else if rules.has_warnings && ml_level == RiskLevel::Low {
                (
                    RiskLevel::Medium,
                    (ml_score + adjustment).max(0.4),
                    "Risk elevated due to safety warnings".to_string(),
                )
            } else {
                (
                    ml_level,
                    (ml_score + adjustment).min(1.0),
                    "ML prediction with safety rule adjustments".to_string(),
                )
            }
        }
        CombineMethod::Liberal => {
            if rules.has_critical {
                (
                    ml_level.max(RiskLevel::High),
                    ml_score.max(0.7),
                    "Risk elevated for critical violations only".to_string(),
                )
            } else {
                (
                    ml_level,
                    ml_score,
                    "ML prediction (no critical rule violations)".to_string(),
                )
            }
        }
        CombineMethod::MlPriority => {
            let rationale = if rules.violations.is_empty() {
                "ML prediction (rules passed)".to_string()
            } else {
                format!(
                    "ML prediction with {} advisory finding(s)",
                    rules.violations.len()
                )
            };
            (ml_level, ml_score, rationale)
        }
    }
}

fn build_recommendations(
    ml_level: RiskLevel,
    rules: &RulesReport,
    conflicts: &[String],
) -> Vec<String> {
    let mut recommendations = Vec::new();
    for violation in &rules.violations {
        if matches!(violation.severity, RuleSeverity::Critical | RuleSeverity::Warning) {
            recommendations.push(violation.recommendation.clone());
        }
    }
    if !conflicts.is_empty() {
        recommendations
            .push("Review discrepancy between ML prediction and clinical rules".to_string());
    }
    if ml_level == RiskLevel::High {
        recommendations.push("Perform comprehensive clinical review".to_string());
    }
    // Deduplicate while keeping first-seen order
    let mut seen = std::collections::HashSet::new();
    recommendations.retain(|r| seen.insert(r.clone()));
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gender, VitalSigns};
    use std::collections::BTreeSet;

    fn patient() -> PatientData {
        PatientData {
            age: 50,
            gender: Gender::Female,
            vitals: VitalSigns::default(),
            symptoms: BTreeSet::new(),
            conditions: BTreeSet::new(),
            medications: vec![],
            allergies: vec![],
            recent_hospitalization: false,
            limited_mobility: false,
        }
    }

    fn engine(method: CombineMethod) -> HybridDecisionEngine {
        HybridDecisionEngine::new(&RulesEngineConfig {
            combine_method: method,
            ..Default::default()
        })
    }

    #[test]
    fn conservative_elevates_low_ml_on_critical_violation() {
        let mut patient = patient();
        patient.medications = vec!["warfarin".into(), "aspirin".into()];
        let decision = engine(CombineMethod::Conservative)
            .decide(&patient, RiskLevel::Low, 0.1)
            .unwrap();
        assert_eq!(decision.final_level, RiskLevel::High);
        assert!(decision.final_score >= 0.8);
        assert_eq!(decision.conflicts.len(), 1);
    }

    #[test]
    fn conservative_lifts_low_to_medium_on_warning() {
        let mut patient = patient();
        patient.age = 80;
        patient.medications = vec!["lorazepam".into()];
        let decision = engine(CombineMethod::Conservative)
            .decide(&patient, RiskLevel::Low, 0.1)
            .unwrap();
        assert_eq!(decision.final_level, RiskLevel::Medium);
        assert!(decision.final_score >= 0.4);
    }

    #[test]
    fn conservative_keeps_ml_level_when_rules_pass() {
        let decision = engine(CombineMethod::Conservative)
            .decide(&patient(), RiskLevel::Medium, 0.5)
            .unwrap();
        assert_eq!(decision.final_level, RiskLevel::Medium);
        assert_eq!(decision.final_score, 0.5);
        assert!(decision.conflicts.is_empty());
    }

    #[test]
    fn liberal_ignores_warnings() {
        let mut patient = patient();
        patient.age = 80;
        patient.medications = vec!["lorazepam".into()];
        let decision = engine(CombineMethod::Liberal)
            .decide(&patient, RiskLevel::Low, 0.1)
            .unwrap();
        assert_eq!(decision.final_level, RiskLevel::Low);
        assert_eq!(decision.final_score, 0.1);
    }

    #[test]
    fn liberal_still_elevates_on_critical() {
        let mut patient = patient();
        patient.vitals.oxygen_saturation = 80.0;
        let decision = engine(CombineMethod::Liberal)
            .decide(&patient, RiskLevel::Medium, 0.5)
            .unwrap();
        assert_eq!(decision.final_level, RiskLevel::High);
        assert!(decision.final_score >= 0.7);
    }

    #[test]
    fn ml_priority_treats_rules_as_advisory() {
        let mut patient = patient();
        patient.medications = vec!["warfarin".into(), "aspirin".into()];
        let decision = engine(CombineMethod::MlPriority)
            .decide(&patient, RiskLevel::Low, 0.2)
            .unwrap();
        assert_eq!(decision.final_level, RiskLevel::Low);
        assert_eq!(decision.final_score, 0.2);
        assert!(decision.rationale.contains("advisory"));
    }

    #[test]
    fn high_ml_with_clean_rules_is_a_conflict() {
        let decision = engine(CombineMethod::Conservative)
            .decide(&patient(), RiskLevel::High, 0.9)
            .unwrap();
        assert_eq!(decision.conflicts.len(), 1);
        assert!(decision
            .recommendations
            .iter()
            .any(|r| r.contains("discrepancy")));
    }

    #[test]
    fn invalid_ml_score_is_rejected() {
        for score in [-0.1, 1.1, f64::NAN] {
            let result = engine(CombineMethod::Conservative).decide(
                &patient(),
                RiskLevel::Medium,
                score,
            );
            assert!(matches!(result, Err(CdssError::InvalidInput { .. })));
        }
    }

    #[test]
    fn recommendations_are_deduplicated() {
        let mut patient = patient();
        patient.conditions.insert(crate::types::Condition::KidneyDisease);
        patient.conditions.insert(crate::types::Condition::HeartDisease);
        // ibuprofen violates both contraindications with identical advice text
        // only for the kidney entry; the two recommendations differ, but the
        // elderly NSAID warning repeats across matches
        patient.age = 70;
        patient.medications = vec!["ibuprofen".into(), "naproxen".into()];
        let decision = engine(CombineMethod::Conservative)
            .decide(&patient, RiskLevel::Medium, 0.5)
            .unwrap();
        let mut sorted = decision.recommendations.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), decision.recommendations.len());
    }
}
