//! Unified multi-risk engine
//!
//! Scores four categories of clinical risk from one patient record:
//! medication error, disease progression, adverse event, and hospital
//! readmission. Each scorer is an additive heuristic over documented
//! factors, capped at 1.0; the per-category scores are folded into an
//! overall assessment by a configurable aggregation method.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::RiskLevel;
use crate::config::{AggregationMethod, MultiRiskConfig, RiskThresholds, RiskTypeConfig};
use crate::errors::CdssResult;
use crate::rules::match_interactions;
use crate::types::{Condition, PatientData, Symptom, Vital};

/// Categories of risk the engine scores
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    MedicationError,
    DiseaseProgression,
    AdverseEvent,
    HospitalReadmission,
}

impl RiskType {
    pub const ALL: [RiskType; 4] = [
        RiskType::MedicationError,
        RiskType::DiseaseProgression,
        RiskType::AdverseEvent,
        RiskType::HospitalReadmission,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            RiskType::MedicationError => "Medication Error Risk",
            RiskType::DiseaseProgression => "Disease Progression Risk",
            RiskType::AdverseEvent => "Adverse Event Risk",
            RiskType::HospitalReadmission => "Hospital Readmission Risk",
        }
    }
}

/// Score for a single risk category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub risk_type: RiskType,
    pub score: f64,
    pub level: RiskLevel,
    /// Heuristic confidence in this scorer, fixed per category
    pub confidence: f64,
    pub contributing_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Combined assessment across all enabled risk categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRiskAssessment {
    pub patient_id: Option<String>,
    pub assessed_at: DateTime<Utc>,
    pub overall_score: f64,
    pub overall_level: RiskLevel,
    pub results: Vec<RiskResult>,
    /// Category with the highest raw score, if any category was enabled
    pub highest_risk: Option<RiskType>,
    pub summary: String,
    pub requires_immediate_attention: bool,
}

impl MultiRiskAssessment {
    pub fn result_for(&self, risk_type: RiskType) -> Option<&RiskResult> {
        self.results.iter().find(|r| r.risk_type == risk_type)
    }

    /// Recommendations across all categories, deduplicated in order
    pub fn all_recommendations(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.results
            .iter()
            .flat_map(|r| r.recommendations.iter())
            .filter(|r| seen.insert(r.as_str().to_string()))
            .cloned()
            .collect()
    }
}

/// Scores all enabled risk categories for a patient encounter
#[derive(Debug, Clone)]
pub struct MultiRiskEngine {
    config: MultiRiskConfig,
    thresholds: RiskThresholds,
}

impl MultiRiskEngine {
    pub fn new(config: MultiRiskConfig, thresholds: RiskThresholds) -> CdssResult<Self> {
        config.validate()?;
        thresholds.validate()?;
        Ok(Self { config, thresholds })
    }

    fn type_config(&self, risk_type: RiskType) -> &RiskTypeConfig {
        match risk_type {
            RiskType::MedicationError => &self.config.medication_error,
            RiskType::DiseaseProgression => &self.config.disease_progression,
            RiskType::AdverseEvent => &self.config.adverse_event,
            RiskType::HospitalReadmission => &self.config.hospital_readmission,
        }
    }

    /// Run every enabled scorer and aggregate into one assessment
    pub fn assess(&self, patient: &PatientData, patient_id: Option<&str>) -> MultiRiskAssessment {
        self.assess_at(patient, patient_id, Utc::now())
    }

    pub fn assess_at(
        &self,
        patient: &PatientData,
        patient_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> MultiRiskAssessment {
        let mut results = Vec::new();
        for risk_type in RiskType::ALL {
            if !self.type_config(risk_type).enabled {
                continue;
            }
            let result = match risk_type {
                RiskType::MedicationError => self.medication_error_risk(patient),
                RiskType::DiseaseProgression => self.disease_progression_risk(patient),
                RiskType::AdverseEvent => self.adverse_event_risk(patient),
                RiskType::HospitalReadmission => self.readmission_risk(patient),
            };
            results.push(result);
        }

        let overall_score = self.aggregate(&results);
        let overall_level = self.thresholds.level_for(overall_score);
        let highest_risk = results
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|r| r.risk_type);
        let requires_immediate_attention =
            results.iter().any(|r| r.level == RiskLevel::High);
        let summary = summarize(&results);
        debug!(overall_score, overall_level = %overall_level, "multi-risk assessment complete");

        MultiRiskAssessment {
            patient_id: patient_id.map(str::to_string),
            assessed_at: now,
            overall_score,
            overall_level,
            results,
            highest_risk,
            summary,
            requires_immediate_attention,
        }
    }

    fn aggregate(&self, results: &[RiskResult]) -> f64 {
        if results.is_empty() {
            return 0.0;
        }
        match self.config.aggregation {
            AggregationMethod::WeightedAverage => {
                let mut weighted_sum = 0.0;
                let mut total_weight = 0.0;
                for result in results {
                    let weight = self.type_config(result.risk_type).weight;
                    weighted_sum += result.score * weight;
                    total_weight += weight;
                }
                if total_weight > 0.0 {
                    weighted_sum / total_weight
                } else {
                    0.0
                }
            }
            AggregationMethod::WeightedMax => results
                .iter()
                .map(|r| {
                    let weight = self.type_config(r.risk_type).weight;
                    r.score * (1.0 + weight * 0.5)
                })
                .fold(0.0, f64::max)
                .min(1.0),
            AggregationMethod::Highest => {
                results.iter().map(|r| r.score).fold(0.0, f64::max)
            }
        }
    }

    fn result(
        &self,
        risk_type: RiskType,
        score: f64,
        confidence: f64,
        factors: Vec<String>,
    ) -> RiskResult {
        let score = score.min(1.0);
        let level = self.thresholds.level_for(score);
        RiskResult {
            risk_type,
            score,
            level,
            confidence,
            recommendations: recommendations_for(risk_type, level),
            contributing_factors: factors,
        }
    }

    /// Polypharmacy, interactions, age, and high-risk agents
    fn medication_error_risk(&self, patient: &PatientData) -> RiskResult {
        let mut score = 0.0;
        let mut factors = Vec::new();

        let num_meds = patient.medications.len();
        if num_meds >= 10 {
            score += 0.35;
            factors.push(format!("High polypharmacy ({num_meds} medications)"));
        } else if num_meds >= 5 {
            score += 0.20;
            factors.push(format!("Moderate polypharmacy ({num_meds} medications)"));
        } else if num_meds >= 3 {
            score += 0.10;
            factors.push(format!("Multiple medications ({num_meds})"));
        }

        let interactions = match_interactions(patient);
        if !interactions.severe.is_empty() {
            score += 0.40;
            for effect in &interactions.severe {
                factors.push(format!("Severe interaction: {effect}"));
            }
        }
        if !interactions.moderate.is_empty() {
            score += 0.20;
            for effect in &interactions.moderate {
                factors.push(format!("Moderate interaction: {effect}"));
            }
        }

        if patient.age >= 75 {
            score += 0.15;
            factors.push("Advanced age increases medication error risk".to_string());
        } else if patient.age >= 65 {
            score += 0.10;
            factors.push("Elderly patient, monitor medication closely".to_string());
        }

        const HIGH_RISK_MEDS: [&str; 5] =
            ["warfarin", "insulin", "opioid", "digoxin", "methotrexate"];
        let present: Vec<&str> = HIGH_RISK_MEDS
            .iter()
            .copied()
            .filter(|m| patient.takes_medication(m))
            .collect();
        if !present.is_empty() {
            score += 0.15;
            factors.push(format!("High-risk medications present: {}", present.join(", ")));
        }

        self.result(RiskType::MedicationError, score, 0.75, factors)
    }

    /// Vitals deviations, symptom burden, conditions, and age
    fn disease_progression_risk(&self, patient: &PatientData) -> RiskResult {
        let mut score = 0.0;
        let mut factors = Vec::new();

        let (vitals_risk, vital_factors) = assess_vitals(patient);
        score += vitals_risk;
        factors.extend(vital_factors);

        let symptom_count = patient.symptoms.len();
        if symptom_count >= 5 {
            score += 0.25;
            factors.push(format!("Multiple symptoms present ({symptom_count})"));
        } else if symptom_count >= 3 {
            score += 0.15;
            factors.push(format!("Several symptoms present ({symptom_count})"));
        }

        for symptom in Symptom::CRITICAL {
            if patient.has_symptom(symptom) {
                score += 0.15;
                factors.push(format!("Critical symptom: {}", symptom.label()));
            }
        }

        let mut conditions_risk: f64 = 0.0;
        for condition in &patient.conditions {
            conditions_risk += 0.08;
            factors.push(format!("Existing condition: {}", condition.label()));
        }
        score += conditions_risk.min(0.30);

        if patient.age >= 75 {
            score += 0.15;
            factors.push("Advanced age increases disease progression risk".to_string());
        } else if patient.age >= 65 {
            score += 0.10;
        }

        self.result(RiskType::DiseaseProgression, score, 0.80, factors)
    }

    /// Allergies, critical vitals, interactions, and adverse-event symptoms
    fn adverse_event_risk(&self, patient: &PatientData) -> RiskResult {
        let mut score = 0.0;
        let mut factors = Vec::new();

        let allergy_count = patient.allergies.len();
        if allergy_count >= 3 {
            score += 0.20;
            factors.push(format!("Multiple allergies ({allergy_count})"));
        } else if allergy_count > 0 {
            score += 0.10;
            factors.push(format!(
                "Known allergies: {}",
                patient.allergies.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
            ));
        }

        let critical_vitals = critical_vital_findings(patient);
        if !critical_vitals.is_empty() {
            score += 0.35;
            factors.extend(critical_vitals);
        }

        let interactions = match_interactions(patient);
        if !interactions.severe.is_empty() {
            score += 0.30;
            factors.push("Severe drug interactions present".to_string());
        }

        const ADVERSE_SYMPTOMS: [Symptom; 4] = [
            Symptom::Nausea,
            Symptom::Vomiting,
            Symptom::Dizziness,
            Symptom::Confusion,
        ];
        let adverse_present = ADVERSE_SYMPTOMS
            .iter()
            .filter(|s| patient.symptoms.contains(s))
            .count();
        if adverse_present >= 2 {
            score += 0.20;
            factors.push(format!("Multiple adverse event indicators ({adverse_present})"));
        } else if adverse_present >= 1 {
            score += 0.10;
        }

        self.result(RiskType::AdverseEvent, score, 0.70, factors)
    }

    /// Chronic conditions, age, polypharmacy, and discharge-related flags
    fn readmission_risk(&self, patient: &PatientData) -> RiskResult {
        let mut score = 0.0;
        let mut factors = Vec::new();

        let chronic_count = Condition::CHRONIC
            .iter()
            .filter(|c| patient.conditions.contains(c))
            .count();
        if chronic_count >= 3 {
            score += 0.35;
            factors.push(format!("Multiple chronic conditions ({chronic_count})"));
        } else if chronic_count == 2 {
            score += 0.25;
            factors.push("Two chronic conditions".to_string());
        } else if chronic_count == 1 {
            score += 0.15;
            factors.push("One chronic condition".to_string());
        }

        if patient.age >= 80 {
            score += 0.20;
            factors.push("Age 80+ significantly increases readmission risk".to_string());
        } else if patient.age >= 70 {
            score += 0.15;
            factors.push("Age 70+ increases readmission risk".to_string());
        } else if patient.age >= 65 {
            score += 0.10;
        }

        let num_meds = patient.medications.len();
        if num_meds >= 8 {
            score += 0.15;
            factors.push(format!("Polypharmacy ({num_meds} medications)"));
        } else if num_meds >= 5 {
            score += 0.10;
        }

        if patient.recent_hospitalization {
            score += 0.25;
            factors.push("Recent hospitalization within 30 days".to_string());
        }

        if patient.has_condition(Condition::HeartDisease) {
            score += 0.10;
            factors.push("Heart disease increases readmission risk".to_string());
        }

        if patient.limited_mobility {
            score += 0.15;
            factors.push("Limited mobility".to_string());
        }

        self.result(RiskType::HospitalReadmission, score, 0.75, factors)
    }
}

// Surveillance bands for progression scoring, wider than the healthy
// reference ranges so mild deviations do not dominate the score
fn surveillance_range(vital: Vital) -> Option<(f64, f64)> {
    match vital {
        Vital::HeartRate => Some((60.0, 100.0)),
        Vital::SystolicBp => Some((90.0, 140.0)),
        Vital::DiastolicBp => Some((60.0, 90.0)),
        Vital::Temperature => Some((36.1, 37.5)),
        Vital::RespiratoryRate => Some((12.0, 20.0)),
        Vital::OxygenSaturation => Some((95.0, 100.0)),
        Vital::BloodSugar => None,
    }
}

fn assess_vitals(patient: &PatientData) -> (f64, Vec<String>) {
    let mut risk = 0.0;
    let mut factors = Vec::new();

    for reading in patient.vitals.readings() {
        let Some((low, high)) = surveillance_range(reading.vital) else {
            continue;
        };
        if reading.value < low {
            risk += 0.10;
            factors.push(format!("Low {}: {}", reading.vital.label(), reading.value));
        } else if reading.value > high {
            risk += 0.10;
            factors.push(format!("Elevated {}: {}", reading.vital.label(), reading.value));
        }
    }

    // Hypoxia carries extra weight
    if patient.vitals.oxygen_saturation < 92.0 {
        risk += 0.15;
    }

    (risk, factors)
}

fn critical_vital_findings(patient: &PatientData) -> Vec<String> {
    let mut findings = Vec::new();
    for reading in patient.vitals.readings() {
        let (low, high) = reading.vital.critical_range();
        if reading.value < low {
            findings.push(format!(
                "CRITICAL: {} = {} (below {})",
                reading.vital.label(),
                reading.value,
                low
            ));
        } else if reading.value > high {
            findings.push(format!(
                "CRITICAL: {} = {} (above {})",
                reading.vital.label(),
                reading.value,
                high
            ));
        }
    }
    findings
}

fn recommendations_for(risk_type: RiskType, level: RiskLevel) -> Vec<String> {
    let items: &[&str] = match (risk_type, level) {
        (RiskType::MedicationError, RiskLevel::High) => &[
            "Perform comprehensive medication reconciliation",
            "Review for potential drug-drug interactions",
            "Consider clinical pharmacist consultation",
            "Implement enhanced medication monitoring",
            "Verify dosing for renal/hepatic function",
        ],
        (RiskType::MedicationError, RiskLevel::Medium) => &[
            "Review current medication list for accuracy",
            "Check for common drug interactions",
            "Verify patient understanding of medications",
            "Document any medication changes",
        ],
        (RiskType::MedicationError, RiskLevel::Low) => &[
            "Continue standard medication monitoring",
            "Ensure medication list is up to date",
        ],
        (RiskType::DiseaseProgression, RiskLevel::High) => &[
            "Increase monitoring frequency",
            "Consider additional diagnostic tests",
            "Review and optimize treatment plan",
            "Consult with specialist if needed",
            "Document all clinical findings",
        ],
        (RiskType::DiseaseProgression, RiskLevel::Medium) => &[
            "Monitor vital signs more frequently",
            "Review symptom progression",
            "Ensure treatment compliance",
            "Schedule follow-up assessment",
        ],
        (RiskType::DiseaseProgression, RiskLevel::Low) => &[
            "Continue current treatment plan",
            "Standard monitoring protocol",
        ],
        (RiskType::AdverseEvent, RiskLevel::High) => &[
            "Immediate review of current medications",
            "Check for drug-allergy interactions",
            "Monitor for adverse event symptoms",
            "Consider alternative medications",
            "Prepare for potential intervention",
        ],
        (RiskType::AdverseEvent, RiskLevel::Medium) => &[
            "Review allergy and medication lists",
            "Monitor for adverse reactions",
            "Document any new symptoms",
            "Consider dose adjustments",
        ],
        (RiskType::AdverseEvent, RiskLevel::Low) => &[
            "Maintain allergy awareness",
            "Standard adverse event monitoring",
        ],
        (RiskType::HospitalReadmission, RiskLevel::High) => &[
            "Develop comprehensive discharge plan",
            "Arrange early follow-up appointment (within 7 days)",
            "Consider home health services",
            "Ensure medication reconciliation at discharge",
            "Provide detailed patient education",
            "Coordinate with primary care provider",
        ],
        (RiskType::HospitalReadmission, RiskLevel::Medium) => &[
            "Schedule follow-up within 14 days",
            "Review discharge instructions thoroughly",
            "Provide contact information for questions",
            "Consider transitional care coordination",
        ],
        (RiskType::HospitalReadmission, RiskLevel::Low) => &[
            "Standard discharge planning",
            "Routine follow-up scheduling",
        ],
    };
    items.iter().map(|s| (*s).to_string()).collect()
}

fn summarize(results: &[RiskResult]) -> String {
    let names = |level: RiskLevel| -> Vec<&'static str> {
        results
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.risk_type.display_name())
            .collect()
    };

    let high = names(RiskLevel::High);
    if !high.is_empty() {
        return format!(
            "HIGH RISK: {}. Immediate clinical review recommended.",
            high.join(", ")
        );
    }
    let medium = names(RiskLevel::Medium);
    if !medium.is_empty() {
        return format!(
            "MODERATE RISK: {}. Enhanced monitoring recommended.",
            medium.join(", ")
        );
    }
    "LOW RISK across all categories. Continue standard care protocol.".to_string()
}
