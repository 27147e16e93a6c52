//! Clinical rules engine
//!
//! Deterministic safety checks that run alongside the probabilistic
//! classifier: drug interactions, critical vitals, age-specific medication
//! safety, condition contraindications, and allergy risks. The built-in
//! tables are a simplified interaction set; a production deployment would
//! source them from RxNorm or an equivalent formulary service.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RuleCategories;
use crate::types::{Condition, PatientData};

/// Severity of a rule violation, ordered `Info < Caution < Warning < Critical`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Info,
    Caution,
    Warning,
    Critical,
}

/// Rule category a violation was raised by
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    DrugInteractions,
    VitalSignAlerts,
    AgeSafety,
    Contraindications,
    AllergyChecks,
}

impl RuleCategory {
    fn id_prefix(self) -> &'static str {
        match self {
            RuleCategory::DrugInteractions => "DRG",
            RuleCategory::VitalSignAlerts => "VIT",
            RuleCategory::AgeSafety => "AGE",
            RuleCategory::Contraindications => "CON",
            RuleCategory::AllergyChecks => "ALG",
        }
    }
}

/// One triggered safety rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub id: String,
    pub name: String,
    pub severity: RuleSeverity,
    pub category: RuleCategory,
    pub message: String,
    pub recommendation: String,
}

/// Result of running all enabled safety checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesReport {
    pub violations: Vec<RuleViolation>,
    pub passed_rules: usize,
    pub total_rules: usize,
    pub has_critical: bool,
    pub has_warnings: bool,
    pub summary: String,
}

impl RulesReport {
    pub fn pass_rate(&self) -> f64 {
        if self.total_rules == 0 {
            1.0
        } else {
            self.passed_rules as f64 / self.total_rules as f64
        }
    }

    pub fn by_severity(&self, severity: RuleSeverity) -> Vec<&RuleViolation> {
        self.violations.iter().filter(|v| v.severity == severity).collect()
    }

    pub fn by_category(&self, category: RuleCategory) -> Vec<&RuleViolation> {
        self.violations.iter().filter(|v| v.category == category).collect()
    }
}

struct DrugInteraction {
    drug_a: &'static str,
    drug_b: &'static str,
    effect: &'static str,
}

const SEVERE_INTERACTIONS: &[DrugInteraction] = &[
    DrugInteraction { drug_a: "warfarin", drug_b: "aspirin", effect: "Increased bleeding risk" },
    DrugInteraction { drug_a: "metformin", drug_b: "contrast dye", effect: "Lactic acidosis risk" },
    DrugInteraction { drug_a: "ssri", drug_b: "maoi", effect: "Serotonin syndrome risk" },
    DrugInteraction { drug_a: "digoxin", drug_b: "amiodarone", effect: "Digoxin toxicity" },
    DrugInteraction { drug_a: "lisinopril", drug_b: "potassium", effect: "Hyperkalemia risk" },
];

const MODERATE_INTERACTIONS: &[DrugInteraction] = &[
    DrugInteraction { drug_a: "ibuprofen", drug_b: "lisinopril", effect: "Reduced antihypertensive effect" },
    DrugInteraction { drug_a: "statin", drug_b: "grapefruit", effect: "Increased statin levels" },
    DrugInteraction { drug_a: "metformin", drug_b: "alcohol", effect: "Hypoglycemia risk" },
    DrugInteraction { drug_a: "antibiotic", drug_b: "antacid", effect: "Reduced antibiotic absorption" },
];

const MINOR_INTERACTIONS: &[DrugInteraction] = &[
    DrugInteraction { drug_a: "caffeine", drug_b: "ciprofloxacin", effect: "Increased caffeine effect" },
];

struct Contraindication {
    condition: Condition,
    drugs: &'static [&'static str],
    reason: &'static str,
}

const CONTRAINDICATIONS: &[Contraindication] = &[
    Contraindication {
        condition: Condition::KidneyDisease,
        drugs: &["nsaid", "ibuprofen", "naproxen", "metformin"],
        reason: "May worsen kidney function or cause toxicity",
    },
    Contraindication {
        condition: Condition::LiverDisease,
        drugs: &["acetaminophen", "statin"],
        reason: "Liver metabolism may be impaired",
    },
    Contraindication {
        condition: Condition::HeartDisease,
        drugs: &["nsaid", "ibuprofen"],
        reason: "May increase cardiovascular risk",
    },
    Contraindication {
        condition: Condition::Asthma,
        drugs: &["metoprolol", "propranolol", "aspirin"],
        reason: "May trigger bronchospasm",
    },
];

// Allergy class -> agents with cross-reaction potential
const CROSS_REACTIONS: &[(&str, &[&str])] = &[
    ("penicillin", &["amoxicillin", "ampicillin", "cephalexin"]),
    ("sulfa", &["sulfamethoxazole", "sulfasalazine"]),
    ("aspirin", &["nsaid", "ibuprofen", "naproxen"]),
];

// Age-specific medication safety: class stems plus common members so
// free-text entries match either form
const ELDERLY_MIN_AGE: u8 = 65;
const ELDERLY_AVOID: &[&str] = &[
    "benzodiazepine", "diazepam", "lorazepam", "alprazolam",
    "anticholinergic", "diphenhydramine",
    "nsaid", "ibuprofen", "naproxen",
];
const ELDERLY_REASON: &str =
    "Increased risk of falls, confusion, and adverse effects in elderly patients";

const PEDIATRIC_MAX_AGE: u8 = 12;
const PEDIATRIC_CAUTION: &[&str] = &["aspirin", "fluoroquinolone", "ciprofloxacin", "levofloxacin"];
const PEDIATRIC_REASON: &str = "Not recommended for pediatric patients";

/// Drug interaction effects matched against a patient's medication list,
/// grouped by tier. Shared with the multi-risk engine.
#[derive(Debug, Default)]
pub(crate) struct InteractionMatches {
    pub severe: Vec<&'static str>,
    pub moderate: Vec<&'static str>,
    pub minor: Vec<&'static str>,
}

pub(crate) fn match_interactions(patient: &PatientData) -> InteractionMatches {
    let mut matches = InteractionMatches::default();
    if patient.medications.is_empty() {
        return matches;
    }
    let tiers = [
        (SEVERE_INTERACTIONS, &mut matches.severe),
        (MODERATE_INTERACTIONS, &mut matches.moderate),
        (MINOR_INTERACTIONS, &mut matches.minor),
    ];
    for (table, bucket) in tiers {
        for interaction in table {
            if patient.takes_medication(interaction.drug_a)
                && patient.takes_medication(interaction.drug_b)
            {
                bucket.push(interaction.effect);
            }
        }
    }
    matches
}

/// Runs the deterministic clinical safety checks
#[derive(Debug, Clone, Default)]
pub struct ClinicalRulesEngine {
    categories: RuleCategories,
}

impl ClinicalRulesEngine {
    pub fn new(categories: RuleCategories) -> Self {
        Self { categories }
    }

    /// Execute every enabled rule category and collect the findings
    pub fn run_all_checks(&self, patient: &PatientData) -> RulesReport {
        let mut violations = Vec::new();
        let mut total_rules = 0;

        if self.categories.drug_interactions {
            total_rules += self.check_drug_interactions(patient, &mut violations);
        }
        if self.categories.vital_sign_alerts {
            total_rules += self.check_vital_alerts(patient, &mut violations);
        }
        if self.categories.age_safety {
            total_rules += self.check_age_safety(patient, &mut violations);
        }
        if self.categories.contraindications {
            total_rules += self.check_contraindications(patient, &mut violations);
        }
        if self.categories.allergy_checks {
            total_rules += self.check_allergy_risks(patient, &mut violations);
        }

        // Re-key ids so they are stable within a report
        for (index, violation) in violations.iter_mut().enumerate() {
            violation.id = format!("{}-{:04}", violation.category.id_prefix(), index + 1);
        }

        for violation in &violations {
            if violation.severity == RuleSeverity::Critical {
                warn!(rule = %violation.id, message = %violation.message, "critical rule violation");
            }
        }

        let passed_rules = total_rules.saturating_sub(violations.len());
        let has_critical = violations.iter().any(|v| v.severity == RuleSeverity::Critical);
        let has_warnings = violations.iter().any(|v| v.severity == RuleSeverity::Warning);
        let summary = summarize(&violations, has_critical, has_warnings);
        debug!(total_rules, violations = violations.len(), "rules engine pass complete");

        RulesReport {
            violations,
            passed_rules,
            total_rules,
            has_critical,
            has_warnings,
            summary,
        }
    }

    fn check_drug_interactions(
        &self,
        patient: &PatientData,
        violations: &mut Vec<RuleViolation>,
    ) -> usize {
        let total =
            SEVERE_INTERACTIONS.len() + MODERATE_INTERACTIONS.len() + MINOR_INTERACTIONS.len();

        let tiers = [
            (SEVERE_INTERACTIONS, RuleSeverity::Critical, "Severe Drug Interaction"),
            (MODERATE_INTERACTIONS, RuleSeverity::Warning, "Moderate Drug Interaction"),
            (MINOR_INTERACTIONS, RuleSeverity::Caution, "Minor Drug Interaction"),
        ];

        for (table, severity, name) in tiers {
            for interaction in table {
                if patient.takes_medication(interaction.drug_a)
                    && patient.takes_medication(interaction.drug_b)
                {
                    violations.push(RuleViolation {
                        id: String::new(),
                        name: name.to_string(),
                        severity,
                        category: RuleCategory::DrugInteractions,
                        message: format!(
                            "Interaction between {} and {}: {}",
                            interaction.drug_a, interaction.drug_b, interaction.effect
                        ),
                        recommendation: format!(
                            "Review necessity of concurrent {} and {}. Consider alternatives or close monitoring.",
                            interaction.drug_a, interaction.drug_b
                        ),
                    });
                }
            }
        }
        total
    }

    fn check_vital_alerts(
        &self,
        patient: &PatientData,
        violations: &mut Vec<RuleViolation>,
    ) -> usize {
        let readings = patient.vitals.readings();
        // one low and one high rule per measured vital
        let total = readings.len() * 2;

        for reading in readings {
            let (critical_low, critical_high) = reading.vital.critical_range();
            if reading.value < critical_low {
                violations.push(RuleViolation {
                    id: String::new(),
                    name: format!("Critical Low {}", reading.vital.label()),
                    severity: RuleSeverity::Critical,
                    category: RuleCategory::VitalSignAlerts,
                    message: format!(
                        "CRITICAL: {} is {} {}, below critical threshold of {}",
                        reading.vital.label(),
                        reading.value,
                        reading.vital.unit(),
                        critical_low
                    ),
                    recommendation:
                        "Immediate assessment required. Verify measurement and initiate appropriate intervention."
                            .to_string(),
                });
            } else if reading.value > critical_high {
                violations.push(RuleViolation {
                    id: String::new(),
                    name: format!("Critical High {}", reading.vital.label()),
                    severity: RuleSeverity::Critical,
                    category: RuleCategory::VitalSignAlerts,
                    message: format!(
                        "CRITICAL: {} is {} {}, above critical threshold of {}",
                        reading.vital.label(),
                        reading.value,
                        reading.vital.unit(),
                        critical_high
                    ),
                    recommendation:
                        "Immediate assessment required. Verify measurement and initiate appropriate intervention."
                            .to_string(),
                });
            }
        }
        total
    }

    fn check_age_safety(
        &self,
        patient: &PatientData,
        violations: &mut Vec<RuleViolation>,
    ) -> usize {
        if patient.medications.is_empty() {
            return 0;
        }

        let mut total = 0;
        if patient.age >= ELDERLY_MIN_AGE {
            total += ELDERLY_AVOID.len();
            for risky in ELDERLY_AVOID {
                if patient.takes_medication(risky) {
                    violations.push(RuleViolation {
                        id: String::new(),
                        name: "Elderly Medication Caution".to_string(),
                        severity: RuleSeverity::Warning,
                        category: RuleCategory::AgeSafety,
                        message: format!(
                            "Patient age {}: {} may be inappropriate for elderly patients",
                            patient.age, risky
                        ),
                        recommendation: ELDERLY_REASON.to_string(),
                    });
                }
            }
        }

        if patient.age <= PEDIATRIC_MAX_AGE {
            total += PEDIATRIC_CAUTION.len();
            for risky in PEDIATRIC_CAUTION {
                if patient.takes_medication(risky) {
                    violations.push(RuleViolation {
                        id: String::new(),
                        name: "Pediatric Medication Caution".to_string(),
                        severity: RuleSeverity::Warning,
                        category: RuleCategory::AgeSafety,
                        message: format!(
                            "Patient age {}: {} may be inappropriate for pediatric patients",
                            patient.age, risky
                        ),
                        recommendation: PEDIATRIC_REASON.to_string(),
                    });
                }
            }
        }
        total.max(1)
    }

    fn check_contraindications(
        &self,
        patient: &PatientData,
        violations: &mut Vec<RuleViolation>,
    ) -> usize {
        for contra in CONTRAINDICATIONS {
            if !patient.has_condition(contra.condition) {
                continue;
            }
            for drug in contra.drugs {
                if patient.takes_medication(drug) {
                    violations.push(RuleViolation {
                        id: String::new(),
                        name: "Drug-Condition Contraindication".to_string(),
                        severity: RuleSeverity::Warning,
                        category: RuleCategory::Contraindications,
                        message: format!(
                            "Caution: {} with {}",
                            drug,
                            contra.condition.label()
                        ),
                        recommendation: contra.reason.to_string(),
                    });
                }
            }
        }
        CONTRAINDICATIONS.len()
    }

    fn check_allergy_risks(
        &self,
        patient: &PatientData,
        violations: &mut Vec<RuleViolation>,
    ) -> usize {
        if patient.allergies.is_empty() || patient.medications.is_empty() {
            return 1;
        }

        let total = CROSS_REACTIONS.len() + patient.allergies.len();

        // Direct matches between the allergy list and prescribed agents
        for allergy in &patient.allergies {
            let allergy_lower = allergy.to_lowercase();
            for medication in &patient.medications {
                let med_lower = medication.to_lowercase();
                if med_lower.contains(&allergy_lower) || allergy_lower.contains(&med_lower) {
                    violations.push(RuleViolation {
                        id: String::new(),
                        name: "Allergy Alert".to_string(),
                        severity: RuleSeverity::Critical,
                        category: RuleCategory::AllergyChecks,
                        message: format!(
                            "ALLERGY ALERT: patient allergic to {allergy}, prescribed {medication}"
                        ),
                        recommendation:
                            "Verify allergy history. Consider alternative medication immediately."
                                .to_string(),
                    });
                }
            }
        }

        for (allergy_class, related) in CROSS_REACTIONS {
            if !patient.has_allergy(allergy_class) {
                continue;
            }
            for drug in *related {
                if patient.takes_medication(drug) {
                    violations.push(RuleViolation {
                        id: String::new(),
                        name: "Cross-Reactivity Risk".to_string(),
                        severity: RuleSeverity::Warning,
                        category: RuleCategory::AllergyChecks,
                        message: format!(
                            "Cross-reactivity risk: {allergy_class} allergy, prescribed {drug}"
                        ),
                        recommendation: format!(
                            "Patient has {allergy_class} allergy; {drug} may cause a cross-reaction."
                        ),
                    });
                }
            }
        }
        total
    }
}

fn summarize(violations: &[RuleViolation], has_critical: bool, has_warnings: bool) -> String {
    if has_critical {
        let n = violations.iter().filter(|v| v.severity == RuleSeverity::Critical).count();
        format!("CRITICAL: {n} critical safety issue(s) detected")
    } else if has_warnings {
        let n = violations.iter().filter(|v| v.severity == RuleSeverity::Warning).count();
        format!("WARNING: {n} warning(s) require attention")
    } else if !violations.is_empty() {
        format!("{} minor issue(s) noted", violations.len())
    } else {
        "All clinical safety checks passed".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gender, VitalSigns};
    use std::collections::BTreeSet;

    fn patient() -> PatientData {
        PatientData {
            age: 50,
            gender: Gender::Other,
            vitals: VitalSigns::default(),
            symptoms: BTreeSet::new(),
            conditions: BTreeSet::new(),
            medications: vec![],
            allergies: vec![],
            recent_hospitalization: false,
            limited_mobility: false,
        }
    }

    #[test]
    fn clean_patient_passes_all_checks() {
        let report = ClinicalRulesEngine::default().run_all_checks(&patient());
        assert!(report.violations.is_empty());
        assert!(!report.has_critical);
        assert!(!report.has_warnings);
        assert_eq!(report.passed_rules, report.total_rules);
        assert_eq!(report.summary, "All clinical safety checks passed");
        assert_eq!(report.pass_rate(), 1.0);
    }

    #[test]
    fn warfarin_aspirin_is_a_critical_interaction() {
        let mut patient = patient();
        patient.medications = vec!["Warfarin 5mg".into(), "Aspirin 81mg".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        assert!(report.has_critical);
        let drug = report.by_category(RuleCategory::DrugInteractions);
        assert_eq!(drug.len(), 1);
        assert_eq!(drug[0].severity, RuleSeverity::Critical);
        assert!(drug[0].message.contains("bleeding"));
    }

    #[test]
    fn statin_grapefruit_is_a_moderate_interaction() {
        let mut patient = patient();
        patient.medications = vec!["atorvastatin".into(), "grapefruit extract".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        assert!(!report.has_critical);
        assert!(report.has_warnings);
    }

    #[test]
    fn critically_low_heart_rate_is_flagged() {
        let mut patient = patient();
        patient.vitals.heart_rate = 32.0;
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        let vital = report.by_category(RuleCategory::VitalSignAlerts);
        assert_eq!(vital.len(), 1);
        assert_eq!(vital[0].severity, RuleSeverity::Critical);
        assert!(vital[0].name.contains("Low"));
    }

    #[test]
    fn elderly_benzodiazepine_use_warns() {
        let mut patient = patient();
        patient.age = 78;
        patient.medications = vec!["Lorazepam 1mg".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        let age = report.by_category(RuleCategory::AgeSafety);
        assert_eq!(age.len(), 1);
        assert_eq!(age[0].severity, RuleSeverity::Warning);
    }

    #[test]
    fn pediatric_aspirin_use_warns() {
        let mut patient = patient();
        patient.age = 8;
        patient.medications = vec!["aspirin".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        assert!(!report.by_category(RuleCategory::AgeSafety).is_empty());
    }

    #[test]
    fn kidney_disease_with_nsaid_is_contraindicated() {
        let mut patient = patient();
        patient.conditions.insert(Condition::KidneyDisease);
        patient.medications = vec!["ibuprofen 400mg".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        assert!(!report.by_category(RuleCategory::Contraindications).is_empty());
    }

    #[test]
    fn direct_allergy_match_is_critical() {
        let mut patient = patient();
        patient.allergies = vec!["penicillin".into()];
        patient.medications = vec!["penicillin v".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        let allergy = report.by_category(RuleCategory::AllergyChecks);
        assert!(allergy.iter().any(|v| v.severity == RuleSeverity::Critical));
    }

    #[test]
    fn penicillin_allergy_cross_reacts_with_amoxicillin() {
        let mut patient = patient();
        patient.allergies = vec!["Penicillin".into()];
        patient.medications = vec!["Amoxicillin 500mg".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        let allergy = report.by_category(RuleCategory::AllergyChecks);
        assert!(allergy.iter().any(|v| v.name == "Cross-Reactivity Risk"));
    }

    #[test]
    fn violations_filter_by_severity() {
        let mut patient = patient();
        patient.age = 70;
        // warfarin+aspirin is critical, elderly NSAID use is a warning
        patient.medications = vec!["warfarin".into(), "aspirin".into(), "ibuprofen".into()];
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);

        let critical = report.by_severity(RuleSeverity::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].category, RuleCategory::DrugInteractions);

        let warnings = report.by_severity(RuleSeverity::Warning);
        assert!(!warnings.is_empty());
        assert!(warnings.iter().all(|v| v.severity == RuleSeverity::Warning));
        assert!(report.by_severity(RuleSeverity::Info).is_empty());
    }

    #[test]
    fn disabled_category_is_skipped() {
        let categories = RuleCategories {
            drug_interactions: false,
            ..Default::default()
        };
        let mut patient = patient();
        patient.medications = vec!["warfarin".into(), "aspirin".into()];
        let report = ClinicalRulesEngine::new(categories).run_all_checks(&patient);
        assert!(report.by_category(RuleCategory::DrugInteractions).is_empty());
    }

    #[test]
    fn violation_ids_are_sequential_and_prefixed() {
        let mut patient = patient();
        patient.medications = vec!["warfarin".into(), "aspirin".into()];
        patient.vitals.oxygen_saturation = 80.0;
        let report = ClinicalRulesEngine::default().run_all_checks(&patient);
        assert_eq!(report.violations.len(), 2);
        assert!(report.violations[0].id.ends_with("0001"));
        assert!(report.violations[1].id.ends_with("0002"));
    }
}
