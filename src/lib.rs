#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, future_incompatible)]
//! Clinical decision support core
//!
//! Risk classification and alerting primitives for clinical decision
//! support: a probability-to-risk-band classifier with an alert gate,
//! a deterministic clinical safety rules engine, a hybrid engine that
//! reconciles the two, a multi-category risk scorer, and an alert
//! prioritization engine with suppression and fatigue tracking.
//!
//! The crate is a pure library: no I/O, no persistence, no network.
//! Callers feed it patient data and model probabilities and render the
//! resulting assessments however they see fit.

pub mod alerts;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod hybrid;
pub mod multi_risk;
pub mod rules;
pub mod types;
pub mod validation;

pub use alerts::{Alert, AlertEngine, AlertPriority, AlertRequest};
pub use classifier::{AlertSeverity, RiskAssessment, RiskClassifier, RiskLevel};
pub use config::{CdssConfig, RiskThresholds};
pub use errors::{CdssError, CdssResult};
pub use hybrid::{HybridDecision, HybridDecisionEngine};
pub use multi_risk::{MultiRiskAssessment, MultiRiskEngine, RiskType};
pub use rules::{ClinicalRulesEngine, RulesReport};
pub use types::PatientData;
pub use validation::{validate_patient, ValidationReport};
