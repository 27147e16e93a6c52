//! Patient input validation
//!
//! Splits findings into hard errors (physiologically impossible or
//! malformed input that must not reach the engines) and soft warnings
//! (clinically plausible but abnormal values worth surfacing alongside
//! the assessment).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CdssError, CdssResult};
use crate::types::{PatientData, Vital};
#[cfg(test)]
use crate::types::Symptom;

pub const MAX_AGE: u8 = 120;

/// Plausibility bounds; values outside these are rejected as input
/// errors, not flagged as clinical findings
fn plausible_range(vital: Vital) -> Option<(f64, f64)> {
    match vital {
        Vital::HeartRate => Some((30.0, 220.0)),
        Vital::Temperature => Some((34.0, 42.0)),
        Vital::OxygenSaturation => Some((70.0, 100.0)),
        Vital::RespiratoryRate => Some((6.0, 50.0)),
        Vital::SystolicBp | Vital::DiastolicBp | Vital::BloodSugar => None,
    }
}

/// Outcome of validating one patient record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert into a result, so callers can gate engine entry with `?`
    pub fn into_result(self) -> CdssResult<Vec<String>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(CdssError::invalid_input(self.errors.join("; ")))
        }
    }
}

/// Validate a patient record before it enters any engine
pub fn validate_patient(patient: &PatientData) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_age(patient, &mut report);
    check_vitals(patient, &mut report);
    check_symptoms(patient, &mut report);

    if !report.errors.is_empty() {
        warn!(errors = report.errors.len(), "patient record failed validation");
    }
    report
}

fn check_age(patient: &PatientData, report: &mut ValidationReport) {
    if patient.age > MAX_AGE {
        report
            .errors
            .push(format!("age {} exceeds maximum plausible age {MAX_AGE}", patient.age));
    }
}

fn check_vitals(patient: &PatientData, report: &mut ValidationReport) {
    let vitals = &patient.vitals;

    for reading in vitals.readings() {
        if !reading.value.is_finite() {
            report.errors.push(format!(
                "{} must be a finite number, got {}",
                reading.vital.label(),
                reading.value
            ));
            continue;
        }
        if let Some((low, high)) = plausible_range(reading.vital) {
            if reading.value < low || reading.value > high {
                report.errors.push(format!(
                    "{} {} {} is outside the plausible range {low}-{high}",
                    reading.vital.label(),
                    reading.value,
                    reading.vital.unit()
                ));
            }
        }
    }

    if vitals.systolic_bp.is_finite()
        && vitals.diastolic_bp.is_finite()
        && vitals.systolic_bp <= vitals.diastolic_bp
    {
        report.errors.push(format!(
            "systolic blood pressure ({}) must exceed diastolic ({})",
            vitals.systolic_bp, vitals.diastolic_bp
        ));
    }

    // Soft clinical findings, only meaningful on otherwise valid input
    if !report.errors.is_empty() {
        return;
    }

    for reading in vitals.readings() {
        let (low, high) = reading.vital.normal_range();
        if reading.value < low || reading.value > high {
            report.warnings.push(format!(
                "{} {} {} is outside the normal range {low}-{high}",
                reading.vital.label(),
                reading.value,
                reading.vital.unit()
            ));
        }
    }

    if vitals.temperature > 38.0 {
        report
            .warnings
            .push(format!("fever detected ({} degC)", vitals.temperature));
    } else if vitals.temperature < 36.0 {
        report
            .warnings
            .push(format!("hypothermia risk ({} degC)", vitals.temperature));
    }

    if vitals.oxygen_saturation < 92.0 {
        report.warnings.push(format!(
            "critically low oxygen saturation ({}%)",
            vitals.oxygen_saturation
        ));
    } else if vitals.oxygen_saturation < 95.0 {
        report.warnings.push(format!(
            "low oxygen saturation ({}%)",
            vitals.oxygen_saturation
        ));
    }

    if vitals.respiratory_rate > 25.0 {
        report.warnings.push(format!(
            "elevated respiratory rate ({} breaths/min)",
            vitals.respiratory_rate
        ));
    } else if vitals.respiratory_rate < 10.0 {
        report.warnings.push(format!(
            "depressed respiratory rate ({} breaths/min)",
            vitals.respiratory_rate
        ));
    }
}

fn check_symptoms(patient: &PatientData, report: &mut ValidationReport) {
    if patient.symptoms.len() >= 6 {
        report.warnings.push(format!(
            "high symptom burden ({} symptoms reported)",
            patient.symptoms.len()
        ));
    }
    let critical = patient.critical_symptom_count();
    if critical >= 2 {
        report.warnings.push(format!(
            "{critical} critical symptoms present, urgent review advised"
        ));
    }
}
