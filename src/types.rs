//! Patient data model shared by the classifier, rules, and risk engines

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Patient gender as captured on intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Reported symptoms recognized by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Fever,
    Cough,
    Fatigue,
    Headache,
    ChestPain,
    ShortnessOfBreath,
    Nausea,
    Vomiting,
    Dizziness,
    MusclePain,
    LossOfAppetite,
    Confusion,
}

impl Symptom {
    /// Symptoms that individually warrant clinical attention
    pub const CRITICAL: [Symptom; 3] = [
        Symptom::ChestPain,
        Symptom::ShortnessOfBreath,
        Symptom::Confusion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Symptom::Fever => "fever",
            Symptom::Cough => "cough",
            Symptom::Fatigue => "fatigue",
            Symptom::Headache => "headache",
            Symptom::ChestPain => "chest pain",
            Symptom::ShortnessOfBreath => "shortness of breath",
            Symptom::Nausea => "nausea",
            Symptom::Vomiting => "vomiting",
            Symptom::Dizziness => "dizziness",
            Symptom::MusclePain => "muscle pain",
            Symptom::LossOfAppetite => "loss of appetite",
            Symptom::Confusion => "confusion",
        }
    }
}

/// Pre-existing conditions tracked for risk stratification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Diabetes,
    Hypertension,
    HeartDisease,
    Asthma,
    Copd,
    KidneyDisease,
    LiverDisease,
    Cancer,
    AutoimmuneDisorder,
}

impl Condition {
    /// Chronic conditions with the strongest readmission signal
    pub const CHRONIC: [Condition; 4] = [
        Condition::Diabetes,
        Condition::HeartDisease,
        Condition::Copd,
        Condition::KidneyDisease,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Condition::Diabetes => "diabetes",
            Condition::Hypertension => "hypertension",
            Condition::HeartDisease => "heart disease",
            Condition::Asthma => "asthma",
            Condition::Copd => "COPD",
            Condition::KidneyDisease => "kidney disease",
            Condition::LiverDisease => "liver disease",
            Condition::Cancer => "cancer",
            Condition::AutoimmuneDisorder => "autoimmune disorder",
        }
    }
}

/// Vital sign kinds with their clinical reference ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    HeartRate,
    SystolicBp,
    DiastolicBp,
    Temperature,
    RespiratoryRate,
    OxygenSaturation,
    BloodSugar,
}

impl Vital {
    pub fn label(self) -> &'static str {
        match self {
            Vital::HeartRate => "heart rate",
            Vital::SystolicBp => "systolic blood pressure",
            Vital::DiastolicBp => "diastolic blood pressure",
            Vital::Temperature => "temperature",
            Vital::RespiratoryRate => "respiratory rate",
            Vital::OxygenSaturation => "oxygen saturation",
            Vital::BloodSugar => "blood sugar",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Vital::HeartRate => "bpm",
            Vital::SystolicBp | Vital::DiastolicBp => "mmHg",
            Vital::Temperature => "degC",
            Vital::RespiratoryRate => "breaths/min",
            Vital::OxygenSaturation => "%",
            Vital::BloodSugar => "mg/dL",
        }
    }

    /// Critical thresholds (low, high); readings outside this band
    /// trigger a critical rule violation
    pub fn critical_range(self) -> (f64, f64) {
        match self {
            Vital::HeartRate => (40.0, 150.0),
            Vital::SystolicBp => (70.0, 200.0),
            Vital::DiastolicBp => (40.0, 120.0),
            Vital::Temperature => (35.0, 40.0),
            Vital::RespiratoryRate => (8.0, 30.0),
            Vital::OxygenSaturation => (88.0, 100.0),
            Vital::BloodSugar => (50.0, 400.0),
        }
    }

    /// Healthy reference range (low, high)
    pub fn normal_range(self) -> (f64, f64) {
        match self {
            Vital::HeartRate => (60.0, 100.0),
            Vital::SystolicBp => (90.0, 120.0),
            Vital::DiastolicBp => (60.0, 80.0),
            Vital::Temperature => (36.1, 37.2),
            Vital::RespiratoryRate => (12.0, 20.0),
            Vital::OxygenSaturation => (95.0, 100.0),
            Vital::BloodSugar => (70.0, 100.0),
        }
    }
}

/// A single measured vital sign
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    pub vital: Vital,
    pub value: f64,
}

/// Measured vital signs for one patient encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub heart_rate: f64,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub temperature: f64,
    pub respiratory_rate: f64,
    pub oxygen_saturation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<f64>,
}

impl Default for VitalSigns {
    fn default() -> Self {
        Self {
            heart_rate: 75.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            temperature: 37.0,
            respiratory_rate: 16.0,
            oxygen_saturation: 98.0,
            blood_sugar: None,
        }
    }
}

impl VitalSigns {
    /// All available readings, for iteration over threshold tables
    pub fn readings(&self) -> Vec<VitalReading> {
        let mut out = vec![
            VitalReading { vital: Vital::HeartRate, value: self.heart_rate },
            VitalReading { vital: Vital::SystolicBp, value: self.systolic_bp },
            VitalReading { vital: Vital::DiastolicBp, value: self.diastolic_bp },
            VitalReading { vital: Vital::Temperature, value: self.temperature },
            VitalReading { vital: Vital::RespiratoryRate, value: self.respiratory_rate },
            VitalReading { vital: Vital::OxygenSaturation, value: self.oxygen_saturation },
        ];
        if let Some(value) = self.blood_sugar {
            out.push(VitalReading { vital: Vital::BloodSugar, value });
        }
        out
    }
}

/// Clinical data for one patient encounter.
///
/// Processed in-session only; the engine never persists identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientData {
    pub age: u8,
    pub gender: Gender,
    #[serde(default)]
    pub vitals: VitalSigns,
    #[serde(default)]
    pub symptoms: BTreeSet<Symptom>,
    #[serde(default)]
    pub conditions: BTreeSet<Condition>,
    /// Active medications, free-text names
    #[serde(default)]
    pub medications: Vec<String>,
    /// Known allergies, free-text names
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub recent_hospitalization: bool,
    #[serde(default)]
    pub limited_mobility: bool,
}

impl PatientData {
    pub fn has_symptom(&self, symptom: Symptom) -> bool {
        self.symptoms.contains(&symptom)
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn critical_symptom_count(&self) -> usize {
        Symptom::CRITICAL
            .iter()
            .filter(|s| self.symptoms.contains(s))
            .count()
    }

    /// Case-insensitive substring match against the medication list.
    /// Free-text entries like "Warfarin 5mg" should match "warfarin".
    pub fn takes_medication(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.medications
            .iter()
            .any(|m| m.to_lowercase().contains(&needle))
    }

    pub fn has_allergy(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.allergies
            .iter()
            .any(|a| a.to_lowercase().contains(&needle))
    }
}
