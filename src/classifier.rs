//! Risk classifier and alert gate
//!
//! Maps a predicted risk probability onto a discrete risk level and
//! decides whether an alert is surfaced. The probability comes from an
//! external model; rendering of the resulting assessment is equally
//! external. Classification itself is pure and stateless.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AlertGateConfig, CdssConfig, RiskThresholds};
use crate::errors::{CdssError, CdssResult};

/// Discrete risk bands, ordered `Low < Medium < High`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rendering severity for a surfaced alert
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => AlertSeverity::Info,
            RiskLevel::Medium => AlertSeverity::Warning,
            RiskLevel::High => AlertSeverity::Critical,
        }
    }
}

/// Outcome of classifying one predicted probability.
///
/// Immutable once created; `level` is a deterministic monotone function
/// of `probability`, and under the default gate `alert_triggered` holds
/// exactly when `level` is not [`RiskLevel::Low`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub probability: f64,
    pub level: RiskLevel,
    pub alert_triggered: bool,
    /// Severity to render the alert with; `None` when no alert is surfaced
    pub severity: Option<AlertSeverity>,
    pub message: Option<String>,
    pub recommendations: Vec<String>,
}

/// Classifies predicted probabilities into risk assessments
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    thresholds: RiskThresholds,
    gate: AlertGateConfig,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            gate: AlertGateConfig::default(),
        }
    }
}

impl RiskClassifier {
    /// Build a classifier, rejecting invalid threshold configuration
    pub fn new(thresholds: RiskThresholds, gate: AlertGateConfig) -> CdssResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds, gate })
    }

    pub fn from_config(config: &CdssConfig) -> CdssResult<Self> {
        Self::new(config.thresholds, config.alert_gate)
    }

    pub fn thresholds(&self) -> RiskThresholds {
        self.thresholds
    }

    /// Classify a predicted probability.
    ///
    /// Fails with [`CdssError::InvalidInput`] if the probability is not a
    /// finite number in `[0, 1]`. Out-of-range values are rejected rather
    /// than clamped so upstream model faults stay visible.
    pub fn classify(&self, probability: f64) -> CdssResult<RiskAssessment> {
        if !probability.is_finite() {
            return Err(CdssError::invalid_input(format!(
                "probability must be a finite number, got {probability}"
            )));
        }
        if !(0.0..=1.0).contains(&probability) {
            return Err(CdssError::invalid_input(format!(
                "probability {probability} is outside [0, 1]"
            )));
        }

        let level = self.thresholds.level_for(probability);
        let alert_triggered = self.gate.should_alert(level);
        debug!(probability, level = %level, alert_triggered, "classified risk probability");

        let (severity, message, recommendations) = if alert_triggered {
            (
                Some(AlertSeverity::for_level(level)),
                Some(alert_message(level, probability)),
                recommendations_for(level),
            )
        } else {
            (None, None, Vec::new())
        };

        Ok(RiskAssessment {
            probability,
            level,
            alert_triggered,
            severity,
            message,
            recommendations,
        })
    }
}

fn alert_message(level: RiskLevel, probability: f64) -> String {
    let pct = (probability * 100.0).round() as u32;
    match level {
        RiskLevel::Low => format!(
            "Low risk detected ({pct}% predicted probability). Standard care protocol recommended."
        ),
        RiskLevel::Medium => format!(
            "MEDIUM RISK DETECTED ({pct}% predicted probability). Review patient symptoms and consider additional monitoring."
        ),
        RiskLevel::High => format!(
            "HIGH RISK ALERT ({pct}% predicted probability). Immediate clinical review recommended. Verify symptoms and consider specialist consultation."
        ),
    }
}

fn recommendations_for(level: RiskLevel) -> Vec<String> {
    let items: &[&str] = match level {
        RiskLevel::Low => &[
            "Continue standard monitoring",
            "Document patient symptoms",
            "Schedule follow-up as per protocol",
        ],
        RiskLevel::Medium => &[
            "Review all patient symptoms carefully",
            "Consider additional diagnostic tests",
            "Increase monitoring frequency",
            "Document findings and rationale",
            "Consider second opinion if uncertain",
        ],
        RiskLevel::High => &[
            "Perform immediate clinical review",
            "Verify all vital signs and symptoms",
            "Consider urgent diagnostic tests",
            "Consult with senior clinician or specialist",
            "Document all observations in detail",
            "Prepare for potential escalation of care",
            "Ensure patient monitoring is continuous",
        ],
    };
    items.iter().map(|s| (*s).to_string()).collect()
}
