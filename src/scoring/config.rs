use serde::{Deserialize, Serialize};

use super::policy::AgreementPolicy;
use crate::quiz::AnswerScale;

/// Which agreement policy a configuration selects.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Tolerance,
    Scaled,
}

/// Scoring configuration.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   policy: scaled
///   scale_factor: 20
///   scale: { min: 1, max: 4 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Agreement policy (default: tolerance)
    #[serde(default)]
    pub policy: Option<PolicyKind>,

    /// Maximum distance still counted as a match (tolerance policy, default: 1)
    #[serde(default)]
    pub tolerance: Option<u32>,

    /// Penalty per point of distance (scaled policy).
    /// Defaults to 100 / (max - min) so the widest disagreement scores 0.
    #[serde(default)]
    pub scale_factor: Option<f64>,

    /// Answer scale bounds (default: 1-4)
    #[serde(default)]
    pub scale: Option<AnswerScale>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            policy: Some(PolicyKind::Tolerance),
            tolerance: Some(1),
            scale_factor: None,
            scale: Some(AnswerScale::default()),
        }
    }
}

/// Resolved scoring inputs handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRules {
    pub policy: AgreementPolicy,
    pub scale: AnswerScale,
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringConfig::default().rules()
    }
}

impl ScoringConfig {
    pub fn scale(&self) -> AnswerScale {
        self.scale.unwrap_or_default()
    }

    /// Effective agreement policy with defaults filled in
    pub fn policy(&self) -> AgreementPolicy {
        match self.policy.unwrap_or(PolicyKind::Tolerance) {
            PolicyKind::Tolerance => AgreementPolicy::Tolerance {
                tolerance: self.tolerance.unwrap_or(1),
            },
            PolicyKind::Scaled => {
                let span = self.scale().span().max(1) as f64;
                AgreementPolicy::Scaled {
                    scale_factor: self.scale_factor.unwrap_or(100.0 / span),
                }
            }
        }
    }

    pub fn rules(&self) -> ScoringRules {
        ScoringRules {
            policy: self.policy(),
            scale: self.scale(),
        }
    }
}
