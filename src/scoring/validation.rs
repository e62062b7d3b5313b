use super::config::{PolicyKind, ScoringConfig};
use super::policy::AgreementPolicy;
use crate::quiz::AnswerScale;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let policy = config.policy.unwrap_or(PolicyKind::Tolerance);

    if let Some(scale) = config.scale {
        if scale.min >= scale.max {
            errors.push(format!(
                "scoring.scale: min ({}) must be less than max ({})",
                scale.min, scale.max
            ));
        } else if scale.span() > AnswerScale::MAX_SPAN {
            errors.push(format!(
                "scoring.scale: {}..{} spans {} steps, at most {} allowed",
                scale.min,
                scale.max,
                scale.span(),
                AnswerScale::MAX_SPAN
            ));
        }
    }

    match policy {
        PolicyKind::Tolerance => {
            if config.scale_factor.is_some() {
                errors.push(
                    "scoring.scale_factor: only valid with policy 'scaled'".to_string(),
                );
            }
            // The implicit default tolerance can swallow a narrow scale too
            if let AgreementPolicy::Tolerance { tolerance } = config.policy() {
                let span = config.scale().span();
                if span > 0 && i64::from(tolerance) >= span {
                    errors.push(format!(
                        "scoring.tolerance: {} would count every pair as a match (scale spans {})",
                        tolerance, span
                    ));
                }
            }
        }
        PolicyKind::Scaled => {
            if config.tolerance.is_some() {
                errors.push("scoring.tolerance: only valid with policy 'tolerance'".to_string());
            }
            if let Some(factor) = config.scale_factor {
                if !factor.is_finite() || factor <= 0.0 {
                    errors.push(format!(
                        "scoring.scale_factor: must be a positive number, got {}",
                        factor
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
