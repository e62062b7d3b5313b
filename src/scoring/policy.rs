use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;

/// How a single pair of answers is turned into an agreement percentage.
///
/// Exactly one policy is used for a given configuration and it is recorded in
/// every report, so scores produced by different policies are never compared
/// unknowingly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgreementPolicy {
    /// 100 when the answers are at most `tolerance` apart, otherwise 0
    Tolerance { tolerance: u32 },
    /// 100 minus the distance times `scale_factor`, floored at 0
    Scaled { scale_factor: f64 },
}

impl Default for AgreementPolicy {
    fn default() -> Self {
        AgreementPolicy::Tolerance { tolerance: 1 }
    }
}

impl AgreementPolicy {
    /// Parse the compact form used on the command line:
    /// "within N" or "scaled xF".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(val) = s.strip_prefix("within") {
            Ok(AgreementPolicy::Tolerance {
                tolerance: val.trim().parse()?,
            })
        } else if let Some(val) = s.strip_prefix("scaled") {
            let val = val.trim();
            let Some(factor) = val.strip_prefix('x') else {
                bail!("Scaled policy must be written as 'scaled xF': {}", s)
            };
            let scale_factor: f64 = factor.trim().parse()?;
            if !scale_factor.is_finite() || scale_factor <= 0.0 {
                bail!("Scale factor must be a positive number: {}", s)
            }
            Ok(AgreementPolicy::Scaled { scale_factor })
        } else {
            bail!("Policy must start with 'within' or 'scaled': {}", s)
        }
    }

    /// Agreement for one question pair, always within [0, 100]
    pub fn agreement(&self, self_value: i32, partner_value: i32) -> f64 {
        let distance = (self_value as i64 - partner_value as i64).unsigned_abs();
        let raw = match self {
            AgreementPolicy::Tolerance { tolerance } => {
                if distance <= *tolerance as u64 {
                    100.0
                } else {
                    0.0
                }
            }
            AgreementPolicy::Scaled { scale_factor } => 100.0 - distance as f64 * scale_factor,
        };
        raw.clamp(0.0, 100.0)
    }
}

impl fmt::Display for AgreementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgreementPolicy::Tolerance { tolerance } => write!(f, "within {}", tolerance),
            AgreementPolicy::Scaled { scale_factor } => {
                write!(f, "scaled x{}", (scale_factor * 100.0).round() / 100.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_one_matches_neighbours() {
        let policy = AgreementPolicy::Tolerance { tolerance: 1 };
        assert_eq!(policy.agreement(2, 2), 100.0);
        assert_eq!(policy.agreement(2, 3), 100.0);
        assert_eq!(policy.agreement(3, 1), 0.0);
    }

    #[test]
    fn test_tolerance_zero_is_exact_match() {
        let policy = AgreementPolicy::Tolerance { tolerance: 0 };
        assert_eq!(policy.agreement(4, 4), 100.0);
        assert_eq!(policy.agreement(4, 3), 0.0);
    }

    #[test]
    fn test_scaled_penalty() {
        let policy = AgreementPolicy::Scaled { scale_factor: 20.0 };
        assert_eq!(policy.agreement(1, 1), 100.0);
        assert_eq!(policy.agreement(1, 3), 60.0);
    }

    #[test]
    fn test_scaled_floors_at_zero() {
        let policy = AgreementPolicy::Scaled { scale_factor: 50.0 };
        assert_eq!(policy.agreement(1, 4), 0.0);
    }

    #[test]
    fn test_scaled_max_distance_is_zero() {
        let policy = AgreementPolicy::Scaled {
            scale_factor: 100.0 / 3.0,
        };
        assert!(policy.agreement(1, 4).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let policy = AgreementPolicy::Tolerance { tolerance: 1 };
        assert_eq!(policy.agreement(i32::MIN, i32::MAX), 0.0);
    }

    #[test]
    fn test_parse_within() {
        let policy = AgreementPolicy::parse("within 2").unwrap();
        assert_eq!(policy, AgreementPolicy::Tolerance { tolerance: 2 });
    }

    #[test]
    fn test_parse_scaled() {
        let policy = AgreementPolicy::parse("scaled x20").unwrap();
        assert_eq!(policy, AgreementPolicy::Scaled { scale_factor: 20.0 });
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AgreementPolicy::parse("exact").is_err());
        assert!(AgreementPolicy::parse("scaled 20").is_err());
        assert!(AgreementPolicy::parse("scaled x-1").is_err());
        assert!(AgreementPolicy::parse("within -1").is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let policy = AgreementPolicy::Scaled { scale_factor: 25.0 };
        assert_eq!(policy.to_string(), "scaled x25");
        assert_eq!(AgreementPolicy::parse(&policy.to_string()).unwrap(), policy);
    }
}
