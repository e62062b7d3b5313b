use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Question categories. The set is fixed; catalogs may only reference these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spending,
    Saving,
    Debt,
    Emotion,
    Goals,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Spending,
        Category::Saving,
        Category::Debt,
        Category::Emotion,
        Category::Goals,
    ];

    /// Stable identifier used in config files and TSV/JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spending => "spending",
            Category::Saving => "saving",
            Category::Debt => "debt",
            Category::Emotion => "emotion",
            Category::Goals => "goals",
        }
    }

    /// Human-friendly name for headings and progress bars
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Spending => "Spending Habits",
            Category::Saving => "Saving Habits",
            Category::Debt => "Debt Management",
            Category::Emotion => "Relationship with Money",
            Category::Goals => "Shared Goals",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", s))
    }
}

/// Which side of a session an answer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The user who started the session
    #[serde(rename = "self")]
    Owner,
    #[serde(rename = "partner")]
    Partner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "self",
            Role::Partner => "partner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single questionnaire item. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub category: Category,
    pub text: String,
    pub order: i64,
}

/// Answers of one respondent, keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, i32>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, replacing any earlier value for the same question
    pub fn insert(&mut self, question_id: impl Into<String>, value: i32) -> Option<i32> {
        self.0.insert(question_id.into(), value)
    }

    pub fn get(&self, question_id: &str) -> Option<i32> {
        self.0.get(question_id).copied()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.0.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, i32)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, i32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Bounded ordinal answer scale (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerScale {
    pub min: i32,
    pub max: i32,
}

impl Default for AnswerScale {
    fn default() -> Self {
        Self { min: 1, max: 4 }
    }
}

impl AnswerScale {
    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Widest scale accepted from configuration, in steps
    pub const MAX_SPAN: i64 = 100;

    /// Largest possible distance between two answers. Computed in `i64` so
    /// the extreme `i32` bounds cannot overflow.
    pub fn span(&self) -> i64 {
        i64::from(self.max) - i64::from(self.min)
    }

    pub fn values(&self) -> impl Iterator<Item = i32> {
        self.min..=self.max
    }

    /// Label shown next to a choice. Only the default four-point scale has words.
    pub fn label(&self, value: i32) -> Option<&'static str> {
        if *self != AnswerScale::default() {
            return None;
        }
        match value {
            1 => Some("Strongly disagree"),
            2 => Some("Disagree"),
            3 => Some("Agree"),
            4 => Some("Strongly agree"),
            _ => None,
        }
    }

    /// Check a value against the scale, for use at input boundaries
    pub fn check(&self, value: i32) -> Result<i32> {
        if self.contains(value) {
            Ok(value)
        } else {
            bail!(
                "Answer {} is outside the scale {}-{}",
                value,
                self.min,
                self.max
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_case_insensitive() {
        assert_eq!("Spending".parse::<Category>().unwrap(), Category::Spending);
        assert_eq!(" goals ".parse::<Category>().unwrap(), Category::Goals);
        assert!("finance".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Emotion).unwrap();
        assert_eq!(json, "\"emotion\"");
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"self\"");
        assert_eq!(serde_json::to_string(&Role::Partner).unwrap(), "\"partner\"");
        let parsed: Role = serde_json::from_str("\"self\"").unwrap();
        assert_eq!(parsed, Role::Owner);
    }

    #[test]
    fn test_answer_set_replaces_value() {
        let mut answers = AnswerSet::new();
        assert_eq!(answers.insert("q1", 2), None);
        assert_eq!(answers.insert("q1", 4), Some(2));
        assert_eq!(answers.get("q1"), Some(4));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn test_answer_set_serializes_as_map() {
        let answers: AnswerSet = [("q2", 1), ("q1", 3)].into_iter().collect();
        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"{"q1":3,"q2":1}"#);
    }

    #[test]
    fn test_scale_bounds() {
        let scale = AnswerScale::default();
        assert!(scale.contains(1));
        assert!(scale.contains(4));
        assert!(!scale.contains(0));
        assert!(!scale.contains(5));
        assert_eq!(scale.span(), 3);
        assert!(scale.check(5).is_err());
    }

    #[test]
    fn test_span_of_extreme_bounds() {
        let scale = AnswerScale {
            min: i32::MIN,
            max: i32::MAX,
        };
        assert_eq!(scale.span(), u32::MAX as i64);
    }

    #[test]
    fn test_scale_labels_only_for_default() {
        assert_eq!(AnswerScale::default().label(1), Some("Strongly disagree"));
        assert_eq!(AnswerScale { min: 1, max: 5 }.label(1), None);
    }
}
