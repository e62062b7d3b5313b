use serde::Serialize;

use super::config::ScoringRules;
use super::policy::AgreementPolicy;
use crate::quiz::{AnswerSet, Category, QuestionCatalog};

/// Agreement for one question both respondents answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAgreement {
    pub question_id: String,
    pub category: Category,
    pub self_value: i32,
    pub partner_value: i32,
    pub agreement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: f64, // [0, 100], unrounded
    pub pairs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub overall: f64, // [0, 100], weighted by pair count
    pub pairs: usize,
    pub policy: AgreementPolicy,
    pub categories: Vec<CategoryScore>,
    pub breakdown: Vec<PairAgreement>,
}

impl ScoreReport {
    /// Report for two answer sets with nothing in common
    pub fn empty(policy: AgreementPolicy) -> Self {
        Self {
            overall: 0.0,
            pairs: 0,
            policy,
            categories: Vec::new(),
            breakdown: Vec::new(),
        }
    }

    pub fn category(&self, category: Category) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }
}

#[derive(Default, Clone, Copy)]
struct Tally {
    sum: f64,
    count: usize,
}

/// Compare two respondents' answers category by category.
///
/// Only questions answered by both sides and present in the catalog count.
/// Pairs with a value outside the configured scale are skipped. Category
/// scores are plain means of their pairs; the overall score is the mean over
/// every pair, so larger categories weigh more. With no comparable pairs the
/// report is empty and the overall score is exactly 0.
pub fn compute_category_scores(
    self_answers: &AnswerSet,
    partner_answers: &AnswerSet,
    catalog: &QuestionCatalog,
    rules: &ScoringRules,
) -> ScoreReport {
    let mut tallies = [Tally::default(); Category::ALL.len()];
    let mut breakdown = Vec::new();

    // Catalog order keeps the floating-point summation order fixed
    for question in catalog.iter() {
        let (Some(self_value), Some(partner_value)) = (
            self_answers.get(&question.id),
            partner_answers.get(&question.id),
        ) else {
            continue;
        };

        if !rules.scale.contains(self_value) || !rules.scale.contains(partner_value) {
            continue;
        }

        let agreement = rules.policy.agreement(self_value, partner_value);
        let tally = &mut tallies[slot(question.category)];
        tally.sum += agreement;
        tally.count += 1;

        breakdown.push(PairAgreement {
            question_id: question.id.clone(),
            category: question.category,
            self_value,
            partner_value,
            agreement,
        });
    }

    let total_sum: f64 = breakdown.iter().map(|p| p.agreement).sum();
    let total_pairs = breakdown.len();

    if total_pairs == 0 {
        return ScoreReport::empty(rules.policy);
    }

    let categories = catalog
        .categories()
        .into_iter()
        .filter_map(|category| {
            let tally = tallies[slot(category)];
            (tally.count > 0).then(|| CategoryScore {
                category,
                score: clamp_score(tally.sum / tally.count as f64),
                pairs: tally.count,
            })
        })
        .collect();

    ScoreReport {
        overall: clamp_score(total_sum / total_pairs as f64),
        pairs: total_pairs,
        policy: rules.policy,
        categories,
        breakdown,
    }
}

fn slot(category: Category) -> usize {
    Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or_default()
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}
