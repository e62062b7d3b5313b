use super::types::{Category, Question};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN_QUESTIONS: &str = include_str!("questions.yaml");

/// Raw catalog entry as written in YAML. The category is kept as a string so
/// a single unknown category does not reject the whole file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionRecord {
    id: String,
    category: String,
    text: String,
    #[serde(default)]
    order: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    questions: Vec<QuestionRecord>,
}

/// Ordered question catalog with id lookup.
///
/// Questions are kept sorted by display order (ties broken by id), which is
/// also the order categories first appear in score reports.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<String, usize>,
}

impl QuestionCatalog {
    /// Build a catalog. Duplicate ids keep the first entry in display order.
    pub fn from_questions(mut questions: Vec<Question>) -> Self {
        questions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

        let mut kept = Vec::with_capacity(questions.len());
        let mut index = HashMap::new();
        for question in questions {
            if index.contains_key(&question.id) {
                tracing::warn!(id = %question.id, "duplicate question id in catalog, ignoring");
                continue;
            }
            index.insert(question.id.clone(), kept.len());
            kept.push(question);
        }

        Self {
            questions: kept,
            index,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|&i| &self.questions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Categories in order of first occurrence
    pub fn categories(&self) -> Vec<Category> {
        let mut seen = Vec::new();
        for question in &self.questions {
            if !seen.contains(&question.category) {
                seen.push(question.category);
            }
        }
        seen
    }

    pub fn by_category(&self, category: Category) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category == category)
            .collect()
    }
}

/// Parse a catalog from YAML. Entries with an unknown category are skipped
/// with a warning rather than failing the load.
pub fn parse_catalog(yaml: &str) -> Result<QuestionCatalog> {
    let file: CatalogFile =
        serde_saphyr::from_str(yaml).context("Failed to parse question catalog")?;

    let questions = file
        .questions
        .into_iter()
        .filter_map(|record| match record.category.parse::<Category>() {
            Ok(category) => Some(Question {
                id: record.id,
                category,
                text: record.text,
                order: record.order,
            }),
            Err(_) => {
                tracing::warn!(
                    id = %record.id,
                    category = %record.category,
                    "skipping question with unknown category"
                );
                None
            }
        })
        .collect();

    Ok(QuestionCatalog::from_questions(questions))
}

/// Load the question catalog from a file, or the built-in catalog when no
/// path is configured.
pub fn load_catalog(path: Option<&Path>) -> Result<QuestionCatalog> {
    let catalog = match path {
        Some(path) => {
            let content = fs::read_to_string(path).with_context(|| {
                format!("Failed to read question catalog at {}", path.display())
            })?;
            parse_catalog(&content)
                .with_context(|| format!("Invalid question catalog in {}", path.display()))?
        }
        None => parse_catalog(BUILTIN_QUESTIONS)?,
    };

    if catalog.is_empty() {
        anyhow::bail!("Question catalog is empty");
    }

    tracing::debug!(questions = catalog.len(), "loaded question catalog");
    Ok(catalog)
}
