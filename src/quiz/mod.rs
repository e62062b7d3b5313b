pub mod catalog;
pub mod types;

pub use catalog::{load_catalog, parse_catalog, QuestionCatalog};
pub use types::{AnswerScale, AnswerSet, Category, Question, Role};
