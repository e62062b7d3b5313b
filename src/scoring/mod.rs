pub mod config;
pub mod engine;
pub mod policy;
pub mod validation;

pub use config::*;
pub use engine::{compute_category_scores, CategoryScore, PairAgreement, ScoreReport};
pub use policy::AgreementPolicy;
pub use validation::validate_scoring;
