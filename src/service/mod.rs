//! Service Module
//!
//! Orchestrates the database and the evaluation cache:
//! - `EvaluationService`: cache get, compute on miss, fenced cache fill
//! - `FlagService`: flag and override writes followed by cache invalidation

mod evaluation;
mod flags;

pub use evaluation::EvaluationService;
pub use flags::FlagService;
