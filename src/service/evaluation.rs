//! Evaluation Service
//!
//! Read-through path for flag evaluation: cache first, database on a miss,
//! then a fenced fill so a racing invalidation cannot be overwritten by a
//! value computed from rows that were already stale.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::EvaluationCache;
use crate::db::{self, flags, Database};
use crate::error::{FlagError, Result};
use crate::models::Evaluation;

#[derive(Debug, Clone)]
pub struct EvaluationService {
    db: Database,
    cache: Arc<EvaluationCache>,
}

impl EvaluationService {
    pub fn new(db: Database, cache: Arc<EvaluationCache>) -> Self {
        Self { db, cache }
    }

    /// Evaluates the flag named `flag_name` for `user_id`.
    ///
    /// Returns `NotFound` if no flag has that name. The name lookup always
    /// hits the database; only the (flag, user) resolution is cached.
    pub async fn evaluate(&self, flag_name: &str, user_id: &str) -> Result<Evaluation> {
        let flag = {
            let conn = self.db.connection().await;
            flags::get_by_name(&conn, flag_name)?
        }
        .ok_or_else(|| FlagError::flag_name_not_found(flag_name))?;

        if let Some(cached) = self.cache.get(flag.id, user_id) {
            trace!(flag = %flag.name, user_id, "Evaluation served from cache");
            return Ok(cached);
        }

        // Taken before reading rows: any write that lands after this point
        // invalidates after it commits and so bumps the generation.
        let token = self.cache.fill_token(flag.id, user_id);

        let evaluation = {
            let conn = self.db.connection().await;
            let current = flags::get(&conn, flag.id)?
                .ok_or_else(|| FlagError::flag_name_not_found(flag_name))?;
            db::compute_evaluation(&conn, &current, user_id)?
        };

        if !self.cache.set_if_fresh(token, evaluation.clone()) {
            debug!(flag = %flag.name, user_id, "Evaluation not cached, flag changed meanwhile");
        }

        Ok(evaluation)
    }
}
