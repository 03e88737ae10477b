//! Flag Service
//!
//! CRUD for flags and overrides. Every write that can change an evaluation
//! invalidates the cache after the database write has been applied.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::cache::EvaluationCache;
use crate::db::{flags, overrides, Database};
use crate::error::{FlagError, Result};
use crate::models::{
    CreateFlagRequest, Flag, FlagListResponse, ListFlagsQuery, OverrideListResponse, PageQuery,
    UpdateFlagRequest, UserOverride,
};

#[derive(Debug, Clone)]
pub struct FlagService {
    db: Database,
    cache: Arc<EvaluationCache>,
}

impl FlagService {
    pub fn new(db: Database, cache: Arc<EvaluationCache>) -> Self {
        Self { db, cache }
    }

    // == Flags ==
    pub async fn create(&self, req: CreateFlagRequest) -> Result<Flag> {
        if let Some(msg) = req.validate() {
            return Err(FlagError::Validation(msg));
        }

        let flag = {
            let conn = self.db.connection().await;
            flags::insert(&conn, &req)?
        };
        info!(flag_id = %flag.id, name = %flag.name, "Created feature flag");
        Ok(flag)
    }

    pub async fn list(&self, query: &ListFlagsQuery) -> Result<FlagListResponse> {
        let page = query.page();
        if let Some(msg) = page.validate() {
            return Err(FlagError::InvalidRequest(msg));
        }

        let conn = self.db.connection().await;
        let (items, total) = flags::list(&conn, &page, query.enabled_only)?;
        Ok(FlagListResponse::new(items, total))
    }

    pub async fn get(&self, flag_id: Uuid) -> Result<Flag> {
        let conn = self.db.connection().await;
        flags::get(&conn, flag_id)?.ok_or_else(|| FlagError::flag_not_found(flag_id))
    }

    /// Applies a partial update. An update carrying no fields is rejected.
    pub async fn update(&self, flag_id: Uuid, req: UpdateFlagRequest) -> Result<Flag> {
        if req.is_empty() {
            return Err(FlagError::Validation("No fields provided for update".to_string()));
        }
        if let Some(msg) = req.validate() {
            return Err(FlagError::Validation(msg));
        }

        let flag = {
            let conn = self.db.connection().await;
            flags::update(&conn, flag_id, &req)?
        }
        .ok_or_else(|| FlagError::flag_not_found(flag_id))?;

        self.cache.invalidate_all_for_flag(flag_id);
        info!(%flag_id, "Updated feature flag");
        Ok(flag)
    }

    pub async fn toggle(&self, flag_id: Uuid, is_enabled: bool) -> Result<Flag> {
        let flag = {
            let conn = self.db.connection().await;
            flags::set_enabled(&conn, flag_id, is_enabled)?
        }
        .ok_or_else(|| FlagError::flag_not_found(flag_id))?;

        self.cache.invalidate_all_for_flag(flag_id);
        info!(%flag_id, is_enabled, "Toggled feature flag");
        Ok(flag)
    }

    /// Deletes the flag and its overrides. Returns the deleted flag.
    pub async fn delete(&self, flag_id: Uuid) -> Result<Flag> {
        let flag = {
            let conn = self.db.connection().await;
            flags::delete(&conn, flag_id)?
        }
        .ok_or_else(|| FlagError::flag_not_found(flag_id))?;

        self.cache.invalidate_all_for_flag(flag_id);
        info!(%flag_id, name = %flag.name, "Deleted feature flag");
        Ok(flag)
    }

    // == Overrides ==
    /// Creates or replaces the override for `user_id`.
    ///
    /// Returns the override and whether it was newly created.
    pub async fn set_override(
        &self,
        flag_id: Uuid,
        user_id: &str,
        is_enabled: bool,
    ) -> Result<(UserOverride, bool)> {
        let result = {
            let conn = self.db.connection().await;
            if flags::get(&conn, flag_id)?.is_none() {
                return Err(FlagError::flag_not_found(flag_id));
            }
            overrides::upsert(&conn, flag_id, user_id, is_enabled)?
        };

        self.cache.invalidate_one(flag_id, user_id);
        info!(%flag_id, user_id, is_enabled, created = result.1, "Set user override");
        Ok(result)
    }

    pub async fn delete_override(&self, flag_id: Uuid, user_id: &str) -> Result<()> {
        let removed = {
            let conn = self.db.connection().await;
            if flags::get(&conn, flag_id)?.is_none() {
                return Err(FlagError::flag_not_found(flag_id));
            }
            overrides::delete(&conn, flag_id, user_id)?
        };

        if !removed {
            return Err(FlagError::NotFound(format!(
                "No override found for flag '{}' and user '{}'",
                flag_id, user_id
            )));
        }

        self.cache.invalidate_one(flag_id, user_id);
        info!(%flag_id, user_id, "Removed user override");
        Ok(())
    }

    pub async fn list_overrides(&self, flag_id: Uuid, page: &PageQuery) -> Result<OverrideListResponse> {
        if let Some(msg) = page.validate() {
            return Err(FlagError::InvalidRequest(msg));
        }

        let conn = self.db.connection().await;
        if flags::get(&conn, flag_id)?.is_none() {
            return Err(FlagError::flag_not_found(flag_id));
        }
        let (items, total) = overrides::list(&conn, flag_id, page)?;
        Ok(OverrideListResponse::new(items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Evaluation;
    use crate::service::EvaluationService;
    use std::time::Duration;

    fn services() -> (FlagService, EvaluationService, Arc<EvaluationCache>) {
        let db = Database::open_in_memory().unwrap();
        let cache = Arc::new(EvaluationCache::new(100, Duration::from_secs(60)));
        (
            FlagService::new(db.clone(), cache.clone()),
            EvaluationService::new(db, cache.clone()),
            cache,
        )
    }

    fn create_req(name: &str, is_enabled: bool) -> CreateFlagRequest {
        CreateFlagRequest {
            name: name.to_string(),
            description: None,
            is_enabled,
        }
    }

    async fn eval(evaluator: &EvaluationService, name: &str, user: &str) -> Evaluation {
        evaluator.evaluate(name, user).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_validates_name() {
        let (service, _, _) = services();
        let err = service.create(create_req("", false)).await.unwrap_err();
        assert!(matches!(err, FlagError::Validation(_)));
    }

    #[tokio::test]
    async fn test_toggle_invalidates_every_user() {
        let (service, evaluator, cache) = services();
        let flag = service.create(create_req("tog", false)).await.unwrap();

        assert!(!eval(&evaluator, "tog", "a").await.enabled);
        assert!(!eval(&evaluator, "tog", "b").await.enabled);
        assert_eq!(cache.len(), 2);

        service.toggle(flag.id, true).await.unwrap();
        assert!(cache.is_empty());
        assert!(eval(&evaluator, "tog", "a").await.enabled);
        assert!(eval(&evaluator, "tog", "b").await.enabled);
    }

    #[tokio::test]
    async fn test_update_invalidates_and_rejects_empty() {
        let (service, evaluator, cache) = services();
        let flag = service.create(create_req("upd", false)).await.unwrap();
        eval(&evaluator, "upd", "a").await;

        let err = service
            .update(flag.id, UpdateFlagRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FlagError::Validation(_)));
        assert_eq!(cache.len(), 1);

        let req = UpdateFlagRequest {
            is_enabled: Some(true),
            ..Default::default()
        };
        service.update(flag.id, req).await.unwrap();
        assert!(cache.is_empty());
        assert!(eval(&evaluator, "upd", "a").await.enabled);
    }

    #[tokio::test]
    async fn test_override_invalidates_only_that_user() {
        let (service, evaluator, cache) = services();
        let flag = service.create(create_req("ov", false)).await.unwrap();
        eval(&evaluator, "ov", "a").await;
        eval(&evaluator, "ov", "b").await;

        let (_, created) = service.set_override(flag.id, "a", true).await.unwrap();
        assert!(created);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(flag.id, "b").is_some());
        assert!(eval(&evaluator, "ov", "a").await.enabled);

        let (_, created) = service.set_override(flag.id, "a", false).await.unwrap();
        assert!(!created);
        assert!(!eval(&evaluator, "ov", "a").await.enabled);

        service.delete_override(flag.id, "a").await.unwrap();
        assert!(cache.get(flag.id, "a").is_none());
    }

    #[tokio::test]
    async fn test_override_not_found_cases() {
        let (service, _, _) = services();
        let flag = service.create(create_req("missing", false)).await.unwrap();

        assert!(matches!(
            service.set_override(Uuid::new_v4(), "x", true).await,
            Err(FlagError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_override(flag.id, "nonexistent_user").await,
            Err(FlagError::NotFound(_))
        ));
        assert!(matches!(
            service.list_overrides(Uuid::new_v4(), &PageQuery::default()).await,
            Err(FlagError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_invalidates_and_removes() {
        let (service, evaluator, cache) = services();
        let flag = service.create(create_req("del", true)).await.unwrap();
        eval(&evaluator, "del", "a").await;

        let deleted = service.delete(flag.id).await.unwrap();
        assert_eq!(deleted.name, "del");
        assert!(cache.is_empty());
        assert!(matches!(service.get(flag.id).await, Err(FlagError::NotFound(_))));
        assert!(matches!(
            evaluator.evaluate("del", "a").await,
            Err(FlagError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_rejects_bad_limit() {
        let (service, _, _) = services();
        let query = ListFlagsQuery {
            skip: 0,
            limit: 500,
            enabled_only: false,
        };
        assert!(matches!(
            service.list(&query).await,
            Err(FlagError::InvalidRequest(_))
        ));
    }
}
