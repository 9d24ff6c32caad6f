//! Profile reconciliation between the local user row and the backend.
//!
//! Entity rows flow one way through the outbox; the user profile is the
//! one record edited on both sides, so it goes through the conflict
//! resolver instead.

use std::sync::Arc;

use log::info;

use budgetbook_core::conflict::{
    has_conflict, recommended_strategy, resolve_conflict, ProfileSnapshot, ResolvedProfile,
    SyncDataType,
};
use budgetbook_core::errors::{Error, Result};
use budgetbook_core::users::{UserRepositoryTrait, UserUpdate};

use crate::api::RemoteApi;

pub struct ProfileReconciler {
    api: Arc<dyn RemoteApi>,
    users: Arc<dyn UserRepositoryTrait>,
}

impl ProfileReconciler {
    pub fn new(api: Arc<dyn RemoteApi>, users: Arc<dyn UserRepositoryTrait>) -> Self {
        Self { api, users }
    }

    /// Pull the remote profile, resolve any conflict with the local row and
    /// persist the outcome on both sides. Returns `None` when the two
    /// sides already agree.
    pub async fn reconcile(&self, user_id: i32) -> Result<Option<ResolvedProfile>> {
        let user = self.users.get_user(user_id)?;
        let local = ProfileSnapshot {
            name: user.name.clone(),
            currency: user.currency.clone(),
            financial_goals: user.financial_goals.clone(),
            updated_at: Some(user.updated_at.clone()),
            created_at: Some(user.created_at.clone()),
        };

        let remote = self.api.get_profile().await.map_err(Error::from)?;
        if !has_conflict(&local, &remote) {
            return Ok(None);
        }

        let resolved = resolve_conflict(
            &local,
            &remote,
            recommended_strategy(SyncDataType::UserProfile),
        );
        info!(
            "profile conflict for user {} resolved via {:?}",
            user_id, resolved.sync_status
        );

        self.users
            .update_user(
                user_id,
                UserUpdate {
                    name: Some(resolved.profile.name.clone()),
                    currency: Some(resolved.profile.currency.clone()),
                    financial_goals: resolved.profile.financial_goals.clone(),
                },
            )
            .await?;
        self.api
            .update_profile(&resolved.profile)
            .await
            .map_err(Error::from)?;

        Ok(Some(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use budgetbook_core::conflict::ConflictStrategy;
    use budgetbook_core::users::NewUser;
    use budgetbook_storage_sqlite::users::UserRepository;
    use budgetbook_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, DbPool};

    use crate::testing::MockRemoteApi;

    async fn setup() -> (ProfileReconciler, Arc<MockRemoteApi>, Arc<UserRepository>, i32) {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        let pool: Arc<DbPool> = create_pool(&db_path).expect("create pool");
        run_migrations(&pool).expect("migrate db");
        let writer = spawn_writer(pool.as_ref().clone());

        let users = Arc::new(UserRepository::new(pool, writer));
        let user = users
            .create_user(NewUser {
                email: "profile@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: "Before".to_string(),
                currency: "EUR".to_string(),
                financial_goals: None,
            })
            .await
            .expect("create user");

        let api = Arc::new(MockRemoteApi::default());
        let reconciler = ProfileReconciler::new(api.clone(), users.clone());
        (reconciler, api, users, user.id)
    }

    #[tokio::test]
    async fn matching_profiles_need_no_write() {
        let (reconciler, api, users, user_id) = setup().await;
        let user = users.get_user(user_id).expect("load");
        *api.remote_profile.lock().expect("profile lock") = Some(ProfileSnapshot {
            name: user.name,
            currency: user.currency,
            financial_goals: user.financial_goals,
            updated_at: Some(user.updated_at),
            created_at: Some(user.created_at),
        });

        let outcome = reconciler.reconcile(user_id).await.expect("reconcile");
        assert!(outcome.is_none());
        assert_eq!(api.calls(), vec!["get_profile"]);
    }

    #[tokio::test]
    async fn conflicting_profile_is_merged_and_written_both_ways() {
        let (reconciler, api, users, user_id) = setup().await;
        // remote carries an older edit with a different currency
        *api.remote_profile.lock().expect("profile lock") = Some(ProfileSnapshot {
            name: "Remote Name".to_string(),
            currency: "USD".to_string(),
            financial_goals: Some("{\"target\":5000}".to_string()),
            updated_at: Some("2000-01-01T00:00:00+00:00".to_string()),
            created_at: Some("2000-01-01T00:00:00+00:00".to_string()),
        });

        let outcome = reconciler
            .reconcile(user_id)
            .await
            .expect("reconcile")
            .expect("conflict resolved");
        assert_eq!(outcome.sync_status, ConflictStrategy::Merge);
        // local row is newer, so its name and currency win the merge
        assert_eq!(outcome.profile.name, "Before");
        assert_eq!(outcome.profile.currency, "EUR");

        let reloaded = users.get_user(user_id).expect("reload");
        assert_eq!(reloaded.currency, "EUR");
        assert_eq!(api.calls(), vec!["get_profile", "update_profile"]);
    }
}
