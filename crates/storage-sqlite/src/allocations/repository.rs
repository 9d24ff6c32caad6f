use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use budgetbook_core::allocations::{
    AllocationBucket, AllocationRepositoryTrait, AllocationTemplate,
    AllocationTemplateWithBuckets, NewAllocationBucket, NewAllocationTemplate,
};
use budgetbook_core::errors::{Error, Result, ValidationError};
use budgetbook_core::sync::{SyncAction, SyncEntityKind};

use super::model::{
    AllocationBucketDB, AllocationTemplateDB, NewAllocationBucketDB, NewAllocationTemplateDB,
};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{allocation_buckets, allocation_templates};
use crate::sync::{write_outbox_event, OutboxWriteRequest};

pub struct AllocationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AllocationRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn validate_buckets(buckets: &[NewAllocationBucket]) -> Result<()> {
    for bucket in buckets {
        if !(0.0..=100.0).contains(&bucket.percentage) {
            return Err(Error::Validation(ValidationError::OutOfRange {
                field: "percentage".to_string(),
                reason: "must be between 0 and 100".to_string(),
            }));
        }
        if bucket.category_id.is_some() && bucket.legacy_label.is_some() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "bucket must reference a category or carry a legacy label, not both".to_string(),
            )));
        }
    }
    Ok(())
}

fn load_template_tx(
    conn: &mut SqliteConnection,
    template_id: i32,
) -> Result<AllocationTemplateWithBuckets> {
    let template = allocation_templates::table
        .find(template_id)
        .first::<AllocationTemplateDB>(conn)
        .map_err(StorageError::from)?;
    let buckets = AllocationBucketDB::belonging_to(&template)
        .order(allocation_buckets::id.asc())
        .load::<AllocationBucketDB>(conn)
        .map_err(StorageError::from)?;

    Ok(AllocationTemplateWithBuckets {
        template: AllocationTemplate::from(template),
        buckets: buckets.into_iter().map(AllocationBucket::from).collect(),
    })
}

fn insert_buckets_tx(
    conn: &mut SqliteConnection,
    template_id: i32,
    buckets: Vec<NewAllocationBucket>,
) -> Result<()> {
    for bucket in buckets {
        let row = NewAllocationBucketDB {
            template_id,
            category_id: bucket.category_id,
            legacy_label: bucket.legacy_label,
            percentage: bucket.percentage,
            target_amount: bucket.target_amount,
            is_active: true,
        };
        diesel::insert_into(allocation_buckets::table)
            .values(&row)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

fn enqueue_allocation_event(
    conn: &mut SqliteConnection,
    action: SyncAction,
    snapshot: &AllocationTemplateWithBuckets,
) -> Result<()> {
    write_outbox_event(
        conn,
        OutboxWriteRequest::new(
            SyncEntityKind::Allocation,
            action,
            snapshot.template.id,
            serde_json::to_value(snapshot)?,
        ),
    )?;
    Ok(())
}

#[async_trait]
impl AllocationRepositoryTrait for AllocationRepository {
    fn get_templates_by_user(&self, user_id: i32) -> Result<Vec<AllocationTemplateWithBuckets>> {
        let mut conn = get_connection(&self.pool)?;
        let templates = allocation_templates::table
            .filter(allocation_templates::user_id.eq(user_id))
            .filter(allocation_templates::is_active.eq(true))
            .order(allocation_templates::created_at.asc())
            .load::<AllocationTemplateDB>(&mut conn)
            .map_err(StorageError::from)?;

        let buckets = AllocationBucketDB::belonging_to(&templates)
            .order(allocation_buckets::id.asc())
            .load::<AllocationBucketDB>(&mut conn)
            .map_err(StorageError::from)?
            .grouped_by(&templates);

        Ok(templates
            .into_iter()
            .zip(buckets)
            .map(|(template, buckets)| AllocationTemplateWithBuckets {
                template: AllocationTemplate::from(template),
                buckets: buckets.into_iter().map(AllocationBucket::from).collect(),
            })
            .collect())
    }

    fn get_template(&self, template_id: i32) -> Result<AllocationTemplateWithBuckets> {
        let mut conn = get_connection(&self.pool)?;
        load_template_tx(&mut conn, template_id)
    }

    async fn create_template(
        &self,
        new_template: NewAllocationTemplate,
    ) -> Result<AllocationTemplateWithBuckets> {
        if new_template.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        validate_buckets(&new_template.buckets)?;

        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let row = NewAllocationTemplateDB {
                    user_id: new_template.user_id,
                    name: new_template.name.trim().to_string(),
                    is_active: true,
                    needs_sync: true,
                    created_at: now.clone(),
                    updated_at: now,
                };

                let inserted = diesel::insert_into(allocation_templates::table)
                    .values(&row)
                    .returning(AllocationTemplateDB::as_returning())
                    .get_result::<AllocationTemplateDB>(conn)
                    .map_err(StorageError::from)?;

                insert_buckets_tx(conn, inserted.id, new_template.buckets)?;

                let created = load_template_tx(conn, inserted.id)?;
                enqueue_allocation_event(conn, SyncAction::Create, &created)?;
                Ok(created)
            })
            .await
    }

    async fn update_template(
        &self,
        template_id: i32,
        name: String,
        buckets: Vec<NewAllocationBucket>,
    ) -> Result<AllocationTemplateWithBuckets> {
        validate_buckets(&buckets)?;

        self.writer
            .exec(move |conn| {
                diesel::update(allocation_templates::table.find(template_id))
                    .set((
                        allocation_templates::name.eq(name),
                        allocation_templates::needs_sync.eq(true),
                        allocation_templates::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                // The bucket set is replaced wholesale; bucket ids are not
                // stable across edits.
                diesel::delete(
                    allocation_buckets::table
                        .filter(allocation_buckets::template_id.eq(template_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                insert_buckets_tx(conn, template_id, buckets)?;

                let updated = load_template_tx(conn, template_id)?;
                enqueue_allocation_event(conn, SyncAction::Update, &updated)?;
                Ok(updated)
            })
            .await
    }

    async fn delete_template(&self, template_id: i32) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let snapshot = load_template_tx(conn, template_id)?;

                diesel::delete(
                    allocation_buckets::table
                        .filter(allocation_buckets::template_id.eq(template_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                diesel::delete(allocation_templates::table.find(template_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                enqueue_allocation_event(conn, SyncAction::Delete, &snapshot)?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetbook_core::errors::DatabaseError;
    use budgetbook_core::users::{NewUser, UserRepositoryTrait};
    use tempfile::tempdir;

    use crate::db::{create_pool, init, run_migrations, spawn_writer, DbPool};
    use crate::users::UserRepository;

    async fn setup() -> (AllocationRepository, i32) {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        let pool: Arc<DbPool> = create_pool(&db_path).expect("create pool");
        run_migrations(&pool).expect("migrate db");
        let writer = spawn_writer(pool.as_ref().clone());

        let users = UserRepository::new(pool.clone(), writer.clone());
        let user = users
            .create_user(NewUser {
                email: "alloc@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: "Alloc".to_string(),
                currency: "EUR".to_string(),
                financial_goals: None,
            })
            .await
            .expect("create user");

        (AllocationRepository::new(pool, writer), user.id)
    }

    fn fifty_thirty_twenty(user_id: i32) -> NewAllocationTemplate {
        NewAllocationTemplate {
            user_id,
            name: "50/30/20".to_string(),
            buckets: vec![
                NewAllocationBucket {
                    category_id: None,
                    legacy_label: Some("Needs".to_string()),
                    percentage: 50.0,
                    target_amount: None,
                },
                NewAllocationBucket {
                    category_id: None,
                    legacy_label: Some("Wants".to_string()),
                    percentage: 30.0,
                    target_amount: None,
                },
                NewAllocationBucket {
                    category_id: None,
                    legacy_label: Some("Savings".to_string()),
                    percentage: 20.0,
                    target_amount: Some(400.0),
                },
            ],
        }
    }

    #[tokio::test]
    async fn create_returns_template_with_buckets() {
        let (repo, user_id) = setup().await;
        let created = repo
            .create_template(fifty_thirty_twenty(user_id))
            .await
            .expect("create");
        assert_eq!(created.buckets.len(), 3);
        assert!(created.template.needs_sync);

        let listed = repo.get_templates_by_user(user_id).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], created);
    }

    #[tokio::test]
    async fn update_replaces_the_bucket_set() {
        let (repo, user_id) = setup().await;
        let created = repo
            .create_template(fifty_thirty_twenty(user_id))
            .await
            .expect("create");

        let updated = repo
            .update_template(
                created.template.id,
                "Simple".to_string(),
                vec![NewAllocationBucket {
                    category_id: None,
                    legacy_label: Some("Everything".to_string()),
                    percentage: 100.0,
                    target_amount: None,
                }],
            )
            .await
            .expect("update");
        assert_eq!(updated.template.name, "Simple");
        assert_eq!(updated.buckets.len(), 1);
        assert_eq!(updated.buckets[0].percentage, 100.0);
    }

    #[tokio::test]
    async fn out_of_range_percentage_is_rejected() {
        let (repo, user_id) = setup().await;
        let mut template = fifty_thirty_twenty(user_id);
        template.buckets[0].percentage = 120.0;

        let err = repo.create_template(template).await.expect_err("over 100");
        assert!(matches!(
            err,
            Error::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn delete_removes_template_and_buckets() {
        let (repo, user_id) = setup().await;
        let created = repo
            .create_template(fifty_thirty_twenty(user_id))
            .await
            .expect("create");

        repo.delete_template(created.template.id).await.expect("delete");
        let err = repo.get_template(created.template.id).expect_err("gone");
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }
}
