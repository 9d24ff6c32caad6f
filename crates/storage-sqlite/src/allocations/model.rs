//! Database models for allocation templates and buckets.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetbook_core::allocations::{AllocationBucket, AllocationTemplate};

#[derive(
    Queryable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::allocation_templates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AllocationTemplateDB {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub needs_sync: bool,
    pub api_id: Option<String>,
    pub synced_at: Option<String>,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::allocation_templates)]
#[serde(rename_all = "camelCase")]
pub struct NewAllocationTemplateDB {
    pub user_id: i32,
    pub name: String,
    pub is_active: bool,
    pub needs_sync: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(
    Queryable, Identifiable, AsChangeset, Selectable, Associations, PartialEq, Serialize,
    Deserialize, Debug, Clone,
)]
#[diesel(belongs_to(AllocationTemplateDB, foreign_key = template_id))]
#[diesel(table_name = crate::schema::allocation_buckets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AllocationBucketDB {
    pub id: i32,
    pub template_id: i32,
    pub category_id: Option<i32>,
    pub legacy_label: Option<String>,
    pub percentage: f64,
    pub target_amount: Option<f64>,
    pub is_active: bool,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::allocation_buckets)]
#[serde(rename_all = "camelCase")]
pub struct NewAllocationBucketDB {
    pub template_id: i32,
    pub category_id: Option<i32>,
    pub legacy_label: Option<String>,
    pub percentage: f64,
    pub target_amount: Option<f64>,
    pub is_active: bool,
}

impl From<AllocationTemplateDB> for AllocationTemplate {
    fn from(db: AllocationTemplateDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            is_active: db.is_active,
            needs_sync: db.needs_sync,
            api_id: db.api_id,
            synced_at: db.synced_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<AllocationBucketDB> for AllocationBucket {
    fn from(db: AllocationBucketDB) -> Self {
        Self {
            id: db.id,
            template_id: db.template_id,
            category_id: db.category_id,
            legacy_label: db.legacy_label,
            percentage: db.percentage,
            target_amount: db.target_amount,
            is_active: db.is_active,
        }
    }
}
