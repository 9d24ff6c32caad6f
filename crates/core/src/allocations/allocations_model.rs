//! Domain models for budget allocation templates and buckets.

use serde::{Deserialize, Serialize};

/// Groups allocation buckets for one user (e.g. a 50/30/20 split).
///
/// Carries the same sync-metadata triplet as income and expenses so the
/// allocation sync handler can bridge id spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTemplate {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub is_active: bool,
    pub needs_sync: bool,
    pub api_id: Option<String>,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One slice of a template.
///
/// A bucket points at a real category row when one exists; buckets created
/// from historical/default categories that never got a row of their own keep
/// a free-text `legacy_label` instead. Exactly one of the two should be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBucket {
    pub id: i32,
    pub template_id: i32,
    pub category_id: Option<i32>,
    pub legacy_label: Option<String>,
    /// 0–100. Active bucket percentages under one template should sum to
    /// 100; the store does not enforce this (UI-level rule).
    pub percentage: f64,
    pub target_amount: Option<f64>,
    pub is_active: bool,
}

/// A template with its buckets, as read and as snapshotted into the outbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTemplateWithBuckets {
    #[serde(flatten)]
    pub template: AllocationTemplate,
    pub buckets: Vec<AllocationBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAllocationTemplate {
    pub user_id: i32,
    pub name: String,
    pub buckets: Vec<NewAllocationBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAllocationBucket {
    pub category_id: Option<i32>,
    pub legacy_label: Option<String>,
    pub percentage: f64,
    pub target_amount: Option<f64>,
}
