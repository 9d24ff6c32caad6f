//! Repository contract for allocation templates.

use async_trait::async_trait;

use super::{AllocationTemplateWithBuckets, NewAllocationBucket, NewAllocationTemplate};
use crate::errors::Result;

#[async_trait]
pub trait AllocationRepositoryTrait: Send + Sync {
    fn get_templates_by_user(&self, user_id: i32) -> Result<Vec<AllocationTemplateWithBuckets>>;
    fn get_template(&self, template_id: i32) -> Result<AllocationTemplateWithBuckets>;
    async fn create_template(
        &self,
        new_template: NewAllocationTemplate,
    ) -> Result<AllocationTemplateWithBuckets>;
    /// Replaces the template name and its full bucket set.
    async fn update_template(
        &self,
        template_id: i32,
        name: String,
        buckets: Vec<NewAllocationBucket>,
    ) -> Result<AllocationTemplateWithBuckets>;
    async fn delete_template(&self, template_id: i32) -> Result<()>;
}
