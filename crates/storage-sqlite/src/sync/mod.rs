pub mod model;
pub mod repository;

pub use model::SyncOutboxEventDB;
pub use repository::{
    write_outbox_event, OutboxRepository, OutboxWriteRequest, SyncMetadataRepository,
};
