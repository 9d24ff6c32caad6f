pub mod allocations_model;
pub mod allocations_traits;

pub use allocations_model::*;
pub use allocations_traits::*;
