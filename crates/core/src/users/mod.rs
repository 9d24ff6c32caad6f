pub mod users_model;
pub mod users_traits;

pub use users_model::*;
pub use users_traits::*;
