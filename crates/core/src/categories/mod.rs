pub mod categories_model;
pub mod categories_traits;

pub use categories_model::*;
pub use categories_traits::*;
