pub mod income_model;
pub mod income_traits;

pub use income_model::*;
pub use income_traits::*;
