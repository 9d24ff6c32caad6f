pub mod expenses_model;
pub mod expenses_traits;

pub use expenses_model::*;
pub use expenses_traits::*;
