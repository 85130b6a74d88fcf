pub mod error;
pub mod lookup;
pub mod model;
pub mod store;
