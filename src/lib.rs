pub mod dates;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod search;
pub mod source;
pub mod store;
