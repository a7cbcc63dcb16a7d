pub mod store;
pub mod token;
