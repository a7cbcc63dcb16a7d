pub mod endpoints;
pub mod handler;
pub mod key;
pub mod upstream;
