pub mod cache;
pub mod mqtt;
pub mod registry;
