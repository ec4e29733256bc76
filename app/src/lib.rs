pub mod adapter;
pub mod core;
pub mod error;
pub mod meter;
pub mod settings;
