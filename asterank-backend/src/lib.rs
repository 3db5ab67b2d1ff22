pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod module;
pub mod service;
pub mod store;
