pub mod cache;
pub mod config;
pub mod credentials;
pub mod fetch;
pub mod logging;
pub mod output;
pub mod provider;
pub mod scoring;
