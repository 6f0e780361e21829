// src/config/mod.rs
pub mod credentials;
pub mod engine;

pub use credentials::{Credentials, RedditCredentials};
pub use engine::EngineConfig;
