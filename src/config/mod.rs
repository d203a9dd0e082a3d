//! Configuration management for plugman

pub mod config;
pub mod paths;
pub mod policy;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use paths::PathsConfig;
pub use policy::PolicyConfig;
