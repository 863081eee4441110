//! Configuration module for Lattice.
//!
//! Handles the compiler dialect, type-mapping switches and named
//! connections, read from `lattice.toml` with environment expansion.

mod connection;
mod settings;

pub use connection::Driver;
pub use settings::{
    expand_env_vars, CompilerSettings, ConnectionSettings, Settings, SettingsError,
    TypeMappingSettings,
};
