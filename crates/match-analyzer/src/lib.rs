pub use gammon_core;

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod document;
pub mod error;
pub mod gnubg;
pub mod hint;
pub mod oracle;
pub mod position;
