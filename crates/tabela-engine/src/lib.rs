//! tabela_engine - Formula engine + Rhai integration.

pub(crate) mod builtins;
pub mod engine;
pub mod error;

pub use error::{EngineError, Result};
