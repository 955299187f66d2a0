//! Core types for sigil: the replacement table and converter, the slash
//! command registry and dispatcher, configuration, and the shared error and
//! clipboard interfaces.

pub mod clipboard;
pub mod command;
pub mod config;
pub mod error;
pub mod replacements;

pub use clipboard::Clipboard;
pub use config::Config;
pub use error::{Result, SigilError};
pub use replacements::{Replacement, ReplacementTable, SharedTable};
