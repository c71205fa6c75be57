//! Command Handler Module
//!
//! This module implements the command processing layer for JunoKV.
//! It receives raw command lines, validates them, executes them against the
//! selected database and returns a reply.
//!
//! ## Architecture
//!
//! ```text
//! Client Line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Tokenizer      │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Resolve verb │
//! │  - Check arity  │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Registry/Store  │  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;

// Re-export the main command handler
pub use handler::{CommandError, CommandHandler, KeyedVerb, Verb};
