//! Connection Handler Module
//!
//! This module manages individual client sessions with JunoKV.
//! Each client connection is handled by its own async task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (main.rs)                                │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept() + spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│ Frame line  │───>│ Execute cmd │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               ▼             │
//! │                                   ┌──────────────────┐      │
//! │                                   │ Reply + prompt   │      │
//! │                                   └──────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use junokv::connection::{handle_connection, ConnectionStats};
//! use junokv::commands::CommandHandler;
//! use junokv::storage::{ExpiryConfig, Registry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new(ExpiryConfig::default()));
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! let handler = CommandHandler::new(Arc::clone(&registry));
//! tokio::spawn(handle_connection(stream, addr, "127.0.0.1:8000".into(), handler, stats));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
