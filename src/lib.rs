//! # JunoKV - A Multi-Database In-Memory Key-Value Store
//!
//! JunoKV keeps scalars, lists and field maps in memory, spread over any
//! number of lazily created databases, and serves them over a line-oriented
//! text protocol. Keys can carry a time-to-live; a background sweeper per
//! database removes them once it elapses.
//!
//! ## Features
//!
//! - **Typed Values**: a key holds a scalar, a list or a field map; the kind is
//!   fixed until the key is removed
//! - **Multiple Databases**: `select <id>` creates databases on first use
//! - **TTL Support**: relative (`expire`) and absolute (`expireat`) deadlines
//! - **Async I/O**: Built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              JunoKV                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │ select / keyed verbs    │
//! │                                               ▼                         │
//! │                     ┌──────────────────────────────────────────────┐    │
//! │                     │                 Registry                     │    │
//! │                     │  ┌────────┐ ┌────────┐ ┌────────┐            │    │
//! │                     │  │Store 0 │ │Store 1 │ │...     │            │    │
//! │                     │  │RwLock  │ │RwLock  │ │        │            │    │
//! │                     │  └───▲────┘ └───▲────┘ └────────┘            │    │
//! │                     │  ┌───┴────┐ ┌───┴────┐                       │    │
//! │                     │  │Sweeper │ │Sweeper │  one per store        │    │
//! │                     │  └────────┘ └────────┘                       │    │
//! │                     └──────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use junokv::commands::CommandHandler;
//! use junokv::connection::{handle_connection, ConnectionStats};
//! use junokv::storage::{ExpiryConfig, Registry};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create the registry (starts the default database and its sweeper)
//!     let registry = Arc::new(Registry::new(ExpiryConfig::default()));
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:8000").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&registry));
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, "127.0.0.1:8000".into(), handler, stats));
//!     }
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: line framing, tokenizing and reply rendering
//! - [`storage`]: values, stores, the registry and the expiry sweeper
//! - [`commands`]: the command dispatcher
//! - [`connection`]: client session management

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{tokenize, ParseError, Reply};
pub use storage::{ExpiryConfig, ExpirySweeper, Registry, StorageError, Store, DEFAULT_DB};

/// The default port JunoKV listens on
pub const DEFAULT_PORT: u16 = 8000;

/// The default host JunoKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of JunoKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
