//! Line Protocol Implementation
//!
//! Clients talk to JunoKV with plain text: one command per line, one reply
//! line back, followed by a prompt.
//!
//! ## Modules
//!
//! - `parser`: line framing and quote-aware tokenizing
//! - `types`: the `Reply` enum and its text rendering
//!
//! ## Example
//!
//! ```
//! use junokv::protocol::{tokenize, Reply};
//!
//! let tokens = tokenize(r#"set name "John Doe""#).unwrap();
//! assert_eq!(tokens, ["set", "name", "John Doe"]);
//!
//! assert_eq!(Reply::list(vec!["a".into(), "b".into()]).render(), "[a b]");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_line, tokenize, LineParser, ParseError, ParseResult, MAX_LINE_SIZE};
pub use types::Reply;
