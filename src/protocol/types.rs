//! Reply Types
//!
//! Every command produces exactly one [`Reply`]. Replies render to a single
//! line of human-readable text.
//!
//! ## Rendering
//!
//! ```text
//! Ok              OK
//! Text("v")       v
//! Integer(5)      5
//! List([a, b])    [a b]
//! Map({k: v})     map[k:v]
//! Error(e)        ERROR: ...
//! Silent          (nothing, only the prompt follows)
//! ```

use crate::storage::FieldMap;
use std::fmt;

/// The outcome of one command, ready to be written back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Successful mutation
    Ok,

    /// A scalar value or single element
    Text(String),

    /// A number, such as a TTL
    Integer(i64),

    /// A sequence of strings
    List(Vec<String>),

    /// A field map, rendered in field order
    Map(FieldMap),

    /// A human-readable error message
    Error(String),

    /// No reply line at all (e.g. after `select`)
    Silent,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Ok
    }

    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }

    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    pub fn list(items: Vec<String>) -> Self {
        Reply::List(items)
    }

    pub fn map(dict: FieldMap) -> Self {
        Reply::Map(dict)
    }

    /// Creates an error reply from anything printable.
    pub fn error(e: impl fmt::Display) -> Self {
        Reply::Error(e.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Renders the reply as one line, without a trailing newline.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Text(s) => write!(f, "{}", s),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::List(items) => write!(f, "[{}]", items.join(" ")),
            Reply::Map(dict) => {
                write!(f, "map[")?;
                for (i, (field, value)) in dict.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}:{}", field, value)?;
                }
                write!(f, "]")
            }
            Reply::Error(msg) => write!(f, "{}", msg),
            Reply::Silent => Ok(()),
        }
    }
}
