//! Command Handler
//!
//! Turns one raw command line into one [`Reply`]. A handler belongs to a
//! single connection and remembers which database that connection selected.
//!
//! ## Supported Commands
//!
//! ### Scalar Commands
//! - `set key value` - Store a scalar
//! - `get key` - Read a scalar
//!
//! ### List Commands
//! - `lset key item [item ...]` - Store a list
//! - `lget key` - Read the whole list
//! - `lgetit key index` - Read one element
//! - `lupdate key index value` - Replace one element
//!
//! ### Map Commands
//! - `hset key field value [field value ...]` - Store a field map
//! - `hget key` - Read the whole map
//! - `hgetval key field` - Read one field
//! - `hupdate key field value` - Insert or overwrite one field
//!
//! ### Key Commands
//! - `ttl key` - Remaining seconds, or `-1` if the key never expires
//! - `expire key seconds` - Expire after a duration
//! - `expireat key timestamp` - Expire at an absolute unix time
//! - `persist key` - Remove the expiry
//! - `remove key` - Delete the key
//! - `keys` - List every key of the selected database
//!
//! ### Connection Commands
//! - `select db` - Switch to another database, creating it if needed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────────┐        │
//! │  │ tokenize() │──>│ check arity │──>│  dispatch()  │        │
//! │  └────────────┘   └─────────────┘   └──────┬───────┘        │
//! │                                            │                │
//! │                                            ▼                │
//! │                               Store (via Registry)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::protocol::{tokenize, ParseError, Reply};
use crate::storage::{FieldMap, Registry, StorageError, Store, DEFAULT_DB};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while validating or executing a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("ERROR: not enough arguments")]
    TooFewArguments,

    #[error("ERROR: too many arguments")]
    TooManyArguments,

    /// `hset` got a field without a value
    #[error("ERROR: value is missed")]
    MissingValue,

    #[error("ERROR: key is not specified")]
    KeyNotSpecified,

    #[error("ERROR: unknown command '{0}'")]
    UnknownCommand(String),

    /// An index, duration or timestamp that is not an integer
    #[error("ERROR: wrong argument type: {0:?} is not an integer")]
    MalformedNumericArgument(String),

    #[error("ERROR: wrong number of arguments for 'select' command")]
    SelectArity,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Every verb the handler understands.
///
/// `select` and `keys` act on the connection or the whole store; every other
/// verb addresses a single key and is a [`KeyedVerb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Select,
    Keys,
    Keyed(KeyedVerb),
}

/// Verbs whose first argument is a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedVerb {
    Set,
    Get,
    LSet,
    LGet,
    LGetIt,
    LUpdate,
    HSet,
    HGet,
    HGetVal,
    HUpdate,
    Ttl,
    Expire,
    ExpireAt,
    Persist,
    Remove,
}

impl Verb {
    pub const ALL: [Verb; 17] = [
        Verb::Select,
        Verb::Keys,
        Verb::Keyed(KeyedVerb::Set),
        Verb::Keyed(KeyedVerb::Get),
        Verb::Keyed(KeyedVerb::LSet),
        Verb::Keyed(KeyedVerb::LGet),
        Verb::Keyed(KeyedVerb::LGetIt),
        Verb::Keyed(KeyedVerb::LUpdate),
        Verb::Keyed(KeyedVerb::HSet),
        Verb::Keyed(KeyedVerb::HGet),
        Verb::Keyed(KeyedVerb::HGetVal),
        Verb::Keyed(KeyedVerb::HUpdate),
        Verb::Keyed(KeyedVerb::Ttl),
        Verb::Keyed(KeyedVerb::Expire),
        Verb::Keyed(KeyedVerb::ExpireAt),
        Verb::Keyed(KeyedVerb::Persist),
        Verb::Keyed(KeyedVerb::Remove),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Verb::Select => "select",
            Verb::Keys => "keys",
            Verb::Keyed(verb) => verb.name(),
        }
    }

    /// Looks a verb up by name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Verb> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.name().eq_ignore_ascii_case(name))
    }

    /// Minimum and maximum number of arguments (`None` = unbounded).
    /// For keyed verbs the bounds exclude the key.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Verb::Select => (1, Some(1)),
            Verb::Keys => (0, Some(0)),
            Verb::Keyed(verb) => verb.arity(),
        }
    }

    fn check_arity(&self, count: usize) -> Result<(), CommandError> {
        let (min, max) = self.arity();
        if count < min {
            return Err(CommandError::TooFewArguments);
        }
        if max.is_some_and(|max| count > max) {
            return Err(CommandError::TooManyArguments);
        }
        Ok(())
    }
}

impl KeyedVerb {
    pub fn name(&self) -> &'static str {
        match self {
            KeyedVerb::Set => "set",
            KeyedVerb::Get => "get",
            KeyedVerb::LSet => "lset",
            KeyedVerb::LGet => "lget",
            KeyedVerb::LGetIt => "lgetit",
            KeyedVerb::LUpdate => "lupdate",
            KeyedVerb::HSet => "hset",
            KeyedVerb::HGet => "hget",
            KeyedVerb::HGetVal => "hgetval",
            KeyedVerb::HUpdate => "hupdate",
            KeyedVerb::Ttl => "ttl",
            KeyedVerb::Expire => "expire",
            KeyedVerb::ExpireAt => "expireat",
            KeyedVerb::Persist => "persist",
            KeyedVerb::Remove => "remove",
        }
    }

    /// Bounds on the arguments after the key.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            KeyedVerb::Set => (1, Some(1)),
            KeyedVerb::Get => (0, Some(0)),
            KeyedVerb::LSet => (1, None),
            KeyedVerb::LGet => (0, Some(0)),
            KeyedVerb::LGetIt => (1, Some(1)),
            KeyedVerb::LUpdate => (2, Some(2)),
            KeyedVerb::HSet => (2, None),
            KeyedVerb::HGet => (0, Some(0)),
            KeyedVerb::HGetVal => (1, Some(1)),
            KeyedVerb::HUpdate => (2, Some(2)),
            KeyedVerb::Ttl => (0, Some(0)),
            KeyedVerb::Expire => (1, Some(1)),
            KeyedVerb::ExpireAt => (1, Some(1)),
            KeyedVerb::Persist => (0, Some(0)),
            KeyedVerb::Remove => (0, Some(0)),
        }
    }
}

/// Executes command lines against the database selected by one connection.
pub struct CommandHandler {
    registry: Arc<Registry>,
    /// Currently selected database id
    db_id: String,
    store: Arc<Store>,
}

impl CommandHandler {
    /// Creates a handler pointed at the default database.
    pub fn new(registry: Arc<Registry>) -> Self {
        let store = registry.get_or_create(DEFAULT_DB);
        Self {
            registry,
            db_id: DEFAULT_DB.to_string(),
            store,
        }
    }

    /// Returns the id of the selected database.
    pub fn db_id(&self) -> &str {
        &self.db_id
    }

    /// Returns the selected database.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Executes a command line and returns the reply.
    ///
    /// Errors are rendered into [`Reply::Error`]; they never escape.
    pub fn execute(&mut self, line: &str) -> Reply {
        match self.try_execute(line) {
            Ok(reply) => reply,
            Err(e) => {
                trace!(db = %self.db_id, error = %e, "Command failed");
                Reply::error(e)
            }
        }
    }

    /// Executes a command line, returning errors as values.
    pub fn try_execute(&mut self, line: &str) -> Result<Reply, CommandError> {
        let tokens = tokenize(line)?;
        let (name, args) = tokens
            .split_first()
            .ok_or(CommandError::Parse(ParseError::EmptyCommand))?;

        let verb =
            Verb::parse(name).ok_or_else(|| CommandError::UnknownCommand(name.clone()))?;
        trace!(db = %self.db_id, verb = verb.name(), args = args.len(), "Executing command");

        match verb {
            Verb::Select => self.cmd_select(args),
            Verb::Keys => self.cmd_keys(args),
            Verb::Keyed(keyed) => {
                let (key, args) = args.split_first().ok_or(CommandError::KeyNotSpecified)?;
                verb.check_arity(args.len())?;
                self.dispatch(keyed, key, args)
            }
        }
    }

    /// Dispatches a keyed command to the selected store.
    fn dispatch(
        &self,
        verb: KeyedVerb,
        key: &str,
        args: &[String],
    ) -> Result<Reply, CommandError> {
        let store = &self.store;

        let reply = match verb {
            // Scalar commands
            KeyedVerb::Set => {
                store.set(key, args[0].clone())?;
                Reply::ok()
            }
            KeyedVerb::Get => Reply::text(store.get(key)?),

            // List commands
            KeyedVerb::LSet => {
                store.lset(key, args.to_vec())?;
                Reply::ok()
            }
            KeyedVerb::LGet => Reply::list(store.lget(key)?),
            KeyedVerb::LGetIt => {
                let index = parse_integer(&args[0])?;
                Reply::text(store.lget_at(key, index)?)
            }
            KeyedVerb::LUpdate => {
                let index = parse_integer(&args[0])?;
                store.lupdate(key, index, args[1].clone())?;
                Reply::ok()
            }

            // Map commands
            KeyedVerb::HSet => {
                store.hset(key, parse_field_map(args)?)?;
                Reply::ok()
            }
            KeyedVerb::HGet => Reply::map(store.hget(key)?),
            KeyedVerb::HGetVal => Reply::text(store.hget_field(key, &args[0])?),
            KeyedVerb::HUpdate => {
                store.hupdate(key, args[0].clone(), args[1].clone())?;
                Reply::ok()
            }

            // Key commands
            KeyedVerb::Ttl => Reply::integer(store.ttl(key)?),
            KeyedVerb::Expire => {
                let seconds = parse_integer(&args[0])?;
                store.expire(key, seconds)?;
                Reply::ok()
            }
            KeyedVerb::ExpireAt => {
                let timestamp = parse_integer(&args[0])?;
                store.expire_at(key, timestamp)?;
                Reply::ok()
            }
            KeyedVerb::Persist => {
                store.persist(key)?;
                Reply::ok()
            }
            KeyedVerb::Remove => {
                store.remove(key);
                Reply::ok()
            }
        };

        Ok(reply)
    }

    /// select db
    fn cmd_select(&mut self, args: &[String]) -> Result<Reply, CommandError> {
        if Verb::Select.check_arity(args.len()).is_err() {
            return Err(CommandError::SelectArity);
        }

        let id = &args[0];
        self.store = self.registry.get_or_create(id);
        self.db_id = id.clone();
        debug!(db = %id, "Database selected");

        Ok(Reply::Silent)
    }

    /// keys
    fn cmd_keys(&self, args: &[String]) -> Result<Reply, CommandError> {
        Verb::Keys.check_arity(args.len())?;

        let mut keys = self.store.keys();
        keys.sort_unstable();
        Ok(Reply::list(keys))
    }
}

/// Parses an index, duration or timestamp argument.
fn parse_integer(arg: &str) -> Result<i64, CommandError> {
    arg.parse()
        .map_err(|_| CommandError::MalformedNumericArgument(arg.to_string()))
}

/// Builds a field map from `field value [field value ...]`.
fn parse_field_map(args: &[String]) -> Result<FieldMap, CommandError> {
    if args.len() < 2 {
        return Err(CommandError::TooFewArguments);
    }
    if args.len() % 2 != 0 {
        return Err(CommandError::MissingValue);
    }

    Ok(args
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{sweep_pass, unix_now, ExpiryConfig};

    fn create_handler() -> CommandHandler {
        let registry = Arc::new(Registry::new(ExpiryConfig::default()));
        CommandHandler::new(registry)
    }

    fn run(handler: &mut CommandHandler, line: &str) -> String {
        handler.execute(line).render()
    }

    #[tokio::test]
    async fn test_set_get() {
        let mut handler = create_handler();

        assert_eq!(run(&mut handler, r#"set name "John Doe""#), "OK");
        assert_eq!(run(&mut handler, "get name"), "John Doe");
        assert_eq!(run(&mut handler, "GET name"), "John Doe");
    }

    #[tokio::test]
    async fn test_expire_then_sweep() {
        let mut handler = create_handler();

        run(&mut handler, r#"set name "John Doe""#);
        assert_eq!(run(&mut handler, "expire name 2"), "OK");

        let ttl: i64 = run(&mut handler, "ttl name").parse().unwrap();
        assert!(ttl > 0 && ttl <= 2);

        sweep_pass(handler.store(), unix_now() + 2);
        assert_eq!(run(&mut handler, "get name"), "ERROR: key not exists");
    }

    #[tokio::test]
    async fn test_persist_prevents_removal() {
        let mut handler = create_handler();

        run(&mut handler, "set session abc");
        run(&mut handler, "expire session 10");
        assert_eq!(run(&mut handler, "persist session"), "OK");
        assert_eq!(run(&mut handler, "ttl session"), "-1");

        sweep_pass(handler.store(), unix_now() + 60);
        assert_eq!(run(&mut handler, "get session"), "abc");
    }

    #[tokio::test]
    async fn test_hash_commands() {
        let mut handler = create_handler();

        assert_eq!(run(&mut handler, "hset profile age 30 city NYC"), "OK");
        assert_eq!(run(&mut handler, "hgetval profile age"), "30");
        assert_eq!(run(&mut handler, "hupdate profile age 31"), "OK");
        assert_eq!(run(&mut handler, "hgetval profile age"), "31");
        assert_eq!(run(&mut handler, "hget profile"), "map[age:31 city:NYC]");
        assert_eq!(
            run(&mut handler, "hgetval profile name"),
            "ERROR: invalid inner key"
        );
    }

    #[tokio::test]
    async fn test_hset_argument_errors() {
        let mut handler = create_handler();

        assert_eq!(
            handler.try_execute("hset profile age"),
            Err(CommandError::TooFewArguments)
        );
        assert_eq!(
            handler.try_execute("hset profile age 30 city"),
            Err(CommandError::MissingValue)
        );
        assert_eq!(
            handler.try_execute("hset profile"),
            Err(CommandError::TooFewArguments)
        );
    }

    #[tokio::test]
    async fn test_list_commands() {
        let mut handler = create_handler();

        assert_eq!(run(&mut handler, "lset colors red green blue"), "OK");
        assert_eq!(run(&mut handler, "lget colors"), "[red green blue]");
        assert_eq!(run(&mut handler, "lgetit colors 1"), "green");
        assert_eq!(run(&mut handler, "lupdate colors 1 GREEN"), "OK");
        assert_eq!(run(&mut handler, "lgetit colors 1"), "GREEN");

        assert_eq!(
            handler.try_execute("lgetit colors 3"),
            Err(CommandError::Storage(StorageError::InvalidIndex))
        );
        assert_eq!(
            handler.try_execute("lgetit colors -1"),
            Err(CommandError::Storage(StorageError::InvalidIndex))
        );
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let mut handler = create_handler();

        run(&mut handler, "lset colors red");
        assert_eq!(
            handler.try_execute("set colors blue"),
            Err(CommandError::Storage(StorageError::TypeMismatch))
        );
        assert_eq!(run(&mut handler, "lget colors"), "[red]");
    }

    #[tokio::test]
    async fn test_arity_errors() {
        let mut handler = create_handler();

        assert_eq!(
            handler.try_execute("set key"),
            Err(CommandError::TooFewArguments)
        );
        assert_eq!(
            handler.try_execute("set key a b"),
            Err(CommandError::TooManyArguments)
        );
        assert_eq!(
            handler.try_execute("get key extra"),
            Err(CommandError::TooManyArguments)
        );
        assert_eq!(
            handler.try_execute("lupdate key 1"),
            Err(CommandError::TooFewArguments)
        );
        assert_eq!(
            handler.try_execute("remove key now"),
            Err(CommandError::TooManyArguments)
        );
    }

    #[tokio::test]
    async fn test_key_not_specified() {
        let mut handler = create_handler();

        assert_eq!(
            handler.try_execute("get"),
            Err(CommandError::KeyNotSpecified)
        );
        assert_eq!(
            run(&mut handler, "ttl"),
            "ERROR: key is not specified"
        );
    }

    #[tokio::test]
    async fn test_malformed_numbers() {
        let mut handler = create_handler();
        run(&mut handler, "set key value");
        run(&mut handler, "lset list a");

        assert_eq!(
            handler.try_execute("expire key soon"),
            Err(CommandError::MalformedNumericArgument("soon".into()))
        );
        assert_eq!(
            handler.try_execute("expireat key 12.5"),
            Err(CommandError::MalformedNumericArgument("12.5".into()))
        );
        assert_eq!(
            handler.try_execute("lgetit list first"),
            Err(CommandError::MalformedNumericArgument("first".into()))
        );
    }

    #[tokio::test]
    async fn test_invalid_ttl() {
        let mut handler = create_handler();
        run(&mut handler, "set key value");

        assert!(matches!(
            handler.try_execute("expire key 0"),
            Err(CommandError::Storage(StorageError::InvalidTtl(_)))
        ));
        assert!(matches!(
            handler.try_execute("expireat key 1000"),
            Err(CommandError::Storage(StorageError::InvalidTtl(_)))
        ));

        let future = unix_now() + 100;
        assert_eq!(run(&mut handler, &format!("expireat key {}", future)), "OK");
        assert_eq!(run(&mut handler, "expire missing 10"), "ERROR: key not exists");
    }

    #[tokio::test]
    async fn test_remove_and_keys() {
        let mut handler = create_handler();

        assert_eq!(run(&mut handler, "keys"), "[]");
        run(&mut handler, "set b 2");
        run(&mut handler, "set a 1");
        assert_eq!(run(&mut handler, "keys"), "[a b]");

        assert_eq!(run(&mut handler, "remove a"), "OK");
        assert_eq!(run(&mut handler, "remove a"), "OK");
        assert_eq!(run(&mut handler, "KEYS"), "[b]");
        assert_eq!(
            handler.try_execute("keys *"),
            Err(CommandError::TooManyArguments)
        );
    }

    #[tokio::test]
    async fn test_select_switches_database() {
        let registry = Arc::new(Registry::new(ExpiryConfig::default()));
        let mut first = CommandHandler::new(Arc::clone(&registry));
        let mut second = CommandHandler::new(Arc::clone(&registry));

        run(&mut first, "set key zero");
        assert_eq!(first.execute("select 1"), Reply::Silent);
        assert_eq!(first.db_id(), "1");
        assert_eq!(run(&mut first, "get key"), "ERROR: key not exists");
        run(&mut first, "set key one");

        // Another connection shares the same databases
        assert_eq!(run(&mut second, "get key"), "zero");
        second.execute("select 1");
        assert_eq!(run(&mut second, "get key"), "one");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.sweepers_started(), 2);
    }

    #[tokio::test]
    async fn test_select_arity() {
        let mut handler = create_handler();

        assert_eq!(
            handler.try_execute("select"),
            Err(CommandError::SelectArity)
        );
        assert_eq!(
            handler.try_execute("select 1 2"),
            Err(CommandError::SelectArity)
        );
        assert_eq!(handler.db_id(), DEFAULT_DB);
    }

    #[tokio::test]
    async fn test_unknown_and_empty_command() {
        let mut handler = create_handler();

        assert_eq!(
            handler.try_execute("frobnicate key"),
            Err(CommandError::UnknownCommand("frobnicate".into()))
        );
        assert_eq!(
            handler.try_execute("   "),
            Err(CommandError::Parse(ParseError::EmptyCommand))
        );
        assert!(handler.execute("frobnicate").is_error());
    }

    #[test]
    fn test_verb_lookup() {
        assert_eq!(Verb::parse("HGETVAL"), Some(Verb::Keyed(KeyedVerb::HGetVal)));
        assert_eq!(
            Verb::parse("ExpireAt"),
            Some(Verb::Keyed(KeyedVerb::ExpireAt))
        );
        assert_eq!(Verb::parse("SELECT"), Some(Verb::Select));
        assert_eq!(Verb::parse("del"), None);

        for verb in Verb::ALL {
            assert_eq!(Verb::parse(verb.name()), Some(verb));
        }

        // Only select and keys are routed outside the keyed dispatch
        let unkeyed: Vec<Verb> = Verb::ALL
            .into_iter()
            .filter(|verb| !matches!(verb, Verb::Keyed(_)))
            .collect();
        assert_eq!(unkeyed, vec![Verb::Select, Verb::Keys]);
    }
}
