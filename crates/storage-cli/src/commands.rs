//! Subcommand definitions and dispatch.
//!
//! Every subcommand maps onto one store operation and produces a JSON value
//! for stdout. Writes report `{"status":"ok"}`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use secure_storage::{is_storage_supported, BackendKind, KeyOptions, SecureStorage, SetOptions};
use serde_json::{json, Value};
use tracing::info;

/// Inspect and edit encrypted, expiring storage records.
#[derive(Debug, Parser)]
#[command(name = "secure-storage", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Key namespace and backend selection shared by keyed subcommands.
#[derive(Debug, Clone, Default, Args)]
pub struct Target {
    /// Key prefix (defaults to STORAGE_PREFIX; pass "" for none).
    #[arg(long)]
    pub prefix: Option<String>,

    /// Use session storage instead of persistent storage.
    #[arg(long)]
    pub session: bool,
}

impl Target {
    fn key_options(&self) -> KeyOptions {
        KeyOptions {
            backend: Some(backend(self.session)),
            prefix: self.prefix.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report whether Web Storage is available.
    Supported,
    /// Store a value. VALUE is parsed as JSON, falling back to plain text.
    Set {
        key: String,
        value: String,
        /// Expiry in seconds; 0 never expires.
        #[arg(long, allow_negative_numbers = true)]
        expire: Option<f64>,
        #[command(flatten)]
        target: Target,
    },
    /// Read a value, refreshing its expiry.
    Get {
        key: String,
        #[command(flatten)]
        target: Target,
    },
    /// Delete a value.
    Remove {
        key: String,
        #[command(flatten)]
        target: Target,
    },
    /// List every key with its raw stored text.
    List {
        #[arg(long)]
        session: bool,
    },
    /// Check whether a key exists in persistent storage.
    Has {
        key: String,
        /// Prefix to match; without it the bare key is matched.
        #[arg(long)]
        prefix: Option<String>,
    },
    /// List every key in persistent storage.
    Keys,
    /// Print the key at a position.
    KeyAt {
        index: usize,
        #[arg(long)]
        session: bool,
    },
    /// Print the number of stored keys.
    Length {
        #[arg(long)]
        session: bool,
    },
    /// Delete every key in the backend, including ones this tool did not write.
    Clear {
        #[arg(long)]
        session: bool,
    },
}

fn backend(session: bool) -> BackendKind {
    if session {
        BackendKind::Session
    } else {
        BackendKind::Local
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn ok() -> Value {
    json!({ "status": "ok" })
}

/// Execute `command` against `store` and return its JSON output.
///
/// # Errors
///
/// Returns the underlying store error, with the key or backend as context.
pub fn run(store: &mut SecureStorage, command: Command) -> Result<Value> {
    let output = match command {
        Command::Supported => json!({ "supported": is_storage_supported() }),
        Command::Set {
            key,
            value,
            expire,
            target,
        } => {
            let opts = SetOptions {
                backend: Some(backend(target.session)),
                prefix: target.prefix,
                expire,
            };
            store
                .set(&key, parse_value(&value), &opts)
                .with_context(|| format!("failed to set {key}"))?;
            info!(%key, "value stored");
            ok()
        }
        Command::Get { key, target } => store
            .get(&key, &target.key_options())
            .with_context(|| format!("failed to get {key}"))?
            .unwrap_or(Value::Null),
        Command::Remove { key, target } => {
            store
                .remove(&key, &target.key_options())
                .with_context(|| format!("failed to remove {key}"))?;
            ok()
        }
        Command::List { session } => {
            let entries = store
                .list_all(Some(backend(session)))
                .context("failed to list storage")?;
            serde_json::to_value(entries)?
        }
        Command::Has { key, prefix } => {
            let found = store.has(&key, prefix.as_deref())?;
            json!(found)
        }
        Command::Keys => {
            let keys = store.keys()?;
            json!(keys)
        }
        Command::KeyAt { index, session } => {
            let key = store.key_at(index, Some(backend(session)))?;
            json!(key)
        }
        Command::Length { session } => {
            let len = store.length(Some(backend(session)))?;
            json!(len)
        }
        Command::Clear { session } => {
            let kind = backend(session);
            store
                .clear(Some(kind))
                .with_context(|| format!("failed to clear {kind}"))?;
            ok()
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secure_storage::{FileStorage, MemoryStorage, StoreConfig, StoreError};

    fn store() -> SecureStorage {
        SecureStorage::new(
            StoreConfig::default(),
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::new()),
        )
        .unwrap()
    }

    fn exec(store: &mut SecureStorage, args: &[&str]) -> Result<Value> {
        let mut argv = vec!["secure-storage"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        run(store, cli.command)
    }

    #[test]
    fn set_then_get_json_value() {
        let mut store = store();
        exec(&mut store, &["set", "token", r#"{"id":42}"#, "--expire", "60"]).unwrap();
        let out = exec(&mut store, &["get", "token"]).unwrap();
        assert_eq!(out, json!({"id": 42}));
    }

    #[test]
    fn non_json_value_is_stored_as_text() {
        let mut store = store();
        exec(&mut store, &["set", "greeting", "hello world"]).unwrap();
        assert_eq!(exec(&mut store, &["get", "greeting"]).unwrap(), json!("hello world"));
    }

    #[test]
    fn missing_key_prints_null() {
        let mut store = store();
        assert_eq!(exec(&mut store, &["get", "nope"]).unwrap(), Value::Null);
    }

    #[test]
    fn negative_expire_is_a_config_error() {
        let mut store = store();
        let err = exec(&mut store, &["set", "k", "1", "--expire", "-1"]).unwrap_err();
        let store_err = err.downcast_ref::<StoreError>().unwrap();
        assert!(store_err.is_config_error());
        assert_eq!(exec(&mut store, &["length"]).unwrap(), json!(0));
    }

    #[test]
    fn session_flag_selects_session_backend() {
        let mut store = store();
        exec(&mut store, &["set", "s", "1", "--session"]).unwrap();
        assert_eq!(exec(&mut store, &["length", "--session"]).unwrap(), json!(1));
        assert_eq!(exec(&mut store, &["length"]).unwrap(), json!(0));

        exec(&mut store, &["clear", "--session"]).unwrap();
        assert_eq!(exec(&mut store, &["length", "--session"]).unwrap(), json!(0));
    }

    #[test]
    fn listing_commands() {
        let mut store = store();
        exec(&mut store, &["set", "a", "1", "--prefix", "P"]).unwrap();

        assert_eq!(exec(&mut store, &["keys"]).unwrap(), json!(["P_a"]));
        assert_eq!(exec(&mut store, &["key-at", "0"]).unwrap(), json!("P_a"));
        assert_eq!(exec(&mut store, &["key-at", "1"]).unwrap(), Value::Null);
        assert_eq!(exec(&mut store, &["has", "a", "--prefix", "P"]).unwrap(), json!(true));
        assert_eq!(exec(&mut store, &["has", "a"]).unwrap(), json!(false));

        let listed = exec(&mut store, &["list"]).unwrap();
        assert_eq!(listed[0]["key"], json!("P_a"));
        assert!(listed[0]["value"].is_string());
    }

    #[test]
    fn remove_command() {
        let mut store = store();
        exec(&mut store, &["set", "a", "1"]).unwrap();
        assert_eq!(exec(&mut store, &["remove", "a"]).unwrap(), json!({"status": "ok"}));
        assert_eq!(exec(&mut store, &["length"]).unwrap(), json!(0));
    }

    #[test]
    fn file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let open = |path: &std::path::Path| {
            SecureStorage::new(
                StoreConfig::default(),
                Box::new(FileStorage::open(path).unwrap()),
                Box::new(MemoryStorage::new()),
            )
            .unwrap()
        };

        let mut first = open(&path);
        exec(&mut first, &["set", "token", "abc"]).unwrap();
        drop(first);

        let mut second = open(&path);
        assert_eq!(exec(&mut second, &["get", "token"]).unwrap(), json!("abc"));
        assert_eq!(exec(&mut second, &["keys"]).unwrap(), json!(["ENCRYPTED_token"]));
    }

    #[test]
    fn supported_on_native() {
        let mut store = store();
        assert_eq!(exec(&mut store, &["supported"]).unwrap(), json!({"supported": true}));
    }
}
