// solbridge-embed - Error types
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bridge errors.
//!
//! Compiler diagnostics are never reported here. A source file with a
//! syntax error still compiles "successfully" from the bridge's point of
//! view; the problem shows up in [`Output::errors`](solbridge_schema::Output).

use std::path::PathBuf;

use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The compiler script file could not be read.
    #[error("cannot read compiler script '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine could not be created or the script failed to initialise.
    #[error("failed to load compiler script '{script}': {message}")]
    Load { script: String, message: String },

    /// The mandatory compile entry point is missing or could not be bound.
    #[error("cannot bind entry point '{symbol}': {message}")]
    Binding { symbol: String, message: String },

    /// The request could not be encoded as JSON.
    #[error("cannot encode compile request: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The bound entry point could not be called or threw.
    #[error("call to '{symbol}' failed: {message}")]
    Invocation { symbol: String, message: String },

    /// The compiler returned text that is not a valid response document.
    #[error("cannot decode compiler response: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The bridge was closed before the call.
    #[error("compiler has been closed")]
    Closed,
}

impl Error {
    pub fn load(script: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Load {
            script: script.into(),
            message: message.into(),
        }
    }

    pub fn binding(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Binding {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    pub fn invocation(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Invocation {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Whether this error happened while loading the script, before any
    /// usable bridge existed.
    #[must_use]
    pub fn is_load(&self) -> bool {
        matches!(self, Error::Read { .. } | Error::Load { .. })
    }

    /// Whether this error means construction failed.
    #[must_use]
    pub fn is_construction(&self) -> bool {
        self.is_load() || matches!(self, Error::Binding { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let read = Error::Read {
            path: PathBuf::from("/missing/soljson.js"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(read.is_load());
        assert!(read.is_construction());

        let binding = Error::binding("solidity_compile", "not exported");
        assert!(!binding.is_load());
        assert!(binding.is_construction());

        assert!(!Error::Closed.is_construction());
        assert!(!Error::invocation("solidity_compile", "boom").is_construction());
    }

    #[test]
    fn messages_name_the_entry_point() {
        let err = Error::invocation("solidity_compile", "RuntimeError: abort");
        assert_eq!(
            err.to_string(),
            "call to 'solidity_compile' failed: RuntimeError: abort"
        );

        let err = Error::load("soljson.js", "SyntaxError: unexpected token");
        assert!(err.to_string().contains("soljson.js"));
    }
}
