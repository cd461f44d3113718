// solbridge-schema - Standard-JSON contract types
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # solbridge-schema
//!
//! Typed representations of the Solidity compiler's standard-JSON
//! request ([`Input`]) and response ([`Output`]).
//!
//! The types mirror the external schema field for field. Anything this
//! crate does not own (ASTs, ABI entries, NatSpec documents, legacy
//! assembly) is carried as [`RawJson`], which keeps the exact text the
//! compiler emitted.
//!
//! Every response field is optional. A field missing from the compiler's
//! JSON decodes to `None`, which is distinct from a present but empty
//! value such as `Some("")` or `Some(vec![])`.
//!
//! ```rust
//! use solbridge_schema::{Input, Output, Settings};
//!
//! let input = Input::solidity()
//!     .with_source("A.sol", "contract A {}")
//!     .with_settings(Settings::standard());
//! let wire = serde_json::to_string(&input).unwrap();
//! assert!(wire.contains("\"language\":\"Solidity\""));
//!
//! let output: Output = serde_json::from_str(r#"{"errors":[]}"#).unwrap();
//! assert_eq!(output.errors.as_deref().map(<[_]>::len), Some(0));
//! assert!(output.contracts.is_none());
//! ```

pub mod input;
pub mod output;
pub mod raw;

pub use input::{Input, Optimizer, SOLIDITY, Settings, Source, YUL};
pub use output::{
    Bytecode, Contract, Diagnostic, Evm, Ewasm, LinkReference, Output, PerContract,
    SourceLocation, SourceOutput,
};
pub use raw::RawJson;
