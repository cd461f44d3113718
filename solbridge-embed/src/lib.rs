// solbridge-embed - Hosting soljson compiler blobs
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # solbridge-embed
//!
//! Runs a Solidity compiler distributed as a self-contained JavaScript
//! blob (`soljson.js`) inside an embedded QuickJS engine, and exposes it
//! through a typed request/response API.
//!
//! Each [`Solc`] owns its own engine. Loading evaluates the blob once,
//! then the compiler's version, license and compile entry points are
//! located by probing known export names (see [`bindings`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use solbridge_embed::Solc;
//! use solbridge_schema::{Input, Settings};
//!
//! let solc = Solc::from_file("soljson.js").unwrap();
//! let input = Input::solidity()
//!     .with_source("A.sol", "contract A { function f() public {} }")
//!     .with_settings(Settings::standard());
//!
//! let output = solc.compile(&input).unwrap();
//! if output.has_errors() {
//!     for d in output.diagnostics() {
//!         eprintln!("{}", d.display_message());
//!     }
//! }
//! let bytecode = output
//!     .contract("A.sol", "A")
//!     .and_then(|c| c.evm.as_ref())
//!     .and_then(|evm| evm.bytecode.as_ref())
//!     .and_then(|b| b.object.clone());
//! println!("{bytecode:?}");
//! ```
//!
//! ## Errors
//!
//! Bridge failures (unreadable script, missing compile export, encoding
//! or decoding problems, a throwing compiler) are [`Error`]s. Problems
//! in the compiled Solidity are not: they arrive as diagnostics in a
//! successful [`Output`].

pub mod bindings;
pub mod config;
pub mod error;
pub mod host;
mod solc;

pub use bindings::{Capabilities, Capability, EntryPoint, NamingScheme};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use solc::{DEFAULT_COMPILE_FLAG, Solc};

// Re-export the contract types for convenience
pub use solbridge_schema::{Input, Output, Settings};
