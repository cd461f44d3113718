// solbridge-embed - Compiler facade
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The `Solc` struct - main entry point for compiling through a soljson blob.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use solbridge_schema::{Input, Output};
use tracing::{debug, info, warn};

use crate::bindings::{self, Capabilities, Capability};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::host::RuntimeHost;

/// Value passed for both numeric arguments of the compile entry point:
/// no read callback and no callback context.
pub const DEFAULT_COMPILE_FLAG: u32 = 0;

/// A loaded compiler.
///
/// `Solc` owns one JavaScript engine with one compiler script loaded in
/// it. The engine runs one call at a time, so every operation holds an
/// internal lock for its whole duration, JSON encoding and decoding
/// included. Concurrent callers block; share a `Solc` between threads
/// with `Arc<Solc>`. Independent `Solc` instances do not share anything
/// and can compile in parallel.
///
/// # Example
///
/// ```rust,no_run
/// use solbridge_embed::Solc;
/// use solbridge_schema::{Input, Settings};
///
/// let solc = Solc::from_file("soljson-v0.8.9+commit.e5eed63a.js").unwrap();
/// println!("compiler {}", solc.version());
///
/// let input = Input::solidity()
///     .with_source("A.sol", "contract A { function f() public {} }")
///     .with_settings(Settings::standard());
/// let output = solc.compile(&input).unwrap();
/// for diagnostic in output.diagnostics() {
///     eprintln!("{}", diagnostic.display_message());
/// }
/// solc.close();
/// ```
pub struct Solc {
    // `None` once closed.
    host: Mutex<Option<RuntimeHost>>,
    capabilities: Capabilities,
    script_name: String,
}

impl Solc {
    /// Load a compiler from its script text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the script fails to initialise and
    /// [`Error::Binding`] if it has no usable compile entry point.
    pub fn new(script: impl AsRef<str>) -> Result<Self> {
        Self::with_config(script, &EngineConfig::default())
    }

    /// Load a compiler from its script text with explicit engine settings.
    pub fn with_config(script: impl AsRef<str>, config: &EngineConfig) -> Result<Self> {
        let script = script.as_ref();
        let host = RuntimeHost::load(script, config)?;
        let capabilities = bindings::bind(&host, script)?;

        Ok(Solc {
            host: Mutex::new(Some(host)),
            capabilities,
            script_name: config.script_name.clone(),
        })
    }

    /// Load a compiler from a script file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read, otherwise as
    /// [`Solc::new`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_file_with_config(path, &EngineConfig::default().script_name(name))
    }

    /// Load a compiler from a script file with explicit engine settings.
    pub fn from_file_with_config(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Self> {
        let path = path.as_ref();
        let script = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_config(script, config)
    }

    /// The compiler's version string.
    ///
    /// Empty if the compiler exports no version entry point, the call
    /// failed, or the compiler was closed.
    #[must_use]
    pub fn version(&self) -> String {
        self.query(Capability::Version)
    }

    /// The compiler's license text; empty under the same conditions as
    /// [`Solc::version`].
    #[must_use]
    pub fn license(&self) -> String {
        self.query(Capability::License)
    }

    /// Which entry points were found when the script was loaded.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Compile `input` and decode the compiler's response.
    ///
    /// Problems in the compiled sources are not errors here: they are
    /// reported in [`Output::errors`], and [`Output::has_errors`] tells
    /// whether any of them is fatal.
    ///
    /// # Errors
    ///
    /// - [`Error::Serialization`] if `input` cannot be encoded
    /// - [`Error::Invocation`] if the compile entry point throws
    /// - [`Error::Deserialization`] if the response is not an output document
    /// - [`Error::Closed`] after [`Solc::close`]
    pub fn compile<S: Serialize>(&self, input: &Input<S>) -> Result<Output> {
        let guard = self.lock();
        let host = guard.as_ref().ok_or(Error::Closed)?;

        let request = serde_json::to_string(input).map_err(Error::Serialization)?;
        let response = self.call_compile(host, &request)?;
        let output: Output = serde_json::from_str(&response).map_err(Error::Deserialization)?;

        debug!(
            files = input.sources.len(),
            diagnostics = output.diagnostics().count(),
            "compile finished"
        );
        Ok(output)
    }

    /// Send a standard-JSON request as text and return the response text
    /// untouched.
    pub fn compile_json(&self, request: &str) -> Result<String> {
        let guard = self.lock();
        let host = guard.as_ref().ok_or(Error::Closed)?;
        self.call_compile(host, request)
    }

    /// Release the engine.
    ///
    /// Waits for any call in flight, then drops the engine. Calling it
    /// again is a no-op. Afterwards [`Solc::compile`] returns
    /// [`Error::Closed`] and the queries return empty strings. Dropping a
    /// `Solc` releases the engine too; `close` only makes it happen
    /// earlier, through a shared reference.
    pub fn close(&self) {
        let mut guard = self.lock();
        if let Some(host) = guard.take() {
            drop(host);
            info!(script = %self.script_name, "compiler closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    fn query(&self, capability: Capability) -> String {
        let guard = self.lock();
        let Some(host) = guard.as_ref() else {
            return String::new();
        };
        let Some(entry) = self.capabilities.get(capability) else {
            return String::new();
        };

        match host.call_nullary(entry.handle(), entry.symbol) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "{capability} query failed");
                String::new()
            }
        }
    }

    // Caller holds the lock; `host` is borrowed from its guard.
    fn call_compile(&self, host: &RuntimeHost, request: &str) -> Result<String> {
        let entry = self.capabilities.compile();
        debug!(symbol = entry.symbol, request_bytes = request.len(), "calling compiler");
        let response = host.call_compile(
            entry.handle(),
            entry.symbol,
            request,
            (DEFAULT_COMPILE_FLAG, DEFAULT_COMPILE_FLAG),
        )?;
        debug!(response_bytes = response.len(), "compiler returned");
        Ok(response)
    }

    // A panic inside a previous call leaves the engine usable, so a
    // poisoned lock is taken over rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Option<RuntimeHost>> {
        self.host.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Solc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solc")
            .field("script_name", &self.script_name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
