// solbridge-embed - Entry point discovery and binding
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Finding the compiler's entry points.
//!
//! Compiler releases export their C entry points under different names.
//! Each known [`NamingScheme`] declares one symbol per [`Capability`];
//! the schemes are tried in [`NamingScheme::PRIORITY`] order and the
//! first one whose export marker (`_` + symbol) appears in the script text
//! is bound through `Module.cwrap`.
//!
//! | Capability | `Solidity` scheme   | `Legacy` scheme   | Signature                      |
//! |------------|---------------------|-------------------|--------------------------------|
//! | version    | `solidity_version`  | `version`         | `() -> string`                 |
//! | license    | `solidity_license`  | `license`         | `() -> string`                 |
//! | compile    | `solidity_compile`  | `compileStandard` | `(string, number, number) -> string` |
//!
//! Compile is mandatory. Version and license are best-effort: if neither
//! scheme provides them the capability is simply unavailable.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::host::RuntimeHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Version,
    License,
    Compile,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Version, Capability::License, Capability::Compile];

    /// Whether construction fails when this capability cannot be bound.
    #[must_use]
    pub fn is_mandatory(self) -> bool {
        self == Capability::Compile
    }

    /// cwrap argument types of the foreign function.
    #[must_use]
    pub fn arg_types(self) -> &'static [&'static str] {
        match self {
            Capability::Version | Capability::License => &[],
            Capability::Compile => &["string", "number", "number"],
        }
    }

    /// Private global the bound wrapper is stored under.
    pub(crate) fn handle(self) -> &'static str {
        match self {
            Capability::Version => "__solbridge_version",
            Capability::License => "__solbridge_license",
            Capability::Compile => "__solbridge_compile",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Version => "version",
            Capability::License => "license",
            Capability::Compile => "compile",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingScheme {
    /// `solidity_*` exports.
    Solidity,
    /// Unprefixed exports of older releases.
    Legacy,
}

impl NamingScheme {
    pub const PRIORITY: [NamingScheme; 2] = [NamingScheme::Solidity, NamingScheme::Legacy];

    #[must_use]
    pub fn symbol(self, capability: Capability) -> &'static str {
        match (self, capability) {
            (NamingScheme::Solidity, Capability::Version) => "solidity_version",
            (NamingScheme::Solidity, Capability::License) => "solidity_license",
            (NamingScheme::Solidity, Capability::Compile) => "solidity_compile",
            (NamingScheme::Legacy, Capability::Version) => "version",
            (NamingScheme::Legacy, Capability::License) => "license",
            (NamingScheme::Legacy, Capability::Compile) => "compileStandard",
        }
    }

    /// Text whose presence in the script shows the symbol is exported.
    #[must_use]
    pub fn marker(self, capability: Capability) -> String {
        format!("_{}", self.symbol(capability))
    }
}

/// A bound entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub capability: Capability,
    pub scheme: NamingScheme,
    pub symbol: &'static str,
}

impl EntryPoint {
    fn new(scheme: NamingScheme, capability: Capability) -> Self {
        EntryPoint {
            capability,
            scheme,
            symbol: scheme.symbol(capability),
        }
    }

    pub(crate) fn handle(&self) -> &'static str {
        self.capability.handle()
    }
}

/// The entry points found in one loaded script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    version: Option<EntryPoint>,
    license: Option<EntryPoint>,
    compile: EntryPoint,
}

impl Capabilities {
    #[must_use]
    pub fn get(&self, capability: Capability) -> Option<&EntryPoint> {
        match capability {
            Capability::Version => self.version.as_ref(),
            Capability::License => self.license.as_ref(),
            Capability::Compile => Some(&self.compile),
        }
    }

    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.get(capability).is_some()
    }

    #[must_use]
    pub fn compile(&self) -> &EntryPoint {
        &self.compile
    }
}

/// Schemes whose marker for `capability` occurs in `script`, in priority order.
pub fn candidates(script: &str, capability: Capability) -> Vec<EntryPoint> {
    NamingScheme::PRIORITY
        .into_iter()
        .filter(|scheme| script.contains(&scheme.marker(capability)))
        .map(|scheme| EntryPoint::new(scheme, capability))
        .collect()
}

/// Discover and bind every capability of the script loaded in `host`.
///
/// # Errors
///
/// Returns [`Error::Binding`] if the script has no `Module.cwrap`, or
/// if no compile entry point can be bound.
pub fn bind(host: &RuntimeHost, script: &str) -> Result<Capabilities> {
    if !host.is_truthy("typeof Module === 'object' && typeof Module.cwrap === 'function'") {
        return Err(Error::binding(
            NamingScheme::Solidity.symbol(Capability::Compile),
            "script does not expose Module.cwrap",
        ));
    }

    let version = bind_one(host, script, Capability::Version)?;
    let license = bind_one(host, script, Capability::License)?;
    let compile = bind_one(host, script, Capability::Compile)?.ok_or_else(|| {
        Error::binding(
            NamingScheme::Solidity.symbol(Capability::Compile),
            "no known compile export found in script",
        )
    })?;

    info!(
        script = host.script_name(),
        compile = compile.symbol,
        version = ?version.map(|e| e.symbol),
        license = ?license.map(|e| e.symbol),
        "bound compiler entry points"
    );

    Ok(Capabilities {
        version,
        license,
        compile,
    })
}

fn bind_one(host: &RuntimeHost, script: &str, capability: Capability) -> Result<Option<EntryPoint>> {
    let mut last_error = None;
    for entry in candidates(script, capability) {
        match host.bind(entry.symbol, "string", capability.arg_types(), entry.handle()) {
            Ok(()) => {
                debug!(symbol = entry.symbol, scheme = ?entry.scheme, "bound {capability}");
                return Ok(Some(entry));
            }
            Err(e) => {
                warn!(symbol = entry.symbol, error = %e, "cannot bind {capability}");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if capability.is_mandatory() => Err(e),
        _ => {
            if !capability.is_mandatory() {
                debug!("{capability} is unavailable in this compiler");
            }
            Ok(None)
        }
    }
}
