// solbridge-schema - Compile request
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The compile request sent to the compiler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Language literal for Solidity sources.
pub const SOLIDITY: &str = "Solidity";

/// Language literal for Yul sources.
pub const YUL: &str = "Yul";

/// A standard-JSON compile request.
///
/// `S` is the settings payload. It defaults to [`Settings`], but any
/// serializable value is accepted and passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input<S = Settings> {
    pub language: String,
    pub sources: BTreeMap<String, Source>,
    pub settings: S,
}

/// One source file of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keccak256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

impl Source {
    pub fn new(content: impl Into<String>) -> Self {
        Source {
            content: content.into(),
            ..Source::default()
        }
    }
}

impl Input {
    /// An empty request for the given language, with default settings.
    pub fn new(language: impl Into<String>) -> Self {
        Input {
            language: language.into(),
            sources: BTreeMap::new(),
            settings: Settings::default(),
        }
    }

    /// An empty Solidity request.
    pub fn solidity() -> Self {
        Self::new(SOLIDITY)
    }
}

impl<S> Input<S> {
    /// Add (or replace) a source file.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.insert(name.into(), Source::new(content));
        self
    }

    /// Replace the settings payload, possibly changing its type.
    #[must_use]
    pub fn with_settings<T>(self, settings: T) -> Input<T> {
        Input {
            language: self.language,
            sources: self.sources,
            settings,
        }
    }
}

/// Compiler settings.
///
/// The schema of this object belongs to the compiler and grows between
/// releases, so it is kept as the JSON object it is. Decoding and
/// re-encoding never changes it: explicit `null`s stay, and values of
/// an unexpected type are left for the compiler to reject. The builders
/// and accessors below cover the well-known keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

/// Per-contract outputs selected by [`Settings::standard`].
pub const STANDARD_CONTRACT_OUTPUTS: &[&str] = &[
    "abi",
    "metadata",
    "userdoc",
    "devdoc",
    "evm.bytecode",
    "evm.deployedBytecode",
    "evm.methodIdentifiers",
    "evm.gasEstimates",
];

const OUTPUT_SELECTION: &str = "outputSelection";

impl Settings {
    /// Empty settings; the compiler's defaults apply.
    pub fn new() -> Self {
        Self::default()
    }

    /// The settings most callers want: ABI, metadata, docs, bytecode,
    /// method identifiers and gas estimates for every contract, the AST
    /// for every file, optimizer on with 200 runs.
    pub fn standard() -> Self {
        Settings::new()
            .with_optimizer(Optimizer::enabled(200))
            .select("*", "*", STANDARD_CONTRACT_OUTPUTS.iter().copied())
            .select("*", "", ["ast"])
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// `evmVersion`, if set to a string.
    #[must_use]
    pub fn evm_version(&self) -> Option<&str> {
        self.get("evmVersion").and_then(Value::as_str)
    }

    /// Typed view of `optimizer`; `None` if absent or not shaped like
    /// an optimizer object.
    #[must_use]
    pub fn optimizer(&self) -> Option<Optimizer> {
        Optimizer::deserialize(self.get("optimizer")?).ok()
    }

    /// Outputs selected for `contract` in `file`, exactly as written
    /// (wildcards are not expanded).
    #[must_use]
    pub fn selected(&self, file: &str, contract: &str) -> Vec<&str> {
        self.get(OUTPUT_SELECTION)
            .and_then(|selection| selection.get(file))
            .and_then(|by_contract| by_contract.get(contract))
            .and_then(Value::as_array)
            .map(|outputs| outputs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Set any key, replacing what was there.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_optimizer(self, optimizer: Optimizer) -> Self {
        self.with("optimizer", optimizer.into())
    }

    #[must_use]
    pub fn with_evm_version(self, version: impl Into<String>) -> Self {
        self.with("evmVersion", Value::String(version.into()))
    }

    /// Request `outputs` for `contract` in `file`, merging with anything
    /// already selected there.
    #[must_use]
    pub fn select<I, O>(mut self, file: &str, contract: &str, outputs: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        let mut selection = take_object(&mut self.0, OUTPUT_SELECTION);
        let mut by_contract = take_object(&mut selection, file);
        let mut selected = match by_contract.remove(contract) {
            Some(Value::Array(outputs)) => outputs,
            _ => Vec::new(),
        };
        for output in outputs {
            let output = Value::String(output.into());
            if !selected.contains(&output) {
                selected.push(output);
            }
        }

        by_contract.insert(contract.to_string(), Value::Array(selected));
        selection.insert(file.to_string(), Value::Object(by_contract));
        self.0.insert(OUTPUT_SELECTION.to_string(), Value::Object(selection));
        self
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Settings(map)
    }
}

// A non-object in the way is replaced.
fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}

/// The `optimizer` settings object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Optimizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Optimizer {
    pub fn enabled(runs: u32) -> Self {
        Optimizer {
            enabled: Some(true),
            runs: Some(runs),
            extra: Map::new(),
        }
    }

    pub fn disabled() -> Self {
        Optimizer {
            enabled: Some(false),
            ..Optimizer::default()
        }
    }
}

impl From<Optimizer> for Value {
    fn from(optimizer: Optimizer) -> Self {
        let mut map = optimizer.extra;
        if let Some(enabled) = optimizer.enabled {
            map.insert("enabled".to_string(), Value::Bool(enabled));
        }
        if let Some(runs) = optimizer.runs {
            map.insert("runs".to_string(), Value::from(runs));
        }
        Value::Object(map)
    }
}
