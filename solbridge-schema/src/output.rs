// solbridge-schema - Compile response
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The compilation result returned by the compiler.
//!
//! All fields are `Option`s. `None` means the compiler did not emit the
//! field at all; a present empty value decodes to `Some` of that empty
//! value. Unknown fields are ignored so newer compilers stay readable.

use std::collections::BTreeMap;

use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::raw::RawJson;

/// file -> contract name -> value
pub type PerContract<T> = BTreeMap<String, BTreeMap<String, T>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Output {
    /// Diagnostics in the order the compiler emitted them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Diagnostic>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<BTreeMap<String, SourceOutput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts: Option<PerContract<Contract>>,
}

impl Output {
    /// All diagnostics, or nothing when the compiler sent none.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().flatten()
    }

    /// Whether any diagnostic has `error` severity.
    ///
    /// A successful bridge call can still carry compiler errors; this is
    /// the check callers use to tell a clean compile from a failed one.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(Diagnostic::is_error)
    }

    #[must_use]
    pub fn contract(&self, file: &str, name: &str) -> Option<&Contract> {
        self.contracts.as_ref()?.get(file)?.get(name)
    }

    /// `(file, name, contract)` for every emitted contract.
    pub fn contracts_iter(&self) -> impl Iterator<Item = (&str, &str, &Contract)> {
        self.contracts.iter().flatten().flat_map(|(file, by_name)| {
            by_name
                .iter()
                .map(move |(name, contract)| (file.as_str(), name.as_str(), contract))
        })
    }
}

/// A compiler-reported condition. These are data, not bridge failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_source_locations: Option<Vec<SourceLocation>>,
    /// e.g. `TypeError`, `ParserError`, `InternalCompilerError`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// e.g. `general`, `ewasm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// `error`, `warning` or `info`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity.as_deref() == Some("error")
    }

    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity.as_deref() == Some("warning")
    }

    /// The formatted message when present, the plain one otherwise.
    #[must_use]
    pub fn display_message(&self) -> &str {
        self.formatted_message
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct SourceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Byte offset; compilers use `-1` when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// Secondary locations are an array in compiler output, but a single
// object is accepted too.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<SourceLocation>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<SourceLocation>),
        One(SourceLocation),
    }

    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|locations| match locations {
            OneOrMany::Many(many) => many,
            OneOrMany::One(one) => vec![one],
        }),
    )
}

/// Per-file compiler output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct SourceOutput {
    /// Stable handle used by source maps to refer to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<RawJson>,
    #[serde(
        default,
        rename = "legacyAST",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_ast: Option<RawJson>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Interface description entries, uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Vec<RawJson>>,
    /// The metadata document as a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, rename = "userdoc", skip_serializing_if = "Option::is_none")]
    pub user_doc: Option<RawJson>,
    #[serde(default, rename = "devdoc", skip_serializing_if = "Option::is_none")]
    pub dev_doc: Option<RawJson>,
    /// Intermediate representation before optimisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir_optimized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_layout: Option<RawJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm: Option<Evm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ewasm: Option<Ewasm>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct Evm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_assembly: Option<RawJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<Bytecode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_bytecode: Option<Bytecode>,
    /// Function signature -> selector hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_identifiers: Option<BTreeMap<String, String>>,
    /// Category (`creation`, `external`, `internal`) -> item -> cost.
    /// Costs are strings because the compiler emits `"infinite"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_estimates: Option<BTreeMap<String, BTreeMap<String, String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(rename_all = "camelCase")]
pub struct Bytecode {
    /// Hex without `0x`; unlinked libraries appear as `__$...$__` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcodes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_references: Option<PerContract<Vec<LinkReference>>>,
}

impl Bytecode {
    /// Whether any library placeholder still has to be patched.
    #[must_use]
    pub fn needs_linking(&self) -> bool {
        self.link_references
            .iter()
            .flat_map(|by_file| by_file.values())
            .flat_map(|by_contract| by_contract.values())
            .any(|ranges| !ranges.is_empty())
    }
}

/// A byte range of bytecode to patch with a library address at link time.
///
/// solc writes `{start, length}`; other producers write `{start, end}`.
/// Whatever keys were present are kept as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct LinkReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
}

impl LinkReference {
    /// Exclusive end offset: `end` when given, else `start + length`.
    #[must_use]
    pub fn end(&self) -> Option<u64> {
        self.end.or_else(|| self.start?.checked_add(self.length?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Ewasm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm: Option<String>,
}

// Derived struct impls also accept a JSON array, filling fields by
// position. Response objects are always JSON objects, so every type
// here decodes through `deserialize_map` instead. The derives are
// `remote = "Self"`, which leaves inherent `serialize`/`deserialize`
// functions; decode through the trait (`serde_json::from_str`).
macro_rules! object_only {
    ($($ty:ident),* $(,)?) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $ty::serialize(self, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                $ty::deserialize(ObjectOnly(deserializer))
            }
        }
    )*};
}

object_only!(
    Output,
    Diagnostic,
    SourceLocation,
    SourceOutput,
    Contract,
    Evm,
    Bytecode,
    LinkReference,
    Ewasm,
);

struct ObjectOnly<D>(D);

impl<'de, D: Deserializer<'de>> Deserializer<'de> for ObjectOnly<D> {
    type Error = D::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_any(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_map(visitor)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}
