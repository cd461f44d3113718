// solbridge-embed integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tests for the `Solc` facade against fake soljson builds.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use solbridge_embed::{Capability, EngineConfig, Error, NamingScheme, Solc};
use solbridge_schema::{Input, Settings};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn modern() -> Solc {
    Solc::from_file(fixture("soljson_modern.js")).unwrap()
}

fn legacy() -> Solc {
    Solc::from_file(fixture("soljson_legacy.js")).unwrap()
}

const CONTRACT_A: &str = "// SPDX-License-Identifier: MIT\n\
                          pragma solidity ^0.8.0;\n\
                          contract A { function f() public {} }\n";

// =============================================================================
// Construction
// =============================================================================

mod construction {
    use super::*;

    #[test]
    fn script_name_comes_from_file_name() {
        let solc = modern();
        assert_eq!(solc.script_name(), "soljson_modern.js");
    }

    #[test]
    fn explicit_config_name_is_kept() {
        let script = std::fs::read_to_string(fixture("soljson_modern.js")).unwrap();
        let config = EngineConfig::new()
            .script_name("inline-compiler")
            .memory_limit(256 * 1024 * 1024);
        let solc = Solc::with_config(script, &config).unwrap();
        assert_eq!(solc.script_name(), "inline-compiler");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Solc::from_file(fixture("does-not-exist.js")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert!(err.is_load());
        assert!(err.to_string().contains("does-not-exist.js"));
    }

    #[test]
    fn script_that_throws_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("soljson-broken.js");
        std::fs::write(&path, "var Module = {}; throw new Error('init failed');").unwrap();

        let err = Solc::from_file(&path).unwrap_err();
        match err {
            Error::Load { script, message } => {
                assert_eq!(script, "soljson-broken.js");
                assert!(message.contains("init failed"), "message: {message}");
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn script_with_syntax_error_is_a_load_error() {
        let err = Solc::new("var Module = {").unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn script_without_cwrap_is_a_binding_error() {
        let err = Solc::new("var answer = 42;").unwrap_err();
        assert!(matches!(err, Error::Binding { .. }));
        assert!(err.is_construction());
    }

    #[test]
    fn script_without_compile_export_is_a_binding_error() {
        let err = Solc::from_file(fixture("soljson_no_compile.js")).unwrap_err();
        match err {
            Error::Binding { symbol, .. } => assert_eq!(symbol, "solidity_compile"),
            other => panic!("expected binding error, got {other:?}"),
        }
    }

    #[test]
    fn modern_script_binds_solidity_names() {
        let solc = modern();
        let caps = solc.capabilities();
        for capability in Capability::ALL {
            let entry = caps.get(capability).unwrap();
            assert_eq!(entry.scheme, NamingScheme::Solidity);
        }
        assert_eq!(caps.compile().symbol, "solidity_compile");
    }

    #[test]
    fn legacy_script_binds_legacy_names() {
        let solc = legacy();
        let caps = solc.capabilities();
        assert_eq!(caps.compile().symbol, "compileStandard");
        assert_eq!(caps.get(Capability::Version).unwrap().symbol, "version");
        assert!(!caps.has(Capability::License));
    }
}

// =============================================================================
// Version and license
// =============================================================================

mod queries {
    use super::*;

    #[test]
    fn version_and_license() {
        let solc = modern();
        assert_eq!(solc.version(), "0.8.9+commit.e5eed63a.Emscripten.clang");
        assert!(solc.license().starts_with("Most of the code is licensed under GPLv3"));
    }

    #[test]
    fn queries_are_repeatable() {
        let solc = modern();
        assert_eq!(solc.version(), solc.version());
    }

    #[test]
    fn missing_license_is_empty() {
        let solc = legacy();
        assert_eq!(solc.version(), "0.5.17+commit.d19bba13.Emscripten.clang");
        assert_eq!(solc.license(), "");
    }
}

// =============================================================================
// Compilation
// =============================================================================

mod compile {
    use super::*;

    #[test]
    fn single_contract() {
        let solc = modern();
        let input = Input::solidity()
            .with_source("A.sol", CONTRACT_A)
            .with_settings(Settings::standard());

        let output = solc.compile(&input).unwrap();
        assert!(!output.has_errors());
        assert_eq!(output.diagnostics().count(), 0);

        let contract = output.contract("A.sol", "A").unwrap();
        let abi = contract.abi.as_ref().unwrap();
        assert_eq!(abi.len(), 1);
        let entry: serde_json::Value = abi[0].parse().unwrap();
        assert_eq!(entry["name"], "f");
        assert_eq!(entry["type"], "function");

        let evm = contract.evm.as_ref().unwrap();
        let object = evm.bytecode.as_ref().unwrap().object.as_deref().unwrap();
        assert!(!object.is_empty());
        assert!(!evm.bytecode.as_ref().unwrap().needs_linking());
        assert!(evm.method_identifiers.as_ref().unwrap().contains_key("f()"));
        assert_eq!(
            evm.gas_estimates.as_ref().unwrap()["creation"]["totalCost"],
            "21073"
        );

        let source = &output.sources.as_ref().unwrap()["A.sol"];
        assert_eq!(source.id, Some(0));
        assert!(source.ast.is_some());
    }

    #[test]
    fn several_files_and_contracts() {
        let solc = modern();
        let input = Input::solidity()
            .with_source("A.sol", CONTRACT_A)
            .with_source(
                "B.sol",
                "// SPDX-License-Identifier: MIT\ncontract B {} contract C { function g() public {} }",
            );

        let output = solc.compile(&input).unwrap();
        let names: Vec<_> = output
            .contracts_iter()
            .map(|(file, name, _)| format!("{file}:{name}"))
            .collect();
        assert_eq!(names, ["A.sol:A", "B.sol:B", "B.sol:C"]);
        assert_eq!(output.sources.as_ref().unwrap()["B.sol"].id, Some(1));
    }

    #[test]
    fn syntax_error_is_a_diagnostic_not_an_error() {
        let solc = modern();
        let input = Input::solidity().with_source("Bad.sol", "contract Bad {");

        let output = solc.compile(&input).unwrap();
        assert!(output.has_errors());

        let diagnostic = output.diagnostics().next().unwrap();
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.kind.as_deref(), Some("ParserError"));
        assert_eq!(diagnostic.error_code.as_deref(), Some("2314"));
        assert!(diagnostic.display_message().starts_with("ParserError:"));

        let location = diagnostic.source_location.as_ref().unwrap();
        assert_eq!(location.file.as_deref(), Some("Bad.sol"));
        assert_eq!(location.start, Some(14));
        assert!(output.contract("Bad.sol", "Bad").is_none());
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let solc = modern();
        let input = Input::solidity().with_source("A.sol", "contract A {}");

        let output = solc.compile(&input).unwrap();
        assert!(!output.has_errors());
        let warning = output.diagnostics().next().unwrap();
        assert!(warning.is_warning());
        assert_eq!(warning.source_location.as_ref().unwrap().start, Some(-1));
    }

    #[test]
    fn empty_request_reports_json_error() {
        let solc = modern();
        let output = solc.compile(&Input::solidity()).unwrap();
        assert!(output.has_errors());
        let diagnostic = output.diagnostics().next().unwrap();
        assert_eq!(diagnostic.kind.as_deref(), Some("JSONError"));
        assert_eq!(diagnostic.message.as_deref(), Some("No input sources specified."));
    }

    #[test]
    fn absent_fields_stay_absent() {
        let solc = legacy();
        let output = solc.compile(&Input::solidity().with_source("O.sol", "contract Old {}")).unwrap();

        assert!(output.errors.is_none());
        let source = &output.sources.as_ref().unwrap()["O.sol"];
        assert!(source.ast.is_none());
        assert!(source.legacy_ast.is_some());

        let contract = output.contract("O.sol", "Old").unwrap();
        assert!(contract.abi.as_ref().unwrap().is_empty());
        assert!(contract.metadata.is_none());
        let evm = contract.evm.as_ref().unwrap();
        assert!(evm.deployed_bytecode.is_none());
        assert!(
            evm.bytecode
                .as_ref()
                .unwrap()
                .link_references
                .as_ref()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn extra_settings_reach_the_compiler() {
        let solc = modern();
        let settings = Settings::standard()
            .with_evm_version("london")
            .with("viaIR", serde_json::json!(true));
        let input = Input::solidity()
            .with_source("A.sol", CONTRACT_A)
            .with_settings(settings);
        assert!(solc.compile(&input).is_ok());
    }

    #[test]
    fn raw_settings_value_is_accepted() {
        let solc = modern();
        let input = Input::solidity()
            .with_source("A.sol", CONTRACT_A)
            .with_settings(serde_json::json!({ "optimizer": { "enabled": false } }));
        assert!(solc.compile(&input).unwrap().contract("A.sol", "A").is_some());
    }

    #[test]
    fn numeric_arguments_are_zero() {
        let solc = modern();
        let request = r#"{"language":"Solidity","sources":{"A.sol":{"content":"contract A {}"}},"settings":{}}"#;

        let response = solc.compile_json(request).unwrap();
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["callingConvention"]["argc"], 3);
        assert_eq!(value["callingConvention"]["flags"], serde_json::json!([0, 0]));
    }

    #[test]
    fn unknown_response_fields_are_ignored() {
        // The fake compiler always adds `callingConvention` at the top level.
        let solc = modern();
        let output = solc.compile(&Input::solidity().with_source("A.sol", CONTRACT_A));
        assert!(output.is_ok());
    }
}

// =============================================================================
// Bridge failures
// =============================================================================

mod failures {
    use super::*;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("settings cannot be encoded"))
        }
    }

    #[test]
    fn unencodable_input_is_a_serialization_error() {
        let solc = modern();
        let input = Input::solidity()
            .with_source("A.sol", CONTRACT_A)
            .with_settings(Unencodable);

        let err = solc.compile(&input).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("settings cannot be encoded"));

        // The bridge stays usable.
        assert!(solc.compile(&Input::solidity().with_source("A.sol", CONTRACT_A)).is_ok());
    }

    #[test]
    fn throwing_compiler_is_an_invocation_error() {
        let solc = modern();
        let input = Input::solidity().with_source("A.sol", "contract A {} // __throw__");

        match solc.compile(&input).unwrap_err() {
            Error::Invocation { symbol, message } => {
                assert_eq!(symbol, "solidity_compile");
                assert!(message.contains("abort() requested"), "message: {message}");
            }
            other => panic!("expected invocation error, got {other:?}"),
        }

        // The reentrancy guard was released by the throw.
        assert!(solc.compile(&Input::solidity().with_source("A.sol", CONTRACT_A)).is_ok());
    }

    #[test]
    fn non_json_response_is_a_deserialization_error() {
        let solc = modern();
        let input = Input::solidity().with_source("A.sol", "contract A {} // __garbage__");
        let err = solc.compile(&input).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn array_response_is_a_deserialization_error() {
        let solc = modern();
        let input = Input::solidity().with_source("A.sol", "contract A {} // __array__");
        let err = solc.compile(&input).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)), "got {err:?}");
    }

    #[test]
    fn compile_json_returns_text_untouched() {
        let solc = modern();
        let response = solc
            .compile_json(r#"{"language":"Solidity","sources":{"A.sol":{"content":"__garbage__"}},"settings":{}}"#)
            .unwrap();
        assert_eq!(response, "Internal exception in StandardCompiler");
    }
}

// =============================================================================
// Close and drop
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn close_is_idempotent() {
        let solc = modern();
        assert!(!solc.is_closed());
        solc.close();
        solc.close();
        assert!(solc.is_closed());
    }

    #[test]
    fn compile_after_close_fails() {
        let solc = modern();
        solc.close();

        let err = solc
            .compile(&Input::solidity().with_source("A.sol", CONTRACT_A))
            .unwrap_err();
        assert!(matches!(err, Error::Closed));
        assert!(matches!(solc.compile_json("{}"), Err(Error::Closed)));
    }

    #[test]
    fn queries_after_close_are_empty() {
        let solc = modern();
        solc.close();
        assert_eq!(solc.version(), "");
        assert_eq!(solc.license(), "");
        // Discovery results outlive the engine.
        assert!(solc.capabilities().has(Capability::License));
    }

    #[test]
    fn drop_without_close() {
        let solc = modern();
        assert!(!solc.version().is_empty());
        drop(solc);
    }

    #[test]
    fn instances_are_independent() {
        let first = modern();
        let second = legacy();
        first.close();
        assert_eq!(second.version(), "0.5.17+commit.d19bba13.Emscripten.clang");
    }
}

// =============================================================================
// Sharing between threads
// =============================================================================

mod concurrency {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn solc_is_send_and_sync() {
        assert_send_sync::<Solc>();
        assert_send_sync::<Arc<Solc>>();
    }

    #[test]
    fn concurrent_compiles_are_serialized() {
        let solc = Arc::new(modern());
        let reference = solc
            .compile(&Input::solidity().with_source("A.sol", CONTRACT_A))
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let solc = Arc::clone(&solc);
                thread::spawn(move || {
                    (0..5)
                        .map(|_| {
                            solc.compile(&Input::solidity().with_source("A.sol", CONTRACT_A))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for output in handle.join().unwrap() {
                assert_eq!(output, reference);
            }
        }
    }

    /// Settings that take a while to encode. Encoding happens inside
    /// `compile`, so the bridge is locked for the whole delay.
    struct SlowSettings {
        entered: Sender<()>,
        finished: Arc<Mutex<Option<Instant>>>,
    }

    impl Serialize for SlowSettings {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let _ = self.entered.send(());
            thread::sleep(Duration::from_millis(200));
            *self.finished.lock().unwrap() = Some(Instant::now());
            serializer.serialize_map(Some(0))?.end()
        }
    }

    // Starts a compile with slow settings on another thread and returns
    // once its encoding has begun, along with the encode finish time.
    fn start_slow_compile(
        solc: &Arc<Solc>,
    ) -> (thread::JoinHandle<()>, Arc<Mutex<Option<Instant>>>) {
        let (entered, started) = mpsc::channel();
        let finished = Arc::new(Mutex::new(None));
        let input = Input::solidity()
            .with_source("A.sol", CONTRACT_A)
            .with_settings(SlowSettings {
                entered,
                finished: Arc::clone(&finished),
            });

        let worker = {
            let solc = Arc::clone(solc);
            thread::spawn(move || {
                solc.compile(&input).unwrap();
            })
        };
        started.recv().unwrap();
        (worker, finished)
    }

    #[test]
    fn query_waits_for_compile_in_progress() {
        let solc = Arc::new(modern());
        let (worker, finished) = start_slow_compile(&solc);

        let version = solc.version();
        let returned = Instant::now();
        assert_eq!(version, "0.8.9+commit.e5eed63a.Emscripten.clang");

        let finished = finished.lock().unwrap().unwrap();
        assert!(returned >= finished, "version() ran while compile held the bridge");
        worker.join().unwrap();
    }

    #[test]
    fn close_waits_for_compile_in_progress() {
        let solc = Arc::new(modern());
        let (worker, finished) = start_slow_compile(&solc);

        solc.close();
        let closed = Instant::now();

        let finished = finished.lock().unwrap().unwrap();
        assert!(closed >= finished, "close() ran while compile held the bridge");
        // The compile itself completed successfully.
        worker.join().unwrap();
        assert!(solc.is_closed());
    }

    #[test]
    fn queries_interleave_with_compiles() {
        let solc = Arc::new(modern());
        let compiler = {
            let solc = Arc::clone(&solc);
            thread::spawn(move || {
                for _ in 0..10 {
                    solc.compile(&Input::solidity().with_source("A.sol", CONTRACT_A))
                        .unwrap();
                }
            })
        };
        for _ in 0..10 {
            assert_eq!(solc.version(), "0.8.9+commit.e5eed63a.Emscripten.clang");
        }
        compiler.join().unwrap();
    }

    #[test]
    fn close_while_compiling() {
        let solc = Arc::new(modern());
        let worker = {
            let solc = Arc::clone(&solc);
            thread::spawn(move || {
                (0..20)
                    .map(|_| solc.compile(&Input::solidity().with_source("A.sol", CONTRACT_A)))
                    .collect::<Vec<_>>()
            })
        };
        solc.close();

        for result in worker.join().unwrap() {
            match result {
                Ok(output) => assert!(output.contract("A.sol", "A").is_some()),
                Err(Error::Closed) => {}
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        assert!(solc.is_closed());
    }
}
