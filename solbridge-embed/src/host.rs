// solbridge-embed - Runtime host
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The hosted JavaScript engine.
//!
//! A [`RuntimeHost`] owns one QuickJS runtime and one context, and the
//! compiler script is evaluated into that context exactly once. The
//! context is stateful and not reentrant: callers must serialize access
//! (the [`Solc`](crate::Solc) facade does this with a mutex).

use std::time::{Duration, Instant};

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{CatchResultExt, Context, Ctx, Function, Runtime, Value};
use tracing::{debug, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};

/// Console shim for scripts that expect a shell or browser environment.
const CONSOLE_SHIM: &str = "if (typeof console === 'undefined') { \
     globalThis.console = { log: print, info: print, warn: printErr, error: printErr }; \
     }";

/// One engine instance with one loaded compiler script.
pub struct RuntimeHost {
    // Dropped before the runtime it belongs to.
    context: Context,
    runtime: Runtime,
    script_name: String,
}

impl RuntimeHost {
    /// Create the engine and evaluate `script` in it.
    ///
    /// Compiler blobs initialise themselves while being evaluated, so this
    /// is slow and may fail for malformed or unsupported scripts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the engine cannot be created or the
    /// script throws during evaluation.
    #[instrument(skip(script, config), fields(name = %config.script_name, bytes = script.len()))]
    pub fn load(script: &str, config: &EngineConfig) -> Result<Self> {
        let name = config.script_name.as_str();
        let started = Instant::now();

        let runtime =
            Runtime::new().map_err(|e| Error::load(name, format!("cannot create runtime: {e}")))?;
        if let Some(limit) = config.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(limit) = config.max_stack_size {
            runtime.set_max_stack_size(limit);
        }
        if let Some(threshold) = config.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }

        let context = Context::full(&runtime)
            .map_err(|e| Error::load(name, format!("cannot create context: {e}")))?;

        context.with(|ctx| -> Result<()> {
            install_output_hooks(&ctx).map_err(|message| Error::load(name, message))?;
            ctx.eval::<Value, _>(script)
                .catch(&ctx)
                .map(drop)
                .map_err(|e| Error::load(name, e.to_string()))
        })?;

        // Some builds finish initialising in promise callbacks.
        while runtime.is_job_pending() {
            if runtime.execute_pending_job().is_err() {
                return Err(Error::load(name, "pending job failed during initialisation"));
            }
        }

        debug!(elapsed_ms = millis(started.elapsed()), "compiler script loaded");

        Ok(RuntimeHost {
            context,
            runtime,
            script_name: name.to_string(),
        })
    }

    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Whether `source` evaluates to a truthy value in the loaded context.
    pub fn is_truthy(&self, source: &str) -> bool {
        self.context.with(|ctx| {
            ctx.eval::<Coerced<bool>, _>(source)
                .catch(&ctx)
                .map(|truthy| truthy.0)
                .unwrap_or(false)
        })
    }

    /// Wrap the exported C function `symbol` with `Module.cwrap` and keep
    /// the wrapper in the global `handle`.
    ///
    /// `returns` and `arg_types` use cwrap's type names (`"string"`,
    /// `"number"`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Binding`] if cwrap is missing, throws, or does not
    /// return a function.
    pub fn bind(&self, symbol: &str, returns: &str, arg_types: &[&str], handle: &str) -> Result<()> {
        let arg_list = arg_types
            .iter()
            .map(|ty| format!("'{ty}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let source = format!("Module.cwrap('{symbol}', '{returns}', [{arg_list}])");

        self.context.with(|ctx| {
            let wrapper: Function = ctx
                .eval(source)
                .catch(&ctx)
                .map_err(|e| Error::binding(symbol, e.to_string()))?;
            ctx.globals()
                .set(handle, wrapper)
                .catch(&ctx)
                .map_err(|e| Error::binding(symbol, e.to_string()))
        })
    }

    /// Call a bound `() -> string` entry point.
    pub fn call_nullary(&self, handle: &str, symbol: &str) -> Result<String> {
        self.context.with(|ctx| {
            let function = bound_function(&ctx, handle, symbol)?;
            function
                .call::<_, String>(())
                .catch(&ctx)
                .map_err(|e| Error::invocation(symbol, e.to_string()))
        })
    }

    /// Call a bound `(string, number, number) -> string` entry point.
    pub fn call_compile(
        &self,
        handle: &str,
        symbol: &str,
        input: &str,
        flags: (u32, u32),
    ) -> Result<String> {
        self.context.with(|ctx| {
            let function = bound_function(&ctx, handle, symbol)?;
            function
                .call::<_, String>((input, flags.0, flags.1))
                .catch(&ctx)
                .map_err(|e| Error::invocation(symbol, e.to_string()))
        })
    }
}

impl Drop for RuntimeHost {
    fn drop(&mut self) {
        self.runtime.run_gc();
        debug!(script = %self.script_name, "releasing compiler runtime");
    }
}

fn bound_function<'js>(ctx: &Ctx<'js>, handle: &str, symbol: &str) -> Result<Function<'js>> {
    ctx.globals()
        .get::<_, Function>(handle)
        .catch(ctx)
        .map_err(|e| Error::invocation(symbol, format!("entry point is not callable: {e}")))
}

// Emscripten output writes through `print`/`printErr`; route both to the
// log instead of leaving them undefined.
fn install_output_hooks(ctx: &Ctx<'_>) -> std::result::Result<(), String> {
    let print = Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
        debug!(target: "solbridge::script", "{}", join_args(args));
    })
    .map_err(|e| e.to_string())?;
    let print_err = Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
        warn!(target: "solbridge::script", "{}", join_args(args));
    })
    .map_err(|e| e.to_string())?;

    let globals = ctx.globals();
    globals.set("print", print).map_err(|e| e.to_string())?;
    globals.set("printErr", print_err).map_err(|e| e.to_string())?;
    ctx.eval::<(), _>(CONSOLE_SHIM)
        .catch(ctx)
        .map_err(|e| e.to_string())
}

fn join_args(args: Rest<Coerced<String>>) -> String {
    args.0
        .into_iter()
        .map(|arg| arg.0)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
