// solbridge - Command-line front end
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use solbridge_embed::{EngineConfig, Solc};
use solbridge_schema::{Input, Output, SOLIDITY, Settings};
use tracing::{debug, level_filters::LevelFilter};

/// Run a soljson compiler build from the command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "solbridge")]
struct Cli {
    /// Path to the soljson.js compiler build
    #[arg(long, value_name = "PATH", env = "SOLBRIDGE_SOLJSON")]
    soljson: PathBuf,

    /// Heap limit for the JavaScript engine, in bytes
    #[arg(long, value_name = "BYTES")]
    memory_limit: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the compiler version
    Version,

    /// Print the compiler license
    License,

    /// Compile source files
    Compile(CompileArgs),
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Source files; each is registered under the path as given
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON file with the `settings` object (default: standard outputs)
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Source language
    #[arg(long, default_value = SOLIDITY)]
    language: String,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the compiler's response text as-is
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let config = engine_config(&cli);
    let solc = Solc::from_file_with_config(&cli.soljson, &config)
        .with_context(|| format!("cannot start compiler from '{}'", cli.soljson.display()))?;

    let code = match &cli.command {
        Command::Version => {
            println!("{}", solc.version());
            ExitCode::SUCCESS
        }
        Command::License => {
            println!("{}", solc.license());
            ExitCode::SUCCESS
        }
        Command::Compile(args) => compile(&solc, args)?,
    };

    solc.close();
    Ok(code)
}

fn engine_config(cli: &Cli) -> EngineConfig {
    let name = cli
        .soljson
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.soljson.display().to_string());
    let config = EngineConfig::new().script_name(name);
    match cli.memory_limit {
        Some(bytes) => config.memory_limit(bytes),
        None => config,
    }
}

fn compile(solc: &Solc, args: &CompileArgs) -> Result<ExitCode> {
    let input = build_input(args)?;
    debug!(files = input.sources.len(), "compiling");

    let (text, failed) = if args.raw {
        let request = serde_json::to_string(&input)?;
        let response = solc.compile_json(&request)?;
        // A response that does not decode counts as failed.
        let failed = serde_json::from_str::<Output>(&response)
            .map(|output| output.has_errors())
            .unwrap_or(true);
        (response, failed)
    } else {
        let output = solc.compile(&input)?;
        report(&output);
        (serde_json::to_string_pretty(&output)?, output.has_errors())
    };

    match &args.output {
        Some(path) => fs::write(path, text.as_bytes())
            .with_context(|| format!("cannot write '{}'", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            writeln!(stdout)?;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn build_input(args: &CompileArgs) -> Result<Input> {
    let settings = match &args.settings {
        Some(path) => read_settings(path)?,
        None => Settings::standard(),
    };

    let mut input = Input::new(args.language.as_str()).with_settings(settings);
    for path in &args.files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read source '{}'", path.display()))?;
        input = input.with_source(path.to_string_lossy(), content);
    }
    Ok(input)
}

fn read_settings(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read settings '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid settings in '{}'", path.display()))
}

fn report(output: &Output) {
    for diagnostic in output.diagnostics() {
        eprintln!("{}", diagnostic.display_message().trim_end());
    }
}
