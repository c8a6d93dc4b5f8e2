//! Command-line entry point for lunafmt
//!
//! Exactly one operation flag selects what to do; `--param` picks the
//! pretty-printing style for format operations. Exit code 0 on success,
//! 1 on argument, configuration or I/O errors. Per-file syntax errors
//! inside a directory operation are logged and skipped.

use clap::error::ErrorKind;
use clap::{Arg, ArgGroup, Command};
use lunafmt::{driver, task, Mode};
use std::path::Path;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("lunafmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Batch formatter and minifier for Lua 5.1/5.2 source code")
        .arg(
            Arg::new("format-file")
                .long("format-file")
                .value_name("FILE")
                .help("Format the specified file in place"),
        )
        .arg(
            Arg::new("format-directory")
                .long("format-directory")
                .value_name("DIR")
                .help("Format all .lua files under the directory recursively"),
        )
        .arg(
            Arg::new("compress-file")
                .long("compress-file")
                .value_name("FILE")
                .help("Compress the specified file in place"),
        )
        .arg(
            Arg::new("compress-directory")
                .long("compress-directory")
                .value_name("DIR")
                .help("Compress all .lua files under the directory recursively"),
        )
        .arg(
            Arg::new("json-task")
                .long("json-task")
                .value_name("FILE")
                .help("Process tasks defined in the specified JSON manifest"),
        )
        .arg(
            Arg::new("param")
                .long("param")
                .value_name("STYLE")
                .value_parser(["auto", "manual"])
                .default_value("auto")
                .help("Pretty-printing style for format operations"),
        )
        .group(ArgGroup::new("operation").args([
            "format-file",
            "format-directory",
            "compress-file",
            "compress-directory",
            "json-task",
        ]))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = match cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    let style = match matches.get_one::<String>("param").map(String::as_str) {
        Some("manual") => Mode::Manual,
        _ => Mode::Auto,
    };

    let result = if let Some(path) = matches.get_one::<String>("format-file") {
        driver::format_file(Path::new(path), style)
    } else if let Some(path) = matches.get_one::<String>("format-directory") {
        driver::format_directory(Path::new(path), style)
    } else if let Some(path) = matches.get_one::<String>("compress-file") {
        driver::compress_file(Path::new(path))
    } else if let Some(path) = matches.get_one::<String>("compress-directory") {
        driver::compress_directory(Path::new(path))
    } else if let Some(path) = matches.get_one::<String>("json-task") {
        task::run_manifest(Path::new(path))
    } else {
        // no operation given: behave like --help
        let _ = cli().print_help();
        return ExitCode::SUCCESS;
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
