use std::fmt::Write as _;

use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened, why, and how to fix it.
/// Designed to be readable by both humans and LLM agents.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::ApiKeyMissing { env_var } => render_api_key_missing(env_var),
        Error::CheckpointCorrupt { path, reason } => {
            render_checkpoint_corrupt(&path.display().to_string(), reason)
        },
        Error::RootNotFound { path } => render_root_not_found(&path.display().to_string()),
        Error::UnknownMode { available, name } => render_unknown_mode(name, available),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::Csv(e) => format!("\
# Error: CSV

{e}
"),
        Error::HttpClient(e) => format!("\
# Error: HTTP Client

{e}
"),
        Error::InvalidConfig { reason } => format!("\
# Error: Invalid Config

{reason}

## Fix

Correct the setting in `.coderev.toml`.
"),
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
        Error::Walk(e) => format!("\
# Error: Traversal

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_api_key_missing(env_var: &str) -> String {
    format!(
        "\
# Error: API Key Missing

The environment variable `{env_var}` is unset or empty.

## Fix

Export the key before scanning:

    export {env_var}=sk-...

A different variable name can be set via `api_key_env` under `[api]`
in `.coderev.toml`.
"
    )
}

fn render_checkpoint_corrupt(path: &str, reason: &str) -> String {
    format!(
        "\
# Error: Checkpoint Corrupt

`{path}` exists but cannot be parsed: {reason}

## Fix

Move the file aside and rescan, or repair the broken row by hand.
Completed work recorded in intact rows is preserved either way.
"
    )
}

fn render_root_not_found(path: &str) -> String {
    format!(
        "\
# Error: Scan Root Not Found

`{path}` does not exist or is not a directory.

## Fix

Check the mode's `root` under `[modes]` in `.coderev.toml`.
"
    )
}

fn render_unknown_mode(name: &str, available: &[String]) -> String {
    let mut out = format!(
        "\
# Error: Unknown Mode

Mode `{name}` is not configured.

## Configured modes

"
    );
    for mode in available {
        let _ = writeln!(out, "- `{mode}`");
    }

    out.push_str(&format!(
        "\
\n## Fix

Add it to `.coderev.toml`:

    [modes.{name}]
    root = \"path/to/{name}\"
    checkpoint = \"{name}_scan_results.csv\"
"
    ));
    out
}
