//! Parsing raw input lines into validated command invocations.

use std::path::PathBuf;

use crate::error::{Result, SigilError};
use crate::replacements::Replacement;

use super::descriptor;

/// A validated command invocation, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `/replacements` - print the active table
    Replacements,
    /// `/add` - extend the table with the given pairs
    Add(Vec<Replacement>),
    /// `/watch` - begin polling the given files
    Watch { copy: bool, files: Vec<PathBuf> },
    /// `/killwatch` - stop the given watches, or all when empty
    KillWatch(Vec<PathBuf>),
    /// `/exit` - stop everything and leave
    Exit,
    /// `/help` - list commands by display index
    Help,
}

/// Parses a trimmed input line.
///
/// Returns `Ok(None)` when the first token is not a known command name, in
/// which case the caller treats the whole line as text to convert. Once a
/// name matches there is no fallthrough: a malformed rest-of-line is a
/// `Usage` error, not plain text.
pub fn parse(input: &str) -> Result<Option<Invocation>> {
    let Some(command) = descriptor::find(input) else {
        return Ok(None);
    };

    let line = normalized(input);
    if !command.validates(&line) {
        return Err(SigilError::usage(command.error_message.clone()));
    }

    let args: Vec<&str> = line.split_whitespace().skip(1).collect();

    let invocation = match command.name {
        "/replacements" => Invocation::Replacements,
        "/add" => Invocation::Add(parse_pairs(&args)),
        "/watch" => {
            let copy = args.first() == Some(&"-c");
            let files = args
                .iter()
                .skip(if copy { 1 } else { 0 })
                .map(PathBuf::from)
                .collect();
            Invocation::Watch { copy, files }
        }
        "/killwatch" => Invocation::KillWatch(args.iter().map(PathBuf::from).collect()),
        "/exit" => Invocation::Exit,
        "/help" => Invocation::Help,
        other => return Err(SigilError::Internal(format!("unhandled command {other}"))),
    };

    Ok(Some(invocation))
}

/// Lowercases the command token, leaving arguments untouched.
fn normalized(input: &str) -> String {
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => format!("{} {}", head.to_ascii_lowercase(), rest),
        None => input.to_ascii_lowercase(),
    }
}

/// Splits `shortcut->symbol` tokens already accepted by the `/add` pattern.
fn parse_pairs(args: &[&str]) -> Vec<Replacement> {
    args.iter()
        .filter_map(|token| token.split_once("->"))
        .map(|(shortcut, symbol)| Replacement::new(shortcut, symbol))
        .collect()
}
