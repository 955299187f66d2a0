//! Builtin slash commands provided by the REPL.
//!
//! The command set is fixed: descriptors are built once at first access and
//! cached for the lifetime of the process. Construction is two-phase so an
//! error message can quote its own command's syntax string without any
//! self-referential initialization.

use std::sync::OnceLock;

use regex::Regex;

/// A builtin slash command descriptor.
#[derive(Debug)]
pub struct CommandDescriptor {
    /// Command name, including the leading slash (e.g. `/watch`)
    pub name: &'static str,
    /// `/help` lists commands in ascending order of this value
    pub index: u32,
    /// User-facing syntax (e.g. `/watch [-c] filename.txt [filename.txt ...]`)
    pub syntax: &'static str,
    /// User-facing description of what the command does
    pub effect: &'static str,
    /// Full-line pattern the input must satisfy to execute
    pattern: Regex,
    /// Printed when the name matches but the pattern does not
    pub error_message: String,
}

impl CommandDescriptor {
    /// Returns true when the whole input line satisfies this command's
    /// syntax pattern.
    pub fn validates(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Raw descriptor data before error messages are attached.
struct RawDescriptor {
    name: &'static str,
    index: u32,
    syntax: &'static str,
    effect: &'static str,
    pattern: &'static str,
    extra_hint: Option<&'static str>,
}

static REGISTRY: OnceLock<Vec<CommandDescriptor>> = OnceLock::new();

/// Returns the fixed command registry.
pub fn registry() -> &'static [CommandDescriptor] {
    REGISTRY.get_or_init(|| {
        let raw = [
            RawDescriptor {
                name: "/replacements",
                index: 0,
                syntax: "/replacements",
                effect: "Shows the list of active text replacements.",
                pattern: r"^/replacements$",
                extra_hint: None,
            },
            RawDescriptor {
                name: "/add",
                index: 1,
                syntax: "/add shortcut->symbol [shortcut->symbol ...]",
                effect: "Adds shortcuts to the list of active text replacements.",
                pattern: r"^/add(\s+\S+->\S+)+$",
                extra_hint: None,
            },
            RawDescriptor {
                name: "/watch",
                index: 100,
                syntax: "/watch [-c] filename.txt [filename.txt ...]",
                effect: "Watches the given file(s) and converts their contents on \
                         every save (checked once per poll interval). With -c the \
                         converted text is also copied to the clipboard.",
                pattern: r"^/watch(\s+-c)?(\s+\S+\.txt)+$",
                extra_hint: Some("only .txt files supported"),
            },
            RawDescriptor {
                name: "/killwatch",
                index: 200,
                syntax: "/killwatch [filename.txt ...]",
                effect: "Stops watching the given files, or all watched files if \
                         none are given.",
                pattern: r"^/killwatch(\s+\S+\.txt)*$",
                extra_hint: Some("only .txt files supported"),
            },
            RawDescriptor {
                name: "/exit",
                index: 9900,
                syntax: "/exit",
                effect: "Stops any active filewatchers and exits.",
                pattern: r"^/exit$",
                extra_hint: None,
            },
            RawDescriptor {
                name: "/help",
                index: 10000,
                syntax: "/help",
                effect: "Shows this help dialog.",
                pattern: r"^/help$",
                extra_hint: None,
            },
        ];

        // Phase two: attach error messages quoting the syntax strings.
        raw.into_iter()
            .map(|r| {
                let error_message = match r.extra_hint {
                    Some(hint) => format!("Incorrect usage ({hint}). Syntax: {}", r.syntax),
                    None => format!("Incorrect usage. Syntax: {}", r.syntax),
                };
                CommandDescriptor {
                    name: r.name,
                    index: r.index,
                    syntax: r.syntax,
                    effect: r.effect,
                    pattern: Regex::new(r.pattern).expect("builtin command pattern is valid"),
                    error_message,
                }
            })
            .collect()
    })
}

/// Looks up a descriptor by the first whitespace-delimited token of `input`.
///
/// The token is lowercased before the comparison, so command names are
/// effectively lowercase-only; the rest of the line keeps its case.
pub fn find(input: &str) -> Option<&'static CommandDescriptor> {
    let token = input.split_whitespace().next()?.to_ascii_lowercase();
    registry().iter().find(|c| c.name == token)
}

/// Returns every descriptor sorted ascending by display index.
pub fn help_order() -> Vec<&'static CommandDescriptor> {
    let mut commands: Vec<_> = registry().iter().collect();
    commands.sort_by_key(|c| c.index);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_command() {
        assert_eq!(find("/help").unwrap().name, "/help");
        assert_eq!(find("/watch -c a.txt").unwrap().name, "/watch");
    }

    #[test]
    fn test_find_is_lowercase_only() {
        // Uppercase input still resolves because the token is lowercased.
        assert_eq!(find("/HELP").unwrap().name, "/help");
    }

    #[test]
    fn test_find_unknown_token() {
        assert!(find("help").is_none());
        assert!(find("/helpme").is_none());
        assert!(find("AA -> BB").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn test_help_order_ascends_by_index() {
        let ordered = help_order();
        let indices: Vec<u32> = ordered.iter().map(|c| c.index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
        assert_eq!(ordered.first().unwrap().name, "/replacements");
        assert_eq!(ordered.last().unwrap().name, "/help");
    }

    #[test]
    fn test_error_messages_quote_sibling_syntax() {
        for descriptor in registry() {
            assert!(descriptor.error_message.contains(descriptor.syntax));
        }
    }

    #[test]
    fn test_watch_pattern() {
        let watch = find("/watch").unwrap();
        assert!(watch.validates("/watch notes.txt"));
        assert!(watch.validates("/watch -c notes.txt proofs.txt"));
        assert!(!watch.validates("/watch"));
        assert!(!watch.validates("/watch notes.md"));
        assert!(!watch.validates("/watch -c"));
    }

    #[test]
    fn test_killwatch_pattern_allows_no_args() {
        let killwatch = find("/killwatch").unwrap();
        assert!(killwatch.validates("/killwatch"));
        assert!(killwatch.validates("/killwatch notes.txt"));
        assert!(!killwatch.validates("/killwatch notes.md"));
    }

    #[test]
    fn test_add_pattern() {
        let add = find("/add").unwrap();
        assert!(add.validates("/add qed->∎"));
        assert!(add.validates("/add a->b c->d"));
        assert!(!add.validates("/add"));
        assert!(!add.validates("/add junk"));
        assert!(!add.validates("/add ->x"));
    }

    #[test]
    fn test_bare_commands_reject_arguments() {
        assert!(!find("/exit").unwrap().validates("/exit now"));
        assert!(!find("/help").unwrap().validates("/help me"));
        assert!(!find("/replacements").unwrap().validates("/replacements all"));
    }
}
