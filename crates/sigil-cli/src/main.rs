use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tokio::sync::{RwLock, mpsc};
use tracing_subscriber::EnvFilter;

use sigil_core::command::{self, Invocation};
use sigil_core::{Clipboard, Config, SharedTable};
use sigil_watch::{Reaction, WatchManager};

mod clipboard;
mod helper;

use helper::CliHelper;

const BANNER: &str = r#"
     _       _ _
 ___(_) __ _(_) |
/ __| |/ _` | | |
\__ \ | (_| | | |
|___/_|\__, |_|_|
       |___/
"#;

/// Whether the REPL keeps going after an invocation.
enum Flow {
    Continue,
    Exit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_default()?;

    // ===== Shared state =====
    let table: SharedTable = Arc::new(RwLock::new(config.table()));
    let manager = WatchManager::new(Arc::clone(&table));
    let clipboard = clipboard::open();

    // ===== Background tasks =====
    // The poller detects modifications; the handler prints and copies.
    let (reaction_tx, mut reaction_rx) = mpsc::channel::<Reaction>(32);
    let poller = manager.spawn_poller(config.poll_interval(), reaction_tx);

    let handler_clipboard = Arc::clone(&clipboard);
    let reaction_handler = tokio::spawn(async move {
        while let Some(reaction) = reaction_rx.recv().await {
            println!();
            println!(
                "{}",
                format!("{} changed:", reaction.path.display()).bright_black()
            );
            for line in reaction.converted.lines() {
                println!("\t{line}");
            }
            if reaction.copy_to_clipboard {
                match handler_clipboard.copy(&reaction.converted) {
                    Ok(()) => println!("\t{}", "Copied!".green()),
                    Err(err) => {
                        tracing::warn!(target: "sigil_cli", "clipboard copy failed: {err}");
                    }
                }
            }
        }
    });

    // ===== REPL setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", BANNER.bright_magenta());
    println!(
        "{}",
        "Enter text to convert, or type /help for more info.".bright_black()
    );
    println!();

    // ===== Main REPL loop =====
    loop {
        match rl.readline(">>> ") {
            Ok(line) => {
                let trimmed = line.trim();

                // Blank input: reprompt without action.
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match command::parse(trimmed) {
                    Ok(Some(invocation)) => {
                        if let Flow::Exit =
                            run_invocation(invocation, &manager, &table).await
                        {
                            break;
                        }
                    }
                    Ok(None) => convert_and_print(trimmed, &table, clipboard.as_ref()).await,
                    Err(err) => println!("{}", err.to_string().red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /exit to quit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    // ===== Shutdown =====
    // Stop the poll loop before leaving so no reaction outlives the REPL;
    // the handler ends once the poller drops the channel sender.
    manager.remove_all().await;
    manager.shutdown();
    let _ = poller.await;
    let _ = reaction_handler.await;
    println!("{}", "Goodbye!".bright_green());

    Ok(())
}

/// Executes a validated command invocation.
async fn run_invocation(
    invocation: Invocation,
    manager: &WatchManager,
    table: &SharedTable,
) -> Flow {
    match invocation {
        Invocation::Replacements => {
            let table = table.read().await;
            let width = table
                .iter()
                .map(|r| r.shortcut.len())
                .max()
                .unwrap_or_default();
            println!("\t{}", "Active replacements:".bold());
            for rule in table.iter() {
                println!("\t  {:>width$} : {}", rule.shortcut, rule.symbol);
            }
        }
        Invocation::Add(pairs) => {
            let mut table = table.write().await;
            let count = pairs.len();
            for pair in pairs {
                table.add(pair.shortcut, pair.symbol);
            }
            println!(
                "\t{}",
                format!("Added {count} replacement{}.", plural(count)).green()
            );
        }
        Invocation::Watch { copy, files } => match manager.add_watches(&files, copy).await {
            Ok(()) => {
                let count = files.len();
                println!(
                    "\t{}",
                    format!("Watching {count} file{}.", plural(count)).green()
                );
            }
            Err(err) => println!("{}", err.to_string().red()),
        },
        Invocation::KillWatch(files) => {
            if files.is_empty() {
                manager.remove_all().await;
                println!("\t{}", "Stopped all watches.".green());
            } else {
                manager.remove_watches(&files).await;
                let count = files.len();
                println!(
                    "\t{}",
                    format!("Stopped watching {count} file{}.", plural(count)).green()
                );
            }
        }
        Invocation::Help => {
            for descriptor in command::help_order() {
                println!("\t{}", descriptor.syntax.bright_cyan());
                println!("\t    {}", descriptor.effect);
            }
        }
        Invocation::Exit => return Flow::Exit,
    }
    Flow::Continue
}

/// Converts plain text, prints each line indented, and copies the result.
async fn convert_and_print(input: &str, table: &SharedTable, clipboard: &dyn Clipboard) {
    let converted = table.read().await.convert(input);

    for line in converted.lines() {
        println!("\t{line}");
    }

    match clipboard.copy(&converted) {
        Ok(()) => println!("\n\t{}", "Copied!".green()),
        Err(err) => tracing::warn!(target: "sigil_cli", "clipboard copy failed: {err}"),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sigil_core::ReplacementTable;
    use sigil_core::clipboard::RecordingClipboard;

    #[tokio::test]
    async fn test_convert_and_print_copies_converted_text() {
        let table: SharedTable = Arc::new(RwLock::new(ReplacementTable::builtin()));
        let clipboard = RecordingClipboard::new();

        convert_and_print("AA x: x ee RR", &table, &clipboard).await;

        assert_eq!(clipboard.copies(), vec!["∀ x: x ∈ ℝ".to_string()]);
    }

    #[tokio::test]
    async fn test_add_invocation_mutates_shared_table() {
        let table: SharedTable = Arc::new(RwLock::new(ReplacementTable::builtin()));
        let manager = WatchManager::new(Arc::clone(&table));

        let invocation = command::parse("/add qed->∎").unwrap().unwrap();
        assert!(matches!(
            run_invocation(invocation, &manager, &table).await,
            Flow::Continue
        ));

        assert_eq!(table.read().await.convert("qed"), "∎");
    }

    #[tokio::test]
    async fn test_exit_invocation_ends_the_loop() {
        let table: SharedTable = Arc::new(RwLock::new(ReplacementTable::builtin()));
        let manager = WatchManager::new(Arc::clone(&table));

        let invocation = command::parse("/exit").unwrap().unwrap();
        assert!(matches!(
            run_invocation(invocation, &manager, &table).await,
            Flow::Exit
        ));
    }
}
