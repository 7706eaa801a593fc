//! Terminal labeling tool.
//!
//! Type a profession, pick one of the ranked codes (or type one), confirm,
//! repeat. Lines starting with `:` are commands. Mappings only reach disk
//! on `:save`.

use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select};
use occucode_core::{CodeIndex, Embedder, MappingSession, SuggestError, Suggestion};
use tracing::warn;

#[derive(Debug, PartialEq, Eq)]
pub enum LabelCommand {
    Profession(String),
    List,
    /// 1-based, as shown by `:list`.
    Delete(usize),
    Save,
    Quit,
    Help,
    Empty,
    Invalid(String),
}

pub fn parse_line(line: &str) -> LabelCommand {
    let line = line.trim();
    if line.is_empty() {
        return LabelCommand::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return LabelCommand::Profession(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("list" | "l"), None, None) => LabelCommand::List,
        (Some("save" | "s"), None, None) => LabelCommand::Save,
        (Some("quit" | "q"), None, None) => LabelCommand::Quit,
        (Some("help" | "h"), None, None) => LabelCommand::Help,
        (Some("delete" | "d"), Some(n), None) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => LabelCommand::Delete(n),
            _ => LabelCommand::Invalid(format!("not a mapping number: {n}")),
        },
        _ => LabelCommand::Invalid(format!("unknown command: {line}")),
    }
}

const HELP: &str = "Commands: :list  :delete <n>  :save  :quit  :help";

/// What the user picked for one profession.
enum Choice {
    Code(String),
    Skip,
}

pub async fn run(
    index: &CodeIndex,
    embedder: &dyn Embedder,
    output: &Path,
    suggestions: usize,
) -> Result<()> {
    let mut session = MappingSession::new();
    let mut unsaved = false;

    println!("{} candidate codes loaded. {HELP}\n", index.len());

    loop {
        let line: String = Input::new()
            .with_prompt("Profession")
            .allow_empty(true)
            .interact_text()?;

        match parse_line(&line) {
            LabelCommand::Empty => continue,
            LabelCommand::Help => println!("{HELP}"),
            LabelCommand::Invalid(msg) => println!("  {msg}. {HELP}"),
            LabelCommand::List => print_mappings(&session),
            LabelCommand::Delete(n) => match session.remove(n - 1) {
                Ok(removed) => {
                    unsaved = true;
                    println!(
                        "  removed: {} → {}",
                        removed.prompt_occupation, removed.completion
                    );
                }
                Err(e) => println!("  {e}"),
            },
            LabelCommand::Save => match session.export(output) {
                Ok(()) => {
                    unsaved = false;
                    println!("  saved {} mappings to {}", session.len(), output.display());
                }
                Err(e) => println!("  {e}"),
            },
            LabelCommand::Quit => {
                if !unsaved
                    || Confirm::new()
                        .with_prompt("Discard unsaved mappings and quit?")
                        .default(false)
                        .interact()?
                {
                    break;
                }
            }
            LabelCommand::Profession(profession) => {
                let ranked = match index.suggest(&profession, suggestions, embedder).await {
                    Ok(ranked) => ranked,
                    Err(SuggestError::EmptyQuery) => continue,
                    Err(e) => {
                        warn!("suggestion failed: {e}");
                        println!("  could not get suggestions: {e}");
                        continue;
                    }
                };

                let Choice::Code(code) = choose_code(&ranked)? else {
                    println!("  skipped");
                    continue;
                };

                let confirmed = Confirm::new()
                    .with_prompt(format!("Add \"{profession}\" → \"{code}\"?"))
                    .default(true)
                    .interact()?;
                if !confirmed {
                    continue;
                }

                match session.add(&profession, &code) {
                    Ok(_) => {
                        println!("  added ({} total)", session.len());
                        unsaved = true;
                    }
                    Err(e) => println!("  {e}"),
                }
            }
        }
    }

    Ok(())
}

fn choose_code(ranked: &[Suggestion]) -> Result<Choice> {
    let mut items: Vec<String> = ranked
        .iter()
        .map(|s| format!("{} ({:.3})", s.code, s.score))
        .collect();
    let other = items.len();
    items.push("Type another code".to_string());
    items.push("Skip".to_string());

    let picked = Select::new()
        .with_prompt("Code")
        .items(&items)
        .default(0)
        .interact_opt()
        .context("reading code choice")?;

    Ok(match picked {
        Some(i) if i < other => Choice::Code(ranked[i].code.clone()),
        Some(i) if i == other => {
            let code: String = Input::new().with_prompt("Code").interact_text()?;
            Choice::Code(code)
        }
        _ => Choice::Skip,
    })
}

fn print_mappings(session: &MappingSession) {
    if session.is_empty() {
        println!("  no mappings yet");
        return;
    }
    for (i, record) in session.records().iter().enumerate() {
        println!(
            "  {:>3}. {} → {}",
            i + 1,
            record.prompt_occupation,
            record.completion
        );
    }
}
