mod cli;
mod label;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dialoguer::Select;
use occucode_core::prematch::{self, prematch_file, read_headers};
use occucode_core::{
    classify_title, ChatCompletionClient, CodeIndex, ColumnSelector, HttpEmbedder, LookupSchema,
    LookupTable, PrematchOptions,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("occucode={level},occucode_core={level}"))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Prematch {
            input,
            output,
            lookup,
            column,
            column_index,
            output_column,
            method_column,
        } => {
            let table = load_table(&lookup, prematch::TABLE_SCHEMA)?;
            let column = match (column, column_index) {
                (Some(name), _) => ColumnSelector::Name(name),
                (None, Some(idx)) => ColumnSelector::Index(idx),
                (None, None) => prompt_column(&input)?,
            };

            let options = PrematchOptions {
                column,
                output_column,
                method_column,
            };
            let summary = prematch_file(&input, &output, &table, &options)
                .with_context(|| format!("pre-matching {}", input.display()))?;

            println!(
                "{} rows: {} matched, {} unmatched, {} missing",
                summary.rows, summary.matched, summary.unmatched, summary.missing
            );
            println!("Written to {}", output.display());
        }

        Commands::Label {
            lookup,
            output,
            suggestions,
            embedding,
        } => {
            if suggestions == 0 {
                bail!("--suggestions must be at least 1");
            }
            let codes = load_table(&lookup, LookupSchema::Auto)?.distinct_codes();
            let embedder = HttpEmbedder::new(
                embedding.embedding_base_url,
                embedding.embedding_api_key,
                embedding.embedding_model,
            )?;

            println!("Embedding {} codes with {}...", codes.len(), embedder.model());
            let index = CodeIndex::build(codes, &embedder)
                .await
                .context("embedding code list")?;

            label::run(&index, &embedder, &output, suggestions).await?;
        }

        Commands::Classify {
            title,
            lookup,
            api_key,
            base_url,
            model,
        } => {
            if title.trim().is_empty() {
                bail!("title must not be empty");
            }
            let decoder = load_table(&lookup, LookupSchema::Serving)?;
            let client = ChatCompletionClient::new(base_url, api_key, model)?;

            let result = classify_title(&client, &decoder, &title)
                .await
                .with_context(|| format!("classifying \"{}\"", title.trim()))?;

            println!("Raw classification: {}", result.raw_output);
            match &result.decoded_output {
                Some(decoded) => println!("Human-readable classification: {decoded}"),
                None => println!("No match found for the raw output. Likely hallucination."),
            }
        }

        Commands::Codes { lookup } => {
            for code in load_table(&lookup, LookupSchema::Auto)?.distinct_codes() {
                println!("{code}");
            }
        }
    }

    Ok(())
}

fn load_table(path: &Path, schema: LookupSchema) -> Result<LookupTable> {
    let table = LookupTable::load(path, schema)
        .with_context(|| format!("loading lookup table {}", path.display()))?;
    info!(entries = table.len(), path = %path.display(), "lookup table loaded");
    Ok(table)
}

/// Lists the header and asks which column to match. Escape aborts.
fn prompt_column(input: &Path) -> Result<ColumnSelector> {
    let headers = read_headers(input)
        .with_context(|| format!("reading header of {}", input.display()))?;
    if headers.is_empty() {
        bail!("{} has no columns", input.display());
    }

    let picked = Select::new()
        .with_prompt("Column containing the occupation text")
        .items(&headers)
        .default(0)
        .interact_opt()?;

    match picked {
        Some(idx) => Ok(ColumnSelector::Index(idx)),
        None => bail!("no column selected; nothing written"),
    }
}
