use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use occucode_core::completion::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID};
use occucode_core::embedding::DEFAULT_EMBEDDING_MODEL;
use occucode_core::prematch::{DEFAULT_METHOD_COLUMN, DEFAULT_OUTPUT_COLUMN};

#[derive(Parser)]
#[command(name = "occucode")]
#[command(about = "Occupation title coding: pre-match, label, classify", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill a CSV column with codes from a lookup table (case-insensitive exact match)
    Prematch {
        /// Input CSV with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Line-delimited JSON lookup table
        #[arg(short, long)]
        lookup: PathBuf,

        /// Column to match, by header name
        #[arg(short, long, conflicts_with = "column_index")]
        column: Option<String>,

        /// Column to match, by 0-based position
        #[arg(long)]
        column_index: Option<usize>,

        /// Name of the column that receives the matched code
        #[arg(long, default_value = DEFAULT_OUTPUT_COLUMN)]
        output_column: String,

        /// Name of the column that receives the match method
        #[arg(long, default_value = DEFAULT_METHOD_COLUMN)]
        method_column: String,
    },

    /// Interactively map professions to codes with embedding suggestions
    Label {
        /// Lookup table whose distinct codes are the candidates
        #[arg(short, long)]
        lookup: PathBuf,

        /// Where `:save` writes the mappings
        #[arg(short, long, default_value = "prematch.jsonl")]
        output: PathBuf,

        /// Suggestions shown per profession
        #[arg(short, long, default_value = "5")]
        suggestions: usize,

        #[command(flatten)]
        embedding: EmbeddingArgs,
    },

    /// Classify one title with the hosted model and decode the answer
    Classify {
        /// Occupation title
        title: String,

        /// Serving-side decode table
        #[arg(short, long, env = "DECODER_PATH")]
        lookup: PathBuf,

        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: String,

        #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        #[arg(long, env = "MODEL_ID", default_value = DEFAULT_MODEL_ID)]
        model: String,
    },

    /// Print the distinct codes of a lookup table
    Codes {
        #[arg(short, long)]
        lookup: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EmbeddingArgs {
    /// OpenAI-compatible embeddings endpoint
    #[arg(long, env = "EMBEDDING_BASE_URL")]
    pub embedding_base_url: String,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,
}
