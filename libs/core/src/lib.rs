//! Occupation coding toolkit: lookup tables, hosted-model decoding,
//! CSV pre-matching and embedding-ranked code suggestions.
//!
//! The HTTP service (`occucode-api`) and the command-line tool
//! (`occucode`) are thin shells over this crate.

pub mod completion;
pub mod decode;
pub mod embedding;
pub mod lookup;
pub mod mapping;
pub mod prematch;
pub mod rate_limit;
pub mod suggest;

pub use completion::{ChatCompletionClient, CompletionError, CompletionModel};
pub use decode::{classify_title, decode, ClassificationResult};
pub use embedding::{EmbedError, Embedder, HttpEmbedder};
pub use lookup::{LookupError, LookupSchema, LookupTable};
pub use mapping::{MappingError, MappingRecord, MappingSession};
pub use prematch::{ColumnSelector, PrematchError, PrematchOptions, PrematchSummary};
pub use rate_limit::{RateLimitExceeded, RateLimiter, DEFAULT_MAX_REQUESTS_PER_SESSION};
pub use suggest::{CodeIndex, SuggestError, Suggestion};
