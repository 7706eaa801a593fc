// Web labeling tool: semantic code suggestions and the session's confirmed mappings.

pub mod handlers;

/// Suggestion count bounds for the web tool.
pub const MIN_SUGGESTIONS: usize = 1;
pub const MAX_SUGGESTIONS: usize = 20;
pub const DEFAULT_SUGGESTIONS: usize = 10;
