use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DiscoError {
    #[error("invalid gene symbol: {0:?}")]
    InvalidGeneSymbol(String),

    #[error("gene list is empty")]
    #[diagnostic(help("provide one gene symbol per line; blank lines are ignored"))]
    EmptyGeneList,

    #[error("invalid model identifier: {0}")]
    #[diagnostic(help("supported models: gpt-4o, gpt-3.5-turbo, gpt-4"))]
    InvalidModel(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing OPENAI_API_KEY environment variable")]
    MissingApiKey,

    #[error("WikiPathways request failed: {0}")]
    WikiPathwaysHttp(String),

    #[error("WikiPathways returned status {status}: {message}")]
    WikiPathwaysStatus { status: u16, message: String },

    #[error("failed to parse WikiPathways response: {0}")]
    WikiPathwaysParse(String),

    #[error("completion request failed: {0}")]
    LlmHttp(String),

    #[error("completion endpoint returned status {status}: {message}")]
    LlmStatus { status: u16, message: String },

    #[error("no content received from completion endpoint")]
    LlmEmptyResponse,

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
