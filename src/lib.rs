pub mod batch;
pub mod config;
pub mod detail;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod llm;
pub mod lookup;
pub mod narrative;
pub mod output;
pub mod relevance;
pub mod task;
pub mod wikipathways;
pub mod workspace;
