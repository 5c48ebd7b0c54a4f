use tracing::debug;

use crate::domain::{ChatModel, GeneSymbol, PathwayCandidate, RelevantPathway};
use crate::error::DiscoError;
use crate::ledger::{ErrorLog, RunLog};
use crate::llm::{ChatClient, ChatRequest};

pub const RELEVANCE_SYSTEM_PROMPT: &str = "You are a helpful assistant designed to precisely decide if the query is fitting the provided pathways.";
pub const RELEVANCE_MAX_TOKENS: u32 = 500;

pub fn relevance_request(
    model: ChatModel,
    temperature: f32,
    candidate: &PathwayCandidate,
    query: &str,
) -> ChatRequest {
    ChatRequest::new(
        model,
        temperature,
        RELEVANCE_SYSTEM_PROMPT,
        format!("Is the pathway '{}' {}?", candidate.name, query),
    )
    .with_max_tokens(RELEVANCE_MAX_TOKENS)
}

/// Relevant iff the lower-cased answer contains `yes` or `true` anywhere.
/// Blank answers are errors, not a "no".
pub fn judge_answer(answer: &str) -> Result<bool, DiscoError> {
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() {
        return Err(DiscoError::LlmEmptyResponse);
    }
    Ok(answer.contains("yes") || answer.contains("true"))
}

pub struct RelevanceFilter<'a, L: ChatClient> {
    llm: &'a L,
    model: ChatModel,
    temperature: f32,
    query: &'a str,
}

impl<'a, L: ChatClient> RelevanceFilter<'a, L> {
    pub fn new(llm: &'a L, model: ChatModel, temperature: f32, query: &'a str) -> Self {
        Self {
            llm,
            model,
            temperature,
            query,
        }
    }

    pub fn filter(
        &self,
        gene: &GeneSymbol,
        candidates: &[PathwayCandidate],
        errors: &ErrorLog,
        run_log: &RunLog,
    ) -> Vec<RelevantPathway> {
        let mut relevant = Vec::new();
        for candidate in candidates {
            let request = relevance_request(self.model, self.temperature, candidate, self.query);
            let verdict = self
                .llm
                .complete(&request)
                .and_then(|answer| judge_answer(&answer));
            match verdict {
                Ok(true) => {
                    run_log.line(&format!(
                        "Pathway '{}' is relevant to the gene '{gene}' regarding the user's query.",
                        candidate.name
                    ));
                    relevant.push(RelevantPathway::new(gene, candidate));
                }
                Ok(false) => {
                    run_log.line(&format!(
                        "Pathway '{}' is not relevant to the gene '{gene}' regarding the user's query.",
                        candidate.name
                    ));
                }
                Err(DiscoError::LlmEmptyResponse) => {
                    errors.record(format!(
                        "No content received from AI response for pathway {} ({}) of gene {gene}.",
                        candidate.name, candidate.id
                    ));
                }
                Err(err) => {
                    errors.record(format!(
                        "An error occurred during AI query processing for pathway {} ({}) of gene {gene}: {err}",
                        candidate.name, candidate.id
                    ));
                }
            }
        }
        debug!(gene = %gene, judged = candidates.len(), relevant = relevant.len(), "relevance.done");
        relevant
    }
}
