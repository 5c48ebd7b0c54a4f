use serde::Serialize;
use tracing::{debug, info};

use crate::config::BatchConfig;
use crate::detail::PathwayDetailFetcher;
use crate::domain::GeneSymbol;
use crate::ledger::{ErrorLog, RunLog};
use crate::llm::ChatClient;
use crate::lookup::PathwayLookupClient;
use crate::narrative::NarrativeSynthesizer;
use crate::relevance::RelevanceFilter;
use crate::wikipathways::PathwayClient;
use crate::workspace::BatchWorkspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneState {
    Pending,
    LookedUp,
    Filtered,
    Detailed,
    Synthesized,
    Done,
    FailedEarly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyFailure {
    LookupError,
    NoCandidates,
    NoRelevantCandidates,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneOutcome {
    pub gene: GeneSymbol,
    pub state: GeneState,
    pub failure: Option<EarlyFailure>,
    pub candidates: usize,
    pub relevant: usize,
    pub details_fetched: usize,
    pub detail_failures: usize,
    pub narrative_failures: usize,
    pub synthesis_failed: bool,
    pub artifact_written: bool,
}

impl GeneOutcome {
    pub fn pending(gene: GeneSymbol) -> Self {
        Self {
            gene,
            state: GeneState::Pending,
            failure: None,
            candidates: 0,
            relevant: 0,
            details_fetched: 0,
            detail_failures: 0,
            narrative_failures: 0,
            synthesis_failed: false,
            artifact_written: false,
        }
    }

    pub fn aborted(gene: GeneSymbol) -> Self {
        let mut outcome = Self::pending(gene);
        outcome.fail(EarlyFailure::Aborted);
        outcome
    }

    pub fn is_done(&self) -> bool {
        self.state == GeneState::Done
    }

    fn advance(&mut self, state: GeneState) {
        debug!(gene = %self.gene, from = ?self.state, to = ?state, "gene.transition");
        self.state = state;
    }

    fn fail(&mut self, failure: EarlyFailure) {
        self.advance(GeneState::FailedEarly);
        self.failure = Some(failure);
    }
}

pub struct TaskContext<'a, P: PathwayClient, L: ChatClient> {
    pub pathways: &'a P,
    pub llm: &'a L,
    pub config: &'a BatchConfig,
    pub errors: &'a ErrorLog,
    pub run_log: &'a RunLog,
    pub workspace: &'a BatchWorkspace,
}

pub struct GeneTask<'a, P: PathwayClient, L: ChatClient> {
    ctx: &'a TaskContext<'a, P, L>,
}

impl<'a, P: PathwayClient, L: ChatClient> GeneTask<'a, P, L> {
    pub fn new(ctx: &'a TaskContext<'a, P, L>) -> Self {
        Self { ctx }
    }

    pub fn run(&self, gene: &GeneSymbol) -> GeneOutcome {
        let ctx = self.ctx;
        let config = ctx.config;
        let mut outcome = GeneOutcome::pending(gene.clone());
        ctx.run_log.line(&format!("Processing gene: {gene}"));
        info!(gene = %gene, "gene.start");

        let lookup = PathwayLookupClient::new(ctx.pathways, &config.organism);
        let Some(candidates) = lookup.lookup(gene, ctx.errors) else {
            outcome.fail(EarlyFailure::LookupError);
            return outcome;
        };
        if candidates.is_empty() {
            ctx.errors
                .record(format!("No pathways found for gene: {gene}"));
            outcome.fail(EarlyFailure::NoCandidates);
            return outcome;
        }
        outcome.candidates = candidates.len();
        outcome.advance(GeneState::LookedUp);

        let pathway_ids = if config.filtering_enabled {
            let filter = RelevanceFilter::new(
                ctx.llm,
                config.model,
                config.temperature,
                &config.relevance_query,
            );
            let relevant = filter.filter(gene, &candidates, ctx.errors, ctx.run_log);
            if relevant.is_empty() {
                ctx.errors
                    .record(format!("No relevant pathways found for gene: {gene}"));
                outcome.fail(EarlyFailure::NoRelevantCandidates);
                return outcome;
            }
            outcome.relevant = relevant.len();
            if let Err(err) = ctx.workspace.append_relevant_pathways(gene, &relevant) {
                ctx.errors.record(format!(
                    "Failed to save relevant pathways for gene {gene}: {err}"
                ));
            }
            outcome.advance(GeneState::Filtered);
            relevant
                .into_iter()
                .map(|pathway| pathway.pathway_id)
                .collect::<Vec<_>>()
        } else {
            candidates.into_iter().map(|candidate| candidate.id).collect()
        };

        let fetcher = PathwayDetailFetcher::new(ctx.pathways);
        let details = fetcher.fetch_all(gene, &pathway_ids, ctx.errors);
        outcome.details_fetched = details.iter().filter(|detail| detail.is_available()).count();
        outcome.detail_failures = details.len() - outcome.details_fetched;
        outcome.advance(GeneState::Detailed);

        if config.detailed_annotations_enabled {
            if outcome.details_fetched == 0 {
                ctx.errors.record(format!(
                    "Failed to generate detailed pathways table for gene: {gene} (no pathway details available)"
                ));
                outcome.synthesis_failed = true;
            } else {
                let synthesizer =
                    NarrativeSynthesizer::new(ctx.llm, config.model, config.temperature);
                let report = synthesizer.synthesize(gene, &details, ctx.errors);
                outcome.narrative_failures = report.narrative_failures;
                match report.result {
                    Some(result) => match ctx.workspace.append_narrative(&result) {
                        Ok(()) => {
                            outcome.artifact_written = true;
                            outcome.advance(GeneState::Synthesized);
                        }
                        Err(err) => {
                            ctx.errors.record(format!(
                                "Failed to save detailed pathways for gene {gene}: {err}"
                            ));
                        }
                    },
                    None => outcome.synthesis_failed = true,
                }
            }
        }

        outcome.advance(GeneState::Done);
        info!(gene = %gene, relevant = outcome.relevant, details = outcome.details_fetched, "gene.done");
        outcome
    }
}
