use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::domain::GeneSymbol;
use crate::error::DiscoError;
use crate::ledger::{ErrorLog, ErrorRecord, RunLog};
use crate::llm::ChatClient;
use crate::task::{EarlyFailure, GeneOutcome, GeneTask, TaskContext};
use crate::wikipathways::PathwayClient;
use crate::workspace::{
    ALL_DETAILED_PATHWAYS, ALL_RELEVANT_GENES, ALL_RELEVANT_PATHWAYS, BatchWorkspace,
    DEFAULT_ARCHIVE, DETAILED_PATHWAYS_PREFIX, RELEVANT_PATHWAYS_PREFIX,
};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink: Sync {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub archive_name: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            archive_name: DEFAULT_ARCHIVE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageFailures {
    pub lookup: usize,
    pub no_candidates: usize,
    pub no_relevant_candidates: usize,
    pub detail_fetch: usize,
    pub narrative: usize,
    pub synthesis: usize,
    pub aborted: usize,
}

impl StageFailures {
    fn tally(outcomes: &[GeneOutcome]) -> Self {
        let mut failures = Self::default();
        for outcome in outcomes {
            match outcome.failure {
                Some(EarlyFailure::LookupError) => failures.lookup += 1,
                Some(EarlyFailure::NoCandidates) => failures.no_candidates += 1,
                Some(EarlyFailure::NoRelevantCandidates) => failures.no_relevant_candidates += 1,
                Some(EarlyFailure::Aborted) => failures.aborted += 1,
                None => {}
            }
            failures.detail_fetch += outcome.detail_failures;
            failures.narrative += outcome.narrative_failures;
            if outcome.synthesis_failed {
                failures.synthesis += 1;
            }
        }
        failures
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchArtifacts {
    pub relevant_pathways: String,
    pub relevant_genes: String,
    pub detailed_pathways: Option<String>,
    pub run_log: String,
    pub error_log: String,
    pub archive: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub batch_dir: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub genes: usize,
    pub succeeded: usize,
    pub failures: StageFailures,
    pub outcomes: Vec<GeneOutcome>,
    pub errors: Vec<ErrorRecord>,
    pub artifacts: BatchArtifacts,
}

pub struct BatchCoordinator<P: PathwayClient, L: ChatClient> {
    pathways: P,
    llm: L,
    config: BatchConfig,
}

impl<P: PathwayClient, L: ChatClient> BatchCoordinator<P, L> {
    pub fn new(pathways: P, llm: L, config: BatchConfig) -> Self {
        Self {
            pathways,
            llm,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn pathways(&self) -> &P {
        &self.pathways
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub fn run(
        &self,
        genes: &[GeneSymbol],
        workspace: BatchWorkspace,
        options: &BatchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BatchOutcome, DiscoError> {
        validate_archive_name(&options.archive_name)?;
        let started_at = Utc::now();
        let clock = Instant::now();

        let run_log = RunLog::create(workspace.run_log_path().as_std_path())?;
        let errors = ErrorLog::new();
        run_log.line(&format!("Query: {}", self.config.relevance_query));
        info!(
            genes = genes.len(),
            workers = self.config.workers,
            model = %self.config.model,
            dir = %workspace.root(),
            "batch.start"
        );

        let ctx = TaskContext {
            pathways: &self.pathways,
            llm: &self.llm,
            config: &self.config,
            errors: &errors,
            run_log: &run_log,
            workspace: &workspace,
        };
        let outcomes = self.execute(genes, &ctx, sink, clock);

        sink.event(ProgressEvent {
            message: "phase=Aggregate; writing batch artifacts".to_string(),
            elapsed: Some(clock.elapsed()),
        });
        let artifacts = self.aggregate(&workspace, &errors, options);

        let failures = StageFailures::tally(&outcomes);
        let succeeded = outcomes.iter().filter(|outcome| outcome.is_done()).count();
        info!(
            genes = genes.len(),
            succeeded,
            errors = errors.len(),
            elapsed_ms = clock.elapsed().as_millis() as u64,
            "batch.done"
        );

        Ok(BatchOutcome {
            batch_dir: workspace.root().to_string(),
            started_at,
            finished_at: Utc::now(),
            genes: genes.len(),
            succeeded,
            failures,
            outcomes,
            errors: errors.snapshot(),
            artifacts,
        })
    }

    fn execute(
        &self,
        genes: &[GeneSymbol],
        ctx: &TaskContext<'_, P, L>,
        sink: &dyn ProgressSink,
        clock: Instant,
    ) -> Vec<GeneOutcome> {
        let workers = self.config.workers.clamp(1, genes.len().max(1));
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, GeneOutcome)>();

        let mut slots: Vec<Option<GeneOutcome>> = vec![None; genes.len()];
        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(gene) = genes.get(index) else {
                            break;
                        };
                        sink.event(ProgressEvent {
                            message: format!("phase=Gene; {gene}"),
                            elapsed: Some(clock.elapsed()),
                        });
                        let outcome = run_isolated(ctx, gene);
                        if tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for (index, outcome) in rx {
                slots[index] = Some(outcome);
            }
        });

        slots
            .into_iter()
            .zip(genes)
            .map(|(slot, gene)| {
                slot.unwrap_or_else(|| {
                    ctx.errors.record(format!(
                        "An error occurred while processing gene {gene}: worker exited without a result"
                    ));
                    GeneOutcome::aborted(gene.clone())
                })
            })
            .collect()
    }

    fn aggregate(
        &self,
        workspace: &BatchWorkspace,
        errors: &ErrorLog,
        options: &BatchOptions,
    ) -> BatchArtifacts {
        let record = |artifact: &str, err: DiscoError| {
            errors.record(format!("An error occurred while writing {artifact}: {err}"));
        };

        if let Err(err) = workspace.concatenate(ALL_RELEVANT_PATHWAYS, RELEVANT_PATHWAYS_PREFIX) {
            record(ALL_RELEVANT_PATHWAYS, err);
        }
        if let Err(err) =
            workspace.concatenate_first_column(ALL_RELEVANT_GENES, RELEVANT_PATHWAYS_PREFIX)
        {
            record(ALL_RELEVANT_GENES, err);
        }
        let detailed_pathways = if self.config.detailed_annotations_enabled {
            if let Err(err) = workspace.concatenate(ALL_DETAILED_PATHWAYS, DETAILED_PATHWAYS_PREFIX)
            {
                record(ALL_DETAILED_PATHWAYS, err);
            }
            Some(workspace.root().join(ALL_DETAILED_PATHWAYS).to_string())
        } else {
            None
        };

        let error_log = workspace.error_log_path();
        write_error_log(errors, &error_log);
        let archive = match workspace.package(&options.archive_name) {
            Ok(path) => Some(path.to_string()),
            Err(err) => {
                record(options.archive_name.as_str(), err);
                write_error_log(errors, &error_log);
                None
            }
        };

        BatchArtifacts {
            relevant_pathways: workspace.root().join(ALL_RELEVANT_PATHWAYS).to_string(),
            relevant_genes: workspace.root().join(ALL_RELEVANT_GENES).to_string(),
            detailed_pathways,
            run_log: workspace.run_log_path().to_string(),
            error_log: error_log.to_string(),
            archive,
        }
    }
}

fn write_error_log(errors: &ErrorLog, path: &Utf8Path) {
    if let Err(err) = errors.write_to(path.as_std_path()) {
        warn!(error = %err, "error log write failed");
    }
}

fn run_isolated<P: PathwayClient, L: ChatClient>(
    ctx: &TaskContext<'_, P, L>,
    gene: &GeneSymbol,
) -> GeneOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| GeneTask::new(ctx).run(gene))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            ctx.errors.record(format!(
                "An error occurred while processing gene {gene}: {}",
                panic_message(payload.as_ref())
            ));
            GeneOutcome::aborted(gene.clone())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "task panicked".to_string()
}

fn validate_archive_name(name: &str) -> Result<(), DiscoError> {
    let name = name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(DiscoError::InvalidConfig(format!(
            "invalid archive name: {name:?}"
        )));
    }
    Ok(())
}
