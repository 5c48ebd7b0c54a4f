use tracing::debug;

use crate::domain::{GeneSymbol, PathwayCandidate};
use crate::ledger::ErrorLog;
use crate::wikipathways::{PathwayClient, parse_pathways};

pub struct PathwayLookupClient<'a, P: PathwayClient> {
    client: &'a P,
    organism: &'a str,
}

impl<'a, P: PathwayClient> PathwayLookupClient<'a, P> {
    pub fn new(client: &'a P, organism: &'a str) -> Self {
        Self { client, organism }
    }

    /// `None` means the search itself failed and the error is already
    /// recorded. `Some(vec![])` is a search without matches, which the
    /// caller decides how to report.
    pub fn lookup(&self, gene: &GeneSymbol, errors: &ErrorLog) -> Option<Vec<PathwayCandidate>> {
        let body = match self.client.find_pathways_by_text(gene, self.organism) {
            Ok(body) => body,
            Err(err) => {
                errors.record(format!(
                    "Error fetching data from WikiPathways for gene: {gene} ({err})"
                ));
                return None;
            }
        };

        match parse_pathways(&body) {
            Ok(candidates) => {
                debug!(gene = %gene, candidates = candidates.len(), "lookup.done");
                Some(candidates)
            }
            Err(err) => {
                errors.record(format!(
                    "Error parsing WikiPathways response for gene: {gene} ({err})"
                ));
                None
            }
        }
    }
}
