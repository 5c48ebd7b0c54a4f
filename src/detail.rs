use serde::Serialize;
use tracing::debug;

use crate::domain::GeneSymbol;
use crate::ledger::ErrorLog;
use crate::wikipathways::PathwayClient;

/// Matched against the whitespace-trimmed line. The bare `"X"` entry drops
/// every line starting with an upper-case X, text content included.
pub const LAYOUT_LINE_PREFIXES: &[&str] = &[
    "<Attribute Key",
    "<Graphics",
    "<DataNode",
    "</DataNode",
    "<Point",
    "<Anchor",
    "</Graphic",
    "<Graphic",
    "<Interaction",
    "</Interaction",
    "ArrowHead",
    "RelX",
    "X",
    "<Xref",
    "<BiopaxRef",
    "</Group",
    "<Group",
    "<bp:DB",
    "</bp:PublicationXref",
    "<Label",
    "</Label",
    "</Shape",
    "<Shape",
    "<InfoBox",
];

pub fn is_layout_line(line: &str) -> bool {
    let trimmed = line.trim();
    LAYOUT_LINE_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

pub fn strip_layout_markup(content: &str) -> String {
    content
        .split('\n')
        .filter(|line| !is_layout_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayDetail {
    pub pathway_id: String,
    #[serde(skip)]
    pub content: Option<String>,
}

impl PathwayDetail {
    pub fn is_available(&self) -> bool {
        self.content.is_some()
    }
}

pub struct PathwayDetailFetcher<'a, P: PathwayClient> {
    client: &'a P,
}

impl<'a, P: PathwayClient> PathwayDetailFetcher<'a, P> {
    pub fn new(client: &'a P) -> Self {
        Self { client }
    }

    pub fn fetch(&self, gene: &GeneSymbol, pathway_id: &str, errors: &ErrorLog) -> PathwayDetail {
        let content = match self.client.get_pathway(pathway_id) {
            Ok(raw) if raw.trim().is_empty() => {
                errors.record(format!(
                    "Empty pathway content for ID {pathway_id} (gene {gene})"
                ));
                None
            }
            Ok(raw) => Some(strip_layout_markup(&raw)),
            Err(err) => {
                errors.record(format!(
                    "An error occurred fetching pathway details for ID {pathway_id} (gene {gene}): {err}"
                ));
                None
            }
        };
        debug!(gene = %gene, pathway_id, available = content.is_some(), "detail.fetched");
        PathwayDetail {
            pathway_id: pathway_id.to_string(),
            content,
        }
    }

    pub fn fetch_all(
        &self,
        gene: &GeneSymbol,
        pathway_ids: &[String],
        errors: &ErrorLog,
    ) -> Vec<PathwayDetail> {
        pathway_ids
            .iter()
            .map(|pathway_id| self.fetch(gene, pathway_id, errors))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_lines_match_after_trim() {
        assert!(is_layout_line("    <Graphics CenterX=\"1\" />"));
        assert!(is_layout_line("\t</DataNode>\r"));
        assert!(!is_layout_line("<Comment>TP53 signalling</Comment>"));
    }
}
