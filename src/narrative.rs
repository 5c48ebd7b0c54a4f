use std::collections::BTreeMap;

use tracing::debug;

use crate::detail::PathwayDetail;
use crate::domain::{ChatModel, GeneSymbol, NarrativeResult};
use crate::error::DiscoError;
use crate::ledger::ErrorLog;
use crate::llm::{ChatClient, ChatRequest};

pub const NARRATIVE_SYSTEM_PROMPT: &str = "You are a helpful assistant, a professional in biological pathway analysis. Make sure that all the pathways or interest are included and formatted identically.";
pub const TABLE_SYSTEM_PROMPT: &str = "You are a helpful assistant, a professional in biological pathway analysis providing a consistent output format. Make sure that all the pathways or interest are included and formatted identically.";

pub fn narrative_request(
    model: ChatModel,
    temperature: f32,
    gene: &GeneSymbol,
    pathway_content: &str,
) -> ChatRequest {
    ChatRequest::new(
        model,
        temperature,
        NARRATIVE_SYSTEM_PROMPT,
        format!(
            "Provide detailed analysis for the gene symbol '{gene}' based on '{pathway_content}' that includes its associated pathways, diseases, and any relevant publications with PMIDs. Highlight the significance of these pathways in human biology and disease, and mention any notable findings from the publications."
        ),
    )
}

pub fn table_request(
    model: ChatModel,
    temperature: f32,
    gene: &GeneSymbol,
    narratives: &BTreeMap<String, String>,
) -> ChatRequest {
    let mut rendered = String::new();
    for (pathway_id, narrative) in narratives {
        rendered.push_str(&format!("Pathway {pathway_id}:\n{narrative}\n\n"));
    }
    ChatRequest::new(
        model,
        temperature,
        TABLE_SYSTEM_PROMPT,
        format!(
            "Based on the pathways information provided for '{gene}', create a table describing the pathways in details. Include the pathway name, ID, and its role in human biology and disease, and publications with PMID:\n{}. Provide .txt output format",
            rendered.trim_end()
        ),
    )
}

pub struct NarrativeSynthesizer<'a, L: ChatClient> {
    llm: &'a L,
    model: ChatModel,
    temperature: f32,
}

impl<'a, L: ChatClient> NarrativeSynthesizer<'a, L> {
    pub fn new(llm: &'a L, model: ChatModel, temperature: f32) -> Self {
        Self {
            llm,
            model,
            temperature,
        }
    }

    pub fn narrate(&self, gene: &GeneSymbol, detail: &PathwayDetail, errors: &ErrorLog) -> Option<String> {
        let content = detail.content.as_deref()?;
        let request = narrative_request(self.model, self.temperature, gene, content);
        match self.llm.complete(&request).and_then(non_empty) {
            Ok(narrative) => Some(narrative),
            Err(err) => {
                errors.record(format!(
                    "An error occurred during gene narrative analysis for gene {gene}, pathway {}: {err}",
                    detail.pathway_id
                ));
                None
            }
        }
    }

    pub fn synthesize_table(
        &self,
        gene: &GeneSymbol,
        narratives: &BTreeMap<String, String>,
        errors: &ErrorLog,
    ) -> Option<String> {
        if narratives.is_empty() {
            errors.record(format!(
                "Failed to generate detailed pathways table for gene: {gene} (no pathway narratives available)"
            ));
            return None;
        }
        let request = table_request(self.model, self.temperature, gene, narratives);
        match self.llm.complete(&request).and_then(non_empty) {
            Ok(table) => Some(table),
            Err(err) => {
                errors.record(format!(
                    "Failed to generate detailed pathways table for gene: {gene} ({err})"
                ));
                None
            }
        }
    }

    pub fn synthesize(
        &self,
        gene: &GeneSymbol,
        details: &[PathwayDetail],
        errors: &ErrorLog,
    ) -> SynthesisReport {
        let mut narratives = BTreeMap::new();
        let mut narrative_failures = 0usize;
        for detail in details.iter().filter(|detail| detail.is_available()) {
            match self.narrate(gene, detail, errors) {
                Some(narrative) => {
                    narratives.insert(detail.pathway_id.clone(), narrative);
                }
                None => narrative_failures += 1,
            }
        }
        debug!(gene = %gene, narratives = narratives.len(), narrative_failures, "narrative.done");

        let result = self
            .synthesize_table(gene, &narratives, errors)
            .map(|table| NarrativeResult {
                gene: gene.clone(),
                table,
            });
        SynthesisReport {
            result,
            narrative_failures,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisReport {
    pub result: Option<NarrativeResult>,
    pub narrative_failures: usize,
}

fn non_empty(text: String) -> Result<String, DiscoError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DiscoError::LlmEmptyResponse);
    }
    Ok(trimmed.to_string())
}
