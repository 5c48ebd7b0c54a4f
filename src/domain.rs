use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DiscoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum ChatModel {
    #[serde(rename = "gpt-4o")]
    #[value(name = "gpt-4o")]
    Gpt4o,
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    #[value(name = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4")]
    #[value(name = "gpt-4")]
    Gpt4,
}

impl ChatModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModel::Gpt4o => "gpt-4o",
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
            ChatModel::Gpt4 => "gpt-4",
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatModel {
    type Err = DiscoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "gpt-4o" => Ok(ChatModel::Gpt4o),
            "gpt-3.5-turbo" => Ok(ChatModel::Gpt35Turbo),
            "gpt-4" => Ok(ChatModel::Gpt4),
            other => Err(DiscoError::InvalidModel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeneSymbol(String);

impl GeneSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                    ch
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for GeneSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GeneSymbol {
    type Err = DiscoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains(['\n', '\r']) {
            return Err(DiscoError::InvalidGeneSymbol(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayCandidate {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelevantPathway {
    pub gene: GeneSymbol,
    pub pathway_name: String,
    pub pathway_id: String,
}

impl RelevantPathway {
    pub fn new(gene: &GeneSymbol, candidate: &PathwayCandidate) -> Self {
        Self {
            gene: gene.clone(),
            pathway_name: candidate.name.clone(),
            pathway_id: candidate.id.clone(),
        }
    }

    pub fn to_record_line(&self) -> String {
        format!("{},{},{}", self.gene, self.pathway_name, self.pathway_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeResult {
    pub gene: GeneSymbol,
    pub table: String,
}

impl NarrativeResult {
    pub fn to_report_block(&self) -> String {
        format!(
            "Results for gene: {}\n{}\n{}\n",
            self.gene,
            self.table,
            "=".repeat(80)
        )
    }
}

pub fn parse_gene_list(content: &str) -> Result<Vec<GeneSymbol>, DiscoError> {
    let genes = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(GeneSymbol::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    if genes.is_empty() {
        return Err(DiscoError::EmptyGeneList);
    }
    Ok(genes)
}
