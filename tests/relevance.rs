use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use discopath::domain::{ChatModel, GeneSymbol, PathwayCandidate};
use discopath::error::DiscoError;
use discopath::ledger::{ErrorLog, RunLog};
use discopath::llm::{ChatClient, ChatRequest};
use discopath::relevance::{RelevanceFilter, judge_answer};

#[test]
fn answers_containing_yes_or_true_are_relevant() {
    assert!(judge_answer("Yes, this pathway is related.").unwrap());
    assert!(judge_answer("TRUE").unwrap());
    assert!(judge_answer("yes, but not exactly").unwrap());
    assert!(judge_answer("It is eyes-related").unwrap());
    assert!(!judge_answer("No, unrelated.").unwrap());
    assert!(!judge_answer("False").unwrap());
}

#[test]
fn empty_answer_is_an_error() {
    assert_matches!(judge_answer(""), Err(DiscoError::LlmEmptyResponse));
    assert_matches!(judge_answer("  \n"), Err(DiscoError::LlmEmptyResponse));
}

/// Replies from a fixed script, one per call.
struct ScriptedLlm {
    replies: Mutex<Vec<Result<String, DiscoError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(mut replies: Vec<Result<String, DiscoError>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ChatClient for ScriptedLlm {
    fn complete(&self, request: &ChatRequest) -> Result<String, DiscoError> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.user_content().unwrap_or_default().to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(DiscoError::LlmEmptyResponse))
    }
}

fn candidate(id: &str, name: &str) -> PathwayCandidate {
    PathwayCandidate {
        id: id.to_string(),
        name: name.to_string(),
    }
}

#[test]
fn each_candidate_is_judged_independently() {
    let temp = tempfile::tempdir().unwrap();
    let log_path = Utf8PathBuf::from_path_buf(temp.path().join("normal_output.log")).unwrap();
    let run_log = RunLog::create(log_path.as_std_path()).unwrap();
    let errors = ErrorLog::new();
    let llm = ScriptedLlm::new(vec![
        Ok("Yes.".to_string()),
        Err(DiscoError::LlmHttp("timeout".to_string())),
        Ok(String::new()),
        Ok("No.".to_string()),
        Ok("true".to_string()),
    ]);
    let gene: GeneSymbol = "TP53".parse().unwrap();
    let candidates = vec![
        candidate("WP1", "Apoptosis"),
        candidate("WP2", "Cell cycle"),
        candidate("WP3", "Glycolysis"),
        candidate("WP4", "Adipogenesis"),
        candidate("WP5", "DNA damage response"),
    ];

    let filter = RelevanceFilter::new(&llm, ChatModel::Gpt35Turbo, 0.0, "linked to cancer");
    let relevant = filter.filter(&gene, &candidates, &errors, &run_log);

    let ids = relevant
        .iter()
        .map(|pathway| pathway.pathway_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["WP1", "WP5"]);
    assert_eq!(llm.prompts.lock().unwrap().len(), 5);

    let messages = errors
        .snapshot()
        .into_iter()
        .map(|record| record.message)
        .collect::<Vec<_>>();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("Cell cycle"));
    assert!(messages[1].starts_with("No content received from AI response for pathway Glycolysis"));

    let log = std::fs::read_to_string(log_path.as_std_path()).unwrap();
    assert_eq!(log.lines().count(), 3);
    assert!(log.contains("Pathway 'Adipogenesis' is not relevant to the gene 'TP53'"));
}
