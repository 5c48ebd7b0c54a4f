use assert_matches::assert_matches;

use discopath::config::{BatchConfig, Config, ConfigLoader, ConfigOverrides};
use discopath::domain::ChatModel;
use discopath::error::DiscoError;

#[test]
fn defaults_match_documented_values() {
    let config = BatchConfig::default();
    assert_eq!(config.model, ChatModel::Gpt35Turbo);
    assert_eq!(config.temperature, 0.0);
    assert!(config.filtering_enabled);
    assert!(!config.detailed_annotations_enabled);
    assert_eq!(config.workers, 10);
    assert_eq!(config.organism, "Homo sapiens");
}

#[test]
fn parses_json_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("discopath.json");
    std::fs::write(
        &path,
        r#"{"model": "gpt-4o", "query": " lipid metabolism ", "detailed_annotations": true, "workers": 4}"#,
    )
    .unwrap();

    let resolved =
        ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.model, ChatModel::Gpt4o);
    assert_eq!(resolved.relevance_query, "lipid metabolism");
    assert!(resolved.detailed_annotations_enabled);
    assert_eq!(resolved.workers, 4);
}

#[test]
fn unknown_model_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("discopath.json");
    std::fs::write(&path, r#"{"model": "gpt-2"}"#).unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()),
        Err(DiscoError::ConfigParse(_))
    );
}

#[test]
fn explicit_missing_file_is_an_error() {
    assert_matches!(
        ConfigLoader::load(Some("/nonexistent/discopath.json")),
        Err(DiscoError::ConfigRead(_))
    );
}

#[test]
fn filtering_requires_a_query() {
    let result = ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default());
    assert_matches!(result, Err(DiscoError::InvalidConfig(_)));

    let overrides = ConfigOverrides {
        filtering: Some(false),
        ..ConfigOverrides::default()
    };
    assert!(ConfigLoader::resolve_config(Config::default(), overrides).is_ok());
}

#[test]
fn invalid_workers_and_temperature_are_rejected() {
    let overrides = ConfigOverrides {
        filtering: Some(false),
        workers: Some(0),
        ..ConfigOverrides::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(Config::default(), overrides),
        Err(DiscoError::InvalidConfig(_))
    );

    let overrides = ConfigOverrides {
        filtering: Some(false),
        temperature: Some(-0.5),
        ..ConfigOverrides::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(Config::default(), overrides),
        Err(DiscoError::InvalidConfig(_))
    );
}
