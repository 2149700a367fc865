use lda_analyser::ModelAnalyser;
use lda_core::lda::{LdaConfig, TopicModel};
use lda_core::persist::{save_model, ModelHeader};
use lda_core::source::{JsonSource, ReaderConfig};
use lda_core::tokenizer::{Normalization, Preprocessor, PreprocessorConfig};
use lda_core::topics::TopicLookup;
use lda_core::vocabulary::{FrequencyFilter, Vocabulary};
use lda_core::Error;
use lda_modeller::{BuilderConfig, ModelBuilder};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use tracing::Dispatch;

fn toks(s: &str) -> Vec<String> { s.split_whitespace().map(String::from).collect() }

fn plain() -> Preprocessor {
    Preprocessor::new(PreprocessorConfig { normalization: Normalization::None, ..Default::default() })
}

/// Two topics over disjoint halves of a six-token vocabulary.
fn save_power_display_model(dir: &Path) -> PathBuf {
    let vocabulary = Vocabulary::from_documents([toks("battery charger cable"), toks("screen display pixel")]);
    let rows = vec![
        vec![10.0, 10.0, 10.0, 0.01, 0.01, 0.01],
        vec![0.01, 0.01, 0.01, 10.0, 10.0, 10.0],
    ];
    let model = TopicModel::from_parts(vocabulary, rows, 0.5, 0.01).unwrap();
    let path = dir.join("lda.model");
    let preprocessing = PreprocessorConfig { normalization: Normalization::None, ..Default::default() };
    let header = ModelHeader::new(2, LdaConfig { num_topics: 2, ..Default::default() }, preprocessing);
    save_model(&path, &header, &model).unwrap();
    path
}

fn write_jsonl(dir: &Path, records: &[serde_json::Value]) -> PathBuf {
    let path = dir.join("data.jsonl");
    let body: Vec<String> = records.iter().map(|r| r.to_string()).collect();
    fs::write(&path, body.join("\n")).unwrap();
    path
}

fn source(path: &Path, limit: Option<usize>) -> JsonSource {
    JsonSource::new(path, ReaderConfig { limit, ..Default::default() }, plain())
}

#[test]
fn single_power_document_matches_topic_zero() {
    let dir = tempdir().unwrap();
    let model = save_power_display_model(dir.path());
    let data = write_jsonl(dir.path(), &[
        json!({ "components": "power", "question": "battery charger cable battery" }),
        json!({ "components": "display", "question": "screen pixel" }),
    ]);

    let analyser = ModelAnalyser::load(&model, Dispatch::none()).unwrap();
    let matches = analyser.analyse(&source(&data, Some(1)), None).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].label, "power");
    assert_eq!(matches[0].topic_id, 0);
    assert!(matches[0].probability > 0.9);
    assert!(matches[0].topic_label.is_none());
}

#[test]
fn lookup_resolves_topic_labels() {
    let dir = tempdir().unwrap();
    let model = save_power_display_model(dir.path());
    let data = write_jsonl(dir.path(), &[
        json!({ "components": "power", "title": "battery", "question": "charger" }),
        json!({ "components": "display", "title": "screen", "answers": ["display", "pixel"] }),
    ]);
    let lookup = TopicLookup::from_json(
        r#"{"0": {"topic": "Power", "stats": {"0.333333": "battery"}}, "1": {"topic": "Display"}}"#,
    )
    .unwrap();

    let analyser = ModelAnalyser::load(&model, Dispatch::none()).unwrap();
    let matches = analyser.analyse(&source(&data, None), Some(&lookup)).unwrap();
    let labels: Vec<_> = matches.iter().map(|m| (m.topic_id, m.topic_label.as_deref())).collect();
    assert_eq!(labels, vec![(0, Some("Power")), (1, Some("Display"))]);
}

#[test]
fn missing_lookup_entry_is_fatal() {
    let dir = tempdir().unwrap();
    let model = save_power_display_model(dir.path());
    let data = write_jsonl(dir.path(), &[json!({ "components": "power", "question": "battery cable" })]);
    let lookup = TopicLookup::from_json(r#"{"1": {"topic": "Display"}}"#).unwrap();

    let analyser = ModelAnalyser::load(&model, Dispatch::none()).unwrap();
    let err = analyser.analyse(&source(&data, None), Some(&lookup)).unwrap_err();
    assert!(matches!(err, Error::TopicLookup(0)));
}

#[test]
fn documents_without_text_still_get_a_topic() {
    let dir = tempdir().unwrap();
    let model = save_power_display_model(dir.path());
    let data = write_jsonl(dir.path(), &[
        json!({ "components": "empty", "title": "", "question": null }),
        json!({ "components": "unknown", "question": "keyboard mouse" }),
    ]);

    let analyser = ModelAnalyser::load(&model, Dispatch::none()).unwrap();
    let matches = analyser.analyse(&source(&data, None), None).unwrap();
    assert_eq!(matches.len(), 2);
    // uniform mixture: the tie goes to the later topic
    for m in &matches {
        assert_eq!(m.topic_id, 1);
        assert!((m.probability - 0.5).abs() < 1e-12);
    }
}

#[test]
fn corrupt_model_file_is_a_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lda.model");
    fs::write(&path, b"not a model").unwrap();
    let err = ModelAnalyser::load(&path, Dispatch::none()).err().unwrap();
    assert!(matches!(err, Error::ModelFormat(_)));
}

#[test]
fn preprocessing_recorded_by_the_builder_is_reused() {
    let dir = tempdir().unwrap();
    let training: Vec<_> = (0..10)
        .map(|i| {
            let question = if i % 2 == 0 { "children toys playroom" } else { "screen display pixels" };
            json!({ "components": format!("ticket-{i}"), "question": question })
        })
        .collect();
    let train_path = dir.path().join("training.jsonl");
    let body: Vec<String> = training.iter().map(|r| r.to_string()).collect();
    fs::write(&train_path, body.join("\n")).unwrap();

    let stem = PreprocessorConfig { normalization: Normalization::Stem, ..Default::default() };
    let config = BuilderConfig {
        output: dir.path().join("lda.model"),
        lda: LdaConfig { num_topics: 2, passes: 4, iterations: 25, ..Default::default() },
        filter: FrequencyFilter { no_below: 1, no_above: 1.0, keep_n: None },
        preprocessing: stem.clone(),
        ..Default::default()
    };
    let training_source = JsonSource::new(&train_path, ReaderConfig::default(), Preprocessor::new(stem.clone()));
    ModelBuilder::new(config, Dispatch::none()).build(&training_source).unwrap();

    let analyser = ModelAnalyser::load(&dir.path().join("lda.model"), Dispatch::none()).unwrap();
    assert_eq!(analyser.preprocessing(), &stem);
    // lemmatizing would turn "children" into "child", which the model never saw
    let lemma_stem = PreprocessorConfig::default();
    let err = analyser.preprocessor(Some(&lemma_stem)).err().unwrap();
    assert!(matches!(err, Error::PreprocessingMismatch { .. }));

    let children = analyser.model().vocabulary().id("children").unwrap() as usize;
    let expected = (0..2)
        .max_by(|&a, &b| {
            let wa = analyser.model().topic_word(a).unwrap()[children];
            let wb = analyser.model().topic_word(b).unwrap()[children];
            wa.total_cmp(&wb)
        })
        .unwrap();

    let data = write_jsonl(dir.path(), &[
        json!({ "components": "playroom", "question": "children children" }),
        json!({ "components": "display", "question": "screen pixels" }),
    ]);
    let preprocessor = analyser.preprocessor(None).unwrap();
    let source = JsonSource::new(&data, ReaderConfig { limit: Some(1), ..Default::default() }, preprocessor);
    let matches = analyser.analyse(&source, None).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].label, "playroom");
    assert_eq!(matches[0].topic_id, expected);
    assert!(matches[0].probability > 0.5);
}
