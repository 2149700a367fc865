use lda_core::tokenizer::{is_stopword, Normalization, Preprocessor, PreprocessorConfig};

#[test]
fn ticket_text_is_normalized_and_stemmed() {
    let words = Preprocessor::default().prepare("Phone keeps CRASHING while charging! The app's settings reset.");
    assert!(words.contains(&"crash".to_string()));
    assert!(words.contains(&"charg".to_string()));
    // the possessive "s" is a stopword
    assert!(words.contains(&"app".to_string()));
    assert!(!words.contains(&"s".to_string()));
    assert!(!words.contains(&"the".to_string()));
}

#[test]
fn question_words_are_stopwords() {
    let words = Preprocessor::default().prepare("Why does the screen turn off when I open it?");
    for stop in ["why", "does", "the", "when", "i", "it", "off"] {
        assert!(!words.contains(&stop.to_string()), "{stop}");
    }
    assert!(words.contains(&"screen".to_string()));
}

#[test]
fn output_is_lowercase_and_stopword_free() {
    let samples = [
        "THE Battery Is DEAD and I don't know WHY",
        "Dos and don'ts: What SHOULD've been done?",
        "Ünïcödé ＦＵＬＬＷＩＤＴＨ text, numbers 123 and under_scores",
        "",
    ];
    for normalization in [Normalization::None, Normalization::Stem, Normalization::LemmatizeThenStem] {
        let pre = Preprocessor::new(PreprocessorConfig { normalization, ..Default::default() });
        for text in samples {
            for token in pre.prepare(text) {
                assert_eq!(token, token.to_lowercase());
                assert!(!is_stopword(&token), "{token:?} from {text:?}");
            }
        }
    }
}

#[test]
fn lemmatization_runs_before_stemming() {
    let stem = Preprocessor::new(PreprocessorConfig { normalization: Normalization::Stem, ..Default::default() });
    let lemma_stem = Preprocessor::default();
    assert_eq!(stem.prepare("children"), vec!["children"]);
    assert_eq!(lemma_stem.prepare("children"), vec!["child"]);
    assert_eq!(lemma_stem.prepare("batteries battery"), vec!["batteri", "batteri"]);
}
