//! Dictionary-free English lemmatizer.
//!
//! Irregular forms come from a fixed table; everything else goes through
//! noun-plural detachment rules. Rules only fire on words long enough that the
//! remaining base is plausible, and never on endings that are usually singular
//! (`-ss`, `-us`, `-is`).

use lazy_static::lazy_static;
use std::borrow::Cow;
use std::collections::HashMap;

lazy_static! {
    static ref IRREGULAR: HashMap<&'static str, &'static str> = {
        let pairs: &[(&str, &str)] = &[
            ("children", "child"), ("men", "man"), ("women", "woman"), ("people", "person"),
            ("mice", "mouse"), ("geese", "goose"), ("feet", "foot"), ("teeth", "tooth"),
            ("oxen", "ox"), ("data", "datum"), ("criteria", "criterion"), ("indices", "index"),
            ("matrices", "matrix"), ("vertices", "vertex"), ("analyses", "analysis"),
            ("crises", "crisis"), ("theses", "thesis"), ("leaves", "leaf"), ("lives", "life"),
            ("knives", "knife"), ("wives", "wife"), ("halves", "half"), ("selves", "self"),
            ("went", "go"), ("gone", "go"), ("ran", "run"), ("ate", "eat"), ("eaten", "eat"),
            ("wrote", "write"), ("written", "write"), ("took", "take"), ("taken", "take"),
            ("made", "make"), ("found", "find"), ("thought", "think"), ("bought", "buy"),
            ("brought", "bring"), ("caught", "catch"), ("taught", "teach"), ("sent", "send"),
            ("built", "build"), ("kept", "keep"), ("left", "leave"), ("felt", "feel"),
            ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
        ];
        pairs.iter().copied().collect()
    };
}

/// Detachment rules as (suffix, replacement), most specific first.
const NOUN_RULES: &[(&str, &str)] = &[
    ("ches", "ch"),
    ("shes", "sh"),
    ("sses", "ss"),
    ("xes", "x"),
    ("zes", "z"),
    ("ies", "y"),
    ("s", ""),
];

const MIN_BASE_LEN: usize = 3;

pub fn lemmatize(token: &str) -> Cow<'_, str> {
    if let Some(base) = IRREGULAR.get(token) {
        return Cow::Borrowed(*base);
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return Cow::Borrowed(token);
    }
    for (suffix, replacement) in NOUN_RULES {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.chars().count() + replacement.len() < MIN_BASE_LEN {
                continue;
            }
            return Cow::Owned(format!("{stem}{replacement}"));
        }
    }
    Cow::Borrowed(token)
}
