//! Latent Dirichlet Allocation.
//!
//! Training is collapsed Gibbs sampling over the bag-of-words corpus. Unseen
//! documents are folded in with the topic-word distributions held fixed, by a
//! deterministic fixed-point iteration on the document's topic mixture, so a
//! loaded model always answers the same query the same way.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::vocabulary::Vocabulary;
use crate::{BagOfWords, Error, Result, TopicId};

const INFERENCE_ITERATIONS: usize = 100;
const INFERENCE_TOLERANCE: f64 = 1e-9;

/// Topics below this probability are not reported for a document.
pub const MINIMUM_PROBABILITY: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdaConfig {
    pub num_topics: usize,
    /// Outer passes over the corpus.
    pub passes: usize,
    /// Gibbs sweeps per pass.
    pub iterations: usize,
    /// Document-topic prior; `None` means `1 / num_topics`.
    pub alpha: Option<f64>,
    /// Topic-word prior.
    pub eta: f64,
    pub seed: u64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self { num_topics: 20, passes: 10, iterations: 50, alpha: None, eta: 0.01, seed: 42 }
    }
}

impl LdaConfig {
    pub fn alpha(&self) -> f64 { self.alpha.unwrap_or(1.0 / self.num_topics.max(1) as f64) }

    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 { return Err(Error::invalid_config("number of topics must be positive")); }
        if self.passes == 0 || self.iterations == 0 {
            return Err(Error::invalid_config("passes and iterations must be positive"));
        }
        if self.alpha() <= 0.0 || self.eta <= 0.0 {
            return Err(Error::invalid_config("alpha and eta must be positive"));
        }
        Ok(())
    }
}

/// A trained model: topic-word distributions plus the vocabulary they index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    alpha: f64,
    eta: f64,
    vocabulary: Vocabulary,
    /// `num_topics x vocabulary.len()`, rows sum to one.
    topic_word: Vec<Vec<f64>>,
}

impl TopicModel {
    /// Assemble a model from raw topic-word weights; each row is normalized.
    pub fn from_parts(vocabulary: Vocabulary, mut topic_word: Vec<Vec<f64>>, alpha: f64, eta: f64) -> Result<Self> {
        if topic_word.is_empty() {
            return Err(Error::invalid_config("a model needs at least one topic"));
        }
        for (topic, row) in topic_word.iter_mut().enumerate() {
            if row.len() != vocabulary.len() {
                return Err(Error::invalid_config(format!(
                    "topic {topic} has {} weights for a vocabulary of {}",
                    row.len(),
                    vocabulary.len()
                )));
            }
            let total: f64 = row.iter().sum();
            if total <= 0.0 || row.iter().any(|w| *w < 0.0) {
                return Err(Error::invalid_config(format!("topic {topic} has no positive weight")));
            }
            row.iter_mut().for_each(|w| *w /= total);
        }
        Ok(Self { alpha, eta, vocabulary, topic_word })
    }

    /// Fit a model on an in-memory bag-of-words corpus.
    pub fn train(corpus: &[BagOfWords], vocabulary: Vocabulary, config: &LdaConfig) -> Result<Self> {
        config.validate()?;
        let mut sampler = GibbsSampler::new(corpus, vocabulary.len(), config);
        if sampler.num_tokens() == 0 {
            return Err(Error::EmptyCorpus);
        }
        tracing::info!(
            num_docs = corpus.len(),
            num_terms = vocabulary.len(),
            num_tokens = sampler.num_tokens(),
            num_topics = config.num_topics,
            "training lda model"
        );
        for pass in 0..config.passes {
            for _ in 0..config.iterations {
                sampler.sweep();
            }
            tracing::debug!(pass = pass + 1, passes = config.passes, "gibbs pass complete");
        }
        let topic_word = sampler.phi();
        Ok(Self { alpha: sampler.alpha, eta: config.eta, vocabulary, topic_word })
    }

    /// Why the matrix does not fit the vocabulary, if it does not.
    pub(crate) fn shape_error(&self) -> Option<String> {
        if self.topic_word.is_empty() {
            return Some("model has no topics".to_string());
        }
        self.topic_word
            .iter()
            .position(|row| row.len() != self.vocabulary.len())
            .map(|topic| format!("topic {topic} has {} weights for a vocabulary of {}", self.topic_word[topic].len(), self.vocabulary.len()))
    }

    pub fn num_topics(&self) -> usize { self.topic_word.len() }
    pub fn alpha(&self) -> f64 { self.alpha }
    pub fn eta(&self) -> f64 { self.eta }
    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
    pub fn topic_word(&self, topic: TopicId) -> Option<&[f64]> { self.topic_word.get(topic).map(Vec::as_slice) }

    /// Top `n` tokens of a topic with their probabilities, most probable first.
    pub fn top_words(&self, topic: TopicId, n: usize) -> Vec<(String, f64)> {
        let Some(row) = self.topic_word.get(topic) else { return Vec::new() };
        let mut pairs: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs
            .into_iter()
            .take(n)
            .filter_map(|(w, p)| self.vocabulary.token(w as u32).map(|t| (t.to_string(), p)))
            .collect()
    }

    pub fn show_topics(&self, n: usize) -> Vec<(TopicId, Vec<(String, f64)>)> {
        (0..self.num_topics()).map(|t| (t, self.top_words(t, n))).collect()
    }

    /// Topic mixture of an unseen document; an empty document gets the uniform mixture.
    pub fn infer(&self, bow: &BagOfWords) -> Vec<f64> {
        let k = self.num_topics();
        let mut theta = vec![1.0 / k as f64; k];
        let words: Vec<(usize, f64)> = bow
            .iter()
            .filter(|&&(w, _)| (w as usize) < self.vocabulary.len())
            .map(|&(w, c)| (w as usize, c as f64))
            .collect();
        if words.is_empty() {
            return theta;
        }
        let mut responsibility = vec![0.0; k];
        for _ in 0..INFERENCE_ITERATIONS {
            let mut next = vec![self.alpha; k];
            for &(w, count) in &words {
                let mut norm = 0.0;
                for t in 0..k {
                    responsibility[t] = theta[t] * self.topic_word[t][w];
                    norm += responsibility[t];
                }
                if norm <= 0.0 { continue; }
                for t in 0..k {
                    next[t] += count * responsibility[t] / norm;
                }
            }
            let total: f64 = next.iter().sum();
            next.iter_mut().for_each(|p| *p /= total);
            let delta = theta.iter().zip(&next).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max);
            theta = next;
            if delta < INFERENCE_TOLERANCE { break; }
        }
        theta
    }

    /// `(topic, probability)` pairs at or above `minimum_probability`, in topic order.
    pub fn document_topics(&self, bow: &BagOfWords, minimum_probability: f64) -> Vec<(TopicId, f64)> {
        self.infer(bow)
            .into_iter()
            .enumerate()
            .filter(|&(_, p)| p >= minimum_probability)
            .collect()
    }
}

/// Highest-probability topic; among equal probabilities the later topic wins.
pub fn most_related(topics: &[(TopicId, f64)]) -> Option<(TopicId, f64)> {
    let mut sorted = topics.to_vec();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
    sorted.last().copied()
}

struct GibbsSampler {
    k: usize,
    v: usize,
    alpha: f64,
    eta: f64,
    docs: Vec<Vec<usize>>,
    z: Vec<Vec<usize>>,
    ndk: Vec<Vec<usize>>,
    nkw: Vec<Vec<usize>>,
    nk: Vec<usize>,
    weights: Vec<f64>,
    rng: StdRng,
}

impl GibbsSampler {
    fn new(corpus: &[BagOfWords], v: usize, config: &LdaConfig) -> Self {
        let k = config.num_topics;
        let docs: Vec<Vec<usize>> = corpus
            .iter()
            .map(|bow| {
                bow.iter()
                    .filter(|&&(w, _)| (w as usize) < v)
                    .flat_map(|&(w, c)| std::iter::repeat(w as usize).take(c as usize))
                    .collect()
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut ndk = vec![vec![0usize; k]; docs.len()];
        let mut nkw = vec![vec![0usize; v]; k];
        let mut nk = vec![0usize; k];
        let mut z = Vec::with_capacity(docs.len());
        for (di, doc) in docs.iter().enumerate() {
            let mut assignments = Vec::with_capacity(doc.len());
            for &w in doc {
                let topic = rng.gen_range(0..k);
                assignments.push(topic);
                ndk[di][topic] += 1;
                nkw[topic][w] += 1;
                nk[topic] += 1;
            }
            z.push(assignments);
        }
        Self { k, v, alpha: config.alpha(), eta: config.eta, docs, z, ndk, nkw, nk, weights: vec![0.0; k], rng }
    }

    fn num_tokens(&self) -> usize { self.nk.iter().sum() }

    fn sweep(&mut self) {
        let veta = self.v as f64 * self.eta;
        for di in 0..self.docs.len() {
            for pi in 0..self.docs[di].len() {
                let w = self.docs[di][pi];
                let old = self.z[di][pi];
                self.ndk[di][old] -= 1;
                self.nkw[old][w] -= 1;
                self.nk[old] -= 1;

                // p(t) ∝ (ndk + alpha) * (nkw + eta) / (nk + V*eta)
                let mut total = 0.0;
                for t in 0..self.k {
                    let left = self.ndk[di][t] as f64 + self.alpha;
                    let right = (self.nkw[t][w] as f64 + self.eta) / (self.nk[t] as f64 + veta);
                    total += left * right;
                    self.weights[t] = total;
                }
                let target = self.rng.gen::<f64>() * total;
                let new = self.weights.iter().position(|&c| target < c).unwrap_or(self.k - 1);

                self.z[di][pi] = new;
                self.ndk[di][new] += 1;
                self.nkw[new][w] += 1;
                self.nk[new] += 1;
            }
        }
    }

    /// φ[t][w] = (nkw[t][w] + η) / (nk[t] + V*η)
    fn phi(&self) -> Vec<Vec<f64>> {
        let veta = self.v as f64 * self.eta;
        (0..self.k)
            .map(|t| {
                let denom = self.nk[t] as f64 + veta;
                (0..self.v).map(|w| (self.nkw[t][w] as f64 + self.eta) / denom).collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> { s.split_whitespace().map(String::from).collect() }

    fn two_topic_model() -> TopicModel {
        let vocab = Vocabulary::from_documents(vec![toks("battery charger cable screen pixel display")]);
        TopicModel::from_parts(
            vocab,
            vec![vec![4.0, 3.0, 3.0, 0.0001, 0.0001, 0.0001], vec![0.0001, 0.0001, 0.0001, 4.0, 3.0, 3.0]],
            0.5,
            0.01,
        )
        .unwrap()
    }

    #[test]
    fn from_parts_normalizes_rows() {
        let model = two_topic_model();
        for t in 0..model.num_topics() {
            let total: f64 = model.topic_word(t).unwrap().iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert_eq!(model.top_words(0, 1)[0].0, "battery");
        assert_eq!(model.top_words(1, 1)[0].0, "screen");
    }

    #[test]
    fn from_parts_rejects_bad_shapes() {
        let vocab = Vocabulary::from_documents(vec![toks("a b")]);
        assert!(TopicModel::from_parts(vocab.clone(), vec![vec![1.0]], 0.1, 0.01).is_err());
        assert!(TopicModel::from_parts(vocab, vec![], 0.1, 0.01).is_err());
    }

    #[test]
    fn inference_prefers_the_matching_topic() {
        let model = two_topic_model();
        let bow = model.vocabulary().doc2bow(&toks("battery charger battery cable"));
        let dist = model.document_topics(&bow, MINIMUM_PROBABILITY);
        assert_eq!(most_related(&dist).unwrap().0, 0);

        let bow = model.vocabulary().doc2bow(&toks("pixel display screen"));
        let (topic, p) = most_related(&model.document_topics(&bow, MINIMUM_PROBABILITY)).unwrap();
        assert_eq!(topic, 1);
        assert!(p > 0.5);
    }

    #[test]
    fn empty_document_gets_uniform_mixture() {
        let model = two_topic_model();
        assert_eq!(model.infer(&Vec::new()), vec![0.5, 0.5]);
        // ties go to the later topic
        assert_eq!(most_related(&[(0, 0.5), (1, 0.5)]), Some((1, 0.5)));
        assert_eq!(most_related(&[]), None);
    }

    #[test]
    fn inference_is_deterministic() {
        let model = two_topic_model();
        let bow = model.vocabulary().doc2bow(&toks("battery screen pixel"));
        assert_eq!(model.infer(&bow), model.infer(&bow));
    }

    #[test]
    fn training_separates_disjoint_vocabularies() {
        let docs: Vec<Vec<String>> = (0..10)
            .map(|i| if i % 2 == 0 { toks("battery charger cable battery charger") } else { toks("screen pixel display screen pixel") })
            .collect();
        let vocab = Vocabulary::from_documents(&docs);
        let corpus: Vec<BagOfWords> = docs.iter().map(|d| vocab.doc2bow(d)).collect();
        let config = LdaConfig { num_topics: 2, passes: 5, iterations: 40, alpha: Some(0.1), ..Default::default() };
        let model = TopicModel::train(&corpus, vocab, &config).unwrap();

        let power = most_related(&model.document_topics(&corpus[0], MINIMUM_PROBABILITY)).unwrap().0;
        let display = most_related(&model.document_topics(&corpus[1], MINIMUM_PROBABILITY)).unwrap().0;
        assert_ne!(power, display);
    }

    #[test]
    fn training_is_reproducible_for_a_seed() {
        let docs = vec![toks("a b c a"), toks("c d e"), toks("a e e b")];
        let vocab = Vocabulary::from_documents(&docs);
        let corpus: Vec<BagOfWords> = docs.iter().map(|d| vocab.doc2bow(d)).collect();
        let config = LdaConfig { num_topics: 2, passes: 2, iterations: 5, ..Default::default() };
        let a = TopicModel::train(&corpus, vocab.clone(), &config).unwrap();
        let b = TopicModel::train(&corpus, vocab, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let config = LdaConfig { num_topics: 2, ..Default::default() };
        let err = TopicModel::train(&[Vec::new()], Vocabulary::new(), &config).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }
}
