//! Text-generation analysis
//!
//! Holds at most one loaded (tokenizer, generator) pair, produces sampled
//! continuations for prompts, and scores generations against expected
//! references with set-based token overlap.

mod generator;
mod sampler;
mod similarity;

pub use generator::GeneratorCheckpoint;
pub use sampler::LogitsSampler;
pub use similarity::jaccard;

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::{info, warn};

/// Sampling temperature for generation
pub const TEMPERATURE: f64 = 0.7;
/// Nucleus mass for generation
pub const TOP_P: f64 = 0.9;
/// Default generation length cap (tokens, prompt included)
pub const DEFAULT_MAX_LENGTH: usize = 100;
/// Tokenizer artifact inside a model directory
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Generator artifact inside a model directory
pub const GENERATOR_FILE: &str = "generator.bin";

// Placeholder, not a measurement; real timing would be taken around the
// sampling loop.
const RESPONSE_TIME_PLACEHOLDER: f64 = 0.1;

/// Length and timing metrics of a single generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationMetrics {
    pub input_length: usize,
    pub output_length: usize,
    pub response_time: f64,
    pub expansion_ratio: f64,
}

/// One generated continuation plus its metrics.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub generated_text: String,
    pub metrics: GenerationMetrics,
}

/// A prompt/expected pair from an uploaded test definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestItem {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub expected: String,
}

/// Per-item outcome inside a batch evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    pub prompt: String,
    pub generated: String,
    pub expected: String,
    pub similarity: f64,
    pub input_length: usize,
    pub output_length: usize,
    pub response_time: f64,
    pub expansion_ratio: f64,
}

/// Means over the successfully generated items.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub average_similarity: f64,
    pub average_response_time: f64,
    pub average_expansion_ratio: f64,
}

/// Batch evaluation result; `skipped` counts items whose generation
/// errored and were left out of the aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<ItemResult>,
    pub skipped: usize,
    #[serde(rename = "summary_metrics")]
    pub summary: BatchSummary,
}

struct LoadedPair {
    tokenizer: Tokenizer,
    generator: GeneratorCheckpoint,
}

/// Text-generation analyzer holding the active tokenizer/generator pair.
pub struct TextGenAnalyzer {
    pair: Option<LoadedPair>,
    /// Fixed sampling seed; entropy-seeded when `None`
    seed: Option<u64>,
}

impl Default for TextGenAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGenAnalyzer {
    pub fn new() -> Self {
        Self {
            pair: None,
            seed: None,
        }
    }

    /// Fix the sampling seed for reproducible generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.pair.is_some()
    }

    /// Load a tokenizer/generator pair from a model directory.
    ///
    /// Any previously loaded pair is discarded wholesale.
    pub fn load_model(&mut self, dir: &Path) -> Result<()> {
        let tokenizer_path = dir.join(TOKENIZER_FILE);
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            BenchError::ModelLoad {
                path: tokenizer_path.display().to_string(),
                cause: e.to_string(),
            }
        })?;

        let generator_path = dir.join(GENERATOR_FILE);
        let generator =
            GeneratorCheckpoint::load(&generator_path).map_err(|e| BenchError::ModelLoad {
                path: generator_path.display().to_string(),
                cause: e.to_string(),
            })?;

        info!(
            dir = %dir.display(),
            vocab_size = generator.vocab_size,
            "Generation model loaded"
        );
        self.pair = Some(LoadedPair {
            tokenizer,
            generator,
        });
        Ok(())
    }

    /// Sample one continuation for `prompt` and compute its metrics.
    ///
    /// The decoded text includes the prompt tokens. `max_length` caps the
    /// whole sequence.
    pub fn generate(&self, prompt: &str, max_length: usize) -> Result<GenerationResult> {
        let pair = self.pair.as_ref().ok_or(BenchError::ModelNotLoaded)?;

        let encoding = pair
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| BenchError::Data(format!("Tokenization failed: {e}")))?;
        let mut ids: Vec<u32> = encoding.get_ids().to_vec();

        for &id in &ids {
            if (id as usize) >= pair.generator.vocab_size {
                return Err(BenchError::Data(format!(
                    "Token id {id} is outside the generator vocabulary ({})",
                    pair.generator.vocab_size
                )));
            }
        }

        let mut sampler = LogitsSampler::new(TEMPERATURE, TOP_P, self.seed);
        while ids.len() < max_length {
            let logits = pair.generator.next_logits(ids.last().copied())?;
            let next = sampler.sample(logits)? as u32;
            if pair.generator.eos_id == Some(next) {
                break;
            }
            ids.push(next);
        }

        let generated_text = pair
            .tokenizer
            .decode(&ids, true)
            .map_err(|e| BenchError::Data(format!("Decoding failed: {e}")))?;

        let input_length = prompt.split_whitespace().count();
        let output_length = generated_text.split_whitespace().count();
        let expansion_ratio = if input_length > 0 {
            output_length as f64 / input_length as f64
        } else {
            0.0
        };

        Ok(GenerationResult {
            generated_text,
            metrics: GenerationMetrics {
                input_length,
                output_length,
                response_time: RESPONSE_TIME_PLACEHOLDER,
                expansion_ratio,
            },
        })
    }

    /// Generate for each test item and aggregate similarity metrics.
    ///
    /// Items whose generation errors are skipped (not retried); the skip
    /// count is surfaced so callers can tell the sample shrank. Fails with
    /// a no-results error when nothing generated successfully.
    pub fn evaluate_batch(&self, items: &[TestItem]) -> Result<BatchReport> {
        if self.pair.is_none() {
            return Err(BenchError::ModelNotLoaded);
        }

        let mut results: Vec<ItemResult> = Vec::with_capacity(items.len());
        let mut skipped = 0usize;

        for item in items {
            match self.generate(&item.prompt, DEFAULT_MAX_LENGTH) {
                Ok(generation) => {
                    let similarity = jaccard(&generation.generated_text, &item.expected);
                    let m = generation.metrics;
                    results.push(ItemResult {
                        prompt: item.prompt.clone(),
                        generated: generation.generated_text,
                        expected: item.expected.clone(),
                        similarity,
                        input_length: m.input_length,
                        output_length: m.output_length,
                        response_time: m.response_time,
                        expansion_ratio: m.expansion_ratio,
                    });
                }
                Err(e) => {
                    warn!(prompt = %item.prompt, error = %e, "Generation failed, skipping item");
                    skipped += 1;
                }
            }
        }

        if results.is_empty() {
            return Err(BenchError::NoResults);
        }

        let n = results.len() as f64;
        let summary = BatchSummary {
            average_similarity: results.iter().map(|r| r.similarity).sum::<f64>() / n,
            average_response_time: results.iter().map(|r| r.response_time).sum::<f64>() / n,
            average_expansion_ratio: results.iter().map(|r| r.expansion_ratio).sum::<f64>() / n,
        };

        Ok(BatchReport {
            results,
            skipped,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Build a model directory with a word-level tokenizer and a peaked
    /// transition table so sampling is deterministic.
    fn write_model_dir(dir: &Path, generator_vocab: usize) {
        let vocab: serde_json::Map<String, serde_json::Value> =
            ["<unk>", "hello", "world", "again", "rare"]
                .iter()
                .enumerate()
                .map(|(i, word)| ((*word).to_string(), json!(i as u32)))
                .collect();

        let tokenizer_json = json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {"type": "Whitespace"},
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "<unk>",
            },
        });
        std::fs::write(
            dir.join(TOKENIZER_FILE),
            serde_json::to_string_pretty(&tokenizer_json).unwrap(),
        )
        .unwrap();

        // Peaked logits: token i strongly transitions to (i + 1) % vocab
        let transitions: Vec<Vec<f32>> = (0..generator_vocab)
            .map(|i| {
                let mut row = vec![0.0; generator_vocab];
                row[(i + 1) % generator_vocab] = 100.0;
                row
            })
            .collect();
        let mut start = vec![0.0; generator_vocab];
        start[1] = 100.0;

        GeneratorCheckpoint::new(generator_vocab, None, start, transitions)
            .save(&dir.join(GENERATOR_FILE))
            .unwrap();
    }

    fn loaded_analyzer(dir: &Path, generator_vocab: usize) -> TextGenAnalyzer {
        write_model_dir(dir, generator_vocab);
        let mut analyzer = TextGenAnalyzer::new().with_seed(42);
        analyzer.load_model(dir).unwrap();
        analyzer
    }

    #[test]
    fn test_generate_requires_loaded_model() {
        let analyzer = TextGenAnalyzer::new();
        let err = analyzer.generate("hi", 10).unwrap_err();
        assert!(matches!(err, BenchError::ModelNotLoaded));
    }

    #[test]
    fn test_generate_includes_prompt_and_caps_length() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = loaded_analyzer(dir.path(), 5);

        let result = analyzer.generate("hello world", 4).unwrap();

        assert!(result.generated_text.starts_with("hello world"));
        assert_eq!(result.metrics.input_length, 2);
        assert_eq!(result.metrics.output_length, 4);
        assert_eq!(result.metrics.expansion_ratio, 2.0);
        assert_eq!(result.metrics.response_time, 0.1);
    }

    #[test]
    fn test_empty_prompt_expansion_ratio_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = loaded_analyzer(dir.path(), 5);

        let result = analyzer.generate("", 5).unwrap();

        assert_eq!(result.metrics.input_length, 0);
        assert_eq!(result.metrics.expansion_ratio, 0.0);
        assert!(result.metrics.output_length > 0);
    }

    #[test]
    fn test_eos_stops_generation() {
        let dir = tempfile::tempdir().unwrap();
        write_model_dir(dir.path(), 5);

        // Rewrite the generator so every token transitions to id 3 and 3
        // is the EOS token.
        let transitions: Vec<Vec<f32>> = (0..5)
            .map(|_| {
                let mut row = vec![0.0; 5];
                row[3] = 100.0;
                row
            })
            .collect();
        GeneratorCheckpoint::new(5, Some(3), vec![0.0; 5], transitions)
            .save(&dir.path().join(GENERATOR_FILE))
            .unwrap();

        let mut analyzer = TextGenAnalyzer::new().with_seed(1);
        analyzer.load_model(dir.path()).unwrap();

        let result = analyzer.generate("hello", 50).unwrap();
        // One step samples EOS immediately; only the prompt survives
        assert_eq!(result.generated_text, "hello");
    }

    #[test]
    fn test_reload_replaces_pair() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        write_model_dir(dir_a.path(), 5);
        write_model_dir(dir_b.path(), 3);

        let mut analyzer = TextGenAnalyzer::new().with_seed(9);
        analyzer.load_model(dir_a.path()).unwrap();
        analyzer.load_model(dir_b.path()).unwrap();

        // "again" has id 3, outside the second generator's vocabulary
        assert!(analyzer.generate("again", 5).is_err());
    }

    #[test]
    fn test_batch_skips_failing_items_and_reports_count() {
        let dir = tempfile::tempdir().unwrap();
        // Generator only knows ids 0..4; "rare" (id 4) fails generation
        let analyzer = loaded_analyzer(dir.path(), 4);

        let items = vec![
            TestItem {
                prompt: "hello".to_string(),
                expected: "hello world".to_string(),
            },
            TestItem {
                prompt: "rare".to_string(),
                expected: "anything".to_string(),
            },
            TestItem {
                prompt: "world".to_string(),
                expected: "world again".to_string(),
            },
        ];

        let report = analyzer.evaluate_batch(&items).unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.skipped, 1);
        assert!(report.summary.average_similarity > 0.0);
        assert_eq!(report.summary.average_response_time, 0.1);
    }

    #[test]
    fn test_batch_with_no_successes_errors() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = loaded_analyzer(dir.path(), 4);

        let items = vec![TestItem {
            prompt: "rare".to_string(),
            expected: "x".to_string(),
        }];

        let err = analyzer.evaluate_batch(&items).unwrap_err();
        assert!(matches!(err, BenchError::NoResults));
    }

    #[test]
    fn test_batch_requires_loaded_model() {
        let analyzer = TextGenAnalyzer::new();
        let err = analyzer.evaluate_batch(&[]).unwrap_err();
        assert!(matches!(err, BenchError::ModelNotLoaded));
    }
}
