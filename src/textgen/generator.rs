//! Generator checkpoints: next-token transition tables
//!
//! A generator is a table of next-token logits conditioned on the previous
//! token, plus start logits for the empty context. Serialized with bincode
//! behind magic bytes and a format version.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const MAGIC: [u8; 4] = *b"MBGN";
const VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorCheckpoint {
    magic: [u8; 4],
    format_version: u32,
    pub vocab_size: usize,
    /// Generation stops when this token is sampled
    pub eos_id: Option<u32>,
    /// Logits used when the context is empty
    pub start_logits: Vec<f32>,
    /// Per-token next-token logits, `vocab_size` rows of `vocab_size`
    pub transitions: Vec<Vec<f32>>,
}

impl GeneratorCheckpoint {
    pub fn new(
        vocab_size: usize,
        eos_id: Option<u32>,
        start_logits: Vec<f32>,
        transitions: Vec<Vec<f32>>,
    ) -> Self {
        Self {
            magic: MAGIC,
            format_version: VERSION,
            vocab_size,
            eos_id,
            start_logits,
            transitions,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| BenchError::Serialization(format!("Failed to serialize generator: {e}")))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let checkpoint: GeneratorCheckpoint = bincode::deserialize(&bytes).map_err(|e| {
            BenchError::Serialization(format!("Failed to deserialize generator: {e}"))
        })?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(BenchError::Serialization(
                "Not a generator checkpoint (bad magic bytes)".to_string(),
            ));
        }
        if self.format_version != VERSION {
            return Err(BenchError::Serialization(format!(
                "Unsupported generator version {}",
                self.format_version
            )));
        }
        if self.start_logits.len() != self.vocab_size
            || self.transitions.len() != self.vocab_size
            || self.transitions.iter().any(|row| row.len() != self.vocab_size)
        {
            return Err(BenchError::Serialization(format!(
                "Generator logit tables do not match vocab size {}",
                self.vocab_size
            )));
        }
        Ok(())
    }

    /// Next-token logits for the given context tail.
    ///
    /// A context token outside the generator's vocabulary is an error; it
    /// means the tokenizer and generator do not belong together.
    pub fn next_logits(&self, last_token: Option<u32>) -> Result<&[f32]> {
        match last_token {
            None => Ok(&self.start_logits),
            Some(id) => self
                .transitions
                .get(id as usize)
                .map(|row| row.as_slice())
                .ok_or_else(|| {
                    BenchError::Data(format!(
                        "Token id {id} is outside the generator vocabulary ({})",
                        self.vocab_size
                    ))
                }),
        }
    }
}
