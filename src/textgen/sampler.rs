//! Temperature and nucleus sampling over next-token logits

use crate::error::{BenchError, Result};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Draws token ids from logits with temperature scaling and top-p
/// (nucleus) filtering.
pub struct LogitsSampler {
    temperature: f64,
    top_p: f64,
    rng: ChaCha8Rng,
}

impl LogitsSampler {
    pub fn new(temperature: f64, top_p: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            temperature,
            top_p,
            rng,
        }
    }

    /// Sample one token id.
    ///
    /// Keeps the smallest set of highest-probability tokens whose
    /// cumulative mass reaches `top_p`, renormalizes, and draws from it.
    pub fn sample(&mut self, logits: &[f32]) -> Result<usize> {
        if logits.is_empty() {
            return Err(BenchError::Data("Cannot sample from empty logits".to_string()));
        }

        let scaled: Vec<f64> = logits
            .iter()
            .map(|&l| l as f64 / self.temperature)
            .collect();
        let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scaled.iter().map(|&v| (v - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        let probs: Vec<f64> = exps.iter().map(|&e| e / sum).collect();

        let mut order: Vec<usize> = (0..probs.len()).collect();
        order.sort_by(|&a, &b| {
            probs[b]
                .partial_cmp(&probs[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut kept: Vec<usize> = Vec::new();
        let mut cumulative = 0.0;
        for &idx in &order {
            kept.push(idx);
            cumulative += probs[idx];
            if cumulative >= self.top_p {
                break;
            }
        }

        let total: f64 = kept.iter().map(|&i| probs[i]).sum();
        let mut draw = self.rng.gen::<f64>() * total;
        for &idx in &kept {
            draw -= probs[idx];
            if draw <= 0.0 {
                return Ok(idx);
            }
        }
        Ok(*kept.last().expect("kept set is never empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaked_logits_are_deterministic() {
        // A large logit gap leaves only one token inside the nucleus.
        let mut sampler = LogitsSampler::new(0.7, 0.9, None);
        let logits = vec![0.0, 100.0, 0.0];
        for _ in 0..20 {
            assert_eq!(sampler.sample(&logits).unwrap(), 1);
        }
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let logits = vec![1.0, 1.1, 0.9, 1.05];
        let mut a = LogitsSampler::new(0.7, 0.9, Some(11));
        let mut b = LogitsSampler::new(0.7, 0.9, Some(11));

        let draws_a: Vec<usize> = (0..10).map(|_| a.sample(&logits).unwrap()).collect();
        let draws_b: Vec<usize> = (0..10).map(|_| b.sample(&logits).unwrap()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn test_nucleus_excludes_tail() {
        // probs ~ [0.95, 0.05 split across rest]: top_p 0.9 keeps index 0 only
        let logits = vec![5.0, 0.0, 0.0];
        let mut sampler = LogitsSampler::new(1.0, 0.9, Some(3));
        for _ in 0..50 {
            assert_eq!(sampler.sample(&logits).unwrap(), 0);
        }
    }

    #[test]
    fn test_empty_logits_rejected() {
        let mut sampler = LogitsSampler::new(0.7, 0.9, Some(0));
        assert!(sampler.sample(&[]).is_err());
    }

    #[test]
    fn test_sampled_ids_in_range() {
        let logits = vec![0.1, 0.2, 0.3, 0.4];
        let mut sampler = LogitsSampler::new(0.7, 0.9, Some(5));
        for _ in 0..100 {
            assert!(sampler.sample(&logits).unwrap() < 4);
        }
    }
}
