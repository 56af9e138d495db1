use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

use crate::normalize::tag_key;

/// Fixed keys keep embeddings stable across processes and Rust releases.
const HASH_KEY_0: u64 = 0x5f3a_91c2_07de_4b18;
const HASH_KEY_1: u64 = 0xa2c4_6e80_13f5_97bd;

pub const DEFAULT_DIMENSION: usize = 256;

/// Feature-hashed bag of words over interest tags.
///
/// Each tag contributes its whole normalized text plus every word in it, so
/// `"animal welfare"` and `"animals"` share nothing while `"animal welfare"`
/// and `"wildlife welfare"` share `welfare`.
#[derive(Debug, Clone)]
pub struct InterestEmbedder {
    dimension: usize,
}

impl Default for InterestEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl InterestEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = SipHasher13::new_with_keys(HASH_KEY_0, HASH_KEY_1);
        token.hash(&mut hasher);
        let hash = hasher.finish();
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        ((hash as usize) % self.dimension, sign)
    }

    fn tokens<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
        let mut tokens = Vec::new();
        for tag in tags {
            let key = tag_key(tag.as_ref());
            if key.is_empty() {
                continue;
            }
            let words: Vec<&str> = key
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect();
            if words.len() > 1 {
                tokens.push(key.clone());
            }
            tokens.extend(words.into_iter().map(str::to_string));
        }
        tokens
    }

    /// L2-normalized vector; all zeros when there is nothing to embed.
    pub fn embed<S: AsRef<str>>(&self, tags: &[S]) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in Self::tokens(tags) {
            let (idx, sign) = self.bucket(&token);
            vector[idx] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    pub fn similarity<A: AsRef<str>, B: AsRef<str>>(&self, a: &[A], b: &[B]) -> f32 {
        cosine_similarity(&self.embed(a), &self.embed(b))
    }
}

/// Raw cosine in `[-1, 1]`; `0.0` for zero vectors or mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
