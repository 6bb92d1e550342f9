//! Near-duplicate detection via 64-bit SimHash fingerprints.
//!
//! Similar documents get similar bit patterns, so the Hamming distance
//! between two fingerprints approximates how much the texts differ.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Fingerprint width in bits.
const BITS: u32 = 64;

/// Pages at or above this similarity are near-duplicates.
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.9;

/// Verdict on one pair of documents. Symmetric in its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub similarity: f64,
    pub hamming_distance: u32,
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimHash(pub u64);

impl SimHash {
    /// Computes the fingerprint of a document from 3-word shingles of its
    /// lowercased, whitespace-collapsed text. Empty text hashes to 0.
    pub fn compute(text: &str) -> Self {
        let normalized = text.to_lowercase();
        let words: Vec<&str> = normalized.split_whitespace().collect();
        if words.is_empty() {
            return SimHash(0);
        }

        let mut votes = [0i64; BITS as usize];
        let mut vote = |feature: &str| {
            let hash = xxh3_64(feature.as_bytes());
            for (bit, slot) in votes.iter_mut().enumerate() {
                if hash >> bit & 1 == 1 {
                    *slot += 1;
                } else {
                    *slot -= 1;
                }
            }
        };

        if words.len() < 3 {
            vote(&words.join(" "));
        } else {
            for shingle in words.windows(3) {
                vote(&shingle.join(" "));
            }
        }

        let mut fingerprint = 0u64;
        for (bit, slot) in votes.iter().enumerate() {
            if *slot > 0 {
                fingerprint |= 1 << bit;
            }
        }
        SimHash(fingerprint)
    }

    pub fn hamming_distance(&self, other: &SimHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

/// Compares two documents at the default duplicate threshold.
pub fn similarity(a: &str, b: &str) -> SimilarityResult {
    similarity_with_threshold(a, b, DEFAULT_DUPLICATE_THRESHOLD)
}

pub fn similarity_with_threshold(a: &str, b: &str, threshold: f64) -> SimilarityResult {
    let a_empty = a.trim().is_empty();
    let b_empty = b.trim().is_empty();

    // Empty-vs-empty is a perfect match; empty-vs-anything shares nothing.
    if a_empty || b_empty {
        return if a_empty && b_empty {
            SimilarityResult {
                similarity: 1.0,
                hamming_distance: 0,
                is_duplicate: true,
            }
        } else {
            SimilarityResult {
                similarity: 0.0,
                hamming_distance: BITS,
                is_duplicate: false,
            }
        };
    }

    let distance = SimHash::compute(a).hamming_distance(&SimHash::compute(b));
    let similarity = 1.0 - distance as f64 / BITS as f64;
    SimilarityResult {
        similarity,
        hamming_distance: distance,
        is_duplicate: similarity >= threshold,
    }
}

/// Fingerprint-level check used by the crawl loop, which keeps hashes of
/// accepted pages instead of their full text.
pub fn is_near_duplicate(a: &SimHash, b: &SimHash, threshold: f64) -> bool {
    1.0 - a.hamming_distance(b) as f64 / BITS as f64 >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "Our warehouse automation platform helps mid-size \
        distributors cut picking errors and integrate barcode scanning with \
        existing inventory systems across multiple sites.";

    #[test]
    fn identical_content_is_a_duplicate() {
        let result = similarity(ARTICLE, ARTICLE);
        assert_eq!(result.hamming_distance, 0);
        assert_eq!(result.similarity, 1.0);
        assert!(result.is_duplicate);
    }

    #[test]
    fn whitespace_and_case_noise_still_matches() {
        let noisy = ARTICLE.to_uppercase().replace(' ', "   \n\t ");
        let result = similarity(ARTICLE, &noisy);
        assert_eq!(result.similarity, 1.0);
        assert!(result.is_duplicate);
    }

    #[test]
    fn is_symmetric() {
        let other = "Contact our sales team for a personalized pricing quote \
            covering implementation, training and ongoing support plans.";
        assert_eq!(similarity(ARTICLE, other), similarity(other, ARTICLE));
    }

    #[test]
    fn unrelated_content_scores_low() {
        let other = "banana banana banana recipe flour sugar oven temperature \
            whisk eggs butter vanilla frosting sprinkle cool rack slice serve";
        let result = similarity(ARTICLE, other);
        assert!(result.similarity < 0.75, "got {}", result.similarity);
        assert!(!result.is_duplicate);
    }

    #[test]
    fn single_word_edit_keeps_hashes_close() {
        // One replaced word flips three of the twenty-two shingles, which
        // moves the hashes apart but keeps them far closer than unrelated
        // texts land.
        let edited = ARTICLE.replace("mid-size", "medium-size");
        let result = similarity_with_threshold(ARTICLE, edited.as_str(), 0.8);
        assert!(result.hamming_distance <= 12, "distance {}", result.hamming_distance);
        assert!(result.similarity >= 0.8, "similarity {}", result.similarity);
        assert!(result.is_duplicate);
    }

    #[test]
    fn empty_content_edge_cases() {
        let both = similarity("", "   ");
        assert_eq!(both.similarity, 1.0);
        assert!(both.is_duplicate);

        let one = similarity("", ARTICLE);
        assert_eq!(one.similarity, 0.0);
        assert_eq!(one.hamming_distance, 64);
        assert!(!one.is_duplicate);
    }

    #[test]
    fn hamming_distance_satisfies_triangle_inequality() {
        let a = SimHash::compute(ARTICLE);
        let b = SimHash::compute("Pricing plans for every team size, billed monthly or annually.");
        let c = SimHash::compute("A completely different page about gardening tips in spring.");
        assert!(a.hamming_distance(&c) <= a.hamming_distance(&b) + b.hamming_distance(&c));
    }

    #[test]
    fn short_texts_hash_whole_string() {
        let result = similarity("hello world", "hello world");
        assert!(result.is_duplicate);
        assert!(!similarity("hello world", "goodbye moon").is_duplicate);
    }
}
