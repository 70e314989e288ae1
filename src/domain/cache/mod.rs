//! Cache module - vector similarity for the semantic tier.

mod similarity;

pub use similarity::cosine_similarity;
