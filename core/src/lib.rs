//! TF-IDF similarity core for the cinematch recommender.
//!
//! Build a [`VectorSpaceIndex`] once per catalog, then call [`rank()`] per query.

pub mod catalog;
pub mod error;
pub mod index;
pub mod persist;
pub mod rank;
pub mod snapshot;
pub mod tokenizer;
pub mod vector;

pub type TermId = u32;

pub use catalog::{Catalog, CatalogItem};
pub use error::{CatalogError, CoreError};
pub use index::{IdfScheme, IndexConfig, TfScheme, VectorSpaceIndex};
pub use rank::{rank, ScoredMatch, SimilarityRanker};
pub use snapshot::{SharedSnapshot, Snapshot};
pub use tokenizer::{Language, TokenizerConfig};
pub use vector::{cosine_similarity, SparseVector};
