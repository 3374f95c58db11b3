//! Mimizuku タクソノミー構築エンジン
//!
//! このクレートは概念階層の分類と個体の実現を提供します:
//! - アリーナ上の包摂 DAG (同値クラスのマージ, 循環除去, Hasse 性の維持)
//! - told subsumer による前処理と処理順序の決定
//! - 三値マークによるメモ化された双方向探索 (top search / bottom search)
//! - 最も具体的な型への個体の割り当て (realization)
//! - 最小共通祖先 (LCA) の計算とクエリ API

pub mod builder;
pub mod config;
pub mod marks;
pub mod node;
pub mod printer;
pub mod progress;
pub mod taxonomy;
mod told;

pub use builder::TaxonomyBuilder;
pub use config::ClassifierConfig;
pub use marks::{Marks, Propagation, Tristate};
pub use node::{NodeId, TaxonomyNode};
pub use printer::TaxonomyPrinter;
pub use progress::{CancelHandle, CancellableProgress, LoggingProgress, NoopProgress, ProgressMonitor};
pub use taxonomy::Taxonomy;

// Error types
use mimizuku_core::model::ClassExpression;
use mimizuku_core::ReasonerError;
use thiserror::Error;

/// Taxonomy construction failures.
///
/// Everything but `Reasoner` and `Config` is an internal consistency
/// violation: the oracle contradicted itself or the told information.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Unknown concept: {0}")]
    UnknownConcept(ClassExpression),

    #[error("Conflicting mark on {concept}: already {existing}, requested {requested}")]
    ConflictingMark {
        concept: ClassExpression,
        existing: bool,
        requested: bool,
    },

    #[error("Cycle detected: {remaining} nodes left unsorted")]
    CycleDetected { remaining: usize },

    #[error("Expected ⊤ as the only root, found {0} roots")]
    MultipleRoots(usize),

    #[error("Unresolvable cycle through {0}")]
    UnresolvableCycle(ClassExpression),

    #[error("Cannot merge ⊤ with ⊥")]
    InconsistentMerge,

    #[error("Nothing to merge")]
    EmptyMerge,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Reasoner(#[from] ReasonerError),
}
