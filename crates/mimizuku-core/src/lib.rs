//! Mimizuku コアモデル
//!
//! このクレートは分類エンジンが共有する基盤を提供します:
//! - クラス式 (⊤, ⊥, 名前付きクラス, ⊓, ⊔, ¬)
//! - TBox 公理と ABox 表明
//! - 知識ベースと決定手続き (oracle) のトレイト

pub mod kb;
pub mod model;

pub use kb::{KnowledgeBase, Oracle};
pub use model::{Assertion, Axiom, ClassExpression, Individual, Iri, Ontology};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReasonerError {
    #[error("Knowledge base is inconsistent: {0}")]
    Inconsistent(String),

    #[error("Unknown individual: {0}")]
    UnknownIndividual(Individual),

    #[error("Reasoning error: {0}")]
    ReasoningError(String),
}
