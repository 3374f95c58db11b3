//! Mimizuku 参照決定手続き
//!
//! このクレートはロールを含まない ALC 断片のテーブルロー推論を提供します:
//! - 充足可能性判定 (⊓-rule, ⊔-rule とバックトラック)
//! - 包摂判定とインスタンス判定
//! - 知識ベースの整合性検証

pub mod reasoner;
pub mod tableau;

pub use reasoner::{LiteReasoner, OracleStats};
pub use tableau::TableauReasoner;
