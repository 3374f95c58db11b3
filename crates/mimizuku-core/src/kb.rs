//! 知識ベースと決定手続きのインターフェース

use crate::model::{Axiom, ClassExpression, Individual, Ontology};
use crate::ReasonerError;
use std::collections::HashSet;

/// Read-only view of the knowledge base the taxonomy is built from
pub trait KnowledgeBase {
    /// Named classes to classify
    fn classes(&self) -> Vec<ClassExpression>;

    /// Individuals to realize
    fn individuals(&self) -> Vec<Individual>;

    /// TBox axioms scanned for told subsumers
    fn axioms(&self) -> &[Axiom];

    /// `(types, non_types)` readable from the ABox without reasoning.
    /// May be incomplete but must never be wrong.
    fn obvious_types(&self, individual: &Individual) -> (HashSet<ClassExpression>, HashSet<ClassExpression>);
}

impl KnowledgeBase for Ontology {
    fn classes(&self) -> Vec<ClassExpression> {
        self.classes.iter().cloned().collect()
    }

    fn individuals(&self) -> Vec<Individual> {
        self.individuals.iter().cloned().collect()
    }

    fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    fn obvious_types(&self, individual: &Individual) -> (HashSet<ClassExpression>, HashSet<ClassExpression>) {
        Ontology::obvious_types(self, individual)
    }
}

/// Satisfiability / subsumption / instance-checking decision procedure.
///
/// Treated as correct but expensive; every call is assumed to block.
pub trait Oracle {
    fn is_satisfiable(&mut self, class: &ClassExpression) -> Result<bool, ReasonerError>;

    /// `sub ⊑ sup`
    fn is_subclass_of(&mut self, sub: &ClassExpression, sup: &ClassExpression) -> Result<bool, ReasonerError>;

    fn is_type(&mut self, individual: &Individual, class: &ClassExpression) -> Result<bool, ReasonerError>;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn is_satisfiable(&mut self, class: &ClassExpression) -> Result<bool, ReasonerError> {
        (**self).is_satisfiable(class)
    }

    fn is_subclass_of(&mut self, sub: &ClassExpression, sup: &ClassExpression) -> Result<bool, ReasonerError> {
        (**self).is_subclass_of(sub, sup)
    }

    fn is_type(&mut self, individual: &Individual, class: &ClassExpression) -> Result<bool, ReasonerError> {
        (**self).is_type(individual, class)
    }
}
