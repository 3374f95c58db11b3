//! テーブルロー推論アルゴリズム

use mimizuku_core::model::{Axiom, ClassExpression, Iri};
use std::collections::HashSet;

/// Tableau node: the single individual of a role-free completion graph
#[derive(Debug, Clone, Default)]
struct Node {
    /// Labels (NNF concepts this individual belongs to)
    labels: HashSet<ClassExpression>,
    /// Named classes in the label
    atoms: HashSet<Iri>,
    /// Named classes whose complement is in the label
    negated_atoms: HashSet<Iri>,
    /// Disjunctions waiting for the ⊔-rule
    disjunctions: Vec<ClassExpression>,
}

impl Node {
    /// A disjunct that would clash immediately is not worth a branch
    fn clashes_with(&self, class: &ClassExpression) -> bool {
        match class {
            ClassExpression::Nothing => true,
            ClassExpression::Named(iri) => self.negated_atoms.contains(iri),
            ClassExpression::ComplementOf(inner) => match inner.as_ref() {
                ClassExpression::Named(iri) => self.atoms.contains(iri),
                _ => false,
            },
            _ => false,
        }
    }

    fn first_open_disjunction(&self) -> Option<&[ClassExpression]> {
        self.disjunctions.iter().find_map(|d| {
            let disjuncts = d.disjuncts()?;
            let satisfied = disjuncts.iter().any(|c| c.is_top() || self.labels.contains(c));
            if satisfied { None } else { Some(disjuncts) }
        })
    }
}

/// Tableau reasoner over general concept inclusions without roles
#[derive(Debug, Clone)]
pub struct TableauReasoner {
    /// Internalised TBox: one `¬C ⊔ D` (in NNF) per inclusion
    gcis: Vec<ClassExpression>,
}

impl TableauReasoner {
    pub fn new(axioms: &[Axiom]) -> Self {
        let mut gcis = Vec::new();
        for axiom in axioms {
            match axiom {
                Axiom::SubClassOf(c, d) => gcis.push(Self::internalise(c, d)),
                Axiom::EquivalentClasses(c, d) => {
                    gcis.push(Self::internalise(c, d));
                    gcis.push(Self::internalise(d, c));
                }
            }
        }
        Self { gcis }
    }

    fn internalise(sub: &ClassExpression, sup: &ClassExpression) -> ClassExpression {
        ClassExpression::or(vec![ClassExpression::not(sub.clone()), sup.clone()]).to_nnf()
    }

    /// Check whether the conjunction of `concepts` is satisfiable w.r.t. the TBox
    pub fn is_satisfiable(&self, concepts: &[ClassExpression]) -> bool {
        let mut pending: Vec<ClassExpression> = concepts.iter().map(|c| c.to_nnf()).collect();
        pending.extend(self.gcis.iter().cloned());
        self.expand(Node::default(), pending)
    }

    /// Apply the expansion rules until a clash or a complete, clash-free node
    fn expand(&self, mut node: Node, mut pending: Vec<ClassExpression>) -> bool {
        // ⊓-rule and clash detection
        while let Some(class) = pending.pop() {
            if !node.labels.insert(class.clone()) {
                continue;
            }
            match class {
                ClassExpression::Thing => {}
                ClassExpression::Nothing => return false,
                ClassExpression::Named(iri) => {
                    if node.negated_atoms.contains(&iri) {
                        return false;
                    }
                    node.atoms.insert(iri);
                }
                ClassExpression::ComplementOf(inner) => {
                    if let ClassExpression::Named(iri) = *inner {
                        if node.atoms.contains(&iri) {
                            return false;
                        }
                        node.negated_atoms.insert(iri);
                    }
                }
                ClassExpression::IntersectionOf(operands) => pending.extend(operands),
                ClassExpression::UnionOf(operands) => {
                    node.disjunctions.push(ClassExpression::UnionOf(operands))
                }
            }
        }

        // ⊔-rule: branch on the first disjunction the label does not satisfy yet
        let disjuncts = match node.first_open_disjunction() {
            Some(disjuncts) => disjuncts.to_vec(),
            None => return true,
        };

        for disjunct in disjuncts {
            if node.clashes_with(&disjunct) {
                continue;
            }
            if self.expand(node.clone(), vec![disjunct]) {
                return true;
            }
        }

        false
    }
}
