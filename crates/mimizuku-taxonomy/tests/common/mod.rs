#![allow(dead_code)]

use mimizuku_core::model::{ClassExpression, Individual, Ontology};
use mimizuku_core::{Oracle, ReasonerError};
use mimizuku_lite::LiteReasoner;
use mimizuku_taxonomy::Taxonomy;
use std::collections::{BTreeSet, HashSet};

pub fn named(s: &str) -> ClassExpression {
    ClassExpression::named(s)
}

/// One question put to the oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Satisfiable(ClassExpression),
    SubClassOf(ClassExpression, ClassExpression),
    Type(Individual, ClassExpression),
}

impl Call {
    pub fn mentions(&self, class: &ClassExpression) -> bool {
        let mut named = BTreeSet::new();
        match self {
            Call::Satisfiable(c) | Call::Type(_, c) => c.collect_named(&mut named),
            Call::SubClassOf(c, d) => {
                c.collect_named(&mut named);
                d.collect_named(&mut named);
            }
        }
        named.contains(class)
    }
}

/// Reference oracle that logs every call
pub struct RecordingOracle {
    inner: LiteReasoner,
    pub calls: Vec<Call>,
}

impl RecordingOracle {
    pub fn new(ontology: &Ontology) -> Self {
        Self {
            inner: LiteReasoner::new(ontology),
            calls: Vec::new(),
        }
    }
}

impl Oracle for RecordingOracle {
    fn is_satisfiable(&mut self, class: &ClassExpression) -> Result<bool, ReasonerError> {
        self.calls.push(Call::Satisfiable(class.clone()));
        self.inner.is_satisfiable(class)
    }

    fn is_subclass_of(&mut self, sub: &ClassExpression, sup: &ClassExpression) -> Result<bool, ReasonerError> {
        self.calls.push(Call::SubClassOf(sub.clone(), sup.clone()));
        self.inner.is_subclass_of(sub, sup)
    }

    fn is_type(&mut self, individual: &Individual, class: &ClassExpression) -> Result<bool, ReasonerError> {
        self.calls.push(Call::Type(individual.clone(), class.clone()));
        self.inner.is_type(individual, class)
    }
}

/// Equivalence classes with their direct super classes, independent of
/// arena layout and representative choice
pub type Shape = BTreeSet<(BTreeSet<ClassExpression>, BTreeSet<BTreeSet<ClassExpression>>)>;

pub fn shape(taxonomy: &Taxonomy) -> Shape {
    taxonomy
        .nodes()
        .map(|(_, node)| {
            let supers: BTreeSet<BTreeSet<ClassExpression>> = node
                .supers()
                .iter()
                .map(|&s| taxonomy.node(s).equivalents().clone())
                .collect();
            (node.equivalents().clone(), supers)
        })
        .collect()
}

/// No direct super of a node is also reachable through another direct super
pub fn assert_hasse(taxonomy: &Taxonomy) {
    for (id, node) in taxonomy.nodes() {
        for &direct in node.supers() {
            for &other in node.supers() {
                if other == direct {
                    continue;
                }
                let mut seen = HashSet::new();
                let mut stack = vec![other];
                while let Some(n) = stack.pop() {
                    assert_ne!(
                        n,
                        direct,
                        "shortcut edge {} -> {} in the taxonomy",
                        taxonomy.node(id).name(),
                        taxonomy.node(direct).name()
                    );
                    if seen.insert(n) {
                        stack.extend(taxonomy.node(n).supers().iter().copied());
                    }
                }
            }
        }
    }
}

/// Every node other than ⊤ reaches ⊤ upwards, every node other than ⊥
/// reaches ⊥ downwards
pub fn assert_top_bottom_reachable(taxonomy: &Taxonomy) {
    for (id, node) in taxonomy.nodes() {
        if id != taxonomy.top() {
            assert!(
                reaches(taxonomy, id, taxonomy.top(), true),
                "{} does not reach ⊤",
                node.name()
            );
        }
        if id != taxonomy.bottom() {
            assert!(
                reaches(taxonomy, id, taxonomy.bottom(), false),
                "{} does not reach ⊥",
                node.name()
            );
        }
    }
}

fn reaches(
    taxonomy: &Taxonomy,
    from: mimizuku_taxonomy::NodeId,
    to: mimizuku_taxonomy::NodeId,
    upwards: bool,
) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(n) = stack.pop() {
        if n == to {
            return true;
        }
        if seen.insert(n) {
            let node = taxonomy.node(n);
            let next = if upwards { node.supers() } else { node.subs() };
            stack.extend(next.iter().copied());
        }
    }
    false
}
