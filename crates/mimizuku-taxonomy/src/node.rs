//! タクソノミーノード

use mimizuku_core::model::{ClassExpression, Individual};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Handle of a node inside its [`Taxonomy`](crate::Taxonomy) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One equivalence class of concepts in the subsumption DAG.
///
/// `subs` and `supers` hold direct edges only. A hidden node is a
/// pass-through: it lists its subs, but they do not list it among their
/// supers, and queries never report it.
#[derive(Debug, Clone)]
pub struct TaxonomyNode {
    pub(crate) name: ClassExpression,
    pub(crate) equivalents: BTreeSet<ClassExpression>,
    /// Complex expressions folded into this class; resolvable but never reported
    pub(crate) hidden_equivalents: BTreeSet<ClassExpression>,
    pub(crate) subs: Vec<NodeId>,
    pub(crate) supers: Vec<NodeId>,
    pub(crate) instances: Option<BTreeSet<Individual>>,
    pub(crate) hidden: bool,
    /// Tombstone left behind by a merge
    pub(crate) removed: bool,
}

impl TaxonomyNode {
    pub(crate) fn new(name: ClassExpression, hidden: bool) -> Self {
        let mut equivalents = BTreeSet::new();
        equivalents.insert(name.clone());
        Self {
            name,
            equivalents,
            hidden_equivalents: BTreeSet::new(),
            subs: Vec::new(),
            supers: Vec::new(),
            instances: None,
            hidden,
            removed: false,
        }
    }

    /// Representative concept
    pub fn name(&self) -> &ClassExpression {
        &self.name
    }

    /// Visible members of the equivalence class, never empty
    pub fn equivalents(&self) -> &BTreeSet<ClassExpression> {
        &self.equivalents
    }

    pub fn hidden_equivalents(&self) -> &BTreeSet<ClassExpression> {
        &self.hidden_equivalents
    }

    pub fn subs(&self) -> &[NodeId] {
        &self.subs
    }

    pub fn supers(&self) -> &[NodeId] {
        &self.supers
    }

    pub fn instances(&self) -> impl Iterator<Item = &Individual> {
        self.instances.iter().flatten()
    }

    pub fn has_instance(&self, individual: &Individual) -> bool {
        self.instances.as_ref().is_some_and(|instances| instances.contains(individual))
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Named classes and ⊤/⊥ are visible members; anything else is folded in hidden.
    pub(crate) fn add_equivalent(&mut self, class: ClassExpression) {
        if class.is_primitive() || class.is_top() || class.is_bottom() || class == self.name {
            self.equivalents.insert(class);
        } else {
            self.hidden_equivalents.insert(class);
        }
    }

    pub(crate) fn add_instance(&mut self, individual: Individual) -> bool {
        self.instances.get_or_insert_with(BTreeSet::new).insert(individual)
    }

    pub(crate) fn link_sub(&mut self, id: NodeId) -> bool {
        if self.subs.contains(&id) {
            return false;
        }
        self.subs.push(id);
        true
    }

    pub(crate) fn link_super(&mut self, id: NodeId) -> bool {
        if self.supers.contains(&id) {
            return false;
        }
        self.supers.push(id);
        true
    }

    pub(crate) fn unlink(&mut self, id: NodeId) {
        self.subs.retain(|&n| n != id);
        self.supers.retain(|&n| n != id);
    }

    /// Every concept registered on this node, visible or not
    pub(crate) fn all_members(&self) -> impl Iterator<Item = &ClassExpression> {
        self.equivalents.iter().chain(self.hidden_equivalents.iter())
    }
}
