//! 構文的に読み取れる包摂関係 (told subsumers) の前処理

use crate::config::ClassifierConfig;
use crate::node::NodeId;
use crate::taxonomy::Taxonomy;
use crate::TaxonomyError;
use mimizuku_core::model::{Axiom, ClassExpression};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Everything the axiom scan learns without asking the oracle.
///
/// The definition order is a throwaway taxonomy: it keeps every node linked
/// directly below ⊤ and above ⊥ and never prunes shortcut edges, so it is
/// only good for ordering and for seeding marks.
#[derive(Debug, Clone)]
pub(crate) struct ToldInformation {
    pub(crate) definition_order: Taxonomy,
    told_disjoints: HashMap<ClassExpression, BTreeSet<ClassExpression>>,
    /// `c ⊑ A ⊔ B ⊔ ...`, resolved once the scan is complete
    union_classes: BTreeMap<ClassExpression, Vec<Vec<ClassExpression>>>,
    /// Complex expressions told equivalent to a named class
    told_definitions: HashMap<ClassExpression, BTreeSet<ClassExpression>>,
    config: ClassifierConfig,
}

impl ToldInformation {
    pub(crate) fn compute(
        classes: &[ClassExpression],
        axioms: &[Axiom],
        config: &ClassifierConfig,
    ) -> Result<Self, TaxonomyError> {
        let mut told = Self {
            definition_order: Taxonomy::new(),
            told_disjoints: HashMap::new(),
            union_classes: BTreeMap::new(),
            told_definitions: HashMap::new(),
            config: config.clone(),
        };

        for class in classes {
            told.told_node(class);
        }

        for axiom in axioms {
            match axiom {
                Axiom::SubClassOf(c, d) => told.add_told_relation(c, d, false)?,
                Axiom::EquivalentClasses(c, d) => {
                    told.add_told_relation(c, d, true)?;
                    told.add_told_relation(d, c, true)?;
                }
            }
        }

        told.resolve_union_classes()?;

        info!(
            "told information: {} definition-order nodes, {} classes with told disjoints, {} union classes",
            told.definition_order.node_count(),
            told.told_disjoints.len(),
            told.union_classes.len()
        );
        Ok(told)
    }

    /// Processing order for classification, most general first
    pub(crate) fn order(&self) -> Result<Vec<ClassExpression>, TaxonomyError> {
        self.definition_order.topological_sort()
    }

    pub(crate) fn is_told_bottom(&self, class: &ClassExpression) -> bool {
        self.definition_order.node_id(class) == Some(self.definition_order.bottom())
    }

    pub(crate) fn is_told_top(&self, class: &ClassExpression) -> bool {
        self.definition_order.node_id(class) == Some(self.definition_order.top())
    }

    /// Concepts syntactically known to subsume `class`
    pub(crate) fn told_subsumers(&self, class: &ClassExpression) -> Vec<ClassExpression> {
        match self.definition_order.node_id(class) {
            Some(id) => self.members_of(self.definition_order.ancestors(id)),
            None => Vec::new(),
        }
    }

    /// Concepts syntactically known to be subsumed by `class`
    pub(crate) fn told_subsumees(&self, class: &ClassExpression) -> Vec<ClassExpression> {
        match self.definition_order.node_id(class) {
            Some(id) => self.members_of(self.definition_order.descendants(id)),
            None => Vec::new(),
        }
    }

    /// Other concepts syntactically known to be equivalent to `class`,
    /// named ones first, then complex definitions
    pub(crate) fn told_equivalents(&self, class: &ClassExpression) -> Vec<ClassExpression> {
        let mut equivalents = Vec::new();
        if let Some(id) = self.definition_order.node_id(class) {
            equivalents.extend(
                self.definition_order
                    .node(id)
                    .equivalents()
                    .iter()
                    .filter(|&c| c != class && !c.is_top() && !c.is_bottom())
                    .cloned(),
            );
        }
        if let Some(definitions) = self.told_definitions.get(class) {
            equivalents.extend(definitions.iter().cloned());
        }
        equivalents
    }

    pub(crate) fn disjoints_of(&self, class: &ClassExpression) -> impl Iterator<Item = &ClassExpression> {
        self.told_disjoints.get(class).into_iter().flatten()
    }

    fn members_of(&self, ids: impl IntoIterator<Item = NodeId>) -> Vec<ClassExpression> {
        ids.into_iter()
            .flat_map(|id| self.definition_order.node(id).equivalents().iter().cloned())
            .collect()
    }

    /// Node of `class` in the definition order, registering it between
    /// ⊤ and ⊥ on first sight
    fn told_node(&mut self, class: &ClassExpression) -> NodeId {
        if let Some(id) = self.definition_order.node_id(class) {
            return id;
        }
        let order = &mut self.definition_order;
        let (top, bottom) = (order.top(), order.bottom());
        let id = order.add_node(class.clone(), false);
        order.add_sub(top, id);
        order.add_sub(id, bottom);
        id
    }

    fn add_told_relation(&mut self, c: &ClassExpression, d: &ClassExpression, equivalent: bool) -> Result<(), TaxonomyError> {
        if c.is_primitive() {
            match d {
                ClassExpression::Named(_) if equivalent => self.merge_told(c, d)?,
                ClassExpression::Named(_) => self.add_told_subsumer(c, d)?,
                ClassExpression::Nothing => self.merge_told(c, d)?,
                ClassExpression::Thing if equivalent => self.merge_told(c, d)?,
                ClassExpression::Thing => {}
                ClassExpression::IntersectionOf(conjuncts) => {
                    for conjunct in conjuncts {
                        self.add_told_relation(c, conjunct, false)?;
                    }
                }
                ClassExpression::UnionOf(disjuncts) => {
                    if disjuncts.iter().all(|p| p.is_primitive()) {
                        if equivalent {
                            for disjunct in disjuncts {
                                self.add_told_subsumer(disjunct, c)?;
                            }
                        }
                        self.add_union_class(c, disjuncts);
                    }
                }
                ClassExpression::ComplementOf(_) => {
                    if let Some(q) = d.negated_primitive() {
                        self.add_told_disjoint(c, q)?;
                    }
                }
            }

            if equivalent && !d.is_primitive() && !d.is_top() && !d.is_bottom() {
                self.told_definitions.entry(c.clone()).or_default().insert(d.clone());
            }
        } else if let Some(disjuncts) = c.disjuncts() {
            if disjuncts.iter().all(|p| p.is_primitive()) {
                for disjunct in disjuncts {
                    self.add_told_relation(disjunct, d, false)?;
                }
            }
        } else if let Some(p) = c.negated_primitive() {
            // ¬p ≡ d; ¬p ⊑ d says nothing about disjointness
            if equivalent && d.is_primitive() {
                self.add_told_disjoint(p, d)?;
            }
        }

        Ok(())
    }

    fn add_told_subsumer(&mut self, c: &ClassExpression, d: &ClassExpression) -> Result<(), TaxonomyError> {
        if !self.config.use_told_subsumers {
            return Ok(());
        }
        let c_node = self.told_node(c);
        let d_node = self.told_node(d);
        let order = &self.definition_order;

        if c_node == d_node || c_node == order.bottom() || d_node == order.top() {
            return Ok(());
        }
        if d_node == order.bottom() {
            return self.merge_told(c, &ClassExpression::Nothing);
        }
        if c_node == order.top() {
            return self.merge_told(d, &ClassExpression::Thing);
        }

        self.definition_order.add_sub(d_node, c_node);
        self.definition_order.remove_cycles(c_node)?;
        Ok(())
    }

    /// Told equivalence. Merging into ⊥ drags every told descendant along,
    /// merging into ⊤ every told ancestor.
    fn merge_told(&mut self, c: &ClassExpression, d: &ClassExpression) -> Result<(), TaxonomyError> {
        if !self.config.use_told_subsumers {
            return Ok(());
        }
        let a = self.told_node(c);
        let b = self.told_node(d);
        if a == b {
            return Ok(());
        }

        let order = &self.definition_order;
        let (top, bottom) = (order.top(), order.bottom());
        let mut members = vec![a, b];
        if a == bottom || b == bottom {
            let other = if a == bottom { b } else { a };
            members.extend(order.descendants(other).into_iter().filter(|&n| n != bottom));
        } else if a == top || b == top {
            let other = if a == top { b } else { a };
            members.extend(order.ancestors(other).into_iter().filter(|&n| n != top));
        }

        let survivor = self.definition_order.merge(&members)?;
        self.definition_order.remove_cycles(survivor)?;
        debug!("told equivalence: {} ≡ {}", c, d);
        Ok(())
    }

    fn add_told_disjoint(&mut self, c: &ClassExpression, d: &ClassExpression) -> Result<(), TaxonomyError> {
        if c == d {
            // A ⊑ ¬A
            return self.merge_told(c, &ClassExpression::Nothing);
        }
        if !self.config.use_told_disjoints {
            return Ok(());
        }
        self.told_disjoints.entry(c.clone()).or_default().insert(d.clone());
        self.told_disjoints.entry(d.clone()).or_default().insert(c.clone());
        Ok(())
    }

    fn add_union_class(&mut self, c: &ClassExpression, disjuncts: &[ClassExpression]) {
        if !self.config.use_told_subsumers || !self.config.resolve_union_subsumers {
            return;
        }
        self.told_node(c);
        for disjunct in disjuncts {
            self.told_node(disjunct);
        }
        self.union_classes.entry(c.clone()).or_default().push(disjuncts.to_vec());
    }

    /// Whatever every disjunct is told to fall under, the union does too
    fn resolve_union_classes(&mut self) -> Result<(), TaxonomyError> {
        let union_classes = std::mem::take(&mut self.union_classes);

        for (c, unions) in &union_classes {
            for disjuncts in unions {
                let lca = self.definition_order.compute_lca(disjuncts)?;
                for subsumer in lca {
                    let same_node = self.definition_order.node_id(&subsumer) == self.definition_order.node_id(c);
                    if subsumer.is_top() || same_node {
                        continue;
                    }
                    debug!("union subsumer: {} ⊑ {}", c, subsumer);
                    self.add_told_subsumer(c, &subsumer)?;
                }
            }
        }

        self.union_classes = union_classes;
        Ok(())
    }
}
