//! 包摂階層 (タクソノミー)

use crate::node::{NodeId, TaxonomyNode};
use crate::TaxonomyError;
use mimizuku_core::model::{ClassExpression, Individual};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Subsumption DAG over equivalence classes of concepts.
///
/// Nodes live in an arena addressed by [`NodeId`]; merging tombstones the
/// absorbed nodes instead of freeing them, so handles stay valid (but may
/// point at a removed node) for the lifetime of the taxonomy.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    nodes: Vec<TaxonomyNode>,
    index: HashMap<ClassExpression, NodeId>,
    top: NodeId,
    bottom: NodeId,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new()
    }
}

impl Taxonomy {
    /// Create a taxonomy holding only ⊤ above ⊥
    pub fn new() -> Self {
        let mut taxonomy = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            top: NodeId(0),
            bottom: NodeId(1),
        };
        taxonomy.top = taxonomy.add_node(ClassExpression::Thing, false);
        taxonomy.bottom = taxonomy.add_node(ClassExpression::Nothing, false);
        taxonomy.add_sub(taxonomy.top, taxonomy.bottom);
        taxonomy
    }

    pub fn top(&self) -> NodeId {
        self.top
    }

    pub fn bottom(&self) -> NodeId {
        self.bottom
    }

    pub fn node(&self, id: NodeId) -> &TaxonomyNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TaxonomyNode {
        &mut self.nodes[id.0]
    }

    /// Arena size, including tombstones
    pub(crate) fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_id(&self, class: &ClassExpression) -> Option<NodeId> {
        self.index.get(class).copied()
    }

    pub fn contains(&self, class: &ClassExpression) -> bool {
        self.index.contains_key(class)
    }

    pub(crate) fn require(&self, class: &ClassExpression) -> Result<NodeId, TaxonomyError> {
        self.node_id(class)
            .ok_or_else(|| TaxonomyError::UnknownConcept(class.clone()))
    }

    /// Live (non-merged) nodes
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TaxonomyNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.removed)
            .map(|(i, node)| (NodeId(i), node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Register `class` as a new, unconnected node. A class that is
    /// already registered keeps its node.
    pub fn add_node(&mut self, class: ClassExpression, hide: bool) -> NodeId {
        if let Some(id) = self.node_id(&class) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(TaxonomyNode::new(class.clone(), hide));
        self.index.insert(class, id);
        id
    }

    /// Register `class` as one more member of `node`'s equivalence class
    pub fn add_equivalent_node(&mut self, class: ClassExpression, node: NodeId) {
        self.node_mut(node).add_equivalent(class.clone());
        self.index.insert(class, node);
    }

    /// Link `child` below `parent`. The back edge is only recorded when
    /// `parent` is visible.
    pub fn add_sub(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.node_mut(parent).link_sub(child) {
            return;
        }
        if !self.node(parent).hidden {
            self.node_mut(child).link_super(parent);
        }
    }

    pub fn add_subs(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            self.add_sub(parent, child);
        }
    }

    pub fn add_supers(&mut self, child: NodeId, parents: &[NodeId]) {
        for &parent in parents {
            self.add_sub(parent, child);
        }
    }

    pub fn remove_sub(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).subs.retain(|&n| n != child);
        self.node_mut(child).supers.retain(|&n| n != parent);
    }

    /// Remove every edge touching `id`
    pub fn disconnect(&mut self, id: NodeId) {
        for node in &mut self.nodes {
            node.unlink(id);
        }
        let node = self.node_mut(id);
        node.subs.clear();
        node.supers.clear();
    }

    /// Drop the direct edges between this node's supers and subs, which are
    /// now shortcuts through this node.
    pub fn remove_multiple_paths(&mut self, id: NodeId) {
        if self.node(id).hidden {
            return;
        }
        let supers = self.node(id).supers.clone();
        let subs = self.node(id).subs.clone();
        for &sup in &supers {
            for &sub in &subs {
                if self.node(sup).subs.contains(&sub) {
                    self.remove_sub(sup, sub);
                }
            }
        }
    }

    pub fn add_instance(&mut self, id: NodeId, individual: Individual) {
        self.node_mut(id).add_instance(individual);
    }

    pub fn clear_instances(&mut self) {
        for node in &mut self.nodes {
            node.instances = None;
        }
    }

    // ---------------------------------------------------------------------
    // Merging and cycles
    // ---------------------------------------------------------------------

    /// Collapse `ids` into one equivalence class and return the survivor.
    ///
    /// ⊤ or ⊥ survive when they take part, otherwise the first node does.
    /// Edges between members of the merge set are dropped.
    pub fn merge(&mut self, ids: &[NodeId]) -> Result<NodeId, TaxonomyError> {
        let mut members: Vec<NodeId> = Vec::new();
        for &id in ids {
            if !self.node(id).removed && !members.contains(&id) {
                members.push(id);
            }
        }
        let first = *members.first().ok_or(TaxonomyError::EmptyMerge)?;

        let has_top = members.contains(&self.top);
        let has_bottom = members.contains(&self.bottom);
        if has_top && has_bottom {
            return Err(TaxonomyError::InconsistentMerge);
        }
        let survivor = if has_top {
            self.top
        } else if has_bottom {
            self.bottom
        } else {
            first
        };

        for &victim in members.iter().filter(|&&m| m != survivor) {
            let supers = self.node(victim).supers.clone();
            let subs = self.node(victim).subs.clone();
            for sup in supers.into_iter().filter(|n| !members.contains(n)) {
                self.add_sub(sup, survivor);
            }
            for sub in subs.into_iter().filter(|n| !members.contains(n)) {
                self.add_sub(survivor, sub);
            }

            let victim_node = self.node_mut(victim);
            let equivalents = std::mem::take(&mut victim_node.equivalents);
            let hidden_equivalents = std::mem::take(&mut victim_node.hidden_equivalents);
            let instances = victim_node.instances.take();
            let victim_hidden = victim_node.hidden;

            for class in equivalents.into_iter().chain(hidden_equivalents) {
                self.add_equivalent_node(class, survivor);
            }
            for individual in instances.into_iter().flatten() {
                self.add_instance(survivor, individual);
            }
            if !victim_hidden {
                self.node_mut(survivor).hidden = false;
            }

            self.disconnect(victim);
            self.node_mut(victim).removed = true;
        }

        debug!("merged {} nodes into {}", members.len(), self.node(survivor).name);
        Ok(survivor)
    }

    /// Merge every cycle reachable upwards from `id`, returning the node
    /// that holds `id`'s concept afterwards.
    pub fn remove_cycles(&mut self, id: NodeId) -> Result<NodeId, TaxonomyError> {
        let name = self.node(id).name.clone();
        let mut current = id;

        while let Some(cycle) = self.find_cycle(current) {
            if cycle.len() < 2 {
                return Err(TaxonomyError::UnresolvableCycle(name));
            }
            let before = self.node_count();
            self.merge(&cycle)?;
            if self.node_count() >= before {
                return Err(TaxonomyError::UnresolvableCycle(name));
            }
            // the walk restarts from wherever the concept lives now
            current = self.require(&name)?;
        }

        Ok(current)
    }

    /// Depth-first walk over `supers` keeping the current path on an
    /// explicit stack. Returns the path segment closing the first cycle found.
    fn find_cycle(&self, start: NodeId) -> Option<Vec<NodeId>> {
        let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
        let mut on_path: HashSet<NodeId> = HashSet::from([start]);
        let mut finished: HashSet<NodeId> = HashSet::new();

        while let Some(&(node, cursor)) = stack.last() {
            let supers = &self.node(node).supers;
            if cursor < supers.len() {
                let next = supers[cursor];
                let depth = stack.len() - 1;
                stack[depth].1 += 1;
                if on_path.contains(&next) {
                    let pos = stack.iter().position(|&(n, _)| n == next)?;
                    return Some(stack[pos..].iter().map(|&(n, _)| n).collect());
                }
                if !finished.contains(&next) {
                    on_path.insert(next);
                    stack.push((next, 0));
                }
            } else {
                stack.pop();
                on_path.remove(&node);
                finished.insert(node);
            }
        }

        None
    }

    // ---------------------------------------------------------------------
    // Orderings
    // ---------------------------------------------------------------------

    /// Kahn's algorithm from ⊤; every member of each node is emitted when
    /// the node is drained.
    ///
    /// Edges are read from the `supers` side, so a hidden parent does not
    /// hold back its children.
    pub fn topological_sort(&self) -> Result<Vec<ClassExpression>, TaxonomyError> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); self.nodes.len()];
        for (id, node) in self.nodes() {
            in_degree[id.0] = node.supers.len();
            for &sup in &node.supers {
                children[sup.0].push(id);
            }
        }

        let seeds: Vec<NodeId> = self
            .nodes()
            .filter(|(id, _)| in_degree[id.0] == 0)
            .map(|(id, _)| id)
            .collect();
        if seeds != [self.top] {
            return Err(TaxonomyError::MultipleRoots(seeds.len()));
        }

        let mut queue: VecDeque<NodeId> = VecDeque::from(seeds);
        let mut order = Vec::new();
        let mut processed = 0;

        while let Some(id) = queue.pop_front() {
            processed += 1;
            let node = self.node(id);
            order.push(node.name.clone());
            order.extend(node.all_members().filter(|&c| *c != node.name).cloned());

            for &child in &children[id.0] {
                in_degree[child.0] -= 1;
                if in_degree[child.0] == 0 {
                    queue.push_back(child);
                }
            }
        }

        let total = self.node_count();
        if processed < total {
            return Err(TaxonomyError::CycleDetected {
                remaining: total - processed,
            });
        }

        Ok(order)
    }

    /// Strict ancestors of a node
    pub(crate) fn ancestors(&self, id: NodeId) -> HashSet<NodeId> {
        self.reachable(id, |node| &node.supers)
    }

    /// Strict descendants of a node
    pub(crate) fn descendants(&self, id: NodeId) -> HashSet<NodeId> {
        self.reachable(id, |node| &node.subs)
    }

    fn reachable<F>(&self, id: NodeId, next: F) -> HashSet<NodeId>
    where
        F: Fn(&TaxonomyNode) -> &Vec<NodeId>,
    {
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = next(self.node(id)).clone();
        while let Some(n) = stack.pop() {
            if seen.insert(n) {
                stack.extend(next(self.node(n)).iter().copied());
            }
        }
        seen
    }

    /// Least common ancestors of `classes`: the most specific nodes that
    /// are strict ancestors of every class. ⊤ counts as its own ancestor.
    pub fn compute_lca(&self, classes: &[ClassExpression]) -> Result<BTreeSet<ClassExpression>, TaxonomyError> {
        let mut iter = classes.iter();
        let first = match iter.next() {
            Some(class) => class,
            None => return Ok(BTreeSet::new()),
        };

        let mut common = self.lca_ancestors(self.require(first)?);
        for class in iter {
            if common.len() == 1 && common.contains(&self.top) {
                break;
            }
            let ancestors = self.lca_ancestors(self.require(class)?);
            common.retain(|n| ancestors.contains(n));
        }

        let candidates: Vec<NodeId> = common
            .into_iter()
            .filter(|&n| !self.node(n).hidden)
            .collect();

        let mut lca = BTreeSet::new();
        for &candidate in &candidates {
            let above_another = candidates
                .iter()
                .any(|&other| other != candidate && self.ancestors(other).contains(&candidate));
            if !above_another {
                lca.extend(self.node(candidate).equivalents.iter().cloned());
            }
        }

        Ok(lca)
    }

    fn lca_ancestors(&self, id: NodeId) -> HashSet<NodeId> {
        if id == self.top {
            HashSet::from([self.top])
        } else {
            self.ancestors(id)
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Visible nodes below `id`. Hidden nodes are walked through but never
    /// returned; `direct` stops at the first visible layer of each branch.
    pub(crate) fn collect_subs(&self, id: NodeId, direct: bool) -> Vec<NodeId> {
        self.collect(id, direct, |node| &node.subs)
    }

    pub(crate) fn collect_supers(&self, id: NodeId, direct: bool) -> Vec<NodeId> {
        self.collect(id, direct, |node| &node.supers)
    }

    fn collect<F>(&self, id: NodeId, direct: bool, next: F) -> Vec<NodeId>
    where
        F: Fn(&TaxonomyNode) -> &Vec<NodeId>,
    {
        let mut result = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::from([id]);
        let mut queue: VecDeque<NodeId> = next(self.node(id)).iter().copied().collect();

        while let Some(n) = queue.pop_front() {
            if !visited.insert(n) {
                continue;
            }
            let node = self.node(n);
            if node.hidden {
                queue.extend(next(node).iter().copied());
                continue;
            }
            result.push(n);
            if !direct {
                queue.extend(next(node).iter().copied());
            }
        }

        result
    }

    /// Sub classes of `class`, one set per equivalence class
    pub fn get_subs(&self, class: &ClassExpression, direct: bool) -> Result<Vec<BTreeSet<ClassExpression>>, TaxonomyError> {
        let id = self.require(class)?;
        Ok(self
            .collect_subs(id, direct)
            .into_iter()
            .map(|n| self.node(n).equivalents.clone())
            .collect())
    }

    pub fn get_flattened_subs(&self, class: &ClassExpression, direct: bool) -> Result<BTreeSet<ClassExpression>, TaxonomyError> {
        Ok(self.get_subs(class, direct)?.into_iter().flatten().collect())
    }

    /// Super classes of `class`, one set per equivalence class
    pub fn get_supers(&self, class: &ClassExpression, direct: bool) -> Result<Vec<BTreeSet<ClassExpression>>, TaxonomyError> {
        let id = self.require(class)?;
        Ok(self
            .collect_supers(id, direct)
            .into_iter()
            .map(|n| self.node(n).equivalents.clone())
            .collect())
    }

    pub fn get_flattened_supers(&self, class: &ClassExpression, direct: bool) -> Result<BTreeSet<ClassExpression>, TaxonomyError> {
        Ok(self.get_supers(class, direct)?.into_iter().flatten().collect())
    }

    /// Visible equivalents of `class`, excluding `class` itself
    pub fn get_equivalents(&self, class: &ClassExpression) -> Result<BTreeSet<ClassExpression>, TaxonomyError> {
        let mut equivalents = self.get_all_equivalents(class)?;
        equivalents.remove(class);
        Ok(equivalents)
    }

    /// Visible equivalents of `class`, including `class` itself
    pub fn get_all_equivalents(&self, class: &ClassExpression) -> Result<BTreeSet<ClassExpression>, TaxonomyError> {
        let id = self.require(class)?;
        let mut equivalents = self.node(id).equivalents.clone();
        equivalents.insert(class.clone());
        Ok(equivalents)
    }

    pub fn is_equivalent(&self, a: &ClassExpression, b: &ClassExpression) -> Result<bool, TaxonomyError> {
        Ok(self.require(a)? == self.require(b)?)
    }

    /// `a ⊑ b` according to the taxonomy
    pub fn is_sub_node_of(&self, a: &ClassExpression, b: &ClassExpression) -> Result<bool, TaxonomyError> {
        let a = self.require(a)?;
        let b = self.require(b)?;
        Ok(a == b || self.ancestors(a).contains(&b))
    }

    /// Instances of `class`; with `direct` only those whose most specific
    /// type is `class`
    pub fn get_instances(&self, class: &ClassExpression, direct: bool) -> Result<BTreeSet<Individual>, TaxonomyError> {
        let id = self.require(class)?;
        let mut instances: BTreeSet<Individual> = self.node(id).instances().cloned().collect();
        if !direct {
            for n in self.descendants(id) {
                instances.extend(self.node(n).instances().cloned());
            }
        }
        Ok(instances)
    }

    /// Types of an individual, one set per equivalence class. `direct`
    /// restricts the answer to the most specific types.
    pub fn get_types(&self, individual: &Individual, direct: bool) -> Vec<BTreeSet<ClassExpression>> {
        let mut holders: Vec<NodeId> = self
            .nodes()
            .filter(|(_, node)| node.has_instance(individual))
            .map(|(id, _)| id)
            .collect();

        if !direct {
            let mut all: BTreeSet<NodeId> = holders.iter().copied().collect();
            for &holder in &holders {
                all.extend(self.ancestors(holder));
            }
            holders = all.into_iter().collect();
        }

        holders
            .into_iter()
            .filter(|&id| !self.node(id).hidden)
            .map(|id| self.node(id).equivalents.clone())
            .collect()
    }

    /// Every visible concept in the taxonomy
    pub fn classes(&self) -> BTreeSet<ClassExpression> {
        self.nodes()
            .filter(|(_, node)| !node.hidden)
            .flat_map(|(_, node)| node.equivalents.iter().cloned())
            .collect()
    }

    /// Every individual placed by realization
    pub fn individuals(&self) -> BTreeSet<Individual> {
        self.nodes()
            .flat_map(|(_, node)| node.instances().cloned())
            .collect()
    }
}
