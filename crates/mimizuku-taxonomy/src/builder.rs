//! タクソノミー構築 (分類と実現)

use crate::config::ClassifierConfig;
use crate::marks::{Marks, Propagation};
use crate::node::NodeId;
use crate::progress::{NoopProgress, ProgressMonitor};
use crate::taxonomy::Taxonomy;
use crate::told::ToldInformation;
use crate::TaxonomyError;
use mimizuku_core::model::{ClassExpression, Individual};
use mimizuku_core::{KnowledgeBase, Oracle, ReasonerError};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Which end of the taxonomy a search starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Looking for the most specific subsumers
    Top,
    /// Looking for the most general subsumees
    Bottom,
}

/// Builds the taxonomy of a knowledge base with as few oracle calls as it can.
///
/// One builder is one session: `classify` places every named class,
/// `realize` then assigns individuals their most specific types. Both
/// return `Ok(None)` when the listener cancels the build.
pub struct TaxonomyBuilder<'a, K: KnowledgeBase + ?Sized, O: Oracle> {
    kb: &'a K,
    oracle: O,
    config: ClassifierConfig,
    listener: Box<dyn ProgressMonitor + 'a>,
    told: Option<ToldInformation>,
    taxonomy: Option<Taxonomy>,
    realized: bool,
}

impl<'a, K: KnowledgeBase + ?Sized, O: Oracle> TaxonomyBuilder<'a, K, O> {
    pub fn new(kb: &'a K, oracle: O) -> Self {
        Self::with_config(kb, oracle, ClassifierConfig::default())
    }

    pub fn with_config(kb: &'a K, oracle: O, config: ClassifierConfig) -> Self {
        Self {
            kb,
            oracle,
            config,
            listener: Box::new(NoopProgress),
            told: None,
            taxonomy: None,
            realized: false,
        }
    }

    pub fn set_listener(&mut self, listener: impl ProgressMonitor + 'a) {
        self.listener = Box::new(listener);
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// The finished taxonomy, if `classify` has completed
    pub fn taxonomy(&self) -> Option<&Taxonomy> {
        self.taxonomy.as_ref()
    }

    /// The told-subsumer pre-hierarchy of the last `classify` run
    pub fn definition_order(&self) -> Option<&Taxonomy> {
        self.told.as_ref().map(|told| &told.definition_order)
    }

    pub fn into_taxonomy(self) -> Option<Taxonomy> {
        self.taxonomy
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    // ---------------------------------------------------------------------
    // Classification
    // ---------------------------------------------------------------------

    /// Place every named class of the knowledge base in a fresh taxonomy
    pub fn classify(&mut self) -> Result<Option<&Taxonomy>, TaxonomyError> {
        self.taxonomy = None;
        self.realized = false;

        let mut classes: Vec<ClassExpression> = Vec::new();
        for class in self.kb.classes() {
            if class.is_top() || class.is_bottom() {
                continue;
            }
            if !class.is_primitive() {
                warn!("skipping complex class {}: only named classes are classified", class);
                continue;
            }
            classes.push(class);
        }
        let wanted: BTreeSet<&ClassExpression> = classes.iter().collect();

        info!("classification: computing told information for {} classes", classes.len());
        let told = ToldInformation::compute(&classes, self.kb.axioms(), &self.config)?;
        let order: Vec<ClassExpression> = told
            .order()?
            .into_iter()
            .filter(|c| wanted.contains(c))
            .collect();
        // told equivalents share one search, so count definition-order nodes
        let mut seen = BTreeSet::new();
        let searches = order
            .iter()
            .filter(|c| match told.definition_order.node_id(c) {
                Some(id) => seen.insert(id),
                None => true,
            })
            .count();
        self.told = Some(told);

        self.listener.classification_started(searches);
        let mut taxonomy = Taxonomy::new();

        for class in &order {
            if taxonomy.contains(class) {
                continue;
            }
            if self.listener.is_canceled() {
                info!("classification canceled");
                return Ok(None);
            }
            self.listener.start_class(class);
            self.classify_class(&mut taxonomy, class)?;
        }

        self.listener.task_finished();
        info!(
            "classification finished: {} classes in {} nodes",
            classes.len(),
            taxonomy.node_count()
        );

        self.taxonomy = Some(taxonomy);
        Ok(self.taxonomy.as_ref())
    }

    fn classify_class(&mut self, taxonomy: &mut Taxonomy, class: &ClassExpression) -> Result<NodeId, TaxonomyError> {
        let node = self.place_class(taxonomy, class)?;

        if let Some(told) = &self.told {
            for equivalent in told.told_equivalents(class) {
                if !taxonomy.contains(&equivalent) {
                    taxonomy.add_equivalent_node(equivalent, node);
                }
            }
        }

        Ok(node)
    }

    fn place_class(&mut self, taxonomy: &mut Taxonomy, class: &ClassExpression) -> Result<NodeId, TaxonomyError> {
        let (top, bottom) = (taxonomy.top(), taxonomy.bottom());
        let told_bottom = self.told.as_ref().is_some_and(|told| told.is_told_bottom(class));
        let told_top = self.told.as_ref().is_some_and(|told| told.is_told_top(class));

        if told_bottom || !self.oracle.is_satisfiable(class)? {
            debug!("{} is unsatisfiable", class);
            taxonomy.add_equivalent_node(class.clone(), bottom);
            return Ok(bottom);
        }
        if told_top
            || (self.config.double_check_satisfiability && !self.oracle.is_satisfiable(&class.complement())?)
        {
            debug!("{} is equivalent to ⊤", class);
            taxonomy.add_equivalent_node(class.clone(), top);
            return Ok(top);
        }

        let supers = self.search(taxonomy, class, Direction::Top)?;

        if let &[only] = supers.as_slice() {
            let known_not_top = only == top && self.config.double_check_satisfiability;
            if !known_not_top && self.oracle.is_subclass_of(taxonomy.node(only).name(), class)? {
                debug!("{} is equivalent to {}", class, taxonomy.node(only).name());
                taxonomy.add_equivalent_node(class.clone(), only);
                return Ok(only);
            }
        }

        let subs = self.search(taxonomy, class, Direction::Bottom)?;

        let node = taxonomy.add_node(class.clone(), false);
        taxonomy.add_supers(node, &supers);
        taxonomy.add_subs(node, &subs);
        taxonomy.remove_multiple_paths(node);
        debug!(
            "{} placed below {} classes and above {}",
            class,
            supers.len(),
            subs.len()
        );
        Ok(node)
    }

    /// Collect the most specific subsumers (top search) or the most general
    /// subsumees (bottom search) of `class`. Successors of a node are only
    /// explored while the oracle keeps confirming them.
    fn search(&mut self, taxonomy: &Taxonomy, class: &ClassExpression, direction: Direction) -> Result<Vec<NodeId>, TaxonomyError> {
        let mut marks = Marks::new(taxonomy);
        let (top, bottom) = (taxonomy.top(), taxonomy.bottom());
        let start = match direction {
            Direction::Top => {
                marks.mark(taxonomy, top, true, Propagation::None)?;
                marks.mark(taxonomy, bottom, false, Propagation::None)?;
                top
            }
            Direction::Bottom => {
                marks.mark(taxonomy, bottom, true, Propagation::None)?;
                marks.mark(taxonomy, top, false, Propagation::None)?;
                bottom
            }
        };
        self.mark_told_subsumers(taxonomy, &mut marks, class, direction)?;
        self.mark_told_disjoints(taxonomy, &mut marks, class, direction)?;

        let mut found = Vec::new();
        let mut visited = BTreeSet::from([start]);
        let mut stack = vec![start];

        while let Some(n) = stack.pop() {
            let successors = match direction {
                Direction::Top => taxonomy.node(n).subs(),
                Direction::Bottom => taxonomy.node(n).supers(),
            };
            let mut extended = false;
            for &next in successors {
                if self.check(taxonomy, &mut marks, class, next, direction)? {
                    extended = true;
                    if visited.insert(next) {
                        stack.push(next);
                    }
                }
            }
            if !extended {
                found.push(n);
            }
        }

        Ok(found)
    }

    /// Memoized oracle test for one node, propagating the answer
    fn check(
        &mut self,
        taxonomy: &Taxonomy,
        marks: &mut Marks,
        class: &ClassExpression,
        node: NodeId,
        direction: Direction,
    ) -> Result<bool, TaxonomyError> {
        if let Some(known) = marks.get(node).to_bool() {
            return Ok(known);
        }

        let name = taxonomy.node(node).name();
        let (result, propagation) = match direction {
            Direction::Top => {
                let result = self.oracle.is_subclass_of(class, name)?;
                (result, if result { Propagation::Up } else { Propagation::Down })
            }
            Direction::Bottom => {
                let result = self.oracle.is_subclass_of(name, class)?;
                (result, if result { Propagation::Down } else { Propagation::Up })
            }
        };
        marks.mark(taxonomy, node, result, propagation)?;
        Ok(result)
    }

    /// Told subsumers already in the taxonomy subsume `class` (top search);
    /// told subsumees already in the taxonomy are below it (bottom search).
    fn mark_told_subsumers(
        &self,
        taxonomy: &Taxonomy,
        marks: &mut Marks,
        class: &ClassExpression,
        direction: Direction,
    ) -> Result<(), TaxonomyError> {
        let Some(told) = &self.told else {
            return Ok(());
        };
        let (related, propagation) = match direction {
            Direction::Top => (told.told_subsumers(class), Propagation::Up),
            Direction::Bottom => (told.told_subsumees(class), Propagation::Down),
        };
        for concept in &related {
            if let Some(n) = taxonomy.node_id(concept) {
                marks.mark(taxonomy, n, true, propagation)?;
            }
        }
        Ok(())
    }

    /// A class told disjoint from `class` (or from one of its told
    /// subsumers) neither subsumes it nor is subsumed by it, unless it is
    /// unsatisfiable.
    fn mark_told_disjoints(
        &self,
        taxonomy: &Taxonomy,
        marks: &mut Marks,
        class: &ClassExpression,
        direction: Direction,
    ) -> Result<(), TaxonomyError> {
        if !self.config.use_told_disjoints {
            return Ok(());
        }
        let propagation = match direction {
            Direction::Top => Propagation::Down,
            Direction::Bottom => Propagation::Up,
        };
        for n in self.told_disjoint_nodes(taxonomy, class) {
            marks.mark(taxonomy, n, false, propagation)?;
        }
        Ok(())
    }

    /// Satisfiable nodes told disjoint from `class` or from one of its
    /// told subsumers
    fn told_disjoint_nodes(&self, taxonomy: &Taxonomy, class: &ClassExpression) -> Vec<NodeId> {
        let Some(told) = &self.told else {
            return Vec::new();
        };
        let mut sources = told.told_subsumers(class);
        sources.push(class.clone());

        let mut nodes = Vec::new();
        for source in &sources {
            for disjoint in told.disjoints_of(source) {
                match taxonomy.node_id(disjoint) {
                    Some(n) if n != taxonomy.bottom() && !nodes.contains(&n) => nodes.push(n),
                    _ => {}
                }
            }
        }
        nodes
    }

    // ---------------------------------------------------------------------
    // Realization
    // ---------------------------------------------------------------------

    /// Assign every individual its most specific types, classifying first
    /// if needed
    pub fn realize(&mut self) -> Result<Option<&Taxonomy>, TaxonomyError> {
        if self.taxonomy.is_none() && self.classify()?.is_none() {
            return Ok(None);
        }
        let Some(mut taxonomy) = self.taxonomy.take() else {
            return Ok(None);
        };
        taxonomy.clear_instances();
        self.realized = false;

        let individuals = self.kb.individuals();
        self.listener.realization_started(individuals.len());
        info!("realization: {} individuals", individuals.len());

        for individual in &individuals {
            if self.listener.is_canceled() {
                info!("realization canceled");
                // the classification itself is complete and stays available
                taxonomy.clear_instances();
                self.taxonomy = Some(taxonomy);
                return Ok(None);
            }
            self.listener.start_individual(individual);
            self.realize_individual(&mut taxonomy, individual)?;
        }

        self.listener.task_finished();
        info!("realization finished");

        self.realized = true;
        self.taxonomy = Some(taxonomy);
        Ok(self.taxonomy.as_ref())
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    fn realize_individual(&mut self, taxonomy: &mut Taxonomy, individual: &Individual) -> Result<(), TaxonomyError> {
        let mut marks = Marks::new(taxonomy);
        let (top, bottom) = (taxonomy.top(), taxonomy.bottom());
        marks.mark(taxonomy, top, true, Propagation::None)?;
        marks.mark(taxonomy, bottom, false, Propagation::None)?;

        if self.config.realize_with_obvious_types {
            self.mark_obvious_types(taxonomy, &mut marks, individual)
                .map_err(|e| match e {
                    TaxonomyError::ConflictingMark { concept, .. } => ReasonerError::Inconsistent(format!(
                        "asserted types of {} contradict each other on {}",
                        individual, concept
                    ))
                    .into(),
                    other => other,
                })?;
        }

        let mut recorded = vec![None; taxonomy.arena_len()];
        self.realize_node(taxonomy, &mut marks, &mut recorded, individual, top)?;
        Ok(())
    }

    fn mark_obvious_types(&self, taxonomy: &Taxonomy, marks: &mut Marks, individual: &Individual) -> Result<(), TaxonomyError> {
        let (types, non_types) = self.kb.obvious_types(individual);
        let types: BTreeSet<ClassExpression> = types.into_iter().collect();
        let non_types: BTreeSet<ClassExpression> = non_types.into_iter().collect();

        for class in &types {
            let Some(n) = taxonomy.node_id(class) else {
                warn!("obvious type {} of {} is not in the taxonomy", class, individual);
                continue;
            };
            if n == taxonomy.bottom() {
                return Err(ReasonerError::Inconsistent(format!(
                    "{} is asserted to be an instance of unsatisfiable class {}",
                    individual, class
                ))
                .into());
            }
            marks.mark(taxonomy, n, true, Propagation::Up)?;

            if self.config.use_told_disjoints {
                for m in self.told_disjoint_nodes(taxonomy, class) {
                    marks.mark(taxonomy, m, false, Propagation::Down)?;
                }
            }
        }

        for class in &non_types {
            if let Some(n) = taxonomy.node_id(class) {
                marks.mark(taxonomy, n, false, Propagation::Down)?;
            }
        }

        Ok(())
    }

    /// Whether `individual` belongs to `node` or to anything below it.
    /// Records the individual at every node that holds it but none of
    /// whose subs do. Every sub is visited so that all most specific
    /// types are found.
    fn realize_node(
        &mut self,
        taxonomy: &mut Taxonomy,
        marks: &mut Marks,
        recorded: &mut [Option<bool>],
        individual: &Individual,
        node: NodeId,
    ) -> Result<bool, TaxonomyError> {
        if node == taxonomy.bottom() {
            return Ok(false);
        }
        if let Some(result) = recorded[node.index()] {
            return Ok(result);
        }

        let is_type = match marks.get(node).to_bool() {
            Some(known) => known,
            None => {
                let result = self.oracle.is_type(individual, taxonomy.node(node).name())?;
                let propagation = if result { Propagation::Up } else { Propagation::Down };
                marks.mark(taxonomy, node, result, propagation)?;
                result
            }
        };
        if !is_type {
            recorded[node.index()] = Some(false);
            return Ok(false);
        }

        let subs = taxonomy.node(node).subs().to_vec();
        let mut below = false;
        for sub in subs {
            below |= self.realize_node(taxonomy, marks, recorded, individual, sub)?;
        }
        if !below && !taxonomy.node(node).is_hidden() {
            taxonomy.add_instance(node, individual.clone());
        }

        recorded[node.index()] = Some(true);
        Ok(true)
    }
}
