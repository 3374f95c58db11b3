//! 参照リーナー

use crate::tableau::TableauReasoner;
use mimizuku_core::model::{Assertion, ClassExpression, Individual, Ontology};
use mimizuku_core::{Oracle, ReasonerError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Number of decision-procedure calls answered, by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleStats {
    pub satisfiability: usize,
    pub subsumption: usize,
    pub instance: usize,
    /// Tableau runs actually performed (cache misses)
    pub tableau_runs: usize,
}

impl OracleStats {
    pub fn total(&self) -> usize {
        self.satisfiability + self.subsumption + self.instance
    }
}

/// Decision procedure for an [`Ontology`] over the role-free fragment
pub struct LiteReasoner {
    tableau: TableauReasoner,
    /// Asserted classes per individual
    assertions: HashMap<Individual, Vec<ClassExpression>>,
    sat_cache: HashMap<ClassExpression, bool>,
    stats: OracleStats,
}

impl LiteReasoner {
    pub fn new(ontology: &Ontology) -> Self {
        let mut assertions: HashMap<Individual, Vec<ClassExpression>> = HashMap::new();
        for individual in &ontology.individuals {
            assertions.entry(individual.clone()).or_default();
        }
        for assertion in &ontology.assertions {
            match assertion {
                Assertion::ClassAssertion(class, individual) => {
                    assertions.entry(individual.clone()).or_default().push(class.clone());
                }
            }
        }

        Self {
            tableau: TableauReasoner::new(&ontology.axioms),
            assertions,
            sat_cache: HashMap::new(),
            stats: OracleStats::default(),
        }
    }

    pub fn stats(&self) -> OracleStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = OracleStats::default();
    }

    /// Check if the ontology is consistent: the TBox admits a model and every
    /// individual's asserted classes are jointly satisfiable
    pub fn is_consistent(&mut self) -> bool {
        if !self.satisfiable(ClassExpression::Thing) {
            return false;
        }
        let individuals: Vec<Individual> = self.assertions.keys().cloned().collect();
        individuals.iter().all(|individual| {
            let description = self.description_of(individual);
            self.satisfiable(description)
        })
    }

    fn description_of(&self, individual: &Individual) -> ClassExpression {
        match self.assertions.get(individual) {
            Some(classes) if !classes.is_empty() => ClassExpression::and(classes.clone()),
            _ => ClassExpression::Thing,
        }
    }

    fn satisfiable(&mut self, class: ClassExpression) -> bool {
        let key = class.to_nnf();
        if let Some(&cached) = self.sat_cache.get(&key) {
            return cached;
        }
        self.stats.tableau_runs += 1;
        let result = self.tableau.is_satisfiable(std::slice::from_ref(&key));
        debug!("tableau: {} is {}", key, if result { "satisfiable" } else { "unsatisfiable" });
        self.sat_cache.insert(key, result);
        result
    }
}

impl Oracle for LiteReasoner {
    fn is_satisfiable(&mut self, class: &ClassExpression) -> Result<bool, ReasonerError> {
        self.stats.satisfiability += 1;
        Ok(self.satisfiable(class.clone()))
    }

    fn is_subclass_of(&mut self, sub: &ClassExpression, sup: &ClassExpression) -> Result<bool, ReasonerError> {
        self.stats.subsumption += 1;
        if sub == sup || sub.is_bottom() || sup.is_top() {
            return Ok(true);
        }
        Ok(!self.satisfiable(ClassExpression::and(vec![sub.clone(), sup.complement()])))
    }

    fn is_type(&mut self, individual: &Individual, class: &ClassExpression) -> Result<bool, ReasonerError> {
        self.stats.instance += 1;
        if !self.assertions.contains_key(individual) {
            return Err(ReasonerError::UnknownIndividual(individual.clone()));
        }

        let description = self.description_of(individual);
        if !self.satisfiable(description.clone()) {
            return Err(ReasonerError::Inconsistent(format!(
                "individual {} has unsatisfiable asserted types {}",
                individual, description
            )));
        }

        Ok(!self.satisfiable(ClassExpression::and(vec![description, class.complement()])))
    }
}
