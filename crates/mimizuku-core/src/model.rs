//! 概念・公理・知識ベースのデータモデル

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// IRI wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(pub String);

impl Iri {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class expression over the boolean constructors.
///
/// This is the concept identifier the taxonomy is built over: two
/// expressions denote the same concept id iff they are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ClassExpression {
    /// owl:Thing (⊤)
    Thing,

    /// owl:Nothing (⊥)
    Nothing,

    /// Named (primitive) class
    Named(Iri),

    /// Intersection of classes: C1 ⊓ C2 ⊓ ... ⊓ Cn
    IntersectionOf(Vec<ClassExpression>),

    /// Union of classes: C1 ⊔ C2 ⊔ ... ⊔ Cn
    UnionOf(Vec<ClassExpression>),

    /// Complement of class: ¬C
    ComplementOf(Box<ClassExpression>),
}

impl ClassExpression {
    pub fn named(iri: impl Into<String>) -> Self {
        ClassExpression::Named(Iri::new(iri))
    }

    pub fn and(operands: Vec<ClassExpression>) -> Self {
        ClassExpression::IntersectionOf(operands)
    }

    pub fn or(operands: Vec<ClassExpression>) -> Self {
        ClassExpression::UnionOf(operands)
    }

    pub fn not(operand: ClassExpression) -> Self {
        ClassExpression::ComplementOf(Box::new(operand))
    }

    pub fn is_top(&self) -> bool {
        matches!(self, ClassExpression::Thing)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, ClassExpression::Nothing)
    }

    /// Named classes are the only primitive concepts.
    pub fn is_primitive(&self) -> bool {
        matches!(self, ClassExpression::Named(_))
    }

    pub fn iri(&self) -> Option<&Iri> {
        match self {
            ClassExpression::Named(iri) => Some(iri),
            _ => None,
        }
    }

    /// Operands if this is a conjunction
    pub fn conjuncts(&self) -> Option<&[ClassExpression]> {
        match self {
            ClassExpression::IntersectionOf(operands) => Some(operands),
            _ => None,
        }
    }

    /// Operands if this is a disjunction
    pub fn disjuncts(&self) -> Option<&[ClassExpression]> {
        match self {
            ClassExpression::UnionOf(operands) => Some(operands),
            _ => None,
        }
    }

    /// `p` if this expression is `¬p` with `p` primitive
    pub fn negated_primitive(&self) -> Option<&ClassExpression> {
        match self {
            ClassExpression::ComplementOf(inner) if inner.is_primitive() => Some(inner),
            _ => None,
        }
    }

    /// Syntactic complement, collapsing double negation and ⊤/⊥.
    pub fn complement(&self) -> ClassExpression {
        match self {
            ClassExpression::Thing => ClassExpression::Nothing,
            ClassExpression::Nothing => ClassExpression::Thing,
            ClassExpression::ComplementOf(inner) => (**inner).clone(),
            other => ClassExpression::not(other.clone()),
        }
    }

    /// Negation normal form: complements are pushed down to named classes.
    pub fn to_nnf(&self) -> ClassExpression {
        match self {
            ClassExpression::Thing | ClassExpression::Nothing | ClassExpression::Named(_) => self.clone(),
            ClassExpression::IntersectionOf(operands) => {
                ClassExpression::IntersectionOf(operands.iter().map(|c| c.to_nnf()).collect())
            }
            ClassExpression::UnionOf(operands) => {
                ClassExpression::UnionOf(operands.iter().map(|c| c.to_nnf()).collect())
            }
            ClassExpression::ComplementOf(inner) => match inner.as_ref() {
                ClassExpression::Thing => ClassExpression::Nothing,
                ClassExpression::Nothing => ClassExpression::Thing,
                ClassExpression::Named(_) => self.clone(),
                ClassExpression::ComplementOf(c) => c.to_nnf(),
                ClassExpression::IntersectionOf(operands) => ClassExpression::UnionOf(
                    operands.iter().map(|c| ClassExpression::not(c.clone()).to_nnf()).collect(),
                ),
                ClassExpression::UnionOf(operands) => ClassExpression::IntersectionOf(
                    operands.iter().map(|c| ClassExpression::not(c.clone()).to_nnf()).collect(),
                ),
            },
        }
    }

    /// Collect every named class mentioned in this expression
    pub fn collect_named(&self, out: &mut BTreeSet<ClassExpression>) {
        match self {
            ClassExpression::Named(_) => {
                out.insert(self.clone());
            }
            ClassExpression::IntersectionOf(operands) | ClassExpression::UnionOf(operands) => {
                for operand in operands {
                    operand.collect_named(out);
                }
            }
            ClassExpression::ComplementOf(inner) => inner.collect_named(out),
            ClassExpression::Thing | ClassExpression::Nothing => {}
        }
    }
}

impl fmt::Display for ClassExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, operands: &[ClassExpression], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", operand)?;
            }
            write!(f, ")")
        }

        match self {
            ClassExpression::Thing => write!(f, "⊤"),
            ClassExpression::Nothing => write!(f, "⊥"),
            ClassExpression::Named(iri) => write!(f, "{}", iri),
            ClassExpression::IntersectionOf(operands) => join(f, operands, "⊓"),
            ClassExpression::UnionOf(operands) => join(f, operands, "⊔"),
            ClassExpression::ComplementOf(inner) => write!(f, "¬{}", inner),
        }
    }
}

/// Named individual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Individual(pub Iri);

impl Individual {
    pub fn new(iri: impl Into<String>) -> Self {
        Self(Iri::new(iri))
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// TBox axiom
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axiom {
    /// SubClassOf(C D): C ⊑ D
    SubClassOf(ClassExpression, ClassExpression),

    /// EquivalentClasses(C D): C ≡ D
    EquivalentClasses(ClassExpression, ClassExpression),
}

/// ABox assertion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assertion {
    /// ClassAssertion(C i)
    ClassAssertion(ClassExpression, Individual),
}

/// Knowledge base: TBox axioms, ABox assertions and declared signature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ontology {
    /// Ontology IRI
    #[serde(default)]
    pub iri: Option<Iri>,

    /// TBox axioms
    #[serde(default)]
    pub axioms: Vec<Axiom>,

    /// ABox assertions
    #[serde(default)]
    pub assertions: Vec<Assertion>,

    /// Named classes mentioned or declared
    #[serde(default)]
    pub classes: BTreeSet<ClassExpression>,

    /// Individuals mentioned or declared
    #[serde(default)]
    pub individuals: BTreeSet<Individual>,
}

impl Ontology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iri(iri: Iri) -> Self {
        Self {
            iri: Some(iri),
            ..Self::default()
        }
    }

    /// Parse a JSON knowledge-base document, completing the signature from
    /// the axioms and assertions it contains.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut ontology: Ontology = serde_json::from_str(json)?;
        ontology.refresh_signature();
        Ok(ontology)
    }

    pub fn declare_class(&mut self, class: ClassExpression) {
        class.collect_named(&mut self.classes);
    }

    pub fn declare_individual(&mut self, individual: Individual) {
        self.individuals.insert(individual);
    }

    pub fn add_axiom(&mut self, axiom: Axiom) {
        match &axiom {
            Axiom::SubClassOf(c, d) | Axiom::EquivalentClasses(c, d) => {
                c.collect_named(&mut self.classes);
                d.collect_named(&mut self.classes);
            }
        }
        self.axioms.push(axiom);
    }

    /// DisjointClasses(A B), stored as A ⊑ ¬B
    pub fn add_disjoint_classes(&mut self, a: ClassExpression, b: ClassExpression) {
        self.add_axiom(Axiom::SubClassOf(a, ClassExpression::not(b)));
    }

    pub fn add_assertion(&mut self, assertion: Assertion) {
        match &assertion {
            Assertion::ClassAssertion(c, i) => {
                c.collect_named(&mut self.classes);
                self.individuals.insert(i.clone());
            }
        }
        self.assertions.push(assertion);
    }

    /// Classes asserted for an individual
    pub fn asserted_types<'a>(&'a self, individual: &'a Individual) -> impl Iterator<Item = &'a ClassExpression> + 'a {
        self.assertions.iter().filter_map(move |assertion| match assertion {
            Assertion::ClassAssertion(c, i) if i == individual => Some(c),
            _ => None,
        })
    }

    /// Cheap syntactic types: named conjuncts of asserted classes are types,
    /// complemented named conjuncts are non-types.
    pub fn obvious_types(&self, individual: &Individual) -> (HashSet<ClassExpression>, HashSet<ClassExpression>) {
        let mut types = HashSet::new();
        let mut non_types = HashSet::new();
        let mut pending: Vec<&ClassExpression> = self.asserted_types(individual).collect();

        while let Some(c) = pending.pop() {
            if c.is_primitive() {
                types.insert(c.clone());
            } else if let Some(p) = c.negated_primitive() {
                non_types.insert(p.clone());
            } else if let Some(conjuncts) = c.conjuncts() {
                pending.extend(conjuncts.iter());
            }
        }

        (types, non_types)
    }

    fn refresh_signature(&mut self) {
        let mut classes = std::mem::take(&mut self.classes);
        for axiom in &self.axioms {
            match axiom {
                Axiom::SubClassOf(c, d) | Axiom::EquivalentClasses(c, d) => {
                    c.collect_named(&mut classes);
                    d.collect_named(&mut classes);
                }
            }
        }
        for assertion in &self.assertions {
            match assertion {
                Assertion::ClassAssertion(c, i) => {
                    c.collect_named(&mut classes);
                    self.individuals.insert(i.clone());
                }
            }
        }
        // Only named classes are part of the signature
        classes.retain(|c| c.is_primitive());
        self.classes = classes;
    }
}
