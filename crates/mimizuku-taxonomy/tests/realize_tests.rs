mod common;

use common::{named, Call, RecordingOracle};
use mimizuku_core::model::{Assertion, Axiom, ClassExpression, Individual, Ontology};
use mimizuku_lite::LiteReasoner;
use mimizuku_taxonomy::{ClassifierConfig, TaxonomyBuilder};
use std::collections::BTreeSet;

fn types(taxonomy: &mimizuku_taxonomy::Taxonomy, individual: &str, direct: bool) -> BTreeSet<ClassExpression> {
    taxonomy
        .get_types(&Individual::new(individual), direct)
        .into_iter()
        .flatten()
        .collect()
}

fn zoo() -> Ontology {
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(named("Dog"), named("Mammal")));
    ontology.add_axiom(Axiom::SubClassOf(named("Cat"), named("Mammal")));
    ontology.add_axiom(Axiom::SubClassOf(named("Mammal"), named("Animal")));
    ontology.add_axiom(Axiom::SubClassOf(named("Parrot"), named("Animal")));
    ontology.add_axiom(Axiom::EquivalentClasses(
        named("Pet"),
        ClassExpression::or(vec![named("Dog"), named("Cat")]),
    ));
    ontology.add_disjoint_classes(named("Mammal"), named("Parrot"));
    ontology
}

#[test]
fn test_disjoint_obvious_type_skips_instance_check() {
    let mut ontology = Ontology::new();
    ontology.add_disjoint_classes(named("A"), named("B"));
    ontology.add_assertion(Assertion::ClassAssertion(named("A"), Individual::new("x")));

    let mut oracle = RecordingOracle::new(&ontology);
    let mut builder = TaxonomyBuilder::new(&ontology, &mut oracle);
    let taxonomy = builder.realize().unwrap().unwrap();

    assert_eq!(types(taxonomy, "x", true), BTreeSet::from([named("A")]));
    assert!(!types(taxonomy, "x", false).contains(&named("B")));

    drop(builder);
    let x = Individual::new("x");
    assert!(!oracle.calls.contains(&Call::Type(x, named("B"))));
}

#[test]
fn test_individuals_get_most_specific_types() {
    let mut ontology = zoo();
    ontology.add_assertion(Assertion::ClassAssertion(named("Dog"), Individual::new("rex")));
    ontology.add_assertion(Assertion::ClassAssertion(named("Parrot"), Individual::new("polly")));
    ontology.add_assertion(Assertion::ClassAssertion(
        ClassExpression::and(vec![named("Mammal"), ClassExpression::not(named("Dog"))]),
        Individual::new("tom"),
    ));

    let mut builder = TaxonomyBuilder::new(&ontology, LiteReasoner::new(&ontology));
    let taxonomy = builder.realize().unwrap().unwrap();

    assert_eq!(types(taxonomy, "rex", true), BTreeSet::from([named("Dog")]));
    assert_eq!(
        types(taxonomy, "rex", false),
        BTreeSet::from([
            ClassExpression::Thing,
            named("Animal"),
            named("Mammal"),
            named("Pet"),
            named("Dog")
        ])
    );
    assert_eq!(types(taxonomy, "polly", true), BTreeSet::from([named("Parrot")]));
    assert_eq!(types(taxonomy, "tom", true), BTreeSet::from([named("Mammal")]));

    assert_eq!(
        taxonomy.get_instances(&named("Animal"), false).unwrap(),
        BTreeSet::from([
            Individual::new("polly"),
            Individual::new("rex"),
            Individual::new("tom")
        ])
    );
    assert!(taxonomy.get_instances(&named("Animal"), true).unwrap().is_empty());
    assert_eq!(
        taxonomy.get_instances(&named("Pet"), false).unwrap(),
        BTreeSet::from([Individual::new("rex")])
    );
    assert_eq!(taxonomy.individuals().len(), 3);
}

#[test]
fn test_obvious_types_only_save_oracle_calls() {
    let mut ontology = zoo();
    ontology.add_assertion(Assertion::ClassAssertion(named("Cat"), Individual::new("felix")));
    ontology.add_assertion(Assertion::ClassAssertion(named("Parrot"), Individual::new("polly")));
    ontology.declare_individual(Individual::new("nobody"));

    let mut seeded = RecordingOracle::new(&ontology);
    let seeded_types = {
        let mut builder = TaxonomyBuilder::new(&ontology, &mut seeded);
        let taxonomy = builder.realize().unwrap().unwrap();
        ["felix", "polly", "nobody"].map(|x| types(taxonomy, x, true))
    };

    let mut unseeded = RecordingOracle::new(&ontology);
    let unseeded_types = {
        let mut builder = TaxonomyBuilder::with_config(&ontology, &mut unseeded, ClassifierConfig::naive());
        let taxonomy = builder.realize().unwrap().unwrap();
        ["felix", "polly", "nobody"].map(|x| types(taxonomy, x, true))
    };

    assert_eq!(seeded_types, unseeded_types);
    assert_eq!(seeded_types[2], BTreeSet::from([ClassExpression::Thing]));

    let instance_calls = |calls: &[Call]| calls.iter().filter(|c| matches!(c, Call::Type(..))).count();
    assert!(instance_calls(&seeded.calls) < instance_calls(&unseeded.calls));
}

#[test]
fn test_realize_reuses_the_classification() {
    let mut ontology = zoo();
    ontology.add_assertion(Assertion::ClassAssertion(named("Dog"), Individual::new("rex")));

    let mut oracle = RecordingOracle::new(&ontology);
    let mut builder = TaxonomyBuilder::new(&ontology, &mut oracle);
    builder.classify().unwrap();
    builder.oracle_mut().calls.clear();

    builder.realize().unwrap();
    assert!(builder.is_realized());
    assert!(builder
        .oracle()
        .calls
        .iter()
        .all(|call| matches!(call, Call::Type(..))));

    // realizing again starts from empty instance sets
    let taxonomy = builder.realize().unwrap().unwrap();
    assert_eq!(
        taxonomy.get_instances(&named("Dog"), true).unwrap(),
        BTreeSet::from([Individual::new("rex")])
    );
}

#[test]
fn test_unknown_concept_after_realization() {
    let mut ontology = zoo();
    ontology.add_assertion(Assertion::ClassAssertion(named("Dog"), Individual::new("rex")));

    let mut builder = TaxonomyBuilder::new(&ontology, LiteReasoner::new(&ontology));
    let taxonomy = builder.realize().unwrap().unwrap();
    assert!(taxonomy.get_instances(&named("Unicorn"), true).is_err());
    assert!(taxonomy.get_types(&Individual::new("ghost"), true).is_empty());
}
