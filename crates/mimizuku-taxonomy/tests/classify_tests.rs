mod common;

use common::{assert_hasse, assert_top_bottom_reachable, named, shape, Call, RecordingOracle};
use mimizuku_core::model::{Axiom, ClassExpression, Ontology};
use mimizuku_lite::LiteReasoner;
use mimizuku_taxonomy::{ClassifierConfig, LoggingProgress, Taxonomy, TaxonomyBuilder, TaxonomyError};
use std::collections::BTreeSet;

fn classify(ontology: &Ontology) -> Taxonomy {
    let mut builder = TaxonomyBuilder::new(ontology, LiteReasoner::new(ontology));
    builder.classify().unwrap();
    builder.into_taxonomy().unwrap()
}

fn set(classes: &[&str]) -> BTreeSet<ClassExpression> {
    classes.iter().map(|c| named(c)).collect()
}

#[test]
fn test_chain_with_told_equivalence() {
    // A ⊑ B, B ⊑ C, A ≡ D  ⇒  ⊤ > C > B > {A, D} > ⊥
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(named("A"), named("B")));
    ontology.add_axiom(Axiom::SubClassOf(named("B"), named("C")));
    ontology.add_axiom(Axiom::EquivalentClasses(named("A"), named("D")));

    let taxonomy = classify(&ontology);

    assert_eq!(taxonomy.get_all_equivalents(&named("A")).unwrap(), set(&["A", "D"]));
    assert_eq!(
        taxonomy.get_subs(&ClassExpression::Thing, true).unwrap(),
        vec![set(&["C"])]
    );
    assert_eq!(taxonomy.get_subs(&named("C"), true).unwrap(), vec![set(&["B"])]);
    assert_eq!(taxonomy.get_subs(&named("B"), true).unwrap(), vec![set(&["A", "D"])]);
    assert_eq!(
        taxonomy.get_flattened_subs(&named("D"), true).unwrap(),
        BTreeSet::from([ClassExpression::Nothing])
    );
    assert_eq!(taxonomy.node_count(), 5);

    assert_hasse(&taxonomy);
    assert_top_bottom_reachable(&taxonomy);
}

#[test]
fn test_conjunctive_subsumer_has_no_residual_top_edge() {
    // C ⊑ A ⊓ B, A and B unrelated
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(
        named("C"),
        ClassExpression::and(vec![named("A"), named("B")]),
    ));

    let taxonomy = classify(&ontology);

    assert_eq!(taxonomy.get_flattened_supers(&named("C"), true).unwrap(), set(&["A", "B"]));
    assert_eq!(
        taxonomy.get_flattened_subs(&ClassExpression::Thing, true).unwrap(),
        set(&["A", "B"])
    );
    assert!(taxonomy.get_flattened_supers(&named("C"), false).unwrap().contains(&ClassExpression::Thing));
    assert_hasse(&taxonomy);
}

#[test]
fn test_told_cycle_is_merged_before_any_oracle_call() {
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(named("A"), named("B")));
    ontology.add_axiom(Axiom::SubClassOf(named("B"), named("A")));

    let mut oracle = RecordingOracle::new(&ontology);
    let mut builder = TaxonomyBuilder::new(&ontology, &mut oracle);
    builder.classify().unwrap();

    let order = builder.definition_order().unwrap();
    assert!(order.is_equivalent(&named("A"), &named("B")).unwrap());

    let taxonomy = builder.taxonomy().unwrap();
    assert!(taxonomy.is_equivalent(&named("A"), &named("B")).unwrap());

    // the merged class is classified once, through a single representative
    drop(builder);
    let mentions_a = oracle.calls.iter().any(|call| call.mentions(&named("A")));
    let mentions_b = oracle.calls.iter().any(|call| call.mentions(&named("B")));
    assert!(mentions_a != mentions_b, "calls: {:?}", oracle.calls);
}

#[test]
fn test_subs_exclude_the_class_and_its_equivalents() {
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::EquivalentClasses(named("Human"), named("Person")));
    ontology.add_axiom(Axiom::SubClassOf(named("Student"), named("Person")));
    ontology.add_axiom(Axiom::SubClassOf(named("Person"), named("Animal")));

    let taxonomy = classify(&ontology);

    for class in [named("Human"), named("Person")] {
        let subs = taxonomy.get_flattened_subs(&class, true).unwrap();
        assert!(!subs.contains(&class));
        for equivalent in taxonomy.get_equivalents(&class).unwrap() {
            assert!(!subs.contains(&equivalent));
        }
        assert_eq!(subs, set(&["Student"]));
    }
    assert!(taxonomy.is_sub_node_of(&named("Student"), &named("Human")).unwrap());
    assert!(taxonomy.is_sub_node_of(&named("Human"), &named("Person")).unwrap());
    assert!(!taxonomy.is_sub_node_of(&named("Animal"), &named("Person")).unwrap());
}

#[test]
fn test_union_subsumer_resolved_by_lca() {
    // A ⊑ B ⊔ C, B ⊑ D, C ⊑ D: D is the least common ancestor of the disjuncts
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(
        named("A"),
        ClassExpression::or(vec![named("B"), named("C")]),
    ));
    ontology.add_axiom(Axiom::SubClassOf(named("B"), named("D")));
    ontology.add_axiom(Axiom::SubClassOf(named("C"), named("D")));

    let taxonomy = classify(&ontology);
    assert_eq!(taxonomy.get_flattened_supers(&named("A"), true).unwrap(), set(&["D"]));
    assert_eq!(taxonomy.get_flattened_subs(&named("D"), true).unwrap(), set(&["A", "B", "C"]));
    assert_hasse(&taxonomy);
    assert_top_bottom_reachable(&taxonomy);
}

#[test]
fn test_unsatisfiable_class_joins_bottom() {
    let mut ontology = Ontology::new();
    ontology.add_disjoint_classes(named("Cat"), named("Dog"));
    ontology.add_axiom(Axiom::SubClassOf(
        named("CatDog"),
        ClassExpression::and(vec![named("Cat"), named("Dog")]),
    ));
    ontology.add_axiom(Axiom::SubClassOf(named("Kitten"), named("CatDog")));

    let taxonomy = classify(&ontology);
    let unsatisfiable = taxonomy.get_all_equivalents(&ClassExpression::Nothing).unwrap();
    assert_eq!(
        unsatisfiable,
        BTreeSet::from([ClassExpression::Nothing, named("CatDog"), named("Kitten")])
    );
    assert!(!taxonomy.is_equivalent(&named("Cat"), &ClassExpression::Nothing).unwrap());
    assert_top_bottom_reachable(&taxonomy);
}

#[test]
fn test_class_equivalent_to_top() {
    // ¬T ⊑ T makes T ≡ ⊤
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(ClassExpression::not(named("T")), named("T")));
    ontology.add_axiom(Axiom::SubClassOf(named("A"), named("B")));

    for double_check in [true, false] {
        let config = ClassifierConfig {
            double_check_satisfiability: double_check,
            ..ClassifierConfig::default()
        };
        let mut builder = TaxonomyBuilder::with_config(&ontology, LiteReasoner::new(&ontology), config);
        let taxonomy = builder.classify().unwrap().unwrap();

        assert!(taxonomy.is_equivalent(&named("T"), &ClassExpression::Thing).unwrap());
        assert_eq!(taxonomy.get_flattened_subs(&named("T"), true).unwrap(), set(&["B"]));
    }
}

#[test]
fn test_scan_order_does_not_change_the_result() {
    let axioms = vec![
        Axiom::SubClassOf(named("Dog"), named("Mammal")),
        Axiom::SubClassOf(named("Cat"), named("Mammal")),
        Axiom::SubClassOf(named("Mammal"), named("Animal")),
        Axiom::EquivalentClasses(named("Canine"), named("Dog")),
        Axiom::SubClassOf(named("Puppy"), ClassExpression::and(vec![named("Dog"), named("Young")])),
    ];

    let mut forward = Ontology::new();
    for axiom in &axioms {
        forward.add_axiom(axiom.clone());
    }
    let mut backward = Ontology::new();
    for axiom in axioms.iter().rev() {
        backward.add_axiom(axiom.clone());
    }

    let first = classify(&forward);
    let second = classify(&backward);
    assert_eq!(shape(&first), shape(&second));
    assert_eq!(shape(&first), shape(&classify(&forward)));
}

#[test]
fn test_told_information_only_saves_oracle_calls() {
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(named("A"), named("B")));
    ontology.add_axiom(Axiom::SubClassOf(named("B"), named("C")));
    ontology.add_axiom(Axiom::SubClassOf(named("D"), named("C")));
    ontology.add_disjoint_classes(named("A"), named("D"));

    let mut told = RecordingOracle::new(&ontology);
    let with_told = {
        let mut builder = TaxonomyBuilder::new(&ontology, &mut told);
        builder.classify().unwrap();
        builder.into_taxonomy().unwrap()
    };

    let mut naive = RecordingOracle::new(&ontology);
    let without_told = {
        let mut builder = TaxonomyBuilder::with_config(&ontology, &mut naive, ClassifierConfig::naive());
        builder.classify().unwrap();
        builder.into_taxonomy().unwrap()
    };

    assert_eq!(shape(&with_told), shape(&without_told));
    let subsumption_calls = |calls: &[Call]| calls.iter().filter(|c| matches!(c, Call::SubClassOf(..))).count();
    assert!(subsumption_calls(&told.calls) < subsumption_calls(&naive.calls));
}

#[test]
fn test_lca_queries() {
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(named("Dog"), named("Mammal")));
    ontology.add_axiom(Axiom::SubClassOf(named("Cat"), named("Mammal")));
    ontology.add_axiom(Axiom::SubClassOf(named("Mammal"), named("Animal")));
    ontology.add_axiom(Axiom::SubClassOf(named("Dog"), named("Pet")));
    ontology.add_axiom(Axiom::SubClassOf(named("Cat"), named("Pet")));

    let taxonomy = classify(&ontology);

    assert_eq!(
        taxonomy.compute_lca(&[named("Dog"), named("Cat")]).unwrap(),
        set(&["Mammal", "Pet"])
    );
    assert_eq!(
        taxonomy.compute_lca(&[named("Dog")]).unwrap(),
        taxonomy.get_flattened_supers(&named("Dog"), true).unwrap()
    );
    assert_eq!(
        taxonomy.compute_lca(&[named("Dog"), ClassExpression::Thing, named("Cat")]).unwrap(),
        BTreeSet::from([ClassExpression::Thing])
    );
    assert!(matches!(
        taxonomy.compute_lca(&[named("Unicorn")]),
        Err(TaxonomyError::UnknownConcept(_))
    ));
}

#[test]
fn test_logging_listener_sees_every_class() {
    let mut ontology = Ontology::new();
    ontology.add_axiom(Axiom::SubClassOf(named("A"), named("B")));
    ontology.add_axiom(Axiom::EquivalentClasses(named("C"), named("B")));

    let mut progress = LoggingProgress::new(1);
    let mut builder = TaxonomyBuilder::new(&ontology, LiteReasoner::new(&ontology));
    builder.set_listener(&mut progress);
    builder.classify().unwrap();
    drop(builder);

    // B and C share one node and one search
    assert_eq!(progress.done(), 2);
}
