//! 三値マーク (探索ごとのメモ)

use crate::node::NodeId;
use crate::taxonomy::Taxonomy;
use crate::TaxonomyError;

/// Three-valued knowledge about one node during a single search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tristate {
    #[default]
    Unknown,
    True,
    False,
}

impl Tristate {
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Tristate::Unknown => None,
            Tristate::True => Some(true),
            Tristate::False => Some(false),
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value {
            Tristate::True
        } else {
            Tristate::False
        }
    }
}

/// Direction a mark flows through the taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Along `supers`
    Up,
    /// Along `subs`
    Down,
    None,
}

/// Memo table for one top search, bottom search or realization of one
/// individual. Marks only ever move from `Unknown` to a boolean.
#[derive(Debug, Clone)]
pub struct Marks {
    marks: Vec<Tristate>,
}

impl Marks {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        Self {
            marks: vec![Tristate::Unknown; taxonomy.arena_len()],
        }
    }

    pub fn get(&self, id: NodeId) -> Tristate {
        self.marks.get(id.0).copied().unwrap_or_default()
    }

    /// Mark `id` and flow the value in `propagation` direction. Propagation
    /// stops at nodes that already carry the same value; a node carrying
    /// the opposite value is a fatal inconsistency.
    pub fn mark(
        &mut self,
        taxonomy: &Taxonomy,
        id: NodeId,
        value: bool,
        propagation: Propagation,
    ) -> Result<(), TaxonomyError> {
        let requested = Tristate::from(value);
        let mut queue = vec![(id, true)];

        while let Some((n, initial)) = queue.pop() {
            if n.0 >= self.marks.len() {
                self.marks.resize(n.0 + 1, Tristate::Unknown);
            }
            match self.marks[n.0] {
                Tristate::Unknown => self.marks[n.0] = requested,
                existing if existing == requested => {
                    if !initial {
                        continue;
                    }
                }
                _ => {
                    return Err(TaxonomyError::ConflictingMark {
                        concept: taxonomy.node(n).name().clone(),
                        existing: !value,
                        requested: value,
                    })
                }
            }

            let next = match propagation {
                Propagation::Up => taxonomy.node(n).supers(),
                Propagation::Down => taxonomy.node(n).subs(),
                Propagation::None => continue,
            };
            queue.extend(next.iter().map(|&m| (m, false)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimizuku_core::model::ClassExpression;

    fn chain() -> (Taxonomy, NodeId, NodeId) {
        let mut taxonomy = Taxonomy::new();
        let (top, bottom) = (taxonomy.top(), taxonomy.bottom());
        let a = taxonomy.add_node(ClassExpression::named("A"), false);
        taxonomy.add_supers(a, &[top]);
        taxonomy.add_subs(a, &[bottom]);
        taxonomy.remove_multiple_paths(a);
        let b = taxonomy.add_node(ClassExpression::named("B"), false);
        taxonomy.add_supers(b, &[a]);
        taxonomy.add_subs(b, &[bottom]);
        taxonomy.remove_multiple_paths(b);
        (taxonomy, a, b)
    }

    #[test]
    fn test_marks_start_unknown() {
        let (taxonomy, a, _) = chain();
        let marks = Marks::new(&taxonomy);
        assert_eq!(marks.get(a), Tristate::Unknown);
        assert_eq!(marks.get(a).to_bool(), None);
    }

    #[test]
    fn test_propagation_directions() {
        let (taxonomy, a, b) = chain();

        let mut up = Marks::new(&taxonomy);
        up.mark(&taxonomy, b, true, Propagation::Up).unwrap();
        assert_eq!(up.get(a), Tristate::True);
        assert_eq!(up.get(taxonomy.top()), Tristate::True);
        assert_eq!(up.get(taxonomy.bottom()), Tristate::Unknown);

        let mut down = Marks::new(&taxonomy);
        down.mark(&taxonomy, a, false, Propagation::Down).unwrap();
        assert_eq!(down.get(b), Tristate::False);
        assert_eq!(down.get(taxonomy.bottom()), Tristate::False);
        assert_eq!(down.get(taxonomy.top()), Tristate::Unknown);

        let mut none = Marks::new(&taxonomy);
        none.mark(&taxonomy, a, true, Propagation::None).unwrap();
        assert_eq!(none.get(b), Tristate::Unknown);
    }

    #[test]
    fn test_remarking_same_value_is_allowed() {
        let (taxonomy, a, b) = chain();
        let mut marks = Marks::new(&taxonomy);
        marks.mark(&taxonomy, a, true, Propagation::None).unwrap();
        // the initial node still propagates even though it is already marked
        marks.mark(&taxonomy, a, true, Propagation::Up).unwrap();
        assert_eq!(marks.get(taxonomy.top()), Tristate::True);
        assert_eq!(marks.get(b), Tristate::Unknown);
    }

    #[test]
    fn test_conflicting_mark_is_fatal() {
        let (taxonomy, a, b) = chain();
        let mut marks = Marks::new(&taxonomy);
        marks.mark(&taxonomy, a, false, Propagation::None).unwrap();

        let err = marks.mark(&taxonomy, b, true, Propagation::Up).unwrap_err();
        match err {
            TaxonomyError::ConflictingMark { concept, existing, requested } => {
                assert_eq!(concept, ClassExpression::named("A"));
                assert!(!existing);
                assert!(requested);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
