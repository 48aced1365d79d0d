//! Extinction cascades: remove a species and propagate the collapse to
//! every dependent that ends up without a surviving energy source.

use std::collections::{HashSet, VecDeque};

use crate::graph::FoodWeb;

/// Remove `target` from the web and cascade the extinction.
///
/// Processing is breadth-first over a FIFO worklist, so species at the same
/// cascade depth go extinct in discovery order and the returned sequence is
/// fully deterministic. For each species popped, its dependents are debited
/// by the connecting edge weight *before* the species is removed; the
/// debit must read the edges that removal is about to delete. A dependent
/// cascades when it has no remaining predecessors or its energy has dropped
/// to zero or below.
///
/// Returns the removed species in removal order, starting with `target`.
/// An absent `target` is a benign no-op yielding an empty list.
pub fn extinguish(web: &mut FoodWeb, target: &str) -> Vec<String> {
    if !web.has_species(target) {
        return Vec::new();
    }

    let mut worklist: VecDeque<String> = VecDeque::new();
    let mut pending: HashSet<String> = HashSet::new();
    let mut removed: Vec<String> = Vec::new();

    worklist.push_back(target.to_string());
    pending.insert(target.to_string());

    while let Some(current) = worklist.pop_front() {
        // A queued name may already be gone; skip instead of reprocessing.
        if !web.has_species(&current) {
            continue;
        }

        // Capture before removal deletes the edges.
        let dependents = web.successors(&current);
        for dependent in &dependents {
            if let Some(weight) = web.relation_weight(&current, dependent) {
                let energy = web
                    .energy_of(dependent)
                    .expect("captured dependent should still be present");
                web.set_energy(dependent, energy - weight)
                    .expect("captured dependent should still be present");
            }
        }

        web.remove_species(&current);
        removed.push(current);

        for dependent in &dependents {
            if !web.has_species(dependent) || pending.contains(dependent) {
                continue;
            }
            let isolated = web.predecessors(dependent).is_empty();
            let starved = web.energy_of(dependent).unwrap_or(0) <= 0;
            if isolated || starved {
                pending.insert(dependent.clone());
                worklist.push_back(dependent.clone());
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FoodWeb;

    fn web_of(species: &[(&str, i64)], relations: &[(&str, &str, i64)]) -> FoodWeb {
        let mut web = FoodWeb::new();
        for (name, energy) in species {
            web.add_species(*name, *energy).unwrap();
        }
        for (source, target, weight) in relations {
            web.add_relation(source, target, *weight).unwrap();
        }
        web
    }

    #[test]
    fn absent_target_is_a_no_op() {
        let mut web = web_of(&[("Plants", 10)], &[]);
        let before = web.snapshot("t", 0);
        assert!(extinguish(&mut web, "Unknown").is_empty());
        assert_eq!(web.snapshot("t", 0), before);
    }

    #[test]
    fn repeated_no_op_is_idempotent() {
        let mut web = web_of(
            &[("Plants", 10), ("Rabbits", 5)],
            &[("Plants", "Rabbits", 3)],
        );
        assert_eq!(extinguish(&mut web, "Plants"), vec!["Plants", "Rabbits"]);
        let after_first = web.snapshot("t", 0);
        assert!(extinguish(&mut web, "Plants").is_empty());
        assert!(extinguish(&mut web, "Plants").is_empty());
        assert_eq!(web.snapshot("t", 0), after_first);
    }

    #[test]
    fn node_count_shrinks_by_exactly_the_removals() {
        let mut web = web_of(
            &[("A", 5), ("B", 9), ("C", 9), ("D", 9)],
            &[("A", "B", 1), ("C", "D", 1)],
        );
        let before = web.species_count();
        let removed = extinguish(&mut web, "A");
        assert_eq!(web.species_count(), before - removed.len());
        for name in &removed {
            assert!(!web.has_species(name));
        }
        // The untouched chain survives intact.
        assert!(web.has_species("C"));
        assert_eq!(web.relation_weight("C", "D"), Some(1));
    }

    #[test]
    fn debit_lands_before_removal() {
        // B holds exactly the energy it draws from A, so the debit alone
        // pushes it to zero and it must fall in the same cascade.
        let mut web = web_of(&[("A", 5), ("B", 4)], &[("A", "B", 4)]);
        assert_eq!(extinguish(&mut web, "A"), vec!["A", "B"]);
        assert_eq!(web.species_count(), 0);
    }

    #[test]
    fn starvation_cascades_even_with_a_surviving_source() {
        let mut web = web_of(
            &[("A", 9), ("D", 9), ("B", 5)],
            &[("A", "B", 5), ("D", "B", 1)],
        );
        assert_eq!(extinguish(&mut web, "A"), vec!["A", "B"]);
        assert!(web.has_species("D"));
    }

    #[test]
    fn independent_source_keeps_dependent_alive() {
        let mut web = web_of(
            &[("A", 9), ("D", 9), ("C", 5)],
            &[("A", "C", 2), ("D", "C", 1)],
        );
        assert_eq!(extinguish(&mut web, "A"), vec!["A"]);
        assert_eq!(web.energy_of("C"), Ok(3));
        assert_eq!(web.predecessors("C"), vec!["D"]);
        assert_eq!(web.relation_weight("D", "C"), Some(1));
    }

    #[test]
    fn isolation_cascades_even_with_energy_left() {
        let mut web = web_of(&[("Plant", 10), ("Rabbit", 5)], &[("Plant", "Rabbit", 3)]);
        assert_eq!(extinguish(&mut web, "Plant"), vec!["Plant", "Rabbit"]);
        assert!(web.species_count() == 0);
    }

    #[test]
    fn chain_collapse_follows_discovery_order() {
        let mut web = web_of(
            &[("Plant", 10), ("Rabbit", 5), ("Wolf", 3)],
            &[("Plant", "Rabbit", 3), ("Rabbit", "Wolf", 1)],
        );
        assert_eq!(
            extinguish(&mut web, "Plant"),
            vec!["Plant", "Rabbit", "Wolf"]
        );
    }

    #[test]
    fn diamond_debits_through_both_paths_and_removes_sink_once() {
        let mut web = web_of(
            &[("A", 9), ("B", 5), ("C", 5), ("D", 1)],
            &[("A", "B", 1), ("A", "C", 1), ("B", "D", 1), ("C", "D", 1)],
        );
        let removed = extinguish(&mut web, "A");
        assert_eq!(removed, vec!["A", "B", "C", "D"]);
        let unique: std::collections::HashSet<_> = removed.iter().collect();
        assert_eq!(unique.len(), removed.len());
        // D took the hit from both B and C before going under.
        assert!(!web.has_species("D"));
    }

    #[test]
    fn sink_with_positive_energy_falls_once_isolated() {
        let mut web = web_of(
            &[("A", 9), ("B", 1), ("C", 1), ("D", 10)],
            &[("A", "B", 1), ("A", "C", 1), ("B", "D", 1), ("C", "D", 1)],
        );
        assert_eq!(extinguish(&mut web, "A"), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn cycles_terminate() {
        let mut web = web_of(
            &[("A", 2), ("B", 2), ("C", 2)],
            &[("A", "B", 1), ("B", "C", 1), ("C", "A", 1)],
        );
        let removed = extinguish(&mut web, "A");
        assert_eq!(removed, vec!["A", "B", "C"]);
        assert_eq!(web.species_count(), 0);
    }
}
