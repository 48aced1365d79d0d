use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::graph::WebSnapshot;

/// A species placed in the unit square for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedSpecies {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Force-directed placement of a snapshot's species. Seeded, so the same
/// snapshot and seed always land on the same picture. Layout is a rendering
/// concern only; nothing here feeds back into the web.
pub fn spring_layout(snapshot: &WebSnapshot, seed: u64, iterations: usize) -> Vec<PlacedSpecies> {
    let names: Vec<&str> = snapshot
        .species
        .iter()
        .map(|species| species.name.as_str())
        .collect();
    let count = names.len();
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![PlacedSpecies {
            name: names[0].to_string(),
            x: 0.5,
            y: 0.5,
        }];
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut positions: Vec<(f64, f64)> = (0..count)
        .map(|_| (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect();

    let index: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(at, name)| (*name, at))
        .collect();
    let edges: Vec<(usize, usize)> = snapshot
        .relations
        .iter()
        .filter_map(|relation| {
            let source = *index.get(relation.source.as_str())?;
            let target = *index.get(relation.target.as_str())?;
            Some((source, target))
        })
        .collect();

    let k = (1.0 / count as f64).sqrt();
    let mut temperature = 0.1;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut displacement = vec![(0.0f64, 0.0f64); count];

        for a in 0..count {
            for b in (a + 1)..count {
                let dx = positions[a].0 - positions[b].0;
                let dy = positions[a].1 - positions[b].1;
                let distance = (dx * dx + dy * dy).sqrt().max(1e-6);
                let repulsion = k * k / distance;
                let ux = dx / distance;
                let uy = dy / distance;
                displacement[a].0 += ux * repulsion;
                displacement[a].1 += uy * repulsion;
                displacement[b].0 -= ux * repulsion;
                displacement[b].1 -= uy * repulsion;
            }
        }

        for &(source, target) in &edges {
            if source == target {
                continue;
            }
            let dx = positions[source].0 - positions[target].0;
            let dy = positions[source].1 - positions[target].1;
            let distance = (dx * dx + dy * dy).sqrt().max(1e-6);
            let attraction = distance * distance / k;
            let ux = dx / distance;
            let uy = dy / distance;
            displacement[source].0 -= ux * attraction;
            displacement[source].1 -= uy * attraction;
            displacement[target].0 += ux * attraction;
            displacement[target].1 += uy * attraction;
        }

        for at in 0..count {
            let (dx, dy) = displacement[at];
            let length = (dx * dx + dy * dy).sqrt().max(1e-6);
            let step = length.min(temperature);
            positions[at].0 = (positions[at].0 + dx / length * step).clamp(0.0, 1.0);
            positions[at].1 = (positions[at].1 + dy / length * step).clamp(0.0, 1.0);
        }

        temperature -= cooling;
    }

    names
        .into_iter()
        .zip(positions)
        .map(|(name, (x, y))| PlacedSpecies {
            name: name.to_string(),
            x,
            y,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FoodWeb;

    fn sample_snapshot() -> WebSnapshot {
        let mut web = FoodWeb::new();
        web.add_species("Plants", 10).unwrap();
        web.add_species("Rabbits", 5).unwrap();
        web.add_species("Wolves", 3).unwrap();
        web.add_relation("Plants", "Rabbits", 3).unwrap();
        web.add_relation("Rabbits", "Wolves", 1).unwrap();
        web.snapshot("layout", 0)
    }

    #[test]
    fn same_seed_same_placement() {
        let snapshot = sample_snapshot();
        let first = spring_layout(&snapshot, 42, 50);
        let second = spring_layout(&snapshot, 42, 50);
        assert_eq!(first, second);
    }

    #[test]
    fn different_seed_moves_species() {
        let snapshot = sample_snapshot();
        let first = spring_layout(&snapshot, 1, 50);
        let second = spring_layout(&snapshot, 2, 50);
        assert_ne!(first, second);
    }

    #[test]
    fn placements_stay_in_unit_square() {
        let snapshot = sample_snapshot();
        for placed in spring_layout(&snapshot, 42, 200) {
            assert!((0.0..=1.0).contains(&placed.x), "{placed:?}");
            assert!((0.0..=1.0).contains(&placed.y), "{placed:?}");
        }
    }

    #[test]
    fn lone_species_sits_in_the_middle() {
        let mut web = FoodWeb::new();
        web.add_species("Moss", 1).unwrap();
        let placed = spring_layout(&web.snapshot("layout", 0), 42, 50);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].x, 0.5);
        assert_eq!(placed[0].y, 0.5);
    }

    #[test]
    fn empty_snapshot_yields_no_placements() {
        let web = FoodWeb::new();
        assert!(spring_layout(&web.snapshot("layout", 0), 42, 50).is_empty());
    }
}
