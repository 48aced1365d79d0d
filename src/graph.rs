use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("species '{0}' is already part of the web")]
    DuplicateSpecies(String),

    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    #[error("relation {source} -> {target} must carry positive energy, got {weight}")]
    NonPositiveWeight {
        // `r#` keeps thiserror from treating this span field as an error cause.
        r#source: String,
        target: String,
        weight: i64,
    },

    #[error("species '{species}' cannot start with negative energy ({energy})")]
    NegativeEnergy { species: String, energy: i64 },
}

#[derive(Debug, Clone)]
struct Link {
    other: String,
    weight: i64,
}

/// The ecosystem graph: species nodes carrying an energy value, predation
/// edges weighted by the energy the consumer draws from the source.
///
/// Adjacency is kept in both directions so successor and predecessor queries
/// are symmetric and node removal can clean reverse pointers. Per-node edge
/// lists preserve insertion order, which is the order cascades enumerate
/// dependents in.
#[derive(Debug, Clone, Default)]
pub struct FoodWeb {
    energy: HashMap<String, i64>,
    outgoing: HashMap<String, Vec<Link>>,
    incoming: HashMap<String, Vec<Link>>,
}

impl FoodWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_species(&mut self, name: impl Into<String>, energy: i64) -> Result<(), GraphError> {
        let name = name.into();
        if self.energy.contains_key(&name) {
            return Err(GraphError::DuplicateSpecies(name));
        }
        self.outgoing.entry(name.clone()).or_default();
        self.incoming.entry(name.clone()).or_default();
        self.energy.insert(name, energy);
        Ok(())
    }

    /// Insert or overwrite the directed relation `source -> target`.
    ///
    /// Overwriting keeps the edge's position in the enumeration order.
    /// Weight sign is not policed here; every construction path in this
    /// crate validates it before calling (see `introduction` and
    /// `scenario`).
    pub fn add_relation(
        &mut self,
        source: &str,
        target: &str,
        weight: i64,
    ) -> Result<(), GraphError> {
        if !self.energy.contains_key(source) {
            return Err(GraphError::UnknownSpecies(source.to_string()));
        }
        if !self.energy.contains_key(target) {
            return Err(GraphError::UnknownSpecies(target.to_string()));
        }

        let out = self.outgoing.entry(source.to_string()).or_default();
        match out.iter_mut().find(|link| link.other == target) {
            Some(link) => link.weight = weight,
            None => out.push(Link {
                other: target.to_string(),
                weight,
            }),
        }
        let inc = self.incoming.entry(target.to_string()).or_default();
        match inc.iter_mut().find(|link| link.other == source) {
            Some(link) => link.weight = weight,
            None => inc.push(Link {
                other: source.to_string(),
                weight,
            }),
        }
        Ok(())
    }

    /// Delete a species and every relation touching it. No-op when absent.
    pub fn remove_species(&mut self, name: &str) {
        if self.energy.remove(name).is_none() {
            return;
        }
        if let Some(out) = self.outgoing.remove(name) {
            for link in &out {
                if let Some(inc) = self.incoming.get_mut(&link.other) {
                    inc.retain(|l| l.other != name);
                }
            }
        }
        if let Some(inc) = self.incoming.remove(name) {
            for link in &inc {
                if let Some(out) = self.outgoing.get_mut(&link.other) {
                    out.retain(|l| l.other != name);
                }
            }
        }
    }

    pub fn has_species(&self, name: &str) -> bool {
        self.energy.contains_key(name)
    }

    pub fn energy_of(&self, name: &str) -> Result<i64, GraphError> {
        self.energy
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownSpecies(name.to_string()))
    }

    pub fn set_energy(&mut self, name: &str, value: i64) -> Result<(), GraphError> {
        match self.energy.get_mut(name) {
            Some(energy) => {
                *energy = value;
                Ok(())
            }
            None => Err(GraphError::UnknownSpecies(name.to_string())),
        }
    }

    /// Species consuming `name`, in edge insertion order. Empty when the
    /// species is absent or nothing feeds on it.
    pub fn successors(&self, name: &str) -> Vec<String> {
        self.outgoing
            .get(name)
            .map(|links| links.iter().map(|l| l.other.clone()).collect())
            .unwrap_or_default()
    }

    /// Species `name` feeds on, in edge insertion order.
    pub fn predecessors(&self, name: &str) -> Vec<String> {
        self.incoming
            .get(name)
            .map(|links| links.iter().map(|l| l.other.clone()).collect())
            .unwrap_or_default()
    }

    pub fn relation_weight(&self, source: &str, target: &str) -> Option<i64> {
        self.outgoing
            .get(source)?
            .iter()
            .find(|link| link.other == target)
            .map(|link| link.weight)
    }

    pub fn species_count(&self) -> usize {
        self.energy.len()
    }

    pub fn relation_count(&self) -> usize {
        self.outgoing.values().map(|links| links.len()).sum()
    }

    /// All species names, sorted.
    pub fn species_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.energy.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn species(&self) -> impl Iterator<Item = (&str, i64)> {
        self.energy.iter().map(|(name, energy)| (name.as_str(), *energy))
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.outgoing.iter().flat_map(|(source, links)| {
            links
                .iter()
                .map(move |link| (source.as_str(), link.other.as_str(), link.weight))
        })
    }

    pub fn snapshot(&self, scenario: &str, step: u64) -> WebSnapshot {
        let mut species: Vec<SpeciesSnapshot> = self
            .species()
            .map(|(name, energy)| SpeciesSnapshot {
                name: name.to_string(),
                energy,
            })
            .collect();
        species.sort_by(|a, b| a.name.cmp(&b.name));

        let mut relations: Vec<RelationSnapshot> = self
            .relations()
            .map(|(source, target, weight)| RelationSnapshot {
                source: source.to_string(),
                target: target.to_string(),
                weight,
            })
            .collect();
        relations.sort_by(|a, b| (a.source.as_str(), a.target.as_str()).cmp(&(b.source.as_str(), b.target.as_str())));

        WebSnapshot {
            scenario: scenario.to_string(),
            step,
            species,
            relations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesSnapshot {
    pub name: String,
    pub energy: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    pub source: String,
    pub target: String,
    pub weight: i64,
}

/// Read-only view of the web served to the visualization collaborator.
/// Species and relations come sorted so snapshots of equal graphs compare
/// equal regardless of construction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSnapshot {
    pub scenario: String,
    pub step: u64,
    pub species: Vec<SpeciesSnapshot>,
    pub relations: Vec<RelationSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_web() -> FoodWeb {
        let mut web = FoodWeb::new();
        web.add_species("Plants", 10).unwrap();
        web.add_species("Rabbits", 5).unwrap();
        web.add_species("Wolves", 3).unwrap();
        web.add_relation("Plants", "Rabbits", 3).unwrap();
        web.add_relation("Rabbits", "Wolves", 1).unwrap();
        web
    }

    #[test]
    fn add_and_query_species() {
        let web = small_web();
        assert!(web.has_species("Plants"));
        assert!(!web.has_species("Eagles"));
        assert_eq!(web.species_count(), 3);
        assert_eq!(web.energy_of("Rabbits"), Ok(5));
    }

    #[test]
    fn duplicate_species_is_rejected() {
        let mut web = small_web();
        assert_eq!(
            web.add_species("Plants", 1),
            Err(GraphError::DuplicateSpecies("Plants".into()))
        );
        assert_eq!(web.energy_of("Plants"), Ok(10));
    }

    #[test]
    fn relation_requires_both_endpoints() {
        let mut web = small_web();
        assert_eq!(
            web.add_relation("Plants", "Eagles", 2),
            Err(GraphError::UnknownSpecies("Eagles".into()))
        );
        assert_eq!(
            web.add_relation("Eagles", "Plants", 2),
            Err(GraphError::UnknownSpecies("Eagles".into()))
        );
        assert_eq!(web.relation_count(), 2);
    }

    #[test]
    fn successors_and_predecessors_follow_edge_direction() {
        let web = small_web();
        assert_eq!(web.successors("Plants"), vec!["Rabbits"]);
        assert_eq!(web.predecessors("Wolves"), vec!["Rabbits"]);
        assert!(web.predecessors("Plants").is_empty());
        assert!(web.successors("Wolves").is_empty());
        assert!(web.successors("Eagles").is_empty());
    }

    #[test]
    fn successor_order_is_insertion_order() {
        let mut web = FoodWeb::new();
        for name in ["A", "C", "B", "D"] {
            web.add_species(name, 1).unwrap();
        }
        web.add_relation("A", "C", 1).unwrap();
        web.add_relation("A", "B", 1).unwrap();
        web.add_relation("A", "D", 1).unwrap();
        assert_eq!(web.successors("A"), vec!["C", "B", "D"]);
    }

    #[test]
    fn re_adding_a_relation_overwrites_weight_in_place() {
        let mut web = small_web();
        web.add_relation("Plants", "Rabbits", 7).unwrap();
        assert_eq!(web.relation_weight("Plants", "Rabbits"), Some(7));
        assert_eq!(web.relation_count(), 2);
        assert_eq!(web.successors("Plants"), vec!["Rabbits"]);
    }

    #[test]
    fn remove_species_cleans_both_directions() {
        let mut web = small_web();
        web.remove_species("Rabbits");
        assert!(!web.has_species("Rabbits"));
        assert!(web.successors("Plants").is_empty());
        assert!(web.predecessors("Wolves").is_empty());
        assert_eq!(web.relation_count(), 0);
        assert_eq!(web.species_count(), 2);
    }

    #[test]
    fn remove_absent_species_is_a_no_op() {
        let mut web = small_web();
        web.remove_species("Eagles");
        assert_eq!(web.species_count(), 3);
        assert_eq!(web.relation_count(), 2);
    }

    #[test]
    fn energy_can_be_overwritten() {
        let mut web = small_web();
        web.set_energy("Wolves", -2).unwrap();
        assert_eq!(web.energy_of("Wolves"), Ok(-2));
        assert_eq!(
            web.set_energy("Eagles", 1),
            Err(GraphError::UnknownSpecies("Eagles".into()))
        );
    }

    #[test]
    fn snapshot_is_sorted_and_complete() {
        let web = small_web();
        let snapshot = web.snapshot("test", 0);
        let names: Vec<_> = snapshot.species.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Plants", "Rabbits", "Wolves"]);
        assert_eq!(snapshot.relations.len(), 2);
        assert_eq!(snapshot.relations[0].source, "Plants");
        assert_eq!(snapshot.relations[0].weight, 3);

        let mut other = FoodWeb::new();
        other.add_species("Wolves", 3).unwrap();
        other.add_species("Rabbits", 5).unwrap();
        other.add_species("Plants", 10).unwrap();
        other.add_relation("Rabbits", "Wolves", 1).unwrap();
        other.add_relation("Plants", "Rabbits", 3).unwrap();
        assert_eq!(other.snapshot("test", 0), snapshot);
    }
}
