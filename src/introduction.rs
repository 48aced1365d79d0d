use serde::{Deserialize, Serialize};

use crate::graph::{FoodWeb, GraphError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub species: String,
    pub weight: i64,
}

/// A fully described newcomer: its starting energy, the species it feeds
/// on (`prey`, edges pointing at the newcomer) and the species that feed
/// on it (`consumers`, edges leaving it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Introduction {
    pub name: String,
    pub energy: i64,
    #[serde(default)]
    pub prey: Vec<LinkSpec>,
    #[serde(default)]
    pub consumers: Vec<LinkSpec>,
}

/// Apply an introduction to the web as one transaction-like sequence:
/// everything is validated up front, so a failing introduction leaves the
/// web exactly as it was.
///
/// Rules enforced here (the graph primitives stay permissive): the name
/// must be free, starting energy must be non-negative, every linked
/// species must already exist (which also rejects self-references, since
/// the newcomer is not in the web yet), and every weight must be positive.
pub fn introduce(web: &mut FoodWeb, intro: &Introduction) -> Result<(), GraphError> {
    if web.has_species(&intro.name) {
        return Err(GraphError::DuplicateSpecies(intro.name.clone()));
    }
    if intro.energy < 0 {
        return Err(GraphError::NegativeEnergy {
            species: intro.name.clone(),
            energy: intro.energy,
        });
    }
    for link in &intro.prey {
        check_link(web, &link.species, &intro.name, link.weight, true)?;
    }
    for link in &intro.consumers {
        check_link(web, &intro.name, &link.species, link.weight, false)?;
    }

    web.add_species(&intro.name, intro.energy)?;
    for link in &intro.prey {
        web.add_relation(&link.species, &intro.name, link.weight)?;
    }
    for link in &intro.consumers {
        web.add_relation(&intro.name, &link.species, link.weight)?;
    }
    Ok(())
}

fn check_link(
    web: &FoodWeb,
    source: &str,
    target: &str,
    weight: i64,
    partner_is_source: bool,
) -> Result<(), GraphError> {
    let partner = if partner_is_source { source } else { target };
    if !web.has_species(partner) {
        return Err(GraphError::UnknownSpecies(partner.to_string()));
    }
    if weight <= 0 {
        return Err(GraphError::NonPositiveWeight {
            source: source.to_string(),
            target: target.to_string(),
            weight,
        });
    }
    Ok(())
}
