use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// In-memory MCD: entities and associations joined by cardinality-carrying
/// links. Element vectors keep creation order, which is what makes MLD
/// derivation and DDL output stable across runs.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Diagram {
    #[serde(default)]
    pub name: String,
    pub entities: Vec<Entity>,
    pub associations: Vec<Association>,
    pub links: Vec<Link>,
    #[serde(default)]
    pub fk_overrides: Vec<FkOverride>,
}

impl Diagram {
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn set_entity(&mut self, entity: Entity) {
        let idx = self.entities.iter().position(|e| e.id == entity.id);
        if let Some(idx) = idx {
            self.entities[idx] = entity;
        } else {
            self.entities.push(entity);
        }
    }

    /// Removes an entity together with its links and FK overrides.
    pub fn remove_entity(&mut self, id: &str) {
        self.entities.retain(|e| e.id != id);
        self.links.retain(|l| l.entity_id != id);
        self.fk_overrides.retain(|o| o.entity_id != id);
    }

    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn add_association(&mut self, association: Association) {
        self.associations.push(association);
    }

    /// Removes an association together with its links and FK overrides.
    pub fn remove_association(&mut self, id: &str) {
        self.associations.retain(|a| a.id != id);
        self.links.retain(|l| l.association_id != id);
        self.fk_overrides.retain(|o| o.association_id != id);
    }

    pub fn get_association(&self, id: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.id == id)
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn remove_link(&mut self, id: &str) {
        self.links.retain(|l| l.id != id);
    }

    pub fn get_link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn links_for_entity(&self, entity_id: &str) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| l.entity_id == entity_id)
            .collect()
    }

    pub fn links_for_association(&self, association_id: &str) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| l.association_id == association_id)
            .collect()
    }

    pub fn entities_for_association(&self, association_id: &str) -> Vec<&Entity> {
        self.links_for_association(association_id)
            .iter()
            .filter_map(|l| self.get_entity(&l.entity_id))
            .collect()
    }

    /// Records a user rename for the FK column derived for the given
    /// (association, referenced entity) pair. Replaces any previous rename.
    pub fn set_fk_override(&mut self, association_id: &str, entity_id: &str, column: &str) {
        if let Some(existing) = self
            .fk_overrides
            .iter_mut()
            .find(|o| o.association_id == association_id && o.entity_id == entity_id)
        {
            existing.column = column.to_string();
        } else {
            self.fk_overrides.push(FkOverride {
                association_id: association_id.to_string(),
                entity_id: entity_id.to_string(),
                column: column.to_string(),
            });
        }
    }

    pub fn fk_override(&self, association_id: &str, entity_id: &str) -> Option<&str> {
        self.fk_overrides
            .iter()
            .find(|o| o.association_id == association_id && o.entity_id == entity_id)
            .map(|o| o.column.as_str())
    }

    pub fn stats(&self) -> String {
        format!(
            "Entities: {}, Associations: {}, Links: {}",
            self.entities.len(),
            self.associations.len(),
            self.links.len()
        )
    }

    /// Structural integrity check. Derivation refuses to run on a diagram
    /// that fails this.
    pub fn verify_integrity(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut entity_ids: HashSet<&str> = HashSet::new();
        for entity in &self.entities {
            if !entity_ids.insert(&entity.id) {
                errors.push(format!("Duplicate entity id: [{}]", entity.id));
            }
        }

        let mut association_ids: HashSet<&str> = HashSet::new();
        for association in &self.associations {
            if !association_ids.insert(&association.id) {
                errors.push(format!("Duplicate association id: [{}]", association.id));
            }
        }

        let mut link_ids: HashSet<&str> = HashSet::new();
        for link in &self.links {
            if !link_ids.insert(&link.id) {
                errors.push(format!("Duplicate link id: [{}]", link.id));
            }
            if !entity_ids.contains(link.entity_id.as_str()) {
                errors.push(format!(
                    "Link id:[{}] entity {:?} not found in entities",
                    link.id, link.entity_id
                ));
            }
            if !association_ids.contains(link.association_id.as_str()) {
                errors.push(format!(
                    "Link id:[{}] association {:?} not found in associations",
                    link.id, link.association_id
                ));
            }
        }

        if errors.is_empty() {
            debug!("All links have valid entity and association endpoints");
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Modeling warnings. These do not block derivation; they flag diagrams
    /// that will produce a degenerate schema.
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.entities.is_empty() {
            warnings.push("No entities defined. Add at least one entity.".to_string());
        }

        for entity in &self.entities {
            if !entity.attributes.iter().any(|a| a.is_primary_key) {
                warnings.push(format!(
                    "Entity '{}' has no primary key attribute.",
                    entity.name
                ));
            }
            if self.links_for_entity(&entity.id).is_empty() && !self.associations.is_empty() {
                warnings.push(format!(
                    "Entity '{}' is not connected to any association.",
                    entity.name
                ));
            }
        }

        for association in &self.associations {
            if self.links_for_association(&association.id).len() < 2 {
                warnings.push(format!(
                    "Association '{}' must be connected to at least 2 entities.",
                    association.name
                ));
            }
        }

        warnings
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Entity {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            attributes: Vec::new(),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        if !self.attributes.iter().any(|a| a.name == attribute.name) {
            self.attributes.push(attribute);
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|a| a.name != name);
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn primary_keys(&self) -> Vec<&Attribute> {
        self.attributes.iter().filter(|a| a.is_primary_key).collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Association {
    pub id: String,
    pub name: String,
    /// Carrying attributes. Never primary keys.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Association {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            attributes: Vec::new(),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        if !self.attributes.iter().any(|a| a.name == attribute.name) {
            self.attributes.push(attribute);
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|a| a.name != name);
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// Free-form type name ("INT", "VARCHAR", ...). Resolved against the
    /// PostgreSQL type table only at SQL emission.
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(rename = "pk", default)]
    pub is_primary_key: bool,
}

impl Attribute {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            size: None,
            is_primary_key: false,
        }
    }

    pub fn primary_key(name: &str, data_type: &str) -> Self {
        Self {
            is_primary_key: true,
            ..Self::new(name, data_type)
        }
    }

    pub fn sized(name: &str, data_type: &str, size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::new(name, data_type)
        }
    }

    /// Type declaration with the size applied, e.g. `VARCHAR(100)`. Only
    /// sized types carry their size.
    pub fn sql_type(&self) -> String {
        match self.size {
            Some(size) if matches!(self.data_type.as_str(), "VARCHAR" | "CHAR" | "DECIMAL") => {
                format!("{}({})", self.data_type, size)
            }
            _ => self.data_type.clone(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pk_marker = if self.is_primary_key { " [PK]" } else { "" };
        write!(f, "{}: {}{}", self.name, self.sql_type(), pk_marker)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardMin {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardMax {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "N")]
    Many,
}

impl fmt::Display for CardMin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardMin::Zero => write!(f, "0"),
            CardMin::One => write!(f, "1"),
        }
    }
}

impl fmt::Display for CardMax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardMax::One => write!(f, "1"),
            CardMax::Many => write!(f, "N"),
        }
    }
}

/// Connects one entity to one association, carrying the entity's
/// participation cardinality.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Link {
    pub id: String,
    pub entity_id: String,
    pub association_id: String,
    pub card_min: CardMin,
    pub card_max: CardMax,
}

impl Link {
    pub fn new(entity_id: &str, association_id: &str, card_min: CardMin, card_max: CardMax) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entity_id: entity_id.to_string(),
            association_id: association_id.to_string(),
            card_min,
            card_max,
        }
    }

    /// max = N
    pub fn is_multiple(&self) -> bool {
        self.card_max == CardMax::Many
    }

    /// min = 1
    pub fn is_mandatory(&self) -> bool {
        self.card_min == CardMin::One
    }

    pub fn cardinality(&self) -> String {
        format!("{},{}", self.card_min, self.card_max)
    }
}

/// User rename of a derived foreign-key column, keyed by the association and
/// the referenced entity. Persisted with the project so renames survive
/// re-derivation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FkOverride {
    pub association_id: String,
    pub entity_id: String,
    pub column: String,
}
