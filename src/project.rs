use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::diagram::{Association, Diagram, Entity, FkOverride, Link};

/// Versioned JSON project format (`.asip` / `.merisio`).
///
/// Loading is all-or-nothing: a document that is malformed, missing required
/// fields, or carries an unknown version is rejected as a whole so the
/// caller's previous state survives.
pub const PROJECT_VERSION: &str = "2.0";

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to read project file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed project document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project document has no version field")]
    MissingVersion,
    #[error("unsupported project version '{found}' (expected '{}')", PROJECT_VERSION)]
    UnsupportedVersion { found: String },
}

#[derive(Serialize, Deserialize, Debug)]
struct ProjectDocument {
    version: String,
    #[serde(default)]
    name: String,
    mcd: McdSection,
    #[serde(default)]
    fk_overrides: Vec<FkOverride>,
}

#[derive(Serialize, Deserialize, Debug)]
struct McdSection {
    entities: Vec<Entity>,
    associations: Vec<Association>,
    links: Vec<Link>,
}

pub fn to_json(diagram: &Diagram) -> Result<String, FormatError> {
    let document = ProjectDocument {
        version: PROJECT_VERSION.to_string(),
        name: diagram.name.clone(),
        mcd: McdSection {
            entities: diagram.entities.clone(),
            associations: diagram.associations.clone(),
            links: diagram.links.clone(),
        },
        fk_overrides: diagram.fk_overrides.clone(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn from_json(content: &str) -> Result<Diagram, FormatError> {
    // Version is checked before the full parse so a document from a newer
    // schema reports the version mismatch, not a shape error.
    let value: serde_json::Value = serde_json::from_str(content)?;
    let version = value
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or(FormatError::MissingVersion)?;
    if version != PROJECT_VERSION {
        return Err(FormatError::UnsupportedVersion {
            found: version.to_string(),
        });
    }

    let document: ProjectDocument = serde_json::from_value(value)?;
    debug!(
        "Parsed project '{}' with {} entities",
        document.name,
        document.mcd.entities.len()
    );

    Ok(Diagram {
        name: document.name,
        entities: document.mcd.entities,
        associations: document.mcd.associations,
        links: document.mcd.links,
        fk_overrides: document.fk_overrides,
    })
}

pub fn load_project(path: &Path) -> Result<Diagram, FormatError> {
    let content = std::fs::read_to_string(path)?;
    let diagram = from_json(&content)?;
    info!("Loaded project {} ({})", path.display(), diagram.stats());
    Ok(diagram)
}

pub fn save_project(path: &Path, diagram: &Diagram) -> Result<(), FormatError> {
    let content = to_json(diagram)?;
    std::fs::write(path, content)?;
    info!("Saved project {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Attribute, CardMax, CardMin};

    fn create_test_diagram() -> Diagram {
        let mut diagram = Diagram {
            name: "Shop".to_string(),
            ..Diagram::default()
        };

        let mut customer = Entity::new("Customer");
        customer.add_attribute(Attribute::primary_key("id_customer", "INT"));
        customer.add_attribute(Attribute::sized("name", "VARCHAR", 100));
        customer.x = 40.0;
        customer.y = 120.0;

        let mut invoice = Entity::new("Invoice");
        invoice.add_attribute(Attribute::primary_key("id_invoice", "INT"));

        let order = Association::new("Order");
        let link = Link::new(&customer.id, &order.id, CardMin::Zero, CardMax::Many);
        diagram.set_fk_override(&order.id, &customer.id, "buyer_id");

        diagram.add_entity(customer);
        diagram.add_entity(invoice);
        diagram.add_association(order);
        diagram.add_link(link);

        diagram
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let diagram = create_test_diagram();
        let json = to_json(&diagram).unwrap();
        let restored = from_json(&json).unwrap();
        assert_eq!(restored, diagram);
    }

    #[test]
    fn test_document_uses_original_field_keys() {
        let diagram = create_test_diagram();
        let json = to_json(&diagram).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], PROJECT_VERSION);
        let attr = &value["mcd"]["entities"][0]["attributes"][0];
        assert_eq!(attr["type"], "INT");
        assert_eq!(attr["pk"], true);
        let link = &value["mcd"]["links"][0];
        assert_eq!(link["card_min"], "0");
        assert_eq!(link["card_max"], "N");
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let err = from_json(r#"{"mcd": {"entities": [], "associations": [], "links": []}}"#)
            .unwrap_err();
        assert!(matches!(err, FormatError::MissingVersion));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let err = from_json(
            r#"{"version": "9.9", "mcd": {"entities": [], "associations": [], "links": []}}"#,
        )
        .unwrap_err();
        match err {
            FormatError::UnsupportedVersion { found } => assert_eq!(found, "9.9"),
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        // Entity without an id
        let err = from_json(
            r#"{"version": "2.0", "mcd": {"entities": [{"name": "Customer", "attributes": []}], "associations": [], "links": []}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::Json(_)));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = from_json("{not json").unwrap_err();
        assert!(matches!(err, FormatError::Json(_)));
    }

    #[test]
    fn test_optional_fields_take_defaults() {
        let json = r#"{
            "version": "2.0",
            "mcd": {
                "entities": [{"id": "e1", "name": "Customer", "attributes": [{"name": "id", "type": "INT"}]}],
                "associations": [],
                "links": []
            }
        }"#;
        let diagram = from_json(json).unwrap();
        assert_eq!(diagram.name, "");
        assert!(diagram.fk_overrides.is_empty());
        let attr = &diagram.entities[0].attributes[0];
        assert_eq!(attr.size, None);
        assert!(!attr.is_primary_key);
        assert_eq!(diagram.entities[0].x, 0.0);
    }

    #[test]
    fn test_save_and_load_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shop.asip");
        let diagram = create_test_diagram();

        save_project(&path, &diagram).unwrap();
        let restored = load_project(&path).unwrap();
        assert_eq!(restored, diagram);
    }
}
