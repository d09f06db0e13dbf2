use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::diagram::{Association, Diagram, Entity, Link};

/// MCD → MLD derivation.
///
/// Every entity becomes a table. Associations either collapse into the table
/// on their max-1 side (one-to-many and one-to-one) or become a junction
/// table of their own (many-to-many, or more than two links). The whole pass
/// is a pure function of the diagram plus its FK override map.

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("diagram failed integrity checks: {}", .0.join("; "))]
    InvalidDiagram(Vec<String>),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub references_table: Option<String>,
    pub references_column: Option<String>,
    pub is_nullable: bool,
}

impl Column {
    fn plain(name: String, data_type: String, is_primary_key: bool) -> Self {
        Self {
            name,
            data_type,
            is_primary_key,
            is_foreign_key: false,
            references_table: None,
            references_column: None,
            is_nullable: !is_primary_key,
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableSource {
    Entity,
    Association,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub source: TableSource,
    pub source_id: String,
}

impl Table {
    pub fn primary_keys(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }

    pub fn foreign_keys(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_foreign_key).collect()
    }
}

/// Derived logical model. Table order follows entity then association
/// creation order.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Mld {
    pub tables: Vec<Table>,
}

impl Mld {
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

pub fn derive(diagram: &Diagram) -> Result<Mld, DeriveError> {
    diagram
        .verify_integrity()
        .map_err(DeriveError::InvalidDiagram)?;

    let mut tables: Vec<Table> = Vec::new();
    let mut entity_tables: IndexMap<&str, usize> = IndexMap::new();

    for entity in &diagram.entities {
        entity_tables.insert(entity.id.as_str(), tables.len());
        tables.push(entity_table(entity));
    }

    for association in &diagram.associations {
        let links = diagram.links_for_association(&association.id);
        if links.len() < 2 {
            debug!(
                "Association '{}' has {} link(s), skipping",
                association.name,
                links.len()
            );
            continue;
        }

        let multiple = links.iter().filter(|l| l.is_multiple()).count();
        if links.len() > 2 || multiple >= 2 {
            tables.push(junction_table(diagram, association, &links));
        } else {
            let (host, referenced) = collapse_sides(&links);
            collapse_association(diagram, association, host, referenced, &mut tables, &entity_tables);
        }
    }

    Ok(Mld { tables })
}

fn entity_table(entity: &Entity) -> Table {
    let columns = entity
        .attributes
        .iter()
        .map(|attr| {
            Column::plain(
                safe_name(&attr.name),
                attr.sql_type(),
                attr.is_primary_key,
            )
        })
        .collect();

    Table {
        name: safe_name(&entity.name),
        columns,
        source: TableSource::Entity,
        source_id: entity.id.clone(),
    }
}

/// Picks which side of a binary association takes the foreign key. Returns
/// (host link, referenced link). With a single max-N side the max-1 side
/// hosts; when both sides are max-1 the mandatory side hosts, first-created
/// link breaking the tie.
fn collapse_sides<'a>(links: &[&'a Link]) -> (&'a Link, &'a Link) {
    let (a, b) = (links[0], links[1]);
    match (a.is_multiple(), b.is_multiple()) {
        (true, false) => (b, a),
        (false, true) => (a, b),
        _ => {
            if b.is_mandatory() && !a.is_mandatory() {
                (b, a)
            } else {
                (a, b)
            }
        }
    }
}

fn collapse_association(
    diagram: &Diagram,
    association: &Association,
    host: &Link,
    referenced: &Link,
    tables: &mut [Table],
    entity_tables: &IndexMap<&str, usize>,
) {
    // Integrity check passed, so both endpoints exist.
    let Some(referenced_entity) = diagram.get_entity(&referenced.entity_id) else {
        return;
    };
    let Some(&table_idx) = entity_tables.get(host.entity_id.as_str()) else {
        return;
    };
    let table = &mut tables[table_idx];

    let nullable = !host.is_mandatory();
    for column in fk_columns(diagram, association, referenced_entity, nullable, false) {
        if table.columns.iter().any(|c| c.name == column.name) {
            debug!(
                "Column '{}' already exists on table '{}', skipping",
                column.name, table.name
            );
            continue;
        }
        table.columns.push(column);
    }

    for attr in &association.attributes {
        let column = Column::plain(safe_name(&attr.name), attr.sql_type(), false);
        if !table.columns.iter().any(|c| c.name == column.name) {
            table.columns.push(column);
        }
    }
}

fn junction_table(diagram: &Diagram, association: &Association, links: &[&Link]) -> Table {
    let mut columns = Vec::new();

    for link in links {
        if let Some(entity) = diagram.get_entity(&link.entity_id) {
            columns.extend(fk_columns(diagram, association, entity, false, true));
        }
    }

    for attr in &association.attributes {
        columns.push(Column::plain(safe_name(&attr.name), attr.sql_type(), false));
    }

    Table {
        name: safe_name(&association.name),
        columns,
        source: TableSource::Association,
        source_id: association.id.clone(),
    }
}

/// Foreign-key columns referencing an entity's primary key. One column per
/// key attribute; the user override map wins over the default
/// `<referenced_table>_id` name when the key is a single attribute.
fn fk_columns(
    diagram: &Diagram,
    association: &Association,
    referenced: &Entity,
    nullable: bool,
    part_of_pk: bool,
) -> Vec<Column> {
    let ref_table = safe_name(&referenced.name);
    let pks = referenced.primary_keys();
    if pks.is_empty() {
        debug!(
            "Entity '{}' has no primary key, no foreign key generated",
            referenced.name
        );
        return Vec::new();
    }

    pks.iter()
        .map(|pk| {
            let name = if pks.len() == 1 {
                diagram
                    .fk_override(&association.id, &referenced.id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}_id", ref_table))
            } else {
                format!("{}_{}", ref_table, safe_name(&pk.name))
            };
            Column {
                name,
                data_type: pk.sql_type(),
                is_primary_key: part_of_pk,
                is_foreign_key: true,
                references_table: Some(ref_table.clone()),
                references_column: Some(safe_name(&pk.name)),
                is_nullable: nullable && !part_of_pk,
            }
        })
        .collect()
}

/// Lowercased SQL-safe identifier: spaces and hyphens become underscores,
/// anything else non-alphanumeric is stripped.
pub fn safe_name(name: &str) -> String {
    name.to_lowercase()
        .replace([' ', '-'], "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
