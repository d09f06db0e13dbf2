use crate::mld::{Mld, Table};
use std::error::Error;
use tracing::warn;

/// PostgreSQL types the emitter passes through unchanged. Anything else is
/// downgraded to TEXT with an annotation on the column line.
pub const SUPPORTED_TYPES: &[&str] = &[
    "INT",
    "INTEGER",
    "BIGINT",
    "SMALLINT",
    "SERIAL",
    "VARCHAR",
    "CHAR",
    "TEXT",
    "BOOLEAN",
    "DATE",
    "TIME",
    "TIMESTAMP",
    "DECIMAL",
    "NUMERIC",
    "FLOAT",
    "DOUBLE PRECISION",
    "REAL",
];

/// Renders `CREATE TABLE` statements, one per table in derivation order,
/// separated by a blank line.
pub fn render(mld: &Mld) -> Result<String, Box<dyn Error>> {
    let statements: Vec<String> = mld.tables.iter().map(render_table).collect();
    Ok(format!("{}\n", statements.join("\n\n")))
}

fn render_table(table: &Table) -> String {
    let single_pk = table.primary_keys().len() == 1;

    // (declaration, optional annotation) per line; the comma has to land
    // before the annotation or it would be commented out.
    let mut parts: Vec<(String, Option<String>)> = Vec::new();

    for column in &table.columns {
        let (sql_type, known) = resolve_type(&column.data_type);
        let mut decl = format!("    {} {}", column.name, sql_type);

        if column.is_primary_key && single_pk {
            decl.push_str(" PRIMARY KEY");
        } else if !column.is_nullable && !column.is_primary_key {
            decl.push_str(" NOT NULL");
        }

        if let (Some(ref_table), Some(ref_column)) =
            (&column.references_table, &column.references_column)
        {
            decl.push_str(&format!(" REFERENCES {}({})", ref_table, ref_column));
        }

        let annotation = if known {
            None
        } else {
            warn!(
                "Unknown type '{}' for column '{}.{}', emitting TEXT",
                column.data_type, table.name, column.name
            );
            Some(format!("-- unknown type '{}'", column.data_type))
        };
        parts.push((decl, annotation));
    }

    if !single_pk && !table.primary_keys().is_empty() {
        let keys: Vec<&str> = table.primary_keys().iter().map(|c| c.name.as_str()).collect();
        parts.push((format!("    PRIMARY KEY ({})", keys.join(", ")), None));
    }

    let mut lines = Vec::new();
    for (i, (decl, annotation)) in parts.iter().enumerate() {
        let comma = if i + 1 < parts.len() { "," } else { "" };
        match annotation {
            Some(annotation) => lines.push(format!("{}{} {}", decl, comma, annotation)),
            None => lines.push(format!("{}{}", decl, comma)),
        }
    }

    format!("CREATE TABLE {} (\n{}\n);", table.name, lines.join("\n"))
}

/// Maps a model type onto the PostgreSQL type table, keeping any size suffix.
/// Returns the rendered type and whether it was recognized.
fn resolve_type(data_type: &str) -> (String, bool) {
    let (base, suffix) = match data_type.find('(') {
        Some(idx) => (&data_type[..idx], &data_type[idx..]),
        None => (data_type, ""),
    };
    let base = base.trim().to_uppercase();
    if SUPPORTED_TYPES.contains(&base.as_str()) {
        (format!("{}{}", base, suffix), true)
    } else {
        ("TEXT".to_string(), false)
    }
}
