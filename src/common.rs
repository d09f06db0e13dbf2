use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;
use tracing::info;

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn create_path_if_not_exists(path: &str) -> anyhow::Result<()> {
    let path = Path::new(path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid path: no parent directory for '{}'", path))?;
    if !path.as_os_str().is_empty() && !path.exists() {
        info!("Creating path: {:?}", path);
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn write_string_to_file(filename: &str, content: &str) -> anyhow::Result<()> {
    create_path_if_not_exists(filename)?;
    let path = Path::new(filename);
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn get_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    handlebars_helper!(exists: |v: Value| !v.is_null());
    handlebars.register_helper("exists", Box::new(exists));

    handlebars_helper!(isnull: |v: Value| v.is_null());
    handlebars.register_helper("isnull", Box::new(isnull));

    handlebars_helper!(stringeq: |s1: String, s2: String| s1.eq(&s2));
    handlebars.register_helper("stringeq", Box::new(stringeq));

    // Crow's-foot end for a MERISE cardinality pair, e.g. "0,N" on the left
    // side of a Mermaid relationship renders as "}o".
    handlebars_helper!(crowfoot: |card: String, side: String| {
        match (card.as_str(), side.as_str()) {
            ("0,1", "left") => "|o",
            ("0,1", _) => "o|",
            ("1,1", _) => "||",
            ("0,N", "left") => "}o",
            ("0,N", _) => "o{",
            ("1,N", "left") => "}|",
            _ => "|{",
        }
    });
    handlebars.register_helper("crowfoot", Box::new(crowfoot));

    handlebars
}
