use include_dir::{include_dir, Dir};
use std::fs;
use std::path::Path;
use tracing::{error, info};

static SAMPLE_DIR: Dir = include_dir!("sample");

pub fn generate_template(exporter: String) {
    info!("Generating exporter template: {}", exporter);
    match exporter.as_str() {
        "mermaid" => {
            println!("{}", crate::export::to_mermaid::get_template());
        }
        "sql" => {
            // The SQL emitter has no template; its fixed type table is the
            // useful reference.
            println!("{}", crate::export::to_sql::SUPPORTED_TYPES.join("\n"));
        }
        _ => {
            error!("Unsupported exporter: {} - use mermaid, sql", exporter);
        }
    }
}

pub fn generate_sample(dir: String) {
    info!("Generating sample project: {:?}", dir);
    let target_path = Path::new(&dir);
    if let Err(e) = fs::create_dir_all(target_path) {
        error!("Failed to create target directory: {:?}", e);
        return;
    }

    fn write_dir_contents(dir: &Dir, target_path: &Path) {
        for file in dir.files() {
            let relative_path = file.path();
            let target_file_path = target_path.join(relative_path);

            if let Some(parent) = target_file_path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("Failed to create directory: {:?}", e);
                    return;
                }
            }

            if let Err(e) = fs::write(&target_file_path, file.contents()) {
                error!("Failed to write file: {:?}", e);
                return;
            }
        }

        for sub_dir in dir.dirs() {
            let sub_dir_path = target_path.join(sub_dir.path());
            if let Err(e) = fs::create_dir_all(&sub_dir_path) {
                error!("Failed to create directory: {:?}", e);
                return;
            }
            write_dir_contents(sub_dir, target_path);
        }
    }

    write_dir_contents(&SAMPLE_DIR, target_path);
    info!("Sample project written to {:?}", dir);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_project_parses_and_derives() {
        let sample = SAMPLE_DIR
            .get_file("shop.asip")
            .expect("embedded sample present");
        let content = std::str::from_utf8(sample.contents()).unwrap();

        let diagram = crate::project::from_json(content).unwrap();
        assert!(diagram.verify_integrity().is_ok());
        assert!(diagram.lint().is_empty());

        let mld = crate::mld::derive(&diagram).unwrap();
        assert!(mld.tables.len() >= 3);
    }

    #[test]
    fn test_generate_sample_writes_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("sample");
        generate_sample(target.to_str().unwrap().to_string());
        assert!(target.join("shop.asip").exists());
    }
}
