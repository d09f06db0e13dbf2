pub mod to_json;
pub mod to_mermaid;
pub mod to_sql;
