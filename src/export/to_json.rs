use crate::mld::Mld;
use std::error::Error;

/// Logical model as pretty JSON, for tooling and inspection.
pub fn render(mld: &Mld) -> Result<String, Box<dyn Error>> {
    use serde_json::json;

    let res = json!({
        "tables": mld.tables,
    });
    Ok(serde_json::to_string_pretty(&res)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Attribute, Diagram, Entity};
    use crate::mld;

    #[test]
    fn test_render_lists_tables_and_columns() {
        let mut diagram = Diagram::default();
        let mut customer = Entity::new("Customer");
        customer.add_attribute(Attribute::primary_key("id_customer", "INT"));
        diagram.add_entity(customer);

        let mld = mld::derive(&diagram).unwrap();
        let out = render(&mld).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["tables"][0]["name"], "customer");
        assert_eq!(value["tables"][0]["columns"][0]["name"], "id_customer");
        assert_eq!(value["tables"][0]["columns"][0]["is_primary_key"], true);
    }
}
