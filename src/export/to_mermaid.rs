use crate::diagram::Diagram;
use crate::mld::safe_name;
use std::error::Error;

/// Renders the MCD as a Mermaid `erDiagram`: one block per entity, one
/// crow's-foot relationship line per association pair.
pub fn render(diagram: &Diagram) -> Result<String, Box<dyn Error>> {
    use serde_json::json;

    let entities: Vec<serde_json::Value> = diagram
        .entities
        .iter()
        .map(|entity| {
            json!({
                "table": safe_name(&entity.name),
                "attributes": entity.attributes.iter().map(|attr| json!({
                    "name": safe_name(&attr.name),
                    "type": attr.data_type.to_uppercase(),
                    "pk": attr.is_primary_key,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    let mut relationships = Vec::new();
    for association in &diagram.associations {
        let links = diagram.links_for_association(&association.id);
        if links.len() < 2 {
            continue;
        }
        // N-ary associations fan out from the first linked entity
        let first = links[0];
        let Some(left) = diagram.get_entity(&first.entity_id) else {
            continue;
        };
        for other in &links[1..] {
            let Some(right) = diagram.get_entity(&other.entity_id) else {
                continue;
            };
            relationships.push(json!({
                "left": safe_name(&left.name),
                "right": safe_name(&right.name),
                "left_card": first.cardinality(),
                "right_card": other.cardinality(),
                "label": association.name,
            }));
        }
    }

    let handlebars = crate::common::get_handlebars();
    let res = handlebars.render_template(
        &get_template(),
        &json!({
            "entities": entities,
            "relationships": relationships,
        }),
    )?;
    Ok(res)
}

pub fn get_template() -> String {
    let template = r##"erDiagram

{{#each entities as |entity|}}
    {{entity.table}} {
{{#each entity.attributes as |attr|}}
        {{attr.type}} {{attr.name}}{{#if attr.pk}} PK{{/if}}
{{/each}}
    }
{{/each}}
{{#each relationships as |rel|}}
    {{rel.left}} {{crowfoot rel.left_card "left"}}--{{crowfoot rel.right_card "right"}} {{rel.right}} : "{{rel.label}}"
{{/each}}
"##;

    template.to_string()
}
