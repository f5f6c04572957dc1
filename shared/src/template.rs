//! Page-supplied Handlebars templates rendered against JSON contexts.

use handlebars::Handlebars;
use serde_json::{Number, Value};

use crate::error::DashboardError;

/// Compiled templates keyed by the id of the page element they came from.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl Templates {
    pub fn new() -> Self {
        Self {
            registry: Handlebars::new(),
        }
    }

    /// Compile `source` under `id`, replacing any earlier template of that name.
    pub fn register(&mut self, id: &str, source: &str) -> Result<(), DashboardError> {
        self.registry
            .register_template_string(id, source)
            .map_err(|err| {
                let (line, column) = err.pos().unwrap_or((0, 0));
                DashboardError::Template {
                    line,
                    column,
                    message: err.to_string(),
                }
            })
    }

    pub fn has(&self, id: &str) -> bool {
        self.registry.has_template(id)
    }

    pub fn render(&self, id: &str, context: &Value) -> Result<String, DashboardError> {
        self.registry
            .render(id, &whole_numbers_as_integers(context))
            .map_err(|err| DashboardError::Render(err.to_string()))
    }
}

/// `2.0` prints as `2` in the page, the way the browser formats numbers.
fn whole_numbers_as_integers(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_none() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Value::Number(Number::from(f as i64)),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(whole_numbers_as_integers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), whole_numbers_as_integers(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::Templates;
    use crate::error::DashboardError;
    use serde_json::json;

    fn render(source: &str, context: serde_json::Value) -> String {
        let mut templates = Templates::new();
        templates.register("t", source).expect("compile");
        templates.render("t", &context).expect("render")
    }

    #[test]
    fn substitutes_and_escapes_variables() {
        assert_eq!(
            render("<h2>{{title}}</h2>{{{html}}}", json!({"title": "A & B", "html": "<b>x</b>"})),
            "<h2>A &amp; B</h2><b>x</b>"
        );
        assert_eq!(render("{{q}}", json!({"q": "\"x\""})), "&quot;x&quot;");
    }

    #[test]
    fn resolves_dotted_paths_and_missing_values() {
        assert_eq!(
            render("{{org.name}}|{{org.missing}}|{{nope.deeper}}", json!({"org": {"name": "Ashby"}})),
            "Ashby||"
        );
    }

    #[test]
    fn whole_floats_print_without_a_fraction() {
        assert_eq!(
            render("{{a}} {{b}} {{c}} {{d}}", json!({"a": 3, "b": 2.0, "c": 12.5, "d": true})),
            "3 2 12.5 true"
        );
        assert_eq!(render("{{#each xs}}{{this}};{{/each}}", json!({"xs": [250.0, 0.5]})), "250;0.5;");
    }

    #[test]
    fn chained_else_if_picks_the_first_true_branch() {
        let source = "{{#if a}}A{{else if b}}B{{else}}C{{/if}}";
        assert_eq!(render(source, json!({"a": false, "b": true})), "B");
        assert_eq!(render(source, json!({"a": true, "b": true})), "A");
        assert_eq!(render(source, json!({})), "C");
    }

    #[test]
    fn if_and_unless_treat_empty_values_as_false() {
        let source = "{{#if v}}yes{{else}}no{{/if}}/{{#unless v}}u{{/unless}}";
        assert_eq!(render(source, json!({"v": 1})), "yes/");
        assert_eq!(render(source, json!({"v": 0})), "no/u");
        assert_eq!(render(source, json!({"v": ""})), "no/u");
        assert_eq!(render(source, json!({"v": []})), "no/u");
        assert_eq!(render(source, json!({})), "no/u");
    }

    #[test]
    fn each_exposes_position_markers_and_parent_scope() {
        let source = "{{#each xs}}{{#if @first}}[{{/if}}{{@index}}:{{this}}@{{../org}}{{#unless @last}},{{/unless}}{{else}}none{{/each}}";
        assert_eq!(render(source, json!({"org": "X", "xs": ["a", "b"]})), "[0:a@X,1:b@X");
        assert_eq!(render(source, json!({"org": "X", "xs": []})), "none");
    }

    #[test]
    fn each_over_objects_exposes_keys() {
        assert_eq!(
            render("{{#each m}}{{@key}}={{this.v}} {{/each}}", json!({"m": {"a": {"v": 1}, "b": {"v": 2}}})),
            "a=1 b=2 "
        );
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(render("a{{! note }}b", json!({})), "ab");
    }

    #[test]
    fn rejects_malformed_templates() {
        for source in ["{{#if x}}open", "{{#if x}}a{{/each}}", "{{name"] {
            let mut templates = Templates::new();
            assert!(
                matches!(templates.register("bad", source), Err(DashboardError::Template { .. })),
                "{source} should not compile"
            );
            assert!(!templates.has("bad"));
        }
    }

    #[test]
    fn rendering_an_unknown_id_is_an_error() {
        let templates = Templates::new();
        assert!(matches!(templates.render("missing", &json!({})), Err(DashboardError::Render(_))));
    }
}
