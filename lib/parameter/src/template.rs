use crate::error::{ParameterError, Result};

/// Substitutes every `{{key}}` placeholder in `template` with the JSON
/// encoding of `values(key)`, then parses the result back as JSON. Using
/// the JSON encoding (not the raw string) keeps the substitution valid
/// regardless of whether the placeholder sits in a quoted or unquoted
/// position, as long as the author wrote the template accordingly.
/// `values` is a lookup closure rather than a concrete map so both
/// parameter-local (`IndexMap`) and configuration-level resolved
/// property maps can render through the same logic.
pub fn render(
  parameter_name: &str,
  template: &str,
  values: impl Fn(&str) -> Option<serde_json::Value>,
) -> Result<serde_json::Value> {
  let mut rendered = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(start) = rest.find("{{") {
    rendered.push_str(&rest[..start]);
    let after_open = &rest[start + 2..];
    let Some(end) = after_open.find("}}") else {
      rendered.push_str("{{");
      rest = after_open;
      continue;
    };
    let key = after_open[..end].trim();
    match values(key) {
      Some(value) => rendered.push_str(&value.to_string()),
      None => {
        return Err(ParameterError::UnknownTemplateKey(
          parameter_name.to_string(),
          key.to_string(),
        ));
      }
    }
    rest = &after_open[end + 2..];
  }
  rendered.push_str(rest);

  serde_json::from_str(&rendered)
    .map_err(|e| ParameterError::InvalidJson(parameter_name.to_string(), e))
}
