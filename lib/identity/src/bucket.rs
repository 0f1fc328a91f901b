use crate::coordinate::Coordinate;

const MAX_BUCKET_NAME_LEN: usize = 100;

/// Derives the bucket name for a `Bucket` (Grail) configuration. The raw
/// form is `{project}_{configId}`; when `sanitize` is set, the result is
/// additionally lowercased and restricted to the tenant's bucket-name
/// grammar (`[a-z][a-z0-9][a-z0-9_-]+`: a lowercase letter, then a
/// lowercase letter or digit, then any run of lowercase letters, digits,
/// underscores, and hyphens), then truncated to `MAX_BUCKET_NAME_LEN` so
/// tenants that reject the raw form still accept it. Left off by default
/// to keep names byte-identical to the description's `configId`-derived
/// names.
pub fn bucket_name(c: &Coordinate, sanitize: bool) -> String {
  let raw = format!("{}_{}", c.project, c.config_id);
  if !sanitize {
    return raw;
  }

  let mut lowered: Vec<char> = raw.chars().map(|ch| ch.to_ascii_lowercase()).collect();
  if lowered.first().is_some_and(|ch| !ch.is_ascii_lowercase()) {
    lowered.insert(0, 'x');
  }

  let mut sanitized: String = lowered
    .iter()
    .enumerate()
    .map(|(i, &ch)| match i {
      0 => ch,
      1 if ch.is_ascii_alphanumeric() => ch,
      1 => '0',
      _ if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' => ch,
      _ => '_',
    })
    .collect();

  sanitized.truncate(MAX_BUCKET_NAME_LEN);
  sanitized
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_form_joins_project_and_config_id() {
    let c = Coordinate::new("project", "bucket", "my-logs");
    assert_eq!(bucket_name(&c, false), "project_my-logs");
  }

  #[test]
  fn sanitized_form_is_lowercase_and_keeps_hyphens() {
    let c = Coordinate::new("Project", "bucket", "My-Logs.V2");
    assert_eq!(bucket_name(&c, true), "project_my-logs_v2");
  }

  #[test]
  fn sanitized_form_prefixes_non_letter_leading_char() {
    let c = Coordinate::new("9lives", "bucket", "id");
    assert_eq!(bucket_name(&c, true), "x9lives_id");
  }

  #[test]
  fn sanitized_form_first_char_is_always_a_letter() {
    let c = Coordinate::new("_odd", "bucket", "id");
    let name = bucket_name(&c, true);
    assert!(name.chars().next().is_some_and(|ch| ch.is_ascii_lowercase()));
  }

  #[test]
  fn sanitized_form_is_truncated() {
    let c = Coordinate::new("p".repeat(200), "bucket", "id");
    assert!(bucket_name(&c, true).len() <= MAX_BUCKET_NAME_LEN);
  }

  proptest::proptest! {
    #[test]
    fn sanitized_form_only_uses_allowed_chars(
      project in "[a-zA-Z0-9_.-]{1,30}", id in "[a-zA-Z0-9_.-]{1,30}",
    ) {
      let c = Coordinate::new(project, "bucket", id);
      let name = bucket_name(&c, true);
      proptest::prop_assert!(name.chars().next().is_some_and(|ch| ch.is_ascii_lowercase()));
      proptest::prop_assert!(
        name.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-')
      );
      proptest::prop_assert!(name.len() <= MAX_BUCKET_NAME_LEN);
    }
  }
}
