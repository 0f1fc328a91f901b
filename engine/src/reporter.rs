//! Turns accumulated per-environment errors into a human-readable,
//! ANSI-colored report.

use std::collections::HashMap;

use formatting::{Color, bold, colored, muted};

use crate::error::EngineError;

/// Renders `results` (environment name -> errors encountered deploying to
/// it) as a report grouped by environment, then by coordinate within the
/// environment. Environments with no errors are omitted from the body but
/// counted in the summary line.
pub fn render_report(results: &HashMap<String, Vec<EngineError>>) -> String {
  let total: usize = results.values().map(Vec::len).sum();
  let mut environments: Vec<&String> = results.keys().collect();
  environments.sort();

  let mut out = String::new();
  if total == 0 {
    out.push_str(&colored("deployment succeeded, no errors\n", Color::Green));
    return out;
  }

  out.push_str(&colored(format!("deployment finished with {total} error(s)\n"), Color::Red));

  for environment in environments {
    let errors = &results[environment];
    if errors.is_empty() {
      out.push_str(&format!("{} {}\n", colored("ok", Color::Green), bold(environment)));
      continue;
    }

    out.push_str(&format!(
      "{} {} ({} error(s))\n",
      colored("failed", Color::Red),
      bold(environment),
      errors.len()
    ));

    for error in errors {
      out.push_str(&format!(
        "  {} {}\n",
        bold(error.coordinate().to_string()),
        colored(error.to_string(), Color::Red)
      ));
      out.push_str(&format!("    {}\n", muted(format!("{:?}", error.location_details()))));
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use identity::Coordinate;

  use super::*;
  use crate::error::EnvironmentDetails;

  fn env() -> EnvironmentDetails {
    EnvironmentDetails { environment: "prod".to_string(), group: "default".to_string() }
  }

  #[test]
  fn reports_success_when_no_errors() {
    let results = HashMap::from([("prod".to_string(), Vec::new())]);
    let report = render_report(&results);
    assert!(report.contains("no errors"));
  }

  #[test]
  fn reports_each_error_with_its_coordinate() {
    let coordinate = Coordinate::new("proj", "bucket", "b1");
    let results = HashMap::from([(
      "prod".to_string(),
      vec![EngineError::MissingName { coordinate: coordinate.clone(), env: env() }],
    )]);
    let report = render_report(&results);
    assert!(report.contains(&coordinate.to_string()));
    assert!(report.contains("1 error"));
  }
}
