use indexmap::{IndexMap, IndexSet};

use crate::error::{ParameterError, Result};
use crate::value::{Parameter, ParameterRef};

/// Orders `parameters` so that every local dependency appears before the
/// parameter that references it. Errors if a parameter references a name
/// not present in `parameters`, or if local references form a cycle.
pub fn topological_order(
  parameters: &IndexMap<String, Parameter>,
) -> Result<Vec<String>> {
  let mut local_deps: IndexMap<&str, Vec<&str>> = IndexMap::new();
  for (name, param) in parameters {
    let mut deps = Vec::new();
    for reference in param.references() {
      if let ParameterRef::Local(dep) = reference {
        if !parameters.contains_key(dep.as_str()) {
          return Err(ParameterError::UnknownLocalReference(
            name.clone(),
            dep.clone(),
          ));
        }
        deps.push(dep.as_str());
      }
    }
    local_deps.insert(name.as_str(), deps);
  }

  // in_degree[name] = number of local deps `name` itself has.
  let mut in_degree: IndexMap<&str, usize> = local_deps
    .iter()
    .map(|(name, deps)| (*name, deps.len()))
    .collect();

  let mut dependents: IndexMap<&str, Vec<&str>> =
    parameters.keys().map(|k| (k.as_str(), Vec::new())).collect();
  for (name, deps) in &local_deps {
    for dep in deps {
      dependents.get_mut(dep).unwrap().push(name);
    }
  }

  let mut queue: IndexSet<&str> = in_degree
    .iter()
    .filter(|(_, deg)| **deg == 0)
    .map(|(name, _)| *name)
    .collect();

  let mut order = Vec::with_capacity(parameters.len());
  while let Some(name) = queue.pop() {
    order.push(name.to_string());
    for &dependent in &dependents[name] {
      let degree = in_degree.get_mut(dependent).unwrap();
      *degree -= 1;
      if *degree == 0 {
        queue.insert(dependent);
      }
    }
  }

  if order.len() != parameters.len() {
    let remaining: Vec<String> = parameters
      .keys()
      .filter(|name| !order.contains(&name.to_string()))
      .cloned()
      .collect();
    return Err(ParameterError::CircularDependencyParameterSort(remaining));
  }

  Ok(order)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn local(name: &str) -> Parameter {
    Parameter::Reference(ParameterRef::Local(name.to_string()))
  }

  #[test]
  fn orders_simple_chain() {
    let mut parameters = IndexMap::new();
    parameters.insert("a".to_string(), Parameter::Value(serde_json::json!(1)));
    parameters.insert("b".to_string(), local("a"));
    parameters.insert("c".to_string(), local("b"));

    let order = topological_order(&parameters).unwrap();
    let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
    assert!(pos("a") < pos("b"));
    assert!(pos("b") < pos("c"));
  }

  #[test]
  fn detects_direct_cycle() {
    let mut parameters = IndexMap::new();
    parameters.insert("a".to_string(), local("b"));
    parameters.insert("b".to_string(), local("a"));

    let err = topological_order(&parameters).unwrap_err();
    assert!(matches!(
      err,
      ParameterError::CircularDependencyParameterSort(_)
    ));
  }

  #[test]
  fn detects_self_cycle() {
    let mut parameters = IndexMap::new();
    parameters.insert("a".to_string(), local("a"));

    let err = topological_order(&parameters).unwrap_err();
    assert!(matches!(
      err,
      ParameterError::CircularDependencyParameterSort(_)
    ));
  }

  #[test]
  fn rejects_unknown_local_reference() {
    let mut parameters = IndexMap::new();
    parameters.insert("a".to_string(), local("ghost"));

    let err = topological_order(&parameters).unwrap_err();
    assert!(matches!(
      err,
      ParameterError::UnknownLocalReference(_, _)
    ));
  }

  #[test]
  fn independent_parameters_all_appear() {
    let mut parameters = IndexMap::new();
    parameters.insert("a".to_string(), Parameter::Value(serde_json::json!(1)));
    parameters.insert("b".to_string(), Parameter::Value(serde_json::json!(2)));

    let order = topological_order(&parameters).unwrap();
    assert_eq!(order.len(), 2);
  }
}
