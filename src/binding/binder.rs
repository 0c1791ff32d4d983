use serde_json::Value;

use crate::binding::constraints::{check, coerce};
use crate::binding::report::{ErrorKind, FieldError, ValidationReport};
use crate::endpoint::Plan;
use crate::graph::{NodeBinding, NodeParam, SourceSpec};
use crate::inputs::RawInputs;

/// Raw-source values bound ahead of execution, indexed by the owning
/// node's slot and the parameter's position. Sub-dependency positions
/// stay `None`.
pub(crate) struct BoundValues {
    slots: Vec<Vec<Option<Value>>>,
}

impl BoundValues {
    fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![Vec::new(); slot_count],
        }
    }

    pub(crate) fn get(&self, slot: usize, index: usize) -> &Value {
        self.slots[slot][index]
            .as_ref()
            .expect("raw parameter was bound before execution")
    }
}

/// Extracts and coerces one raw-source parameter.
///
/// Lookups are tried in declared priority order; the first present value
/// wins. An absent value falls back to the declared default, then to
/// `Null` for optional parameters, and is otherwise a `missing` error
/// reported against the primary lookup.
pub(crate) fn extract(spec: &SourceSpec, inputs: &RawInputs) -> Result<Value, FieldError> {
    for (location, name) in &spec.lookups {
        let Some(raw) = inputs.get(*location, name) else {
            continue;
        };
        let at = vec![location.as_str().to_string(), name.clone()];
        let value =
            coerce(raw, spec.ty).map_err(|(kind, message)| FieldError::new(at.clone(), kind, message))?;
        check(&value, &spec.constraints)
            .map_err(|(kind, message)| FieldError::new(at, kind, message))?;
        return Ok(value);
    }

    if let Some(default) = &spec.default {
        return Ok(default.clone());
    }
    if spec.optional {
        return Ok(Value::Null);
    }

    let (location, name) = &spec.lookups[0];
    Err(FieldError::new(
        vec![location.as_str().to_string(), name.clone()],
        ErrorKind::Missing,
        "required parameter is missing",
    ))
}

/// Binds every raw-source parameter reachable from the plan root.
///
/// All parameters are attempted; failures from the whole graph are
/// aggregated into one report instead of failing on the first field.
/// Shared dependencies are bound once.
pub(crate) fn bind_plan(plan: &Plan, inputs: &RawInputs) -> Result<BoundValues, ValidationReport> {
    let mut bound = BoundValues::new(plan.slot_count);
    let mut visited = vec![false; plan.slot_count];
    let mut report = ValidationReport::new();

    bind_params(&plan.params, 0, inputs, &mut bound, &mut visited, &mut report);

    if report.is_empty() {
        Ok(bound)
    } else {
        Err(report)
    }
}

fn bind_params(
    params: &[NodeParam],
    slot: usize,
    inputs: &RawInputs,
    bound: &mut BoundValues,
    visited: &mut [bool],
    report: &mut ValidationReport,
) {
    visited[slot] = true;
    bound.slots[slot] = Vec::with_capacity(params.len());

    for param in params {
        match &param.binding {
            NodeBinding::Source(spec) => match extract(spec, inputs) {
                Ok(value) => bound.slots[slot].push(Some(value)),
                Err(error) => {
                    report.push(error);
                    bound.slots[slot].push(None);
                }
            },
            NodeBinding::Depends(node) => {
                bound.slots[slot].push(None);
                if !visited[node.slot] {
                    bind_params(&node.params, node.slot, inputs, bound, visited, report);
                }
            }
        }
    }
}
