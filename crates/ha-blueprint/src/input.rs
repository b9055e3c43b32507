//! Declared blueprint inputs
//!
//! Reads the `blueprint.input` mapping into an ordered set of fields.
//! Inputs may be grouped into sections (an entry with its own nested
//! `input:` mapping); sections are flattened in declaration order.

use crate::error::{BlueprintError, BlueprintResult};
use crate::selector::SelectorKind;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::trace;

/// A single declared input
#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    /// Input key referenced by `!input`
    pub name: String,
    /// Human-readable `name:` from the declaration
    pub display_name: Option<String>,
    pub selector: SelectorKind,
    /// Declared default; `Some(Value::Null)` for an explicit `default:`
    pub default: Option<Value>,
}

impl InputField {
    /// An input is required when it declares no default
    pub fn required(&self) -> bool {
        self.default.is_none()
    }
}

/// Read the ordered input schema from a `blueprint.input` value
pub fn read_input_schema(inputs: &Value) -> BlueprintResult<IndexMap<String, InputField>> {
    let map = inputs
        .as_mapping()
        .ok_or_else(|| BlueprintError::InvalidMetadata {
            key: "input".to_string(),
            reason: "must be a mapping of input declarations".to_string(),
        })?;

    let mut fields = IndexMap::new();
    read_into(map, &mut fields)?;
    Ok(fields)
}

fn read_into(map: &Mapping, fields: &mut IndexMap<String, InputField>) -> BlueprintResult<()> {
    for (key, declaration) in map {
        let name = key
            .as_str()
            .ok_or_else(|| BlueprintError::InvalidInput {
                input: format!("{:?}", key),
                reason: "input name must be a string".to_string(),
            })?
            .to_string();

        let declaration = match declaration {
            Value::Mapping(m) => m,
            Value::Null => {
                return Err(BlueprintError::MissingSelector {
                    input: name,
                    reason: "declaration is empty".to_string(),
                })
            }
            _ => {
                return Err(BlueprintError::InvalidInput {
                    input: name,
                    reason: "declaration must be a mapping".to_string(),
                })
            }
        };

        // Sections carry their own nested inputs and no selector
        if let Some(nested) = declaration.get("input") {
            let nested = nested
                .as_mapping()
                .ok_or_else(|| BlueprintError::InvalidInput {
                    input: name.clone(),
                    reason: "section 'input' must be a mapping".to_string(),
                })?;
            trace!("Reading input section '{}'", name);
            read_into(nested, fields)?;
            continue;
        }

        let field = read_field(name, declaration)?;
        if fields.contains_key(&field.name) {
            return Err(BlueprintError::DuplicateInput { input: field.name });
        }
        trace!(
            "Declared input '{}' ({}, required: {})",
            field.name,
            field.selector,
            field.required()
        );
        fields.insert(field.name.clone(), field);
    }
    Ok(())
}

fn read_field(name: String, declaration: &Mapping) -> BlueprintResult<InputField> {
    let selector = declaration
        .get("selector")
        .ok_or_else(|| BlueprintError::MissingSelector {
            input: name.clone(),
            reason: "no 'selector' key".to_string(),
        })?;
    let selector = SelectorKind::from_value(&name, selector)?;

    let display_name = declaration
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(InputField {
        default: declaration.get("default").cloned(),
        display_name,
        selector,
        name,
    })
}
