//! Blueprint document loading

use crate::error::{BlueprintError, BlueprintResult};
use crate::input::{read_input_schema, InputField};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// The only blueprint domain the harness can instantiate
pub const AUTOMATION_DOMAIN: &str = "automation";

/// Descriptive keys of the `blueprint:` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintMetadata {
    pub name: String,
    pub description: Option<String>,
    pub domain: String,
    pub author: Option<String>,
    pub source_url: Option<String>,
}

/// A loaded blueprint
///
/// Immutable once parsed. The raw text is kept so the bundle receives the
/// exact bytes that were validated.
#[derive(Debug, Clone)]
pub struct BlueprintDocument {
    file_name: String,
    raw: String,
    metadata: BlueprintMetadata,
    inputs: IndexMap<String, InputField>,
}

impl BlueprintDocument {
    /// Read and parse a blueprint file
    pub fn load(path: impl AsRef<Path>) -> BlueprintResult<Self> {
        let path = path.as_ref();
        debug!("Loading blueprint: {:?}", path);

        let raw = fs::read_to_string(path).map_err(|e| BlueprintError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("blueprint.yaml")
            .to_string();

        Self::parse(raw, file_name)
    }

    /// Parse blueprint text; `file_name` is used for the bundle copy and in
    /// error messages
    pub fn parse(raw: impl Into<String>, file_name: impl Into<String>) -> BlueprintResult<Self> {
        let raw = raw.into();
        let file_name = file_name.into();

        let document: Value =
            serde_yaml::from_str(&raw).map_err(|e| BlueprintError::ParseYaml {
                file: file_name.clone(),
                source: e,
            })?;

        let blueprint = document
            .get("blueprint")
            .and_then(Value::as_mapping)
            .ok_or_else(|| BlueprintError::NotABlueprint {
                file: file_name.clone(),
            })?;

        let metadata = read_metadata(blueprint)?;
        if metadata.domain != AUTOMATION_DOMAIN {
            return Err(BlueprintError::UnsupportedDomain {
                domain: metadata.domain,
            });
        }

        let inputs = blueprint
            .get("input")
            .ok_or_else(|| BlueprintError::InvalidMetadata {
                key: "input".to_string(),
                reason: "missing".to_string(),
            })?;
        let inputs = read_input_schema(inputs)?;
        if inputs.is_empty() {
            warn!("Blueprint '{}' declares no inputs", metadata.name);
        }

        debug!(
            "Parsed blueprint '{}' with {} inputs",
            metadata.name,
            inputs.len()
        );

        Ok(Self {
            file_name,
            raw,
            metadata,
            inputs,
        })
    }

    /// Declared inputs in declaration order
    pub fn inputs(&self) -> &IndexMap<String, InputField> {
        &self.inputs
    }

    /// Look up a declared input by name
    pub fn input(&self, name: &str) -> Option<&InputField> {
        self.inputs.get(name)
    }

    pub fn metadata(&self) -> &BlueprintMetadata {
        &self.metadata
    }

    /// The document text exactly as loaded
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// File name used for the copy inside a bundle
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

fn read_metadata(blueprint: &Mapping) -> BlueprintResult<BlueprintMetadata> {
    let required = |key: &str| -> BlueprintResult<String> {
        match blueprint.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(Value::String(_)) => Err(BlueprintError::InvalidMetadata {
                key: key.to_string(),
                reason: "must not be empty".to_string(),
            }),
            Some(_) => Err(BlueprintError::InvalidMetadata {
                key: key.to_string(),
                reason: "must be a string".to_string(),
            }),
            None => Err(BlueprintError::InvalidMetadata {
                key: key.to_string(),
                reason: "missing".to_string(),
            }),
        }
    };
    let optional = |key: &str| blueprint.get(key).and_then(Value::as_str).map(str::to_string);

    let name = required("name")?;
    let domain = required("domain")?;
    let description = optional("description");
    if description.is_none() {
        warn!("Blueprint '{}' has no description", name);
    }

    Ok(BlueprintMetadata {
        name,
        description,
        domain,
        author: optional("author"),
        source_url: optional("source_url"),
    })
}
