//! Bundle assembly
//!
//! Layout of a bundle:
//!
//! ```text
//! <root>/
//!   configuration.yaml
//!   blueprints/automation/harness/<blueprint file>
//! ```

use crate::bundle::ConfigBundle;
use crate::configuration::{blueprint_relative_path, build_configuration, CONFIGURATION_FILE};
use crate::error::{BundleError, BundleResult};
use ha_blueprint::{BlueprintDocument, Value};
use ha_fixtures::{entity_references, FixtureSet, InputAssignment};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Verify the assignment and fixtures before anything is written
///
/// Every required input must have a non-null value, and every entity the
/// automation references must be a fixture. A failure here is a harness
/// defect, not a problem with the blueprint.
pub fn check_consistency(
    blueprint: &BlueprintDocument,
    assignment: &InputAssignment,
    fixtures: &FixtureSet,
) -> BundleResult<()> {
    for (name, field) in blueprint.inputs() {
        let value = assignment.value(name);

        if field.required() && matches!(value, None | Some(Value::Null)) {
            return Err(BundleError::MissingInput {
                input: name.clone(),
            });
        }

        if let Some(value) = value {
            for entity_id in entity_references(&field.selector, value) {
                if !fixtures.contains(&entity_id) {
                    return Err(BundleError::DanglingReference {
                        input: name.clone(),
                        entity_id: entity_id.to_string(),
                    });
                }
            }
        }
    }

    for fixture in fixtures.iter() {
        if let Some(backing) = &fixture.backing {
            if !fixtures.contains(backing) {
                return Err(BundleError::DanglingBacking {
                    fixture: fixture.entity_id.to_string(),
                    backing: backing.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Materialize a bundle at `root`
///
/// `root` must not exist yet; its parent is created if needed. Generated
/// content never mentions `root`, so identical inputs yield identical
/// files wherever the bundle is placed.
pub fn create_bundle(
    root: &Path,
    blueprint: &BlueprintDocument,
    assignment: &InputAssignment,
    fixtures: &FixtureSet,
) -> BundleResult<ConfigBundle> {
    check_consistency(blueprint, assignment, fixtures)?;

    let configuration = build_configuration(
        &blueprint.metadata().name,
        blueprint.file_name(),
        assignment,
        fixtures,
    );
    let configuration =
        serde_yaml::to_string(&configuration).map_err(|e| BundleError::Serialize {
            file: CONFIGURATION_FILE.to_string(),
            source: e,
        })?;

    if let Some(parent) = root.parent() {
        fs::create_dir_all(parent).map_err(|e| BundleError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    // Non-recursive so that two runs can never share a root
    fs::create_dir(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => BundleError::RootExists {
            path: root.to_path_buf(),
        },
        _ => BundleError::Write {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    // From here on, an early return removes the partial tree
    let mut bundle = ConfigBundle::claim(root.to_path_buf());

    let blueprint_file = blueprint_relative_path(blueprint.file_name());
    bundle.write(&blueprint_file, blueprint.raw())?;
    bundle.set_blueprint_file(blueprint_file);

    bundle.write(Path::new(CONFIGURATION_FILE), &configuration)?;

    info!(
        "Assembled bundle {:?} ({} fixtures, {} inputs)",
        root,
        fixtures.len(),
        assignment.len()
    );
    debug!("Generated configuration:\n{}", configuration);
    Ok(bundle)
}
