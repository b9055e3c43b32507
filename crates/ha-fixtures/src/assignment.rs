//! Input assignment
//!
//! Chooses a concrete value for every declared input and collects the
//! fixture entities those values reference.

use crate::entity_id::EntityId;
use crate::error::{SynthesisError, SynthesisResult};
use crate::fixture::{FixtureKind, FixtureSet};
use crate::rules::synthesize_value;
use ha_blueprint::{BlueprintDocument, SelectorKind};
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, trace, warn};

/// Caller-supplied input values, keyed by input name
pub type InputOverrides = IndexMap<String, Value>;

/// Where an assigned value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    Override,
    Default,
    Synthesized,
}

/// A value chosen for one input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedInput {
    pub value: Value,
    pub origin: ValueOrigin,
}

/// Concrete values for the declared inputs, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputAssignment {
    inputs: IndexMap<String, AssignedInput>,
}

impl InputAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value, origin: ValueOrigin) {
        self.inputs
            .insert(name.into(), AssignedInput { value, origin });
    }

    pub fn get(&self, name: &str) -> Option<&AssignedInput> {
        self.inputs.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name).map(|assigned| &assigned.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AssignedInput)> {
        self.inputs.iter()
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Plain name → value map, without origins
    pub fn values(&self) -> IndexMap<String, Value> {
        self.inputs
            .iter()
            .map(|(name, assigned)| (name.clone(), assigned.value.clone()))
            .collect()
    }

    /// The `use_blueprint.input` mapping for the generated automation
    pub fn to_mapping(&self) -> Mapping {
        self.inputs
            .iter()
            .map(|(name, assigned)| (Value::String(name.clone()), assigned.value.clone()))
            .collect()
    }
}

/// Result of synthesis: the assignment plus the fixtures it references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Synthesis {
    pub assignment: InputAssignment,
    pub fixtures: FixtureSet,
}

/// Assign every declared input of `blueprint`
///
/// Precedence is override, then declared default, then the synthesis rule
/// of the input's selector. Entity ids appearing in overrides or defaults
/// get fixtures as well. Output depends only on the arguments.
pub fn synthesize(
    blueprint: &BlueprintDocument,
    overrides: &InputOverrides,
) -> SynthesisResult<Synthesis> {
    for name in overrides.keys() {
        if blueprint.input(name).is_none() {
            warn!("Ignoring value for undeclared input '{}'", name);
        }
    }

    let mut synthesis = Synthesis::default();

    for (name, field) in blueprint.inputs() {
        let (value, origin) = if let Some(value) = overrides.get(name) {
            (value.clone(), ValueOrigin::Override)
        } else if let Some(default) = &field.default {
            (default.clone(), ValueOrigin::Default)
        } else {
            let value = synthesize_value(field, &mut synthesis.fixtures)?;
            (value, ValueOrigin::Synthesized)
        };

        if origin != ValueOrigin::Synthesized {
            for entity_id in entity_references(&field.selector, &value) {
                if let Some(kind) = FixtureKind::for_domain(entity_id.domain()) {
                    if !kind.can_declare(&entity_id) {
                        return Err(SynthesisError::UndeclarableEntity {
                            input: name.clone(),
                            entity_id: entity_id.to_string(),
                        });
                    }
                }
                synthesis.fixtures.mint(&entity_id).ok_or_else(|| {
                    SynthesisError::UnsupportedDomain {
                        input: name.clone(),
                        domain: entity_id.domain().to_string(),
                    }
                })?;
            }
        }

        debug!("Input '{}' assigned from {:?}: {:?}", name, origin, value);
        synthesis.assignment.insert(name.clone(), value, origin);
    }

    info!(
        "Assigned {} inputs using {} fixture entities",
        synthesis.assignment.len(),
        synthesis.fixtures.len()
    );
    Ok(synthesis)
}

/// Entity ids referenced by `value` when assigned to an input of `selector`
///
/// Only entity and target selectors reference entities. Strings that are
/// not entity ids (templates, empty values) are skipped.
pub fn entity_references(selector: &SelectorKind, value: &Value) -> Vec<EntityId> {
    if !selector.references_entities() {
        return Vec::new();
    }
    let mut ids = Vec::new();
    collect_ids(value, &mut ids);
    ids
}

fn collect_ids(value: &Value, ids: &mut Vec<EntityId>) {
    match value {
        Value::String(s) => match s.parse::<EntityId>() {
            Ok(id) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            Err(e) => trace!("Not an entity reference: {}", e),
        },
        Value::Sequence(seq) => {
            for item in seq {
                collect_ids(item, ids);
            }
        }
        Value::Mapping(map) => {
            if let Some(entity_ids) = map.get("entity_id") {
                collect_ids(entity_ids, ids);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blueprint(inputs: &str) -> BlueprintDocument {
        let indented: String = inputs
            .lines()
            .map(|line| format!("    {}\n", line))
            .collect();
        let raw = format!(
            "blueprint:\n  name: Test\n  domain: automation\n  input:\n{}",
            indented
        );
        BlueprintDocument::parse(raw, "test.yaml").unwrap()
    }

    #[test]
    fn test_defaults_are_used_verbatim() {
        let bp = blueprint(
            r#"media_player:
  default: media_player.living_room
  selector:
    entity:
      domain: media_player
movie_mode_helper:
  default: input_boolean.movie_mode_active
  selector:
    entity:
      domain: input_boolean
trigger_on_state:
  default: [playing]
  selector:
    select:
      multiple: true
      options: [playing, "on"]"#,
        );

        let synthesis = synthesize(&bp, &InputOverrides::new()).unwrap();
        let defaults: IndexMap<String, Value> = bp
            .inputs()
            .iter()
            .map(|(name, field)| (name.clone(), field.default.clone().unwrap()))
            .collect();
        assert_eq!(synthesis.assignment.values(), defaults);
        assert!(synthesis
            .assignment
            .iter()
            .all(|(_, a)| a.origin == ValueOrigin::Default));

        // Referenced defaults are backed by fixtures
        assert!(synthesis
            .fixtures
            .contains(&"media_player.living_room".parse().unwrap()));
        assert!(synthesis
            .fixtures
            .contains(&"input_boolean.movie_mode_active".parse().unwrap()));
    }

    #[test]
    fn test_override_beats_default() {
        let bp = blueprint(
            r#"start_time:
  default: "20:00:00"
  selector:
    time: {}"#,
        );
        let mut overrides = InputOverrides::new();
        overrides.insert("start_time".to_string(), Value::String("22:30:00".to_string()));
        overrides.insert("undeclared".to_string(), Value::Bool(true));

        let synthesis = synthesize(&bp, &overrides).unwrap();
        let assigned = synthesis.assignment.get("start_time").unwrap();
        assert_eq!(assigned.value, Value::String("22:30:00".to_string()));
        assert_eq!(assigned.origin, ValueOrigin::Override);
        assert!(synthesis.assignment.get("undeclared").is_none());
    }

    #[test]
    fn test_synthesized_values_and_fixtures() {
        let bp = blueprint(
            r#"media_player:
  selector:
    entity:
      domain: media_player
helper:
  selector:
    entity:
      domain: input_boolean
scene:
  selector:
    entity:
      domain: scene
notify_target:
  selector:
    device:
      integration: mobile_app"#,
        );

        let synthesis = synthesize(&bp, &InputOverrides::new()).unwrap();
        assert_eq!(
            synthesis.assignment.value("helper"),
            Some(&Value::String("input_boolean.helper".to_string()))
        );
        assert_eq!(
            synthesis.assignment.get("scene").unwrap().origin,
            ValueOrigin::Synthesized
        );

        let kinds: Vec<FixtureKind> = synthesis.fixtures.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FixtureKind::UniversalMediaPlayer,
                FixtureKind::InputBoolean,
                FixtureKind::Scene,
                FixtureKind::InputBoolean,
                FixtureKind::NotifyFile,
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let bp = blueprint(
            r#"lights:
  selector:
    target:
      entity:
        domain: light
when:
  selector:
    time: {}"#,
        );
        let first = synthesize(&bp, &InputOverrides::new()).unwrap();
        let second = synthesize(&bp, &InputOverrides::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_selector_names_input() {
        let bp = blueprint(
            r#"media_player:
  selector:
    entity:
      domain: media_player
room:
  selector:
    area: {}"#,
        );
        let err = synthesize(&bp, &InputOverrides::new()).unwrap_err();
        assert_eq!(err.input(), "room");
        assert!(matches!(err, SynthesisError::UnsupportedSelector { .. }));
    }

    #[test]
    fn test_unsupported_selector_with_default_is_fine() {
        let bp = blueprint(
            r#"room:
  default: living_room
  selector:
    area: {}"#,
        );
        let synthesis = synthesize(&bp, &InputOverrides::new()).unwrap();
        assert_eq!(
            synthesis.assignment.value("room"),
            Some(&Value::String("living_room".to_string()))
        );
        assert!(synthesis.fixtures.is_empty());
    }

    #[test]
    fn test_default_in_unsupported_domain() {
        let bp = blueprint(
            r#"vacuum:
  default: vacuum.downstairs
  selector:
    entity:
      domain: vacuum"#,
        );
        let err = synthesize(&bp, &InputOverrides::new()).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::UnsupportedDomain {
                input: "vacuum".to_string(),
                domain: "vacuum".to_string()
            }
        );
    }

    #[test]
    fn test_default_that_a_named_fixture_cannot_match() {
        let bp = blueprint(
            r#"room_sensor:
  default: sensor.my__room
  selector:
    entity:
      domain: sensor"#,
        );
        let err = synthesize(&bp, &InputOverrides::new()).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::UndeclarableEntity {
                input: "room_sensor".to_string(),
                entity_id: "sensor.my__room".to_string()
            }
        );

        let mut overrides = InputOverrides::new();
        overrides.insert(
            "room_sensor".to_string(),
            Value::String("sensor.my_room".to_string()),
        );
        let synthesis = synthesize(&bp, &overrides).unwrap();
        assert!(synthesis.fixtures.contains(&"sensor.my_room".parse().unwrap()));
    }

    #[test]
    fn test_entity_references() {
        let entity = SelectorKind::Entity {
            domains: vec![],
            multiple: true,
        };
        let value: Value =
            serde_yaml::from_str("[light.a, '{{ x }}', '', light.a, switch.b]").unwrap();
        let ids: Vec<String> = entity_references(&entity, &value)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["light.a", "switch.b"]);

        let target = SelectorKind::Target { domains: vec![] };
        let value: Value =
            serde_yaml::from_str("entity_id: [light.movie_light, switch.movie_switch]").unwrap();
        assert_eq!(entity_references(&target, &value).len(), 2);

        let value = Value::String("light.a".to_string());
        assert!(entity_references(&SelectorKind::Time, &value).is_empty());
    }
}
