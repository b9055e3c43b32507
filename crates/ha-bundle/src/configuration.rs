//! Generated `configuration.yaml`
//!
//! Declares every fixture entity with the integration that can create it
//! from YAML, plus one automation instantiating the blueprint under test.
//! Nothing here depends on where the bundle lives on disk.

use ha_fixtures::{FixtureEntity, FixtureKind, FixtureSet, InputAssignment};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

/// Name of the generated top-level configuration file
pub const CONFIGURATION_FILE: &str = "configuration.yaml";

/// Blueprint namespace the copy is stored under
pub const BLUEPRINT_NAMESPACE: &str = "harness";

/// `id:` of the generated automation
pub const AUTOMATION_ID: &str = "blueprint_under_test";

/// Bundle-relative path of the blueprint copy
pub fn blueprint_relative_path(file_name: &str) -> PathBuf {
    PathBuf::from("blueprints")
        .join("automation")
        .join(BLUEPRINT_NAMESPACE)
        .join(file_name)
}

/// Path given to `use_blueprint`, relative to `blueprints/automation`
pub fn use_blueprint_path(file_name: &str) -> String {
    format!("{}/{}", BLUEPRINT_NAMESPACE, file_name)
}

/// Build the full configuration mapping
pub fn build_configuration(
    blueprint_name: &str,
    blueprint_file: &str,
    assignment: &InputAssignment,
    fixtures: &FixtureSet,
) -> Mapping {
    let mut config = Mapping::new();
    config.insert(key("homeassistant"), Value::Mapping(core_section()));

    for (integration, section) in fixture_sections(fixtures) {
        config.insert(key(integration), section);
    }

    config.insert(
        key("automation"),
        Value::Sequence(vec![automation_entry(
            blueprint_name,
            blueprint_file,
            assignment,
        )]),
    );
    config
}

fn key(s: &str) -> Value {
    Value::String(s.to_string())
}

fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Mapping(entries.into_iter().map(|(k, v)| (key(k), v)).collect())
}

fn core_section() -> Mapping {
    let mut core = Mapping::new();
    core.insert(key("name"), key("Blueprint Validation"));
    core.insert(key("latitude"), Value::Number(0.into()));
    core.insert(key("longitude"), Value::Number(0.into()));
    core.insert(key("elevation"), Value::Number(0.into()));
    core.insert(key("unit_system"), key("metric"));
    core.insert(key("time_zone"), key("UTC"));
    core
}

fn automation_entry(
    blueprint_name: &str,
    blueprint_file: &str,
    assignment: &InputAssignment,
) -> Value {
    mapping([
        ("id", key(AUTOMATION_ID)),
        ("alias", key(&format!("{} (validation)", blueprint_name))),
        (
            "use_blueprint",
            mapping([
                ("path", key(&use_blueprint_path(blueprint_file))),
                ("input", Value::Mapping(assignment.to_mapping())),
            ]),
        ),
    ])
}

/// One `(integration, section)` pair per integration with fixtures, in a
/// fixed order
fn fixture_sections(fixtures: &FixtureSet) -> Vec<(&'static str, Value)> {
    let mut sections = Vec::new();

    let named_helpers: [(&str, FixtureKind); 8] = [
        ("input_boolean", FixtureKind::InputBoolean),
        ("input_number", FixtureKind::InputNumber),
        ("input_text", FixtureKind::InputText),
        ("input_select", FixtureKind::InputSelect),
        ("input_datetime", FixtureKind::InputDatetime),
        ("input_button", FixtureKind::InputButton),
        ("counter", FixtureKind::Counter),
        ("timer", FixtureKind::Timer),
    ];
    for (integration, kind) in named_helpers {
        let helpers: Mapping = fixtures
            .of_kind(kind)
            .map(|f| (key(f.entity_id.object_id()), helper_declaration(f)))
            .collect();
        if !helpers.is_empty() {
            sections.push((integration, Value::Mapping(helpers)));
        }
    }

    let lights: Mapping = fixtures
        .of_kind(FixtureKind::TemplateLight)
        .map(|f| (key(f.entity_id.object_id()), backed_template(f)))
        .collect();
    if !lights.is_empty() {
        sections.push((
            "light",
            Value::Sequence(vec![mapping([
                ("platform", key("template")),
                ("lights", Value::Mapping(lights)),
            ])]),
        ));
    }

    let switches: Mapping = fixtures
        .of_kind(FixtureKind::TemplateSwitch)
        .map(|f| (key(f.entity_id.object_id()), backed_template(f)))
        .collect();
    if !switches.is_empty() {
        sections.push((
            "switch",
            Value::Sequence(vec![mapping([
                ("platform", key("template")),
                ("switches", Value::Mapping(switches)),
            ])]),
        ));
    }

    let mut template = Mapping::new();
    let sensors: Vec<Value> = fixtures
        .of_kind(FixtureKind::TemplateSensor)
        .map(|f| mapping([("name", key(&f.name)), ("state", key("0"))]))
        .collect();
    if !sensors.is_empty() {
        template.insert(key("sensor"), Value::Sequence(sensors));
    }
    let binary_sensors: Vec<Value> = fixtures
        .of_kind(FixtureKind::TemplateBinarySensor)
        .map(|f| mapping([("name", key(&f.name)), ("state", key("{{ false }}"))]))
        .collect();
    if !binary_sensors.is_empty() {
        template.insert(key("binary_sensor"), Value::Sequence(binary_sensors));
    }
    if !template.is_empty() {
        sections.push(("template", Value::Sequence(vec![Value::Mapping(template)])));
    }

    let media_players: Vec<Value> = fixtures
        .of_kind(FixtureKind::UniversalMediaPlayer)
        .map(|f| {
            mapping([
                ("platform", key("universal")),
                ("name", key(&f.name)),
                ("children", Value::Sequence(Vec::new())),
            ])
        })
        .collect();
    if !media_players.is_empty() {
        sections.push(("media_player", Value::Sequence(media_players)));
    }

    let scenes: Vec<Value> = fixtures
        .of_kind(FixtureKind::Scene)
        .map(|f| {
            let mut entities = Mapping::new();
            if let Some(backing) = &f.backing {
                entities.insert(key(&backing.to_string()), key("off"));
            }
            mapping([
                ("id", key(f.entity_id.object_id())),
                ("name", key(&f.name)),
                ("entities", Value::Mapping(entities)),
            ])
        })
        .collect();
    if !scenes.is_empty() {
        sections.push(("scene", Value::Sequence(scenes)));
    }

    let scripts: Mapping = fixtures
        .of_kind(FixtureKind::Script)
        .map(|f| {
            (
                key(f.entity_id.object_id()),
                mapping([
                    ("alias", key(&f.name)),
                    (
                        "sequence",
                        Value::Sequence(vec![mapping([("delay", key("00:00:00"))])]),
                    ),
                ]),
            )
        })
        .collect();
    if !scripts.is_empty() {
        sections.push(("script", Value::Mapping(scripts)));
    }

    let notifiers: Vec<Value> = fixtures
        .of_kind(FixtureKind::NotifyFile)
        .map(|f| {
            let object_id = f.entity_id.object_id();
            mapping([
                ("name", key(object_id)),
                ("platform", key("file")),
                ("filename", key(&format!("notify_{}.log", object_id))),
            ])
        })
        .collect();
    if !notifiers.is_empty() {
        sections.push(("notify", Value::Sequence(notifiers)));
    }

    sections
}

/// Declaration body of an `input_*`, `counter` or `timer` helper
fn helper_declaration(fixture: &FixtureEntity) -> Value {
    let name = ("name", key(&fixture.name));
    match fixture.kind {
        FixtureKind::InputNumber => mapping([
            name,
            ("min", Value::Number(0.into())),
            ("max", Value::Number(100.into())),
        ]),
        FixtureKind::InputSelect => mapping([
            name,
            (
                "options",
                Value::Sequence(vec![key("option_a"), key("option_b")]),
            ),
        ]),
        FixtureKind::InputDatetime => mapping([
            name,
            ("has_date", Value::Bool(false)),
            ("has_time", Value::Bool(true)),
        ]),
        _ => mapping([name]),
    }
}

/// Template light/switch whose state mirrors its backing input_boolean
fn backed_template(fixture: &FixtureEntity) -> Value {
    let backing = fixture
        .backing
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let toggle = |service: &str| {
        mapping([
            ("action", key(service)),
            (
                "target",
                mapping([("entity_id", key(&backing))]),
            ),
        ])
    };

    mapping([
        ("friendly_name", key(&fixture.name)),
        (
            "value_template",
            key(&format!("{{{{ is_state('{}', 'on') }}}}", backing)),
        ),
        ("turn_on", toggle("input_boolean.turn_on")),
        ("turn_off", toggle("input_boolean.turn_off")),
    ])
}
