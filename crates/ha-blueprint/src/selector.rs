//! Selector kinds declared by blueprint inputs
//!
//! A selector is a single-key mapping naming the kind of value an input
//! accepts, e.g. `entity: {domain: media_player}`. The set of kinds is
//! closed: anything the harness does not know is kept as
//! [`SelectorKind::Other`] so the synthesizer can reject it by name.

use crate::error::{BlueprintError, BlueprintResult};
use serde::Serialize;
use serde_yaml::{Mapping, Number, Value};
use std::fmt;

/// The declared type of a blueprint input
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorKind {
    /// `entity:` with an optional domain filter
    Entity { domains: Vec<String>, multiple: bool },
    /// `target:` with an optional entity domain filter
    Target { domains: Vec<String> },
    Boolean,
    Text { multiline: bool },
    Time,
    Number { min: Option<Number>, max: Option<Number> },
    /// `select:` with the option values (labels are dropped)
    Select { options: Vec<Value> },
    Duration,
    Date,
    Datetime,
    Device,
    Action,
    Condition,
    Trigger,
    Object,
    Template,
    Icon,
    Area,
    Floor,
    Label,
    Location,
    ColorRgb,
    Media,
    /// A selector kind the harness has no knowledge of
    Other(String),
}

/// Fieldless mirror of [`SelectorKind`], used as a lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorTag {
    Entity,
    Target,
    Boolean,
    Text,
    Time,
    Number,
    Select,
    Duration,
    Date,
    Datetime,
    Device,
    Action,
    Condition,
    Trigger,
    Object,
    Template,
    Icon,
    Area,
    Floor,
    Label,
    Location,
    ColorRgb,
    Media,
    Other,
}

impl SelectorKind {
    /// Parse the `selector:` value of the input named `input`
    pub fn from_value(input: &str, selector: &Value) -> BlueprintResult<Self> {
        let invalid = |reason: String| BlueprintError::MissingSelector {
            input: input.to_string(),
            reason,
        };

        let map = selector
            .as_mapping()
            .ok_or_else(|| invalid("selector must be a mapping".to_string()))?;
        if map.len() != 1 {
            return Err(invalid(format!(
                "selector must name exactly one kind, found {}",
                map.len()
            )));
        }
        let Some((key, body)) = map.iter().next() else {
            return Err(invalid("selector is empty".to_string()));
        };
        let kind = key
            .as_str()
            .ok_or_else(|| invalid("selector kind must be a string".to_string()))?;

        let empty = Mapping::new();
        let body = match body {
            Value::Null => &empty,
            Value::Mapping(m) => m,
            other => {
                return Err(invalid(format!(
                    "options for '{}' selector must be a mapping, got {:?}",
                    kind, other
                )))
            }
        };

        let parsed = match kind {
            "entity" => Self::Entity {
                domains: domain_filter(body),
                multiple: flag(body, "multiple"),
            },
            "target" => Self::Target {
                domains: target_domains(body),
            },
            "boolean" => Self::Boolean,
            "text" => Self::Text {
                multiline: flag(body, "multiline"),
            },
            "time" => Self::Time,
            "number" => Self::Number {
                min: number(body, "min"),
                max: number(body, "max"),
            },
            "select" => Self::Select {
                options: select_options(body),
            },
            "duration" => Self::Duration,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            "device" => Self::Device,
            "action" => Self::Action,
            "condition" => Self::Condition,
            "trigger" => Self::Trigger,
            "object" => Self::Object,
            "template" => Self::Template,
            "icon" => Self::Icon,
            "area" => Self::Area,
            "floor" => Self::Floor,
            "label" => Self::Label,
            "location" => Self::Location,
            "color_rgb" => Self::ColorRgb,
            "media" => Self::Media,
            other => Self::Other(other.to_string()),
        };
        Ok(parsed)
    }

    /// The lookup key for this selector kind
    pub fn tag(&self) -> SelectorTag {
        match self {
            Self::Entity { .. } => SelectorTag::Entity,
            Self::Target { .. } => SelectorTag::Target,
            Self::Boolean => SelectorTag::Boolean,
            Self::Text { .. } => SelectorTag::Text,
            Self::Time => SelectorTag::Time,
            Self::Number { .. } => SelectorTag::Number,
            Self::Select { .. } => SelectorTag::Select,
            Self::Duration => SelectorTag::Duration,
            Self::Date => SelectorTag::Date,
            Self::Datetime => SelectorTag::Datetime,
            Self::Device => SelectorTag::Device,
            Self::Action => SelectorTag::Action,
            Self::Condition => SelectorTag::Condition,
            Self::Trigger => SelectorTag::Trigger,
            Self::Object => SelectorTag::Object,
            Self::Template => SelectorTag::Template,
            Self::Icon => SelectorTag::Icon,
            Self::Area => SelectorTag::Area,
            Self::Floor => SelectorTag::Floor,
            Self::Label => SelectorTag::Label,
            Self::Location => SelectorTag::Location,
            Self::ColorRgb => SelectorTag::ColorRgb,
            Self::Media => SelectorTag::Media,
            Self::Other(_) => SelectorTag::Other,
        }
    }

    /// The selector name as written in the blueprint
    pub fn name(&self) -> &str {
        match self {
            Self::Other(name) => name,
            other => other.tag().as_str(),
        }
    }

    /// Whether values of this selector reference entity ids
    pub fn references_entities(&self) -> bool {
        matches!(self, Self::Entity { .. } | Self::Target { .. })
    }
}

impl SelectorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Target => "target",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Time => "time",
            Self::Number => "number",
            Self::Select => "select",
            Self::Duration => "duration",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Device => "device",
            Self::Action => "action",
            Self::Condition => "condition",
            Self::Trigger => "trigger",
            Self::Object => "object",
            Self::Template => "template",
            Self::Icon => "icon",
            Self::Area => "area",
            Self::Floor => "floor",
            Self::Label => "label",
            Self::Location => "location",
            Self::ColorRgb => "color_rgb",
            Self::Media => "media",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for SelectorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn flag(body: &Mapping, key: &str) -> bool {
    body.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn number(body: &Mapping, key: &str) -> Option<Number> {
    match body.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

/// Collect domains from `domain:` (string or list) and `filter:` (mapping
/// or list of mappings), in declaration order without duplicates
fn domain_filter(body: &Mapping) -> Vec<String> {
    let mut domains = Vec::new();
    push_domains(&mut domains, body.get("domain"));

    match body.get("filter") {
        Some(Value::Mapping(filter)) => push_domains(&mut domains, filter.get("domain")),
        Some(Value::Sequence(filters)) => {
            for filter in filters {
                push_domains(&mut domains, filter.get("domain"));
            }
        }
        _ => {}
    }

    domains
}

/// `target:` nests its entity filter under `entity:`
fn target_domains(body: &Mapping) -> Vec<String> {
    let mut domains = Vec::new();
    match body.get("entity") {
        Some(Value::Mapping(entity)) => {
            for domain in domain_filter(entity) {
                if !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
        }
        Some(Value::Sequence(filters)) => {
            for filter in filters {
                push_domains(&mut domains, filter.get("domain"));
            }
        }
        _ => {}
    }
    domains
}

fn push_domains(domains: &mut Vec<String>, value: Option<&Value>) {
    let candidates: Vec<&str> = match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Sequence(seq)) => seq.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    for domain in candidates {
        if !domains.iter().any(|d| d == domain) {
            domains.push(domain.to_string());
        }
    }
}

/// Option values of a `select:` selector; options are plain strings or
/// `{value, label}` mappings
fn select_options(body: &Mapping) -> Vec<Value> {
    let Some(Value::Sequence(options)) = body.get("options") else {
        return Vec::new();
    };
    options
        .iter()
        .filter_map(|option| match option {
            Value::Mapping(m) => m.get("value").cloned(),
            Value::Null => None,
            other => Some(other.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> BlueprintResult<SelectorKind> {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        SelectorKind::from_value("test_input", &value)
    }

    #[test]
    fn test_entity_with_single_domain() {
        let kind = parse("entity:\n  domain: media_player\n").unwrap();
        assert_eq!(
            kind,
            SelectorKind::Entity {
                domains: vec!["media_player".to_string()],
                multiple: false
            }
        );
        assert_eq!(kind.tag(), SelectorTag::Entity);
    }

    #[test]
    fn test_entity_filter_list_and_multiple() {
        let kind = parse(
            r#"
entity:
  multiple: true
  filter:
    - domain: light
    - domain: [switch, light]
"#,
        )
        .unwrap();
        assert_eq!(
            kind,
            SelectorKind::Entity {
                domains: vec!["light".to_string(), "switch".to_string()],
                multiple: true
            }
        );
    }

    #[test]
    fn test_null_body_is_accepted() {
        assert_eq!(parse("boolean:\n").unwrap(), SelectorKind::Boolean);
        assert_eq!(
            parse("entity: {}\n").unwrap(),
            SelectorKind::Entity {
                domains: vec![],
                multiple: false
            }
        );
    }

    #[test]
    fn test_target_domains() {
        let kind = parse("target:\n  entity:\n    domain: [light, switch]\n").unwrap();
        assert_eq!(
            kind,
            SelectorKind::Target {
                domains: vec!["light".to_string(), "switch".to_string()]
            }
        );
    }

    #[test]
    fn test_select_options_mixed() {
        let kind = parse(
            r#"
select:
  options:
    - playing
    - label: Paused
      value: paused
"#,
        )
        .unwrap();
        assert_eq!(
            kind,
            SelectorKind::Select {
                options: vec![
                    Value::String("playing".to_string()),
                    Value::String("paused".to_string())
                ]
            }
        );
    }

    #[test]
    fn test_number_bounds() {
        let kind = parse("number:\n  min: 5\n  max: 10\n").unwrap();
        match kind {
            SelectorKind::Number { min, max } => {
                assert_eq!(min.and_then(|n| n.as_i64()), Some(5));
                assert_eq!(max.and_then(|n| n.as_i64()), Some(10));
            }
            other => panic!("unexpected selector {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_is_kept_by_name() {
        let kind = parse("qr_code: {}\n").unwrap();
        assert_eq!(kind, SelectorKind::Other("qr_code".to_string()));
        assert_eq!(kind.tag(), SelectorTag::Other);
        assert_eq!(kind.to_string(), "qr_code");
    }

    #[test]
    fn test_malformed_selectors() {
        assert!(matches!(
            parse("text"),
            Err(BlueprintError::MissingSelector { .. })
        ));
        assert!(matches!(
            parse("{}"),
            Err(BlueprintError::MissingSelector { .. })
        ));
        assert!(matches!(
            parse("text: {}\ntime: {}\n"),
            Err(BlueprintError::MissingSelector { .. })
        ));
        assert!(matches!(
            parse("entity: media_player\n"),
            Err(BlueprintError::MissingSelector { .. })
        ));
    }
}
