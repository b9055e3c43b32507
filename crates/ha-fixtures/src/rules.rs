//! Synthesis rules per selector kind
//!
//! Each supported selector kind maps to one rule producing a placeholder
//! value and minting whatever fixtures that value references. Supporting a
//! new kind means adding a row to [`SYNTHESIS_RULES`].

use crate::entity_id::EntityId;
use crate::error::{SynthesisError, SynthesisResult};
use crate::fixture::FixtureSet;
use ha_blueprint::{InputField, SelectorKind, SelectorTag};
use serde_yaml::{Mapping, Number, Value};

/// Placeholder for `text:` inputs
pub const TEXT_SENTINEL: &str = "Blueprint validation";
/// Placeholder for `time:` inputs
pub const TIME_SENTINEL: &str = "21:00:00";
/// Placeholder for `date:` inputs
pub const DATE_SENTINEL: &str = "2024-01-01";
/// Placeholder for `datetime:` inputs
pub const DATETIME_SENTINEL: &str = "2024-01-01 00:00:00";
/// Placeholder for `template:` inputs
pub const TEMPLATE_SENTINEL: &str = "{{ true }}";
/// Placeholder for `icon:` inputs
pub const ICON_SENTINEL: &str = "mdi:home";

/// Domain minted for `entity:` selectors without a domain filter
pub const DEFAULT_ENTITY_DOMAIN: &str = "sensor";
/// Domain minted for `target:` selectors without a domain filter
pub const DEFAULT_TARGET_DOMAIN: &str = "light";

type Rule = fn(&InputField, &mut FixtureSet) -> SynthesisResult<Value>;

/// Selector kinds with a synthesis rule; kinds absent here are unsupported
const SYNTHESIS_RULES: &[(SelectorTag, Rule)] = &[
    (SelectorTag::Entity, entity),
    (SelectorTag::Target, target),
    (SelectorTag::Boolean, boolean),
    (SelectorTag::Text, text_sentinel),
    (SelectorTag::Time, time_sentinel),
    (SelectorTag::Number, number),
    (SelectorTag::Select, select),
    (SelectorTag::Duration, duration),
    (SelectorTag::Date, date_sentinel),
    (SelectorTag::Datetime, datetime_sentinel),
    (SelectorTag::Device, device),
    (SelectorTag::Action, empty_sequence),
    (SelectorTag::Condition, empty_sequence),
    (SelectorTag::Trigger, empty_sequence),
    (SelectorTag::Object, empty_mapping),
    (SelectorTag::Template, template_sentinel),
    (SelectorTag::Icon, icon_sentinel),
];

/// Whether a selector kind can be synthesized
pub fn has_rule(tag: SelectorTag) -> bool {
    SYNTHESIS_RULES.iter().any(|(t, _)| *t == tag)
}

/// Produce a placeholder value for `field`, minting fixtures as needed
pub(crate) fn synthesize_value(
    field: &InputField,
    fixtures: &mut FixtureSet,
) -> SynthesisResult<Value> {
    let tag = field.selector.tag();
    let rule = SYNTHESIS_RULES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, rule)| *rule)
        .ok_or_else(|| SynthesisError::UnsupportedSelector {
            input: field.name.clone(),
            selector: field.selector.name().to_string(),
        })?;
    rule(field, fixtures)
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

fn boolean(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(Value::Bool(true))
}

fn empty_sequence(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(Value::Sequence(Vec::new()))
}

fn empty_mapping(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(Value::Mapping(Mapping::new()))
}

fn text_sentinel(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(text(TEXT_SENTINEL))
}

fn time_sentinel(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(text(TIME_SENTINEL))
}

fn date_sentinel(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(text(DATE_SENTINEL))
}

fn datetime_sentinel(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(text(DATETIME_SENTINEL))
}

fn template_sentinel(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(text(TEMPLATE_SENTINEL))
}

fn icon_sentinel(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    Ok(text(ICON_SENTINEL))
}

/// Mint `<domain>.<input slug>` and return its id
fn mint_for_input(
    field: &InputField,
    domain: &str,
    fixtures: &mut FixtureSet,
) -> SynthesisResult<EntityId> {
    let unsupported = || SynthesisError::UnsupportedDomain {
        input: field.name.clone(),
        domain: domain.to_string(),
    };
    let entity_id = EntityId::from_hint(domain, &field.name).map_err(|_| unsupported())?;
    fixtures.mint(&entity_id).ok_or_else(unsupported)?;
    Ok(entity_id)
}

fn entity(field: &InputField, fixtures: &mut FixtureSet) -> SynthesisResult<Value> {
    let (domain, multiple) = match &field.selector {
        SelectorKind::Entity { domains, multiple } => (
            domains
                .first()
                .map(String::as_str)
                .unwrap_or(DEFAULT_ENTITY_DOMAIN),
            *multiple,
        ),
        _ => (DEFAULT_ENTITY_DOMAIN, false),
    };

    let id = text(&mint_for_input(field, domain, fixtures)?.to_string());
    Ok(if multiple { Value::Sequence(vec![id]) } else { id })
}

fn target(field: &InputField, fixtures: &mut FixtureSet) -> SynthesisResult<Value> {
    let domain = match &field.selector {
        SelectorKind::Target { domains } => domains
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TARGET_DOMAIN),
        _ => DEFAULT_TARGET_DOMAIN,
    };

    let id = mint_for_input(field, domain, fixtures)?;
    let mut target = Mapping::new();
    target.insert(
        text("entity_id"),
        Value::Sequence(vec![text(&id.to_string())]),
    );
    Ok(Value::Mapping(target))
}

/// Devices cannot be declared in YAML; the value names a notify placeholder
/// instead, which is what blueprints use device inputs for in practice
fn device(field: &InputField, fixtures: &mut FixtureSet) -> SynthesisResult<Value> {
    let id = mint_for_input(field, "notify", fixtures)?;
    Ok(text(id.object_id()))
}

fn number(field: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    let value = match &field.selector {
        SelectorKind::Number { min: Some(min), .. } => min.clone(),
        SelectorKind::Number { max: Some(max), .. } if max.as_f64().is_some_and(|m| m < 1.0) => {
            max.clone()
        }
        _ => Number::from(1),
    };
    Ok(Value::Number(value))
}

fn select(field: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    match &field.selector {
        SelectorKind::Select { options } => {
            options
                .first()
                .cloned()
                .ok_or_else(|| SynthesisError::NoPlaceholder {
                    input: field.name.clone(),
                    reason: "select selector declares no options".to_string(),
                })
        }
        _ => Err(SynthesisError::NoPlaceholder {
            input: field.name.clone(),
            reason: "not a select selector".to_string(),
        }),
    }
}

fn duration(_: &InputField, _: &mut FixtureSet) -> SynthesisResult<Value> {
    let mut value = Mapping::new();
    value.insert(text("hours"), Value::Number(0.into()));
    value.insert(text("minutes"), Value::Number(1.into()));
    value.insert(text("seconds"), Value::Number(0.into()));
    Ok(Value::Mapping(value))
}
