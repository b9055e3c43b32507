//! Fixture entities
//!
//! A fixture is a stand-in entity declared in the generated configuration
//! so that every entity the automation references exists. Only domains that
//! can be declared from YAML alone have a fixture kind.

use crate::entity_id::{friendly_name, slugify, EntityId};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// How a fixture entity is declared in `configuration.yaml`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    InputBoolean,
    InputNumber,
    InputText,
    InputSelect,
    InputDatetime,
    InputButton,
    Counter,
    Timer,
    Scene,
    Script,
    /// `light:` template platform backed by an input_boolean
    TemplateLight,
    /// `switch:` template platform backed by an input_boolean
    TemplateSwitch,
    /// `template:` sensor
    TemplateSensor,
    /// `template:` binary sensor
    TemplateBinarySensor,
    /// `media_player:` universal platform with no children
    UniversalMediaPlayer,
    /// `notify:` file platform, the notification target placeholder
    NotifyFile,
}

/// Domains a fixture can be declared for
const DOMAIN_FIXTURES: &[(&str, FixtureKind)] = &[
    ("input_boolean", FixtureKind::InputBoolean),
    ("input_number", FixtureKind::InputNumber),
    ("input_text", FixtureKind::InputText),
    ("input_select", FixtureKind::InputSelect),
    ("input_datetime", FixtureKind::InputDatetime),
    ("input_button", FixtureKind::InputButton),
    ("counter", FixtureKind::Counter),
    ("timer", FixtureKind::Timer),
    ("scene", FixtureKind::Scene),
    ("script", FixtureKind::Script),
    ("light", FixtureKind::TemplateLight),
    ("switch", FixtureKind::TemplateSwitch),
    ("sensor", FixtureKind::TemplateSensor),
    ("binary_sensor", FixtureKind::TemplateBinarySensor),
    ("media_player", FixtureKind::UniversalMediaPlayer),
    ("notify", FixtureKind::NotifyFile),
];

impl FixtureKind {
    /// The fixture kind for an entity domain, if one exists
    pub fn for_domain(domain: &str) -> Option<Self> {
        DOMAIN_FIXTURES
            .iter()
            .find(|(d, _)| *d == domain)
            .map(|(_, kind)| *kind)
    }

    pub fn domain(&self) -> &'static str {
        DOMAIN_FIXTURES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(domain, _)| *domain)
            .unwrap_or("unknown")
    }

    /// Suffix of the input_boolean a fixture of this kind is wired to
    pub fn backing_suffix(&self) -> Option<&'static str> {
        match self {
            Self::TemplateLight | Self::TemplateSwitch => Some("power"),
            Self::Scene => Some("member"),
            _ => None,
        }
    }

    /// Whether Home Assistant derives the entity id from the declared name
    pub fn declared_by_name(&self) -> bool {
        matches!(
            self,
            Self::Scene
                | Self::TemplateSensor
                | Self::TemplateBinarySensor
                | Self::UniversalMediaPlayer
        )
    }

    /// Whether a fixture of this kind declared for `entity_id` ends up with
    /// exactly that id
    ///
    /// Name-declared ids must survive the round trip through their friendly
    /// name, which rules out object ids such as `my__room`.
    pub fn can_declare(&self, entity_id: &EntityId) -> bool {
        !self.declared_by_name()
            || slugify(&friendly_name(entity_id.object_id())) == entity_id.object_id()
    }
}

/// A synthesized stand-in entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureEntity {
    pub entity_id: EntityId,
    pub kind: FixtureKind,
    /// Friendly name; its slug equals the object id
    pub name: String,
    /// Helper this fixture's state is derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing: Option<EntityId>,
}

/// The fixture entities of one bundle, unique by entity id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FixtureSet {
    entities: IndexMap<EntityId, FixtureEntity>,
}

impl FixtureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a fixture exists for `entity_id`, along with its backing helper
    ///
    /// Minting an id that is already present is a no-op. Returns `None` when
    /// the domain has no fixture kind.
    pub fn mint(&mut self, entity_id: &EntityId) -> Option<&FixtureEntity> {
        let kind = FixtureKind::for_domain(entity_id.domain())?;

        if !self.entities.contains_key(entity_id) {
            let backing = kind.backing_suffix().and_then(|suffix| {
                EntityId::new("input_boolean", entity_id.object_id())
                    .and_then(|id| id.with_suffix(suffix))
                    .ok()
            });

            debug!("Minting {:?} fixture {}", kind, entity_id);
            self.entities.insert(
                entity_id.clone(),
                FixtureEntity {
                    entity_id: entity_id.clone(),
                    kind,
                    name: friendly_name(entity_id.object_id()),
                    backing: backing.clone(),
                },
            );

            if let Some(backing) = backing {
                self.mint(&backing);
            }
        }

        self.entities.get(entity_id)
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.entities.contains_key(entity_id)
    }

    pub fn get(&self, entity_id: &EntityId) -> Option<&FixtureEntity> {
        self.entities.get(entity_id)
    }

    /// Fixtures in the order they were minted
    pub fn iter(&self) -> impl Iterator<Item = &FixtureEntity> {
        self.entities.values()
    }

    /// Fixtures of one kind, in mint order
    pub fn of_kind(&self, kind: FixtureKind) -> impl Iterator<Item = &FixtureEntity> {
        self.entities.values().filter(move |f| f.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        s.parse().unwrap()
    }

    #[test]
    fn test_domain_table_round_trip() {
        for (domain, kind) in DOMAIN_FIXTURES {
            assert_eq!(FixtureKind::for_domain(domain), Some(*kind));
            assert_eq!(kind.domain(), *domain);
        }
        assert_eq!(FixtureKind::for_domain("vacuum"), None);
    }

    #[test]
    fn test_mint_is_idempotent() {
        let mut set = FixtureSet::new();
        set.mint(&id("media_player.living_room")).unwrap();
        set.mint(&id("media_player.living_room")).unwrap();
        assert_eq!(set.len(), 1);

        let fixture = set.get(&id("media_player.living_room")).unwrap();
        assert_eq!(fixture.kind, FixtureKind::UniversalMediaPlayer);
        assert_eq!(fixture.name, "Living Room");
        assert!(fixture.backing.is_none());
    }

    #[test]
    fn test_light_gets_backing_helper() {
        let mut set = FixtureSet::new();
        set.mint(&id("light.movie_light")).unwrap();

        let ids: Vec<String> = set.iter().map(|f| f.entity_id.to_string()).collect();
        assert_eq!(ids, vec!["light.movie_light", "input_boolean.movie_light_power"]);
        assert_eq!(
            set.get(&id("light.movie_light")).unwrap().backing,
            Some(id("input_boolean.movie_light_power"))
        );
        assert_eq!(set.of_kind(FixtureKind::InputBoolean).count(), 1);
    }

    #[test]
    fn test_scene_gets_member_helper() {
        let mut set = FixtureSet::new();
        set.mint(&id("scene.movie_mode")).unwrap();
        assert!(set.contains(&id("input_boolean.movie_mode_member")));
    }

    #[test]
    fn test_name_declared_ids_must_round_trip() {
        let sensor = FixtureKind::TemplateSensor;
        assert!(sensor.can_declare(&id("sensor.my_room")));
        assert!(sensor.can_declare(&id("sensor.room_2")));
        assert!(!sensor.can_declare(&id("sensor.my__room")));
        assert!(!FixtureKind::UniversalMediaPlayer.can_declare(&id("media_player.tv__den")));

        // Keyed declarations keep any valid object id
        assert!(FixtureKind::InputBoolean.can_declare(&id("input_boolean.my__room")));
    }

    #[test]
    fn test_unknown_domain() {
        let mut set = FixtureSet::new();
        assert!(set.mint(&id("vacuum.downstairs")).is_none());
        assert!(set.is_empty());
    }
}
