//! Closed set of component kinds and the per-entity slot table.

use std::fmt;

use serde::{Deserialize, Serialize};

use bastion_core::components::*;
use bastion_core::types::{Position, Velocity};

/// Every kind of component an entity can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Position,
    Velocity,
    Health,
    Damage,
    AiBehavior,
    TowerStats,
    Resource,
    Faction,
    Enemy,
    Boss,
    Sprite,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 11] = [
        ComponentKind::Position,
        ComponentKind::Velocity,
        ComponentKind::Health,
        ComponentKind::Damage,
        ComponentKind::AiBehavior,
        ComponentKind::TowerStats,
        ComponentKind::Resource,
        ComponentKind::Faction,
        ComponentKind::Enemy,
        ComponentKind::Boss,
        ComponentKind::Sprite,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of component kinds, stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KindSet(u16);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    pub fn of(kinds: &[ComponentKind]) -> Self {
        kinds.iter().copied().collect()
    }

    /// Builder form, usable in constants.
    pub const fn with(self, kind: ComponentKind) -> Self {
        KindSet(self.0 | kind.bit())
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn contains_all(&self, other: KindSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        ComponentKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<ComponentKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = ComponentKind>>(iter: I) -> Self {
        let mut set = KindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A component value tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Position(Position),
    Velocity(Velocity),
    Health(Health),
    Damage(Damage),
    AiBehavior(AiBehavior),
    TowerStats(TowerStats),
    Resource(Resource),
    Faction(Faction),
    Enemy(Enemy),
    Boss(Boss),
    Sprite(Sprite),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Position(_) => ComponentKind::Position,
            Component::Velocity(_) => ComponentKind::Velocity,
            Component::Health(_) => ComponentKind::Health,
            Component::Damage(_) => ComponentKind::Damage,
            Component::AiBehavior(_) => ComponentKind::AiBehavior,
            Component::TowerStats(_) => ComponentKind::TowerStats,
            Component::Resource(_) => ComponentKind::Resource,
            Component::Faction(_) => ComponentKind::Faction,
            Component::Enemy(_) => ComponentKind::Enemy,
            Component::Boss(_) => ComponentKind::Boss,
            Component::Sprite(_) => ComponentKind::Sprite,
        }
    }
}

/// One optional slot per kind, plus the mask of occupied slots.
#[derive(Debug, Clone, Default)]
pub struct ComponentSlots {
    mask: KindSet,
    position: Option<Position>,
    velocity: Option<Velocity>,
    health: Option<Health>,
    damage: Option<Damage>,
    ai_behavior: Option<AiBehavior>,
    tower_stats: Option<TowerStats>,
    resource: Option<Resource>,
    faction: Option<Faction>,
    enemy: Option<Enemy>,
    boss: Option<Boss>,
    sprite: Option<Sprite>,
}

impl ComponentSlots {
    pub fn kinds(&self) -> KindSet {
        self.mask
    }

    /// Store a component, replacing any existing one of the same kind.
    pub fn insert(&mut self, component: Component) {
        self.mask.insert(component.kind());
        match component {
            Component::Position(c) => self.position = Some(c),
            Component::Velocity(c) => self.velocity = Some(c),
            Component::Health(c) => self.health = Some(c),
            Component::Damage(c) => self.damage = Some(c),
            Component::AiBehavior(c) => self.ai_behavior = Some(c),
            Component::TowerStats(c) => self.tower_stats = Some(c),
            Component::Resource(c) => self.resource = Some(c),
            Component::Faction(c) => self.faction = Some(c),
            Component::Enemy(c) => self.enemy = Some(c),
            Component::Boss(c) => self.boss = Some(c),
            Component::Sprite(c) => self.sprite = Some(c),
        }
    }
}

/// Typed access to one slot of the table.
pub trait ComponentData: Into<Component> + Sized + 'static {
    const KIND: ComponentKind;

    fn slot(slots: &ComponentSlots) -> Option<&Self>;
    fn slot_mut(slots: &mut ComponentSlots) -> Option<&mut Self>;
    fn take(slots: &mut ComponentSlots) -> Option<Self>;
}

macro_rules! component_data {
    ($($ty:ident => $field:ident),* $(,)?) => {
        $(
            impl From<$ty> for Component {
                fn from(value: $ty) -> Self {
                    Component::$ty(value)
                }
            }

            impl ComponentData for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn slot(slots: &ComponentSlots) -> Option<&Self> {
                    slots.$field.as_ref()
                }

                fn slot_mut(slots: &mut ComponentSlots) -> Option<&mut Self> {
                    slots.$field.as_mut()
                }

                fn take(slots: &mut ComponentSlots) -> Option<Self> {
                    slots.mask.remove(Self::KIND);
                    slots.$field.take()
                }
            }
        )*
    };
}

component_data! {
    Position => position,
    Velocity => velocity,
    Health => health,
    Damage => damage,
    AiBehavior => ai_behavior,
    TowerStats => tower_stats,
    Resource => resource,
    Faction => faction,
    Enemy => enemy,
    Boss => boss,
    Sprite => sprite,
}
