//! Pairwise collision detection and dispatch
//!
//! Each tick the level hands the manager a snapshot of its live collidables.
//! Detection runs every ordered pair through the first member's
//! `collision_test` and records hits as unordered `Pair`s, so (A, B) and
//! (B, A) land in the same slot. The manager also remembers who each entity
//! was touching last tick; partners that are no longer touching produce one
//! exit event per (entity, former partner).
//!
//! Resolution then calls back into a `CollisionHandler`: both members of
//! every pair get `on_collision`, and each exit goes to the entity that lost
//! the contact.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::entity::{Body, CollectibleKind, EntityId};
use super::rect::Rect;

/// Unordered pair of distinct entities, stored with the lower id first so
/// equality and hashing are symmetric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair {
    low: EntityId,
    high: EntityId,
}

impl Pair {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        debug_assert_ne!(a, b, "an entity cannot collide with itself");
        if a <= b { Self { low: a, high: b } } else { Self { low: b, high: a } }
    }

    pub fn first(&self) -> EntityId {
        self.low
    }

    pub fn second(&self) -> EntityId {
        self.high
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.low == id || self.high == id
    }

    /// The member that isn't `id`
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if id == self.low {
            Some(self.high)
        } else if id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

/// An entity that stopped touching `partner` this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExitEvent {
    pub origin: EntityId,
    pub partner: EntityId,
}

/// What kind of thing a collider is, as far as overlap testing cares
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderRole {
    Player,
    Enemy,
    Collectible(CollectibleKind),
    Bullet,
    /// Passive marker; the player reaches it by covering `anchor`
    Exit { anchor: Vec2 },
}

/// Per-tick snapshot of one collidable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub id: EntityId,
    pub bounds: Rect,
    pub role: ColliderRole,
}

impl Collider {
    /// Does `self` consider itself to be touching `other`?
    ///
    /// Default is a non-zero-area box overlap. The exit marker never tests
    /// positive on its own; the player tests against the exit's anchor point;
    /// powerups only notice the player.
    pub fn collision_test(&self, other: &Collider) -> bool {
        match (self.role, other.role) {
            (ColliderRole::Exit { .. }, _) => false,
            (ColliderRole::Player, ColliderRole::Exit { anchor }) => self.bounds.contains(anchor),
            (_, ColliderRole::Exit { .. }) => false,
            (ColliderRole::Collectible(_), ColliderRole::Player) => self.bounds.intersects(&other.bounds),
            (ColliderRole::Collectible(_), _) => false,
            _ => self.bounds.intersects(&other.bounds),
        }
    }
}

/// Anything that can be put into the collision snapshot
pub trait Collidable {
    fn body(&self) -> &Body;

    fn role(&self) -> ColliderRole;

    /// Snapshot entry, or `None` once the entity is flagged for removal
    fn collider(&self) -> Option<Collider> {
        let body = self.body();
        body.is_live().then(|| Collider {
            id: body.id,
            bounds: body.bounds,
            role: self.role(),
        })
    }
}

/// Receives resolution callbacks
pub trait CollisionHandler {
    /// `this` is touching `other`. Called once per direction for every pair.
    fn on_collision(&mut self, this: EntityId, other: EntityId);

    /// `this` was touching `former` last tick and no longer is
    fn on_collision_exit(&mut self, this: EntityId, former: EntityId);
}

/// Owns the registry of collidables and the contact memory between ticks
#[derive(Debug, Default)]
pub struct CollisionManager {
    registry: BTreeSet<EntityId>,
    last_partners: BTreeMap<EntityId, BTreeSet<EntityId>>,
    overlaps: BTreeSet<Pair>,
    exits: Vec<ExitEvent>,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: EntityId) {
        self.registry.insert(id);
    }

    /// Forget an entity. Removing twice is a no-op and returns false.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let removed = self.registry.remove(&id);
        if removed {
            self.last_partners.remove(&id);
        } else {
            log::trace!("Ignoring redundant removal of {:?}", id);
        }
        removed
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.registry.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Pairs found touching in the last detection pass
    pub fn overlaps(&self) -> &BTreeSet<Pair> {
        &self.overlaps
    }

    /// Contacts lost in the last detection pass
    pub fn exits(&self) -> &[ExitEvent] {
        &self.exits
    }

    /// Entities `id` was touching at the end of the last detection pass
    pub fn partners_of(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.last_partners.get(&id).into_iter().flatten().copied()
    }

    /// Detect, then dispatch
    pub fn update<H: CollisionHandler>(&mut self, snapshot: &[Collider], handler: &mut H) {
        self.detect(snapshot);
        self.resolve(handler);
    }

    /// Rebuild the overlap and exit sets from a snapshot taken at tick start.
    /// Unregistered colliders in the snapshot are ignored.
    pub fn detect(&mut self, snapshot: &[Collider]) {
        self.overlaps.clear();
        self.exits.clear();

        let live: Vec<&Collider> = snapshot
            .iter()
            .filter(|c| self.registry.contains(&c.id))
            .collect();

        for a in &live {
            for b in &live {
                if a.id != b.id && a.collision_test(b) {
                    self.overlaps.insert(Pair::new(a.id, b.id));
                }
            }
        }

        let previous = std::mem::take(&mut self.last_partners);
        for pair in &self.overlaps {
            self.last_partners.entry(pair.first()).or_default().insert(pair.second());
            self.last_partners.entry(pair.second()).or_default().insert(pair.first());
        }

        // One exit per lost contact, evaluated once per entity
        for (origin, partners) in previous {
            if !self.registry.contains(&origin) {
                continue;
            }
            let current = self.last_partners.get(&origin);
            for partner in partners {
                if !current.is_some_and(|c| c.contains(&partner)) {
                    self.exits.push(ExitEvent { origin, partner });
                }
            }
        }
    }

    /// Dispatch the sets computed by the last `detect`
    pub fn resolve<H: CollisionHandler>(&self, handler: &mut H) {
        for pair in &self.overlaps {
            handler.on_collision(pair.first(), pair.second());
            handler.on_collision(pair.second(), pair.first());
        }
        for exit in &self.exits {
            handler.on_collision_exit(exit.origin, exit.partner);
        }
    }
}
