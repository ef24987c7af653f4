#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative stage state for Nightmarch levels.
//!
//! The world stands in for the hosting engine: it owns the live entities,
//! the tracked camera, the terrain extent, and the trailing-edge anchor.
//! Mutations flow exclusively through [`apply`]; systems observe the world
//! through the read-only [`query`] functions.

use nightmarch_core::{
    Command, DespawnError, EntityId, EntityTag, Event, LevelName, Position, PrototypeDescriptor,
    PrototypeId, SpawnError, TerrainExtent,
};

const DEFAULT_TERRAIN_WIDTH: f32 = 16.0;
const DEFAULT_TERRAIN_HEIGHT: f32 = 10.0;

#[derive(Debug)]
struct Entity {
    id: EntityId,
    prototype: PrototypeId,
    tag: EntityTag,
    position: Position,
}

/// Represents the authoritative Nightmarch stage state.
#[derive(Debug)]
pub struct World {
    level: Option<LevelName>,
    terrain: TerrainExtent,
    right_edge_x: Option<f32>,
    prototypes: Vec<PrototypeDescriptor>,
    entities: Vec<Entity>,
    next_entity: u32,
    camera_x: f32,
}

impl World {
    /// Creates a new stage ready for configuration and simulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: None,
            terrain: TerrainExtent::new(DEFAULT_TERRAIN_WIDTH, DEFAULT_TERRAIN_HEIGHT),
            right_edge_x: None,
            prototypes: Vec::new(),
            entities: Vec::new(),
            next_entity: 0,
            camera_x: 0.0,
        }
    }

    fn tag_of(&self, prototype: PrototypeId) -> Option<EntityTag> {
        self.prototypes
            .iter()
            .find(|descriptor| descriptor.id() == prototype)
            .map(|descriptor| descriptor.tag())
    }

    fn allocate_entity(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }

    fn entity_index(&self, entity: EntityId) -> Option<usize> {
        self.entities.iter().position(|live| live.id == entity)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureStage {
            terrain,
            right_edge_x,
        } => {
            world.terrain = terrain;
            world.right_edge_x = Some(right_edge_x);
            out_events.push(Event::StageConfigured {
                terrain,
                right_edge_x,
            });
        }
        Command::RegisterPrototypes { descriptors } => {
            world.prototypes = descriptors;
            out_events.push(Event::PrototypesRegistered {
                count: world.prototypes.len(),
            });
        }
        Command::LoadLevel { level } => {
            world.entities.clear();
            world.camera_x = 0.0;
            world.level = Some(level.clone());
            out_events.push(Event::LevelLoaded { level });
        }
        Command::MoveCamera { x } => {
            world.camera_x = x;
            out_events.push(Event::CameraMoved { x });
        }
        Command::SpawnEntity {
            prototype,
            position,
        } => match world.tag_of(prototype) {
            Some(tag) => {
                let entity = world.allocate_entity();
                world.entities.push(Entity {
                    id: entity,
                    prototype,
                    tag,
                    position,
                });
                out_events.push(Event::EntitySpawned {
                    entity,
                    prototype,
                    tag,
                    position,
                });
            }
            None => out_events.push(Event::SpawnRejected {
                prototype,
                reason: SpawnError::UnknownPrototype,
            }),
        },
        Command::DespawnEntity { entity } => match world.entity_index(entity) {
            Some(index) => {
                let removed = world.entities.remove(index);
                out_events.push(Event::EntityDespawned {
                    entity,
                    tag: removed.tag,
                });
            }
            None => out_events.push(Event::DespawnRejected {
                entity,
                reason: DespawnError::MissingEntity,
            }),
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use nightmarch_core::{EntitySnapshot, EntityTag, EntityView, FrameView, LevelName, TerrainExtent};

    /// Identity of the level currently loaded, if any.
    #[must_use]
    pub fn active_level(world: &World) -> Option<&LevelName> {
        world.level.as_ref()
    }

    /// Horizontal position of the tracked camera.
    #[must_use]
    pub fn camera_x(world: &World) -> f32 {
        world.camera_x
    }

    /// Extent of the playable terrain.
    #[must_use]
    pub fn terrain(world: &World) -> TerrainExtent {
        world.terrain
    }

    /// X-coordinate of the trailing-edge anchor, when the stage defines one.
    #[must_use]
    pub fn right_edge_x(world: &World) -> Option<f32> {
        world.right_edge_x
    }

    /// Number of live entities carrying the provided tag.
    #[must_use]
    pub fn live_count(world: &World, tag: EntityTag) -> u32 {
        world
            .entities
            .iter()
            .filter(|entity| entity.tag == tag)
            .count() as u32
    }

    /// Captures a read-only view of the entities live on the stage.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(
            world
                .entities
                .iter()
                .map(|entity| EntitySnapshot {
                    id: entity.id,
                    prototype: entity.prototype,
                    tag: entity.tag,
                    position: entity.position,
                })
                .collect(),
        )
    }

    /// Composes the per-frame snapshot consumed by the wave generator.
    #[must_use]
    pub fn frame_view(world: &World) -> FrameView {
        FrameView {
            camera_x: world.camera_x,
            live_enemies: live_count(world, EntityTag::Enemy),
            terrain: world.terrain,
            right_edge_x: world.right_edge_x,
        }
    }
}
