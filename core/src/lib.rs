#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Nightmarch generation stack.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative stage world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! to react to deterministically. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on wave-chance cutoffs; difficulty rolls are drawn in `[0, 101)`.
pub const WAVE_CHANCE_BOUND: u32 = 101;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Configures the stage geometry used for placement and clear waves.
    ConfigureStage {
        /// Extent of the playable terrain measured in world units.
        terrain: TerrainExtent,
        /// X-coordinate of the trailing-edge anchor along which clear waves line up.
        right_edge_x: f32,
    },
    /// Replaces the table of spawnable prototypes known to the world.
    RegisterPrototypes {
        /// Descriptors for every prototype adapters may request to spawn.
        descriptors: Vec<PrototypeDescriptor>,
    },
    /// Loads the named level, clearing all live entities from the stage.
    LoadLevel {
        /// Identity of the level to activate.
        level: LevelName,
    },
    /// Moves the tracked camera to the provided horizontal position.
    MoveCamera {
        /// New camera x-coordinate in world units.
        x: f32,
    },
    /// Requests that an instance of the prototype appear at the position.
    SpawnEntity {
        /// Prototype to instantiate.
        prototype: PrototypeId,
        /// World position assigned to the new entity.
        position: Position,
    },
    /// Requests removal of a live entity from the stage.
    DespawnEntity {
        /// Identifier of the entity targeted for removal.
        entity: EntityId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the stage geometry was reconfigured.
    StageConfigured {
        /// Extent of the playable terrain measured in world units.
        terrain: TerrainExtent,
        /// X-coordinate of the trailing-edge anchor.
        right_edge_x: f32,
    },
    /// Confirms that the prototype table was replaced.
    PrototypesRegistered {
        /// Number of prototypes now known to the world.
        count: usize,
    },
    /// Announces that a level became active and the stage was cleared.
    LevelLoaded {
        /// Identity of the level that was loaded.
        level: LevelName,
    },
    /// Confirms that the tracked camera moved.
    CameraMoved {
        /// Camera x-coordinate after the move.
        x: f32,
    },
    /// Confirms that an entity was instantiated on the stage.
    EntitySpawned {
        /// Identifier assigned to the entity by the world.
        entity: EntityId,
        /// Prototype the entity was instantiated from.
        prototype: PrototypeId,
        /// Tag inherited from the prototype descriptor.
        tag: EntityTag,
        /// World position assigned to the entity.
        position: Position,
    },
    /// Confirms that an entity was removed from the stage.
    EntityDespawned {
        /// Identifier of the entity that was removed.
        entity: EntityId,
        /// Tag the entity carried while live.
        tag: EntityTag,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Prototype named in the rejected request.
        prototype: PrototypeId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports that a despawn request was rejected.
    DespawnRejected {
        /// Identifier named in the rejected request.
        entity: EntityId,
        /// Specific reason the despawn failed.
        reason: DespawnError,
    },
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The requested prototype is absent from the registered table.
    UnknownPrototype,
}

/// Reasons a despawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DespawnError {
    /// No live entity with the provided identifier exists.
    MissingEntity,
}

/// Gameplay role attached to every spawnable prototype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Hostile entity counted when detecting a cleared board.
    Enemy,
    /// Interactive scenery scattered across each screen.
    Prop,
    /// Flat visual detail rendered beneath props and enemies.
    Decal,
    /// Terminal-screen boss entity.
    Boss,
}

/// Unique identifier assigned to a live entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a spawnable prototype inside the registered table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrototypeId(u32);

impl PrototypeId {
    /// Creates a new prototype identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Associates a prototype identifier with the tag its instances carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrototypeDescriptor {
    id: PrototypeId,
    tag: EntityTag,
}

impl PrototypeDescriptor {
    /// Creates a new prototype descriptor.
    #[must_use]
    pub const fn new(id: PrototypeId, tag: EntityTag) -> Self {
        Self { id, tag }
    }

    /// Identifier of the described prototype.
    #[must_use]
    pub const fn id(&self) -> PrototypeId {
        self.id
    }

    /// Tag applied to entities instantiated from the prototype.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }
}

/// Rendering layer a placement lands on; depth only, never spatial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnLayer {
    /// Enemies, props, and the boss share the surface layer.
    Surface,
    /// Decals sit behind everything else.
    Decal,
}

impl SpawnLayer {
    /// Depth coordinate assigned to positions on the layer.
    #[must_use]
    pub const fn depth(self) -> f32 {
        match self {
            Self::Surface => 1.0,
            Self::Decal => 0.5,
        }
    }
}

/// World position expressed in stage units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
    z: f32,
}

impl Position {
    /// Creates a new position from explicit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Horizontal coordinate of the position.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate of the position.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Depth coordinate of the position; identifies the rendering layer.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }
}

/// Extent of the playable terrain measured in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainExtent {
    width: f32,
    height: f32,
}

impl TerrainExtent {
    /// Creates a new terrain extent description.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Horizontal extent of the terrain.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent of the terrain.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }
}

/// Difficulty tier assigned to a single enemy wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveTier {
    /// Smallest density budget.
    Easy,
    /// Intermediate density budget.
    Medium,
    /// Largest density budget.
    Hard,
}

/// Identity of a level, matching the scene name supplied by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelName(String);

impl LevelName {
    /// Creates a new level name from the provided string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the underlying name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Per-level difficulty table consumed by the wave generator.
///
/// `easy_wave_chance` and `medium_wave_chance` are percentile cutoffs against
/// a uniform roll in `[0, 101)`: rolls at or above the easy cutoff produce an
/// easy wave, rolls at or above the medium cutoff a medium wave, and the
/// remainder a hard wave. Authors must keep the easy cutoff at or above the
/// medium cutoff; [`LevelProfile::validate`] rejects tables that do not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProfile {
    name: LevelName,
    easy_wave_chance: u32,
    medium_wave_chance: u32,
    screens_in_level: u32,
    tutorial: bool,
}

impl LevelProfile {
    /// Creates a new level profile.
    #[must_use]
    pub fn new(
        name: LevelName,
        easy_wave_chance: u32,
        medium_wave_chance: u32,
        screens_in_level: u32,
        tutorial: bool,
    ) -> Self {
        Self {
            name,
            easy_wave_chance,
            medium_wave_chance,
            screens_in_level,
            tutorial,
        }
    }

    /// Identity of the level the profile describes.
    #[must_use]
    pub const fn name(&self) -> &LevelName {
        &self.name
    }

    /// Percentile cutoff at or above which a wave roll lands in the easy tier.
    #[must_use]
    pub const fn easy_wave_chance(&self) -> u32 {
        self.easy_wave_chance
    }

    /// Percentile cutoff at or above which a wave roll lands in the medium tier.
    #[must_use]
    pub const fn medium_wave_chance(&self) -> u32 {
        self.medium_wave_chance
    }

    /// Index of the level's final screen, on which the boss appears.
    #[must_use]
    pub const fn screens_in_level(&self) -> u32 {
        self.screens_in_level
    }

    /// Whether the level is the campaign entry level with softened waves.
    #[must_use]
    pub const fn tutorial(&self) -> bool {
        self.tutorial
    }

    /// Checks the profile for authoring mistakes.
    ///
    /// Validation happens at load time; the generator itself never inspects
    /// the cutoffs beyond the tier comparison.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for value in [self.easy_wave_chance, self.medium_wave_chance] {
            if value > WAVE_CHANCE_BOUND {
                return Err(ProfileError::ThresholdOutOfRange {
                    level: self.name.clone(),
                    value,
                });
            }
        }
        if self.easy_wave_chance < self.medium_wave_chance {
            return Err(ProfileError::NonMonotonicThresholds {
                level: self.name.clone(),
                easy: self.easy_wave_chance,
                medium: self.medium_wave_chance,
            });
        }
        if self.screens_in_level == 0 {
            return Err(ProfileError::ZeroScreens {
                level: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Errors raised while loading or resolving level profiles.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// A wave-chance cutoff exceeds the difficulty roll bound.
    #[error("wave cutoff {value} for level `{level}` exceeds 101")]
    ThresholdOutOfRange {
        /// Level whose profile carries the offending cutoff.
        level: LevelName,
        /// Cutoff value found in the profile.
        value: u32,
    },
    /// The easy cutoff sits below the medium cutoff, inverting the tiers.
    #[error("level `{level}` places easy cutoff {easy} below medium cutoff {medium}")]
    NonMonotonicThresholds {
        /// Level whose profile carries the inverted cutoffs.
        level: LevelName,
        /// Easy-tier cutoff found in the profile.
        easy: u32,
        /// Medium-tier cutoff found in the profile.
        medium: u32,
    },
    /// The profile describes a level without a single screen.
    #[error("level `{level}` must contain at least one screen")]
    ZeroScreens {
        /// Level whose profile declares zero screens.
        level: LevelName,
    },
    /// Two profiles claim the same level identity.
    #[error("duplicate profile for level `{level}`")]
    DuplicateLevel {
        /// Level claimed by more than one profile.
        level: LevelName,
    },
    /// No profile matches the requested level identity.
    #[error("no profile registered for level `{level}`")]
    UnknownLevel {
        /// Level that could not be resolved.
        level: LevelName,
    },
}

/// Ordered collection of level profiles resolved by level identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelLibrary {
    profiles: Vec<LevelProfile>,
}

impl LevelLibrary {
    /// Builds a library from the provided profiles, validating each entry.
    pub fn from_profiles(profiles: Vec<LevelProfile>) -> Result<Self, ProfileError> {
        for (index, profile) in profiles.iter().enumerate() {
            profile.validate()?;
            if profiles[..index]
                .iter()
                .any(|earlier| earlier.name() == profile.name())
            {
                return Err(ProfileError::DuplicateLevel {
                    level: profile.name().clone(),
                });
            }
        }
        Ok(Self { profiles })
    }

    /// Resolves the profile registered for the named level.
    pub fn profile(&self, level: &LevelName) -> Result<&LevelProfile, ProfileError> {
        self.profiles
            .iter()
            .find(|profile| profile.name() == level)
            .ok_or_else(|| ProfileError::UnknownLevel {
                level: level.clone(),
            })
    }

    /// Profiles contained in the library, in registration order.
    #[must_use]
    pub fn profiles(&self) -> &[LevelProfile] {
        &self.profiles
    }
}

impl Default for LevelLibrary {
    /// Builds the campaign library: Forest waves break down 55-30-15,
    /// Battlefield 33-50-15, and Ballroom rolls nothing but hard waves.
    fn default() -> Self {
        Self::from_profiles(vec![
            LevelProfile::new(LevelName::new("forest"), 55, 30, 8, true),
            LevelProfile::new(LevelName::new("battlefield"), 68, 18, 8, false),
            LevelProfile::new(LevelName::new("ballroom"), 101, 101, 8, false),
        ])
        .expect("built-in profiles are valid")
    }
}

/// Snapshot of the world state consumed by the generator each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameView {
    /// Horizontal position of the tracked camera.
    pub camera_x: f32,
    /// Number of live entities tagged [`EntityTag::Enemy`].
    pub live_enemies: u32,
    /// Extent of the playable terrain.
    pub terrain: TerrainExtent,
    /// X-coordinate of the trailing-edge anchor, when the stage defines one.
    pub right_edge_x: Option<f32>,
}

/// Read-only view over the spawnable prototype catalogs of a level.
///
/// Catalogs are ordered; the wave generator treats lower enemy indices as
/// cheaper types. An empty catalog disables its spawn category.
#[derive(Clone, Copy, Debug)]
pub struct CatalogView<'a> {
    enemies: &'a [PrototypeId],
    props: &'a [PrototypeId],
    decals: &'a [PrototypeId],
    boss: Option<PrototypeId>,
}

impl<'a> CatalogView<'a> {
    /// Creates a catalog view over the provided prototype slices.
    #[must_use]
    pub const fn new(
        enemies: &'a [PrototypeId],
        props: &'a [PrototypeId],
        decals: &'a [PrototypeId],
        boss: Option<PrototypeId>,
    ) -> Self {
        Self {
            enemies,
            props,
            decals,
            boss,
        }
    }

    /// Enemy prototypes ordered from cheapest to costliest.
    #[must_use]
    pub const fn enemies(&self) -> &'a [PrototypeId] {
        self.enemies
    }

    /// Prop prototypes scattered across each screen.
    #[must_use]
    pub const fn props(&self) -> &'a [PrototypeId] {
        self.props
    }

    /// Decal prototypes scattered across each screen.
    #[must_use]
    pub const fn decals(&self) -> &'a [PrototypeId] {
        self.decals
    }

    /// Boss prototype reserved for the level's final screen, if configured.
    #[must_use]
    pub const fn boss(&self) -> Option<PrototypeId> {
        self.boss
    }
}

/// Immutable representation of a single live entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Prototype the entity was instantiated from.
    pub prototype: PrototypeId,
    /// Tag inherited from the prototype descriptor.
    pub tag: EntityTag,
    /// World position assigned at spawn time.
    pub position: Position,
}

/// Read-only snapshot describing all entities live on the stage.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}
