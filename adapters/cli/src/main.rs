#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a deterministic Nightmarch playthrough.
//!
//! The driver owns the frame loop: it advances the camera, snapshots the
//! world for the wave generator, applies the emitted spawn commands, and
//! prints every spawn the world confirms. An optional cull interval removes
//! all live enemies periodically to exercise the clear-wave path.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use nightmarch_core::{
    CatalogView, Command, EntityTag, Event, LevelLibrary, LevelName, LevelProfile,
    PrototypeDescriptor, PrototypeId, TerrainExtent,
};
use nightmarch_system_generation::{derive_session_seed, Config, Generation};
use nightmarch_world::{self as world, query, World};
use serde::Deserialize;

const SCREEN_WIDTH: f32 = 4.0;
const TERRAIN_WIDTH: f32 = 8.0;
const TERRAIN_HEIGHT: f32 = 5.0;
const RIGHT_EDGE_X: f32 = 12.0;

const ENEMIES: [PrototypeId; 2] = [PrototypeId::new(0), PrototypeId::new(1)];
const PROPS: [PrototypeId; 2] = [PrototypeId::new(2), PrototypeId::new(3)];
const DECALS: [PrototypeId; 2] = [PrototypeId::new(4), PrototypeId::new(5)];
const BOSS: PrototypeId = PrototypeId::new(6);

/// Command-line arguments accepted by the Nightmarch driver.
#[derive(Debug, Parser)]
#[command(name = "nightmarch", about = "Replays a deterministic wave-generation session")]
struct Args {
    /// Level to load.
    #[arg(long, default_value = "forest")]
    level: String,
    /// Global seed from which the per-level session seed is derived.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Number of simulated frames.
    #[arg(long, default_value_t = 600)]
    frames: u32,
    /// Horizontal camera speed in world units per frame.
    #[arg(long, default_value_t = 0.25)]
    camera_speed: f32,
    /// Props scattered per generated screen.
    #[arg(long, default_value_t = 3)]
    prop_density: u32,
    /// Decals scattered per generated screen.
    #[arg(long, default_value_t = 10)]
    decal_density: u32,
    /// Cull every live enemy each time this many frames elapse.
    #[arg(long)]
    cull_every: Option<u32>,
    /// TOML file with level profiles replacing the built-in library.
    #[arg(long)]
    profiles: Option<PathBuf>,
}

/// Schema of a level-profile file: a list of `[[level]]` tables.
#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(rename = "level")]
    levels: Vec<LevelProfile>,
}

#[derive(Debug, Default)]
struct Totals {
    enemies: u32,
    props: u32,
    decals: u32,
    bosses: u32,
}

impl Totals {
    fn record(&mut self, tag: EntityTag) {
        match tag {
            EntityTag::Enemy => self.enemies += 1,
            EntityTag::Prop => self.props += 1,
            EntityTag::Decal => self.decals += 1,
            EntityTag::Boss => self.bosses += 1,
        }
    }
}

fn load_library(path: &Path) -> Result<LevelLibrary> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading profile file {}", path.display()))?;
    let file: ProfileFile = toml::from_str(&contents)
        .with_context(|| format!("parsing profile file {}", path.display()))?;
    let library = LevelLibrary::from_profiles(file.levels)
        .with_context(|| format!("validating profile file {}", path.display()))?;
    Ok(library)
}

fn descriptors() -> Vec<PrototypeDescriptor> {
    vec![
        PrototypeDescriptor::new(ENEMIES[0], EntityTag::Enemy),
        PrototypeDescriptor::new(ENEMIES[1], EntityTag::Enemy),
        PrototypeDescriptor::new(PROPS[0], EntityTag::Prop),
        PrototypeDescriptor::new(PROPS[1], EntityTag::Prop),
        PrototypeDescriptor::new(DECALS[0], EntityTag::Decal),
        PrototypeDescriptor::new(DECALS[1], EntityTag::Decal),
        PrototypeDescriptor::new(BOSS, EntityTag::Boss),
    ]
}

fn cull_enemies(world: &mut World, out_events: &mut Vec<Event>) {
    let enemies: Vec<_> = query::entity_view(world)
        .into_vec()
        .into_iter()
        .filter(|snapshot| snapshot.tag == EntityTag::Enemy)
        .map(|snapshot| snapshot.id)
        .collect();
    for entity in enemies {
        world::apply(world, Command::DespawnEntity { entity }, out_events);
    }
}

fn report(frame: u32, events: &[Event], totals: &mut Totals) {
    for event in events {
        match event {
            Event::EntitySpawned {
                entity,
                tag,
                position,
                ..
            } => {
                totals.record(*tag);
                println!(
                    "frame {frame:>4}: spawned {tag:?} #{} at ({:.2}, {:.2})",
                    entity.get(),
                    position.x(),
                    position.y(),
                );
            }
            Event::SpawnRejected { prototype, reason } => {
                eprintln!(
                    "frame {frame:>4}: spawn of prototype {} rejected: {reason:?}",
                    prototype.get(),
                );
            }
            _ => {}
        }
    }
}

/// Entry point for the Nightmarch command-line driver.
fn main() -> Result<()> {
    let args = Args::parse();
    let library = match &args.profiles {
        Some(path) => load_library(path)?,
        None => LevelLibrary::default(),
    };
    let level = LevelName::new(args.level.as_str());
    let profile = library
        .profile(&level)
        .with_context(|| format!("selecting level `{level}`"))?
        .clone();

    let catalogs = CatalogView::new(&ENEMIES, &PROPS, &DECALS, Some(BOSS));

    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureStage {
            terrain: TerrainExtent::new(TERRAIN_WIDTH, TERRAIN_HEIGHT),
            right_edge_x: RIGHT_EDGE_X,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::RegisterPrototypes {
            descriptors: descriptors(),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::LoadLevel {
            level: level.clone(),
        },
        &mut events,
    );

    let session_seed = derive_session_seed(args.seed, &level);
    let mut generation = Generation::new(Config::new(
        SCREEN_WIDTH,
        args.prop_density,
        args.decal_density,
        session_seed,
    ));

    let mut totals = Totals::default();
    for frame in 0..args.frames {
        if let Some(interval) = args.cull_every {
            if interval > 0 && frame % interval == interval - 1 {
                cull_enemies(&mut world, &mut events);
            }
        }

        let camera_x = query::camera_x(&world) + args.camera_speed;
        world::apply(&mut world, Command::MoveCamera { x: camera_x }, &mut events);

        let frame_view = query::frame_view(&world);
        let mut commands = Vec::new();
        generation.handle(&events, frame_view, catalogs, &profile, &mut commands);
        events.clear();

        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        report(frame, &events, &mut totals);
    }

    println!(
        "simulated {} frames of `{level}`: {} screens generated, {} enemies, {} props, {} decals, {} bosses",
        args.frames,
        generation.current_screen(),
        totals.enemies,
        totals.props,
        totals.decals,
        totals.bosses,
    );
    Ok(())
}
