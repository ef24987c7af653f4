use nightmarch_core::{
    CatalogView, Command, EntityTag, Event, LevelLibrary, LevelName, LevelProfile, Position,
    PrototypeDescriptor, PrototypeId, TerrainExtent,
};
use nightmarch_system_generation::{derive_session_seed, Config, Generation};
use nightmarch_world::{self as world, query, World};

const SCREEN_WIDTH: f32 = 4.0;
const RIGHT_EDGE_X: f32 = 12.0;
const CAMERA_STEP: f32 = 0.5;

const ENEMIES: [PrototypeId; 2] = [PrototypeId::new(0), PrototypeId::new(1)];
const PROPS: [PrototypeId; 2] = [PrototypeId::new(2), PrototypeId::new(3)];
const DECALS: [PrototypeId; 2] = [PrototypeId::new(4), PrototypeId::new(5)];
const BOSS: PrototypeId = PrototypeId::new(6);

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

fn catalogs(with_enemies: bool, with_boss: bool) -> CatalogView<'static> {
    let enemies: &'static [PrototypeId] = if with_enemies { &ENEMIES } else { &[] };
    CatalogView::new(enemies, &PROPS, &DECALS, with_boss.then_some(BOSS))
}

#[derive(Clone, Debug, PartialEq)]
struct SpawnRecord {
    prototype: PrototypeId,
    tag: EntityTag,
    position: Position,
}

struct Harness {
    world: World,
    generation: Generation,
    profile: LevelProfile,
    pending_events: Vec<Event>,
}

impl Harness {
    fn new(profile: LevelProfile, seed: u64) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureStage {
                terrain: TerrainExtent::new(8.0, 5.0),
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
                level: profile.name().clone(),
            },
            &mut events,
        );

        Self {
            world,
            generation: Generation::new(Config::new(SCREEN_WIDTH, 3, 10, seed)),
            profile,
            pending_events: events,
        }
    }

    /// Advances one frame: moves the camera, runs the generator against the
    /// frame snapshot, applies the emitted commands, and records spawns.
    fn step(&mut self, catalogs: CatalogView<'_>, log: &mut Vec<SpawnRecord>) {
        let camera_x = query::camera_x(&self.world) + CAMERA_STEP;
        let mut events = std::mem::take(&mut self.pending_events);
        world::apply(&mut self.world, Command::MoveCamera { x: camera_x }, &mut events);

        let frame = query::frame_view(&self.world);
        let mut commands = Vec::new();
        self.generation
            .handle(&events, frame, catalogs, &self.profile, &mut commands);

        let mut produced = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut produced);
        }
        for event in &produced {
            match event {
                Event::EntitySpawned {
                    prototype,
                    tag,
                    position,
                    ..
                } => log.push(SpawnRecord {
                    prototype: *prototype,
                    tag: *tag,
                    position: *position,
                }),
                Event::SpawnRejected { prototype, .. } => {
                    panic!("spawn rejected for prototype {prototype:?}")
                }
                _ => {}
            }
        }
        self.pending_events = produced;
    }

    fn cull_enemies(&mut self) {
        let enemies: Vec<_> = query::entity_view(&self.world)
            .into_vec()
            .into_iter()
            .filter(|snapshot| snapshot.tag == EntityTag::Enemy)
            .map(|snapshot| snapshot.id)
            .collect();
        for entity in enemies {
            let mut events = Vec::new();
            world::apply(&mut self.world, Command::DespawnEntity { entity }, &mut events);
            self.pending_events.extend(events);
        }
    }
}

fn forest_profile() -> LevelProfile {
    LevelLibrary::default()
        .profile(&LevelName::new("forest"))
        .expect("forest profile")
        .clone()
}

fn run(profile: LevelProfile, seed: u64, frames: u32, catalog: CatalogView<'_>) -> Vec<SpawnRecord> {
    let mut harness = Harness::new(profile, seed);
    let mut log = Vec::new();
    for _ in 0..frames {
        harness.step(catalog, &mut log);
    }
    log
}

#[test]
fn identically_seeded_runs_replay_identical_spawn_logs() {
    let first = run(forest_profile(), 0xA5A5, 200, catalogs(true, true));
    let second = run(forest_profile(), 0xA5A5, 200, catalogs(true, true));
    assert_eq!(first, second, "replay diverged between runs");
    assert!(!first.is_empty(), "expected spawns over 200 frames");
}

#[test]
fn differently_seeded_runs_diverge() {
    let first = run(forest_profile(), 1, 200, catalogs(true, true));
    let second = run(forest_profile(), 2, 200, catalogs(true, true));
    assert_ne!(first, second, "distinct seeds should not replay");
}

#[test]
fn tutorial_first_screen_spawns_no_enemies() {
    let mut harness = Harness::new(forest_profile(), 77);
    let mut log = Vec::new();
    // Screen zero generates on the very first frame; stay within it.
    let frames_in_screen = (SCREEN_WIDTH / CAMERA_STEP) as u32 - 1;
    for _ in 0..frames_in_screen {
        harness.step(catalogs(true, true), &mut log);
    }

    assert!(
        log.iter().all(|record| record.tag != EntityTag::Enemy),
        "screen zero of the tutorial level must stay enemy-free"
    );
    assert!(
        log.iter().any(|record| record.tag == EntityTag::Prop),
        "props still scatter on screen zero"
    );
    assert!(
        log.iter().any(|record| record.tag == EntityTag::Decal),
        "decals still scatter on screen zero"
    );
}

#[test]
fn tutorial_early_screens_spawn_only_the_basic_enemy() {
    // Enough frames to cross screens 1 through 5 but stay below screen 6.
    let frames = ((SCREEN_WIDTH / CAMERA_STEP) as u32) * 6 - 1;
    let log = run(forest_profile(), 99, frames, catalogs(true, true));

    let enemy_prototypes: Vec<_> = log
        .iter()
        .filter(|record| record.tag == EntityTag::Enemy)
        .map(|record| record.prototype)
        .collect();
    assert!(!enemy_prototypes.is_empty(), "screens 1-5 spawn waves");
    assert!(
        enemy_prototypes
            .iter()
            .all(|prototype| *prototype == ENEMIES[0]),
        "early tutorial screens use only the basic enemy type"
    );
}

#[test]
fn every_screen_scatters_the_configured_densities() {
    // One frame short of the fourth boundary: exactly three passes run.
    let frames = (SCREEN_WIDTH / CAMERA_STEP) as u32 * 3 - 1;
    let log = run(forest_profile(), 13, frames, catalogs(true, true));

    let props = log
        .iter()
        .filter(|record| record.tag == EntityTag::Prop)
        .count();
    let decals = log
        .iter()
        .filter(|record| record.tag == EntityTag::Decal)
        .count();
    assert_eq!(props, 3 * 3, "three props per generated screen");
    assert_eq!(decals, 10 * 3, "ten decals per generated screen");

    for record in log.iter().filter(|record| record.tag == EntityTag::Decal) {
        assert_eq!(record.position.z(), 0.5, "decals sit on the decal layer");
    }
    for record in log.iter().filter(|record| record.tag != EntityTag::Decal) {
        assert_eq!(record.position.z(), 1.0, "everything else is surface");
    }
}

#[test]
fn boss_spawns_exactly_once_on_the_terminal_screen() {
    let profile = LevelProfile::new(LevelName::new("keep"), 55, 30, 2, false);
    // No enemies: the only spawns besides scenery can come from the boss.
    let log = run(profile, 21, 400, catalogs(false, true));

    let bosses = log
        .iter()
        .filter(|record| record.tag == EntityTag::Boss)
        .count();
    assert_eq!(bosses, 1, "boss spawns exactly once");

    // Screens 0, 1, and the boss screen each scatter three props; the boss
    // latch then blocks every further boundary pass.
    let props = log
        .iter()
        .filter(|record| record.tag == EntityTag::Prop)
        .count();
    assert_eq!(props, 3 * 3, "no boundary pass runs after the boss");
}

#[test]
fn no_boss_prototype_means_waves_continue_to_the_end() {
    let profile = LevelProfile::new(LevelName::new("keep"), 55, 30, 2, false);
    let log = run(profile, 21, 400, catalogs(true, false));

    assert!(
        log.iter().all(|record| record.tag != EntityTag::Boss),
        "no boss prototype, no boss spawn"
    );
    let enemy_screens = log
        .iter()
        .filter(|record| record.tag == EntityTag::Enemy)
        .count();
    assert!(enemy_screens > 0, "waves keep spawning past the boss screen");
}

#[test]
fn cleared_board_triggers_a_trailing_edge_wave() {
    let mut harness = Harness::new(forest_profile(), 55);
    let mut log = Vec::new();
    let frames_in_screen = (SCREEN_WIDTH / CAMERA_STEP) as u32;

    // Cross into screen 2 so the clear-wave gate opens.
    for _ in 0..frames_in_screen * 2 {
        harness.step(catalogs(true, true), &mut log);
    }

    harness.cull_enemies();
    let before = log.len();
    harness.step(catalogs(true, true), &mut log);

    let reinforcements: Vec<_> = log[before..]
        .iter()
        .filter(|record| record.tag == EntityTag::Enemy)
        .collect();
    assert!(
        !reinforcements.is_empty(),
        "a cleared board past screen one triggers a bonus wave"
    );
    assert!(
        reinforcements
            .iter()
            .all(|record| record.position.x() == RIGHT_EDGE_X),
        "clear waves line up along the trailing edge"
    );
}

#[test]
fn cleared_board_on_early_screens_stays_quiet() {
    let profile = LevelProfile::new(LevelName::new("keep"), 55, 30, 8, false);
    let mut harness = Harness::new(profile, 55);
    let mut log = Vec::new();

    // Remain well inside screen 1 so no boundary pass can interfere.
    for _ in 0..5 {
        harness.step(catalogs(true, true), &mut log);
    }
    harness.cull_enemies();
    let before = log.len();
    harness.step(catalogs(true, true), &mut log);

    assert!(
        log[before..]
            .iter()
            .all(|record| record.tag != EntityTag::Enemy),
        "clear waves must not trigger before screen two"
    );
}

#[test]
fn reloading_the_level_restarts_the_screen_progression() {
    let mut harness = Harness::new(forest_profile(), 41);
    let mut log = Vec::new();
    let frames_in_screen = (SCREEN_WIDTH / CAMERA_STEP) as u32;
    for _ in 0..frames_in_screen * 3 {
        harness.step(catalogs(true, true), &mut log);
    }
    assert!(harness.generation.current_screen() >= 3);

    let mut events = Vec::new();
    world::apply(
        &mut harness.world,
        Command::LoadLevel {
            level: LevelName::new("forest"),
        },
        &mut events,
    );
    harness.pending_events.extend(events);
    harness.step(catalogs(true, true), &mut log);

    assert!(
        harness.generation.current_screen() <= 1,
        "a newly loaded scene restarts the screen counter"
    );
}

#[test]
fn seed_derivation_feeds_distinct_levels_distinct_sessions() {
    let forest = derive_session_seed(7, &LevelName::new("forest"));
    let battlefield = derive_session_seed(7, &LevelName::new("battlefield"));
    let forest_log = run(forest_profile(), forest, 120, catalogs(true, true));
    let battlefield_profile = LevelLibrary::default()
        .profile(&LevelName::new("battlefield"))
        .expect("battlefield profile")
        .clone();
    let battlefield_log = run(battlefield_profile, battlefield, 120, catalogs(true, true));
    assert_ne!(forest_log, battlefield_log);
}
