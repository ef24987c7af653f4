#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic screen-by-screen wave generation for Nightmarch levels.
//!
//! The generator tracks the camera's horizontal progress through a level
//! divided into fixed-width screens. Crossing a screen boundary triggers a
//! generation pass: the boss on the terminal screen, otherwise an enemy wave
//! plus scattered props and decals, all placed with best-effort overlap
//! avoidance. Independently, a cleared board after screen one triggers a
//! bonus wave along the level's trailing edge.

use nightmarch_core::{
    CatalogView, Command, Event, FrameView, LevelName, LevelProfile, Position, PrototypeId,
    SpawnLayer, TerrainExtent, WaveTier, WAVE_CHANCE_BOUND,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Configuration parameters required to construct the generation system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    screen_width: f32,
    prop_density: u32,
    decal_density: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided screen width,
    /// per-screen scatter densities, and session seed.
    #[must_use]
    pub const fn new(screen_width: f32, prop_density: u32, decal_density: u32, rng_seed: u64) -> Self {
        Self {
            screen_width,
            prop_density,
            decal_density,
            rng_seed,
        }
    }
}

/// Aggregated tuning knobs controlling every adjustable aspect of generation.
#[derive(Clone, Debug)]
pub struct GenerationTuning {
    /// Density budget ranges drawn per difficulty tier.
    pub budgets: BudgetTuning,
    /// Collision-avoiding placement behaviour.
    pub placement: PlacementTuning,
    /// Highest screen index on which the tutorial level spawns only the basic enemy type.
    pub tutorial_basic_screens: u32,
    /// Clear waves trigger only once the current screen index exceeds this value.
    pub clear_wave_min_screen: u32,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            budgets: BudgetTuning::default(),
            placement: PlacementTuning::default(),
            tutorial_basic_screens: 5,
            clear_wave_min_screen: 1,
        }
    }
}

/// Per-tier density budget ranges; each wave draws its budget from the
/// half-open range matching its tier.
#[derive(Clone, Copy, Debug)]
pub struct BudgetTuning {
    /// Budget range for easy waves.
    pub easy: BudgetRange,
    /// Budget range for medium waves.
    pub medium: BudgetRange,
    /// Budget range for hard waves.
    pub hard: BudgetRange,
}

impl BudgetTuning {
    /// Budget range assigned to the provided tier.
    #[must_use]
    pub const fn range(&self, tier: WaveTier) -> BudgetRange {
        match tier {
            WaveTier::Easy => self.easy,
            WaveTier::Medium => self.medium,
            WaveTier::Hard => self.hard,
        }
    }
}

impl Default for BudgetTuning {
    fn default() -> Self {
        Self {
            easy: BudgetRange::new(5, 8),
            medium: BudgetRange::new(8, 12),
            hard: BudgetRange::new(12, 16),
        }
    }
}

/// Half-open `[min, max)` range an integer density budget is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetRange {
    min: u32,
    max: u32,
}

impl BudgetRange {
    /// Creates a new budget range; `min` must sit strictly below `max`.
    #[must_use]
    pub fn new(min: u32, max: u32) -> Self {
        debug_assert!(min < max, "budget range requires min < max");
        Self { min, max }
    }

    /// Inclusive lower bound of the range.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    /// Exclusive upper bound of the range.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }
}

/// Collision-avoiding placement behaviour.
///
/// Placement is best-effort: after the attempt budget is exhausted the last
/// candidate is accepted even when it collides. Raising the attempt count
/// changes observable spawn density, so the default is part of the contract.
#[derive(Clone, Copy, Debug)]
pub struct PlacementTuning {
    /// Candidate draws attempted before accepting a colliding position.
    pub attempts: u32,
    /// Minimum separation enforced on both axes between placements of a pass.
    pub min_separation: f32,
    /// Fraction of the terrain height covered by the vertical placement band.
    pub vertical_fill: f64,
}

impl Default for PlacementTuning {
    fn default() -> Self {
        Self {
            attempts: 2,
            min_separation: 1.0,
            vertical_fill: 0.9,
        }
    }
}

/// Pure system that generates screens, waves, and the boss for a level.
///
/// One session exists per level instance; it owns the RNG stream, the screen
/// counters, and the per-pass occupied-position list. The session is created
/// at level start and discarded at teardown.
#[derive(Debug)]
pub struct Generation {
    screen_width: f32,
    prop_density: u32,
    decal_density: u32,
    tuning: GenerationTuning,
    current_screen: u32,
    last_spawn_x: f32,
    can_spawn: bool,
    clear_wave_in_flight: bool,
    occupied: Vec<Position>,
    remaining_density: i32,
    rng: ChaCha8Rng,
}

impl Generation {
    /// Creates a new generation session using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_tuning(config, GenerationTuning::default())
    }

    /// Creates a new generation session with explicit tuning.
    #[must_use]
    pub fn with_tuning(config: Config, tuning: GenerationTuning) -> Self {
        Self {
            screen_width: config.screen_width,
            prop_density: config.prop_density,
            decal_density: config.decal_density,
            tuning,
            current_screen: 0,
            last_spawn_x: config.screen_width,
            can_spawn: true,
            clear_wave_in_flight: false,
            occupied: Vec::new(),
            remaining_density: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Index of the screen the next generation pass will populate.
    #[must_use]
    pub const fn current_screen(&self) -> u32 {
        self.current_screen
    }

    /// Consumes events and the frame snapshot, emitting spawn commands.
    ///
    /// Called once per frame by the driver. A `LevelLoaded` event resets the
    /// screen counter; crossing a screen boundary runs a generation pass; a
    /// board without live enemies after screen one triggers a clear wave
    /// pinned to the trailing edge.
    pub fn handle(
        &mut self,
        events: &[Event],
        frame: FrameView,
        catalogs: CatalogView<'_>,
        profile: &LevelProfile,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::LevelLoaded { .. } = event {
                self.current_screen = 0;
            }
        }

        let mut wave_spawned = 0;
        if frame.camera_x >= self.last_spawn_x - self.screen_width && self.can_spawn {
            wave_spawned = self.generation_pass(frame.terrain, catalogs, profile, out);
            self.current_screen += 1;
            self.last_spawn_x += self.screen_width;
        }

        // Spawns emitted by this call are not yet visible in the frame view.
        if frame.live_enemies == 0
            && wave_spawned == 0
            && self.current_screen > self.tuning.clear_wave_min_screen
            && !self.clear_wave_in_flight
        {
            if let Some(edge_x) = frame.right_edge_x {
                self.clear_wave_in_flight = true;
                let _ = self.spawn_wave(catalogs, profile, Some(edge_x), frame.terrain, out);
                self.clear_wave_in_flight = false;
            }
        }
    }

    fn generation_pass(
        &mut self,
        terrain: TerrainExtent,
        catalogs: CatalogView<'_>,
        profile: &LevelProfile,
        out: &mut Vec<Command>,
    ) -> u32 {
        self.occupied.clear();

        let mut wave_spawned = 0;
        if !self.spawn_boss(catalogs, profile, terrain, out) {
            if !catalogs.enemies().is_empty() {
                wave_spawned = self.spawn_wave(catalogs, profile, None, terrain, out);
            }
        }
        if !catalogs.props().is_empty() {
            self.scatter(catalogs.props(), self.prop_density, SpawnLayer::Surface, terrain, out);
        }
        if !catalogs.decals().is_empty() {
            self.scatter(catalogs.decals(), self.decal_density, SpawnLayer::Decal, terrain, out);
        }
        wave_spawned
    }

    fn spawn_boss(
        &mut self,
        catalogs: CatalogView<'_>,
        profile: &LevelProfile,
        terrain: TerrainExtent,
        out: &mut Vec<Command>,
    ) -> bool {
        let Some(boss) = catalogs.boss() else {
            return false;
        };
        if self.current_screen != profile.screens_in_level() {
            return false;
        }

        let position = self.open_position(SpawnLayer::Surface, terrain, None);
        out.push(Command::SpawnEntity {
            prototype: boss,
            position,
        });
        // Blocks every further boundary pass; clear waves keep the level alive.
        self.can_spawn = false;
        true
    }

    fn scatter(
        &mut self,
        catalog: &[PrototypeId],
        density: u32,
        layer: SpawnLayer,
        terrain: TerrainExtent,
        out: &mut Vec<Command>,
    ) {
        for _ in 0..density {
            let index = self.rng.gen_range(0..catalog.len());
            let position = self.open_position(layer, terrain, None);
            out.push(Command::SpawnEntity {
                prototype: catalog[index],
                position,
            });
        }
    }

    fn spawn_wave(
        &mut self,
        catalogs: CatalogView<'_>,
        profile: &LevelProfile,
        pinned_x: Option<f32>,
        terrain: TerrainExtent,
        out: &mut Vec<Command>,
    ) -> u32 {
        let enemies = catalogs.enemies();
        if enemies.is_empty() {
            return 0;
        }
        if profile.tutorial() && self.current_screen == 0 {
            return 0;
        }

        let tier = self.draw_tier(profile);
        self.remaining_density = self.draw_budget(tier) as i32;

        let mut spawned = 0;
        while self.remaining_density > 0 {
            let Some(index) = self.draw_enemy_type(profile, enemies.len()) else {
                break;
            };
            let position = self.open_position(SpawnLayer::Surface, terrain, pinned_x);
            out.push(Command::SpawnEntity {
                prototype: enemies[index],
                position,
            });
            spawned += 1;
        }
        spawned
    }

    fn draw_tier(&mut self, profile: &LevelProfile) -> WaveTier {
        let roll = self.rng.gen_range(0..WAVE_CHANCE_BOUND);
        tier_for_roll(profile, roll)
    }

    fn draw_budget(&mut self, tier: WaveTier) -> u32 {
        let range = self.tuning.budgets.range(tier);
        self.rng.gen_range(range.min()..range.max())
    }

    /// Draws the next enemy type index and consumes its budget cost.
    ///
    /// Index `n` costs `n + 1` budget points. A remaining budget of exactly
    /// one forces the cheapest type so the budget can be exhausted rather
    /// than driven negative; the tutorial level forces the cheapest type on
    /// its early screens.
    fn draw_enemy_type(&mut self, profile: &LevelProfile, catalog_len: usize) -> Option<usize> {
        if self.remaining_density <= 0 {
            return None;
        }

        let index = if self.remaining_density == 1 {
            0
        } else if profile.tutorial() && self.current_screen <= self.tuning.tutorial_basic_screens {
            0
        } else {
            self.rng.gen_range(0..catalog_len.min(2))
        };
        self.remaining_density -= index as i32 + 1;
        Some(index)
    }

    /// Draws a placement, retrying a bounded number of times to avoid
    /// positions near those already taken this pass.
    ///
    /// After the attempt budget the last candidate is accepted regardless of
    /// collisions. During a clear wave the x-coordinate is pinned to the
    /// trailing edge and only the height is drawn.
    fn open_position(
        &mut self,
        layer: SpawnLayer,
        terrain: TerrainExtent,
        pinned_x: Option<f32>,
    ) -> Position {
        let width = f64::from(terrain.width());
        let height = f64::from(terrain.height());

        let mut x = 0.0;
        let mut y = 0.0;
        let mut occupied = true;
        let mut attempts = 0;
        while occupied && attempts < self.tuning.placement.attempts {
            occupied = false;

            x = match pinned_x {
                Some(edge) => edge,
                None => {
                    (width * self.rng.gen::<f64>() * 2.0 - width + f64::from(self.last_spawn_x))
                        as f32
                }
            };
            y = (height * self.rng.gen::<f64>() * self.tuning.placement.vertical_fill - height)
                as f32;

            for position in &self.occupied {
                if (x - position.x()).abs() < self.tuning.placement.min_separation
                    && (y - position.y()).abs() < self.tuning.placement.min_separation
                {
                    occupied = true;
                    break;
                }
            }
            attempts += 1;
        }

        let position = Position::new(x, y, layer.depth());
        self.occupied.push(position);
        position
    }
}

/// Maps a difficulty roll in `[0, 101)` onto a wave tier using the profile
/// cutoffs.
///
/// The comparison intentionally mirrors the level tables: rolls at or above
/// the easy cutoff land in the easy tier, the medium cutoff claims the band
/// below it, and everything else is hard. Cutoff monotonicity is enforced by
/// profile validation, not here.
#[must_use]
pub fn tier_for_roll(profile: &LevelProfile, roll: u32) -> WaveTier {
    if roll >= profile.easy_wave_chance() {
        WaveTier::Easy
    } else if roll >= profile.medium_wave_chance() {
        WaveTier::Medium
    } else {
        WaveTier::Hard
    }
}

/// Derives the session RNG seed for a level from a single global seed.
///
/// Identical global seeds replay identical playthroughs while distinct
/// levels still receive distinct streams.
#[must_use]
pub fn derive_session_seed(global_seed: u64, level: &LevelName) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(level.as_str().as_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}
