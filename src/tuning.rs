//! Data-driven game balance
//!
//! Every constant the simulation reads lives here so a level designer can
//! override it from JSON without recompiling. `Tuning::default()` reproduces
//! the stock game.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TuningError, TuningResult};
use crate::sim::Faction;

/// Smallest level that still fits the HQ, the player spawn and an enemy band
pub const MIN_FIELD_SIZE: usize = 12;

/// Constant parameter table for one faction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactionParams {
    /// World units travelled per movement step
    pub speed: f32,
    /// Radians turned per rotation step
    pub rotation_speed: f32,
    pub max_health: i32,
    /// Minimum time between two shots
    pub fire_cooldown_ms: u64,
    /// AI movement timer period (unused for the player)
    pub move_interval_ms: u64,
    /// AI fire timer period (unused for the player)
    pub fire_interval_ms: u64,
    /// Score awarded for destroying a tank of this faction
    pub score: u64,
}

/// Per-faction tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionTable {
    pub player: FactionParams,
    pub light: FactionParams,
    pub medium: FactionParams,
    pub heavy: FactionParams,
}

impl Default for FactionTable {
    fn default() -> Self {
        Self {
            player: FactionParams {
                speed: 0.25,
                rotation_speed: 0.05,
                max_health: 100,
                fire_cooldown_ms: 500,
                move_interval_ms: 0,
                fire_interval_ms: 0,
                score: 0,
            },
            light: FactionParams {
                speed: 0.175,
                rotation_speed: 0.05,
                max_health: 25,
                fire_cooldown_ms: 800,
                move_interval_ms: 1500,
                fire_interval_ms: 2000,
                score: 100,
            },
            medium: FactionParams {
                speed: 0.125,
                rotation_speed: 0.05,
                max_health: 50,
                fire_cooldown_ms: 1200,
                move_interval_ms: 2000,
                fire_interval_ms: 2500,
                score: 200,
            },
            heavy: FactionParams {
                speed: 0.08,
                rotation_speed: 0.05,
                max_health: 75,
                fire_cooldown_ms: 2000,
                move_interval_ms: 3000,
                fire_interval_ms: 3500,
                score: 300,
            },
        }
    }
}

/// Collision radii, bullet ballistics and block durability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub tank_radius: f32,
    pub block_radius: f32,
    /// Center distance below which two tanks overlap
    pub tank_collision_radius: f32,
    /// Enemy bullet vs player tank
    pub bullet_player_hit_radius: f32,
    /// Player bullet vs enemy tank
    pub bullet_enemy_hit_radius: f32,
    pub bullet_damage: i32,
    /// World units per tick
    pub bullet_speed: f32,
    /// Distance from tank center to the muzzle
    pub muzzle_offset: f32,
    /// Bullets are culled this far outside the grid
    pub bounds_margin: f32,
    pub steel_health: i32,
    pub brick_health: i32,
    pub block_score: u64,
    /// Steel is worth `block_score * steel_score_multiplier`
    pub steel_score_multiplier: u64,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            tank_radius: 0.7,
            block_radius: 0.5,
            tank_collision_radius: 1.5,
            bullet_player_hit_radius: 1.0,
            bullet_enemy_hit_radius: 1.0,
            bullet_damage: 25,
            bullet_speed: 0.4,
            muzzle_offset: 1.0,
            bounds_margin: 10.0,
            steel_health: 100,
            brick_health: 25,
            block_score: 10,
            steel_score_multiplier: 3,
        }
    }
}

/// Power-up drop and effect tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    /// Probability that a destroyed enemy drops a power-up
    pub drop_chance: f32,
    /// Uncollected power-ups vanish after this long
    pub lifetime_ms: u64,
    pub pickup_radius: f32,
    pub helmet_ms: u64,
    pub clock_ms: u64,
    pub machine_gun_ms: u64,
    /// Player fire cooldown while the machine gun is active
    pub machine_gun_cooldown_ms: u64,
    /// How long pickup messages stay on screen
    pub message_ms: u64,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            drop_chance: 0.3,
            lifetime_ms: 15_000,
            pickup_radius: 1.5,
            helmet_ms: 10_000,
            clock_ms: 8_000,
            machine_gun_ms: 10_000,
            machine_gun_cooldown_ms: 150,
            message_ms: 2_000,
        }
    }
}

/// Round structure, spawning and AI behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    /// Level is `field_size` x `field_size` cells
    pub field_size: usize,
    pub player_lives: u32,
    /// Enemies that must be destroyed to win
    pub total_enemies: u32,
    /// Maximum enemies alive at once
    pub max_active_enemies: usize,
    pub initial_enemies: usize,
    /// Per-tick probability of a spawn attempt
    pub spawn_chance: f32,
    /// Candidate cells sampled per spawn attempt
    pub spawn_attempts: u32,
    /// Minimum spawn distance to another enemy, in tank collision radii
    pub spawn_enemy_separation: f32,
    /// Minimum spawn distance to the player, in tank collision radii
    pub spawn_player_separation: f32,
    /// Per-tick probability that an enemy turns its body to face the player
    pub seek_chance: f32,
    /// Beyond this distance enemies favor advancing
    pub seek_far_distance: f32,
    /// Within this distance enemies may back off
    pub seek_near_distance: f32,
    pub advance_far_chance: f32,
    pub retreat_near_chance: f32,
    pub advance_default_chance: f32,
    /// Cumulative roll thresholds for light / medium (heavy takes the rest)
    pub light_share: f32,
    pub medium_share: f32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            field_size: 26,
            player_lives: 3,
            total_enemies: 20,
            max_active_enemies: 4,
            initial_enemies: 3,
            spawn_chance: 0.01,
            spawn_attempts: 20,
            spawn_enemy_separation: 2.0,
            spawn_player_separation: 6.0,
            seek_chance: 0.02,
            seek_far_distance: 15.0,
            seek_near_distance: 5.0,
            advance_far_chance: 0.8,
            retreat_near_chance: 0.3,
            advance_default_chance: 0.6,
            light_share: 0.5,
            medium_share: 0.3,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub factions: FactionTable,
    pub combat: CombatTuning,
    pub powerups: PowerUpTuning,
    pub game: GameTuning,
}

impl Tuning {
    /// Parameter table for a faction
    pub fn faction(&self, faction: Faction) -> &FactionParams {
        match faction {
            Faction::Player => &self.factions.player,
            Faction::EnemyLight => &self.factions.light,
            Faction::EnemyMedium => &self.factions.medium,
            Faction::EnemyHeavy => &self.factions.heavy,
        }
    }

    /// Parse and validate tuning from JSON (missing fields take defaults)
    pub fn from_json_str(json: &str) -> TuningResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> TuningResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn to_json_pretty(&self) -> TuningResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break the simulation's invariants
    pub fn validate(&self) -> TuningResult<()> {
        let game = &self.game;
        if game.field_size < MIN_FIELD_SIZE {
            return Err(TuningError::OutOfRange {
                name: "game.field_size",
                value: game.field_size as f64,
                expected: ">= 12",
            });
        }
        positive("game.player_lives", game.player_lives as f64)?;
        positive("game.total_enemies", game.total_enemies as f64)?;
        positive("game.max_active_enemies", game.max_active_enemies as f64)?;
        positive("game.spawn_attempts", game.spawn_attempts as f64)?;
        if game.initial_enemies > game.max_active_enemies {
            return Err(TuningError::OutOfRange {
                name: "game.initial_enemies",
                value: game.initial_enemies as f64,
                expected: "<= game.max_active_enemies",
            });
        }
        if game.max_active_enemies as u64 > game.total_enemies as u64 {
            return Err(TuningError::OutOfRange {
                name: "game.max_active_enemies",
                value: game.max_active_enemies as f64,
                expected: "<= game.total_enemies",
            });
        }
        probability("game.spawn_chance", game.spawn_chance)?;
        probability("game.seek_chance", game.seek_chance)?;
        probability("game.advance_far_chance", game.advance_far_chance)?;
        probability("game.retreat_near_chance", game.retreat_near_chance)?;
        probability("game.advance_default_chance", game.advance_default_chance)?;
        probability("game.light_share", game.light_share)?;
        probability("game.medium_share", game.medium_share)?;
        probability("game.light_share + game.medium_share", game.light_share + game.medium_share)?;
        if game.seek_near_distance >= game.seek_far_distance {
            return Err(TuningError::OutOfRange {
                name: "game.seek_near_distance",
                value: game.seek_near_distance as f64,
                expected: "< game.seek_far_distance",
            });
        }

        let combat = &self.combat;
        positive("combat.tank_radius", combat.tank_radius as f64)?;
        positive("combat.block_radius", combat.block_radius as f64)?;
        positive("combat.tank_collision_radius", combat.tank_collision_radius as f64)?;
        positive("combat.bullet_player_hit_radius", combat.bullet_player_hit_radius as f64)?;
        positive("combat.bullet_enemy_hit_radius", combat.bullet_enemy_hit_radius as f64)?;
        positive("combat.bullet_damage", combat.bullet_damage as f64)?;
        positive("combat.bullet_speed", combat.bullet_speed as f64)?;
        positive("combat.steel_health", combat.steel_health as f64)?;
        positive("combat.brick_health", combat.brick_health as f64)?;

        let powerups = &self.powerups;
        probability("powerups.drop_chance", powerups.drop_chance)?;
        positive("powerups.lifetime_ms", powerups.lifetime_ms as f64)?;
        positive("powerups.pickup_radius", powerups.pickup_radius as f64)?;
        positive("powerups.helmet_ms", powerups.helmet_ms as f64)?;
        positive("powerups.clock_ms", powerups.clock_ms as f64)?;
        positive("powerups.machine_gun_ms", powerups.machine_gun_ms as f64)?;

        let player_cooldown = self.factions.player.fire_cooldown_ms;
        for faction in Faction::ALL {
            let params = self.faction(faction);
            let keys = faction_keys(faction);
            positive(keys.speed, params.speed as f64)?;
            positive(keys.health, params.max_health as f64)?;
            if !faction.is_enemy() {
                continue;
            }
            positive(keys.move_interval, params.move_interval_ms as f64)?;
            positive(keys.fire_interval, params.fire_interval_ms as f64)?;
            // Enemies must always fire slower than the player
            if params.fire_cooldown_ms <= player_cooldown {
                return Err(TuningError::OutOfRange {
                    name: keys.cooldown,
                    value: params.fire_cooldown_ms as f64,
                    expected: "> factions.player.fire_cooldown_ms",
                });
            }
        }
        if powerups.machine_gun_cooldown_ms >= player_cooldown {
            return Err(TuningError::OutOfRange {
                name: "powerups.machine_gun_cooldown_ms",
                value: powerups.machine_gun_cooldown_ms as f64,
                expected: "< factions.player.fire_cooldown_ms",
            });
        }

        Ok(())
    }
}

struct FactionKeys {
    speed: &'static str,
    health: &'static str,
    cooldown: &'static str,
    move_interval: &'static str,
    fire_interval: &'static str,
}

fn faction_keys(faction: Faction) -> FactionKeys {
    macro_rules! keys {
        ($name:literal) => {
            FactionKeys {
                speed: concat!("factions.", $name, ".speed"),
                health: concat!("factions.", $name, ".max_health"),
                cooldown: concat!("factions.", $name, ".fire_cooldown_ms"),
                move_interval: concat!("factions.", $name, ".move_interval_ms"),
                fire_interval: concat!("factions.", $name, ".fire_interval_ms"),
            }
        };
    }
    match faction {
        Faction::Player => keys!("player"),
        Faction::EnemyLight => keys!("light"),
        Faction::EnemyMedium => keys!("medium"),
        Faction::EnemyHeavy => keys!("heavy"),
    }
}

fn positive(name: &'static str, value: f64) -> TuningResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            expected: "> 0",
        })
    }
}

fn probability(name: &'static str, value: f32) -> TuningResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value: value as f64,
            expected: "[0, 1]",
        })
    }
}
