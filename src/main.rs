//! tilephys headless demo
//!
//! Builds a small level, scatters a seeded population of crates over it and
//! runs the simulation, logging contacts as they are reported.
//!
//! Usage: `tilephys [config.json] [ticks]`

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use tilephys::sim::{CollisionPoint, EntityKind, TileObject};
use tilephys::{
    CollisionEvent, CoreError, EntityDesc, Layer, MotionPolicy, SimConfig, Simulation, Vector2,
};

const SEED: u64 = 0x5EED;
const TILE: f64 = 16.0;
const DT: f64 = 1000.0 / 60.0;
const DEFAULT_TICKS: u32 = 600;

const LEVEL: &[&str] = &[
    "#..............................#",
    "#..............................#",
    "#......$$$..........$$$........#",
    "#.....#####........#####.......#",
    "#..............................#",
    "#...$$.......^^^^.......$$.....#",
    "#..######...######....######...#",
    "#..............................#",
    "#..............................#",
    "################################",
];

#[derive(Debug, Default)]
struct Tally {
    coins: i32,
    damage: i32,
    bumps: u32,
}

fn load_config(path: Option<&str>) -> Result<SimConfig, CoreError> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    match std::fs::read_to_string(path) {
        Ok(json) => SimConfig::from_json(&json),
        Err(e) => {
            log::warn!("Could not read {}: {}, using defaults", path, e);
            Ok(SimConfig::default())
        }
    }
}

fn level() -> Result<Layer, CoreError> {
    Layer::from_rows(0, "collision", LEVEL, TILE, |c| match c {
        '#' => Some(TileObject::solid(1)),
        '$' => Some(TileObject::coin(2, 10)),
        '^' => Some(TileObject::hazard(3, 5)),
        _ => None,
    })
}

fn populate(sim: &mut Simulation, rng: &mut Pcg32) -> Result<(), CoreError> {
    let bounds = sim
        .layer
        .as_ref()
        .map(Layer::pixel_bounds)
        .unwrap_or(sim.config().world_bounds);

    sim.spawn_with_material(
        EntityDesc {
            name: "player".to_string(),
            kind: EntityKind::Player,
            position: Vector2::new(40.0, 16.0),
            velocity: Vector2::new(1.5, 0.0),
            collides_with: "crate".to_string(),
            collision_points: CollisionPoint::platformer_set(Vector2::new(TILE, TILE)),
            max_speed: Some(12.0),
            ..Default::default()
        },
        "rubber",
    )?;

    let materials = ["wood", "steel", "ice", "glass"];
    for i in 0..12 {
        let x = rng.random_range(TILE..bounds.right() - 2.0 * TILE);
        let y = rng.random_range(TILE..bounds.height / 2.0);
        let material = materials[rng.random_range(0..materials.len())];
        sim.spawn_with_material(
            EntityDesc {
                name: format!("crate_{i}"),
                kind: EntityKind::Generic,
                position: Vector2::new(x, y),
                velocity: Vector2::new(rng.random_range(-1.0..1.0), 0.0),
                mass: rng.random_range(0.5..4.0),
                collides_with: "player".to_string(),
                ..Default::default()
            },
            material,
        )?;
    }

    sim.spawn(EntityDesc {
        name: "lift".to_string(),
        kind: EntityKind::Platform,
        position: Vector2::new(240.0, 80.0),
        size: Vector2::new(3.0 * TILE, 8.0),
        velocity: Vector2::new(0.0, -0.5),
        policy: MotionPolicy::Kinematic,
        ..Default::default()
    })?;
    Ok(())
}

fn register_listeners(sim: &mut Simulation, tally: &Rc<RefCell<Tally>>) {
    let t = tally.clone();
    sim.listeners
        .register_fn(EntityKind::Player, move |event, ctx| match event {
            CollisionEvent::TileContact(contact) if contact.tile.collectible => {
                let cleared = ctx
                    .layer_mut()
                    .and_then(|layer| layer.clear_tile(contact.grid_x, contact.grid_y));
                if let Some(tile) = cleared {
                    t.borrow_mut().coins += tile.money;
                    log::info!("Coin at ({}, {})", contact.grid_x, contact.grid_y);
                }
            }
            CollisionEvent::TileContact(contact) if contact.tile.is_hazard() => {
                t.borrow_mut().damage += contact.tile.damage;
            }
            CollisionEvent::TileContact(_) => {}
            CollisionEvent::EntityPair { primary, secondary } => {
                t.borrow_mut().bumps += 1;
                if let Some((player, other)) = ctx.entities.pair_mut(*primary, *secondary) {
                    let push = tilephys::sim::resolve_penetration(player, other);
                    if push.x != 0.0 {
                        player.velocity.x = -player.velocity.x * player.material.elasticity;
                    }
                    log::debug!("{} bumped {}", player.name, other.name);
                }
            }
        });

    sim.listeners.set_fallback_fn(|event, ctx| {
        if let CollisionEvent::EntityPair { primary, secondary } = event {
            if let Some((a, b)) = ctx.entities.pair_mut(*primary, *secondary) {
                tilephys::sim::resolve_penetration(a, b);
            }
        }
    });
}

fn run() -> Result<(), CoreError> {
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let ticks = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut rng = Pcg32::seed_from_u64(SEED);
    let mut sim = Simulation::new(config).with_layer(level()?);
    populate(&mut sim, &mut rng)?;

    let tally = Rc::new(RefCell::new(Tally::default()));
    register_listeners(&mut sim, &tally);

    let mut dropped = 0;
    for _ in 0..ticks {
        let stats = sim.tick(DT);
        dropped += stats.dropped;
    }

    let grounded = sim.entities.iter().filter(|e| e.grounded).count();
    let tally = tally.borrow();
    log::info!(
        "Ran {} ticks: {} entities ({} grounded), coins {}, damage {}, bumps {}",
        sim.tick_count(),
        sim.entities.len(),
        grounded,
        tally.coins,
        tally.damage,
        tally.bumps
    );
    log::info!(
        "{} events dropped, {} unrouted",
        dropped,
        sim.listeners.unrouted()
    );
    log::debug!("Quadtree nodes after last tick: {}", sim.debug_nodes().len());
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("tilephys (native) starting...");
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless demo is native only; the library has no platform code
}
