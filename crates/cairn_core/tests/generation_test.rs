//! Randomized entity churn: stale handles must never reach a slot's new
//! occupant, with or without the query cache.

use cairn_core::{Component, ComponentId, ComponentRegistry, Entity, World, WorldConfig, WorldError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Owner(u64);

impl Component for Owner {
    const ID: ComponentId = 1;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Marker;

impl Component for Marker {
    const ID: ComponentId = 2;
}

fn world(config: &WorldConfig) -> World {
    let mut registry = ComponentRegistry::with_config(config);
    registry.register::<Owner>().unwrap();
    registry.register::<Marker>().unwrap();
    World::with_config(registry, config)
}

fn churn(config: &WorldConfig, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world = world(config);
    let mut live: Vec<Entity> = Vec::new();
    let mut dead: Vec<Entity> = Vec::new();

    for _ in 0..2_000 {
        match rng.gen_range(0..4) {
            0 | 1 => {
                let entity = world.spawn();
                world.insert(entity, Owner(entity.generation()));
                live.push(entity);
            }
            2 if !live.is_empty() => {
                let entity = live.swap_remove(rng.gen_range(0..live.len()));
                world.despawn(entity);
                dead.push(entity);
            }
            _ if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                if world.has::<Marker>(entity) {
                    world.remove::<Marker>(entity);
                } else {
                    world.add::<Marker>(entity);
                }
            }
            _ => {}
        }

        // Touching a dead handle must never change the world
        if let Some(&stale) = dead.last() {
            world.add::<Marker>(stale);
            world.remove::<Owner>(stale);
        }
    }

    assert_eq!(world.entity_count(), live.len());
    for &entity in &live {
        assert!(world.is_alive(entity));
        assert_eq!(world.get::<Owner>(entity), Some(&Owner(entity.generation())));
        assert_eq!(world.get::<Entity>(entity), Some(&entity));
    }
    for &entity in &dead {
        assert!(!world.is_alive(entity));
        assert_eq!(world.try_get::<Owner>(entity), Err(WorldError::StaleEntity(entity)));
        assert!(world.signature(entity).is_none());
    }

    let query = world.query(&[Entity::ID, Owner::ID]);
    assert_eq!(query.len(), live.len());
    for (entity, owner) in query.values::<Entity>().zip(query.values::<Owner>()) {
        assert_eq!(owner.0, entity.generation());
    }
}

#[test]
fn test_churn_with_query_cache() {
    for seed in [3, 11, 2024] {
        churn(&WorldConfig::default(), seed);
    }
}

#[test]
fn test_churn_without_query_cache() {
    let config = WorldConfig {
        query_cache: false,
        ..WorldConfig::default()
    };
    for seed in [3, 11, 2024] {
        churn(&config, seed);
    }
}

#[test]
fn test_generations_are_unique_across_reuse() {
    let mut world = world(&WorldConfig::default());
    let mut seen = std::collections::HashSet::new();
    for _ in 0..100 {
        let entity = world.spawn();
        assert!(seen.insert(entity.generation()));
        world.despawn(entity);
    }
}
