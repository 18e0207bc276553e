//! Nearest-target searches and collision checks.
//!
//! All searches walk candidates in ascending entity id and keep the first
//! strictly-closer hit, so ties resolve to the lowest id.

use rand::Rng;

use crate::components::{EntityId, EntityKind, Side, WorkerActivity};
use crate::entities::{Entity, EntityStorage};
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::Travel;
use crate::visibility::VisibilityGrid;

/// Attempts made by [`find_nearby_free_position`] before giving up.
pub const FREE_POSITION_ATTEMPTS: usize = 10;

fn closest_matching<F>(storage: &EntityStorage, from: Vec2Fixed, mut accept: F) -> Option<EntityId>
where
    F: FnMut(&Entity) -> bool,
{
    let mut best: Option<(EntityId, Fixed)> = None;
    for candidate in storage.iter_active() {
        if !accept(candidate) {
            continue;
        }
        let dist = candidate.position.distance_squared(from);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate.id, dist));
        }
    }
    best.map(|(id, _)| id)
}

/// Closest active entity of the opposing side standing in a cell revealed
/// for `unit`'s side. Trees are never enemies.
#[must_use]
pub fn closest_visible_enemy(
    storage: &EntityStorage,
    grid: &VisibilityGrid,
    unit: EntityId,
) -> Option<EntityId> {
    let me = storage.get_active(unit)?;
    let enemy_side = me.side.opponent()?;
    let side = me.side;
    closest_matching(storage, me.position, |c| {
        c.side == enemy_side && grid.is_point_revealed(side, c.position)
    })
}

/// Closest active town centre or barracks owned by `unit`'s side,
/// including a barracks still under construction.
#[must_use]
pub fn closest_friendly_building(storage: &EntityStorage, unit: EntityId) -> Option<EntityId> {
    let me = storage.get_active(unit)?;
    let side = me.side;
    closest_matching(storage, me.position, |c| {
        c.side == side && c.kind().is_building()
    })
}

/// Closest tree revealed for the worker's side that no worker of the other
/// side has claimed.
#[must_use]
pub fn closest_visible_tree(
    storage: &EntityStorage,
    grid: &VisibilityGrid,
    worker: EntityId,
) -> Option<EntityId> {
    let me = storage.get_active(worker)?;
    let side = me.side;
    closest_matching(storage, me.position, |c| {
        c.kind() == EntityKind::Tree
            && grid.is_point_revealed(side, c.position)
            && tree_claimant(storage, c.id, |w| w.side != side).is_none()
    })
}

/// Worker currently holding a claim on `tree` and accepted by `filter`.
///
/// A worker claims a tree while chopping it, or while travelling toward it
/// in [`WorkerActivity::MovingToChop`].
#[must_use]
pub fn tree_claimant<F>(storage: &EntityStorage, tree: EntityId, filter: F) -> Option<EntityId>
where
    F: Fn(&Entity) -> bool,
{
    storage
        .iter_active()
        .filter(|e| filter(e))
        .find(|e| {
            let Some(worker) = e.worker() else {
                return false;
            };
            match worker.activity {
                WorkerActivity::Chopping => worker.cutting_target == Some(tree),
                WorkerActivity::MovingToChop => e.motion.as_ref().is_some_and(|m| {
                    m.order.travel == Travel::ToChop && m.order.target == Some(tree)
                }),
                _ => false,
            }
        })
        .map(|e| e.id)
}

/// Whether a worker of the side opposing `side` has claimed `tree`.
#[must_use]
pub fn is_tree_claimed_against(storage: &EntityStorage, tree: EntityId, side: Side) -> bool {
    tree_claimant(storage, tree, |w| w.side != side).is_some()
}

/// Whether any active unit other than `exclude` stands strictly within
/// `radius` of `pos`.
#[must_use]
pub fn is_occupied(
    storage: &EntityStorage,
    pos: Vec2Fixed,
    radius: Fixed,
    exclude: Option<EntityId>,
) -> bool {
    let radius_sq = radius * radius;
    storage.iter().any(|(&id, e)| {
        e.active
            && e.kind().is_unit()
            && Some(id) != exclude
            && e.position.distance_squared(pos) < radius_sq
    })
}

/// Uniformly distributed unit vector, built without trigonometry by
/// rejection-sampling a point in the unit disc.
fn random_direction<R: Rng>(rng: &mut R) -> Vec2Fixed {
    const SCALE: i32 = 1024;
    for _ in 0..32 {
        let x = rng.gen_range(-SCALE..=SCALE);
        let y = rng.gen_range(-SCALE..=SCALE);
        let len_sq = x * x + y * y;
        if len_sq == 0 || len_sq > SCALE * SCALE {
            continue;
        }
        return Vec2Fixed::from_ints(x, y).normalize();
    }
    Vec2Fixed::from_ints(1, 0)
}

/// A spot near `origin` not occupied by any unit except `exclude`.
///
/// Tries [`FREE_POSITION_ATTEMPTS`] random polar offsets with radius in
/// `[collision_radius, max_radius]`. Falls back to `origin` itself, in
/// which case units may overlap.
pub fn find_nearby_free_position<R: Rng>(
    storage: &EntityStorage,
    origin: Vec2Fixed,
    collision_radius: u32,
    max_radius: u32,
    exclude: Option<EntityId>,
    rng: &mut R,
) -> Vec2Fixed {
    let collision = Fixed::from_num(collision_radius);
    let max_radius = max_radius.max(collision_radius);

    for _ in 0..FREE_POSITION_ATTEMPTS {
        let radius = Fixed::from_num(rng.gen_range(collision_radius..=max_radius));
        let candidate = origin + random_direction(rng).scale(radius);
        if !is_occupied(storage, candidate, collision, exclude) {
            return candidate;
        }
    }

    tracing::warn!(
        x = %origin.x,
        y = %origin.y,
        "No free position found, falling back to origin"
    );
    origin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EntityBody, Health, Spearman, SpearmanGoal, Worker};
    use crate::config::WorldConfig;
    use crate::visibility::WorldRect;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn spawn(storage: &mut EntityStorage, side: Side, x: i32, y: i32, body: EntityBody) -> EntityId {
        storage.insert(Entity::new(side, Vec2Fixed::from_ints(x, y), Health::new(10), body))
    }

    fn worker() -> EntityBody {
        EntityBody::Worker(Worker::default())
    }

    fn spearman() -> EntityBody {
        EntityBody::Spearman(Spearman::new(SpearmanGoal::Attack))
    }

    fn revealed_grid(side: Side) -> VisibilityGrid {
        let mut grid = VisibilityGrid::new(&WorldConfig::default());
        grid.reveal(
            side,
            WorldRect::new(Vec2Fixed::ZERO, Vec2Fixed::from_ints(800, 600)),
        );
        grid
    }

    #[test]
    fn test_enemy_search_skips_neutral_and_friendly() {
        let mut storage = EntityStorage::new();
        let me = spawn(&mut storage, Side::Player, 100, 100, spearman());
        spawn(&mut storage, Side::Neutral, 110, 100, EntityBody::Tree);
        spawn(&mut storage, Side::Player, 105, 100, worker());
        let enemy = spawn(&mut storage, Side::Ai, 300, 100, worker());

        let grid = revealed_grid(Side::Player);
        assert_eq!(closest_visible_enemy(&storage, &grid, me), Some(enemy));
    }

    #[test]
    fn test_enemy_in_fog_is_invisible() {
        let mut storage = EntityStorage::new();
        let me = spawn(&mut storage, Side::Player, 100, 100, spearman());
        spawn(&mut storage, Side::Ai, 300, 100, worker());

        let grid = VisibilityGrid::new(&WorldConfig::default());
        assert_eq!(closest_visible_enemy(&storage, &grid, me), None);
    }

    #[test]
    fn test_enemy_ties_resolve_to_lowest_id() {
        let mut storage = EntityStorage::new();
        let me = spawn(&mut storage, Side::Ai, 200, 200, spearman());
        let first = spawn(&mut storage, Side::Player, 150, 200, worker());
        spawn(&mut storage, Side::Player, 250, 200, worker());

        let grid = revealed_grid(Side::Ai);
        assert_eq!(closest_visible_enemy(&storage, &grid, me), Some(first));
    }

    #[test]
    fn test_friendly_building_includes_construction_sites() {
        let mut storage = EntityStorage::new();
        let me = spawn(&mut storage, Side::Player, 100, 100, spearman());
        spawn(&mut storage, Side::Player, 700, 100, EntityBody::TownCenter);
        let site = spawn(
            &mut storage,
            Side::Player,
            200,
            100,
            EntityBody::Barracks(crate::components::Barracks {
                under_construction: true,
                training: None,
            }),
        );
        spawn(&mut storage, Side::Ai, 120, 100, EntityBody::TownCenter);

        assert_eq!(closest_friendly_building(&storage, me), Some(site));
    }

    #[test]
    fn test_claimed_tree_is_skipped_for_other_side_only() {
        let mut storage = EntityStorage::new();
        let near = spawn(&mut storage, Side::Neutral, 120, 100, EntityBody::Tree);
        let far = spawn(&mut storage, Side::Neutral, 300, 100, EntityBody::Tree);
        let rival = spawn(
            &mut storage,
            Side::Ai,
            130,
            100,
            EntityBody::Worker(Worker {
                activity: WorkerActivity::Chopping,
                cutting_target: Some(near),
                ..Worker::default()
            }),
        );
        let me = spawn(&mut storage, Side::Player, 100, 100, worker());

        let mut grid = revealed_grid(Side::Player);
        grid.reveal(Side::Ai, WorldRect::new(Vec2Fixed::ZERO, Vec2Fixed::from_ints(800, 600)));

        assert_eq!(closest_visible_tree(&storage, &grid, me), Some(far));
        assert!(is_tree_claimed_against(&storage, near, Side::Player));
        assert!(!is_tree_claimed_against(&storage, near, Side::Ai));
        assert_eq!(tree_claimant(&storage, near, |_| true), Some(rival));
    }

    #[test]
    fn test_is_occupied_ignores_excluded_and_buildings() {
        let mut storage = EntityStorage::new();
        let unit = spawn(&mut storage, Side::Player, 100, 100, worker());
        spawn(&mut storage, Side::Player, 200, 100, EntityBody::TownCenter);
        let radius = Fixed::from_num(20);

        assert!(is_occupied(&storage, Vec2Fixed::from_ints(110, 100), radius, None));
        assert!(!is_occupied(&storage, Vec2Fixed::from_ints(110, 100), radius, Some(unit)));
        assert!(!is_occupied(&storage, Vec2Fixed::from_ints(120, 100), radius, None));
        assert!(!is_occupied(&storage, Vec2Fixed::from_ints(200, 100), radius, None));
    }

    #[test]
    fn test_free_position_moves_off_occupied_spot() {
        let mut storage = EntityStorage::new();
        spawn(&mut storage, Side::Player, 100, 100, worker());
        let mut rng = SmallRng::seed_from_u64(3);
        let origin = Vec2Fixed::from_ints(100, 100);

        let pos = find_nearby_free_position(&storage, origin, 20, 50, None, &mut rng);
        assert_ne!(pos, origin);
        let dist = pos.distance(origin);
        assert!(dist >= Fixed::from_num(19) && dist <= Fixed::from_num(51), "{dist}");
    }

    #[test]
    fn test_free_position_falls_back_to_origin_when_crowded() {
        let mut storage = EntityStorage::new();
        for x in (0..=200).step_by(10) {
            for y in (0..=200).step_by(10) {
                spawn(&mut storage, Side::Ai, x, y, worker());
            }
        }
        let mut rng = SmallRng::seed_from_u64(1);
        let origin = Vec2Fixed::from_ints(100, 100);
        assert_eq!(
            find_nearby_free_position(&storage, origin, 20, 50, None, &mut rng),
            origin
        );
    }
}
