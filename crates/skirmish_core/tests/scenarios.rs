//! End-to-end scenarios driven through the public API.

use skirmish_core::components::{EntityKind, Side, SpearmanGoal, SpearmanState, WorkerActivity};
use skirmish_core::simulation::Simulation;
use skirmish_test_utils::fixtures::{empty_world, point, revealed_world, run_steps};

fn activity(sim: &Simulation, id: u64) -> WorkerActivity {
    sim.entity(id).unwrap().worker().unwrap().activity
}

fn spearman_state(sim: &Simulation, id: u64) -> SpearmanState {
    sim.entity(id).unwrap().spearman().unwrap().state
}

#[test]
fn test_chopping_fells_tree_and_pays_wood() {
    let mut sim = empty_world();
    let tree = sim.spawn_tree(point(260, 300));
    sim.spawn_tree(point(700, 500));
    let worker = sim.spawn_worker(Side::Player, point(230, 300));
    sim.command_chop(worker, tree).unwrap();

    sim.step(1);
    assert_eq!(activity(&sim, worker), WorkerActivity::Chopping);

    run_steps(&mut sim, 3, 1000);
    assert_eq!(sim.entity(tree).unwrap().health.current, 7);
    assert_eq!(sim.tree_tier_of(tree), Some(0));
    assert_eq!(sim.wood(Side::Player), 0);

    run_steps(&mut sim, 7, 1000);
    assert!(sim.entity(tree).is_none());
    assert_eq!(sim.wood(Side::Player), 10);
    assert!(!sim.is_over());
}

#[test]
fn test_travel_time_follows_distance() {
    let mut sim = empty_world();
    let tree = sim.spawn_tree(point(260, 300));
    let worker = sim.spawn_worker(Side::Player, point(100, 300));
    sim.command_chop(worker, tree).unwrap();

    sim.step(1299);
    assert_eq!(activity(&sim, worker), WorkerActivity::MovingToChop);
    sim.step(1);
    assert_eq!(activity(&sim, worker), WorkerActivity::Chopping);
    assert_eq!(sim.entity(worker).unwrap().position, point(230, 300));
}

#[test]
fn test_defender_returns_then_holds() {
    let mut sim = revealed_world();
    sim.spawn_town_center(Side::Player, point(100, 300));
    let spear = sim.spawn_spearman(Side::Player, point(500, 300), SpearmanGoal::Defend);

    sim.step(1);
    assert_eq!(spearman_state(&sim, spear), SpearmanState::MovingToDefendPos);

    sim.step(5000);
    assert_eq!(spearman_state(&sim, spear), SpearmanState::Idle);
    assert_eq!(sim.entity(spear).unwrap().position, point(130, 300));

    run_steps(&mut sim, 20, 50);
    assert_eq!(spearman_state(&sim, spear), SpearmanState::Idle);
    assert_eq!(sim.thought_bubble(spear).unwrap(), "G:Defend | S:Idle (guarding)");
}

#[test]
fn test_worker_builds_barracks() {
    let mut sim = revealed_world();
    sim.set_wood(Side::Player, 40);
    let tc = sim.spawn_town_center(Side::Player, point(100, 300));
    let worker = sim.spawn_worker(Side::Player, point(140, 300));

    sim.step(1);
    assert_eq!(sim.wood(Side::Player), 0);
    assert_eq!(activity(&sim, worker), WorkerActivity::MovingToBuild);
    let barracks = sim.entities().ids_of_kind(EntityKind::Barracks)[0];
    assert_eq!(sim.barracks_opacity(barracks), Some(50));
    assert_eq!(sim.entity(barracks).unwrap().position, point(180, 300));

    sim.step(1);
    assert_eq!(activity(&sim, worker), WorkerActivity::Building);

    run_steps(&mut sim, 99, 1000);
    assert_eq!(sim.entity(barracks).unwrap().health.current, 99);
    assert_eq!(sim.barracks_opacity(barracks), Some(50));

    sim.step(1000);
    let entity = sim.entity(barracks).unwrap();
    assert!(!entity.barracks().unwrap().under_construction);
    assert_eq!(entity.health.current, 100);
    assert_eq!(sim.barracks_opacity(barracks), Some(100));
    assert_eq!(activity(&sim, worker), WorkerActivity::Idle);
    assert!(sim.entity(tc).unwrap().active);
}

#[test]
fn test_interrupted_construction_refunds() {
    let mut sim = revealed_world();
    sim.set_wood(Side::Player, 50);
    sim.spawn_town_center(Side::Player, point(100, 300));
    let worker = sim.spawn_worker(Side::Player, point(500, 300));

    sim.step(1);
    assert_eq!(sim.wood(Side::Player), 10);
    assert_eq!(activity(&sim, worker), WorkerActivity::MovingToBuild);

    sim.command_move(worker, point(600, 300)).unwrap();
    assert_eq!(sim.wood(Side::Player), 50);
    assert_eq!(activity(&sim, worker), WorkerActivity::MovingToIdle);
    assert_eq!(sim.entities().count(Side::Player, EntityKind::Barracks), 0);

    sim.step(1);
    assert!(sim.entities().ids_of_kind(EntityKind::Barracks).is_empty());
}

#[test]
fn test_death_releases_all_attackers() {
    let mut sim = revealed_world();
    // Only the opposing side can attack a unit, so both attackers are Player spearmen.
    let target = sim.spawn_worker(Side::Ai, point(400, 300));
    let near = sim.spawn_spearman(Side::Player, point(370, 300), SpearmanGoal::Attack);
    let far = sim.spawn_spearman(Side::Player, point(150, 300), SpearmanGoal::Attack);

    sim.step(1);
    assert_eq!(spearman_state(&sim, near), SpearmanState::Attacking);
    assert_eq!(spearman_state(&sim, far), SpearmanState::MovingToAttack);

    sim.apply_damage(target, 1000, None);
    for id in [near, far] {
        let entity = sim.entity(id).unwrap();
        let spearman = entity.spearman().unwrap();
        assert_eq!(spearman.state, SpearmanState::Idle);
        assert_eq!(spearman.attack_target, None);
        assert!(entity.motion.is_none());
    }

    let events = sim.step(1);
    assert_eq!(events.deaths(), vec![target]);
}

#[test]
fn test_fog_hides_enemy_until_scouted() {
    let mut sim = empty_world();
    let spear = sim.spawn_spearman(Side::Player, point(100, 300), SpearmanGoal::Attack);
    let enemy = sim.spawn_worker(Side::Ai, point(700, 300));

    sim.step(1);
    assert_eq!(sim.entity(spear).unwrap().spearman().unwrap().goal, SpearmanGoal::Scout);
    assert!(!sim.visibility().is_point_revealed(Side::Player, point(700, 300)));
    assert!(sim.visibility().is_point_revealed(Side::Ai, sim.entity(enemy).unwrap().position));
}
