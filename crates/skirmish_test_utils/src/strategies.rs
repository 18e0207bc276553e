//! Proptest strategies for simulation inputs.

use proptest::prelude::*;
use skirmish_core::components::{Side, SpearmanGoal};
use skirmish_core::math::Vec2Fixed;

/// Match seed.
pub fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// A point inside the default 800x600 world.
pub fn arb_world_point() -> impl Strategy<Value = Vec2Fixed> {
    (0i32..800, 0i32..600).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
}

/// Player or AI.
pub fn arb_combatant() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Player), Just(Side::Ai)]
}

/// Any spearman goal.
pub fn arb_goal() -> impl Strategy<Value = SpearmanGoal> {
    prop_oneof![
        Just(SpearmanGoal::Attack),
        Just(SpearmanGoal::Defend),
        Just(SpearmanGoal::Scout),
        Just(SpearmanGoal::Idle),
    ]
}

/// Frame lengths a game loop might feed `step`, from a dropped frame down
/// to a single millisecond.
pub fn arb_frame_ms() -> impl Strategy<Value = u64> {
    prop_oneof![Just(16u64), Just(50u64), 1u64..=250]
}

/// A short run of frame lengths.
pub fn arb_frames(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(arb_frame_ms(), 1..=max_len)
}

/// A world rectangle inside the default world, as `(min, max)` corners.
pub fn arb_rect() -> impl Strategy<Value = (Vec2Fixed, Vec2Fixed)> {
    (arb_world_point(), 0i32..=200, 0i32..=200).prop_map(|(min, w, h)| {
        let max = Vec2Fixed::from_ints(
            (min.x.to_num::<i32>() + w).min(800),
            (min.y.to_num::<i32>() + h).min(600),
        );
        (min, max)
    })
}
