//! Events generated during a simulation tick.
//!
//! The core never draws, plays audio or owns widgets. It reports what
//! happened and the game layer reacts: set a sprite's facing, start an
//! animation, start or stop a looping sound, pop a damage number. Events
//! are fire-and-forget; nothing flows back into the simulation.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, EntityKind, Side, SpearmanGoal, SpearmanState, WorkerActivity};
use crate::simulation::Simulation;
use crate::victory::Outcome;

/// Animation the renderer should play on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Animation {
    /// Standing still.
    Idle,
    /// Walking.
    Walk,
    /// Swinging an axe at a tree.
    Chop,
    /// Hammering at a construction site.
    Build,
    /// Thrusting a spear.
    Attack,
}

/// Looping sounds arbitrated by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Footsteps; plays while any unit travels.
    Walk,
    /// Axe and hammer; plays while any worker chops or builds.
    Chop,
    /// Clashing spears; plays while any spearman attacks.
    Attack,
}

impl SoundCue {
    /// Every cue, in arbitration order.
    pub const ALL: [SoundCue; 3] = [SoundCue::Walk, SoundCue::Chop, SoundCue::Attack];
}

/// Something the game layer may want to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Health was removed from an entity.
    Damaged {
        /// Entity hit.
        target: EntityId,
        /// Damage actually dealt.
        amount: u32,
        /// Source, when known.
        attacker: Option<EntityId>,
        /// Health left.
        remaining: u32,
    },
    /// An entity reached zero health.
    Died {
        /// Dead entity.
        entity: EntityId,
        /// What it was.
        kind: EntityKind,
        /// Who owned it.
        side: Side,
    },
    /// A side's wood stockpile changed.
    WoodChanged {
        /// Stockpile owner.
        side: Side,
        /// New total.
        wood: u32,
    },
    /// A worker committed to a new barracks.
    ConstructionStarted {
        /// Placeholder barracks.
        barracks: EntityId,
        /// Builder side.
        side: Side,
    },
    /// Structure was added to a barracks.
    ConstructionProgress {
        /// Barracks being built.
        barracks: EntityId,
        /// Structure so far.
        health: u32,
        /// Structure when complete.
        max: u32,
    },
    /// A barracks was abandoned before completion and its cost refunded.
    ConstructionCancelled {
        /// Removed barracks.
        barracks: EntityId,
        /// Builder side.
        side: Side,
        /// Wood returned.
        refund: u32,
    },
    /// A barracks finished construction.
    ConstructionCompleted {
        /// Finished barracks.
        barracks: EntityId,
        /// Owner.
        side: Side,
    },
    /// A barracks started training a spearman.
    TrainingStarted {
        /// Training site.
        barracks: EntityId,
    },
    /// Training was cut short.
    TrainingCancelled {
        /// Training site.
        barracks: EntityId,
    },
    /// A trained spearman entered the field.
    SpearmanSpawned {
        /// New unit.
        spearman: EntityId,
        /// Where it was trained.
        barracks: EntityId,
        /// Owner.
        side: Side,
    },
    /// A unit should play an animation.
    Animation {
        /// Unit.
        entity: EntityId,
        /// Animation to play.
        animation: Animation,
    },
    /// A unit's sprite should be mirrored.
    FacingChanged {
        /// Unit.
        entity: EntityId,
        /// Faces left when set.
        facing_left: bool,
    },
    /// A worker changed activity.
    WorkerActivityChanged {
        /// Worker.
        worker: EntityId,
        /// New activity.
        activity: WorkerActivity,
    },
    /// A spearman's execution state changed.
    SpearmanStateChanged {
        /// Spearman.
        spearman: EntityId,
        /// New state.
        state: SpearmanState,
    },
    /// A spearman's long-lived goal changed.
    GoalChanged {
        /// Spearman.
        spearman: EntityId,
        /// New goal.
        goal: SpearmanGoal,
    },
    /// The player's selection changed.
    SelectionChanged {
        /// Selected unit, if any.
        selected: Option<EntityId>,
    },
    /// A looping sound should start.
    SoundStarted(SoundCue),
    /// A looping sound should stop.
    SoundStopped(SoundCue),
    /// The match ended.
    GameOver(Outcome),
}

/// Events produced by one call to [`Simulation::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick the events belong to.
    pub tick: u64,
    /// Simulation time at the end of the step.
    pub time_ms: u64,
    /// Events in the order they happened.
    pub events: Vec<SimEvent>,
}

impl TickEvents {
    /// Entities that died during the step.
    #[must_use]
    pub fn deaths(&self) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Died { entity, .. } => Some(*entity),
                _ => None,
            })
            .collect()
    }

    /// Match result, if the match ended during the step.
    #[must_use]
    pub fn game_over(&self) -> Option<Outcome> {
        self.events.iter().find_map(|e| match e {
            SimEvent::GameOver(outcome) => Some(*outcome),
            _ => None,
        })
    }

    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Which looping sounds are currently playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SoundLoops {
    walk: bool,
    chop: bool,
    attack: bool,
}

impl SoundLoops {
    /// Whether `cue` is playing.
    #[must_use]
    pub const fn is_playing(&self, cue: SoundCue) -> bool {
        match cue {
            SoundCue::Walk => self.walk,
            SoundCue::Chop => self.chop,
            SoundCue::Attack => self.attack,
        }
    }

    fn set(&mut self, cue: SoundCue, playing: bool) {
        match cue {
            SoundCue::Walk => self.walk = playing,
            SoundCue::Chop => self.chop = playing,
            SoundCue::Attack => self.attack = playing,
        }
    }
}

impl Simulation {
    /// Looping sounds currently playing.
    #[must_use]
    pub const fn sound_loops(&self) -> SoundLoops {
        self.sounds
    }

    /// Start or stop each looping sound so that it plays iff at least one
    /// unit on either side needs it.
    pub(crate) fn update_sound_loops(&mut self) {
        let mut wanted = SoundLoops::default();
        for entity in self.entities.iter_active() {
            if entity.is_moving() {
                wanted.walk = true;
            }
            if let Some(worker) = entity.worker() {
                if matches!(
                    worker.activity,
                    WorkerActivity::Chopping | WorkerActivity::Building
                ) {
                    wanted.chop = true;
                }
            }
            if entity
                .spearman()
                .is_some_and(|s| s.state == SpearmanState::Attacking)
            {
                wanted.attack = true;
            }
        }
        self.apply_sound_loops(wanted);
    }

    /// Stop every looping sound.
    pub(crate) fn silence_sound_loops(&mut self) {
        self.apply_sound_loops(SoundLoops::default());
    }

    fn apply_sound_loops(&mut self, wanted: SoundLoops) {
        for cue in SoundCue::ALL {
            let playing = self.sounds.is_playing(cue);
            let want = wanted.is_playing(cue);
            if playing == want {
                continue;
            }
            self.sounds.set(cue, want);
            self.emit(if want {
                SimEvent::SoundStarted(cue)
            } else {
                SimEvent::SoundStopped(cue)
            });
        }
    }
}
