//! Per-entity cooperative timers.
//!
//! Every delayed action (chop, build, attack, train) is a [`Timer`] in the
//! owning entity's [`TimerList`]. The tick driver polls the lists; nothing
//! ever blocks. Deadlines are absolute simulation times, so a timer armed
//! partway through a step only starts counting from that moment.

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Worker strikes its tree.
    Chop,
    /// Worker adds structure to its barracks.
    Build,
    /// Spearman strikes its target.
    Attack,
    /// Barracks finishes training a spearman.
    Train,
}

/// A scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timer {
    /// Simulation-wide unique id, used to detect cancellation between
    /// collection and execution.
    pub uid: u64,
    /// Action to run.
    pub kind: TimerKind,
    /// Interval between fires.
    pub period_ms: u64,
    /// Absolute simulation time of the next fire.
    pub due_at_ms: u64,
    /// Re-arms after firing when set.
    pub repeating: bool,
}

/// A timer that came due during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    /// Timer id.
    pub uid: u64,
    /// Action to run.
    pub kind: TimerKind,
    /// How many periods elapsed; at least 1.
    pub fires: u32,
    /// Whether the timer stays armed after firing.
    pub repeating: bool,
}

/// Timers owned by one entity. At most one timer per [`TimerKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TimerList {
    timers: Vec<Timer>,
}

impl TimerList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer, replacing any existing timer of the same kind.
    pub fn schedule(&mut self, uid: u64, kind: TimerKind, period_ms: u64, now_ms: u64, repeating: bool) {
        self.cancel(kind);
        let period_ms = period_ms.max(1);
        self.timers.push(Timer {
            uid,
            kind,
            period_ms,
            due_at_ms: now_ms + period_ms,
            repeating,
        });
    }

    /// Cancel the timer of `kind`. Returns whether one was running;
    /// cancelling twice is harmless.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.kind != kind);
        before != self.timers.len()
    }

    /// Drop every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Whether a timer of `kind` is armed.
    #[must_use]
    pub fn has(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    /// Whether the timer with this uid is still armed.
    #[must_use]
    pub fn contains_uid(&self, uid: u64) -> bool {
        self.timers.iter().any(|t| t.uid == uid)
    }

    /// Timer of `kind`, if armed.
    #[must_use]
    pub fn get(&self, kind: TimerKind) -> Option<&Timer> {
        self.timers.iter().find(|t| t.kind == kind)
    }

    /// Number of armed timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True when nothing is armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Collect timers due at `now_ms` and advance their deadlines.
    ///
    /// Repeating timers report how many whole periods elapsed and are
    /// re-armed; one-shot timers are removed. For repeating timers the
    /// caller checks [`contains_uid`](Self::contains_uid) before each fire,
    /// so a timer cancelled by an earlier fire in the same step stays
    /// silent.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<DueTimer> {
        let mut due = Vec::new();

        for timer in &mut self.timers {
            if timer.due_at_ms > now_ms {
                continue;
            }
            let overdue = now_ms - timer.due_at_ms;
            let fires = if timer.repeating {
                overdue / timer.period_ms + 1
            } else {
                1
            };
            timer.due_at_ms += fires * timer.period_ms;
            due.push(DueTimer {
                uid: timer.uid,
                kind: timer.kind,
                fires: u32::try_from(fires).unwrap_or(u32::MAX),
                repeating: timer.repeating,
            });
        }

        let spent: Vec<u64> = self
            .timers
            .iter()
            .filter(|t| !t.repeating && due.iter().any(|d| d.uid == t.uid))
            .map(|t| t.uid)
            .collect();
        self.timers.retain(|t| !spent.contains(&t.uid));

        due
    }

    /// Elapsed and total milliseconds of the current period of `kind`.
    #[must_use]
    pub fn progress(&self, kind: TimerKind, now_ms: u64) -> Option<(u64, u64)> {
        self.get(kind).map(|t| {
            let started = t.due_at_ms.saturating_sub(t.period_ms);
            (now_ms.saturating_sub(started).min(t.period_ms), t.period_ms)
        })
    }
}
