//! 4-7-8 breathing exercise modelled as an explicit phase sequence.
//!
//! The plan only describes *what* comes next; waiting and cancellation are
//! left to the caller so the same steps can drive a terminal announcer or a
//! test harness.

use std::{fmt, time::Duration};

/// Phase of a single breath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathPhase {
    /// Phase that follows this one, `None` at the end of a breath.
    pub fn next(self) -> Option<BreathPhase> {
        match self {
            BreathPhase::Inhale => Some(BreathPhase::Hold),
            BreathPhase::Hold => Some(BreathPhase::Exhale),
            BreathPhase::Exhale => None,
        }
    }
}

impl fmt::Display for BreathPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BreathPhase::Inhale => "Inhale",
            BreathPhase::Hold => "Hold",
            BreathPhase::Exhale => "Exhale",
        })
    }
}

/// Per-phase durations and number of cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathingPlan {
    pub inhale: Duration,
    pub hold: Duration,
    pub exhale: Duration,
    pub cycles: u32,
}

impl Default for BreathingPlan {
    fn default() -> Self {
        Self {
            inhale: Duration::from_secs(4),
            hold: Duration::from_secs(7),
            exhale: Duration::from_secs(8),
            cycles: 4,
        }
    }
}

impl BreathingPlan {
    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn duration_of(&self, phase: BreathPhase) -> Duration {
        match phase {
            BreathPhase::Inhale => self.inhale,
            BreathPhase::Hold => self.hold,
            BreathPhase::Exhale => self.exhale,
        }
    }

    /// Total wall time of an uninterrupted run.
    pub fn total(&self) -> Duration {
        (self.inhale + self.hold + self.exhale) * self.cycles
    }

    pub fn steps(&self) -> BreathSteps {
        BreathSteps {
            plan: *self,
            cursor: (self.cycles > 0).then_some((0, BreathPhase::Inhale)),
        }
    }
}

/// A single timed wait in the exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathStep {
    /// Zero-based cycle index.
    pub cycle: u32,
    pub phase: BreathPhase,
    pub duration: Duration,
}

/// Iterator over the steps of a [`BreathingPlan`].
#[derive(Debug, Clone)]
pub struct BreathSteps {
    plan: BreathingPlan,
    cursor: Option<(u32, BreathPhase)>,
}

impl Iterator for BreathSteps {
    type Item = BreathStep;

    fn next(&mut self) -> Option<BreathStep> {
        let (cycle, phase) = self.cursor?;
        self.cursor = match phase.next() {
            Some(next) => Some((cycle, next)),
            None if cycle + 1 < self.plan.cycles => Some((cycle + 1, BreathPhase::Inhale)),
            None => None,
        };
        Some(BreathStep {
            cycle,
            phase,
            duration: self.plan.duration_of(phase),
        })
    }
}

/// How a run of the exercise ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathingOutcome {
    Completed,
    /// Stopped early after `completed` full steps.
    Cancelled { completed: usize },
}
