//! Environment phases and the cyclic rotator that schedules them.
//!
//! A schedule is a fixed list of `(phase, duration_frames)` entries played in
//! order and repeated forever. The rotator is a small state machine: an index
//! into the schedule, the active phase, and a frame countdown. Each call to
//! `advance()` is one frame. Activating an entry takes one frame, each
//! countdown step takes another, and the frame on which the countdown hits zero
//! clears the entry while still broadcasting its phase. The next entry activates
//! on the following frame, so an entry of duration `d` is broadcast for `d + 1`
//! frames and one full cycle lasts `Σ (dᵢ + 1)`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Peace,
    Rogue,
    Chaos,
    Frozen,
}

impl Phase {
    pub const ALL: &'static [Phase] = &[Phase::Peace, Phase::Rogue, Phase::Chaos, Phase::Frozen];

    pub fn name(self) -> &'static str {
        match self {
            Self::Peace => "peace",
            Self::Rogue => "rogue",
            Self::Chaos => "chaos",
            Self::Frozen => "frozen",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("invalid environment phase name '{0}' (expected one of peace, rogue, chaos, frozen)")]
    UnknownName(String),
    #[error("environment phase '{0}' has zero duration")]
    ZeroDuration(Phase),
}

impl FromStr for Phase {
    type Err = PhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .iter()
            .copied()
            .find(|phase| phase.name() == s)
            .ok_or_else(|| PhaseError::UnknownName(s.to_string()))
    }
}

/// Per-phase speed table carried by phase-reactive entities.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PhaseSpeeds {
    pub peace: f32,
    pub rogue: f32,
    pub chaos: f32,
    pub frozen: f32,
}

impl PhaseSpeeds {
    pub fn for_phase(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Peace => self.peace,
            Phase::Rogue => self.rogue,
            Phase::Chaos => self.chaos,
            Phase::Frozen => self.frozen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEntry {
    pub phase: Phase,
    pub duration_frames: u32,
}

impl PhaseEntry {
    pub fn new(phase: Phase, duration_frames: u32) -> Result<Self, PhaseError> {
        if duration_frames == 0 {
            return Err(PhaseError::ZeroDuration(phase));
        }
        Ok(Self {
            phase,
            duration_frames,
        })
    }

    /// Parses a `(name, duration)` pair as it appears in configuration.
    pub fn parse(name: &str, duration_frames: u32) -> Result<Self, PhaseError> {
        Self::new(name.parse()?, duration_frames)
    }
}

#[derive(Debug, Clone)]
pub struct PhaseRotator {
    schedule: Vec<PhaseEntry>,
    next_index: usize,
    /// Last broadcast phase; survives the clearing frame.
    active: Option<Phase>,
    /// True while an entry is counting down.
    running: bool,
    remaining: u32,
}

impl PhaseRotator {
    pub fn new(schedule: Vec<PhaseEntry>) -> Self {
        Self {
            schedule,
            next_index: 0,
            active: None,
            running: false,
            remaining: 0,
        }
    }

    /// Advances one frame and returns the phase broadcast for that frame.
    pub fn advance(&mut self) -> Option<Phase> {
        if self.running {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining < 1 {
                self.running = false;
            }
        } else {
            self.activate_next();
        }
        self.active
    }

    fn activate_next(&mut self) {
        let Some(entry) = self.schedule.get(self.next_index).copied() else {
            return;
        };
        self.next_index = (self.next_index + 1) % self.schedule.len();
        self.active = Some(entry.phase);
        self.running = true;
        self.remaining = entry.duration_frames;
        log::debug!(
            "Environment phase: {} for {} frames",
            entry.phase,
            entry.duration_frames
        );
    }

    pub fn active(&self) -> Option<Phase> {
        self.active
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// True on the frame an entry has run out; the next advance activates
    /// the following entry.
    pub fn is_clearing(&self) -> bool {
        self.active.is_some() && !self.running
    }

    /// Frames in one full pass over the schedule, activation frames included.
    pub fn cycle_length(&self) -> u64 {
        self.schedule
            .iter()
            .map(|e| u64::from(e.duration_frames) + 1)
            .sum()
    }
}
