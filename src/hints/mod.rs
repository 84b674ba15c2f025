//! Hints
//!
//! Legacy item hints plus the triggerable hint system:
//!
//! ```text
//! ┌────────────────┐   build    ┌──────────────┐
//! │ TriggerableHint│───────────►│ TriggerIndex │
//! │ (hint+trigger) │            └──────┬───────┘
//! └────────────────┘                   │ location checked
//!                                      ▼
//!  Unreleased ──release──► Stale ──recheck──► Fresh ──broadcast──► Broadcasted
//!                            ▲                                         │
//!                            └──────────────── mark_stale ─────────────┘
//! ```
//!
//! Per-team state only moves forward out of `Unreleased`; everything the
//! engine tells clients goes through a [`HintSink`].

pub mod hint;
pub mod index;
pub mod payload;
pub mod release;
pub mod sink;
pub mod trigger;

use thiserror::Error;

use crate::core::ids::TeamId;

pub use hint::Hint;
pub use index::TriggerIndex;
pub use payload::{HintKey, HintKind, HintPayload, LocationSetHint, LocationValue, SetKind, TextHint};
pub use release::{HintEngine, HintId, ReleaseState};
pub use sink::{ChannelSink, HintEvent, HintSink};
pub use trigger::{Trigger, TriggerableHint, TriggerableId};

/// Programming errors in hint bookkeeping.
///
/// None of these are caused by peers. The engine's own entry points treat
/// them as fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Release data was requested for a hint that was never released.
    #[error("hint {hint} was re-checked for team {team} before being released")]
    Unreleased {
        /// Hint.
        hint: HintId,
        /// Team.
        team: TeamId,
    },

    /// Per-team operation before `ensure_team_init`.
    #[error("team {0} has no hint state yet")]
    TeamNotInitialized(TeamId),

    /// Hint id not issued by this engine.
    #[error("unknown hint {0}")]
    UnknownHint(HintId),

    /// Location set semantics this server does not know.
    #[error("unknown location set kind: {0:?}")]
    UnknownSetKind(String),
}
