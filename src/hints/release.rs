//! Hint Release State Machine
//!
//! Per team, every configured hint payload moves through:
//!
//! ```text
//! Unreleased ──release──► Stale ──recheck──► Fresh ──check_and_set_broadcasted──► Broadcasted
//!                           ▲                  │                                      │
//!                           └────mark_stale────┴──────────────────────────────────────┘
//! ```
//!
//! Release data is only recomputed when something reads it, so a burst of
//! checks before the next broadcast costs one projection per hint and one
//! notification per (recipient, kind).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use crate::core::checks::CheckState;
use crate::core::ids::{LocationId, SlotId, TeamId};
use crate::hints::index::TriggerIndex;
use crate::hints::payload::{HintKey, HintKind, HintPayload};
use crate::hints::sink::HintSink;
use crate::hints::trigger::{Trigger, TriggerableHint, TriggerableId};
use crate::hints::InvariantViolation;
use crate::text::parts::{MessageBuilder, MessagePart};

// =============================================================================
// STATE
// =============================================================================

/// Identity of a distinct hint payload within one engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HintId(pub usize);

impl fmt::Display for HintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hint({})", self.0)
    }
}

/// Per-team lifecycle of one hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    /// Not visible yet.
    #[default]
    Unreleased,
    /// Visible, release data out of date.
    Stale,
    /// Visible, release data current, recipients not told yet.
    Fresh,
    /// Visible and recipients notified.
    Broadcasted,
}

impl ReleaseState {
    /// Anything past `Unreleased`.
    pub fn is_released(self) -> bool {
        self != ReleaseState::Unreleased
    }
}

#[derive(Clone, Debug, Default)]
struct ReleaseRecord {
    state: ReleaseState,
    data: Option<HintPayload>,
}

/// Abort on a bookkeeping bug. These never come from peer input.
fn invariant<T>(result: Result<T, InvariantViolation>) -> T {
    match result {
        Ok(value) => value,
        Err(violation) => {
            error!("Hint invariant violated: {}", violation);
            panic!("hint invariant violated: {}", violation);
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Owns the configured hints, their trigger index and every team's release records.
#[derive(Debug)]
pub struct HintEngine {
    triggerables: Vec<TriggerableHint>,
    /// Payload identity of each triggerable, by position.
    hint_of: Vec<HintId>,
    payloads: Vec<HintPayload>,
    index: TriggerIndex,
    teams: BTreeMap<TeamId, Vec<ReleaseRecord>>,
}

impl HintEngine {
    /// Build the engine from the session's triggerable hints.
    ///
    /// Triggerables whose payloads share an identity share one release
    /// record per team. The first configured payload of an identity wins.
    pub fn new(triggerables: Vec<TriggerableHint>) -> Self {
        let mut payloads: Vec<HintPayload> = Vec::new();
        let mut keys: BTreeMap<HintKey, HintId> = BTreeMap::new();
        let mut hint_of = Vec::with_capacity(triggerables.len());

        for triggerable in &triggerables {
            let key = triggerable.hint.key();
            let id = match keys.get(&key) {
                Some(&id) => {
                    if payloads[id.0] != triggerable.hint {
                        warn!("Conflicting payloads for {:?}; keeping the first", key);
                    }
                    id
                }
                None => {
                    payloads.push(triggerable.hint.clone());
                    let id = HintId(payloads.len() - 1);
                    keys.insert(key, id);
                    id
                }
            };
            hint_of.push(id);
        }

        let index = TriggerIndex::build(&triggerables);
        info!(
            "Hint engine ready: {} triggerables, {} distinct hints, {} free, {} trigger locations",
            triggerables.len(),
            payloads.len(),
            index.free().len(),
            index.trigger_location_count()
        );

        Self { triggerables, hint_of, payloads, index, teams: BTreeMap::new() }
    }

    /// Number of distinct hints.
    pub fn hint_count(&self) -> usize {
        self.payloads.len()
    }

    /// Hint released by triggerable `id`.
    pub fn hint_for(&self, id: TriggerableId) -> Option<HintId> {
        self.hint_of.get(id.0).copied()
    }

    /// Trigger lookup tables.
    pub fn index(&self) -> &TriggerIndex {
        &self.index
    }

    /// Has `team` been set up?
    pub fn is_team_initialized(&self, team: TeamId) -> bool {
        self.teams.contains_key(&team)
    }

    /// Current state of `hint` for `team`, if both exist.
    pub fn state(&self, hint: HintId, team: TeamId) -> Option<ReleaseState> {
        self.teams.get(&team)?.get(hint.0).map(|record| record.state)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Set up `team` on first sight: release free hints, then broadcast.
    ///
    /// Later calls do nothing.
    pub fn ensure_team_init(&mut self, team: TeamId, checks: &dyn CheckState, sink: &mut dyn HintSink) {
        if self.teams.contains_key(&team) {
            return;
        }

        self.teams.insert(team, vec![ReleaseRecord::default(); self.payloads.len()]);
        debug!("Initialized hint state for team {}", team);

        for position in 0..self.index.free().len() {
            let id = self.index.free()[position];
            self.release_triggered(id, team, checks, sink);
        }

        self.broadcast_updates(team, checks, sink);
    }

    /// Notify recipients of every hint that became fresh since the last pass.
    ///
    /// At most one notification per distinct (recipient, kind).
    pub fn broadcast_updates(&mut self, team: TeamId, checks: &dyn CheckState, sink: &mut dyn HintSink) {
        self.ensure_team_init(team, checks, sink);

        let mut needed: BTreeSet<(SlotId, HintKind)> = BTreeSet::new();
        for position in 0..self.payloads.len() {
            let hint = HintId(position);
            if invariant(self.check_and_set_broadcasted(hint, team, checks)) {
                let payload = &self.payloads[position];
                let kind = payload.kind();
                needed.extend(payload.recipients().into_iter().map(|recipient| (recipient, kind)));
            }
        }

        if !needed.is_empty() {
            debug!("Team {}: {} hint refreshes", team, needed.len());
        }
        for (recipient, kind) in needed {
            sink.notify(team, recipient, kind);
        }
    }

    /// Apply one checked location: fire location triggers, then re-arm tracking hints.
    ///
    /// Does not broadcast; call [`HintEngine::broadcast_updates`] after the batch.
    pub fn on_location_checked(
        &mut self,
        team: TeamId,
        player: SlotId,
        location: LocationId,
        checks: &dyn CheckState,
        sink: &mut dyn HintSink,
    ) {
        self.ensure_team_init(team, checks, sink);
        trace!("Team {}: slot {} checked {}", team, player, location);

        let fired = self.index.triggered_by(player, location).to_vec();
        for id in fired {
            if self.triggerables[id.0].trigger.matches(player, location) {
                self.release_triggered(id, team, checks, sink);
            }
        }

        let tracking = self.index.tracking(player, location).to_vec();
        for id in tracking {
            let hint = self.hint_of[id.0];
            invariant(self.mark_stale(hint, team));
        }
    }

    /// Ingest a batch of checks in one world, then broadcast once.
    pub fn on_locations_checked(
        &mut self,
        team: TeamId,
        player: SlotId,
        locations: &[LocationId],
        checks: &dyn CheckState,
        sink: &mut dyn HintSink,
    ) {
        for &location in locations {
            self.on_location_checked(team, player, location, checks, sink);
        }
        self.broadcast_updates(team, checks, sink);
    }

    /// Release data of every released `kind` hint visible to `player`.
    pub fn released_hints_for_kind(
        &mut self,
        team: TeamId,
        player: SlotId,
        kind: HintKind,
        checks: &dyn CheckState,
        sink: &mut dyn HintSink,
    ) -> Vec<HintPayload> {
        self.ensure_team_init(team, checks, sink);

        let mut released = Vec::new();
        for position in 0..self.payloads.len() {
            let hint = HintId(position);
            let payload = &self.payloads[position];
            if payload.kind() != kind || !payload.recipients().contains(&player) {
                continue;
            }
            if self.state(hint, team).is_some_and(ReleaseState::is_released) {
                released.push(invariant(self.recheck(hint, team, checks)).clone());
            }
        }
        released
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// `Unreleased -> Stale`. Returns false if already released.
    pub fn release(&mut self, hint: HintId, team: TeamId) -> Result<bool, InvariantViolation> {
        let record = self.record_mut(hint, team)?;
        if record.state != ReleaseState::Unreleased {
            return Ok(false);
        }
        record.state = ReleaseState::Stale;
        debug!("Team {}: released {}", team, hint);
        Ok(true)
    }

    /// Re-arm a released hint. Returns false if it is still unreleased.
    pub fn mark_stale(&mut self, hint: HintId, team: TeamId) -> Result<bool, InvariantViolation> {
        let record = self.record_mut(hint, team)?;
        if record.state == ReleaseState::Unreleased {
            return Ok(false);
        }
        record.state = ReleaseState::Stale;
        Ok(true)
    }

    /// Current release data, recomputed first if stale.
    pub fn recheck(
        &mut self,
        hint: HintId,
        team: TeamId,
        checks: &dyn CheckState,
    ) -> Result<&HintPayload, InvariantViolation> {
        let payload = self.payloads.get(hint.0).ok_or(InvariantViolation::UnknownHint(hint))?;
        let record = self
            .teams
            .get_mut(&team)
            .ok_or(InvariantViolation::TeamNotInitialized(team))?
            .get_mut(hint.0)
            .ok_or(InvariantViolation::UnknownHint(hint))?;

        match record.state {
            ReleaseState::Unreleased => return Err(InvariantViolation::Unreleased { hint, team }),
            ReleaseState::Stale => {
                record.data = Some(payload.release_data(checks, team));
                record.state = ReleaseState::Fresh;
                trace!("Team {}: recomputed {}", team, hint);
            }
            ReleaseState::Fresh | ReleaseState::Broadcasted => {}
        }

        record.data.as_ref().ok_or(InvariantViolation::Unreleased { hint, team })
    }

    /// Claim the right to announce `hint`. True at most once per staleness episode.
    ///
    /// Unreleased hints are skipped, not errors, so whole-team scans stay simple.
    pub fn check_and_set_broadcasted(
        &mut self,
        hint: HintId,
        team: TeamId,
        checks: &dyn CheckState,
    ) -> Result<bool, InvariantViolation> {
        if self.record_mut(hint, team)?.state == ReleaseState::Stale {
            self.recheck(hint, team, checks)?;
        }

        let record = self.record_mut(hint, team)?;
        if record.state == ReleaseState::Fresh {
            record.state = ReleaseState::Broadcasted;
            return Ok(true);
        }
        Ok(false)
    }

    fn record_mut(&mut self, hint: HintId, team: TeamId) -> Result<&mut ReleaseRecord, InvariantViolation> {
        self.teams
            .get_mut(&team)
            .ok_or(InvariantViolation::TeamNotInitialized(team))?
            .get_mut(hint.0)
            .ok_or(InvariantViolation::UnknownHint(hint))
    }

    // =========================================================================
    // Triggered delivery
    // =========================================================================

    /// Release the triggerable's hint; location triggers also tell the finder and recipients.
    fn release_triggered(
        &mut self,
        id: TriggerableId,
        team: TeamId,
        checks: &dyn CheckState,
        sink: &mut dyn HintSink,
    ) {
        let hint = self.hint_of[id.0];
        if !invariant(self.release(hint, team)) {
            return;
        }

        let Trigger::Location { player: finder, .. } = self.triggerables[id.0].trigger else {
            return;
        };

        let recipients = self.payloads[hint.0].recipients();
        let hint_parts = invariant(self.recheck(hint, team, checks)).message_parts();
        sink.deliver_messages(team, found_messages(finder, &recipients, hint_parts));
    }
}

/// Per-slot announcement of a hint that `finder` just unlocked.
fn found_messages(
    finder: SlotId,
    recipients: &[SlotId],
    hint_parts: Vec<MessagePart>,
) -> BTreeMap<SlotId, Vec<MessagePart>> {
    let prefix = match recipients {
        [only] if *only == finder => MessageBuilder::new().text("Found own hint: "),
        [only] => MessageBuilder::new().text("Found hint for ").player(*only).text(": "),
        _ => MessageBuilder::new().text("Found hint for multiple players: "),
    };

    let mut messages = BTreeMap::new();
    messages.insert(finder, prefix.extend(hint_parts.iter().cloned()).build());

    for &recipient in recipients.iter().filter(|&&r| r != finder) {
        let parts = MessageBuilder::new()
            .player(finder)
            .text(" found your hint: ")
            .extend(hint_parts.iter().cloned())
            .build();
        messages.insert(recipient, parts);
    }
    messages
}
