// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight build bookkeeping.
//!
//! The admission table holds at most one slot per plugin id. A slot is
//! claimed atomically by [`AdmissionTable::try_reserve`] and is either a
//! reservation (the submitter is still preparing the workspace) or an
//! admitted [`BuildJob`].

use std::collections::HashMap;

use parking_lot::Mutex;
use pf_core::{BuildJob, BuildState, PluginId};

#[derive(Debug)]
enum Slot {
    /// Claimed by a submission that has not been admitted yet
    Preparing,
    InFlight(BuildJob),
}

#[derive(Debug, Default)]
pub struct AdmissionTable {
    slots: Mutex<HashMap<PluginId, Slot>>,
}

impl AdmissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `plugin_id`, or `None` if it is already taken.
    ///
    /// The check and the insert happen under one lock, so of two racing
    /// callers exactly one gets a reservation.
    pub fn try_reserve(&self, plugin_id: &PluginId) -> Option<Reservation<'_>> {
        let mut slots = self.slots.lock();
        if slots.contains_key(plugin_id) {
            return None;
        }
        slots.insert(plugin_id.clone(), Slot::Preparing);
        Some(Reservation { table: self, plugin_id: plugin_id.clone(), promoted: false })
    }

    /// Whether a build for `plugin_id` is being prepared or is in flight.
    pub fn contains(&self, plugin_id: &PluginId) -> bool {
        self.slots.lock().contains_key(plugin_id)
    }

    /// The admitted job for `plugin_id`, if any.
    pub fn job(&self, plugin_id: &PluginId) -> Option<BuildJob> {
        match self.slots.lock().get(plugin_id) {
            Some(Slot::InFlight(job)) => Some(job.clone()),
            _ => None,
        }
    }

    /// Update the state of an admitted job. Returns false if there is none.
    pub fn set_state(&self, plugin_id: &PluginId, state: BuildState) -> bool {
        match self.slots.lock().get_mut(plugin_id) {
            Some(Slot::InFlight(job)) => {
                job.state = state;
                true
            }
            _ => false,
        }
    }

    /// Remove the admitted job for `plugin_id`.
    ///
    /// Safe to call when nothing is admitted; returns whether a job was
    /// removed. Reservations are left to their owner.
    pub fn remove(&self, plugin_id: &PluginId) -> bool {
        let mut slots = self.slots.lock();
        if matches!(slots.get(plugin_id), Some(Slot::InFlight(_))) {
            slots.remove(plugin_id);
            true
        } else {
            false
        }
    }

    /// Number of occupied slots, reservations included.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// All admitted jobs, ordered by plugin id.
    pub fn snapshot(&self) -> Vec<BuildJob> {
        let mut jobs: Vec<BuildJob> = self
            .slots
            .lock()
            .values()
            .filter_map(|slot| match slot {
                Slot::InFlight(job) => Some(job.clone()),
                Slot::Preparing => None,
            })
            .collect();
        jobs.sort_by(|a, b| a.plugin_id.cmp(&b.plugin_id));
        jobs
    }
}

/// A claimed slot that has not been admitted yet.
///
/// Dropping it frees the slot; [`Reservation::promote`] turns it into an
/// in-flight job instead.
#[derive(Debug)]
pub struct Reservation<'a> {
    table: &'a AdmissionTable,
    plugin_id: PluginId,
    promoted: bool,
}

impl Reservation<'_> {
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    /// Admit `job` into the slot this reservation holds.
    pub fn promote(mut self, job: BuildJob) {
        debug_assert_eq!(job.plugin_id, self.plugin_id);
        self.table.slots.lock().insert(self.plugin_id.clone(), Slot::InFlight(job));
        self.promoted = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.promoted {
            return;
        }
        let mut slots = self.table.slots.lock();
        if matches!(slots.get(&self.plugin_id), Some(Slot::Preparing)) {
            slots.remove(&self.plugin_id);
        }
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
