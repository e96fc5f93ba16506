use crate::message::{AlertKind, AlertOrigin, AlertRecord};
use std::collections::VecDeque;

/// Outcome of an id-keyed alert upsert
#[derive(Clone, Debug, PartialEq)]
pub enum UpsertOutcome {
    /// Existing entry replaced in place
    Replaced,
    /// New entry inserted at the head; carries the entry evicted by the cap, if any
    Inserted { evicted: Option<AlertRecord> },
}

/// Bounded, most-recent-first alert list.
///
/// New alerts go to the head; once `capacity` is exceeded the tail (oldest)
/// entry is dropped. Updates to a known id keep the entry where it is.
#[derive(Clone, Debug)]
pub struct AlertLog {
    entries: VecDeque<AlertRecord>,
    capacity: usize,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Insert at the head, evicting the oldest entry on overflow
    pub fn push_front(&mut self, alert: AlertRecord) -> Option<AlertRecord> {
        self.entries.push_front(alert);
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    /// Replace by id in place, or insert at the head.
    ///
    /// `acknowledged` and `resolved` never go back from true to false.
    pub fn upsert(&mut self, mut alert: AlertRecord) -> UpsertOutcome {
        match self.entries.iter_mut().find(|a| a.id == alert.id) {
            Some(existing) => {
                alert.acknowledged |= existing.acknowledged;
                alert.resolved |= existing.resolved;
                *existing = alert;
                UpsertOutcome::Replaced
            }
            None => UpsertOutcome::Inserted {
                evicted: self.push_front(alert),
            },
        }
    }

    /// Mark an alert acknowledged. Returns false when the id is unknown.
    pub fn acknowledge(&mut self, alert_id: &str) -> bool {
        match self.entries.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, alert_id: &str) -> Option<&AlertRecord> {
        self.entries.iter().find(|a| a.id == alert_id)
    }

    /// True if the backend already reported an unresolved alert of this kind
    /// for the firefighter.
    pub fn has_active_server_alert(&self, kind: AlertKind, firefighter_id: &str) -> bool {
        self.entries.iter().any(|a| {
            a.origin == AlertOrigin::Server
                && a.kind == kind
                && !a.resolved
                && a.firefighter_id() == Some(firefighter_id)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<AlertRecord> {
        self.entries.iter().cloned().collect()
    }
}
