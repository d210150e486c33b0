use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{Client, Enrollment, GymClass};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("class is full ({capacity} places taken)")]
    ClassFull { capacity: u32 },
    #[error("client {client_id} is already enrolled in this class")]
    AlreadyEnrolled { client_id: i64 },
    #[error("client {client_id} is not active")]
    InactiveClient { client_id: i64 },
}

/// ClassRoster
///
/// A class together with its current enrollments. Only front-desk bookkeeping: the
/// backend still has the final word on capacity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ClassRoster {
    pub class: GymClass,
    pub enrollments: Vec<Enrollment>,
}

impl ClassRoster {
    pub fn new(class: GymClass, enrollments: Vec<Enrollment>) -> Self {
        Self { class, enrollments }
    }

    pub fn enrolled_count(&self) -> u32 {
        u32::try_from(self.enrollments.len()).unwrap_or(u32::MAX)
    }

    /// Never underflows, even if the backend overbooked the class.
    pub fn remaining(&self) -> u32 {
        self.class.capacity.saturating_sub(self.enrolled_count())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn is_enrolled(&self, client_id: i64) -> bool {
        self.enrollments.iter().any(|e| e.client_id == client_id)
    }

    /// Active clients who could still be added to this class, in the order given.
    pub fn available_clients<'a>(&self, clients: &'a [Client]) -> Vec<&'a Client> {
        clients
            .iter()
            .filter(|client| client.active)
            .filter(|client| client.id.is_some_and(|id| !self.is_enrolled(id)))
            .collect()
    }

    pub fn check_enrollment(&self, client_id: i64) -> Result<(), RosterError> {
        if self.is_enrolled(client_id) {
            return Err(RosterError::AlreadyEnrolled { client_id });
        }
        if self.is_full() {
            return Err(RosterError::ClassFull {
                capacity: self.class.capacity,
            });
        }
        Ok(())
    }
}

/// RosterView
///
/// What the enrollment screen renders: the roster, free places and who can still join.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct RosterView {
    pub roster: ClassRoster,
    pub remaining: u32,
    pub available: Vec<Client>,
}

impl RosterView {
    pub fn new(roster: ClassRoster, clients: &[Client]) -> Self {
        let available = roster.available_clients(clients).into_iter().cloned().collect();
        Self {
            remaining: roster.remaining(),
            roster,
            available,
        }
    }
}
