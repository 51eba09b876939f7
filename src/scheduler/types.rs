use crate::model::{AssignmentId, DutyClass, DutyType, PersonId};
use chrono::NaiveDate;
use thiserror::Error;

/// Créneau à pourvoir par le générateur (gardes et astreintes : journée complète)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub class: DutyClass,
}

impl SlotRequest {
    pub fn new(date: NaiveDate, class: DutyClass) -> Self {
        Self { date, class }
    }

    pub fn duty_type(&self) -> DutyType {
        self.class.duty_type()
    }
}

/// Raison pour laquelle une personne ne peut pas prendre un créneau
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    Inactive,
    OnLeave,
    NotWorking,
    RoleNotAllowed,
    AlreadyBooked,
    RestTooShort,
    MonthlyCapReached,
    StreakTooLong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Jour sans garde (ou sans astreinte)
    CoverageGap(DutyClass),
    /// Même personne affectée deux fois sur un même créneau
    DoubleAssignment,
    /// Repos minimal non respecté
    RestViolation,
    MonthlyCapExceeded,
    StreakExceeded,
}

/// Constat typé produit par le validateur.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub date: NaiveDate,
    pub person: Option<PersonId>,
    pub assignments: Vec<AssignmentId>,
}

/// Affectations qui se chevauchent pour une personne et un jour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleBooking {
    pub person: PersonId,
    pub date: NaiveDate,
    pub assignments: Vec<AssignmentId>,
}

/// Deux gardes (ou astreintes) successives trop rapprochées
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestViolation {
    pub person: PersonId,
    pub class: DutyClass,
    pub previous: NaiveDate,
    pub next: NaiveDate,
    pub gap_days: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    #[error("time budget exhausted before {0}")]
    DeadlineExceeded(NaiveDate),
}
