//! Moteur de planification : génération sous contraintes, fatigue, équité, validation.

mod assignment;
mod conflicts;
mod equity;
mod fatigue;
mod state;
mod types;
mod util;

pub use assignment::{AssignmentGenerator, WalkOutcome};
pub use conflicts::{
    find_double_bookings, find_rest_violations, ConflictValidator, ValidationReport,
    ValidationRequest,
};
pub use equity::{score_counts, EquityScorer};
pub use fatigue::{FatigueAlert, FatigueLevel, FatigueTracker};
pub use state::PlanningState;
pub use types::{
    Conflict, ConflictKind, DoubleBooking, Ineligibility, RestViolation, SchedError, SlotRequest,
};

pub(crate) use util::short_date;
