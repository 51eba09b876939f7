use super::state::PlanningState;
use super::types::{Ineligibility, SchedError, SlotRequest};
use crate::config::{FatigueConfiguration, RulesConfiguration};
use crate::model::{Assignment, AssignmentSource, DateRange, DutyClass, Period, Person, SiteId};
use std::time::Instant;
use tracing::{debug, warn};

/// Résultat du parcours jour par jour.
#[derive(Debug)]
pub struct WalkOutcome {
    pub state: PlanningState,
    pub unfilled: Vec<SlotRequest>,
}

/// Remplit les créneaux de garde / astreinte non couverts.
#[derive(Debug)]
pub struct AssignmentGenerator<'a> {
    site: SiteId,
    rules: &'a RulesConfiguration,
    fatigue: &'a FatigueConfiguration,
    personnel: Vec<&'a Person>,
    optimize: bool,
}

impl<'a> AssignmentGenerator<'a> {
    pub fn new(
        site: &SiteId,
        rules: &'a RulesConfiguration,
        fatigue: &'a FatigueConfiguration,
        personnel: &'a [Person],
        optimize: bool,
    ) -> Self {
        let mut personnel: Vec<&Person> = personnel.iter().collect();
        personnel.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            site: site.clone(),
            rules,
            fatigue,
            personnel,
            optimize,
        }
    }

    /// Parcourt `range` de gauche à droite en portant l'état d'un jour au suivant.
    pub fn walk(
        &self,
        state: PlanningState,
        range: &DateRange,
        classes: &[DutyClass],
        deadline: Option<Instant>,
    ) -> Result<WalkOutcome, SchedError> {
        let start = WalkOutcome {
            state,
            unfilled: Vec::new(),
        };
        range.days().try_fold(start, |mut outcome, date| {
            if deadline.is_some_and(|limit| Instant::now() >= limit) {
                return Err(SchedError::DeadlineExceeded(date));
            }
            outcome.state.open_day(date);
            for &class in classes {
                if outcome.state.has_duty(date, class.duty_type()) {
                    continue;
                }
                let slot = SlotRequest::new(date, class);
                if self.fill_slot(&mut outcome.state, &slot).is_none() {
                    outcome.unfilled.push(slot);
                }
            }
            outcome.state.close_day();
            Ok(outcome)
        })
    }

    /// Choisit une personne pour `slot` et réserve l'affectation, ou `None`.
    pub fn fill_slot(&self, state: &mut PlanningState, slot: &SlotRequest) -> Option<Assignment> {
        let chosen = self.select(state, slot);
        let Some(person) = chosen else {
            warn!(date = %slot.date, duty = slot.duty_type().label(), "no eligible candidate");
            return None;
        };
        let assignment = Assignment::new(
            person.id.clone(),
            slot.duty_type(),
            slot.date,
            Period::FullDay,
            self.site.clone(),
            AssignmentSource::Generated,
        );
        debug!(date = %slot.date, person = %person.id, duty = slot.duty_type().label(), "slot filled");
        state
            .fatigue_mut()
            .record_duty(&person.id, assignment.duty_type, assignment.date);
        state.book(assignment.clone());
        Some(assignment)
    }

    fn select(&self, state: &PlanningState, slot: &SlotRequest) -> Option<&'a Person> {
        let mut eligible = self
            .personnel
            .iter()
            .copied()
            .filter(|p| self.check(state, p, slot).is_ok());
        if !self.optimize {
            return eligible.next();
        }
        let guard_points = u64::from(self.fatigue.points.guard);
        // min_by_key garde le premier minimum : départage par identifiant croissant
        eligible.min_by_key(|p| {
            let count = u64::from(state.weighted_count(&p.id, &self.rules.equity_weights));
            let fatigue = u64::from(state.fatigue().score(&p.id));
            count * guard_points + fatigue
        })
    }

    /// Contraintes dures pour `person` sur `slot`.
    pub fn check(
        &self,
        state: &PlanningState,
        person: &Person,
        slot: &SlotRequest,
    ) -> Result<(), Ineligibility> {
        let date = slot.date;
        if !person.active {
            return Err(Ineligibility::Inactive);
        }
        if person.on_leave(date) {
            return Err(Ineligibility::OnLeave);
        }
        if !person.works_on(date) {
            return Err(Ineligibility::NotWorking);
        }
        if !self.rules.allowed_roles(slot.class).contains(&person.role) {
            return Err(Ineligibility::RoleNotAllowed);
        }
        if state.is_booked(&person.id, date, Period::FullDay) {
            return Err(Ineligibility::AlreadyBooked);
        }
        if !state.rest_ok(&person.id, slot.class, date, self.rules.min_days_between_duties) {
            return Err(Ineligibility::RestTooShort);
        }
        if state.monthly_count(&person.id, slot.class, date) >= self.rules.monthly_cap(slot.class) {
            return Err(Ineligibility::MonthlyCapReached);
        }
        if state.streak_with(&person.id, date) > self.rules.max_consecutive_duties {
            return Err(Ineligibility::StreakTooLong);
        }
        Ok(())
    }
}
