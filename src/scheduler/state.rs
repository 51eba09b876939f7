use super::fatigue::FatigueTracker;
use super::util;
use crate::config::EquityWeights;
use crate::model::{Assignment, DutyClass, DutyType, Period, PersonId};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// État porté d'un jour au suivant pendant la génération.
///
/// Les affectations déjà connues (existantes, trames) sont réservées d'emblée :
/// le repos et les séries tiennent compte des engagements futurs.
/// La fatigue, elle, n'avance qu'au rythme de `open_day` / `close_day`.
#[derive(Debug, Clone)]
pub struct PlanningState {
    assignments: Vec<Assignment>,
    fixed: usize,
    by_date: BTreeMap<NaiveDate, Vec<usize>>,
    occupancy: HashMap<(PersonId, NaiveDate), Vec<Period>>,
    class_dates: HashMap<(PersonId, DutyClass), BTreeSet<NaiveDate>>,
    duty_days: HashMap<PersonId, BTreeSet<NaiveDate>>,
    monthly: HashMap<(PersonId, DutyClass, (i32, u32)), u32>,
    horizon: HashMap<(PersonId, DutyClass), u32>,
    fatigue: FatigueTracker,
}

impl PlanningState {
    pub fn new<I>(fixed: I, fatigue: FatigueTracker) -> Self
    where
        I: IntoIterator<Item = Assignment>,
    {
        let mut state = Self {
            assignments: Vec::new(),
            fixed: 0,
            by_date: BTreeMap::new(),
            occupancy: HashMap::new(),
            class_dates: HashMap::new(),
            duty_days: HashMap::new(),
            monthly: HashMap::new(),
            horizon: HashMap::new(),
            fatigue,
        };
        for a in fixed {
            state.book(a);
        }
        state.fixed = state.assignments.len();
        state
    }

    pub fn book(&mut self, a: Assignment) {
        let idx = self.assignments.len();
        self.by_date.entry(a.date).or_default().push(idx);
        self.occupancy
            .entry((a.person.clone(), a.date))
            .or_default()
            .push(a.period);
        if let Some(class) = a.duty_type.class() {
            self.class_dates
                .entry((a.person.clone(), class))
                .or_default()
                .insert(a.date);
            self.duty_days.entry(a.person.clone()).or_default().insert(a.date);
            *self
                .monthly
                .entry((a.person.clone(), class, util::month_key(a.date)))
                .or_insert(0) += 1;
            *self.horizon.entry((a.person.clone(), class)).or_insert(0) += 1;
        }
        self.assignments.push(a);
    }

    /// Début de journée : les affectations déjà connues du jour alimentent la fatigue.
    pub fn open_day(&mut self, date: NaiveDate) {
        let Some(indices) = self.by_date.get(&date) else {
            return;
        };
        for &idx in indices {
            let a = &self.assignments[idx];
            self.fatigue.record_duty(&a.person, a.duty_type, a.date);
        }
    }

    pub fn close_day(&mut self) {
        self.fatigue.end_day();
    }

    pub fn on(&self, date: NaiveDate) -> impl Iterator<Item = &Assignment> {
        self.by_date
            .get(&date)
            .into_iter()
            .flatten()
            .map(|&idx| &self.assignments[idx])
    }

    pub fn has_duty(&self, date: NaiveDate, duty_type: DutyType) -> bool {
        self.on(date).any(|a| a.duty_type == duty_type)
    }

    pub fn is_booked(&self, person: &PersonId, date: NaiveDate, period: Period) -> bool {
        self.occupancy
            .get(&(person.clone(), date))
            .is_some_and(|periods| periods.iter().any(|p| p.overlaps(period)))
    }

    /// Vrai si aucune affectation de la même classe n'est à moins de `min_days` jours.
    pub fn rest_ok(&self, person: &PersonId, class: DutyClass, date: NaiveDate, min_days: u32) -> bool {
        let Some(dates) = self.class_dates.get(&(person.clone(), class)) else {
            return true;
        };
        let window = Duration::days(i64::from(min_days) - 1);
        dates.range(date - window..=date + window).next().is_none()
    }

    pub fn monthly_count(&self, person: &PersonId, class: DutyClass, date: NaiveDate) -> u32 {
        self.monthly
            .get(&(person.clone(), class, util::month_key(date)))
            .copied()
            .unwrap_or(0)
    }

    /// Longueur de la série de jours consécutifs de garde/astreinte si `date` s'y ajoute.
    pub fn streak_with(&self, person: &PersonId, date: NaiveDate) -> u32 {
        let Some(days) = self.duty_days.get(person) else {
            return 1;
        };
        let before = run_length(days, date, NaiveDate::pred_opt);
        let after = run_length(days, date, NaiveDate::succ_opt);
        (before + 1 + after) as u32
    }

    pub fn horizon_count(&self, person: &PersonId, class: DutyClass) -> u32 {
        self.horizon.get(&(person.clone(), class)).copied().unwrap_or(0)
    }

    pub fn weighted_count(&self, person: &PersonId, weights: &EquityWeights) -> u32 {
        [DutyClass::Guard, DutyClass::OnCall]
            .into_iter()
            .map(|class| self.horizon_count(person, class).saturating_mul(weights.weight(class)))
            .fold(0, u32::saturating_add)
    }

    pub fn fatigue(&self) -> &FatigueTracker {
        &self.fatigue
    }

    pub fn fatigue_mut(&mut self) -> &mut FatigueTracker {
        &mut self.fatigue
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Affectations ajoutées depuis la construction de l'état.
    pub fn generated(&self) -> &[Assignment] {
        &self.assignments[self.fixed..]
    }
}

fn run_length(
    days: &BTreeSet<NaiveDate>,
    from: NaiveDate,
    step: fn(&NaiveDate) -> Option<NaiveDate>,
) -> usize {
    std::iter::successors(step(&from), step)
        .take_while(|d| days.contains(d))
        .count()
}
