use super::util;
use crate::config::FatigueConfiguration;
use crate::model::{DutyType, PersonId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FatigueLevel {
    Normal,
    Alert,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatigueAlert {
    pub person: PersonId,
    pub level: FatigueLevel,
    pub peak: u32,
}

/// Score de fatigue cumulé, parcouru jour après jour.
///
/// Un jour avec au moins une affectation ajoute les points du type ;
/// un jour sans affectation retire `recovery_per_rest_day`, sans passer sous zéro.
#[derive(Debug, Clone)]
pub struct FatigueTracker {
    config: FatigueConfiguration,
    holidays: BTreeSet<NaiveDate>,
    scores: BTreeMap<PersonId, u32>,
    peaks: BTreeMap<PersonId, u32>,
    worked_today: HashSet<PersonId>,
}

impl FatigueTracker {
    pub fn new(config: &FatigueConfiguration, holidays: &[NaiveDate]) -> Self {
        Self {
            config: config.clone(),
            holidays: holidays.iter().copied().collect(),
            scores: BTreeMap::new(),
            peaks: BTreeMap::new(),
            worked_today: HashSet::new(),
        }
    }

    pub fn track<'a, I>(&mut self, people: I)
    where
        I: IntoIterator<Item = &'a PersonId>,
    {
        for id in people {
            self.scores.entry(id.clone()).or_insert(0);
        }
    }

    pub fn points_for(&self, duty_type: DutyType, date: NaiveDate) -> u32 {
        let p = &self.config.points;
        match duty_type {
            DutyType::Guard => p.guard,
            DutyType::OnCall if util::is_weekend(date) || self.holidays.contains(&date) => {
                p.on_call_weekend
            }
            DutyType::OnCall => p.on_call,
            DutyType::Consultation => p.consultation,
            DutyType::Bloc => p.bloc,
        }
    }

    pub fn record_duty(&mut self, person: &PersonId, duty_type: DutyType, date: NaiveDate) {
        let points = self.points_for(duty_type, date);
        let score = self.scores.entry(person.clone()).or_insert(0);
        *score += points;
        let current = *score;
        let peak = self.peaks.entry(person.clone()).or_insert(0);
        *peak = (*peak).max(current);
        self.worked_today.insert(person.clone());
    }

    /// Clôt la journée : récupération pour tous ceux qui n'ont rien fait.
    pub fn end_day(&mut self) {
        let recovery = self.config.recovery_per_rest_day;
        for (person, score) in self.scores.iter_mut() {
            if !self.worked_today.contains(person) {
                *score = score.saturating_sub(recovery);
            }
        }
        self.worked_today.clear();
    }

    pub fn score(&self, person: &PersonId) -> u32 {
        self.scores.get(person).copied().unwrap_or(0)
    }

    pub fn level(&self, person: &PersonId) -> FatigueLevel {
        self.level_of(self.score(person))
    }

    fn level_of(&self, score: u32) -> FatigueLevel {
        if score >= self.config.critical_threshold {
            FatigueLevel::Critical
        } else if score >= self.config.alert_threshold {
            FatigueLevel::Alert
        } else {
            FatigueLevel::Normal
        }
    }

    /// Personnes dont le pic a atteint le seuil d'alerte, triées par identifiant.
    pub fn alerts(&self) -> Vec<FatigueAlert> {
        self.peaks
            .iter()
            .filter_map(|(person, &peak)| {
                let level = self.level_of(peak);
                (level != FatigueLevel::Normal).then(|| FatigueAlert {
                    person: person.clone(),
                    level,
                    peak,
                })
            })
            .collect()
    }
}
