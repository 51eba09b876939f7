use crate::config::{FatigueConfiguration, RulesConfiguration};
use crate::model::{Assignment, DateRange, DutyTemplate, Person, PersonId, SiteId};
use crate::scheduler::{self, DoubleBooking, RestViolation};
use std::collections::BTreeMap;

/// Accès au personnel d'un site.
pub trait PersonnelRepository: Send + Sync {
    /// Personnel actif rattaché au site, congés validés inclus.
    fn find_active_personnel(&self, site: &SiteId) -> anyhow::Result<Vec<Person>>;
}

/// Accès aux trames.
pub trait TemplateRepository: Send + Sync {
    /// Trames actives du site dont la période d'effet croise `range`.
    fn find_active_templates(
        &self,
        site: &SiteId,
        range: &DateRange,
    ) -> anyhow::Result<Vec<DutyTemplate>>;
}

/// Accès aux affectations persistées.
pub trait AssignmentRepository: Send + Sync {
    fn find_existing(&self, site: &SiteId, range: &DateRange) -> anyhow::Result<Vec<Assignment>>;

    /// Enregistre le lot entier ou rien.
    fn create_many(&self, assignments: &[Assignment]) -> anyhow::Result<()>;

    fn count_by_person(
        &self,
        site: &SiteId,
        range: &DateRange,
    ) -> anyhow::Result<BTreeMap<PersonId, u32>> {
        let mut counts = BTreeMap::new();
        for a in self.find_existing(site, range)? {
            *counts.entry(a.person).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn find_overlapping(
        &self,
        site: &SiteId,
        range: &DateRange,
    ) -> anyhow::Result<Vec<DoubleBooking>> {
        let existing = self.find_existing(site, range)?;
        Ok(scheduler::find_double_bookings(&existing))
    }

    fn find_rest_violations(
        &self,
        site: &SiteId,
        range: &DateRange,
        min_days_between_duties: u32,
    ) -> anyhow::Result<Vec<RestViolation>> {
        let existing = self.find_existing(site, range)?;
        Ok(scheduler::find_rest_violations(
            &existing,
            min_days_between_duties,
        ))
    }
}

/// Fournit les seuils de règles et de fatigue.
pub trait RulesConfigProvider: Send + Sync {
    fn rules_configuration(&self) -> anyhow::Result<RulesConfiguration>;
    fn fatigue_configuration(&self) -> anyhow::Result<FatigueConfiguration>;
}
