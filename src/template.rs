use crate::model::{
    Assignment, AssignmentSource, DateRange, DutyTemplate, Period, Person, PersonId, TemplateId,
};
use crate::scheduler::short_date;
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {0}: name cannot be empty")]
    EmptyName(TemplateId),
    #[error("template {0}: must contain at least one slot")]
    NoSlots(TemplateId),
    #[error("template {0}: every slot must define at least one day")]
    SlotWithoutDays(TemplateId),
    #[error("template {0}: effective_to is before effective_from")]
    InvertedRange(TemplateId),
    #[error("template {template}: overlapping slots for {person}")]
    OverlappingSlots {
        template: TemplateId,
        person: PersonId,
    },
}

impl DutyTemplate {
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName(self.id.clone()));
        }
        if self.slots.is_empty() {
            return Err(TemplateError::NoSlots(self.id.clone()));
        }
        if self.slots.iter().any(|s| s.days.is_empty()) {
            return Err(TemplateError::SlotWithoutDays(self.id.clone()));
        }
        if self.effective_to.is_some_and(|end| end < self.effective_from) {
            return Err(TemplateError::InvertedRange(self.id.clone()));
        }
        for (i, a) in self.slots.iter().enumerate() {
            for b in self.slots.iter().skip(i + 1) {
                let same_weeks = a.weeks == b.weeks
                    || a.weeks == Default::default()
                    || b.weeks == Default::default();
                let shared_day = a.days.iter().any(|d| b.days.contains(d));
                if a.person == b.person && same_weeks && shared_day && a.period.overlaps(b.period) {
                    return Err(TemplateError::OverlappingSlots {
                        template: self.id.clone(),
                        person: a.person.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Affectations proposées par les trames, après arbitrage des priorités.
#[derive(Debug, Clone, Default)]
pub struct TemplateExpansion {
    pub assignments: Vec<Assignment>,
    pub warnings: Vec<String>,
    /// Créneaux déjà occupés par une affectation existante
    pub skipped_existing: usize,
    /// Propositions écartées au profit d'une trame prioritaire
    pub overridden: usize,
}

/// Déroule les trames sur `range`, de la plus prioritaire à la moins prioritaire.
///
/// Une proposition qui tombe sur un créneau déjà pris par une trame plus
/// prioritaire n'est qu'un avertissement ; une proposition qui tombe sur une
/// affectation existante est ignorée sans bruit.
pub fn expand_templates(
    templates: &[DutyTemplate],
    personnel: &[Person],
    range: &DateRange,
    existing: &[Assignment],
) -> TemplateExpansion {
    let mut ordered: Vec<&DutyTemplate> = templates.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

    let people: HashMap<&PersonId, &Person> = personnel.iter().map(|p| (&p.id, p)).collect();

    let mut taken_existing: HashMap<(PersonId, NaiveDate), Vec<Period>> = HashMap::new();
    for a in existing {
        taken_existing
            .entry((a.person.clone(), a.date))
            .or_default()
            .push(a.period);
    }
    // (personne, jour) -> [(période, nom de la trame)]
    let mut taken: HashMap<(PersonId, NaiveDate), Vec<(Period, &str)>> = HashMap::new();

    let mut out = TemplateExpansion::default();

    for template in ordered {
        if let Err(err) = template.validate() {
            out.warnings
                .push(format!("Trame « {} » ignorée : {err}", template.name));
            continue;
        }
        if !template.active || !template.intersects(range) {
            continue;
        }

        let mut unavailable = 0usize;
        for date in range.days().filter(|d| template.in_effect(*d)) {
            for slot in template.slots.iter().filter(|s| s.matches(date)) {
                let key = (slot.person.clone(), date);

                let available = people
                    .get(&slot.person)
                    .is_some_and(|p| p.available_on(date));
                if !available {
                    unavailable += 1;
                    continue;
                }

                let clashes_existing = taken_existing
                    .get(&key)
                    .is_some_and(|periods| periods.iter().any(|p| p.overlaps(slot.period)));
                if clashes_existing {
                    debug!(template = %template.id, person = %slot.person, %date, "slot already booked");
                    out.skipped_existing += 1;
                    continue;
                }

                let winner = taken.get(&key).and_then(|booked| {
                    booked
                        .iter()
                        .find(|(period, _)| period.overlaps(slot.period))
                        .map(|(_, name)| *name)
                });
                if let Some(winner) = winner {
                    out.overridden += 1;
                    out.warnings.push(format!(
                        "Trame « {} » : {} du {} ({}) pour {} ignorée, conflit avec la trame prioritaire « {} »",
                        template.name,
                        slot.duty_type.label(),
                        short_date(date),
                        slot.period.label(),
                        slot.person,
                        winner
                    ));
                    continue;
                }

                taken
                    .entry(key)
                    .or_default()
                    .push((slot.period, template.name.as_str()));
                out.assignments.push(Assignment::new(
                    slot.person.clone(),
                    slot.duty_type,
                    date,
                    slot.period,
                    template.site.clone(),
                    AssignmentSource::Template {
                        template: template.id.clone(),
                    },
                ));
            }
        }

        if unavailable > 0 {
            out.warnings.push(format!(
                "Trame « {} » : {unavailable} créneau(x) non appliqué(s) (personnel absent, inactif ou hors site)",
                template.name
            ));
        }
    }

    out.assignments.sort_by_key(|a| a.date);
    out
}

pub fn load_template_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<DutyTemplate> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading template {}", path.display()))?;
    let template: DutyTemplate = serde_json::from_slice(&data)
        .with_context(|| format!("parsing template {}", path.display()))?;
    template.validate()?;
    Ok(template)
}

pub fn export_template_json<P: AsRef<Path>>(path: P, template: &DutyTemplate) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(template)?;
    fs::write(path, json)?;
    Ok(())
}
