use super::types::{Conflict, ConflictKind, DoubleBooking, RestViolation};
use super::util;
use crate::config::RulesConfiguration;
use crate::model::{Assignment, DateRange, DutyClass, DutyType, PersonId, SiteId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Planning complet à contrôler
#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    pub site: &'a SiteId,
    pub range: DateRange,
    pub assignments: &'a [Assignment],
    /// Chaque jour doit avoir une garde (erreur sinon)
    pub require_guards: bool,
    /// Chaque jour devrait avoir une astreinte (avertissement sinon)
    pub require_on_calls: bool,
    /// Fenêtre élargie pour le repos, les plafonds et les séries (`None` : `range`)
    pub context: Option<DateRange>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub conflicts: Vec<Conflict>,
}

impl ValidationReport {
    pub fn count(&self, kind: &ConflictKind) -> usize {
        self.conflicts.iter().filter(|c| &c.kind == kind).count()
    }
}

/// Contrôle a posteriori : couverture, doubles affectations, repos.
#[derive(Debug, Clone, Copy)]
pub struct ConflictValidator<'a> {
    rules: &'a RulesConfiguration,
}

impl<'a> ConflictValidator<'a> {
    pub fn new(rules: &'a RulesConfiguration) -> Self {
        Self { rules }
    }

    pub fn validate(&self, request: &ValidationRequest<'_>) -> ValidationReport {
        let scoped: Vec<Assignment> = request
            .assignments
            .iter()
            .filter(|a| &a.site == request.site && request.range.contains(a.date))
            .cloned()
            .collect();
        let window = request.context.unwrap_or(request.range);
        let audited: Vec<Assignment> = request
            .assignments
            .iter()
            .filter(|a| &a.site == request.site && window.contains(a.date))
            .cloned()
            .collect();
        let range = request.range;

        let mut report = ValidationReport::default();

        if request.require_guards {
            let gaps = coverage_gaps(&scoped, &request.range, DutyType::Guard);
            if !gaps.is_empty() {
                report
                    .errors
                    .push(format!("{} jour(s) sans garde : {}", gaps.len(), join_dates(&gaps)));
                push_gaps(&mut report, &gaps, DutyClass::Guard);
            }
        }

        let bookings = find_double_bookings(&scoped);
        if !bookings.is_empty() {
            report.errors.push(format!(
                "{} conflit(s) détecté(s) : personnel affecté plusieurs fois sur le même créneau",
                bookings.len()
            ));
            report.conflicts.extend(bookings.into_iter().map(|b| Conflict {
                kind: ConflictKind::DoubleAssignment,
                date: b.date,
                person: Some(b.person),
                assignments: b.assignments,
            }));
        }

        let mut rest = find_rest_violations(&audited, self.rules.min_days_between_duties);
        rest.retain(|v| range.contains(v.previous) || range.contains(v.next));
        if !rest.is_empty() {
            let people: BTreeSet<&PersonId> = rest.iter().map(|v| &v.person).collect();
            report.warnings.push(format!(
                "{} personne(s) avec repos insuffisant entre gardes/astreintes",
                people.len()
            ));
            report.conflicts.extend(rest.iter().map(|v| Conflict {
                kind: ConflictKind::RestViolation,
                date: v.next,
                person: Some(v.person.clone()),
                assignments: Vec::new(),
            }));
        }

        if request.require_on_calls {
            let gaps = coverage_gaps(&scoped, &request.range, DutyType::OnCall);
            if !gaps.is_empty() {
                report.warnings.push(format!(
                    "{} jour(s) sans astreinte : {}",
                    gaps.len(),
                    join_dates(&gaps)
                ));
                push_gaps(&mut report, &gaps, DutyClass::OnCall);
            }
        }

        let caps = self.monthly_overflows(&audited, &range);
        if !caps.is_empty() {
            report.warnings.push(format!(
                "{} dépassement(s) du plafond mensuel de gardes/astreintes",
                caps.len()
            ));
            report.conflicts.extend(caps);
        }

        let streaks = self.long_streaks(&audited, &range);
        if !streaks.is_empty() {
            report.warnings.push(format!(
                "{} série(s) de gardes/astreintes consécutives au-delà de {} jours",
                streaks.len(),
                self.rules.max_consecutive_duties
            ));
            report.conflicts.extend(streaks);
        }

        report.is_valid = report.errors.is_empty();
        report
    }

    /// Mois (par personne et classe) au-delà du plafond, limités aux mois touchés par `range`.
    fn monthly_overflows(&self, assignments: &[Assignment], range: &DateRange) -> Vec<Conflict> {
        let months: BTreeSet<(i32, u32)> = range.days().map(util::month_key).collect();
        let mut counts: BTreeMap<(&PersonId, DutyClass, (i32, u32)), (u32, NaiveDate)> =
            BTreeMap::new();
        for a in assignments {
            let Some(class) = a.duty_type.class() else {
                continue;
            };
            let entry = counts
                .entry((&a.person, class, util::month_key(a.date)))
                .or_insert((0, a.date));
            entry.0 += 1;
            entry.1 = entry.1.min(a.date);
        }
        counts
            .into_iter()
            .filter(|((_, class, month), (n, _))| {
                months.contains(month) && *n > self.rules.monthly_cap(*class)
            })
            .map(|((person, _, _), (_, first))| Conflict {
                kind: ConflictKind::MonthlyCapExceeded,
                date: first,
                person: Some(person.clone()),
                assignments: Vec::new(),
            })
            .collect()
    }

    /// Séries trop longues qui recoupent `range`.
    fn long_streaks(&self, assignments: &[Assignment], range: &DateRange) -> Vec<Conflict> {
        let mut days: BTreeMap<&PersonId, BTreeSet<NaiveDate>> = BTreeMap::new();
        for a in assignments.iter().filter(|a| a.duty_type.class().is_some()) {
            days.entry(&a.person).or_default().insert(a.date);
        }
        let max = self.rules.max_consecutive_duties as usize;
        let mut out = Vec::new();
        for (person, dates) in days {
            // (début, fin, longueur)
            let mut runs: Vec<(NaiveDate, NaiveDate, usize)> = Vec::new();
            for &date in &dates {
                let extends = runs
                    .last()
                    .is_some_and(|&(_, last, _)| util::days_between(last, date) == 1);
                if !extends {
                    runs.push((date, date, 1));
                } else if let Some(run) = runs.last_mut() {
                    run.1 = date;
                    run.2 += 1;
                }
            }
            out.extend(
                runs.into_iter()
                    .filter(|&(first, last, len)| {
                        len > max && first <= range.end && last >= range.start
                    })
                    .map(|(first, _, _)| Conflict {
                        kind: ConflictKind::StreakExceeded,
                        date: first,
                        person: Some(person.clone()),
                        assignments: Vec::new(),
                    }),
            );
        }
        out
    }
}

fn coverage_gaps(assignments: &[Assignment], range: &DateRange, duty_type: DutyType) -> Vec<NaiveDate> {
    let covered: BTreeSet<NaiveDate> = assignments
        .iter()
        .filter(|a| a.duty_type == duty_type)
        .map(|a| a.date)
        .collect();
    range.days().filter(|d| !covered.contains(d)).collect()
}

fn push_gaps(report: &mut ValidationReport, gaps: &[NaiveDate], class: DutyClass) {
    report.conflicts.extend(gaps.iter().map(|&date| Conflict {
        kind: ConflictKind::CoverageGap(class),
        date,
        person: None,
        assignments: Vec::new(),
    }));
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| util::short_date(*d))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Groupes (personne, jour) contenant au moins deux affectations qui se chevauchent.
pub fn find_double_bookings(assignments: &[Assignment]) -> Vec<DoubleBooking> {
    let mut by_day: BTreeMap<(&PersonId, NaiveDate), Vec<&Assignment>> = BTreeMap::new();
    for a in assignments {
        by_day.entry((&a.person, a.date)).or_default().push(a);
    }

    let mut out = Vec::new();
    for ((person, date), day) in by_day {
        let mut involved = Vec::new();
        for (idx, a) in day.iter().enumerate() {
            for b in day.iter().skip(idx + 1) {
                if a.clashes_with(b) {
                    for id in [&a.id, &b.id] {
                        if !involved.contains(id) {
                            involved.push(id.clone());
                        }
                    }
                }
            }
        }
        if !involved.is_empty() {
            out.push(DoubleBooking {
                person: person.clone(),
                date,
                assignments: involved,
            });
        }
    }
    out
}

/// Paires de gardes (ou d'astreintes) successives séparées de moins de `min_days` jours.
pub fn find_rest_violations(assignments: &[Assignment], min_days: u32) -> Vec<RestViolation> {
    let mut dates: BTreeMap<(&PersonId, DutyClass), Vec<NaiveDate>> = BTreeMap::new();
    for a in assignments {
        if let Some(class) = a.duty_type.class() {
            dates.entry((&a.person, class)).or_default().push(a.date);
        }
    }

    let mut out = Vec::new();
    for ((person, class), mut list) in dates {
        list.sort();
        for pair in list.windows(2) {
            let gap = util::days_between(pair[0], pair[1]);
            if gap < i64::from(min_days) {
                out.push(RestViolation {
                    person: person.clone(),
                    class,
                    previous: pair[0],
                    next: pair[1],
                    gap_days: gap,
                });
            }
        }
    }
    out
}
