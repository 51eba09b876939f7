use crate::model::{
    Assignment, AssignmentSource, DutyClass, LeavePeriod, Person, PersonId, ProfessionalRole,
    SiteId, WorkPattern,
};
use anyhow::{bail, Context};
use chrono::{NaiveDate, Weekday};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::BTreeMap;
use std::path::Path;

/// Import du personnel depuis CSV :
/// header `id,display_name,role[,sites][,active][,leaves][,work_days]`
///
/// - `sites` : liste séparée par `;`
/// - `leaves` : `2025-03-01/2025-03-05;2025-04-02` (bornes incluses)
/// - `work_days` : `Mon;Tue;Thu` (vide = temps plein)
pub fn import_personnel_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Person>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let display = rec.get(1).context("missing display_name")?.trim();
        let role_raw = rec.get(2).context("missing role")?.trim();
        if id.is_empty() || display.is_empty() {
            bail!("invalid personnel row (empty)");
        }
        let role = ProfessionalRole::parse(role_raw)
            .with_context(|| format!("invalid role {role_raw:?} for {id}"))?;
        let mut person = Person::new(id, display, role);

        if let Some(sites) = non_empty(rec.get(3)) {
            person.sites = split_list(sites).map(SiteId::new).collect();
        }
        if let Some(flag) = non_empty(rec.get(4)) {
            person.active =
                parse_bool(flag).with_context(|| format!("invalid active value for {id}"))?;
        }
        if let Some(ranges) = non_empty(rec.get(5)) {
            person.leaves =
                parse_leaves(ranges).with_context(|| format!("invalid leaves value for {id}"))?;
        }
        if let Some(days) = non_empty(rec.get(6)) {
            let days = split_list(days)
                .map(|d| {
                    d.parse::<Weekday>()
                        .map_err(|_| anyhow::anyhow!("invalid weekday {d:?}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("invalid work_days value for {id}"))?;
            person.work_pattern = Some(WorkPattern::SpecificDays { days });
        }
        out.push(person);
    }
    Ok(out)
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

fn parse_leaves(raw: &str) -> anyhow::Result<Vec<LeavePeriod>> {
    split_list(raw).map(parse_leave_chunk).collect()
}

fn parse_leave_chunk(chunk: &str) -> anyhow::Result<LeavePeriod> {
    let (start, end) = match chunk.split_once('/').or_else(|| chunk.split_once("..")) {
        Some((start_raw, end_raw)) => (parse_date(start_raw.trim())?, parse_date(end_raw.trim())?),
        None => {
            let day = parse_date(chunk)?;
            (day, day)
        }
    };
    LeavePeriod::new(start, end).map_err(anyhow::Error::msg)
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

/// Export CSV des affectations : header `id,date,person,display_name,duty_type,period,source`
pub fn export_assignments_csv<P: AsRef<Path>>(
    path: P,
    assignments: &[Assignment],
    personnel: &[Person],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["id", "date", "person", "display_name", "duty_type", "period", "source"])?;
    let mut sorted: Vec<&Assignment> = assignments.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.person.cmp(&b.person)));
    for a in sorted {
        let name = personnel
            .iter()
            .find(|p| p.id == a.person)
            .map(|p| p.display_name.as_str())
            .unwrap_or("");
        let date = a.date.to_string();
        let source = match &a.source {
            AssignmentSource::Manual => "manual".to_string(),
            AssignmentSource::Template { template } => format!("template:{}", template.as_str()),
            AssignmentSource::Generated => "generated".to_string(),
        };
        w.write_record([
            a.id.as_str(),
            date.as_str(),
            a.person.as_str(),
            name,
            a.duty_type.label(),
            a.period.label(),
            source.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des compteurs par personne : header `person,guards,on_calls`
pub fn export_counts_csv<P: AsRef<Path>>(path: P, assignments: &[Assignment]) -> anyhow::Result<()> {
    let mut counts: BTreeMap<&PersonId, [u32; 2]> = BTreeMap::new();
    for a in assignments {
        let slot = match a.duty_type.class() {
            Some(DutyClass::Guard) => 0,
            Some(DutyClass::OnCall) => 1,
            None => continue,
        };
        counts.entry(&a.person).or_insert([0, 0])[slot] += 1;
    }

    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["person", "guards", "on_calls"])?;
    let mut guards = itoa::Buffer::new();
    let mut on_calls = itoa::Buffer::new();
    for (person, [g, o]) in counts {
        w.write_record([person.as_str(), guards.format(g), on_calls.format(o)])?;
    }
    w.flush()?;
    Ok(())
}
