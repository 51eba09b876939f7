#![forbid(unsafe_code)]
mod common;

use chrono::{NaiveDate, Weekday};
use common::{day, duty, mar, site};
use gardes::template::{export_template_json, load_template_from_file};
use gardes::{
    expand_templates, AssignmentSource, DateRange, DutyTemplate, DutyType, LeavePeriod, Period,
    PersonId, TemplateError, TemplateId, TemplateSlot, WeekParity,
};
use tempfile::tempdir;

fn slot(person: &str, duty_type: DutyType, period: Period, days: &[Weekday]) -> TemplateSlot {
    TemplateSlot {
        person: PersonId::new(person),
        duty_type,
        period,
        days: days.to_vec(),
        weeks: WeekParity::All,
    }
}

fn template(id: &str, name: &str, priority: i32, slots: Vec<TemplateSlot>) -> DutyTemplate {
    DutyTemplate {
        id: TemplateId::new(id),
        name: name.to_string(),
        site: site(),
        active: true,
        effective_from: day(2025, 1, 1),
        effective_to: None,
        priority,
        slots,
    }
}

fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

#[test]
fn higher_priority_template_wins_and_loser_is_reported() {
    let low = template(
        "t-low",
        "Trame secondaire",
        1,
        vec![slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon])],
    );
    let high = template(
        "t-high",
        "Bloc prioritaire",
        10,
        vec![slot("alice", DutyType::Bloc, Period::Morning, &[Weekday::Mon])],
    );
    let people = vec![mar("alice")];
    // lundi 3 mars
    let out = expand_templates(&[low, high], &people, &range(day(2025, 3, 3), day(2025, 3, 3)), &[]);

    assert_eq!(out.assignments.len(), 1);
    let kept = &out.assignments[0];
    assert_eq!(kept.duty_type, DutyType::Bloc);
    assert_eq!(
        kept.source,
        AssignmentSource::Template {
            template: TemplateId::new("t-high")
        }
    );
    assert_eq!(out.overridden, 1);
    insta::assert_snapshot!(
        out.warnings.join("\n"),
        @"Trame « Trame secondaire » : garde du 03/03 (journée) pour alice ignorée, conflit avec la trame prioritaire « Bloc prioritaire »"
    );
}

#[test]
fn equal_priority_is_settled_by_template_id() {
    let b = template(
        "t-b",
        "B",
        5,
        vec![slot("alice", DutyType::OnCall, Period::FullDay, &[Weekday::Mon])],
    );
    let a = template(
        "t-a",
        "A",
        5,
        vec![slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon])],
    );
    let people = vec![mar("alice")];
    let out = expand_templates(&[b, a], &people, &range(day(2025, 3, 3), day(2025, 3, 3)), &[]);
    assert_eq!(out.assignments.len(), 1);
    assert_eq!(out.assignments[0].duty_type, DutyType::Guard);
}

#[test]
fn half_days_from_two_templates_coexist() {
    let morning = template(
        "t-am",
        "Matin",
        2,
        vec![slot("alice", DutyType::Consultation, Period::Morning, &[Weekday::Tue])],
    );
    let afternoon = template(
        "t-pm",
        "Après-midi",
        1,
        vec![slot("alice", DutyType::Bloc, Period::Afternoon, &[Weekday::Tue])],
    );
    let people = vec![mar("alice")];
    let out = expand_templates(
        &[morning, afternoon],
        &people,
        &range(day(2025, 3, 3), day(2025, 3, 9)),
        &[],
    );
    assert_eq!(out.assignments.len(), 2);
    assert!(out.warnings.is_empty());
}

#[test]
fn week_parity_follows_iso_weeks() {
    let mut even = slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon]);
    even.weeks = WeekParity::Even;
    let mut odd = slot("bob", DutyType::Guard, Period::FullDay, &[Weekday::Mon]);
    odd.weeks = WeekParity::Odd;
    let t = template("t-alt", "Alternance", 0, vec![even, odd]);
    let people = vec![mar("alice"), mar("bob")];

    // 3 mars : semaine 10, 10 mars : semaine 11
    let out = expand_templates(&[t], &people, &range(day(2025, 3, 3), day(2025, 3, 16)), &[]);
    let got: Vec<_> = out
        .assignments
        .iter()
        .map(|a| (a.date, a.person.as_str().to_string()))
        .collect();
    assert_eq!(
        got,
        vec![
            (day(2025, 3, 3), "alice".to_string()),
            (day(2025, 3, 10), "bob".to_string()),
        ]
    );
}

#[test]
fn existing_assignments_are_skipped_silently() {
    let t = template(
        "t-1",
        "Lundis",
        0,
        vec![slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon])],
    );
    let people = vec![mar("alice")];
    let existing = vec![duty("alice", DutyType::Consultation, day(2025, 3, 3))];
    let out = expand_templates(
        &[t],
        &people,
        &range(day(2025, 3, 3), day(2025, 3, 10)),
        &existing,
    );
    assert_eq!(out.skipped_existing, 1);
    assert!(out.warnings.is_empty());
    assert_eq!(out.assignments.len(), 1);
    assert_eq!(out.assignments[0].date, day(2025, 3, 10));
}

#[test]
fn unavailable_people_are_reported_once_per_template() {
    let t = template(
        "t-1",
        "Lundis",
        0,
        vec![
            slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon]),
            slot("ghost", DutyType::OnCall, Period::FullDay, &[Weekday::Mon]),
        ],
    );
    let mut alice = mar("alice");
    alice
        .leaves
        .push(LeavePeriod::new(day(2025, 3, 1), day(2025, 3, 5)).unwrap());
    let out = expand_templates(
        &[t],
        &[alice],
        &range(day(2025, 3, 3), day(2025, 3, 10)),
        &[],
    );
    // alice revient le 10 ; ghost inconnu deux fois
    assert_eq!(out.assignments.len(), 1);
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("3 créneau(x) non appliqué(s)"));
}

#[test]
fn effective_window_and_inactive_templates() {
    let mut bounded = template(
        "t-bounded",
        "Mars seulement",
        0,
        vec![slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon])],
    );
    bounded.effective_from = day(2025, 3, 5);
    bounded.effective_to = Some(day(2025, 3, 12));
    let mut disabled = template(
        "t-off",
        "Désactivée",
        9,
        vec![slot("bob", DutyType::Guard, Period::FullDay, &[Weekday::Mon])],
    );
    disabled.active = false;

    let people = vec![mar("alice"), mar("bob")];
    let out = expand_templates(
        &[bounded, disabled],
        &people,
        &range(day(2025, 3, 1), day(2025, 3, 31)),
        &[],
    );
    assert_eq!(out.assignments.len(), 1);
    assert_eq!(out.assignments[0].date, day(2025, 3, 10));
}

#[test]
fn invalid_templates_are_rejected() {
    let empty = template("t-empty", "Vide", 0, vec![]);
    assert_eq!(empty.validate(), Err(TemplateError::NoSlots(TemplateId::new("t-empty"))));

    let overlapping = template(
        "t-dup",
        "Doublon",
        0,
        vec![
            slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon, Weekday::Tue]),
            slot("alice", DutyType::Consultation, Period::Morning, &[Weekday::Tue]),
        ],
    );
    assert!(matches!(
        overlapping.validate(),
        Err(TemplateError::OverlappingSlots { .. })
    ));

    let mut inverted = template(
        "t-inv",
        "Inversée",
        0,
        vec![slot("alice", DutyType::Guard, Period::FullDay, &[Weekday::Mon])],
    );
    inverted.effective_to = Some(day(2024, 12, 1));
    assert_eq!(
        inverted.validate(),
        Err(TemplateError::InvertedRange(TemplateId::new("t-inv")))
    );

    // une trame invalide est écartée avec un avertissement
    let people = vec![mar("alice")];
    let out = expand_templates(&[empty], &people, &range(day(2025, 3, 3), day(2025, 3, 9)), &[]);
    assert!(out.assignments.is_empty());
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].starts_with("Trame « Vide » ignorée"));
}

#[test]
fn template_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trame.json");
    let t = template(
        "t-file",
        "Fichier",
        3,
        vec![slot("alice", DutyType::OnCall, Period::FullDay, &[Weekday::Sat, Weekday::Sun])],
    );
    export_template_json(&path, &t).unwrap();
    let loaded = load_template_from_file(&path).unwrap();
    assert_eq!(loaded, t);
}

#[test]
fn loading_an_invalid_template_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trame.json");
    std::fs::write(
        &path,
        r#"{"id":"t-x","name":"X","site":"chu-nord","effective_from":"2025-01-01","slots":[]}"#,
    )
    .unwrap();
    assert!(load_template_from_file(&path).is_err());
}
