#![allow(dead_code)]
use chrono::NaiveDate;
use gardes::{
    Assignment, AssignmentSource, Dataset, DatasetStore, DutyType, Period, Person, PersonId,
    ProfessionalRole, SiteId,
};

pub fn site() -> SiteId {
    SiteId::new("chu-nord")
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn mar(id: &str) -> Person {
    Person::new(id, id.to_uppercase(), ProfessionalRole::Mar).with_site(&site())
}

pub fn iade(id: &str) -> Person {
    Person::new(id, id.to_uppercase(), ProfessionalRole::Iade).with_site(&site())
}

/// `n` MAR nommés `mar-000`, `mar-001`, ...
pub fn staff(n: usize) -> Vec<Person> {
    (0..n).map(|i| mar(&format!("mar-{i:03}"))).collect()
}

pub fn duty(person: &str, duty_type: DutyType, date: NaiveDate) -> Assignment {
    Assignment::new(
        PersonId::new(person),
        duty_type,
        date,
        Period::FullDay,
        site(),
        AssignmentSource::Manual,
    )
}

pub fn half_day(person: &str, duty_type: DutyType, date: NaiveDate, period: Period) -> Assignment {
    Assignment::new(
        PersonId::new(person),
        duty_type,
        date,
        period,
        site(),
        AssignmentSource::Manual,
    )
}

pub fn store_with(personnel: Vec<Person>) -> DatasetStore {
    DatasetStore::in_memory(Dataset {
        personnel,
        ..Dataset::default()
    })
}
