use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifiant fort pour Person (ordonné : sert de départage déterministe)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(String);

impl PersonId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant de site
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(String);

impl SiteId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant de trame
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant fort pour Assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(String);

impl AssignmentId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Rôle professionnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfessionalRole {
    /// Médecin anesthésiste-réanimateur
    Mar,
    /// Infirmier anesthésiste
    Iade,
}

impl ProfessionalRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MAR" => Some(Self::Mar),
            "IADE" => Some(Self::Iade),
            _ => None,
        }
    }
}

/// Parité de semaine ISO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekParity {
    #[default]
    All,
    Even,
    Odd,
}

impl WeekParity {
    pub fn matches(self, date: NaiveDate) -> bool {
        let even = date.iso_week().week() % 2 == 0;
        match self {
            Self::All => true,
            Self::Even => even,
            Self::Odd => !even,
        }
    }
}

/// Rythme de travail (temps plein, jours fixes, semaines alternées)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkPattern {
    FullTime,
    SpecificDays { days: Vec<Weekday> },
    AlternatingWeeks { even: Vec<Weekday>, odd: Vec<Weekday> },
}

impl WorkPattern {
    pub fn works_on(&self, date: NaiveDate) -> bool {
        let day = date.weekday();
        match self {
            Self::FullTime => true,
            Self::SpecificDays { days } => days.contains(&day),
            Self::AlternatingWeeks { even, odd } => {
                if WeekParity::Even.matches(date) {
                    even.contains(&day)
                } else {
                    odd.contains(&day)
                }
            }
        }
    }
}

/// Période d'absence validée (bornes incluses)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LeavePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if end < start {
            return Err("leave end must not be before start".to_string());
        }
        Ok(Self { start, end })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Membre du personnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub display_name: String,
    pub role: ProfessionalRole,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub sites: Vec<SiteId>,
    /// `None` : temps plein
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_pattern: Option<WorkPattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaves: Vec<LeavePeriod>,
}

impl Person {
    pub fn new<I: AsRef<str>, D: Into<String>>(id: I, display_name: D, role: ProfessionalRole) -> Self {
        Self {
            id: PersonId::new(id),
            display_name: display_name.into(),
            role,
            active: true,
            sites: Vec::new(),
            work_pattern: None,
            skills: Vec::new(),
            leaves: Vec::new(),
        }
    }

    pub fn with_site(mut self, site: &SiteId) -> Self {
        self.sites.push(site.clone());
        self
    }

    pub fn on_leave(&self, date: NaiveDate) -> bool {
        self.leaves.iter().any(|l| l.covers(date))
    }

    pub fn works_on(&self, date: NaiveDate) -> bool {
        self.work_pattern
            .as_ref()
            .map_or(true, |pattern| pattern.works_on(date))
    }

    /// Présent, actif et dans son rythme de travail à cette date.
    pub fn available_on(&self, date: NaiveDate) -> bool {
        self.active && !self.on_leave(date) && self.works_on(date)
    }
}

fn default_true() -> bool {
    true
}

/// Type d'affectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyType {
    Guard,
    OnCall,
    Consultation,
    Bloc,
}

impl DutyType {
    /// Classe soumise aux règles de repos / plafonds, si applicable.
    pub fn class(self) -> Option<DutyClass> {
        match self {
            Self::Guard => Some(DutyClass::Guard),
            Self::OnCall => Some(DutyClass::OnCall),
            Self::Consultation | Self::Bloc => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Guard => "garde",
            Self::OnCall => "astreinte",
            Self::Consultation => "consultation",
            Self::Bloc => "bloc",
        }
    }
}

/// Classe de garde pour les règles de repos, plafonds et séries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DutyClass {
    Guard,
    OnCall,
}

impl DutyClass {
    pub fn duty_type(self) -> DutyType {
        match self {
            Self::Guard => DutyType::Guard,
            Self::OnCall => DutyType::OnCall,
        }
    }
}

/// Demi-journée ou journée complète
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    Morning,
    Afternoon,
    FullDay,
}

impl Period {
    pub fn overlaps(self, other: Period) -> bool {
        self == Period::FullDay || other == Period::FullDay || self == other
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "matin",
            Self::Afternoon => "après-midi",
            Self::FullDay => "journée",
        }
    }
}

/// Origine d'une affectation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentSource {
    #[default]
    Manual,
    Template { template: TemplateId },
    Generated,
}

/// Affectation datée d'une personne
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub person: PersonId,
    pub duty_type: DutyType,
    pub date: NaiveDate,
    pub period: Period,
    pub site: SiteId,
    #[serde(default)]
    pub source: AssignmentSource,
}

impl Assignment {
    pub fn new(
        person: PersonId,
        duty_type: DutyType,
        date: NaiveDate,
        period: Period,
        site: SiteId,
        source: AssignmentSource,
    ) -> Self {
        Self {
            id: AssignmentId::random(),
            person,
            duty_type,
            date,
            period,
            site,
            source,
        }
    }

    /// Même personne, même jour, périodes qui se chevauchent.
    pub fn clashes_with(&self, other: &Assignment) -> bool {
        self.person == other.person && self.date == other.date && self.period.overlaps(other.period)
    }
}

/// Créneau récurrent d'une trame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlot {
    pub person: PersonId,
    pub duty_type: DutyType,
    pub period: Period,
    pub days: Vec<Weekday>,
    #[serde(default)]
    pub weeks: WeekParity,
}

impl TemplateSlot {
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.days.contains(&date.weekday()) && self.weeks.matches(date)
    }
}

/// Trame (modèle récurrent) d'un site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyTemplate {
    pub id: TemplateId,
    pub name: String,
    pub site: SiteId,
    #[serde(default = "default_true")]
    pub active: bool,
    pub effective_from: NaiveDate,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub slots: Vec<TemplateSlot>,
}

impl DutyTemplate {
    pub fn in_effect(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.map_or(true, |end| date <= end)
    }

    pub fn intersects(&self, range: &DateRange) -> bool {
        self.effective_from <= range.end && self.effective_to.map_or(true, |end| end >= range.start)
    }
}

/// Intervalle de dates, bornes incluses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Mois calendaires entiers couvrant l'intervalle, élargis d'au moins `margin` jours de chaque côté.
    pub fn around(&self, margin: u32) -> DateRange {
        let margin = Duration::days(i64::from(margin));
        let month_start = self.start.with_day(1).unwrap_or(self.start);
        let month_end = self
            .end
            .with_day(1)
            .and_then(|d| d.checked_add_months(Months::new(1)))
            .and_then(|d| d.pred_opt())
            .unwrap_or(self.end);
        let start = self
            .start
            .checked_sub_signed(margin)
            .unwrap_or(NaiveDate::MIN)
            .min(month_start);
        let end = self
            .end
            .checked_add_signed(margin)
            .unwrap_or(NaiveDate::MAX)
            .max(month_end);
        DateRange { start, end }
    }
}
