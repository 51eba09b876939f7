//! Seuils de règles et de fatigue, chargés à chaque génération.
//!
//! Les deux structures se désérialisent avec des valeurs par défaut
//! champ par champ ; `validate` doit être appelé avant toute utilisation.

use crate::model::{DutyClass, ProfessionalRole};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("no professional role allowed for {0}")]
    NoRoles(&'static str),
    #[error("fatigue points must satisfy guard > weekend on-call > on-call (got {guard} / {on_call_weekend} / {on_call})")]
    PointsOrder {
        guard: u32,
        on_call_weekend: u32,
        on_call: u32,
    },
    #[error("alert threshold ({alert}) must be lower than critical threshold ({critical})")]
    Thresholds { alert: u32, critical: u32 },
}

/// Ratios de supervision (salles par MAR, IADE par MAR)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisionRatios {
    pub max_rooms_per_mar: u32,
    pub max_iade_per_mar: u32,
}

impl Default for SupervisionRatios {
    fn default() -> Self {
        Self {
            max_rooms_per_mar: 2,
            max_iade_per_mar: 2,
        }
    }
}

/// Poids des gardes et astreintes dans le score d'équité global
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquityWeights {
    pub guard: u32,
    pub on_call: u32,
}

impl Default for EquityWeights {
    fn default() -> Self {
        Self { guard: 1, on_call: 1 }
    }
}

impl EquityWeights {
    pub fn weight(&self, class: DutyClass) -> u32 {
        match class {
            DutyClass::Guard => self.guard,
            DutyClass::OnCall => self.on_call,
        }
    }
}

/// Contraintes dures de génération
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfiguration {
    pub min_days_between_duties: u32,
    pub max_duties_per_month: u32,
    pub max_consecutive_duties: u32,
    pub max_on_calls_per_month: u32,
    pub supervision: SupervisionRatios,
    pub guard_roles: Vec<ProfessionalRole>,
    pub on_call_roles: Vec<ProfessionalRole>,
    pub public_holidays: Vec<NaiveDate>,
    pub equity_weights: EquityWeights,
}

impl Default for RulesConfiguration {
    fn default() -> Self {
        Self {
            min_days_between_duties: 2,
            max_duties_per_month: 8,
            max_consecutive_duties: 2,
            max_on_calls_per_month: 10,
            supervision: SupervisionRatios::default(),
            guard_roles: vec![ProfessionalRole::Mar],
            on_call_roles: vec![ProfessionalRole::Mar, ProfessionalRole::Iade],
            public_holidays: Vec::new(),
            equity_weights: EquityWeights::default(),
        }
    }
}

impl RulesConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.min_days_between_duties, "min_days_between_duties")?;
        positive(self.max_duties_per_month, "max_duties_per_month")?;
        positive(self.max_consecutive_duties, "max_consecutive_duties")?;
        positive(self.max_on_calls_per_month, "max_on_calls_per_month")?;
        positive(self.supervision.max_rooms_per_mar, "supervision.max_rooms_per_mar")?;
        positive(self.supervision.max_iade_per_mar, "supervision.max_iade_per_mar")?;
        positive(self.equity_weights.guard, "equity_weights.guard")?;
        positive(self.equity_weights.on_call, "equity_weights.on_call")?;
        if self.guard_roles.is_empty() {
            return Err(ConfigError::NoRoles("guards"));
        }
        if self.on_call_roles.is_empty() {
            return Err(ConfigError::NoRoles("on-calls"));
        }
        Ok(())
    }

    pub fn monthly_cap(&self, class: DutyClass) -> u32 {
        match class {
            DutyClass::Guard => self.max_duties_per_month,
            DutyClass::OnCall => self.max_on_calls_per_month,
        }
    }

    pub fn allowed_roles(&self, class: DutyClass) -> &[ProfessionalRole] {
        match class {
            DutyClass::Guard => &self.guard_roles,
            DutyClass::OnCall => &self.on_call_roles,
        }
    }
}

/// Points de fatigue par type d'affectation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatiguePoints {
    pub guard: u32,
    /// Astreinte de week-end ou de jour férié
    pub on_call_weekend: u32,
    pub on_call: u32,
    pub consultation: u32,
    pub bloc: u32,
}

impl Default for FatiguePoints {
    fn default() -> Self {
        Self {
            guard: 40,
            on_call_weekend: 15,
            on_call: 10,
            consultation: 0,
            bloc: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfiguration {
    pub points: FatiguePoints,
    pub alert_threshold: u32,
    pub critical_threshold: u32,
    pub recovery_per_rest_day: u32,
}

impl Default for FatigueConfiguration {
    fn default() -> Self {
        Self {
            points: FatiguePoints::default(),
            alert_threshold: 80,
            critical_threshold: 120,
            recovery_per_rest_day: 10,
        }
    }
}

impl FatigueConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.points;
        positive(p.on_call, "points.on_call")?;
        if !(p.guard > p.on_call_weekend && p.on_call_weekend > p.on_call) {
            return Err(ConfigError::PointsOrder {
                guard: p.guard,
                on_call_weekend: p.on_call_weekend,
                on_call: p.on_call,
            });
        }
        positive(self.alert_threshold, "alert_threshold")?;
        if self.alert_threshold >= self.critical_threshold {
            return Err(ConfigError::Thresholds {
                alert: self.alert_threshold,
                critical: self.critical_threshold,
            });
        }
        positive(self.recovery_per_rest_day, "recovery_per_rest_day")?;
        Ok(())
    }
}

fn positive(value: u32, name: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive(name));
    }
    Ok(())
}
