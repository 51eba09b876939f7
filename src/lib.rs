#![forbid(unsafe_code)]
//! Gardes : génération de plannings de gardes, astreintes et trames.
//!
//! - Trames récurrentes déroulées par ordre de priorité.
//! - Gardes / astreintes affectées jour par jour sous contraintes dures
//!   (repos, plafonds mensuels, séries consécutives).
//! - Fatigue cumulée, score d'équité, validation finale du planning.
//! - Dépôts injectés ; un jeu JSON fourni pour la CLI et les tests.

pub mod config;
pub mod integration;
pub mod io;
pub mod model;
pub mod repository;
pub mod scheduler;
pub mod storage;
pub mod template;

pub use config::{ConfigError, EquityWeights, FatigueConfiguration, FatiguePoints, RulesConfiguration};
pub use integration::{
    EquityScore, GenerationError, GenerationOptions, GenerationResult, SiteLocks,
    TemplateIntegrationService,
};
pub use model::{
    Assignment, AssignmentId, AssignmentSource, DateRange, DutyClass, DutyTemplate, DutyType,
    LeavePeriod, Period, Person, PersonId, ProfessionalRole, SiteId, TemplateId, TemplateSlot,
    WeekParity, WorkPattern,
};
pub use repository::{
    AssignmentRepository, PersonnelRepository, RulesConfigProvider, TemplateRepository,
};
pub use scheduler::{
    AssignmentGenerator, Conflict, ConflictKind, ConflictValidator, EquityScorer, FatigueLevel,
    FatigueTracker, PlanningState, ValidationReport, ValidationRequest,
};
pub use storage::{Dataset, DatasetStore};
pub use template::{expand_templates, TemplateError, TemplateExpansion};
