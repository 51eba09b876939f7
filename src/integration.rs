//! Orchestration d'une génération : trames, gardes, astreintes, validation, équité.

use crate::config::{ConfigError, RulesConfiguration};
use crate::model::{Assignment, DateRange, DutyClass, DutyTemplate, Person, PersonId, SiteId, TemplateId};
use crate::repository::{
    AssignmentRepository, PersonnelRepository, RulesConfigProvider, TemplateRepository,
};
use crate::scheduler::{
    score_counts, AssignmentGenerator, ConflictValidator, FatigueLevel, FatigueTracker,
    PlanningState, SchedError, ValidationRequest,
};
use crate::template::expand_templates;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Options de génération
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Appliquer les trames
    pub use_templates: bool,
    /// Restreindre aux trames listées (`None` : toutes)
    pub template_ids: Option<Vec<TemplateId>>,
    pub generate_guards: bool,
    pub generate_on_calls: bool,
    /// Choix des candidats selon l'équité et la fatigue
    pub optimize_distribution: bool,
    /// Transmis tel quel ; aucune préférence individuelle n'est modélisée
    pub respect_preferences: bool,
    /// Budget de temps ; dépassé, rien n'est enregistré
    pub time_budget: Option<Duration>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            use_templates: true,
            template_ids: None,
            generate_guards: false,
            generate_on_calls: false,
            optimize_distribution: false,
            respect_preferences: true,
            time_budget: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquityScore {
    /// Gardes et astreintes pondérées par `equity_weights`
    pub global: u8,
    pub guards: u8,
    pub on_calls: u8,
}

impl Default for EquityScore {
    fn default() -> Self {
        Self {
            global: 100,
            guards: 100,
            on_calls: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub success: bool,
    pub message: String,
    pub assignments_created: usize,
    pub score: EquityScore,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Affectations enregistrées par ce passage
    pub assignments: Vec<Assignment>,
}

impl GenerationResult {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            errors: vec![message.clone()],
            message,
            assignments_created: 0,
            score: EquityScore::default(),
            warnings: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("invalid date range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Repository(anyhow::Error),
    #[error(transparent)]
    Persistence(anyhow::Error),
    #[error(transparent)]
    Schedule(#[from] SchedError),
}

/// Un verrou par site : deux générations du même site ne s'entrelacent pas.
///
/// Partagé entre services via `TemplateIntegrationService::with_locks`
/// lorsque plusieurs services écrivent dans le même dépôt.
#[derive(Debug, Default)]
pub struct SiteLocks {
    inner: Mutex<HashMap<SiteId, Arc<Mutex<()>>>>,
}

impl SiteLocks {
    pub fn for_site(&self, site: &SiteId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(site.clone()).or_default().clone()
    }
}

/// Point d'entrée de la génération de planning avec trames.
pub struct TemplateIntegrationService {
    personnel: Arc<dyn PersonnelRepository>,
    templates: Arc<dyn TemplateRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    rules: Arc<dyn RulesConfigProvider>,
    locks: Arc<SiteLocks>,
}

impl TemplateIntegrationService {
    pub fn new(
        personnel: Arc<dyn PersonnelRepository>,
        templates: Arc<dyn TemplateRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        rules: Arc<dyn RulesConfigProvider>,
    ) -> Self {
        Self {
            personnel,
            templates,
            assignments,
            rules,
            locks: Arc::default(),
        }
    }

    /// Remplace les verrous de site par un jeu partagé avec d'autres services.
    pub fn with_locks(mut self, locks: Arc<SiteLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Construit le service à partir d'un seul objet implémentant tous les dépôts.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PersonnelRepository
            + TemplateRepository
            + AssignmentRepository
            + RulesConfigProvider
            + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    /// Génère le planning du site sur `[start, end]`.
    ///
    /// Ne renvoie jamais d'erreur : tout échec devient `success: false`.
    pub fn generate(
        &self,
        site: &SiteId,
        start: NaiveDate,
        end: NaiveDate,
        options: &GenerationOptions,
    ) -> GenerationResult {
        info!(%site, %start, %end, ?options, "starting generation");
        match self.try_generate(site, start, end, options) {
            Ok(result) => {
                info!(
                    %site,
                    success = result.success,
                    created = result.assignments_created,
                    equity = result.score.global,
                    "generation finished"
                );
                result
            }
            Err(err) => {
                warn!(%site, error = %err, "generation failed");
                let message = match &err {
                    GenerationError::Config(e) => format!("Configuration invalide : {e}"),
                    other => format!("Erreur lors de la génération: {other}"),
                };
                GenerationResult::failure(message)
            }
        }
    }

    fn try_generate(
        &self,
        site: &SiteId,
        start: NaiveDate,
        end: NaiveDate,
        options: &GenerationOptions,
    ) -> Result<GenerationResult, GenerationError> {
        let started = Instant::now();
        let deadline = options.time_budget.map(|budget| started + budget);
        let range = DateRange::new(start, end).ok_or(GenerationError::InvalidRange { start, end })?;

        let lock = self.locks.for_site(site);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let rules = self.rules.rules_configuration().map_err(GenerationError::Repository)?;
        let fatigue = self
            .rules
            .fatigue_configuration()
            .map_err(GenerationError::Repository)?;
        rules.validate()?;
        fatigue.validate()?;

        let (templates, personnel) = self.load_inputs(site, &range, options)?;
        // repos, plafonds et séries se jugent aussi sur les affectations voisines de la plage
        let window = range.around(
            rules
                .min_days_between_duties
                .max(rules.max_consecutive_duties),
        );
        let existing = self
            .assignments
            .find_existing(site, &window)
            .map_err(GenerationError::Repository)?;
        debug!(
            templates = templates.len(),
            personnel = personnel.len(),
            existing = existing.len(),
            "inputs loaded"
        );

        let mut warnings = Vec::new();
        let mut fixed = existing.clone();
        if options.use_templates {
            let expansion = expand_templates(&templates, &personnel, &range, &existing);
            debug!(
                proposed = expansion.assignments.len(),
                overridden = expansion.overridden,
                skipped = expansion.skipped_existing,
                "templates expanded"
            );
            warnings.extend(expansion.warnings);
            fixed.extend(expansion.assignments);
        }
        let existing_len = existing.len();

        let mut tracker = FatigueTracker::new(&fatigue, &rules.public_holidays);
        tracker.track(personnel.iter().map(|p| &p.id));
        let state = PlanningState::new(fixed, tracker);

        let mut classes = Vec::new();
        if options.generate_guards {
            classes.push(DutyClass::Guard);
        }
        if options.generate_on_calls {
            classes.push(DutyClass::OnCall);
        }
        let generator = AssignmentGenerator::new(
            site,
            &rules,
            &fatigue,
            &personnel,
            options.optimize_distribution,
        );
        let outcome = generator.walk(state, &range, &classes, deadline)?;
        if !outcome.unfilled.is_empty() {
            debug!(unfilled = outcome.unfilled.len(), "slots left without candidate");
        }
        let state = outcome.state;

        let report = ConflictValidator::new(&rules).validate(&ValidationRequest {
            site,
            range,
            assignments: state.assignments(),
            require_guards: options.generate_guards,
            require_on_calls: options.generate_on_calls,
            context: Some(window),
        });
        warnings.extend(report.warnings.iter().cloned());
        warnings.extend(fatigue_warnings(state.fatigue()));

        let score = equity_scores(&rules, &personnel, &range, state.assignments());

        if deadline.is_some_and(|limit| Instant::now() >= limit) {
            return Err(SchedError::DeadlineExceeded(end).into());
        }

        // Les affectations issues des trames et du générateur
        let created: Vec<Assignment> = state.assignments()[existing_len..].to_vec();

        if !report.is_valid {
            let message = format!(
                "Planning généré avec {} conflit(s) : aucune affectation enregistrée",
                report.errors.len()
            );
            return Ok(GenerationResult {
                success: false,
                message,
                assignments_created: 0,
                score,
                warnings,
                errors: report.errors,
                assignments: Vec::new(),
            });
        }

        self.assignments
            .create_many(&created)
            .map_err(GenerationError::Persistence)?;

        Ok(GenerationResult {
            success: true,
            message: format!(
                "Planning généré avec succès : {} gardes/vacations créées",
                created.len()
            ),
            assignments_created: created.len(),
            score,
            warnings,
            errors: Vec::new(),
            assignments: created,
        })
    }

    /// Trames et personnel sont lus en parallèle.
    fn load_inputs(
        &self,
        site: &SiteId,
        range: &DateRange,
        options: &GenerationOptions,
    ) -> Result<(Vec<DutyTemplate>, Vec<Person>), GenerationError> {
        let (templates, personnel) = thread::scope(|scope| {
            let templates = scope.spawn(|| {
                if options.use_templates {
                    self.templates.find_active_templates(site, range)
                } else {
                    Ok(Vec::new())
                }
            });
            let personnel = self.personnel.find_active_personnel(site);
            let templates = templates
                .join()
                .unwrap_or_else(|_| Err(anyhow::anyhow!("template loader panicked")));
            (templates, personnel)
        });

        let mut templates = templates.map_err(GenerationError::Repository)?;
        templates.retain(|t| {
            t.active
                && &t.site == site
                && t.intersects(range)
                && options
                    .template_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&t.id))
        });
        templates.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

        let mut personnel = personnel.map_err(GenerationError::Repository)?;
        personnel.retain(|p| p.active);
        personnel.sort_by(|a, b| a.id.cmp(&b.id));

        Ok((templates, personnel))
    }
}

fn fatigue_warnings(tracker: &FatigueTracker) -> Vec<String> {
    let alerts = tracker.alerts();
    let critical = alerts
        .iter()
        .filter(|a| a.level == FatigueLevel::Critical)
        .count();
    let alert = alerts.len() - critical;
    let mut out = Vec::new();
    if critical > 0 {
        out.push(format!(
            "{critical} personne(s) ont atteint le seuil critique de fatigue"
        ));
    }
    if alert > 0 {
        out.push(format!("{alert} personne(s) ont atteint le seuil d'alerte de fatigue"));
    }
    out
}

/// Scores d'équité sur les gardes et astreintes du planning.
///
/// Population : personnel pouvant prendre au moins une des deux classes,
/// plus toute personne ayant une garde ou une astreinte.
fn equity_scores(
    rules: &RulesConfiguration,
    personnel: &[Person],
    range: &DateRange,
    assignments: &[Assignment],
) -> EquityScore {
    let mut counts: BTreeMap<&PersonId, [u32; 2]> = BTreeMap::new();
    for p in personnel {
        let eligible = [DutyClass::Guard, DutyClass::OnCall]
            .iter()
            .any(|c| rules.allowed_roles(*c).contains(&p.role));
        if eligible {
            counts.entry(&p.id).or_insert([0, 0]);
        }
    }
    for a in assignments.iter().filter(|a| range.contains(a.date)) {
        let idx = match a.duty_type.class() {
            Some(DutyClass::Guard) => 0,
            Some(DutyClass::OnCall) => 1,
            None => continue,
        };
        counts.entry(&a.person).or_insert([0, 0])[idx] += 1;
    }

    let w = &rules.equity_weights;
    EquityScore {
        global: score_counts(
            counts
                .values()
                .map(|[g, o]| g.saturating_mul(w.guard).saturating_add(o.saturating_mul(w.on_call))),
        ),
        guards: score_counts(counts.values().map(|[g, _]| *g)),
        on_calls: score_counts(counts.values().map(|[_, o]| *o)),
    }
}

