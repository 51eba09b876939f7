use crate::config::{FatigueConfiguration, RulesConfiguration};
use crate::model::{Assignment, DateRange, DutyTemplate, Person, SiteId};
use crate::repository::{
    AssignmentRepository, PersonnelRepository, RulesConfigProvider, TemplateRepository,
};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

/// Contenu complet d'un fichier de données (personnel, trames, affectations, règles).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub personnel: Vec<Person>,
    #[serde(default)]
    pub templates: Vec<DutyTemplate>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub rules: RulesConfiguration,
    #[serde(default)]
    pub fatigue: FatigueConfiguration,
}

/// Implémente tous les dépôts au-dessus d'un `Dataset`,
/// éventuellement adossé à un fichier JSON sauvegardé de manière atomique.
#[derive(Debug)]
pub struct DatasetStore {
    path: Option<PathBuf>,
    data: Mutex<Dataset>,
}

impl DatasetStore {
    pub fn in_memory(dataset: Dataset) -> Self {
        Self {
            path: None,
            data: Mutex::new(dataset),
        }
    }

    /// Ouvre un fichier existant ; un fichier absent donne un jeu vide.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dataset = if path.exists() {
            load_dataset(&path)?
        } else {
            Dataset::default()
        };
        Ok(Self {
            path: Some(path),
            data: Mutex::new(dataset),
        })
    }

    pub fn snapshot(&self) -> Dataset {
        self.lock().clone()
    }

    /// Applique `f` puis sauvegarde ; rien n'est modifié si la sauvegarde échoue.
    pub fn update<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Dataset) -> anyhow::Result<()>,
    {
        let mut guard = self.lock();
        let mut next = guard.clone();
        f(&mut next)?;
        self.save(&next)?;
        *guard = next;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Dataset> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, dataset: &Dataset) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(dataset)?;
        let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))
            .with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let dataset: Dataset = serde_json::from_slice(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(dataset)
}

impl PersonnelRepository for DatasetStore {
    fn find_active_personnel(&self, site: &SiteId) -> anyhow::Result<Vec<Person>> {
        Ok(self
            .lock()
            .personnel
            .iter()
            .filter(|p| p.active && p.sites.contains(site))
            .cloned()
            .collect())
    }
}

impl TemplateRepository for DatasetStore {
    fn find_active_templates(
        &self,
        site: &SiteId,
        range: &DateRange,
    ) -> anyhow::Result<Vec<DutyTemplate>> {
        let mut templates: Vec<DutyTemplate> = self
            .lock()
            .templates
            .iter()
            .filter(|t| t.active && &t.site == site && t.intersects(range))
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        Ok(templates)
    }
}

impl AssignmentRepository for DatasetStore {
    fn find_existing(&self, site: &SiteId, range: &DateRange) -> anyhow::Result<Vec<Assignment>> {
        Ok(self
            .lock()
            .assignments
            .iter()
            .filter(|a| &a.site == site && range.contains(a.date))
            .cloned()
            .collect())
    }

    fn create_many(&self, assignments: &[Assignment]) -> anyhow::Result<()> {
        self.update(|data| {
            let mut ids: HashSet<&str> = data.assignments.iter().map(|a| a.id.as_str()).collect();
            for (idx, a) in assignments.iter().enumerate() {
                if !ids.insert(a.id.as_str()) {
                    bail!("duplicate assignment id {}", a.id.as_str());
                }
                let clash = data
                    .assignments
                    .iter()
                    .chain(assignments[..idx].iter())
                    .any(|b| a.clashes_with(b));
                if clash {
                    bail!(
                        "assignment for {} on {} ({}) is already booked",
                        a.person,
                        a.date,
                        a.period.label()
                    );
                }
            }
            data.assignments.extend(assignments.iter().cloned());
            Ok(())
        })
        .context("persisting assignments")
    }
}

impl RulesConfigProvider for DatasetStore {
    fn rules_configuration(&self) -> anyhow::Result<RulesConfiguration> {
        Ok(self.lock().rules.clone())
    }

    fn fatigue_configuration(&self) -> anyhow::Result<FatigueConfiguration> {
        Ok(self.lock().fatigue.clone())
    }
}
