#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gardes::{
    io,
    repository::AssignmentRepository,
    scheduler::{ConflictKind, ConflictValidator, ValidationRequest},
    storage::DatasetStore,
    template::load_template_from_file,
    DateRange, GenerationOptions, SiteId, TemplateId, TemplateIntegrationService,
};
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Génération de plannings de gardes et d'astreintes
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de données (personnel, trames, affectations, règles)
    #[arg(long, global = true, default_value = "planning.json")]
    data: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer du personnel depuis un CSV
    ImportPeople {
        #[arg(long)]
        csv: String,
    },

    /// Importer une trame depuis un fichier JSON
    ImportTemplate {
        #[arg(long)]
        file: String,
    },

    /// Générer le planning d'un site
    Generate {
        #[arg(long)]
        site: String,
        /// AAAA-MM-JJ
        #[arg(long)]
        start: NaiveDate,
        /// AAAA-MM-JJ (inclus)
        #[arg(long)]
        end: NaiveDate,
        /// Ne pas appliquer les trames
        #[arg(long)]
        no_templates: bool,
        /// Restreindre aux trames listées
        #[arg(long = "template")]
        templates: Vec<String>,
        #[arg(long)]
        gardes: bool,
        #[arg(long)]
        astreintes: bool,
        /// Répartition selon l'équité et la fatigue
        #[arg(long)]
        optimize: bool,
        /// Budget de temps en secondes
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Vérifier le planning enregistré
    Check {
        #[arg(long)]
        site: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Exiger une garde par jour
        #[arg(long)]
        gardes: bool,
        /// Exiger une astreinte par jour
        #[arg(long)]
        astreintes: bool,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Lister et optionnellement exporter
    List {
        #[arg(long)]
        site: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        out_csv: Option<String>,
        /// Compteurs gardes/astreintes par personne
        #[arg(long)]
        counts_csv: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let store = Arc::new(DatasetStore::open(&cli.data)?);

    let code = match cli.cmd {
        Commands::ImportPeople { csv } => {
            let people = io::import_personnel_csv(csv)?;
            let count = people.len();
            store.update(|data| {
                for person in people {
                    match data.personnel.iter_mut().find(|p| p.id == person.id) {
                        Some(existing) => *existing = person,
                        None => data.personnel.push(person),
                    }
                }
                Ok(())
            })?;
            println!("{count} personne(s) importée(s)");
            0
        }
        Commands::ImportTemplate { file } => {
            let template = load_template_from_file(file)?;
            let id = template.id.clone();
            store.update(|data| {
                data.templates.retain(|t| t.id != template.id);
                data.templates.push(template);
                Ok(())
            })?;
            println!("Trame {} importée", id.as_str());
            0
        }
        Commands::Generate {
            site,
            start,
            end,
            no_templates,
            templates,
            gardes,
            astreintes,
            optimize,
            timeout,
        } => {
            let options = GenerationOptions {
                use_templates: !no_templates,
                template_ids: (!templates.is_empty())
                    .then(|| templates.iter().map(TemplateId::new).collect()),
                generate_guards: gardes,
                generate_on_calls: astreintes,
                optimize_distribution: optimize,
                time_budget: timeout.map(Duration::from_secs),
                ..GenerationOptions::default()
            };
            let service = TemplateIntegrationService::from_store(store.clone());
            let result = service.generate(&SiteId::new(site), start, end, &options);

            println!("{}", result.message);
            println!(
                "Équité : {} (gardes {}, astreintes {})",
                result.score.global, result.score.guards, result.score.on_calls
            );
            for w in &result.warnings {
                println!("avertissement : {w}");
            }
            for e in &result.errors {
                eprintln!("erreur : {e}");
            }
            // Code 2 = planning refusé
            if result.success {
                0
            } else {
                2
            }
        }
        Commands::Check {
            site,
            start,
            end,
            gardes,
            astreintes,
            report,
        } => {
            let Some(range) = DateRange::new(start, end) else {
                bail!("end date must not be before start date");
            };
            let site = SiteId::new(site);
            let rules = store.snapshot().rules;
            let window = range.around(
                rules
                    .min_days_between_duties
                    .max(rules.max_consecutive_duties),
            );
            let assignments = store.find_existing(&site, &window)?;
            let result = ConflictValidator::new(&rules).validate(&ValidationRequest {
                site: &site,
                range,
                assignments: &assignments,
                require_guards: gardes,
                require_on_calls: astreintes,
                context: Some(window),
            });

            for w in &result.warnings {
                println!("avertissement : {w}");
            }
            if let Some(path) = report {
                let mut w = csv::Writer::from_path(path)?;
                w.write_record(["date", "person", "kind"])?;
                for c in &result.conflicts {
                    let date = c.date.to_string();
                    w.write_record([
                        date.as_str(),
                        c.person.as_ref().map(|p| p.as_str()).unwrap_or(""),
                        match c.kind {
                            ConflictKind::CoverageGap(_) => "coverage",
                            ConflictKind::DoubleAssignment => "double",
                            ConflictKind::RestViolation => "rest",
                            ConflictKind::MonthlyCapExceeded => "monthly_cap",
                            ConflictKind::StreakExceeded => "streak",
                        },
                    ])?;
                }
                w.flush()?;
            }
            if result.is_valid {
                println!("OK: no blocking conflicts");
                0
            } else {
                for e in &result.errors {
                    eprintln!("erreur : {e}");
                }
                2
            }
        }
        Commands::List {
            site,
            start,
            end,
            out_csv,
            counts_csv,
        } => {
            let Some(range) = DateRange::new(start, end) else {
                bail!("end date must not be before start date");
            };
            let site = SiteId::new(site);
            let mut assignments = store.find_existing(&site, &range)?;
            assignments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.person.cmp(&b.person)));
            let personnel = store.snapshot().personnel;

            if let Some(path) = out_csv {
                io::export_assignments_csv(path, &assignments, &personnel)?;
            }
            if let Some(path) = counts_csv {
                io::export_counts_csv(path, &assignments)?;
            }
            for a in &assignments {
                println!(
                    "{} | {} | {} | {}",
                    a.date,
                    a.duty_type.label(),
                    a.period.label(),
                    a.person
                );
            }
            0
        }
    };

    std::process::exit(code);
}
