use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::args::{
    CliArgs, Command, MedicationsCommand, PatientsCommand, RecordsCommand, TableArgs,
    TreatmentsCommand, UsersCommand,
};
use crate::cli::validation;
use crate::client::{ApiClient, ClientError, ClientOptions, DEFAULT_BASE_URL};
use crate::config::{self, ConfigFile};
use crate::forms::{
    self, FormError, MedicationDraft, PatientDraft, RecordDraft, TreatmentDraft, UserDraft,
};
use crate::models::{
    MedicalRecord, MedicationUpdate, PatientUpdate, Role, Treatment, TreatmentUpdate, User,
    UserUpdate,
};
use crate::output::{self, format_kv_line, OutputFormat, TableRow};
use crate::routes::{self, AccessError, Area, Screen};
use crate::screen::{TableScreen, ViewScope};
use crate::table::{parse_filter_pair, Filterable, TableError};

const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_RECORD_PAGE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Setup(#[from] ClientError),

    /// A backend call failed. Details stay in the debug log.
    #[error("Error {action}, try again.")]
    Backend {
        action: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("failed to write output '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn backend(action: &'static str) -> impl FnOnce(ClientError) -> AppError {
    move |source| {
        tracing::debug!(action, error = %source, "backend request failed");
        AppError::Backend { action, source }
    }
}

fn warn(message: &str) {
    eprintln!("{} {}", "[WRN]".yellow().bold(), message);
}

#[derive(Clone, Debug)]
struct RunConfig {
    command: Command,
    role: Role,
    client: ClientOptions,
    page_size: usize,
    record_page_size: usize,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
    config_path: Option<PathBuf>,
}

fn parse_positive(name: &str, value: usize) -> Result<usize, String> {
    if value == 0 {
        return Err(format!("invalid {name}, expected positive integer"));
    }
    Ok(value)
}

fn build_run_config(
    args: CliArgs,
    cfg: ConfigFile,
    config_path: Option<PathBuf>,
) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let role = match args.role.or(cfg.role) {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::Administrator,
    };

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout_seconds = args.timeout.or(cfg.timeout);
    if timeout_seconds == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = args.proxy.or(cfg.proxy);
    let header = args.header.or(cfg.header);

    let page_size = parse_positive("page_size", cfg.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;
    let record_page_size = parse_positive(
        "record_page_size",
        cfg.record_page_size.unwrap_or(DEFAULT_RECORD_PAGE_SIZE),
    )?;

    // Explicit flag, then the output file's extension, then the config file.
    let output = args.output;
    let output_format = match args.output_format.as_deref() {
        Some(raw) => OutputFormat::parse(raw),
        None => output.as_deref().and_then(output::infer_format_from_path),
    };
    let output_format = match output_format {
        Some(format) => format,
        None => match cfg.output_format.as_deref() {
            Some(raw) => OutputFormat::parse(raw)
                .ok_or_else(|| format!("invalid output_format '{raw}', expected text or json"))?,
            None => OutputFormat::Text,
        },
    };

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    Ok(RunConfig {
        command: args.command,
        role,
        client: ClientOptions {
            base_url,
            timeout_seconds,
            proxy,
            header,
        },
        page_size,
        record_page_size,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
        config_path,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("clinadmin={level}")));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Awaits one backend call behind a spinner.
async fn fetch<T, F>(message: &str, fut: F) -> F::Output
where
    F: Future<Output = Result<T, ClientError>>,
{
    let pb = spinner(message);
    let out = fut.await;
    pb.finish_and_clear();
    out
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

fn parse_opt_date(flag: &str, raw: Option<&str>) -> Result<Option<chrono::NaiveDate>, AppError> {
    raw.map(|r| validation::parse_date(flag, r))
        .transpose()
        .map_err(AppError::Input)
}

fn parse_opt_role(raw: Option<&str>) -> Result<Option<Role>, AppError> {
    raw.map(str::parse::<Role>)
        .transpose()
        .map_err(AppError::Input)
}

/// Strips passwords from users embedded in a treatment.
fn redact_treatment(mut treatment: Treatment) -> Treatment {
    treatment.physician = treatment.physician.map(|p| p.snapshot());
    treatment
}

fn redact_record(mut record: MedicalRecord) -> MedicalRecord {
    record.treatments = record.treatments.into_iter().map(redact_treatment).collect();
    record
}

struct Session<'a> {
    run: &'a RunConfig,
    client: ApiClient,
    scope: &'a ViewScope,
}

impl Session<'_> {
    fn format(&self) -> OutputFormat {
        self.run.output_format
    }

    fn render_one<T: TableRow + Serialize>(&self, record: &T) -> String {
        match self.format() {
            OutputFormat::Text => output::render_record_text(record),
            OutputFormat::Json => output::render_record_json(record),
        }
    }

    fn ack(&self, action: &str, subject: &str, id: u64) -> String {
        output::render_ack(self.format(), action, subject, id)
    }

    async fn list_table<T, F>(
        &self,
        table: &TableArgs,
        default_page_size: usize,
        message: &str,
        action: &'static str,
        load: F,
    ) -> Result<String, AppError>
    where
        T: Filterable + TableRow + Serialize,
        F: Future<Output = Result<Vec<T>, ClientError>>,
    {
        let mut screen = TableScreen::<T>::new(table.page_size.unwrap_or(default_page_size))?;
        for raw in &table.filter {
            let (field, value) = parse_filter_pair(raw)?;
            screen.set_filter(&field, value)?;
        }

        let pb = spinner(message);
        let refreshed = screen.refresh(self.scope, load).await;
        pb.finish_and_clear();
        refreshed.ok_or(AppError::Cancelled)?.map_err(backend(action))?;

        if let Some(requested) = table.page {
            screen.go_to(requested);
            if screen.page() != requested {
                warn(&format!(
                    "page {requested} is out of range, showing page {}",
                    screen.page()
                ));
            }
        }

        let view = screen.view()?;
        Ok(match self.format() {
            OutputFormat::Text => output::render_page_text(&view, screen.filters()),
            OutputFormat::Json => output::render_page_json(&view, screen.filters()),
        })
    }

    async fn dashboard(&self) -> Result<String, AppError> {
        let screen = routes::authorize(self.run.role, Area::Dashboard, false)?;
        if !screen.shows_statistics() {
            let screens = Screen::for_role(self.run.role);
            return Ok(output::render_screens(&screens, self.format()));
        }
        let pb = spinner("loading statistics");
        let stats = self.client.statistics().await;
        pb.finish_and_clear();
        Ok(match self.format() {
            OutputFormat::Text => output::render_statistics_text(&stats),
            OutputFormat::Json => output::render_record_json(&stats),
        })
    }

    async fn open(&self, path: &str, table: &TableArgs) -> Result<String, AppError> {
        let screen = routes::open(self.run.role, path)?;
        tracing::info!(%screen, "opening screen");
        match screen.area() {
            Area::Dashboard => self.dashboard().await,
            Area::Users => self.users(&UsersCommand::List(table.clone())).await,
            Area::Patients => self.patients(&PatientsCommand::List(table.clone())).await,
            Area::Medications => {
                self.medications(&MedicationsCommand::List(table.clone()))
                    .await
            }
            Area::MedicalRecords | Area::Treatments => {
                self.records(&RecordsCommand::List(table.clone())).await
            }
        }
    }

    async fn users(&self, cmd: &UsersCommand) -> Result<String, AppError> {
        let mutates = matches!(
            cmd,
            UsersCommand::Create(_) | UsersCommand::Update { .. } | UsersCommand::Delete { .. }
        );
        routes::authorize(self.run.role, Area::Users, mutates)?;
        let client = &self.client;

        match cmd {
            UsersCommand::List(table) => {
                let load = async {
                    client
                        .list_users()
                        .await
                        .map(|users| users.iter().map(User::snapshot).collect::<Vec<_>>())
                };
                self.list_table(table, self.run.page_size, "loading users", "loading users", load)
                    .await
            }
            UsersCommand::Physicians => {
                let load = async {
                    client
                        .list_physicians()
                        .await
                        .map(|users| users.iter().map(User::snapshot).collect::<Vec<_>>())
                };
                self.list_table(
                    &TableArgs::default(),
                    self.run.page_size,
                    "loading physicians",
                    "loading physicians",
                    load,
                )
                .await
            }
            UsersCommand::Show { id } => {
                let user = fetch("loading user", client.user_for_edit(*id))
                    .await
                    .map_err(backend("loading user"))?;
                Ok(self.render_one(&user.snapshot()))
            }
            UsersCommand::Create(fields) => {
                let user = UserDraft {
                    username: fields.username.clone(),
                    password: fields.password.clone(),
                    role: parse_opt_role(fields.user_role.as_deref())?,
                }
                .validate()?;
                let created = fetch("creating user", client.create_user(&user))
                    .await
                    .map_err(backend("creating user"))?;
                Ok(self.render_one(&created.snapshot()))
            }
            UsersCommand::Update { id, fields } => {
                let update = forms::validate_user_update(UserUpdate {
                    username: fields.username.clone(),
                    password: fields.password.clone(),
                    role_id: parse_opt_role(fields.user_role.as_deref())?.map(Role::id),
                })?;
                fetch("updating user", client.update_user(*id, &update))
                    .await
                    .map_err(backend("updating user"))?;
                Ok(self.ack("updated", "user", *id))
            }
            UsersCommand::Delete { id } => {
                fetch("deleting user", client.delete_user(*id))
                    .await
                    .map_err(backend("deleting user"))?;
                Ok(self.ack("deleted", "user", *id))
            }
        }
    }

    async fn patients(&self, cmd: &PatientsCommand) -> Result<String, AppError> {
        let mutates = matches!(
            cmd,
            PatientsCommand::Create(_)
                | PatientsCommand::Update { .. }
                | PatientsCommand::Delete { .. }
        );
        routes::authorize(self.run.role, Area::Patients, mutates)?;
        let client = &self.client;

        match cmd {
            PatientsCommand::List(table) => {
                self.list_table(
                    table,
                    self.run.page_size,
                    "loading patients",
                    "loading patients",
                    client.list_patients(),
                )
                .await
            }
            PatientsCommand::Show { id } => {
                let patient = fetch("loading patient", client.patient(*id))
                    .await
                    .map_err(backend("loading patient"))?;
                Ok(self.render_one(&patient))
            }
            PatientsCommand::Create(fields) => {
                let patient = PatientDraft {
                    given_name: fields.given_name.clone(),
                    family_name: fields.family_name.clone(),
                    birth_date: parse_opt_date("birth-date", fields.birth_date.as_deref())?,
                    phone: fields.phone.clone(),
                    email: fields.email.clone(),
                }
                .validate()?;
                let created = fetch("creating patient", client.create_patient(&patient))
                    .await
                    .map_err(backend("creating patient"))?;
                Ok(self.render_one(&created))
            }
            PatientsCommand::Update { id, fields } => {
                let update = PatientUpdate {
                    given_name: fields.given_name.clone(),
                    family_name: fields.family_name.clone(),
                    birth_date: parse_opt_date("birth-date", fields.birth_date.as_deref())?,
                    phone: fields.phone.clone(),
                    email: fields.email.clone(),
                };
                if update.is_empty() {
                    return Err(FormError::EmptyUpdate.into());
                }
                fetch("updating patient", client.update_patient(*id, &update))
                    .await
                    .map_err(backend("updating patient"))?;
                Ok(self.ack("updated", "patient", *id))
            }
            PatientsCommand::Delete { id } => {
                fetch("deleting patient", client.delete_patient(*id))
                    .await
                    .map_err(backend("deleting patient"))?;
                Ok(self.ack("deleted", "patient", *id))
            }
        }
    }

    async fn medications(&self, cmd: &MedicationsCommand) -> Result<String, AppError> {
        let mutates = matches!(
            cmd,
            MedicationsCommand::Create(_)
                | MedicationsCommand::Update { .. }
                | MedicationsCommand::Delete { .. }
        );
        routes::authorize(self.run.role, Area::Medications, mutates)?;
        let client = &self.client;

        match cmd {
            MedicationsCommand::List(table) => {
                self.list_table(
                    table,
                    self.run.page_size,
                    "loading medications",
                    "loading medications",
                    client.list_medications(),
                )
                .await
            }
            MedicationsCommand::Show { id } => {
                let medication = fetch("loading medication", client.medication(*id))
                    .await
                    .map_err(backend("loading medication"))?;
                Ok(self.render_one(&medication))
            }
            MedicationsCommand::Create(fields) => {
                let medication = MedicationDraft {
                    name: fields.name.clone(),
                    description: fields.description.clone(),
                    contraindications: fields.contraindications.clone(),
                    recommended_dosage: fields.dosage.clone(),
                }
                .validate()?;
                let created = fetch("creating medication", client.create_medication(&medication))
                    .await
                    .map_err(backend("creating medication"))?;
                Ok(self.render_one(&created))
            }
            MedicationsCommand::Update { id, fields } => {
                let update = forms::validate_medication_update(MedicationUpdate {
                    name: fields.name.clone(),
                    description: fields.description.clone(),
                    contraindications: fields.contraindications.clone(),
                    recommended_dosage: fields.dosage.clone(),
                })?;
                fetch("updating medication", client.update_medication(*id, &update))
                    .await
                    .map_err(backend("updating medication"))?;
                Ok(self.ack("updated", "medication", *id))
            }
            MedicationsCommand::Delete { id } => {
                fetch("deleting medication", client.delete_medication(*id))
                    .await
                    .map_err(backend("deleting medication"))?;
                Ok(self.ack("deleted", "medication", *id))
            }
        }
    }

    async fn records(&self, cmd: &RecordsCommand) -> Result<String, AppError> {
        let mutates = matches!(cmd, RecordsCommand::Create { .. });
        routes::authorize(self.run.role, Area::MedicalRecords, mutates)?;
        let client = &self.client;

        match cmd {
            RecordsCommand::List(table) => {
                let load = async {
                    client
                        .list_records()
                        .await
                        .map(|records| records.into_iter().map(redact_record).collect::<Vec<_>>())
                };
                self.list_table(
                    table,
                    self.run.record_page_size,
                    "loading medical records",
                    "loading medical records",
                    load,
                )
                .await
            }
            RecordsCommand::Show { id } => {
                let record = fetch("loading medical record", client.record(*id))
                    .await
                    .map_err(backend("loading medical record"))?;
                let record = redact_record(record);
                Ok(match self.format() {
                    OutputFormat::Text => output::render_medical_record_text(&record),
                    OutputFormat::Json => output::render_record_json(&record),
                })
            }
            RecordsCommand::Create { patient, notes } => {
                let patients = fetch("loading patients", client.list_patients())
                    .await
                    .map_err(backend("loading patients"))?;
                let record = RecordDraft {
                    patient_id: *patient,
                    notes: notes.clone(),
                }
                .into_record(&patients, today())?;
                let created = fetch("creating medical record", client.create_record(&record))
                    .await
                    .map_err(backend("creating medical record"))?;
                Ok(match self.format() {
                    OutputFormat::Text => output::render_medical_record_text(&created),
                    OutputFormat::Json => output::render_record_json(&created),
                })
            }
        }
    }

    async fn treatments(&self, cmd: &TreatmentsCommand) -> Result<String, AppError> {
        let mutates = !matches!(cmd, TreatmentsCommand::Show { .. });
        routes::authorize(self.run.role, Area::Treatments, mutates)?;
        let client = &self.client;

        match cmd {
            TreatmentsCommand::Show { id } => {
                let treatment = fetch("loading treatment", client.treatment(*id))
                    .await
                    .map_err(backend("loading treatment"))?;
                Ok(self.render_one(&redact_treatment(treatment)))
            }
            TreatmentsCommand::Create {
                record,
                start,
                end,
                instructions,
                physician,
                medications,
            } => {
                let draft = TreatmentDraft {
                    record_id: *record,
                    start_date: parse_opt_date("start", start.as_deref())?,
                    end_date: parse_opt_date("end", end.as_deref())?,
                    instructions: instructions.clone(),
                    physician_id: *physician,
                    medication_ids: medications.clone(),
                };
                let (physicians, catalogue) = fetch("loading physicians and medications", async {
                    futures::try_join!(client.list_physicians(), client.list_medications())
                })
                .await
                .map_err(backend("loading physicians and medications"))?;
                let treatment = draft.into_treatment(&physicians, &catalogue, today())?;
                let created = fetch("creating treatment", client.create_treatment(&treatment))
                    .await
                    .map_err(backend("creating treatment"))?;
                Ok(self.render_one(&redact_treatment(created)))
            }
            TreatmentsCommand::Update {
                id,
                start,
                end,
                instructions,
                medications,
            } => {
                let update = TreatmentUpdate {
                    start_date: parse_opt_date("start", start.as_deref())?,
                    end_date: parse_opt_date("end", end.as_deref())?,
                    instructions: instructions.clone(),
                };
                if update.is_empty() && medications.is_empty() {
                    return Err(FormError::EmptyUpdate.into());
                }
                if !update.is_empty() {
                    fetch("updating treatment", client.update_treatment(*id, &update))
                        .await
                        .map_err(backend("updating treatment"))?;
                }
                if !medications.is_empty() {
                    fetch("adding medications", client.add_medications(*id, medications))
                        .await
                        .map_err(backend("adding medications"))?;
                }
                Ok(self.ack("updated", "treatment", *id))
            }
            TreatmentsCommand::AddMedications { id, medications } => {
                fetch("adding medications", client.add_medications(*id, medications))
                    .await
                    .map_err(backend("adding medications"))?;
                Ok(self.ack("updated", "treatment", *id))
            }
            TreatmentsCommand::RemoveMedication { id, medication } => {
                fetch(
                    "removing medication",
                    client.remove_medication(*id, *medication),
                )
                .await
                .map_err(backend("removing medication"))?;
                Ok(self.ack("updated", "treatment", *id))
            }
        }
    }

    async fn dispatch(&self) -> Result<String, AppError> {
        match &self.run.command {
            Command::Screens { all } => {
                let screens = if *all {
                    Screen::ALL.to_vec()
                } else {
                    Screen::for_role(self.run.role)
                };
                Ok(output::render_screens(&screens, self.format()))
            }
            Command::Open { path, table } => self.open(path, table).await,
            Command::Dashboard => self.dashboard().await,
            Command::Users(cmd) => self.users(cmd).await,
            Command::Patients(cmd) => self.patients(cmd).await,
            Command::Medications(cmd) => self.medications(cmd).await,
            Command::Records(cmd) => self.records(cmd).await,
            Command::Treatments(cmd) => self.treatments(cmd).await,
            Command::InitConfig => Err(AppError::Input(
                "init-config does not talk to the backend".to_string(),
            )),
        }
    }
}

fn init_config(path: Option<PathBuf>) -> Result<(), AppError> {
    let path = path
        .or_else(config::default_config_path)
        .ok_or_else(|| AppError::Input("could not determine home directory".to_string()))?;
    let written = config::ensure_default_config_file(&path).map_err(AppError::Input)?;
    let label = if written { "Created" } else { "Exists" };
    println!("{}", format_kv_line(label, &path.display().to_string()));
    Ok(())
}

async fn emit(run: &RunConfig, rendered: String) -> Result<(), AppError> {
    match run.output.as_deref() {
        Some(path) => {
            tokio::fs::write(path, rendered.as_bytes())
                .await
                .map_err(|e| AppError::Write {
                    path: path.to_string(),
                    source: e,
                })?;
            eprintln!("{}", format_kv_line("Output", path).bold());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), AppError> {
    if run.no_color {
        colored::control::set_override(false);
    }
    if matches!(run.command, Command::InitConfig) {
        return init_config(run.config_path.clone());
    }

    tracing::info!(role = %run.role, base_url = %run.client.base_url, "starting");
    let client = ApiClient::new(run.client.clone())?;
    let scope = ViewScope::new();

    let canceller = scope.canceller();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let session = Session {
        run: &run,
        client,
        scope: &scope,
    };
    let outcome = scope.run(session.dispatch()).await;
    interrupt.abort();

    let rendered = outcome.ok_or(AppError::Cancelled)??;
    emit(&run, rendered).await
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.as_deref().map(config::expand_tilde);
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg, user_config_path)?;
    init_tracing(run.verbose);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run)).map_err(|e| e.to_string())
}
