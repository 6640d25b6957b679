use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "clinadmin",
    version,
    about = "role-based administrative client for the clinical backend",
    long_about = "clinadmin browses and edits users, patients, medications, medical records and treatments through the clinical backend's REST API, scoped to the screens the active role can open.\n\nExamples:\n  clinadmin -r admin patients list\n  clinadmin -r admin patients list --filter name=ana --page 2\n  clinadmin -r physician records show 12\n  clinadmin -r admin dashboard\n  clinadmin open /medico/historias-clinicas -r physician\n\nTip: Use --config to persist the backend URL and role and keep CLI invocations short."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv). RUST_LOG takes precedence."
    )]
    pub verbose: u8,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.clinadmin/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'r',
        long = "rl",
        visible_alias = "role",
        value_name = "ROLE",
        global = true,
        help_heading = "Session",
        help = "Active role: admin, physician or nurse (or 1, 2, 3)."
    )]
    pub role: Option<String>,

    #[arg(
        short = 'b',
        long = "bu",
        visible_alias = "base-url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Backend base URL (default http://localhost:8080)."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Send requests through this proxy."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Request timeout in seconds (default: none)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        global = true,
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        global = true,
        help_heading = "Output",
        help = "Write the rendering to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format (text, json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the screens the active role can open.
    Screens {
        #[arg(long, help = "List the screens of every role.")]
        all: bool,
    },
    /// Open a screen by its path, e.g. /admin/pacientes.
    Open {
        #[arg(value_name = "PATH")]
        path: String,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Show the dashboard of the active role.
    #[command(visible_alias = "stats")]
    Dashboard,
    /// Manage user accounts.
    #[command(subcommand)]
    Users(UsersCommand),
    /// Manage patients.
    #[command(subcommand)]
    Patients(PatientsCommand),
    /// Manage the medication catalogue.
    #[command(subcommand)]
    Medications(MedicationsCommand),
    /// Browse and create medical records.
    #[command(subcommand, visible_alias = "historias")]
    Records(RecordsCommand),
    /// Manage treatments attached to medical records.
    #[command(subcommand)]
    Treatments(TreatmentsCommand),
    /// Write a commented default config file.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TableArgs {
    #[arg(
        short = 'f',
        long = "filter",
        value_name = "FIELD=VALUE",
        action = ArgAction::Append,
        help = "Filter on a field (repeatable, all filters must match)."
    )]
    pub filter: Vec<String>,

    #[arg(
        short = 'P',
        long = "page",
        value_name = "N",
        help = "Page to show (clamped to the available pages)."
    )]
    pub page: Option<usize>,

    #[arg(long = "page-size", value_name = "N", help = "Rows per page.")]
    pub page_size: Option<usize>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersCommand {
    /// List users. Filters: id, name, role (1, 2, 3).
    List(TableArgs),
    /// List accounts with the physician role.
    Physicians,
    /// Show a user as loaded for editing.
    Show { id: u64 },
    Create(UserFields),
    Update {
        id: u64,
        #[command(flatten)]
        fields: UserUpdateFields,
    },
    Delete { id: u64 },
}

#[derive(Args, Debug, Clone)]
pub struct UserFields {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
    #[arg(long = "user-role", value_name = "ROLE", help = "Role of the new account (default admin).")]
    pub user_role: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct UserUpdateFields {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long, help = "New password; leave out to keep the current one.")]
    pub password: Option<String>,
    #[arg(long = "user-role", value_name = "ROLE")]
    pub user_role: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PatientsCommand {
    /// List patients. Filters: id, name, email.
    List(TableArgs),
    Show { id: u64 },
    Create(PatientFields),
    Update {
        id: u64,
        #[command(flatten)]
        fields: PatientUpdateFields,
    },
    Delete { id: u64 },
}

#[derive(Args, Debug, Clone)]
pub struct PatientFields {
    #[arg(long = "given-name", visible_alias = "nombre")]
    pub given_name: String,
    #[arg(long = "family-name", visible_alias = "apellido")]
    pub family_name: String,
    #[arg(long = "birth-date", value_name = "YYYY-MM-DD")]
    pub birth_date: Option<String>,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub email: String,
}

#[derive(Args, Debug, Clone)]
pub struct PatientUpdateFields {
    #[arg(long = "given-name", visible_alias = "nombre")]
    pub given_name: Option<String>,
    #[arg(long = "family-name", visible_alias = "apellido")]
    pub family_name: Option<String>,
    #[arg(long = "birth-date", value_name = "YYYY-MM-DD")]
    pub birth_date: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum MedicationsCommand {
    /// List medications. Filters: id, name, description.
    List(TableArgs),
    Show { id: u64 },
    Create(MedicationFields),
    Update {
        id: u64,
        #[command(flatten)]
        fields: MedicationUpdateFields,
    },
    Delete { id: u64 },
}

#[derive(Args, Debug, Clone)]
pub struct MedicationFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value = "")]
    pub contraindications: String,
    #[arg(long)]
    pub dosage: String,
}

#[derive(Args, Debug, Clone)]
pub struct MedicationUpdateFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub contraindications: Option<String>,
    #[arg(long)]
    pub dosage: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecordsCommand {
    /// List medical records. Filters: id, name, date (YYYY-MM-DD).
    List(TableArgs),
    /// Show a record with its treatments.
    Show { id: u64 },
    Create {
        #[arg(long, value_name = "ID")]
        patient: Option<u64>,
        #[arg(long)]
        notes: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TreatmentsCommand {
    Show {
        id: u64,
    },
    Create {
        #[arg(long, value_name = "ID")]
        record: u64,
        #[arg(long, value_name = "YYYY-MM-DD", help = "Start date (default today).")]
        start: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        end: Option<String>,
        #[arg(long, default_value = "")]
        instructions: String,
        #[arg(long, value_name = "ID")]
        physician: Option<u64>,
        #[arg(long = "medication", value_name = "ID", action = ArgAction::Append)]
        medications: Vec<u64>,
    },
    /// Update dates and instructions, then attach any given medications.
    Update {
        id: u64,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        end: Option<String>,
        #[arg(long)]
        instructions: Option<String>,
        #[arg(long = "medication", value_name = "ID", action = ArgAction::Append)]
        medications: Vec<u64>,
    },
    AddMedications {
        id: u64,
        #[arg(value_name = "MED_ID", required = true)]
        medications: Vec<u64>,
    },
    RemoveMedication {
        id: u64,
        #[arg(value_name = "MED_ID")]
        medication: u64,
    },
}
