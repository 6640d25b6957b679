use chrono::NaiveDate;

use crate::cli::args::{
    CliArgs, Command, MedicationsCommand, PatientsCommand, RecordsCommand, TableArgs,
    TreatmentsCommand, UsersCommand,
};
use crate::models::Role;
use crate::output::OutputFormat;
use crate::table::parse_filter_pair;

pub fn parse_date(flag: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid --{flag} '{raw}', expected YYYY-MM-DD"))
}

fn validate_table(table: &TableArgs) -> Result<(), String> {
    for raw in &table.filter {
        parse_filter_pair(raw).map_err(|e| format!("invalid --filter: {e}"))?;
    }
    if table.page == Some(0) {
        return Err("invalid --page, expected positive integer".to_string());
    }
    if table.page_size == Some(0) {
        return Err("invalid --page-size, expected positive integer".to_string());
    }
    Ok(())
}

fn validate_optional_date(flag: &str, raw: Option<&str>) -> Result<(), String> {
    match raw {
        Some(raw) => parse_date(flag, raw).map(|_| ()),
        None => Ok(()),
    }
}

fn validate_optional_role(raw: Option<&str>) -> Result<(), String> {
    match raw {
        Some(raw) => raw.parse::<Role>().map(|_| ()),
        None => Ok(()),
    }
}

/// Checks everything that can be checked without the backend.
pub fn validate(args: &CliArgs) -> Result<(), String> {
    validate_optional_role(args.role.as_deref())?;
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    if args.timeout == Some(0) {
        return Err("invalid --timeout, expected positive integer".to_string());
    }

    match &args.command {
        Command::Open { table, .. } => validate_table(table),
        Command::Users(UsersCommand::List(table))
        | Command::Patients(PatientsCommand::List(table)) => validate_table(table),
        Command::Medications(MedicationsCommand::List(table))
        | Command::Records(RecordsCommand::List(table)) => validate_table(table),
        Command::Users(UsersCommand::Create(fields)) => {
            validate_optional_role(fields.user_role.as_deref())
        }
        Command::Users(UsersCommand::Update { fields, .. }) => {
            validate_optional_role(fields.user_role.as_deref())
        }
        Command::Patients(PatientsCommand::Create(fields)) => {
            validate_optional_date("birth-date", fields.birth_date.as_deref())
        }
        Command::Patients(PatientsCommand::Update { fields, .. }) => {
            validate_optional_date("birth-date", fields.birth_date.as_deref())
        }
        Command::Treatments(TreatmentsCommand::Create { start, end, .. })
        | Command::Treatments(TreatmentsCommand::Update { start, end, .. }) => {
            validate_optional_date("start", start.as_deref())?;
            validate_optional_date("end", end.as_deref())
        }
        _ => Ok(()),
    }
}
