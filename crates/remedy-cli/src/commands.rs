use std::path::Path;

use anyhow::{Context, Result};
use remedy_core::attachment::AttachmentRequest;
use remedy_core::form::FormValues;
use remedy_core::work_order::build_work_order;
use remedy_core::Order;
use remedy_service::BlockingRemedyHelper;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Cli, Command};

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn connect(cli: &Cli) -> Result<BlockingRemedyHelper> {
    let credentials = cli.connection.credentials()?;
    info!("connecting to {}", cli.connection.server_url);
    let helper = BlockingRemedyHelper::connect(
        &cli.connection.server_url,
        cli.connection.timeout(),
        credentials,
        cli.site.to_config(),
    )?;
    Ok(helper)
}

/// File name to store an attachment under when none is given.
fn default_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

pub fn run(cli: Cli) -> Result<()> {
    // Mapping only; no connection needed.
    if let Command::CreateWorkOrder {
        order,
        dry_run: true,
    } = &cli.command
    {
        let order: Order = read_json(order)?;
        let config = cli.site.to_config();
        config.validate()?;
        return print_json(&build_work_order(&order, &config)?);
    }

    let helper = connect(&cli)?;
    let result = dispatch(&helper, &cli.command);
    if let Err(e) = helper.logout() {
        warn!("logout failed: {e}");
    }
    result
}

fn dispatch(helper: &BlockingRemedyHelper, command: &Command) -> Result<()> {
    match command {
        Command::Submit { values } => {
            let values: FormValues = read_json(values)?;
            print_json(&helper.submit_work_order(&values)?)?;
        }
        Command::CreateWorkOrder { order, .. } => {
            let order: Order = read_json(order)?;
            print_json(&helper.create_work_order(&order)?)?;
        }
        Command::GetWorkOrder { work_order_id } => {
            print_json(&helper.get_work_order(work_order_id)?)?;
        }
        Command::Tasks { work_order_id } => {
            print_json(&helper.get_work_order_tasks(work_order_id)?)?;
        }
        Command::SetTask { task_id, values } => {
            let values: FormValues = read_json(values)?;
            print_json(&helper.set_work_order_task(task_id, &values)?)?;
        }
        Command::Person { username } => {
            print_json(&helper.get_person_by_username(username)?)?;
        }
        Command::Incident { incident_id } => {
            print_json(&helper.get_incident(incident_id)?)?;
        }
        Command::IncidentNotes { incident_id } => {
            print_json(&helper.get_incident_notes(incident_id)?)?;
        }
        Command::Note {
            work_order_id,
            note,
            visibility,
        } => {
            print_json(&helper.create_work_order_note(work_order_id, note, *visibility)?)?;
        }
        Command::Attach {
            work_order_id,
            path,
            name,
            details,
            visibility,
            content_type,
        } => {
            let file_name = name.clone().unwrap_or_else(|| default_file_name(path));
            let mut request = AttachmentRequest::new(work_order_id, path, &file_name);
            request.details = details.clone();
            request.visibility = *visibility;
            request.content_type = content_type.clone();
            let outcome = helper.attach_file_to_work_order(&request)?;
            eprintln!("attached {file_name} (HTTP {})", outcome.status);
            print_json(&outcome.values)?;
        }
        Command::Import {
            work_order_id,
            order_id,
        } => {
            print_json(&helper.import_work_order(work_order_id, order_id.as_deref())?)?;
        }
        Command::Fields { form, field_ids } => {
            print_json(&helper.get_form_fields(form, field_ids.as_deref())?)?;
        }
    }
    Ok(())
}
