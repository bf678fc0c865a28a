use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use remedy_core::config::{DEFAULT_ATTACHMENT_SIZE_CAP, DEFAULT_SUPPORT_GROUP, DEFAULT_SUPPORT_ORG};
use remedy_core::form::Visibility;
use remedy_core::RemedyConfig;
use remedy_service::Credentials;

#[derive(Debug, Parser)]
#[command(name = "remedy", about = "Open and track Remedy work orders for server orders")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub site: SiteArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// How to reach and authenticate against the AR server.
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// AR REST base URL
    #[arg(long, env = "REMEDY_SERVER_URL", default_value = "http://127.0.0.1:8008")]
    pub server_url: String,

    /// Pre-issued AR-JWT token
    #[arg(long, env = "REMEDY_TOKEN")]
    pub token: Option<String>,

    /// Login name; also recorded as the work log submitter
    #[arg(long, env = "REMEDY_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "REMEDY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Per-request timeout (seconds)
    #[arg(long, env = "REMEDY_TIMEOUT", default_value = "30")]
    pub timeout: u64,
}

impl ConnectionArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// A token wins over a password when both are given.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.token, &self.username, &self.password) {
            (Some(token), username, _) => Ok(Credentials::Token {
                token: token.clone(),
                username: username.clone(),
            }),
            (None, Some(username), Some(password)) => Ok(Credentials::Password {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => bail!("either --token or both --username and --password are required"),
        }
    }
}

/// Site values written into every work order.
#[derive(Debug, Args)]
pub struct SiteArgs {
    #[arg(long, env = "REMEDY_SUPPORT_COMPANY")]
    pub support_company: String,

    #[arg(long, env = "REMEDY_SUPPORT_GROUP", default_value = DEFAULT_SUPPORT_GROUP)]
    pub support_group: String,

    #[arg(long, env = "REMEDY_SUPPORT_ORG", default_value = DEFAULT_SUPPORT_ORG)]
    pub support_org: String,

    /// Smart IT host used in work order links
    #[arg(long, env = "REMEDY_DOMAIN")]
    pub domain: String,

    #[arg(long, env = "REMEDY_TEMPLATE_BUILD_ID")]
    pub template_build_id: Option<String>,

    #[arg(long, env = "REMEDY_TEMPLATE_MODIFY_ID")]
    pub template_modify_id: Option<String>,

    /// Largest attachment sent; bigger files keep their tail
    #[arg(long, env = "REMEDY_ATTACHMENT_SIZE_CAP", default_value_t = DEFAULT_ATTACHMENT_SIZE_CAP)]
    pub attachment_size_cap_bytes: u64,

    /// Ordering portal base URL, e.g. https://cmp.example.org/orders
    #[arg(long, env = "REMEDY_ORDER_URL_BASE")]
    pub order_url_base: Option<String>,

    #[arg(long, env = "REMEDY_BLADE_SHARE_COST")]
    pub blade_share_cost: Option<f64>,
}

impl SiteArgs {
    pub fn to_config(&self) -> RemedyConfig {
        RemedyConfig {
            support_company: self.support_company.clone(),
            support_group: self.support_group.clone(),
            support_org: self.support_org.clone(),
            domain: self.domain.clone(),
            template_build_id: self.template_build_id.clone(),
            template_modify_id: self.template_modify_id.clone(),
            attachment_size_cap_bytes: self.attachment_size_cap_bytes,
            order_url_base: self.order_url_base.clone(),
            blade_share_cost: self.blade_share_cost,
        }
    }
}

fn parse_visibility(s: &str) -> Result<Visibility, String> {
    Visibility::from_str(s).ok_or_else(|| format!("expected internal or public, got {s}"))
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit raw work order values read from a JSON file
    Submit {
        /// JSON object of field name to value
        values: PathBuf,
    },
    /// Map an order (JSON file) to a work order and submit it
    CreateWorkOrder {
        order: PathBuf,
        /// Print the mapped values without submitting
        #[arg(long)]
        dry_run: bool,
    },
    GetWorkOrder {
        work_order_id: String,
    },
    /// List the tasks of a work order
    Tasks {
        work_order_id: String,
    },
    /// Update a task with values read from a JSON file
    SetTask {
        task_id: String,
        values: PathBuf,
    },
    Person {
        username: String,
    },
    Incident {
        incident_id: String,
    },
    IncidentNotes {
        incident_id: String,
    },
    /// Add a work log note to a work order
    Note {
        work_order_id: String,
        note: String,
        #[arg(long, default_value = "internal", value_parser = parse_visibility)]
        visibility: Visibility,
    },
    /// Attach a local file to a work order
    Attach {
        work_order_id: String,
        path: PathBuf,
        /// Name to store the file under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        details: String,
        #[arg(long, default_value = "internal", value_parser = parse_visibility)]
        visibility: Visibility,
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
    /// Fetch a work order as the record the platform keeps for it
    Import {
        work_order_id: String,
        #[arg(long)]
        order_id: Option<String>,
    },
    /// Show field definitions of a form
    Fields {
        form: String,
        /// Comma separated field ids
        field_ids: Option<String>,
    },
}
