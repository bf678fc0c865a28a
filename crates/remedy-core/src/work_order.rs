use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RemedyConfig;
use crate::description::{build_description, modify_description};
use crate::error::RemedyError;
use crate::form::{FormEntry, FormValues, Visibility};
use crate::order::{Order, OrderItem};

/// Work order subcategory, selected by the order item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderKind {
    Build,
    Modify,
}

impl WorkOrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderKind::Build => "Build",
            WorkOrderKind::Modify => "Modify",
        }
    }

    fn template_id<'a>(&self, config: &'a RemedyConfig) -> Option<&'a str> {
        match self {
            WorkOrderKind::Build => config.template_build_id.as_deref(),
            WorkOrderKind::Modify => config.template_modify_id.as_deref(),
        }
    }
}

impl fmt::Display for WorkOrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn insert(values: &mut FormValues, field: &str, value: impl Into<String>) {
    values.insert(field.to_string(), Value::String(value.into()));
}

fn work_order_values(
    kind: WorkOrderKind,
    summary: &str,
    description: String,
    requester: &str,
    config: &RemedyConfig,
) -> FormValues {
    let mut values = FormValues::new();
    insert(&mut values, "Summary", summary);
    insert(&mut values, "Description", description);
    insert(&mut values, "Notes", summary);
    insert(&mut values, "Requester", requester);
    insert(&mut values, "Status", "Assigned");
    insert(&mut values, "Priority", "Medium");
    insert(&mut values, "Service", "Infrastructure");
    insert(&mut values, "Category", "Server");
    insert(&mut values, "Subcategory", kind.as_str());
    insert(&mut values, "Impact", "3-Moderate");
    insert(&mut values, "Urgency", "3-Medium");
    insert(&mut values, "Assigned Group", config.support_group.as_str());
    insert(
        &mut values,
        "Assigned Support Company",
        config.support_company.as_str(),
    );
    insert(
        &mut values,
        "Assigned Support Organization",
        config.support_org.as_str(),
    );
    if let Some(template) = kind.template_id(config) {
        insert(&mut values, "TemplateID", template);
    }
    values
}

/// Map an order to the field values of a new work order.
///
/// Build items produce a `Build` work order summarised by hostname, modify
/// items a `Modify` work order summarised by the order name. Any other item
/// type is rejected.
pub fn build_work_order(order: &Order, config: &RemedyConfig) -> Result<FormValues, RemedyError> {
    match &order.item {
        OrderItem::Build(item) => {
            let summary = format!("Build {}", item.server.hostname);
            Ok(work_order_values(
                WorkOrderKind::Build,
                &summary,
                build_description(order, item, config),
                &order.owner,
                config,
            ))
        }
        OrderItem::Modify(item) => Ok(work_order_values(
            WorkOrderKind::Modify,
            &order.name,
            modify_description(order, item, config),
            &order.owner,
            config,
        )),
        OrderItem::Unsupported { item_type } => {
            Err(RemedyError::UnsupportedOrderType(item_type.clone()))
        }
    }
}

/// Field values for a work log note on an existing work order.
pub fn work_order_note(
    work_order_id: &str,
    note: &str,
    submitter: &str,
    visibility: Visibility,
    now: DateTime<Utc>,
) -> FormValues {
    let mut values = FormValues::new();
    insert(&mut values, "Work Order ID", work_order_id);
    insert(&mut values, "Detailed Description", note);
    insert(&mut values, "Work Log Submitter", submitter);
    insert(&mut values, "Work Log Type", "General Information");
    insert(&mut values, "Work Log Date", now.to_rfc3339());
    insert(&mut values, "View Access", visibility.as_str());
    insert(&mut values, "Secure Work Log", "Yes");
    values
}

/// A work order pulled from Remedy, reduced to what the platform records
/// against its own resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedWorkOrder {
    pub name: String,
    pub status: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl ImportedWorkOrder {
    pub fn from_entry(
        entry: &FormEntry,
        order_id: Option<&str>,
        config: &RemedyConfig,
    ) -> Result<Self, RemedyError> {
        let field = |name: &str| {
            entry
                .field_str(name)
                .map(String::from)
                .ok_or_else(|| RemedyError::Decode(format!("work order missing '{name}'")))
        };
        Ok(Self {
            name: field("Work Order ID")?,
            status: field("Status")?,
            href: config.work_order_href(&field("InstanceId")?),
            order_id: order_id.map(String::from),
        })
    }
}
