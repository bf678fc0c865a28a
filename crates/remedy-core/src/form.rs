use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field name to value, written verbatim into a form entry.
pub type FormValues = serde_json::Map<String, Value>;

/// The AR System forms this crate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormName {
    WorkOrderInterface,
    WorkOrder,
    WorkInfo,
    Task,
    People,
    HelpDesk,
    IncidentWorkLog,
}

impl FormName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormName::WorkOrderInterface => "WOI:WorkOrderInterface",
            FormName::WorkOrder => "WOI:WorkOrder",
            FormName::WorkInfo => "WOI:WorkInfo",
            FormName::Task => "TMS:Task",
            FormName::People => "CTM:People",
            FormName::HelpDesk => "HPD:Help Desk",
            FormName::IncidentWorkLog => "HPD:WorkLog",
        }
    }
}

impl fmt::Display for FormName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who can see a work log entry or attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Internal,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Internal => "Internal",
            Visibility::Public => "Public",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "internal" => Some(Visibility::Internal),
            "public" => Some(Visibility::Public),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry as returned by the entry endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormEntry {
    #[serde(default)]
    pub values: FormValues,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

impl FormEntry {
    pub fn new(values: FormValues) -> Self {
        Self {
            values,
            links: None,
        }
    }

    /// String value of a field, if present and a string.
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }
}

/// Body of a qualified entry query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryList {
    #[serde(default)]
    pub entries: Vec<FormEntry>,
}

/// Body sent when creating or updating an entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPayload<'a> {
    pub values: &'a FormValues,
}

/// Build an AR qualification matching one field exactly:
/// `'Field Name'="value"`. Embedded double quotes are doubled.
pub fn field_equals(field: &str, value: &str) -> String {
    format!("'{field}'=\"{}\"", value.replace('"', "\"\""))
}

/// Inverse of [`field_equals`]: split `'Field'="value"` into its parts.
pub fn parse_field_equals(qualification: &str) -> Option<(String, String)> {
    let rest = qualification.trim().strip_prefix('\'')?;
    let (field, rest) = rest.split_once("'=")?;
    let value = rest.strip_prefix('"')?.strip_suffix('"')?;
    Some((field.to_string(), value.replace("\"\"", "\"")))
}
