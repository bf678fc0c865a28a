use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An order from the provisioning platform, flattened into the fields the
/// work order mapping needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Username of the order owner.
    pub owner: String,
    #[serde(default)]
    pub on_behalf_of: Option<String>,
    pub group: GroupPath,
    pub item: OrderItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPath {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

impl GroupPath {
    /// `Parent \ Child`, or just the group name at the root.
    pub fn display_path(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent} \\ {}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The concrete item an order carries.
///
/// Deserialised from an object with a `type` tag. Item types the mapping
/// does not handle land in `Unsupported` so the caller gets a typed error
/// instead of a parse failure.
#[derive(Debug, Clone)]
pub enum OrderItem {
    Build(BuildItem),
    Modify(ModifyItem),
    Unsupported { item_type: String },
}

impl OrderItem {
    pub fn type_name(&self) -> &str {
        match self {
            OrderItem::Build(_) => "build",
            OrderItem::Modify(_) => "modify",
            OrderItem::Unsupported { item_type } => item_type,
        }
    }
}

#[derive(Deserialize)]
struct RawOrderItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(flatten)]
    fields: serde_json::Map<String, Value>,
}

impl TryFrom<RawOrderItem> for OrderItem {
    type Error = serde_json::Error;

    fn try_from(raw: RawOrderItem) -> Result<Self, Self::Error> {
        let fields = Value::Object(raw.fields);
        match raw.item_type.as_str() {
            "build" => Ok(OrderItem::Build(serde_json::from_value(fields)?)),
            "modify" => Ok(OrderItem::Modify(serde_json::from_value(fields)?)),
            _ => Ok(OrderItem::Unsupported {
                item_type: raw.item_type,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for OrderItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawOrderItem::deserialize(deserializer)?;
        OrderItem::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// A new server build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildItem {
    pub server: ServerSpec,
    pub environment: EnvironmentInfo,
    pub capacity: EnvironmentCapacity,
    pub hardware_cost: HardwareCost,
    #[serde(default)]
    pub quoted_total_cost: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSpec {
    pub hostname: String,
    pub quantity: u32,
    #[serde(default)]
    pub cost_center: String,
    #[serde(default)]
    pub funding_source: String,
    #[serde(default)]
    pub os_build: String,
    pub cpu_count: u32,
    pub mem_gb: f64,
    pub disk_gb: f64,
    #[serde(default)]
    pub attributes: ServerAttributes,
}

/// Free-form descriptive attributes recorded against a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerAttributes {
    pub technical_doc_url: String,
    pub application: String,
    pub app_vendor: String,
    pub environment: String,
    pub contacts: String,
    pub description: String,
    pub patch_group: String,
    pub organizational_unit: String,
    pub fda_510k: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub name: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub datastore: String,
}

/// Remaining quota in the target environment at order time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentCapacity {
    pub cpu_available: f64,
    pub mem_available: f64,
    pub disk_available: f64,
    pub vm_count: f64,
}

/// Hardware portion of the quoted rate, per resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareCost {
    pub cpu: f64,
    pub mem: f64,
    pub disk: f64,
}

/// A change to one or more existing servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyItem {
    pub hostname: String,
    pub server_count: u32,
    #[serde(default)]
    pub rate_display: String,
    #[serde(default)]
    pub funding_source: String,
    #[serde(default)]
    pub changes: Vec<ModChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModChange {
    pub item: String,
    pub change: String,
}
