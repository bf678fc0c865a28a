use serde::{Deserialize, Serialize};

use crate::error::RemedyError;

pub const DEFAULT_SUPPORT_GROUP: &str = "Servers and Storage";
pub const DEFAULT_SUPPORT_ORG: &str = "IT Infrastructure";
pub const DEFAULT_ATTACHMENT_SIZE_CAP: u64 = 10_000_000;

/// Site configuration for the mapping layer.
///
/// Built once at start-up and handed to the helper. `support_company` and
/// `domain` have no sensible default and must be supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemedyConfig {
    pub support_company: String,
    #[serde(default = "default_support_group")]
    pub support_group: String,
    #[serde(default = "default_support_org")]
    pub support_org: String,
    /// Smart IT host, used for work order links.
    pub domain: String,
    #[serde(default)]
    pub template_build_id: Option<String>,
    #[serde(default)]
    pub template_modify_id: Option<String>,
    #[serde(default = "default_attachment_size_cap")]
    pub attachment_size_cap_bytes: u64,
    /// Base URL of the ordering portal; the order id is appended.
    #[serde(default)]
    pub order_url_base: Option<String>,
    /// Per-server share of blade hardware cost quoted in build descriptions.
    #[serde(default)]
    pub blade_share_cost: Option<f64>,
}

fn default_support_group() -> String {
    DEFAULT_SUPPORT_GROUP.to_string()
}

fn default_support_org() -> String {
    DEFAULT_SUPPORT_ORG.to_string()
}

fn default_attachment_size_cap() -> u64 {
    DEFAULT_ATTACHMENT_SIZE_CAP
}

impl RemedyConfig {
    /// Config with the required keys set and every other key defaulted.
    pub fn new(support_company: &str, domain: &str) -> Self {
        Self {
            support_company: support_company.to_string(),
            support_group: default_support_group(),
            support_org: default_support_org(),
            domain: domain.to_string(),
            template_build_id: None,
            template_modify_id: None,
            attachment_size_cap_bytes: DEFAULT_ATTACHMENT_SIZE_CAP,
            order_url_base: None,
            blade_share_cost: None,
        }
    }

    pub fn validate(&self) -> Result<(), RemedyError> {
        let required = [
            ("support_company", &self.support_company),
            ("support_group", &self.support_group),
            ("support_org", &self.support_org),
            ("domain", &self.domain),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(RemedyError::Config(format!("{key} must not be empty")));
            }
        }
        if self.attachment_size_cap_bytes == 0 {
            return Err(RemedyError::Config(
                "attachment_size_cap_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Link to a work order in the Smart IT console.
    pub fn work_order_href(&self, instance_id: &str) -> String {
        format!(
            "https://{}/smartit/app/#/workorder/{instance_id}",
            self.domain
        )
    }

    /// Link to an order in the ordering portal, if one is configured.
    pub fn order_href(&self, order_id: &str) -> Option<String> {
        self.order_url_base
            .as_ref()
            .map(|base| format!("{}/{order_id}", base.trim_end_matches('/')))
    }
}
