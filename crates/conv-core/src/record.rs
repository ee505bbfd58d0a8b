//! Record of converters already applied to a workspace

use chrono::{DateTime, Utc};
use conv_fs::{ConfigStore, NormalizedPath, SettingsLayout};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ids of converters that have run on a workspace.
///
/// Only consulted for providers that cannot tell from the files alone
/// whether they already ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    #[serde(default)]
    pub applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_conversion: Option<DateTime<Utc>>,
}

impl ConversionRecord {
    /// Load the record of a workspace; a missing record is empty.
    pub fn load(layout: &SettingsLayout) -> Result<Self> {
        Ok(ConfigStore::new().load_or_default(&layout.conversion_record())?)
    }

    pub fn save(&self, layout: &SettingsLayout) -> Result<NormalizedPath> {
        let path = layout.conversion_record();
        ConfigStore::new().save(&path, self)?;
        Ok(path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.applied.iter().any(|applied| applied == id)
    }

    /// Add ids not yet recorded, keeping the existing order.
    pub fn record<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if !self.contains(id) {
                self.applied.push(id.to_string());
            }
        }
        self.last_conversion = Some(Utc::now());
    }
}
