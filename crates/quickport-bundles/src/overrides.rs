//! Override parameters applied when importing a bundle
//!
//! The override document is a JSON object stored next to the bundles:
//!
//! ```json
//! {
//!   "OverrideParameters": {
//!     "ResourceIdOverrideConfiguration": { "PrefixForAllResources": "prod-" },
//!     "DataSources": [
//!       {
//!         "DataSourceId": "warehouse",
//!         "Credentials": { "SecretArn": "arn:aws:secretsmanager:..." }
//!       }
//!     ],
//!     "DataSets": [{ "DataSetId": "sales", "Name": "Sales (prod)" }]
//!   }
//! }
//! ```

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::MigrationError;

/// Top-level override document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverrideDocument {
    #[serde(rename = "OverrideParameters", default)]
    pub override_parameters: Option<OverrideParameters>,
}

impl OverrideDocument {
    pub fn from_slice(raw: &[u8]) -> Result<Self, MigrationError> {
        Ok(serde_json::from_slice(raw)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OverrideParameters {
    #[serde(default)]
    pub resource_id_override_configuration: Option<ResourceIdOverrideConfiguration>,
    #[serde(default)]
    pub data_sources: Vec<DataSourceOverride>,
    #[serde(default)]
    pub data_sets: Vec<DataSetOverride>,
    #[serde(default)]
    pub analyses: Vec<AnalysisOverride>,
    #[serde(default)]
    pub dashboards: Vec<DashboardOverride>,
    #[serde(default)]
    pub themes: Vec<ThemeOverride>,
    /// Sections this crate cannot forward; reported and dropped
    #[serde(flatten)]
    pub unsupported: Map<String, Value>,
}

impl OverrideParameters {
    /// True when nothing would be sent to the import job
    pub fn is_empty(&self) -> bool {
        self.resource_id_override_configuration
            .as_ref()
            .map_or(true, |c| c.prefix_for_all_resources.is_none())
            && self.data_sources.is_empty()
            && self.data_sets.is_empty()
            && self.analyses.is_empty()
            && self.dashboards.is_empty()
            && self.themes.is_empty()
    }

    /// Paths of every field that is parsed but not forwarded, e.g.
    /// `VPCConnections` or `DataSources[warehouse].DataSourceParameters.SnowflakeParameters`
    pub fn unsupported_sections(&self) -> Vec<String> {
        let mut sections: Vec<String> = self.unsupported.keys().cloned().collect();

        for source in &self.data_sources {
            let prefix = format!("DataSources[{}]", source.data_source_id);
            sections.extend(nested(&prefix, &source.unsupported));
            if let Some(parameters) = &source.data_source_parameters {
                let prefix = format!("{}.DataSourceParameters", prefix);
                sections.extend(nested(&prefix, &parameters.unsupported));
            }
        }
        for data_set in &self.data_sets {
            let prefix = format!("DataSets[{}]", data_set.data_set_id);
            sections.extend(nested(&prefix, &data_set.unsupported));
        }
        for analysis in &self.analyses {
            let prefix = format!("Analyses[{}]", analysis.analysis_id);
            sections.extend(nested(&prefix, &analysis.unsupported));
        }
        for dashboard in &self.dashboards {
            let prefix = format!("Dashboards[{}]", dashboard.dashboard_id);
            sections.extend(nested(&prefix, &dashboard.unsupported));
        }
        for theme in &self.themes {
            let prefix = format!("Themes[{}]", theme.theme_id);
            sections.extend(nested(&prefix, &theme.unsupported));
        }

        sections
    }
}

fn nested<'a>(prefix: &'a str, fields: &'a Map<String, Value>) -> impl Iterator<Item = String> + 'a {
    fields.keys().map(move |key| format!("{}.{}", prefix, key))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceIdOverrideConfiguration {
    #[serde(default)]
    pub prefix_for_all_resources: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSourceOverride {
    pub data_source_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Connection of the data source in the target account
    #[serde(default)]
    pub data_source_parameters: Option<DataSourceParameters>,
    #[serde(default)]
    pub vpc_connection_properties: Option<VpcConnectionProperties>,
    #[serde(default)]
    pub ssl_properties: Option<SslProperties>,
    #[serde(default)]
    pub credentials: Option<DataSourceCredentials>,
    #[serde(flatten)]
    pub unsupported: Map<String, Value>,
}

/// Engine-specific connection settings; exactly one member is expected
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSourceParameters {
    #[serde(default)]
    pub rds_parameters: Option<RdsParameters>,
    #[serde(default)]
    pub redshift_parameters: Option<RedshiftParameters>,
    #[serde(default, rename = "PostgreSqlParameters")]
    pub postgresql_parameters: Option<HostDatabaseParameters>,
    #[serde(default, rename = "MySqlParameters")]
    pub mysql_parameters: Option<HostDatabaseParameters>,
    #[serde(default, rename = "AuroraPostgreSqlParameters")]
    pub aurora_postgresql_parameters: Option<HostDatabaseParameters>,
    #[serde(flatten)]
    pub unsupported: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RdsParameters {
    pub instance_id: String,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RedshiftParameters {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<i32>,
    pub database: String,
    #[serde(default)]
    pub cluster_id: Option<String>,
}

/// Host, port and database of a self-addressed engine (PostgreSQL, MySQL, Aurora)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostDatabaseParameters {
    pub host: String,
    pub port: i32,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConnectionProperties {
    pub vpc_connection_arn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SslProperties {
    #[serde(default)]
    pub disable_ssl: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSourceCredentials {
    #[serde(default)]
    pub credential_pair: Option<CredentialPair>,
    #[serde(default)]
    pub secret_arn: Option<String>,
}

#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetOverride {
    pub data_set_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub unsupported: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisOverride {
    pub analysis_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub unsupported: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DashboardOverride {
    pub dashboard_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub unsupported: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThemeOverride {
    pub theme_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub unsupported: Map<String, Value>,
}
