//! Amazon QuickSight asset bundle provider
//!
//! Required IAM permissions:
//! - quicksight:ListFolderMembers
//! - quicksight:StartAssetBundleExportJob / DescribeAssetBundleExportJob
//! - quicksight:StartAssetBundleImportJob / DescribeAssetBundleImportJob
//! - plus the describe/create permissions on every exported or imported asset

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_quicksight::config::Region;
use aws_sdk_quicksight::error::{DisplayErrorContext, SdkError};
use aws_sdk_quicksight::types::{
    AssetBundleExportFormat, AssetBundleImportFailureAction,
    AssetBundleImportJobAnalysisOverrideParameters,
    AssetBundleImportJobDashboardOverrideParameters,
    AssetBundleImportJobDataSetOverrideParameters, AssetBundleImportJobDataSourceCredentialPair,
    AssetBundleImportJobDataSourceCredentials, AssetBundleImportJobDataSourceOverrideParameters,
    AssetBundleImportJobOverrideParameters, AssetBundleImportJobResourceIdOverrideConfiguration,
    AssetBundleImportJobThemeOverrideParameters, AssetBundleImportSource,
    AuroraPostgreSqlParameters, DataSourceParameters as SdkDataSourceParameters, MySqlParameters,
    PostgreSqlParameters, RdsParameters, RedshiftParameters, SslProperties, VpcConnectionProperties,
};
use aws_sdk_quicksight::Client;
use tracing::debug;

use super::traits::AssetBundleApi;
use crate::errors::MigrationError;
use crate::models::{
    ExportJobRequest, FolderMemberPage, ImportJobRequest, JobDescription, JobIssue, JobKind,
    JobRef, JobStatus, StartedJob,
};
use crate::overrides::{DataSourceOverride, DataSourceParameters, OverrideParameters};

/// Page size for folder membership listings
pub const FOLDER_PAGE_SIZE: i32 = 100;

/// Extract a readable message from a QuickSight SDK error
fn extract_quicksight_error_details<E, R>(e: &SdkError<E, R>) -> String
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match e {
        SdkError::ServiceError(service_err) => format!("{}", service_err.err()),
        SdkError::TimeoutError(_) => "Request timed out".to_string(),
        SdkError::DispatchFailure(dispatch_err) => {
            if dispatch_err.is_io() {
                "Network error: unable to reach QuickSight".to_string()
            } else if dispatch_err.is_timeout() {
                "Connection timed out".to_string()
            } else {
                format!("Connection failed: {}", DisplayErrorContext(e))
            }
        }
        _ => format!("{}", DisplayErrorContext(e)),
    }
}

fn invalid_override<E: std::fmt::Display>(e: E) -> MigrationError {
    MigrationError::QuickSight(format!("Invalid override parameters: {}", e))
}

/// QuickSight client scoped to one region
pub struct QuickSightProvider {
    client: Client,
}

impl QuickSightProvider {
    /// Create a provider using the default credential chain.
    /// `endpoint_url` points the client at a local emulator.
    pub async fn new(region: &str, endpoint_url: Option<&str>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let config = loader.load().await;
        Self::from_client(Client::new(&config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn describe_export_job(&self, job: &JobRef) -> Result<JobDescription, MigrationError> {
        let output = self
            .client
            .describe_asset_bundle_export_job()
            .aws_account_id(&job.account_id)
            .asset_bundle_export_job_id(job.job_id.as_str())
            .send()
            .await
            .map_err(|e| {
                MigrationError::QuickSight(format!(
                    "Failed to describe export job {}: {}",
                    job.job_id,
                    extract_quicksight_error_details(&e)
                ))
            })?;

        Ok(JobDescription {
            job_id: job.job_id.to_string(),
            status: parse_status(output.job_status().map(|s| s.as_str())),
            download_url: output.download_url().map(str::to_string),
            errors: output
                .errors()
                .iter()
                .map(|e| JobIssue {
                    arn: e.arn().map(str::to_string),
                    error_type: e.r#type().map(str::to_string),
                    message: e.message().map(str::to_string),
                })
                .collect(),
            rollback_errors: Vec::new(),
            warnings: output
                .warnings()
                .iter()
                .map(|w| JobIssue {
                    arn: w.arn().map(str::to_string),
                    error_type: None,
                    message: w.message().map(str::to_string),
                })
                .collect(),
        })
    }

    async fn describe_import_job(&self, job: &JobRef) -> Result<JobDescription, MigrationError> {
        let output = self
            .client
            .describe_asset_bundle_import_job()
            .aws_account_id(&job.account_id)
            .asset_bundle_import_job_id(job.job_id.as_str())
            .send()
            .await
            .map_err(|e| {
                MigrationError::QuickSight(format!(
                    "Failed to describe import job {}: {}",
                    job.job_id,
                    extract_quicksight_error_details(&e)
                ))
            })?;

        let to_issue = |e: &aws_sdk_quicksight::types::AssetBundleImportJobError| JobIssue {
            arn: e.arn().map(str::to_string),
            error_type: e.r#type().map(str::to_string),
            message: e.message().map(str::to_string),
        };

        Ok(JobDescription {
            job_id: job.job_id.to_string(),
            status: parse_status(output.job_status().map(|s| s.as_str())),
            download_url: None,
            errors: output.errors().iter().map(to_issue).collect(),
            rollback_errors: output.rollback_errors().iter().map(to_issue).collect(),
            warnings: output
                .warnings()
                .iter()
                .map(|w| JobIssue {
                    arn: w.arn().map(str::to_string),
                    error_type: None,
                    message: w.message().map(str::to_string),
                })
                .collect(),
        })
    }
}

fn parse_status(raw: Option<&str>) -> JobStatus {
    JobStatus::parse(raw.unwrap_or("UNKNOWN"))
}

/// First supported engine in `parameters`; unsupported engines were
/// already reported by the override document
fn to_sdk_data_source_parameters(
    parameters: &DataSourceParameters,
) -> Result<Option<SdkDataSourceParameters>, MigrationError> {
    if let Some(rds) = &parameters.rds_parameters {
        let rds = RdsParameters::builder()
            .instance_id(&rds.instance_id)
            .database(&rds.database)
            .build()
            .map_err(invalid_override)?;
        return Ok(Some(SdkDataSourceParameters::RdsParameters(rds)));
    }

    if let Some(redshift) = &parameters.redshift_parameters {
        let redshift = RedshiftParameters::builder()
            .set_host(redshift.host.clone())
            .set_port(redshift.port)
            .database(&redshift.database)
            .set_cluster_id(redshift.cluster_id.clone())
            .build()
            .map_err(invalid_override)?;
        return Ok(Some(SdkDataSourceParameters::RedshiftParameters(redshift)));
    }

    if let Some(pg) = &parameters.postgresql_parameters {
        let pg = PostgreSqlParameters::builder()
            .host(&pg.host)
            .port(pg.port)
            .database(&pg.database)
            .build()
            .map_err(invalid_override)?;
        return Ok(Some(SdkDataSourceParameters::PostgreSqlParameters(pg)));
    }

    if let Some(mysql) = &parameters.mysql_parameters {
        let mysql = MySqlParameters::builder()
            .host(&mysql.host)
            .port(mysql.port)
            .database(&mysql.database)
            .build()
            .map_err(invalid_override)?;
        return Ok(Some(SdkDataSourceParameters::MySqlParameters(mysql)));
    }

    if let Some(aurora) = &parameters.aurora_postgresql_parameters {
        let aurora = AuroraPostgreSqlParameters::builder()
            .host(&aurora.host)
            .port(aurora.port)
            .database(&aurora.database)
            .build()
            .map_err(invalid_override)?;
        return Ok(Some(SdkDataSourceParameters::AuroraPostgreSqlParameters(aurora)));
    }

    Ok(None)
}

fn to_sdk_data_source(
    source: &DataSourceOverride,
) -> Result<AssetBundleImportJobDataSourceOverrideParameters, MigrationError> {
    let credentials = match &source.credentials {
        Some(credentials) => {
            let pair = match &credentials.credential_pair {
                Some(pair) => Some(
                    AssetBundleImportJobDataSourceCredentialPair::builder()
                        .username(&pair.username)
                        .password(&pair.password)
                        .build()
                        .map_err(invalid_override)?,
                ),
                None => None,
            };
            Some(
                AssetBundleImportJobDataSourceCredentials::builder()
                    .set_credential_pair(pair)
                    .set_secret_arn(credentials.secret_arn.clone())
                    .build(),
            )
        }
        None => None,
    };

    let data_source_parameters = match &source.data_source_parameters {
        Some(parameters) => to_sdk_data_source_parameters(parameters)?,
        None => None,
    };

    let vpc_connection_properties = match &source.vpc_connection_properties {
        Some(vpc) => Some(
            VpcConnectionProperties::builder()
                .vpc_connection_arn(&vpc.vpc_connection_arn)
                .build()
                .map_err(invalid_override)?,
        ),
        None => None,
    };

    let ssl_properties = source
        .ssl_properties
        .as_ref()
        .map(|ssl| SslProperties::builder().disable_ssl(ssl.disable_ssl).build());

    AssetBundleImportJobDataSourceOverrideParameters::builder()
        .data_source_id(&source.data_source_id)
        .set_name(source.name.clone())
        .set_data_source_parameters(data_source_parameters)
        .set_vpc_connection_properties(vpc_connection_properties)
        .set_ssl_properties(ssl_properties)
        .set_credentials(credentials)
        .build()
        .map_err(invalid_override)
}

/// Convert the override document into the SDK's request shape
pub(crate) fn to_sdk_overrides(
    params: &OverrideParameters,
) -> Result<AssetBundleImportJobOverrideParameters, MigrationError> {
    let resource_id_override = params
        .resource_id_override_configuration
        .as_ref()
        .filter(|c| c.prefix_for_all_resources.is_some())
        .map(|c| {
            AssetBundleImportJobResourceIdOverrideConfiguration::builder()
                .set_prefix_for_all_resources(c.prefix_for_all_resources.clone())
                .build()
        });

    let data_sources = params
        .data_sources
        .iter()
        .map(to_sdk_data_source)
        .collect::<Result<Vec<_>, _>>()?;

    let data_sets = params
        .data_sets
        .iter()
        .map(|d| {
            AssetBundleImportJobDataSetOverrideParameters::builder()
                .data_set_id(&d.data_set_id)
                .set_name(d.name.clone())
                .build()
                .map_err(invalid_override)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let analyses = params
        .analyses
        .iter()
        .map(|a| {
            AssetBundleImportJobAnalysisOverrideParameters::builder()
                .analysis_id(&a.analysis_id)
                .set_name(a.name.clone())
                .build()
                .map_err(invalid_override)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dashboards = params
        .dashboards
        .iter()
        .map(|d| {
            AssetBundleImportJobDashboardOverrideParameters::builder()
                .dashboard_id(&d.dashboard_id)
                .set_name(d.name.clone())
                .build()
                .map_err(invalid_override)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let themes = params
        .themes
        .iter()
        .map(|t| {
            AssetBundleImportJobThemeOverrideParameters::builder()
                .theme_id(&t.theme_id)
                .set_name(t.name.clone())
                .build()
                .map_err(invalid_override)
        })
        .collect::<Result<Vec<_>, _>>()?;

    fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
        if v.is_empty() { None } else { Some(v) }
    }

    Ok(AssetBundleImportJobOverrideParameters::builder()
        .set_resource_id_override_configuration(resource_id_override)
        .set_data_sources(non_empty(data_sources))
        .set_data_sets(non_empty(data_sets))
        .set_analyses(non_empty(analyses))
        .set_dashboards(non_empty(dashboards))
        .set_themes(non_empty(themes))
        .build())
}

#[async_trait]
impl AssetBundleApi for QuickSightProvider {
    async fn list_folder_members(
        &self,
        account_id: &str,
        folder_id: &str,
        next_token: Option<String>,
    ) -> Result<FolderMemberPage, MigrationError> {
        debug!("Listing members of folder {} in {}", folder_id, account_id);

        let output = self
            .client
            .list_folder_members()
            .aws_account_id(account_id)
            .folder_id(folder_id)
            .max_results(FOLDER_PAGE_SIZE)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                MigrationError::QuickSight(format!(
                    "Failed to list members of folder {}: {}",
                    folder_id,
                    extract_quicksight_error_details(&e)
                ))
            })?;

        Ok(FolderMemberPage {
            member_arns: output
                .folder_member_list()
                .iter()
                .filter_map(|m| m.member_arn().map(str::to_string))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn start_export_job(
        &self,
        request: &ExportJobRequest,
    ) -> Result<StartedJob, MigrationError> {
        let output = self
            .client
            .start_asset_bundle_export_job()
            .aws_account_id(&request.account_id)
            .asset_bundle_export_job_id(request.job_id.as_str())
            .set_resource_arns(Some(request.resource_arns.clone()))
            .export_format(AssetBundleExportFormat::from(
                ExportJobRequest::EXPORT_FORMAT,
            ))
            .include_all_dependencies(ExportJobRequest::INCLUDE_ALL_DEPENDENCIES)
            .include_permissions(ExportJobRequest::INCLUDE_PERMISSIONS)
            .include_tags(ExportJobRequest::INCLUDE_TAGS)
            .send()
            .await
            .map_err(|e| {
                MigrationError::QuickSight(format!(
                    "Failed to start export job {}: {}",
                    request.job_id,
                    extract_quicksight_error_details(&e)
                ))
            })?;

        Ok(StartedJob {
            job_id: request.job_id.clone(),
            arn: output.arn().map(str::to_string),
        })
    }

    async fn start_import_job(
        &self,
        request: &ImportJobRequest,
    ) -> Result<StartedJob, MigrationError> {
        let overrides = request
            .override_parameters
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(to_sdk_overrides)
            .transpose()?;

        let output = self
            .client
            .start_asset_bundle_import_job()
            .aws_account_id(&request.account_id)
            .asset_bundle_import_job_id(request.job_id.as_str())
            .asset_bundle_import_source(
                AssetBundleImportSource::builder()
                    .s3_uri(&request.source_uri)
                    .build(),
            )
            .failure_action(AssetBundleImportFailureAction::from(
                ImportJobRequest::FAILURE_ACTION,
            ))
            .set_override_parameters(overrides)
            .send()
            .await
            .map_err(|e| {
                MigrationError::QuickSight(format!(
                    "Failed to start import job {} for {}: {}",
                    request.job_id,
                    request.source_uri,
                    extract_quicksight_error_details(&e)
                ))
            })?;

        Ok(StartedJob {
            job_id: request.job_id.clone(),
            arn: output.arn().map(str::to_string),
        })
    }

    async fn describe_job(&self, job: &JobRef) -> Result<JobDescription, MigrationError> {
        match job.kind {
            JobKind::Export => self.describe_export_job(job).await,
            JobKind::Import => self.describe_import_job(job).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideDocument;

    fn params(raw: &str) -> OverrideParameters {
        OverrideDocument::from_slice(raw.as_bytes())
            .unwrap()
            .override_parameters
            .unwrap()
    }

    #[test]
    fn test_to_sdk_overrides_maps_every_section() {
        let overrides = to_sdk_overrides(&params(
            r#"{"OverrideParameters": {
                "ResourceIdOverrideConfiguration": {"PrefixForAllResources": "prod-"},
                "DataSources": [{
                    "DataSourceId": "warehouse",
                    "Credentials": {"CredentialPair": {"Username": "bi", "Password": "pw"}}
                }],
                "DataSets": [{"DataSetId": "sales", "Name": "Sales"}],
                "Analyses": [{"AnalysisId": "a-1"}],
                "Dashboards": [{"DashboardId": "d-1"}],
                "Themes": [{"ThemeId": "t-1", "Name": "Dark"}]
            }}"#,
        ))
        .unwrap();

        assert_eq!(
            overrides
                .resource_id_override_configuration()
                .and_then(|c| c.prefix_for_all_resources()),
            Some("prod-")
        );
        let data_source = &overrides.data_sources()[0];
        assert_eq!(data_source.data_source_id(), "warehouse");
        let pair = data_source
            .credentials()
            .and_then(|c| c.credential_pair())
            .unwrap();
        assert_eq!(pair.username(), "bi");
        assert_eq!(overrides.data_sets()[0].name(), Some("Sales"));
        assert_eq!(overrides.analyses()[0].analysis_id(), "a-1");
        assert_eq!(overrides.dashboards()[0].dashboard_id(), "d-1");
        assert_eq!(overrides.themes()[0].theme_id(), "t-1");
    }

    #[test]
    fn test_to_sdk_overrides_leaves_absent_sections_unset() {
        let overrides = to_sdk_overrides(&params(
            r#"{"OverrideParameters": {"DataSets": [{"DataSetId": "sales"}]}}"#,
        ))
        .unwrap();

        assert!(overrides.resource_id_override_configuration().is_none());
        assert!(overrides.data_sources().is_empty());
        assert_eq!(overrides.data_sets().len(), 1);
    }

    #[test]
    fn test_to_sdk_overrides_forwards_data_source_connection() {
        let overrides = to_sdk_overrides(&params(
            r#"{"OverrideParameters": {"DataSources": [{
                "DataSourceId": "warehouse",
                "DataSourceParameters": {"RdsParameters": {"InstanceId": "prod-db", "Database": "sales"}},
                "VpcConnectionProperties": {"VpcConnectionArn": "arn:aws:quicksight:us-east-1:222:vpcConnection/v-1"},
                "SslProperties": {"DisableSsl": true}
            }]}}"#,
        ))
        .unwrap();

        let data_source = &overrides.data_sources()[0];
        match data_source.data_source_parameters() {
            Some(SdkDataSourceParameters::RdsParameters(rds)) => {
                assert_eq!(rds.instance_id(), "prod-db");
                assert_eq!(rds.database(), "sales");
            }
            other => panic!("Expected RDS parameters, got {:?}", other),
        }
        assert_eq!(
            data_source
                .vpc_connection_properties()
                .map(|v| v.vpc_connection_arn()),
            Some("arn:aws:quicksight:us-east-1:222:vpcConnection/v-1")
        );
        assert!(data_source.ssl_properties().unwrap().disable_ssl());
    }

    #[test]
    fn test_to_sdk_overrides_forwards_postgresql_host() {
        let overrides = to_sdk_overrides(&params(
            r#"{"OverrideParameters": {"DataSources": [{
                "DataSourceId": "pg",
                "DataSourceParameters": {"PostgreSqlParameters": {"Host": "db.prod", "Port": 5432, "Database": "bi"}}
            }]}}"#,
        ))
        .unwrap();

        match overrides.data_sources()[0].data_source_parameters() {
            Some(SdkDataSourceParameters::PostgreSqlParameters(pg)) => {
                assert_eq!(pg.host(), "db.prod");
                assert_eq!(pg.port(), 5432);
                assert_eq!(pg.database(), "bi");
            }
            other => panic!("Expected PostgreSQL parameters, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_status_defaults_to_unknown() {
        assert_eq!(parse_status(Some("IN_PROGRESS")), JobStatus::InProgress);
        assert_eq!(parse_status(None), JobStatus::Other("UNKNOWN".to_string()));
    }
}
