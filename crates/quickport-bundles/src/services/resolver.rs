//! Resolution of trigger events to exportable resource ARNs

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::MigrationError;
use crate::events::TriggerEvent;
use crate::models::{ResourceSet, SkipReason};
use crate::providers::AssetBundleApi;

const ARN_SERVICE: &str = "quicksight";

/// Outcome of resolving a trigger event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resources to export; `folder_id` is set for folder membership events
    Resources {
        folder_id: Option<String>,
        resources: ResourceSet,
    },
    /// Nothing to export, and that is not an error
    Skipped {
        reason: SkipReason,
        folder_id: String,
    },
}

/// Turns trigger events into resource sets.
///
/// Folder membership events list the folder's members; other events use the
/// ARNs they carry, or one ARN built from the asset id in the event detail.
pub struct ResourceResolver {
    api: Arc<dyn AssetBundleApi>,
    partition: String,
    region: String,
    allowed_folder_ids: BTreeSet<String>,
}

impl ResourceResolver {
    pub fn new(
        api: Arc<dyn AssetBundleApi>,
        partition: impl Into<String>,
        region: impl Into<String>,
        allowed_folder_ids: BTreeSet<String>,
    ) -> Self {
        Self {
            api,
            partition: partition.into(),
            region: region.into(),
            allowed_folder_ids,
        }
    }

    pub async fn resolve(&self, event: &TriggerEvent) -> Result<Resolution, MigrationError> {
        if let Some(folder_id) = event.folder_id() {
            return self.resolve_folder(&event.account, folder_id).await;
        }

        let resources = self.resolve_direct(event).ok_or_else(|| {
            MigrationError::Resolution(
                serde_json::to_string(event).unwrap_or_else(|_| format!("{:?}", event)),
            )
        })?;

        debug!("Resolved {} resources from event", resources.len());
        Ok(Resolution::Resources {
            folder_id: None,
            resources,
        })
    }

    async fn resolve_folder(
        &self,
        account_id: &str,
        folder_id: &str,
    ) -> Result<Resolution, MigrationError> {
        if !self.allowed_folder_ids.is_empty() && !self.allowed_folder_ids.contains(folder_id) {
            info!("Folder {} is not in the allow-list, skipping", folder_id);
            return Ok(Resolution::Skipped {
                reason: SkipReason::FolderNotAllowed,
                folder_id: folder_id.to_string(),
            });
        }

        let members = self.list_folder_member_arns(account_id, folder_id).await?;

        match ResourceSet::from_members(members) {
            Some(resources) => {
                info!(
                    "Folder {} resolved to {} resources",
                    folder_id,
                    resources.len()
                );
                Ok(Resolution::Resources {
                    folder_id: Some(folder_id.to_string()),
                    resources,
                })
            }
            None => {
                info!("Folder {} has no members, skipping", folder_id);
                Ok(Resolution::Skipped {
                    reason: SkipReason::FolderEmpty,
                    folder_id: folder_id.to_string(),
                })
            }
        }
    }

    async fn list_folder_member_arns(
        &self,
        account_id: &str,
        folder_id: &str,
    ) -> Result<Vec<String>, MigrationError> {
        let mut arns = Vec::new();
        let mut next_token = None;

        loop {
            let page = self
                .api
                .list_folder_members(account_id, folder_id, next_token)
                .await?;
            arns.extend(page.member_arns);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(arns)
    }

    fn resolve_direct(&self, event: &TriggerEvent) -> Option<ResourceSet> {
        if !event.resources.is_empty() {
            return ResourceSet::verbatim(event.resources.clone());
        }

        let detail = &event.detail;
        let (resource_type, id) = if let Some(id) = non_empty(detail.dashboard_id.as_deref()) {
            ("dashboard", id)
        } else if let Some(id) = non_empty(detail.analysis_id.as_deref()) {
            ("analysis", id)
        } else if let Some(id) = event.dataset_id() {
            ("dataset", id)
        } else {
            return None;
        };

        ResourceSet::verbatim(vec![self.arn(&event.account, resource_type, id)])
    }

    /// `arn:<partition>:quicksight:<region>:<account>:<type>/<id>`
    fn arn(&self, account_id: &str, resource_type: &str, id: &str) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}/{}",
            self.partition, ARN_SERVICE, self.region, account_id, resource_type, id
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
