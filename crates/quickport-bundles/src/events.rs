//! Trigger payloads: QuickSight change events and S3 object notifications

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::MigrationError;

/// Event that starts an export (EventBridge envelope, relevant fields only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Source account id
    pub account: String,
    /// Explicit resource ARNs, used verbatim when present
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail: EventDetail,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderIdField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    /// Alternate spelling used by some event sources
    #[serde(default, rename = "dataSetId", skip_serializing_if = "Option::is_none")]
    pub data_set_id: Option<String>,
}

/// Folder membership events carry either one id or a list of ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderIdField {
    One(String),
    Many(Vec<String>),
}

impl TriggerEvent {
    pub fn from_json(raw: &str) -> Result<Self, MigrationError> {
        serde_json::from_str(raw).map_err(|e| MigrationError::InvalidEvent(e.to_string()))
    }

    /// Folder id of a membership event: the first element of a list, or the
    /// scalar. Empty values count as absent.
    pub fn folder_id(&self) -> Option<&str> {
        let id = match self.detail.folder_id.as_ref()? {
            FolderIdField::One(id) => id.as_str(),
            FolderIdField::Many(ids) => ids.first()?.as_str(),
        };
        (!id.is_empty()).then_some(id)
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.detail
            .dataset_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.detail.data_set_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// S3 "object created" notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3EventNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Object {
    /// URL-encoded object key
    pub key: String,
}

/// Bucket and decoded key of the object that triggered an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl S3EventNotification {
    pub fn from_json(raw: &str) -> Result<Self, MigrationError> {
        serde_json::from_str(raw).map_err(|e| MigrationError::InvalidEvent(e.to_string()))
    }

    /// Location named by the first record. Notifications are wired one
    /// object per event, so later records are ignored.
    pub fn first_object(&self) -> Result<ObjectLocation, MigrationError> {
        let record = self.records.first().ok_or_else(|| {
            MigrationError::InvalidEvent("S3 notification has no records".to_string())
        })?;

        Ok(ObjectLocation {
            bucket: record.s3.bucket.name.clone(),
            key: decode_object_key(&record.s3.object.key)?,
        })
    }
}

/// Notification keys use form encoding: `+` for space, `%XX` otherwise
fn decode_object_key(raw: &str) -> Result<String, MigrationError> {
    let plus_decoded = raw.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|key| key.into_owned())
        .map_err(|e| MigrationError::InvalidEvent(format!("Invalid object key '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_id_scalar_and_list() {
        let event =
            TriggerEvent::from_json(r#"{"account":"111","detail":{"folderId":"f-1"}}"#).unwrap();
        assert_eq!(event.folder_id(), Some("f-1"));

        let event =
            TriggerEvent::from_json(r#"{"account":"111","detail":{"folderId":["f-2","f-3"]}}"#)
                .unwrap();
        assert_eq!(event.folder_id(), Some("f-2"));

        let event =
            TriggerEvent::from_json(r#"{"account":"111","detail":{"folderId":[]}}"#).unwrap();
        assert_eq!(event.folder_id(), None);

        let event = TriggerEvent::from_json(r#"{"account":"111"}"#).unwrap();
        assert_eq!(event.folder_id(), None);
        assert!(event.resources.is_empty());
    }

    #[test]
    fn test_dataset_id_spellings() {
        let event =
            TriggerEvent::from_json(r#"{"account":"111","detail":{"dataSetId":"ds-9"}}"#).unwrap();
        assert_eq!(event.dataset_id(), Some("ds-9"));

        let event = TriggerEvent::from_json(
            r#"{"account":"111","detail":{"datasetId":"ds-1","dataSetId":"ds-2"}}"#,
        )
        .unwrap();
        assert_eq!(event.dataset_id(), Some("ds-1"));
    }

    #[test]
    fn test_null_resources_and_detail() {
        let event = TriggerEvent::from_json(
            r#"{"account":"111","resources":null,"detail":{"dashboardId":"d-1","folderId":null}}"#,
        )
        .unwrap();
        assert!(event.resources.is_empty());
        assert_eq!(event.folder_id(), None);
        assert_eq!(event.detail.dashboard_id.as_deref(), Some("d-1"));

        let event = TriggerEvent::from_json(r#"{"account":"111","detail":null}"#).unwrap();
        assert!(event.detail.dashboard_id.is_none());
    }

    #[test]
    fn test_event_without_account_is_invalid() {
        let result = TriggerEvent::from_json(r#"{"detail":{"dashboardId":"d-1"}}"#);
        assert!(matches!(result, Err(MigrationError::InvalidEvent(_))));
    }

    #[test]
    fn test_ignores_envelope_fields() {
        let raw = r#"{
            "version": "0",
            "id": "6a7e8feb-b491-4cf7-a9f1-bf3703467718",
            "detail-type": "QuickSight Dashboard Published",
            "source": "aws.quicksight",
            "account": "111122223333",
            "time": "2025-01-01T00:00:00Z",
            "region": "us-east-1",
            "resources": ["arn:aws:quicksight:us-east-1:111122223333:dashboard/d-1"],
            "detail": {"dashboardId": "d-1", "versionNumber": 3}
        }"#;
        let event = TriggerEvent::from_json(raw).unwrap();
        assert_eq!(event.account, "111122223333");
        assert_eq!(event.resources.len(), 1);
        assert_eq!(event.detail.dashboard_id.as_deref(), Some("d-1"));
    }

    #[test]
    fn test_first_object_decodes_key() {
        let raw = r#"{"Records":[
            {"s3":{"bucket":{"name":"target"},"object":{"key":"bundles/my+bundle%281%29.qs"}}},
            {"s3":{"bucket":{"name":"other"},"object":{"key":"ignored.qs"}}}
        ]}"#;
        let notification = S3EventNotification::from_json(raw).unwrap();
        let location = notification.first_object().unwrap();
        assert_eq!(location.bucket, "target");
        assert_eq!(location.key, "bundles/my bundle(1).qs");
    }

    #[test]
    fn test_notification_without_records() {
        let notification = S3EventNotification::from_json(r#"{"Records":[]}"#).unwrap();
        assert!(matches!(
            notification.first_object(),
            Err(MigrationError::InvalidEvent(_))
        ));
    }
}
