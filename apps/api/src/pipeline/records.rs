//! Read side of the record store.

use tracing::{debug, warn};

use crate::clients::{ClientError, KvStore};
use crate::models::record::AnalysisRecord;
use crate::pipeline::id::{record_key, RECORD_KEY_PREFIX};

pub async fn load_record(
    store: &dyn KvStore,
    id: &str,
) -> Result<Option<AnalysisRecord>, ClientError> {
    let Some(raw) = store.get(&record_key(id)).await? else {
        return Ok(None);
    };
    let record: AnalysisRecord = serde_json::from_str(&raw)?;
    if record.is_provisional() {
        debug!("Record {id} has no feedback yet");
    }
    Ok(Some(record))
}

/// Every stored record. Values that no longer parse are skipped with a warning.
pub async fn list_records(store: &dyn KvStore) -> Result<Vec<AnalysisRecord>, ClientError> {
    let values = store.list(RECORD_KEY_PREFIX).await?;
    Ok(values
        .iter()
        .filter_map(|raw| match serde_json::from_str::<AnalysisRecord>(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable record: {e}");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::MemoryKv;

    fn raw_record(id: &str) -> String {
        format!(
            r#"{{"id":"{id}","resumePath":"r","imagePath":"i","companyName":"c","jobTitle":"t","jobDescription":"d","feedback":null}}"#
        )
    }

    #[tokio::test]
    async fn test_load_record_reads_resume_key() {
        let kv = MemoryKv::default();
        kv.set("resume:42", &raw_record("42")).await.unwrap();

        let record = load_record(&kv, "42").await.unwrap().unwrap();
        assert_eq!(record.id, "42");
        assert!(record.is_provisional());
    }

    #[tokio::test]
    async fn test_load_record_missing_is_none() {
        let kv = MemoryKv::default();
        assert!(load_record(&kv, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_record_corrupt_value_is_error() {
        let kv = MemoryKv::default();
        kv.set("resume:bad", "not json").await.unwrap();
        assert!(matches!(
            load_record(&kv, "bad").await,
            Err(ClientError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_list_records_filters_prefix_and_skips_garbage() {
        let kv = MemoryKv::default();
        kv.set("resume:1", &raw_record("1")).await.unwrap();
        kv.set("resume:2", &raw_record("2")).await.unwrap();
        kv.set("resume:3", "garbage").await.unwrap();
        kv.set("session:tok", "alice").await.unwrap();

        let mut ids: Vec<String> = list_records(&kv)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
