//! The active-search alert ledger: client-submitted alerts and the bulk
//! removal of system alerts.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AlertRecord, AlertSource};
use crate::store::{Store, StoreError};

/// Keys the server owns on every alert; client values for them are dropped.
const RESERVED_KEYS: [&str; 3] = ["_id", "dataRegistro", "source"];

pub fn manual_alert(document: Value, now: DateTime<Utc>) -> Result<AlertRecord, AppError> {
    let Value::Object(mut document) = document else {
        return Err(AppError::MalformedPayload(
            "alert must be a JSON object".to_string(),
        ));
    };

    for key in RESERVED_KEYS {
        document.remove(key);
    }

    Ok(AlertRecord {
        id: Uuid::new_v4(),
        document,
        source: AlertSource::Manual,
        recorded_at: now,
    })
}

pub async fn append(store: &dyn Store, document: Value) -> Result<AlertRecord, AppError> {
    let alert = manual_alert(document, Utc::now())?;
    store.insert_alert(&alert).await?;
    Ok(alert)
}

pub async fn clear_system_alerts(store: &dyn Store) -> Result<u64, StoreError> {
    let removed = store.delete_system_alerts().await?;
    info!(removed, "system alerts cleared");
    Ok(removed)
}
