use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{Store, StoreError};
use crate::models::{AlertRecord, AlertSource, AttendanceRecord};

#[derive(Default)]
struct Collections {
    attendance: Vec<AttendanceRecord>,
    alerts: Vec<AlertRecord>,
}

/// Store kept in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Stable sort over insertion order, so equal timestamps list the later insert first.
fn newest_first<T: Clone>(items: &[T], recorded_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = items.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| recorded_at(b).cmp(&recorded_at(a)));
    sorted
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_attendance(
        &self,
        record: &AttendanceRecord,
        alert: Option<&AlertRecord>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().await;
        collections.attendance.push(record.clone());
        if let Some(alert) = alert {
            collections.alerts.push(alert.clone());
        }
        Ok(())
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let collections = self.collections.lock().await;
        Ok(newest_first(&collections.attendance, |r| r.recorded_at))
    }

    async fn insert_alert(&self, alert: &AlertRecord) -> Result<(), StoreError> {
        self.collections.lock().await.alerts.push(alert.clone());
        Ok(())
    }

    async fn list_alerts(&self) -> Result<Vec<AlertRecord>, StoreError> {
        let collections = self.collections.lock().await;
        Ok(newest_first(&collections.alerts, |a| a.recorded_at))
    }

    async fn delete_system_alerts(&self) -> Result<u64, StoreError> {
        let mut collections = self.collections.lock().await;
        let before = collections.alerts.len();
        collections
            .alerts
            .retain(|alert| alert.source != AlertSource::System);
        Ok((before - collections.alerts.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::{json, Map, Value};
    use uuid::Uuid;

    fn alert(source: AlertSource, minutes_ago: i64) -> AlertRecord {
        let mut document = Map::new();
        document.insert("aluno".to_string(), Value::from("Ana"));
        AlertRecord {
            id: Uuid::new_v4(),
            document,
            source,
            recorded_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn attendance(minutes_ago: i64) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            student: "Ana".to_string(),
            grade: "5A".to_string(),
            attended_lessons: 7,
            total_lessons: 10,
            attendance_percent: 70.0,
            recorded_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryStore::new();
        let older = attendance(30);
        let newer = attendance(1);
        store.insert_attendance(&older, None).await.unwrap();
        store.insert_attendance(&newer, None).await.unwrap();

        let listed = store.list_attendance().await.unwrap();
        assert_eq!(listed, vec![newer, older]);
    }

    #[tokio::test]
    async fn equal_timestamps_list_latest_insert_first() {
        let store = MemoryStore::new();
        let first = alert(AlertSource::Manual, 5);
        let mut second = alert(AlertSource::Manual, 5);
        second.recorded_at = first.recorded_at;
        store.insert_alert(&first).await.unwrap();
        store.insert_alert(&second).await.unwrap();

        let ids: Vec<Uuid> = store
            .list_alerts()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn attendance_insert_carries_its_alert() {
        let store = MemoryStore::new();
        let raised = alert(AlertSource::System, 0);
        store
            .insert_attendance(&attendance(0), Some(&raised))
            .await
            .unwrap();

        assert_eq!(store.list_alerts().await.unwrap(), vec![raised]);
    }

    #[tokio::test]
    async fn delete_only_touches_system_alerts() {
        let store = MemoryStore::new();
        let mut manual = alert(AlertSource::Manual, 3);
        manual
            .document
            .insert("responsavel".to_string(), json!("Sistema Frequência"));
        store.insert_alert(&alert(AlertSource::System, 2)).await.unwrap();
        store.insert_alert(&manual).await.unwrap();
        store.insert_alert(&alert(AlertSource::System, 1)).await.unwrap();

        assert_eq!(store.delete_system_alerts().await.unwrap(), 2);
        assert_eq!(store.list_alerts().await.unwrap(), vec![manual]);
        assert_eq!(store.delete_system_alerts().await.unwrap(), 0);
    }
}
