//! Wire types for the queue backend.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClassifiedError;

/// Store list endpoint.
pub const STORES_PATH: &str = "/api/stores";

/// Queue snapshot endpoint prefix; the store id follows as a path segment.
pub const QUEUES_PATH: &str = "/api/queues";

/// Backend-side cache endpoint.
pub const CACHE_PATH: &str = "/api/cache";

/// Backend liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Smallest accepted `numresults` for the store list.
pub const MIN_NUM_RESULTS: u32 = 1;

/// Largest accepted `numresults` for the store list.
pub const MAX_NUM_RESULTS: u32 = 100;

/// Tickets shown per queue category.
pub const QUEUE_DISPLAY_COUNT: usize = 3;

pub type StoreId = i64;

/// Ticketing state reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NetTicketStatus {
    /// Store takes tickets manually while the online system is off.
    OfflineManual,
    /// Any other state the backend reports, kept verbatim.
    Other(String),
}

impl From<String> for NetTicketStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OFFLINE_MANUAL" => NetTicketStatus::OfflineManual,
            _ => NetTicketStatus::Other(s),
        }
    }
}

impl From<NetTicketStatus> for String {
    fn from(status: NetTicketStatus) -> Self {
        match status {
            NetTicketStatus::OfflineManual => "OFFLINE_MANUAL".to_string(),
            NetTicketStatus::Other(s) => s,
        }
    }
}

/// A restaurant location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub net_ticket_status: Option<NetTicketStatus>,
}

impl Store {
    /// Whether the walk-in suspended banner applies.
    ///
    /// The banner shows for every status except manual offline ticketing,
    /// including when the backend omits the field.
    pub fn walk_in_suspended(&self) -> bool {
        self.net_ticket_status != Some(NetTicketStatus::OfflineManual)
    }
}

/// Parameters for the store list request.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub num_results: u32,
    pub region: String,
}

impl Default for StoreQuery {
    fn default() -> Self {
        Self {
            latitude: 22.0,
            longitude: 114.0,
            num_results: 25,
            region: "HK".to_string(),
        }
    }
}

impl StoreQuery {
    /// Default coordinates and result count for the given region.
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Reject parameters the backend would refuse anyway.
    pub fn validate(&self) -> Result<(), ClassifiedError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(ClassifiedError::validation(
                "Invalid coordinates: latitude and longitude must be numbers",
            ));
        }

        if !(MIN_NUM_RESULTS..=MAX_NUM_RESULTS).contains(&self.num_results) {
            return Err(ClassifiedError::validation(format!(
                "Invalid numresults: must be between {MIN_NUM_RESULTS} and {MAX_NUM_RESULTS}"
            )));
        }

        Ok(())
    }

    /// Endpoint path and query; also the cache key.
    pub fn endpoint(&self) -> String {
        format!(
            "{STORES_PATH}?latitude={}&longitude={}&numresults={}&region={}",
            self.latitude, self.longitude, self.num_results, self.region
        )
    }
}

/// Endpoint path and query for one store's queues; also the cache key.
pub fn queues_endpoint(store_id: StoreId, region: &str) -> String {
    format!("{QUEUES_PATH}/{store_id}?region={region}")
}

/// The three queue categories shown on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueCategory {
    /// Guests happy with either counter or booth seating.
    Counter,
    /// Booth only.
    Booth,
    /// App reservations, called in reservation-time order.
    Reservation,
}

impl QueueCategory {
    pub const ALL: [QueueCategory; 3] = [
        QueueCategory::Counter,
        QueueCategory::Booth,
        QueueCategory::Reservation,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            QueueCategory::Counter => "吧檯 / 卡位 都可以",
            QueueCategory::Booth => "卡位",
            QueueCategory::Reservation => "手機APP預約(按預約時間先後順序叫號)",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            QueueCategory::Counter => "Counter / booth",
            QueueCategory::Booth => "Booth",
            QueueCategory::Reservation => "Reservation",
        }
    }
}

impl fmt::Display for QueueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subtitle())
    }
}

/// Current queue numbers for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    #[serde(default, deserialize_with = "ticket_labels")]
    pub store_queue: Vec<String>,
    #[serde(default, deserialize_with = "ticket_labels")]
    pub booth_queue: Vec<String>,
    #[serde(default, deserialize_with = "ticket_labels")]
    pub reservation_queue: Vec<String>,
}

impl QueueSnapshot {
    pub fn queue(&self, category: QueueCategory) -> &[String] {
        match category {
            QueueCategory::Counter => &self.store_queue,
            QueueCategory::Booth => &self.booth_queue,
            QueueCategory::Reservation => &self.reservation_queue,
        }
    }

    /// Exactly `count` display slots; missing tickets are empty strings.
    pub fn top(&self, category: QueueCategory, count: usize) -> Vec<String> {
        let queue = self.queue(category);
        (0..count)
            .map(|i| queue.get(i).cloned().unwrap_or_default())
            .collect()
    }
}

/// Ticket labels come as strings or bare numbers; `null` means empty.
///
/// Entries that are neither become blank labels so later tickets keep their
/// display slot.
fn ticket_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn store_deserializes_from_backend_shape() {
        let store: Store = serde_json::from_str(
            r#"{"id": 5, "name": "Causeway Bay", "netTicketStatus": "OFFLINE_MANUAL", "extra": 1}"#,
        )
        .unwrap();

        assert_eq!(store.id, 5);
        assert_eq!(store.name, "Causeway Bay");
        assert_eq!(store.net_ticket_status, Some(NetTicketStatus::OfflineManual));
        assert!(!store.walk_in_suspended());
    }

    #[test]
    fn walk_in_suspended_for_other_or_missing_status() {
        let open: Store =
            serde_json::from_str(r#"{"id": 1, "name": "A", "netTicketStatus": "ONLINE"}"#).unwrap();
        assert_eq!(
            open.net_ticket_status,
            Some(NetTicketStatus::Other("ONLINE".into()))
        );
        assert!(open.walk_in_suspended());

        let missing: Store = serde_json::from_str(r#"{"id": 1, "name": "A"}"#).unwrap();
        assert!(missing.walk_in_suspended());
    }

    #[test]
    fn net_ticket_status_serializes_verbatim() {
        let json = serde_json::to_string(&NetTicketStatus::OfflineManual).unwrap();
        assert_eq!(json, "\"OFFLINE_MANUAL\"");
    }

    #[test]
    fn store_query_endpoint_matches_backend_format() {
        assert_eq!(
            StoreQuery::default().endpoint(),
            "/api/stores?latitude=22&longitude=114&numresults=25&region=HK"
        );

        let query = StoreQuery {
            latitude: 22.28,
            longitude: 114.16,
            num_results: 10,
            region: "TW".into(),
        };
        assert_eq!(
            query.endpoint(),
            "/api/stores?latitude=22.28&longitude=114.16&numresults=10&region=TW"
        );
    }

    #[test]
    fn store_query_rejects_bad_parameters() {
        let mut query = StoreQuery::default();
        assert!(query.validate().is_ok());

        query.num_results = 0;
        let err = query.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("between 1 and 100"));

        query.num_results = 101;
        assert!(query.validate().is_err());

        query.num_results = 100;
        query.latitude = f64::NAN;
        let err = query.validate().unwrap_err();
        assert!(err.message().starts_with("Invalid coordinates"));
    }

    #[test]
    fn queues_endpoint_format() {
        assert_eq!(queues_endpoint(2, "HK"), "/api/queues/2?region=HK");
    }

    #[test]
    fn snapshot_accepts_strings_numbers_and_gaps() {
        let snapshot: QueueSnapshot = serde_json::from_str(
            r#"{"storeQueue": ["101", 102], "boothQueue": null, "mixedQueue": ["9"]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.store_queue, vec!["101", "102"]);
        assert!(snapshot.booth_queue.is_empty());
        assert!(snapshot.reservation_queue.is_empty());
    }

    #[test]
    fn blank_entries_keep_their_slot() {
        let snapshot: QueueSnapshot =
            serde_json::from_str(r#"{"storeQueue": ["101", null, "103"], "boothQueue": [{}, 7]}"#)
                .unwrap();

        assert_eq!(
            snapshot.top(QueueCategory::Counter, QUEUE_DISPLAY_COUNT),
            vec!["101", "", "103"]
        );
        assert_eq!(
            snapshot.top(QueueCategory::Booth, QUEUE_DISPLAY_COUNT),
            vec!["", "7", ""]
        );
    }

    #[test]
    fn top_pads_to_display_count() {
        let snapshot = QueueSnapshot {
            store_queue: vec!["101".into(), "102".into(), "103".into(), "104".into()],
            booth_queue: vec!["201".into()],
            reservation_queue: vec![],
        };

        assert_eq!(
            snapshot.top(QueueCategory::Counter, QUEUE_DISPLAY_COUNT),
            vec!["101", "102", "103"]
        );
        assert_eq!(
            snapshot.top(QueueCategory::Booth, QUEUE_DISPLAY_COUNT),
            vec!["201", "", ""]
        );
        assert_eq!(
            snapshot.top(QueueCategory::Reservation, QUEUE_DISPLAY_COUNT),
            vec!["", "", ""]
        );
    }
}
