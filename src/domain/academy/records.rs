//! Resource records and their create/update inputs.
//!
//! Field names follow the backend's camelCase JSON. Every record carries an
//! optional server-assigned id; inputs never do.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Collection, ResourceKind};

/// A record served under one collection's REST path.
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Create/update body for this record.
    type Input: Serialize + Send + Sync;

    const COLLECTION: Collection;

    /// Server-assigned id, once persisted.
    fn id(&self) -> Option<i64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub graduation_year: Option<i32>,
    pub university_name: Option<String>,
    pub phone_number: Option<String>,
    pub batch_id: Option<i64>,
    pub buddy_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buddy_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: Option<i64>,
    pub name: String,
    pub start_month: Option<NaiveDate>,
    pub current_instructor: Option<String>,
    pub batch_type_id: Option<i64>,
    pub batch_type_name: Option<String>,
    #[serde(default)]
    pub class_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_month: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_instructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_type_id: Option<i64>,
    #[serde(default)]
    pub class_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: Option<i64>,
    pub name: String,
    pub date: Option<NaiveDate>,
    /// Wall-clock time as the backend formats it, e.g. `"10:00"`.
    pub time: Option<String>,
    pub instructor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentor {
    pub id: Option<i64>,
    pub name: String,
    pub current_company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorSession {
    pub id: Option<i64>,
    pub time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub student_id: Option<i64>,
    pub mentor_id: Option<i64>,
    pub student_rating: Option<i32>,
    pub mentor_rating: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorSessionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_rating: Option<i32>,
}

/// Category a batch belongs to. REST only; the backend broadcasts no
/// events for batch types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchType {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTypeInput {
    pub name: String,
}

macro_rules! impl_record {
    ($record:ty, $input:ty, $collection:expr) => {
        impl Record for $record {
            type Input = $input;
            const COLLECTION: Collection = $collection;

            fn id(&self) -> Option<i64> {
                self.id
            }
        }
    };
}

impl_record!(Student, StudentInput, Collection::Resource(ResourceKind::Students));
impl_record!(Batch, BatchInput, Collection::Resource(ResourceKind::Batches));
impl_record!(Class, ClassInput, Collection::Resource(ResourceKind::Classes));
impl_record!(Mentor, MentorInput, Collection::Resource(ResourceKind::Mentors));
impl_record!(
    MentorSession,
    MentorSessionInput,
    Collection::Resource(ResourceKind::MentorSessions)
);
impl_record!(BatchType, BatchTypeInput, Collection::BatchTypes);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn student_uses_camel_case_fields() {
        let student: Student = serde_json::from_value(json!({
            "id": 7,
            "name": "Ada",
            "email": "ada@example.com",
            "graduationYear": 2025,
            "batchId": 3
        }))
        .unwrap();

        assert_eq!(student.id(), Some(7));
        assert_eq!(student.graduation_year, Some(2025));
        assert_eq!(student.batch_id, Some(3));
        assert!(student.buddy_id.is_none());
    }

    #[test]
    fn input_omits_unset_optionals() {
        let input = StudentInput {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        };

        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value, json!({ "name": "Ada", "email": "ada@example.com" }));
    }

    #[test]
    fn batch_parses_dates_and_class_ids() {
        let batch: Batch = serde_json::from_value(json!({
            "id": 1,
            "name": "Spring cohort",
            "startMonth": "2024-03-01",
            "classIds": [4, 5]
        }))
        .unwrap();

        assert_eq!(batch.start_month, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(batch.class_ids, vec![4, 5]);
    }

    #[test]
    fn mentor_session_accepts_offset_timestamps() {
        let session: MentorSession = serde_json::from_value(json!({
            "id": 9,
            "time": "2024-05-01T10:00:00+02:00",
            "durationMinutes": 45
        }))
        .unwrap();

        assert_eq!(
            session.time.map(|t| t.to_rfc3339()),
            Some("2024-05-01T08:00:00+00:00".to_string())
        );
    }

    #[test]
    fn collections_match_rest_paths() {
        assert_eq!(Student::COLLECTION.rest_path(), "/students");
        assert_eq!(MentorSession::COLLECTION.rest_path(), "/mentor-sessions");
        assert_eq!(BatchType::COLLECTION.rest_path(), "/batch-types");
    }

    #[test]
    fn batch_type_tolerates_missing_name() {
        let batch_type: BatchType = serde_json::from_value(json!({ "id": 2 })).unwrap();
        assert_eq!(batch_type.id(), Some(2));
        assert!(batch_type.name.is_none());

        let input = BatchTypeInput {
            name: "Evening".to_string(),
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({ "name": "Evening" }));
    }
}
