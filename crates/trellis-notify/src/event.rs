//! ActivityStreams 2.0 event construction (spec.md §4.9).

use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ActivityType {
    Create,
    Update,
    Delete,
}

impl ActivityType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// A single ActivityStreams 2.0 notification, as emitted on every successful
/// mutation (spec.md §4.9).
#[derive(Clone, Debug, Serialize)]
pub struct NotificationEvent {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: &'static str,
    pub actor: String,
    pub object: NotificationObject,
    pub published: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct NotificationObject {
    pub id: String,
    #[serde(rename = "type")]
    pub interaction_model_types: Vec<String>,
}

impl NotificationEvent {
    pub fn new(
        activity_type: ActivityType,
        actor: impl Into<String>,
        object_url: impl Into<String>,
        interaction_model_types: Vec<String>,
        published: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            context: "https://www.w3.org/ns/activitystreams",
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            activity_type: activity_type.as_str(),
            actor: actor.into(),
            object: NotificationObject { id: object_url.into(), interaction_model_types },
            published: published.to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_activitystreams_context_and_type() {
        let event = NotificationEvent::new(
            ActivityType::Create,
            "urn:trellis:anonymous",
            "http://example.org/res1",
            vec!["http://www.w3.org/ns/ldp#RDFSource".to_string()],
            chrono::Utc::now(),
        );
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"Create\""));
        assert!(json.contains("activitystreams"));
    }
}
