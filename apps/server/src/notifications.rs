//! Builds and dispatches the ActivityStreams 2.0 notification for a
//! completed mutation (spec.md §4.9). Emission is fire-and-forget: handlers
//! call `notify` after the storage commit has already succeeded, and a
//! failure here must never turn a successful write into an error response.

use trellis_notify::{ActivityType, NotificationEmitter, NotificationEvent};
use trellis_rdf::Iri;

pub async fn notify(
    emitter: &dyn NotificationEmitter,
    activity_type: ActivityType,
    actor: Option<&Iri>,
    object_url: &str,
    interaction_model: &Iri,
) {
    let actor = actor.map(|iri| iri.as_str().to_string()).unwrap_or_else(|| "urn:trellis:anonymous".to_string());
    let event = NotificationEvent::new(
        activity_type,
        actor,
        object_url.to_string(),
        vec![interaction_model.as_str().to_string()],
        chrono::Utc::now(),
    );
    emitter.emit(event).await;
}
