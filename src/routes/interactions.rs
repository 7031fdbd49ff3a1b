use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequiredViewer,
    models::InteractionKind,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordInteractionRequest {
    pub content_id: Uuid,
    pub kind: InteractionKind,
}

/// Accepts an interaction for background processing
///
/// Returns as soon as the interaction is queued. Unknown content is a 404; a
/// failed lookup still queues the interaction and the writer retries it.
pub async fn record(
    State(state): State<AppState>,
    RequiredViewer(viewer_id): RequiredViewer,
    Json(request): Json<RecordInteractionRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let RecordInteractionRequest { content_id, kind } = request;

    match state.store.get_item(content_id).await {
        Ok(Some(item)) => state.recorder.record(viewer_id, &item, kind).await,
        Ok(None) => {
            return Err(AppError::NotFound(format!("content item {}", content_id)));
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                viewer_id = %viewer_id,
                content_id = %content_id,
                kind = %kind,
                "Content lookup failed, deferring to the interaction writer"
            );
            state
                .recorder
                .record_unresolved(viewer_id, content_id, kind)
                .await;
        }
    }

    tracing::info!(
        viewer_id = %viewer_id,
        content_id = %content_id,
        kind = %kind,
        "Interaction accepted"
    );

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;

    use super::*;
    use crate::{
        config::RankingConfig,
        db::MockContentStore,
        routes::create_router,
        services::NoopAnalyzer,
    };

    fn failing_store() -> MockContentStore {
        let mut store = MockContentStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_get_item()
            .returning(|_| Err(AppError::Internal("store down".to_string())));
        store.expect_insert_interaction().returning(|_| Ok(()));
        store.expect_increment_counter().returning(|_, _, _| Ok(()));
        store
    }

    async fn post_interaction(
        server: &TestServer,
        viewer_id: Uuid,
        content_id: Uuid,
        kind: &str,
    ) -> axum_test::TestResponse {
        server
            .post("/api/v1/interactions")
            .add_header(
                HeaderName::from_static("x-viewer-id"),
                HeaderValue::from_str(&viewer_id.to_string()).unwrap(),
            )
            .json(&json!({ "content_id": content_id, "kind": kind }))
            .await
    }

    #[tokio::test]
    async fn test_hide_survives_store_outage() {
        let (state, handle) = AppState::new(
            Arc::new(failing_store()),
            Arc::new(NoopAnalyzer),
            RankingConfig::default(),
        );
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let viewer = Uuid::new_v4();
        let content = Uuid::new_v4();

        let response = post_interaction(&server, viewer, content, "hide").await;
        response.assert_status(StatusCode::ACCEPTED);
        assert_eq!(state.sessions().hidden_for(viewer).await, vec![content]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_like_is_queued_during_store_outage() {
        let mut store = MockContentStore::new();
        store.expect_name().return_const("mock");
        store
            .expect_get_item()
            .returning(|_| Err(AppError::Internal("store down".to_string())));
        store
            .expect_insert_interaction()
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_increment_counter()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (state, handle) = AppState::new(
            Arc::new(store),
            Arc::new(NoopAnalyzer),
            RankingConfig::default(),
        );
        let server = TestServer::new(create_router(state)).unwrap();

        let response = post_interaction(&server, Uuid::new_v4(), Uuid::new_v4(), "like").await;
        response.assert_status(StatusCode::ACCEPTED);

        handle.shutdown().await;
    }
}
