use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use axum_extra::TypedHeader;
use futures::stream::Stream;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    ChangeEvent, FeedError, FeedPageQuery, FeedTable, NewCommentRequest, NewPostRequest,
};
use crate::services::feed::FeedService;
use crate::services::stream::RealtimeHub;

fn map_feed_error(e: FeedError) -> AppError {
    match e {
        FeedError::NotFound => AppError::NotFound(e.to_string()),
        FeedError::ValidationError(msg) => AppError::ValidationError(msg),
        FeedError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_feed(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<FeedPageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = FeedService::new(&state);

    let activities = service.list_feed(query, auth.token()).await
        .map_err(map_feed_error)?;

    Ok(Json(json!({ "activities": activities })))
}

#[axum::debug_handler]
pub async fn create_post(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<NewPostRequest>,
) -> Result<Json<Value>, AppError> {
    let service = FeedService::new(&state);

    let activity = service.create_post(&user, request, auth.token()).await
        .map_err(map_feed_error)?;

    Ok(Json(json!({
        "success": true,
        "activity": activity
    })))
}

#[axum::debug_handler]
pub async fn toggle_like(
    State(state): State<Arc<AppConfig>>,
    Path(activity_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = FeedService::new(&state);

    let toggle = service.toggle_like(activity_id, &user, auth.token()).await
        .map_err(map_feed_error)?;

    Ok(Json(json!(toggle)))
}

#[axum::debug_handler]
pub async fn add_comment(
    State(state): State<Arc<AppConfig>>,
    Path(activity_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<NewCommentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = FeedService::new(&state);

    let comment = service.add_comment(activity_id, &user, request, auth.token()).await
        .map_err(map_feed_error)?;

    Ok(Json(json!({
        "success": true,
        "comment": comment
    })))
}

#[axum::debug_handler]
pub async fn list_comments(
    State(state): State<Arc<AppConfig>>,
    Path(activity_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = FeedService::new(&state);

    let comments = service.list_comments(activity_id, auth.token()).await
        .map_err(map_feed_error)?;

    Ok(Json(json!({ "comments": comments })))
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = FeedService::new(&state);

    let notifications = service.list_notifications(&user, auth.token()).await
        .map_err(map_feed_error)?;
    let unread = notifications.iter().filter(|n| !n.is_read).count();

    Ok(Json(json!({
        "notifications": notifications,
        "unread_count": unread
    })))
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub table: FeedTable,
    pub column: Option<String>,
    pub value: Option<String>,
}

/// Live change stream for one table, optionally narrowed by an equality
/// predicate, delivered as server-sent events. Disconnecting drops the
/// broadcast receiver, which unsubscribes the channel.
pub async fn stream_changes(
    Extension(hub): Extension<Arc<RealtimeHub>>,
    Query(params): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = match (params.column, params.value) {
        (Some(column), Some(value)) => Some((column, value)),
        _ => None,
    };

    let receiver = hub.subscribe(params.table, filter).await;

    let stream = futures::stream::unfold(receiver, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Ok(sse_event) = Event::default()
                        .event(event.table.to_string())
                        .json_data(&event)
                    {
                        return Some((Ok::<_, Infallible>(sse_event), rx));
                    }
                    // Unserializable event: skip it and keep the stream alive
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Change stream lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Ingest one change event from the backend's webhook and fan it out to
/// subscribers. Restricted to admin/service callers.
#[axum::debug_handler]
pub async fn ingest_change_event(
    Extension(hub): Extension<Arc<RealtimeHub>>,
    Extension(user): Extension<User>,
    Json(event): Json<ChangeEvent>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.role.as_deref() != Some("service_role") {
        return Err(AppError::Auth("Not authorized to publish change events".to_string()));
    }

    hub.publish(event).await;

    Ok(Json(json!({ "success": true })))
}
