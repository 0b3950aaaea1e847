//! Notification polling endpoints.
//!
//! The hub is session-scoped and in-memory; the UI polls rather than
//! holding a push channel.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Notification;

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

/// `GET /api/notifications` — current buffer, newest last.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<NotificationsResponse>, ApiError> {
    let notifications = ctx.core.notifications.entries();
    let unread = ctx.core.notifications.unread_count();
    Ok(Json(NotificationsResponse { notifications, unread }))
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub unread: usize,
}

/// `POST /api/notifications/read` — mark everything read.
pub async fn mark_read(State(ctx): State<ApiContext>) -> Result<Json<MarkReadResponse>, ApiError> {
    ctx.core.notifications.mark_all_read();
    Ok(Json(MarkReadResponse {
        unread: ctx.core.notifications.unread_count(),
    }))
}
