use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::non_empty;
use crate::models::push_subscription::PushSubscriptionView;
use crate::repository::NewSubscription;
use crate::routes::Deleted;
use crate::services::auth_guard::AuthUser;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub endpoint: Option<String>,
    pub p256dh: Option<String>,
    pub auth: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UnsubscribeRequest {
    pub endpoint: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct SubscriptionResponse {
    pub subscription: PushSubscriptionView,
}

#[post("/", format = "json", data = "<body>")]
async fn subscribe(
    repos: &State<Repositories>,
    user: AuthUser,
    body: Json<SubscribeRequest>,
) -> ApiResult<(Status, Json<SubscriptionResponse>)> {
    let body = body.into_inner();
    let (Some(endpoint), Some(p256dh), Some(auth)) = (
        non_empty(&body.endpoint),
        non_empty(&body.p256dh),
        non_empty(&body.auth),
    ) else {
        return Err(ApiError::bad_request("endpoint, p256dh, and auth are required"));
    };

    let subscription = repos
        .push_subscriptions
        .upsert(NewSubscription {
            user_id: user.id,
            endpoint,
            p256dh,
            auth,
            user_agent: non_empty(&body.user_agent),
        })
        .await?
        .ok_or_else(|| ApiError::Internal("push subscription upsert returned nothing".into()))?;

    debug!(user_id = %user.id, "push subscription stored");
    Ok((
        Status::Created,
        Json(SubscriptionResponse {
            subscription: PushSubscriptionView::from(&subscription),
        }),
    ))
}

#[delete("/", format = "json", data = "<body>")]
async fn unsubscribe(
    repos: &State<Repositories>,
    user: AuthUser,
    body: Json<UnsubscribeRequest>,
) -> ApiResult<Json<Deleted>> {
    let body = body.into_inner();
    let endpoint =
        non_empty(&body.endpoint).ok_or_else(|| ApiError::bad_request("endpoint is required"))?;
    let deleted = repos.push_subscriptions.delete(endpoint, user.id).await?;
    Ok(Json(Deleted { deleted }))
}

pub fn routes() -> Vec<Route> {
    routes![subscribe, unsubscribe]
}
