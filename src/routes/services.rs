use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};

use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::models::service::{Service, ServiceChanges, ServicePatch, ServiceView};
use crate::models::{non_empty, parse_object_id};
use crate::routes::{Deleted, SalonQuery};
use crate::services::auth_guard::AuthUser;

#[derive(Serialize, Debug)]
pub struct ServiceResponse {
    pub service: ServiceView,
}

#[derive(Serialize, Debug)]
pub struct ServiceList {
    pub services: Vec<ServiceView>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRequest {
    pub salon_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<i32>,
    pub description: Option<String>,
}

async fn owned_service(repos: &Repositories, auth: &AuthUser, id: &str) -> ApiResult<Service> {
    let id = parse_object_id(id, "service id")?;
    let service = repos
        .services
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    auth.ensure_salon_owner(service.salon_id)?;
    Ok(service)
}

#[get("/?<query..>")]
async fn list(repos: &State<Repositories>, query: SalonQuery<'_>) -> ApiResult<Json<ServiceList>> {
    let salon_id = query.required_salon()?;
    let services = repos.services.list_active(salon_id).await?;
    Ok(Json(ServiceList {
        services: services.iter().map(ServiceView::from).collect(),
    }))
}

#[get("/<id>")]
async fn get(repos: &State<Repositories>, id: &str) -> ApiResult<Json<ServiceResponse>> {
    let id = parse_object_id(id, "service id")?;
    let service = repos
        .services
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(Json(ServiceResponse {
        service: ServiceView::from(&service),
    }))
}

#[post("/", format = "json", data = "<body>")]
async fn create(
    repos: &State<Repositories>,
    auth: AuthUser,
    body: Json<NewServiceRequest>,
) -> ApiResult<(Status, Json<ServiceResponse>)> {
    let body = body.into_inner();
    let (Some(salon_id), Some(name), Some(price), Some(duration)) =
        (non_empty(&body.salon_id), non_empty(&body.name), body.price, body.duration)
    else {
        return Err(ApiError::bad_request(
            "salonId, name, price, and duration are required",
        ));
    };
    if price < 0.0 || duration <= 0 {
        return Err(ApiError::bad_request(
            "price must not be negative and duration must be positive",
        ));
    }
    let salon_id = parse_object_id(salon_id, "salonId")?;
    auth.ensure_salon_owner(salon_id)?;

    let service = Service::new(salon_id, name, price, duration, body.description);
    repos.services.insert(&service).await?;
    Ok((
        Status::Created,
        Json(ServiceResponse {
            service: ServiceView::from(&service),
        }),
    ))
}

#[patch("/<id>", format = "json", data = "<body>")]
async fn update(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
    body: Json<ServicePatch>,
) -> ApiResult<Json<ServiceResponse>> {
    let changes = ServiceChanges::try_from(body.into_inner())?;
    let service = owned_service(repos, &auth, id).await?;
    let changes = bson::to_document(&changes)?;
    let service = repos
        .services
        .update(service.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(Json(ServiceResponse {
        service: ServiceView::from(&service),
    }))
}

#[delete("/<id>")]
async fn deactivate(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
) -> ApiResult<Json<ServiceResponse>> {
    let service = owned_service(repos, &auth, id).await?;
    let service = repos
        .services
        .deactivate(service.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(Json(ServiceResponse {
        service: ServiceView::from(&service),
    }))
}

#[delete("/<id>/hard")]
async fn hard_delete(
    repos: &State<Repositories>,
    auth: AuthUser,
    id: &str,
) -> ApiResult<Json<Deleted>> {
    let service = owned_service(repos, &auth, id).await?;
    if !repos.services.delete(service.id).await? {
        return Err(ApiError::not_found("Service not found"));
    }
    Ok(Json(Deleted::yes()))
}

pub fn routes() -> Vec<Route> {
    routes![list, get, create, update, deactivate, hard_delete]
}
