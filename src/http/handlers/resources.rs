//! Generic CRUD forwarding for the back-office entities.

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::auth::Session;
use crate::http::error::ApiError;
use crate::http::request::{resource_id, ApiJson};
use crate::http::server::AppState;
use crate::models::{
    Customer, CustomerInput, FinanceCompany, FinanceCompanyInput, ManualBill, ManualBillInput,
    Purchase, PurchaseInput, Sale, Vehicle, VehicleInput,
};
use crate::normalize::{extract_id, normalize_many, normalize_one, FromUpstream};
use crate::upstream::{Call, UpstreamClient};
use crate::validation::{FieldError, ValidationContext};

/// An entity exposed under `/api/{NAME}` and stored at `UPSTREAM_PATH`.
pub trait Resource: FromUpstream + Serialize + Send + 'static {
    const NAME: &'static str;
    const UPSTREAM_PATH: &'static str;

    fn id(&self) -> &str;
}

/// A resource the browser can create (and optionally update).
pub trait Writable: Resource {
    type Input: DeserializeOwned + Send + 'static;

    fn to_upstream(input: Self::Input, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>>;
}

macro_rules! resource {
    ($ty:ty, $name:literal, $path:literal) => {
        impl Resource for $ty {
            const NAME: &'static str = $name;
            const UPSTREAM_PATH: &'static str = $path;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

resource!(Customer, "customers", "/customers");
resource!(Purchase, "purchases", "/purchases");
resource!(Vehicle, "vehicles", "/vehicles");
resource!(FinanceCompany, "finance-companies", "/finance-companies");
resource!(ManualBill, "manual-bills", "/manual-bills");
resource!(Sale, "sales", "/sales");

impl Writable for Customer {
    type Input = CustomerInput;

    fn to_upstream(input: CustomerInput, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        input.into_upstream(ctx)
    }
}

impl Writable for Purchase {
    type Input = PurchaseInput;

    fn to_upstream(input: PurchaseInput, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        input.into_upstream(ctx)
    }
}

impl Writable for Vehicle {
    type Input = VehicleInput;

    fn to_upstream(input: VehicleInput, _ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        input.into_upstream()
    }
}

impl Writable for FinanceCompany {
    type Input = FinanceCompanyInput;

    fn to_upstream(input: FinanceCompanyInput, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        input.into_upstream(ctx)
    }
}

impl Writable for ManualBill {
    type Input = ManualBillInput;

    fn to_upstream(input: ManualBillInput, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        input.into_upstream(ctx)
    }
}

pub(crate) fn item_path<R: Resource>(id: &str) -> String {
    format!("{}/{}", R::UPSTREAM_PATH, id)
}

/// Read one record by id and normalize it.
pub(crate) async fn fetch_one<R: Resource>(
    client: &UpstreamClient,
    session: &Session,
    id: &str,
) -> Result<R, ApiError> {
    let path = item_path::<R>(id);
    let response = client
        .send_json(Call::get(&path).token(session.token()).request_id(session.request_id()))
        .await?;
    if response.body.is_null() {
        return Err(ApiError::NotFound(R::ENTITY.to_string()));
    }
    Ok(normalize_one(&response.body)?)
}

/// The entity a write returned, or a fresh read when the body only carries
/// an id (or nothing, for updates).
pub(crate) async fn written<R: Resource>(
    client: &UpstreamClient,
    session: &Session,
    body: &Value,
    known_id: Option<&str>,
) -> Result<R, ApiError> {
    if let Ok(entity) = normalize_one::<R>(body) {
        return Ok(entity);
    }
    let id = extract_id(body)
        .or_else(|| known_id.map(str::to_string))
        .ok_or_else(|| {
            crate::upstream::UpstreamError::Malformed(format!(
                "{} write response carried no identifier",
                R::ENTITY
            ))
        })?;
    fetch_one::<R>(client, session, resource_id(&id)?).await
}

/// 201 with `Location` pointing at the new resource.
pub(crate) fn created<R: Resource>(session: &Session, entity: R) -> Response {
    let location = session.meta.link(&format!("/api/{}/{}", R::NAME, entity.id()));
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(entity),
    )
        .into_response()
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<R>>, ApiError> {
    let runtime = state.snapshot();
    let call = Call::get(R::UPSTREAM_PATH)
        .query(query.as_deref())
        .token(session.token())
        .request_id(session.request_id());
    let response = runtime.upstream.send_json(call).await?;
    Ok(Json(normalize_many(response.body)?))
}

pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<R>, ApiError> {
    let runtime = state.snapshot();
    let entity = fetch_one::<R>(&runtime.upstream, &session, resource_id(&id)?).await?;
    Ok(Json(entity))
}

pub async fn create<R: Writable>(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<R::Input>,
) -> Result<Response, ApiError> {
    let runtime = state.snapshot();
    let body = R::to_upstream(input, &runtime.validation)?;
    let call = Call::post(R::UPSTREAM_PATH, &body)
        .token(session.token())
        .request_id(session.request_id());
    let response = runtime.upstream.send_json(call).await?;

    if response.body.is_null() {
        tracing::info!(entity = R::ENTITY, "Upstream accepted create without a body");
        return Ok((StatusCode::ACCEPTED, Json(json!({ "accepted": true }))).into_response());
    }
    let entity = written::<R>(&runtime.upstream, &session, &response.body, None).await?;
    tracing::info!(entity = R::ENTITY, id = entity.id(), "Created");
    Ok(created(&session, entity))
}

pub async fn update<R: Writable>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<R::Input>,
) -> Result<Json<R>, ApiError> {
    let id = resource_id(&id)?;
    let runtime = state.snapshot();
    let body = R::to_upstream(input, &runtime.validation)?;
    let path = item_path::<R>(id);
    let call = Call::put(&path, &body)
        .token(session.token())
        .request_id(session.request_id());
    let response = runtime.upstream.send_json(call).await?;
    let entity = written::<R>(&runtime.upstream, &session, &response.body, Some(id)).await?;
    Ok(Json(entity))
}

pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let runtime = state.snapshot();
    let path = item_path::<R>(resource_id(&id)?);
    runtime
        .upstream
        .send_json(Call::delete(&path).token(session.token()).request_id(session.request_id()))
        .await?;
    tracing::info!(entity = R::ENTITY, id = %id, "Deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// list/get/create/delete, plus PUT when `updatable`.
pub fn routes<R: Writable>(updatable: bool) -> Router<AppState> {
    let mut item = get(get_one::<R>).delete(remove::<R>);
    if updatable {
        item = item.put(update::<R>);
    }
    Router::new()
        .route(&format!("/api/{}", R::NAME), get(list::<R>).post(create::<R>))
        .route(&format!("/api/{}/{{id}}", R::NAME), item)
}
