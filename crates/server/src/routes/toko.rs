use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use service::toko::Toko;
use tracing::info;
use utoipa::IntoParams;

use super::AppState;
use crate::errors::ApiError;

pub const MESSAGE_HEADER: &str = "x-message";

/// Raw query values; parsed by hand so that garbage and absence get the same 400.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    /// User latitude in decimal degrees
    pub latitude: Option<String>,
    /// User longitude in decimal degrees
    pub longitude: Option<String>,
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

/// Human-readable outcome carried next to the JSON body.
fn message(text: &str) -> [(HeaderName, HeaderValue); 1] {
    let visible: String = text.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect();
    let value = HeaderValue::from_str(&visible).unwrap_or_else(|_| HeaderValue::from_static("OK"));
    [(HeaderName::from_static(MESSAGE_HEADER), value)]
}

#[utoipa::path(
    get, path = "/toko/dekat", tag = "toko",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Stores within the search radius, in collection order", body = [crate::openapi::TokoDoc]),
        (status = 400, description = "Latitude or longitude missing or not a number", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn nearby(
    State(state): State<AppState>,
    Query(q): Query<NearbyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let latitude = parse_coordinate(q.latitude.as_deref());
    let longitude = parse_coordinate(q.longitude.as_deref());
    if latitude.is_none() || longitude.is_none() {
        return Err(ApiError::BadRequest("Latitude and longitude are required".into()));
    }
    let stores = state.toko.find_nearby(latitude, longitude).await?;
    info!(count = stores.len(), radius_km = state.toko.radius_km(), "nearby stores");
    let text = format!("Berhasil mendapatkan {} toko terdekat dari anda", stores.len());
    Ok((StatusCode::OK, message(&text), Json(stores)))
}

#[utoipa::path(
    get, path = "/toko", tag = "toko",
    responses((status = 200, description = "Every store; position in the array is its index", body = [crate::openapi::TokoDoc]))
)]
pub async fn list(State(state): State<AppState>) -> Json<Vec<Toko>> {
    Json(state.toko.list().await)
}

#[utoipa::path(
    get, path = "/toko/{index}", tag = "toko",
    params(("index" = i64, Path, description = "0-based position; shifts when earlier stores are deleted")),
    responses(
        (status = 200, description = "Store at index", body = crate::openapi::TokoDoc),
        (status = 404, description = "Index out of range", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(
    State(state): State<AppState>,
    index: Result<Path<i64>, PathRejection>,
) -> Result<Json<Toko>, ApiError> {
    let Path(index) = index?;
    Ok(Json(state.toko.get(index).await?))
}

#[utoipa::path(
    post, path = "/toko", tag = "toko",
    request_body = crate::openapi::TokoDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::TokoDoc),
        (status = 400, description = "Body is not a valid store", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Backing document could not be written", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Toko>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(toko) = payload?;
    let created = state.toko.create(toko).await?;
    info!(nama_toko = created.nama_toko().unwrap_or_default(), "created store");
    Ok((StatusCode::CREATED, message("Berhasil menambahkan toko baru"), Json(created)))
}

#[utoipa::path(
    put, path = "/toko/{index}", tag = "toko",
    params(("index" = i64, Path, description = "0-based position")),
    request_body = crate::openapi::TokoDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::TokoDoc),
        (status = 400, description = "Body is not a valid store", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Index out of range", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Backing document could not be written", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    index: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Toko>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(index) = index?;
    let Json(toko) = payload?;
    let updated = state.toko.update(index, toko).await?;
    let name = updated.nama_toko().unwrap_or_default();
    info!(index, nama_toko = name, "updated store");
    let text = format!("Berhasil memperbaharui toko {name}");
    Ok((StatusCode::OK, message(&text), Json(updated)))
}

#[utoipa::path(
    delete, path = "/toko/{index}", tag = "toko",
    params(("index" = i64, Path, description = "0-based position; later stores move down by one")),
    responses(
        (status = 200, description = "Removed store", body = crate::openapi::TokoDoc),
        (status = 404, description = "Index out of range", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Backing document could not be written", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    index: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(index) = index?;
    let removed = state.toko.delete(index).await?;
    info!(index, nama_toko = removed.nama_toko().unwrap_or_default(), "deleted store");
    Ok((StatusCode::OK, message("Berhasil menghapus toko"), Json(removed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_parse_leniently() {
        assert_eq!(parse_coordinate(Some(" -6.21 ")), Some(-6.21));
        assert_eq!(parse_coordinate(Some("106")), Some(106.0));
        assert_eq!(parse_coordinate(Some("abc")), None);
        assert_eq!(parse_coordinate(Some("")), None);
        assert_eq!(parse_coordinate(None), None);
    }

    #[test]
    fn message_header_drops_non_ascii() {
        let [(name, value)] = message("Berhasil memperbaharui toko Kopi Kenangan ☕");
        assert_eq!(name.as_str(), MESSAGE_HEADER);
        assert_eq!(value.to_str().unwrap(), "Berhasil memperbaharui toko Kopi Kenangan ");
    }
}
