use std::sync::Arc;

use common::metrics::{NEARBY_QUERIES_TOTAL, NEARBY_QUERY_DURATION};
use tracing::{debug, instrument, warn};

use crate::errors::ServiceError;
use crate::geo::{geodesic_distance_km, Coordinates};
use crate::toko::{Toko, TokoCollection};

pub const DEFAULT_RADIUS_KM: f64 = 3.0;

/// Application service over the store collection: validated writes and the
/// nearby query.
pub struct TokoService {
    collection: Arc<TokoCollection>,
    radius_km: f64,
}

impl TokoService {
    pub fn new(collection: Arc<TokoCollection>) -> Self {
        Self::with_radius(collection, DEFAULT_RADIUS_KM)
    }

    pub fn with_radius(collection: Arc<TokoCollection>, radius_km: f64) -> Self {
        Self { collection, radius_km }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub async fn list(&self) -> Vec<Toko> {
        self.collection.all().await
    }

    pub async fn get(&self, index: i64) -> Result<Toko, ServiceError> {
        self.collection.get(index).await
    }

    pub async fn create(&self, record: Toko) -> Result<Toko, ServiceError> {
        record.validate()?;
        self.collection.append(record).await
    }

    /// An unknown index is reported before anything is said about the body.
    pub async fn update(&self, index: i64, record: Toko) -> Result<Toko, ServiceError> {
        self.collection.check_index(index).await?;
        record.validate()?;
        self.collection.replace_at(index, record).await
    }

    pub async fn delete(&self, index: i64) -> Result<Toko, ServiceError> {
        self.collection.remove_at(index).await
    }

    /// Stores within the configured radius of the user, in collection order.
    pub async fn find_nearby(&self, latitude: Option<f64>, longitude: Option<f64>) -> Result<Vec<Toko>, ServiceError> {
        self.find_nearby_within(latitude, longitude, self.radius_km).await
    }

    /// Stores whose geodesic distance from the user is `<= radius_km`.
    /// Records without usable coordinates are skipped.
    #[instrument(skip(self))]
    pub async fn find_nearby_within(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: f64,
    ) -> Result<Vec<Toko>, ServiceError> {
        let user = user_position(latitude, longitude)?;
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ServiceError::Validation(format!("radius {radius_km} must be a non-negative number")));
        }
        let _timer = NEARBY_QUERY_DURATION.start_timer();
        NEARBY_QUERIES_TOTAL.inc();

        let snapshot = self.collection.all().await;
        let total = snapshot.len();
        let nearby: Vec<Toko> = snapshot
            .into_iter()
            .enumerate()
            .filter_map(|(index, toko)| {
                let Some(position) = toko.coordinates().filter(Coordinates::is_valid) else {
                    warn!(index, "store has no usable coordinates; skipped");
                    return None;
                };
                let distance_km = geodesic_distance_km(user, position);
                debug!(index, distance_km, "distance computed");
                (distance_km <= radius_km).then_some(toko)
            })
            .collect();
        debug!(total, matched = nearby.len(), "nearby query finished");
        Ok(nearby)
    }
}

fn user_position(latitude: Option<f64>, longitude: Option<f64>) -> Result<Coordinates, ServiceError> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(ServiceError::Validation("Latitude and longitude are required".into()));
    };
    let user = Coordinates::new(latitude, longitude);
    if !user.is_valid() {
        return Err(ServiceError::Validation(format!(
            "coordinates ({latitude}, {longitude}) are not a valid position"
        )));
    }
    Ok(user)
}
