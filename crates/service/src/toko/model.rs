use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ServiceError;
use crate::geo::Coordinates;

pub const FIELD_NAME: &str = "nama_toko";
pub const FIELD_LATITUDE: &str = "latitude";
pub const FIELD_LONGITUDE: &str = "longitude";

/// A store record: a JSON object that must carry `nama_toko`, `latitude` and
/// `longitude`. Every other field is kept verbatim, including its position
/// and numeric representation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Toko(Map<String, Value>);

impl Toko {
    pub fn new(nama_toko: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self::default()
            .with_field(FIELD_NAME, Value::String(nama_toko.into()))
            .with_field(FIELD_LATITUDE, Value::from(latitude))
            .with_field(FIELD_LONGITUDE, Value::from(longitude))
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn nama_toko(&self) -> Option<&str> {
        self.0.get(FIELD_NAME).and_then(Value::as_str)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.0.get(FIELD_LATITUDE).and_then(Value::as_f64)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.0.get(FIELD_LONGITUDE).and_then(Value::as_f64)
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude()?, self.longitude()?))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check the fields the nearby query depends on.
    pub fn validate(&self) -> Result<(), ServiceError> {
        match self.0.get(FIELD_NAME) {
            Some(Value::String(name)) if !name.trim().is_empty() => {}
            Some(Value::String(_)) => return Err(ServiceError::Validation("nama_toko must not be empty".into())),
            Some(_) => return Err(ServiceError::Validation("nama_toko must be a string".into())),
            None => return Err(ServiceError::Validation("nama_toko is required".into())),
        }
        let latitude = self.numeric(FIELD_LATITUDE)?;
        let longitude = self.numeric(FIELD_LONGITUDE)?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ServiceError::Validation(format!("latitude {latitude} is outside -90..90")));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ServiceError::Validation(format!("longitude {longitude} is outside -180..180")));
        }
        Ok(())
    }

    fn numeric(&self, key: &str) -> Result<f64, ServiceError> {
        match self.0.get(key) {
            None => Err(ServiceError::Validation(format!("{key} is required"))),
            Some(v) => v
                .as_f64()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ServiceError::Validation(format!("{key} must be a number"))),
        }
    }
}
