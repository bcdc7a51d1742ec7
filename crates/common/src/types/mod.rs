use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Error body shared by every non-2xx JSON response.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}
