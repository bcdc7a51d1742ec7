use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// A store record. Fields beyond these three are accepted and returned unchanged.
#[derive(ToSchema)]
pub struct TokoDoc {
    #[schema(example = "Apotek Sehat")]
    pub nama_toko: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(ToSchema)]
pub struct ErrorDoc {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::toko::nearby,
        crate::routes::toko::list,
        crate::routes::toko::get,
        crate::routes::toko::create,
        crate::routes::toko::update,
        crate::routes::toko::delete,
    ),
    components(
        schemas(
            HealthResponse,
            TokoDoc,
            ErrorDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "toko", description = "Stores addressed by 0-based position")
    )
)]
pub struct ApiDoc;
