use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::{decode, encode, DocumentStore};
use crate::errors::ServiceError;
use crate::toko::Toko;

/// Backing document stored as one object in a Google Cloud Storage bucket,
/// accessed through the JSON API (`alt=media` download, `uploadType=media` upload).
///
/// Credentials are a pre-minted bearer token; acquiring one is left to the
/// deployment.
#[derive(Debug, Clone)]
pub struct GcsDocumentStore {
    client: Client,
    endpoint: Url,
    bucket: String,
    object: String,
    access_token: Option<String>,
}

impl GcsDocumentStore {
    pub fn new(
        endpoint: &str,
        bucket: &str,
        object: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ServiceError::Validation(format!("invalid storage endpoint {endpoint}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(ServiceError::Validation(format!("storage endpoint {endpoint} cannot carry a path")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(ServiceError::persistence)?;
        Ok(Self {
            client,
            endpoint,
            bucket: bucket.to_string(),
            object: object.to_string(),
            access_token,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Validation("storage endpoint cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn download_url(&self) -> Result<Url, ServiceError> {
        let mut url = self.url(&["storage", "v1", "b", &self.bucket, "o", &self.object])?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    fn upload_url(&self) -> Result<Url, ServiceError> {
        let mut url = self.url(&["upload", "storage", "v1", "b", &self.bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &self.object);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

async fn failure(op: &str, target: &str, resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    ServiceError::Persistence(format!("{op} {target} returned {status}: {}", body.trim()))
}

#[async_trait]
impl DocumentStore for GcsDocumentStore {
    async fn load(&self) -> Result<Vec<Toko>, ServiceError> {
        let url = self.download_url()?;
        debug!(%url, "downloading backing document");
        let resp = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| ServiceError::Persistence(format!("download {}: {e}", self.describe())))?;
        match resp.status() {
            s if s.is_success() => {
                let bytes = resp.bytes().await.map_err(ServiceError::persistence)?;
                decode(&bytes)
            }
            StatusCode::NOT_FOUND => Err(ServiceError::NotFound(format!("{} does not exist", self.describe()))),
            _ => Err(failure("download", &self.describe(), resp).await),
        }
    }

    async fn save(&self, records: &[Toko]) -> Result<(), ServiceError> {
        let url = self.upload_url()?;
        let body = encode(records)?;
        debug!(%url, bytes = body.len(), "uploading backing document");
        let resp = self
            .authorize(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::Persistence(format!("upload {}: {e}", self.describe())))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(failure("upload", &self.describe(), resp).await)
        }
    }

    fn describe(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::Bytes;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode as HttpStatus};
    use axum::routing::{get, post};
    use axum::Router;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::*;

    const TOKEN: &str = "test-token";

    type Objects = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v == format!("Bearer {TOKEN}"))
    }

    async fn download(
        State(objects): State<Objects>,
        Path((bucket, object)): Path<(String, String)>,
        Query(q): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Result<Vec<u8>, HttpStatus> {
        if !authorized(&headers) {
            return Err(HttpStatus::UNAUTHORIZED);
        }
        if q.get("alt").map(String::as_str) != Some("media") {
            return Err(HttpStatus::BAD_REQUEST);
        }
        let objects = objects.lock().await;
        objects.get(&format!("{bucket}/{object}")).cloned().ok_or(HttpStatus::NOT_FOUND)
    }

    async fn upload(
        State(objects): State<Objects>,
        Path(bucket): Path<String>,
        Query(q): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> HttpStatus {
        if !authorized(&headers) {
            return HttpStatus::UNAUTHORIZED;
        }
        let (Some("media"), Some(name)) = (q.get("uploadType").map(String::as_str), q.get("name")) else {
            return HttpStatus::BAD_REQUEST;
        };
        objects.lock().await.insert(format!("{bucket}/{name}"), body.to_vec());
        HttpStatus::OK
    }

    async fn start_stub() -> anyhow::Result<(String, Objects)> {
        let objects: Objects = Arc::new(Mutex::new(HashMap::new()));
        let app = Router::new()
            .route("/storage/v1/b/:bucket/o/:object", get(download))
            .route("/upload/storage/v1/b/:bucket/o", post(upload))
            .with_state(objects.clone());
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("stub server error: {e}");
            }
        });
        Ok((format!("http://{addr}"), objects))
    }

    fn store(endpoint: &str, token: Option<&str>) -> GcsDocumentStore {
        GcsDocumentStore::new(endpoint, "toko-bucket", "data/toko.json", token.map(str::to_string), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn save_then_load_through_json_api() -> anyhow::Result<()> {
        let (endpoint, objects) = start_stub().await?;
        let gcs = store(&endpoint, Some(TOKEN));

        assert!(matches!(gcs.load().await, Err(ServiceError::NotFound(_))));

        let records = vec![Toko::new("A", -6.2, 106.816), Toko::new("B", 1.0, 1.0)];
        gcs.save(&records).await?;
        // object names with '/' travel as a single encoded path segment
        assert!(objects.lock().await.contains_key("toko-bucket/data/toko.json"));
        assert_eq!(gcs.load().await?, records);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_persistence_error() -> anyhow::Result<()> {
        let (endpoint, _objects) = start_stub().await?;
        let gcs = store(&endpoint, None);
        let err = gcs.save(&[Toko::new("A", 0.0, 0.0)]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(ref m) if m.contains("401")), "{err}");
        assert!(matches!(gcs.load().await, Err(ServiceError::Persistence(_))));
        Ok(())
    }

    #[tokio::test]
    async fn garbage_object_is_deserialization_error() -> anyhow::Result<()> {
        let (endpoint, objects) = start_stub().await?;
        objects.lock().await.insert("toko-bucket/data/toko.json".into(), b"{oops".to_vec());
        let gcs = store(&endpoint, Some(TOKEN));
        assert!(matches!(gcs.load().await, Err(ServiceError::Deserialization(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_persistence_error() {
        // port 9 (discard) on localhost is expected to refuse connections
        let gcs = store("http://127.0.0.1:9", Some(TOKEN));
        assert!(matches!(gcs.load().await, Err(ServiceError::Persistence(_))));
    }

    #[test]
    fn urls_follow_json_api_layout() {
        let gcs = store("https://storage.googleapis.com/", None);
        assert_eq!(
            gcs.download_url().unwrap().as_str(),
            "https://storage.googleapis.com/storage/v1/b/toko-bucket/o/data%2Ftoko.json?alt=media"
        );
        assert_eq!(
            gcs.upload_url().unwrap().as_str(),
            "https://storage.googleapis.com/upload/storage/v1/b/toko-bucket/o?uploadType=media&name=data%2Ftoko.json"
        );
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let err = GcsDocumentStore::new("not a url", "b", "o", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
