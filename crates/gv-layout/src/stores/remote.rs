//! Layout service client
//!
//! Endpoints, relative to the service base URL:
//!
//! | Operation | Request                                   |
//! |-----------|-------------------------------------------|
//! | list      | `GET    /api/GridLayout/{tableId}`        |
//! | add       | `POST   /api/GridLayout`                  |
//! | update    | `PUT    /api/GridLayout/{layoutId}`       |
//! | rename    | `PUT    /api/GridLayout/{layoutId}/name`  |
//! | delete    | `DELETE /api/GridLayout/{layoutId}`       |
//! | export    | `POST   /api/GridLayout/ExportExcelData`  |

use std::time::Duration;

use async_trait::async_trait;
use gv_core::{ExportRequest, Layout};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;

use crate::{LayoutError, LayoutStore, NewLayout, Result, StoredLayout};

const API_ROOT: &[&str] = &["api", "GridLayout"];
const EXPORT_ENDPOINT: &str = "ExportExcelData";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct ServiceClient {
    http: Client,
    base: Url,
}

impl ServiceClient {
    fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| LayoutError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(LayoutError::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LayoutError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(API_ROOT.iter().copied().chain(segments.iter().copied()));
        Ok(url)
    }

    /// Turn non-success responses into errors
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(LayoutError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Serialize)]
struct RenameBody<'a> {
    #[serde(rename = "layoutName")]
    layout_name: &'a str,
}

/// Layouts kept by the layout service
#[derive(Debug, Clone)]
pub struct RemoteLayoutStore {
    client: ServiceClient,
}

impl RemoteLayoutStore {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: ServiceClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl LayoutStore for RemoteLayoutStore {
    async fn get_layouts(&self, table_id: &str) -> Result<Vec<StoredLayout>> {
        let url = self.client.endpoint(&[table_id])?;
        let response = ServiceClient::check(self.client.http.get(url).send().await?).await?;
        let mut layouts: Vec<StoredLayout> = response.json().await?;
        layouts.sort_by_key(|l| l.layout_id);
        tracing::debug!("Fetched {} layouts for table '{}'", layouts.len(), table_id);
        Ok(layouts)
    }

    async fn add_layout(&self, draft: NewLayout) -> Result<StoredLayout> {
        let url = self.client.endpoint(&[])?;
        let response = self.client.http.post(url).json(&draft).send().await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(LayoutError::NameTaken(draft.layout_name));
        }
        Ok(ServiceClient::check(response).await?.json().await?)
    }

    async fn update_layout(&self, stored: &StoredLayout, layout: &Layout) -> Result<StoredLayout> {
        let mut updated = stored.clone();
        updated.grid_layout_json = layout.to_json()?;

        let id = stored.layout_id.to_string();
        let url = self.client.endpoint(&[&id])?;
        let response = self.client.http.put(url).json(&updated).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(LayoutError::NotFound(stored.layout_id));
        }
        ServiceClient::check(response).await?;
        Ok(updated)
    }

    async fn rename_layout(&self, stored: &StoredLayout, new_name: &str) -> Result<StoredLayout> {
        let id = stored.layout_id.to_string();
        let url = self.client.endpoint(&[&id, "name"])?;
        let response = self
            .client
            .http
            .put(url)
            .json(&RenameBody { layout_name: new_name })
            .send()
            .await?;
        match response.status() {
            StatusCode::CONFLICT => return Err(LayoutError::NameTaken(new_name.to_string())),
            StatusCode::NOT_FOUND => return Err(LayoutError::NotFound(stored.layout_id)),
            _ => {}
        }
        ServiceClient::check(response).await?;

        let mut renamed = stored.clone();
        renamed.layout_name = new_name.to_string();
        Ok(renamed)
    }

    async fn delete_layout(&self, stored: &StoredLayout) -> Result<()> {
        let id = stored.layout_id.to_string();
        let url = self.client.endpoint(&[&id])?;
        ServiceClient::check(self.client.http.delete(url).send().await?).await?;
        Ok(())
    }

    fn store_name(&self) -> &str {
        "remote"
    }
}

/// Server-side spreadsheet export
#[derive(Debug, Clone)]
pub struct RemoteExporter {
    client: ServiceClient,
}

impl RemoteExporter {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: ServiceClient::new(base_url, DEFAULT_TIMEOUT)?,
        })
    }

    /// Post rows to the export endpoint and return the produced file
    pub async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>> {
        let url = self.client.endpoint(&[EXPORT_ENDPOINT])?;
        let response = ServiceClient::check(self.client.http.post(url).json(request).send().await?).await?;
        let bytes = response.bytes().await?;
        tracing::info!("Exported {} rows of '{}' ({} bytes)", request.rows.len(), request.name, bytes.len());
        Ok(bytes.to_vec())
    }
}
