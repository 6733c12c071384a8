//! Fetch contracts for the catalog bootstrap and correlation rows.

use crate::core::{
    AnalysisContext, AnalysisId, CatalogBootstrap, CorrError, CorrelationRow, VariableCatalog,
};
use futures::future::{self, BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Asynchronous provider of catalogs and correlation rows.
///
/// Every call is a single attempt; callers decide what to do on failure.
pub trait VectorSource: Send + Sync {
    /// Fetch the column/row names, identifiers and optional sort vector
    fn bootstrap(&self, analysis: AnalysisId)
        -> BoxFuture<'static, Result<CatalogBootstrap, CorrError>>;

    /// Fetch the correlation row for `row` against every catalog column
    fn fetch_row(
        &self,
        analysis: AnalysisId,
        row: &str,
    ) -> BoxFuture<'static, Result<CorrelationRow, CorrError>>;
}

/// Source backed by the analysis dashboard HTTP API
#[derive(Debug, Clone)]
pub struct HttpVectorSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVectorSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CorrError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CorrError::fetch("http client", e))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn bootstrap_url(&self, analysis: AnalysisId) -> String {
        format!(
            "{}/dashboard/api/analysis/{}/individual_overview/",
            self.base_url, analysis
        )
    }

    pub fn row_url(&self, analysis: AnalysisId) -> String {
        format!(
            "{}/dashboard/api/analysis/{}/dsc_full_row_value/",
            self.base_url, analysis
        )
    }
}

impl VectorSource for HttpVectorSource {
    fn bootstrap(
        &self,
        analysis: AnalysisId,
    ) -> BoxFuture<'static, Result<CatalogBootstrap, CorrError>> {
        let client = self.client.clone();
        let url = self.bootstrap_url(analysis);
        async move {
            debug!("GET {url}");
            let target = format!("catalog for analysis {analysis}");
            let response = client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| CorrError::fetch(target.clone(), e))?;
            response
                .json::<CatalogBootstrap>()
                .await
                .map_err(|e| CorrError::decode(target, e.to_string()))
        }
        .boxed()
    }

    fn fetch_row(
        &self,
        analysis: AnalysisId,
        row: &str,
    ) -> BoxFuture<'static, Result<CorrelationRow, CorrError>> {
        let client = self.client.clone();
        let url = self.row_url(analysis);
        let row = row.to_string();
        async move {
            debug!("GET {url}?row={row}");
            let target = format!("row '{row}'");
            let response = client
                .get(&url)
                .query(&[("row", row.as_str())])
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| CorrError::fetch(target.clone(), e))?;
            let payload: Value = response
                .json()
                .await
                .map_err(|e| CorrError::decode(target.clone(), e.to_string()))?;
            parse_row_payload(payload).map_err(|reason| CorrError::decode(target, reason))
        }
        .boxed()
    }
}

/// Extract the numeric array from a row response.
///
/// Accepts a bare array or an object holding one; other fields are ignored.
pub fn parse_row_payload(payload: Value) -> Result<CorrelationRow, String> {
    match payload {
        Value::Array(items) => numbers(items),
        Value::Object(mut map) => {
            for key in ["values", "row", "data"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return numbers(items);
                }
            }
            map.into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => numbers(items).ok(),
                    _ => None,
                })
                .ok_or_else(|| "response object holds no numeric array".to_string())
        }
        other => Err(format!("expected a numeric array, got {}", kind(&other))),
    }
}

fn numbers(items: Vec<Value>) -> Result<CorrelationRow, String> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .ok_or_else(|| format!("element {i} is {}, not a number", kind(&v)))
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fetch and validate the catalog, producing the read-only context every
/// component is built from
pub async fn load_context(
    source: &dyn VectorSource,
    analysis: AnalysisId,
) -> Result<AnalysisContext, CorrError> {
    let bootstrap = source.bootstrap(analysis).await?;
    let catalog = VariableCatalog::from_bootstrap(bootstrap)?;
    info!(
        "analysis {analysis}: {} variables, sort vector {}",
        catalog.len(),
        if catalog.sort_vector().is_some() { "present" } else { "absent" }
    );
    Ok(AnalysisContext::new(analysis, catalog))
}

/// On-disk matrix export: the bootstrap fields plus the full matrix
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixFile {
    #[serde(flatten)]
    pub catalog: CatalogBootstrap,
    pub matrix: Vec<Vec<f64>>,
}

/// Offline source serving rows from a matrix file
#[derive(Debug, Clone)]
pub struct MatrixFileSource {
    data: Arc<MatrixFile>,
}

impl MatrixFileSource {
    pub fn open(path: &Path) -> Result<Self, CorrError> {
        let target = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| CorrError::fetch(target.clone(), e))?;
        let data: MatrixFile =
            serde_json::from_str(&content).map_err(|e| CorrError::decode(target, e.to_string()))?;
        Ok(Self::from_parts(data.catalog, data.matrix))
    }

    pub fn from_parts(catalog: CatalogBootstrap, matrix: Vec<Vec<f64>>) -> Self {
        Self {
            data: Arc::new(MatrixFile { catalog, matrix }),
        }
    }
}

impl VectorSource for MatrixFileSource {
    fn bootstrap(
        &self,
        _analysis: AnalysisId,
    ) -> BoxFuture<'static, Result<CatalogBootstrap, CorrError>> {
        future::ready(Ok(self.data.catalog.clone())).boxed()
    }

    fn fetch_row(
        &self,
        _analysis: AnalysisId,
        row: &str,
    ) -> BoxFuture<'static, Result<CorrelationRow, CorrError>> {
        let result = self
            .data
            .catalog
            .matrix_names
            .iter()
            .position(|n| n == row)
            .ok_or_else(|| CorrError::UnknownVariable(row.to_string()))
            .and_then(|index| {
                self.data.matrix.get(index).cloned().ok_or_else(|| {
                    CorrError::decode(format!("row '{row}'"), "matrix has no such row")
                })
            });
        future::ready(result).boxed()
    }
}
