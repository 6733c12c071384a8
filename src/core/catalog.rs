//! Variable catalog and the read-only analysis context shared by the
//! selection list, the chart and the drill-down launcher.

use crate::core::error::CorrError;
use crate::core::types::{AnalysisId, VariableId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Payload of the catalog bootstrap request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogBootstrap {
    #[serde(default)]
    pub col_names: Vec<String>,
    pub matrix_names: Vec<String>,
    #[serde(rename = "matrix_IDs")]
    pub matrix_ids: Vec<VariableId>,
    #[serde(default)]
    pub sort_vector: Option<SortVector>,
}

/// Externally supplied display order: one key per catalog column.
///
/// Entries are displayed ascending by key; equal keys keep catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortVector(Vec<f64>);

impl SortVector {
    pub fn new(keys: Vec<f64>) -> Self {
        Self(keys)
    }

    pub fn keys(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key for the given catalog column
    pub fn key(&self, column: usize) -> f64 {
        self.0.get(column).copied().unwrap_or(f64::INFINITY)
    }
}

/// Ordered variable names with their stable identifiers.
///
/// `columns` is the column order of every correlation row; `names`/`ids`
/// are the selectable rows. For a square matrix both lists hold the same
/// variables. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableCatalog {
    columns: Vec<String>,
    names: Vec<String>,
    ids: Vec<VariableId>,
    name_to_id: HashMap<String, VariableId>,
    sort_vector: Option<SortVector>,
}

impl VariableCatalog {
    /// Build a square catalog where every row is also a column
    pub fn new(names: Vec<String>, ids: Vec<VariableId>) -> Result<Self, CorrError> {
        Self::from_bootstrap(CatalogBootstrap {
            col_names: Vec::new(),
            matrix_names: names,
            matrix_ids: ids,
            sort_vector: None,
        })
    }

    /// Validate a bootstrap payload and build the catalog from it
    pub fn from_bootstrap(bootstrap: CatalogBootstrap) -> Result<Self, CorrError> {
        let CatalogBootstrap {
            col_names,
            matrix_names,
            matrix_ids,
            sort_vector,
        } = bootstrap;

        if matrix_names.len() != matrix_ids.len() {
            return Err(CorrError::InvalidCatalog(format!(
                "{} matrix names but {} matrix ids",
                matrix_names.len(),
                matrix_ids.len()
            )));
        }

        let columns = if col_names.is_empty() {
            matrix_names.clone()
        } else {
            col_names
        };

        ensure_unique(&matrix_names)?;
        ensure_unique(&columns)?;

        if let Some(sv) = &sort_vector {
            if sv.len() != columns.len() {
                return Err(CorrError::InvalidCatalog(format!(
                    "sort vector has {} keys for {} columns",
                    sv.len(),
                    columns.len()
                )));
            }
            if sv.keys().iter().any(|k| !k.is_finite()) {
                return Err(CorrError::InvalidCatalog(
                    "sort vector contains a non-finite key".to_string(),
                ));
            }
        }

        let name_to_id = matrix_names
            .iter()
            .cloned()
            .zip(matrix_ids.iter().copied())
            .collect();

        Ok(Self {
            columns,
            names: matrix_names,
            ids: matrix_ids,
            name_to_id,
            sort_vector,
        })
    }

    /// Attach an externally supplied order
    pub fn with_sort_vector(mut self, sort_vector: SortVector) -> Result<Self, CorrError> {
        if sort_vector.len() != self.columns.len() {
            return Err(CorrError::InvalidCatalog(format!(
                "sort vector has {} keys for {} columns",
                sort_vector.len(),
                self.columns.len()
            )));
        }
        self.sort_vector = Some(sort_vector);
        Ok(self)
    }

    /// Selectable variable names in catalog order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Identifiers parallel to `names()`
    pub fn ids(&self) -> &[VariableId] {
        &self.ids
    }

    /// Column order of every correlation row
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns a fetched row must carry
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn id_for(&self, name: &str) -> Option<VariableId> {
        self.name_to_id.get(name).copied()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn sort_vector(&self) -> Option<&SortVector> {
        self.sort_vector.as_ref()
    }
}

fn ensure_unique(names: &[String]) -> Result<(), CorrError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(CorrError::DuplicateName(name.clone()));
        }
    }
    Ok(())
}

/// Read-only state owned by the parent screen and injected into components
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub analysis: AnalysisId,
    pub catalog: Arc<VariableCatalog>,
}

impl AnalysisContext {
    pub fn new(analysis: AnalysisId, catalog: VariableCatalog) -> Self {
        Self {
            analysis,
            catalog: Arc::new(catalog),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: i64) -> Vec<VariableId> {
        (1..=n).map(VariableId::new).collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bootstrap_deserialization() {
        let json = r#"{
            "col_names": ["X", "Y", "Z"],
            "matrix_names": ["X", "Y", "Z"],
            "matrix_IDs": [10, 11, 12],
            "sort_vector": null
        }"#;
        let bootstrap: CatalogBootstrap = serde_json::from_str(json).unwrap();
        let catalog = VariableCatalog::from_bootstrap(bootstrap).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.id_for("Y"), Some(VariableId::new(11)));
        assert_eq!(catalog.first(), Some("X"));
        assert!(catalog.sort_vector().is_none());
    }

    #[test]
    fn test_columns_fall_back_to_matrix_names() {
        let catalog = VariableCatalog::new(names(&["A", "B"]), ids(2)).unwrap();
        assert_eq!(catalog.columns(), catalog.names());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = VariableCatalog::new(names(&["A", "B", "A"]), ids(3)).unwrap_err();
        assert!(matches!(err, CorrError::DuplicateName(name) if name == "A"));
    }

    #[test]
    fn test_names_and_ids_must_be_parallel() {
        let err = VariableCatalog::new(names(&["A", "B"]), ids(3)).unwrap_err();
        assert!(matches!(err, CorrError::InvalidCatalog(_)));
    }

    #[test]
    fn test_sort_vector_length_checked() {
        let catalog = VariableCatalog::new(names(&["A", "B"]), ids(2)).unwrap();
        assert!(catalog
            .clone()
            .with_sort_vector(SortVector::new(vec![1.0]))
            .is_err());

        let sorted = catalog
            .with_sort_vector(SortVector::new(vec![2.0, 1.0]))
            .unwrap();
        assert_eq!(sorted.sort_vector().unwrap().key(1), 1.0);
    }

    #[test]
    fn test_non_finite_sort_keys_rejected() {
        let bootstrap = CatalogBootstrap {
            col_names: Vec::new(),
            matrix_names: names(&["A", "B"]),
            matrix_ids: ids(2),
            sort_vector: Some(SortVector::new(vec![0.0, f64::NAN])),
        };
        assert!(VariableCatalog::from_bootstrap(bootstrap).is_err());
    }
}
