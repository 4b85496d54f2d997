use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::{LinearModelArtifact, LinearOracle, ModelOracle, OracleSet};
use crate::assessment::domain::Material;
use crate::assessment::encoder::{CategoricalEncoder, LabelEncoder};
use crate::assessment::features::ModelKind;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("artifact has an invalid shape: {0}")]
    Shape(String),
    #[error("registry was built without an artifact directory")]
    Detached,
}

impl ArtifactError {
    fn is_missing(&self) -> bool {
        matches!(self, ArtifactError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Resolves artifact file names for one material and training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocator {
    root: PathBuf,
    material: Material,
    timestamp: String,
}

impl ArtifactLocator {
    pub fn new(root: impl Into<PathBuf>, material: Material, timestamp: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            material,
            timestamp: timestamp.into(),
        }
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn material_dir(&self) -> PathBuf {
        self.root.join(self.material.as_str())
    }

    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        self.material_dir()
            .join(format!("{kind}_model_{}.json", self.timestamp))
    }

    pub fn encoder_path(&self, name: &str) -> PathBuf {
        self.material_dir()
            .join(format!("{name}_encoder_{}.json", self.timestamp))
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn report_skipped(material: Material, artifact: &str, err: &ArtifactError) {
    if err.is_missing() {
        debug!(%material, artifact, "artifact not present");
    } else {
        warn!(%material, artifact, error = %err, "artifact skipped");
    }
}

fn load_encoder(locator: &ArtifactLocator, name: &str) -> Option<LabelEncoder> {
    match read_artifact::<LabelEncoder>(&locator.encoder_path(name)) {
        Ok(encoder) => Some(encoder),
        Err(err) => {
            report_skipped(locator.material(), name, &err);
            None
        }
    }
}

fn load_oracle(
    locator: &ArtifactLocator,
    kind: ModelKind,
    labels: Option<&LabelEncoder>,
) -> Option<Arc<dyn ModelOracle>> {
    let loaded = read_artifact::<LinearModelArtifact>(&locator.model_path(kind))
        .and_then(|artifact| LinearOracle::new(kind, artifact));
    match loaded {
        Ok(oracle) => {
            let oracle = match labels {
                Some(labels) => oracle.with_labels(labels.clone()),
                None => oracle,
            };
            Some(Arc::new(oracle))
        }
        Err(err) => {
            report_skipped(locator.material(), kind.as_str(), &err);
            None
        }
    }
}

/// Loads every artifact present for a material. Missing or broken files are skipped.
pub fn load_oracle_set(locator: &ArtifactLocator) -> OracleSet {
    let classification_labels = load_encoder(locator, "classification");
    let encoder = CategoricalEncoder::new(
        load_encoder(locator, "energy"),
        load_encoder(locator, "location"),
    );

    let mut set = OracleSet::empty(locator.timestamp()).with_encoder(encoder);
    set.classification_decoder = classification_labels.is_some();
    for kind in ModelKind::ALL {
        let labels = match kind {
            ModelKind::Classification => classification_labels.as_ref(),
            _ => None,
        };
        if let Some(oracle) = load_oracle(locator, kind, labels) {
            set = set.with_oracle(oracle);
        }
    }

    let status = set.status();
    info!(
        material = %locator.material(),
        version = locator.timestamp(),
        environmental = status.environmental_model,
        circularity = status.circularity_model,
        classification = status.classification_model,
        "oracle set loaded"
    );
    set
}

/// Oracle sets for every material, swapped as a unit on reload.
#[derive(Debug, Clone, Default)]
pub struct OracleCatalog {
    sets: BTreeMap<Material, Arc<OracleSet>>,
}

impl OracleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(root: &Path, timestamps: &BTreeMap<Material, String>) -> Self {
        let mut catalog = Self::new();
        for material in Material::ALL {
            let timestamp = timestamps
                .get(&material)
                .map(String::as_str)
                .unwrap_or("latest");
            let locator = ArtifactLocator::new(root, material, timestamp);
            catalog = catalog.with_set(material, load_oracle_set(&locator));
        }
        catalog
    }

    pub fn with_set(mut self, material: Material, set: OracleSet) -> Self {
        self.sets.insert(material, Arc::new(set));
        self
    }

    /// Set for `material`; an empty set stands in when nothing was registered.
    pub fn get(&self, material: Material) -> Arc<OracleSet> {
        self.sets
            .get(&material)
            .cloned()
            .unwrap_or_else(|| Arc::new(OracleSet::empty("unversioned")))
    }
}

#[derive(Debug, Clone)]
struct CatalogSource {
    root: PathBuf,
    timestamps: BTreeMap<Material, String>,
}

/// Process-wide holder of the current catalog.
#[derive(Debug)]
pub struct ModelRegistry {
    source: Option<CatalogSource>,
    current: RwLock<Arc<OracleCatalog>>,
}

impl ModelRegistry {
    pub fn from_directory(root: impl Into<PathBuf>, timestamps: BTreeMap<Material, String>) -> Self {
        let source = CatalogSource {
            root: root.into(),
            timestamps,
        };
        let catalog = OracleCatalog::load(&source.root, &source.timestamps);
        Self {
            source: Some(source),
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Registry over an in-memory catalog; `reload` is refused.
    pub fn fixed(catalog: OracleCatalog) -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<OracleCatalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rebuilds the catalog from disk and swaps it in. In-flight readers keep their snapshot.
    pub fn reload(&self) -> Result<Arc<OracleCatalog>, ArtifactError> {
        let source = self.source.as_ref().ok_or(ArtifactError::Detached)?;
        let catalog = Arc::new(OracleCatalog::load(&source.root, &source.timestamps));
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::clone(&catalog);
        info!(root = %source.root.display(), "model registry reloaded");
        Ok(catalog)
    }
}
