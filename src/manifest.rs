//! Build Manifest - Reproducible Record of a Run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::builder::BuildReport;
use crate::export::Artifacts;
use crate::hashing::sha256_hex;
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub bytes: u64,
    pub hash: String,
}

impl ArtifactRecord {
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let data = fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes: data.len() as u64,
            hash: sha256_hex(&data),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    pub id: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub project_name: String,
    pub plan_hash: String,
    pub page_count: usize,
    pub report: BuildReport,
    pub artifacts: Vec<ArtifactRecord>,
}

impl BuildManifest {
    pub fn new(
        project_name: &str,
        plan_hash: String,
        page_count: usize,
        report: BuildReport,
        artifacts: &Artifacts,
    ) -> Result<Self, std::io::Error> {
        let artifacts = [&artifacts.native, &artifacts.pdf]
            .into_iter()
            .map(|p| ArtifactRecord::from_file(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            project_name: project_name.to_string(),
            plan_hash,
            page_count,
            report,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn records_hash_of_each_artifact() {
        let tmp = TempDir::new().unwrap();
        let artifacts = Artifacts {
            native: tmp.path().join("demo.magdoc"),
            pdf: tmp.path().join("demo.pdf"),
        };
        fs::write(&artifacts.native, b"abc").unwrap();
        fs::write(&artifacts.pdf, b"").unwrap();

        let manifest = BuildManifest::new(
            "demo",
            "h".into(),
            0,
            BuildReport::default(),
            &artifacts,
        )
        .unwrap();

        assert_eq!(manifest.artifacts.len(), 2);
        assert_eq!(manifest.artifacts[0].bytes, 3);
        assert_eq!(
            manifest.artifacts[0].hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(manifest.engine_version, ENGINE_VERSION);
        assert!(Uuid::parse_str(&manifest.id).is_ok());
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let artifacts = Artifacts {
            native: tmp.path().join("gone.magdoc"),
            pdf: tmp.path().join("gone.pdf"),
        };
        assert!(BuildManifest::new("x", String::new(), 0, BuildReport::default(), &artifacts).is_err());
    }
}
