use serde_derive::{Deserialize, Serialize};
use stable_types::{Instr, SizeTerm};
use std::path::Path;

pub const MANIFEST_VERSION: u32 = 1;

/* Frozen instruction-level bodies for one generated routine pair */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FrozenBody {
    #[serde(with = "serde_yml::with::singleton_map_recursive")]
    pub encode: Vec<Instr>,
    #[serde(with = "serde_yml::with::singleton_map_recursive")]
    pub size: Vec<SizeTerm>,
}

/* One recorded version of a versioned record type */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct VersionEntry {
    pub id: String,
    pub body: FrozenBody,
}

/* Per-type manifest state.
 *
 * `versions` is the append-only history of a versioned type, index order =
 * dispatch order. `current` carries the latest bodies of a type while it is
 * still unversioned; it seeds the synthesized `legacy` entry if the type
 * later opts into versioning.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TypeManifest {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
    #[serde(default)]
    pub current: Option<FrozenBody>,
}

impl TypeManifest {
    pub fn version_ids(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.id.as_str()).collect()
    }

    pub fn find_version(&self, id: &str) -> Option<(usize, &VersionEntry)> {
        self.versions
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.id == id)
    }
}

/* Sidecar manifest persisted next to generated output. Written and read by
 * the generator itself; generated source is never re-parsed as an input. */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct VersionManifest {
    pub manifest_version: u32,
    #[serde(default)]
    pub types: Vec<TypeManifest>,
}

impl Default for VersionManifest {
    fn default() -> Self {
        Self {
            manifest_version: MANIFEST_VERSION,
            types: Vec::new(),
        }
    }
}

impl VersionManifest {
    /* Load the manifest if present; a first generation has none */
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let manifest: VersionManifest = serde_yml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Corrupt manifest '{}': {}", path.display(), e))?;
        if manifest.manifest_version != MANIFEST_VERSION {
            anyhow::bail!(
                "Manifest '{}' has unsupported version {} (expected {})",
                path.display(),
                manifest.manifest_version,
                MANIFEST_VERSION
            );
        }
        Ok(Some(manifest))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_yml::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeManifest> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn upsert_type(&mut self, entry: TypeManifest) {
        match self.types.iter_mut().find(|t| t.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.types.push(entry),
        }
    }
}
