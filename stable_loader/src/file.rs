use serde_derive::{Deserialize, Serialize};
use stable_types::TypeDecl;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/* A path import: another schema file whose declarations become visible to
   named references in the importing file */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct PathImport {
    pub path: String,
}

/* Metadata for a schema file */
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaMetadata {
    /* Package identifier (e.g., "demo.ledger"); becomes the output
       directory path */
    pub package: String,

    /* Optional human-readable display name */
    #[serde(default)]
    pub name: Option<String>,

    /* Schema format version */
    pub schema_version: u32,

    /* File description */
    pub description: String,

    /* Imported schema files, resolved relative to this file */
    #[serde(default)]
    pub imports: Vec<PathImport>,
}

/* Complete schema file: metadata plus type declarations */
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaFile {
    pub schema: SchemaMetadata,

    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

impl SchemaFile {
    pub fn package(&self) -> &str {
        &self.schema.package
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    pub fn imports(&self) -> &[PathImport] {
        &self.schema.imports
    }
}

/* Loads schema files and their path imports into one declaration set */
pub struct SchemaSet {
    /* Canonical paths already loaded; repeated or cyclic imports are
       loaded once */
    loaded_files: HashSet<PathBuf>,

    /* Include directories searched after the importing file's directory */
    include_dirs: Vec<PathBuf>,

    /* All collected type declarations, in load order */
    all_types: Vec<TypeDecl>,

    /* All loaded schema files, in load order */
    all_files: Vec<SchemaFile>,

    /* (package, type name) pairs in load order */
    package_types: Vec<(String, String)>,
}

impl SchemaSet {
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            loaded_files: HashSet::new(),
            include_dirs,
            all_types: Vec::new(),
            all_files: Vec::new(),
            package_types: Vec::new(),
        }
    }

    /* Resolve an import path relative to the importing file, then against
       the include directories */
    fn resolve_import_path(&self, import_path: &str, base_file: &Path) -> anyhow::Result<PathBuf> {
        if let Some(parent) = base_file.parent() {
            let relative_path = parent.join(import_path);
            if relative_path.exists() {
                return Ok(relative_path.canonicalize()?);
            }
        }

        for include_dir in &self.include_dirs {
            let include_path = include_dir.join(import_path);
            if include_path.exists() {
                return Ok(include_path.canonicalize()?);
            }
        }

        anyhow::bail!(
            "Import '{}' not found relative to '{}' or in include directories",
            import_path,
            base_file.display()
        )
    }

    /* Load a schema file and, recursively, its imports. A file already
       loaded (by canonical path) is skipped, which also breaks import
       cycles. */
    pub fn load_file_with_imports(&mut self, path: &Path, verbose: bool) -> anyhow::Result<()> {
        let canonical = path
            .canonicalize()
            .map_err(|e| anyhow::anyhow!("Cannot read schema file '{}': {}", path.display(), e))?;

        if !self.loaded_files.insert(canonical.clone()) {
            return Ok(());
        }

        let contents = std::fs::read_to_string(&canonical)?;
        let schema: SchemaFile = serde_yml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", canonical.display(), e))?;

        if verbose {
            println!(
                "[~] Loaded '{}' (package {}, {} type(s))",
                canonical.display(),
                schema.package(),
                schema.types.len()
            );
        }

        let imports: Vec<String> = schema.imports().iter().map(|i| i.path.clone()).collect();

        for decl in &schema.types {
            self.package_types
                .push((schema.schema.package.clone(), decl.name.clone()));
        }
        self.all_types.extend(schema.types.iter().cloned());
        self.all_files.push(schema);

        for import in imports {
            let import_path = self.resolve_import_path(&import, &canonical)?;
            self.load_file_with_imports(&import_path, verbose)?;
        }

        Ok(())
    }

    pub fn loaded_file_count(&self) -> usize {
        self.all_files.len()
    }

    pub fn all_types(&self) -> &[TypeDecl] {
        &self.all_types
    }

    pub fn files(&self) -> &[SchemaFile] {
        &self.all_files
    }

    pub fn packages(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for file in &self.all_files {
            if seen.insert(file.schema.package.clone()) {
                out.push(file.schema.package.clone());
            }
        }
        out
    }

    /* Package owning a type name, if any */
    pub fn package_for_type(&self, type_name: &str) -> Option<&str> {
        self.package_types
            .iter()
            .find(|(_, name)| name == type_name)
            .map(|(package, _)| package.as_str())
    }
}
