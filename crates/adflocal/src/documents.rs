//! collection of raw data factory documents (json value and path to source file)
//!
//! [AdfDocuments] tracks
//! - the source path
//! - pipelines, datasets and linked services
//! - configurations (keyed by file stem)
//! and defines a numeric index for each object. Once added those indices are stable (removal is not possible)
//!
//! The kind of a document is taken from the last segment of its `$schema`.
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Kind of a data factory object
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ObjectKind {
    Pipeline,
    Dataset,
    LinkedService,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Pipeline => f.write_str("pipeline"),
            ObjectKind::Dataset => f.write_str("dataset"),
            ObjectKind::LinkedService => f.write_str("linked service"),
        }
    }
}

/// What a `$schema` says about a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Object(ObjectKind),
    Configuration,
}

impl SchemaKind {
    pub fn of(document: &Value) -> Option<Self> {
        let schema = document.get("$schema")?.as_str()?;
        let file = schema.rsplit('/').next().unwrap_or(schema);

        Some(match file {
            "Microsoft.DataFactory.Pipeline.json" => SchemaKind::Object(ObjectKind::Pipeline),
            "Microsoft.DataFactory.Table.json" => SchemaKind::Object(ObjectKind::Dataset),
            "Microsoft.DataFactory.LinkedService.json" => {
                SchemaKind::Object(ObjectKind::LinkedService)
            }
            "Microsoft.DataFactory.Config.json" => SchemaKind::Configuration,
            _ => return None,
        })
    }
}

#[derive(Default, Debug)]
pub struct AdfDocuments {
    sources: Vec<Source>,
    objects: Vec<(usize, ObjectKind, Value)>,
    configurations: indexmap::IndexMap<String, (usize, Value)>,
}

impl AdfDocuments {
    /// Inserts and indexes a document
    ///
    /// Documents without a known `$schema` are skipped.
    pub fn insert(
        &mut self,
        document: Value,
        path: Option<PathBuf>,
    ) -> Result<(), LoadError> {
        let Some(kind) = SchemaKind::of(&document) else {
            tracing::warn!(path = ?path, "document does not belong to any known data factory schema, ignored");
            return Ok(());
        };

        let source_index = self.sources.len();

        match kind {
            SchemaKind::Configuration => {
                let name = path
                    .as_deref()
                    .and_then(Path::file_stem)
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .ok_or(LoadError::UnnamedConfiguration)?;

                tracing::debug!(%name, "configuration added");
                if self.configurations.contains_key(&name) {
                    return Err(LoadError::DuplicateConfiguration(name));
                }
                self.configurations.insert(name, (source_index, document));
            }
            SchemaKind::Object(kind) => {
                tracing::debug!(%kind, path = ?path, "object added");
                self.objects.push((source_index, kind, document));
            }
        }

        self.sources.push(path);
        Ok(())
    }

    pub fn get_object(&self, index: usize) -> SourceObject {
        let (source_index, kind, document) = &self.objects[index];
        (index, &self.sources[*source_index], *kind, document)
    }

    pub fn objects(&self) -> impl Iterator<Item = SourceObject> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, (source_index, kind, document))| {
                (index, &self.sources[*source_index], *kind, document)
            })
    }

    pub fn configuration(&self, name: &str) -> Option<(&Source, &Value)> {
        self.configurations
            .get(name)
            .map(|(source_index, document)| (&self.sources[*source_index], document))
    }

    pub fn configuration_names(&self) -> impl Iterator<Item = &str> {
        self.configurations.keys().map(String::as_str)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl AdfDocuments {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let document: Value = serde_json::from_str(&file_contents)?;

        self.insert(document, Some(file_path))
    }

    /// Load every `*.json` file of a directory, in file name order
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_json_file = dir_entry.file_name().to_string_lossy().ends_with(".json");
            if !is_json_file {
                continue;
            }

            file_paths.push(dir_entry.path());
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse json file")]
    JsonParseFailed(#[from] serde_json::Error),
    #[error("A configuration needs a source path to be named after")]
    UnnamedConfiguration,
    #[error("Configuration `{0}` is defined more than once")]
    DuplicateConfiguration(String),
}

/// Utility macro to create [AdfDocuments]
///
/// Create from a single (non configuration) document
/// ```
/// # use adflocal::adf_documents;
/// # use serde_json::json;
/// adf_documents!(json!({
///     "$schema": "http://datafactories.schema.management.azure.com/schemas/2015-09-01/Microsoft.DataFactory.Table.json",
///     "name": "MyDataset"
/// }));
/// ```
///
/// Create from multiple documents (path required, configurations are named after the file stem)
/// ```
/// # use adflocal::adf_documents;
/// # use serde_json::json;
/// let documents = adf_documents! {
///   "MyConfig.json" => json!({ "$schema": "http://x/Microsoft.DataFactory.Config.json" }),
///   "MyDataset.json" => json!({ "$schema": "http://x/Microsoft.DataFactory.Table.json", "name": "MyDataset" })
/// };
/// assert_eq!(documents.configuration_names().collect::<Vec<_>>(), ["MyConfig"]);
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use adflocal::adf_documents;
/// # use serde_json::json;
/// adf_documents!(json!({ "$schema": "http://x/Microsoft.DataFactory.Config.json" }));
/// ```
#[macro_export]
macro_rules! adf_documents {
    // single document without source
    { $expr:expr } => {{
        let mut docs = $crate::documents::AdfDocuments::default();
        docs.insert($expr, None).expect("document must be accepted");
        docs
    }};
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::documents::AdfDocuments::default();
        $(
            docs.insert($expr, Some(std::path::PathBuf::from($source))).expect("document must be accepted");
        )+

        docs
    }};
}

pub type Source = Option<PathBuf>;
pub type SourceObject<'a> = (usize, &'a Source, ObjectKind, &'a Value);
