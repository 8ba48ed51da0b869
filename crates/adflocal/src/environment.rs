//! Collection of configuration resolved data factory objects
use crate::documents::{AdfDocuments, ObjectKind};
use crate::error::ResolveError;
use crate::materialize::{materialize, Window};
use crate::overlay::{apply_configuration, object_name, Configuration};
use serde_json::Value;

/// Pipelines, datasets and linked services with the configuration applied
///
/// The configuration overlay runs once, in [Environment::new]. Every materialization works on a copy, so the
/// stored documents never contain window specific values.
#[derive(Debug)]
pub struct Environment {
    configuration: Option<String>,

    /// Object name to kind and resolved document
    objects: indexmap::IndexMap<String, (ObjectKind, Value)>,
}

impl Environment {
    pub fn new(
        documents: &AdfDocuments,
        configuration_name: Option<&str>,
    ) -> Result<Self, EnvironmentErrors> {
        let mut e = EnvironmentErrors::new();

        let configuration = match configuration_name {
            None => None,
            Some(name) => match documents.configuration(name) {
                Some((_source, document)) => {
                    Some(Configuration::new(name.to_string(), document.clone()))
                }
                None => {
                    e.log(Issue::UnknownConfiguration(name.to_string()));
                    return Err(e);
                }
            },
        };

        // object name to document index, used to report collisions
        let mut indices: indexmap::IndexMap<String, usize> = Default::default();
        let mut objects = indexmap::IndexMap::new();

        for (index, _source, kind, document) in documents.objects() {
            let Ok(name) = object_name(document) else {
                e.log(Issue::MissingName(index));
                continue;
            };

            if let Some(existing) = indices.get(name) {
                e.log(Issue::DuplicateName {
                    existing: *existing,
                    new: index,
                });
                continue;
            }
            indices.insert(name.to_string(), index);

            let mut document = document.clone();
            if let Err(error) = apply_configuration(&mut document, configuration.as_ref()) {
                e.log(Issue::Overlay { index, error });
                continue;
            }

            tracing::debug!(%kind, %name, "object resolved");
            objects.insert(name.to_string(), (kind, document));
        }

        if !e.issues.is_empty() {
            return Err(e);
        }

        Ok(Self {
            configuration: configuration.map(|configuration| configuration.name),
            objects,
        })
    }

    /// Name of the bound configuration
    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<(ObjectKind, &Value)> {
        self.objects
            .get(name)
            .map(|(kind, document)| (*kind, document))
    }

    pub fn names(&self, kind: ObjectKind) -> impl Iterator<Item = &str> {
        self.objects
            .iter()
            .filter(move |(_, (object_kind, _))| *object_kind == kind)
            .map(|(name, _)| name.as_str())
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &str> {
        self.names(ObjectKind::Pipeline)
    }

    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.names(ObjectKind::Dataset)
    }

    pub fn linked_services(&self) -> impl Iterator<Item = &str> {
        self.names(ObjectKind::LinkedService)
    }

    fn get_kind(&self, kind: ObjectKind, name: &str) -> Result<&Value, EnvironmentError> {
        match self.objects.get(name) {
            Some((object_kind, document)) if *object_kind == kind => Ok(document),
            _ => Err(EnvironmentError::UnknownObject {
                kind: kind.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Materialize a copy of the named object for `window`
    pub fn materialize(&self, name: &str, window: &Window) -> Result<Value, EnvironmentError> {
        let Some((_kind, document)) = self.get(name) else {
            return Err(EnvironmentError::UnknownObject {
                kind: "object".to_string(),
                name: name.to_string(),
            });
        };

        Ok(materialize(document.clone(), window)?)
    }

    /// Everything needed to run one activity of a pipeline for `window`
    ///
    /// Inputs and outputs are materialized, linked services are only configuration resolved.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn activity(
        &self,
        pipeline: &str,
        activity: &str,
        window: &Window,
    ) -> Result<ActivityBundle, EnvironmentError> {
        let materialized_pipeline =
            materialize(self.get_kind(ObjectKind::Pipeline, pipeline)?.clone(), window)?;

        let Some(selected) = materialized_pipeline
            .pointer("/properties/activities")
            .and_then(Value::as_array)
            .and_then(|activities| {
                activities
                    .iter()
                    .find(|candidate| candidate.get("name").and_then(Value::as_str) == Some(activity))
            })
            .cloned()
        else {
            return Err(EnvironmentError::UnknownActivity {
                pipeline: pipeline.to_string(),
                activity: activity.to_string(),
            });
        };

        let inputs = self.datasets_of(&selected, "inputs", window)?;
        let outputs = self.datasets_of(&selected, "outputs", window)?;

        let mut linked_services = vec![];
        for dataset in inputs.iter().chain(&outputs) {
            let Some(linked_service) = dataset
                .pointer("/properties/linkedServiceName")
                .and_then(Value::as_str)
            else {
                tracing::debug!(dataset = ?dataset.get("name"), "dataset without linked service");
                continue;
            };

            linked_services.push(
                self.get_kind(ObjectKind::LinkedService, linked_service)?
                    .clone(),
            );
        }

        Ok(ActivityBundle {
            pipeline: materialized_pipeline,
            activity: selected,
            inputs,
            outputs,
            linked_services,
        })
    }

    /// Materialize the datasets referenced by `activity[direction][*].name`
    fn datasets_of(
        &self,
        activity: &Value,
        direction: &str,
        window: &Window,
    ) -> Result<Vec<Value>, EnvironmentError> {
        let Some(references) = activity.get(direction).and_then(Value::as_array) else {
            return Ok(vec![]);
        };

        references
            .iter()
            .map(|reference| -> Result<Value, EnvironmentError> {
                let name = reference.get("name").and_then(Value::as_str).ok_or_else(|| {
                    ResolveError::InvalidDocument {
                        reason: format!("every entry of `{direction}` needs a string `name`"),
                    }
                })?;

                let dataset = self.get_kind(ObjectKind::Dataset, name)?;
                Ok(materialize(dataset.clone(), window)?)
            })
            .collect()
    }
}

/// Resolved documents around one activity
#[derive(Debug, serde::Serialize)]
pub struct ActivityBundle {
    pub pipeline: Value,
    pub activity: Value,
    pub inputs: Vec<Value>,
    pub outputs: Vec<Value>,
    pub linked_services: Vec<Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum EnvironmentError {
    #[error("Unknown {kind} `{name}`")]
    UnknownObject { kind: String, name: String },
    #[error("Pipeline `{pipeline}` has no activity `{activity}`")]
    UnknownActivity { pipeline: String, activity: String },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[derive(derive_new::new, Debug)]
pub struct EnvironmentErrors {
    #[new(default)]
    issues: Vec<Issue>,
}

impl EnvironmentErrors {
    pub fn log(&mut self, issue: Issue) {
        tracing::trace!(?issue, "issue found");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

impl std::error::Error for EnvironmentErrors {}

impl std::fmt::Display for EnvironmentErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.issues.first() {
            Some(issue) => write!(f, "{issue}")?,
            None => f.write_str("no issues")?,
        }

        if self.issues.len() > 1 {
            write!(f, " (and {} more)", self.issues.len() - 1)?;
        }

        Ok(())
    }
}

/// Problem found while building an [Environment]
///
/// Indices refer to [AdfDocuments::get_object].
#[derive(Debug)]
pub enum Issue {
    UnknownConfiguration(String),
    MissingName(usize),
    DuplicateName { existing: usize, new: usize },
    Overlay { index: usize, error: ResolveError },
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::UnknownConfiguration(name) => write!(f, "Unknown configuration `{name}`"),
            Issue::MissingName(index) => {
                write!(f, "Object #{index} has no top-level string property `name`")
            }
            Issue::DuplicateName { existing, new } => {
                write!(f, "Object #{new} reuses the name of object #{existing}")
            }
            Issue::Overlay { index, error } => write!(f, "Object #{index}: {error}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::adf_documents;
    use crate::value::parse_timestamp;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PIPELINE: &str = "http://x/Microsoft.DataFactory.Pipeline.json";
    const DATASET: &str = "http://x/Microsoft.DataFactory.Table.json";
    const LINKED_SERVICE: &str = "http://x/Microsoft.DataFactory.LinkedService.json";
    const CONFIG: &str = "http://x/Microsoft.DataFactory.Config.json";

    fn window(start: &str, end: &str) -> Window {
        Window::new(parse_timestamp(start).unwrap(), parse_timestamp(end).unwrap())
    }

    fn documents() -> AdfDocuments {
        adf_documents! {
            "Prod.json" => json!({
                "$schema": CONFIG,
                "Storage": [{ "name": "$.properties.typeProperties.connectionString", "value": "prod-connection" }],
                "Files": [{ "name": "$.properties.typeProperties.folderPath", "value": "prod/{Year}/{Month}" }]
            }),
            "Storage.json" => json!({
                "$schema": LINKED_SERVICE,
                "name": "Storage",
                "properties": { "typeProperties": { "connectionString": "<config>" } }
            }),
            "Files.json" => json!({
                "$schema": DATASET,
                "name": "Files",
                "properties": {
                    "linkedServiceName": "Storage",
                    "typeProperties": {
                        "folderPath": "<config>",
                        "partitionedBy": [
                            { "name": "Year", "value": { "type": "DateTime", "date": "SliceStart", "format": "yyyy" } },
                            { "name": "Month", "value": { "type": "DateTime", "date": "SliceStart", "format": "MM" } }
                        ]
                    }
                }
            }),
            "Archive.json" => json!({
                "$schema": DATASET,
                "name": "Archive",
                "properties": {
                    "linkedServiceName": "Storage",
                    "typeProperties": { "fileName": "$$Text.Format('{0:yyyyMMdd}.zip', SliceEnd)" }
                }
            }),
            "Copy.json" => json!({
                "$schema": PIPELINE,
                "name": "CopyPipeline",
                "properties": {
                    "activities": [{
                        "name": "CopyFiles",
                        "inputs": [{ "name": "Files" }],
                        "outputs": [{ "name": "Archive" }],
                        "typeProperties": { "from": "$$Date.AddHours(SliceStart, -2)" }
                    }]
                }
            })
        }
    }

    #[test]
    fn overlay_applied_on_construction() {
        let environment = Environment::new(&documents(), Some("Prod")).unwrap();

        assert_eq!(environment.configuration(), Some("Prod"));
        assert_eq!(environment.pipelines().collect::<Vec<_>>(), vec!["CopyPipeline"]);
        assert_eq!(environment.datasets().collect::<Vec<_>>(), vec!["Files", "Archive"]);
        assert_eq!(environment.linked_services().collect::<Vec<_>>(), vec!["Storage"]);

        let (kind, storage) = environment.get("Storage").unwrap();
        assert_eq!(kind, ObjectKind::LinkedService);
        assert_eq!(
            storage["properties"]["typeProperties"]["connectionString"],
            json!("prod-connection")
        );
    }

    #[test]
    fn materialize_works_on_copies() {
        let environment = Environment::new(&documents(), Some("Prod")).unwrap();

        let january = environment
            .materialize("Files", &window("2017-01-01", "2017-01-02"))
            .unwrap();
        let march = environment
            .materialize("Files", &window("2017-03-01", "2017-03-02"))
            .unwrap();

        assert_eq!(
            january["properties"]["typeProperties"]["folderPath"],
            json!("prod/2017/01")
        );
        assert_eq!(
            march["properties"]["typeProperties"]["folderPath"],
            json!("prod/2017/03")
        );

        let (_, stored) = environment.get("Files").unwrap();
        assert_eq!(
            stored["properties"]["typeProperties"]["folderPath"],
            json!("prod/{Year}/{Month}")
        );
    }

    #[test]
    fn activity_bundle() {
        let environment = Environment::new(&documents(), Some("Prod")).unwrap();
        let bundle = environment
            .activity("CopyPipeline", "CopyFiles", &window("2017-01-01", "2017-01-02"))
            .unwrap();

        assert_eq!(
            bundle.activity["typeProperties"]["from"],
            json!("2016-12-31T22:00:00Z")
        );
        assert_eq!(bundle.inputs.len(), 1);
        assert_eq!(
            bundle.inputs[0]["properties"]["typeProperties"]["folderPath"],
            json!("prod/2017/01")
        );
        assert_eq!(
            bundle.outputs[0]["properties"]["typeProperties"]["fileName"],
            json!("20170102.zip")
        );
        // one linked service per dataset, duplicates included
        assert_eq!(bundle.linked_services.len(), 2);
        assert_eq!(bundle.linked_services[0]["name"], json!("Storage"));
    }

    #[test]
    fn overlay_runs_once_per_object() {
        let documents = adf_documents! {
            "Nesting.json" => json!({
                "$schema": CONFIG,
                "Tagged": [{ "name": "$..tag", "value": { "tag": "inner" } }]
            }),
            "Tagged.json" => json!({
                "$schema": DATASET,
                "name": "Tagged",
                "properties": { "tag": "outer" }
            }),
            "Run.json" => json!({
                "$schema": PIPELINE,
                "name": "Run",
                "properties": { "activities": [{ "name": "Touch", "inputs": [{ "name": "Tagged" }] }] }
            })
        };

        // applying the entry again nests one level deeper
        let (_, configuration) = documents.configuration("Nesting").unwrap();
        let configuration = Configuration::new("Nesting".to_string(), configuration.clone());
        let mut twice = json!({ "name": "Tagged", "properties": { "tag": "outer" } });
        apply_configuration(&mut twice, Some(&configuration)).unwrap();
        apply_configuration(&mut twice, Some(&configuration)).unwrap();
        assert_eq!(
            twice["properties"]["tag"],
            json!({ "tag": { "tag": "inner" } })
        );

        let environment = Environment::new(&documents, Some("Nesting")).unwrap();
        let once = json!({ "tag": "inner" });

        for day in ["2017-01-01", "2017-01-02", "2017-01-03"] {
            let window = window(day, "2017-01-04");
            let materialized = environment.materialize("Tagged", &window).unwrap();
            assert_eq!(materialized["properties"]["tag"], once);

            let bundle = environment.activity("Run", "Touch", &window).unwrap();
            assert_eq!(bundle.inputs[0]["properties"]["tag"], once);
        }

        let (_, stored) = environment.get("Tagged").unwrap();
        assert_eq!(stored["properties"]["tag"], once);
    }

    #[test]
    fn unknown_lookups() {
        let environment = Environment::new(&documents(), Some("Prod")).unwrap();
        let window = window("2017-01-01", "2017-01-02");

        assert!(matches!(
            environment.materialize("Nope", &window),
            Err(EnvironmentError::UnknownObject { .. })
        ));
        assert!(matches!(
            environment.activity("Files", "CopyFiles", &window),
            Err(EnvironmentError::UnknownObject { .. })
        ));
        assert!(matches!(
            environment.activity("CopyPipeline", "Nope", &window),
            Err(EnvironmentError::UnknownActivity { .. })
        ));
    }

    #[test]
    fn construction_issues() {
        let errors = Environment::new(&documents(), Some("Dev")).unwrap_err();
        assert!(matches!(
            errors.issues(),
            [Issue::UnknownConfiguration(name)] if name == "Dev"
        ));

        // sentinels without a bound configuration
        let errors = Environment::new(&documents(), None).unwrap_err();
        assert_eq!(errors.issues().len(), 2);
        assert!(errors.issues().iter().all(|issue| matches!(
            issue,
            Issue::Overlay { error: ResolveError::MissingConfiguration { .. }, .. }
        )));

        let documents = adf_documents! {
            "A.json" => json!({ "$schema": DATASET, "name": "Same" }),
            "B.json" => json!({ "$schema": PIPELINE, "name": "Same" }),
            "C.json" => json!({ "$schema": DATASET })
        };
        let errors = Environment::new(&documents, None).unwrap_err();
        assert!(matches!(
            errors.issues(),
            [Issue::DuplicateName { existing: 0, new: 1 }, Issue::MissingName(2)]
        ));
        assert_eq!(
            errors.to_string(),
            "Object #1 reuses the name of object #0 (and 1 more)"
        );
    }
}
