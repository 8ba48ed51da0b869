//! Project tests
//!
//! Loads the data factory project in /tests/project/ and checks how its objects resolve.
use adflocal::documents::AdfDocuments;
use adflocal::environment::{Environment, EnvironmentError};
use adflocal::materialize::Window;
use adflocal::value::{parse_timestamp, Timestamp};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("ADFL_LOG"))
        .with_test_writer()
        .try_init();
}

fn ts(input: &str) -> Timestamp {
    parse_timestamp(input).unwrap()
}

fn documents() -> AdfDocuments {
    init_tracing();

    let mut documents = AdfDocuments::default();
    documents
        .load_directory(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/project"))
        .expect("project must load");
    documents
}

fn january_first() -> Window {
    Window::new(ts("2017-01-01T00:00:00Z"), ts("2017-01-02T00:00:00Z"))
}

#[test]
fn load_project() {
    let documents = documents();

    assert_eq!(
        documents.configuration_names().collect::<Vec<_>>(),
        vec!["Prod", "Test"]
    );

    let environment = Environment::new(&documents, Some("Prod")).unwrap();
    assert_eq!(environment.pipelines().collect::<Vec<_>>(), vec!["CopyPipeline"]);
    assert_eq!(environment.datasets().collect::<Vec<_>>(), vec!["Archive", "Files"]);
    assert_eq!(environment.linked_services().collect::<Vec<_>>(), vec!["Storage"]);
}

#[test]
fn materialize_dataset() {
    let documents = documents();
    let environment = Environment::new(&documents, Some("Prod")).unwrap();

    let files = environment.materialize("Files", &january_first()).unwrap();
    insta::assert_json_snapshot!(files["properties"], @r###"
    {
      "type": "AzureBlob",
      "linkedServiceName": "Storage",
      "typeProperties": {
        "folderPath": "prod/2017/01",
        "fileName": "20170101.csv",
        "partitionedBy": [
          {
            "name": "Year",
            "value": {
              "type": "DateTime",
              "date": "SliceStart",
              "format": "yyyy"
            }
          },
          {
            "name": "Month",
            "value": {
              "type": "DateTime",
              "date": "SliceStart",
              "format": "MM"
            }
          }
        ]
      },
      "availability": {
        "frequency": "Day",
        "interval": 1
      }
    }
    "###);
}

#[test]
fn configurations_are_independent() {
    let documents = documents();
    let prod = Environment::new(&documents, Some("Prod")).unwrap();
    let test = Environment::new(&documents, Some("Test")).unwrap();

    let window = Window::new(ts("2017-07-04T00:00:00Z"), ts("2017-07-05T00:00:00Z"));
    let from_prod = prod.materialize("Files", &window).unwrap();
    let from_test = test.materialize("Files", &window).unwrap();

    assert_eq!(
        from_prod["properties"]["typeProperties"]["folderPath"],
        json!("prod/2017/07")
    );
    assert_eq!(
        from_test["properties"]["typeProperties"]["folderPath"],
        json!("test/2017")
    );
    assert_eq!(
        from_test["properties"]["availability"],
        json!({ "frequency": "Hour", "interval": 1 })
    );
}

#[test]
fn project_requires_configuration() {
    let documents = documents();
    let errors = Environment::new(&documents, None).unwrap_err();
    assert_eq!(errors.issues().len(), 2);
    assert!(errors.to_string().contains("requires a configuration"));
}

#[test]
fn activity_bundle() {
    let documents = documents();
    let environment = Environment::new(&documents, Some("Prod")).unwrap();

    let window = january_first().with_window(ts("2016-12-31T00:00:00Z"), None);
    let bundle = environment
        .activity("CopyPipeline", "CopyFiles", &window)
        .unwrap();

    insta::assert_json_snapshot!(bundle.activity, @r###"
    {
      "name": "CopyFiles",
      "type": "Copy",
      "inputs": [
        {
          "name": "Files"
        }
      ],
      "outputs": [
        {
          "name": "Archive"
        }
      ],
      "typeProperties": {
        "source": {
          "type": "BlobSource",
          "recursive": false,
          "modifiedSince": "2016-12-30T18:00:00Z"
        }
      }
    }
    "###);

    assert_eq!(
        bundle.inputs[0]["properties"]["typeProperties"]["folderPath"],
        json!("prod/2017/01")
    );
    assert_eq!(
        bundle.outputs[0]["properties"]["typeProperties"]["folderPath"],
        json!("archive/2017-01-02")
    );
    assert_eq!(bundle.linked_services.len(), 2);
    for linked_service in &bundle.linked_services {
        assert_eq!(
            linked_service["properties"]["typeProperties"]["connectionString"],
            json!("DefaultEndpointsProtocol=https;AccountName=prod")
        );
    }
}

#[test]
fn unknown_activity() {
    let documents = documents();
    let environment = Environment::new(&documents, Some("Prod")).unwrap();

    let err = environment
        .activity("CopyPipeline", "Missing", &january_first())
        .unwrap_err();
    assert!(matches!(err, EnvironmentError::UnknownActivity { .. }));
    assert_eq!(
        err.to_string(),
        "Pipeline `CopyPipeline` has no activity `Missing`"
    );
}
