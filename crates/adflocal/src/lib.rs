//! # adflocal - offline data factory template resolution
//!
//! Resolves pipeline, dataset and linked service documents the way the hosted service would for one execution
//! window, without running anything.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `adflocal` works internally.
//!
//! ### Terms
//!
//! - an `object` is a pipeline, dataset or linked service document, identified by its top-level `name`
//! - a `configuration` is a document mapping object names to a list of `{ name: <path>, value: <replacement> }`
//! - a `window` is the slice start/end (and optional window start/end) an object is resolved for
//! - an `expression` is a string scalar starting with `$$`, e.g. `$$Text.Format('{0:yyyy}', SliceStart)`
//!
//! ### Loading files
//!
//! Documents are plain JSON. [documents::AdfDocuments] stores every document together with its source path and
//! sorts it by the last segment of its `$schema` into objects and configurations. Configurations are named after
//! their file stem (`Prod.json` is configuration `Prod`).
//!
//! ### Configuration overlay
//!
//! see [overlay::apply_configuration]
//!
//! Every configuration entry for an object replaces the properties its path matches. Properties holding the
//! `<config>` sentinel must be replaced by some entry, otherwise the object is rejected.
//!
//! [environment::Environment::new] applies the overlay exactly once to every object.
//!
//! ### Materialization
//!
//! see [materialize::materialize]
//!
//! A copy of the object is walked depth-first:
//!
//! 1. `$$` expressions are evaluated ([expression::evaluate]) and replaced by their string form
//! 2. `partitionedBy` blocks are turned into `{name}` placeholders
//!
//! Placeholders are then substituted in the serialized text of the whole document.
//!
//! **Example**
//!
//! ```json
//! {
//!   "name": "Files",
//!   "properties": {
//!     "typeProperties": {
//!       "folderPath": "container/{Year}",
//!       "partitionedBy": [
//!         { "name": "Year", "value": { "type": "DateTime", "date": "SliceStart", "format": "yyyy" } }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! For a slice starting on 2017-01-01 the folder path becomes `container/2017`.
//!
//! ### Expressions
//!
//! An expression is a tree of `Namespace.Method(arguments)` calls. Leaves are date names (`SliceStart`), integers
//! and quoted format strings. `Text.Format` renders .NET style composite format strings, the `Time`, `Date` and
//! `DateTime` namespaces shift or convert date-times (see [expression::temporal::TRANSFORMS]).
//!
//! ### Output
//!
//! Results are [serde_json::Value]s which the cli serializes as json or yaml.
//!
pub mod documents;
pub mod environment;
pub mod error;
pub mod expression;
pub mod json_path;
pub mod materialize;
pub mod overlay;
mod util;
pub mod value;
mod visit;
