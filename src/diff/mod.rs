//! Structural diff of two contract trees.
//!
//! The engine walks base and revision in lock-step (paths, operations,
//! request/response bodies, media types, schemas, properties) and produces a
//! typed [`Diff`] tree plus an [`OperationsSourcesMap`].

pub mod config;
pub mod engine;
pub mod model;
mod schema;
pub mod sources;
pub mod summary;

pub use config::{
    DiffConfig, EXTENSIBLE_ENUM_EXTENSION, Pattern, STABILITY_LEVEL_EXTENSION, SUNSET_EXTENSION,
    Side,
};
pub use engine::{get, get_composed, get_with_operations_sources_map};
pub use model::{
    ContentDiff, Diff, EnumDiff, ExtensionsDiff, MediaTypeDiff, MethodDiff, OperationsDiff,
    PathDiff, PathsDiff, RequestBodyDiff, ResponseDiff, ResponsesDiff, SchemaDiff, SchemasDiff,
    StringsDiff, SubschemasDiff, ValueDiff,
};
pub use sources::OperationsSourcesMap;
pub use summary::{Summary, SummaryDetails};
