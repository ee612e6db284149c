//! Rule-driven artifact generation for mapforge.
//!
//! Table descriptors go in; rendered compilation units (record class,
//! dynamic SQL support class, mapper interface) come out, together with a
//! report of every artifact that was skipped or vetoed and why.

pub mod dom;
pub mod engine;
pub mod errors;
pub mod fragments;
pub mod generators;
pub mod model;
pub mod plugins;
pub mod rules;

pub use dom::{CompilationUnit, MARKER_TAG, Member, PRESERVE_TAG, render_unit};
pub use engine::{GenerationEngine, GenerationOutput, TableOutput};
pub use errors::GenerationError;
pub use generators::{Artifact, ArtifactKind, GeneratorRegistry};
pub use model::{
    Cancellation, GenerateOptions, GeneratedFile, GenerationIssue, GenerationReport, IssueLevel,
    TableReport, codes,
};
pub use plugins::{ExtensionPipeline, Interceptor, Subject, Verdict};
pub use rules::Rules;
