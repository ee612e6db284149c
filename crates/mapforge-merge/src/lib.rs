//! Regeneration-safe publishing of generated compilation units.
//!
//! An existing file is scanned into tagged members: members carrying the
//! generator's marker tag are dropped, hand-written members are kept, and the
//! fresh unit is rendered around them. Files without a merge capability are
//! overwritten or written under a disambiguated name, never dropped.

pub mod atomic;
pub mod errors;
pub mod merge;
pub mod scanner;
pub mod writer;

pub use atomic::{write_bytes_atomic, write_json_atomic};
pub use errors::{MergeError, Result};
pub use merge::{JavaMerger, MergeOutcome, merge_java};
pub use scanner::{ScannedFile, ScannedImport, ScannedMember, ScannedType, scan};
pub use writer::{
    DirectoryResolver, FileMerger, FileState, FileWriter, MergeRegistry, RootResolver,
    WriteAction, WriteOptions, WriteReport, WrittenFile,
};
