//! Artifact generators, one stateless function per artifact family.
//!
//! Generators never see each other; they read the table, the evaluated rules,
//! the fragment builders and the unit assembled so far, and hand back
//! artifacts. The engine owns the unit and applies them in registration
//! order.

pub mod mapper;
pub mod record;
pub mod support;

use std::collections::BTreeSet;
use std::fmt;

use mapforge_core::{JavaType, TableDescriptor};
use serde::Serialize;

use crate::dom::{CompilationUnit, Member};
use crate::fragments::{FragmentUnit, Fragments};
use crate::model::GenerationIssue;
use crate::rules::Rules;

/// Every hook point of the extension pipeline.
///
/// Member kinds name a single generated method or field; unit kinds name a
/// whole output file and are intercepted after all its members are in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ArtifactKind {
    SelectListField,
    BasicCount,
    BasicDelete,
    BasicInsert,
    BasicInsertMultiple,
    BasicSelectMany,
    BasicSelectOne,
    BasicUpdate,
    Count,
    Delete,
    DeleteByPrimaryKey,
    Insert,
    InsertMultiple,
    InsertSelective,
    SelectOne,
    Select,
    SelectDistinct,
    SelectByPrimaryKey,
    Update,
    UpdateAllColumns,
    UpdateSelectiveColumns,
    UpdateByPrimaryKey,
    UpdateByPrimaryKeySelective,
    RecordField,
    RecordConstructor,
    RecordGetter,
    RecordSetter,
    SupportTableInstance,
    SupportColumnConstant,
    SupportTableClass,
    RecordClass,
    SupportClass,
    MapperInterface,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::SelectListField => "selectList",
            ArtifactKind::BasicCount => "basicCount",
            ArtifactKind::BasicDelete => "basicDelete",
            ArtifactKind::BasicInsert => "basicInsert",
            ArtifactKind::BasicInsertMultiple => "basicInsertMultiple",
            ArtifactKind::BasicSelectMany => "basicSelectMany",
            ArtifactKind::BasicSelectOne => "basicSelectOne",
            ArtifactKind::BasicUpdate => "basicUpdate",
            ArtifactKind::Count => "count",
            ArtifactKind::Delete => "delete",
            ArtifactKind::DeleteByPrimaryKey => "deleteByPrimaryKey",
            ArtifactKind::Insert => "insert",
            ArtifactKind::InsertMultiple => "insertMultiple",
            ArtifactKind::InsertSelective => "insertSelective",
            ArtifactKind::SelectOne => "selectOne",
            ArtifactKind::Select => "select",
            ArtifactKind::SelectDistinct => "selectDistinct",
            ArtifactKind::SelectByPrimaryKey => "selectByPrimaryKey",
            ArtifactKind::Update => "update",
            ArtifactKind::UpdateAllColumns => "updateAllColumns",
            ArtifactKind::UpdateSelectiveColumns => "updateSelectiveColumns",
            ArtifactKind::UpdateByPrimaryKey => "updateByPrimaryKey",
            ArtifactKind::UpdateByPrimaryKeySelective => "updateByPrimaryKeySelective",
            ArtifactKind::RecordField => "recordField",
            ArtifactKind::RecordConstructor => "recordConstructor",
            ArtifactKind::RecordGetter => "recordGetter",
            ArtifactKind::RecordSetter => "recordSetter",
            ArtifactKind::SupportTableInstance => "supportTableInstance",
            ArtifactKind::SupportColumnConstant => "supportColumnConstant",
            ArtifactKind::SupportTableClass => "supportTableClass",
            ArtifactKind::RecordClass => "recordClass",
            ArtifactKind::SupportClass => "supportClass",
            ArtifactKind::MapperInterface => "mapperInterface",
        }
    }

    pub fn is_unit(self) -> bool {
        matches!(
            self,
            ArtifactKind::RecordClass | ArtifactKind::SupportClass | ArtifactKind::MapperInterface
        )
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output file a generator contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileKind {
    Record,
    Support,
    Mapper,
}

impl FileKind {
    pub fn unit_kind(self) -> ArtifactKind {
        match self {
            FileKind::Record => ArtifactKind::RecordClass,
            FileKind::Support => ArtifactKind::SupportClass,
            FileKind::Mapper => ArtifactKind::MapperInterface,
        }
    }
}

/// One generated member plus what the enclosing unit needs to host it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub member: Member,
    pub imports: BTreeSet<String>,
    pub static_imports: BTreeSet<String>,
    /// Recoverable problems met while building; the artifact is still usable.
    pub issues: Vec<GenerationIssue>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, member: Member) -> Self {
        Self {
            kind,
            member,
            imports: BTreeSet::new(),
            static_imports: BTreeSet::new(),
            issues: Vec::new(),
        }
    }

    pub fn import(&mut self, name: &str) {
        self.imports.insert(name.to_string());
    }

    pub fn import_type(&mut self, java_type: &JavaType) {
        self.imports.extend(java_type.import_names());
    }

    pub fn static_import(&mut self, name: &str) {
        self.static_imports.insert(name.to_string());
    }

    /// Take over the imports a fragment declared.
    pub fn absorb(&mut self, fragment: &FragmentUnit) {
        self.imports.extend(fragment.imports.iter().cloned());
        self.static_imports
            .extend(fragment.static_imports.iter().cloned());
    }
}

/// Outcome of one generator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Artifacts(Vec<Artifact>),
    /// The rules rule the artifact out for this table shape.
    NotApplicable,
    /// Requested but impossible; always explained.
    Skipped(GenerationIssue),
}

impl Generated {
    pub fn one(artifact: Artifact) -> Self {
        Generated::Artifacts(vec![artifact])
    }
}

/// Argument bundle handed to every generator.
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    pub table: &'a TableDescriptor,
    pub rules: &'a Rules,
    pub fragments: Fragments<'a>,
    /// Unit assembled so far, for generators that depend on earlier members.
    pub unit: &'a CompilationUnit,
}

pub type GenerateFn = fn(&GenerationInput<'_>) -> Generated;

#[derive(Debug, Clone, Copy)]
pub struct ArtifactGenerator {
    pub id: &'static str,
    pub file: FileKind,
    pub generate: GenerateFn,
}

/// Ordered generator table. Registration order is emission order within a
/// file.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<ArtifactGenerator>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in generator.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        record::register(&mut registry);
        support::register(&mut registry);
        mapper::register(&mut registry);
        registry
    }

    pub fn register(&mut self, id: &'static str, file: FileKind, generate: GenerateFn) {
        self.generators.push(ArtifactGenerator { id, file, generate });
    }

    pub fn for_file(&self, file: FileKind) -> impl Iterator<Item = &ArtifactGenerator> {
        self.generators
            .iter()
            .filter(move |generator| generator.file == file)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.generators.iter().map(|generator| generator.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_keeps_file_order() {
        let registry = GeneratorRegistry::with_defaults();
        let mapper_ids: Vec<&str> = registry
            .for_file(FileKind::Mapper)
            .map(|generator| generator.id)
            .collect();
        let many = mapper_ids.iter().position(|id| *id == "mapper.basic_select_many");
        let one = mapper_ids.iter().position(|id| *id == "mapper.basic_select_one");
        assert!(many.is_some() && one.is_some());
        assert!(many < one);
        assert_eq!(mapper_ids.first(), Some(&"mapper.basic_count"));
        assert_eq!(registry.for_file(FileKind::Record).count(), 3);
    }

    #[test]
    fn unit_kinds_are_distinguished() {
        assert!(ArtifactKind::MapperInterface.is_unit());
        assert!(!ArtifactKind::InsertSelective.is_unit());
        assert_eq!(FileKind::Support.unit_kind(), ArtifactKind::SupportClass);
        assert_eq!(ArtifactKind::DeleteByPrimaryKey.to_string(), "deleteByPrimaryKey");
    }
}
