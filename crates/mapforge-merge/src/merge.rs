//! Tagged-node reconciliation of an existing Java file with a fresh unit.

use std::collections::BTreeSet;

use mapforge_core::JavaType;
use mapforge_generate::dom::{Member, Verbatim};
use mapforge_generate::{CompilationUnit, GeneratedFile, render_unit};
use tracing::debug;

use crate::errors::{MergeError, Result};
use crate::scanner::{ScannedFile, scan};
use crate::writer::FileMerger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: String,
    /// Hand-written members carried over from the existing file.
    pub kept: usize,
    /// Generated members of the existing file that were discarded.
    pub dropped: usize,
    /// Fresh members left out because a hand-written member has their signature.
    pub shadowed: usize,
}

/// Merge capability for `.java` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaMerger;

impl FileMerger for JavaMerger {
    fn id(&self) -> &'static str {
        "java"
    }

    fn merge(&self, existing: &str, file: &GeneratedFile) -> Result<String> {
        merge_java(existing, &file.unit).map(|outcome| outcome.content)
    }
}

/// Drop the marker-tagged members of `existing`, keep everything written by
/// hand, and render the result around the fresh unit.
///
/// Hand-written members keep their order and come first; fresh members follow
/// in generation order. Custom imports, supertypes and type annotations of
/// the existing file survive, and so do its comments outside members unless
/// they carry the marker tag. Merging the rendering of `fresh` against itself
/// yields the same text.
pub fn merge_java(existing: &str, fresh: &CompilationUnit) -> Result<MergeOutcome> {
    let scanned = scan(existing)?;
    check_compatible(&scanned, fresh)?;

    let mut merged = fresh.clone();
    for import in &scanned.imports {
        if import.is_static {
            merged.static_imports.insert(import.name.clone());
        } else {
            merged.imports.insert(import.name.clone());
        }
    }

    let known: BTreeSet<String> = merged
        .super_interfaces
        .iter()
        .map(|java_type| simple_name(&java_type.short_name()).to_string())
        .collect();
    for name in &scanned.declaration.interfaces {
        if !known.contains(simple_name(name)) {
            merged.super_interfaces.push(JavaType::new(name));
        }
    }
    if merged.superclass.is_none() {
        merged.superclass = scanned.declaration.superclass.as_deref().map(JavaType::new);
    }

    let annotated: BTreeSet<String> = merged
        .annotations
        .iter()
        .map(|annotation| annotation_name(annotation))
        .collect();
    for annotation in &scanned.declaration.annotations {
        if !annotated.contains(&annotation_name(annotation)) {
            merged.annotations.push(annotation.clone());
        }
    }

    if !scanned.file_comments.is_empty() {
        merged.file_comments = scanned.file_comments.clone();
    }
    let type_comments: Vec<String> = scanned.hand_written_type_comments().cloned().collect();
    if !type_comments.is_empty() {
        merged.type_comments = type_comments;
    }
    if !scanned.trailing_comments.is_empty() {
        merged.trailing_comments = scanned.trailing_comments.clone();
    }

    let hand_written: Vec<Member> = scanned
        .hand_written()
        .map(|member| {
            Member::Verbatim(Verbatim {
                signature: member.signature.clone(),
                text: member.text.clone(),
            })
        })
        .collect();
    let taken: BTreeSet<String> = hand_written
        .iter()
        .map(|member| simple_signature(&member.signature()))
        .collect();

    let fresh_count = merged.members.len();
    let fresh_members: Vec<Member> = std::mem::take(&mut merged.members)
        .into_iter()
        .filter(|member| !taken.contains(&simple_signature(&member.signature())))
        .collect();
    let shadowed = fresh_count - fresh_members.len();
    let kept = hand_written.len();
    let dropped = scanned.members.len() - kept;

    merged.members = hand_written;
    merged.members.extend(fresh_members);

    debug!(
        unit = merged.name(),
        kept, dropped, shadowed, "merged existing file"
    );
    Ok(MergeOutcome {
        content: render_unit(&merged),
        kept,
        dropped,
        shadowed,
    })
}

fn check_compatible(scanned: &ScannedFile, fresh: &CompilationUnit) -> Result<()> {
    let declaration = &scanned.declaration;
    let package = scanned.package.as_deref().unwrap_or("");
    if package != fresh.package() {
        return Err(MergeError::Conflict(format!(
            "package '{package}' does not match '{}'",
            fresh.package()
        )));
    }
    if declaration.kind != fresh.kind || declaration.name != fresh.name() {
        return Err(MergeError::Conflict(format!(
            "existing {} {} cannot host generated {} {}",
            declaration.kind.keyword(),
            declaration.name,
            fresh.kind.keyword(),
            fresh.name()
        )));
    }
    if let (Some(existing), Some(generated)) = (&declaration.superclass, &fresh.superclass) {
        if simple_name(existing) != generated.base_short_name() {
            return Err(MergeError::Conflict(format!(
                "superclass {existing} conflicts with {}",
                generated.short_name()
            )));
        }
    }
    Ok(())
}

/// Last name segment without type arguments.
fn simple_name(name: &str) -> &str {
    let raw = name.split('<').next().unwrap_or(name);
    raw.rsplit('.').next().unwrap_or(raw).trim()
}

/// `signature` with every qualified type name cut to its last segment, so
/// `find(java.util.List<com.example.Order>)` matches `find(List<Order>)`.
fn simple_signature(signature: &str) -> String {
    let mut out = String::with_capacity(signature.len());
    let mut segment = String::new();
    for ch in signature.chars() {
        if ch.is_alphanumeric() || matches!(ch, '_' | '$' | '.') {
            segment.push(ch);
        } else {
            push_simple(&mut out, &segment);
            segment.clear();
            out.push(ch);
        }
    }
    push_simple(&mut out, &segment);
    out
}

fn push_simple(out: &mut String, segment: &str) {
    let name = segment.trim_end_matches('.');
    out.push_str(name.rsplit('.').next().unwrap_or(name));
    out.push_str(&segment[name.len()..]);
}

fn annotation_name(annotation: &str) -> String {
    let name = annotation.split('(').next().unwrap_or(annotation);
    simple_name(name.trim_start_matches('@')).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapforge_generate::dom::{Method, Parameter, UnitKind};
    use pretty_assertions::assert_eq;

    fn fresh_mapper() -> CompilationUnit {
        let mut unit = CompilationUnit::new(
            UnitKind::Interface,
            JavaType::new("com.example.mapper.OrderMapper"),
        );
        unit.add_import_name("org.apache.ibatis.annotations.Mapper");
        unit.add_annotation("@Mapper");
        let mut count = Method::abstract_method("count", JavaType::long());
        count.add_parameter(Parameter::new(JavaType::string(), "where"));
        unit.add_member(Member::Method(count));
        let mut delete = Method::default_method("deleteAll", JavaType::int());
        delete.add_body_line("return 0;");
        unit.add_member(Member::Method(delete));
        unit
    }

    #[test]
    fn regenerated_output_merges_to_itself() {
        let fresh = fresh_mapper();
        let first = render_unit(&fresh);
        let outcome = merge_java(&first, &fresh).expect("merge");
        assert_eq!(outcome.content, first);
        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.kept, 0);
    }

    #[test]
    fn custom_imports_supertypes_and_annotations_survive() {
        let existing = "package com.example.mapper;

import com.example.audit.Audited;
import java.io.Serializable;

@Mapper
@Audited(level = \"full\")
public interface OrderMapper extends Serializable {
    /**
     * @mapforge.generated
     */
    long count(String where);
}
";
        let outcome = merge_java(existing, &fresh_mapper()).expect("merge");
        assert!(outcome.content.contains("import com.example.audit.Audited;"));
        assert!(outcome.content.contains("@Mapper\n@Audited(level = \"full\")\npublic interface OrderMapper extends Serializable {"));
        assert_eq!(outcome.content.matches("long count(String where);").count(), 1);
        assert!(outcome.content.contains("default int deleteAll()"));
    }

    #[test]
    fn hand_written_member_shadows_the_generated_one() {
        let existing = "package com.example.mapper;

public interface OrderMapper {
    /**
     * @mapforge.generated do_not_delete_during_merge
     */
    default int deleteAll() {
        return -1;
    }
}
";
        let outcome = merge_java(existing, &fresh_mapper()).expect("merge");
        assert_eq!(outcome.shadowed, 1);
        assert_eq!(outcome.kept, 1);
        assert!(outcome.content.contains("return -1;"));
        assert!(!outcome.content.contains("return 0;"));
        let hand = outcome.content.find("deleteAll").expect("kept");
        let generated = outcome.content.find("long count").expect("added");
        assert!(hand < generated);
    }

    #[test]
    fn incompatible_files_conflict() {
        let fresh = fresh_mapper();
        let wrong_kind = "package com.example.mapper;\n\npublic class OrderMapper {\n}\n";
        let wrong_package = "package com.example.other;\n\npublic interface OrderMapper {\n}\n";
        let unparseable = "package com.example.mapper;\n\npublic interface OrderMapper {\n";
        assert!(matches!(merge_java(wrong_kind, &fresh), Err(MergeError::Conflict(_))));
        assert!(matches!(merge_java(wrong_package, &fresh), Err(MergeError::Conflict(_))));
        assert!(matches!(merge_java(unparseable, &fresh), Err(MergeError::Unparseable(_))));
    }

    #[test]
    fn qualified_parameter_types_match_simple_ones() {
        assert_eq!(
            simple_signature("find(java.util.List<com.example.Order>,int[],java.lang.String...)"),
            "find(List<Order>,int[],String...)"
        );
        assert_eq!(simple_signature("field:selectList"), "field:selectList");

        let existing = "package com.example.mapper;

public interface OrderMapper {
    long count(java.lang.String where);
}
";
        let outcome = merge_java(existing, &fresh_mapper()).expect("merge");
        assert_eq!(outcome.shadowed, 1);
        assert_eq!(outcome.content.matches(" count(").count(), 1);
        assert!(outcome.content.contains("long count(java.lang.String where);"));
    }

    #[test]
    fn superclasses_must_agree() {
        let mut fresh = CompilationUnit::new(UnitKind::Class, JavaType::new("com.example.model.Order"));
        fresh.superclass = Some(JavaType::new("com.example.model.BaseRecord"));
        let existing = "package com.example.model;\n\npublic class Order extends Entity {\n}\n";
        assert!(matches!(merge_java(existing, &fresh), Err(MergeError::Conflict(_))));

        let compatible = "package com.example.model;\n\npublic class Order extends com.example.model.BaseRecord {\n}\n";
        assert!(merge_java(compatible, &fresh).is_ok());
    }
}
