use std::fs;
use std::path::{Path, PathBuf};

use mapforge_core::{ColumnDescriptor, FullyQualifiedTable, JavaType, TableDescriptor};
use mapforge_generate::{
    Cancellation, ExtensionPipeline, GenerateOptions, GeneratedFile, GenerationEngine, IssueLevel,
    codes,
};
use mapforge_merge::{
    DirectoryResolver, FileWriter, MergeError, RootResolver, WriteAction, WriteOptions, merge_java,
};
use pretty_assertions::assert_eq;

fn orders() -> TableDescriptor {
    TableDescriptor::new(
        FullyQualifiedTable::new(None, Some("public"), "orders"),
        vec![
            ColumnDescriptor::new("id", JavaType::new("java.lang.Integer"), "INTEGER"),
            ColumnDescriptor::new("customer_name", JavaType::string(), "VARCHAR"),
        ],
        vec!["id".to_string()],
    )
    .with_packages("com.example.model", "com.example.mapper")
}

fn generate() -> Vec<GeneratedFile> {
    GenerationEngine::new(GenerateOptions::default(), ExtensionPipeline::new())
        .generate_table(&orders())
        .files
}

fn mapper(files: &[GeneratedFile]) -> &GeneratedFile {
    files
        .iter()
        .find(|file| file.file_name == "OrdersMapper.java")
        .expect("mapper generated")
}

fn mapper_path(root: &Path) -> PathBuf {
    root.join("src/main/java/com/example/mapper/OrdersMapper.java")
}

fn writer(root: &Path, options: WriteOptions) -> FileWriter<RootResolver> {
    FileWriter::new(RootResolver::new(root), options)
}

#[test]
fn second_run_leaves_files_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let files = generate();
    let writer = writer(dir.path(), WriteOptions::default());

    let first = writer.write_all(&files, &Cancellation::new());
    assert_eq!(first.count(WriteAction::Created), 3);
    let written = fs::read(mapper_path(dir.path())).expect("read mapper");

    let second = writer.write_all(&generate(), &Cancellation::new());
    assert_eq!(second.count(WriteAction::Unchanged), 3);
    assert!(second.issues.is_empty());
    assert_eq!(fs::read(mapper_path(dir.path())).expect("read mapper"), written);
}

#[test]
fn hand_added_method_survives_regeneration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = mapper_path(dir.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(
        &path,
        "package com.example.mapper;

import com.example.model.Orders;
import java.time.Clock;

@Mapper
public interface OrdersMapper {
    /**
     * @mapforge.generated
     */
    int obsoleteMethod(Orders row);

    default int archive(Orders row, Clock clock) {
        return 0;
    }
}
",
    )
    .expect("seed existing mapper");

    let files = generate();
    let report = writer(dir.path(), WriteOptions::default())
        .write_all(&files, &Cancellation::new());
    assert_eq!(report.count(WriteAction::Merged), 1);

    let merged = fs::read_to_string(&path).expect("read merged");
    assert!(!merged.contains("obsoleteMethod"));
    assert_eq!(merged.matches("default int archive(Orders row, Clock clock)").count(), 1);
    assert!(merged.contains("import java.time.Clock;"));
    for method in mapper(&files).unit.methods() {
        let declaration = format!(" {}(", method.name);
        assert!(merged.contains(&declaration), "missing {}", method.name);
    }
    assert_eq!(merged.matches("deleteByPrimaryKey(Integer id_)").count(), 1);

    let again = merge_java(&merged, &mapper(&files).unit).expect("merge again");
    assert_eq!(again.content, merged);
}

fn seed(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("seed existing file");
}

#[test]
fn comments_outside_members_survive_regeneration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = mapper_path(dir.path());
    seed(
        &path,
        "// Copyright Example Corp.
package com.example.mapper;

/**
 * Hand-written docs for OrdersMapper.
 */
@Mapper
public interface OrdersMapper {
    int LIMIT = 10; // tuned by ops, do not change
    /**
     * @mapforge.generated
     */
    int obsoleteMethod();
}
// keep in sync with OrdersService
",
    );

    let writer = writer(dir.path(), WriteOptions::default());
    let report = writer.write_all(&generate(), &Cancellation::new());
    assert_eq!(report.count(WriteAction::Merged), 1);

    let merged = fs::read_to_string(&path).expect("read merged");
    assert!(merged.starts_with("// Copyright Example Corp.\n\npackage com.example.mapper;"));
    assert!(merged.contains("/**\n * Hand-written docs for OrdersMapper.\n */\n@Mapper\n"));
    assert!(merged.contains("    int LIMIT = 10; // tuned by ops, do not change\n"));
    assert!(merged.ends_with("}\n// keep in sync with OrdersService\n"));
    assert!(!merged.contains("obsoleteMethod"));

    let again = writer.write_all(&generate(), &Cancellation::new());
    assert_eq!(again.count(WriteAction::Unchanged), 3);
    assert_eq!(fs::read_to_string(&path).expect("read"), merged);
}

#[test]
fn qualified_hand_written_signature_replaces_generated_method() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = mapper_path(dir.path());
    seed(
        &path,
        "package com.example.mapper;

public interface OrdersMapper {
    default int deleteByPrimaryKey(java.lang.Integer id_) {
        return -1;
    }
}
",
    );

    let report = writer(dir.path(), WriteOptions::default())
        .write_all(&generate(), &Cancellation::new());
    assert_eq!(report.count(WriteAction::Merged), 1);

    let merged = fs::read_to_string(&path).expect("read merged");
    assert_eq!(merged.matches("int deleteByPrimaryKey(").count(), 1);
    assert!(merged.contains("deleteByPrimaryKey(java.lang.Integer id_)"));
    assert!(merged.contains("return -1;"));
}

#[test]
fn non_mergeable_files_are_disambiguated_or_overwritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = mapper_path(dir.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, "hand written").expect("seed");

    let no_merge = WriteOptions {
        overwrite: false,
        merge: false,
    };
    let report = writer(dir.path(), no_merge).write_all(&generate(), &Cancellation::new());
    assert_eq!(report.count(WriteAction::Disambiguated), 1);
    assert_eq!(report.issues_by_code.get(codes::DISAMBIGUATED), Some(&1));
    assert_eq!(fs::read_to_string(&path).expect("read"), "hand written");
    let copy = path.with_file_name("OrdersMapper.java.1");
    assert!(fs::read_to_string(copy).expect("copy").contains("interface OrdersMapper"));

    let overwrite = WriteOptions {
        overwrite: true,
        merge: false,
    };
    let report = writer(dir.path(), overwrite).write_all(&generate(), &Cancellation::new());
    assert_eq!(report.count(WriteAction::Overwritten), 3);
    assert_eq!(report.issues_by_code.get(codes::OVERWRITTEN), Some(&3));
    assert!(fs::read_to_string(&path).expect("read").contains("interface OrdersMapper"));
}

#[test]
fn merge_conflicts_skip_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = mapper_path(dir.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    let existing = "package com.example.mapper;\n\npublic class OrdersMapper {\n";
    fs::write(&path, existing).expect("seed");

    let report = writer(dir.path(), WriteOptions::default())
        .write_all(&generate(), &Cancellation::new());
    assert_eq!(report.count(WriteAction::Skipped), 1);
    assert_eq!(report.count(WriteAction::Created), 2);
    assert_eq!(report.issues_by_code.get(codes::MERGE_CONFLICT), Some(&1));
    assert_eq!(report.errors(), 1);
    assert_eq!(report.issues[0].level, IssueLevel::Error);
    assert_eq!(fs::read_to_string(&path).expect("read"), existing);
    assert!(!path.with_file_name("OrdersMapper.java.1").exists());
}

struct Unavailable;

impl DirectoryResolver for Unavailable {
    fn resolve(&self, target_dir: &str, _package: &str) -> mapforge_merge::Result<PathBuf> {
        Err(MergeError::Directory {
            dir: target_dir.to_string(),
            reason: "read-only volume".to_string(),
        })
    }
}

#[test]
fn unresolvable_directories_are_reported() {
    let report = FileWriter::new(Unavailable, WriteOptions::default())
        .write_all(&generate(), &Cancellation::new());
    assert_eq!(report.count(WriteAction::Skipped), 3);
    assert_eq!(
        report.issues_by_code.get(codes::DIRECTORY_RESOLUTION_ERROR),
        Some(&3)
    );
    assert!(report.issues[0].message.contains("read-only volume"));
}

#[test]
fn same_path_files_are_written_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let files = generate();
    let twice = vec![mapper(&files).clone(), mapper(&files).clone()];
    let report = writer(dir.path(), WriteOptions::default())
        .write_all(&twice, &Cancellation::new());
    let actions: Vec<WriteAction> = report.files.iter().map(|file| file.action).collect();
    assert_eq!(actions, vec![WriteAction::Created, WriteAction::Unchanged]);
}

#[test]
fn cancellation_stops_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cancel = Cancellation::new();
    cancel.cancel();
    let report = writer(dir.path(), WriteOptions::default()).write_all(&generate(), &cancel);
    assert!(report.cancelled);
    assert!(report.files.is_empty());
    assert!(!mapper_path(dir.path()).exists());
}

/// Cancels the run once the first directory has been resolved.
struct CancelAfterFirst {
    inner: RootResolver,
    cancel: Cancellation,
}

impl DirectoryResolver for CancelAfterFirst {
    fn resolve(&self, target_dir: &str, package: &str) -> mapforge_merge::Result<PathBuf> {
        let dir = self.inner.resolve(target_dir, package)?;
        self.cancel.cancel();
        Ok(dir)
    }
}

#[test]
fn cancelled_run_reports_files_already_published() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cancel = Cancellation::new();
    let files = generate();
    let twice = vec![mapper(&files).clone(), mapper(&files).clone()];
    let resolver = CancelAfterFirst {
        inner: RootResolver::new(dir.path()),
        cancel: cancel.clone(),
    };

    let report = FileWriter::new(resolver, WriteOptions::default()).write_all(&twice, &cancel);
    assert!(report.cancelled);
    let actions: Vec<WriteAction> = report.files.iter().map(|file| file.action).collect();
    assert_eq!(actions, vec![WriteAction::Created]);
    assert!(mapper_path(dir.path()).exists());
}
