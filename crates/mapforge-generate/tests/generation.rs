use std::sync::{Arc, Mutex};

use mapforge_core::{
    ColumnDescriptor, FullyQualifiedTable, GeneratedKey, JavaType, KeyTiming, TableDescriptor,
};
use mapforge_generate::{
    ArtifactKind, Cancellation, ExtensionPipeline, GenerateOptions, GeneratedFile,
    GenerationEngine, Interceptor, Rules, Subject, Verdict, codes,
};
use pretty_assertions::assert_eq;

fn int(name: &str) -> ColumnDescriptor {
    ColumnDescriptor::new(name, JavaType::new("java.lang.Integer"), "INTEGER")
}

fn varchar(name: &str) -> ColumnDescriptor {
    ColumnDescriptor::new(name, JavaType::string(), "VARCHAR")
}

fn descriptor(name: &str, columns: Vec<ColumnDescriptor>, pk: &[&str]) -> TableDescriptor {
    TableDescriptor::new(
        FullyQualifiedTable::new(None, Some("public"), name),
        columns,
        pk.iter().map(|s| s.to_string()).collect(),
    )
    .with_packages("com.example.model", "com.example.mapper")
}

fn pkonly() -> TableDescriptor {
    descriptor("pkonly", vec![int("id"), int("seq_num")], &["id", "seq_num"])
}

fn orders() -> TableDescriptor {
    descriptor(
        "orders",
        vec![
            int("id").identity(),
            int("seq"),
            varchar("customer_name"),
            ColumnDescriptor::new("total", JavaType::new("java.math.BigDecimal"), "NUMERIC")
                .generated_always(),
        ],
        &["id"],
    )
    .with_generated_key(GeneratedKey::CustomSelect {
        column: "seq".to_string(),
        statement: "select nextval('orders_seq')".to_string(),
        timing: KeyTiming::Before,
    })
}

fn engine() -> GenerationEngine {
    GenerationEngine::new(GenerateOptions::default(), ExtensionPipeline::new())
}

fn file<'a>(files: &'a [GeneratedFile], name: &str) -> &'a GeneratedFile {
    files
        .iter()
        .find(|file| file.file_name == name)
        .unwrap_or_else(|| panic!("{name} not generated"))
}

fn method_names(file: &GeneratedFile) -> Vec<String> {
    file.unit.methods().map(|method| method.name.clone()).collect()
}

#[test]
fn primary_key_only_table_scenario() {
    let rules = Rules::evaluate(&pkonly());
    assert!(rules.insert);
    assert!(rules.delete_by_primary_key);
    assert!(rules.select_by_example());
    assert!(rules.count_by_example);
    assert!(!rules.select_by_primary_key);

    let output = engine().generate_table(&pkonly());
    let mapper = file(&output.files, "PkonlyMapper.java");
    let names = method_names(mapper);
    for expected in ["insert", "deleteByPrimaryKey", "select", "selectDistinct", "count"] {
        assert!(names.iter().any(|name| name == expected), "missing {expected}");
    }
    assert!(!names.iter().any(|name| name == "selectByPrimaryKey"));
    assert!(!names.iter().any(|name| name == "updateByPrimaryKey"));

    assert!(mapper.content.contains(
        "    default int deleteByPrimaryKey(Integer id_, Integer seqNum_) {
        return delete(c ->
            c.where(id, isEqualTo(id_))
            .and(seqNum, isEqualTo(seqNum_))
        );
    }"
    ));
}

#[test]
fn selective_insert_treats_identity_sequence_and_ordinary_columns_differently() {
    let output = engine().generate_table(&orders());
    let mapper = file(&output.files, "OrdersMapper.java");
    let method = mapper
        .unit
        .method("insertSelective")
        .expect("insertSelective generated");

    assert_eq!(
        method.body,
        vec![
            "return MyBatis3Utils.insert(this::insert, row, orders, c ->",
            "    c.map(seq).toProperty(\"seq\")",
            "    .map(customerName).toPropertyWhenPresent(\"customerName\", row::getCustomerName)",
            ");",
        ]
    );
    assert!(mapper.content.contains(
        "@SelectKey(statement=\"select nextval('orders_seq')\", keyProperty=\"row.seq\", before=true, resultType=Integer.class)"
    ));
}

#[test]
fn custom_key_rules_out_multi_row_insert() {
    let output = engine().generate_table(&orders());
    let mapper = file(&output.files, "OrdersMapper.java");
    assert!(mapper.unit.method("insertMultiple").is_none());

    let plain = descriptor("plain", vec![int("id"), varchar("name")], &["id"]);
    let output = engine().generate_table(&plain);
    let mapper = file(&output.files, "PlainMapper.java");
    assert!(mapper.unit.method("insertMultiple").is_some());
}

#[test]
fn zero_key_table_still_generates_example_methods() {
    let table = descriptor("audit_log", vec![varchar("message"), varchar("actor")], &[]);
    let output = engine().generate_table(&table);
    let mapper = file(&output.files, "AuditLogMapper.java");
    let names = method_names(mapper);
    assert!(names.iter().any(|name| name == "delete"));
    assert!(names.iter().any(|name| name == "updateAllColumns"));
    assert!(!names.iter().any(|name| name.ends_with("ByPrimaryKey")));
    assert!(!mapper.content.contains("isEqualTo"));
}

#[test]
fn imports_are_declared_once_per_unit() {
    let output = engine().generate_table(&orders());
    let mapper = file(&output.files, "OrdersMapper.java");
    assert_eq!(
        mapper
            .content
            .matches("import com.example.model.Orders;")
            .count(),
        1
    );
    assert_eq!(
        mapper
            .content
            .matches("import org.mybatis.dynamic.sql.util.SqlProviderAdapter;")
            .count(),
        1
    );
    assert!(mapper.content.contains("import static com.example.mapper.OrdersDynamicSqlSupport.*;"));
}

#[test]
fn support_class_renders_table_and_columns() {
    let output = engine().generate_table(&pkonly());
    let support = file(&output.files, "PkonlyDynamicSqlSupport.java");
    let expected = "package com.example.mapper;

import java.sql.JDBCType;
import org.mybatis.dynamic.sql.AliasableSqlTable;
import org.mybatis.dynamic.sql.SqlColumn;

public final class PkonlyDynamicSqlSupport {
    /**
     * @mapforge.generated
     */
    public static final Pkonly pkonly = new Pkonly();

    /**
     * @mapforge.generated
     */
    public static final SqlColumn<Integer> id = pkonly.id;

    /**
     * @mapforge.generated
     */
    public static final SqlColumn<Integer> seqNum = pkonly.seqNum;

    /**
     * @mapforge.generated
     */
    public static final class Pkonly extends AliasableSqlTable<Pkonly> {
        public final SqlColumn<Integer> id = column(\"id\", JDBCType.INTEGER);

        public final SqlColumn<Integer> seqNum = column(\"seq_num\", JDBCType.INTEGER);

        public Pkonly() {
            super(\"public.pkonly\", Pkonly::new);
        }
    }
}
";
    assert_eq!(support.content, expected);
}

#[test]
fn constructor_based_records_are_immutable() {
    let table = pkonly().with_constructor_based(true);
    let output = engine().generate_table(&table);
    let record = file(&output.files, "Pkonly.java");

    assert!(record.content.contains("    private final Integer seqNum;"));
    assert!(record.content.contains("    public Pkonly(Integer id, Integer seqNum) {"));
    assert!(!record.content.contains("setId"));

    let mapper = file(&output.files, "PkonlyMapper.java");
    assert!(mapper.content.contains("@ConstructorArgs({"));
    assert!(
        mapper
            .content
            .contains("@Arg(column=\"id\", javaType=Integer.class, jdbcType=JdbcType.INTEGER, id=true),")
    );
}

struct Veto {
    calls: Arc<Mutex<Vec<&'static str>>>,
    id: &'static str,
    verdict: Verdict,
}

impl Interceptor for Veto {
    fn id(&self) -> &'static str {
        self.id
    }

    fn intercept(
        &self,
        _kind: ArtifactKind,
        _subject: &mut Subject<'_>,
        _table: &TableDescriptor,
    ) -> Verdict {
        self.calls.lock().expect("lock").push(self.id);
        self.verdict
    }
}

#[test]
fn vetoed_artifacts_are_reported_after_the_whole_chain_runs() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = ExtensionPipeline::new();
    pipeline.register(
        ArtifactKind::InsertSelective,
        Arc::new(Veto {
            calls: Arc::clone(&calls),
            id: "reject_selective",
            verdict: Verdict::Reject,
        }),
    );
    pipeline.register(
        ArtifactKind::InsertSelective,
        Arc::new(Veto {
            calls: Arc::clone(&calls),
            id: "observer",
            verdict: Verdict::Accept,
        }),
    );

    let engine = GenerationEngine::new(GenerateOptions::default(), pipeline);
    let output = engine.generate_table(&orders());
    let mapper = file(&output.files, "OrdersMapper.java");

    assert!(mapper.unit.method("insertSelective").is_none());
    assert_eq!(*calls.lock().expect("lock"), vec!["reject_selective", "observer"]);
    let veto = output
        .issues
        .iter()
        .find(|issue| issue.code == codes::PLUGIN_VETO)
        .expect("veto reported");
    assert_eq!(veto.artifact.as_deref(), Some("insertSelective"));
    assert_eq!(output.report.artifacts_skipped, 1);
}

#[test]
fn vetoed_unit_drops_the_file() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = ExtensionPipeline::new();
    pipeline.register(
        ArtifactKind::SupportClass,
        Arc::new(Veto {
            calls,
            id: "no_support",
            verdict: Verdict::Reject,
        }),
    );
    let engine = GenerationEngine::new(GenerateOptions::default(), pipeline);
    let output = engine.generate_table(&pkonly());
    let names: Vec<&str> = output.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["Pkonly.java", "PkonlyMapper.java"]);
}

#[test]
fn runs_are_deterministic_and_ordered() {
    let tables = vec![orders(), pkonly()];
    let first = engine()
        .run(&tables, &Cancellation::new())
        .expect("generation run");
    let second = engine()
        .run(&tables, &Cancellation::new())
        .expect("generation run");

    let contents = |files: &[GeneratedFile]| -> Vec<String> {
        files.iter().map(|file| file.content.clone()).collect()
    };
    assert_eq!(contents(&first.files), contents(&second.files));
    assert_eq!(first.report.tables[0].table, "orders");
    assert_eq!(first.report.tables[1].table, "pkonly");
    assert_eq!(first.report.files_generated(), 6);
}
