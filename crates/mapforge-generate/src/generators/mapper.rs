//! Mapper interface members: provider-backed abstract methods plus the DSL
//! convenience methods layered on top of them.

use mapforge_core::{JavaType, TableDescriptor};

use crate::dom::{CompilationUnit, Field, Member, Method, Parameter, UnitKind};
use crate::fragments::{
    AssignmentMode, AssignmentTarget, FragmentUnit, KeyBinding, ResultMapping,
};
use crate::generators::{
    Artifact, ArtifactKind, FileKind, Generated, GenerationInput, GeneratorRegistry,
};
use crate::model::{GenerationIssue, codes};
use crate::rules::multiple_row_insert_conflict;

const MAPPER: &str = "org.apache.ibatis.annotations.Mapper";
const PARAM: &str = "org.apache.ibatis.annotations.Param";
const INSERT: &str = "org.apache.ibatis.annotations.Insert";
const OPTIONS: &str = "org.apache.ibatis.annotations.Options";
const RESULT_MAP: &str = "org.apache.ibatis.annotations.ResultMap";
const SELECT_PROVIDER: &str = "org.apache.ibatis.annotations.SelectProvider";
const DELETE_PROVIDER: &str = "org.apache.ibatis.annotations.DeleteProvider";
const INSERT_PROVIDER: &str = "org.apache.ibatis.annotations.InsertProvider";
const UPDATE_PROVIDER: &str = "org.apache.ibatis.annotations.UpdateProvider";
const SQL_PROVIDER_ADAPTER: &str = "org.mybatis.dynamic.sql.util.SqlProviderAdapter";
const BASIC_COLUMN: &str = "org.mybatis.dynamic.sql.BasicColumn";
const SELECT_STATEMENT: &str = "org.mybatis.dynamic.sql.select.render.SelectStatementProvider";
const DELETE_STATEMENT: &str = "org.mybatis.dynamic.sql.delete.render.DeleteStatementProvider";
const INSERT_STATEMENT: &str = "org.mybatis.dynamic.sql.insert.render.InsertStatementProvider";
const MULTI_INSERT_STATEMENT: &str =
    "org.mybatis.dynamic.sql.insert.render.MultiRowInsertStatementProvider";
const UPDATE_STATEMENT: &str = "org.mybatis.dynamic.sql.update.render.UpdateStatementProvider";
const UPDATE_DSL: &str = "org.mybatis.dynamic.sql.update.UpdateDSL";
const UPDATE_MODEL: &str = "org.mybatis.dynamic.sql.update.UpdateModel";
const COUNT_COMPLETER: &str = "org.mybatis.dynamic.sql.util.mybatis3.CountDSLCompleter";
const DELETE_COMPLETER: &str = "org.mybatis.dynamic.sql.util.mybatis3.DeleteDSLCompleter";
const SELECT_COMPLETER: &str = "org.mybatis.dynamic.sql.util.mybatis3.SelectDSLCompleter";
const UPDATE_COMPLETER: &str = "org.mybatis.dynamic.sql.util.mybatis3.UpdateDSLCompleter";
const MYBATIS3_UTILS: &str = "org.mybatis.dynamic.sql.util.mybatis3.MyBatis3Utils";

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register("mapper.basic_count", FileKind::Mapper, basic_count);
    registry.register("mapper.basic_delete", FileKind::Mapper, basic_delete);
    registry.register("mapper.basic_insert", FileKind::Mapper, basic_insert);
    registry.register("mapper.basic_insert_multiple", FileKind::Mapper, basic_insert_multiple);
    registry.register("mapper.basic_select_many", FileKind::Mapper, basic_select_many);
    registry.register("mapper.basic_select_one", FileKind::Mapper, basic_select_one);
    registry.register("mapper.basic_update", FileKind::Mapper, basic_update);
    registry.register("mapper.count", FileKind::Mapper, count);
    registry.register("mapper.delete", FileKind::Mapper, delete);
    registry.register("mapper.delete_by_primary_key", FileKind::Mapper, delete_by_primary_key);
    registry.register("mapper.insert", FileKind::Mapper, insert);
    registry.register("mapper.insert_multiple", FileKind::Mapper, insert_multiple);
    registry.register("mapper.insert_selective", FileKind::Mapper, insert_selective);
    registry.register("mapper.select_list", FileKind::Mapper, select_list);
    registry.register("mapper.select_one", FileKind::Mapper, select_one);
    registry.register("mapper.select", FileKind::Mapper, select);
    registry.register("mapper.select_distinct", FileKind::Mapper, select_distinct);
    registry.register("mapper.select_by_primary_key", FileKind::Mapper, select_by_primary_key);
    registry.register("mapper.update", FileKind::Mapper, update);
    registry.register("mapper.update_all_columns", FileKind::Mapper, update_all_columns);
    registry.register(
        "mapper.update_selective_columns",
        FileKind::Mapper,
        update_selective_columns,
    );
    registry.register("mapper.update_by_primary_key", FileKind::Mapper, update_by_primary_key);
    registry.register(
        "mapper.update_by_primary_key_selective",
        FileKind::Mapper,
        update_by_primary_key_selective,
    );
}

/// Mapper interface with its type-level annotation, static imports and
/// optional root interface.
pub fn skeleton(table: &TableDescriptor) -> CompilationUnit {
    let mut unit = CompilationUnit::new(UnitKind::Interface, table.mapper_type());
    unit.add_import_name(MAPPER);
    unit.add_annotation("@Mapper");
    unit.add_static_import(format!(
        "{}.*",
        table.support_type().fully_qualified_name()
    ));
    if let Some(root) = table.root_interface() {
        unit.add_super_interface(root.clone());
    }
    unit
}

fn provider(annotation: &str, method: &str) -> String {
    format!("@{annotation}(type=SqlProviderAdapter.class, method=\"{method}\")")
}

fn method_artifact(kind: ArtifactKind, method: Method, imports: &[&str]) -> Artifact {
    let mut types: Vec<JavaType> = method
        .parameters
        .iter()
        .map(|parameter| parameter.java_type.clone())
        .collect();
    types.extend(method.return_type.clone());

    let mut artifact = Artifact::new(kind, Member::Method(method));
    for name in imports {
        artifact.import(name);
    }
    for java_type in &types {
        artifact.import_type(java_type);
    }
    artifact
}

fn key_gap(table: &TableDescriptor, kind: ArtifactKind) -> Option<GenerationIssue> {
    let key = table.generated_key()?;
    if table.column(key.column()).is_some() {
        return None;
    }
    Some(
        GenerationIssue::warning(
            codes::INTROSPECTION_GAP,
            format!(
                "generated key column '{}' not found; key retrieval omitted",
                key.column()
            ),
        )
        .for_table(table)
        .for_artifact(kind),
    )
}

/// A lambda chain needs at least the completer itself when every column was
/// filtered out of the assignment fragment.
fn ensure_chain_start(fragment: &mut FragmentUnit) {
    if fragment.lines.is_empty() {
        fragment.lines.push("    c".to_string());
    }
}

fn basic_count(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.count_by_example {
        return Generated::NotApplicable;
    }
    let mut method = Method::abstract_method("count", JavaType::long());
    method.add_annotation(provider("SelectProvider", "select"));
    method.add_parameter(Parameter::new(JavaType::new(SELECT_STATEMENT), "selectStatement"));
    Generated::one(method_artifact(
        ArtifactKind::BasicCount,
        method,
        &[SELECT_PROVIDER, SQL_PROVIDER_ADAPTER],
    ))
}

fn basic_delete(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.basic_delete() {
        return Generated::NotApplicable;
    }
    let mut method = Method::abstract_method("delete", JavaType::int());
    method.add_annotation(provider("DeleteProvider", "delete"));
    method.add_parameter(Parameter::new(JavaType::new(DELETE_STATEMENT), "deleteStatement"));
    Generated::one(method_artifact(
        ArtifactKind::BasicDelete,
        method,
        &[DELETE_PROVIDER, SQL_PROVIDER_ADAPTER],
    ))
}

fn basic_insert(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.insert {
        return Generated::NotApplicable;
    }
    let record = input.table.record_type();
    let mut method = Method::abstract_method("insert", JavaType::int());
    method.add_annotation(provider("InsertProvider", "insert"));
    method.add_parameter(Parameter::new(
        JavaType::new(INSERT_STATEMENT).with_argument(record),
        "insertStatement",
    ));

    let key = input.fragments.generated_key("row");
    if let Some(key) = &key {
        key.apply_to(&mut method);
    }
    let mut artifact = method_artifact(
        ArtifactKind::BasicInsert,
        method,
        &[INSERT_PROVIDER, SQL_PROVIDER_ADAPTER],
    );
    if let Some(key) = &key {
        artifact.absorb(key);
    }
    artifact
        .issues
        .extend(key_gap(input.table, ArtifactKind::BasicInsert));
    Generated::one(artifact)
}

fn basic_insert_multiple(input: &GenerationInput<'_>) -> Generated {
    if input.rules.insert && multiple_row_insert_conflict(input.table) {
        return Generated::Skipped(
            GenerationIssue::error(
                codes::CONFIGURATION_ERROR,
                "multi-row insert requested but a custom key statement cannot run per row",
            )
            .for_table(input.table)
            .for_artifact(ArtifactKind::BasicInsertMultiple),
        );
    }
    if !input.rules.insert_multiple {
        return Generated::NotApplicable;
    }

    let record = input.table.record_type();
    let provider_type = JavaType::new(MULTI_INSERT_STATEMENT).with_argument(record.clone());
    let key = input.fragments.generated_key("records");

    let Some(key) = key else {
        let mut method = Method::abstract_method("insertMultiple", JavaType::int());
        method.add_annotation(provider("InsertProvider", "insertMultiple"));
        method.add_parameter(Parameter::new(provider_type, "multipleInsertStatement"));
        let mut artifact = method_artifact(
            ArtifactKind::BasicInsertMultiple,
            method,
            &[INSERT_PROVIDER, SQL_PROVIDER_ADAPTER],
        );
        artifact
            .issues
            .extend(key_gap(input.table, ArtifactKind::BasicInsertMultiple));
        return Generated::one(artifact);
    };

    // Keys come back only through a plain statement bound to the record list.
    let mut statement = Method::abstract_method("insertMultiple", JavaType::int());
    statement.add_annotation("@Insert({");
    statement.add_annotation("    \"${insertStatement}\"");
    statement.add_annotation("})");
    key.apply_to(&mut statement);
    statement.add_parameter(
        Parameter::new(JavaType::string(), "insertStatement")
            .with_annotation("@Param(\"insertStatement\")"),
    );
    statement.add_parameter(
        Parameter::new(JavaType::list_of(record), "records").with_annotation("@Param(\"records\")"),
    );
    let mut statement = method_artifact(
        ArtifactKind::BasicInsertMultiple,
        statement,
        &[INSERT, OPTIONS, PARAM],
    );
    statement.absorb(&key);

    let mut helper = Method::default_method("insertMultiple", JavaType::int());
    helper.add_parameter(Parameter::new(provider_type, "multipleInsertStatement"));
    helper.add_body_line(
        "return insertMultiple(multipleInsertStatement.getInsertStatement(), multipleInsertStatement.getRecords());",
    );
    let helper = method_artifact(ArtifactKind::BasicInsertMultiple, helper, &[]);

    Generated::Artifacts(vec![statement, helper])
}

fn result_mapping(table: &TableDescriptor) -> ResultMapping {
    if table.is_constructor_based() {
        ResultMapping::ConstructorArgs
    } else {
        ResultMapping::Results {
            id: table.result_map_id(),
        }
    }
}

fn basic_select_many(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.select_by_example() {
        return Generated::NotApplicable;
    }
    let record = input.table.record_type();
    let mut method = Method::abstract_method("selectMany", JavaType::list_of(record));
    method.add_annotation(provider("SelectProvider", "select"));
    method.add_parameter(Parameter::new(JavaType::new(SELECT_STATEMENT), "selectStatement"));

    let mapping = input.fragments.result_mapping(&result_mapping(input.table));
    mapping.apply_to(&mut method);
    let mut artifact = method_artifact(
        ArtifactKind::BasicSelectMany,
        method,
        &[SELECT_PROVIDER, SQL_PROVIDER_ADAPTER],
    );
    artifact.absorb(&mapping);
    Generated::one(artifact)
}

fn basic_select_one(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.basic_select_one() {
        return Generated::NotApplicable;
    }
    let table = input.table;
    let record = table.record_type();
    let mut method = Method::abstract_method("selectOne", JavaType::optional_of(record));
    method.add_annotation(provider("SelectProvider", "select"));
    method.add_parameter(Parameter::new(JavaType::new(SELECT_STATEMENT), "selectStatement"));

    let reuse = !table.is_constructor_based() && input.unit.declares_result_map(&table.result_map_id());
    let mut imports = vec![SELECT_PROVIDER, SQL_PROVIDER_ADAPTER];
    let mapping = if reuse {
        method.add_annotation(format!("@ResultMap(\"{}\")", table.result_map_id()));
        imports.push(RESULT_MAP);
        None
    } else {
        let mapping = input.fragments.result_mapping(&result_mapping(table));
        mapping.apply_to(&mut method);
        Some(mapping)
    };

    let mut artifact = method_artifact(ArtifactKind::BasicSelectOne, method, &imports);
    if let Some(mapping) = &mapping {
        artifact.absorb(mapping);
    }
    Generated::one(artifact)
}

fn basic_update(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.basic_update() {
        return Generated::NotApplicable;
    }
    let mut method = Method::abstract_method("update", JavaType::int());
    method.add_annotation(provider("UpdateProvider", "update"));
    method.add_parameter(Parameter::new(JavaType::new(UPDATE_STATEMENT), "updateStatement"));
    Generated::one(method_artifact(
        ArtifactKind::BasicUpdate,
        method,
        &[UPDATE_PROVIDER, SQL_PROVIDER_ADAPTER],
    ))
}

fn count(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.count_by_example {
        return Generated::NotApplicable;
    }
    let mut method = Method::default_method("count", JavaType::long());
    method.add_parameter(Parameter::new(JavaType::new(COUNT_COMPLETER), "completer"));
    method.add_body_line(format!(
        "return MyBatis3Utils.countFrom(this::count, {}, completer);",
        input.table.table_field_name()
    ));
    Generated::one(method_artifact(ArtifactKind::Count, method, &[MYBATIS3_UTILS]))
}

fn delete(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.basic_delete() {
        return Generated::NotApplicable;
    }
    let mut method = Method::default_method("delete", JavaType::int());
    method.add_parameter(Parameter::new(JavaType::new(DELETE_COMPLETER), "completer"));
    method.add_body_line(format!(
        "return MyBatis3Utils.deleteFrom(this::delete, {}, completer);",
        input.table.table_field_name()
    ));
    Generated::one(method_artifact(ArtifactKind::Delete, method, &[MYBATIS3_UTILS]))
}

fn delete_by_primary_key(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.delete_by_primary_key {
        return Generated::NotApplicable;
    }
    let conditions = input.fragments.primary_key_equality(KeyBinding::ParameterBound);
    let mut method = Method::default_method("deleteByPrimaryKey", JavaType::int());
    method.add_body_line("return delete(c ->");
    conditions.apply_to(&mut method);
    method.add_body_line(");");

    let mut artifact = method_artifact(ArtifactKind::DeleteByPrimaryKey, method, &[]);
    artifact.absorb(&conditions);
    Generated::one(artifact)
}

fn insert_method(
    input: &GenerationInput<'_>,
    kind: ArtifactKind,
    name: &str,
    selective: bool,
) -> Artifact {
    let table = input.table;
    let columns: Vec<_> = table.columns().iter().collect();
    let mut mode = AssignmentMode::new(AssignmentTarget::Insert, "    c", "    ");
    if selective {
        mode = mode.presence_aware();
    }
    let mut assignments = input.fragments.assignments(&columns, &mode);
    ensure_chain_start(&mut assignments);

    let mut method = Method::default_method(name, JavaType::int());
    method.add_parameter(Parameter::new(table.record_type(), "row"));
    method.add_body_line(format!(
        "return MyBatis3Utils.insert(this::insert, row, {}, c ->",
        table.table_field_name()
    ));
    method.add_body_lines(assignments.lines.iter().cloned());
    method.add_body_line(");");

    method_artifact(kind, method, &[MYBATIS3_UTILS])
}

fn insert(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.insert {
        return Generated::NotApplicable;
    }
    Generated::one(insert_method(input, ArtifactKind::Insert, "insert", false))
}

fn insert_selective(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.insert_selective {
        return Generated::NotApplicable;
    }
    Generated::one(insert_method(
        input,
        ArtifactKind::InsertSelective,
        "insertSelective",
        true,
    ))
}

fn insert_multiple(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.insert_multiple {
        return Generated::NotApplicable;
    }
    let table = input.table;
    let columns: Vec<_> = table.columns().iter().collect();
    let mode = AssignmentMode::new(AssignmentTarget::Insert, "    c", "    ");
    let mut assignments = input.fragments.assignments(&columns, &mode);
    ensure_chain_start(&mut assignments);

    let mut method = Method::default_method("insertMultiple", JavaType::int());
    method.add_parameter(Parameter::new(
        JavaType::new("java.util.Collection").with_argument(table.record_type()),
        "records",
    ));
    method.add_body_line(format!(
        "return MyBatis3Utils.insertMultiple(this::insertMultiple, records, {}, c ->",
        table.table_field_name()
    ));
    method.add_body_lines(assignments.lines.iter().cloned());
    method.add_body_line(");");

    Generated::one(method_artifact(ArtifactKind::InsertMultiple, method, &[MYBATIS3_UTILS]))
}

fn select_list(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.basic_select_one() {
        return Generated::NotApplicable;
    }
    let columns = input.fragments.select_list();
    let field = Field::new(JavaType::new(BASIC_COLUMN).as_array(), "selectList").initializer(
        format!("BasicColumn.columnList({})", columns.lines.join(", ")),
    );
    let mut artifact = Artifact::new(ArtifactKind::SelectListField, Member::Field(field));
    artifact.import(BASIC_COLUMN);
    Generated::one(artifact)
}

fn select_one(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.basic_select_one() {
        return Generated::NotApplicable;
    }
    let table = input.table;
    let mut method = Method::default_method("selectOne", JavaType::optional_of(table.record_type()));
    method.add_parameter(Parameter::new(JavaType::new(SELECT_COMPLETER), "completer"));
    method.add_body_line(format!(
        "return MyBatis3Utils.selectOne(this::selectOne, selectList, {}, completer);",
        table.table_field_name()
    ));
    Generated::one(method_artifact(ArtifactKind::SelectOne, method, &[MYBATIS3_UTILS]))
}

fn select_many_method(
    input: &GenerationInput<'_>,
    kind: ArtifactKind,
    name: &str,
    utility: &str,
) -> Generated {
    if !input.rules.select_by_example() {
        return Generated::NotApplicable;
    }
    let table = input.table;
    let mut method = Method::default_method(name, JavaType::list_of(table.record_type()));
    method.add_parameter(Parameter::new(JavaType::new(SELECT_COMPLETER), "completer"));
    method.add_body_line(format!(
        "return MyBatis3Utils.{utility}(this::selectMany, selectList, {}, completer);",
        table.table_field_name()
    ));
    Generated::one(method_artifact(kind, method, &[MYBATIS3_UTILS]))
}

fn select(input: &GenerationInput<'_>) -> Generated {
    select_many_method(input, ArtifactKind::Select, "select", "selectList")
}

fn select_distinct(input: &GenerationInput<'_>) -> Generated {
    select_many_method(
        input,
        ArtifactKind::SelectDistinct,
        "selectDistinct",
        "selectDistinct",
    )
}

fn select_by_primary_key(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.select_by_primary_key {
        return Generated::NotApplicable;
    }
    let conditions = input.fragments.primary_key_equality(KeyBinding::ParameterBound);
    let mut method = Method::default_method(
        "selectByPrimaryKey",
        JavaType::optional_of(input.table.record_type()),
    );
    method.add_body_line("return selectOne(c ->");
    conditions.apply_to(&mut method);
    method.add_body_line(");");

    let mut artifact = method_artifact(ArtifactKind::SelectByPrimaryKey, method, &[]);
    artifact.absorb(&conditions);
    Generated::one(artifact)
}

fn update(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.basic_update() {
        return Generated::NotApplicable;
    }
    let mut method = Method::default_method("update", JavaType::int());
    method.add_parameter(Parameter::new(JavaType::new(UPDATE_COMPLETER), "completer"));
    method.add_body_line(format!(
        "return MyBatis3Utils.update(this::update, {}, completer);",
        input.table.table_field_name()
    ));
    Generated::one(method_artifact(ArtifactKind::Update, method, &[MYBATIS3_UTILS]))
}

fn update_dsl() -> JavaType {
    JavaType::new(UPDATE_DSL).with_argument(JavaType::new(UPDATE_MODEL))
}

fn update_columns_method(
    input: &GenerationInput<'_>,
    kind: ArtifactKind,
    name: &str,
    selective: bool,
) -> Artifact {
    let table = input.table;
    let columns: Vec<_> = table.columns().iter().collect();
    let mut mode =
        AssignmentMode::new(AssignmentTarget::Update, "return dsl", "        ").terminated();
    if selective {
        mode = mode.presence_aware();
    }
    let assignments = input.fragments.assignments(&columns, &mode);

    let mut method = Method::static_method(name, update_dsl());
    method.add_parameter(Parameter::new(table.record_type(), "row"));
    method.add_parameter(Parameter::new(update_dsl(), "dsl"));
    method.add_body_lines(assignments.lines.iter().cloned());
    method_artifact(kind, method, &[])
}

fn update_all_columns(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.update_by_example() {
        return Generated::NotApplicable;
    }
    Generated::one(update_columns_method(
        input,
        ArtifactKind::UpdateAllColumns,
        "updateAllColumns",
        false,
    ))
}

fn update_selective_columns(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.update_by_example_selective {
        return Generated::NotApplicable;
    }
    Generated::one(update_columns_method(
        input,
        ArtifactKind::UpdateSelectiveColumns,
        "updateSelectiveColumns",
        true,
    ))
}

fn update_by_key_method(
    input: &GenerationInput<'_>,
    kind: ArtifactKind,
    name: &str,
    selective: bool,
) -> Artifact {
    let table = input.table;
    let columns = table.non_primary_key_columns();
    let mut mode = AssignmentMode::new(AssignmentTarget::Update, "    c", "    ");
    if selective {
        mode = mode.presence_aware();
    }
    let mut assignments = input.fragments.assignments(&columns, &mode);
    ensure_chain_start(&mut assignments);
    let conditions = input.fragments.primary_key_equality(KeyBinding::AccessorBound);

    let mut method = Method::default_method(name, JavaType::int());
    method.add_parameter(Parameter::new(table.record_type(), "row"));
    method.add_body_line("return update(c ->");
    method.add_body_lines(assignments.lines.iter().cloned());
    conditions.apply_to(&mut method);
    method.add_body_line(");");

    let mut artifact = method_artifact(kind, method, &[]);
    artifact.absorb(&conditions);
    artifact
}

fn update_by_primary_key(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.update_by_primary_key {
        return Generated::NotApplicable;
    }
    Generated::one(update_by_key_method(
        input,
        ArtifactKind::UpdateByPrimaryKey,
        "updateByPrimaryKey",
        false,
    ))
}

fn update_by_primary_key_selective(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.update_by_primary_key_selective {
        return Generated::NotApplicable;
    }
    Generated::one(update_by_key_method(
        input,
        ArtifactKind::UpdateByPrimaryKeySelective,
        "updateByPrimaryKeySelective",
        true,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::Fragments;
    use crate::model::IssueLevel;
    use crate::rules::Rules;
    use mapforge_core::{ColumnDescriptor, FullyQualifiedTable, GeneratedKey, KeyTiming, StatementToggles};

    fn int(name: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(name, JavaType::new("java.lang.Integer"), "INTEGER")
    }

    fn orders() -> TableDescriptor {
        TableDescriptor::new(
            FullyQualifiedTable::new(None, Some("public"), "orders"),
            vec![
                int("id"),
                ColumnDescriptor::new("customer_name", JavaType::string(), "VARCHAR"),
            ],
            vec!["id".to_string()],
        )
        .with_packages("com.example.model", "com.example.mapper")
    }

    fn run(generate: fn(&GenerationInput<'_>) -> Generated, table: &TableDescriptor) -> Generated {
        let rules = Rules::evaluate(table);
        let unit = skeleton(table);
        let input = GenerationInput {
            table,
            rules: &rules,
            fragments: Fragments::new(table),
            unit: &unit,
        };
        generate(&input)
    }

    fn single_method(generated: Generated) -> (Method, Artifact) {
        match generated {
            Generated::Artifacts(mut artifacts) => {
                assert_eq!(artifacts.len(), 1);
                let artifact = artifacts.remove(0);
                match &artifact.member {
                    Member::Method(method) => (method.clone(), artifact),
                    other => panic!("expected a method, got {other:?}"),
                }
            }
            other => panic!("expected an artifact, got {other:?}"),
        }
    }

    #[test]
    fn delete_by_primary_key_binds_parameters() {
        let (method, artifact) = single_method(run(delete_by_primary_key, &orders()));
        assert_eq!(method.signature(), "deleteByPrimaryKey(Integer)");
        assert_eq!(
            method.body,
            vec!["return delete(c ->", "    c.where(id, isEqualTo(id_))", ");"]
        );
        assert!(
            artifact
                .static_imports
                .contains("org.mybatis.dynamic.sql.SqlBuilder.isEqualTo")
        );
    }

    #[test]
    fn zero_key_table_has_no_key_methods() {
        let table = TableDescriptor::new(
            FullyQualifiedTable::new(None, None, "audit_log"),
            vec![int("a")],
            Vec::new(),
        );
        assert_eq!(run(delete_by_primary_key, &table), Generated::NotApplicable);
        assert_eq!(run(update_by_primary_key, &table), Generated::NotApplicable);
        assert_eq!(run(select_by_primary_key, &table), Generated::NotApplicable);
    }

    #[test]
    fn update_by_primary_key_sets_then_filters() {
        let (method, _) = single_method(run(update_by_primary_key_selective, &orders()));
        assert_eq!(
            method.body,
            vec![
                "return update(c ->",
                "    c.set(customerName).equalToWhenPresent(row::getCustomerName)",
                "    .where(id, isEqualTo(row::getId))",
                ");",
            ]
        );
    }

    #[test]
    fn jdbc_key_splits_multi_row_insert() {
        let table = orders().with_generated_key(GeneratedKey::JdbcStandard {
            column: "id".to_string(),
        });
        let Generated::Artifacts(artifacts) = run(basic_insert_multiple, &table) else {
            panic!("expected artifacts");
        };
        assert_eq!(artifacts.len(), 2);
        let Member::Method(statement) = &artifacts[0].member else {
            panic!("expected method");
        };
        assert_eq!(statement.signature(), "insertMultiple(String,List<Orders>)");
        assert!(statement.annotations.contains(
            &"@Options(useGeneratedKeys=true,keyProperty=\"records.id\",keyColumn=\"id\")"
                .to_string()
        ));
        assert_eq!(
            artifacts[1].member.signature(),
            "insertMultiple(MultiRowInsertStatementProvider<Orders>)"
        );
    }

    #[test]
    fn requested_multi_row_insert_with_custom_key_is_explained() {
        let table = orders()
            .with_generated_key(GeneratedKey::CustomSelect {
                column: "id".to_string(),
                statement: "SELECT LAST_INSERT_ID()".to_string(),
                timing: KeyTiming::After,
            })
            .with_statements(StatementToggles {
                insert_multiple: Some(true),
                ..StatementToggles::default()
            });
        match run(basic_insert_multiple, &table) {
            Generated::Skipped(issue) => {
                assert_eq!(issue.code, codes::CONFIGURATION_ERROR);
                assert_eq!(issue.level, IssueLevel::Error);
            }
            other => panic!("expected skip, got {other:?}"),
        }
        assert_eq!(run(insert_multiple, &table), Generated::NotApplicable);
    }

    #[test]
    fn missing_key_column_drops_only_the_directive() {
        let table = orders().with_generated_key(GeneratedKey::JdbcStandard {
            column: "order_id".to_string(),
        });
        let (method, artifact) = single_method(run(basic_insert, &table));
        assert_eq!(method.annotations.len(), 1);
        assert_eq!(artifact.issues.len(), 1);
        assert_eq!(artifact.issues[0].code, codes::INTROSPECTION_GAP);
    }

    #[test]
    fn select_one_reuses_declared_result_map() {
        let table = orders();
        let rules = Rules::evaluate(&table);
        let mut unit = skeleton(&table);

        let fresh = {
            let input = GenerationInput {
                table: &table,
                rules: &rules,
                fragments: Fragments::new(&table),
                unit: &unit,
            };
            single_method(basic_select_one(&input)).0
        };
        assert!(fresh.annotations[1].starts_with("@Results(id=\"OrdersResult\""));

        let many = {
            let input = GenerationInput {
                table: &table,
                rules: &rules,
                fragments: Fragments::new(&table),
                unit: &unit,
            };
            single_method(basic_select_many(&input)).0
        };
        unit.add_member(Member::Method(many));

        let input = GenerationInput {
            table: &table,
            rules: &rules,
            fragments: Fragments::new(&table),
            unit: &unit,
        };
        let (reused, artifact) = single_method(basic_select_one(&input));
        assert_eq!(reused.annotations[1], "@ResultMap(\"OrdersResult\")");
        assert!(artifact.imports.contains(RESULT_MAP));
    }
}
