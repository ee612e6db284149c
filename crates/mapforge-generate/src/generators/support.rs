use mapforge_core::{ColumnDescriptor, JavaType, TableDescriptor};

use crate::dom::{CompilationUnit, Field, InnerClass, Member, Method, UnitKind, Visibility};
use crate::generators::{
    Artifact, ArtifactKind, FileKind, Generated, GenerationInput, GeneratorRegistry,
};

const SQL_COLUMN: &str = "org.mybatis.dynamic.sql.SqlColumn";
const ALIASABLE_SQL_TABLE: &str = "org.mybatis.dynamic.sql.AliasableSqlTable";
const JDBC_TYPE: &str = "java.sql.JDBCType";

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register("support.table_instance", FileKind::Support, table_instance);
    registry.register("support.column_constants", FileKind::Support, column_constants);
    registry.register("support.table_class", FileKind::Support, table_class);
}

pub fn skeleton(table: &TableDescriptor) -> CompilationUnit {
    let mut unit = CompilationUnit::new(UnitKind::Class, table.support_type());
    unit.is_final = true;
    unit
}

fn inner_type(table: &TableDescriptor) -> JavaType {
    JavaType::new(&table.table().domain_object_name)
}

fn sql_column(column: &ColumnDescriptor) -> JavaType {
    JavaType::new(SQL_COLUMN).with_argument(column.java_type.clone())
}

fn table_instance(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.java_client {
        return Generated::NotApplicable;
    }
    let inner = inner_type(input.table);
    let field = Field::new(inner.clone(), &input.table.table_field_name())
        .visibility(Visibility::Public)
        .static_final()
        .initializer(format!("new {}()", inner.short_name()));
    Generated::one(Artifact::new(
        ArtifactKind::SupportTableInstance,
        Member::Field(field),
    ))
}

fn column_constants(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.java_client {
        return Generated::NotApplicable;
    }
    let table_field = input.table.table_field_name();
    let artifacts = input
        .table
        .columns()
        .iter()
        // Would shadow the table instance; mappers reach it as `order.order`.
        .filter(|column| column.property != table_field)
        .map(|column| {
            let field = Field::new(sql_column(column), &column.property)
                .visibility(Visibility::Public)
                .static_final()
                .initializer(format!("{table_field}.{}", column.property));
            let mut artifact =
                Artifact::new(ArtifactKind::SupportColumnConstant, Member::Field(field));
            artifact.import(SQL_COLUMN);
            artifact.import_type(&column.java_type);
            artifact
        })
        .collect();
    Generated::Artifacts(artifacts)
}

fn table_class(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.java_client {
        return Generated::NotApplicable;
    }
    let table = input.table;
    let name = table.table().domain_object_name.clone();
    let mut inner = InnerClass::new(&name);
    inner.superclass = Some(JavaType::new(ALIASABLE_SQL_TABLE).with_argument(inner_type(table)));

    for column in table.columns() {
        let mut arguments = format!("\"{}\", JDBCType.{}", column.name, column.jdbc_type);
        if let Some(handler) = &column.type_handler {
            arguments.push_str(&format!(", \"{handler}\""));
        }
        let field = Field::new(sql_column(column), &column.property)
            .visibility(Visibility::Public)
            .final_()
            .initializer(format!("column({arguments})"));
        inner.members.push(Member::Field(field));
    }

    let mut constructor = Method::constructor(&name);
    constructor.add_body_line(format!(
        "super(\"{}\", {name}::new);",
        table.table().runtime_name()
    ));
    inner.members.push(Member::Method(constructor));

    let mut artifact = Artifact::new(ArtifactKind::SupportTableClass, Member::InnerClass(inner));
    for name in [SQL_COLUMN, ALIASABLE_SQL_TABLE, JDBC_TYPE] {
        artifact.import(name);
    }
    for column in table.columns() {
        artifact.import_type(&column.java_type);
    }
    Generated::one(artifact)
}
