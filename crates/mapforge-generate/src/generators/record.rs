use mapforge_core::naming::{getter_name, setter_name};
use mapforge_core::{ColumnDescriptor, TableDescriptor};

use crate::dom::{CompilationUnit, Field, Member, Method, Parameter, UnitKind, Visibility};
use crate::generators::{
    Artifact, ArtifactKind, FileKind, Generated, GenerationInput, GeneratorRegistry,
};

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register("record.fields", FileKind::Record, fields);
    registry.register("record.constructor", FileKind::Record, constructor);
    registry.register("record.accessors", FileKind::Record, accessors);
}

/// Empty record class for the table.
pub fn skeleton(table: &TableDescriptor) -> CompilationUnit {
    CompilationUnit::new(UnitKind::Class, table.record_type())
}

fn fields(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.base_record_class {
        return Generated::NotApplicable;
    }
    let immutable = input.table.is_constructor_based();
    let artifacts = input
        .table
        .columns()
        .iter()
        .map(|column| {
            let mut field =
                Field::new(column.java_type.clone(), &column.property).visibility(Visibility::Private);
            if immutable {
                field = field.final_();
            }
            let mut artifact = Artifact::new(ArtifactKind::RecordField, Member::Field(field));
            artifact.import_type(&column.java_type);
            artifact
        })
        .collect();
    Generated::Artifacts(artifacts)
}

fn constructor(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.base_record_class || !input.table.is_constructor_based() {
        return Generated::NotApplicable;
    }
    let mut method = Method::constructor(input.unit.name());
    for column in input.table.columns() {
        method.add_parameter(Parameter::new(column.java_type.clone(), &column.property));
        method.add_body_line(format!("this.{0} = {0};", column.property));
    }
    Generated::one(Artifact::new(
        ArtifactKind::RecordConstructor,
        Member::Method(method),
    ))
}

fn accessors(input: &GenerationInput<'_>) -> Generated {
    if !input.rules.base_record_class {
        return Generated::NotApplicable;
    }
    let with_setters = !input.table.is_constructor_based();
    let mut artifacts = Vec::new();
    for column in input.table.columns() {
        artifacts.push(getter(column));
        if with_setters {
            artifacts.push(setter(column));
        }
    }
    Generated::Artifacts(artifacts)
}

fn getter(column: &ColumnDescriptor) -> Artifact {
    let mut method = Method::new(&getter_name(&column.property, &column.java_type))
        .visibility(Visibility::Public)
        .returning(column.java_type.clone());
    method.add_body_line(format!("return {};", column.property));
    Artifact::new(ArtifactKind::RecordGetter, Member::Method(method))
}

fn setter(column: &ColumnDescriptor) -> Artifact {
    let mut method = Method::new(&setter_name(&column.property)).visibility(Visibility::Public);
    method.add_parameter(Parameter::new(column.java_type.clone(), &column.property));
    method.add_body_line(format!("this.{0} = {0};", column.property));
    Artifact::new(ArtifactKind::RecordSetter, Member::Method(method))
}
