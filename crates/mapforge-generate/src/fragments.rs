//! Composable chunks of generated method bodies.
//!
//! Every builder is a pure function of its arguments and returns a fresh
//! [`FragmentUnit`]; generators splice the pieces into methods in order.

use std::collections::BTreeSet;

use mapforge_core::naming::getter_name;
use mapforge_core::{ColumnDescriptor, GeneratedKey, JavaType, TableDescriptor};

use crate::dom::{Method, Parameter};

pub const IS_EQUAL_TO: &str = "org.mybatis.dynamic.sql.SqlBuilder.isEqualTo";
pub const JDBC_TYPE: &str = "org.apache.ibatis.type.JdbcType";

/// Body lines plus everything a method needs to host them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentUnit {
    pub lines: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub imports: BTreeSet<String>,
    pub static_imports: BTreeSet<String>,
    pub annotations: Vec<String>,
}

impl FragmentUnit {
    fn import(&mut self, java_type: &JavaType) {
        self.imports.extend(java_type.import_names());
    }

    /// Append parameters, annotations and body lines to `method`.
    ///
    /// Imports stay on the fragment; callers move them to the artifact.
    pub fn apply_to(&self, method: &mut Method) {
        for parameter in &self.parameters {
            method.add_parameter(parameter.clone());
        }
        for annotation in &self.annotations {
            method.add_annotation(annotation.clone());
        }
        method.add_body_lines(self.lines.iter().cloned());
    }
}

/// How primary key conditions bind their right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBinding {
    /// `c.where(id, isEqualTo(id_))`, one synthesized parameter per key column.
    /// Starts a new condition chain on the completer argument `c`.
    ParameterBound,
    /// `.where(id, isEqualTo(row::getId))`, continuing an existing chain.
    AccessorBound,
}

/// Which DSL a column assignment is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTarget {
    /// `.map(col).toProperty("p")` on an insert mapping.
    Insert,
    /// `.set(col).equalTo(row::getP)` on an update.
    Update,
}

/// Shape of an assignment fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentMode {
    pub target: AssignmentTarget,
    /// Guard ordinary columns so absent values are left out.
    pub presence_aware: bool,
    /// Prefix of the first line, e.g. `    c` or `return dsl`.
    pub first_prefix: String,
    /// Prefix of every following line.
    pub prefix: String,
    /// End the last line with `;`.
    pub terminate: bool,
}

impl AssignmentMode {
    pub fn new(target: AssignmentTarget, first_prefix: &str, prefix: &str) -> Self {
        Self {
            target,
            presence_aware: false,
            first_prefix: first_prefix.to_string(),
            prefix: prefix.to_string(),
            terminate: false,
        }
    }

    pub fn presence_aware(mut self) -> Self {
        self.presence_aware = true;
        self
    }

    pub fn terminated(mut self) -> Self {
        self.terminate = true;
        self
    }
}

/// Name used to reference a column constant from mapper code.
///
/// A property named like the table singleton would be shadowed by it, so it
/// is reached through the singleton instead (`order.order`).
pub fn column_field_name(table_field_name: &str, column: &ColumnDescriptor) -> String {
    if column.property == table_field_name {
        format!("{table_field_name}.{}", column.property)
    } else {
        column.property.clone()
    }
}

/// Comma-joined column references for every column of the table.
pub fn select_list_fragment(table: &TableDescriptor) -> FragmentUnit {
    let table_field_name = table.table_field_name();
    let names: Vec<String> = table
        .columns()
        .iter()
        .map(|column| column_field_name(&table_field_name, column))
        .collect();

    FragmentUnit {
        lines: vec![names.join(", ")],
        ..FragmentUnit::default()
    }
}

/// One equality condition per primary key column, in key order. The first
/// condition uses `where`, every later one `and`.
pub fn primary_key_equality_fragment(table: &TableDescriptor, binding: KeyBinding) -> FragmentUnit {
    let table_field_name = table.table_field_name();
    let mut fragment = FragmentUnit::default();
    fragment.static_imports.insert(IS_EQUAL_TO.to_string());

    for (idx, column) in table.primary_key_columns().into_iter().enumerate() {
        let field = column_field_name(&table_field_name, column);
        let combinator = match (idx, binding) {
            (0, KeyBinding::ParameterBound) => "    c.where",
            (0, KeyBinding::AccessorBound) => "    .where",
            _ => "    .and",
        };
        let value = match binding {
            KeyBinding::ParameterBound => {
                let name = format!("{}_", column.property);
                fragment.import(&column.java_type);
                fragment
                    .parameters
                    .push(Parameter::new(column.java_type.clone(), &name));
                name
            }
            KeyBinding::AccessorBound => {
                format!("row::{}", getter_name(&column.property, &column.java_type))
            }
        };
        fragment
            .lines
            .push(format!("{combinator}({field}, isEqualTo({value}))"));
    }

    fragment
}

/// Column assignments for inserts and updates.
///
/// Identity and generated-always columns are never written. In
/// presence-aware mode ordinary columns are guarded, while sequence-backed
/// columns are always assigned because their value comes from the key
/// statement.
pub fn assignment_fragment(
    table: &TableDescriptor,
    columns: &[&ColumnDescriptor],
    mode: &AssignmentMode,
) -> FragmentUnit {
    let table_field_name = table.table_field_name();
    let mut fragment = FragmentUnit::default();

    let writable = columns
        .iter()
        .filter(|column| !column.generated_always && !table.is_identity(column));

    for column in writable {
        let field = column_field_name(&table_field_name, column);
        let getter = format!("row::{}", getter_name(&column.property, &column.java_type));
        let guarded = mode.presence_aware && !table.is_sequence(column);

        let body = match (mode.target, guarded) {
            (AssignmentTarget::Insert, false) => {
                format!(".map({field}).toProperty(\"{}\")", column.property)
            }
            (AssignmentTarget::Insert, true) => format!(
                ".map({field}).toPropertyWhenPresent(\"{}\", {getter})",
                column.property
            ),
            (AssignmentTarget::Update, false) => format!(".set({field}).equalTo({getter})"),
            (AssignmentTarget::Update, true) => {
                format!(".set({field}).equalToWhenPresent({getter})")
            }
        };

        let prefix = if fragment.lines.is_empty() {
            &mode.first_prefix
        } else {
            &mode.prefix
        };
        fragment.lines.push(format!("{prefix}{body}"));
    }

    if mode.terminate {
        match fragment.lines.last_mut() {
            Some(last) => last.push(';'),
            None => fragment.lines.push(format!("{};", mode.first_prefix)),
        }
    }

    fragment
}

/// Key retrieval directive for an insert method.
///
/// `owner` is the parameter holding the row(s), e.g. `row` or `records`.
/// Returns `None` when the key names a column the table does not have.
pub fn generated_key_fragment(
    table: &TableDescriptor,
    key: &GeneratedKey,
    owner: &str,
) -> Option<FragmentUnit> {
    let column = table.column(key.column())?;
    let mut fragment = FragmentUnit::default();

    match key {
        GeneratedKey::JdbcStandard { .. } => {
            fragment
                .imports
                .insert("org.apache.ibatis.annotations.Options".to_string());
            fragment.annotations.push(format!(
                "@Options(useGeneratedKeys=true,keyProperty=\"{owner}.{}\",keyColumn=\"{}\")",
                column.property, column.name
            ));
        }
        GeneratedKey::CustomSelect { statement, .. } => {
            fragment
                .imports
                .insert("org.apache.ibatis.annotations.SelectKey".to_string());
            fragment.import(&column.java_type);
            // Identity-style keys are read after the insert, sequences before.
            let before = !key.is_identity();
            fragment.annotations.push(format!(
                "@SelectKey(statement=\"{}\", keyProperty=\"{owner}.{}\", before={before}, resultType={}.class)",
                escape_java(statement),
                column.property,
                column.java_type.base_short_name()
            ));
        }
    }

    Some(fragment)
}

/// Result style for query methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultMapping {
    /// Property-based `@Results` declaring a reusable map id.
    Results { id: String },
    /// Constructor-based `@ConstructorArgs`.
    ConstructorArgs,
}

/// Annotation lines mapping every column of the table.
pub fn result_mapping_fragment(table: &TableDescriptor, mapping: &ResultMapping) -> FragmentUnit {
    let mut fragment = FragmentUnit::default();
    fragment.imports.insert(JDBC_TYPE.to_string());

    let columns = table.columns();
    let entries: Vec<String> = columns
        .iter()
        .map(|column| {
            let mut entry = match mapping {
                ResultMapping::Results { .. } => format!(
                    "@Result(column=\"{}\", property=\"{}\", jdbcType=JdbcType.{}",
                    column.name, column.property, column.jdbc_type
                ),
                ResultMapping::ConstructorArgs => {
                    fragment.import(&column.java_type);
                    format!(
                        "@Arg(column=\"{}\", javaType={}.class, jdbcType=JdbcType.{}",
                        column.name,
                        column.java_type.short_name(),
                        column.jdbc_type
                    )
                }
            };
            if let Some(handler) = &column.type_handler {
                let handler_type = JavaType::new(handler);
                fragment.import(&handler_type);
                entry.push_str(&format!(", typeHandler={}.class", handler_type.short_name()));
            }
            if column.primary_key {
                entry.push_str(", id=true");
            }
            entry.push(')');
            entry
        })
        .collect();

    match mapping {
        ResultMapping::Results { id } => {
            fragment
                .imports
                .insert("org.apache.ibatis.annotations.Result".to_string());
            fragment
                .imports
                .insert("org.apache.ibatis.annotations.Results".to_string());
            fragment
                .annotations
                .push(format!("@Results(id=\"{id}\", value = {{"));
        }
        ResultMapping::ConstructorArgs => {
            fragment
                .imports
                .insert("org.apache.ibatis.annotations.Arg".to_string());
            fragment
                .imports
                .insert("org.apache.ibatis.annotations.ConstructorArgs".to_string());
            fragment.annotations.push("@ConstructorArgs({".to_string());
        }
    }
    let last = entries.len().saturating_sub(1);
    for (idx, entry) in entries.into_iter().enumerate() {
        let separator = if idx < last { "," } else { "" };
        fragment.annotations.push(format!("    {entry}{separator}"));
    }
    fragment.annotations.push("})".to_string());

    fragment
}

fn escape_java(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The fragment builders bound to one table.
#[derive(Debug, Clone, Copy)]
pub struct Fragments<'a> {
    table: &'a TableDescriptor,
}

impl<'a> Fragments<'a> {
    pub fn new(table: &'a TableDescriptor) -> Self {
        Self { table }
    }

    pub fn select_list(&self) -> FragmentUnit {
        select_list_fragment(self.table)
    }

    pub fn primary_key_equality(&self, binding: KeyBinding) -> FragmentUnit {
        primary_key_equality_fragment(self.table, binding)
    }

    pub fn assignments(&self, columns: &[&ColumnDescriptor], mode: &AssignmentMode) -> FragmentUnit {
        assignment_fragment(self.table, columns, mode)
    }

    pub fn generated_key(&self, owner: &str) -> Option<FragmentUnit> {
        self.table
            .generated_key()
            .and_then(|key| generated_key_fragment(self.table, key, owner))
    }

    pub fn result_mapping(&self, mapping: &ResultMapping) -> FragmentUnit {
        result_mapping_fragment(self.table, mapping)
    }
}
