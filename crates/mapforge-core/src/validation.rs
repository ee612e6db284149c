use std::collections::{BTreeMap, BTreeSet};

use crate::constraints::Constraint;
use crate::error::{Error, Result};
use crate::schema::DatabaseSchema;

/// Validate internal consistency of a schema snapshot.
///
/// This checks:
/// - duplicate schemas/tables/columns
/// - key and unique constraint columns exist
/// - foreign key columns exist on the owning table
pub fn validate_schema(schema: &DatabaseSchema) -> Result<()> {
    let mut catalog: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for db_schema in &schema.schemas {
        let mut tables = BTreeSet::new();
        for table in &db_schema.tables {
            if !tables.insert(table.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate table name: {}.{}",
                    db_schema.name, table.name
                )));
            }

            let mut columns = BTreeSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate column name: {}.{}.{}",
                        db_schema.name, table.name, column.name
                    )));
                }
            }

            for constraint in &table.constraints {
                let (label, referenced) = match constraint {
                    Constraint::PrimaryKey(key) => ("primary key", &key.columns),
                    Constraint::Unique(key) => ("unique", &key.columns),
                    Constraint::ForeignKey(fk) => ("foreign key", &fk.columns),
                    Constraint::Check(_) => continue,
                };
                if let Some(missing) = referenced.iter().find(|c| !columns.contains(c.as_str())) {
                    return Err(Error::InvalidSchema(format!(
                        "{label} column not found: {}.{}.{}",
                        db_schema.name, table.name, missing
                    )));
                }
            }
        }

        if catalog.insert(db_schema.name.as_str(), tables).is_some() {
            return Err(Error::InvalidSchema(format!(
                "duplicate schema name: {}",
                db_schema.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::KeyColumns;
    use crate::schema::{Column, Schema, Table, TableKind};
    use crate::types::ColumnType;

    fn column(name: &str) -> Column {
        Column {
            ordinal_position: 1,
            name: name.to_string(),
            column_type: ColumnType {
                data_type: "integer".to_string(),
                udt_name: "int4".to_string(),
                character_max_length: None,
                numeric_precision: Some(32),
                numeric_scale: Some(0),
            },
            is_nullable: false,
            default: None,
            identity: None,
            generated: None,
            comment: None,
        }
    }

    fn snapshot(tables: Vec<Table>) -> DatabaseSchema {
        DatabaseSchema {
            schema_version: "0.1".to_string(),
            engine: "postgres".to_string(),
            database: Some("db".to_string()),
            schemas: vec![Schema {
                name: "public".to_string(),
                tables,
            }],
        }
    }

    #[test]
    fn rejects_primary_key_on_unknown_column() {
        let schema = snapshot(vec![Table {
            name: "users".to_string(),
            kind: TableKind::Table,
            comment: None,
            columns: vec![column("id")],
            constraints: vec![Constraint::PrimaryKey(KeyColumns {
                name: None,
                columns: vec!["user_id".to_string()],
            })],
        }]);

        let err = validate_schema(&schema).unwrap_err();
        assert!(err.to_string().contains("primary key column not found"));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let schema = snapshot(vec![Table {
            name: "users".to_string(),
            kind: TableKind::Table,
            comment: None,
            columns: vec![column("id"), column("id")],
            constraints: Vec::new(),
        }]);

        assert!(validate_schema(&schema).is_err());
    }

    #[test]
    fn accepts_consistent_snapshot() {
        let schema = snapshot(vec![Table {
            name: "users".to_string(),
            kind: TableKind::Table,
            comment: None,
            columns: vec![column("id"), column("name")],
            constraints: vec![Constraint::PrimaryKey(KeyColumns {
                name: Some("users_pkey".to_string()),
                columns: vec!["id".to_string()],
            })],
        }]);

        assert!(validate_schema(&schema).is_ok());
    }
}
