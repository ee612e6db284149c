use mapforge_core::{ColumnType, JavaType};

use crate::model::GeneratorOptions;

/// Java and JDBC types chosen for a snapshot column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub java_type: JavaType,
    pub jdbc_type: String,
    pub blob: bool,
}

impl ResolvedType {
    fn new(java_type: &str, jdbc_type: &str) -> Self {
        Self {
            java_type: JavaType::new(java_type),
            jdbc_type: jdbc_type.to_string(),
            blob: false,
        }
    }

    fn blob(mut self) -> Self {
        self.blob = true;
        self
    }

    /// Mapping used for types the resolver does not know.
    pub fn fallback() -> Self {
        Self::new("java.lang.Object", "OTHER")
    }
}

/// JDBC types whose values are read separately from the base columns.
const BLOB_JDBC_TYPES: &[&str] = &[
    "BINARY",
    "BLOB",
    "CLOB",
    "LONGNVARCHAR",
    "LONGVARBINARY",
    "LONGVARCHAR",
    "NCLOB",
    "VARBINARY",
];

pub fn is_blob_jdbc_type(jdbc_type: &str) -> bool {
    BLOB_JDBC_TYPES.contains(&jdbc_type)
}

/// Map a snapshot column type; `None` when the type has no known mapping.
pub fn resolve_column_type(column_type: &ColumnType, options: &GeneratorOptions) -> Option<ResolvedType> {
    let base = column_type.base_name();
    let udt = column_type.udt_name.to_ascii_lowercase();
    let name = if base == "user-defined" || base == "array" {
        udt.as_str()
    } else {
        base.as_str()
    };

    let resolved = match name {
        "smallint" | "int2" | "smallserial" => ResolvedType::new("java.lang.Short", "SMALLINT"),
        "integer" | "int" | "int4" | "serial" => ResolvedType::new("java.lang.Integer", "INTEGER"),
        "bigint" | "int8" | "bigserial" => ResolvedType::new("java.lang.Long", "BIGINT"),
        "numeric" | "decimal" => resolve_exact_numeric(column_type, options),
        "real" | "float4" => ResolvedType::new("java.lang.Float", "REAL"),
        "double precision" | "float8" => ResolvedType::new("java.lang.Double", "DOUBLE"),
        "boolean" | "bool" => ResolvedType::new("java.lang.Boolean", "BOOLEAN"),
        "character varying" | "varchar" | "text" | "citext" => {
            ResolvedType::new("java.lang.String", "VARCHAR")
        }
        "character" | "char" | "bpchar" => ResolvedType::new("java.lang.String", "CHAR"),
        "bytea" => ResolvedType::new("byte[]", "BINARY").blob(),
        "uuid" => ResolvedType::new("java.util.UUID", "OTHER"),
        "date" => temporal(options, "java.time.LocalDate", "DATE"),
        "time" | "time without time zone" => temporal(options, "java.time.LocalTime", "TIME"),
        "time with time zone" | "timetz" => {
            temporal(options, "java.time.OffsetTime", "TIME_WITH_TIMEZONE")
        }
        "timestamp" | "timestamp without time zone" => {
            temporal(options, "java.time.LocalDateTime", "TIMESTAMP")
        }
        "timestamp with time zone" | "timestamptz" => temporal(
            options,
            "java.time.OffsetDateTime",
            "TIMESTAMP_WITH_TIMEZONE",
        ),
        _ => return None,
    };

    Some(resolved)
}

fn temporal(options: &GeneratorOptions, jsr310: &str, jdbc_type: &str) -> ResolvedType {
    if options.use_jsr310_types {
        ResolvedType::new(jsr310, jdbc_type)
    } else {
        ResolvedType::new("java.util.Date", jdbc_type)
    }
}

fn resolve_exact_numeric(column_type: &ColumnType, options: &GeneratorOptions) -> ResolvedType {
    let jdbc_type = if column_type.base_name() == "decimal" {
        "DECIMAL"
    } else {
        "NUMERIC"
    };
    let precision = column_type.numeric_precision.unwrap_or(0);
    let scale = column_type.numeric_scale.unwrap_or(0);

    // Unconstrained numerics report no precision and may hold any value.
    let java_type = if options.force_big_decimals
        || column_type.numeric_precision.is_none()
        || scale > 0
        || precision > 18
    {
        "java.math.BigDecimal"
    } else if precision > 9 {
        "java.lang.Long"
    } else if precision > 4 {
        "java.lang.Integer"
    } else {
        "java.lang.Short"
    };

    ResolvedType::new(java_type, jdbc_type)
}
