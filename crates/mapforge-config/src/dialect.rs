/// Databases with a well-known identity retrieval statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDialect {
    Db2,
    MySql,
    SqlServer,
    Cloudscape,
    Derby,
    Hsqldb,
    Sybase,
    Db2Mf,
    Informix,
}

const ALL: [KeyDialect; 9] = [
    KeyDialect::Db2,
    KeyDialect::MySql,
    KeyDialect::SqlServer,
    KeyDialect::Cloudscape,
    KeyDialect::Derby,
    KeyDialect::Hsqldb,
    KeyDialect::Sybase,
    KeyDialect::Db2Mf,
    KeyDialect::Informix,
];

impl KeyDialect {
    /// Look up a dialect by its configuration name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.into_iter()
            .find(|dialect| dialect.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyDialect::Db2 => "DB2",
            KeyDialect::MySql => "MySql",
            KeyDialect::SqlServer => "SqlServer",
            KeyDialect::Cloudscape => "Cloudscape",
            KeyDialect::Derby => "Derby",
            KeyDialect::Hsqldb => "HSQLDB",
            KeyDialect::Sybase => "SYBASE",
            KeyDialect::Db2Mf => "DB2_MF",
            KeyDialect::Informix => "Informix",
        }
    }

    /// Statement returning the last identity value assigned in the session.
    pub fn identity_statement(self) -> &'static str {
        match self {
            KeyDialect::Db2 | KeyDialect::Cloudscape | KeyDialect::Derby => {
                "VALUES IDENTITY_VAL_LOCAL()"
            }
            KeyDialect::MySql => "SELECT LAST_INSERT_ID()",
            KeyDialect::SqlServer => "SELECT SCOPE_IDENTITY()",
            KeyDialect::Hsqldb => "CALL IDENTITY()",
            KeyDialect::Sybase => "SELECT @@IDENTITY",
            KeyDialect::Db2Mf => "SELECT IDENTITY_VAL_LOCAL() FROM SYSIBM.SYSDUMMY1",
            KeyDialect::Informix => "select dbinfo('sqlca.sqlerrd1') from systables where tabid=1",
        }
    }

    pub fn names() -> Vec<&'static str> {
        ALL.into_iter().map(KeyDialect::name).collect()
    }
}
