//! Declarative SQLite schema definitions with versioning.
//!
//! Tables are declared as consts and grouped into `VersionedSchema`s. A brand
//! new database gets the latest schema directly; existing databases are
//! migrated step by step and the resulting layout is validated against the
//! declarations on every open.

use anyhow::{bail, Result};
use rusqlite::{params, types::Type, Connection};

/// Offset added to the schema version before storing it in `PRAGMA
/// user_version`, so that a pre-versioning database (user_version 0) is
/// distinguishable from schema version 0.
pub const BASE_DB_VERSION: usize = 99999;

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // unused_mut: only mutated when optional field assignments are passed
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn sql_keyword(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    fn from_sql_keyword(keyword: &str) -> Option<&'static SqlType> {
        match keyword {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            "BLOB" => Some(&SqlType::Blob),
            _ => None,
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ForeignKeyOnChange {
    fn sql_keyword(&self) -> &'static str {
        match self {
            ForeignKeyOnChange::NoAction => "NO ACTION",
            ForeignKeyOnChange::Restrict => "RESTRICT",
            ForeignKeyOnChange::SetNull => "SET NULL",
            ForeignKeyOnChange::SetDefault => "SET DEFAULT",
            ForeignKeyOnChange::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<S>,
    pub foreign_key: Option<&'a ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut column_defs = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let mut def = format!("{} {}", column.name, column.sql_type.sql_keyword());
            if column.is_primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                def.push_str(" NOT NULL");
            }
            if column.is_unique {
                def.push_str(" UNIQUE");
            }
            if let Some(default_value) = column.default_value {
                def.push_str(&format!(" DEFAULT {}", default_value));
            }
            if let Some(fk) = column.foreign_key {
                def.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    fk.foreign_table,
                    fk.foreign_column,
                    fk.on_delete.sql_keyword()
                ));
            }
            column_defs.push(def);
        }
        for unique_columns in self.unique_constraints {
            column_defs.push(format!("UNIQUE ({})", unique_columns.join(", ")));
        }

        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, column_defs.join(", ")),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns: Vec<Column<'_, String>> = stmt
            .query_map(params![], |row| {
                let sql_type = SqlType::from_sql_keyword(&row.get::<_, String>(2)?).ok_or(
                    rusqlite::Error::InvalidColumnType(2, "type".to_string(), Type::Text),
                )?;
                Ok(Column {
                    name: row.get(1)?,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                    is_unique: false,
                    foreign_key: None,
                })
            })?
            .collect::<Result<_, _>>()?;

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {} ({})",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != expected.sql_type {
                bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch",
                    self.name,
                    expected.name
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch",
                    self.name,
                    expected.name
                );
            }
        }

        for (index_name, _) in self.indices {
            let index_exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !index_exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }

        self.validate_unique_constraints(conn)?;
        self.validate_foreign_keys(conn)?;
        Ok(())
    }

    // SQLite stores table-level UNIQUE constraints as unique indices.
    fn validate_unique_constraints(&self, conn: &Connection) -> Result<()> {
        if self.unique_constraints.is_empty() {
            return Ok(());
        }
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", self.name))?;
        let unique_index_names: Vec<String> = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?))
            })?
            .filter_map(|r| r.ok())
            .filter(|(_, is_unique)| *is_unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut unique_index_columns: Vec<Vec<String>> = Vec::new();
        for index_name in &unique_index_names {
            let mut idx_stmt = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
            let mut columns: Vec<String> = idx_stmt
                .query_map([], |row| row.get::<_, String>(2))?
                .filter_map(|r| r.ok())
                .collect();
            columns.sort();
            unique_index_columns.push(columns);
        }

        for expected_columns in self.unique_constraints {
            let mut expected_sorted: Vec<&str> = expected_columns.to_vec();
            expected_sorted.sort_unstable();
            let found = unique_index_columns.iter().any(|actual| {
                actual.iter().map(String::as_str).collect::<Vec<_>>() == expected_sorted
            });
            if !found {
                bail!(
                    "Table {} is missing unique constraint on ({})",
                    self.name,
                    expected_columns.join(", ")
                );
            }
        }
        Ok(())
    }

    fn validate_foreign_keys(&self, conn: &Connection) -> Result<()> {
        // PRAGMA foreign_key_list: id, seq, table, from, to, on_update, on_delete, match
        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", self.name))?;
        let actual_fks: Vec<(String, String, String, String)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .collect();

        for column in self.columns {
            let Some(expected) = column.foreign_key else {
                continue;
            };
            let found = actual_fks.iter().any(|(from, table, to, on_delete)| {
                from == column.name
                    && table == expected.foreign_table
                    && to == expected.foreign_column
                    && on_delete == expected.on_delete.sql_keyword()
            });
            if !found {
                bail!(
                    "Table {} column {} is missing foreign key REFERENCES {}({}) ON DELETE {}",
                    self.name,
                    column.name,
                    expected.foreign_table,
                    expected.foreign_column,
                    expected.on_delete.sql_keyword()
                );
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

/// Creates the latest schema on an empty database, otherwise runs the pending
/// migrations, then validates.
pub fn open_versioned(conn: &mut Connection, schemas: &[VersionedSchema]) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON;", params![])?;

    let latest = schemas
        .last()
        .ok_or_else(|| anyhow::anyhow!("No schema versions declared"))?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        latest.create(conn)?;
        return latest.validate(conn);
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if (db_version as usize) < BASE_DB_VERSION {
        bail!(
            "Database has tables but no schema version tag (user_version = {})",
            db_version
        );
    }
    let current_version = db_version as usize - BASE_DB_VERSION;

    for schema in schemas.iter().skip(current_version + 1) {
        let tx = conn.transaction()?;
        match schema.migration {
            Some(migrate) => migrate(&tx)?,
            None => bail!(
                "No migration declared from schema version {} to {}",
                schema.version - 1,
                schema.version
            ),
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + schema.version),
            [],
        )?;
        tx.commit()?;
    }

    latest.validate(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENT_FK: ForeignKey = ForeignKey {
        foreign_table: "parent",
        foreign_column: "id",
        on_delete: ForeignKeyOnChange::Cascade,
    };

    const PARENT_TABLE: Table = Table {
        name: "parent",
        columns: &[sqlite_column!("id", &SqlType::Integer, is_primary_key = true)],
        indices: &[],
        unique_constraints: &[],
    };

    const CHILD_TABLE: Table = Table {
        name: "child",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!(
                "parent_id",
                &SqlType::Integer,
                non_null = true,
                foreign_key = Some(&PARENT_FK)
            ),
        ],
        indices: &[("idx_child_name", "name")],
        unique_constraints: &[&["name", "parent_id"]],
    };

    const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[PARENT_TABLE, CHILD_TABLE],
        migration: None,
    }];

    #[test]
    fn create_then_validate_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &SCHEMAS[0];
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn open_versioned_creates_empty_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        open_versioned(&mut conn, SCHEMAS).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version as usize, BASE_DB_VERSION);

        // A second open is a no-op and must also validate cleanly.
        open_versioned(&mut conn, SCHEMAS).unwrap();
    }

    #[test]
    fn validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE parent (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        conn.execute(
            "CREATE TABLE child (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id INTEGER NOT NULL REFERENCES parent(id) ON DELETE CASCADE,
                UNIQUE (name, parent_id)
            )",
            [],
        )
        .unwrap();

        let result = SCHEMAS[0].validate(&conn);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("missing index"));
    }

    #[test]
    fn validate_detects_missing_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE parent (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        conn.execute(
            "CREATE TABLE child (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id INTEGER NOT NULL,
                UNIQUE (name, parent_id)
            )",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_child_name ON child(name)", [])
            .unwrap();

        let result = SCHEMAS[0].validate(&conn);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing foreign key"));
    }

    #[test]
    fn validate_detects_missing_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE parent (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        conn.execute(
            "CREATE TABLE child (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id INTEGER NOT NULL REFERENCES parent(id) ON DELETE CASCADE
            )",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_child_name ON child(name)", [])
            .unwrap();

        let result = SCHEMAS[0].validate(&conn);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing unique constraint"));
    }

    #[test]
    fn open_versioned_rejects_untagged_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE stray (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        let result = open_versioned(&mut conn, SCHEMAS);
        assert!(result.is_err());
    }
}
