//! `SQLite` schema definitions for maintrack.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the assets table.
pub const CREATE_ASSETS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    parent_id INTEGER REFERENCES assets(id),
    priority TEXT NOT NULL DEFAULT 'MED'
)
";

/// SQL statement to create the problem types table.
pub const CREATE_PROBLEM_TYPES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS problem_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
";

/// SQL statement to create the users table. Role and permission grants
/// are stored as JSON arrays of names.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    roles TEXT NOT NULL DEFAULT '[]',
    permissions TEXT NOT NULL DEFAULT '[]'
)
";

/// SQL statement to create the reports table.
pub const CREATE_REPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    asset_id INTEGER NOT NULL REFERENCES assets(id),
    author_id INTEGER REFERENCES users(id),
    entry_date TEXT NOT NULL,
    work_order_number TEXT,
    priority TEXT NOT NULL DEFAULT 'MED',
    problem_type_id INTEGER REFERENCES problem_types(id),
    problem_description TEXT NOT NULL,
    recommended_action TEXT,
    status TEXT NOT NULL DEFAULT 'NEW',
    previous_entry_id INTEGER REFERENCES reports(id)
)
";

/// SQL statement to create an index on asset parents for child listings.
pub const CREATE_ASSET_PARENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_assets_parent ON assets(parent_id)
";

/// SQL statement to create an index on asset names for ordered listings.
pub const CREATE_ASSET_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_assets_name ON assets(name)
";

/// SQL statement to create an index on report assets for filtering.
pub const CREATE_REPORT_ASSET_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_reports_asset ON reports(asset_id)
";

/// SQL statement to create an index on `previous_entry_id` for chain
/// traversal.
pub const CREATE_REPORT_PREVIOUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_reports_previous ON reports(previous_entry_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ASSETS_TABLE,
    CREATE_PROBLEM_TYPES_TABLE,
    CREATE_USERS_TABLE,
    CREATE_REPORTS_TABLE,
    CREATE_ASSET_PARENT_INDEX,
    CREATE_ASSET_NAME_INDEX,
    CREATE_REPORT_ASSET_INDEX,
    CREATE_REPORT_PREVIOUS_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_reports_table_contains_required_columns() {
        assert!(CREATE_REPORTS_TABLE.contains("id INTEGER PRIMARY KEY"));
        assert!(CREATE_REPORTS_TABLE.contains("asset_id INTEGER NOT NULL"));
        assert!(CREATE_REPORTS_TABLE.contains("entry_date TEXT NOT NULL"));
        assert!(CREATE_REPORTS_TABLE.contains("problem_description TEXT NOT NULL"));
        assert!(CREATE_REPORTS_TABLE.contains("previous_entry_id INTEGER"));
    }

    #[test]
    fn test_create_assets_table_allows_null_parent() {
        assert!(CREATE_ASSETS_TABLE.contains("parent_id INTEGER REFERENCES assets(id)"));
        assert!(!CREATE_ASSETS_TABLE.contains("parent_id INTEGER NOT NULL"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
