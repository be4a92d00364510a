//! Storage layer for maintrack.
//!
//! This module provides `SQLite`-based persistent storage for the asset
//! hierarchy, problem types, users, and report follow-up chains.

pub mod migrations;
pub mod schema;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Asset, Priority, ProblemType, Report, ReportUpdate, Status, User};

/// Storage engine for the maintenance-reporting data model.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Asset hierarchy CRUD with write-time cycle rejection
/// - Report creation and updates with a frozen author/entry date
/// - Follow-up chain traversal guarded against loops
/// - Get-or-create lookups used by the CSV importer
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        // Initialize schema
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Assets ===

    /// Insert a new asset and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a parent is named but absent, or
    /// an error if the database operation fails.
    pub fn insert_asset(&self, asset: &Asset) -> Result<i64> {
        if let Some(parent_id) = asset.parent_id {
            self.require_asset(parent_id)?;
        }

        self.conn.execute(
            r"
            INSERT INTO assets (name, description, parent_id, priority)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                asset.name,
                asset.description,
                asset.parent_id,
                asset.priority.to_string(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted asset {} with id {}", asset.name, id);
        Ok(id)
    }

    /// Get an asset by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_asset(&self, id: i64) -> Result<Option<Asset>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, description, parent_id, priority FROM assets WHERE id = ?1",
                [id],
                Self::row_to_asset,
            )
            .optional()?;
        Ok(result)
    }

    /// Update an asset's name, description, parent and priority.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the asset or the named parent is
    /// absent, or [`Error::CycleDetected`] if the new parent is the
    /// asset itself or one of its descendants.
    pub fn update_asset(&self, id: i64, asset: &Asset) -> Result<()> {
        self.require_asset(id)?;

        if let Some(parent_id) = asset.parent_id {
            self.require_asset(parent_id)?;
            if self.parent_would_cycle(id, parent_id)? {
                return Err(Error::cycle("asset", id));
            }
        }

        self.conn.execute(
            r"
            UPDATE assets SET name = ?1, description = ?2, parent_id = ?3, priority = ?4
            WHERE id = ?5
            ",
            params![
                asset.name,
                asset.description,
                asset.parent_id,
                asset.priority.to_string(),
                id,
            ],
        )?;
        Ok(())
    }

    /// List all assets ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_assets(&self) -> Result<Vec<Asset>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, parent_id, priority FROM assets ORDER BY name",
        )?;
        let assets = stmt
            .query_map([], Self::row_to_asset)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(assets)
    }

    /// List the children of an asset, ordered by name for display.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn children_of(&self, id: i64) -> Result<Vec<Asset>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, description, parent_id, priority FROM assets
            WHERE parent_id = ?1 ORDER BY name
            ",
        )?;
        let assets = stmt
            .query_map([id], Self::row_to_asset)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(assets)
    }

    /// Delete an asset. Children are re-rooted (parent set to null),
    /// never cascaded. Reports filed against the asset are removed and
    /// chains pointing at them are cut.
    ///
    /// Returns `true` if an asset was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_asset(&self, id: i64) -> Result<bool> {
        self.conn
            .execute("UPDATE assets SET parent_id = NULL WHERE parent_id = ?1", [id])?;
        self.conn.execute(
            r"
            UPDATE reports SET previous_entry_id = NULL
            WHERE previous_entry_id IN (SELECT id FROM reports WHERE asset_id = ?1)
            ",
            [id],
        )?;
        self.conn
            .execute("DELETE FROM reports WHERE asset_id = ?1", [id])?;
        let affected = self.conn.execute("DELETE FROM assets WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Get an existing asset by numeric id, or create it with the given
    /// name and description. Name and description are used only when
    /// the asset is newly created; stale values on an existing id are
    /// ignored.
    ///
    /// Returns the asset and whether it was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_or_create_asset(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<(Asset, bool)> {
        if let Some(existing) = self.get_asset(id)? {
            return Ok((existing, false));
        }

        self.conn.execute(
            r"
            INSERT INTO assets (id, name, description, priority)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![id, name, description, Priority::default().to_string()],
        )?;
        debug!("Created asset {} ({}) during import lookup", id, name);

        let asset = self
            .get_asset(id)?
            .ok_or_else(|| Error::not_found("asset", id))?;
        Ok((asset, true))
    }

    /// Display name for an asset: `"{parent.name} > {name}"` with a
    /// single-level parent dereference, or just the name for roots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the asset is absent.
    pub fn asset_display_name(&self, id: i64) -> Result<String> {
        let asset = self.require_asset(id)?;
        let parent_name = match asset.parent_id {
            Some(parent_id) => self.get_asset(parent_id)?.map(|p| p.name),
            None => None,
        };
        Ok(asset.display_name(parent_name.as_deref()))
    }

    /// Check whether re-parenting `id` under `new_parent` would form a
    /// cycle: the candidate parent must not be the asset itself or any
    /// of its descendants. The upward walk carries a visited set so a
    /// pre-existing bad hierarchy terminates with an error instead of
    /// looping.
    fn parent_would_cycle(&self, id: i64, new_parent: i64) -> Result<bool> {
        let mut visited = HashSet::new();
        let mut current = Some(new_parent);

        while let Some(ancestor) = current {
            if ancestor == id {
                return Ok(true);
            }
            if !visited.insert(ancestor) {
                return Err(Error::cycle("asset", ancestor));
            }
            current = self
                .get_asset(ancestor)?
                .ok_or_else(|| Error::not_found("asset", ancestor))?
                .parent_id;
        }

        Ok(false)
    }

    fn require_asset(&self, id: i64) -> Result<Asset> {
        self.get_asset(id)?
            .ok_or_else(|| Error::not_found("asset", id))
    }

    // === Problem Types ===

    /// Insert a new problem type and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_problem_type(&self, problem_type: &ProblemType) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO problem_types (name) VALUES (?1)",
            [&problem_type.name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a problem type by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_problem_type(&self, id: i64) -> Result<Option<ProblemType>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name FROM problem_types WHERE id = ?1",
                [id],
                Self::row_to_problem_type,
            )
            .optional()?;
        Ok(result)
    }

    /// Rename a problem type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the problem type is absent.
    pub fn update_problem_type(&self, id: i64, name: &str) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE problem_types SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("problem type", id));
        }
        Ok(())
    }

    /// List all problem types ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_problem_types(&self) -> Result<Vec<ProblemType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM problem_types ORDER BY name")?;
        let problem_types = stmt
            .query_map([], Self::row_to_problem_type)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(problem_types)
    }

    /// Get a problem type by name, creating it if absent. Returns the
    /// problem type and whether it was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_or_create_problem_type(&self, name: &str) -> Result<(ProblemType, bool)> {
        let existing = self
            .conn
            .query_row(
                "SELECT id, name FROM problem_types WHERE name = ?1",
                [name],
                Self::row_to_problem_type,
            )
            .optional()?;

        if let Some(problem_type) = existing {
            return Ok((problem_type, false));
        }

        let id = self.insert_problem_type(&ProblemType::new(name))?;
        let mut problem_type = ProblemType::new(name);
        problem_type.id = Some(id);
        Ok((problem_type, true))
    }

    // === Users ===

    /// Insert a new user and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_user(&self, user: &User) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO users (username, roles, permissions) VALUES (?1, ?2, ?3)",
            params![
                user.username,
                serde_json::to_string(&user.roles)?,
                serde_json::to_string(&user.permissions)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a user by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, username, roles, permissions FROM users WHERE id = ?1",
                [id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(result)
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, username, roles, permissions FROM users WHERE username = ?1",
                [username],
                Self::row_to_user,
            )
            .optional()?;
        Ok(result)
    }

    /// Delete a user. Reports they authored keep their content but lose
    /// the author reference.
    ///
    /// Returns `true` if a user was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.conn
            .execute("UPDATE reports SET author_id = NULL WHERE author_id = ?1", [id])?;
        let affected = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    // === Reports ===

    /// Insert a new report and return its assigned id. Author and entry
    /// date are written here, once, and never touched by updates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the asset or named previous entry
    /// is absent, or an error if the database operation fails.
    pub fn insert_report(&self, report: &Report) -> Result<i64> {
        self.require_asset(report.asset_id)?;
        if let Some(previous_id) = report.previous_entry_id {
            self.require_report(previous_id)?;
        }

        self.conn.execute(
            r"
            INSERT INTO reports (
                asset_id, author_id, entry_date, work_order_number, priority,
                problem_type_id, problem_description, recommended_action,
                status, previous_entry_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
            params![
                report.asset_id,
                report.author_id,
                report.entry_date.format("%Y-%m-%d").to_string(),
                report.work_order_number,
                report.priority.to_string(),
                report.problem_type_id,
                report.problem_description,
                report.recommended_action,
                report.status.to_string(),
                report.previous_entry_id,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted report {} for asset {}", id, report.asset_id);
        Ok(id)
    }

    /// Get a report by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_report(&self, id: i64) -> Result<Option<Report>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, asset_id, author_id, entry_date, work_order_number, priority,
                       problem_type_id, problem_description, recommended_action,
                       status, previous_entry_id
                FROM reports WHERE id = ?1
                ",
                [id],
                Self::row_to_report,
            )
            .optional()?;
        Ok(result)
    }

    /// Update the mutable fields of a report. Author and entry date are
    /// not part of [`ReportUpdate`] and stay as written at creation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the report, asset or named
    /// previous entry is absent, or [`Error::CycleDetected`] if the new
    /// previous entry would make the chain loop back through this
    /// report.
    pub fn update_report(&self, id: i64, update: &ReportUpdate) -> Result<()> {
        self.require_report(id)?;
        self.require_asset(update.asset_id)?;

        if let Some(previous_id) = update.previous_entry_id {
            self.require_report(previous_id)?;
            if self.previous_would_cycle(id, previous_id)? {
                return Err(Error::cycle("report", id));
            }
        }

        self.conn.execute(
            r"
            UPDATE reports SET
                asset_id = ?1, work_order_number = ?2, priority = ?3,
                problem_type_id = ?4, problem_description = ?5,
                recommended_action = ?6, status = ?7, previous_entry_id = ?8
            WHERE id = ?9
            ",
            params![
                update.asset_id,
                update.work_order_number,
                update.priority.to_string(),
                update.problem_type_id,
                update.problem_description,
                update.recommended_action,
                update.status.to_string(),
                update.previous_entry_id,
                id,
            ],
        )?;
        Ok(())
    }

    /// List all reports, newest id first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_reports(&self) -> Result<Vec<Report>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, asset_id, author_id, entry_date, work_order_number, priority,
                   problem_type_id, problem_description, recommended_action,
                   status, previous_entry_id
            FROM reports ORDER BY id DESC
            ",
        )?;
        let reports = stmt
            .query_map([], Self::row_to_report)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// Count total reports in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_reports(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Collect the follow-up chain starting at the given report,
    /// newest first, following `previous_entry_id` until null.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the starting report (or a link in
    /// the chain) is absent, and [`Error::CycleDetected`] if the stored
    /// chain revisits a report. The visited set guarantees termination
    /// even on corrupted data.
    pub fn report_chain(&self, id: i64) -> Result<Vec<Report>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(report_id) = current {
            if !visited.insert(report_id) {
                warn!("Report chain loops back through {}", report_id);
                return Err(Error::cycle("report", report_id));
            }
            let report = self.require_report(report_id)?;
            current = report.previous_entry_id;
            chain.push(report);
        }

        Ok(chain)
    }

    /// Check whether pointing `id`'s previous entry at `new_previous`
    /// would form a loop: the chain starting at the candidate must not
    /// reach back to `id`.
    fn previous_would_cycle(&self, id: i64, new_previous: i64) -> Result<bool> {
        let mut visited = HashSet::new();
        let mut current = Some(new_previous);

        while let Some(report_id) = current {
            if report_id == id {
                return Ok(true);
            }
            if !visited.insert(report_id) {
                return Err(Error::cycle("report", report_id));
            }
            current = self.require_report(report_id)?.previous_entry_id;
        }

        Ok(false)
    }

    fn require_report(&self, id: i64) -> Result<Report> {
        self.get_report(id)?
            .ok_or_else(|| Error::not_found("report", id))
    }

    // === Row mappers ===

    /// Convert a database row to an Asset struct.
    fn row_to_asset(row: &rusqlite::Row) -> rusqlite::Result<Asset> {
        let priority_str: String = row.get(4)?;
        Ok(Asset {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            parent_id: row.get(3)?,
            priority: Self::parse_priority(&priority_str),
        })
    }

    /// Convert a database row to a ProblemType struct.
    fn row_to_problem_type(row: &rusqlite::Row) -> rusqlite::Result<ProblemType> {
        Ok(ProblemType {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }

    /// Convert a database row to a User struct.
    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let roles_json: String = row.get(2)?;
        let permissions_json: String = row.get(3)?;

        Ok(User {
            id: Some(row.get(0)?),
            username: row.get(1)?,
            roles: serde_json::from_str(&roles_json).unwrap_or_else(|_| {
                warn!("Unreadable roles list, treating as empty");
                Vec::new()
            }),
            permissions: serde_json::from_str(&permissions_json).unwrap_or_else(|_| {
                warn!("Unreadable permissions list, treating as empty");
                Vec::new()
            }),
        })
    }

    /// Convert a database row to a Report struct.
    fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
        let entry_date_str: String = row.get(3)?;
        let priority_str: String = row.get(5)?;
        let status_str: String = row.get(9)?;

        let entry_date = NaiveDate::parse_from_str(&entry_date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| {
                warn!("Unreadable entry date '{}', using today", entry_date_str);
                Utc::now().date_naive()
            });

        Ok(Report {
            id: Some(row.get(0)?),
            asset_id: row.get(1)?,
            author_id: row.get(2)?,
            entry_date,
            work_order_number: row.get(4)?,
            priority: Self::parse_priority(&priority_str),
            problem_type_id: row.get(6)?,
            problem_description: row.get(7)?,
            recommended_action: row.get(8)?,
            status: status_str.parse().unwrap_or_else(|_| {
                warn!("Unknown status '{}', defaulting to NEW", status_str);
                Status::New
            }),
            previous_entry_id: row.get(10)?,
        })
    }

    fn parse_priority(value: &str) -> Priority {
        value.parse().unwrap_or_else(|_| {
            warn!("Unknown priority '{}', defaulting to MED", value);
            Priority::Med
        })
    }
}
