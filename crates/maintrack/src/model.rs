//! Core domain types for maintrack.
//!
//! This module defines the entities of the maintenance-reporting model:
//! assets arranged in a hierarchy, problem types, users, and reports
//! chained through their previous entries.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Priority of an asset or report.
///
/// Serialized using the wire spellings shared by the CSV contract and
/// the database (`HIGH`, `MED-HI`, `MED`, `LOW`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    /// High priority.
    #[serde(rename = "HIGH")]
    High,
    /// Medium-high priority.
    #[serde(rename = "MED-HI")]
    MedHigh,
    /// Medium priority (the default).
    #[default]
    #[serde(rename = "MED")]
    Med,
    /// Low priority.
    #[serde(rename = "LOW")]
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::MedHigh => write!(f, "MED-HI"),
            Self::Med => write!(f, "MED"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Self::High),
            "MED-HI" => Ok(Self::MedHigh),
            "MED" => Ok(Self::Med),
            "LOW" => Ok(Self::Low),
            other => Err(Error::validation(
                "priority",
                format!("unknown value '{other}'"),
            )),
        }
    }
}

/// Lifecycle status of a report.
///
/// Status moves freely between variants; there is no transition
/// restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// Newly filed, not yet picked up (the default).
    #[default]
    #[serde(rename = "NEW")]
    New,
    /// Being worked on.
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    /// Work completed.
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Resolved => write!(f, "RESOLVED"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "RESOLVED" => Ok(Self::Resolved),
            other => Err(Error::validation(
                "status",
                format!("unknown value '{other}'"),
            )),
        }
    }
}

/// A physical machine or equipment node in the maintenance hierarchy.
///
/// Assets form a forest through `parent_id`; the storage layer rejects
/// writes that would turn the hierarchy into a cycle. Deleting a parent
/// re-roots its children rather than cascading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Name of the machine or asset.
    pub name: String,

    /// Free-text details about the asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parent asset, if any. `None` marks a root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    /// Priority level of the asset.
    pub priority: Priority,
}

impl Asset {
    /// Create a new asset with the given fields and no id.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        parent_id: Option<i64>,
        priority: Priority,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description,
            parent_id,
            priority,
        }
    }

    /// Display name for listings: `"{parent.name} > {name}"` when a
    /// parent is known, else just the name. Single-level dereference
    /// only, not the full ancestor path.
    #[must_use]
    pub fn display_name(&self, parent_name: Option<&str>) -> String {
        match parent_name {
            Some(parent) => format!("{parent} > {}", self.name),
            None => self.name.clone(),
        }
    }

    /// Check if this asset is a root of the hierarchy.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A free-text label categorizing the kind of problem reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemType {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Label text.
    pub name: String,
}

impl ProblemType {
    /// Create a new problem type with the given name and no id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// A staff account known to the access gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Login name.
    pub username: String,

    /// Role (group) names this user belongs to.
    pub roles: Vec<String>,

    /// Fine-grained permission names this user holds.
    pub permissions: Vec<String>,
}

impl User {
    /// Create a new user with the given username and no grants.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// Add a role, builder style.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a permission, builder style.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Check membership in the named role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check possession of the named permission.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// A maintenance log entry filed against an asset.
///
/// `author_id` and `entry_date` are frozen at creation; every other
/// field stays mutable through updates. `previous_entry_id` links the
/// report to the entry it follows up, forming a singly linked,
/// most-recent-first chain that the storage layer keeps acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// The asset this report is filed against.
    pub asset_id: i64,

    /// The user who filed the report. `None` once the author account
    /// is deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,

    /// Date the report was filed. Set once at creation, never updated.
    pub entry_date: NaiveDate,

    /// External work-order reference, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_order_number: Option<String>,

    /// Priority of the reported problem.
    pub priority: Priority,

    /// Category of the problem, if assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_type_id: Option<i64>,

    /// Description of the problem. Required.
    pub problem_description: String,

    /// Suggested remediation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,

    /// Lifecycle status.
    pub status: Status,

    /// The report this one follows up, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_entry_id: Option<i64>,
}

impl Report {
    /// Create a new report against the given asset, authored by the
    /// given user, dated today. Remaining fields take their defaults
    /// and can be filled in before insertion.
    #[must_use]
    pub fn new(asset_id: i64, author_id: Option<i64>) -> Self {
        Self {
            id: None,
            asset_id,
            author_id,
            entry_date: Utc::now().date_naive(),
            work_order_number: None,
            priority: Priority::default(),
            problem_type_id: None,
            problem_description: String::new(),
            recommended_action: None,
            status: Status::default(),
            previous_entry_id: None,
        }
    }
}

/// The mutable subset of report fields accepted by the update action.
///
/// Author and entry date are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportUpdate {
    /// The asset this report is filed against.
    pub asset_id: i64,
    /// External work-order reference, if any.
    pub work_order_number: Option<String>,
    /// Priority of the reported problem.
    pub priority: Priority,
    /// Category of the problem, if assigned.
    pub problem_type_id: Option<i64>,
    /// Description of the problem.
    pub problem_description: String,
    /// Suggested remediation, if any.
    pub recommended_action: Option<String>,
    /// Lifecycle status.
    pub status: Status,
    /// The report this one follows up, if any.
    pub previous_entry_id: Option<i64>,
}

impl From<&Report> for ReportUpdate {
    fn from(report: &Report) -> Self {
        Self {
            asset_id: report.asset_id,
            work_order_number: report.work_order_number.clone(),
            priority: report.priority,
            problem_type_id: report.problem_type_id,
            problem_description: report.problem_description.clone(),
            recommended_action: report.recommended_action.clone(),
            status: report.status,
            previous_entry_id: report.previous_entry_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_display() {
        assert_eq!(Priority::High.to_string(), "HIGH");
        assert_eq!(Priority::MedHigh.to_string(), "MED-HI");
        assert_eq!(Priority::Med.to_string(), "MED");
        assert_eq!(Priority::Low.to_string(), "LOW");
    }

    #[test]
    fn test_priority_round_trip() {
        for p in [Priority::High, Priority::MedHigh, Priority::Med, Priority::Low] {
            let parsed: Priority = p.to_string().parse().unwrap();
            assert_eq!(parsed, p);
        }
    }

    #[test]
    fn test_priority_parse_unknown() {
        let result: Result<Priority, _> = "URGENT".parse();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("URGENT"));
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(Priority::default(), Priority::Med);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::New.to_string(), "NEW");
        assert_eq!(Status::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(Status::Resolved.to_string(), "RESOLVED");
    }

    #[test]
    fn test_status_round_trip() {
        for s in [Status::New, Status::InProgress, Status::Resolved] {
            let parsed: Status = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn test_status_default() {
        assert_eq!(Status::default(), Status::New);
    }

    #[test]
    fn test_asset_new() {
        let asset = Asset::new("Press 4", Some("hydraulic".to_string()), None, Priority::High);
        assert!(asset.id.is_none());
        assert_eq!(asset.name, "Press 4");
        assert_eq!(asset.description.as_deref(), Some("hydraulic"));
        assert!(asset.is_root());
    }

    #[test]
    fn test_asset_display_name_with_parent() {
        let asset = Asset::new("Conveyor A", None, Some(1), Priority::Med);
        assert_eq!(asset.display_name(Some("Line 1")), "Line 1 > Conveyor A");
    }

    #[test]
    fn test_asset_display_name_root() {
        let asset = Asset::new("Line 1", None, None, Priority::Med);
        assert_eq!(asset.display_name(None), "Line 1");
    }

    #[test]
    fn test_user_roles_and_permissions() {
        let user = User::new("alice")
            .with_role("MDI Team")
            .with_permission("report.view_report");

        assert!(user.has_role("MDI Team"));
        assert!(!user.has_role("Client"));
        assert!(user.has_permission("report.view_report"));
        assert!(!user.has_permission("report.add_report"));
    }

    #[test]
    fn test_report_new_defaults() {
        let report = Report::new(1, Some(2));
        assert!(report.id.is_none());
        assert_eq!(report.asset_id, 1);
        assert_eq!(report.author_id, Some(2));
        assert_eq!(report.priority, Priority::Med);
        assert_eq!(report.status, Status::New);
        assert!(report.previous_entry_id.is_none());
        assert_eq!(report.entry_date, Utc::now().date_naive());
    }

    #[test]
    fn test_report_update_from_report() {
        let mut report = Report::new(3, Some(1));
        report.problem_description = "bearing noise".to_string();
        report.status = Status::InProgress;

        let update = ReportUpdate::from(&report);
        assert_eq!(update.asset_id, 3);
        assert_eq!(update.problem_description, "bearing noise");
        assert_eq!(update.status, Status::InProgress);
    }

    #[test]
    fn test_priority_serde_wire_spelling() {
        let json = serde_json::to_string(&Priority::MedHigh).unwrap();
        assert_eq!(json, "\"MED-HI\"");
        let parsed: Priority = serde_json::from_str("\"MED-HI\"").unwrap();
        assert_eq!(parsed, Priority::MedHigh);
    }

    #[test]
    fn test_report_serialization() {
        let mut report = Report::new(1, None);
        report.problem_description = "leak".to_string();

        let json = serde_json::to_string(&report).unwrap();
        let deserialized: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(report, deserialized);
    }
}
