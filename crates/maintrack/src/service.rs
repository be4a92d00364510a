//! Gated actions over the storage layer.
//!
//! Each action mirrors one request handler of the reporting
//! application: it evaluates the configured access rule for the acting
//! user, then performs the storage work. Denials come back as
//! [`Error::AuthenticationRequired`] or [`Error::AuthorizationDenied`],
//! which a front end maps to the login and access-denied redirects.

use crate::access::{self, AccessRule, Decision};
use crate::config::{AccessConfig, ImportConfig};
use crate::error::{Error, Result};
use crate::export::{self, Outline, ReportRender};
use crate::import::{self, ImportSummary};
use crate::model::{Asset, ProblemType, Report, ReportUpdate, User};
use crate::storage::Storage;

/// The application service: storage plus the configured gate rules.
#[derive(Debug)]
pub struct Service<'a> {
    storage: &'a Storage,
    /// Rule for creating and editing entities and running imports:
    /// reporter roles only.
    reporter_rule: AccessRule,
    /// Rule for viewing, updating and exporting a single report:
    /// reporter roles or view permissions.
    viewer_rule: AccessRule,
    /// Rule for the report listing: view permissions only.
    list_rule: AccessRule,
    import_config: ImportConfig,
}

impl<'a> Service<'a> {
    /// Build a service over the given storage with gate rules from
    /// configuration.
    #[must_use]
    pub fn new(storage: &'a Storage, access: &AccessConfig, import_config: ImportConfig) -> Self {
        let reporter_rule = AccessRule::roles(access.reporter_roles.clone());
        let viewer_rule = AccessRule::roles(access.reporter_roles.clone())
            .or_permissions(access.view_permissions.clone());
        let list_rule = AccessRule::permissions(access.view_permissions.clone());

        Self {
            storage,
            reporter_rule,
            viewer_rule,
            list_rule,
            import_config,
        }
    }

    /// Evaluate a rule, converting deny decisions into errors.
    fn gate(&self, user: Option<&User>, rule: &AccessRule) -> Result<()> {
        match access::decide(user, rule) {
            Decision::Allow => Ok(()),
            Decision::RedirectToLogin => Err(Error::AuthenticationRequired),
            Decision::RedirectToAccessDenied => {
                let username = user.map(|u| u.username.clone()).unwrap_or_default();
                Err(Error::denied(username))
            }
        }
    }

    // === Reports ===

    /// Create a report from form fields. The acting user becomes the
    /// author and the entry date is frozen at today.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::Validation`] for an empty problem
    /// description, or a storage error.
    pub fn create_report(&self, user: Option<&User>, fields: &ReportUpdate) -> Result<Report> {
        self.gate(user, &self.reporter_rule)?;
        validate_report_fields(fields)?;

        let author = user.and_then(|u| u.id);
        let mut report = Report::new(fields.asset_id, author);
        apply_fields(&mut report, fields);

        let id = self.storage.insert_report(&report)?;
        report.id = Some(id);
        Ok(report)
    }

    /// List all reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns a gate error or a storage error.
    pub fn list_reports(&self, user: Option<&User>) -> Result<Vec<Report>> {
        self.gate(user, &self.list_rule)?;
        self.storage.list_reports()
    }

    /// Get a single report by id.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::NotFound`], or a storage error.
    pub fn get_report(&self, user: Option<&User>, id: i64) -> Result<Report> {
        self.gate(user, &self.viewer_rule)?;
        self.storage
            .get_report(id)?
            .ok_or_else(|| Error::not_found("report", id))
    }

    /// Update a report's mutable fields. Author and entry date are
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::Validation`] for an empty problem
    /// description, [`Error::NotFound`], [`Error::CycleDetected`], or a
    /// storage error.
    pub fn update_report(
        &self,
        user: Option<&User>,
        id: i64,
        fields: &ReportUpdate,
    ) -> Result<Report> {
        self.gate(user, &self.viewer_rule)?;
        validate_report_fields(fields)?;

        self.storage.update_report(id, fields)?;
        self.storage
            .get_report(id)?
            .ok_or_else(|| Error::not_found("report", id))
    }

    /// Export a report's chain as CSV, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::NotFound`], or a storage error.
    pub fn export_report_csv(&self, user: Option<&User>, id: i64) -> Result<String> {
        self.gate(user, &self.viewer_rule)?;
        export::export_chain_csv(self.storage, id)
    }

    /// Export a report's chain as a document outline, newest first.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::NotFound`], or a storage error.
    pub fn export_report_outline(&self, user: Option<&User>, id: i64) -> Result<Outline> {
        self.gate(user, &self.viewer_rule)?;
        export::export_chain_outline(self.storage, id)
    }

    /// Render a single report as labelled fields.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::NotFound`], or a storage error.
    pub fn render_report(&self, user: Option<&User>, id: i64) -> Result<ReportRender> {
        self.gate(user, &self.viewer_rule)?;
        export::render_report(self.storage, id)
    }

    /// Import a CSV batch. Created reports are authored by the acting
    /// user.
    ///
    /// # Errors
    ///
    /// Returns a gate error or a reader error; row-level failures are
    /// collected in the summary.
    pub fn import_reports(&self, user: Option<&User>, data: &str) -> Result<ImportSummary> {
        self.gate(user, &self.reporter_rule)?;
        // Gate passed, so a user is present.
        let user = user.ok_or(Error::AuthenticationRequired)?;
        import::import_reports_csv(self.storage, user, &self.import_config, data)
    }

    // === Assets ===

    /// Create an asset.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::Validation`] for an empty name,
    /// or a storage error.
    pub fn create_asset(&self, user: Option<&User>, asset: &Asset) -> Result<Asset> {
        self.gate(user, &self.reporter_rule)?;
        validate_name(&asset.name)?;

        let id = self.storage.insert_asset(asset)?;
        let mut created = asset.clone();
        created.id = Some(id);
        Ok(created)
    }

    /// List all assets ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a gate error or a storage error.
    pub fn list_assets(&self, user: Option<&User>) -> Result<Vec<Asset>> {
        self.gate(user, &self.reporter_rule)?;
        self.storage.list_assets()
    }

    /// Get a single asset with its display name.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::NotFound`], or a storage error.
    pub fn get_asset(&self, user: Option<&User>, id: i64) -> Result<(Asset, String)> {
        self.gate(user, &self.reporter_rule)?;
        let asset = self
            .storage
            .get_asset(id)?
            .ok_or_else(|| Error::not_found("asset", id))?;
        let display = self.storage.asset_display_name(id)?;
        Ok((asset, display))
    }

    /// Update an asset.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::Validation`], [`Error::NotFound`],
    /// [`Error::CycleDetected`], or a storage error.
    pub fn update_asset(&self, user: Option<&User>, id: i64, asset: &Asset) -> Result<Asset> {
        self.gate(user, &self.reporter_rule)?;
        validate_name(&asset.name)?;

        self.storage.update_asset(id, asset)?;
        self.storage
            .get_asset(id)?
            .ok_or_else(|| Error::not_found("asset", id))
    }

    // === Problem types ===

    /// Create a problem type.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::Validation`] for an empty name,
    /// or a storage error.
    pub fn create_problem_type(
        &self,
        user: Option<&User>,
        problem_type: &ProblemType,
    ) -> Result<ProblemType> {
        self.gate(user, &self.reporter_rule)?;
        validate_name(&problem_type.name)?;

        let id = self.storage.insert_problem_type(problem_type)?;
        let mut created = problem_type.clone();
        created.id = Some(id);
        Ok(created)
    }

    /// List all problem types ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a gate error or a storage error.
    pub fn list_problem_types(&self, user: Option<&User>) -> Result<Vec<ProblemType>> {
        self.gate(user, &self.reporter_rule)?;
        self.storage.list_problem_types()
    }

    /// Rename a problem type.
    ///
    /// # Errors
    ///
    /// Returns a gate error, [`Error::Validation`], [`Error::NotFound`],
    /// or a storage error.
    pub fn update_problem_type(&self, user: Option<&User>, id: i64, name: &str) -> Result<()> {
        self.gate(user, &self.reporter_rule)?;
        validate_name(name)?;
        self.storage.update_problem_type(id, name)
    }
}

fn validate_report_fields(fields: &ReportUpdate) -> Result<()> {
    if fields.problem_description.trim().is_empty() {
        return Err(Error::validation(
            "problem_description",
            "must not be empty",
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    Ok(())
}

fn apply_fields(report: &mut Report, fields: &ReportUpdate) {
    report.asset_id = fields.asset_id;
    report.work_order_number = fields.work_order_number.clone();
    report.priority = fields.priority;
    report.problem_type_id = fields.problem_type_id;
    report.problem_description = fields.problem_description.clone();
    report.recommended_action = fields.recommended_action.clone();
    report.status = fields.status;
    report.previous_entry_id = fields.previous_entry_id;
}
