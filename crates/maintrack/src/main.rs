//! `mtrack` - CLI for maintrack
//!
//! This binary provides the command-line interface for filing and
//! browsing maintenance reports, managing the asset hierarchy, and
//! running CSV imports and exports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;

use anyhow::Result;
use clap::Parser;

use maintrack::cli::{
    AssetCommand, Cli, Command, CreateReportCommand, ExportFormat, ProblemTypeCommand,
    ReportCommand, UpdateReportCommand, UserCommand,
};
use maintrack::model::{Asset, ProblemType, Report, ReportUpdate, Status, User};
use maintrack::{init_logging, Config, Service, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    let storage = Storage::open(&config.database_path())?;
    let service = Service::new(&storage, &config.access, config.import.clone());

    // Resolve the acting user. An unknown username is treated the same
    // as no user: the gate redirects to login.
    let user = match &cli.user {
        Some(username) => storage.get_user_by_username(username)?,
        None => None,
    };

    // Execute the command
    match cli.command {
        Command::Asset(cmd) => handle_asset(&service, user.as_ref(), cmd),
        Command::ProblemType(cmd) => handle_problem_type(&service, user.as_ref(), cmd),
        Command::Report(cmd) => handle_report(&service, user.as_ref(), cmd),
        Command::User(cmd) => handle_user(&storage, cmd),
    }
}

fn handle_asset(
    service: &Service,
    user: Option<&User>,
    cmd: AssetCommand,
) -> Result<()> {
    match cmd {
        AssetCommand::Create {
            name,
            description,
            parent,
            priority,
        } => {
            let asset = service.create_asset(
                user,
                &Asset::new(name, description, parent, priority.into()),
            )?;
            println!("Created asset {}: {}", asset.id.unwrap_or(0), asset.name);
        }
        AssetCommand::List => {
            for asset in service.list_assets(user)? {
                println!(
                    "{:>6}  [{}]  {}",
                    asset.id.unwrap_or(0),
                    asset.priority,
                    asset.name
                );
            }
        }
        AssetCommand::Show { id } => {
            let (asset, display) = service.get_asset(user, id)?;
            println!("Asset {id}");
            println!("  Name:        {display}");
            println!("  Priority:    {}", asset.priority);
            if let Some(description) = &asset.description {
                println!("  Description: {description}");
            }
            match asset.parent_id {
                Some(parent) => println!("  Parent:      {parent}"),
                None => println!("  Parent:      (root)"),
            }
        }
        AssetCommand::Update {
            id,
            name,
            description,
            parent,
            priority,
        } => {
            let asset = service.update_asset(
                user,
                id,
                &Asset::new(name, description, parent, priority.into()),
            )?;
            println!("Updated asset {id}: {}", asset.name);
        }
    }
    Ok(())
}

fn handle_problem_type(
    service: &Service,
    user: Option<&User>,
    cmd: ProblemTypeCommand,
) -> Result<()> {
    match cmd {
        ProblemTypeCommand::Create { name } => {
            let created = service.create_problem_type(user, &ProblemType::new(name))?;
            println!(
                "Created problem type {}: {}",
                created.id.unwrap_or(0),
                created.name
            );
        }
        ProblemTypeCommand::List => {
            for problem_type in service.list_problem_types(user)? {
                println!("{:>6}  {}", problem_type.id.unwrap_or(0), problem_type.name);
            }
        }
        ProblemTypeCommand::Update { id, name } => {
            service.update_problem_type(user, id, &name)?;
            println!("Updated problem type {id}: {name}");
        }
    }
    Ok(())
}

fn handle_report(
    service: &Service,
    user: Option<&User>,
    cmd: ReportCommand,
) -> Result<()> {
    match cmd {
        ReportCommand::Create(cmd) => {
            let report = service.create_report(user, &create_fields(&cmd))?;
            println!("Created report {}", report.id.unwrap_or(0));
        }
        ReportCommand::List => {
            for report in service.list_reports(user)? {
                println!(
                    "{:>6}  {}  [{}] [{}]  {}",
                    report.id.unwrap_or(0),
                    report.entry_date,
                    report.status,
                    report.priority,
                    summary_line(&report.problem_description)
                );
            }
        }
        ReportCommand::Show { id } => {
            let render = service.render_report(user, id)?;
            println!("{}", render.title);
            for (label, value) in &render.fields {
                println!("  {label}: {value}");
            }
        }
        ReportCommand::Update(cmd) => {
            let current = service.get_report(user, cmd.id)?;
            let fields = merge_fields(&current, &cmd);
            service.update_report(user, cmd.id, &fields)?;
            println!("Updated report {}", cmd.id);
        }
        ReportCommand::Export { id, format, output } => {
            let rendered = match format {
                ExportFormat::Csv => service.export_report_csv(user, id)?,
                ExportFormat::Outline => service.export_report_outline(user, id)?.to_text(),
                ExportFormat::Fields => {
                    let render = service.render_report(user, id)?;
                    let mut text = format!("{}\n", render.title);
                    for (label, value) in &render.fields {
                        text.push_str(&format!("{label}: {value}\n"));
                    }
                    text
                }
            };
            match output {
                Some(path) => {
                    fs::write(&path, rendered)?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        ReportCommand::Import { file } => {
            let data = fs::read_to_string(&file)?;
            let summary = service.import_reports(user, &data)?;
            println!("Imported {} reports", summary.imported());
            for warning in &summary.warnings {
                println!("  warning: {warning}");
            }
            for error in &summary.errors {
                println!("  error: {error}");
            }
        }
    }
    Ok(())
}

fn handle_user(storage: &Storage, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Add {
            username,
            role,
            permission,
        } => {
            let mut user = User::new(username);
            user.roles = role;
            user.permissions = permission;
            let id = storage.insert_user(&user)?;
            println!("Added user {id}: {}", user.username);
        }
    }
    Ok(())
}

fn create_fields(cmd: &CreateReportCommand) -> ReportUpdate {
    ReportUpdate {
        asset_id: cmd.asset,
        work_order_number: cmd.work_order.clone(),
        priority: cmd.priority.into(),
        problem_type_id: cmd.problem_type,
        problem_description: cmd.description.clone(),
        recommended_action: cmd.recommended_action.clone(),
        status: Status::New,
        previous_entry_id: cmd.previous,
    }
}

/// Merge a partial update onto the stored report, leaving unset fields
/// unchanged.
fn merge_fields(current: &Report, cmd: &UpdateReportCommand) -> ReportUpdate {
    let mut fields = ReportUpdate::from(current);
    if let Some(asset) = cmd.asset {
        fields.asset_id = asset;
    }
    if let Some(description) = &cmd.description {
        fields.problem_description = description.clone();
    }
    if let Some(work_order) = &cmd.work_order {
        fields.work_order_number = Some(work_order.clone());
    }
    if let Some(priority) = cmd.priority {
        fields.priority = priority.into();
    }
    if let Some(problem_type) = cmd.problem_type {
        fields.problem_type_id = Some(problem_type);
    }
    if let Some(action) = &cmd.recommended_action {
        fields.recommended_action = Some(action.clone());
    }
    if let Some(status) = cmd.status {
        fields.status = status.into();
    }
    if let Some(previous) = cmd.previous {
        fields.previous_entry_id = Some(previous);
    }
    fields
}

fn summary_line(text: &str) -> String {
    let first = text.lines().next().unwrap_or("");
    if first.chars().count() > 60 {
        let truncated: String = first.chars().take(57).collect();
        format!("{truncated}...")
    } else {
        first.to_string()
    }
}
