//! CareCRM Workflows - Entry Point
//!
//! Operator CLI over the workflow store: list, create, change status,
//! duplicate and delete workflows, and inspect execution history.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use anyhow::Context;
use colored::{ColoredString, Colorize};

use carecrm_workflows::app::options::{parse_args, parse_statuses, AppOptions};
use carecrm_workflows::app::state::AppState;
use carecrm_workflows::logs::{init_logging, LogOptions};
use carecrm_workflows::models::execution::{ExecutionStatus, WorkflowExecution};
use carecrm_workflows::models::workflow::{NewWorkflow, Workflow, WorkflowStatus};
use carecrm_workflows::notify::{Notification, NotificationSink, NotificationVariant};
use carecrm_workflows::storage::settings::Settings;
use carecrm_workflows::tracker::ExecutionContext;
use carecrm_workflows::utils::version_info;
use carecrm_workflows::WorkflowFilters;

use tracing::{error, info};

/// Prints toasts to the terminal
struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        match n.variant {
            NotificationVariant::Default => println!("{} {}", n.title.green().bold(), n.description),
            NotificationVariant::Destructive => {
                eprintln!("{} {}", n.title.red().bold(), n.description)
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli_args = parse_args(env::args().skip(1));

    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    let options = match AppOptions::from_args(&cli_args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            std::process::exit(2);
        }
    };

    let layout = options.layout();
    let settings = match Settings::load(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            std::process::exit(2);
        }
    };

    if cli_args.contains_key("write-settings") {
        let file = layout.settings_file();
        match settings.save(&file).await {
            Ok(()) => println!("Settings written to {}", file.path().display()),
            Err(e) => {
                eprintln!("[ERROR] {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let log_options = LogOptions {
        log_level: options
            .log_level
            .clone()
            .unwrap_or_else(|| settings.log_level.clone()),
        json_format: settings.json_logs,
        log_dir: settings.log_to_file.then(|| layout.logs_dir()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    info!("CareCRM workflows {} ({})", version.version, version.git_hash);

    let mut state = match AppState::init(&layout, settings, Arc::new(ConsoleNotifier)).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to open workflow storage: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = dispatch(&mut state, &cli_args).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn dispatch(
    state: &mut AppState,
    cli_args: &HashMap<String, String>,
) -> anyhow::Result<()> {
    if cli_args.contains_key("create") {
        let data = NewWorkflow {
            name: cli_args.get("name").cloned(),
            description: cli_args.get("description").cloned(),
            trigger: cli_args.get("trigger").cloned(),
            created_by: cli_args.get("created-by").cloned(),
            ..Default::default()
        };
        let workflow = state.workflows.create(data).await?;
        print_workflows(std::slice::from_ref(&workflow));
        return Ok(());
    }

    if let Some(id) = cli_args.get("activate") {
        state.workflows.activate(id).await?;
        return Ok(());
    }
    if let Some(id) = cli_args.get("pause") {
        state.workflows.pause(id).await?;
        return Ok(());
    }
    if let Some(id) = cli_args.get("deactivate") {
        state.workflows.deactivate(id).await?;
        return Ok(());
    }
    if let Some(id) = cli_args.get("duplicate") {
        let copy = state.workflows.duplicate(id).await?;
        print_workflows(std::slice::from_ref(&copy));
        return Ok(());
    }
    if let Some(id) = cli_args.get("delete") {
        if !state.delete_workflow(id).await? {
            println!("{} no workflow with id {}", "Nothing deleted:".yellow(), id);
        }
        return Ok(());
    }

    if let Some(id) = cli_args.get("run") {
        let context = ExecutionContext {
            patient_id: cli_args.get("patient").cloned(),
            appointment_id: cli_args.get("appointment").cloned(),
            data: match cli_args.get("context") {
                Some(raw) => serde_json::from_str(raw).context("--context must be JSON")?,
                None => serde_json::Value::Null,
            },
        };
        let execution = state
            .run_workflow(id, &context, chrono::Utc::now())
            .await
            .with_context(|| format!("Unable to run workflow {}", id))?;
        print_executions(&[&execution]);
        return Ok(());
    }

    if let Some(id) = cli_args.get("executions") {
        let executions: Vec<&WorkflowExecution> = if id == "true" {
            state.executions.all().iter().collect()
        } else {
            state.executions.for_workflow(id)
        };
        print_executions(&executions);
        let summary = state.executions.summary();
        println!(
            "\n{} total, {} pending, {} in progress, {} completed, {} failed",
            summary.total, summary.pending, summary.in_progress, summary.completed, summary.failed
        );
        return Ok(());
    }

    if cli_args.contains_key("orphans") {
        let orphans = state.executions.orphaned(state.workflows.workflows());
        print_executions(&orphans);
        return Ok(());
    }

    // Default: list
    let mut filters = WorkflowFilters::default();
    if let Some(query) = cli_args.get("search") {
        filters = filters.with_search(query.clone());
    }
    if let Some(statuses) = cli_args.get("status") {
        for status in parse_statuses(statuses)? {
            filters = filters.with_status(status);
        }
    }
    state.workflows.set_filters(filters);

    let counts = state.workflows.status_counts();
    let header: Vec<String> = counts
        .iter()
        .map(|(status, n)| format!("{}: {}", status, n))
        .collect();
    println!("{}\n", header.join("  ").dimmed());
    print_workflows(&state.workflows.filtered());
    Ok(())
}

fn status_label(status: WorkflowStatus) -> ColoredString {
    let padded = format!("{:<9}", status);
    match status {
        WorkflowStatus::Active => padded.green(),
        WorkflowStatus::Paused => padded.yellow(),
        WorkflowStatus::Draft => padded.blue(),
        WorkflowStatus::Inactive => padded.dimmed(),
    }
}

fn print_workflows(workflows: &[Workflow]) {
    if workflows.is_empty() {
        println!("{}", "No workflows found".dimmed());
        return;
    }
    for w in workflows {
        let last_run = w
            .last_run
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<42} {} {:<24} {:<17} {}",
            w.id,
            status_label(w.status),
            w.trigger,
            last_run,
            w.name.bold()
        );
    }
}

fn print_executions(executions: &[&WorkflowExecution]) {
    if executions.is_empty() {
        println!("{}", "No executions found".dimmed());
        return;
    }
    for e in executions {
        let status = format!("{:<11}", e.status);
        let status = match e.status {
            ExecutionStatus::Completed => status.green(),
            ExecutionStatus::Failed => status.red(),
            ExecutionStatus::InProgress => status.yellow(),
            ExecutionStatus::Pending => status.normal(),
        };
        println!(
            "{:<42} {:<42} {} {} {}",
            e.id,
            e.workflow_id,
            status,
            e.triggered_at.format("%Y-%m-%d %H:%M"),
            e.patient_id.as_deref().unwrap_or("-")
        );
        for action in e.actions.iter().filter(|a| a.error.is_some()) {
            println!(
                "    {} {}",
                action.action_id,
                action.error.as_deref().unwrap_or_default().red()
            );
        }
    }
}
