use std::path::Path;

use anyhow::Result;
use gradesync_core::sync;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui;

pub async fn run(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let options = config.sync_options()?;
    let source = config.source_provider();
    let mut session = super::open_session(&config)?;

    let spinner = tui::create_spinner(format!("Checking course {}", options.course_id));
    let result = sync::plan(&mut session, &source, &options).await;
    spinner.finish_and_clear();
    let plan = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if plan.categories.is_empty() {
        println!("No classified assignments among {}.", plan.assignments);
        return Ok(());
    }

    for category in &plan.categories {
        println!("{}", category.render());
    }

    if !plan.missing_assignment_sheets.is_empty() {
        println!();
        println!("{}", "Grade subsheets to create".bold());
        for title in &plan.missing_assignment_sheets {
            println!("   {} {}", "+".green(), title.green());
        }
    }

    let pending = plan
        .categories
        .iter()
        .any(|c| c.diff.has_changes() || !c.sheet_exists)
        || !plan.missing_assignment_sheets.is_empty();

    if pending {
        println!("\nRun `gradesync sync` to apply.");
    } else {
        println!("\nEverything up to date.");
    }

    Ok(())
}
