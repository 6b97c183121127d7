use std::path::Path;

use anyhow::Result;
use gradesync_core::classify;
use gradesync_core::source::GradeSource;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui;

pub async fn run(config_path: Option<&Path>, all: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let course_id = config.course_id()?;
    let source = config.source_provider();

    let spinner = tui::create_spinner(format!("Fetching assignments from {}", source.name()));
    let result = source.list_assignments(course_id).await;
    spinner.finish_and_clear();
    let assignments = result?;

    let buckets = classify::bucket(&assignments);
    for (category, records) in &buckets {
        println!("{}", category.render());
        for record in records {
            println!("   {} {}", record.title, record.id.dimmed());
        }
    }

    let skipped: Vec<_> = assignments
        .iter()
        .filter(|a| classify::matching_categories(&a.title).is_empty())
        .collect();

    if all && !skipped.is_empty() {
        println!("{}", "Skipped".bold());
        for record in &skipped {
            let reason = if classify::is_optional(&record.title) {
                "optional"
            } else {
                "no category"
            };
            println!("   {} {}", record.title.dimmed(), format!("({reason})").dimmed());
        }
    } else if !skipped.is_empty() {
        println!(
            "\n{}",
            format!("{} assignments skipped; use --all to list them", skipped.len()).dimmed()
        );
    }

    Ok(())
}
