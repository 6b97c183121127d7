use std::path::Path;

use anyhow::Result;
use gradesync_core::SyncConfig;
use owo_colors::OwoColorize;

pub fn run(override_path: Option<&Path>) -> Result<()> {
    let path = super::config_path(override_path)?;

    if !path.exists() {
        SyncConfig::create_default_config(&path)?;
        println!("{} {}", "Created".green(), path.display());
        println!("Fill in course_id and spreadsheet_id, then run `gradesync status`.");
        return Ok(());
    }

    let config = SyncConfig::load(&path)?;

    println!("{}", "Paths".bold());
    println!("  Config:        {}", path.display());
    println!();
    println!("{}", "Settings".bold());
    println!("  Course:        {}", render_optional(&config.course_id));
    println!("  Spreadsheet:   {}", render_optional(&config.spreadsheet_id));
    println!(
        "  Source:        {} ({})",
        config.source,
        config.source_provider().binary_name().dimmed()
    );
    println!("  Roster size:   {}", config.roster_size);
    println!("  Mirror grades: {}", config.mirror_grades);
    println!(
        "  Retries:       {} attempts, {}ms base delay, {}ms cap",
        config.retry.max_attempts, config.retry.base_delay_ms, config.retry.max_delay_ms
    );

    let token = match config.access_token() {
        Ok(_) => "set".green().to_string(),
        Err(_) => "missing".red().to_string(),
    };
    println!("  Token:         ${} ({})", config.access_token_env, token);

    Ok(())
}

fn render_optional(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "(not set)".red().to_string(),
    }
}
