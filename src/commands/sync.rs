use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use gradesync_core::sync;

use crate::render::Render;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let options = config.sync_options()?;
    let source = config.source_provider();
    let mut session = super::open_session(&config)?;

    let started = Instant::now();
    let report = sync::run(&mut session, &source, &options)
        .await
        .context("Sync aborted; the batch was not submitted")?;
    log::info!("Finished in {:.2} seconds", started.elapsed().as_secs_f64());

    for diff in &report.categories {
        println!("{}", diff.render());
    }
    if !report.categories.is_empty() {
        println!();
    }
    println!("{}", report.render());

    Ok(())
}
