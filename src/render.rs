//! Colored terminal rendering for gradesync-core types.

use gradesync_core::classify::Category;
use gradesync_core::sync::CategoryPlan;
use gradesync_core::{ColumnDiff, SyncReport};
use owo_colors::OwoColorize;

/// Columns listed one per line up to this many; beyond it only counts.
const COMPACT_THRESHOLD: usize = 8;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Category {
    fn render(&self) -> String {
        format!("📊 {}", self.sheet_title().bold())
    }
}

impl Render for ColumnDiff {
    fn render(&self) -> String {
        let mut lines = vec![self.category.render()];

        if self.added.is_empty() {
            lines.push(format!(
                "   {} ({} columns)",
                "Up to date".dimmed(),
                self.existing.len()
            ));
            return lines.join("\n");
        }

        if self.added.len() <= COMPACT_THRESHOLD {
            for title in &self.added {
                lines.push(format!("   {} {}", "+".green(), title.green()));
            }
        } else {
            lines.push(format!(
                "   {} {}",
                "+".green(),
                format!("{} new columns", self.added.len()).green()
            ));
        }
        if !self.existing.is_empty() {
            lines.push(format!(
                "   {}",
                format!("after {} existing columns", self.existing.len()).dimmed()
            ));
        }

        lines.join("\n")
    }
}

impl Render for CategoryPlan {
    fn render(&self) -> String {
        let diff = self.diff.render();
        if self.sheet_exists {
            diff
        } else {
            format!(
                "{}\n   {}",
                diff,
                format!("subsheet '{}' will be created", self.diff.category).yellow()
            )
        }
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let mut parts = vec![format!(
            "{} new columns across {} categories",
            self.added_columns(),
            self.categories.len()
        )];
        if self.mirrored > 0 {
            parts.push(format!("{} grade exports mirrored", self.mirrored));
        }
        if !self.created_sheets.is_empty() {
            parts.push(format!("{} subsheets created", self.created_sheets.len()));
        }

        let mut summary = format!("Synced: {}", parts.join(", "));
        if self.skipped_rows > 0 {
            summary.push_str(&format!(
                "\n{}",
                format!("{} grade rows skipped (see warnings above)", self.skipped_rows).yellow()
            ));
        }
        if self.retries > 0 {
            summary.push_str(&format!(
                "\n{}",
                format!("{} rate-limited calls retried", self.retries).dimmed()
            ));
        }
        summary
    }
}
