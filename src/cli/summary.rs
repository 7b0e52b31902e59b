//! Summary command - show what a publish would do

use crate::cli::progress::CliProgress;
use crate::cli::session::{SessionArgs, open_session};
use crate::cli::style::{Stylize, arrow, bullet};
use anstream::println;
use std::path::Path;

/// Run the summary command
pub fn run_summary(args: &SessionArgs, config: Option<&Path>) -> anyhow::Result<()> {
    let progress = CliProgress::compact();
    let publisher = open_session(args, config, None, &progress)?;
    let summary = publisher.summary();

    if summary.task_count == 0 {
        println!("{}", "Nothing to publish".muted());
        return Ok(());
    }

    println!(
        "{} {}",
        publisher.config().display_name.emphasis(),
        format!("({} tasks to execute)", summary.task_count).muted()
    );
    println!();
    for line in &summary.lines {
        if line.starts_with(' ') || line.contains(": ") {
            println!("  {} {}", bullet(), line.trim_start());
        } else {
            println!("{} {}", arrow(), line.accent());
        }
    }

    let description = &publisher.context().summary_description;
    println!();
    println!("{} {}", "Description:".muted(), description);
    Ok(())
}
