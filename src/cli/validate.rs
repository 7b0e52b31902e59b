//! Validate command - run the validation pass and report publish readiness

use crate::cli::progress::CliProgress;
use crate::cli::session::{SessionArgs, open_session, with_ctrl_c};
use crate::cli::style::{Stylize, arrow, bullet, check};
use anstream::println;
use anyhow::bail;
use std::path::Path;

/// Run the validate command
pub async fn run_validate(
    args: &SessionArgs,
    config: Option<&Path>,
    verbose: bool,
) -> anyhow::Result<()> {
    let progress = CliProgress::verbose();
    let mut publisher = open_session(args, config, None, &progress)?;

    let cancel = publisher.cancel_token();
    let (publisher, report) = with_ctrl_c(cancel, move || {
        let progress = if verbose {
            CliProgress::verbose()
        } else {
            CliProgress::compact()
        };
        let report = publisher.validate(&progress);
        (publisher, report)
    })
    .await?;
    let report = report?;

    if report.cancelled {
        bail!("Validation cancelled after {} of the checked tasks", report.visited);
    }
    if report.errors > 0 {
        bail!(
            "{} of {} tasks failed validation",
            report.errors,
            report.visited
        );
    }

    let admission = publisher.admission(None)?;
    println!();
    if admission.enabled {
        println!("{} {}", check(), "Ready to publish".success());
    } else {
        println!("{} {}", arrow(), "Not ready to publish:".emphasis());
        for reason in &admission.reasons {
            println!("  {} {}", bullet(), reason.muted());
        }
    }
    Ok(())
}
