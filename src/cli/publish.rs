//! Publish command - validate, publish and finalize a manifest

use crate::cli::progress::CliProgress;
use crate::cli::session::{SessionArgs, open_session, with_ctrl_c};
use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use anyhow::bail;
use dialoguer::Confirm;
use pubflow::execute::RunOutcome;
use pubflow::gate::VALIDATION_REASON;
use std::path::Path;

/// Ask before publishing without validation; `--yes` answers for the user
fn confirm_unvalidated(yes: bool) -> bool {
    if yes {
        return true;
    }
    Confirm::new()
        .with_prompt("You are attempting to publish without validation. Continue?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Run the publish command
pub async fn run_publish(
    args: &SessionArgs,
    config: Option<&Path>,
    skip_validation: bool,
    yes: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    let progress = CliProgress::compact();
    let validate_override = skip_validation.then_some(false);
    let mut publisher = open_session(args, config, validate_override, &progress)?;

    // The run validates (or asks) on its own
    let admission = publisher.admission(None)?;
    let blocking: Vec<&String> = admission
        .reasons
        .iter()
        .filter(|r| r.as_str() != VALIDATION_REASON)
        .collect();
    if !blocking.is_empty() {
        for reason in &blocking {
            eprintln!("{} {}", cross(), reason.error());
        }
        bail!("Publish is not allowed");
    }

    let cancel = publisher.cancel_token();
    let (_publisher, report) = with_ctrl_c(cancel, move || {
        let progress = if verbose {
            CliProgress::verbose()
        } else {
            CliProgress::compact()
        };
        let confirm = move || confirm_unvalidated(yes);
        let report = publisher.publish(&progress, &confirm);
        (publisher, report)
    })
    .await?;
    let report = report?;

    match &report.outcome {
        RunOutcome::Completed => {
            let published = report
                .phases
                .last()
                .map_or(0, |finalize| finalize.visited);
            println!(
                "{} Published {} tasks",
                check(),
                published.to_string().accent()
            );
            Ok(())
        }
        RunOutcome::Declined => {
            println!("{}", report.outcome.to_string().muted());
            Ok(())
        }
        outcome => bail!("{outcome}"),
    }
}
