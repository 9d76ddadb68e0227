//! Error display for the CLI.

use colored::Colorize;
use podcheck_harness::HarnessError;

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(harness_err) = err.downcast_ref::<HarnessError>() {
        match harness_err {
            HarnessError::Timeout { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: The cluster may still be converging. Raise PODCHECK_POLL_TIMEOUT_SECS \
                     or re-run once the deployment settles."
                        .yellow()
                );
            }
            HarnessError::External(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check PODCHECK_SCHEDULER_URL and that the service is installed."
                        .yellow()
                );
            }
            HarnessError::Trigger(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: The triggering operation was rejected; the cluster was not polled."
                        .yellow()
                );
            }
            _ => {}
        }
    }
}
