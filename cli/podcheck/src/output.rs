//! Output formatting for scenario results.

use colored::Colorize;
use podcheck_harness::ScenarioReport;
use tabled::{Table, Tabled};

/// One row of the run summary table.
#[derive(Debug, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Scenario")]
    pub scenario: String,

    #[tabled(rename = "Result")]
    pub result: String,

    #[tabled(rename = "Attempts")]
    pub attempts: String,

    #[tabled(rename = "Elapsed")]
    pub elapsed: String,

    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl SummaryRow {
    pub fn passed(report: &ScenarioReport) -> Self {
        Self {
            scenario: report.name.clone(),
            result: "pass".to_string(),
            attempts: report.attempts.to_string(),
            elapsed: format!("{:.1?}", report.elapsed),
            detail: report.detail.clone(),
        }
    }

    pub fn failed(name: &str, message: &str) -> Self {
        Self {
            scenario: name.to_string(),
            result: "FAIL".to_string(),
            attempts: "-".to_string(),
            elapsed: "-".to_string(),
            detail: message.to_string(),
        }
    }
}

/// Print the run summary.
pub fn print_summary(rows: &[SummaryRow], failures: usize) {
    println!("{}", Table::new(rows));

    if failures == 0 {
        println!("{} all scenarios passed", "Success:".green().bold());
    } else {
        println!(
            "{} {failures} scenario(s) failed",
            "Failure:".red().bold()
        );
    }
}
