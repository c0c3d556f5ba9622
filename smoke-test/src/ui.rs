//! Display logic for the smoke-test CLI.
//!
//! This module handles text-mode output: the run header, colored result
//! lines as requests complete, the summary bar and the failure list.
//! Uses only the `console` crate.

use console::{pad_str, style, Alignment};
use smoke_test_lib::{ErrorResult, ResultCollection, SmokeConfig, SmokeResult, ValidResult};
use std::time::Duration;

use crate::{passes, RunSummary};

const URL_WIDTH: usize = 44;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a text-mode run.
pub fn print_header(url_count: usize, config: &SmokeConfig) {
    println!(
        "{} {} {}",
        style("smoke-test").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Checking {} URL{}",
            url_count,
            if url_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );

    let mut meta_parts = vec![
        format!("Concurrency: {}", config.concurrency),
        format!("Timeout: {}s", config.timeout.in_seconds()),
    ];
    if !config.follow_redirect {
        meta_parts.push("Redirects: off".to_string());
    }
    if let Some(auth) = &config.basic_auth {
        meta_parts.push(format!("Auth: {}", auth.username()));
    }

    println!("{}", style(meta_parts.join(" | ")).dim());
    println!();
}

// ── Result lines ─────────────────────────────────────────────────────────────

fn counter_prefix((current, total): (usize, usize)) -> String {
    format!("{} ", style(format!("[{}/{}]", current, total)).dim())
}

/// Print one response. 2xx is PASS, anything else FAIL.
pub fn print_valid(result: &ValidResult, show_body: bool, counter: (usize, usize)) {
    let padded_url = pad_str(result.url().as_str(), URL_WIDTH, Alignment::Left, Some(".."));
    let status = result.status_code();

    let verdict = if status.is_success() {
        style("PASS").green().bold()
    } else {
        style("FAIL").red().bold()
    };

    println!(
        "  {}{}  {}  {}  {}",
        counter_prefix(counter),
        style(&padded_url).white(),
        verdict,
        status,
        style(format!("{}ms", result.time_to_first_byte())).dim(),
    );

    if show_body && !result.body().is_empty() {
        println!("      {}", style(body_preview(result.body().as_str())).dim());
    }
}

/// Print one request that produced no response.
pub fn print_error(result: &ErrorResult, detailed: bool, counter: (usize, usize)) {
    let padded_url = pad_str(result.url().as_str(), URL_WIDTH, Alignment::Left, Some(".."));
    let message = result.error_message().as_str();

    println!(
        "  {}{}  {}  {}",
        counter_prefix(counter),
        style(&padded_url).white(),
        style("ERROR").yellow().bold(),
        style(brief_error(message)).dim(),
    );

    if detailed {
        println!("      {}", style(message).dim());
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(summary: &RunSummary, duration: Duration) {
    println!();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} URL{} in {:.1}s  {}  {}  {}  {}",
        style(summary.total).bold(),
        if summary.total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} passed", summary.passed)).green(),
        style("|").dim(),
        style(format!("{} failed", summary.failed)).red(),
    );
}

/// List failing URLs, at most five per category.
pub fn print_failure_summary(results: &ResultCollection) {
    let mut bad_status = Vec::new();
    let mut errors = Vec::new();

    for result in results.iter().filter(|r| !passes(r)) {
        match result {
            SmokeResult::Valid(valid) => {
                bad_status.push(format!("{} ({})", valid.url(), valid.status_code()))
            }
            SmokeResult::Error(error) => errors.push(format!(
                "{} {}",
                error.url(),
                brief_error(error.error_message().as_str())
            )),
        }
    }

    if bad_status.is_empty() && errors.is_empty() {
        return;
    }

    println!("  {}", style("Some URLs failed:").yellow());

    if !bad_status.is_empty() {
        println!(
            "  {} {} non-2xx response{}: {}",
            style("•").dim(),
            bad_status.len(),
            if bad_status.len() == 1 { "" } else { "s" },
            format_list(&bad_status, 5),
        );
    }
    if !errors.is_empty() {
        println!(
            "  {} {} request error{}: {}",
            style("•").dim(),
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            format_list(&errors, 5),
        );
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn format_list(items: &[String], max_show: usize) -> String {
    if items.len() <= max_show {
        items.join(", ")
    } else {
        let shown = &items[..max_show];
        let remaining = items.len() - max_show;
        format!("{}, ... and {} more", shown.join(", "), remaining)
    }
}

/// Single-line view of a body.
fn body_preview(body: &str) -> String {
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract a brief reason from a failure message.
fn brief_error(message: &str) -> &'static str {
    let m = message.to_lowercase();
    if m.contains("code: timeout") || m.contains("timed out") {
        "(timeout)"
    } else if m.contains("code: connect") || m.contains("dns") {
        "(connection error)"
    } else if m.contains("code: redirect") {
        "(redirect error)"
    } else if m.contains("code: body") {
        "(body error)"
    } else if m.starts_with("invalid response") {
        "(invalid response)"
    } else {
        "(error)"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
