use console::style;

use crate::models::{ExploitResult, ScanResult, Severity};
use crate::utils::formatting::{format_duration, plural};
use crate::utils::truncation::truncate_preview;

fn severity_label(severity: Option<&Severity>) -> String {
    match severity {
        Some(s @ Severity::Critical) | Some(s @ Severity::High) => style(s.as_str()).red().bold().to_string(),
        Some(s @ Severity::Medium) => style(s.as_str()).yellow().to_string(),
        Some(s) => style(s.as_str()).cyan().to_string(),
        None => style("unknown").dim().to_string(),
    }
}

/// Human-readable summary of one scan, as printed by `pentoscan scan`.
pub fn format_scan_summary(result: &ScanResult) -> String {
    let mut out = String::new();
    let verdict = if result.vulnerable {
        style("VULNERABLE").red().bold().to_string()
    } else {
        style("not vulnerable").green().to_string()
    };
    out.push_str(&format!(
        "[{}] {} ({}) {} -> {}\n",
        severity_label(result.severity.as_ref()),
        result.template_id,
        result.template_name.as_deref().unwrap_or("-"),
        result.target_url,
        verdict
    ));

    if let Some(matched) = &result.matched {
        out.push_str(&format!(
            "  matched {} matcher #{} on step {} path {}\n",
            matched.matcher_type, matched.index, matched.step, matched.path
        ));
    }
    if let Some(url) = &result.matched_url {
        out.push_str(&format!("  url: {} {}\n", result.method, url));
    }
    if let (Some(status), Some(length)) = (result.status_code, result.response_length) {
        out.push_str(&format!("  response: {} ({} bytes)\n", status, length));
    }
    if result.total_findings() > 0 {
        out.push_str(&format!("  {}\n", plural(result.total_findings(), "finding")));
    }
    for finding in &result.extracted {
        out.push_str(&format!(
            "  {} {}\n",
            style("extracted").magenta(),
            truncate_preview(&finding.value)
        ));
    }
    out.push_str(&format!(
        "  {}, {} failed, {}\n",
        plural(result.requests_sent, "request"),
        result.failed_requests,
        format_duration(result.duration_ms)
    ));
    out
}

pub fn format_exploit_summary(exploit: &ExploitResult) -> String {
    if exploit.success {
        format!(
            "  {} exploit succeeded ({})\n",
            style("✔").green(),
            plural(exploit.details.len(), "detail field")
        )
    } else {
        format!(
            "  {} exploit failed: {}\n",
            style("✘").red(),
            exploit.error.as_deref().unwrap_or("unknown error")
        )
    }
}
