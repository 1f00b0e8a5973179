use std::fmt::Write as _;

use crate::analysis::types::Finding;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::models::{AnalysisResult, ComparisonResult};

/// Render an analysis result in the requested format.
pub fn render_analysis(result: &AnalysisResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(analysis_text(result)),
        OutputFormat::Markdown => Ok(analysis_markdown(result)),
    }
}

pub fn render_comparison(result: &ComparisonResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "Consistency score: {}/100", result.consistency_score);
            let _ = writeln!(
                out,
                "Cross-document findings: {}",
                result.cross_document_findings.len()
            );
            for (i, finding) in result.cross_document_findings.iter().enumerate() {
                finding_text(&mut out, i, finding);
            }
            let _ = writeln!(out, "\n== Document 1 ==");
            out.push_str(&analysis_text(&result.document1_analysis));
            let _ = writeln!(out, "\n== Document 2 ==");
            out.push_str(&analysis_text(&result.document2_analysis));
            Ok(out)
        }
        OutputFormat::Markdown => {
            let mut out = String::from("# Document Comparison\n\n");
            let _ = writeln!(
                out,
                "**Consistency score:** {}/100\n",
                result.consistency_score
            );
            let _ = writeln!(out, "## Cross-document findings\n");
            findings_table(&mut out, &result.cross_document_findings);
            let _ = writeln!(out, "\n## Document 1\n");
            out.push_str(&analysis_markdown(&result.document1_analysis));
            let _ = writeln!(out, "\n## Document 2\n");
            out.push_str(&analysis_markdown(&result.document2_analysis));
            Ok(out)
        }
    }
}

fn finding_text(out: &mut String, index: usize, finding: &Finding) {
    let _ = writeln!(
        out,
        "[{}] {} ({}) confidence {:.2}{}",
        index + 1,
        finding.category,
        finding.severity,
        finding.confidence,
        if finding.verified { "" } else { " [unverified]" }
    );
    let _ = writeln!(out, "    {}", finding.description);
    let _ = writeln!(out, "    1: {}", finding.statement1.text);
    let _ = writeln!(out, "    2: {}", finding.statement2.text);
}

fn analysis_text(result: &AnalysisResult) -> String {
    let summary = &result.summary;
    let mut out = String::new();
    let _ = writeln!(out, "Risk score: {}/100", summary.risk_score);
    let _ = writeln!(
        out,
        "Contradictions: {} (high {}, medium {}, low {})",
        summary.total_contradictions,
        summary.high_severity,
        summary.medium_severity,
        summary.low_severity
    );
    if let Some(hash) = &result.document_hash {
        let _ = writeln!(out, "Document SHA-256: {hash}");
    }
    if let Some(forensic) = &result.forensic_data {
        let _ = writeln!(out, "Chain head: {}", forensic.integrity.chain_head);
        if result.is_degraded() {
            let _ = writeln!(out, "Warning: one or more stages ran degraded");
        }
    }
    if !result.has_findings() {
        let _ = writeln!(out, "No contradictions found.");
    }
    for (i, finding) in result.findings.iter().enumerate() {
        finding_text(&mut out, i, finding);
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn findings_table(out: &mut String, findings: &[Finding]) {
    if findings.is_empty() {
        let _ = writeln!(out, "_No contradictions found._");
        return;
    }
    let _ = writeln!(out, "| # | Type | Severity | Confidence | Statement 1 | Statement 2 |");
    let _ = writeln!(out, "|---|------|----------|------------|-------------|-------------|");
    for (i, finding) in findings.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.2} | {} | {} |",
            i + 1,
            finding.category,
            finding.severity,
            finding.confidence,
            escape_cell(&finding.statement1.text),
            escape_cell(&finding.statement2.text)
        );
    }
}

fn analysis_markdown(result: &AnalysisResult) -> String {
    let summary = &result.summary;
    let mut out = String::new();
    let _ = writeln!(out, "**Risk score:** {}/100\n", summary.risk_score);
    let _ = writeln!(out, "| Severity | Count |\n|----------|-------|");
    let _ = writeln!(out, "| high | {} |", summary.high_severity);
    let _ = writeln!(out, "| medium | {} |", summary.medium_severity);
    let _ = writeln!(out, "| low | {} |\n", summary.low_severity);
    findings_table(&mut out, &result.findings);

    if let Some(forensic) = &result.forensic_data {
        let _ = writeln!(out, "\n### Audit trail\n");
        let _ = writeln!(out, "Document SHA-256: `{}`\n", forensic.integrity.document_hash);
        for entry in &forensic.audit_trail {
            let _ = writeln!(
                out,
                "- {} `{}`{}",
                entry.stage,
                entry.chain_digest,
                if entry.status.is_degraded() { " (degraded)" } else { "" }
            );
        }
    }
    out
}
