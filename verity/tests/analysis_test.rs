use pretty_assertions::assert_eq;

use verity::analysis::StrategyId;
use verity::forensic::Stage;
use verity::{analyze, AnalysisConfig, Category, SensitivityLevel, Severity, VerityError};

const TEMPORAL_SCENARIO: &str = "The meeting occurred before January 15, 2024. \
    The agreement was signed after January 15, 2024. \
    John confirmed the meeting happened after January 20, 2024.";

const NUMERIC_SCENARIO: &str = "The total payment amount was $50,000. \
    The contract states the payment amount is $75,000. \
    Invoice records show $50,000 was received.";

#[tokio::test]
async fn test_no_statements_no_risk() {
    let result = analyze(
        "Hello there. The weather is pleasant today.",
        &AnalysisConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(result.summary.total_contradictions, 0);
    assert_eq!(result.summary.risk_score, 0);
    assert!(result.findings.is_empty());
}

#[tokio::test]
async fn test_temporal_scenario_single_finding() {
    let result = analyze(TEMPORAL_SCENARIO, &AnalysisConfig::default())
        .await
        .unwrap();

    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.category, Category::Temporal);
    assert_eq!(finding.severity, Severity::High);
    assert!(finding.verified);
    assert!(finding.statement1.text.contains("January 15"));
    assert!(finding.statement2.text.contains("January 20"));
    assert_eq!(result.summary.risk_score, 30);
}

#[tokio::test]
async fn test_numeric_scenario_flags_payment_amount() {
    let result = analyze(NUMERIC_SCENARIO, &AnalysisConfig::default())
        .await
        .unwrap();

    let numeric: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.category == Category::Numerical)
        .collect();
    assert!(!numeric.is_empty());
    assert!(numeric.iter().all(|f| f.severity == Severity::High && f.verified));
    assert_eq!(numeric[0].statement1.subject, "payment amount");
}

#[tokio::test]
async fn test_results_are_byte_identical_across_runs() {
    let config = AnalysisConfig::default();
    let first = serde_json::to_string(&analyze(NUMERIC_SCENARIO, &config).await.unwrap()).unwrap();
    let second =
        serde_json::to_string(&analyze(NUMERIC_SCENARIO, &config).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_every_finding_passed_majority_vote() {
    let text = format!(
        "{TEMPORAL_SCENARIO} {NUMERIC_SCENARIO} \
         The witness definitely saw the car. The witness possibly saw the car. \
         The audit took place. The audit did not occur."
    );
    let result = analyze(&text, &AnalysisConfig::default()).await.unwrap();

    assert!(result.findings.len() >= 3);
    for finding in &result.findings {
        assert!(finding.verified);
        assert_eq!(finding.votes.len(), 3);
        assert!(finding.agreeing_votes() >= 2, "{finding:?}");
        let ids: Vec<_> = finding.votes.iter().map(|v| v.strategy).collect();
        assert_eq!(ids, StrategyId::ALL.to_vec());
    }
}

#[tokio::test]
async fn test_differently_qualified_values_are_not_reported() {
    let unverified = AnalysisConfig {
        enable_triple_verification: false,
        ..AnalysisConfig::default()
    };
    for text in [
        "The fee was $10 per hour. The fee was $400 per month.",
        "The store sold 3 units on Monday. The store sold 9 units on Tuesday.",
    ] {
        // The detector flags the pair; verification throws it out.
        let raw = analyze(text, &unverified).await.unwrap();
        assert_eq!(raw.findings.len(), 1, "{text}");

        let result = analyze(text, &AnalysisConfig::default()).await.unwrap();
        assert!(result.findings.is_empty(), "{text}: {:?}", result.findings);
        assert_eq!(result.summary.risk_score, 0);
        assert!(!result.is_degraded());
    }
}

#[tokio::test]
async fn test_verification_disabled_reports_unverified() {
    let config = AnalysisConfig {
        enable_triple_verification: false,
        ..AnalysisConfig::default()
    };
    let result = analyze(TEMPORAL_SCENARIO, &config).await.unwrap();
    assert_eq!(result.findings.len(), 1);
    assert!(!result.findings[0].verified);
    assert!(result.findings[0].votes.is_empty());
    assert_eq!(result.findings[0].confidence, 0.3);
}

#[tokio::test]
async fn test_sensitivity_only_widens_candidates() {
    let text = "The transfer happened following the board vote. \
                The transfer happened before the board vote.";
    let low = analyze(text, &AnalysisConfig::default().with_sensitivity(SensitivityLevel::Low))
        .await
        .unwrap();
    let high = analyze(text, &AnalysisConfig::default().with_sensitivity(SensitivityLevel::High))
        .await
        .unwrap();
    assert!(low.findings.len() <= high.findings.len());
}

#[tokio::test]
async fn test_empty_input_is_input_error() {
    for text in ["", "   ", "\n\t\n"] {
        let err = analyze(text, &AnalysisConfig::default()).await.unwrap_err();
        assert!(matches!(err, VerityError::Input(_)), "for {text:?}");
    }
}

#[tokio::test]
async fn test_rule_failure_degrades_detection_without_aborting() {
    // Overflows to an infinite value, which the numerical rule refuses.
    let huge = "9".repeat(400);
    let text = format!(
        "The fee was ${huge}. The fee was $10. {TEMPORAL_SCENARIO}"
    );
    let result = analyze(&text, &AnalysisConfig::default()).await.unwrap();

    assert!(result.is_degraded());
    let trail = &result.forensic_data.as_ref().unwrap().audit_trail;
    let detection = trail.iter().find(|e| e.stage == Stage::Detection).unwrap();
    assert!(detection.status.is_degraded());

    // Other categories still run.
    assert!(result
        .findings
        .iter()
        .all(|f| f.category != Category::Numerical));
    assert_eq!(
        result
            .findings
            .iter()
            .filter(|f| f.category == Category::Temporal)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_forensic_disabled_serializes_nulls() {
    let config = AnalysisConfig {
        generate_forensic_hash: false,
        ..AnalysisConfig::default()
    };
    let result = analyze(TEMPORAL_SCENARIO, &config).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert!(json["documentHash"].is_null());
    assert!(json["forensicData"].is_null());
    assert_eq!(json["summary"]["riskScore"], 30);
    assert_eq!(json["findings"][0]["type"], "temporal");
}
