//! SARIF 2.1.0 formatter.
//!
//! Rule descriptors come from the [`RuleInfo`](crate::checks::RuleInfo)
//! catalogue for every rule that fired, so `help` carries the remediation even
//! when a finding overrides its message.

use crate::checks;
use crate::finding::{BatchReport, Finding, Severity};
use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation, Region,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent,
};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

pub fn format(batch: &BatchReport) -> String {
    let rule_ids: BTreeSet<&str> = batch
        .reports
        .iter()
        .flat_map(|r| r.findings.iter().map(|f| f.rule_id.as_str()))
        .collect();

    let rule_index: HashMap<&str, i64> = rule_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i as i64))
        .collect();

    let rules: Vec<ReportingDescriptor> = rule_ids
        .iter()
        .map(|id| {
            let mut rule = ReportingDescriptor::builder().id(id.to_string()).build();
            if let Some(info) = checks::find_rule(id) {
                rule.short_description = Some(
                    MultiformatMessageString::builder()
                        .text(info.message.to_string())
                        .build(),
                );
                rule.help = Some(
                    MultiformatMessageString::builder()
                        .text(info.remediation.to_string())
                        .build(),
                );
            }
            rule
        })
        .collect();

    let results: Vec<SarifResult> = batch
        .reports
        .iter()
        .flat_map(|report| {
            report
                .findings
                .iter()
                .map(|f| to_result(&report.document, f, &rule_index))
        })
        .collect();

    let driver = ToolComponent::builder()
        .name(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();

    let run = Run::builder().tool(tool).results(results).build();

    let sarif = Sarif::builder().version("2.1.0").runs(vec![run]).build();

    serde_json::to_string_pretty(&sarif).expect("SARIF serialization failed")
}

fn to_result(document: &Path, f: &Finding, rule_index: &HashMap<&str, i64>) -> SarifResult {
    let level = match f.severity {
        Severity::Error => ResultLevel::Error,
        Severity::Warning => ResultLevel::Warning,
        Severity::Info => ResultLevel::Note,
    };

    let mut result = SarifResult::builder()
        .message(Message::builder().text(f.message.clone()).build())
        .build();

    result.rule_id = Some(f.rule_id.clone());
    result.level = Some(level);
    result.rule_index = rule_index.get(f.rule_id.as_str()).copied();

    let uri = document.to_string_lossy().replace('\\', "/");
    let mut location = Location::builder().build();
    let mut physical = PhysicalLocation::builder().build();
    physical.artifact_location = Some(ArtifactLocation::builder().uri(uri).build());

    if let Some(line) = f.line {
        let mut region = Region::builder().start_line(line as i64).build();
        region.end_line = f.end_line.map(|end| end as i64);
        physical.region = Some(region);
    }

    location.physical_location = Some(physical);
    result.locations = Some(vec![location]);
    result
}
