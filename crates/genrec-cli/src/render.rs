//! Plain-text rendering for terminal use.

use std::fmt::{self, Write};

use genrec_common::entities::{CancerRecommendation, SexFilter};
use genrec_engine::{Explanation, Finding, IncludedGroup, InclusionSource, Report, ReportBox};

fn age_label(age_min: Option<i32>) -> String {
    match age_min {
        None => "any age".to_string(),
        Some(min) => format!("from {min}"),
    }
}

fn sex_label(sex: SexFilter) -> &'static str {
    match sex {
        SexFilter::Any => "",
        SexFilter::Male => " [M]",
        SexFilter::Female => " [F]",
    }
}

fn source_label(source: &InclusionSource) -> &'static str {
    match source {
        InclusionSource::Override => "override",
        InclusionSource::AppliesToAll => "all classes",
        InclusionSource::ClassMatch => "class",
        InclusionSource::ManualLink => "manual",
    }
}

fn write_groups(out: &mut String, title: &str, groups: &[IncludedGroup]) -> fmt::Result {
    if groups.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {title}:")?;
    for g in groups {
        let sources: Vec<&str> = g.sources.iter().map(source_label).collect();
        writeln!(
            out,
            "    - ({}{}) {}  <{}>",
            age_label(g.group.age_min),
            sex_label(g.group.sex),
            g.group.recommendations.trim(),
            sources.join(", ")
        )?;
    }
    Ok(())
}

fn write_cancer(out: &mut String, title: &str, recs: &[CancerRecommendation]) -> fmt::Result {
    if recs.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {title}:")?;
    for r in recs {
        writeln!(out, "    - ({}{}) {}", age_label(r.age_min), sex_label(r.sex), r.recommendations.trim())?;
    }
    Ok(())
}

fn write_box(out: &mut String, b: &ReportBox) -> fmt::Result {
    let suffix = if b.cancer_only { " (cancer-linked)" } else { "" };
    writeln!(out, "== {}{} ==", b.gene.symbol, suffix)?;
    if !b.mutations.is_empty() {
        let mutations: Vec<String> = b
            .mutations
            .iter()
            .map(|m| format!("{} ({})", m.mutation, m.pathogenicity.as_str()))
            .collect();
        writeln!(out, "  Mutations: {}", mutations.join(", "))?;
    }
    if !b.risks.is_empty() {
        writeln!(out, "  Risks:")?;
        for r in &b.risks {
            writeln!(out, "    - {}{}", r.risk.trim(), sex_label(r.sex))?;
        }
    }
    write_groups(out, "Recommended now", &b.done_recs)?;
    write_groups(out, "Recommended later", &b.future_recs)?;
    write_cancer(out, "Cancer follow-up now", &b.cancer_done_recs)?;
    write_cancer(out, "Cancer follow-up later", &b.cancer_future_recs)
}

pub fn report(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Patient: age {}, sex {}", report.patient.age, report.patient.sex.as_str())?;
    if report.is_empty() {
        writeln!(out, "\nNo recommendations.")?;
    }
    for b in &report.boxes {
        out.push('\n');
        write_box(&mut out, b)?;
    }
    Ok(out)
}

pub fn explanation(explanation: &Explanation) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{} {}", explanation.gene.symbol, explanation.mutation.mutation)?;
    for d in &explanation.decisions {
        let i = &d.inclusion;
        let verdict = if d.included { "INCLUDED" } else { "excluded" };
        let override_kind = i.override_kind.map(|k| k.as_str()).unwrap_or("-");
        writeln!(
            out,
            "  {verdict:<8} ({}) override={override_kind} all={} class={} manual={}  {}",
            age_label(d.group.age_min),
            i.applies_to_all,
            i.class_match,
            i.manual,
            d.group.recommendations.trim()
        )?;
    }
    Ok(out)
}

/// Row counts in the order given, then any findings.
pub fn check(counts: &[(&str, usize)], findings: &[Finding]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for (table, count) in counts {
        writeln!(out, "{table:<32} {count:>6}")?;
    }
    if findings.is_empty() {
        writeln!(out, "\nNo problems found.")?;
    } else {
        writeln!(out, "\n{} problem(s):", findings.len())?;
        for f in findings {
            writeln!(out, "  [{}] {}", f.table, f.message)?;
        }
    }
    Ok(out)
}
