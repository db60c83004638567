use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::mutant::Mutant;
use crate::patch::apply_mutant;
use crate::run_report::GenerationReport;
use crate::source::SourceFile;

/// Write every output artifact of a run into `out_dir`.
pub fn write_all(out_dir: &Path, source: &SourceFile, report: &GenerationReport) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {:?}", out_dir))?;

    write_mutants_json(out_dir, &report.mutants)?;
    write_diff_dir(out_dir, &report.mutants)?;
    write_mutated_sources(out_dir, source, &report.mutants)?;
    write_log(out_dir, report)
}

/// Write `mutants.json` containing all kept mutants.
pub fn write_mutants_json(out_dir: &Path, mutants: &[Mutant]) -> Result<()> {
    let path = out_dir.join("mutants.json");
    write_pretty_json(&path, mutants)
}

/// Write a minimal `diff/000001.diff` file per mutant (snippet-based).
pub fn write_diff_dir(out_dir: &Path, mutants: &[Mutant]) -> Result<()> {
    let diff_dir = out_dir.join("diff");
    fs::create_dir_all(&diff_dir)
        .with_context(|| format!("failed to create diff dir {:?}", diff_dir))?;

    for m in mutants {
        let file = m.span.file.display().to_string();
        let op = match &m.tag {
            Some(tag) => format!("{}/{}", m.operator.name, tag),
            None => m.operator.name.clone(),
        };

        let mut content = format!(
            "--- {file}\n+++ {file}\n@@ [{start}..{end}] line {line} {op}\n- {orig:?}\n+ {mutated:?}\n",
            start = m.span.start,
            end = m.span.end,
            line = m.line,
            orig = m.original_snippet,
            mutated = m.mutated_snippet,
        );
        for extra in &m.extra_edits {
            content.push_str(&format!(
                "@@ [{start}..{end}]\n- {orig:?}\n+ {mutated:?}\n",
                start = extra.span.start,
                end = extra.span.end,
                orig = extra.original,
                mutated = extra.replacement,
            ));
        }

        let path = diff_dir.join(format!("{:06}.diff", m.id));
        fs::write(&path, content).with_context(|| format!("failed to write {:?}", path))?;
    }

    Ok(())
}

/// Write the fully mutated source of every mutant as `mutants/000001.<ext>`.
pub fn write_mutated_sources(out_dir: &Path, source: &SourceFile, mutants: &[Mutant]) -> Result<()> {
    let dir = out_dir.join("mutants");
    fs::create_dir_all(&dir).with_context(|| format!("failed to create mutants dir {:?}", dir))?;

    let ext = source
        .disk_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("cpp");

    for m in mutants {
        let path = dir.join(format!("{:06}.{ext}", m.id));
        fs::write(&path, apply_mutant(source.text(), m))
            .with_context(|| format!("failed to write {:?}", path))?;
    }

    Ok(())
}

/// Write a stable `log` file (no timestamps) with the run summary.
pub fn write_log(out_dir: &Path, report: &GenerationReport) -> Result<()> {
    let path = out_dir.join("log");

    let mut lines = Vec::new();
    lines.push(format!("tool: {}", report.tool));
    lines.push(format!("version: {}", report.version));
    lines.push(format!("facts: {}", report.facts.display()));
    lines.push(format!("source: {}", report.source.display()));
    lines.push(format!("generated: {}", report.generated));
    lines.push(format!("kept: {}", report.mutants.len()));
    lines.push(format!("duplicates: {}", report.duplicates));
    for (name, count) in &report.operators {
        lines.push(format!("operator {name}: {count}"));
    }
    if let Some(err) = &report.error {
        lines.push(format!("error: {err}"));
    }

    let content = lines.join("\n") + "\n";
    fs::write(&path, content).with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

// `?Sized` allows passing unsized values such as slices (e.g. `&[Mutant]` where `T = [Mutant]`).
fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize json")?;
    fs::write(path, json).with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}
