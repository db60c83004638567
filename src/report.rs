use std::collections::BTreeMap;

use crate::mutant::Mutant;
use crate::source::SourceFile;
use crate::ui::Ui;

/// Print every mutant, one line each, in id order.
pub fn print_all_mutants(ui: &mut Ui, source: &SourceFile, mutants: &[Mutant]) {
    if mutants.is_empty() {
        return;
    }

    ui.title(format!("--- mutants ({}) ---", mutants.len()));
    for m in collect_sorted(mutants.iter()) {
        ui.mutant(&format_mutant_with_location(source, m));
    }
}

/// Print the per-operator counts, skipping operators that found nothing.
pub fn print_operator_counts(ui: &Ui, counts: &BTreeMap<String, usize>) {
    ui.title("--- mutants per operator ---");
    for (name, count) in counts.iter().filter(|(_, c)| **c > 0) {
        ui.line(format!("{name:<10} {count}"));
    }
}

fn collect_sorted<'a>(iter: impl Iterator<Item = &'a Mutant>) -> Vec<&'a Mutant> {
    let mut v: Vec<&'a Mutant> = iter.collect();
    v.sort_by_key(|m| m.id);
    v
}

fn tag_label(m: &Mutant) -> String {
    m.tag
        .as_deref()
        .map(|t| format!(" [{t}]"))
        .unwrap_or_default()
}

/// Format one mutant as a single, readable line using line/column positions.
///
/// Falls back to byte spans when the span lies outside `source`.
pub fn format_mutant_with_location(source: &SourceFile, m: &Mutant) -> String {
    let (Some((sl, sc)), Some((el, ec))) = (source.line_col(m.span.start), source.line_col(m.span.end))
    else {
        return format_mutant_short(m);
    };

    let file = m.span.file.display();

    format!(
        "#{id} {file}:{sl}:{sc}-{el}:{ec} (line {line}) {name}{tag}: {orig:?} -> {mutated:?}",
        id = m.id,
        line = m.line,
        name = m.operator.name,
        tag = tag_label(m),
        orig = m.original_snippet,
        mutated = m.mutated_snippet,
    )
}

/// Format one mutant as a single, readable line.
pub fn format_mutant_short(m: &Mutant) -> String {
    let file = m.span.file.display();
    let start = m.span.start;
    let end = m.span.end;

    format!(
        "#{id} {file} [{start}..{end}] {name}{tag}: {orig:?} -> {mutated:?}",
        id = m.id,
        name = m.operator.name,
        tag = tag_label(m),
        orig = m.original_snippet,
        mutated = m.mutated_snippet,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutant::{MutationOperator, OperatorCategory};
    use crate::span::SourceSpan;
    use std::path::PathBuf;

    fn sample() -> Mutant {
        Mutant {
            id: 7,
            operator: MutationOperator {
                category: OperatorCategory::OperatorReplacement,
                name: "ORLN".to_string(),
            },
            span: SourceSpan {
                file: PathBuf::from("src/main.cpp"),
                start: 12,
                end: 13,
            },
            line: 2,
            original_snippet: "<".to_string(),
            mutated_snippet: "&&".to_string(),
            tag: Some("<&&".to_string()),
            extra_edits: Vec::new(),
        }
    }

    #[test]
    fn format_short_is_stable() {
        insta::assert_snapshot!(
            format_mutant_short(&sample()),
            @r#"#7 src/main.cpp [12..13] ORLN [<&&]: "<" -> "&&""#
        );
    }

    #[test]
    fn format_with_location_uses_line_and_column() {
        let source = SourceFile::from_text(
            PathBuf::from("src/main.cpp"),
            PathBuf::from("src/main.cpp"),
            "int f() {\na < b;\n}\n".to_string(),
        );

        assert_eq!(
            format_mutant_with_location(&source, &sample()),
            r#"#7 src/main.cpp:2:3-2:4 (line 2) ORLN [<&&]: "<" -> "&&""#
        );
    }

    #[test]
    fn out_of_bounds_spans_fall_back_to_bytes() {
        let source = SourceFile::from_text(
            PathBuf::from("src/main.cpp"),
            PathBuf::from("src/main.cpp"),
            "int x;".to_string(),
        );
        assert!(format_mutant_with_location(&source, &sample()).contains("[12..13]"));
    }
}
