use crate::mutant::Mutant;
use crate::span::SourceSpan;

/// Apply a single textual replacement to `code` based on `span`.
///
/// The `span` offsets are byte indices into `code`.
pub fn apply_span_patch(code: &str, span: &SourceSpan, replacement: &str) -> String {
    let start = span.start as usize;
    let end = span.end as usize;

    debug_assert!(
        start <= end && end <= code.len(),
        "span [{start}, {end}) is out of bounds for code length {}",
        code.len()
    );

    let mut out = String::with_capacity(
        code.len() + replacement.len().saturating_sub(end.saturating_sub(start)),
    );

    out.push_str(&code[..start]);
    out.push_str(replacement);
    out.push_str(&code[end..]);

    out
}

/// Apply a replacement and, in debug builds, verify that the original slice matches `expected_original`.
///
/// Spans recorded by the operators always cover a specific operator token,
/// expression or statement, so a mismatch means the source changed underneath.
pub fn apply_checked_patch(
    code: &str,
    span: &SourceSpan,
    expected_original: &str,
    replacement: &str,
) -> String {
    let start = span.start as usize;
    let end = span.end as usize;

    debug_assert_eq!(
        &code[start..end],
        expected_original,
        "span [{start}, {end}) does not match expected original snippet"
    );

    apply_span_patch(code, span, replacement)
}

/// Produce the fully mutated source for `m`: auxiliary edits plus the primary edit.
///
/// Identical auxiliary edits are applied once. Edits are applied right-to-left
/// so earlier offsets stay valid; at equal offsets a replacement goes before an
/// insertion, which therefore lands in front of the replaced text.
pub fn apply_mutant(code: &str, m: &Mutant) -> String {
    let mut edits: Vec<(&SourceSpan, &str, &str)> = Vec::with_capacity(m.extra_edits.len() + 1);
    edits.push((&m.span, m.original_snippet.as_str(), m.mutated_snippet.as_str()));

    for extra in &m.extra_edits {
        let seen = edits
            .iter()
            .any(|(span, _, text)| **span == extra.span && *text == extra.replacement);
        if !seen {
            edits.push((&extra.span, extra.original.as_str(), extra.replacement.as_str()));
        }
    }

    edits.sort_by(|(a, _, _), (b, _, _)| (b.start, b.end).cmp(&(a.start, a.end)));

    edits
        .into_iter()
        .fold(code.to_string(), |acc, (span, original, replacement)| {
            apply_checked_patch(&acc, span, original, replacement)
        })
}
