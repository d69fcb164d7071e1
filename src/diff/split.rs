//! Per-file and line-bounded unified diff splitting.

use crate::llm::token_budget::estimate_tokens;

/// Marker that begins a per-file section in unified diff output.
const FILE_DIFF_MARKER: &str = "diff --git a/";

/// Prefix of the first line of a file section that carries a header.
const GIT_HEADER_PREFIX: &str = "diff --git ";

/// Marker that begins a hunk within a file diff.
const HUNK_MARKER: &str = "@@";

/// Key used when the input carries no `diff --git` headers.
pub const UNKNOWN_FILE: &str = "unknown";

/// Maximum number of leading header lines repeated on every sub-chunk.
const MAX_HEADER_LINES: usize = 4;

/// The diff text for exactly one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffUnit {
    /// Path of the file (extracted from the `b/` side of `diff --git a/... b/...`).
    pub file_path: String,
    /// Raw text of this file's diff (header + all hunks).
    pub content: String,
}

/// Splits a flat unified diff at `diff --git a/` boundaries.
///
/// Each unit spans from its header to just before the next header. Text
/// without any header becomes a single unit keyed [`UNKNOWN_FILE`]; an
/// empty or whitespace-only input yields no units.
pub fn split_by_file(diff: &str) -> Vec<DiffUnit> {
    let mut positions = Vec::new();

    // Find all positions where a file section starts (at line boundaries).
    if diff.starts_with(FILE_DIFF_MARKER) {
        positions.push(0);
    }
    let search = format!("\n{FILE_DIFF_MARKER}");
    let mut start = 0;
    while let Some(pos) = diff[start..].find(&search) {
        // +1 to skip the newline; the section starts at `diff`.
        positions.push(start + pos + 1);
        start = start + pos + 1;
    }

    if positions.is_empty() {
        if diff.trim().is_empty() {
            return Vec::new();
        }
        return vec![DiffUnit {
            file_path: UNKNOWN_FILE.to_string(),
            content: diff.to_string(),
        }];
    }

    positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| {
            let end = positions.get(i + 1).copied().unwrap_or(diff.len());
            let content = &diff[pos..end];
            let first_line = content.lines().next().unwrap_or("");
            DiffUnit {
                file_path: extract_path_from_diff_header(first_line),
                content: content.to_string(),
            }
        })
        .collect()
}

/// Splits one file's diff into line-bounded sub-chunks of at most
/// `max_tokens` estimated tokens.
///
/// When the text opens with a `diff --git` line, the leading header lines
/// (up to the first hunk, at most four) are repeated at the start of every
/// sub-chunk so each one identifies its file. Headerless text is split
/// without a repeated prefix. A single line too large to fit even on its own still gets a
/// sub-chunk of its own, which may then exceed `max_tokens`.
pub fn split_oversized_unit(diff_text: &str, max_tokens: usize) -> Vec<String> {
    let lines: Vec<&str> = diff_text.split_inclusive('\n').collect();
    let header_len = if diff_text.starts_with(GIT_HEADER_PREFIX) {
        lines
            .iter()
            .take(MAX_HEADER_LINES)
            .take_while(|line| !line.starts_with(HUNK_MARKER))
            .count()
    } else {
        0
    };

    let header: String = lines[..header_len].concat();
    let header_tokens = estimate_tokens(&header);

    let mut chunks = Vec::new();
    let mut current = header.clone();
    let mut current_tokens = header_tokens;
    let mut has_body = false;

    for line in &lines[header_len..] {
        let line_tokens = estimate_tokens(line);
        if has_body && current_tokens + line_tokens > max_tokens {
            chunks.push(std::mem::replace(&mut current, header.clone()));
            current_tokens = header_tokens;
        }
        current.push_str(line);
        current_tokens += line_tokens;
        has_body = true;
    }

    if has_body || chunks.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Extracts the file path from the `b/` side of a `diff --git` header line.
fn extract_path_from_diff_header(header_line: &str) -> String {
    // Format: "diff --git a/old_path b/new_path"
    // Find the last " b/" to handle paths that may contain spaces.
    if let Some(b_pos) = header_line.rfind(" b/") {
        header_line[b_pos + 3..].to_string()
    } else {
        header_line
            .strip_prefix(FILE_DIFF_MARKER)
            .unwrap_or(header_line)
            .to_string()
    }
}
