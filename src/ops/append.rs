use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::io::resolver::wiki_link;
use crate::model::task::ScanResult;
use crate::parse::line::{classify, format_task_line, normalize};
use crate::parse::{fenced, split_lines};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}#{1,6}(?:\s|$)").unwrap());

/// Result of merging candidates into an aggregator document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub text: String,
    pub inserted: usize,
}

/// Lines belonging to the section under `heading`: from the line after the
/// heading up to the next heading or the end of the document. `None` when the
/// heading is absent. Headings inside fenced code blocks do not count.
pub fn section_bounds(lines: &[&str], heading: &str) -> Option<Range<usize>> {
    let heading = heading.trim();
    let fenced = fenced(lines);
    let is_heading = |i: usize| !fenced[i] && HEADING_RE.is_match(lines[i]);
    let start = (0..lines.len()).find(|&i| !fenced[i] && lines[i].trim() == heading)? + 1;
    let end = (start..lines.len()).find(|&i| is_heading(i)).unwrap_or(lines.len());
    Some(start..end)
}

/// Canonical texts of every task in the section, open or completed, leaving
/// out fenced examples.
pub fn existing_keys(lines: &[&str], section: Range<usize>) -> HashSet<String> {
    let fenced = fenced(lines);
    section
        .filter(|&i| !fenced[i] && classify(lines[i]).is_task)
        .map(|i| normalize(lines[i]))
        .collect()
}

/// Insert candidates that are not already in the section directly below its
/// heading, in candidate order. Each line is rebuilt as
/// `- [ ] <text> <priority tag> [[source]]`.
///
/// A missing section inserts nothing.
pub fn append_tasks(aggregator_text: &str, heading: &str, candidates: &[ScanResult]) -> AppendOutcome {
    let lines = split_lines(aggregator_text);
    let Some(section) = section_bounds(&lines, heading) else {
        return AppendOutcome {
            text: aggregator_text.to_string(),
            inserted: 0,
        };
    };

    let mut seen = existing_keys(&lines, section.clone());
    // Keep CRLF documents consistent
    let eol = if lines[section.start - 1].ends_with('\r') { "\r" } else { "" };
    let new_lines: Vec<String> = candidates
        .iter()
        .filter(|c| seen.insert(c.canonical_text.clone()))
        .map(|c| {
            let line = format_task_line(&c.canonical_text, c.priority, &wiki_link(&c.source));
            format!("{}{}", line, eol)
        })
        .collect();

    if new_lines.is_empty() {
        return AppendOutcome {
            text: aggregator_text.to_string(),
            inserted: 0,
        };
    }

    let inserted = new_lines.len();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + inserted);
    out.extend_from_slice(&lines[..section.start]);
    out.extend(new_lines.iter().map(String::as_str));
    out.extend_from_slice(&lines[section.start..]);
    AppendOutcome {
        text: out.join("\n"),
        inserted,
    }
}
