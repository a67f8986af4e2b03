use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::io::resolver::{RefResolver, literal_ref_path};
use crate::io::store::DocumentStore;
use crate::model::task::{ELEVATED_TAG, LineClass, Priority, STANDARD_TAG};

/// `- [ ] `, `* [x] `, `1. [ ] ` ... with the bracket char captured
static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+\[(.)\](?:\s|$)").unwrap());

/// Inline metadata emoji plus an adjacent date
static METADATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:➕|⏳|🛫|📅|✅|❌)\x{FE0F}?\s*(?:\d{4}-\d{2}-\d{2})?").unwrap()
});

/// `[[target]]`, `[[target|alias]]`, `![[embed]]`
static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]]*)\]\]").unwrap());

/// `[text](url)`
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[[^\[\]]*\]\([^()]*\)").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Classify a raw line: task or not, completion state, priority tier.
pub fn classify(line: &str) -> LineClass {
    match TASK_RE.captures(line) {
        Some(caps) => {
            let mark = caps.get(1).map_or("", |m| m.as_str());
            LineClass {
                is_task: true,
                completed: mark.eq_ignore_ascii_case("x"),
                priority: Priority::from_line(line),
            }
        }
        None => LineClass {
            is_task: false,
            completed: false,
            priority: Priority::from_line(line),
        },
    }
}

/// Reduce a line to its comparison key.
///
/// Strips the checkbox prefix, priority tags, metadata tags with their dates,
/// cross-document references and hyperlinks, then collapses whitespace. The
/// pipeline is repeated until nothing changes, so markup exposed by an earlier
/// removal is stripped as well and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(line: &str) -> String {
    let mut current = normalize_pass(line);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(line: &str) -> String {
    let text = match TASK_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    };
    let text = text.replace(ELEVATED_TAG, " ").replace(STANDARD_TAG, " ");
    let text = METADATA_RE.replace_all(&text, " ");
    let text = WIKI_LINK_RE.replace_all(&text, " ");
    let text = MD_LINK_RE.replace_all(&text, " ");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// The target of the first cross-document reference in a line, without alias
/// or heading: `[[notes/a#Todo|A]]` gives `notes/a`. Embeds are skipped.
pub fn first_ref_target(line: &str) -> Option<&str> {
    WIKI_LINK_RE
        .captures_iter(line)
        .filter(|caps| caps.get(1).is_some_and(|bang| bang.as_str().is_empty()))
        .filter_map(|caps| caps.get(2))
        .map(|inner| {
            let target = inner.as_str().split('|').next().unwrap_or("");
            target.split('#').next().unwrap_or("").trim()
        })
        .find(|target| !target.is_empty())
}

/// Resolve the first cross-document reference in a line. Falls back to the
/// literal target when the resolver cannot find the document.
pub fn extract_cross_doc_ref(
    line: &str,
    resolver: &dyn RefResolver,
    store: &dyn DocumentStore,
) -> Option<PathBuf> {
    let target = first_ref_target(line)?;
    resolver
        .resolve(target, store)
        .or_else(|| Some(literal_ref_path(target)))
}

/// Rewrite the checkbox of a task line. Returns `None` for non-task lines.
pub fn set_checkbox(line: &str, checked: bool) -> Option<String> {
    let caps = TASK_RE.captures(line)?;
    let mark = caps.get(1)?;
    let replacement = if checked { "x" } else { " " };
    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..mark.start()]);
    out.push_str(replacement);
    out.push_str(&line[mark.end()..]);
    Some(out)
}

/// Build an aggregator line in canonical form
pub fn format_task_line(canonical_text: &str, priority: Priority, link: &str) -> String {
    let mut parts = vec!["- [ ]"];
    if !canonical_text.is_empty() {
        parts.push(canonical_text);
    }
    if let Some(tag) = priority.tag() {
        parts.push(tag);
    }
    if !link.is_empty() {
        parts.push(link);
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::resolver::VaultResolver;
    use crate::io::store::MemoryStore;

    #[test]
    fn classify_task_lines() {
        let open = classify("- [ ] Ship release 🔺");
        assert!(open.is_task);
        assert!(!open.completed);
        assert_eq!(open.priority, Priority::Elevated);

        let done = classify("  * [X] Water plants ⏫");
        assert!(done.is_task);
        assert!(done.completed);
        assert_eq!(done.priority, Priority::Standard);

        let numbered = classify("3. [x] Numbered");
        assert!(numbered.is_task);
        assert!(numbered.completed);
        assert_eq!(numbered.priority, Priority::None);

        let empty = classify("- [ ]");
        assert!(empty.is_task);
    }

    #[test]
    fn classify_non_tasks() {
        for line in ["- plain item", "[ ] no marker", "-[ ] no space", "- [x]glued", "# Heading", ""] {
            assert!(!classify(line).is_task, "{:?} should not be a task", line);
        }
    }

    #[test]
    fn other_bracket_states_are_open() {
        assert!(!classify("- [/] in progress").completed);
        assert!(!classify("- [-] cancelled").completed);
    }

    #[test]
    fn elevated_wins_over_standard() {
        assert_eq!(classify("- [ ] both ⏫ 🔺").priority, Priority::Elevated);
    }

    #[test]
    fn normalize_strips_structure() {
        assert_eq!(normalize("- [ ] Ship release 🔺"), "Ship release");
        assert_eq!(
            normalize("- [x] Pay   rent ⏫ 📅 2025-06-01 ✅ 2025-05-30 [[finance|Money]]"),
            "Pay rent"
        );
        assert_eq!(
            normalize("* [ ] Read [the paper](https://example.com/p.pdf) tonight"),
            "Read tonight"
        );
        assert_eq!(normalize("- [ ] ➕2025-01-01 Call mom"), "Call mom");
    }

    #[test]
    fn normalize_is_the_same_in_both_documents() {
        let source = "    - [ ] Draft outline ⏫ 🛫 2025-02-02";
        let aggregated = "- [ ] Draft outline ⏫ [[projects/book]]";
        assert_eq!(normalize(source), normalize(aggregated));
    }

    #[test]
    fn normalize_can_be_empty() {
        assert_eq!(normalize("- [ ] 🔺 [[source]]"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "- [ ] Ship release 🔺",
            "- [ ] - [x] nested prefix",
            "[[x]]- [ ] link before prefix",
            "- [ ] [[a[t](u)]] link exposed by hyperlink removal",
            "- [ ] 📅📅 2025-01-01 2025-01-02 dates",
            "  \t- [ ]   spaced\tout  ",
            "1) [ ] 2. [ ] numbered twice",
            "plain text with [brackets] and (parens)",
            "- [ ] 🔺",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn first_ref_target_variants() {
        assert_eq!(first_ref_target("- [ ] a [[notes/b]]"), Some("notes/b"));
        assert_eq!(first_ref_target("- [ ] a [[b|Alias]] [[c]]"), Some("b"));
        assert_eq!(first_ref_target("- [ ] a [[b#Todo|B]]"), Some("b"));
        assert_eq!(first_ref_target("- [ ] a ![[img.png]] [[c]]"), Some("c"));
        assert_eq!(first_ref_target("- [ ] a [[]]"), None);
        assert_eq!(first_ref_target("- [ ] no refs"), None);
    }

    #[test]
    fn extract_ref_resolves_or_falls_back() {
        let store = MemoryStore::new();
        store.insert("projects/release.md", "");
        assert_eq!(
            extract_cross_doc_ref("- [ ] x [[release|R]]", &VaultResolver, &store),
            Some(PathBuf::from("projects/release.md"))
        );
        assert_eq!(
            extract_cross_doc_ref("- [ ] x [[deleted note]]", &VaultResolver, &store),
            Some(PathBuf::from("deleted note.md"))
        );
        assert_eq!(extract_cross_doc_ref("- [ ] x", &VaultResolver, &store), None);
    }

    #[test]
    fn set_checkbox_rewrites_only_the_bracket() {
        assert_eq!(
            set_checkbox("  - [ ] Ship [x] release", true).as_deref(),
            Some("  - [x] Ship [x] release")
        );
        assert_eq!(
            set_checkbox("- [X] Ship release 🔺 [[source]]", false).as_deref(),
            Some("- [ ] Ship release 🔺 [[source]]")
        );
        assert_eq!(set_checkbox("- not a task", true), None);
    }

    #[test]
    fn format_task_line_round_trips() {
        let line = format_task_line("Ship release", Priority::Elevated, "[[source]]");
        assert_eq!(line, "- [ ] Ship release 🔺 [[source]]");
        assert_eq!(normalize(&line), "Ship release");
        assert_eq!(format_task_line("", Priority::Standard, "[[s]]"), "- [ ] ⏫ [[s]]");
    }
}
