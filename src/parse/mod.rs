pub mod line;
pub mod snapshot;

pub use line::{classify, extract_cross_doc_ref, normalize, set_checkbox};
pub use snapshot::{SnapshotBuilder, task_lines};

/// Split document text into lines. Joining the result with `\n` reproduces
/// the input exactly, including a trailing newline and `\r` endings.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Which lines are fence markers or sit inside a fenced code block. A block
/// opened with backticks only closes on backticks, and likewise for tildes.
pub fn fenced(lines: &[&str]) -> Vec<bool> {
    let mut open: Option<&'static str> = None;
    lines
        .iter()
        .map(|line| {
            let trimmed = line.trim_start();
            let Some(marker) = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(m)) else {
                return open.is_some();
            };
            match open {
                Some(current) if current == marker => open = None,
                Some(_) => {}
                None => open = Some(marker),
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_round_trips() {
        for text in ["a\nb\n", "a\r\nb", "", "\n\n"] {
            assert_eq!(split_lines(text).join("\n"), text);
        }
    }

    #[test]
    fn fences_close_on_matching_marker() {
        let lines = ["a", "```md", "b", "~~~", "```", "c", "  ~~~", "d"];
        assert_eq!(
            fenced(&lines),
            vec![false, true, true, true, true, false, true, true]
        );
    }
}
