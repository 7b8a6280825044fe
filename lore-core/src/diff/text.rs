use std::time::Duration;

use similar::{Algorithm, ChangeTag, TextDiff};

pub const DELETE_START: &str = "[-";
pub const DELETE_END: &str = "-]";
pub const INSERT_START: &str = "{+";
pub const INSERT_END: &str = "+}";

/// Past this, the remaining differing span is reported as one removal and one insertion
const DIFF_TIMEOUT: Duration = Duration::from_millis(100);

/// Character-level annotated diff of two strings
///
/// Unchanged runs are copied verbatim, deleted runs are wrapped in `[-…-]` and inserted runs in
/// `{+…+}`. Identical inputs give an empty string, which means "unchanged" in the audit trail.
/// Very different inputs may give a coarser, non-minimal diff once `DIFF_TIMEOUT` is hit.
pub fn diff_text(before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(DIFF_TIMEOUT)
        .diff_chars(before, after);
    let mut res = String::with_capacity(before.len() + after.len());
    let mut current = None;
    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if current != Some(tag) {
            close(&mut res, current);
            res.push_str(match tag {
                ChangeTag::Equal => "",
                ChangeTag::Delete => DELETE_START,
                ChangeTag::Insert => INSERT_START,
            });
            current = Some(tag);
        }
        res.push_str(change.value());
    }
    close(&mut res, current);
    res
}

fn close(res: &mut String, tag: Option<ChangeTag>) {
    res.push_str(match tag {
        None | Some(ChangeTag::Equal) => "",
        Some(ChangeTag::Delete) => DELETE_END,
        Some(ChangeTag::Insert) => INSERT_END,
    });
}

/// Whole-value diff, for flags and numbers where a character diff reads badly
pub fn diff_value<T: ToString + PartialEq>(before: &T, after: &T) -> String {
    if before == after {
        return String::new();
    }
    format!(
        "{DELETE_START}{}{DELETE_END}{INSERT_START}{}{INSERT_END}",
        before.to_string(),
        after.to_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_is_empty() {
        assert_eq!(diff_text("same", "same"), "");
        assert_eq!(diff_text("", ""), "");
        assert_eq!(diff_value(&true, &true), "");
    }

    #[test]
    fn replacement() {
        assert_eq!(diff_text("A", "B"), "[-A-]{+B+}");
    }

    #[test]
    fn inline_changes() {
        assert_eq!(diff_text("hello world", "hello brave world"), "hello {+brave +}world");
        assert_eq!(diff_text("the old text", "the text"), "the [-old -]text");
        assert_eq!(diff_text("", "new"), "{+new+}");
        assert_eq!(diff_text("gone", ""), "[-gone-]");
    }

    #[test]
    fn disjoint_texts_of_maximal_length() {
        let before = "a".repeat(lore_api::MAX_TEXT_LEN);
        let after = "b".repeat(lore_api::MAX_TEXT_LEN);
        let start = std::time::Instant::now();
        let res = diff_text(&before, &after);
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "diffing took {:?}",
            start.elapsed()
        );
        let runs = |start: &str, end: &str| {
            res.split(start)
                .skip(1)
                .map(|s| s.split(end).next().unwrap_or(""))
                .collect::<String>()
        };
        assert_eq!(runs(DELETE_START, DELETE_END), before);
        assert_eq!(runs(INSERT_START, INSERT_END), after);
    }

    #[test]
    fn whole_values() {
        assert_eq!(diff_value(&false, &true), "[-false-]{+true+}");
        assert_eq!(diff_value(&3u32, &7u32), "[-3-]{+7+}");
    }
}
