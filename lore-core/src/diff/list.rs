use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Something that lives in an ordered collection and can be compared attribute by attribute
pub trait Element {
    /// Named attributes, in a stable order. Two elements are the same element iff all their
    /// attributes are equal.
    fn attributes(&self) -> Vec<(&'static str, String)>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ElementChange {
    /// Index in the new list for additions and modifications, in the old one for removals
    pub position: usize,
    pub kind: ElementChangeKind,

    /// Only set for modifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Diffs two ordered lists, which callers are expected to have sorted already
///
/// Elements are aligned along their longest common subsequence; a removed run immediately
/// followed by an added run is paired up element-wise and reported as per-attribute
/// modifications, the excess on either side as plain additions or removals.
pub fn diff_list<T: Element>(before: &[T], after: &[T]) -> Vec<ElementChange> {
    let old = before.iter().map(|e| e.attributes()).collect::<Vec<_>>();
    let new = after.iter().map(|e| e.attributes()).collect::<Vec<_>>();

    let mut res = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        match op {
            DiffOp::Equal { .. } => (),
            DiffOp::Delete {
                old_index, old_len, ..
            } => removed(&mut res, &old, old_index..old_index + old_len),
            DiffOp::Insert {
                new_index, new_len, ..
            } => added(&mut res, &new, new_index..new_index + new_len),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let paired = old_len.min(new_len);
                for i in 0..paired {
                    modified(&mut res, new_index + i, &old[old_index + i], &new[new_index + i]);
                }
                removed(&mut res, &old, old_index + paired..old_index + old_len);
                added(&mut res, &new, new_index + paired..new_index + new_len);
            }
        }
    }
    res
}

fn summary(attrs: &[(&'static str, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn removed(
    res: &mut Vec<ElementChange>,
    old: &[Vec<(&'static str, String)>],
    range: std::ops::Range<usize>,
) {
    for i in range {
        res.push(ElementChange {
            position: i,
            kind: ElementChangeKind::Removed,
            attribute: None,
            from: Some(summary(&old[i])),
            to: None,
        });
    }
}

fn added(
    res: &mut Vec<ElementChange>,
    new: &[Vec<(&'static str, String)>],
    range: std::ops::Range<usize>,
) {
    for i in range {
        res.push(ElementChange {
            position: i,
            kind: ElementChangeKind::Added,
            attribute: None,
            from: None,
            to: Some(summary(&new[i])),
        });
    }
}

fn modified(
    res: &mut Vec<ElementChange>,
    position: usize,
    old: &[(&'static str, String)],
    new: &[(&'static str, String)],
) {
    for ((name, from), (_, to)) in old.iter().zip(new.iter()) {
        if from != to {
            res.push(ElementChange {
                position,
                kind: ElementChangeKind::Modified,
                attribute: Some(String::from(*name)),
                from: Some(from.clone()),
                to: Some(to.clone()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Item(&'static str, u8);

    impl Element for Item {
        fn attributes(&self) -> Vec<(&'static str, String)> {
            vec![("name", self.0.to_string()), ("weight", self.1.to_string())]
        }
    }

    fn kinds(changes: &[ElementChange]) -> Vec<(usize, ElementChangeKind)> {
        changes.iter().map(|c| (c.position, c.kind)).collect()
    }

    #[test]
    fn identical_lists() {
        let l = [Item("a", 1), Item("b", 2)];
        assert!(diff_list(&l, &l).is_empty());
        assert!(diff_list::<Item>(&[], &[]).is_empty());
    }

    #[test]
    fn append() {
        let changes = diff_list(&[Item("a", 1)], &[Item("a", 1), Item("b", 2)]);
        assert_eq!(
            changes,
            vec![ElementChange {
                position: 1,
                kind: ElementChangeKind::Added,
                attribute: None,
                from: None,
                to: Some(String::from("name=b, weight=2")),
            }]
        );
    }

    #[test]
    fn insertion_in_the_middle_does_not_shift_the_rest() {
        let before = [Item("a", 1), Item("c", 3), Item("d", 4)];
        let after = [Item("a", 1), Item("b", 2), Item("c", 3), Item("d", 4)];
        assert_eq!(
            kinds(&diff_list(&before, &after)),
            vec![(1, ElementChangeKind::Added)]
        );
        assert_eq!(
            kinds(&diff_list(&after, &before)),
            vec![(1, ElementChangeKind::Removed)]
        );
    }

    #[test]
    fn modification_reports_only_changed_attributes() {
        let changes = diff_list(&[Item("a", 1), Item("b", 2)], &[Item("a", 1), Item("b", 5)]);
        assert_eq!(
            changes,
            vec![ElementChange {
                position: 1,
                kind: ElementChangeKind::Modified,
                attribute: Some(String::from("weight")),
                from: Some(String::from("2")),
                to: Some(String::from("5")),
            }]
        );
    }

    #[test]
    fn every_position_is_within_its_list() {
        bolero::check!()
            .with_type::<(Vec<u8>, Vec<u8>)>()
            .cloned()
            .for_each(|(before, after)| {
                let before = before.iter().map(|w| Item("x", *w % 4)).collect::<Vec<_>>();
                let after = after.iter().map(|w| Item("x", *w % 4)).collect::<Vec<_>>();
                let changes = diff_list(&before, &after);
                let added = changes
                    .iter()
                    .filter(|c| c.kind == ElementChangeKind::Added)
                    .count();
                let removed = changes
                    .iter()
                    .filter(|c| c.kind == ElementChangeKind::Removed)
                    .count();
                assert_eq!(before.len() + added, after.len() + removed);
                for c in changes {
                    match c.kind {
                        ElementChangeKind::Removed => assert!(c.position < before.len()),
                        _ => assert!(c.position < after.len()),
                    }
                }
            });
    }
}
