use std::collections::{BTreeMap, HashSet};

use lore_api::{Comment, CommentId};

/// Nests a flat batch of comments from one thread
///
/// Returns the comments whose parent is not part of the batch (normally only the thread root),
/// each with `children` filled recursively and sorted by ascending id, whatever the input order.
/// A comment whose parent lies outside the batch surfaces as an extra root rather than being
/// dropped. Parent cycles, which creation never produces, are cut open deterministically so
/// that every input comment is still returned exactly once.
pub fn build_tree(flat: Vec<Comment>) -> Vec<Comment> {
    let ids = flat.iter().map(|c| c.id).collect::<HashSet<_>>();

    let mut children: BTreeMap<CommentId, Vec<Comment>> = BTreeMap::new();
    let mut roots = Vec::new();
    for c in flat {
        match c.parent_id.filter(|p| *p != c.id && ids.contains(p)) {
            Some(parent) => children.entry(parent).or_default().push(c),
            None => roots.push(c),
        }
    }
    roots.sort_by_key(|c| c.id);

    let mut res = roots
        .into_iter()
        .map(|r| materialize(r, &mut children))
        .collect::<Vec<_>>();

    // Anything left over hangs off a cycle
    while let Some(stranded) = children.values_mut().find_map(|v| v.pop()) {
        children.retain(|_, v| !v.is_empty());
        tracing::warn!(comment = ?stranded.id, parent = ?stranded.parent_id, "comment is part of a parent cycle");
        res.push(materialize(stranded, &mut children));
    }

    res
}

/// A comment whose children are still being nested
struct Pending {
    comment: Comment,
    /// Remaining children, highest id first so that `pop` yields them in ascending order
    kids: Vec<Comment>,
}

impl Pending {
    fn open(comment: Comment, children: &mut BTreeMap<CommentId, Vec<Comment>>) -> Pending {
        let mut kids = children.remove(&comment.id).unwrap_or_default();
        kids.sort_by_key(|k| std::cmp::Reverse(k.id));
        Pending { comment, kids }
    }
}

/// Depth-first assembly with an explicit stack, so reply chains of any length fit
fn materialize(root: Comment, children: &mut BTreeMap<CommentId, Vec<Comment>>) -> Comment {
    let mut stack = vec![Pending::open(root, children)];
    loop {
        // never empty here: the root returns as soon as it is popped
        let top = stack.len() - 1;
        match stack[top].kids.pop() {
            Some(kid) => {
                let next = Pending::open(kid, children);
                stack.push(next);
            }
            None => {
                let done = stack.swap_remove(top).comment;
                match stack.last_mut() {
                    Some(parent) => parent.comment.children.push(done),
                    None => return done,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use lore_api::{EntityType, UserId};

    use super::*;

    fn comment(id: i64, parent: i64, thread: i64) -> Comment {
        Comment {
            id: CommentId(id),
            entity_type: EntityType::Plan,
            entity_id: 1,
            thread_id: CommentId::from_raw(thread),
            parent_id: CommentId::from_raw(parent),
            user_id: UserId(1),
            text: format!("comment {id}"),
            title: if parent == 0 {
                format!("thread {id}")
            } else {
                String::new()
            },
            date: Utc::now(),
            deleted: false,
            points: None,
            user: None,
            children: Vec::new(),
        }
    }

    fn shape(c: &Comment) -> String {
        if c.children.is_empty() {
            format!("{}", c.id)
        } else {
            let kids = c.children.iter().map(shape).collect::<Vec<_>>();
            format!("{}({})", c.id, kids.join(" "))
        }
    }

    fn shapes(roots: &[Comment]) -> Vec<String> {
        roots.iter().map(shape).collect()
    }

    #[test]
    fn empty() {
        assert!(build_tree(Vec::new()).is_empty());
    }

    #[test]
    fn nests_and_sorts_children() {
        let flat = vec![
            comment(7, 2, 1),
            comment(3, 1, 1),
            comment(2, 1, 1),
            comment(1, 0, 0),
            comment(5, 2, 1),
            comment(6, 3, 1),
        ];
        assert_eq!(shapes(&build_tree(flat)), vec!["1(2(5 7) 3(6))"]);
    }

    #[test]
    fn deleted_parents_keep_their_children() {
        let mut root = comment(1, 0, 0);
        let mut mid = comment(2, 1, 1);
        mid.deleted = true;
        root.deleted = true;
        let tree = build_tree(vec![comment(3, 2, 1), mid, root]);
        assert_eq!(shapes(&tree), vec!["1(2(3))"]);
        assert!(tree[0].deleted && tree[0].children[0].deleted);
    }

    #[test]
    fn missing_parent_makes_an_extra_root() {
        // 2 is not part of the batch
        let flat = vec![comment(4, 2, 1), comment(1, 0, 0), comment(3, 1, 1)];
        assert_eq!(shapes(&build_tree(flat)), vec!["1(3)", "4"]);
    }

    #[test]
    fn cycles_do_not_lose_comments() {
        let flat = vec![
            comment(1, 0, 0),
            comment(2, 3, 1),
            comment(3, 2, 1),
            comment(4, 4, 1),
        ];
        let tree = build_tree(flat);
        let mut seen = tree
            .iter()
            .flat_map(|r| r.flatten())
            .map(|c| c.id.0)
            .collect::<Vec<_>>();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    /// Takes a tree apart without recursing, for trees too deep for the default drop
    fn dismantle(root: Comment) -> Vec<Comment> {
        let mut res = Vec::new();
        let mut stack = vec![root];
        while let Some(mut c) = stack.pop() {
            stack.extend(std::mem::take(&mut c.children));
            res.push(c);
        }
        res
    }

    #[test]
    fn long_reply_chain() {
        const DEPTH: i64 = 200_000;
        let mut flat = (2..=DEPTH)
            .rev()
            .map(|id| comment(id, id - 1, 1))
            .collect::<Vec<_>>();
        flat.push(comment(1, 0, 0));

        let mut tree = build_tree(flat);
        assert_eq!(tree.len(), 1);
        let root = tree.remove(0);
        let mut cur = &root;
        let mut depth = 1;
        while let Some(kid) = cur.children.first() {
            assert_eq!(cur.children.len(), 1);
            assert_eq!(kid.parent_id, Some(cur.id));
            cur = kid;
            depth += 1;
        }
        assert_eq!(depth, DEPTH);
        assert_eq!(root.flatten().len() as i64, DEPTH);
        assert_eq!(dismantle(root).len() as i64, DEPTH);
    }

    /// Builds a random well-formed thread out of fuzzer bytes: comment `i + 2` replies to
    /// one of the comments created before it
    fn random_thread(parents: &[u8]) -> Vec<Comment> {
        let mut res = vec![comment(1, 0, 0)];
        for (i, p) in parents.iter().enumerate() {
            let id = i as i64 + 2;
            let parent = 1 + (*p as i64) % (id - 1);
            res.push(comment(id, parent, 1));
        }
        res
    }

    #[test]
    fn children_sorted_and_every_comment_once() {
        bolero::check!()
            .with_type::<(Vec<u8>, u64)>()
            .cloned()
            .for_each(|(parents, seed)| {
                let mut flat = random_thread(&parents);
                let n = flat.len();
                // deterministic shuffle driven by the seed
                for i in (1..n).rev() {
                    let j = (seed.wrapping_mul(i as u64 + 7) % (i as u64 + 1)) as usize;
                    flat.swap(i, j);
                }
                let tree = build_tree(flat);
                assert_eq!(tree.len(), 1);
                let all = tree[0].flatten();
                assert_eq!(all.len(), n);
                assert_eq!(all.iter().map(|c| c.id).collect::<HashSet<_>>().len(), n);
                for c in all {
                    let ids = c.children.iter().map(|k| k.id).collect::<Vec<_>>();
                    let mut sorted = ids.clone();
                    sorted.sort();
                    assert_eq!(ids, sorted);
                    for k in c.children.iter() {
                        assert_eq!(k.parent_id, Some(c.id));
                    }
                }
            });
    }

    #[test]
    fn flatten_then_rebuild_is_isomorphic() {
        bolero::check!()
            .with_type::<Vec<u8>>()
            .cloned()
            .for_each(|parents| {
                let tree = build_tree(random_thread(&parents));
                let edges = |roots: &[Comment]| {
                    roots
                        .iter()
                        .flat_map(|r| r.flatten())
                        .map(|c| (c.id, c.children.iter().map(|k| k.id).collect::<Vec<_>>()))
                        .collect::<HashMap<_, _>>()
                };
                let flat = tree[0]
                    .flatten()
                    .into_iter()
                    .map(|c| Comment {
                        children: Vec::new(),
                        ..c.clone()
                    })
                    .collect::<Vec<_>>();
                let rebuilt = build_tree(flat);
                assert_eq!(edges(&rebuilt), edges(&tree));
                assert_eq!(shapes(&rebuilt), shapes(&tree));
            });
    }
}
