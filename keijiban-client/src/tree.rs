use std::collections::HashMap;

use crate::api::{Post, PostId};

/// A root post along with all the replies attached to it, both in
/// chronological order
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeNode {
    pub post: Post,
    pub children: Vec<Post>,
}

/// Turns the flat post list into the two-level display tree.
///
/// Roots and replies are sorted by creation date (ties broken by id), whatever
/// the input order. A reply whose parent is itself a reply is attached flat to
/// the root at the end of its parent chain. Replies whose chain does not end
/// at an existing root are left out.
pub fn build_tree(posts: &[Post]) -> Vec<TreeNode> {
    let by_id = posts.iter().map(|p| (p.id, p)).collect::<HashMap<_, _>>();

    let mut roots = posts
        .iter()
        .filter(|p| p.is_root())
        .map(|p| TreeNode {
            post: p.clone(),
            children: Vec::new(),
        })
        .collect::<Vec<_>>();
    roots.sort_unstable_by_key(|n| (n.post.created_at, n.post.id));
    let root_index = roots
        .iter()
        .enumerate()
        .map(|(i, n)| (n.post.id, i))
        .collect::<HashMap<_, _>>();

    let mut anchors = HashMap::new();
    let mut dropped = 0usize;
    for reply in posts.iter().filter(|p| !p.is_root()) {
        match anchor_of(reply, &by_id, &mut anchors).and_then(|a| root_index.get(&a)) {
            Some(&i) => roots[i].children.push(reply.clone()),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, "left out replies whose parent no longer exists");
    }

    for n in roots.iter_mut() {
        n.children.sort_unstable_by_key(|c| (c.created_at, c.id));
    }
    roots
}

/// Walks up the parent chain of `reply` until a root post is found.
///
/// `known` memoizes the answer for every reply walked through, so that the
/// whole build stays linear in the number of posts. Replies on the current
/// walk are marked as anchorless until it completes, so running into one of
/// them again means the parent chain loops.
fn anchor_of(
    reply: &Post,
    by_id: &HashMap<PostId, &Post>,
    known: &mut HashMap<PostId, Option<PostId>>,
) -> Option<PostId> {
    let mut path = Vec::new();
    let mut current = reply;
    let res = loop {
        if let Some(anchor) = known.get(&current.id) {
            break *anchor;
        }
        let parent_id = match current.parent_id {
            None => break Some(current.id),
            Some(p) => p,
        };
        known.insert(current.id, None);
        path.push(current.id);
        match by_id.get(&parent_id) {
            None => break None,
            Some(parent) => current = parent,
        }
    };
    for id in path {
        known.insert(id, res);
    }
    res
}
