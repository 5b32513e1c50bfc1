//! Rebuilds the reply hierarchy of a movie's comments from the flat
//! `comments` relation.
//!
//! Every comment is first placed in an arena indexed by id, links are
//! resolved afterwards, so a reply never points at a node that does not
//! exist yet. Replies whose parent cannot be found (deleted, or belonging to
//! another movie) are promoted to the top level instead of being lost, and a
//! parent chain that loops back on itself is cut where it closes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Comment;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    pub id: i32,
    pub author: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub parent_id: Option<i32>,
    pub replies: Vec<CommentNode>,
}

impl From<Comment> for CommentNode {
    fn from(comment: Comment) -> Self {
        CommentNode {
            id: comment.id,
            author: comment.author,
            content: comment.content,
            posted_at: comment.created_at,
            parent_id: comment.parent_id,
            replies: Vec::new(),
        }
    }
}

impl CommentNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Assembles `comments` into top-level nodes with nested replies.
///
/// Siblings keep their relative input order. Runs in linear time and
/// builds the nested nodes bottom-up without recursion.
pub fn assemble(comments: Vec<Comment>) -> Vec<CommentNode> {
    let mut slots: Vec<Comment> = Vec::with_capacity(comments.len());
    let mut index: HashMap<i32, usize> = HashMap::with_capacity(comments.len());

    for comment in comments {
        match index.entry(comment.id) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    comment_id = comment.id,
                    "Duplicate comment id, keeping the first occurrence"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(slots.len());
                slots.push(comment);
            }
        }
    }

    let mut parents: Vec<Option<usize>> = slots
        .iter()
        .map(|comment| {
            let parent_id = comment.parent_id?;
            match index.get(&parent_id) {
                Some(&slot) => Some(slot),
                None => {
                    tracing::warn!(
                        comment_id = comment.id,
                        parent_id,
                        "Parent comment not found, promoting reply to top level"
                    );
                    None
                }
            }
        })
        .collect();

    break_cycles(&mut parents, &slots);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut roots = Vec::new();
    for (slot, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(slot),
            None => roots.push(slot),
        }
    }

    build_nodes(slots, &children, &roots)
}

/// Cuts every parent chain that loops back on itself.
///
/// Chains are walked in input order; when a walk reaches a comment that is
/// already on the current path, the last comment of the path (whose parent
/// link closed the loop) is detached and becomes a root.
fn break_cycles(parents: &mut [Option<usize>], slots: &[Comment]) {
    let mut state = vec![Visit::New; parents.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..parents.len() {
        if state[start] != Visit::New {
            continue;
        }
        let mut cursor = Some(start);
        while let Some(current) = cursor {
            match state[current] {
                Visit::Done => break,
                Visit::OnPath => {
                    if let Some(&closing) = path.last() {
                        tracing::warn!(
                            comment_id = slots[closing].id,
                            parent_id = slots[current].id,
                            "Comment reply chain forms a cycle, promoting comment to top level"
                        );
                        parents[closing] = None;
                    }
                    break;
                }
                Visit::New => {
                    state[current] = Visit::OnPath;
                    path.push(current);
                    cursor = parents[current];
                }
            }
        }
        for slot in path.drain(..) {
            state[slot] = Visit::Done;
        }
    }
}

fn build_nodes(slots: Vec<Comment>, children: &[Vec<usize>], roots: &[usize]) -> Vec<CommentNode> {
    let mut built: Vec<Option<CommentNode>> =
        slots.into_iter().map(|comment| Some(comment.into())).collect();

    // pre-order: a parent always precedes its descendants
    let mut order = Vec::with_capacity(built.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(slot) = stack.pop() {
        order.push(slot);
        stack.extend(children[slot].iter().rev());
    }

    for &slot in order.iter().rev() {
        let replies: Vec<CommentNode> = children[slot]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(node) = built[slot].as_mut() {
            node.replies = replies;
        }
    }

    roots
        .iter()
        .filter_map(|&root| built[root].take())
        .collect()
}
