//! Category tree assembly.
//!
//! Turns the flat, self-referencing `categories` table into the nested
//! forest the API serves. Children are indexed by parent id up front, so
//! building is O(n) overall, and ids already on the current recursion
//! path contribute no children, which keeps malformed parent cycles from
//! recursing forever.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::db::Category;

/// A category with its nested children. `children` is omitted from the
/// JSON entirely when a category has none.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CategoryNode>>,
}

/// Build the category forest from a flat list.
///
/// Roots are categories with no parent. Sibling order follows the input
/// order. Categories whose parent chain never reaches a root are not
/// part of any tree and are dropped.
pub fn build_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let mut children_of: HashMap<Option<&str>, Vec<&Category>> = HashMap::new();
    for category in categories {
        children_of
            .entry(category.parent_id.as_deref())
            .or_default()
            .push(category);
    }

    let mut path = HashSet::new();
    build_level(&children_of, None, &mut path)
}

fn build_level<'a>(
    children_of: &HashMap<Option<&'a str>, Vec<&'a Category>>,
    parent: Option<&'a str>,
    path: &mut HashSet<&'a str>,
) -> Vec<CategoryNode> {
    let Some(siblings) = children_of.get(&parent) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(siblings.len());
    for category in siblings {
        let id = category.id.as_str();
        // An id already on the path means the parent chain loops back;
        // the revisited node gets no children instead of recursing
        let children = if path.insert(id) {
            let children = build_level(children_of, Some(id), path);
            path.remove(id);
            children
        } else {
            Vec::new()
        };

        nodes.push(CategoryNode {
            category: (*category).clone(),
            children: if children.is_empty() {
                None
            } else {
                Some(children)
            },
        });
    }
    nodes
}
