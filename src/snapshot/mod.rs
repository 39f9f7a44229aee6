//! Read-only views of the forest for display.
//!
//! A [`SessionSnapshot`] is what a renderer consumes: active trees ordered by
//! tab, closed trees most recent first, and the URL of the page currently in
//! front of the user so matching nodes can be highlighted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::{ClosedTree, Forest, NavNode, TabId};

/// An active tree as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTreeView {
    /// Tab the tree belongs to.
    pub tab_id: TabId,
    /// First page of the tab.
    pub root: NavNode,
}

/// Point-in-time copy of the session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// URL of the currently focused page, if known.
    pub active_url: Option<String>,
    /// Open tabs, ordered by tab id.
    pub active_trees: Vec<ActiveTreeView>,
    /// Closed tabs, newest first.
    pub closed_trees: Vec<ClosedTree>,
}

impl SessionSnapshot {
    /// Copy the displayable parts of `forest`. Cursors are not exposed.
    pub fn from_forest(forest: &Forest, active_url: Option<&str>) -> Self {
        Self {
            active_url: active_url.map(str::to_string),
            active_trees: forest
                .active_trees()
                .iter()
                .map(|(tab_id, tree)| ActiveTreeView {
                    tab_id: *tab_id,
                    root: tree.root().clone(),
                })
                .collect(),
            closed_trees: forest.closed_trees().to_vec(),
        }
    }

    /// Whether `url` is the page currently in front of the user.
    pub fn is_active(&self, url: &str) -> bool {
        self.active_url.as_deref() == Some(url)
    }

    /// Total number of nodes across all trees.
    pub fn node_count(&self) -> usize {
        self.active_trees
            .iter()
            .map(|t| t.root.node_count())
            .chain(self.closed_trees.iter().map(|t| t.root.node_count()))
            .sum()
    }

    /// Indented plain-text outline; nodes matching the active URL end in `*`.
    pub fn render_outline(&self) -> String {
        Outline(self).to_string()
    }
}

struct Outline<'a>(&'a SessionSnapshot);

impl fmt::Display for Outline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;

        writeln!(f, "Active trees")?;
        if snapshot.active_trees.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for tree in &snapshot.active_trees {
            writeln!(f, "  [tab {}]", tree.tab_id)?;
            write_node(f, snapshot, &tree.root, 2)?;
        }

        writeln!(f, "Closed trees")?;
        if snapshot.closed_trees.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for tree in &snapshot.closed_trees {
            writeln!(f, "  [closed {}]", tree.closed_at.to_rfc3339())?;
            write_node(f, snapshot, &tree.root, 2)?;
        }
        Ok(())
    }
}

fn write_node(
    f: &mut fmt::Formatter<'_>,
    snapshot: &SessionSnapshot,
    node: &NavNode,
    depth: usize,
) -> fmt::Result {
    let marker = if snapshot.is_active(&node.url) { " *" } else { "" };
    writeln!(
        f,
        "{:indent$}- {} <{}>{}",
        "",
        node.title,
        node.url,
        marker,
        indent = depth * 2
    )?;
    for child in &node.children {
        write_node(f, snapshot, child, depth + 1)?;
    }
    Ok(())
}
