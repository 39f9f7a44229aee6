//! Navigation tree model.
//!
//! Each tab owns one [`ActiveTree`]: a root [`NavNode`] for the first URL
//! committed in the tab, children appended in navigation order, and a cursor
//! (`last_navigated_url`) naming the node the next navigation hangs from.
//! When the tab closes its tree is archived into the [`Forest`]'s bounded list
//! of [`ClosedTree`]s and the cursor is dropped.
//!
//! Everything here is synchronous and performs no I/O; the session
//! coordinator owns loading, mutating and saving the forest.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};


/// Browser-assigned tab identifier.
pub type TabId = i64;

/// Maximum number of closed trees kept in the archive.
pub const MAX_CLOSED_TREES: usize = 25;

/// One committed navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavNode {
    /// Page URL; the dedup key among siblings.
    pub url: String,
    /// Display label (page title, or hostname when none was available).
    pub title: String,
    /// Pages navigated to from this one, in navigation order.
    #[serde(default)]
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// Create a leaf node.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NavNode::node_count).sum::<usize>()
    }

    /// Whether a direct child already carries `url`.
    pub fn has_child(&self, url: &str) -> bool {
        self.children.iter().any(|c| c.url == url)
    }
}

/// Construct a leaf node with no children.
pub fn create_node(url: &str, title: &str) -> NavNode {
    NavNode::new(url, title)
}

/// Depth-first pre-order search: the node itself, then each child subtree
/// left to right. Returns the first match.
pub fn find_node_by_url<'a>(node: &'a NavNode, url: &str) -> Option<&'a NavNode> {
    if node.url == url {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| find_node_by_url(child, url))
}

/// Mutable counterpart of [`find_node_by_url`], same traversal order.
pub fn find_node_by_url_mut<'a>(node: &'a mut NavNode, url: &str) -> Option<&'a mut NavNode> {
    if node.url == url {
        return Some(node);
    }
    for child in node.children.iter_mut() {
        if let Some(found) = find_node_by_url_mut(child, url) {
            return Some(found);
        }
    }
    None
}

/// Result of an [`attach`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachOutcome {
    /// The node was appended under the parent.
    Attached,
    /// The parent already is, or already has a direct child with, this URL.
    Duplicate,
    /// No node in the tree carries the parent URL.
    ParentNotFound,
}

/// The live navigation tree of one open tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTree {
    root: NavNode,
    last_navigated_url: String,
}

impl ActiveTree {
    /// Start a tree at `root`; the cursor points at the root.
    pub fn new(root: NavNode) -> Self {
        let last_navigated_url = root.url.clone();
        Self {
            root,
            last_navigated_url,
        }
    }

    /// The first URL recorded in this tab.
    pub fn root(&self) -> &NavNode {
        &self.root
    }

    /// URL most recently navigated to in this tree.
    pub fn last_navigated_url(&self) -> &str {
        &self.last_navigated_url
    }

    /// Move the cursor to `url`.
    pub fn advance_cursor(&mut self, url: impl Into<String>) {
        self.last_navigated_url = url.into();
    }

    fn into_root(self) -> NavNode {
        self.root
    }
}

/// Append `node` under the node whose URL is `parent_url`.
///
/// Rejected as [`AttachOutcome::Duplicate`] when the node's URL equals the
/// parent's own URL or a direct child of the parent already has it. The same
/// URL may still appear elsewhere in the tree.
pub fn attach(tree: &mut ActiveTree, parent_url: &str, node: NavNode) -> AttachOutcome {
    let Some(parent) = find_node_by_url_mut(&mut tree.root, parent_url) else {
        return AttachOutcome::ParentNotFound;
    };
    if parent.url == node.url || parent.has_child(&node.url) {
        return AttachOutcome::Duplicate;
    }
    parent.children.push(node);
    AttachOutcome::Attached
}

/// An archived tree of a tab that has been closed. Read-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTree {
    /// Root of the tree as it was when the tab closed.
    pub root: NavNode,
    /// When the tab closed.
    pub closed_at: DateTime<Utc>,
}

/// How a navigation changed the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationChange {
    /// First navigation in the tab: a new tree was rooted.
    Created,
    /// An existing tree was extended (or not), per the attach outcome.
    Extended(AttachOutcome),
}

/// The whole session state: live trees keyed by tab plus the closed archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forest {
    #[serde(default)]
    active_trees: BTreeMap<TabId, ActiveTree>,
    #[serde(default)]
    closed_trees: Vec<ClosedTree>,
}

impl Forest {
    /// An empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every active and closed tree.
    pub fn reset(&mut self) {
        self.active_trees.clear();
        self.closed_trees.clear();
    }

    /// Whether there are no active or closed trees.
    pub fn is_empty(&self) -> bool {
        self.active_trees.is_empty() && self.closed_trees.is_empty()
    }

    /// Live trees, ordered by tab id.
    pub fn active_trees(&self) -> &BTreeMap<TabId, ActiveTree> {
        &self.active_trees
    }

    /// Tree of an open tab, if it has navigated.
    pub fn active_tree(&self, tab_id: TabId) -> Option<&ActiveTree> {
        self.active_trees.get(&tab_id)
    }

    /// Archived trees, most recently closed first.
    pub fn closed_trees(&self) -> &[ClosedTree] {
        &self.closed_trees
    }

    /// Apply one committed navigation for `tab_id`.
    ///
    /// Roots a new tree if the tab has none. Otherwise attaches `node` under
    /// the cursor and advances the cursor to the node's URL whether or not the
    /// attach recorded an edge.
    pub fn record_navigation(&mut self, tab_id: TabId, node: NavNode) -> NavigationChange {
        match self.active_trees.entry(tab_id) {
            Entry::Vacant(slot) => {
                slot.insert(ActiveTree::new(node));
                NavigationChange::Created
            }
            Entry::Occupied(mut slot) => {
                let tree = slot.get_mut();
                let url = node.url.clone();
                let parent_url = tree.last_navigated_url.clone();
                let outcome = attach(tree, &parent_url, node);
                tree.advance_cursor(url);
                NavigationChange::Extended(outcome)
            }
        }
    }

    /// Insert at the front of the archive, evicting the oldest entries past
    /// [`MAX_CLOSED_TREES`].
    fn push_closed(&mut self, closed: ClosedTree) {
        self.closed_trees.insert(0, closed);
        self.closed_trees.truncate(MAX_CLOSED_TREES);
    }
}

/// Move the tab's active tree into the closed archive, stamped now.
///
/// Returns `false` (and changes nothing) when the tab has no active tree.
pub fn archive(forest: &mut Forest, tab_id: TabId) -> bool {
    archive_at(forest, tab_id, Utc::now())
}

/// [`archive`] with an explicit close timestamp.
pub fn archive_at(forest: &mut Forest, tab_id: TabId, closed_at: DateTime<Utc>) -> bool {
    let Some(tree) = forest.active_trees.remove(&tab_id) else {
        return false;
    };
    forest.push_closed(ClosedTree {
        root: tree.into_root(),
        closed_at,
    });
    true
}
