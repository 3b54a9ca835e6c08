//! Ignore directives.
//!
//! Two comment directives switch resolution off for parts of a stylesheet:
//! - `/* custom-properties: off */` anywhere inside a rule disables every
//!   declaration directly in that rule.
//! - `/* custom-properties: ignore next */` disables the node that follows it.
//!
//! Both may be written as preserved comments (`/*! ... */`). Matching is case
//! insensitive.
//!
//! Directives are evaluated once per pass by [`IgnoreSet::scan`], before the
//! tree is mutated. The collector and the rewriter only consult the set.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

use crate::core::parsers::css::{Node, NodeId, Stylesheet};

static OFF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(!\s*)?custom-properties:\s*off\b").unwrap());

static IGNORE_NEXT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(!\s*)?custom-properties:\s*ignore\s+next\b").unwrap());

/// Whether serialized node text switches resolution off.
pub fn switches_off(text: &str) -> bool {
    OFF_REGEX.is_match(text)
}

/// Whether comment text asks to skip the node that follows.
pub fn ignores_next(text: &str) -> bool {
    IGNORE_NEXT_REGEX.is_match(text)
}

/// Nodes excluded from collection and rewriting for one pass.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    ignored: HashSet<NodeId>,
}

impl IgnoreSet {
    /// Mark every ignored node of a stylesheet.
    ///
    /// A node is ignored when its own text switches resolution off, when the
    /// text of its direct parent does, or when the sibling right before it is
    /// an ignore-next comment.
    pub fn scan(sheet: &Stylesheet) -> Self {
        let mut set = Self::default();
        set.scan_nodes(&sheet.nodes, false);
        set
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ignored.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ignored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty()
    }

    fn scan_nodes(&mut self, nodes: &[Node], parent_off: bool) {
        let mut ignore_next = false;

        for node in nodes {
            let text = node.to_string();
            let off = switches_off(&text);
            if parent_off || off || ignore_next {
                self.ignored.insert(node.id());
            }

            ignore_next = matches!(
                node,
                Node::Comment(comment) if ignores_next(comment.text())
            );

            if let Some(children) = node.children() {
                let block_off = off && !matches!(node, Node::Document(_));
                self.scan_nodes(children, block_off);
            }
        }
    }
}
