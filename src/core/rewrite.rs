//! Declaration rewriting.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    parsers::{
        css::{Node, Stylesheet},
        value::parse_value,
    },
    resolve::resolve,
    table::{PropertyTable, is_custom_property},
};
use crate::directives::IgnoreSet;

static VAR_REFERENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(^|[^\w-])var\(.+\)").unwrap());

static TRAILING_COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.+)(\s*/\*.+?\*/)$").unwrap());

/// Resolve variable references in every eligible declaration of a stylesheet.
///
/// With `preserve`, each changed declaration gets a resolved copy inserted
/// right before it and is otherwise left untouched. Without it, the value is
/// overwritten in place. Returns the number of declarations that changed.
pub fn rewrite(
    sheet: &mut Stylesheet,
    table: &PropertyTable,
    ignored: &IgnoreSet,
    preserve: bool,
) -> usize {
    rewrite_nodes(&mut sheet.nodes, table, ignored, preserve)
}

fn rewrite_nodes(
    nodes: &mut Vec<Node>,
    table: &PropertyTable,
    ignored: &IgnoreSet,
    preserve: bool,
) -> usize {
    let mut rewritten = 0;
    let mut index = 0;

    while index < nodes.len() {
        let inserted = match &mut nodes[index] {
            Node::Declaration(declaration) if !ignored.contains(declaration.id) => {
                match resolved_value(&declaration.prop, &declaration.value, table) {
                    Some(value) if preserve => Some(Node::Declaration(declaration.with_value(value))),
                    Some(value) => {
                        declaration.value = value;
                        rewritten += 1;
                        None
                    }
                    None => None,
                }
            }
            node => {
                if let Some(children) = node.children_mut() {
                    rewritten += rewrite_nodes(children, table, ignored, preserve);
                }
                None
            }
        };

        if let Some(node) = inserted {
            nodes.insert(index, node);
            rewritten += 1;
            index += 1;
        }
        index += 1;
    }

    rewritten
}

/// The resolved value text of a declaration, or `None` when it is not
/// eligible or resolves to itself.
fn resolved_value(prop: &str, value: &str, table: &PropertyTable) -> Option<String> {
    if is_custom_property(prop) || !VAR_REFERENCE_REGEX.is_match(value) {
        return None;
    }

    let (body, comment) = split_trailing_comment(value);
    let mut tokens = parse_value(body);
    resolve(&mut tokens.nodes, table);

    let resolved = tokens.to_string();
    (resolved != body).then(|| format!("{resolved}{comment}"))
}

fn split_trailing_comment(value: &str) -> (&str, &str) {
    match TRAILING_COMMENT_REGEX.captures(value) {
        Some(captures) => match (captures.get(1), captures.get(2)) {
            (Some(body), Some(comment)) => (body.as_str(), comment.as_str()),
            _ => (value, ""),
        },
        None => (value, ""),
    }
}
