//! Property collection from host scopes.
//!
//! Custom properties are only recognized directly inside rules selecting
//! `html` or `:root`. Top-level rules are scanned, and so are the top-level
//! rules of nested documents; rules inside at-rules or other rules are not.

use super::{
    parsers::{
        css::{Node, Rule, Stylesheet},
        value::parse_value,
    },
    table::{PropertyTable, is_custom_property},
};
use crate::directives::IgnoreSet;

/// Collect custom property definitions from the host scopes of a stylesheet.
///
/// Later definitions of a name overwrite earlier ones. Unless `preserve` is
/// set, collected declarations are removed, and so is any host scope left
/// empty that is not itself ignored.
pub fn collect(sheet: &mut Stylesheet, ignored: &IgnoreSet, preserve: bool) -> PropertyTable {
    let mut table = PropertyTable::new();
    collect_nodes(&mut sheet.nodes, ignored, preserve, &mut table);
    table
}

fn collect_nodes(
    nodes: &mut Vec<Node>,
    ignored: &IgnoreSet,
    preserve: bool,
    table: &mut PropertyTable,
) {
    let mut index = 0;
    while index < nodes.len() {
        let remove = match &mut nodes[index] {
            Node::Document(document) => {
                collect_nodes(&mut document.sheet.nodes, ignored, preserve, table);
                false
            }
            Node::Rule(rule) if is_host_scope(rule) => {
                extract_properties(rule, ignored, preserve, table);
                !preserve && rule.block.nodes.is_empty() && !ignored.contains(rule.id)
            }
            _ => false,
        };

        if remove {
            nodes.remove(index);
        } else {
            index += 1;
        }
    }
}

fn extract_properties(
    rule: &mut Rule,
    ignored: &IgnoreSet,
    preserve: bool,
    table: &mut PropertyTable,
) {
    rule.block.nodes.retain(|node| {
        let Node::Declaration(declaration) = node else {
            return true;
        };
        if !is_custom_property(&declaration.prop) || ignored.contains(declaration.id) {
            return true;
        }

        let mut value = parse_value(&declaration.value);
        value.strip_comments();
        table.insert(declaration.prop.clone(), value.nodes);

        preserve
    });
}

/// Whether a rule is a non-empty `html` or `:root` rule.
pub fn is_host_scope(rule: &Rule) -> bool {
    !rule.block.nodes.is_empty()
        && rule.selector.split(',').any(|branch| {
            let branch = branch.trim();
            branch.eq_ignore_ascii_case("html") || branch.eq_ignore_ascii_case(":root")
        })
}
