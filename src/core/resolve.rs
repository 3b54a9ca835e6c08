//! `var()` substitution over value token trees.
//!
//! Resolution walks a token sequence depth first, left to right:
//!
//! - A `var(--name, fallback)` whose name is in the table is replaced by a
//!   clone of the stored tokens. The inserted tokens are then resolved with
//!   `--name` hidden, so a property that refers to itself, directly or through
//!   a chain, substitutes once and then falls back or stays unresolved.
//! - A reference to an unknown name with a non-empty fallback is replaced by
//!   the fallback tokens, and the enclosing sequence is resolved again from
//!   its start with the same table view.
//! - A reference to an unknown name without fallback is left as written.
//! - Any other function or block is resolved recursively.
//!
//! Hidden names are tracked in an exclusion set layered over the shared table
//! instead of copying the table for every substitution.

use std::collections::HashSet;

use super::{
    parsers::value::{NodeKind, ValueNode},
    table::PropertyTable,
};

/// Resolve every variable reference in `nodes` against `table`, in place.
pub fn resolve(nodes: &mut Vec<ValueNode>, table: &PropertyTable) {
    Resolver::new(table).resolve_nodes(nodes);
}

/// Resolve a value string, returning the serialized result.
pub fn resolve_text(text: &str, table: &PropertyTable) -> String {
    let mut value = super::parsers::value::parse_value(text);
    resolve(&mut value.nodes, table);
    value.to_string()
}

struct Resolver<'a> {
    table: &'a PropertyTable,
    hidden: HashSet<String>,
}

impl<'a> Resolver<'a> {
    fn new(table: &'a PropertyTable) -> Self {
        Self {
            table,
            hidden: HashSet::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a [ValueNode]> {
        if self.hidden.contains(name) {
            return None;
        }
        self.table.get(name)
    }

    fn resolve_nodes(&mut self, nodes: &mut Vec<ValueNode>) {
        let mut index = 0;

        while index < nodes.len() {
            if !nodes[index].is_var_reference() {
                if let Some(children) = nodes[index].children_mut() {
                    self.resolve_nodes(children);
                }
                index += 1;
                continue;
            }

            let (name, fallback) = reference_parts(&nodes[index]);
            let name = name.map(str::to_string);
            let before = nodes[index].before.clone();

            if let Some(stored) = name.as_deref().and_then(|name| self.lookup(name)) {
                let mut replacement = with_leading_space(stored.to_vec(), before);
                let name = name.unwrap_or_default();

                self.hidden.insert(name.clone());
                self.resolve_nodes(&mut replacement);
                self.hidden.remove(&name);

                let inserted = replacement.len();
                nodes.splice(index..=index, replacement);
                index += inserted;
            } else if !fallback.is_empty() {
                let replacement = with_leading_space(fallback.to_vec(), before);
                nodes.splice(index..=index, replacement);
                index = 0;
            } else {
                index += 1;
            }
        }
    }
}

/// Property name and fallback tokens of a `var()` call.
///
/// The fallback is everything after the first comma.
fn reference_parts(node: &ValueNode) -> (Option<&str>, &[ValueNode]) {
    let NodeKind::Function { args, .. } = &node.kind else {
        return (None, &[]);
    };
    let name = args.first().and_then(ValueNode::text);
    let fallback = args
        .iter()
        .position(|arg| arg.kind == NodeKind::Comma)
        .map_or(&[][..], |comma| &args[comma + 1..]);
    (name, fallback)
}

fn with_leading_space(mut nodes: Vec<ValueNode>, before: String) -> Vec<ValueNode> {
    if let Some(first) = nodes.first_mut() {
        first.before = before;
    }
    nodes
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::parsers::value::parse_value;

    fn table(entries: &[(&str, &str)]) -> PropertyTable {
        PropertyTable::from_plain(entries.iter().copied())
    }

    #[test]
    fn test_simple_substitution() {
        let table = table(&[("--gap", "4px")]);
        assert_eq!(resolve_text("var(--gap)", &table), "4px");
        assert_eq!(resolve_text("0 var(--gap) 0", &table), "0 4px 0");
    }

    #[test]
    fn test_chained_resolution() {
        let table = table(&[("--a", "1px"), ("--b", "var(--a)")]);
        assert_eq!(resolve_text("var(--b)", &table), "1px");
    }

    #[test]
    fn test_self_reference_uses_fallback() {
        let table = table(&[("--a", "var(--a, 5px)")]);
        assert_eq!(resolve_text("var(--a)", &table), "5px");
    }

    #[test]
    fn test_self_reference_without_fallback_stops() {
        let table = table(&[("--a", "var(--a)")]);
        assert_eq!(resolve_text("var(--a)", &table), "var(--a)");
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let table = table(&[("--a", "var(--b)"), ("--b", "var(--a)")]);
        assert_eq!(resolve_text("var(--a)", &table), "var(--a)");
        assert_eq!(resolve_text("var(--b)", &table), "var(--b)");
    }

    #[test]
    fn test_unresolvable_without_fallback_is_unchanged() {
        let empty = PropertyTable::new();
        assert_eq!(resolve_text("var(--missing)", &empty), "var(--missing)");
    }

    #[test]
    fn test_fallback_is_resolved_with_full_table() {
        let table = table(&[("--known", "blue")]);
        assert_eq!(
            resolve_text("var(--missing, var(--known))", &table),
            "blue"
        );
        assert_eq!(
            resolve_text("1px solid var(--missing, 2px var(--known))", &table),
            "1px solid 2px blue"
        );
    }

    #[test]
    fn test_empty_fallback_leaves_reference() {
        let empty = PropertyTable::new();
        assert_eq!(resolve_text("var(--missing,)", &empty), "var(--missing,)");
    }

    #[test]
    fn test_leading_whitespace_moves_to_first_token() {
        let table = table(&[("--pair", "1px 2px")]);
        assert_eq!(resolve_text("margin   var(--pair)", &table), "margin   1px 2px");
        assert_eq!(
            resolve_text("a var(--missing,   b c)", &PropertyTable::new()),
            "a b c"
        );
    }

    #[test]
    fn test_references_inside_functions() {
        let table = table(&[("--gap", "4px"), ("--rgb", "0, 0, 0")]);
        assert_eq!(
            resolve_text("calc(100% - var(--gap) * 2)", &table),
            "calc(100% - 4px * 2)"
        );
        assert_eq!(resolve_text("rgba(var(--rgb), .5)", &table), "rgba(0, 0, 0, .5)");
    }

    #[test]
    fn test_name_is_case_sensitive_but_function_is_not() {
        let table = table(&[("--Gap", "4px")]);
        assert_eq!(resolve_text("VAR(--Gap)", &table), "4px");
        assert_eq!(resolve_text("var(--gap)", &table), "var(--gap)");
    }

    #[test]
    fn test_substitution_never_shares_table_tokens() {
        let table = table(&[("--a", "1px")]);
        let mut value = parse_value("var(--a) var(--a)");
        resolve(&mut value.nodes, &table);

        value.nodes[0].kind = NodeKind::Word("changed".to_string());
        assert_eq!(value.to_string(), "changed 1px");
        assert_eq!(table.text("--a").as_deref(), Some("1px"));
    }

    #[test]
    fn test_deep_chain_resolves() {
        let mut entries = vec![("--v0".to_string(), "0px".to_string())];
        for level in 1..200 {
            entries.push((format!("--v{level}"), format!("var(--v{})", level - 1)));
        }
        let table = PropertyTable::from_plain(entries);
        assert_eq!(resolve_text("var(--v199)", &table), "0px");
    }
}
