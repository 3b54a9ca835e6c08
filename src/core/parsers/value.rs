//! Declaration value token trees.
//!
//! A value such as `1px var(--gap, calc(2px + 1em)) /* note */` is tokenized
//! with `cssparser` into an owned tree of [`ValueNode`]s. Every node keeps the
//! whitespace that preceded it, and every sequence keeps its trailing
//! whitespace, so serializing a parsed value reproduces the input byte for byte.
//!
//! Tokenizing never fails: anything the tokenizer cannot classify further is
//! kept as a literal [`NodeKind::Word`] holding its raw source span.

use std::fmt;

use cssparser::{ParseError, Parser, ParserInput, SourcePosition, Token};

/// A parsed declaration value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    pub nodes: Vec<ValueNode>,
    /// Whitespace after the last node.
    pub after: String,
}

/// One token of a value, with the whitespace that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueNode {
    pub before: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Literal raw text: identifiers, numbers, strings, urls, delimiters.
    Word(String),
    /// Argument separator.
    Comma,
    /// A block comment, stored with its delimiters.
    Comment(String),
    /// A function call such as `var(...)` or `calc(...)`.
    Function {
        name: String,
        args: Vec<ValueNode>,
        after: String,
        closed: bool,
    },
    /// A bracketed container: `(...)`, `[...]` or `{...}`.
    Block {
        open: char,
        nodes: Vec<ValueNode>,
        after: String,
        closed: bool,
    },
}

impl ValueNode {
    pub fn new(before: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            before: before.into(),
            kind,
        }
    }

    /// The literal text of a word node.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Word(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this node is a `var()` call with at least one argument.
    pub fn is_var_reference(&self) -> bool {
        matches!(
            &self.kind,
            NodeKind::Function { name, args, .. } if name.eq_ignore_ascii_case("var") && !args.is_empty()
        )
    }

    /// Child sequence of a function or block.
    pub fn children(&self) -> Option<&[ValueNode]> {
        match &self.kind {
            NodeKind::Function { args, .. } => Some(args),
            NodeKind::Block { nodes, .. } => Some(nodes),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<ValueNode>> {
        match &mut self.kind {
            NodeKind::Function { args, .. } => Some(args),
            NodeKind::Block { nodes, .. } => Some(nodes),
            _ => None,
        }
    }
}

impl Value {
    /// Serialized text without surrounding whitespace.
    pub fn as_plain_text(&self) -> String {
        self.to_string().trim().to_string()
    }

    /// Remove comment nodes at every depth.
    pub fn strip_comments(&mut self) {
        strip_comments(&mut self.nodes);
    }
}

fn strip_comments(nodes: &mut Vec<ValueNode>) {
    nodes.retain(|node| !matches!(node.kind, NodeKind::Comment(_)));
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            strip_comments(children);
        }
    }
}

/// Tokenize a value string.
pub fn parse_value(text: &str) -> Value {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let (nodes, after) = parse_sequence(&mut parser);
    Value { nodes, after }
}

fn parse_sequence(parser: &mut Parser<'_, '_>) -> (Vec<ValueNode>, String) {
    let mut nodes = Vec::new();
    let mut before = String::new();

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let kind = match token {
            Token::WhiteSpace(space) => {
                before.push_str(space);
                continue;
            }
            Token::Comma => NodeKind::Comma,
            Token::Comment(_) => NodeKind::Comment(parser.slice_from(start).to_string()),
            Token::Function(name) => {
                let (args, after) = parse_nested(parser);
                NodeKind::Function {
                    name: name.to_string(),
                    args,
                    after,
                    closed: parser.slice_from(start).ends_with(')'),
                }
            }
            Token::ParenthesisBlock => parse_block(parser, start, '('),
            Token::SquareBracketBlock => parse_block(parser, start, '['),
            Token::CurlyBracketBlock => parse_block(parser, start, '{'),
            _ => NodeKind::Word(parser.slice_from(start).to_string()),
        };
        nodes.push(ValueNode::new(std::mem::take(&mut before), kind));
    }

    (nodes, before)
}

fn parse_block(parser: &mut Parser<'_, '_>, start: SourcePosition, open: char) -> NodeKind {
    let (nodes, after) = parse_nested(parser);
    NodeKind::Block {
        open,
        nodes,
        after,
        closed: parser.slice_from(start).ends_with(closing(open)),
    }
}

fn parse_nested<'i>(parser: &mut Parser<'i, '_>) -> (Vec<ValueNode>, String) {
    parser
        .parse_nested_block(|nested| Ok::<_, ParseError<'i, ()>>(parse_sequence(nested)))
        .unwrap_or_default()
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

pub(crate) fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[ValueNode]) -> fmt::Result {
    for node in nodes {
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.before)?;
        match &self.kind {
            NodeKind::Word(text) | NodeKind::Comment(text) => f.write_str(text),
            NodeKind::Comma => f.write_str(","),
            NodeKind::Function {
                name,
                args,
                after,
                closed,
            } => {
                write!(f, "{name}(")?;
                write_nodes(f, args)?;
                f.write_str(after)?;
                if *closed {
                    f.write_str(")")?;
                }
                Ok(())
            }
            NodeKind::Block {
                open,
                nodes,
                after,
                closed,
            } => {
                write!(f, "{open}")?;
                write_nodes(f, nodes)?;
                f.write_str(after)?;
                if *closed {
                    write!(f, "{}", closing(*open))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes)?;
        f.write_str(&self.after)
    }
}
