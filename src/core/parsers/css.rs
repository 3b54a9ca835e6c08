//! Stylesheet document trees.
//!
//! The parser walks `cssparser` tokens including whitespace and comments and
//! slices raw source text for every node, so `parse(text).to_string()`
//! reproduces `text` exactly. Only the structure the resolver needs is
//! modelled: rules, at-rules, declarations, comments and nested documents.
//!
//! Every node gets a [`NodeId`] when it is created. Ids identify nodes in
//! side tables (see [`crate::directives::IgnoreSet`]); cloning a node keeps
//! its id.

use std::{
    fmt,
    sync::{
        LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

use cssparser::{ParseError, Parser, ParserInput, SourcePosition, Token};
use regex::Regex;

static IMPORTANT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*!\s*important$").unwrap());

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A parsed stylesheet (or nested document).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
    /// Whitespace and stray semicolons after the last node.
    pub after: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Declaration(Declaration),
    Comment(Comment),
    /// A stylesheet embedded as a child of another one.
    Document(Document),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: NodeId,
    pub sheet: Stylesheet,
}

/// The `{ ... }` body of a rule or at-rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub nodes: Vec<Node>,
    pub after: String,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: NodeId,
    pub before: String,
    pub selector: String,
    /// Whitespace between the selector and `{`.
    pub between: String,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    pub id: NodeId,
    pub before: String,
    /// Name without the leading `@`.
    pub name: String,
    /// Raw prelude, including the whitespace after the name.
    pub params: String,
    pub between: String,
    pub block: Option<Block>,
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: NodeId,
    pub before: String,
    pub prop: String,
    /// The colon and the whitespace around it.
    pub between: String,
    pub value: String,
    /// Raw `!important` suffix, empty when absent.
    pub important: String,
    /// Whitespace after the value.
    pub after: String,
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: NodeId,
    pub before: String,
    /// Comment text including `/*` and `*/`.
    pub raw: String,
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Rule(rule) => rule.id,
            Node::AtRule(at_rule) => at_rule.id,
            Node::Declaration(declaration) => declaration.id,
            Node::Comment(comment) => comment.id,
            Node::Document(document) => document.id,
        }
    }

    /// Child nodes of rules, at-rules with a body, and nested documents.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Rule(rule) => Some(&rule.block.nodes),
            Node::AtRule(at_rule) => at_rule.block.as_ref().map(|block| block.nodes.as_slice()),
            Node::Document(document) => Some(&document.sheet.nodes),
            Node::Declaration(_) | Node::Comment(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Rule(rule) => Some(&mut rule.block.nodes),
            Node::AtRule(at_rule) => at_rule.block.as_mut().map(|block| &mut block.nodes),
            Node::Document(document) => Some(&mut document.sheet.nodes),
            Node::Declaration(_) | Node::Comment(_) => None,
        }
    }
}

impl Document {
    pub fn new(sheet: Stylesheet) -> Self {
        Self {
            id: NodeId::fresh(),
            sheet,
        }
    }
}

impl Comment {
    /// Text between the delimiters.
    pub fn text(&self) -> &str {
        let inner = self.raw.strip_prefix("/*").unwrap_or(&self.raw);
        inner.strip_suffix("*/").unwrap_or(inner)
    }
}

impl Declaration {
    /// A copy of this declaration with a new identity and value, terminated
    /// by a semicolon so it can be placed before another declaration.
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            value: value.into(),
            after: String::new(),
            semicolon: true,
            ..self.clone()
        }
    }

    fn from_raw(before: String, raw: &str, semicolon: bool) -> Self {
        let (body, after) = split_trailing_whitespace(raw);
        let (prop, between, rest) = match body.find(':') {
            Some(colon) => {
                let prop = body[..colon].trim_end();
                let rest = body[colon + 1..].trim_start();
                let between = &body[prop.len()..body.len() - rest.len()];
                (prop, between, rest)
            }
            None => (body, "", ""),
        };
        let (value, important) = match IMPORTANT_REGEX.find(rest) {
            Some(found) => (&rest[..found.start()], found.as_str()),
            None => (rest, ""),
        };

        Self {
            id: NodeId::fresh(),
            before,
            prop: prop.to_string(),
            between: between.to_string(),
            value: value.to_string(),
            important: important.to_string(),
            after: after.to_string(),
            semicolon,
        }
    }
}

fn split_trailing_whitespace(raw: &str) -> (&str, &str) {
    let body = raw.trim_end();
    (body, &raw[body.len()..])
}

/// Parse stylesheet text into a document tree.
pub fn parse(css: &str) -> Stylesheet {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let (nodes, after) = parse_items(&mut parser);
    Stylesheet { nodes, after }
}

fn parse_items(parser: &mut Parser<'_, '_>) -> (Vec<Node>, String) {
    let mut nodes = Vec::new();
    let mut before = String::new();

    loop {
        let state = parser.state();
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return (nodes, before),
        };

        match token {
            Token::WhiteSpace(_) | Token::Semicolon => before.push_str(parser.slice_from(start)),
            Token::Comment(_) => nodes.push(Node::Comment(Comment {
                id: NodeId::fresh(),
                before: std::mem::take(&mut before),
                raw: parser.slice_from(start).to_string(),
            })),
            Token::AtKeyword(_) => {
                let name = parser.slice_from(start).trim_start_matches('@').to_string();
                let at_rule = parse_at_rule(parser, std::mem::take(&mut before), name);
                nodes.push(Node::AtRule(at_rule));
            }
            _ => {
                parser.reset(&state);
                let node = if starts_rule(parser) {
                    Node::Rule(parse_rule(parser, std::mem::take(&mut before)))
                } else {
                    Node::Declaration(parse_declaration(parser, std::mem::take(&mut before)))
                };
                nodes.push(node);
            }
        }
    }
}

/// Whether the item at the current position is a nested rule rather than a
/// declaration. Leaves the parser where it started.
fn starts_rule(parser: &mut Parser<'_, '_>) -> bool {
    let state = parser.state();
    let custom_property = matches!(
        parser.next_including_whitespace_and_comments(),
        Ok(Token::Ident(name)) if name.starts_with("--")
    );

    let mut block_first = false;
    loop {
        match parser.next_including_whitespace_and_comments() {
            Ok(Token::CurlyBracketBlock) => {
                block_first = true;
                break;
            }
            Ok(Token::Semicolon) | Err(_) => break,
            Ok(_) => {}
        }
    }
    parser.reset(&state);

    block_first && !custom_property
}

fn parse_at_rule(parser: &mut Parser<'_, '_>, before: String, name: String) -> AtRule {
    let params_start = parser.position();
    let mut params_end;
    let mut block = None;
    let mut semicolon = false;

    loop {
        params_end = parser.position();
        let token = parser
            .next_including_whitespace_and_comments()
            .map(|token| token.clone());
        match token {
            Ok(Token::Semicolon) => {
                semicolon = true;
                break;
            }
            Ok(Token::CurlyBracketBlock) => {
                block = Some(parse_block(parser, params_end));
                break;
            }
            Ok(token) if opens_block(&token) => skip_nested_block(parser),
            Ok(_) => {}
            Err(_) => break,
        }
    }

    let (params, between) = split_trailing_whitespace(parser.slice(params_start..params_end));
    AtRule {
        id: NodeId::fresh(),
        before,
        name,
        params: params.to_string(),
        between: between.to_string(),
        block,
        semicolon,
    }
}

fn parse_rule(parser: &mut Parser<'_, '_>, before: String) -> Rule {
    let selector_start = parser.position();
    let mut selector_end;
    let mut block = Block::default();

    loop {
        selector_end = parser.position();
        let token = parser
            .next_including_whitespace_and_comments()
            .map(|token| token.clone());
        match token {
            Ok(Token::CurlyBracketBlock) => {
                block = parse_block(parser, selector_end);
                break;
            }
            Ok(token) if opens_block(&token) => skip_nested_block(parser),
            Ok(_) => {}
            Err(_) => break,
        }
    }

    let (selector, between) = split_trailing_whitespace(parser.slice(selector_start..selector_end));
    Rule {
        id: NodeId::fresh(),
        before,
        selector: selector.to_string(),
        between: between.to_string(),
        block,
    }
}

fn parse_declaration(parser: &mut Parser<'_, '_>, before: String) -> Declaration {
    let start = parser.position();
    let mut end;
    let mut semicolon = false;

    loop {
        end = parser.position();
        let token = parser
            .next_including_whitespace_and_comments()
            .map(|token| token.clone());
        match token {
            Ok(Token::Semicolon) => {
                semicolon = true;
                break;
            }
            Ok(token) if opens_block(&token) => skip_nested_block(parser),
            Ok(_) => {}
            Err(_) => break,
        }
    }

    Declaration::from_raw(before, parser.slice(start..end), semicolon)
}

fn opens_block(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
    )
}

/// Consume the block just opened, including its closing token, so that the
/// parser position moves past it.
fn skip_nested_block<'i>(parser: &mut Parser<'i, '_>) {
    let _ = parser.parse_nested_block(|nested| {
        while nested.next_including_whitespace_and_comments().is_ok() {}
        Ok::<_, ParseError<'i, ()>>(())
    });
}

fn parse_block<'i>(parser: &mut Parser<'i, '_>, open: SourcePosition) -> Block {
    let (nodes, after) = parser
        .parse_nested_block(|nested| Ok::<_, ParseError<'i, ()>>(parse_items(nested)))
        .unwrap_or_default();
    Block {
        nodes,
        after,
        closed: parser.slice_from(open).ends_with('}'),
    }
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for node in nodes {
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes)?;
        f.write_str(&self.after)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        write_nodes(f, &self.nodes)?;
        f.write_str(&self.after)?;
        if self.closed {
            f.write_str("}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Rule(rule) => write!(f, "{rule}"),
            Node::AtRule(at_rule) => write!(f, "{at_rule}"),
            Node::Declaration(declaration) => write!(f, "{declaration}"),
            Node::Comment(comment) => write!(f, "{}{}", comment.before, comment.raw),
            Node::Document(document) => write!(f, "{}", document.sheet),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.before, self.selector, self.between, self.block)
    }
}

impl fmt::Display for AtRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}{}{}", self.before, self.name, self.params, self.between)?;
        if let Some(block) = &self.block {
            write!(f, "{block}")?;
        }
        if self.semicolon {
            f.write_str(";")?;
        }
        Ok(())
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}{}",
            self.before, self.prop, self.between, self.value, self.important, self.after
        )?;
        if self.semicolon {
            f.write_str(";")?;
        }
        Ok(())
    }
}
