//! Definition modules written in JavaScript.
//!
//! Modules are parsed with swc and never executed. The exported object is
//! rebuilt from the literal shapes a definition module uses:
//!
//! ```js
//! module.exports = { customProperties: { '--gap': '4px' } };
//! exports.customProperties = { '--gap': '4px' };
//! export const customProperties = { '--gap': '4px' };
//! export default { 'custom-properties': { '--gap': '4px' } };
//! ```
//!
//! Members whose value is not a literal are skipped.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use swc_common::{FileName, GLOBALS, Globals, SourceMap};
use swc_ecma_ast::{
    AssignExpr, AssignOp, AssignTarget, Decl, Expr, Lit, MemberExpr, MemberProp, Module,
    ModuleDecl, ModuleItem, Pat, Prop, PropName, PropOrSpread, SimpleAssignTarget, Stmt, UnaryOp,
};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax};

/// Read a module file and return its exported object.
pub async fn read_module_file(path: &Path) -> Result<Value> {
    let code = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read module: {:?}", path))?;

    module_exports(code, path)
}

/// Parse module source and return its exported object.
pub fn module_exports(code: String, path: &Path) -> Result<Value> {
    let module = parse_module(code, path)?;

    let mut exports = Map::new();
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                let Decl::Var(var_decl) = &export.decl else {
                    continue;
                };
                for declarator in &var_decl.decls {
                    if let Pat::Ident(binding) = &declarator.name
                        && let Some(init) = &declarator.init
                        && let Some(value) = expr_to_json(init)
                    {
                        exports.insert(binding.id.sym.to_string(), value);
                    }
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                if let Some(Value::Object(object)) = expr_to_json(&export.expr) {
                    exports.extend(object);
                }
            }
            ModuleItem::Stmt(Stmt::Expr(statement)) => {
                if let Expr::Assign(assign) = &*statement.expr {
                    apply_assignment(assign, &mut exports);
                }
            }
            _ => {}
        }
    }

    Ok(Value::Object(exports))
}

fn parse_module(code: String, path: &Path) -> Result<Module> {
    let source_map = Arc::new(SourceMap::default());

    GLOBALS.set(&Globals::new(), || {
        let source_file =
            source_map.new_source_file(FileName::Real(path.to_path_buf()).into(), code);

        let syntax = Syntax::Es(EsSyntax::default());
        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);

        parser
            .parse_module()
            .map_err(|e| anyhow!("Failed to parse module {:?}: {:?}", path, e.kind()))
    })
}

/// `module.exports = {...}`, `module.exports.name = ...` and
/// `exports.name = ...`.
fn apply_assignment(assign: &AssignExpr, exports: &mut Map<String, Value>) {
    if assign.op != AssignOp::Assign {
        return;
    }
    let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left else {
        return;
    };
    let Some(value) = expr_to_json(&assign.right) else {
        return;
    };

    if is_module_exports(member) {
        if let Value::Object(object) = value {
            *exports = object;
        }
        return;
    }

    let exports_object = match &*member.obj {
        Expr::Ident(ident) => &*ident.sym == "exports",
        Expr::Member(inner) => is_module_exports(inner),
        _ => false,
    };
    if exports_object && let Some(name) = member_name(&member.prop) {
        exports.insert(name, value);
    }
}

fn is_module_exports(member: &MemberExpr) -> bool {
    matches!(&*member.obj, Expr::Ident(ident) if &*ident.sym == "module")
        && member_name(&member.prop).as_deref() == Some("exports")
}

fn member_name(prop: &MemberProp) -> Option<String> {
    match prop {
        MemberProp::Ident(ident) => Some(ident.sym.to_string()),
        MemberProp::Computed(computed) => match &*computed.expr {
            Expr::Lit(Lit::Str(s)) => s.value.as_str().map(str::to_string),
            _ => None,
        },
        _ => None,
    }
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => s.value.as_str().map(str::to_string),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}

/// Convert a literal expression to JSON. Returns None for anything that
/// would need evaluation.
fn expr_to_json(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(Lit::Str(s)) => s.value.as_str().map(|v| Value::String(v.to_string())),
        Expr::Lit(Lit::Num(n)) => Some(Value::String(n.value.to_string())),
        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Value::Null),
        Expr::Paren(paren) => expr_to_json(&paren.expr),
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match &*unary.arg {
            Expr::Lit(Lit::Num(n)) => Some(Value::String((-n.value).to_string())),
            _ => None,
        },
        Expr::Object(object) => {
            let mut map = Map::new();
            for prop in &object.props {
                if let PropOrSpread::Prop(prop) = prop
                    && let Prop::KeyValue(kv) = &**prop
                    && let Some(key) = prop_name(&kv.key)
                    && let Some(value) = expr_to_json(&kv.value)
                {
                    map.insert(key, value);
                }
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}
