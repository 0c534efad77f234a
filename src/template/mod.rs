//! Template engine module
//!
//! Renders a template string against a `serde_json::Value` data object.
//! Three region kinds: literal text (copied verbatim), `<%= expr %>`
//! (evaluated and stringified into the output) and `<% code %>` (control
//! flow only, contributing no output of its own).
//!
//! Templates are same-trust-level as the process: never render
//! user-supplied template text. The node tree is rebuilt on every call;
//! there is no cached template identity.

mod expr;
mod parser;

use parser::Node;
use serde_json::Value;
use thiserror::Error;

/// Rendering failure, surfaced to the caller instead of crashing the request
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unterminated template tag")]
    UnclosedTag,
    #[error("closing brace with no open block")]
    UnbalancedClose,
    #[error("unclosed block at end of template")]
    UnclosedBlock,
    #[error("unsupported statement `{0}`")]
    BadStatement(String),
    #[error("syntax error in `{expr}`: {message}")]
    BadExpression { expr: String, message: String },
    #[error("unknown name `{0}`")]
    UnknownName(String),
    #[error("type error: {0}")]
    Type(String),
}

/// Render a template against a data object
///
/// Every key of the data object is directly addressable from expressions;
/// loop variables shadow data keys for the duration of the loop body.
pub fn render(template: &str, data: &Value) -> Result<String, TemplateError> {
    let nodes = parser::parse(template)?;
    let mut scope = expr::Scope::new(data);
    let mut out = String::new();
    render_nodes(&nodes, &mut scope, &mut out)?;
    Ok(out)
}

fn render_nodes(
    nodes: &[Node],
    scope: &mut expr::Scope<'_>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Interp(e) => out.push_str(&expr::stringify(&expr::eval(e, scope)?)),
            Node::For {
                var,
                iterable,
                body,
            } => {
                let value = expr::eval(iterable, scope)?;
                let Value::Array(items) = value else {
                    return Err(TemplateError::Type(format!(
                        "`for` target of `{var}` is not an array"
                    )));
                };
                for item in items {
                    scope.push(var.clone(), item);
                    let result = render_nodes(body, scope, out);
                    scope.pop();
                    result?;
                }
            }
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                if expr::truthy(&expr::eval(cond, scope)?) {
                    render_nodes(then, scope, out)?;
                } else {
                    render_nodes(otherwise, scope, out)?;
                }
            }
        }
    }
    Ok(())
}
