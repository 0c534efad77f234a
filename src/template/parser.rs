//! Template lexing and AST construction.
//!
//! A template is literal text interleaved with `<%= expr %>` interpolation
//! regions and `<% code %>` control regions. Control regions carry a
//! restricted statement grammar — `for (const x of expr) {`, `if (expr) {`,
//! `} else {` and `}` — which is folded into a nested node tree here rather
//! than executed as host code.

use super::expr::{self, Expr};
use super::TemplateError;

#[derive(Debug)]
pub enum Node {
    Text(String),
    Interp(Expr),
    For {
        var: String,
        iterable: Expr,
        body: Vec<Node>,
    },
    If {
        cond: Expr,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

enum Region {
    Text(String),
    Interp(String),
    Code(String),
}

/// Split the template into literal, interpolation and code regions
fn lex(template: &str) -> Result<Vec<Region>, TemplateError> {
    let mut regions = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("<%") {
        if start > 0 {
            regions.push(Region::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let (is_interp, after) = match after.strip_prefix('=') {
            Some(stripped) => (true, stripped),
            None => (false, after),
        };
        let Some(end) = after.find("%>") else {
            return Err(TemplateError::UnclosedTag);
        };
        let inner = after[..end].to_string();
        regions.push(if is_interp {
            Region::Interp(inner)
        } else {
            Region::Code(inner)
        });
        rest = &after[end + 2..];
    }
    if !rest.is_empty() {
        regions.push(Region::Text(rest.to_string()));
    }
    Ok(regions)
}

enum Frame {
    For {
        var: String,
        iterable: Expr,
        body: Vec<Node>,
    },
    If {
        cond: Expr,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        in_else: bool,
    },
}

/// Parse a template into its node tree
pub fn parse(template: &str) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    for region in lex(template)? {
        match region {
            Region::Text(text) => current(&mut root, &mut stack).push(Node::Text(text)),
            Region::Interp(src) => {
                let parsed = expr::parse(&src)?;
                current(&mut root, &mut stack).push(Node::Interp(parsed));
            }
            Region::Code(src) => apply_statement(src.trim(), &mut root, &mut stack)?,
        }
    }
    if !stack.is_empty() {
        return Err(TemplateError::UnclosedBlock);
    }
    Ok(root)
}

/// The node list new nodes currently append to
fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut Vec<Frame>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        None => root,
        Some(Frame::For { body, .. }) => body,
        Some(Frame::If {
            then,
            otherwise,
            in_else,
            ..
        }) => {
            if *in_else {
                otherwise
            } else {
                then
            }
        }
    }
}

fn apply_statement(
    stmt: &str,
    root: &mut Vec<Node>,
    stack: &mut Vec<Frame>,
) -> Result<(), TemplateError> {
    if stmt.is_empty() {
        return Ok(());
    }
    if stmt == "}" {
        let node = match stack.pop() {
            None => return Err(TemplateError::UnbalancedClose),
            Some(Frame::For {
                var,
                iterable,
                body,
            }) => Node::For {
                var,
                iterable,
                body,
            },
            Some(Frame::If {
                cond,
                then,
                otherwise,
                ..
            }) => Node::If {
                cond,
                then,
                otherwise,
            },
        };
        current(root, stack).push(node);
        return Ok(());
    }
    if is_else(stmt) {
        return match stack.last_mut() {
            Some(Frame::If { in_else, .. }) if !*in_else => {
                *in_else = true;
                Ok(())
            }
            _ => Err(TemplateError::BadStatement(stmt.to_string())),
        };
    }
    if let Some(rest) = keyword(stmt, "for") {
        let (var, iterable) = parse_for(rest)
            .ok_or_else(|| TemplateError::BadStatement(stmt.to_string()))
            .and_then(|(var, src)| Ok((var, expr::parse(src)?)))?;
        stack.push(Frame::For {
            var,
            iterable,
            body: Vec::new(),
        });
        return Ok(());
    }
    if let Some(rest) = keyword(stmt, "if") {
        let cond_src = rest
            .trim()
            .strip_suffix('{')
            .map(str::trim)
            .ok_or_else(|| TemplateError::BadStatement(stmt.to_string()))?;
        let cond = expr::parse(cond_src)?;
        stack.push(Frame::If {
            cond,
            then: Vec::new(),
            otherwise: Vec::new(),
            in_else: false,
        });
        return Ok(());
    }
    Err(TemplateError::BadStatement(stmt.to_string()))
}

/// Match a leading keyword not followed by an identifier character
fn keyword<'a>(stmt: &'a str, word: &str) -> Option<&'a str> {
    let rest = stmt.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$' => None,
        _ => Some(rest),
    }
}

/// `(const NAME of EXPR) {` -> (NAME, EXPR source)
fn parse_for(rest: &str) -> Option<(String, &str)> {
    let inner = rest.trim().strip_suffix('{')?.trim();
    let inner = inner.strip_prefix('(')?.strip_suffix(')')?.trim();
    let inner = ["const", "let", "var"]
        .iter()
        .find_map(|kw| keyword(inner, kw))
        .unwrap_or(inner)
        .trim_start();
    let (var, after_var) = inner.split_once(char::is_whitespace)?;
    if var.is_empty() || !var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return None;
    }
    let iterable_src = keyword(after_var.trim_start(), "of")?;
    Some((var.to_string(), iterable_src))
}

fn is_else(stmt: &str) -> bool {
    stmt.strip_prefix('}')
        .map(str::trim)
        .and_then(|rest| rest.strip_prefix("else"))
        .is_some_and(|rest| rest.trim() == "{")
}
