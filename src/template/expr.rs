//! Expression parsing and evaluation for template regions.
//!
//! The original engine spliced template data into a dynamic scope; here the
//! same semantics are realized with an explicit interpreter: expressions are
//! parsed into a small AST and evaluated against a scope stack whose outer
//! frame is the data object, so every data key is a directly-addressable
//! binding and loop variables shadow it.

use super::TemplateError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Var(String),
    /// `object.field`
    Member(Box<Expr>, String),
    /// `object[index]`
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Evaluation scope: loop bindings layered over the data object
pub struct Scope<'a> {
    data: &'a Value,
    locals: Vec<(String, Value)>,
}

impl<'a> Scope<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self {
            data,
            locals: Vec::new(),
        }
    }

    pub fn push(&mut self, name: String, value: Value) {
        self.locals.push((name, value));
    }

    pub fn pop(&mut self) {
        self.locals.pop();
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        for (binding, value) in self.locals.iter().rev() {
            if binding == name {
                return Some(value.clone());
            }
        }
        self.data.get(name).cloned()
    }
}

/// Parse an expression source string into an AST
pub fn parse(src: &str) -> Result<Expr, TemplateError> {
    let bad = |message: String| TemplateError::BadExpression {
        expr: src.trim().to_string(),
        message,
    };
    let tokens = tokenize(src).map_err(&bad)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.comparison().map_err(&bad)?;
    if parser.pos != parser.tokens.len() {
        return Err(bad("trailing input after expression".to_string()));
    }
    Ok(expr)
}

/// Evaluate an expression against the scope
pub fn eval(expr: &Expr, scope: &Scope<'_>) -> Result<Value, TemplateError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => number_value(*n),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Var(name) => scope
            .lookup(name)
            .ok_or_else(|| TemplateError::UnknownName(name.clone())),
        Expr::Member(object, field) => {
            let value = eval(object, scope)?;
            value
                .get(field)
                .cloned()
                .ok_or_else(|| TemplateError::UnknownName(field.clone()))
        }
        Expr::Index(object, index) => {
            let value = eval(object, scope)?;
            let index = eval(index, scope)?;
            match (&value, &index) {
                (Value::Array(items), Value::Number(n)) => array_index(n)
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or_else(|| TemplateError::Type(format!("index {index} out of bounds"))),
                (Value::Object(map), Value::String(key)) => map
                    .get(key)
                    .cloned()
                    .ok_or_else(|| TemplateError::UnknownName(key.clone())),
                _ => Err(TemplateError::Type(format!("cannot index {value}"))),
            }
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Neg => match value.as_f64() {
                    Some(n) => number_value(-n),
                    None => Err(TemplateError::Type(format!("cannot negate {value}"))),
                },
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = eval(lhs, scope)?;
            let right = eval(rhs, scope)?;
            eval_binary(*op, &left, &right)
        }
    }
}

fn eval_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, TemplateError> {
    match op {
        BinOp::Add => {
            // String on either side concatenates; numbers add
            if left.is_string() || right.is_string() {
                return Ok(Value::String(format!(
                    "{}{}",
                    stringify(left),
                    stringify(right)
                )));
            }
            match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => number_value(a + b),
                _ => Err(TemplateError::Type(format!("cannot add {left} and {right}"))),
            }
        }
        BinOp::Sub => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => number_value(a - b),
            _ => Err(TemplateError::Type(format!(
                "cannot subtract {right} from {left}"
            ))),
        },
        BinOp::Eq => Ok(Value::Bool(loose_eq(left, right))),
        BinOp::Ne => Ok(Value::Bool(!loose_eq(left, right))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => a.partial_cmp(b),
                _ => match (left.as_f64(), right.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                },
            };
            let Some(ordering) = ordering else {
                return Err(TemplateError::Type(format!(
                    "cannot compare {left} and {right}"
                )));
            };
            let result = match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        // Compare numbers numerically so 1 == 1.0
        (Some(a), Some(b)) => (a - b).abs() == 0.0,
        _ => left == right,
    }
}

/// Array index from an evaluated number. Literals and arithmetic results
/// are f64-backed, so `as_u64` alone never matches them; any non-negative
/// integral value is a valid index.
fn array_index(n: &serde_json::Number) -> Option<usize> {
    if let Some(i) = n.as_u64() {
        return usize::try_from(i).ok();
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= 0.0 && f < 9e15 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = f as usize;
        Some(index)
    } else {
        None
    }
}

fn number_value(n: f64) -> Result<Value, TemplateError> {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| TemplateError::Type("non-finite number".to_string()))
}

/// Truthiness for `if` conditions: null, false, 0 and "" are false
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Interpolation output: strings verbatim, numbers without a trailing `.0`,
/// null as the empty string
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or(0.0);
                if f.fract() == 0.0 && f.abs() < 9e15 {
                    #[allow(clippy::cast_possible_truncation)]
                    let integral = f as i64;
                    integral.to_string()
                } else {
                    f.to_string()
                }
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Not,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse()
                    .map_err(|_| format!("invalid number literal `{literal}`"))?;
                tokens.push(Token::Number(n));
            }
            c if is_ident_start(c) => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if is_ident_continue(d) {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        None => return Err("unterminated string literal".to_string()),
                        Some('\\') => match chars.next() {
                            Some('n') => literal.push('\n'),
                            Some('t') => literal.push('\t'),
                            Some(escaped) => literal.push(escaped),
                            None => return Err("unterminated string literal".to_string()),
                        },
                        Some(d) if d == quote => break,
                        Some(d) => literal.push(d),
                    }
                }
                tokens.push(Token::Str(literal));
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '=' => {
                chars.next();
                if chars.peek() != Some(&'=') {
                    return Err("assignment is not supported in expressions".to_string());
                }
                chars.next();
                // tolerate strict equality
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::EqEq);
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    if chars.peek() == Some(&'=') {
                        chars.next();
                    }
                    tokens.push(Token::NotEq);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), String> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(format!("expected {what}"))
        }
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let mut expr = self.additive()?;
        while let Some(op) = match self.peek() {
            Some(Token::EqEq) => Some(BinOp::Eq),
            Some(Token::NotEq) => Some(BinOp::Ne),
            Some(Token::Lt) => Some(BinOp::Lt),
            Some(Token::Le) => Some(BinOp::Le),
            Some(Token::Gt) => Some(BinOp::Gt),
            Some(Token::Ge) => Some(BinOp::Ge),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.additive()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr, String> {
        let mut expr = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.advance() {
                        Some(Token::Ident(field)) => {
                            expr = Expr::Member(Box::new(expr), field);
                        }
                        _ => return Err("expected field name after `.`".to_string()),
                    }
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.comparison()?;
                    self.expect(&Token::RBracket, "`]`")?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(ident)) => match ident.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" | "undefined" => Ok(Expr::Null),
                _ => Ok(Expr::Var(ident)),
            },
            Some(Token::LParen) => {
                let expr = self.comparison()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(expr)
            }
            _ => Err("expected an expression".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval_str(src: &str, data: &Value) -> Result<Value, TemplateError> {
        let expr = parse(src)?;
        eval(&expr, &Scope::new(data))
    }

    #[test]
    fn test_addition() {
        let data = json!({"a": 1, "b": 2});
        assert_eq!(eval_str("a+b", &data).unwrap(), json!(3.0));
        assert_eq!(stringify(&eval_str("a+b", &data).unwrap()), "3");
    }

    #[test]
    fn test_string_concat() {
        let data = json!({"name": "world"});
        assert_eq!(
            eval_str("'hello ' + name", &data).unwrap(),
            json!("hello world")
        );
    }

    #[test]
    fn test_member_access() {
        let data = json!({"f": {"url": "/a.txt", "name": "a.txt"}});
        assert_eq!(eval_str("f.url", &data).unwrap(), json!("/a.txt"));
    }

    #[test]
    fn test_index_access() {
        let data = json!({"files": ["x", "y"]});
        assert_eq!(eval_str("files[1]", &data).unwrap(), json!("y"));
        assert_eq!(eval_str("files[0]", &data).unwrap(), json!("x"));
        assert_eq!(eval_str("files[1 - 1]", &data).unwrap(), json!("x"));
        assert!(eval_str("files[5]", &data).is_err());
        assert!(eval_str("files[-1]", &data).is_err());
        assert!(eval_str("files[1.5]", &data).is_err());
    }

    #[test]
    fn test_comparisons() {
        let data = json!({"n": 3});
        assert_eq!(eval_str("n > 2", &data).unwrap(), json!(true));
        assert_eq!(eval_str("n == 3", &data).unwrap(), json!(true));
        assert_eq!(eval_str("n != 3", &data).unwrap(), json!(false));
        assert_eq!(eval_str("'a' < 'b'", &data).unwrap(), json!(true));
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let data = json!({});
        assert!(matches!(
            eval_str("missing", &data),
            Err(TemplateError::UnknownName(_))
        ));
    }

    #[test]
    fn test_locals_shadow_data() {
        let data = json!({"x": "outer"});
        let expr = parse("x").unwrap();
        let mut scope = Scope::new(&data);
        scope.push("x".to_string(), json!("inner"));
        assert_eq!(eval(&expr, &scope).unwrap(), json!("inner"));
        scope.pop();
        assert_eq!(eval(&expr, &scope).unwrap(), json!("outer"));
    }

    #[test]
    fn test_assignment_rejected() {
        assert!(parse("a = 1").is_err());
    }

    #[test]
    fn test_stringify_forms() {
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!(1.5)), "1.5");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!("s")), "s");
        assert_eq!(stringify(&json!(true)), "true");
    }

    #[test]
    fn test_truthiness() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!([])));
        assert!(truthy(&json!("x")));
    }
}
