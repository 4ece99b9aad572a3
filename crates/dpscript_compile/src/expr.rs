//! Evaluable expression trees.
//!
//! The IR builder lowers expression *syntax* into these trees; the runtime
//! executor evaluates them against a host-provided [`Environment`]. Four
//! primitive types exist (`int`, `float`, `string`, `bool`); `void` only
//! appears as the type of a call with no result.
//!
//! # Numeric promotion
//!
//! Arithmetic is "widest wins": `int op int` stays `int`, any `float`
//! operand promotes the result to `float`. The DP lexer currently produces
//! every numeric literal as a float, so the integer path is reachable only
//! through host environments (integer variables or function results); both
//! paths are kept and dispatched by type tag.
//!
//! # F-strings
//!
//! An [`Expr::FString`] holds its translated fragments with one
//! [`PLACEHOLDER`] entry per embed; evaluation replaces the *n*-th
//! placeholder with the rendered value of the *n*-th embed.

/// Sentinel fragment marking an embed site inside an f-string.
pub const PLACEHOLDER: &str = "{_0_}";

/// A runtime value of one of the four primitive types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Bool(_) => ValueType::Bool,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Type tag carried by constants and used for operator dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Str,
    Bool,
    Void,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "string",
            ValueType::Bool => "bool",
            ValueType::Void => "void",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

/// An evaluable expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant {
        value: Value,
        ty: ValueType,
    },
    /// A variable reference, sigil stripped, `global.` prefix preserved.
    Variable {
        name: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A host function call embedded in an expression.
    EmbedCall {
        name: String,
        args: Vec<Expr>,
    },
    /// Translated f-string: fragments with one [`PLACEHOLDER`] per embed.
    FString {
        fragments: Vec<String>,
        embeds: Vec<Expr>,
    },
}

impl Expr {
    pub fn constant(value: Value) -> Expr {
        let ty = value.value_type();
        Expr::Constant { value, ty }
    }

    pub fn variable(name: impl Into<String>) -> Expr {
        Expr::Variable { name: name.into() }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// The variable/function environment expressions evaluate against.
pub trait Environment {
    /// Looks up a variable by its stored name (no `$` sigil, `global.`
    /// prefix intact).
    fn variable(&self, name: &str) -> Option<Value>;

    /// Invokes a host function with already-evaluated arguments.
    fn call(&self, name: &str, args: &[Value]) -> EvalResult<Value>;
}

/// Evaluation failure with a rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

pub type EvalResult<T> = Result<T, EvalError>;

impl Expr {
    /// Evaluates the tree against `env`.
    pub fn evaluate(&self, env: &dyn Environment) -> EvalResult<Value> {
        match self {
            Expr::Constant { value, .. } => Ok(value.clone()),
            Expr::Variable { name } => env
                .variable(name)
                .ok_or_else(|| EvalError::new(format!("Undefined variable '{name}'"))),
            Expr::Unary { op, operand } => eval_unary(*op, operand.evaluate(env)?),
            Expr::Binary { op, lhs, rhs } => {
                eval_binary(*op, lhs.evaluate(env)?, rhs.evaluate(env)?)
            }
            Expr::EmbedCall { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.evaluate(env)?);
                }
                env.call(name, &values)
            }
            Expr::FString { fragments, embeds } => {
                let mut rendered = String::new();
                let mut next_embed = 0;
                for fragment in fragments {
                    if fragment == PLACEHOLDER && next_embed < embeds.len() {
                        rendered.push_str(&embeds[next_embed].evaluate(env)?.to_string());
                        next_embed += 1;
                    } else {
                        rendered.push_str(fragment);
                    }
                }
                Ok(Value::Str(rendered))
            }
        }
    }
}

fn eval_unary(op: UnaryOp, operand: Value) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(-n)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, v) => Err(EvalError::new(format!(
            "Cannot apply unary '{}' to {}",
            match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "not",
            },
            v.value_type()
        ))),
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    use BinaryOp::*;

    let mismatch = |lhs: &Value, rhs: &Value| {
        EvalError::new(format!(
            "Cannot apply '{}' to {} and {}",
            op.symbol(),
            lhs.value_type(),
            rhs.value_type()
        ))
    };

    match op {
        And | Or => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => {
                Ok(Value::Bool(if op == And { a && b } else { a || b }))
            }
            (lhs, rhs) => Err(mismatch(&lhs, &rhs)),
        },
        Eq | NotEq => {
            let equal = values_equal(&lhs, &rhs).ok_or_else(|| mismatch(&lhs, &rhs))?;
            Ok(Value::Bool(if op == Eq { equal } else { !equal }))
        }
        Lt | Gt | LtEq | GtEq => {
            let ordering = match (&lhs, &rhs) {
                (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
                _ => match (lhs.as_f64(), rhs.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => return Err(mismatch(&lhs, &rhs)),
                },
            };
            let Some(ordering) = ordering else {
                return Err(mismatch(&lhs, &rhs));
            };
            let holds = match op {
                Lt => ordering.is_lt(),
                Gt => ordering.is_gt(),
                LtEq => ordering.is_le(),
                GtEq => ordering.is_ge(),
                _ => unreachable!(),
            };
            Ok(Value::Bool(holds))
        }
        Add => match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (lhs, rhs) => eval_arithmetic(op, lhs, rhs),
        },
        Sub | Mul | Div | Mod | Pow => eval_arithmetic(op, lhs, rhs),
    }
}

/// Widest-wins numeric arithmetic: int stays int until a float joins in.
/// `**` always widens to float.
fn eval_arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    use BinaryOp::*;

    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        match op {
            Add => return Ok(Value::Int(a.wrapping_add(b))),
            Sub => return Ok(Value::Int(a.wrapping_sub(b))),
            Mul => return Ok(Value::Int(a.wrapping_mul(b))),
            Div => {
                return if b == 0 {
                    Err(EvalError::new("Division by zero"))
                } else {
                    Ok(Value::Int(a.wrapping_div(b)))
                };
            }
            Mod => {
                return if b == 0 {
                    Err(EvalError::new("Division by zero"))
                } else {
                    Ok(Value::Int(a.wrapping_rem(b)))
                };
            }
            Pow => {} // falls through to the float path below
            _ => {}
        }
    }

    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(EvalError::new(format!(
            "Cannot apply '{}' to {} and {}",
            op.symbol(),
            lhs.value_type(),
            rhs.value_type()
        )));
    };
    let result = match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div => {
            if b == 0.0 {
                return Err(EvalError::new("Division by zero"));
            }
            a / b
        }
        Mod => {
            if b == 0.0 {
                return Err(EvalError::new("Division by zero"));
            }
            a % b
        }
        Pow => a.powf(b),
        _ => unreachable!(),
    };
    Ok(Value::Float(result))
}

fn values_equal(lhs: &Value, rhs: &Value) -> Option<bool> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a == b),
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Some(a == b),
            _ => None,
        },
    }
}
