//! Calculator tool: evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, `%`, `^` (right-associative power),
//! parentheses, unary sign and decimal numbers. Evaluation is a small
//! precedence-climbing parser over a peekable character stream.

use async_trait::async_trait;
use react_agent_core::error::ToolError;
use react_agent_core::tool::{Tool, ToolResult};
use std::iter::Peekable;
use std::str::Chars;

/// Longest expression accepted, in bytes.
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// Deepest nesting of parentheses and signs the parser will follow.
const MAX_DEPTH: usize = 256;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports +, -, *, /, %, ^, parentheses and decimal numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        // Models frequently shorten the argument name.
        let expr = arguments
            .get("expression")
            .or_else(|| arguments.get("expr"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;
        if expr.len() > MAX_EXPRESSION_LEN {
            return Err(ToolError::InvalidArguments(format!(
                "Expression is {} bytes; the limit is {MAX_EXPRESSION_LEN}",
                expr.len()
            )));
        }

        let value = evaluate(expr).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: "calculator".into(),
            reason,
        })?;

        let mut result = ToolResult::ok(format_number(value));
        result.data = Some(serde_json::json!({ "result": value }));
        Ok(result)
    }
}

/// Render integral values without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate an arithmetic expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let mut parser = Parser {
        chars: expr.chars().peekable(),
        depth: 0,
    };
    let value = parser.expression(0)?;
    parser.skip_whitespace();
    match parser.chars.peek() {
        None => {}
        Some(c) => return Err(format!("Unexpected character: '{c}'")),
    }
    if !value.is_finite() {
        return Err("Result is not a finite number".into());
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl Op {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            '%' => Some(Op::Rem),
            '^' => Some(Op::Pow),
            _ => None,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div | Op::Rem => 2,
            Op::Pow => 3,
        }
    }

    fn right_associative(self) -> bool {
        self == Op::Pow
    }

    fn apply(self, lhs: f64, rhs: f64) -> Result<f64, String> {
        match self {
            Op::Add => Ok(lhs + rhs),
            Op::Sub => Ok(lhs - rhs),
            Op::Mul => Ok(lhs * rhs),
            Op::Div | Op::Rem if rhs == 0.0 => Err("Division by zero".into()),
            Op::Div => Ok(lhs / rhs),
            Op::Rem => Ok(lhs % rhs),
            Op::Pow => Ok(lhs.powf(rhs)),
        }
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn peek_op(&mut self) -> Option<Op> {
        self.skip_whitespace();
        self.chars.peek().copied().and_then(Op::from_char)
    }

    fn expression(&mut self, min_prec: u8) -> Result<f64, String> {
        if self.depth >= MAX_DEPTH {
            return Err("Expression nested too deeply".into());
        }
        self.depth += 1;
        let value = self.climb(min_prec);
        self.depth -= 1;
        value
    }

    // expression = unary (op expression)*, binding tighter than min_prec
    fn climb(&mut self, min_prec: u8) -> Result<f64, String> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_op() {
            if op.precedence() <= min_prec {
                break;
            }
            self.chars.next();
            let next_min = if op.right_associative() {
                op.precedence() - 1
            } else {
                op.precedence()
            };
            let rhs = self.expression(next_min)?;
            lhs = op.apply(lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        match self.chars.peek() {
            Some('-') => {
                self.chars.next();
                // -2^2 is -(2^2)
                Ok(-self.expression(Op::Mul.precedence())?)
            }
            Some('+') => {
                while self.chars.next_if(|c| *c == '+' || c.is_whitespace()).is_some() {}
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            Some('(') => {
                self.chars.next();
                let value = self.expression(0)?;
                self.skip_whitespace();
                match self.chars.next() {
                    Some(')') => Ok(value),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(format!("Unexpected character: '{c}'")),
            None => Err("Unexpected end of expression".into()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let mut literal = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }
        literal
            .parse()
            .map_err(|_| format!("Invalid number: {literal}"))
    }
}
