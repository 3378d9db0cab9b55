use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_args, schema_of, Tool};

const ALLOWED: &str = "0123456789+-*/.() ";
const MAX_DEPTH: usize = 256;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CalculatorParams {
    /// Mathematical expression to evaluate
    pub expression: String,
}

/// Arithmetic over `+ - * / // **` and parentheses
pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn description(&self) -> &'static str {
        "Evaluate a mathematical expression safely"
    }

    fn parameters(&self) -> Value {
        schema_of::<CalculatorParams>()
    }

    async fn invoke(&self, args: Value) -> anyhow::Result<String> {
        let params: CalculatorParams = parse_args(args)?;
        Ok(calculate(&params.expression))
    }
}

/// Evaluate and render the way the tool reports back to the model
pub fn calculate(expression: &str) -> String {
    if !expression.chars().all(|c| ALLOWED.contains(c)) {
        return "Error: Invalid characters in expression".to_string();
    }

    match Parser::new(expression).parse() {
        Ok(value) => format!("Result: {}", value),
        Err(e) => format!("Error evaluating expression: {}", e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    fn neg(self) -> Number {
        match self {
            Number::Int(i) => i.checked_neg().map(Number::Int).unwrap_or(Number::Float(-(i as f64))),
            Number::Float(f) => Number::Float(-f),
        }
    }

    /// Integer op when both sides are integers and it does not overflow
    fn combine(
        self,
        other: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Number {
        if let (Number::Int(a), Number::Int(b)) = (self, other) {
            if let Some(v) = int_op(a, b) {
                return Number::Int(v);
            }
        }
        Number::Float(float_op(self.as_f64(), other.as_f64()))
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    DoubleStar,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = if literal.contains('.') {
                    literal
                        .parse::<f64>()
                        .map(Number::Float)
                        .map_err(|_| format!("invalid number '{}'", literal))?
                } else {
                    literal
                        .parse::<i64>()
                        .map(Number::Int)
                        .or_else(|_| literal.parse::<f64>().map(Number::Float))
                        .map_err(|_| format!("invalid number '{}'", literal))?
                };
                tokens.push(Token::Num(number));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::DoubleStar);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }
    Ok(tokens)
}

/// Recursive descent with Python precedence: unary minus binds looser than `**`
struct Parser {
    tokens: Result<Vec<Token>, String>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            tokens: tokenize(input),
            pos: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Number, String> {
        let tokens = std::mem::replace(&mut self.tokens, Ok(Vec::new()))?;
        if tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        self.tokens = Ok(tokens);

        let value = self.expr()?;
        if self.peek().is_some() {
            return Err("invalid syntax".to_string());
        }
        Ok(value)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.as_ref().ok().and_then(|t| t.get(self.pos))
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek().cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Run `f` one nesting level deeper, refusing past `MAX_DEPTH`
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, String>) -> Result<T, String> {
        if self.depth >= MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Number, String> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    let rhs = self.term()?;
                    value = value.combine(rhs, i64::checked_add, |a, b| a + b);
                }
                Some(Token::Minus) => {
                    self.next();
                    let rhs = self.term()?;
                    value = value.combine(rhs, i64::checked_sub, |a, b| a - b);
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<Number, String> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    let rhs = self.factor()?;
                    value = value.combine(rhs, i64::checked_mul, |a, b| a * b);
                }
                Some(Token::Slash) => {
                    self.next();
                    let rhs = self.factor()?;
                    if rhs.is_zero() {
                        return Err("division by zero".to_string());
                    }
                    value = Number::Float(value.as_f64() / rhs.as_f64());
                }
                Some(Token::DoubleSlash) => {
                    self.next();
                    let rhs = self.factor()?;
                    if rhs.is_zero() {
                        return Err("integer division or modulo by zero".to_string());
                    }
                    value = value.combine(rhs, floor_div, |a, b| (a / b).floor());
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<Number, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.next();
                Ok(self.nested(Self::factor)?.neg())
            }
            Some(Token::Plus) => {
                self.next();
                self.nested(Self::factor)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number, String> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.next();
            let exponent = self.nested(Self::factor)?;
            return match (base, exponent) {
                (Number::Int(b), Number::Int(e)) if e >= 0 => Ok(u32::try_from(e)
                    .ok()
                    .and_then(|e| b.checked_pow(e))
                    .map(Number::Int)
                    .unwrap_or_else(|| Number::Float((b as f64).powf(e as f64)))),
                _ if base.is_zero() && exponent.as_f64() < 0.0 => {
                    Err("0.0 cannot be raised to a negative power".to_string())
                }
                _ => Ok(Number::Float(base.as_f64().powf(exponent.as_f64()))),
            };
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.nested(Self::expr)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("'(' was never closed".to_string()),
                }
            }
            _ => Err("invalid syntax".to_string()),
        }
    }
}

/// Python `//` on integers; `None` on overflow so the caller falls back to float
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(calculate("2+2"), "Result: 4");
        assert_eq!(calculate("2 + 3 * 4"), "Result: 14");
        assert_eq!(calculate("(2 + 3) * 4"), "Result: 20");
        assert_eq!(calculate("2**10"), "Result: 1024");
        assert_eq!(calculate("-2**2"), "Result: -4");
    }

    #[test]
    fn test_true_and_floor_division() {
        assert_eq!(calculate("7/2"), "Result: 3.5");
        assert_eq!(calculate("4/2"), "Result: 2.0");
        assert_eq!(calculate("7//2"), "Result: 3");
        assert_eq!(calculate("-7//2"), "Result: -4");
        assert_eq!(calculate("0.1+0.2"), "Result: 0.30000000000000004");
    }

    #[test]
    fn test_rejects_foreign_characters() {
        assert_eq!(
            calculate("__import__('os')"),
            "Error: Invalid characters in expression"
        );
        assert_eq!(calculate("2^3"), "Error: Invalid characters in expression");
    }

    #[test]
    fn test_reports_evaluation_errors() {
        assert_eq!(calculate("1/0"), "Error evaluating expression: division by zero");
        assert!(calculate("2+").starts_with("Error evaluating expression"));
        assert!(calculate("(1+2").starts_with("Error evaluating expression"));
        assert!(calculate("").starts_with("Error evaluating expression"));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(
            calculate(&deep),
            "Error evaluating expression: expression nested too deeply"
        );
        assert_eq!(
            calculate(&format!("{}1", "-".repeat(200_000))),
            "Error evaluating expression: expression nested too deeply"
        );
        assert_eq!(calculate(&format!("{}1{}", "(".repeat(50), ")".repeat(50))), "Result: 1");
        assert_eq!(calculate("--1"), "Result: 1");
    }

    #[test]
    fn test_floor_division_overflow_falls_back_to_float() {
        assert_eq!(
            calculate("(-9223372036854775807-1)//-1"),
            "Result: 9223372036854775808"
        );
        assert_eq!(calculate("7//-2"), "Result: -4");
        assert_eq!(calculate("-7//-2"), "Result: 3");
        assert_eq!(calculate("6//-3"), "Result: -2");
    }

    #[tokio::test]
    async fn test_invoke() {
        let out = Calculator.invoke(json!({"expression": "6*7"})).await.unwrap();
        assert_eq!(out, "Result: 42");
    }
}
