//! Binary and logical operator semantics.

use std::fmt;

use super::value::Value;

/// Operators accepted by `BinaryExpression` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl BinaryOperator {
    /// Parses an operator symbol such as `"=="` or `"<="`.
    pub fn parse(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "==" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::Less,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::Greater,
            ">=" => BinaryOperator::GreaterEqual,
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Remainder,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
        }
    }

    /// Applies the operator to two evaluated operands.
    ///
    /// Comparisons yield booleans; arithmetic coerces both sides to numbers.
    /// Division by zero yields `0`.
    pub fn apply(&self, left: &Value, right: &Value) -> Value {
        match self {
            BinaryOperator::Equal => Value::Bool(loose_eq(left, right)),
            BinaryOperator::NotEqual => Value::Bool(!loose_eq(left, right)),
            BinaryOperator::Less => Value::Bool(compare(left, right, |a, b| a < b)),
            BinaryOperator::LessEqual => Value::Bool(compare(left, right, |a, b| a <= b)),
            BinaryOperator::Greater => Value::Bool(compare(left, right, |a, b| a > b)),
            BinaryOperator::GreaterEqual => Value::Bool(compare(left, right, |a, b| a >= b)),
            BinaryOperator::Add => Value::Number(left.to_number() + right.to_number()),
            BinaryOperator::Subtract => Value::Number(left.to_number() - right.to_number()),
            BinaryOperator::Multiply => Value::Number(left.to_number() * right.to_number()),
            BinaryOperator::Divide => {
                let divisor = right.to_number();
                if divisor == 0.0 {
                    Value::Number(0.0)
                } else {
                    Value::Number(left.to_number() / divisor)
                }
            }
            BinaryOperator::Remainder => Value::Number(left.to_number() % right.to_number()),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operators accepted by `LogicalExpression` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "AND" => Some(LogicalOp::And),
            "OR" => Some(LogicalOp::Or),
            "!" => Some(LogicalOp::Not),
            _ => None,
        }
    }
}

/// Ordering comparison. Two date-like operands compare by timestamp,
/// anything else compares numerically, where `NaN` is never ordered.
fn compare(left: &Value, right: &Value, ordered: impl Fn(f64, f64) -> bool) -> bool {
    if let (Some(a), Some(b)) = (left.as_date(), right.as_date()) {
        return ordered(a.timestamp_millis() as f64, b.timestamp_millis() as f64);
    }
    ordered(left.to_number(), right.to_number())
}

/// Loose equality.
///
/// `null` and `undefined` equal each other and nothing else. Numbers,
/// strings and booleans follow the usual coercions. Dates equal dates and
/// date-like strings with the same timestamp. Two arrays or two objects are
/// compared element by element.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    use Value::*;

    match (left, right) {
        (Undefined | Null, Undefined | Null) => true,
        (Undefined | Null, _) | (_, Undefined | Null) => false,

        (Number(a), Number(b)) => a == b,
        (String(a), String(b)) => a == b,
        (Bool(a), Bool(b)) => a == b,
        (Date(a), Date(b)) => a.timestamp_millis() == b.timestamp_millis(),
        (Array(a), Array(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_eq(x, y)),
        (Object(a), Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| loose_eq(x, y)))
        }

        (Number(a), String(_)) => *a == right.to_number(),
        (String(_), Number(b)) => left.to_number() == *b,

        (Bool(_), _) => loose_eq(&Number(left.to_number()), right),
        (_, Bool(_)) => loose_eq(left, &Number(right.to_number())),

        (Date(a), String(s)) | (String(s), Date(a)) => super::value::parse_date_like(s)
            .is_some_and(|b| a.timestamp_millis() == b.timestamp_millis()),
        (Date(a), Number(n)) | (Number(n), Date(a)) => a.timestamp_millis() as f64 == *n,

        (Array(_), String(_) | Number(_)) => loose_eq(&String(left.to_js_string()), right),
        (String(_) | Number(_), Array(_)) => loose_eq(left, &String(right.to_js_string())),
        (Object(_), String(_) | Number(_)) => loose_eq(&String(left.to_js_string()), right),
        (String(_) | Number(_), Object(_)) => loose_eq(left, &String(right.to_js_string())),

        (Date(_), Array(_) | Object(_)) | (Array(_) | Object(_), Date(_)) => false,
        (Array(_), Object(_)) | (Object(_), Array(_)) => false,
    }
}
