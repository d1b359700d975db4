//! Function registry for `CallExpression` nodes.
//!
//! Functions receive already-evaluated arguments and return a [`Value`].
//! They are tolerant of bad input in the same way operators are: a
//! non-numeric argument to `ABS` yields `NaN`, not an error. Errors are kept
//! for calls that cannot mean anything, such as an unknown date unit.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, Months, Utc};

use super::error::{EvalResult, EvaluationError};
use super::value::Value;

/// Signature of a registered function.
pub type NativeFunction = Arc<dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync>;

/// Maximum edit distance for "did you mean" suggestions.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Named functions available to the evaluator.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, NativeFunction>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FunctionRegistry {
    /// A registry with no functions.
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// A registry with the built-in text, math, logic and date functions.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        registry.register("CONCAT", concat);
        registry.register("UPPER", |args: &[Value]| Ok(Value::String(text(args, 0).to_uppercase())));
        registry.register("LOWER", |args: &[Value]| Ok(Value::String(text(args, 0).to_lowercase())));
        registry.register("TRIM", |args: &[Value]| Ok(Value::String(text(args, 0).trim().to_string())));
        registry.register("LEN", len);
        registry.register("LEFT", left);
        registry.register("RIGHT", right);
        registry.register("SUBSTRING", substring);
        registry.register("REPLACE", replace);

        registry.register("ABS", |args: &[Value]| Ok(Value::Number(number(args, 0).abs())));
        registry.register("FLOOR", |args: &[Value]| Ok(Value::Number(number(args, 0).floor())));
        registry.register("CEIL", |args: &[Value]| Ok(Value::Number(number(args, 0).ceil())));
        registry.register("ROUND", round);
        registry.register("MIN", |args: &[Value]| Ok(fold_numbers(args, f64::min)));
        registry.register("MAX", |args: &[Value]| Ok(fold_numbers(args, f64::max)));
        registry.register("SUM", sum);
        registry.register("AVG", avg);

        registry.register("IF", if_fn);
        registry.register("ISEMPTY", |args: &[Value]| Ok(Value::Bool(is_empty(arg(args, 0)))));
        registry.register("COALESCE", |args: &[Value]| {
            Ok(args.iter().find(|v| !v.is_nullish()).cloned().unwrap_or_default())
        });

        registry.register("YEAR", |args: &[Value]| Ok(date_part(args, |d| d.year())));
        registry.register("MONTH", |args: &[Value]| Ok(date_part(args, |d| d.month() as i32)));
        registry.register("DAY", |args: &[Value]| Ok(date_part(args, |d| d.day() as i32)));
        registry.register("DATEADD", date_add);
        registry.register("DATEDIFF", date_diff);

        registry
    }

    /// Registers `function` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Removes a function. Returns true if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Calls `name` with `args`.
    pub fn call(&self, name: &str, args: &[Value]) -> EvalResult<Value> {
        match self.functions.get(name) {
            Some(function) => function(args),
            None => Err(self.unknown(name)),
        }
    }

    /// Builds an unknown-function error with the closest registered name.
    pub fn unknown(&self, name: &str) -> EvaluationError {
        EvaluationError::UnknownFunction {
            name: name.to_string(),
            suggestion: self.suggest(name),
        }
    }

    /// Finds the registered name closest to `name`, ignoring case.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let wanted = name.to_uppercase();
        self.functions
            .keys()
            .map(|candidate| (strsim::levenshtein(&wanted, &candidate.to_uppercase()), candidate))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.clone())
    }
}

// ==================== Argument helpers ====================

fn arg(args: &[Value], index: usize) -> &Value {
    static UNDEFINED: Value = Value::Undefined;
    args.get(index).unwrap_or(&UNDEFINED)
}

/// String form of an argument; nullish arguments are empty.
fn text(args: &[Value], index: usize) -> String {
    let value = arg(args, index);
    if value.is_nullish() {
        String::new()
    } else {
        value.to_js_string()
    }
}

fn number(args: &[Value], index: usize) -> f64 {
    arg(args, index).to_number()
}

/// Integer count argument; missing uses `default`, invalid or negative is 0.
fn count(args: &[Value], index: usize, default: usize) -> usize {
    match args.get(index) {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = value.to_number();
            if n.is_nan() || n <= 0.0 {
                0
            } else {
                n.trunc() as usize
            }
        }
    }
}

/// Arguments with arrays flattened one level.
fn flatten(args: &[Value]) -> impl Iterator<Item = &Value> {
    args.iter().flat_map(|value| match value {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    })
}

/// Numeric arguments, skipping nullish and non-numeric values.
fn numbers(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    flatten(args)
        .filter(|value| !value.is_nullish())
        .map(Value::to_number)
        .filter(|n| !n.is_nan())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

// ==================== Text ====================

fn concat(args: &[Value]) -> EvalResult<Value> {
    let joined: String = (0..args.len()).map(|i| text(args, i)).collect();
    Ok(Value::String(joined))
}

fn len(args: &[Value]) -> EvalResult<Value> {
    let length = match arg(args, 0) {
        Value::Undefined | Value::Null => 0,
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => other.to_js_string().chars().count(),
    };
    Ok(Value::Number(length as f64))
}

fn left(args: &[Value]) -> EvalResult<Value> {
    let n = count(args, 1, 1);
    Ok(Value::String(text(args, 0).chars().take(n).collect()))
}

fn right(args: &[Value]) -> EvalResult<Value> {
    let s = text(args, 0);
    let n = count(args, 1, 1);
    let skip = s.chars().count().saturating_sub(n);
    Ok(Value::String(s.chars().skip(skip).collect()))
}

/// `SUBSTRING(text, start, length?)` with a zero-based `start`.
fn substring(args: &[Value]) -> EvalResult<Value> {
    let start = count(args, 1, 0);
    let length = count(args, 2, usize::MAX);
    Ok(Value::String(text(args, 0).chars().skip(start).take(length).collect()))
}

fn replace(args: &[Value]) -> EvalResult<Value> {
    let pattern = text(args, 1);
    if pattern.is_empty() {
        return Ok(Value::String(text(args, 0)));
    }
    Ok(Value::String(text(args, 0).replace(&pattern, &text(args, 2))))
}

// ==================== Math ====================

/// Rounds half up, to `digits` decimal places (default 0).
fn round(args: &[Value]) -> EvalResult<Value> {
    let value = number(args, 0);
    let digits = match args.get(1) {
        None | Some(Value::Undefined) => 0.0,
        Some(d) => d.to_number().trunc(),
    };
    if digits.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    let factor = 10f64.powi(digits.clamp(-15.0, 15.0) as i32);
    Ok(Value::Number((value * factor + 0.5).floor() / factor))
}

fn fold_numbers(args: &[Value], pick: fn(f64, f64) -> f64) -> Value {
    numbers(args).reduce(pick).map(Value::Number).unwrap_or_default()
}

fn sum(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(numbers(args).sum()))
}

fn avg(args: &[Value]) -> EvalResult<Value> {
    let (total, n) = numbers(args).fold((0.0, 0usize), |(total, n), x| (total + x, n + 1));
    if n == 0 {
        return Ok(Value::Undefined);
    }
    Ok(Value::Number(total / n as f64))
}

// ==================== Logic ====================

/// `IF(condition, then, else?)`. Both branches are already evaluated.
fn if_fn(args: &[Value]) -> EvalResult<Value> {
    let branch = if arg(args, 0).truthy() { 1 } else { 2 };
    Ok(arg(args, branch).clone())
}

// ==================== Dates ====================

fn date_part(args: &[Value], part: impl Fn(DateTime<Local>) -> i32) -> Value {
    match arg(args, 0).as_date() {
        Some(dt) => Value::Number(f64::from(part(dt.with_timezone(&Local)))),
        None => Value::Undefined,
    }
}

/// Calendar unit accepted by `DATEADD` and `DATEDIFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

fn date_unit(function: &str, args: &[Value], index: usize) -> EvalResult<DateUnit> {
    let raw = match args.get(index) {
        None | Some(Value::Undefined) | Some(Value::Null) => return Ok(DateUnit::Days),
        Some(value) => value.to_js_string(),
    };
    match raw.to_lowercase().trim_end_matches('s') {
        "minute" => Ok(DateUnit::Minutes),
        "hour" => Ok(DateUnit::Hours),
        "day" => Ok(DateUnit::Days),
        "week" => Ok(DateUnit::Weeks),
        "month" => Ok(DateUnit::Months),
        "year" => Ok(DateUnit::Years),
        _ => Err(EvaluationError::function(function, format!("unknown date unit: {}", raw))),
    }
}

/// `DATEADD(date, amount, unit?)`. The unit defaults to days; the amount is
/// truncated to whole units.
fn date_add(args: &[Value]) -> EvalResult<Value> {
    let unit = date_unit("DATEADD", args, 2)?;
    let Some(start) = arg(args, 0).as_date() else {
        return Ok(Value::Undefined);
    };
    let amount = number(args, 1);
    if !amount.is_finite() {
        return Ok(Value::Undefined);
    }
    let amount = amount.trunc() as i64;

    let shifted = match unit {
        DateUnit::Minutes => Duration::try_minutes(amount).and_then(|d| start.checked_add_signed(d)),
        DateUnit::Hours => Duration::try_hours(amount).and_then(|d| start.checked_add_signed(d)),
        DateUnit::Days => Duration::try_days(amount).and_then(|d| start.checked_add_signed(d)),
        DateUnit::Weeks => Duration::try_weeks(amount).and_then(|d| start.checked_add_signed(d)),
        DateUnit::Months => add_months(start, amount),
        DateUnit::Years => amount.checked_mul(12).and_then(|months| add_months(start, months)),
    };
    Ok(shifted.map(Value::Date).unwrap_or_default())
}

fn add_months(start: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        start.checked_add_months(magnitude)
    } else {
        start.checked_sub_months(magnitude)
    }
}

/// `DATEDIFF(start, end, unit?)`: whole units from `start` to `end`,
/// negative when `end` is earlier.
fn date_diff(args: &[Value]) -> EvalResult<Value> {
    let unit = date_unit("DATEDIFF", args, 2)?;
    let (Some(start), Some(end)) = (arg(args, 0).as_date(), arg(args, 1).as_date()) else {
        return Ok(Value::Undefined);
    };

    let delta = end.signed_duration_since(start);
    let diff = match unit {
        DateUnit::Minutes => delta.num_minutes(),
        DateUnit::Hours => delta.num_hours(),
        DateUnit::Days => delta.num_days(),
        DateUnit::Weeks => delta.num_weeks(),
        DateUnit::Months => month_span(start, end),
        DateUnit::Years => month_span(start, end) / 12,
    };
    Ok(Value::Number(diff as f64))
}

/// Whole calendar months between two instants, counted in local time.
fn month_span(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let (a, b) = (start.with_timezone(&Local), end.with_timezone(&Local));
    let mut months = i64::from(b.year() - a.year()) * 12 + i64::from(b.month()) - i64::from(a.month());
    // a partial final month does not count
    if months > 0 && (b.day(), b.time()) < (a.day(), a.time()) {
        months -= 1;
    } else if months < 0 && (b.day(), b.time()) > (a.day(), a.time()) {
        months += 1;
    }
    months
}
