//! System values and the evaluation context.
//!
//! System values are captured once per evaluation context, so every
//! reference to `NOW` inside one evaluation sees the same instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::Value as JsonValue;

use super::value::Value;

/// Current date and time.
pub const NOW: &str = "NOW";
/// Start of the current local day.
pub const TODAY: &str = "TODAY";
/// The signed-in user object.
pub const CURRENT_USER: &str = "CURRENT_USER";

/// Named values available to `SystemIdentifier` nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemValues {
    values: BTreeMap<String, Value>,
}

impl SystemValues {
    /// Captures `NOW`, `TODAY` and `CURRENT_USER` for the given instant.
    pub fn at(now: DateTime<Local>, current_user: Value) -> Self {
        let mut values = BTreeMap::new();
        values.insert(NOW.to_string(), Value::Date(now.with_timezone(&Utc)));
        values.insert(TODAY.to_string(), Value::Date(start_of_day(now)));
        values.insert(CURRENT_USER.to_string(), current_user);
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Adds or replaces a system value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Local midnight of `now`'s day, as UTC. Falls back to `now` when midnight
/// does not exist in the local zone.
fn start_of_day(now: DateTime<Local>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .unwrap_or(now)
        .with_timezone(&Utc)
}

/// Source of system values for new evaluation contexts.
#[derive(Debug, Clone, Default)]
pub struct SystemValueProvider {
    current_user: Value,
}

impl SystemValueProvider {
    pub fn new(current_user: impl Into<Value>) -> Self {
        Self {
            current_user: current_user.into(),
        }
    }

    pub fn set_current_user(&mut self, current_user: impl Into<Value>) {
        self.current_user = current_user.into();
    }

    /// Captures system values at the current time.
    pub fn capture(&self) -> SystemValues {
        self.capture_at(Local::now())
    }

    /// Captures system values as of `now`.
    pub fn capture_at(&self, now: DateTime<Local>) -> SystemValues {
        SystemValues::at(now, self.current_user.clone())
    }
}

/// Everything an expression can read: form values and system values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    form_values: BTreeMap<String, Value>,
    system_values: SystemValues,
}

impl EvaluationContext {
    pub fn new(form_values: BTreeMap<String, Value>, system_values: SystemValues) -> Self {
        Self {
            form_values,
            system_values,
        }
    }

    /// Builds a context from a JSON object of form values, capturing system
    /// values from `provider` now. Non-object JSON yields no form values.
    pub fn capture(form_values: JsonValue, provider: &SystemValueProvider) -> Self {
        let form_values = match Value::from(form_values) {
            Value::Object(map) => map,
            _ => BTreeMap::new(),
        };
        Self::new(form_values, provider.capture())
    }

    pub fn form_value(&self, name: &str) -> Option<&Value> {
        self.form_values.get(name)
    }

    pub fn system_value(&self, name: &str) -> Option<&Value> {
        self.system_values.get(name)
    }

    /// Sets a form value, replacing any previous one.
    pub fn set_form_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.form_values.insert(name.into(), value.into());
    }

    pub fn form_values(&self) -> &BTreeMap<String, Value> {
        &self.form_values
    }

    pub fn system_values(&self) -> &SystemValues {
        &self.system_values
    }
}
