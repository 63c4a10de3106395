// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use colored::*;
use serde_json::Value;

use crate::terminal::colors;

/// Continuation prefix for the lines of a multi-line tree value.
const NESTED_INDENT: &str = "\n    ";

pub fn fields_to_details(fields: &[(String, Value)]) -> Vec<(String, ColoredString)> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), value_to_colored(value)))
        .collect()
}

/// Scalars print inline; objects and arrays as indented, pretty JSON.
pub fn value_to_colored(value: &Value) -> ColoredString {
    match value {
        Value::Null => "null".color(colors::NULL),
        Value::Bool(b) => b.to_string().color(colors::BOOL),
        Value::Number(n) => n.to_string().color(colors::NUMBER),
        Value::String(s) => s.as_str().color(colors::STRING),
        Value::Array(a) if a.is_empty() => "[]".color(colors::SEPARATOR),
        Value::Object(o) if o.is_empty() => "{}".color(colors::SEPARATOR),
        composite => {
            let pretty = serde_json::to_string_pretty(composite)
                .unwrap_or_else(|_| composite.to_string());
            format!("{NESTED_INDENT}{}", pretty.replace('\n', NESTED_INDENT))
                .color(colors::TEXT_DEFAULT)
        }
    }
}
