use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Null => "".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => format_number(*value),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => value.clone(),
        }
    }

    pub fn as_csv(&self) -> String {
        match self {
            Value::Null => "".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

/// Text of a cell, empty string for NULL or missing.
pub fn cell_text(row: &[Value], idx: usize) -> String {
    match row.get(idx) {
        Some(Value::Text(v)) => v.clone(),
        Some(Value::Int(v)) => v.to_string(),
        Some(Value::Float(v)) => v.to_string(),
        Some(Value::Bool(v)) => v.to_string(),
        _ => "".to_string(),
    }
}

pub fn cell_i64(row: &[Value], idx: usize) -> Option<i64> {
    match row.get(idx) {
        Some(Value::Int(v)) => Some(*v),
        Some(Value::Text(v)) => v.parse().ok(),
        _ => None,
    }
}

pub fn cell_f64(row: &[Value], idx: usize) -> Option<f64> {
    match row.get(idx) {
        Some(Value::Float(v)) => Some(*v),
        Some(Value::Int(v)) => Some(*v as f64),
        Some(Value::Text(v)) => v.parse().ok(),
        _ => None,
    }
}

/// Lossy bool: bit columns arrive as Bool, tinyint flags as Int, '1' as Text.
pub fn cell_bool(row: &[Value], idx: usize) -> bool {
    match row.get(idx) {
        Some(Value::Bool(v)) => *v,
        Some(Value::Int(v)) => *v != 0,
        Some(Value::Text(v)) => v == "1" || v.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn format_number(value: i64) -> String {
    let digits = value.abs().to_string().chars().rev().collect::<Vec<_>>();
    let mut out = String::new();
    for (idx, ch) in digits.iter().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    let mut out: String = out.chars().rev().collect();
    if value < 0 {
        out.insert(0, '-');
    }
    out
}
