use std::sync::OnceLock;

use regex::Regex;

use crate::db::queries::quote_ident;
use crate::db::types::{ResultSet, cell_bool, cell_i64, cell_text};

/// One column of a table, enough to reproduce its definition.
#[derive(Debug, Clone, Default)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<i64>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub is_nullable: bool,
    pub is_identity: bool,
    pub seed: Option<i64>,
    pub increment: Option<i64>,
    pub default_value: Option<String>,
    pub computed_definition: Option<String>,
}

impl ColumnSpec {
    /// Render the type with length, precision or scale where the type
    /// carries one. n-prefixed string types store two bytes per character.
    fn type_spec(&self) -> String {
        let data_type = self.data_type.as_str();
        match data_type.to_lowercase().as_str() {
            "varchar" | "nvarchar" | "char" | "nchar" | "varbinary" | "binary" => {
                match self.max_length {
                    Some(-1) => format!("{}(MAX)", data_type),
                    Some(len) => {
                        let display_len = if data_type.starts_with('n') { len / 2 } else { len };
                        format!("{}({})", data_type, display_len)
                    }
                    None => data_type.to_string(),
                }
            }
            "decimal" | "numeric" => {
                let p = self.precision.unwrap_or(18);
                let s = self.scale.unwrap_or(0);
                format!("{}({}, {})", data_type, p, s)
            }
            "float" => match self.precision {
                Some(p) if p != 53 => format!("float({})", p),
                _ => "float".to_string(),
            },
            "datetime2" | "datetimeoffset" | "time" => match self.scale {
                Some(s) if s != 7 => format!("{}({})", data_type, s),
                _ => data_type.to_string(),
            },
            _ => data_type.to_string(),
        }
    }

    fn definition(&self) -> String {
        if let Some(computed) = &self.computed_definition {
            return format!("    {} AS {}", quote_ident(&self.name), computed);
        }

        let mut def = format!("    {} {}", quote_ident(&self.name), self.type_spec());
        if self.is_identity {
            def.push_str(&format!(
                " IDENTITY({}, {})",
                self.seed.unwrap_or(1),
                self.increment.unwrap_or(1)
            ));
        }
        def.push_str(if self.is_nullable { " NULL" } else { " NOT NULL" });
        if let Some(default_value) = &self.default_value {
            def.push_str(&format!(" DEFAULT {}", default_value));
        }
        def
    }
}

/// Decode the TABLE_DDL_COLUMNS result set. Column order must match the
/// query projection.
pub fn column_specs_from_rows(result_set: &ResultSet) -> Vec<ColumnSpec> {
    result_set
        .rows
        .iter()
        .map(|row| {
            let is_computed = cell_bool(row, 11);
            let computed = cell_text(row, 10);
            let default_value = cell_text(row, 9);
            ColumnSpec {
                name: cell_text(row, 0),
                data_type: cell_text(row, 1),
                max_length: cell_i64(row, 2),
                precision: cell_i64(row, 3).map(|v| v as u8),
                scale: cell_i64(row, 4).map(|v| v as u8),
                is_nullable: cell_bool(row, 5),
                is_identity: cell_bool(row, 6),
                seed: cell_i64(row, 7),
                increment: cell_i64(row, 8),
                default_value: (!default_value.is_empty()).then_some(default_value),
                computed_definition: (is_computed && !computed.is_empty()).then_some(computed),
            }
        })
        .collect()
}

pub fn build_table_script(schema: &str, name: &str, columns: &[ColumnSpec]) -> String {
    let mut ddl = format!("CREATE TABLE {}.{} (\n", quote_ident(schema), quote_ident(name));
    let defs: Vec<String> = columns.iter().map(ColumnSpec::definition).collect();
    ddl.push_str(&defs.join(",\n"));
    ddl.push_str("\n);");
    ddl
}

pub fn build_synonym_script(schema: &str, name: &str, base_object: &str) -> String {
    format!(
        "CREATE SYNONYM {}.{} FOR {};",
        quote_ident(schema),
        quote_ident(name),
        base_object
    )
}

pub fn build_sequence_script(
    schema: &str,
    name: &str,
    type_name: &str,
    start: i64,
    increment: i64,
) -> String {
    format!(
        "CREATE SEQUENCE {}.{} AS {} START WITH {} INCREMENT BY {};",
        quote_ident(schema),
        quote_ident(name),
        type_name,
        start,
        increment
    )
}

fn preamble_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*SET[ \t]+(?:ANSI_NULLS|QUOTED_IDENTIFIER)[ \t]+(?:ON|OFF)[ \t]*;?[ \t]*\r?\n?")
            .expect("valid regex")
    })
}

/// Drop the scripting preamble statements the engine records around module
/// definitions so emitted scripts hold the object definition alone.
pub fn strip_engine_preamble(script: &str) -> String {
    preamble_regex().replace_all(script, "").trim_start().to_string()
}
