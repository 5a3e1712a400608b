use std::path::Path;

use anyhow::{Context, Result};

use crate::db::types::ResultSet;

pub fn write_result_set(path: &Path, result_set: &ResultSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let headers = result_set
        .columns
        .iter()
        .map(|col| col.name.as_str())
        .collect::<Vec<_>>();
    writer.write_record(headers)?;
    for row in &result_set.rows {
        let record = row.iter().map(|value| value.as_csv()).collect::<Vec<_>>();
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::{Column, Value};
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let mut dir = env::temp_dir();
        dir.push(format!("dbakit-csv-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn writes_headers_and_rows() {
        let dir = temp_dir("write");
        let path = dir.join("deps.csv");
        let result_set = ResultSet {
            columns: vec![
                Column {
                    name: "dependent".to_string(),
                    data_type: None,
                },
                Column {
                    name: "tier".to_string(),
                    data_type: None,
                },
            ],
            rows: vec![
                vec![Value::Text("dbo.OrdersView".to_string()), Value::Int(1)],
                vec![Value::Text("dbo.GetOrders".to_string()), Value::Int(2)],
            ],
        };

        write_result_set(&path, &result_set).expect("write csv");
        let content = fs::read_to_string(&path).expect("read csv");
        assert!(content.starts_with("dependent,tier\n"));
        assert!(content.contains("dbo.GetOrders,2"));
    }
}
