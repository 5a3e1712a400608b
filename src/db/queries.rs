pub const STATUS: &str = r#"
SELECT @@SERVERNAME AS server_name,
       @@VERSION AS server_version,
       DB_NAME() AS current_database,
       CONVERT(varchar(33), SYSDATETIMEOFFSET(), 127) AS server_time
"#;

/// Identity triple of the connected instance, mirrored into every URN.
pub const SERVER_IDENTITY: &str = r#"
SELECT CAST(SERVERPROPERTY('MachineName') AS nvarchar(128)) AS computer_name,
       CAST(ISNULL(SERVERPROPERTY('InstanceName'), 'MSSQLSERVER') AS nvarchar(128)) AS instance_name,
       @@SERVERNAME AS sql_instance
"#;

/// Resolve a bare object name (optionally schema-qualified) to catalog rows.
/// Returns one row per matching object so ambiguity can be reported.
pub const RESOLVE_OBJECT: &str = r#"
SELECT o.object_id,
       s.name AS schema_name,
       o.name AS object_name,
       o.type AS type_code,
       o.is_ms_shipped
FROM sys.objects o
INNER JOIN sys.schemas s ON o.schema_id = s.schema_id
WHERE o.name = @P1
  AND (@P2 IS NULL OR s.name = @P2)
ORDER BY s.name
"#;

/// Every object-to-object dependency edge in the current database, one
/// round trip. The first arm covers expression references (views, procedures,
/// functions, triggers, synonyms), the second adds foreign keys, which
/// sys.sql_expression_dependencies does not track. UNION collapses edges
/// reported by both arms.
pub const DEPENDENCY_EDGES: &str = r#"
SELECT d.referencing_id AS from_id,
       rs.name AS from_schema,
       ro.name AS from_name,
       ro.type AS from_type,
       ro.is_ms_shipped AS from_system,
       d.referenced_id AS to_id,
       fs.name AS to_schema,
       fo.name AS to_name,
       fo.type AS to_type,
       fo.is_ms_shipped AS to_system
FROM sys.sql_expression_dependencies d
INNER JOIN sys.objects ro ON d.referencing_id = ro.object_id
INNER JOIN sys.schemas rs ON ro.schema_id = rs.schema_id
INNER JOIN sys.objects fo ON d.referenced_id = fo.object_id
INNER JOIN sys.schemas fs ON fo.schema_id = fs.schema_id
WHERE d.referenced_id IS NOT NULL
UNION
SELECT fk.parent_object_id,
       ps.name,
       po.name,
       po.type,
       po.is_ms_shipped,
       fk.referenced_object_id,
       qs.name,
       qo.name,
       qo.type,
       qo.is_ms_shipped
FROM sys.foreign_keys fk
INNER JOIN sys.objects po ON fk.parent_object_id = po.object_id
INNER JOIN sys.schemas ps ON po.schema_id = ps.schema_id
INNER JOIN sys.objects qo ON fk.referenced_object_id = qo.object_id
INNER JOIN sys.schemas qs ON qo.schema_id = qs.schema_id
"#;

pub const OBJECT_DETAILS: &str = r#"
SELECT s.name AS schema_name,
       o.name AS object_name,
       o.type AS type_code,
       ISNULL(USER_NAME(OBJECTPROPERTY(o.object_id, 'OwnerId')), s.name) AS owner_name,
       CAST(ISNULL(sm.is_schema_bound, 0) AS bit) AS is_schema_bound
FROM sys.objects o
INNER JOIN sys.schemas s ON o.schema_id = s.schema_id
LEFT JOIN sys.sql_modules sm ON sm.object_id = o.object_id
WHERE o.object_id = @P1
"#;

pub const OBJECT_DEFINITION: &str = "SELECT OBJECT_DEFINITION(@P1) AS definition";

pub const SYNONYM_BASE: &str =
    "SELECT base_object_name FROM sys.synonyms WHERE object_id = @P1";

pub const SEQUENCE_DEFINITION: &str = r#"
SELECT t.name AS type_name,
       CAST(sq.start_value AS bigint) AS start_value,
       CAST(sq.increment AS bigint) AS increment
FROM sys.sequences sq
INNER JOIN sys.types t ON sq.user_type_id = t.user_type_id
WHERE sq.object_id = @P1
"#;

/// Column shape of a table, enough to reconstruct a CREATE TABLE statement.
pub const TABLE_DDL_COLUMNS: &str = r#"
SELECT c.name AS column_name,
       t.name AS data_type,
       c.max_length,
       c.precision,
       c.scale,
       c.is_nullable,
       c.is_identity,
       CAST(ic.seed_value AS bigint) AS seed_value,
       CAST(ic.increment_value AS bigint) AS increment_value,
       dc.definition AS default_value,
       cc.definition AS computed_definition,
       c.is_computed
FROM sys.columns c
INNER JOIN sys.types t ON c.user_type_id = t.user_type_id
LEFT JOIN sys.default_constraints dc ON c.default_object_id = dc.object_id
LEFT JOIN sys.computed_columns cc ON c.object_id = cc.object_id AND c.column_id = cc.column_id
LEFT JOIN sys.identity_columns ic ON c.object_id = ic.object_id AND c.column_id = ic.column_id
WHERE c.object_id = @P1
ORDER BY c.column_id
"#;

/// Bracket-quote an identifier, doubling closing brackets.
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Unicode string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("Orders"), "[Orders]");
        assert_eq!(quote_ident("weird]name"), "[weird]]name]");
    }

    #[test]
    fn quotes_literals() {
        assert_eq!(quote_literal("plain"), "N'plain'");
        assert_eq!(quote_literal("O'Brien"), "N'O''Brien'");
    }
}
