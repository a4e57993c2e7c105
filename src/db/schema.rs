pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub const SCHEMA_VERSION: &str = "1";

/// Splits a schema file into executable statements. SQLite's driver runs one
/// statement per call, and a naive split on ';' would break inside quoted
/// literals. Comment-only lines are stripped from each statement.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for line in sql.lines() {
        if !in_single_quote && !in_double_quote && line.trim_start().starts_with("--") {
            continue;
        }
        for ch in line.chars() {
            match ch {
                '\'' if !in_double_quote => in_single_quote = !in_single_quote,
                '"' if !in_single_quote => in_double_quote = !in_double_quote,
                ';' if !in_single_quote && !in_double_quote => {
                    push_statement(&mut statements, &mut current);
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        current.push('\n');
    }

    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let stmt = current.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_semicolons() {
        let stmts = split_sql_statements("CREATE TABLE a (x TEXT);\nCREATE TABLE b (y TEXT);");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("CREATE TABLE a"));
    }

    #[test]
    fn ignores_semicolons_inside_quotes() {
        let stmts = split_sql_statements("INSERT INTO a VALUES ('x;y');");
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains("'x;y'"));
    }

    #[test]
    fn drops_comment_lines_and_blanks() {
        let stmts = split_sql_statements("-- header\nCREATE TABLE a (x TEXT);\n-- trailing\n");
        assert_eq!(stmts.len(), 1);
        assert!(!stmts[0].contains("header"));
    }

    #[test]
    fn embedded_schema_parses_into_statements() {
        let stmts = split_sql_statements(SCHEMA_SQL);
        assert!(stmts.iter().any(|s| s.contains("\"words\"")));
        assert!(stmts.iter().any(|s| s.contains("\"game_rounds\"")));
        assert!(stmts.iter().all(|s| !s.trim().is_empty()));
    }
}
