use crate::value::Value;

/// Quote an identifier for embedding in SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

enum Filter {
    /// `field = ?`
    Eq(String, Value),
    /// `field IN (?, ...)`
    In(String, Vec<Value>),
    /// `field NOT IN (?, ...)`
    NotIn(String, Vec<Value>),
    /// `(field = ? OR field = ? ...)`
    AnyOf(String, Vec<Value>),
}

/// Builder for parameterized SELECT statements.
///
/// All filters are ANDed together; `filter_any_of` produces an OR group
/// inside its own parentheses so it still composes with the rest.
pub struct SelectQuery {
    table: String,
    columns: Option<Vec<String>>,
    filters: Vec<Filter>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl SelectQuery {
    pub fn new(table: &str) -> Self {
        SelectQuery {
            table: table.to_string(),
            columns: None,
            filters: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn filter_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    pub fn filter_in(mut self, field: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(field.to_string(), values));
        self
    }

    pub fn filter_not_in(mut self, field: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::NotIn(field.to_string(), values));
        self
    }

    pub fn filter_any_of(mut self, field: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::AnyOf(field.to_string(), values));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render to SQL text plus the parameter list, using `?N` placeholders.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        fn placeholder(params: &mut Vec<Value>, value: &Value) -> String {
            params.push(value.clone());
            format!("?{}", params.len())
        }

        let mut params: Vec<Value> = Vec::new();

        let columns = match &self.columns {
            Some(cols) => cols
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            None => "*".to_string(),
        };

        let mut clauses: Vec<String> = Vec::new();
        for filter in &self.filters {
            match filter {
                Filter::Eq(field, value) => {
                    let p = placeholder(&mut params, value);
                    clauses.push(format!("{} = {p}", quote_ident(field)));
                }
                Filter::In(field, values) => {
                    if values.is_empty() {
                        // IN () is a syntax error; an empty set matches nothing.
                        clauses.push("1 = 0".to_string());
                        continue;
                    }
                    let marks: Vec<String> =
                        values.iter().map(|v| placeholder(&mut params, v)).collect();
                    clauses.push(format!("{} IN ({})", quote_ident(field), marks.join(", ")));
                }
                Filter::NotIn(field, values) => {
                    if values.is_empty() {
                        continue;
                    }
                    let marks: Vec<String> =
                        values.iter().map(|v| placeholder(&mut params, v)).collect();
                    clauses.push(format!(
                        "{} NOT IN ({})",
                        quote_ident(field),
                        marks.join(", ")
                    ));
                }
                Filter::AnyOf(field, values) => {
                    if values.is_empty() {
                        clauses.push("1 = 0".to_string());
                        continue;
                    }
                    let parts: Vec<String> = values
                        .iter()
                        .map(|v| {
                            let p = placeholder(&mut params, v);
                            format!("{} = {p}", quote_ident(field))
                        })
                        .collect();
                    clauses.push(format!("({})", parts.join(" OR ")));
                }
            }
        }

        let mut sql = format!("SELECT {columns} FROM {}", quote_ident(&self.table));
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_bare_select() {
        let (sql, params) = SelectQuery::new("posts").to_sql();
        assert_eq!(sql, "SELECT * FROM \"posts\"");
        assert!(params.is_empty());
    }

    #[test]
    fn renders_columns_and_equality() {
        let (sql, params) = SelectQuery::new("posts")
            .columns(&["id", "title"])
            .filter_eq("status", "active")
            .to_sql();
        assert_eq!(
            sql,
            "SELECT \"id\", \"title\" FROM \"posts\" WHERE \"status\" = ?1"
        );
        assert_eq!(params, vec![Value::Text("active".to_string())]);
    }

    #[test]
    fn renders_in_and_not_in() {
        let (sql, params) = SelectQuery::new("posts")
            .filter_not_in("id", vec![Value::Integer(1), Value::Integer(2)])
            .filter_in("author_id", vec![Value::Integer(3)])
            .to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM \"posts\" WHERE \"id\" NOT IN (?1, ?2) AND \"author_id\" IN (?3)"
        );
        assert_eq!(
            params,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn renders_or_group() {
        let (sql, params) = SelectQuery::new("posts")
            .filter_any_of(
                "status",
                vec![Value::Text("active".into()), Value::Text("pending".into())],
            )
            .filter_eq("author_id", 3)
            .to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM \"posts\" WHERE (\"status\" = ?1 OR \"status\" = ?2) AND \"author_id\" = ?3"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = SelectQuery::new("posts").filter_in("id", vec![]).to_sql();
        assert_eq!(sql, "SELECT * FROM \"posts\" WHERE 1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn empty_not_in_is_dropped() {
        let (sql, _) = SelectQuery::new("posts")
            .filter_not_in("id", vec![])
            .filter_eq("status", "active")
            .to_sql();
        assert_eq!(sql, "SELECT * FROM \"posts\" WHERE \"status\" = ?1");
    }

    #[test]
    fn renders_limit_and_offset() {
        let (sql, _) = SelectQuery::new("posts").limit(10).offset(20).to_sql();
        assert_eq!(sql, "SELECT * FROM \"posts\" LIMIT 10 OFFSET 20");

        let (sql, _) = SelectQuery::new("posts").offset(5).to_sql();
        assert_eq!(sql, "SELECT * FROM \"posts\" LIMIT -1 OFFSET 5");
    }

    #[test]
    fn escapes_quotes_in_identifiers() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
