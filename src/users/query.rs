use crate::error::ApiError;

/// Builds the filtered, paginated user SELECT as an ordered list of
/// equality predicates plus an owned parameter list. Values are only ever
/// bound positionally, never written into the SQL text.
#[derive(Debug, Default)]
pub struct UserQuery {
    clauses: Vec<&'static str>,
    params: Vec<String>,
}

/// Fixed predicate order; filters always bind in this sequence.
const FILTER_COLUMNS: [&str; 6] = [
    "passport_number",
    "pass_serie",
    "surname",
    "name",
    "patronymic",
    "address",
];

impl UserQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `AND <column> = $n` when the value is present and non-empty.
    /// Columns outside the known filter set are ignored.
    pub fn filter(mut self, column: &'static str, value: Option<&str>) -> Self {
        if !FILTER_COLUMNS.contains(&column) {
            return self;
        }
        match value {
            Some(v) if !v.is_empty() => {
                self.clauses.push(column);
                self.params.push(v.to_string());
                self
            }
            _ => self,
        }
    }

    /// Finalizes the query with `LIMIT/OFFSET`. Page and page size must be
    /// positive; rejected here, before anything reaches the database.
    pub fn paginate(self, page: i64, page_size: i64) -> Result<BuiltQuery, ApiError> {
        if page <= 0 || page_size <= 0 {
            return Err(ApiError::validation(
                "page and page_size must be positive integers",
            ));
        }

        let mut sql = String::from(
            "SELECT id, passport_number, pass_serie, surname, name, patronymic, address \
             FROM users WHERE 1=1",
        );
        for (i, column) in self.clauses.iter().enumerate() {
            sql.push_str(&format!(" AND {} = ${}", column, i + 1));
        }
        let n = self.clauses.len();
        sql.push_str(&format!(" LIMIT ${} OFFSET ${}", n + 1, n + 2));

        Ok(BuiltQuery {
            sql,
            params: self.params,
            limit: page_size,
            offset: (page - 1) * page_size,
        })
    }
}

/// A ready-to-bind query: SQL with positional placeholders and the values
/// to bind, in order, followed by limit and offset.
#[derive(Debug)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<String>,
    pub limit: i64,
    pub offset: i64,
}

impl BuiltQuery {
    /// Total number of bind parameters: one per filter plus limit and offset.
    pub fn param_count(&self) -> usize {
        self.params.len() + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(filters: &[(&'static str, &str)], page: i64, size: i64) -> BuiltQuery {
        let mut q = UserQuery::new();
        for (col, val) in filters {
            q = q.filter(col, Some(val));
        }
        q.paginate(page, size).expect("valid paging")
    }

    #[test]
    fn no_filters_binds_only_limit_and_offset() {
        let q = build(&[], 1, 10);
        assert_eq!(q.param_count(), 2);
        assert_eq!(
            q.sql,
            "SELECT id, passport_number, pass_serie, surname, name, patronymic, address \
             FROM users WHERE 1=1 LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn param_count_is_filters_plus_two() {
        let q = build(&[("surname", "Ivanov"), ("name", "Ivan")], 1, 10);
        assert_eq!(q.param_count(), 4);
        assert_eq!(q.params, vec!["Ivanov", "Ivan"]);
        assert!(q.sql.contains("AND surname = $1"));
        assert!(q.sql.contains("AND name = $2"));
        assert!(q.sql.ends_with("LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn values_are_never_interpolated() {
        let q = build(&[("address", "'; DROP TABLE users; --")], 1, 10);
        assert!(!q.sql.contains("DROP TABLE"));
        assert_eq!(q.params, vec!["'; DROP TABLE users; --"]);
    }

    #[test]
    fn all_six_filters_bind_in_declared_order() {
        let q = build(
            &[
                ("passport_number", "567890"),
                ("pass_serie", "1234"),
                ("surname", "Ivanov"),
                ("name", "Ivan"),
                ("patronymic", "Ivanovich"),
                ("address", "Moscow"),
            ],
            2,
            5,
        );
        assert_eq!(q.param_count(), 8);
        assert!(q.sql.contains("AND passport_number = $1"));
        assert!(q.sql.contains("AND address = $6"));
        assert!(q.sql.ends_with("LIMIT $7 OFFSET $8"));
    }

    #[test]
    fn empty_filter_values_are_skipped() {
        let q = UserQuery::new()
            .filter("surname", Some(""))
            .filter("name", None)
            .paginate(1, 10)
            .unwrap();
        assert_eq!(q.param_count(), 2);
    }

    #[test]
    fn offset_math() {
        assert_eq!(build(&[], 1, 10).offset, 0);
        assert_eq!(build(&[], 3, 10).offset, 20);
        assert_eq!(build(&[], 2, 25).offset, 25);
    }

    #[test]
    fn non_positive_paging_is_rejected() {
        assert!(UserQuery::new().paginate(0, 10).is_err());
        assert!(UserQuery::new().paginate(1, 0).is_err());
        assert!(UserQuery::new().paginate(-1, -5).is_err());
    }
}
