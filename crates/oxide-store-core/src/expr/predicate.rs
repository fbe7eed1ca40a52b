//! Boolean predicates over the `value` column.

use crate::dialect::Dialect;

use super::expression::Expression;
use super::fragment::{Binding, Fragment, FragmentWriter, Wildcards};
use super::path::normalize_json_path;

/// Column every predicate applies to.
pub const VALUE_COLUMN: &str = "value";

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A boolean SQL condition.
///
/// Nodes carry no dialect; it is supplied when rendering so a predicate can
/// be built before the table it runs against is known.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    /// Always true, `(1)`.
    True,
    /// Always false, `(0)`.
    False,
    /// `value <op> operand`.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Right-hand side.
        operand: Expression,
    },
    /// `value like <pattern>`.
    Like {
        /// Wildcard placement.
        wildcards: Wildcards,
        /// Pattern body.
        operand: Expression,
    },
    /// The JSON document in `value` has something at `path`.
    JsonContainsPath {
        /// Normalized path.
        path: String,
    },
    /// `<value at path> <op> operand`.
    JsonCompare {
        /// Normalized path.
        path: String,
        /// Operator.
        op: CompareOp,
        /// Right-hand side.
        operand: Expression,
    },
    /// `<value at path> like <pattern>`.
    JsonLike {
        /// Normalized path.
        path: String,
        /// Wildcard placement.
        wildcards: Wildcards,
        /// Pattern body.
        operand: Expression,
    },
    /// Every operand holds. Empty is true.
    And(Vec<BoolExpr>),
    /// At least one operand holds. Empty is false.
    Or(Vec<BoolExpr>),
    /// Negation.
    Not(Box<BoolExpr>),
}

impl BoolExpr {
    /// Renders the predicate with literals escaped inline.
    #[must_use]
    pub fn sql(&self, dialect: Dialect) -> String {
        self.to_fragment(dialect, Binding::Inline).sql
    }

    /// Renders the predicate with the given literal binding.
    #[must_use]
    pub fn to_fragment(&self, dialect: Dialect, binding: Binding) -> Fragment {
        let mut writer = FragmentWriter::new(dialect, binding);
        self.write(&mut writer);
        writer.finish()
    }

    fn write(&self, w: &mut FragmentWriter) {
        match self {
            Self::True => w.push_str("(1)"),
            Self::False => w.push_str("(0)"),
            Self::Compare { op, operand } => {
                w.push_str(VALUE_COLUMN);
                w.push_str(" ");
                w.push_str(op.as_str());
                w.push_str(" ");
                w.push_expression(operand);
            }
            Self::Like { wildcards, operand } => {
                w.push_str(VALUE_COLUMN);
                w.push_str(" like ");
                w.push_pattern(operand, *wildcards);
            }
            Self::JsonContainsPath { path } => {
                let dialect = w.dialect();
                let sql = dialect.json_contains_path(VALUE_COLUMN, &dialect.quote_string(path));
                w.push_str(&sql);
            }
            Self::JsonCompare { path, op, operand } => {
                let dialect = w.dialect();
                let extracted = dialect.json_extract(VALUE_COLUMN, &dialect.quote_string(path));
                // Numeric literals compare numerically, strings compare as text.
                let left = if operand.is_numeric() {
                    dialect.numeric_cast(&extracted)
                } else {
                    extracted
                };
                w.push_str(&left);
                w.push_str(" ");
                w.push_str(op.as_str());
                w.push_str(" ");
                w.push_expression(operand);
            }
            Self::JsonLike {
                path,
                wildcards,
                operand,
            } => {
                let dialect = w.dialect();
                let extracted = dialect.json_extract(VALUE_COLUMN, &dialect.quote_string(path));
                w.push_str(&extracted);
                w.push_str(" like ");
                w.push_pattern(operand, *wildcards);
            }
            Self::And(operands) => write_joined(w, operands, " and ", "(1)"),
            Self::Or(operands) => write_joined(w, operands, " or ", "(0)"),
            Self::Not(inner) => {
                w.push_str("not (");
                inner.write(w);
                w.push_str(")");
            }
        }
    }
}

fn write_joined(w: &mut FragmentWriter, operands: &[BoolExpr], keyword: &str, empty: &str) {
    if operands.is_empty() {
        w.push_str(empty);
        return;
    }
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            w.push_str(keyword);
        }
        w.push_str("(");
        operand.write(w);
        w.push_str(")");
    }
}

/// `value = e`
#[must_use]
pub fn eq(e: impl Into<Expression>) -> BoolExpr {
    compare(CompareOp::Eq, e)
}

/// `value != e`
#[must_use]
pub fn ne(e: impl Into<Expression>) -> BoolExpr {
    compare(CompareOp::Ne, e)
}

/// `value > e`
#[must_use]
pub fn gt(e: impl Into<Expression>) -> BoolExpr {
    compare(CompareOp::Gt, e)
}

/// `value >= e`
#[must_use]
pub fn gte(e: impl Into<Expression>) -> BoolExpr {
    compare(CompareOp::Ge, e)
}

/// `value < e`
#[must_use]
pub fn lt(e: impl Into<Expression>) -> BoolExpr {
    compare(CompareOp::Lt, e)
}

/// `value <= e`
#[must_use]
pub fn lte(e: impl Into<Expression>) -> BoolExpr {
    compare(CompareOp::Le, e)
}

fn compare(op: CompareOp, e: impl Into<Expression>) -> BoolExpr {
    BoolExpr::Compare {
        op,
        operand: e.into(),
    }
}

/// `value like '%e%'`
#[must_use]
pub fn contains(e: impl Into<Expression>) -> BoolExpr {
    like(Wildcards::Both, e)
}

/// `value like 'e%'`
#[must_use]
pub fn starts_with(e: impl Into<Expression>) -> BoolExpr {
    like(Wildcards::Trailing, e)
}

/// `value like '%e'`
#[must_use]
pub fn ends_with(e: impl Into<Expression>) -> BoolExpr {
    like(Wildcards::Leading, e)
}

fn like(wildcards: Wildcards, e: impl Into<Expression>) -> BoolExpr {
    BoolExpr::Like {
        wildcards,
        operand: e.into(),
    }
}

/// The JSON document in `value` has a value at `path`.
#[must_use]
pub fn json_contains_path(path: &str) -> BoolExpr {
    BoolExpr::JsonContainsPath {
        path: normalize_json_path(path),
    }
}

/// The value at `path` equals `e`.
#[must_use]
pub fn json_at_eq(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_compare(path, CompareOp::Eq, e)
}

/// The value at `path` is less than `e`.
#[must_use]
pub fn json_at_lt(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_compare(path, CompareOp::Lt, e)
}

/// The value at `path` is less than or equal to `e`.
#[must_use]
pub fn json_at_le(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_compare(path, CompareOp::Le, e)
}

/// The value at `path` is greater than `e`.
#[must_use]
pub fn json_at_gt(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_compare(path, CompareOp::Gt, e)
}

/// The value at `path` is greater than or equal to `e`.
#[must_use]
pub fn json_at_ge(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_compare(path, CompareOp::Ge, e)
}

fn json_compare(path: &str, op: CompareOp, e: impl Into<Expression>) -> BoolExpr {
    BoolExpr::JsonCompare {
        path: normalize_json_path(path),
        op,
        operand: e.into(),
    }
}

/// The value at `path` contains `e`.
#[must_use]
pub fn json_at_contains(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_like(path, Wildcards::Both, e)
}

/// The value at `path` starts with `e`.
#[must_use]
pub fn json_at_starts_with(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_like(path, Wildcards::Trailing, e)
}

/// The value at `path` ends with `e`.
#[must_use]
pub fn json_at_ends_with(path: &str, e: impl Into<Expression>) -> BoolExpr {
    json_like(path, Wildcards::Leading, e)
}

fn json_like(path: &str, wildcards: Wildcards, e: impl Into<Expression>) -> BoolExpr {
    BoolExpr::JsonLike {
        path: normalize_json_path(path),
        wildcards,
        operand: e.into(),
    }
}

/// Conjunction of `operands`.
#[must_use]
pub fn and(operands: impl IntoIterator<Item = BoolExpr>) -> BoolExpr {
    BoolExpr::And(operands.into_iter().collect())
}

/// Disjunction of `operands`.
#[must_use]
pub fn or(operands: impl IntoIterator<Item = BoolExpr>) -> BoolExpr {
    BoolExpr::Or(operands.into_iter().collect())
}

/// Negation of `e`.
#[must_use]
pub fn not(e: BoolExpr) -> BoolExpr {
    BoolExpr::Not(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_plain_comparisons() {
        let d = Dialect::Sqlite;
        assert_eq!(eq("a").sql(d), "value = 'a'");
        assert_eq!(ne(3).sql(d), "value != 3");
        assert_eq!(gt(1.5).sql(d), "value > 1.5");
        assert_eq!(gte(2).sql(d), "value >= 2");
        assert_eq!(lt(2).sql(d), "value < 2");
        assert_eq!(lte(2).sql(d), "value <= 2");
    }

    #[test]
    fn test_substring_predicates() {
        let d = Dialect::MySql;
        assert_eq!(contains("ab").sql(d), "value like '%ab%'");
        assert_eq!(starts_with("ab").sql(d), "value like 'ab%'");
        assert_eq!(ends_with("ab").sql(d), "value like '%ab'");
        assert_eq!(contains("it's").sql(d), "value like '%it\\'s%'");
        assert_eq!(contains("it's").sql(Dialect::Sqlite), "value like '%it''s%'");
    }

    #[test]
    fn test_json_spelling() {
        let p = json_at_eq("$.a.b", "x");
        assert_eq!(p.sql(Dialect::Sqlite), "json_extract(value,'$.a.b') = 'x'");
        assert_eq!(
            p.sql(Dialect::MySql),
            "json_unquote(json_extract(value,'$.a.b')) = 'x'"
        );
    }

    #[test]
    fn test_json_paths_normalized() {
        assert_eq!(json_at_eq("a/b", "x"), json_at_eq("$.a.b", "x"));
        assert_eq!(json_at_eq(".a.b", "x"), json_at_eq("a.b", "x"));
    }

    #[test]
    fn test_json_contains_path() {
        let p = json_contains_path("a.b");
        assert_eq!(p.sql(Dialect::Sqlite), "json_type(value,'$.a.b') is not null");
        assert_eq!(
            p.sql(Dialect::MySql),
            "json_contains_path(value,'one','$.a.b')"
        );
    }

    #[test]
    fn test_json_numeric_comparisons_cast() {
        assert_eq!(
            json_at_lt("age", 30).sql(Dialect::Sqlite),
            "cast(json_extract(value,'$.age') as real) < 30"
        );
        assert_eq!(
            json_at_ge("age", 30).sql(Dialect::MySql),
            "cast(json_unquote(json_extract(value,'$.age')) as decimal(65,30)) >= 30"
        );
        // String literals keep the text comparison.
        assert_eq!(
            json_at_gt("date", "2020-01-01").sql(Dialect::Sqlite),
            "json_extract(value,'$.date') > '2020-01-01'"
        );
    }

    #[test]
    fn test_json_like() {
        let d = Dialect::Sqlite;
        assert_eq!(
            json_at_contains("name", "oh").sql(d),
            "json_extract(value,'$.name') like '%oh%'"
        );
        assert_eq!(
            json_at_starts_with("name", "J").sql(d),
            "json_extract(value,'$.name') like 'J%'"
        );
        assert_eq!(
            json_at_ends_with("name", "n").sql(Dialect::MySql),
            "json_unquote(json_extract(value,'$.name')) like '%n'"
        );
    }

    #[test]
    fn test_combinators() {
        let d = Dialect::Sqlite;
        assert_eq!(
            and([eq("X"), starts_with("Y")]).sql(d),
            "(value = 'X') and (value like 'Y%')"
        );
        assert_eq!(
            or([eq(1), and([gt(5), lt(10)])]).sql(d),
            "(value = 1) or ((value > 5) and (value < 10))"
        );
        assert_eq!(not(eq("a")).sql(d), "not (value = 'a')");
        assert_eq!(and([]).sql(d), "(1)");
        assert_eq!(or([]).sql(d), "(0)");
        assert_eq!(BoolExpr::True.sql(d), "(1)");
        assert_eq!(BoolExpr::False.sql(d), "(0)");
    }

    #[test]
    fn test_parameter_binding() {
        let p = and([
            eq("it's"),
            json_at_eq("a.b", 2),
            contains("x"),
            eq(Expression::field("name")),
        ]);
        let (sql, params) = p.to_fragment(Dialect::Sqlite, Binding::Parameters).into_parts();
        assert_eq!(
            sql,
            "(value = ?) and (cast(json_extract(value,'$.a.b') as real) = ?) and (value like ?) and (value = \"name\")"
        );
        assert_eq!(
            params,
            vec![
                SqlValue::Text("it's".into()),
                SqlValue::Int(2),
                SqlValue::Text("%x%".into()),
            ]
        );
    }

    #[test]
    fn test_path_with_quote_is_escaped() {
        assert_eq!(
            json_at_eq("a'b", "x").sql(Dialect::Sqlite),
            "json_extract(value,'$.a''b') = 'x'"
        );
    }
}
