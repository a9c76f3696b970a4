//! Select terms and the lazy row scan.

use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use gridtabledb_core::Value;

use crate::common::{Error, PageId, Result};
use crate::storage::{DiskManager, Row};

/// Comparison of a select term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Operator {
    /// Compare a row's field with a term's value.
    ///
    /// A null field satisfies only `!=`.
    pub fn evaluate(&self, field: Option<&Value>, value: &Value) -> bool {
        let field = match field {
            Some(f) => f,
            None => return *self == Operator::Ne,
        };
        match self {
            Operator::Eq => field == value,
            Operator::Ne => field != value,
            Operator::Lt => field < value,
            Operator::Gt => field > value,
            Operator::Le => field <= value,
            Operator::Ge => field >= value,
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Le),
            ">=" => Ok(Operator::Ge),
            other => Err(Error::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// How the terms of one select are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            _ => Err(Error::InvalidCombinator(s.to_string())),
        }
    }
}

/// One condition of a select: `table.column op value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectTerm {
    pub table: String,
    pub column: String,
    pub op: Operator,
    pub value: Value,
}

impl SelectTerm {
    pub fn new(table: impl Into<String>, column: impl Into<String>, op: Operator, value: Value) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            op,
            value,
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.op.evaluate(row.get(&self.column), &self.value)
    }
}

impl fmt::Display for SelectTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {} {}", self.table, self.column, self.op, self.value)
    }
}

/// Whether `row` satisfies `terms` joined by `combinator`.
///
/// No terms under AND matches everything; under OR, nothing.
pub fn matches(terms: &[SelectTerm], combinator: Combinator, row: &Row) -> bool {
    match combinator {
        Combinator::And => terms.iter().all(|t| t.matches(row)),
        Combinator::Or => terms.iter().any(|t| t.matches(row)),
    }
}

/// Forward-only scan over the rows matching a select, in page order.
///
/// Pages are loaded one at a time as the iterator advances. After the first
/// error the iterator is exhausted.
pub struct SelectIter<'a> {
    disk: &'a DiskManager,
    pages: std::vec::IntoIter<PageId>,
    rows: std::vec::IntoIter<Row>,
    terms: Vec<SelectTerm>,
    combinator: Combinator,
    done: bool,
}

impl<'a> SelectIter<'a> {
    pub(crate) fn new(
        disk: &'a DiskManager,
        pages: Vec<PageId>,
        terms: Vec<SelectTerm>,
        combinator: Combinator,
    ) -> Self {
        Self {
            disk,
            pages: pages.into_iter(),
            rows: Vec::new().into_iter(),
            terms,
            combinator,
            done: false,
        }
    }
}

impl Iterator for SelectIter<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some(row) = self.rows.next() {
                if matches(&self.terms, self.combinator, &row) {
                    return Some(Ok(row));
                }
                continue;
            }

            match self.pages.next() {
                Some(page_id) => match self.disk.read_page(page_id) {
                    Ok(page) => self.rows = page.into_rows().into_iter(),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                None => self.done = true,
            }
        }
        None
    }
}

impl FusedIterator for SelectIter<'_> {}
