//! AST types for parsed filter strings

use serde::Serialize;
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Resolve an operator word or symbolic alias.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EQ" | "==" => Some(CompareOp::Eq),
            "NE" | "!=" => Some(CompareOp::Ne),
            "LT" | "<" => Some(CompareOp::Lt),
            "LE" | "<=" => Some(CompareOp::Le),
            "GT" | ">" => Some(CompareOp::Gt),
            "GE" | ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "EQ",
            CompareOp::Ne => "NE",
            CompareOp::Lt => "LT",
            CompareOp::Le => "LE",
            CompareOp::Gt => "GT",
            CompareOp::Ge => "GE",
        }
    }

    /// Apply the operator to an ordering result.
    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship quantifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregator {
    /// At least one related row matches
    Any,
    /// No related row violates the sub-expression
    All,
    /// The to-one relation is present and matches
    Has,
}

impl Aggregator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ANY" => Some(Aggregator::Any),
            "ALL" => Some(Aggregator::All),
            "HAS" => Some(Aggregator::Has),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregator::Any => "ANY",
            Aggregator::All => "ALL",
            Aggregator::Has => "HAS",
        }
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `field OP "constant"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleFilter<'a> {
    pub field: &'a str,
    pub op: CompareOp,
    pub constant: &'a str,
}

/// `AGG(relation, sub_expr) OP "constant"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationFilter<'a> {
    pub aggregator: Aggregator,
    pub relation: &'a str,
    pub sub_expr: Box<FilterNode<'a>>,
    pub op: CompareOp,
    pub constant: &'a str,
}

/// A parsed filter expression. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum FilterNode<'a> {
    And {
        left: Box<FilterNode<'a>>,
        right: Box<FilterNode<'a>>,
    },
    Or {
        left: Box<FilterNode<'a>>,
        right: Box<FilterNode<'a>>,
    },
    Simple(SimpleFilter<'a>),
    Aggregation(AggregationFilter<'a>),
}

impl<'a> FilterNode<'a> {
    pub fn and(left: FilterNode<'a>, right: FilterNode<'a>) -> Self {
        FilterNode::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: FilterNode<'a>, right: FilterNode<'a>) -> Self {
        FilterNode::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn simple(field: &'a str, op: CompareOp, constant: &'a str) -> Self {
        FilterNode::Simple(SimpleFilter {
            field,
            op,
            constant,
        })
    }

    pub fn aggregation(
        aggregator: Aggregator,
        relation: &'a str,
        sub_expr: FilterNode<'a>,
        op: CompareOp,
        constant: &'a str,
    ) -> Self {
        FilterNode::Aggregation(AggregationFilter {
            aggregator,
            relation,
            sub_expr: Box::new(sub_expr),
            op,
            constant,
        })
    }
}

impl fmt::Display for FilterNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::And { left, right } => write!(f, "({} AND {})", left, right),
            FilterNode::Or { left, right } => write!(f, "({} OR {})", left, right),
            FilterNode::Simple(s) => write!(f, "{} {} \"{}\"", s.field, s.op, s.constant),
            FilterNode::Aggregation(a) => write!(
                f,
                "{}({}, {}) {} \"{}\"",
                a.aggregator, a.relation, a.sub_expr, a.op, a.constant
            ),
        }
    }
}
