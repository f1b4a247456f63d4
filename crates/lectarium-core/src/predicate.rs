//! Composable predicates
//!
//! The compiler's output. Collections evaluate or translate a `Predicate`;
//! callers only combine them with [`Predicate::and`], [`Predicate::or`] and
//! `!` (or the `&`/`|` operators).

use serde::Serialize;
use std::fmt;
use std::ops;

use crate::parser::CompareOp;
use crate::value::Value;

/// Left-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// A field of the entity being filtered
    Field(String),
    /// Whether at least one row reached through `relation` satisfies
    /// `condition`. Evaluates to a boolean, never null.
    Exists {
        relation: String,
        condition: Box<Predicate>,
    },
}

/// `operand op value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub operand: Operand,
    pub op: CompareOp,
    pub value: Value,
}

/// A boolean condition over one entity type.
///
/// Evaluation follows SQL three-valued logic: comparisons involving null are
/// unknown, and only rows where the predicate is definitely true are selected.
/// The one exception is equality against the null value, which tests for
/// null (`EQ "NULL"` is `IS NULL`, `NE "NULL"` is `IS NOT NULL`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Always,
    Compare(Comparison),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// The identity predicate; matches every entity.
    pub fn always() -> Self {
        Predicate::Always
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    pub fn compare(operand: Operand, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare(Comparison {
            operand,
            op,
            value: value.into(),
        })
    }

    pub fn field(name: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::compare(Operand::Field(name.into()), op, value)
    }

    pub fn exists(relation: impl Into<String>, condition: Predicate) -> Operand {
        Operand::Exists {
            relation: relation.into(),
            condition: Box::new(condition),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Always, p) | (p, Predicate::Always) => p,
            (a, b) => Predicate::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Conjunction of every predicate; `Always` for an empty input.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        predicates
            .into_iter()
            .fold(Predicate::Always, Predicate::and)
    }
}

impl ops::BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl ops::BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("TRUE"),
            Predicate::Compare(c) => {
                match &c.operand {
                    Operand::Field(name) => f.write_str(name)?,
                    Operand::Exists {
                        relation,
                        condition,
                    } => write!(f, "EXISTS {}({})", relation, condition)?,
                }
                if c.value.is_null() {
                    write!(f, " {} NULL", c.op)
                } else {
                    write!(f, " {} {:?}", c.op, c.value.to_string())
                }
            }
            Predicate::And(a, b) => write!(f, "({} AND {})", a, b),
            Predicate::Or(a, b) => write!(f, "({} OR {})", a, b),
            Predicate::Not(p) => write!(f, "NOT {}", p),
        }
    }
}
