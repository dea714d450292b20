use std::ops::Add;

use crate::Operator;
use crate::expr::{AttributeReference, BinaryOperator, Expr, UnresolvedAttribute};

pub fn binary_expr(left: Expr, op: Operator, right: Expr) -> Expr {
    Expr::BinaryOperator(BinaryOperator::new(Box::new(left), op, Box::new(right)))
}

pub fn and(left: Expr, right: Expr) -> Expr {
    binary_expr(left, Operator::And, right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    binary_expr(left, Operator::Or, right)
}

pub fn lt(left: Expr, right: Expr) -> Expr {
    binary_expr(left, Operator::Lt, right)
}

pub fn gt(left: Expr, right: Expr) -> Expr {
    binary_expr(left, Operator::Gt, right)
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    binary_expr(left, Operator::Eq, right)
}

/// An unresolved column reference, `col("a")` or `col("t.a")`.
pub fn col(name: &str) -> Expr {
    match name.split_once('.') {
        Some((qualifier, name)) => {
            Expr::UnresolvedAttribute(UnresolvedAttribute::new_qualified(qualifier, name))
        }
        None => Expr::UnresolvedAttribute(UnresolvedAttribute::new(name)),
    }
}

pub fn attr_ref(attr: AttributeReference) -> Expr {
    Expr::AttributeReference(attr)
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        binary_expr(self, Operator::Plus, rhs)
    }
}
