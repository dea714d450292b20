use std::any::Any;

use crate::expr::type_constraint::TypeConstraint;
use crate::expr::{Expr, ScalarFunction};
use crate::types::{AbstractDataType, DataType};
use crate::{AnalysisError, Result};

fn expect_args(name: &str, args: &[Expr], arity: usize) -> Result<()> {
    if args.len() != arity {
        Err(AnalysisError::analysis(format!(
            "{} requires {} argument(s), found {}",
            name,
            arity,
            args.len()
        )))
    } else {
        Ok(())
    }
}

fn unpack_one(args: Vec<Expr>) -> Box<Expr> {
    let mut iter = args.into_iter();
    match (iter.next(), iter.next()) {
        (Some(first), None) => Box::new(first),
        _ => panic!("args count not match"),
    }
}

#[derive(Debug, Clone)]
pub struct Length {
    pub child: Box<Expr>,
}

impl Length {
    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        expect_args("length", &args, 1)?;
        Ok(Expr::ScalarFunction(Box::new(Length { child: unpack_one(args) })))
    }
}

impl ScalarFunction for Length {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "length"
    }

    fn data_type(&self) -> &DataType {
        DataType::int_type()
    }

    fn nullable(&self) -> bool {
        self.child.nullable()
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.child]
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameTypeAs(DataType::String, vec![self.child.as_ref().clone()])
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        Box::new(Length { child: unpack_one(args) })
    }
}

#[derive(Debug, Clone)]
pub struct Substring {
    pub str: Box<Expr>,
    pub pos: Box<Expr>,
    pub len: Option<Box<Expr>>,
}

impl Substring {
    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        if args.len() != 2 && args.len() != 3 {
            return Err(AnalysisError::analysis(format!(
                "substring requires 2 or 3 arguments, found {}",
                args.len()
            )));
        }
        let mut iter = args.into_iter();
        let str = Box::new(iter.next().unwrap());
        let pos = Box::new(iter.next().unwrap());
        let len = iter.next().map(Box::new);
        Ok(Expr::ScalarFunction(Box::new(Substring { str, pos, len })))
    }
}

impl ScalarFunction for Substring {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "substring"
    }

    fn data_type(&self) -> &DataType {
        DataType::string_type()
    }

    fn nullable(&self) -> bool {
        self.args().iter().any(|arg| arg.nullable())
    }

    fn args(&self) -> Vec<&Expr> {
        let mut args = vec![self.str.as_ref(), self.pos.as_ref()];
        if let Some(len) = &self.len {
            args.push(len);
        }
        args
    }

    fn type_constraint(&self) -> TypeConstraint {
        let positions: Vec<Expr> = self
            .args()
            .into_iter()
            .skip(1)
            .cloned()
            .collect();
        TypeConstraint::SameTypeAs(DataType::String, vec![self.str.as_ref().clone()])
            .concat(TypeConstraint::SameSubtypesOf(AbstractDataType::Integral, positions))
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        let mut iter = args.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(str), Some(pos), len) => {
                Box::new(Substring { str: Box::new(str), pos: Box::new(pos), len: len.map(Box::new) })
            }
            _ => panic!("args count not match"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Concat {
    pub children: Vec<Expr>,
}

impl Concat {
    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        if args.is_empty() {
            return Err(AnalysisError::analysis("concat requires at least 1 argument"));
        }
        Ok(Expr::ScalarFunction(Box::new(Concat { children: args })))
    }
}

impl ScalarFunction for Concat {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "concat"
    }

    fn data_type(&self) -> &DataType {
        DataType::string_type()
    }

    fn args(&self) -> Vec<&Expr> {
        self.children.iter().collect()
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameTypeAs(DataType::String, self.children.clone())
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        Box::new(Concat { children: args })
    }
}

#[derive(Debug, Clone)]
pub struct Upper {
    pub child: Box<Expr>,
}

impl Upper {
    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        expect_args("upper", &args, 1)?;
        Ok(Expr::ScalarFunction(Box::new(Upper { child: unpack_one(args) })))
    }
}

impl ScalarFunction for Upper {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "upper"
    }

    fn data_type(&self) -> &DataType {
        DataType::string_type()
    }

    fn nullable(&self) -> bool {
        self.child.nullable()
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.child]
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameTypeAs(DataType::String, vec![self.child.as_ref().clone()])
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        Box::new(Upper { child: unpack_one(args) })
    }
}

#[derive(Debug, Clone)]
pub struct Lower {
    pub child: Box<Expr>,
}

impl Lower {
    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        expect_args("lower", &args, 1)?;
        Ok(Expr::ScalarFunction(Box::new(Lower { child: unpack_one(args) })))
    }
}

impl ScalarFunction for Lower {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "lower"
    }

    fn data_type(&self) -> &DataType {
        DataType::string_type()
    }

    fn nullable(&self) -> bool {
        self.child.nullable()
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.child]
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameTypeAs(DataType::String, vec![self.child.as_ref().clone()])
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        Box::new(Lower { child: unpack_one(args) })
    }
}

#[derive(Debug, Clone)]
pub struct Abs {
    pub child: Box<Expr>,
}

impl Abs {
    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        expect_args("abs", &args, 1)?;
        Ok(Expr::ScalarFunction(Box::new(Abs { child: unpack_one(args) })))
    }
}

impl ScalarFunction for Abs {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "abs"
    }

    fn data_type(&self) -> &DataType {
        self.child.data_type()
    }

    fn nullable(&self) -> bool {
        self.child.nullable()
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.child]
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameSubtypesOf(
            AbstractDataType::Numeric,
            vec![self.child.as_ref().clone()],
        )
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        Box::new(Abs { child: unpack_one(args) })
    }
}

#[derive(Debug, Clone)]
pub struct Coalesce {
    pub children: Vec<Expr>,
}

impl Coalesce {
    pub fn new(children: Vec<Expr>) -> Self {
        Coalesce { children }
    }

    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        if args.is_empty() {
            return Err(AnalysisError::analysis("coalesce requires at least 1 argument"));
        }
        Ok(Expr::ScalarFunction(Box::new(Coalesce { children: args })))
    }
}

impl ScalarFunction for Coalesce {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "coalesce"
    }

    fn data_type(&self) -> &DataType {
        self.children[0].data_type()
    }

    fn nullable(&self) -> bool {
        self.children.iter().all(|c| c.nullable())
    }

    fn args(&self) -> Vec<&Expr> {
        self.children.iter().collect()
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameType(self.children.clone())
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        Box::new(Coalesce { children: args })
    }
}

#[derive(Debug, Clone)]
pub struct If {
    pub predicate: Box<Expr>,
    pub true_value: Box<Expr>,
    pub false_value: Box<Expr>,
}

impl If {
    pub fn new(predicate: Box<Expr>, true_value: Box<Expr>, false_value: Box<Expr>) -> Self {
        Self { predicate, true_value, false_value }
    }

    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        expect_args("if", &args, 3)?;
        let mut iter = args.into_iter();
        Ok(Expr::ScalarFunction(Box::new(If::new(
            Box::new(iter.next().unwrap()),
            Box::new(iter.next().unwrap()),
            Box::new(iter.next().unwrap()),
        ))))
    }
}

impl ScalarFunction for If {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "if"
    }

    fn data_type(&self) -> &DataType {
        self.true_value.data_type()
    }

    fn nullable(&self) -> bool {
        self.true_value.nullable() || self.false_value.nullable()
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.predicate, &self.true_value, &self.false_value]
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameTypeAs(DataType::Boolean, vec![self.predicate.as_ref().clone()])
            .concat(TypeConstraint::SameType(vec![
                self.true_value.as_ref().clone(),
                self.false_value.as_ref().clone(),
            ]))
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        let mut iter = args.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(first), Some(second), Some(third)) => {
                Box::new(If::new(Box::new(first), Box::new(second), Box::new(third)))
            }
            _ => panic!("args count not match"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateFormat {
    pub timestamp: Box<Expr>,
    pub format: Box<Expr>,
}

impl DateFormat {
    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        expect_args("date_format", &args, 2)?;
        let mut iter = args.into_iter();
        Ok(Expr::ScalarFunction(Box::new(DateFormat {
            timestamp: Box::new(iter.next().unwrap()),
            format: Box::new(iter.next().unwrap()),
        })))
    }
}

impl ScalarFunction for DateFormat {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "date_format"
    }

    fn data_type(&self) -> &DataType {
        DataType::string_type()
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.timestamp, &self.format]
    }

    // The format must be a constant; a per-row format string has no sane
    // compilation strategy downstream.
    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameTypeAs(DataType::Timestamp, vec![self.timestamp.as_ref().clone()])
            .concat(
                TypeConstraint::Foldable(vec![self.format.as_ref().clone()]).and_then(|coerced| {
                    TypeConstraint::SameTypeAs(DataType::String, coerced)
                }),
            )
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction> {
        let mut iter = args.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(timestamp), Some(format), None) => {
                Box::new(DateFormat { timestamp: Box::new(timestamp), format: Box::new(format) })
            }
            _ => panic!("args count not match"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_args_arity() {
        assert!(Length::from_args(vec![Expr::string_lit("a")]).is_ok());
        assert!(Length::from_args(vec![]).is_err());
        assert!(Substring::from_args(vec![Expr::string_lit("a"), Expr::int_lit(1)]).is_ok());
        assert!(Substring::from_args(vec![Expr::string_lit("a")]).is_err());
    }

    #[test]
    fn test_if_constraint_coerces_branches() {
        let expr = If::from_args(vec![
            Expr::boolean_lit(true),
            Expr::int_lit(1),
            Expr::long_lit(2),
        ])
        .unwrap();
        let coerced = expr.type_constraint().evaluate().unwrap();
        assert_eq!(coerced[1], Expr::int_lit(1).cast(DataType::Int64));
        assert_eq!(coerced[2], Expr::long_lit(2));
    }

    #[test]
    fn test_date_format_requires_constant_format() {
        let expr = DateFormat::from_args(vec![
            Expr::string_lit("2024-01-01 00:00:00").cast(DataType::Timestamp),
            crate::expr::col("fmt"),
        ])
        .unwrap();
        assert!(expr.type_constraint().evaluate().is_err());
    }
}
