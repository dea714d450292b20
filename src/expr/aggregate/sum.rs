use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;

use crate::expr::aggregate::AggregateFunction;
use crate::expr::functions::{Coalesce, If};
use crate::expr::type_constraint::TypeConstraint;
use crate::expr::{AttributeReference, Expr};
use crate::types::{AbstractDataType, DataType};
use crate::{AnalysisError, Result};

pub struct Sum {
    child: Box<Expr>,
    result_type: DataType,
    sum: Mutex<Option<AttributeReference>>,
    input_agg_attrs: Mutex<Vec<AttributeReference>>,
}

impl Sum {
    pub fn new(child: Box<Expr>) -> Self {
        let result_type = match child.data_type() {
            t if t.is_integral_type() => DataType::Int64,
            _ => DataType::Float64,
        };
        Self { child, result_type, sum: Mutex::new(None), input_agg_attrs: Mutex::new(vec![]) }
    }

    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        if args.len() != 1 {
            return Err(AnalysisError::analysis(format!(
                "sum requires 1 argument, found {}",
                args.len()
            )));
        }
        let child = args.into_iter().next().unwrap();
        Ok(Expr::AggregateFunction(Box::new(Sum::new(Box::new(child)))))
    }

    fn sum_attr(&self) -> AttributeReference {
        let mut guard = self.sum.lock().unwrap();
        if guard.is_none() {
            *guard = Some(AttributeReference::new("sum", self.result_type.clone()));
        }
        guard.as_ref().unwrap().clone()
    }

    fn input_agg_attrs(&self) -> Vec<AttributeReference> {
        let mut guard = self.input_agg_attrs.lock().unwrap();
        if guard.is_empty() {
            *guard = vec![self.sum_attr().new_instance()];
        }
        guard.clone()
    }

    fn sum(&self) -> Expr {
        Expr::AttributeReference(self.sum_attr())
    }

    fn zero(&self) -> Expr {
        Expr::long_lit(0).cast(self.result_type.clone())
    }

    fn child_cast(&self) -> Expr {
        self.child.as_ref().clone().cast(self.result_type.clone())
    }
}

impl Debug for Sum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sum")
            .field("child", &self.child)
            .field("result_type", &self.result_type)
            .finish()
    }
}

impl Clone for Sum {
    fn clone(&self) -> Self {
        Self {
            child: self.child.clone(),
            result_type: self.result_type.clone(),
            sum: Mutex::new(self.sum.lock().unwrap().clone()),
            input_agg_attrs: Mutex::new(self.input_agg_attrs.lock().unwrap().clone()),
        }
    }
}

impl AggregateFunction for Sum {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "sum"
    }

    fn data_type(&self) -> &DataType {
        &self.result_type
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

    fn agg_buffer_attributes(&self) -> Vec<AttributeReference> {
        vec![self.sum_attr()]
    }

    fn input_agg_buffer_attributes(&self) -> Vec<AttributeReference> {
        self.input_agg_attrs()
    }

    fn initial_values(&self) -> Vec<Expr> {
        vec![Expr::null_lit().cast(self.result_type.clone())]
    }

    fn update_expressions(&self) -> Vec<Expr> {
        // sum stays null until the first non-null input arrives
        let updated = Expr::ScalarFunction(Box::new(Coalesce::new(vec![self.sum(), self.zero()])))
            + self.child_cast();
        let expr = Expr::ScalarFunction(Box::new(If::new(
            Box::new(self.child.as_ref().clone().is_null()),
            Box::new(self.sum()),
            Box::new(updated),
        )));
        vec![expr]
    }

    fn merge_expressions(&self) -> Vec<Expr> {
        let right = Expr::AttributeReference(self.input_agg_attrs()[0].clone());
        let merged = Expr::ScalarFunction(Box::new(Coalesce::new(vec![self.sum(), self.zero()])))
            + right.clone();
        let expr = Expr::ScalarFunction(Box::new(If::new(
            Box::new(right.is_null()),
            Box::new(self.sum()),
            Box::new(merged),
        )));
        vec![expr]
    }

    fn evaluate_expression(&self) -> Expr {
        self.sum()
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn AggregateFunction> {
        let mut iter = args.into_iter();
        match (iter.next(), iter.next()) {
            (Some(child), None) => Box::new(Sum::new(Box::new(child))),
            _ => panic!("args count not match"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::attr_ref;

    #[test]
    fn test_sum_result_type() {
        let int_sum = Sum::new(Box::new(attr_ref(AttributeReference::new("a", DataType::Int32))));
        assert_eq!(int_sum.data_type(), &DataType::Int64);
        let float_sum =
            Sum::new(Box::new(attr_ref(AttributeReference::new("a", DataType::Float32))));
        assert_eq!(float_sum.data_type(), &DataType::Float64);
    }
}
