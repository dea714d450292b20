use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;

use crate::expr::aggregate::AggregateFunction;
use crate::expr::functions::If;
use crate::expr::type_constraint::TypeConstraint;
use crate::expr::{AttributeReference, Expr, Literal, binary_expr};
use crate::types::DataType;
use crate::{AnalysisError, Operator, Result};

pub struct Count {
    child: Box<Expr>,
    count: Mutex<Option<AttributeReference>>,
    input_agg_attrs: Mutex<Vec<AttributeReference>>,
}

impl Count {
    pub fn new(child: Box<Expr>) -> Self {
        Self { child, count: Mutex::new(None), input_agg_attrs: Mutex::new(vec![]) }
    }

    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        if args.len() != 1 {
            return Err(AnalysisError::analysis(format!(
                "count requires 1 argument, found {}",
                args.len()
            )));
        }
        let child = args.into_iter().next().unwrap();
        Ok(Expr::AggregateFunction(Box::new(Count::new(Box::new(child)))))
    }

    fn count_attr(&self) -> AttributeReference {
        let mut guard = self.count.lock().unwrap();
        if guard.is_none() {
            *guard = Some(AttributeReference::new("count", DataType::Int64).with_nullable(false));
        }
        guard.as_ref().unwrap().clone()
    }

    fn input_agg_attrs(&self) -> Vec<AttributeReference> {
        let mut guard = self.input_agg_attrs.lock().unwrap();
        if guard.is_empty() {
            *guard = vec![self.count_attr().new_instance()];
        }
        guard.clone()
    }

    fn count(&self) -> Expr {
        Expr::AttributeReference(self.count_attr())
    }
}

impl Debug for Count {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Count").field("child", &self.child).finish()
    }
}

impl Clone for Count {
    fn clone(&self) -> Self {
        Self {
            child: self.child.clone(),
            count: Mutex::new(self.count.lock().unwrap().clone()),
            input_agg_attrs: Mutex::new(self.input_agg_attrs.lock().unwrap().clone()),
        }
    }
}

impl AggregateFunction for Count {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "count"
    }

    fn data_type(&self) -> &DataType {
        DataType::long_type()
    }

    fn nullable(&self) -> bool {
        false
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.child]
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::PassThrough(vec![self.child.as_ref().clone()])
    }

    fn agg_buffer_attributes(&self) -> Vec<AttributeReference> {
        vec![self.count_attr()]
    }

    fn input_agg_buffer_attributes(&self) -> Vec<AttributeReference> {
        self.input_agg_attrs()
    }

    fn initial_values(&self) -> Vec<Expr> {
        vec![Expr::long_lit(0)]
    }

    fn update_expressions(&self) -> Vec<Expr> {
        let expr = match self.child.as_ref() {
            Expr::Literal(Literal { value, .. }) if !value.is_null() => {
                self.count() + Expr::long_lit(1)
            }
            child => Expr::ScalarFunction(Box::new(If::new(
                Box::new(child.clone().is_null()),
                Box::new(self.count()),
                Box::new(self.count() + Expr::long_lit(1)),
            ))),
        };
        vec![expr]
    }

    fn merge_expressions(&self) -> Vec<Expr> {
        let right = Expr::AttributeReference(self.input_agg_attrs()[0].clone());
        vec![binary_expr(self.count(), Operator::Plus, right)]
    }

    fn evaluate_expression(&self) -> Expr {
        self.count()
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn AggregateFunction> {
        let mut iter = args.into_iter();
        match (iter.next(), iter.next()) {
            (Some(child), None) => Box::new(Count::new(Box::new(child))),
            _ => panic!("args count not match"),
        }
    }
}
