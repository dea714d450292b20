use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;

use crate::expr::aggregate::AggregateFunction;
use crate::expr::functions::If;
use crate::expr::type_constraint::TypeConstraint;
use crate::expr::{AttributeReference, Expr, binary_expr, or};
use crate::types::{AbstractDataType, DataType};
use crate::{AnalysisError, Operator, Result};

pub struct Max {
    child: Box<Expr>,
    max: Mutex<Option<AttributeReference>>,
    input_agg_attrs: Mutex<Vec<AttributeReference>>,
}

impl Max {
    pub fn new(child: Box<Expr>) -> Self {
        Self { child, max: Mutex::new(None), input_agg_attrs: Mutex::new(vec![]) }
    }

    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        if args.len() != 1 {
            return Err(AnalysisError::analysis(format!(
                "max requires 1 argument, found {}",
                args.len()
            )));
        }
        let child = args.into_iter().next().unwrap();
        Ok(Expr::AggregateFunction(Box::new(Max::new(Box::new(child)))))
    }

    fn max_attr(&self) -> AttributeReference {
        let mut guard = self.max.lock().unwrap();
        if guard.is_none() {
            *guard = Some(AttributeReference::new("max", self.child.data_type().clone()));
        }
        guard.as_ref().unwrap().clone()
    }

    fn input_agg_attrs(&self) -> Vec<AttributeReference> {
        let mut guard = self.input_agg_attrs.lock().unwrap();
        if guard.is_empty() {
            *guard = vec![self.max_attr().new_instance()];
        }
        guard.clone()
    }

    fn max(&self) -> Expr {
        Expr::AttributeReference(self.max_attr())
    }

    fn keep_larger(&self, candidate: Expr) -> Expr {
        let take_candidate =
            or(self.max().is_null(), binary_expr(candidate.clone(), Operator::Gt, self.max()));
        let picked = Expr::ScalarFunction(Box::new(If::new(
            Box::new(take_candidate),
            Box::new(candidate.clone()),
            Box::new(self.max()),
        )));
        Expr::ScalarFunction(Box::new(If::new(
            Box::new(candidate.is_null()),
            Box::new(self.max()),
            Box::new(picked),
        )))
    }
}

impl Debug for Max {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Max").field("child", &self.child).finish()
    }
}

impl Clone for Max {
    fn clone(&self) -> Self {
        Self {
            child: self.child.clone(),
            max: Mutex::new(self.max.lock().unwrap().clone()),
            input_agg_attrs: Mutex::new(self.input_agg_attrs.lock().unwrap().clone()),
        }
    }
}

impl AggregateFunction for Max {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "max"
    }

    fn data_type(&self) -> &DataType {
        self.child.data_type()
    }

    fn args(&self) -> Vec<&Expr> {
        vec![&self.child]
    }

    fn type_constraint(&self) -> TypeConstraint {
        TypeConstraint::SameSubtypesOf(
            AbstractDataType::Ordered,
            vec![self.child.as_ref().clone()],
        )
    }

    fn agg_buffer_attributes(&self) -> Vec<AttributeReference> {
        vec![self.max_attr()]
    }

    fn input_agg_buffer_attributes(&self) -> Vec<AttributeReference> {
        self.input_agg_attrs()
    }

    fn initial_values(&self) -> Vec<Expr> {
        vec![Expr::null_lit().cast(self.child.data_type().clone())]
    }

    fn update_expressions(&self) -> Vec<Expr> {
        vec![self.keep_larger(self.child.as_ref().clone())]
    }

    fn merge_expressions(&self) -> Vec<Expr> {
        let right = Expr::AttributeReference(self.input_agg_attrs()[0].clone());
        vec![self.keep_larger(right)]
    }

    fn evaluate_expression(&self) -> Expr {
        self.max()
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn AggregateFunction> {
        let mut iter = args.into_iter();
        match (iter.next(), iter.next()) {
            (Some(child), None) => Box::new(Max::new(Box::new(child))),
            _ => panic!("args count not match"),
        }
    }
}
