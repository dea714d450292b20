use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;

use crate::expr::aggregate::AggregateFunction;
use crate::expr::functions::If;
use crate::expr::type_constraint::TypeConstraint;
use crate::expr::{AttributeReference, Expr, binary_expr};
use crate::types::{AbstractDataType, DataType};
use crate::{AnalysisError, Operator, Result};

pub struct Average {
    child: Box<Expr>,
    sum: Mutex<Option<AttributeReference>>,
    count: Mutex<Option<AttributeReference>>,
    input_agg_attrs: Mutex<Vec<AttributeReference>>,
}

impl Average {
    pub fn new(child: Box<Expr>) -> Self {
        Self {
            child,
            sum: Mutex::new(None),
            count: Mutex::new(None),
            input_agg_attrs: Mutex::new(vec![]),
        }
    }

    pub fn from_args(args: Vec<Expr>) -> Result<Expr> {
        if args.len() != 1 {
            return Err(AnalysisError::analysis(format!(
                "avg requires 1 argument, found {}",
                args.len()
            )));
        }
        let child = args.into_iter().next().unwrap();
        Ok(Expr::AggregateFunction(Box::new(Average::new(Box::new(child)))))
    }

    fn sum_attr(&self) -> AttributeReference {
        let mut guard = self.sum.lock().unwrap();
        if guard.is_none() {
            *guard = Some(AttributeReference::new("sum", DataType::Float64).with_nullable(false));
        }
        guard.as_ref().unwrap().clone()
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
            *guard = vec![self.sum_attr().new_instance(), self.count_attr().new_instance()];
        }
        guard.clone()
    }

    fn sum(&self) -> Expr {
        Expr::AttributeReference(self.sum_attr())
    }

    fn count(&self) -> Expr {
        Expr::AttributeReference(self.count_attr())
    }

    fn child_cast(&self) -> Expr {
        self.child.as_ref().clone().cast(DataType::Float64)
    }
}

impl Debug for Average {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Average").field("child", &self.child).finish()
    }
}

impl Clone for Average {
    fn clone(&self) -> Self {
        Self {
            child: self.child.clone(),
            sum: Mutex::new(self.sum.lock().unwrap().clone()),
            count: Mutex::new(self.count.lock().unwrap().clone()),
            input_agg_attrs: Mutex::new(self.input_agg_attrs.lock().unwrap().clone()),
        }
    }
}

impl AggregateFunction for Average {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "avg"
    }

    fn data_type(&self) -> &DataType {
        DataType::double_type()
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
        vec![self.sum_attr(), self.count_attr()]
    }

    fn input_agg_buffer_attributes(&self) -> Vec<AttributeReference> {
        self.input_agg_attrs()
    }

    fn initial_values(&self) -> Vec<Expr> {
        vec![
            Expr::Literal(crate::expr::Literal::new(crate::data::Value::Float64(0.0), DataType::Float64)),
            Expr::long_lit(0),
        ]
    }

    fn update_expressions(&self) -> Vec<Expr> {
        let skip = self.child.as_ref().clone().is_null();
        let new_sum = Expr::ScalarFunction(Box::new(If::new(
            Box::new(skip.clone()),
            Box::new(self.sum()),
            Box::new(self.sum() + self.child_cast()),
        )));
        let new_count = Expr::ScalarFunction(Box::new(If::new(
            Box::new(skip),
            Box::new(self.count()),
            Box::new(self.count() + Expr::long_lit(1)),
        )));
        vec![new_sum, new_count]
    }

    fn merge_expressions(&self) -> Vec<Expr> {
        let input = self.input_agg_attrs();
        vec![
            self.sum() + Expr::AttributeReference(input[0].clone()),
            self.count() + Expr::AttributeReference(input[1].clone()),
        ]
    }

    fn evaluate_expression(&self) -> Expr {
        // null on empty input, the division itself handles count = 0 upstream
        let count_is_zero = binary_expr(self.count(), Operator::Eq, Expr::long_lit(0));
        let ratio = binary_expr(
            self.sum(),
            Operator::Divide,
            self.count().cast(DataType::Float64),
        );
        Expr::ScalarFunction(Box::new(If::new(
            Box::new(count_is_zero),
            Box::new(Expr::null_lit().cast(DataType::Float64)),
            Box::new(ratio),
        )))
    }

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn AggregateFunction> {
        let mut iter = args.into_iter();
        match (iter.next(), iter.next()) {
            (Some(child), None) => Box::new(Average::new(Box::new(child))),
            _ => panic!("args count not match"),
        }
    }
}
