mod average;
mod count;
mod max;
mod min;
mod sum;

pub use average::*;
pub use count::*;
pub use max::*;
pub use min::*;
pub use sum::*;

use std::any::Any;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use dyn_clone::DynClone;

use crate::expr::type_constraint::TypeConstraint;
use crate::expr::{AttributeReference, Expr};
use crate::types::DataType;

/// A declarative aggregate function: the aggregation is described entirely
/// by expressions over a buffer of attributes — initial values, an update
/// per input row, a merge of two partial buffers, and a final result.
pub trait AggregateFunction: Debug + Send + Sync + DynClone {
    fn as_any(&self) -> &dyn Any;
    fn name(&self) -> &str;
    fn data_type(&self) -> &DataType;
    fn nullable(&self) -> bool {
        true
    }
    fn args(&self) -> Vec<&Expr>;
    fn type_constraint(&self) -> TypeConstraint;

    /// The attributes of this function's aggregation buffer.
    fn agg_buffer_attributes(&self) -> Vec<AttributeReference>;
    /// The buffer attributes of an incoming partial, as seen by
    /// [`Self::merge_expressions`].
    fn input_agg_buffer_attributes(&self) -> Vec<AttributeReference>;
    fn initial_values(&self) -> Vec<Expr>;
    fn update_expressions(&self) -> Vec<Expr>;
    fn merge_expressions(&self) -> Vec<Expr>;
    fn evaluate_expression(&self) -> Expr;

    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn AggregateFunction>;
}

dyn_clone::clone_trait_object!(AggregateFunction);

impl PartialEq for Box<dyn AggregateFunction> {
    fn eq(&self, other: &Self) -> bool {
        if self.as_any().type_id() != other.as_any().type_id() {
            return false;
        }
        let args1 = self.args();
        let args2 = other.args();
        args1.len() == args2.len() && args1.iter().zip(args2.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for Box<dyn AggregateFunction> {}

impl Hash for Box<dyn AggregateFunction> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        for x in self.args() {
            x.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::attr_ref;

    #[test]
    fn test_structural_equality() {
        let a = attr_ref(AttributeReference::new("a", DataType::Int64));
        let sum1 = Sum::from_args(vec![a.clone()]).unwrap();
        let sum2 = sum1.clone();
        assert_eq!(sum1, sum2);
        let count = Count::from_args(vec![a]).unwrap();
        assert_ne!(sum1, count);
    }

    #[test]
    fn test_three_phase_shape() {
        let a = attr_ref(AttributeReference::new("a", DataType::Int64));
        if let Expr::AggregateFunction(f) = Sum::from_args(vec![a]).unwrap() {
            assert_eq!(f.agg_buffer_attributes().len(), f.initial_values().len());
            assert_eq!(f.agg_buffer_attributes().len(), f.update_expressions().len());
            assert_eq!(f.agg_buffer_attributes().len(), f.merge_expressions().len());
        } else {
            panic!("sum should build an aggregate function");
        }
    }
}
