use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use itertools::Itertools;

use crate::expr::{BinaryOperator, Expr, In, Like, SortOrder};
use crate::types::{
    AbstractDataType, DataType, can_implicitly_cast, find_wider_common_type,
};
use crate::{AnalysisError, Result};

/// Continuation used by [`TypeConstraint::AndThen`]: receives the coerced
/// children of the previous constraint and produces the next one.
pub type ConstraintCont = Arc<dyn Fn(Vec<Expr>) -> TypeConstraint + Send + Sync>;

/// The typing rule of one expression over its children. Evaluation either
/// yields the coerced child list (order preserved) or fails with
/// [`AnalysisError::TypeMismatch`].
#[derive(Clone)]
pub enum TypeConstraint {
    /// Each child must already be strictly typed; no cross-child requirement.
    PassThrough(Vec<Expr>),
    /// Each child must be compatible with the target; coerce each to it.
    SameTypeAs(DataType, Vec<Expr>),
    /// At least one child must directly inhabit the abstract type; all
    /// children are coerced to the widest such type.
    SameSubtypesOf(AbstractDataType, Vec<Expr>),
    /// Coerce all children to their widest common type.
    SameType(Vec<Expr>),
    /// Each child must be foldable.
    Foldable(Vec<Expr>),
    /// Each child's own constraint must succeed.
    StrictlyTyped(Vec<Expr>),
    Concat(Box<TypeConstraint>, Box<TypeConstraint>),
    AndThen(Box<TypeConstraint>, ConstraintCont),
    OrElse(Box<TypeConstraint>, Box<TypeConstraint>),
}

impl TypeConstraint {
    pub fn concat(self, other: TypeConstraint) -> TypeConstraint {
        TypeConstraint::Concat(Box::new(self), Box::new(other))
    }

    pub fn and_then<F: Fn(Vec<Expr>) -> TypeConstraint + Send + Sync + 'static>(
        self,
        f: F,
    ) -> TypeConstraint {
        TypeConstraint::AndThen(Box::new(self), Arc::new(f))
    }

    pub fn or_else(self, other: TypeConstraint) -> TypeConstraint {
        TypeConstraint::OrElse(Box::new(self), Box::new(other))
    }

    /// Runs the constraint, returning the coerced children in their original
    /// order.
    pub fn evaluate(self) -> Result<Vec<Expr>> {
        match self {
            TypeConstraint::PassThrough(args) => {
                for arg in &args {
                    if !is_strictly_typed(arg) {
                        return Err(mismatch(arg, "a strictly typed expression"));
                    }
                }
                Ok(args)
            }
            TypeConstraint::SameTypeAs(target, args) => {
                args.into_iter().map(|arg| coerce_to(arg, &target)).collect()
            }
            TypeConstraint::SameSubtypesOf(abstract_type, args) => {
                for arg in &args {
                    if !is_strictly_typed(arg) {
                        return Err(mismatch(arg, "a strictly typed expression"));
                    }
                }
                let direct_types: Vec<DataType> = args
                    .iter()
                    .map(|a| a.data_type().clone())
                    .filter(|t| abstract_type.accepts_type(t))
                    .collect();
                if direct_types.is_empty() {
                    let first = args.first().expect("constraint over no children");
                    return Err(mismatch(first, &abstract_type.to_string()));
                }
                let widest = find_wider_common_type(direct_types)
                    .ok_or_else(|| {
                        mismatch(args.first().unwrap(), &abstract_type.to_string())
                    })?;
                args.into_iter().map(|arg| coerce_to(arg, &widest)).collect()
            }
            TypeConstraint::SameType(args) => {
                let types: Vec<DataType> = args.iter().map(|a| a.data_type().clone()).collect();
                let widest = find_wider_common_type(types).ok_or_else(|| {
                    AnalysisError::TypeMismatch {
                        expr: args.iter().map(|a| a.sql()).join(", "),
                        actual: args.iter().map(|a| a.data_type().to_string()).join(", "),
                        expected: "a common type".to_string(),
                    }
                })?;
                args.into_iter().map(|arg| coerce_to(arg, &widest)).collect()
            }
            TypeConstraint::Foldable(args) => {
                for arg in &args {
                    if !arg.foldable() {
                        return Err(mismatch(arg, "a foldable expression"));
                    }
                }
                Ok(args)
            }
            TypeConstraint::StrictlyTyped(args) => {
                for arg in &args {
                    arg.type_constraint().evaluate()?;
                }
                Ok(args)
            }
            TypeConstraint::Concat(a, b) => {
                let mut out = a.evaluate()?;
                out.extend(b.evaluate()?);
                Ok(out)
            }
            TypeConstraint::AndThen(a, f) => f(a.evaluate()?).evaluate(),
            TypeConstraint::OrElse(a, b) => a.evaluate().or_else(|_| b.evaluate()),
        }
    }
}

impl Debug for TypeConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeConstraint::PassThrough(args) => f.debug_tuple("PassThrough").field(args).finish(),
            TypeConstraint::SameTypeAs(t, args) => {
                f.debug_tuple("SameTypeAs").field(t).field(args).finish()
            }
            TypeConstraint::SameSubtypesOf(t, args) => {
                f.debug_tuple("SameSubtypesOf").field(t).field(args).finish()
            }
            TypeConstraint::SameType(args) => f.debug_tuple("SameType").field(args).finish(),
            TypeConstraint::Foldable(args) => f.debug_tuple("Foldable").field(args).finish(),
            TypeConstraint::StrictlyTyped(args) => {
                f.debug_tuple("StrictlyTyped").field(args).finish()
            }
            TypeConstraint::Concat(a, b) => f.debug_tuple("Concat").field(a).field(b).finish(),
            TypeConstraint::AndThen(a, _) => f.debug_tuple("AndThen").field(a).finish(),
            TypeConstraint::OrElse(a, b) => f.debug_tuple("OrElse").field(a).field(b).finish(),
        }
    }
}

fn mismatch(expr: &Expr, expected: &str) -> AnalysisError {
    AnalysisError::TypeMismatch {
        expr: expr.sql(),
        actual: if expr.resolved() {
            expr.data_type().to_string()
        } else {
            "unresolved".to_string()
        },
        expected: expected.to_string(),
    }
}

/// Inserts a cast wrapper when a sanctioned implicit coercion exists.
pub fn coerce_to(expr: Expr, target: &DataType) -> Result<Expr> {
    if expr.data_type() == target {
        Ok(expr)
    } else if can_implicitly_cast(expr.data_type(), target) {
        Ok(expr.cast(target.clone()))
    } else {
        Err(mismatch(&expr, &target.to_string()))
    }
}

/// An expression is strictly typed when its own constraint is satisfied
/// without any further coercion.
pub fn is_strictly_typed(expr: &Expr) -> bool {
    if !expr.resolved() {
        return false;
    }
    match expr.type_constraint().evaluate() {
        Ok(coerced) => {
            let children: Vec<Expr> = expr.children().into_iter().cloned().collect();
            coerced == children
        }
        Err(_) => false,
    }
}

impl Expr {
    /// The typing rule this expression imposes on its children.
    pub fn type_constraint(&self) -> TypeConstraint {
        let children: Vec<Expr> = self.children().into_iter().cloned().collect();
        match self {
            Expr::Not(_) => TypeConstraint::SameTypeAs(DataType::Boolean, children),
            Expr::BinaryOperator(BinaryOperator { op, .. }) => {
                if op.is_arithmetic() {
                    TypeConstraint::SameSubtypesOf(AbstractDataType::Numeric, children)
                } else if op.is_comparison() {
                    TypeConstraint::SameType(children).and_then(|coerced| {
                        TypeConstraint::SameSubtypesOf(AbstractDataType::Ordered, coerced)
                    })
                } else {
                    TypeConstraint::SameTypeAs(DataType::Boolean, children)
                }
            }
            Expr::In(In { .. }) => TypeConstraint::SameType(children),
            Expr::Like(Like { .. }) => TypeConstraint::SameTypeAs(DataType::String, children),
            Expr::SortOrder(SortOrder { .. }) => {
                TypeConstraint::SameSubtypesOf(AbstractDataType::Ordered, children)
            }
            Expr::ScalarFunction(f) => f.type_constraint(),
            Expr::AggregateFunction(f) | Expr::DistinctAggregateFunction(f) => f.type_constraint(),
            _ => TypeConstraint::PassThrough(children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operator;
    use crate::expr::binary_expr;

    #[test]
    fn test_same_subtypes_of_promotes_string() {
        // "1" + 2 casts the string side to the numeric side's type.
        let constraint = TypeConstraint::SameSubtypesOf(
            AbstractDataType::Numeric,
            vec![Expr::string_lit("1"), Expr::int_lit(2)],
        );
        let coerced = constraint.evaluate().unwrap();
        assert_eq!(coerced[0], Expr::string_lit("1").cast(DataType::Int32));
        assert_eq!(coerced[1], Expr::int_lit(2));
    }

    #[test]
    fn test_same_subtypes_of_rejects_all_strings() {
        // "1" + "2" has no child directly inhabiting the numeric family.
        let constraint = TypeConstraint::SameSubtypesOf(
            AbstractDataType::Numeric,
            vec![Expr::string_lit("1"), Expr::string_lit("2")],
        );
        assert!(matches!(
            constraint.evaluate(),
            Err(AnalysisError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_same_type_as_round_trip() {
        let constraint =
            TypeConstraint::SameTypeAs(DataType::Int64, vec![Expr::int_lit(1), Expr::long_lit(2)]);
        let once = constraint.evaluate().unwrap();
        let twice = TypeConstraint::SameTypeAs(DataType::Int64, once.clone()).evaluate().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_same_type_stable() {
        let args = vec![Expr::int_lit(1), Expr::long_lit(2), Expr::null_lit()];
        let once = TypeConstraint::SameType(args).evaluate().unwrap();
        let twice = TypeConstraint::SameType(once.clone()).evaluate().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_concat_preserves_order() {
        let constraint = TypeConstraint::SameTypeAs(DataType::String, vec![Expr::string_lit("a")])
            .concat(TypeConstraint::SameTypeAs(DataType::Int32, vec![Expr::int_lit(1)]));
        let coerced = constraint.evaluate().unwrap();
        assert_eq!(coerced, vec![Expr::string_lit("a"), Expr::int_lit(1)]);
    }

    #[test]
    fn test_or_else_recovers() {
        let constraint = TypeConstraint::SameTypeAs(DataType::Boolean, vec![Expr::int_lit(1)])
            .or_else(TypeConstraint::SameTypeAs(DataType::Int64, vec![Expr::int_lit(1)]));
        let coerced = constraint.evaluate().unwrap();
        assert_eq!(coerced, vec![Expr::int_lit(1).cast(DataType::Int64)]);
    }

    #[test]
    fn test_foldable_rejects_attribute() {
        let attr = crate::expr::col("a");
        let constraint = TypeConstraint::Foldable(vec![attr]);
        assert!(constraint.evaluate().is_err());
    }

    #[test]
    fn test_comparison_constraint_orders_strings() {
        let expr = binary_expr(Expr::string_lit("1"), Operator::Lt, Expr::int_lit(2));
        let coerced = expr.type_constraint().evaluate().unwrap();
        assert_eq!(coerced[0], Expr::string_lit("1"));
        assert_eq!(coerced[1], Expr::int_lit(2).cast(DataType::String));
    }
}
