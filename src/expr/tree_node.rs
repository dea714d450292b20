use crate::Result;
use crate::expr::*;
use crate::tree_node::{Transformed, TreeNode, TreeNodeContainer, TreeNodeRecursion};

impl TreeNode for Expr {
    fn apply_children<'n, F: FnMut(&'n Self) -> Result<TreeNodeRecursion>>(
        &'n self,
        mut f: F,
    ) -> Result<TreeNodeRecursion> {
        for x in self.children() {
            if f(x)? == TreeNodeRecursion::Stop {
                return Ok(TreeNodeRecursion::Stop);
            }
        }
        Ok(TreeNodeRecursion::Continue)
    }

    fn map_children<F: FnMut(Self) -> Result<Transformed<Self>>>(
        self,
        mut f: F,
    ) -> Result<Transformed<Self>> {
        Ok(match self {
            Expr::Literal(_)
            | Expr::UnresolvedAttribute(_)
            | Expr::AttributeReference(_)
            | Expr::UnresolvedStar(_) => Transformed::no(self),
            Expr::Alias(Alias { child, name, expr_id }) => f(*child)?
                .update_data(|child| Expr::Alias(Alias::new_with_expr_id(child, name, expr_id))),
            Expr::UnresolvedAlias(child) => {
                f(*child)?.update_data(|child| Expr::UnresolvedAlias(Box::new(child)))
            }
            Expr::GroupingAlias(GeneratedAlias { child, name, expr_id }) => f(*child)?
                .update_data(|child| {
                    Expr::GroupingAlias(GeneratedAlias { child: Box::new(child), name, expr_id })
                }),
            Expr::AggregationAlias(GeneratedAlias { child, name, expr_id }) => f(*child)?
                .update_data(|child| {
                    Expr::AggregationAlias(GeneratedAlias { child: Box::new(child), name, expr_id })
                }),
            Expr::Cast(Cast { child, data_type }) => f(*child)?.update_data(|e| e.cast(data_type)),
            Expr::Not(child) => f(*child)?.update_data(|e| e.not()),
            Expr::IsNull(child) => f(*child)?.update_data(|e| e.is_null()),
            Expr::IsNotNull(child) => f(*child)?.update_data(|e| e.is_not_null()),
            Expr::SortOrder(SortOrder { child, direction }) => {
                f(*child)?.update_data(|e| Expr::SortOrder(SortOrder::new(e, direction)))
            }
            Expr::BinaryOperator(BinaryOperator { left, op, right }) => (left, right)
                .map_elements(f)?
                .update_data(|(new_left, new_right)| {
                    Expr::BinaryOperator(BinaryOperator::new(new_left, op, new_right))
                }),
            Expr::In(In { value, list }) => (value, list)
                .map_elements(f)?
                .update_data(|(value, list)| Expr::In(In { value, list })),
            Expr::Like(Like { expr, pattern }) => (expr, pattern)
                .map_elements(f)?
                .update_data(|(expr, pattern)| Expr::Like(Like { expr, pattern })),
            Expr::UnresolvedFunction(UnresolvedFunction { name, arguments, distinct }) => {
                arguments.map_elements(f)?.update_data(|arguments| {
                    Expr::UnresolvedFunction(UnresolvedFunction { name, arguments, distinct })
                })
            }
            Expr::ScalarFunction(func) => {
                let args = func.args().into_iter().cloned().collect::<Vec<_>>();
                args.map_elements(f)?
                    .update_data(|args| Expr::ScalarFunction(func.rewrite_args(args)))
            }
            Expr::AggregateFunction(func) => {
                let args = func.args().into_iter().cloned().collect::<Vec<_>>();
                args.map_elements(f)?
                    .update_data(|args| Expr::AggregateFunction(func.rewrite_args(args)))
            }
            Expr::DistinctAggregateFunction(func) => {
                let args = func.args().into_iter().cloned().collect::<Vec<_>>();
                args.map_elements(f)?
                    .update_data(|args| Expr::DistinctAggregateFunction(func.rewrite_args(args)))
            }
        })
    }
}

impl<'a> TreeNodeContainer<'a, Self> for Expr {
    fn apply_elements<F: FnMut(&'a Self) -> Result<TreeNodeRecursion>>(
        &'a self,
        mut f: F,
    ) -> Result<TreeNodeRecursion> {
        f(self)
    }

    fn map_elements<F: FnMut(Self) -> Result<Transformed<Self>>>(
        self,
        mut f: F,
    ) -> Result<Transformed<Self>> {
        f(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operator;
    use crate::types::DataType;

    #[test]
    fn test_transform_up_replaces_leaves() {
        let a = Expr::UnresolvedAttribute(UnresolvedAttribute::new("a"));
        let expr = binary_expr(a, Operator::Plus, Expr::int_lit(1));
        let resolved = expr
            .transform_up(|e| match e {
                Expr::UnresolvedAttribute(_) => Ok(Transformed::yes(Expr::AttributeReference(
                    AttributeReference::new("a", DataType::Int32),
                ))),
                e => Ok(Transformed::no(e)),
            })
            .unwrap();
        assert!(resolved.transformed);
        assert!(resolved.data.resolved());
    }

    #[test]
    fn test_unchanged_subtree_not_flagged() {
        let expr = binary_expr(Expr::int_lit(1), Operator::Plus, Expr::int_lit(2));
        let result = expr.clone().transform_up(|e| Ok(Transformed::no(e))).unwrap();
        assert!(!result.transformed);
        assert_eq!(result.data, expr);
    }
}
