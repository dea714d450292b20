use crate::Result;
use crate::expr::Expr;
use crate::logical_plan::*;
use crate::tree_node::{Transformed, TreeNode, TreeNodeContainer, TreeNodeRecursion};

impl TreeNode for LogicalPlan {
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
            LogicalPlan::UnresolvedRelation(_)
            | LogicalPlan::Relation(_)
            | LogicalPlan::OneRowRelation => Transformed::no(self),
            LogicalPlan::Project(Project { project_list, child }) => child
                .map_elements(f)?
                .update_data(|child| LogicalPlan::Project(Project { project_list, child })),
            LogicalPlan::Filter(Filter { condition, child }) => child
                .map_elements(f)?
                .update_data(|child| LogicalPlan::Filter(Filter { condition, child })),
            LogicalPlan::Sort(Sort { order, child }) => child
                .map_elements(f)?
                .update_data(|child| LogicalPlan::Sort(Sort { order, child })),
            LogicalPlan::Limit(Limit { limit, child }) => child
                .map_elements(f)?
                .update_data(|child| LogicalPlan::Limit(Limit { limit, child })),
            LogicalPlan::SubqueryAlias(SubqueryAlias { identifier, child }) => child
                .map_elements(f)?
                .update_data(|child| LogicalPlan::SubqueryAlias(SubqueryAlias { identifier, child })),
            LogicalPlan::Distinct(Distinct { child }) => child
                .map_elements(f)?
                .update_data(|child| LogicalPlan::Distinct(Distinct { child })),
            LogicalPlan::With(With { child, name, cte }) => (child, cte)
                .map_elements(f)?
                .update_data(|(child, cte)| LogicalPlan::With(With { child, name, cte })),
            LogicalPlan::Join(Join { left, right, join_type, condition }) => (left, right)
                .map_elements(f)?
                .update_data(|(left, right)| {
                    LogicalPlan::Join(Join { left, right, join_type, condition })
                }),
            LogicalPlan::Union(SetOp { left, right }) => (left, right)
                .map_elements(f)?
                .update_data(|(left, right)| LogicalPlan::Union(SetOp { left, right })),
            LogicalPlan::Intersect(SetOp { left, right }) => (left, right)
                .map_elements(f)?
                .update_data(|(left, right)| LogicalPlan::Intersect(SetOp { left, right })),
            LogicalPlan::Except(SetOp { left, right }) => (left, right)
                .map_elements(f)?
                .update_data(|(left, right)| LogicalPlan::Except(SetOp { left, right })),
            LogicalPlan::UnresolvedAggregate(UnresolvedAggregate {
                child,
                groupings,
                project_list,
                having,
                order,
            }) => child.map_elements(f)?.update_data(|child| {
                LogicalPlan::UnresolvedAggregate(UnresolvedAggregate {
                    child,
                    groupings,
                    project_list,
                    having,
                    order,
                })
            }),
            LogicalPlan::Aggregate(Aggregate { child, grouping_aliases, aggregation_aliases }) => {
                child.map_elements(f)?.update_data(|child| {
                    LogicalPlan::Aggregate(Aggregate {
                        child,
                        grouping_aliases,
                        aggregation_aliases,
                    })
                })
            }
        })
    }
}

impl<'a> TreeNodeContainer<'a, Self> for LogicalPlan {
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

impl LogicalPlan {
    /// Rewrites this node's own expressions with `f` (no recursion into the
    /// expressions or into child plans).
    pub fn map_expressions<F: FnMut(Expr) -> Result<Transformed<Expr>>>(
        self,
        mut f: F,
    ) -> Result<Transformed<Self>> {
        match self {
            LogicalPlan::UnresolvedRelation(_)
            | LogicalPlan::Relation(_)
            | LogicalPlan::OneRowRelation
            | LogicalPlan::SubqueryAlias(_)
            | LogicalPlan::With(_)
            | LogicalPlan::Distinct(_)
            | LogicalPlan::Limit(_)
            | LogicalPlan::Union(_)
            | LogicalPlan::Intersect(_)
            | LogicalPlan::Except(_) => Ok(Transformed::no(self)),
            LogicalPlan::Project(Project { project_list, child }) => {
                Ok(project_list
                    .map_elements(f)?
                    .update_data(|project_list| LogicalPlan::Project(Project { project_list, child })))
            }
            LogicalPlan::Filter(Filter { condition, child }) => Ok(f(condition)?
                .update_data(|condition| LogicalPlan::Filter(Filter { condition, child }))),
            LogicalPlan::Sort(Sort { order, child }) => Ok(order
                .map_elements(f)?
                .update_data(|order| LogicalPlan::Sort(Sort { order, child }))),
            LogicalPlan::Join(Join { left, right, join_type, condition }) => {
                Ok(condition.map_elements(f)?.update_data(|condition| {
                    LogicalPlan::Join(Join { left, right, join_type, condition })
                }))
            }
            LogicalPlan::UnresolvedAggregate(UnresolvedAggregate {
                child,
                groupings,
                project_list,
                having,
                order,
            }) => Ok((groupings, project_list, having, order).map_elements(f)?.update_data(
                |(groupings, project_list, having, order)| {
                    LogicalPlan::UnresolvedAggregate(UnresolvedAggregate {
                        child,
                        groupings,
                        project_list,
                        having,
                        order,
                    })
                },
            )),
            LogicalPlan::Aggregate(Aggregate { child, grouping_aliases, aggregation_aliases }) => {
                Ok((grouping_aliases, aggregation_aliases).map_elements(f)?.update_data(
                    |(grouping_aliases, aggregation_aliases)| {
                        LogicalPlan::Aggregate(Aggregate {
                            child,
                            grouping_aliases,
                            aggregation_aliases,
                        })
                    },
                ))
            }
        }
    }

    /// Lifts an expression rewrite to every expression position in every
    /// plan node, bottom-up over both trees.
    pub fn transform_up_expressions<F: FnMut(Expr) -> Result<Transformed<Expr>> + Copy>(
        self,
        f: F,
    ) -> Result<Transformed<Self>> {
        self.transform_up(|plan| plan.map_expressions(|expr| expr.transform_up(f)))
    }

    /// Top-down variant of [`Self::transform_up_expressions`].
    pub fn transform_down_expressions<F: FnMut(Expr) -> Result<Transformed<Expr>> + Copy>(
        self,
        f: F,
    ) -> Result<Transformed<Self>> {
        self.transform_down(|plan| plan.map_expressions(|expr| expr.transform_down(f)))
    }
}
