use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::AnalyzerRule;
use crate::analysis::rule::auto_alias_name;
use crate::expr::aggregate::AggregateFunction;
use crate::expr::*;
use crate::logical_plan::*;
use crate::tree_node::{Transformed, TreeNode, TreeNodeRecursion};
use crate::{AnalysisError, Result};

/// Resolves a pending aggregate once every having condition and sort has
/// been merged in and everything is name-bound: grouping keys and collected
/// aggregate functions each get a generated alias, all outer expressions
/// are rewritten onto those aliases, and the node becomes
/// `Project(Sort?(Filter?(Aggregate)))`.
#[derive(Debug)]
pub struct ResolveAggregates;

impl AnalyzerRule for ResolveAggregates {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_down(|plan| match plan {
            // an adjacent filter or sort still needs merging; leave the
            // subtree alone this pass
            LogicalPlan::Filter(f)
                if matches!(f.child.as_ref(), LogicalPlan::UnresolvedAggregate(_)) =>
            {
                Ok(Transformed::new(LogicalPlan::Filter(f), false, TreeNodeRecursion::Jump))
            }
            LogicalPlan::Sort(s)
                if matches!(s.child.as_ref(), LogicalPlan::UnresolvedAggregate(_)) =>
            {
                Ok(Transformed::new(LogicalPlan::Sort(s), false, TreeNodeRecursion::Jump))
            }
            LogicalPlan::UnresolvedAggregate(agg) if Self::applicable(&agg) => {
                Self::resolve(agg).map(Transformed::yes)
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "ResolveAggregates"
    }
}

impl ResolveAggregates {
    fn applicable(agg: &UnresolvedAggregate) -> bool {
        agg.child.resolved()
            && agg.groupings.iter().all(|e| e.resolved())
            && agg.project_list.iter().all(|e| e.resolved())
            && agg.having.iter().all(|e| e.resolved())
            && agg.order.iter().all(|e| e.resolved())
    }

    fn resolve(agg: UnresolvedAggregate) -> Result<LogicalPlan> {
        let UnresolvedAggregate { child, groupings, project_list, having, order } = agg;

        // 1. bind each grouping key to a fresh alias
        let grouping_aliases: Vec<GeneratedAlias> =
            groupings.iter().map(|k| GeneratedAlias::new(k.clone())).collect();
        let key_subst: Vec<(Expr, AttributeReference)> = groupings
            .iter()
            .cloned()
            .zip(grouping_aliases.iter().map(Self::grouping_attr))
            .collect();

        // 2. collect aggregate functions across all three parts; distinct
        // wrappers come first so their inner functions are not picked up as
        // independent aggregates
        let all_exprs: Vec<&Expr> =
            project_list.iter().chain(having.iter()).chain(order.iter()).collect();
        let mut collected: Vec<Expr> = Vec::new();
        for e in &all_exprs {
            e.apply(|x| {
                if let Expr::DistinctAggregateFunction(_) = x {
                    if !collected.contains(x) {
                        collected.push(x.clone());
                    }
                    return Ok(TreeNodeRecursion::Jump);
                }
                Ok(TreeNodeRecursion::Continue)
            })
            .unwrap();
        }
        for e in &all_exprs {
            e.apply(|x| match x {
                Expr::DistinctAggregateFunction(_) => Ok(TreeNodeRecursion::Jump),
                Expr::AggregateFunction(_) => {
                    if !collected.contains(x) {
                        collected.push(x.clone());
                    }
                    Ok(TreeNodeRecursion::Jump)
                }
                _ => Ok(TreeNodeRecursion::Continue),
            })
            .unwrap();
        }

        // 3. an aggregate containing another aggregate has no meaning
        for e in &collected {
            let function = match e {
                Expr::AggregateFunction(f) | Expr::DistinctAggregateFunction(f) => f,
                _ => unreachable!(),
            };
            Self::assert_not_nested(function.as_ref())?;
        }

        // 4. bind each collected aggregate to a fresh alias
        let aggregation_aliases: Vec<GeneratedAlias> =
            collected.iter().map(|e| GeneratedAlias::new(e.clone())).collect();
        let agg_subst: Vec<(Expr, AttributeReference)> = collected
            .into_iter()
            .zip(aggregation_aliases.iter().map(Self::aggregation_attr))
            .collect();

        let generated_ids: HashSet<u32> = grouping_aliases
            .iter()
            .chain(aggregation_aliases.iter())
            .map(|g| g.expr_id)
            .collect();

        // 5. rewrite all three parts onto the generated attributes; a
        // projection entry collapsing to a bare generated attribute gets
        // re-aliased under its original display name
        let rewritten_project: Vec<Expr> = project_list
            .into_iter()
            .map(|orig| {
                let rewritten = Self::substitute(orig.clone(), &key_subst, &agg_subst);
                match &rewritten {
                    Expr::AttributeReference(a) if generated_ids.contains(&a.expr_id) => {
                        Expr::Alias(Alias::new(rewritten.clone(), Self::display_name(&orig)))
                    }
                    _ => rewritten,
                }
            })
            .collect();
        let rewritten_having: Vec<Expr> = having
            .into_iter()
            .map(|e| Self::substitute(e, &key_subst, &agg_subst))
            .collect();
        let rewritten_order: Vec<Expr> = order
            .into_iter()
            .map(|e| Self::substitute(e, &key_subst, &agg_subst))
            .collect();

        // 6. anything still referencing a child attribute directly was
        // neither grouped nor aggregated
        Self::check_no_dangling(&rewritten_project, "SELECT field", &generated_ids)?;
        Self::check_no_dangling(&rewritten_having, "HAVING condition", &generated_ids)?;
        Self::check_no_dangling(&rewritten_order, "ORDER BY expression", &generated_ids)?;

        // 7. assemble the resolved shape
        let grouping_alias_exprs = grouping_aliases.into_iter().map(Expr::GroupingAlias).collect();
        let aggregation_alias_exprs =
            aggregation_aliases.into_iter().map(Expr::AggregationAlias).collect();
        let mut result = LogicalPlan::Aggregate(Aggregate::new(
            child,
            grouping_alias_exprs,
            aggregation_alias_exprs,
        ));
        if let Some(condition) = rewritten_having.into_iter().reduce(and) {
            result = LogicalPlan::Filter(Filter::new(condition, Arc::new(result)));
        }
        if !rewritten_order.is_empty() {
            result = LogicalPlan::Sort(Sort::new(rewritten_order, Arc::new(result)));
        }
        Ok(LogicalPlan::Project(Project::new(rewritten_project, Arc::new(result))))
    }

    fn grouping_attr(alias: &GeneratedAlias) -> AttributeReference {
        Expr::GroupingAlias(alias.clone()).to_attribute().expect("grouping key is resolved")
    }

    fn aggregation_attr(alias: &GeneratedAlias) -> AttributeReference {
        Expr::AggregationAlias(alias.clone()).to_attribute().expect("aggregate is resolved")
    }

    fn assert_not_nested(function: &dyn AggregateFunction) -> Result<()> {
        for arg in function.args() {
            if arg.contains_aggregate() {
                return Err(AnalysisError::IllegalAggregation(format!(
                    "aggregate function {} contains a nested aggregate function",
                    function.name()
                )));
            }
        }
        Ok(())
    }

    /// Applies the grouping-key substitution and then the aggregate
    /// substitution, both top-down. The key pass jumps over aggregate
    /// functions so their occurrences keep matching the collected originals.
    fn substitute(
        expr: Expr,
        key_subst: &[(Expr, AttributeReference)],
        agg_subst: &[(Expr, AttributeReference)],
    ) -> Expr {
        let keyed = expr
            .transform_down(|e| {
                if matches!(
                    e,
                    Expr::AggregateFunction(_) | Expr::DistinctAggregateFunction(_)
                ) {
                    return Ok(Transformed::new(e, false, TreeNodeRecursion::Jump));
                }
                for (key, attr) in key_subst {
                    if &e == key && !e.foldable() {
                        return Ok(Transformed::yes(Expr::AttributeReference(attr.clone())));
                    }
                }
                Ok(Transformed::no(e))
            })
            .unwrap()
            .data;
        keyed
            .transform_down(|e| {
                for (aggregate, attr) in agg_subst {
                    if &e == aggregate {
                        return Ok(Transformed::yes(Expr::AttributeReference(attr.clone())));
                    }
                }
                Ok(Transformed::no(e))
            })
            .unwrap()
            .data
    }

    fn display_name(expr: &Expr) -> String {
        match expr {
            Expr::AttributeReference(a) => a.name.clone(),
            Expr::UnresolvedAttribute(u) => u.name.clone(),
            e => auto_alias_name(e),
        }
    }

    fn check_no_dangling(
        exprs: &[Expr],
        part: &str,
        generated_ids: &HashSet<u32>,
    ) -> Result<()> {
        for e in exprs {
            let dangling = e.collect_first(|x| match x {
                Expr::AttributeReference(a) if !generated_ids.contains(&a.expr_id) => {
                    Some(a.name.clone())
                }
                _ => None,
            });
            if let Some(name) = dangling {
                return Err(AnalysisError::IllegalAggregation(format!(
                    "{} '{}' is neither grouped nor aggregated",
                    part, name
                )));
            }
        }
        Ok(())
    }
}
