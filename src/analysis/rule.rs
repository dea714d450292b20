use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use itertools::Itertools;

use crate::analysis::function_registry::lookup_function;
use crate::analysis::AnalyzerRule;
use crate::catalog::Catalog;
use crate::config;
use crate::expr::*;
use crate::expr::aggregate::Count;
use crate::logical_plan::*;
use crate::tree_node::{Transformed, TreeNode};
use crate::{AnalysisError, Result};

/// The display name an auto-alias or a re-aliased projection entry gets:
/// the SQL rendering, quoting stripped, folded to lower case.
pub(crate) fn auto_alias_name(expr: &Expr) -> String {
    let name: String =
        expr.sql().chars().filter(|c| *c != '`' && *c != '\'').collect::<String>().to_lowercase();
    if name.is_empty() { config::anonymous_column_name().to_string() } else { name }
}

/// Replaces every `With` scope by its child, substituting references to the
/// named CTE with the aliased CTE plan. Bottom-up so inner scopes shadow
/// outer ones.
#[derive(Debug)]
pub struct InlineCteRelations;

impl AnalyzerRule for InlineCteRelations {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            LogicalPlan::With(With { child, name, cte }) => {
                let inlined = Arc::unwrap_or_clone(child)
                    .transform_down(|p| match p {
                        LogicalPlan::UnresolvedRelation(n) if config::name_eq(&n, &name) => {
                            Ok(Transformed::yes(LogicalPlan::SubqueryAlias(SubqueryAlias::new(
                                name.clone(),
                                cte.clone(),
                            ))))
                        }
                        p => Ok(Transformed::no(p)),
                    })?
                    .data;
                Ok(Transformed::yes(inlined))
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "InlineCteRelations"
    }
}

#[derive(Debug)]
pub struct ResolveRelations {
    catalog: Arc<Catalog>,
}

impl ResolveRelations {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl AnalyzerRule for ResolveRelations {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            LogicalPlan::UnresolvedRelation(name) => {
                self.catalog.lookup_relation(&name).map(Transformed::yes)
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "ResolveRelations"
    }
}

/// Binds function names against the registry once all arguments are
/// resolved. `count(*)` desugars to `count(1)`; a star argument anywhere
/// else is malformed SQL.
#[derive(Debug)]
pub struct ResolveFunctions;

impl ResolveFunctions {
    fn resolve_function(f: UnresolvedFunction) -> Result<Transformed<Expr>> {
        let UnresolvedFunction { name, arguments, distinct } = f;
        if arguments.iter().any(|a| matches!(a, Expr::UnresolvedStar(_))) {
            if config::name_eq(&name.to_ascii_lowercase(), "count") && arguments.len() == 1 {
                return if distinct {
                    Err(AnalysisError::analysis("count(distinct *) is not allowed"))
                } else {
                    Ok(Transformed::yes(Expr::AggregateFunction(Box::new(Count::new(
                        Box::new(Expr::int_lit(1)),
                    )))))
                };
            }
            return Err(AnalysisError::analysis(format!(
                "star is not allowed in arguments of function {}",
                name
            )));
        }
        if !arguments.iter().all(|a| a.resolved()) {
            return Ok(Transformed::no(Expr::UnresolvedFunction(UnresolvedFunction {
                name,
                arguments,
                distinct,
            })));
        }
        let built = lookup_function(&name, arguments)?;
        if distinct {
            match built {
                Expr::AggregateFunction(f) => Ok(Transformed::yes(
                    Expr::DistinctAggregateFunction(f),
                )),
                _ => Err(AnalysisError::analysis(format!(
                    "DISTINCT specified, but {} is not an aggregate function",
                    name
                ))),
            }
        } else {
            Ok(Transformed::yes(built))
        }
    }
}

impl AnalyzerRule for ResolveFunctions {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            p if !p.children_resolved() => Ok(Transformed::no(p)),
            p => p.map_expressions(|expr| {
                expr.transform_up(|expr| match expr {
                    Expr::UnresolvedFunction(f) => Self::resolve_function(f),
                    expr => Ok(Transformed::no(expr)),
                })
            }),
        })
    }

    fn name(&self) -> &str {
        "ResolveFunctions"
    }
}

/// Replaces top-level stars in projections with the child plan's output;
/// a qualified star keeps only matching qualifiers.
#[derive(Debug)]
pub struct ExpandStars;

impl AnalyzerRule for ExpandStars {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_down(|plan| match plan {
            LogicalPlan::Project(Project { project_list, child })
                if project_list.iter().any(|e| matches!(e, Expr::UnresolvedStar(_)))
                    && child.resolved()
                    && child.deduplicated() =>
            {
                let mut expanded = Vec::with_capacity(project_list.len());
                for e in project_list {
                    match e {
                        Expr::UnresolvedStar(None) => {
                            expanded.extend(child.output().into_iter().map(Expr::AttributeReference));
                        }
                        Expr::UnresolvedStar(Some(qualifier)) => {
                            let attrs: Vec<AttributeReference> = child
                                .output()
                                .into_iter()
                                .filter(|a| {
                                    a.qualifier
                                        .as_deref()
                                        .is_some_and(|aq| config::name_eq(aq, &qualifier))
                                })
                                .collect();
                            if attrs.is_empty() {
                                return Err(AnalysisError::resolution(format!(
                                    "cannot resolve '{}.*' given input columns [{}]",
                                    qualifier,
                                    child.output().iter().map(|a| a.name.clone()).join(", ")
                                )));
                            }
                            expanded.extend(attrs.into_iter().map(Expr::AttributeReference));
                        }
                        e => expanded.push(e),
                    }
                }
                Ok(Transformed::yes(LogicalPlan::Project(Project::new(expanded, child))))
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "ExpandStars"
    }
}

/// Binds unresolved attributes against the union of the children's outputs.
/// Zero candidates is not an error yet — a later rule may restructure the
/// plan so the name becomes visible; the post-analysis checks report
/// whatever never binds.
#[derive(Debug)]
pub struct ResolveReferences;

impl ResolveReferences {
    fn resolve_attribute(
        unresolved: &UnresolvedAttribute,
        attrs: &[AttributeReference],
    ) -> Result<Option<AttributeReference>> {
        let candidates: Vec<&AttributeReference> = attrs
            .iter()
            .filter(|a| a.matches(&unresolved.name, unresolved.qualifier.as_deref()))
            .collect();
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(Some(candidates[0].clone())),
            _ => Err(AnalysisError::resolution(format!(
                "reference '{}' is ambiguous, candidates: [{}]",
                unresolved.name,
                candidates
                    .iter()
                    .map(|a| match &a.qualifier {
                        Some(q) => format!("{}.{}#{}", q, a.name, a.expr_id),
                        None => format!("{}#{}", a.name, a.expr_id),
                    })
                    .join(", ")
            ))),
        }
    }
}

impl AnalyzerRule for ResolveReferences {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            p if !p.children_resolved() => Ok(Transformed::no(p)),
            p if !p.deduplicated() => Ok(Transformed::no(p)),
            p => {
                let attrs = p.child_attributes();
                p.map_expressions(|expr| {
                    expr.transform_up(|expr| match expr {
                        Expr::UnresolvedAttribute(u) => {
                            match Self::resolve_attribute(&u, &attrs)? {
                                Some(a) => Ok(Transformed::yes(Expr::AttributeReference(a))),
                                None => Ok(Transformed::no(Expr::UnresolvedAttribute(u))),
                            }
                        }
                        expr => Ok(Transformed::no(expr)),
                    })
                })
            }
        })
    }

    fn name(&self) -> &str {
        "ResolveReferences"
    }
}

/// Turns auto-aliases whose child resolved into real aliases named after
/// the child's rendering.
#[derive(Debug)]
pub struct ResolveAliases;

impl AnalyzerRule for ResolveAliases {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            p if !p.children_resolved() => Ok(Transformed::no(p)),
            p => p.map_expressions(|expr| match expr {
                Expr::UnresolvedAlias(child) if child.resolved() => {
                    let name = auto_alias_name(&child);
                    Ok(Transformed::yes(Expr::Alias(Alias::new(*child, name))))
                }
                expr => Ok(Transformed::no(expr)),
            }),
        })
    }

    fn name(&self) -> &str {
        "ResolveAliases"
    }
}

/// Regenerates attribute ids on the right side of a binary operator whose
/// siblings share ids — a self-join, or a CTE consumed twice. The source of
/// the duplication (a relation instance or a projection's aliases) gets
/// fresh ids and the rewrite is propagated through the whole right subtree.
#[derive(Debug)]
pub struct DeduplicateReferences;

impl DeduplicateReferences {
    fn dedup_right(left: &LogicalPlan, right: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        let left_ids: HashSet<u32> = left.output().iter().map(|a| a.expr_id).collect();
        let conflicts: HashSet<u32> = right
            .output()
            .iter()
            .map(|a| a.expr_id)
            .filter(|id| left_ids.contains(id))
            .collect();
        if conflicts.is_empty() {
            return Ok(Transformed::no(right));
        }
        let mut mapping: HashMap<u32, u32> = HashMap::new();
        right.transform_up(|p| {
            let remapped = if mapping.is_empty() {
                Transformed::no(p)
            } else {
                let mapping = &mapping;
                p.map_expressions(|expr| {
                    expr.transform_up(|e| match e {
                        Expr::AttributeReference(a) if mapping.contains_key(&a.expr_id) => {
                            let id = mapping[&a.expr_id];
                            Ok(Transformed::yes(Expr::AttributeReference(a.with_expr_id(id))))
                        }
                        e => Ok(Transformed::no(e)),
                    })
                })?
            };
            remapped.transform_data(|p| match p {
                LogicalPlan::Relation(r)
                    if r.output.iter().any(|a| conflicts.contains(&a.expr_id)) =>
                {
                    let fresh = r.new_instance();
                    for (old, new) in r.output.iter().zip(fresh.output.iter()) {
                        mapping.insert(old.expr_id, new.expr_id);
                    }
                    Ok(Transformed::yes(LogicalPlan::Relation(fresh)))
                }
                LogicalPlan::Project(Project { project_list, child })
                    if project_list.iter().any(
                        |e| matches!(e, Expr::Alias(a) if conflicts.contains(&a.expr_id)),
                    ) =>
                {
                    let project_list = project_list
                        .into_iter()
                        .map(|e| match e {
                            Expr::Alias(a) if conflicts.contains(&a.expr_id) => {
                                let new_id = ExprIdGenerator::next_expr_id();
                                mapping.insert(a.expr_id, new_id);
                                Expr::Alias(Alias { child: a.child, name: a.name, expr_id: new_id })
                            }
                            e => e,
                        })
                        .collect();
                    Ok(Transformed::yes(LogicalPlan::Project(Project { project_list, child })))
                }
                LogicalPlan::Aggregate(Aggregate { child, grouping_aliases, aggregation_aliases })
                    if grouping_aliases.iter().chain(aggregation_aliases.iter()).any(
                        |e| e.expr_id().is_some_and(|id| conflicts.contains(&id)),
                    ) =>
                {
                    let refresh = |exprs: Vec<Expr>, mapping: &mut HashMap<u32, u32>| {
                        exprs
                            .into_iter()
                            .map(|e| match e {
                                Expr::GroupingAlias(mut g) if conflicts.contains(&g.expr_id) => {
                                    let new_id = ExprIdGenerator::next_expr_id();
                                    mapping.insert(g.expr_id, new_id);
                                    g.expr_id = new_id;
                                    Expr::GroupingAlias(g)
                                }
                                Expr::AggregationAlias(mut g) if conflicts.contains(&g.expr_id) => {
                                    let new_id = ExprIdGenerator::next_expr_id();
                                    mapping.insert(g.expr_id, new_id);
                                    g.expr_id = new_id;
                                    Expr::AggregationAlias(g)
                                }
                                e => e,
                            })
                            .collect::<Vec<_>>()
                    };
                    let grouping_aliases = refresh(grouping_aliases, &mut mapping);
                    let aggregation_aliases = refresh(aggregation_aliases, &mut mapping);
                    Ok(Transformed::yes(LogicalPlan::Aggregate(Aggregate {
                        child,
                        grouping_aliases,
                        aggregation_aliases,
                    })))
                }
                p => Ok(Transformed::no(p)),
            })
        })
    }

    fn dedup_binary(
        left: Arc<LogicalPlan>,
        right: Arc<LogicalPlan>,
    ) -> Result<(Arc<LogicalPlan>, Arc<LogicalPlan>, bool)> {
        let result = Self::dedup_right(left.as_ref(), Arc::unwrap_or_clone(right))?;
        let changed = result.transformed;
        Ok((left, Arc::new(result.data), changed))
    }
}

impl AnalyzerRule for DeduplicateReferences {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_down(|plan| {
            if !plan.children_resolved() {
                return Ok(Transformed::no(plan));
            }
            match plan {
                LogicalPlan::Join(Join { left, right, join_type, condition }) => {
                    let (left, right, changed) = Self::dedup_binary(left, right)?;
                    let join = LogicalPlan::Join(Join { left, right, join_type, condition });
                    Ok(Transformed::new_transformed(join, changed))
                }
                LogicalPlan::Union(SetOp { left, right }) => {
                    let (left, right, changed) = Self::dedup_binary(left, right)?;
                    Ok(Transformed::new_transformed(LogicalPlan::Union(SetOp { left, right }), changed))
                }
                LogicalPlan::Intersect(SetOp { left, right }) => {
                    let (left, right, changed) = Self::dedup_binary(left, right)?;
                    Ok(Transformed::new_transformed(
                        LogicalPlan::Intersect(SetOp { left, right }),
                        changed,
                    ))
                }
                LogicalPlan::Except(SetOp { left, right }) => {
                    let (left, right, changed) = Self::dedup_binary(left, right)?;
                    Ok(Transformed::new_transformed(LogicalPlan::Except(SetOp { left, right }), changed))
                }
                plan => Ok(Transformed::no(plan)),
            }
        })
    }

    fn name(&self) -> &str {
        "DeduplicateReferences"
    }
}

/// Distinct aggregate functions are currently unsupported; this rule
/// surfaces the error before aggregate resolution would have to desugar
/// them.
#[derive(Debug)]
pub struct RewriteDistinctAggregates;

impl AnalyzerRule for RewriteDistinctAggregates {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.apply(|p| {
            for e in p.expressions() {
                if let Some(sql) = e.collect_first(|x| match x {
                    Expr::DistinctAggregateFunction(_) => Some(x.sql()),
                    _ => None,
                }) {
                    return Err(AnalysisError::UnsupportedOperation(format!(
                        "distinct aggregate function {}",
                        sql
                    )));
                }
            }
            Ok(crate::tree_node::TreeNodeRecursion::Continue)
        })?;
        Ok(Transformed::no(plan))
    }

    fn name(&self) -> &str {
        "RewriteDistinctAggregates"
    }
}

/// A sort above a projection may reference attributes the projection
/// pruned. Widen the projection, sort, then re-project the original output.
#[derive(Debug)]
pub struct ResolveSortReferences;

impl AnalyzerRule for ResolveSortReferences {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            LogicalPlan::Sort(Sort { order, child }) => {
                let pushable = match child.as_ref() {
                    LogicalPlan::Project(Project { project_list, child: grandchild })
                        if child.resolved()
                            && !project_list.iter().any(|e| e.contains_aggregate()) =>
                    {
                        Some((project_list.clone(), grandchild.clone()))
                    }
                    _ => None,
                };
                let Some((project_list, grandchild)) = pushable else {
                    return Ok(Transformed::no(LogicalPlan::Sort(Sort { order, child })));
                };
                let project_output = child.output();
                let below_output = grandchild.output();
                let mut extra: Vec<AttributeReference> = Vec::new();
                for e in &order {
                    for u in e.collect(|x| match x {
                        Expr::UnresolvedAttribute(u) => Some(u.clone()),
                        _ => None,
                    }) {
                        if project_output.iter().any(|a| a.matches(&u.name, u.qualifier.as_deref()))
                        {
                            continue;
                        }
                        let candidates: Vec<&AttributeReference> = below_output
                            .iter()
                            .filter(|a| a.matches(&u.name, u.qualifier.as_deref()))
                            .collect();
                        if candidates.len() == 1
                            && !extra.iter().any(|a| a.expr_id == candidates[0].expr_id)
                        {
                            extra.push(candidates[0].clone());
                        }
                    }
                }
                if extra.is_empty() {
                    return Ok(Transformed::no(LogicalPlan::Sort(Sort { order, child })));
                }
                let mut inner_list = project_list;
                inner_list.extend(extra.into_iter().map(Expr::AttributeReference));
                let inner = LogicalPlan::Project(Project::new(inner_list, grandchild));
                let sorted = LogicalPlan::Sort(Sort::new(order, Arc::new(inner)));
                let outer_list =
                    project_output.into_iter().map(Expr::AttributeReference).collect();
                Ok(Transformed::yes(LogicalPlan::Project(Project::new(
                    outer_list,
                    Arc::new(sorted),
                ))))
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "ResolveSortReferences"
    }
}

/// `DISTINCT` is sugar for grouping by the entire output.
#[derive(Debug)]
pub struct RewriteDistinctsAsAggregates;

impl AnalyzerRule for RewriteDistinctsAsAggregates {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            LogicalPlan::Distinct(Distinct { child }) if child.resolved() => {
                let output: Vec<Expr> =
                    child.output().into_iter().map(Expr::AttributeReference).collect();
                Ok(Transformed::yes(LogicalPlan::UnresolvedAggregate(UnresolvedAggregate::new(
                    child,
                    output.clone(),
                    output,
                ))))
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "RewriteDistinctsAsAggregates"
    }
}

/// A projection computing any aggregate function is an aggregate over the
/// empty grouping.
#[derive(Debug)]
pub struct GlobalAggregates;

impl AnalyzerRule for GlobalAggregates {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            LogicalPlan::Project(Project { project_list, child })
                if project_list.iter().any(|e| e.contains_aggregate()) =>
            {
                Ok(Transformed::yes(LogicalPlan::UnresolvedAggregate(UnresolvedAggregate::new(
                    child,
                    vec![],
                    project_list,
                ))))
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "GlobalAggregates"
    }
}

/// A filter directly above a pending aggregate is a having condition;
/// multiple stacked filters all merge in.
#[derive(Debug)]
pub struct MergeHavingConditions;

impl AnalyzerRule for MergeHavingConditions {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            LogicalPlan::Filter(Filter { condition, child })
                if matches!(child.as_ref(), LogicalPlan::UnresolvedAggregate(_)) =>
            {
                let mut agg = match Arc::unwrap_or_clone(child) {
                    LogicalPlan::UnresolvedAggregate(agg) => agg,
                    _ => unreachable!(),
                };
                agg.having.push(condition);
                Ok(Transformed::yes(LogicalPlan::UnresolvedAggregate(agg)))
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "MergeHavingConditions"
    }
}

/// A sort directly above a pending aggregate replaces the aggregate's
/// ordering; only the outermost sort survives.
#[derive(Debug)]
pub struct MergeSortsOverAggregates;

impl AnalyzerRule for MergeSortsOverAggregates {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up(|plan| match plan {
            LogicalPlan::Sort(Sort { order, child })
                if matches!(child.as_ref(), LogicalPlan::UnresolvedAggregate(_)) =>
            {
                let mut agg = match Arc::unwrap_or_clone(child) {
                    LogicalPlan::UnresolvedAggregate(agg) => agg,
                    _ => unreachable!(),
                };
                agg.order = order;
                Ok(Transformed::yes(LogicalPlan::UnresolvedAggregate(agg)))
            }
            plan => Ok(Transformed::no(plan)),
        })
    }

    fn name(&self) -> &str {
        "MergeSortsOverAggregates"
    }
}
