use std::collections::HashSet;
use std::sync::Arc;

use crate::expr::{AttributeReference, Expr};
use crate::tree_node::TreeNode;
use crate::types::Schema;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum LogicalPlan {
    UnresolvedRelation(String),
    Relation(Relation),
    OneRowRelation,
    Project(Project),
    Filter(Filter),
    Sort(Sort),
    Limit(Limit),
    Join(Join),
    Union(SetOp),
    Intersect(SetOp),
    Except(SetOp),
    SubqueryAlias(SubqueryAlias),
    With(With),
    Distinct(Distinct),
    UnresolvedAggregate(UnresolvedAggregate),
    Aggregate(Aggregate),
}

impl LogicalPlan {
    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::UnresolvedRelation(_)
            | LogicalPlan::Relation(_)
            | LogicalPlan::OneRowRelation => vec![],
            LogicalPlan::Project(Project { child, .. })
            | LogicalPlan::Filter(Filter { child, .. })
            | LogicalPlan::Sort(Sort { child, .. })
            | LogicalPlan::Limit(Limit { child, .. })
            | LogicalPlan::SubqueryAlias(SubqueryAlias { child, .. })
            | LogicalPlan::Distinct(Distinct { child })
            | LogicalPlan::UnresolvedAggregate(UnresolvedAggregate { child, .. })
            | LogicalPlan::Aggregate(Aggregate { child, .. }) => vec![child.as_ref()],
            LogicalPlan::With(With { child, cte, .. }) => vec![child.as_ref(), cte.as_ref()],
            LogicalPlan::Join(Join { left, right, .. })
            | LogicalPlan::Union(SetOp { left, right })
            | LogicalPlan::Intersect(SetOp { left, right })
            | LogicalPlan::Except(SetOp { left, right }) => vec![left.as_ref(), right.as_ref()],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogicalPlan::UnresolvedRelation(_) => "UnresolvedRelation",
            LogicalPlan::Relation(_) => "Relation",
            LogicalPlan::OneRowRelation => "OneRowRelation",
            LogicalPlan::Project(_) => "Project",
            LogicalPlan::Filter(_) => "Filter",
            LogicalPlan::Sort(_) => "Sort",
            LogicalPlan::Limit(_) => "Limit",
            LogicalPlan::Join(_) => "Join",
            LogicalPlan::Union(_) => "Union",
            LogicalPlan::Intersect(_) => "Intersect",
            LogicalPlan::Except(_) => "Except",
            LogicalPlan::SubqueryAlias(_) => "SubqueryAlias",
            LogicalPlan::With(_) => "With",
            LogicalPlan::Distinct(_) => "Distinct",
            LogicalPlan::UnresolvedAggregate(_) => "UnresolvedAggregate",
            LogicalPlan::Aggregate(_) => "Aggregate",
        }
    }

    pub fn expressions(&self) -> Vec<&Expr> {
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
            | LogicalPlan::Except(_) => vec![],
            LogicalPlan::Project(Project { project_list, .. }) => project_list.iter().collect(),
            LogicalPlan::Filter(Filter { condition, .. }) => vec![condition],
            LogicalPlan::Sort(Sort { order, .. }) => order.iter().collect(),
            LogicalPlan::Join(Join { condition, .. }) => condition.iter().collect(),
            LogicalPlan::UnresolvedAggregate(agg) => agg
                .groupings
                .iter()
                .chain(agg.project_list.iter())
                .chain(agg.having.iter())
                .chain(agg.order.iter())
                .collect(),
            LogicalPlan::Aggregate(Aggregate { grouping_aliases, aggregation_aliases, .. }) => {
                grouping_aliases.iter().chain(aggregation_aliases.iter()).collect()
            }
        }
    }

    /// Name binding is complete below and at this node. The unresolved plan
    /// shapes are never resolved regardless of their contents: they have to
    /// be rewritten away.
    pub fn resolved(&self) -> bool {
        match self {
            LogicalPlan::UnresolvedRelation(_)
            | LogicalPlan::With(_)
            | LogicalPlan::UnresolvedAggregate(_) => false,
            _ => self.expressions().iter().all(|e| e.resolved()) && self.children_resolved(),
        }
    }

    pub fn children_resolved(&self) -> bool {
        self.children().iter().all(|c| c.resolved())
    }

    pub fn output(&self) -> Vec<AttributeReference> {
        match self {
            LogicalPlan::UnresolvedRelation(_) | LogicalPlan::OneRowRelation => vec![],
            LogicalPlan::Relation(Relation { output, .. }) => output.clone(),
            LogicalPlan::Project(Project { project_list, .. }) => {
                project_list.iter().filter_map(|e| e.to_attribute()).collect()
            }
            LogicalPlan::Filter(Filter { child, .. })
            | LogicalPlan::Sort(Sort { child, .. })
            | LogicalPlan::Limit(Limit { child, .. })
            | LogicalPlan::Distinct(Distinct { child })
            | LogicalPlan::With(With { child, .. }) => child.output(),
            LogicalPlan::SubqueryAlias(subquery_alias) => subquery_alias.output(),
            LogicalPlan::Join(join) => join.output(),
            LogicalPlan::Union(SetOp { left, right })
            | LogicalPlan::Intersect(SetOp { left, right })
            | LogicalPlan::Except(SetOp { left, right }) => {
                // the left side names the output, nullability merges in the
                // right side's by position
                let right_output = right.output();
                left.output()
                    .into_iter()
                    .enumerate()
                    .map(|(i, a)| {
                        let nullable =
                            a.nullable || right_output.get(i).map(|r| r.nullable).unwrap_or(false);
                        a.with_nullable(nullable)
                    })
                    .collect()
            }
            LogicalPlan::UnresolvedAggregate(UnresolvedAggregate { project_list, .. }) => {
                project_list.iter().filter_map(|e| e.to_attribute()).collect()
            }
            LogicalPlan::Aggregate(Aggregate { grouping_aliases, aggregation_aliases, .. }) => {
                grouping_aliases
                    .iter()
                    .chain(aggregation_aliases.iter())
                    .filter_map(|e| e.to_attribute())
                    .collect()
            }
        }
    }

    pub fn child_attributes(&self) -> Vec<AttributeReference> {
        self.children().into_iter().flat_map(|p| p.output()).collect()
    }

    /// No binary operator in this subtree has sibling outputs sharing an
    /// attribute id.
    pub fn deduplicated(&self) -> bool {
        !self.exists(|p| match p {
            LogicalPlan::Join(Join { left, right, .. })
            | LogicalPlan::Union(SetOp { left, right })
            | LogicalPlan::Intersect(SetOp { left, right })
            | LogicalPlan::Except(SetOp { left, right }) => {
                let left_ids: HashSet<u32> = left.output().iter().map(|a| a.expr_id).collect();
                right.output().iter().any(|a| left_ids.contains(&a.expr_id))
            }
            _ => false,
        })
    }
}

/// A resolved leaf relation. Lookups of the same table share attribute ids;
/// reference deduplication mints fresh instances when both sides of a join
/// resolve to the same relation.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Relation {
    pub name: String,
    pub output: Vec<AttributeReference>,
}

impl Relation {
    pub fn new(name: impl Into<String>, schema: &Schema) -> Self {
        let name = name.into();
        let output = schema
            .fields
            .iter()
            .map(|f| {
                AttributeReference::new(f.name.clone(), f.data_type.clone())
                    .with_nullable(f.nullable)
                    .with_qualifier(name.clone())
            })
            .collect();
        Self { name, output }
    }

    /// A copy of this relation with every output id regenerated.
    pub fn new_instance(&self) -> Self {
        Relation {
            name: self.name.clone(),
            output: self.output.iter().map(|a| a.new_instance()).collect(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Project {
    pub project_list: Vec<Expr>,
    pub child: Arc<LogicalPlan>,
}

impl Project {
    pub fn new(project_list: Vec<Expr>, child: Arc<LogicalPlan>) -> Self {
        Self { project_list, child }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Filter {
    pub condition: Expr,
    pub child: Arc<LogicalPlan>,
}

impl Filter {
    pub fn new(condition: Expr, child: Arc<LogicalPlan>) -> Self {
        Self { condition, child }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Sort {
    /// `Expr::SortOrder` wrappers.
    pub order: Vec<Expr>,
    pub child: Arc<LogicalPlan>,
}

impl Sort {
    pub fn new(order: Vec<Expr>, child: Arc<LogicalPlan>) -> Self {
        Self { order, child }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Limit {
    pub limit: usize,
    pub child: Arc<LogicalPlan>,
}

impl Limit {
    pub fn new(limit: usize, child: Arc<LogicalPlan>) -> Self {
        Self { limit, child }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Join {
    pub left: Arc<LogicalPlan>,
    pub right: Arc<LogicalPlan>,
    pub join_type: JoinType,
    pub condition: Option<Expr>,
}

impl Join {
    pub fn new(
        left: Arc<LogicalPlan>,
        right: Arc<LogicalPlan>,
        join_type: JoinType,
        condition: Option<Expr>,
    ) -> Self {
        Self { left, right, join_type, condition }
    }

    pub fn output(&self) -> Vec<AttributeReference> {
        let left = self.left.output();
        let right = self.right.output();
        match self.join_type {
            JoinType::Inner | JoinType::Cross => left.into_iter().chain(right).collect(),
            JoinType::LeftOuter => left
                .into_iter()
                .chain(right.into_iter().map(|a| a.with_nullable(true)))
                .collect(),
            JoinType::RightOuter => left
                .into_iter()
                .map(|a| a.with_nullable(true))
                .chain(right)
                .collect(),
            JoinType::FullOuter => left
                .into_iter()
                .chain(right)
                .map(|a| a.with_nullable(true))
                .collect(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SetOp {
    pub left: Arc<LogicalPlan>,
    pub right: Arc<LogicalPlan>,
}

impl SetOp {
    pub fn new(left: Arc<LogicalPlan>, right: Arc<LogicalPlan>) -> Self {
        Self { left, right }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SubqueryAlias {
    pub identifier: String,
    pub child: Arc<LogicalPlan>,
}

impl SubqueryAlias {
    pub fn new(identifier: impl Into<String>, child: Arc<LogicalPlan>) -> Self {
        Self { identifier: identifier.into(), child }
    }

    pub fn output(&self) -> Vec<AttributeReference> {
        self.child
            .output()
            .into_iter()
            .map(|a| a.with_qualifier(self.identifier.clone()))
            .collect()
    }
}

/// A common table expression scope: `cte` is visible under `name` inside
/// `child`. Always removed by CTE inlining.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct With {
    pub child: Arc<LogicalPlan>,
    pub name: String,
    pub cte: Arc<LogicalPlan>,
}

impl With {
    pub fn new(child: Arc<LogicalPlan>, name: impl Into<String>, cte: Arc<LogicalPlan>) -> Self {
        Self { child, name: name.into(), cte }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Distinct {
    pub child: Arc<LogicalPlan>,
}

impl Distinct {
    pub fn new(child: Arc<LogicalPlan>) -> Self {
        Self { child }
    }
}

/// The pre-resolution aggregate shape: grouping keys, the select list, and
/// any having/ordering collected from adjacent nodes, all still expressed
/// over the child's attributes.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct UnresolvedAggregate {
    pub child: Arc<LogicalPlan>,
    pub groupings: Vec<Expr>,
    pub project_list: Vec<Expr>,
    pub having: Vec<Expr>,
    pub order: Vec<Expr>,
}

impl UnresolvedAggregate {
    pub fn new(child: Arc<LogicalPlan>, groupings: Vec<Expr>, project_list: Vec<Expr>) -> Self {
        Self { child, groupings, project_list, having: vec![], order: vec![] }
    }
}

/// The resolved aggregate: only grouping aliases and aggregation aliases,
/// every outer reference goes through their attributes.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Aggregate {
    pub child: Arc<LogicalPlan>,
    /// `Expr::GroupingAlias` entries.
    pub grouping_aliases: Vec<Expr>,
    /// `Expr::AggregationAlias` entries.
    pub aggregation_aliases: Vec<Expr>,
}

impl Aggregate {
    pub fn new(
        child: Arc<LogicalPlan>,
        grouping_aliases: Vec<Expr>,
        aggregation_aliases: Vec<Expr>,
    ) -> Self {
        Self { child, grouping_aliases, aggregation_aliases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field};

    fn relation() -> Relation {
        Relation::new(
            "t",
            &Schema::new(vec![Field::new("a", DataType::Int32), Field::new("b", DataType::Int32)]),
        )
    }

    #[test]
    fn test_relation_new_instance_regenerates_ids() {
        let r = relation();
        let fresh = r.new_instance();
        assert_eq!(r.output.len(), fresh.output.len());
        for (a, b) in r.output.iter().zip(fresh.output.iter()) {
            assert_eq!(a.name, b.name);
            assert_ne!(a.expr_id, b.expr_id);
        }
    }

    #[test]
    fn test_self_join_not_deduplicated() {
        let r = Arc::new(LogicalPlan::Relation(relation()));
        let join = LogicalPlan::Join(Join::new(r.clone(), r.clone(), JoinType::Inner, None));
        assert!(!join.deduplicated());

        let fresh = match r.as_ref() {
            LogicalPlan::Relation(rel) => Arc::new(LogicalPlan::Relation(rel.new_instance())),
            _ => unreachable!(),
        };
        let join = LogicalPlan::Join(Join::new(r, fresh, JoinType::Inner, None));
        assert!(join.deduplicated());
    }

    #[test]
    fn test_subquery_alias_qualifies_output() {
        let r = Arc::new(LogicalPlan::Relation(relation()));
        let aliased = SubqueryAlias::new("s", r);
        assert!(aliased.output().iter().all(|a| a.qualifier.as_deref() == Some("s")));
    }

    #[test]
    fn test_unresolved_aggregate_never_resolved() {
        let r = Arc::new(LogicalPlan::Relation(relation()));
        let attr = r.output()[0].clone();
        let agg = LogicalPlan::UnresolvedAggregate(UnresolvedAggregate::new(
            r,
            vec![Expr::AttributeReference(attr.clone())],
            vec![Expr::AttributeReference(attr)],
        ));
        assert!(!agg.resolved());
    }
}
