use std::any::Any;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use dyn_clone::DynClone;
use itertools::Itertools;

use crate::config;
use crate::data::Value;
use crate::expr::aggregate::AggregateFunction;
use crate::expr::type_constraint::TypeConstraint;
use crate::Operator;
use crate::types::DataType;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Expr {
    Literal(Literal),
    UnresolvedAttribute(UnresolvedAttribute),
    AttributeReference(AttributeReference),
    Alias(Alias),
    /// An auto-alias: a select item that still needs a name derived from its
    /// own rendering.
    UnresolvedAlias(Box<Expr>),
    /// Rewrite-internal alias bound to a grouping key.
    GroupingAlias(GeneratedAlias),
    /// Rewrite-internal alias bound to a collected aggregate function.
    AggregationAlias(GeneratedAlias),
    UnresolvedStar(Option<String>),
    UnresolvedFunction(UnresolvedFunction),
    Cast(Cast),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    BinaryOperator(BinaryOperator),
    In(In),
    Like(Like),
    SortOrder(SortOrder),
    ScalarFunction(Box<dyn ScalarFunction>),
    AggregateFunction(Box<dyn AggregateFunction>),
    DistinctAggregateFunction(Box<dyn AggregateFunction>),
}

impl Expr {
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_)
            | Expr::UnresolvedAttribute(_)
            | Expr::AttributeReference(_)
            | Expr::UnresolvedStar(_) => Vec::new(),
            Expr::Alias(Alias { child, .. })
            | Expr::GroupingAlias(GeneratedAlias { child, .. })
            | Expr::AggregationAlias(GeneratedAlias { child, .. })
            | Expr::Cast(Cast { child, .. })
            | Expr::SortOrder(SortOrder { child, .. })
            | Expr::UnresolvedAlias(child)
            | Expr::Not(child)
            | Expr::IsNull(child)
            | Expr::IsNotNull(child) => vec![child],
            Expr::BinaryOperator(BinaryOperator { left, right, .. }) => vec![left, right],
            Expr::In(In { value, list }) => {
                vec![value.as_ref()].into_iter().chain(list.iter()).collect()
            }
            Expr::Like(Like { expr, pattern }) => vec![expr, pattern],
            Expr::UnresolvedFunction(UnresolvedFunction { arguments, .. }) => {
                arguments.iter().collect()
            }
            Expr::ScalarFunction(f) => f.args(),
            Expr::AggregateFunction(f) | Expr::DistinctAggregateFunction(f) => f.args(),
        }
    }

    /// Rebuilds this node from a new child list, preserving all non-child
    /// fields. The list length must match [`Self::children`].
    pub fn with_new_children(self, children: Vec<Expr>) -> Expr {
        fn one(children: Vec<Expr>) -> Box<Expr> {
            let mut iter = children.into_iter();
            match (iter.next(), iter.next()) {
                (Some(child), None) => Box::new(child),
                _ => panic!("expected exactly one child"),
            }
        }
        match self {
            e @ (Expr::Literal(_)
            | Expr::UnresolvedAttribute(_)
            | Expr::AttributeReference(_)
            | Expr::UnresolvedStar(_)) => {
                assert!(children.is_empty(), "leaf expression takes no children");
                e
            }
            Expr::Alias(Alias { name, expr_id, .. }) => {
                Expr::Alias(Alias { child: one(children), name, expr_id })
            }
            Expr::UnresolvedAlias(_) => Expr::UnresolvedAlias(one(children)),
            Expr::GroupingAlias(GeneratedAlias { name, expr_id, .. }) => {
                Expr::GroupingAlias(GeneratedAlias { child: one(children), name, expr_id })
            }
            Expr::AggregationAlias(GeneratedAlias { name, expr_id, .. }) => {
                Expr::AggregationAlias(GeneratedAlias { child: one(children), name, expr_id })
            }
            Expr::Cast(Cast { data_type, .. }) => {
                Expr::Cast(Cast { child: one(children), data_type })
            }
            Expr::Not(_) => Expr::Not(one(children)),
            Expr::IsNull(_) => Expr::IsNull(one(children)),
            Expr::IsNotNull(_) => Expr::IsNotNull(one(children)),
            Expr::SortOrder(SortOrder { direction, .. }) => {
                Expr::SortOrder(SortOrder { child: one(children), direction })
            }
            Expr::BinaryOperator(BinaryOperator { op, .. }) => {
                let mut iter = children.into_iter();
                match (iter.next(), iter.next(), iter.next()) {
                    (Some(left), Some(right), None) => Expr::BinaryOperator(BinaryOperator {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    }),
                    _ => panic!("binary operator expects exactly two children"),
                }
            }
            Expr::In(_) => {
                let mut iter = children.into_iter();
                let value = Box::new(iter.next().expect("in expects a value"));
                Expr::In(In { value, list: iter.collect() })
            }
            Expr::Like(_) => {
                let mut iter = children.into_iter();
                match (iter.next(), iter.next(), iter.next()) {
                    (Some(expr), Some(pattern), None) => {
                        Expr::Like(Like { expr: Box::new(expr), pattern: Box::new(pattern) })
                    }
                    _ => panic!("like expects exactly two children"),
                }
            }
            Expr::UnresolvedFunction(UnresolvedFunction { name, distinct, .. }) => {
                Expr::UnresolvedFunction(UnresolvedFunction { name, arguments: children, distinct })
            }
            Expr::ScalarFunction(f) => Expr::ScalarFunction(f.rewrite_args(children)),
            Expr::AggregateFunction(f) => Expr::AggregateFunction(f.rewrite_args(children)),
            Expr::DistinctAggregateFunction(f) => {
                Expr::DistinctAggregateFunction(f.rewrite_args(children))
            }
        }
    }

    pub fn data_type(&self) -> &DataType {
        match self {
            Expr::UnresolvedAttribute(_)
            | Expr::UnresolvedStar(_)
            | Expr::UnresolvedFunction(_) => panic!("unresolved expression: {:?}", self),
            Expr::Literal(l) => &l.data_type,
            Expr::AttributeReference(a) => &a.data_type,
            Expr::Alias(a) => a.child.data_type(),
            Expr::UnresolvedAlias(child) => child.data_type(),
            Expr::GroupingAlias(g) | Expr::AggregationAlias(g) => g.child.data_type(),
            Expr::Cast(c) => &c.data_type,
            Expr::Not(_) | Expr::IsNull(_) | Expr::IsNotNull(_) | Expr::In(_) | Expr::Like(_) => {
                DataType::boolean_type()
            }
            Expr::BinaryOperator(BinaryOperator { left, op, .. }) => {
                if op.is_arithmetic() {
                    left.data_type()
                } else {
                    DataType::boolean_type()
                }
            }
            Expr::SortOrder(s) => s.child.data_type(),
            Expr::ScalarFunction(f) => f.data_type(),
            Expr::AggregateFunction(f) | Expr::DistinctAggregateFunction(f) => f.data_type(),
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            Expr::UnresolvedAttribute(_)
            | Expr::UnresolvedStar(_)
            | Expr::UnresolvedFunction(_) => true,
            Expr::Literal(l) => l.value.is_null(),
            Expr::AttributeReference(a) => a.nullable,
            Expr::Alias(a) => a.child.nullable(),
            Expr::UnresolvedAlias(child) => child.nullable(),
            Expr::GroupingAlias(g) | Expr::AggregationAlias(g) => g.child.nullable(),
            Expr::Cast(c) => c.child.nullable(),
            Expr::Not(child) => child.nullable(),
            Expr::IsNull(_) | Expr::IsNotNull(_) => false,
            Expr::BinaryOperator(BinaryOperator { left, right, .. }) => {
                left.nullable() || right.nullable()
            }
            Expr::In(In { value, list }) => value.nullable() || list.iter().any(|e| e.nullable()),
            Expr::Like(Like { expr, pattern }) => expr.nullable() || pattern.nullable(),
            Expr::SortOrder(s) => s.child.nullable(),
            Expr::ScalarFunction(f) => f.nullable(),
            Expr::AggregateFunction(f) | Expr::DistinctAggregateFunction(f) => f.nullable(),
        }
    }

    /// Name binding is complete for this expression and all of its children.
    /// Strict typing is checked separately by the type-check batch.
    pub fn resolved(&self) -> bool {
        match self {
            Expr::UnresolvedAttribute(_)
            | Expr::UnresolvedStar(_)
            | Expr::UnresolvedFunction(_)
            | Expr::UnresolvedAlias(_) => false,
            _ => self.children_resolved(),
        }
    }

    pub fn children_resolved(&self) -> bool {
        self.children().iter().all(|c| c.resolved())
    }

    /// Free of attribute references, aggregates and non-determinism, so the
    /// value is fixed at analysis time.
    pub fn foldable(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::UnresolvedAttribute(_)
            | Expr::UnresolvedStar(_)
            | Expr::UnresolvedFunction(_)
            | Expr::AttributeReference(_) => false,
            // Never fold named expressions, that would drop the name.
            Expr::Alias(_)
            | Expr::UnresolvedAlias(_)
            | Expr::GroupingAlias(_)
            | Expr::AggregationAlias(_) => false,
            Expr::AggregateFunction(_) | Expr::DistinctAggregateFunction(_) => false,
            Expr::ScalarFunction(f) => f.foldable(),
            _ => self.children().iter().all(|c| c.foldable()),
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        use crate::tree_node::TreeNode;
        self.exists(|e| {
            matches!(e, Expr::AggregateFunction(_) | Expr::DistinctAggregateFunction(_))
        })
    }

    /// The attribute a named expression exposes in a plan's output.
    pub fn to_attribute(&self) -> Option<AttributeReference> {
        match self {
            Expr::AttributeReference(a) => Some(a.clone()),
            Expr::Alias(Alias { child, name, expr_id }) if child.resolved() => {
                Some(AttributeReference {
                    name: name.clone(),
                    data_type: child.data_type().clone(),
                    nullable: child.nullable(),
                    qualifier: None,
                    expr_id: *expr_id,
                })
            }
            Expr::GroupingAlias(g) | Expr::AggregationAlias(g) if g.child.resolved() => {
                Some(AttributeReference {
                    name: g.name.clone(),
                    data_type: g.child.data_type().clone(),
                    nullable: g.child.nullable(),
                    qualifier: None,
                    expr_id: g.expr_id,
                })
            }
            _ => None,
        }
    }

    pub fn expr_id(&self) -> Option<u32> {
        match self {
            Expr::AttributeReference(a) => Some(a.expr_id),
            Expr::Alias(a) => Some(a.expr_id),
            Expr::GroupingAlias(g) | Expr::AggregationAlias(g) => Some(g.expr_id),
            _ => None,
        }
    }

    /// SQL-ish rendering, used for auto-alias names and error messages.
    pub fn sql(&self) -> String {
        match self {
            Expr::Literal(l) => l.value.to_string(),
            Expr::UnresolvedAttribute(u) => match &u.qualifier {
                Some(q) => format!("{}.{}", q, u.name),
                None => u.name.clone(),
            },
            Expr::AttributeReference(a) => a.name.clone(),
            Expr::Alias(a) => format!("{} AS {}", a.child.sql(), a.name),
            Expr::UnresolvedAlias(child) => child.sql(),
            Expr::GroupingAlias(g) | Expr::AggregationAlias(g) => g.child.sql(),
            Expr::UnresolvedStar(None) => "*".to_string(),
            Expr::UnresolvedStar(Some(q)) => format!("{}.*", q),
            Expr::UnresolvedFunction(UnresolvedFunction { name, arguments, distinct }) => {
                let args = arguments.iter().map(|a| a.sql()).join(", ");
                if *distinct {
                    format!("{}(distinct {})", name, args)
                } else {
                    format!("{}({})", name, args)
                }
            }
            Expr::Cast(c) => format!("cast({} as {})", c.child.sql(), c.data_type),
            Expr::Not(child) => format!("(not {})", child.sql()),
            Expr::IsNull(child) => format!("({} is null)", child.sql()),
            Expr::IsNotNull(child) => format!("({} is not null)", child.sql()),
            Expr::BinaryOperator(BinaryOperator { left, op, right }) => {
                format!("({} {} {})", left.sql(), op.sql_operator(), right.sql())
            }
            Expr::In(In { value, list }) => {
                format!("({} in ({}))", value.sql(), list.iter().map(|e| e.sql()).join(", "))
            }
            Expr::Like(Like { expr, pattern }) => {
                format!("({} like {})", expr.sql(), pattern.sql())
            }
            Expr::SortOrder(s) => format!("{} {}", s.child.sql(), s.direction.sql()),
            Expr::ScalarFunction(f) => {
                format!(
                    "{}({})",
                    f.name().to_ascii_lowercase(),
                    f.args().iter().map(|a| a.sql()).join(", ")
                )
            }
            Expr::AggregateFunction(f) => {
                format!(
                    "{}({})",
                    f.name().to_ascii_lowercase(),
                    f.args().iter().map(|a| a.sql()).join(", ")
                )
            }
            Expr::DistinctAggregateFunction(f) => {
                format!(
                    "{}(distinct {})",
                    f.name().to_ascii_lowercase(),
                    f.args().iter().map(|a| a.sql()).join(", ")
                )
            }
        }
    }

    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias(Alias::new(self, name.into()))
    }

    pub fn cast(self, data_type: DataType) -> Expr {
        Expr::Cast(Cast::new(self, data_type))
    }

    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self))
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNotNull(Box::new(self))
    }

    pub fn asc(self) -> Expr {
        Expr::SortOrder(SortOrder::new(self, SortDirection::Ascending))
    }

    pub fn desc(self) -> Expr {
        Expr::SortOrder(SortOrder::new(self, SortDirection::Descending))
    }

    pub fn lit(value: Value, data_type: DataType) -> Expr {
        Expr::Literal(Literal::new(value, data_type))
    }

    pub fn int_lit(v: i32) -> Expr {
        Expr::Literal(Literal::new(Value::Int32(v), DataType::Int32))
    }

    pub fn long_lit(v: i64) -> Expr {
        Expr::Literal(Literal::new(Value::Int64(v), DataType::Int64))
    }

    pub fn boolean_lit(v: bool) -> Expr {
        Expr::Literal(Literal::new(Value::Boolean(v), DataType::Boolean))
    }

    pub fn string_lit(s: impl Into<String>) -> Expr {
        Expr::Literal(Literal::new(Value::string(s), DataType::String))
    }

    pub fn null_lit() -> Expr {
        Expr::Literal(Literal::new(Value::Null, DataType::Null))
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Literal {
    pub value: Value,
    pub data_type: DataType,
}

impl Literal {
    pub fn new(value: Value, data_type: DataType) -> Self {
        Self { value, data_type }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct UnresolvedAttribute {
    pub name: String,
    pub qualifier: Option<String>,
}

impl UnresolvedAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), qualifier: None }
    }

    pub fn new_qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self { name: name.into(), qualifier: Some(qualifier.into()) }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AttributeReference {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub qualifier: Option<String>,
    pub expr_id: u32,
}

impl AttributeReference {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        AttributeReference {
            name: name.into(),
            data_type,
            nullable: true,
            qualifier: None,
            expr_id: ExprIdGenerator::next_expr_id(),
        }
    }

    pub fn new_with_expr_id(name: impl Into<String>, data_type: DataType, expr_id: u32) -> Self {
        AttributeReference { name: name.into(), data_type, nullable: true, qualifier: None, expr_id }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn with_expr_id(mut self, expr_id: u32) -> Self {
        self.expr_id = expr_id;
        self
    }

    /// A copy of this attribute with a freshly minted id.
    pub fn new_instance(&self) -> Self {
        let mut attr = self.clone();
        attr.expr_id = ExprIdGenerator::next_expr_id();
        attr
    }

    /// Whether `name` (optionally qualified) refers to this attribute under
    /// the configured case policy.
    pub fn matches(&self, name: &str, qualifier: Option<&str>) -> bool {
        config::name_eq(&self.name, name)
            && match qualifier {
                Some(q) => self.qualifier.as_deref().is_some_and(|aq| config::name_eq(aq, q)),
                None => true,
            }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Alias {
    pub child: Box<Expr>,
    pub name: String,
    pub expr_id: u32,
}

impl Alias {
    pub fn new(expr: Expr, name: impl Into<String>) -> Self {
        Self { child: Box::new(expr), name: name.into(), expr_id: ExprIdGenerator::next_expr_id() }
    }

    pub fn new_with_expr_id(expr: Expr, name: impl Into<String>, expr_id: u32) -> Self {
        Self { child: Box::new(expr), name: name.into(), expr_id }
    }
}

/// Alias minted by aggregate resolution. Never part of a final plan's
/// top-level output.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GeneratedAlias {
    pub child: Box<Expr>,
    pub name: String,
    pub expr_id: u32,
}

impl GeneratedAlias {
    pub fn new(expr: Expr) -> Self {
        let name = expr.sql();
        Self { child: Box::new(expr), name, expr_id: ExprIdGenerator::next_expr_id() }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct UnresolvedFunction {
    pub name: String,
    pub arguments: Vec<Expr>,
    pub distinct: bool,
}

impl UnresolvedFunction {
    pub fn new(name: impl Into<String>, arguments: Vec<Expr>, distinct: bool) -> Self {
        Self { name: name.into(), arguments, distinct }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Cast {
    pub child: Box<Expr>,
    pub data_type: DataType,
}

impl Cast {
    pub fn new(expr: Expr, data_type: DataType) -> Self {
        Self { child: Box::new(expr), data_type }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BinaryOperator {
    pub left: Box<Expr>,
    pub op: Operator,
    pub right: Box<Expr>,
}

impl BinaryOperator {
    pub fn new(left: Box<Expr>, op: Operator, right: Box<Expr>) -> Self {
        Self { left, op, right }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct In {
    pub value: Box<Expr>,
    pub list: Vec<Expr>,
}

impl In {
    pub fn new(value: Box<Expr>, list: Vec<Expr>) -> Self {
        Self { value, list }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Like {
    pub expr: Box<Expr>,
    pub pattern: Box<Expr>,
}

impl Like {
    pub fn new(expr: Box<Expr>, pattern: Box<Expr>) -> Self {
        Self { expr, pattern }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SortOrder {
    pub child: Box<Expr>,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(expr: Expr, direction: SortDirection) -> Self {
        Self { child: Box::new(expr), direction }
    }
}

pub struct ExprIdGenerator {
    counter: std::sync::atomic::AtomicU32,
}

impl ExprIdGenerator {
    /// Mints a process-unique expression id. Ids are unique across
    /// concurrently running analyzers; no ordering is guaranteed.
    pub fn next_expr_id() -> u32 {
        static INSTANCE: ExprIdGenerator =
            ExprIdGenerator { counter: std::sync::atomic::AtomicU32::new(0) };
        INSTANCE.counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

pub trait ScalarFunction: Debug + Send + Sync + DynClone {
    fn as_any(&self) -> &dyn Any;
    fn name(&self) -> &str;
    fn data_type(&self) -> &DataType;
    fn nullable(&self) -> bool {
        true
    }
    fn foldable(&self) -> bool {
        self.args().iter().all(|arg| arg.foldable())
    }
    fn args(&self) -> Vec<&Expr>;
    fn type_constraint(&self) -> TypeConstraint;
    fn rewrite_args(&self, args: Vec<Expr>) -> Box<dyn ScalarFunction>;
}

dyn_clone::clone_trait_object!(ScalarFunction);

impl PartialEq for Box<dyn ScalarFunction> {
    fn eq(&self, other: &Self) -> bool {
        if self.as_any().type_id() != other.as_any().type_id() {
            return false;
        }
        let args1 = self.args();
        let args2 = other.args();
        args1.len() == args2.len() && args1.iter().zip(args2.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for Box<dyn ScalarFunction> {}

impl Hash for Box<dyn ScalarFunction> {
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

    #[test]
    fn test_expr_ids_unique() {
        let a = AttributeReference::new("a", DataType::Int32);
        let b = AttributeReference::new("a", DataType::Int32);
        assert_ne!(a.expr_id, b.expr_id);
        assert_ne!(a.new_instance().expr_id, a.expr_id);
    }

    #[test]
    fn test_resolved() {
        let attr = Expr::AttributeReference(AttributeReference::new("a", DataType::Int32));
        assert!(attr.resolved());
        let unresolved = Expr::UnresolvedAttribute(UnresolvedAttribute::new("a"));
        assert!(!unresolved.resolved());
        let auto_alias = Expr::UnresolvedAlias(Box::new(attr.clone()));
        assert!(!auto_alias.resolved());
        assert!(attr.clone().alias("x").resolved());
    }

    #[test]
    fn test_foldable() {
        assert!(Expr::int_lit(1).foldable());
        let attr = Expr::AttributeReference(AttributeReference::new("a", DataType::Int32));
        assert!(!attr.foldable());
        let expr = crate::expr::binary_expr(Expr::int_lit(1), Operator::Plus, Expr::int_lit(2));
        assert!(expr.foldable());
        assert!(!expr.alias("x").foldable());
    }

    #[test]
    fn test_sql_rendering() {
        let attr = Expr::AttributeReference(AttributeReference::new("a", DataType::Int32));
        let expr = crate::expr::binary_expr(attr, Operator::Plus, Expr::int_lit(1));
        assert_eq!(expr.sql(), "(a + 1)");
        assert_eq!(Expr::string_lit("x").sql(), "'x'");
        assert_eq!(
            Expr::UnresolvedStar(Some("t".to_string())).sql(),
            "t.*"
        );
    }

    #[test]
    fn test_attribute_matches_qualifier() {
        let attr = AttributeReference::new("a", DataType::Int32).with_qualifier("t");
        assert!(attr.matches("a", None));
        assert!(attr.matches("a", Some("t")));
        assert!(!attr.matches("a", Some("s")));
        assert!(!attr.matches("b", None));
    }
}
