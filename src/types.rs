use std::fmt::{Display, Formatter};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum DataType {
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Date,
    Timestamp,
    /// Element type plus whether elements may be null.
    Array(Box<DataType>, bool),
    /// Key type, value type, whether values may be null.
    Map(Box<DataType>, Box<DataType>, bool),
    Struct(Fields),
}

impl DataType {
    pub fn null_type() -> &'static DataType {
        static NULL: DataType = DataType::Null;
        &NULL
    }

    pub fn boolean_type() -> &'static DataType {
        static BOOLEAN: DataType = DataType::Boolean;
        &BOOLEAN
    }

    pub fn int_type() -> &'static DataType {
        static INT: DataType = DataType::Int32;
        &INT
    }

    pub fn long_type() -> &'static DataType {
        static LONG: DataType = DataType::Int64;
        &LONG
    }

    pub fn double_type() -> &'static DataType {
        static DOUBLE: DataType = DataType::Float64;
        &DOUBLE
    }

    pub fn string_type() -> &'static DataType {
        static STRING: DataType = DataType::String;
        &STRING
    }

    pub fn timestamp_type() -> &'static DataType {
        static TIMESTAMP: DataType = DataType::Timestamp;
        &TIMESTAMP
    }

    pub fn is_integral_type(&self) -> bool {
        matches!(self, DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64)
    }

    pub fn is_fractional_type(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_numeric_type(&self) -> bool {
        self.is_integral_type() || self.is_fractional_type()
    }

    /// Types with a total order usable by comparisons and sorts.
    pub fn is_ordered_type(&self) -> bool {
        self.is_numeric_type()
            || matches!(
                self,
                DataType::Boolean | DataType::String | DataType::Date | DataType::Timestamp
            )
    }

    pub fn is_atomic_type(&self) -> bool {
        !matches!(
            self,
            DataType::Null | DataType::Array(..) | DataType::Map(..) | DataType::Struct(_)
        )
    }

    pub fn is_complex_type(&self) -> bool {
        matches!(self, DataType::Array(..) | DataType::Map(..) | DataType::Struct(_))
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Null => write!(f, "null"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Int8 => write!(f, "tinyint"),
            DataType::Int16 => write!(f, "smallint"),
            DataType::Int32 => write!(f, "int"),
            DataType::Int64 => write!(f, "bigint"),
            DataType::Float32 => write!(f, "float"),
            DataType::Float64 => write!(f, "double"),
            DataType::String => write!(f, "string"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Array(element, _) => write!(f, "array<{}>", element),
            DataType::Map(key, value, _) => write!(f, "map<{},{}>", key, value),
            DataType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, field) in fields.0.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", field.name, field.data_type)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Field {
        Field { name: name.into(), data_type, nullable: true }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Field {
        self.nullable = nullable;
        self
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Fields(pub Vec<Field>);

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Schema {
        Schema { fields }
    }
}

/// Abstract types classify concrete types by capability; type constraints
/// use them to accept whole families of inputs.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum AbstractDataType {
    Numeric,
    Integral,
    Fractional,
    Ordered,
    Type(DataType),
    Collection(Vec<AbstractDataType>),
}

impl AbstractDataType {
    pub fn accepts_type(&self, data_type: &DataType) -> bool {
        match self {
            AbstractDataType::Numeric => data_type.is_numeric_type(),
            AbstractDataType::Integral => data_type.is_integral_type(),
            AbstractDataType::Fractional => data_type.is_fractional_type(),
            AbstractDataType::Ordered => data_type.is_ordered_type(),
            AbstractDataType::Type(expected) => expected == data_type,
            AbstractDataType::Collection(types) => types.iter().any(|t| t.accepts_type(data_type)),
        }
    }

    pub fn default_concrete_type(&self) -> DataType {
        match self {
            AbstractDataType::Numeric | AbstractDataType::Fractional => DataType::Float64,
            AbstractDataType::Integral => DataType::Int64,
            AbstractDataType::Ordered => DataType::String,
            AbstractDataType::Type(data_type) => data_type.clone(),
            AbstractDataType::Collection(types) => types[0].default_concrete_type(),
        }
    }

    pub fn is_numeric_type(&self) -> bool {
        match self {
            AbstractDataType::Numeric | AbstractDataType::Integral | AbstractDataType::Fractional => true,
            AbstractDataType::Type(data_type) => data_type.is_numeric_type(),
            _ => false,
        }
    }
}

impl Display for AbstractDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AbstractDataType::Numeric => write!(f, "numeric"),
            AbstractDataType::Integral => write!(f, "integral"),
            AbstractDataType::Fractional => write!(f, "fractional"),
            AbstractDataType::Ordered => write!(f, "ordered"),
            AbstractDataType::Type(data_type) => write!(f, "{}", data_type),
            AbstractDataType::Collection(types) => {
                write!(f, "one of [")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, "]")
            }
        }
    }
}

static NUMERIC_PRECEDENCE: [DataType; 6] = [
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Float32,
    DataType::Float64,
];

/// Least upper bound of two types without string promotion.
pub fn find_tightest_common_type(type1: &DataType, type2: &DataType) -> Option<DataType> {
    match (type1, type2) {
        (t1, t2) if t1 == t2 => Some(t1.clone()),
        (t1, DataType::Null) => Some(t1.clone()),
        (DataType::Null, t2) => Some(t2.clone()),
        (t1, t2) if t1.is_numeric_type() && t2.is_numeric_type() => {
            NUMERIC_PRECEDENCE.iter().rfind(|t| *t == t1 || *t == t2).cloned()
        }
        (DataType::Date, DataType::Timestamp) | (DataType::Timestamp, DataType::Date) => {
            Some(DataType::Timestamp)
        }
        _ => None,
    }
}

pub fn find_wider_type_for_two(type1: &DataType, type2: &DataType) -> Option<DataType> {
    find_tightest_common_type(type1, type2).or_else(|| string_promotion(type1, type2))
}

/// "Widest type": the least upper bound of a whole set, with string types
/// folded in first so promotion wins over numeric widening.
pub fn find_wider_common_type(types: Vec<DataType>) -> Option<DataType> {
    let (string_types, other_types): (Vec<_>, Vec<_>) =
        types.into_iter().partition(|t| t == &DataType::String);
    string_types
        .into_iter()
        .chain(other_types)
        .try_fold(DataType::Null, |r, c| find_wider_type_for_two(&r, &c))
}

fn string_promotion(type1: &DataType, type2: &DataType) -> Option<DataType> {
    match (type1, type2) {
        (DataType::String, t2) if t2.is_atomic_type() && t2 != &DataType::Boolean => {
            Some(DataType::String)
        }
        (t1, DataType::String) if t1.is_atomic_type() && t1 != &DataType::Boolean => {
            Some(DataType::String)
        }
        _ => None,
    }
}

/// Whether an implicit coercion from `from` to `to` is sanctioned. Implicit
/// coercions are either lossless widenings or the string conversions SQL
/// engines conventionally allow.
pub fn can_implicitly_cast(from: &DataType, to: &DataType) -> bool {
    match (from, to) {
        (f, t) if f == t => true,
        (DataType::Null, _) => true,
        (f, t) if f.is_numeric_type() && t.is_numeric_type() => true,
        (DataType::String, t) if t.is_numeric_type() => true,
        (DataType::String, DataType::Date | DataType::Timestamp | DataType::Boolean) => true,
        (f, DataType::String) if f.is_atomic_type() => true,
        (DataType::Date, DataType::Timestamp) => true,
        _ => false,
    }
}

/// Whether an explicit `CAST` between the two types can ever succeed.
pub fn can_cast(from: &DataType, to: &DataType) -> bool {
    match (from, to) {
        (f, t) if f == t => true,
        (DataType::Null, _) => true,
        (f, t) if f.is_atomic_type() && t.is_atomic_type() => !matches!(
            (f, t),
            (DataType::Boolean, DataType::Date | DataType::Timestamp)
                | (DataType::Date | DataType::Timestamp, DataType::Boolean)
        ),
        (DataType::Array(f, _), DataType::Array(t, _)) => can_cast(f, t),
        _ => false,
    }
}

/// Picks the concrete type an input should be cast to so that `expected`
/// accepts it, or None when no sanctioned coercion exists.
pub fn implicit_cast(in_type: &DataType, expected: &AbstractDataType) -> Option<DataType> {
    match (in_type, expected) {
        (t, expected) if expected.accepts_type(t) => Some(t.clone()),
        (DataType::Null, expected) => Some(expected.default_concrete_type()),
        // A function accepting any numeric fed a string follows the hive
        // convention and reads the string as a double.
        (DataType::String, AbstractDataType::Numeric) => Some(DataType::Float64),
        (t, expected) if t.is_numeric_type() && expected.is_numeric_type() => {
            Some(expected.default_concrete_type())
        }
        (DataType::String, AbstractDataType::Type(t)) if can_implicitly_cast(DataType::string_type(), t) => {
            Some(t.clone())
        }
        (t, AbstractDataType::Type(DataType::String)) if t.is_atomic_type() => Some(DataType::String),
        (t, AbstractDataType::Collection(types)) => types.iter().find_map(|e| implicit_cast(t, e)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widening() {
        assert_eq!(
            find_tightest_common_type(&DataType::Int32, &DataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(
            find_tightest_common_type(&DataType::Int64, &DataType::Float32),
            Some(DataType::Float32)
        );
        assert_eq!(find_tightest_common_type(&DataType::Null, &DataType::Int8), Some(DataType::Int8));
        assert_eq!(find_tightest_common_type(&DataType::Boolean, &DataType::Int8), None);
    }

    #[test]
    fn test_widest_common_type() {
        assert_eq!(
            find_wider_common_type(vec![DataType::Int8, DataType::Int32, DataType::Float64]),
            Some(DataType::Float64)
        );
        assert_eq!(
            find_wider_common_type(vec![DataType::String, DataType::Int32]),
            Some(DataType::String)
        );
        assert_eq!(find_wider_common_type(vec![DataType::Boolean, DataType::Int32]), None);
    }

    #[test]
    fn test_abstract_types() {
        assert!(AbstractDataType::Numeric.accepts_type(&DataType::Int16));
        assert!(!AbstractDataType::Numeric.accepts_type(&DataType::String));
        assert!(AbstractDataType::Integral.accepts_type(&DataType::Int64));
        assert!(!AbstractDataType::Integral.accepts_type(&DataType::Float32));
        assert!(AbstractDataType::Ordered.accepts_type(&DataType::Date));
        assert!(!AbstractDataType::Ordered.accepts_type(&DataType::Array(Box::new(DataType::Int32), true)));
    }

    #[test]
    fn test_implicit_cast() {
        assert!(can_implicitly_cast(&DataType::String, &DataType::Int32));
        assert!(can_implicitly_cast(&DataType::Int32, &DataType::String));
        assert!(can_implicitly_cast(&DataType::Date, &DataType::Timestamp));
        assert!(!can_implicitly_cast(&DataType::Timestamp, &DataType::Date));
        assert_eq!(
            implicit_cast(&DataType::String, &AbstractDataType::Numeric),
            Some(DataType::Float64)
        );
    }
}
