use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::TableError;

/// Fields of the service record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Id,
    ServiceDefinition,
    Interfaces,
    Port,
    ServiceUri,
    Udp,
}

/// The kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    List,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Id,
        Field::ServiceDefinition,
        Field::Interfaces,
        Field::Port,
        Field::ServiceUri,
        Field::Udp,
    ];

    /// Name of the field as it appears in data files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::ServiceDefinition => "serviceDefinition",
            Field::Interfaces => "interfaces",
            Field::Port => "port",
            Field::ServiceUri => "serviceURI",
            Field::Udp => "udp",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Id | Field::Port => FieldKind::Number,
            Field::Interfaces => FieldKind::List,
            Field::ServiceDefinition | Field::ServiceUri | Field::Udp => FieldKind::Text,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = TableError;

    // Matching is case insensitive so `serviceuri` and `serviceURI` both work on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TableError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl Value {
    /// Convert the raw text of a cell into a value of the given kind.
    ///
    /// Numbers must be finite, `NaN` and `inf` are rejected.
    pub fn parse(field: Field, raw: &str) -> Result<Self, TableError> {
        match field.kind() {
            FieldKind::Text => Ok(Value::Text(raw.to_string())),
            FieldKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Value::Number)
                .ok_or_else(|| TableError::InvalidValue {
                    field,
                    value: raw.to_string(),
                }),
            FieldKind::List => Ok(Value::List(
                raw.split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )),
        }
    }

    /// Natural less-than ordering. Values of one field always share a kind,
    /// mixed kinds only happen on hand built records and order numbers first.
    /// Numbers use the IEEE total order, a hand built NaN sorts after +inf.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Number(_), _) => Ordering::Less,
            (_, Value::Number(_)) => Ordering::Greater,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// One row of the table. Fields that are absent sort before present ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<Field, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: Value) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: Value) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// The display key of the record.
    pub fn service_definition(&self) -> Option<&str> {
        match self.get(Field::ServiceDefinition) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn display(&self, field: Field) -> String {
        self.get(field).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn compare_by(&self, other: &Record, field: Field) -> Ordering {
        match (self.get(field), other.get(field)) {
            (Some(a), Some(b)) => a.compare(b),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Static description of one displayed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub id: Field,
    pub label: String,
    pub numeric: bool,
    pub disable_padding: bool,
}

impl ColumnDescriptor {
    pub fn new(id: Field, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            numeric: id.kind() == FieldKind::Number && id != Field::Id,
            disable_padding: false,
        }
    }

    pub fn without_padding(mut self) -> Self {
        self.disable_padding = true;
        self
    }
}

pub fn service_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new(Field::Id, "ID").without_padding(),
        ColumnDescriptor::new(Field::ServiceDefinition, "Service Definition"),
        ColumnDescriptor::new(Field::Interfaces, "Interfaces"),
        ColumnDescriptor::new(Field::Port, "Port"),
        ColumnDescriptor::new(Field::ServiceUri, "Service URI"),
        ColumnDescriptor::new(Field::Udp, "UDP"),
    ]
}
