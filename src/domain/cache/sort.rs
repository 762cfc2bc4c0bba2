//! Client-side ordering of cached collections

use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::DomainError;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(DomainError::validation(format!(
                "Unknown sort direction: {}. Valid directions: asc, desc",
                s
            ))),
        }
    }
}

/// Value of a sortable field
///
/// Missing values sort before everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Missing,
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Timestamp(_) => 3,
        }
    }

    /// Natural ordering: numeric, lexicographic, chronological
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for SortValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<SortValue>> From<Option<T>> for SortValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Missing)
    }
}

/// Records that expose named fields for client-side sorting
pub trait Sortable {
    type Field: Copy + Debug + PartialEq + Send + Sync + 'static;

    fn sort_value(&self, field: Self::Field) -> SortValue;
}

/// Active ordering of a list cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> SortOrder<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

impl<F: FromStr<Err = DomainError>> FromStr for SortOrder<F> {
    type Err = DomainError;

    /// Parses `field` or `field:direction`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (s, SortDirection::Asc),
        };

        Ok(Self::new(field.parse()?, direction))
    }
}

/// Collection that remembers the order its items arrived in
///
/// Every [`arrange`](Self::arrange) starts from that arrival order, so
/// arranging twice gives the same result and descending is the exact
/// reverse of ascending, ties included.
#[derive(Debug, Clone, PartialEq)]
pub struct Arranged<T> {
    items: Vec<(usize, T)>,
    next_seq: usize,
}

impl<T> Arranged<T> {
    pub fn new(items: Vec<T>) -> Self {
        let next_seq = items.len();
        Self {
            items: items.into_iter().enumerate().collect(),
            next_seq,
        }
    }

    /// Adds an item after everything already present
    pub fn push(&mut self, item: T) {
        self.items.push((self.next_seq, item));
        self.next_seq += 1;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, item)| item)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items.into_iter().map(|(_, item)| item).collect()
    }
}

impl<T: Sortable> Arranged<T> {
    /// Orders by the field's natural order, ties by arrival
    pub fn arrange(&mut self, order: SortOrder<T::Field>) {
        self.items.sort_by(|(a_seq, a), (b_seq, b)| {
            a.sort_value(order.field)
                .natural_cmp(&b.sort_value(order.field))
                .then(a_seq.cmp(b_seq))
        });

        if order.direction == SortDirection::Desc {
            self.items.reverse();
        }
    }
}

impl<T> From<Vec<T>> for Arranged<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}
