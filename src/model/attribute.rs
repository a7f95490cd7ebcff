//! Node attributes: typed cell values, the attribute table, and
//! matrix-aligned attribute columns.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::{BlockLabeling, Matrix, NodeId};
use crate::{Error, Result};

/// Column name under which block labels are attached to an attribute table.
pub const BLOCK_COLUMN: &str = "Block";

// ============================================================================
// AttributeValue
// ============================================================================

/// A single attribute cell: categorical or numeric.
///
/// Equality and ordering are total, for sorting. Integers and floats compare
/// by numeric value; `Missing` sorts first and text sorts last. Group
/// membership goes through [`AttributeColumn::same`] instead, where blank and
/// NaN values match nothing.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl AttributeValue {
    /// Parse a raw CSV cell: integer, then float, then text. Blank is `Missing`.
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            return AttributeValue::Missing;
        }
        if let Ok(i) = cell.parse::<i64>() {
            return AttributeValue::Int(i);
        }
        if let Ok(f) = cell.parse::<f64>() {
            return AttributeValue::Float(f);
        }
        AttributeValue::Text(cell.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AttributeValue::Missing)
    }

    /// Blank or NaN: a value that never matches anything, itself included.
    pub fn is_undefined(&self) -> bool {
        match self {
            AttributeValue::Missing => true,
            AttributeValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            AttributeValue::Missing => 0,
            AttributeValue::Int(_) | AttributeValue::Float(_) => 1,
            AttributeValue::Text(_) => 2,
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttributeValue {}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use AttributeValue::*;
        match (self, other) {
            (Int(a), Int(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Missing, Missing) => Ordering::Equal,
            (a, b) if a.rank() == 1 && b.rank() == 1 => {
                // Mixed Int/Float
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                x.total_cmp(&y)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Text(s) => write!(f, "{s}"),
            AttributeValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Int(i as i64)
    }
}

impl From<u32> for AttributeValue {
    fn from(i: u32) -> Self {
        AttributeValue::Int(i as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        AttributeValue::Float(x)
    }
}

// ============================================================================
// AttributeColumn
// ============================================================================

/// One attribute's values, aligned index-for-index with a matrix.
///
/// The cohesion engine trusts this alignment; build columns through
/// [`AttributeTable::column`] to get it checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeColumn {
    pub name: String,
    pub values: Vec<AttributeValue>,
}

impl AttributeColumn {
    pub fn new<V: Into<AttributeValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&AttributeValue> {
        self.values.get(i)
    }

    /// Whether nodes `i` and `j` share a value. Undefined values (blank or
    /// NaN) share nothing, so a tie touching one is external.
    #[inline]
    pub fn same(&self, i: usize, j: usize) -> bool {
        let (a, b) = (&self.values[i], &self.values[j]);
        !a.is_undefined() && !b.is_undefined() && a == b
    }
}

// ============================================================================
// AttributeTable
// ============================================================================

/// Named attributes per node, rows in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeTable {
    columns: Vec<String>,
    rows: Vec<(NodeId, Vec<AttributeValue>)>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

impl AttributeTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new(), index: HashMap::new() }
    }

    /// Append a node's record. Values must match the column count.
    pub fn push_row(&mut self, node: impl Into<NodeId>, values: Vec<AttributeValue>) -> Result<()> {
        let node = node.into();
        if values.len() != self.columns.len() {
            return Err(Error::AlignmentError(format!(
                "node '{}' has {} attribute values, table has {} columns",
                node,
                values.len(),
                self.columns.len()
            )));
        }
        if self.index.contains_key(&node) {
            return Err(Error::AlignmentError(format!("duplicate attribute row for node '{node}'")));
        }
        self.index.insert(node.clone(), self.rows.len());
        self.rows.push((node, values));
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.rows.iter().map(|(id, _)| id)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&NodeId, &[AttributeValue])> {
        self.rows.iter().map(|(id, vals)| (id, vals.as_slice()))
    }

    pub fn record(&self, node: &NodeId) -> Option<&[AttributeValue]> {
        self.index.get(node).map(|&r| self.rows[r].1.as_slice())
    }

    pub fn value(&self, node: &NodeId, column: &str) -> Option<&AttributeValue> {
        let c = self.column_index(column)?;
        self.record(node).map(|rec| &rec[c])
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn first_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    /// Whether any node id appears both here and in the matrix.
    pub fn overlaps(&self, matrix: &Matrix) -> bool {
        self.nodes().any(|id| matrix.position(id).is_some())
    }

    /// Extract `column` in the matrix's node order.
    ///
    /// Attribute rows for nodes outside the matrix are ignored; a matrix node
    /// without an attribute row is an `AlignmentError`, never padded.
    pub fn column(&self, column: &str, matrix: &Matrix) -> Result<AttributeColumn> {
        let c = self.column_index(column).ok_or_else(|| {
            Error::AlignmentError(format!("attribute column '{column}' not found"))
        })?;
        let values = matrix
            .nodes()
            .iter()
            .map(|id| {
                self.record(id).map(|rec| rec[c].clone()).ok_or_else(|| {
                    Error::AlignmentError(format!("node '{id}' has no attribute row"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AttributeColumn { name: column.to_string(), values })
    }

    /// Copy of this table with a `Block` column holding each node's label.
    /// Nodes absent from the labeling get `Missing`.
    pub fn with_block_labels(&self, labels: &BlockLabeling) -> Self {
        let mut columns = self.columns.clone();
        columns.push(BLOCK_COLUMN.to_string());
        let rows = self
            .rows
            .iter()
            .map(|(id, vals)| {
                let mut vals = vals.clone();
                vals.push(labels.label_of(id).map_or(AttributeValue::Missing, AttributeValue::from));
                (id.clone(), vals)
            })
            .collect();
        Self { columns, rows, index: self.index.clone() }
    }

    /// Rows sorted by node id (string order), as attribute files are
    /// normalized on load.
    pub fn sorted_by_node_id(&self) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by(|(a, _), (b, _)| a.cmp(b));
        let index = rows.iter().enumerate().map(|(i, (id, _))| (id.clone(), i)).collect();
        Self { columns: self.columns.clone(), rows, index }
    }
}
