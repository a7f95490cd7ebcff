//! CSV boundary: relational matrices, attribute tables, edge lists, and the
//! `Network Data` snapshots written next to the input files.
//!
//! ```text
//! matrix.csv      ,a,b,c          attributes.csv   id,gender,age
//!                 a,0,1,0                          a,F,30
//!                 b,1,0,1                          b,M,25
//!                 c,0,1,0
//!
//! edgelist.csv    sender,receiver[,value]
//! ```
//!
//! Matrix files carry node ids in the header row (after a leading index
//! cell) and in the first cell of every row; both must agree in order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::graph::SocialGraph;
use crate::model::{AnalysisInput, AttributeTable, AttributeValue, Matrix, NodeId, ReducedBlockMatrix};
use crate::transform::{make_binary, symmetrize, SymmetrizeMethod};
use crate::{Error, Result};

/// Directory that receives normalized copies of loaded inputs.
pub const NETWORK_DATA_DIR: &str = "Network Data";

/// Header written for the id column of attribute snapshots.
const ID_HEADER: &str = "node";

// ============================================================================
// Helpers
// ============================================================================

fn parse_error(path: &Path, record: &StringRecord, message: impl std::fmt::Display) -> Error {
    let line = record.position().map_or(0, |p| p.line());
    Error::Parse {
        file: Some(path.display().to_string()),
        message: format!("line {line}: {message}"),
    }
}

fn reader(path: &Path, delimiter: u8) -> Result<csv::Reader<std::fs::File>> {
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

fn parse_tie(path: &Path, record: &StringRecord, cell: &str) -> Result<f64> {
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f64>()
        .map_err(|_| parse_error(path, record, format!("'{cell}' is not a number")))
}

/// Sibling `Network Data` directory of `input`, created if needed.
pub fn network_data_dir(input: &Path) -> Result<PathBuf> {
    let dir = input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(NETWORK_DATA_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Numeric order when every id is an integer, string order otherwise.
fn sort_node_ids(ids: BTreeSet<String>) -> Vec<NodeId> {
    let mut ids: Vec<String> = ids.into_iter().collect();
    if ids.iter().all(|id| id.parse::<i64>().is_ok()) {
        ids.sort_by_key(|id| id.parse::<i64>().unwrap_or_default());
    }
    ids.into_iter().map(NodeId::from).collect()
}

// ============================================================================
// Matrices
// ============================================================================

/// Read a labeled adjacency matrix. Blank cells are 0.
pub fn read_matrix_csv(path: impl AsRef<Path>, delimiter: u8) -> Result<Matrix> {
    let path = path.as_ref();
    let mut rdr = reader(path, delimiter)?;
    let nodes: Vec<NodeId> = rdr.headers()?.iter().skip(1).map(NodeId::from).collect();

    let mut rows = Vec::with_capacity(nodes.len());
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row_id = record.get(0).unwrap_or_default();
        if nodes.get(i).is_none_or(|id| id.as_str() != row_id) {
            return Err(Error::AlignmentError(format!(
                "{}: row {} is labeled '{}' but column {} is '{}'",
                path.display(),
                i,
                row_id,
                i,
                nodes.get(i).map_or("", NodeId::as_str)
            )));
        }
        let row = record
            .iter()
            .skip(1)
            .map(|cell| parse_tie(path, &record, cell))
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    let matrix = Matrix::from_rows(nodes, rows)?;
    debug!(path = %path.display(), nodes = matrix.len(), "read matrix");
    Ok(matrix)
}

/// Write a matrix with a header row of ids and an id-prefixed row per node.
pub fn write_matrix_csv(path: impl AsRef<Path>, matrix: &Matrix, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    wtr.write_record(std::iter::once("").chain(matrix.nodes().iter().map(NodeId::as_str)))?;
    for (i, id) in matrix.nodes().iter().enumerate() {
        let cells = matrix.row(i).iter().map(f64::to_string);
        wtr.write_record(std::iter::once(id.to_string()).chain(cells))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a matrix and snapshot it unchanged as `Network Data/<file name>`.
pub fn read_matrix_file(path: impl AsRef<Path>, delimiter: u8) -> Result<Matrix> {
    let path = path.as_ref();
    let matrix = read_matrix_csv(path, delimiter)?;
    let name = path.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("matrix.csv"));
    let out = network_data_dir(path)?.join(name);
    write_matrix_csv(&out, &matrix, delimiter)?;
    Ok(matrix)
}

// ============================================================================
// In-place transforms
// ============================================================================

/// Symmetrize the matrix stored at `path` and write it back to the same file.
pub fn symmetrize_file(path: impl AsRef<Path>, method: SymmetrizeMethod, delimiter: u8) -> Result<Matrix> {
    let path = path.as_ref();
    let matrix = symmetrize(&read_matrix_file(path, delimiter)?, method);
    write_matrix_csv(path, &matrix, delimiter)?;
    info!(path = %path.display(), ?method, "symmetrized matrix");
    Ok(matrix)
}

/// Binarize the matrix stored at `path` and write it back to the same file.
pub fn binarize_file(path: impl AsRef<Path>, delimiter: u8) -> Result<Matrix> {
    let path = path.as_ref();
    let matrix = make_binary(&read_matrix_file(path, delimiter)?);
    write_matrix_csv(path, &matrix, delimiter)?;
    info!(path = %path.display(), "binarized matrix");
    Ok(matrix)
}

/// Write a reduced block matrix as `<basename>_blockmodeling.csv` in `dir`.
/// Block ids form the header row and the leading index column.
pub fn write_blockmodel_csv(
    dir: impl AsRef<Path>,
    basename: &str,
    reduced: &ReducedBlockMatrix,
    delimiter: u8,
) -> Result<PathBuf> {
    let path = dir.as_ref().join(format!("{basename}_blockmodeling.csv"));
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_path(&path)?;
    wtr.write_record(std::iter::once(String::new()).chain(reduced.blocks.iter().map(u32::to_string)))?;
    for (i, block) in reduced.blocks.iter().enumerate() {
        let cells = (0..reduced.len()).map(|j| reduced.get(i, j).to_string());
        wtr.write_record(std::iter::once(block.to_string()).chain(cells))?;
    }
    wtr.flush()?;
    info!(path = %path.display(), "wrote blockmodel");
    Ok(path)
}

// ============================================================================
// Edge lists
// ============================================================================

#[derive(Clone, Copy, PartialEq)]
enum EdgeListKind {
    Undirected,
    Directed,
    Valued,
}

impl EdgeListKind {
    fn suffix(self) -> &'static str {
        match self {
            EdgeListKind::Undirected => "matrix",
            EdgeListKind::Directed => "directed_matrix",
            EdgeListKind::Valued => "valued_matrix",
        }
    }
}

fn read_edgelist(path: &Path, delimiter: u8, kind: EdgeListKind) -> Result<Matrix> {
    let mut rdr = reader(path, delimiter)?;
    let mut edges = Vec::new();
    let mut ids = BTreeSet::new();

    for record in rdr.records() {
        let record = record?;
        let (Some(sender), Some(receiver)) = (record.get(0), record.get(1)) else {
            return Err(parse_error(path, &record, "expected sender and receiver columns"));
        };
        let value = match kind {
            EdgeListKind::Valued => {
                let cell = record
                    .get(2)
                    .ok_or_else(|| parse_error(path, &record, "missing tie value"))?;
                parse_tie(path, &record, cell)?
            }
            _ => 1.0,
        };
        ids.insert(sender.to_string());
        ids.insert(receiver.to_string());
        edges.push((NodeId::from(sender), NodeId::from(receiver), value));
    }

    let mut matrix = Matrix::zeros(sort_node_ids(ids))?;
    for (sender, receiver, value) in edges {
        let (Some(i), Some(j)) = (matrix.position(&sender), matrix.position(&receiver)) else {
            continue;
        };
        matrix.set(i, j, value);
        if kind == EdgeListKind::Undirected {
            matrix.set(j, i, value);
        }
    }

    let out = network_data_dir(path)?.join(format!("{}_{}.csv", file_stem(path), kind.suffix()));
    write_matrix_csv(&out, &matrix, delimiter)?;
    info!(input = %path.display(), output = %out.display(), nodes = matrix.len(), "converted edge list");
    Ok(matrix)
}

/// Sender/receiver pairs as a symmetric 0/1 matrix.
pub fn read_binary_edgelist_undirected(path: impl AsRef<Path>, delimiter: u8) -> Result<Matrix> {
    read_edgelist(path.as_ref(), delimiter, EdgeListKind::Undirected)
}

/// Sender/receiver pairs as a 0/1 matrix, ties from sender to receiver.
pub fn read_binary_edgelist_directed(path: impl AsRef<Path>, delimiter: u8) -> Result<Matrix> {
    read_edgelist(path.as_ref(), delimiter, EdgeListKind::Directed)
}

/// Sender/receiver/value triples as a valued matrix. Later rows overwrite
/// earlier rows for the same pair.
pub fn read_valued_edgelist(path: impl AsRef<Path>, delimiter: u8) -> Result<Matrix> {
    read_edgelist(path.as_ref(), delimiter, EdgeListKind::Valued)
}

// ============================================================================
// Attributes
// ============================================================================

/// Read an attribute table. The first column holds node ids.
pub fn read_attribute_csv(path: impl AsRef<Path>, delimiter: u8) -> Result<AttributeTable> {
    let path = path.as_ref();
    let mut rdr = reader(path, delimiter)?;
    let columns = rdr.headers()?.iter().skip(1).map(str::to_string).collect();
    let mut table = AttributeTable::new(columns);

    for record in rdr.records() {
        let record = record?;
        let id = record.get(0).unwrap_or_default();
        if id.is_empty() {
            return Err(parse_error(path, &record, "empty node id"));
        }
        let values = record.iter().skip(1).map(AttributeValue::parse).collect();
        table.push_row(id, values)?;
    }
    debug!(path = %path.display(), rows = table.len(), "read attributes");
    Ok(table)
}

pub fn write_attribute_csv(path: impl AsRef<Path>, table: &AttributeTable, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    wtr.write_record(std::iter::once(ID_HEADER).chain(table.columns().iter().map(String::as_str)))?;
    for (id, values) in table.rows() {
        let cells = values.iter().map(|v| match v {
            AttributeValue::Missing => String::new(),
            other => other.to_string(),
        });
        wtr.write_record(std::iter::once(id.to_string()).chain(cells))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read attributes, sort rows by node id, and snapshot them as
/// `Network Data/<basename>_attributes.csv`.
pub fn read_attribute_file(path: impl AsRef<Path>, delimiter: u8) -> Result<AttributeTable> {
    let path = path.as_ref();
    let table = read_attribute_csv(path, delimiter)?.sorted_by_node_id();
    let out = network_data_dir(path)?.join(format!("{}_attributes.csv", file_stem(path)));
    write_attribute_csv(&out, &table, delimiter)?;
    Ok(table)
}

// ============================================================================
// Loaded input
// ============================================================================

/// A relational matrix, its graph, and optional attributes, as loaded.
#[derive(Debug, Clone)]
pub struct LoadedNetwork {
    pub graph: SocialGraph,
    pub matrix: Matrix,
    pub attributes: Option<AttributeTable>,
}

impl LoadedNetwork {
    pub fn into_analysis_input(self) -> Result<AnalysisInput> {
        match self.attributes {
            Some(table) => AnalysisInput::with_attributes(self.matrix, table),
            None => Ok(AnalysisInput::RelationOnly(self.matrix)),
        }
    }
}

/// Load a relational matrix and, optionally, an attribute table.
pub fn read_input(
    relational: impl AsRef<Path>,
    attributes: Option<&Path>,
    config: &AnalysisConfig,
) -> Result<LoadedNetwork> {
    let delimiter = config.delimiter_byte()?;
    let matrix = read_matrix_file(relational, delimiter)?;
    let attributes = attributes
        .map(|p| read_attribute_csv(p, delimiter))
        .transpose()?;
    let graph = SocialGraph::from_matrix(&matrix, attributes.as_ref(), config.directed);
    Ok(LoadedNetwork { graph, matrix, attributes })
}
