//! Module for parsing and representing k-center instances.
//!
//! This module handles TSP-LIB style files. It supports Euclidean 2D coordinates,
//! explicit weight matrices (full or triangular) and weighted edge lists. Pairs that
//! never receive a weight stay undefined, which the fitness evaluator reports as a
//! missing edge weight.

use crate::error::{KCenterError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Distance lookup consumed by the search.
///
/// `distance` returns `None` when the graph has no weight for the pair.
pub trait DistanceOracle: Sync {
    /// Number of nodes; valid node indices are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Distance between two nodes, `None` if the pair has no weight.
    fn distance(&self, i: usize, j: usize) -> Option<f64>;
}

/// A node with display coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier (1-indexed in files, 0-indexed internally)
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Node {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Node { id, x, y }
    }
}

/// How the distances of an instance were obtained
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum EdgeWeightType {
    /// Euclidean distance between node coordinates
    Euclidean2D,
    /// Explicit weight matrix
    Explicit,
    /// Weighted edge list, possibly incomplete
    EdgeList,
}

/// Layout of an `EDGE_WEIGHT_SECTION`
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum WeightFormat {
    FullMatrix,
    UpperRow,
    LowerRow,
    UpperDiagRow,
    LowerDiagRow,
}

impl WeightFormat {
    fn parse(value: &str, line: usize) -> Result<Self> {
        match value {
            "FULL_MATRIX" => Ok(WeightFormat::FullMatrix),
            "UPPER_ROW" => Ok(WeightFormat::UpperRow),
            "LOWER_ROW" => Ok(WeightFormat::LowerRow),
            "UPPER_DIAG_ROW" => Ok(WeightFormat::UpperDiagRow),
            "LOWER_DIAG_ROW" => Ok(WeightFormat::LowerDiagRow),
            other => Err(KCenterError::parse(
                line,
                format!("Unsupported EDGE_WEIGHT_FORMAT: {}", other),
            )),
        }
    }

    fn expected_len(&self, n: usize) -> usize {
        match self {
            WeightFormat::FullMatrix => n * n,
            WeightFormat::UpperRow | WeightFormat::LowerRow => n * n.saturating_sub(1) / 2,
            WeightFormat::UpperDiagRow | WeightFormat::LowerDiagRow => n * (n + 1) / 2,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Section {
    Header,
    Coords,
    Display,
    Weights,
    Edges,
}

/// Represents a complete k-center instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KCenterInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Number of nodes
    pub dimension: usize,
    /// Node coordinates, empty when the instance only carries weights
    pub nodes: Vec<Node>,
    /// Where the distances come from
    pub edge_weight_type: EdgeWeightType,
    /// Distance matrix, `None` for pairs without a weight
    pub distance_matrix: Vec<Vec<Option<f64>>>,
}

impl KCenterInstance {
    /// Build a complete instance from an explicit square matrix.
    pub fn from_matrix(name: &str, matrix: Vec<Vec<f64>>) -> Result<Self> {
        let n = matrix.len();
        let mut distance_matrix = vec![vec![None; n]; n];

        for (i, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(KCenterError::invalid(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            for (j, &w) in row.iter().enumerate() {
                check_weight(w, i, j)?;
                distance_matrix[i][j] = Some(w);
            }
        }

        let instance = KCenterInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension: n,
            nodes: Vec::new(),
            edge_weight_type: EdgeWeightType::Explicit,
            distance_matrix,
        };
        instance.warn_if_asymmetric();
        Ok(instance)
    }

    /// Build an instance from undirected weighted edges.
    ///
    /// Pairs not listed stay undefined.
    pub fn from_edges(name: &str, dimension: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        let mut distance_matrix = vec![vec![None; dimension]; dimension];
        for i in 0..dimension {
            distance_matrix[i][i] = Some(0.0);
        }

        for &(i, j, w) in edges {
            if i >= dimension || j >= dimension {
                return Err(KCenterError::invalid(format!(
                    "edge ({}, {}) references a node outside 0..{}",
                    i, j, dimension
                )));
            }
            check_weight(w, i, j)?;
            distance_matrix[i][j] = Some(w);
            distance_matrix[j][i] = Some(w);
        }

        Ok(KCenterInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension,
            nodes: Vec::new(),
            edge_weight_type: EdgeWeightType::EdgeList,
            distance_matrix,
        })
    }

    /// Build a complete Euclidean instance from 2D points.
    pub fn from_coordinates(name: &str, points: &[(f64, f64)]) -> Self {
        let nodes: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Node::new(id, x, y))
            .collect();
        let distance_matrix = Self::compute_distance_matrix(&nodes);

        KCenterInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension: nodes.len(),
            nodes,
            edge_weight_type: EdgeWeightType::Euclidean2D,
            distance_matrix,
        }
    }

    /// Parse an instance from a TSP-LIB format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let mut instance = Self::from_reader(BufReader::new(file))?;
        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        Ok(instance)
    }

    /// Parse an instance held in a string
    pub fn parse_str(content: &str) -> Result<Self> {
        Self::from_reader(content.as_bytes())
    }

    /// Parse an instance from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension = 0usize;
        let mut weight_type: Option<EdgeWeightType> = None;
        let mut weight_format = WeightFormat::FullMatrix;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut display: Vec<(usize, f64, f64)> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut edges: Vec<(usize, usize, f64)> = Vec::new();

        let mut section = Section::Header;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            match line.trim_end_matches(':').trim() {
                "NODE_COORD_SECTION" => {
                    section = Section::Coords;
                    continue;
                }
                "DISPLAY_DATA_SECTION" => {
                    section = Section::Display;
                    continue;
                }
                "EDGE_WEIGHT_SECTION" => {
                    section = Section::Weights;
                    continue;
                }
                "EDGE_DATA_SECTION" => {
                    section = Section::Edges;
                    continue;
                }
                _ => {}
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "DIMENSION" => {
                        dimension = value
                            .parse()
                            .map_err(|_| KCenterError::parse(line_no, "Invalid dimension"))?;
                    }
                    "EDGE_WEIGHT_TYPE" => {
                        weight_type = Some(match value {
                            "EUC_2D" => EdgeWeightType::Euclidean2D,
                            "EXPLICIT" => EdgeWeightType::Explicit,
                            other => {
                                return Err(KCenterError::parse(
                                    line_no,
                                    format!("Unsupported EDGE_WEIGHT_TYPE: {}", other),
                                ))
                            }
                        });
                    }
                    "EDGE_WEIGHT_FORMAT" => weight_format = WeightFormat::parse(value, line_no)?,
                    // TYPE, EDGE_DATA_FORMAT, DISPLAY_DATA_TYPE and friends carry nothing we need
                    _ => {}
                }
                section = Section::Header;
                continue;
            }

            match section {
                Section::Coords | Section::Display => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() >= 3 {
                        let id: usize = parse_field(parts[0], line_no, "Invalid node id")?;
                        let x: f64 = parse_field(parts[1], line_no, "Invalid x coordinate")?;
                        let y: f64 = parse_field(parts[2], line_no, "Invalid y coordinate")?;
                        if section == Section::Coords {
                            coords.push((id, x, y));
                        } else {
                            display.push((id, x, y));
                        }
                    }
                }
                Section::Weights => {
                    for token in line.split_whitespace() {
                        weights.push(parse_field(token, line_no, "Invalid edge weight")?);
                    }
                }
                Section::Edges => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts[0] == "-1" {
                        section = Section::Header;
                        continue;
                    }
                    if parts.len() < 3 {
                        return Err(KCenterError::parse(line_no, "Edge without weight"));
                    }
                    let i: usize = parse_field(parts[0], line_no, "Invalid node id")?;
                    let j: usize = parse_field(parts[1], line_no, "Invalid node id")?;
                    let w: f64 = parse_field(parts[2], line_no, "Invalid edge weight")?;
                    if i == 0 || j == 0 {
                        return Err(KCenterError::parse(line_no, "Node ids are 1-indexed"));
                    }
                    edges.push((i - 1, j - 1, w));
                }
                Section::Header => {
                    return Err(KCenterError::parse(
                        line_no,
                        format!("Unexpected line outside of a section: {}", line),
                    ));
                }
            }
        }

        if dimension == 0 {
            return Err(KCenterError::parse(0, "Missing or zero DIMENSION"));
        }

        let weight_type = weight_type.unwrap_or(if !weights.is_empty() {
            EdgeWeightType::Explicit
        } else if !edges.is_empty() {
            EdgeWeightType::EdgeList
        } else {
            EdgeWeightType::Euclidean2D
        });

        let mut instance = match weight_type {
            EdgeWeightType::Euclidean2D => {
                if coords.len() != dimension {
                    return Err(KCenterError::parse(
                        0,
                        format!("Expected {} coordinates, found {}", dimension, coords.len()),
                    ));
                }
                let points = to_points(&coords, dimension)?;
                Self::from_coordinates(&name, &points)
            }
            EdgeWeightType::Explicit if weights.is_empty() && !edges.is_empty() => {
                Self::from_edges(&name, dimension, &edges)?
            }
            EdgeWeightType::Explicit => {
                let matrix = fill_explicit(dimension, weight_format, &weights)?;
                Self::from_matrix(&name, matrix)?
            }
            EdgeWeightType::EdgeList => Self::from_edges(&name, dimension, &edges)?,
        };

        if instance.nodes.is_empty() && display.len() == dimension {
            instance.nodes = to_points(&display, dimension)?
                .into_iter()
                .enumerate()
                .map(|(id, (x, y))| Node::new(id, x, y))
                .collect();
        }
        instance.comment = comment;

        Ok(instance)
    }

    /// Compute Euclidean distance matrix
    fn compute_distance_matrix(nodes: &[Node]) -> Vec<Vec<Option<f64>>> {
        let n = nodes.len();
        let mut matrix = vec![vec![Some(0.0); n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = nodes[i].x - nodes[j].x;
                    let dy = nodes[i].y - nodes[j].y;
                    matrix[i][j] = Some((dx * dx + dy * dy).sqrt());
                }
            }
        }

        matrix
    }

    fn warn_if_asymmetric(&self) {
        for i in 0..self.dimension {
            for j in i + 1..self.dimension {
                if let (Some(a), Some(b)) = (self.distance_matrix[i][j], self.distance_matrix[j][i]) {
                    if (a - b).abs() > 1e-9 {
                        log::warn!(
                            "Instance {} is asymmetric: d({},{})={} but d({},{})={}",
                            self.name, i, j, a, j, i, b
                        );
                        return;
                    }
                }
            }
        }
    }

    /// Whether node coordinates are available (needed for drawing)
    pub fn has_coordinates(&self) -> bool {
        self.nodes.len() == self.dimension && self.dimension > 0
    }

    /// Whether every pair of nodes has a weight
    pub fn is_complete(&self) -> bool {
        self.distance_matrix
            .iter()
            .all(|row| row.iter().all(Option::is_some))
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.dimension {
            for j in i + 1..self.dimension {
                if let Some(d) = self.distance_matrix[i][j] {
                    distances.push(d);
                }
            }
        }
        let total_pairs = self.dimension * self.dimension.saturating_sub(1) / 2;
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let min_distance = distances.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            defined_pairs: distances.len(),
            total_pairs,
            complete: self.is_complete(),
            has_coordinates: self.has_coordinates(),
            min_distance: if distances.is_empty() { 0.0 } else { min_distance },
            avg_distance,
            max_distance,
        }
    }
}

impl DistanceOracle for KCenterInstance {
    fn node_count(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn distance(&self, i: usize, j: usize) -> Option<f64> {
        if i == j {
            return Some(0.0);
        }
        self.distance_matrix.get(i)?.get(j).copied().flatten()
    }
}

fn parse_field<T: std::str::FromStr>(token: &str, line: usize, message: &str) -> Result<T> {
    token.parse().map_err(|_| KCenterError::parse(line, message))
}

fn check_weight(w: f64, i: usize, j: usize) -> Result<()> {
    if !w.is_finite() || w < 0.0 {
        return Err(KCenterError::invalid(format!(
            "weight between {} and {} must be finite and non-negative, got {}",
            i, j, w
        )));
    }
    Ok(())
}

/// Order 1-indexed coordinate records by id into a dense point list
fn to_points(records: &[(usize, f64, f64)], dimension: usize) -> Result<Vec<(f64, f64)>> {
    let mut points = vec![None; dimension];
    for &(id, x, y) in records {
        if id == 0 || id > dimension {
            return Err(KCenterError::parse(
                0,
                format!("Node id {} outside 1..={}", id, dimension),
            ));
        }
        points[id - 1] = Some((x, y));
    }
    points
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.ok_or_else(|| KCenterError::parse(0, format!("No coordinates for node {}", i + 1))))
        .collect()
}

fn set_symmetric(matrix: &mut [Vec<f64>], i: usize, j: usize, w: f64) {
    matrix[i][j] = w;
    matrix[j][i] = w;
}

fn fill_explicit(n: usize, format: WeightFormat, weights: &[f64]) -> Result<Vec<Vec<f64>>> {
    let expected = format.expected_len(n);
    if weights.len() < expected {
        return Err(KCenterError::parse(
            0,
            format!(
                "EDGE_WEIGHT_SECTION has {} values, {:?} needs {}",
                weights.len(),
                format,
                expected
            ),
        ));
    }

    let mut matrix = vec![vec![0.0; n]; n];
    let mut next = weights.iter().copied();

    // length was checked above, so `next` never runs dry
    match format {
        WeightFormat::FullMatrix => {
            for row in matrix.iter_mut() {
                for cell in row.iter_mut() {
                    *cell = next.next().unwrap_or_default();
                }
            }
        }
        WeightFormat::UpperRow => {
            for i in 0..n {
                for j in i + 1..n {
                    set_symmetric(&mut matrix, i, j, next.next().unwrap_or_default());
                }
            }
        }
        WeightFormat::LowerRow => {
            for i in 0..n {
                for j in 0..i {
                    set_symmetric(&mut matrix, i, j, next.next().unwrap_or_default());
                }
            }
        }
        WeightFormat::UpperDiagRow => {
            for i in 0..n {
                for j in i..n {
                    set_symmetric(&mut matrix, i, j, next.next().unwrap_or_default());
                }
            }
        }
        WeightFormat::LowerDiagRow => {
            for i in 0..n {
                for j in 0..=i {
                    set_symmetric(&mut matrix, i, j, next.next().unwrap_or_default());
                }
            }
        }
    }

    Ok(matrix)
}

/// Statistics about a k-center instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub defined_pairs: usize,
    pub total_pairs: usize,
    pub complete: bool,
    pub has_coordinates: bool,
    pub min_distance: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Nodes: {}", self.dimension)?;
        writeln!(
            f,
            "  Weighted pairs: {}/{} ({})",
            self.defined_pairs,
            self.total_pairs,
            if self.complete { "complete" } else { "incomplete" }
        )?;
        writeln!(f, "  Coordinates: {}", if self.has_coordinates { "yes" } else { "no" })?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}
