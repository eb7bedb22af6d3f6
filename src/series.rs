use serde::{Deserialize, Serialize};

/// A sample of the digitized curve in data space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Digitized curve, always ordered by ascending `x`.
///
/// Points sharing an `x` keep the order they were produced in, so loops and
/// vertical runs come out interleaved rather than reordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSeries {
    points: Vec<DataPoint>,
}

impl DataSeries {
    /// Sorts `points` by `x` (stable, NaN last) and wraps them.
    pub fn from_unsorted(mut points: Vec<DataPoint>) -> Self {
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self { points }
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.points.iter()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// `(min, max)` of the finite `x` values.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        finite_range(self.points.iter().map(|p| p.x))
    }

    /// `(min, max)` of the finite `y` values.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        finite_range(self.points.iter().map(|p| p.y))
    }
}

impl<'a> IntoIterator for &'a DataSeries {
    type Item = &'a DataPoint;
    type IntoIter = std::slice::Iter<'a, DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
