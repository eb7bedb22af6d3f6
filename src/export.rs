//! Flat tabular export: one `x_value,y_value` row per point.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::series::{DataPoint, DataSeries};

const HEADER: [&str; 2] = ["x_value", "y_value"];

#[derive(Debug, Serialize, Deserialize)]
struct Row {
    x_value: f64,
    y_value: f64,
}

/// Writes the series as CSV with a header row, even when it is empty.
pub fn write_csv<W: Write>(series: &DataSeries, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER)?;
    for p in series {
        wtr.serialize(Row {
            x_value: p.x,
            y_value: p.y,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(series: &DataSeries) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(series, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Reads a series written by [`write_csv`] (or any CSV with `x_value` and
/// `y_value` columns). Rows are re-sorted by `x`.
pub fn read_csv<R: Read>(reader: R) -> Result<DataSeries> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut points = Vec::new();
    for row in rdr.deserialize::<Row>() {
        let row = row?;
        points.push(DataPoint::new(row.x_value, row.y_value));
    }
    Ok(DataSeries::from_unsorted(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let series = DataSeries::from_unsorted(vec![DataPoint::new(1.5, -2.0), DataPoint::new(0.25, 3.0)]);
        let text = to_csv_string(&series).expect("csv");
        assert_eq!(text, "x_value,y_value\n0.25,3.0\n1.5,-2.0\n");
    }

    #[test]
    fn empty_series_still_has_header() {
        let text = to_csv_string(&DataSeries::default()).expect("csv");
        assert_eq!(text, "x_value,y_value\n");
    }

    #[test]
    fn reads_extra_columns_and_unsorted_rows() {
        let text = "y_value,x_value,label\n4.0,2.0,a\n1.0,-1.0,b\n";
        let series = read_csv(text.as_bytes()).expect("read");
        assert_eq!(series.points(), &[DataPoint::new(-1.0, 1.0), DataPoint::new(2.0, 4.0)]);
    }

    #[test]
    fn rejects_non_numeric_cells() {
        let text = "x_value,y_value\n1.0,abc\n";
        assert!(read_csv(text.as_bytes()).is_err());
    }
}
