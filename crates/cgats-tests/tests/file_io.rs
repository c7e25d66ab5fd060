//! Reading and writing through the filesystem

use anyhow::Result;

use cgats_core::{Cgats, Error};
use cgats_tests::corpus::{self, ChartShape};

#[test]
fn test_file_round_trip_through_tempdir() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ramp.ti3");
    std::fs::write(&path, corpus::generate_chart(ChartShape::GrayRamp, 8))?;

    let doc = Cgats::from_file(&path)?;
    assert_eq!(doc.path(), Some(path.as_path()));
    let chart = doc.chart(0).unwrap();
    assert_eq!(doc.number_of_sets(chart), Some(8));

    // write(None) goes back to the originally-opened path
    doc.write(None)?;
    let reread = Cgats::from_file(&path)?;
    assert_eq!(reread.serialize(), doc.serialize());
    Ok(())
}

#[test]
fn test_write_to_explicit_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("copy.cal");
    let doc = Cgats::parse(&corpus::cal_chart())?;
    doc.write(Some(&out))?;
    let reread = Cgats::from_file(&out)?;
    assert_eq!(reread.charts().len(), 1);
    assert_eq!(reread.node(reread.chart(0).unwrap()).tag(), Some("CAL"));
    Ok(())
}

#[test]
fn test_write_to_sink() -> Result<()> {
    let doc = Cgats::parse(&corpus::cal_chart())?;
    let mut buf = Vec::new();
    doc.write_to(&mut buf)?;
    assert_eq!(String::from_utf8(buf)?, doc.serialize());
    Ok(())
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = Cgats::from_file("/nonexistent/chart.ti1").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_parse_from_open_reader() -> Result<()> {
    let text = corpus::generate_chart(ChartShape::RgbCube, 8);
    let doc = Cgats::from_reader(text.as_bytes())?;
    assert_eq!(doc.number_of_sets(doc.chart(0).unwrap()), Some(8));
    Ok(())
}

#[test]
fn test_parse_from_pre_split_lines() -> Result<()> {
    let text = corpus::generate_chart(ChartShape::RgbCube, 8);
    let lines: Vec<&str> = text.lines().collect();
    let doc = Cgats::from_lines(lines)?;
    assert_eq!(doc.number_of_sets(doc.chart(0).unwrap()), Some(8));
    Ok(())
}
