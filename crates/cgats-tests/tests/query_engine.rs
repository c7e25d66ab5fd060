//! Conjunctive query semantics over realistic documents

use cgats_core::{Cgats, Query, Value};
use cgats_tests::corpus::{self, ChartShape};

const WHITE_CHART: &str = "\
CTI3
DESCRIPTOR \"Output measurement\"
BEGIN_DATA_FORMAT
RGB_R RGB_G RGB_B XYZ_X XYZ_Y XYZ_Z
END_DATA_FORMAT
BEGIN_DATA
0 0 0 0.01 0.01 0.02
100 100 100 95.05 100.0 108.9
END_DATA
";

#[test]
fn test_white_patch_scenario() {
    let doc = Cgats::parse(WHITE_CHART).expect("parse");
    let q = Query::pair("RGB_R", 100)
        .and("RGB_G", 100)
        .and("RGB_B", 100)
        .extract("XYZ_Y");
    assert_eq!(
        doc.query_first_value(doc.root(), &q),
        Some(Value::Real(100.0))
    );
}

#[test]
fn test_conjunction_never_matches_partially() {
    let doc = Cgats::parse(WHITE_CHART).expect("parse");
    // every sample has RGB_R; none has a DESCRIPTOR
    let q = Query::pairs([("RGB_R", 100)]).and_key("DESCRIPTOR");
    assert!(doc.query_all(doc.root(), &q).is_empty());
    // value mismatch on the second key
    let q = Query::pairs([("RGB_R", 100), ("RGB_G", 0)]);
    assert!(doc.query_all(doc.root(), &q).is_empty());
}

#[test]
fn test_first_equals_head_of_all_in_depth_first_order() {
    let doc = Cgats::parse(&corpus::multi_chart(3)).expect("parse");
    for q in [
        Query::key("RGB_I"),
        Query::key("DESCRIPTOR"),
        Query::pair("RGB_I", 0.5),
        Query::key("NUMBER_OF_SETS"),
    ] {
        let all = doc.query_all(doc.root(), &q);
        assert!(!all.is_empty());
        assert_eq!(doc.query_first(doc.root(), &q), Some(all[0]));
    }
}

#[test]
fn test_all_matches_cover_every_chart() {
    let doc = Cgats::parse(&corpus::multi_chart(3)).expect("parse");
    let q = Query::key("DESCRIPTOR");
    assert_eq!(doc.query_all(doc.root(), &q).len(), 3);
    let values = doc.query_all_values(doc.root(), &q);
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| v.as_str() == Some("Device calibration curves")));
}

#[test]
fn test_derived_index_int_returns_position_plus_one() {
    let doc = Cgats::parse(&corpus::generate_chart(ChartShape::GrayRamp, 8)).expect("parse");
    let chart = doc.chart(0).unwrap();
    for p in 0..8 {
        let sample = doc.sample(chart, p).unwrap();
        assert_eq!(
            doc.value(sample, "SAMPLE_ID"),
            Some(Value::Int(p as i64 + 1))
        );
    }
}

#[test]
fn test_derived_index_float_normalizes_position() {
    let input = "\
CTI3
BEGIN_DATA_FORMAT
SAMPLE_ID V
END_DATA_FORMAT
BEGIN_DATA
0.5 0.1
0.5 0.2
0.5 0.3
0.5 0.4
0.5 0.5
END_DATA
";
    let doc = Cgats::parse(input).expect("parse");
    let chart = doc.chart(0).unwrap();
    for (p, expected) in [(0, 0.0), (2, 0.5), (4, 1.0)] {
        let sample = doc.sample(chart, p).unwrap();
        assert_eq!(
            doc.value(sample, "SAMPLE_ID"),
            Some(Value::Real(expected)),
            "position {p}"
        );
    }
}

#[test]
fn test_derived_index_single_row_is_zero() {
    let input = "CTI3\nBEGIN_DATA_FORMAT\nSAMPLE_ID V\nEND_DATA_FORMAT\nBEGIN_DATA\n0.5 0.1\nEND_DATA\n";
    let doc = Cgats::parse(input).expect("parse");
    let sample = doc.sample(doc.chart(0).unwrap(), 0).unwrap();
    assert_eq!(doc.value(sample, "SAMPLE_ID"), Some(Value::Real(0.0)));
}

#[test]
fn test_derived_index_requested_as_index_returns_position() {
    let input = "CTI3\nBEGIN_DATA_FORMAT\nINDEX V\nEND_DATA_FORMAT\nBEGIN_DATA\n7 0.1\n7 0.2\nEND_DATA\n";
    let doc = Cgats::parse(input).expect("parse");
    let chart = doc.chart(0).unwrap();
    let second = doc.sample(chart, 1).unwrap();
    // the stored 7 is shadowed by the row's own position
    assert_eq!(doc.value(second, "INDEX"), Some(Value::Int(1)));
}

#[test]
fn test_opaque_index_returned_verbatim() {
    let doc = Cgats::parse(&corpus::generate_chart(ChartShape::OpaqueIds, 12)).expect("parse");
    let chart = doc.chart(0).unwrap();
    let sample = doc.sample(chart, 7).unwrap();
    assert_eq!(
        doc.value(sample, "SAMPLE_ID"),
        Some(Value::Text("B2".to_string()))
    );
}

#[test]
fn test_reindex_keeps_queries_consistent() {
    let doc_text = corpus::generate_chart(ChartShape::GrayRamp, 8);
    let mut doc = Cgats::parse(&doc_text).expect("parse");
    let chart = doc.chart(0).unwrap();
    let data = doc.get_data(chart).unwrap();
    let victim = doc.sample(data, 3).unwrap();
    let gone = doc.value(victim, "XYZ_Y").unwrap();
    doc.remove(victim).unwrap();

    let q = Query::key("XYZ_Y");
    let values = doc.query_all_values(doc.root(), &q);
    assert_eq!(values.len(), 7);
    assert!(!values.contains(&gone));
}

#[test]
fn test_synthetic_keys_are_queryable() {
    let doc = Cgats::parse(WHITE_CHART).expect("parse");
    let chart = doc.chart(0).unwrap();
    assert_eq!(
        doc.query_first(doc.root(), &Query::pair("NUMBER_OF_FIELDS", 6)),
        Some(chart)
    );
    assert_eq!(
        doc.query_first(doc.root(), &Query::pair("NUMBER_OF_SETS", 3)),
        None
    );
}
