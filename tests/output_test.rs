mod common;

use std::io::Cursor;

use common::{SAMPLE_CROSSWALK, SAMPLE_FIPS, sample_rows};
use multigen_pums::models::person::decode_rows;
use multigen_pums::models::{CountyRow, StateRow};
use multigen_pums::{
    PipelineConfig, read_crosswalk, read_fips_table, rows_to_record_batch, run_pipeline,
    write_csv, write_json, write_rows_csv,
};

fn pipeline_output() -> multigen_pums::PipelineOutput {
    let persons = decode_rows(sample_rows()).unwrap();
    let crosswalk = read_crosswalk(Cursor::new(SAMPLE_CROSSWALK)).unwrap();
    let fips = read_fips_table(Cursor::new(SAMPLE_FIPS)).unwrap();
    run_pipeline(persons, &crosswalk, Some(&fips), &PipelineConfig::default()).unwrap()
}

fn csv_string<T>(rows: &[T], null_marker: &str) -> String
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    let batch = rows_to_record_batch(rows).unwrap();
    let mut buffer = Vec::new();
    write_csv(&mut buffer, &batch, null_marker).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[test]
fn test_county_rows_record_batch() {
    let output = pipeline_output();
    let batch = rows_to_record_batch(&output.counties).unwrap();

    assert_eq!(batch.num_rows(), 2);
    // 6 identifiers, 13 totals, 2 medians, 6 rates
    assert_eq!(batch.num_columns(), 27);
    let schema = batch.schema();
    assert_eq!(schema.field(0).name(), "state_fips");
    assert_eq!(schema.field(2).name(), "fips");
    assert_eq!(schema.field(26).name(), "non_white_multigen_pct");
}

#[test]
fn test_csv_header_and_null_marker() {
    let output = pipeline_output();
    let csv = csv_string(&output.states, "NA");
    let mut lines = csv.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with("state_fips,state,state_name,total_hh,total_population"));
    assert!(header.ends_with("white_multigen_pct,non_white_multigen_pct"));

    let row: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(row[0], "6");
    assert_eq!(row[1], "CA");
    assert_eq!(row[2], "California");
    // No White non-Hispanic heads: the white rate is undefined
    assert_eq!(row[row.len() - 2], "NA");
    assert!(lines.next().is_none());
}

#[test]
fn test_csv_custom_null_marker() {
    let rows = vec![StateRow {
        state: None,
        state_name: None,
        ..pipeline_output().states[0].clone()
    }];
    let csv = csv_string(&rows, "");
    let row = csv.lines().nth(1).unwrap();
    assert!(row.starts_with("6,,,"));
}

#[test]
fn test_write_files() {
    let output = pipeline_output();
    let dir = std::env::temp_dir().join(format!("multigen_pums_{}_out", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let county_path = dir.join("county_multigen.csv");
    write_rows_csv::<CountyRow>(&county_path, &output.counties, "NA").unwrap();
    let written = std::fs::read_to_string(&county_path).unwrap();
    assert_eq!(written.lines().count(), 3);
    assert!(written.contains("Los Angeles County"));

    let diagnostics_path = dir.join("diagnostics.json");
    write_json(&diagnostics_path, &output.diagnostics).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&diagnostics_path).unwrap()).unwrap();
    assert_eq!(json["county"]["unmatched_units"], 1);
    assert_eq!(json["county"]["unmatched_keys"][0], "06-00200");
    assert_eq!(json["reduction"]["households"], 3);

    std::fs::remove_dir_all(&dir).unwrap();
}
