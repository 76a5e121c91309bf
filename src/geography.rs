//! Geographic reference table readers
//!
//! The PUMA→county crosswalk is tab-separated; the county FIPS table is
//! comma-separated. Both are read as all-string tables with the Arrow CSV
//! reader and parsed row by row, so a malformed row is reported with its
//! line number.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::{info, warn};

use crate::error::{MultigenError, Result};
use crate::models::crosswalk::{Crosswalk, CrosswalkEntry};
use crate::models::fips::{CountyLabel, FipsTable};
use crate::models::geo::CountyFips;
use crate::models::person::PumaKey;

/// `state` value marking the label row that follows the crosswalk header
pub const CROSSWALK_LABEL_SENTINEL: &str = "State code";

/// A delimited table read as strings
struct StringTable {
    header: Vec<String>,
    batches: Vec<RecordBatch>,
}

impl StringTable {
    fn read<R: Read>(reader: R, delimiter: u8, table: &'static str) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut header_line = String::new();
        if reader.read_line(&mut header_line)? == 0 {
            return Err(MultigenError::InvalidReference {
                table,
                line: 1,
                detail: "missing header".to_string(),
            });
        }

        let header: Vec<String> = header_line
            .trim_end_matches(['\r', '\n'])
            .split(char::from(delimiter))
            .map(|name| name.trim().trim_matches('"').to_string())
            .collect();
        let schema = Schema::new(
            header
                .iter()
                .map(|name| Field::new(name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );

        let csv = ReaderBuilder::new(Arc::new(schema))
            .with_header(false)
            .with_delimiter(delimiter)
            .build(reader)?;
        let batches = csv.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { header, batches })
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| MultigenError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Visit every row as `(line number, values of the requested columns)`
    fn for_each_row<const N: usize, F>(&self, columns: [&str; N], mut visit: F) -> Result<()>
    where
        F: FnMut(usize, [&str; N]) -> Result<()>,
    {
        let indices = columns
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        // Header is line 1
        let mut line = 1;
        for batch in &self.batches {
            let arrays: Vec<&StringArray> = indices
                .iter()
                .map(|&i| batch.column(i).as_string::<i32>())
                .collect();
            for row in 0..batch.num_rows() {
                line += 1;
                let values: [&str; N] = std::array::from_fn(|c| {
                    let array = arrays[c];
                    if array.is_null(row) { "" } else { array.value(row).trim() }
                });
                visit(line, values)?;
            }
        }
        Ok(())
    }
}

fn invalid(table: &'static str, line: usize, detail: String) -> MultigenError {
    MultigenError::InvalidReference {
        table,
        line,
        detail,
    }
}

/// Read a tab-separated PUMA→county crosswalk
///
/// Uses the `state`, `puma12`, `county` and `afact` columns; any other
/// columns are ignored. Rows whose `state` is the label sentinel are skipped.
pub fn read_crosswalk<R: Read>(reader: R) -> Result<Crosswalk> {
    const TABLE: &str = "crosswalk";
    let table = StringTable::read(reader, b'\t', TABLE)?;

    let mut entries = Vec::new();
    let mut skipped = 0;
    table.for_each_row(["state", "puma12", "county", "afact"], |line, [state, puma, county, afact]| {
        if state == CROSSWALK_LABEL_SENTINEL {
            skipped += 1;
            return Ok(());
        }
        let state: u16 = state
            .parse()
            .map_err(|_| invalid(TABLE, line, format!("invalid state '{state}'")))?;
        let puma: u32 = puma
            .parse()
            .map_err(|_| invalid(TABLE, line, format!("invalid PUMA '{puma}'")))?;
        let county = CountyFips::parse(county)
            .ok_or_else(|| invalid(TABLE, line, format!("invalid county '{county}'")))?;
        let afact: f64 = afact
            .parse()
            .map_err(|_| invalid(TABLE, line, format!("invalid allocation factor '{afact}'")))?;

        entries.push(CrosswalkEntry::new(PumaKey::new(state, puma), county, afact)?);
        Ok(())
    })?;

    if skipped > 0 {
        warn!("Skipped {skipped} crosswalk label rows");
    }
    let crosswalk = Crosswalk::new(entries);
    info!(
        "Read crosswalk with {} rows covering {} PUMAs",
        crosswalk.len(),
        crosswalk.puma_count()
    );
    Ok(crosswalk)
}

/// Read a crosswalk file
pub fn load_crosswalk(path: &Path) -> Result<Crosswalk> {
    read_crosswalk(File::open(path)?)
}

/// Read a comma-separated county FIPS table with columns `state`,
/// `state_code`, `state_name`, `county_code` and `county`
pub fn read_fips_table<R: Read>(reader: R) -> Result<FipsTable> {
    const TABLE: &str = "FIPS";
    let table = StringTable::read(reader, b',', TABLE)?;

    let mut fips = FipsTable::new();
    table.for_each_row(
        ["state", "state_code", "state_name", "county_code", "county"],
        |line, [postal, state_code, state_name, county_code, county_name]| {
            let state: u16 = state_code
                .parse()
                .map_err(|_| invalid(TABLE, line, format!("invalid state code '{state_code}'")))?;
            let county: u16 = county_code
                .parse()
                .map_err(|_| invalid(TABLE, line, format!("invalid county code '{county_code}'")))?;
            fips.insert(
                CountyFips::new(state, county),
                CountyLabel {
                    state_postal: postal.to_string(),
                    state_name: state_name.to_string(),
                    county_name: county_name.to_string(),
                },
            );
            Ok(())
        },
    )?;

    info!("Read FIPS table with {} counties", fips.len());
    Ok(fips)
}

/// Read a county FIPS table file
pub fn load_fips_table(path: &Path) -> Result<FipsTable> {
    read_fips_table(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CROSSWALK: &str = "state\tpuma12\tcounty\tstab\tcntyname\tafact\n\
        State code\tPUMA (2012)\tCounty code\tState abbreviation\tCounty name\tPUMA to county allocation factor\n\
        01\t00100\t01077\tAL\tLauderdale AL\t0.6\n\
        01\t00100\t01033\tAL\tColbert AL\t0.4\n\
        01\t00200\t01089\tAL\tMadison AL\t1\n";

    #[test]
    fn test_read_crosswalk_skips_label_row() {
        let crosswalk = read_crosswalk(Cursor::new(CROSSWALK)).unwrap();
        assert_eq!(crosswalk.len(), 3);
        assert_eq!(crosswalk.puma_count(), 2);

        let targets = crosswalk.targets(&PumaKey::new(1, 100));
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0], (CountyFips::new(1, 77), 0.6));
        assert_eq!(crosswalk.targets(&PumaKey::new(1, 200)), &[(CountyFips::new(1, 89), 1.0)]);
    }

    #[test]
    fn test_malformed_afact_reports_line() {
        let input = "state\tpuma12\tcounty\tafact\n01\t00100\t01077\tabc\n";
        let err = read_crosswalk(Cursor::new(input)).unwrap_err();
        assert!(matches!(
            err,
            MultigenError::InvalidReference { table: "crosswalk", line: 2, .. }
        ));
    }

    #[test]
    fn test_missing_column() {
        let input = "state\tpuma\tcounty\tafact\n01\t00100\t01077\t1\n";
        assert!(matches!(
            read_crosswalk(Cursor::new(input)),
            Err(MultigenError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_read_fips_table() {
        let input = "state,state_code,state_name,county_code,county\n\
            AL,01,Alabama,001,Autauga County\n\
            AL,01,Alabama,003,Baldwin County\n\
            WY,56,Wyoming,045,Weston County\n";
        let fips = read_fips_table(Cursor::new(input)).unwrap();

        assert_eq!(fips.len(), 3);
        let label = fips.county(&CountyFips::new(1, 3)).unwrap();
        assert_eq!(label.county_name, "Baldwin County");
        assert_eq!(label.state_postal, "AL");
        assert_eq!(fips.state(56).unwrap().state_name, "Wyoming");
        assert!(fips.county(&CountyFips::new(1, 5)).is_none());
    }
}
