//! End-to-end aggregation pipeline
//!
//! Person rows → households → PUMAs → {counties, states}. Each stage fully
//! materializes its output and the previous table is dropped before the
//! next stage begins.

use std::cmp::Ordering;
use std::time::Instant;

use log::info;
use serde::Serialize;

use crate::algorithm::household::{HouseholdReducer, ReductionStats};
use crate::algorithm::puma::aggregate_pumas;
use crate::algorithm::reaggregate::{ReaggregationReport, aggregate_counties, aggregate_states};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::crosswalk::Crosswalk;
use crate::models::fips::FipsTable;
use crate::models::geo::{CountyAggregate, PumaAggregate, StateAggregate};
use crate::models::person::PersonRecord;
use crate::models::rows::{CountyRow, PumaRow, StateRow};

/// Diagnostics collected over a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Household reduction counts
    pub reduction: ReductionStats,
    /// Number of PUMAs produced
    pub pumas: usize,
    /// Crosswalk PUMAs whose allocation factors do not sum to 1
    pub unbalanced_crosswalk_pumas: usize,
    /// PUMA → county re-aggregation
    pub county: ReaggregationReport,
    /// PUMA → state aggregation
    pub state: ReaggregationReport,
}

/// Results of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// PUMA aggregates, sorted by PUMA
    pub pumas: Vec<PumaAggregate>,
    /// County rows, by descending multigenerational rate
    pub counties: Vec<CountyRow>,
    /// State rows, by state code
    pub states: Vec<StateRow>,
    pub diagnostics: Diagnostics,
}

/// Run every stage over a decoded person table
pub fn run_pipeline(
    persons: Vec<PersonRecord>,
    crosswalk: &Crosswalk,
    fips: Option<&FipsTable>,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let start = Instant::now();
    let unbalanced = crosswalk.unbalanced_pumas(config.allocation_tolerance).len();

    let (households, reduction) =
        HouseholdReducer::from_config(config).reduce(persons, config.parallel)?;
    let pumas = aggregate_pumas(households, config.parallel)?;

    let (counties, county_report) = aggregate_counties(&pumas, crosswalk);
    let (states, state_report) = aggregate_states(&pumas);

    let output = PipelineOutput {
        counties: county_rows(&counties, fips),
        states: state_rows(&states, fips),
        diagnostics: Diagnostics {
            reduction,
            pumas: pumas.len(),
            unbalanced_crosswalk_pumas: unbalanced,
            county: county_report,
            state: state_report,
        },
        pumas,
    };

    info!(
        "Pipeline finished in {:?}: {} households, {} PUMAs, {} counties, {} states",
        start.elapsed(),
        output.diagnostics.reduction.households,
        output.pumas.len(),
        output.counties.len(),
        output.states.len()
    );
    Ok(output)
}

/// Order by descending rate, undefined rates last
fn descending_rate(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Label county aggregates and sort them by descending multigenerational rate
#[must_use]
pub fn county_rows(counties: &[CountyAggregate], fips: Option<&FipsTable>) -> Vec<CountyRow> {
    let mut rows: Vec<CountyRow> = counties
        .iter()
        .map(|aggregate| {
            let label = fips.and_then(|table| table.county(&aggregate.key));
            CountyRow::from_aggregate(
                aggregate.key.state,
                aggregate.key.county,
                aggregate.key.to_string(),
                label.map(|l| l.state_postal.clone()),
                label.map(|l| l.state_name.clone()),
                label.map(|l| l.county_name.clone()),
                aggregate,
            )
        })
        .collect();

    rows.sort_by(|a, b| {
        descending_rate(a.multi_gen_pct, b.multi_gen_pct).then_with(|| a.fips.cmp(&b.fips))
    });
    rows
}

/// Label state aggregates, sorted by state code
#[must_use]
pub fn state_rows(states: &[StateAggregate], fips: Option<&FipsTable>) -> Vec<StateRow> {
    states
        .iter()
        .map(|aggregate| {
            let label = fips.and_then(|table| table.state(aggregate.key));
            StateRow::from_aggregate(
                aggregate.key,
                label.map(|l| l.state_postal.clone()),
                label.map(|l| l.state_name.clone()),
                aggregate,
            )
        })
        .collect()
}

#[must_use]
pub fn puma_rows(pumas: &[PumaAggregate]) -> Vec<PumaRow> {
    pumas
        .iter()
        .map(|aggregate| PumaRow::from_aggregate(aggregate.key.state, aggregate.key.puma, aggregate))
        .collect()
}
