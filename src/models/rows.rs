//! Flat output rows
//!
//! Each row carries its geographic identifiers followed by every aggregate
//! field: weighted totals, medians and rates. Rows serialize to one Arrow
//! column per field.

use serde::{Deserialize, Serialize};

use crate::models::geo::{GeoAggregate, WeightedTotals};

/// Define an output row struct with the given identifier fields followed by
/// the shared aggregate columns.
macro_rules! define_output_row {
    (
        $(#[$meta:meta])*
        struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
            pub total_hh: f64,
            pub total_population: f64,
            pub total_multi_gen: f64,
            pub total_black_hoh: f64,
            pub total_asian_hoh: f64,
            pub total_hispanic_hoh: f64,
            pub total_white_hoh: f64,
            pub total_non_white_hoh: f64,
            pub total_black_multigen: f64,
            pub total_asian_multigen: f64,
            pub total_hispanic_multigen: f64,
            pub total_white_multigen: f64,
            pub total_non_white_multigen: f64,
            pub median_hh_income: Option<f64>,
            pub median_hh_age: Option<f64>,
            pub multi_gen_pct: Option<f64>,
            pub black_multigen_pct: Option<f64>,
            pub asian_multigen_pct: Option<f64>,
            pub hispanic_multigen_pct: Option<f64>,
            pub white_multigen_pct: Option<f64>,
            pub non_white_multigen_pct: Option<f64>,
        }

        impl $name {
            /// Assemble a row from its identifiers and an aggregate
            #[must_use]
            pub fn from_aggregate<K>($($field: $ty,)* aggregate: &GeoAggregate<K>) -> Self {
                let t = &aggregate.totals;
                let r = aggregate.rates();
                Self {
                    $($field,)*
                    total_hh: t.total_hh,
                    total_population: t.total_population,
                    total_multi_gen: t.total_multi_gen,
                    total_black_hoh: t.total_black_hoh,
                    total_asian_hoh: t.total_asian_hoh,
                    total_hispanic_hoh: t.total_hispanic_hoh,
                    total_white_hoh: t.total_white_hoh,
                    total_non_white_hoh: t.total_non_white_hoh,
                    total_black_multigen: t.total_black_multigen,
                    total_asian_multigen: t.total_asian_multigen,
                    total_hispanic_multigen: t.total_hispanic_multigen,
                    total_white_multigen: t.total_white_multigen,
                    total_non_white_multigen: t.total_non_white_multigen,
                    median_hh_income: aggregate.median_hh_income,
                    median_hh_age: aggregate.median_hh_age,
                    multi_gen_pct: r.multi_gen_pct,
                    black_multigen_pct: r.black_multigen_pct,
                    asian_multigen_pct: r.asian_multigen_pct,
                    hispanic_multigen_pct: r.hispanic_multigen_pct,
                    white_multigen_pct: r.white_multigen_pct,
                    non_white_multigen_pct: r.non_white_multigen_pct,
                }
            }

            /// The additive totals carried by the row
            #[must_use]
            pub fn totals(&self) -> WeightedTotals {
                WeightedTotals {
                    total_hh: self.total_hh,
                    total_population: self.total_population,
                    total_multi_gen: self.total_multi_gen,
                    total_black_hoh: self.total_black_hoh,
                    total_asian_hoh: self.total_asian_hoh,
                    total_hispanic_hoh: self.total_hispanic_hoh,
                    total_white_hoh: self.total_white_hoh,
                    total_non_white_hoh: self.total_non_white_hoh,
                    total_black_multigen: self.total_black_multigen,
                    total_asian_multigen: self.total_asian_multigen,
                    total_hispanic_multigen: self.total_hispanic_multigen,
                    total_white_multigen: self.total_white_multigen,
                    total_non_white_multigen: self.total_non_white_multigen,
                }
            }
        }
    };
}

define_output_row! {
    /// PUMA-level output row
    struct PumaRow {
        state_fips: u16,
        puma: u32,
    }
}

define_output_row! {
    /// County-level output row
    struct CountyRow {
        state_fips: u16,
        county_fips: u16,
        /// Five-digit state+county code
        fips: String,
        /// State postal abbreviation
        state: Option<String>,
        state_name: Option<String>,
        county_name: Option<String>,
    }
}

define_output_row! {
    /// State-level output row
    struct StateRow {
        state_fips: u16,
        /// State postal abbreviation
        state: Option<String>,
        state_name: Option<String>,
    }
}
