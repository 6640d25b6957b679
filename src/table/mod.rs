//! Client-side filtering and pagination shared by every data table.
//!
//! Records arrive from the backend in server order. [`filter_paginate`] narrows
//! them with a conjunctive [`FilterSet`] and then cuts the requested 1-based
//! page out of what is left. It is pure: nothing is cached between calls and
//! the input slice is never reordered.

mod filters;
mod pager;

use thiserror::Error;

pub use filters::{parse_filter_pair, FieldFilter, FilterSet, Filterable, MatchRule};
pub use pager::{clamp_page, filter_paginate, page_count, Page};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("page size must be a positive integer")]
    InvalidPageSize,

    #[error("page numbers start at 1")]
    InvalidPage,

    #[error("unknown filter field '{field}' (expected one of: {known})")]
    UnknownField { field: String, known: String },

    #[error("invalid filter '{raw}', expected FIELD=VALUE")]
    MalformedFilter { raw: String },
}
