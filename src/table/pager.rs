use std::ops::RangeInclusive;

use serde::Serialize;

use super::{FilterSet, Filterable, TableError};

/// One page of a filtered table plus the metadata a pager needs.
#[derive(Clone, Debug, Serialize)]
pub struct Page<'a, T> {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    pub items: Vec<&'a T>,
}

impl<'a, T> Page<'a, T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// The pager is only drawn when there is more than one page.
    pub fn shows_pager(&self) -> bool {
        self.total_pages > 1
    }

    pub fn page_numbers(&self) -> RangeInclusive<usize> {
        1..=self.total_pages
    }
}

/// Filters `records` and returns the requested 1-based page.
///
/// The page is `filtered[(page - 1) * page_size .. page * page_size]`. A page
/// past the end is empty; it is not clamped (see [`clamp_page`]).
pub fn filter_paginate<'a, T: Filterable>(
    records: &'a [T],
    filters: &FilterSet,
    page: usize,
    page_size: usize,
) -> Result<Page<'a, T>, TableError> {
    if page_size == 0 {
        return Err(TableError::InvalidPageSize);
    }
    if page == 0 {
        return Err(TableError::InvalidPage);
    }

    let filtered: Vec<&'a T> = records.iter().filter(|r| filters.matches(*r)).collect();
    let filtered_count = filtered.len();
    let total_pages = page_count(filtered_count, page_size);

    let items = match (page - 1).checked_mul(page_size) {
        Some(start) if start < filtered_count => {
            filtered.into_iter().skip(start).take(page_size).collect()
        }
        _ => Vec::new(),
    };

    Ok(Page {
        page,
        page_size,
        total_pages,
        filtered_count,
        items,
    })
}

/// Pages needed for `filtered_count` rows. Zero only when there are no rows.
pub fn page_count(filtered_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    filtered_count.div_ceil(page_size)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}
