use axum::http::{StatusCode, Uri};
use color_eyre::eyre::eyre;
use serde::{Deserialize, Serialize};

use super::errors::ServerError;
use crate::AppConfig;

pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl PageParams {
    pub fn page(self) -> Result<Page, ServerError> {
        let number = self.page.unwrap_or(1);
        if number == 0 {
            return Err(ServerError(eyre!("Invalid page."), StatusCode::NOT_FOUND));
        }

        let size = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        Ok(Page { number, size })
    }
}

impl Page {
    pub fn limit(self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    /// Pages past the end are an error, except the first page of an empty listing.
    pub fn check_in_range(self, count: i64) -> Result<(), ServerError> {
        if self.number > 1 && self.offset() >= count {
            return Err(ServerError(eyre!("Invalid page."), StatusCode::NOT_FOUND));
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// The current request's URL with `page` replaced, or dropped for the first page.
fn page_url(app: &AppConfig, uri: &Uri, number: u32) -> String {
    let mut url = app.base_url.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.set_query(None);

    if !kept.is_empty() || number > 1 {
        let mut pairs = url.query_pairs_mut();
        pairs.extend_pairs(&kept);
        if number > 1 {
            pairs.append_pair("page", &number.to_string());
        }
    }

    url.into()
}

impl<T> Paginated<T> {
    pub fn new(app: &AppConfig, uri: &Uri, page: Page, count: i64, results: Vec<T>) -> Self {
        let has_next = page.offset() + page.limit() < count;
        let has_previous = page.number > 1;

        Self {
            count,
            next: has_next.then(|| page_url(app, uri, page.number + 1)),
            previous: has_previous.then(|| page_url(app, uri, page.number - 1)),
            results,
        }
    }
}
