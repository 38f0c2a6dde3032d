//! Search page state

use serde::Serialize;

use super::pagination::Pagination;
use super::validation::{validate_search_query, ValidationError};
use crate::models::{Article, Page};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchState {
    /// No query submitted yet
    Idle,
    /// Query submitted but blank
    Invalid { message: String },
    Results {
        query: String,
        articles: Vec<Article>,
        pagination: Pagination,
    },
    Empty { query: String },
}

impl SearchState {
    /// Read the `q` parameter: absent means idle, blank is rejected
    pub fn parse_query(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
        match raw {
            None => Ok(None),
            Some(q) => {
                validate_search_query(q)?;
                Ok(Some(q.trim().to_string()))
            }
        }
    }

    pub fn invalid(err: ValidationError) -> Self {
        SearchState::Invalid { message: err.to_string() }
    }

    /// Results for `query`; a page past the end keeps the total and clamps
    pub fn from_page(query: String, page: Page<Article>, requested_page: u32, page_size: u32) -> Self {
        if page.total() == 0 {
            return SearchState::Empty { query };
        }
        let pagination = Pagination::new(requested_page, page.total(), page_size);
        SearchState::Results {
            query,
            articles: page.into_items(),
            pagination,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            SearchState::Results { query, .. } | SearchState::Empty { query } => Some(query),
            _ => None,
        }
    }
}
