//! Result envelopes
//!
//! Every public operation in the pipeline returns one of these instead of
//! an error for expected failure modes. Success is derived from the error
//! list being empty, never tracked separately.

use serde::{Deserialize, Serialize};

/// Universal operation envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    /// Payload, present on (possibly partial) success
    pub data: Option<T>,

    /// Errors encountered; empty means success
    pub errors: Vec<String>,
}

impl<T> OperationResult<T> {
    /// A successful result carrying data
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A failed result with a single error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![message.into()],
        }
    }

    /// Record an additional error
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Success is defined as the absence of errors
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<T> Default for OperationResult<T> {
    fn default() -> Self {
        Self {
            data: None,
            errors: Vec::new(),
        }
    }
}

/// Paging and filter request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedRequest {
    /// Number of items to skip per directory level
    pub skip: usize,

    /// Maximum items to take per directory level
    pub take: usize,

    /// Optional name glob filter (`*` and `?` wildcards)
    pub name_filter: Option<String>,
}

impl PagedRequest {
    /// First page of the given size, no filter
    pub fn take_only(take: usize) -> Self {
        Self {
            skip: 0,
            take,
            name_filter: None,
        }
    }
}

impl Default for PagedRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            take: 500,
            name_filter: None,
        }
    }
}

/// Operation envelope with total count and paging echo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    /// Items in this page
    pub items: Vec<T>,

    /// Total matching items before paging
    pub total_count: usize,

    /// Echo of the requested skip
    pub skip: usize,

    /// Echo of the requested take
    pub take: usize,

    /// Errors encountered; empty means success
    pub errors: Vec<String>,
}

impl<T> PagedResult<T> {
    /// A successful page
    pub fn ok(items: Vec<T>, total_count: usize, request: &PagedRequest) -> Self {
        Self {
            items,
            total_count,
            skip: request.skip,
            take: request.take,
            errors: Vec::new(),
        }
    }

    /// A failed, empty page
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            skip: 0,
            take: 0,
            errors: vec![message.into()],
        }
    }

    /// Success is defined as the absence of errors
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
