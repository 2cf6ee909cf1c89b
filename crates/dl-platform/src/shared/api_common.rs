//! Common API types and utilities

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::mediator::Mediator;
use crate::store::Page;

mod string_or_number {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(u32),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) if s.is_empty() => Ok(None),
            Some(StringOrNum::Str(s)) => s.parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Standard API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pagination parameters: zero-based `page` and `size` (alias `limit`).
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    page: Option<u32>,
    #[serde(default, alias = "limit", deserialize_with = "string_or_number::deserialize_u32_opt")]
    size: Option<u32>,
}

impl PaginationParams {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    pub fn size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 200)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, size: u32, total: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total.div_ceil(size as u64) as u32
        };
        Self {
            data,
            page,
            size,
            total,
            total_pages,
        }
    }

    pub fn from_page<E>(page: Page<E>) -> Self
    where
        T: From<E>,
    {
        Self::new(
            page.items.into_iter().map(T::from).collect(),
            page.page,
            page.size,
            page.total,
        )
    }
}

/// Success response with optional message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Created response with ID
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

impl CreatedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Router state shared by every aggregate API: handlers only talk to the
/// mediator.
#[derive(Clone)]
pub struct MediatorState {
    pub mediator: Arc<Mediator>,
}

impl MediatorState {
    pub fn new(mediator: Arc<Mediator>) -> Self {
        Self { mediator }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_lenient_parsing() {
        let p: PaginationParams = serde_json::from_str(r#"{"page":"2","limit":"5"}"#).unwrap();
        assert_eq!(p.page(), 2);
        assert_eq!(p.size(), 5);

        let p: PaginationParams = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.page(), 0);
        assert_eq!(p.size(), DEFAULT_PAGE_SIZE);

        let p: PaginationParams = serde_json::from_str(r#"{"size":10000}"#).unwrap();
        assert_eq!(p.size(), 200);
    }

    #[test]
    fn test_total_pages() {
        let r: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 0, 20, 41);
        assert_eq!(r.total_pages, 3);
        let r: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 0, 20, 0);
        assert_eq!(r.total_pages, 0);
    }
}
