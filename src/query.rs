use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::models::Role;
use crate::users::models::User;

/// Default page size for the user listing
pub const DEFAULT_PER_PAGE: u32 = 6;

/// Upper bound on page size
pub const MAX_PER_PAGE: u32 = 100;

/// SQL query builder for the user listing
/// Builds the page query and the matching count query from the same filters
pub struct UserQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<String>,
    limit: u32,
    offset: u32,
}

impl UserQueryBuilder {
    /// Creates a new UserQueryBuilder with default values
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            limit: DEFAULT_PER_PAGE,
            offset: 0,
        }
    }

    /// Builder preloaded with every filter of a validated query
    pub fn from_query(query: &ValidatedUserQuery) -> Self {
        let mut builder = Self::new();
        if let Some(ref q) = query.q {
            builder.add_search_filter(q);
        }
        if let Some(role) = query.role {
            builder.add_role_filter(role);
        }
        builder.set_pagination(query.current_page, query.per_page);
        builder
    }

    /// Adds a search filter over full name and email (case-insensitive, partial)
    pub fn add_search_filter(&mut self, search: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses.push(format!(
            "(CONCAT(first_name, ' ', last_name) ILIKE ${0} OR email ILIKE ${0})",
            param_index
        ));
        self.params.push(format!("%{}%", escape_like(search)));
    }

    /// Adds an exact role filter
    pub fn add_role_filter(&mut self, role: Role) {
        let param_index = self.params.len() + 1;
        self.where_clauses.push(format!("role = ${}", param_index));
        self.params.push(role.as_str().to_string());
    }

    /// Sets pagination parameters
    /// Calculates LIMIT and OFFSET based on page number and page size
    pub fn set_pagination(&mut self, page: u32, per_page: u32) {
        self.limit = per_page;
        self.offset = page.saturating_sub(1).saturating_mul(per_page);
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Builds the page query, newest users first
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = format!("SELECT {} FROM users", User::COLUMNS);
        query.push_str(&self.where_sql());
        query.push_str(" ORDER BY id DESC");

        // LIMIT and OFFSET are inlined; PostgreSQL rejects them as text parameters
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }

    /// Builds the total-count query for the same filters
    pub fn build_count(&self) -> (String, Vec<String>) {
        let mut query = "SELECT COUNT(*) FROM users".to_string();
        query.push_str(&self.where_sql());
        (query, self.params.clone())
    }
}

impl Default for UserQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Query parameters for GET /users
/// All fields are optional to support flexible querying
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserQueryParams {
    /// Search term matched against full name and email
    pub q: Option<String>,
    /// Filter by role: "admin", "manager" or "customer"
    pub role: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub current_page: Option<u32>,
    /// Items per page (defaults to 6, at most 100)
    pub per_page: Option<u32>,
}

/// Validated and normalized listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUserQuery {
    /// Trimmed search term, None if empty
    pub q: Option<String>,
    pub role: Option<Role>,
    pub current_page: u32,
    pub per_page: u32,
}

impl Default for ValidatedUserQuery {
    fn default() -> Self {
        Self {
            q: None,
            role: None,
            current_page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ValidatedUserQuery {
    /// Number of rows skipped before this page
    pub fn offset(&self) -> usize {
        (self.current_page as usize - 1) * self.per_page as usize
    }
}

/// Validation error type
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct QueryValidationError {
    pub message: String,
}

impl QueryValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Query parameter validator
pub struct UserQueryValidator;

impl UserQueryValidator {
    /// Validates and normalizes query parameters
    pub fn validate(params: UserQueryParams) -> Result<ValidatedUserQuery, QueryValidationError> {
        let q = params
            .q
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let role = match params.role.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<Role>().map_err(QueryValidationError::new)?),
            None => None,
        };

        let current_page = params.current_page.unwrap_or(1);
        if current_page == 0 {
            return Err(QueryValidationError::new("currentPage must be a positive integer"));
        }

        let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(QueryValidationError::new(format!(
                "perPage must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }

        Ok(ValidatedUserQuery {
            q,
            role,
            current_page,
            per_page,
        })
    }
}
