//! Services layer - portal logic
//!
//! Everything between the HTTP handlers and the content API client:
//! - Account flows and server-side sessions
//! - Form validation and login rate limiting
//! - View state for carousels, pagination and search

pub mod auth;
pub mod carousel;
pub mod pagination;
pub mod rate_limiter;
pub mod search;
pub mod session;
pub mod validation;

pub use auth::{AuthError, AuthService};
pub use carousel::{Carousel, AUTOPLAY_INTERVAL};
pub use pagination::Pagination;
pub use rate_limiter::LoginRateLimiter;
pub use search::SearchState;
pub use session::{Session, SessionStore};
pub use validation::ValidationError;
