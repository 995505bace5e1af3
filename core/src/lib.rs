//! API client core for the TripTalk travel planner.
//!
//! # Overview
//! Two backends are involved: the business API (accounts, trip places,
//! flights, accommodations, saved trip plans) and the AI planner. This crate
//! builds `HttpRequest` values and parses `HttpResponse` values for both
//! without touching the network, and layers an async session on top for
//! hosts that let Rust do the I/O.
//!
//! # Design
//! - `TripClient` is stateless: base URLs, wait budgets and page size.
//!   Each operation is split into `build_*` and `parse_*` so the I/O
//!   boundary stays explicit and the C ABI can reuse it.
//! - `Transport` + `fetch_with_timeout` execute a request with its budget.
//! - `AuthSession` owns the token pair, persists it through a `TokenStore`
//!   and refreshes it single-flight. `TripApi` is the typed facade on top.
//! - Server records are normalized once at the boundary (`normalize`);
//!   everything else sees canonical types only.
//! - `PagedList` / `PagedFeed` hold cursor lists for screens, `ViewScope`
//!   cancels a screen's tasks when it goes away, `forms` holds the transient
//!   signup and trip-planning input.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
mod normalize;
pub mod pagination;
pub mod scope;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use api::TripApi;
pub use client::TripClient;
pub use config::ClientConfig;
pub use error::{ApiError, SignupRejection};
pub use forms::{LoginForm, SignupForm, TravelPlanWizard, TripDuration};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::{PageTicket, PagedFeed, PagedList};
pub use scope::ViewScope;
pub use session::AuthSession;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{fetch_with_timeout, ReqwestTransport, Transport};
pub use types::{
    Accommodation, AuthTokens, Flight, GeneratedPlan, Page, SavedTripPlan, SignupData, Theme,
    TravelPlanRequest, TripPlace, TripPlanStatus,
};
