/// Router Module Index
///
/// Organizes the application's routing into modules that mirror the access
/// policy's path classes. Routes are registered with absolute paths and
/// merged (never nested), so each route literal here lines up exactly with
/// the path the policy table classifies.
///
/// None of these routers enforce authentication themselves. The fixed
/// two-stage pipeline in front of the merged router does that; by the time a
/// request reaches a handler on a protected path, a verified `Principal` is
/// already in the request extensions.

/// Token-exempt catalog reads plus the health probe.
pub mod public;

/// Account endpoints: registration and token refresh. Login has no route
/// here; the login stage consumes it before routing.
pub mod auth;

/// Token-protected surface under `/api`, gated on ADMIN by the policy.
pub mod admin;
