// Read-side views over a user's entries: dashboard filters, calendar grid,
// mood and tag aggregates.

pub mod aggregate;
pub mod calendar;
pub mod filter;
pub mod handlers;
