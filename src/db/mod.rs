// Database query modules
// Each module provides typed query functions for a specific table.
// All queries bind parameters; no user-derived SQL text.

pub mod messages;
pub mod refresh_tokens;
pub mod users;
