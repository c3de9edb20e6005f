// Per-user run history.

pub mod handlers;
