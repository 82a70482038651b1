//! User-facing commands, implemented as methods on [`App`](crate::App).

pub mod create;
