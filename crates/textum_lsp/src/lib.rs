//! LSP front end for the textum core: translates editor events into
//! workspace reads/writes and provider invocations, one request at a time.

mod server;
mod state;

pub use server::run;
