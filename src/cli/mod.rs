//! Command-line support for the `asnmp-respond` binary.

pub mod args;
