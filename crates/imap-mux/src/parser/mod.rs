//! Response parsing pipeline.
//!
//! The [`lexer`] tokenizes one response unit, [`sexp`] builds the nested
//! value trees FETCH uses, and [`response`] decodes units into structured
//! values.

pub mod lexer;
pub mod response;
pub mod sexp;

pub use response::{
    Address, Envelope, FetchRecord, ListEntry, ResponseParser, ServerResponse, StatusResponse,
    UntaggedResponse,
};
pub use sexp::Sexp;
