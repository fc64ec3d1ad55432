// core/api/src/lib.rs

//! HTTP surface of the Projrec recommendation service

pub mod logging;
pub mod server;

pub use server::{
    AppState, ErrorResponse, RecommendQuery, RecommendationResponse, RecommendationServer, TRACE_ID_HEADER,
};
