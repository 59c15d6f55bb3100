pub mod match_response;
pub mod service;
