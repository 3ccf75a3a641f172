//! Tower middleware applied to every gateway response.

pub mod request_id;
