//! Progress display driven by bus messages

pub mod reporter;
