//! Citation parser implementations

mod swiss;

pub use swiss::SwissCitationParser;
