pub mod parser;
pub mod types;

pub use parser::{parse_cookie_header, parse_json_body, parse_query_string};
pub use types::{Location, RawInputs, RawValue};
