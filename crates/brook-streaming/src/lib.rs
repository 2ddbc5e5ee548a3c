pub mod escape;
pub mod optimistic;

pub use escape::normalize_escaped_text;
pub use optimistic::{
    optimistic_array, optimistic_bool, optimistic_str, OptimisticJsonParser, ParseResult,
};
