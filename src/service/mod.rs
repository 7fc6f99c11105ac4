//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services validate input and credentials, then read and mutate
//! entities through the database layer.

mod hashtag;
pub mod text;
mod tweet;
mod validate;

pub use hashtag::HashtagService;
pub use text::{Tokens, tokenize};
pub use tweet::{Context, TweetService};
pub use validate::ValidateService;
