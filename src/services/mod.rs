pub mod password;

pub mod token;
pub use token::{Claims, TokenError, TokenKind, TokenService};

pub mod revocation;
pub use revocation::{InMemoryRevocationStore, RevocationStore};

pub mod sentiment;
pub use sentiment::{Annotation, Sentiment, SentimentAnnotator, classify};
