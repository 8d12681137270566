use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A marshaller was asked for a mode combination that cannot be honored.
    #[error("invalid call mode: {0}")]
    InvalidCallMode(&'static str),

    #[error("unknown reference id {0}")]
    UnknownReference(u64),

    #[error("unknown visual node")]
    UnknownNode,

    /// A configuration the engine has no safe layout for.
    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("desired size of {node} is not finite ({width} x {height})")]
    NonFiniteDesiredSize {
        node: &'static str,
        width: f64,
        height: f64,
    },

    /// The surface answered a query with something that could not be decoded.
    #[error("unexpected bridge reply: {0}")]
    Bridge(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
