use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CryptoError {
    #[error("Shared secret is degenerate ({0})")]
    DegenerateSharedSecret(&'static str),
}
