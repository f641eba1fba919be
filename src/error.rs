use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not read batch manifest")]
    Manifest,
    #[display("could not write audit log: {}", _0.display())]
    Audit(#[error(not(source))] PathBuf),
}
