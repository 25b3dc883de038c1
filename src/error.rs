//! CLI Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("cannot load configuration")]
    Config,
    #[display("cannot open cache database")]
    Database,
    /// The directory given to `resolve` can't be served.
    #[display("cannot open directory provider")]
    Provider,
    #[display("{_0} failed")]
    Command(#[error(not(source))] &'static str),
    #[display("cannot write output")]
    Output,
}
