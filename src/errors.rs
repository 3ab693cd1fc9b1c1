#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Resource configuration is invalid: {}.", _0)]
    Configuration(String),
    #[fail(
        display = "Resource target '{}' reference count is '{}' larger than 0.",
        name, count
    )]
    DanglingReference { name: String, count: u32 },
    #[fail(
        display = "Resource target '{}' dependency {} reference count is invalid.",
        name, dependency
    )]
    InconsistentState { name: String, dependency: String },
    #[fail(display = "Resource '{}' has already been released.", _0)]
    Released(String),
    #[fail(display = "Resource {} is not registered.", _0)]
    NotFound(String),
    #[fail(display = "Resource {} has already been registered.", _0)]
    Duplicated(String),
    #[fail(display = "Resource '{}' is not in use.", _0)]
    NotInUse(String),
}

impl Error {
    /// Returns true if this error signals that the dependency bookkeeping has been
    /// violated. These are never worth retrying.
    pub fn is_invariant_violation(&self) -> bool {
        match *self {
            Error::DanglingReference { .. } | Error::InconsistentState { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
