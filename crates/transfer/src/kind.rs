/// Which size limit a file exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeScope {
    /// The process-wide upload ceiling.
    Global,
    /// The limit of the file's type category.
    Category,
}

/// Closed set of user-facing failure kinds.
///
/// Derived per call; never persisted or shared between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoFile,
    SizeExceeded(SizeScope),
    UnsupportedType,
    InvalidExtension,
    /// Another transfer is already registered under the same key.
    InProgress,
    Canceled,
    AuthExpired,
    NotFound,
    Forbidden,
    BadRequest,
    TooLarge,
    UnsupportedMedia,
    ServerError,
    Timeout,
    NetworkError,
    Unknown,
}
