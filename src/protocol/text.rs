use bytes::Bytes;
use thiserror::Error;

/// Request-line level failure. The Display text is sent to the client
/// verbatim in a `CLIENT_ERROR` reply, after which the connection
/// continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no command provided")]
    NoCommand,

    #[error("insufficient args")]
    InsufficientArgs,

    /// A numeric token (flags, exptime, bytes, cas) did not parse.
    #[error("invalid {0}")]
    InvalidNumber(&'static str),

    #[error("data block provided is too long")]
    DataBlockTooLong,
}

/// One parsed client request.
///
/// `Malformed` carries a request-line parse failure so the connection
/// handler can report it and keep the connection alive; transport errors
/// never appear here, they terminate the stream instead.
#[derive(Debug, Clone, PartialEq)]
pub enum TextRequest {
    Get { keys: Vec<Bytes> },
    Gets { keys: Vec<Bytes> },
    Set(StoreRequest),
    Cas(StoreRequest),
    Delete { key: Bytes },
    Quit,
    Unsupported { cmd: Bytes },
    Malformed(ParseError),
}

/// Payload shared by `set` and `cas`: the request-line fields plus the
/// data block read from the following line.
///
/// `exptime` is accepted for wire compatibility and ignored, there is no
/// expiration support. `cas` is zero for `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub key: Bytes,
    pub flags: u32,
    pub exptime: i32,
    pub length: usize,
    pub cas: u64,
    pub data: Bytes,
}

/// One `VALUE` block of a get/gets reply. `cas` is present for gets only.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueReply {
    pub key: Bytes,
    pub flags: u32,
    pub data: Bytes,
    pub cas: Option<u64>,
}

/// One reply to a client request. Encoded byte-for-byte by the codec;
/// `Values` renders zero or more `VALUE` blocks followed by `END`.
#[derive(Debug, Clone, PartialEq)]
pub enum TextResponse {
    Stored,
    NotStored,
    Exists,
    NotFound,
    Deleted,
    Error,
    ClientError(String),
    Values(Vec<ValueReply>),
}
