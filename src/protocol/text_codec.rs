use std::io::{self, Error, ErrorKind};

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::text::{ParseError, StoreRequest, TextRequest, TextResponse};

/// Upper bound on a single protocol line (command or data block). A line
/// that grows past this without a terminator is a transport error and the
/// connection is dropped.
const MAX_LINE_BYTES: usize = 1024 * 1024;

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone, Copy, PartialEq)]
enum StoreCommand {
    Set,
    Cas,
}

/// Request-line fields of a `set`/`cas` waiting for its data block.
struct PendingStore {
    cmd: StoreCommand,
    key: Bytes,
    flags: u32,
    exptime: i32,
    length: usize,
    cas: u64,
}

enum ParsedLine {
    Complete(TextRequest),
    NeedsData(PendingStore),
}

/// Stateful codec for the memcached ASCII protocol.
///
/// Decoding is line oriented: a command line, then for `set`/`cas` exactly
/// one data-block line. Parse failures become `TextRequest::Malformed` so
/// the connection survives them; only framing violations (an unterminated
/// over-long line) surface as an `io::Error`.
pub struct MemcacheTextCodec {
    pending: Option<PendingStore>,
}

impl MemcacheTextCodec {
    pub fn new() -> MemcacheTextCodec {
        MemcacheTextCodec { pending: None }
    }

    fn finish_store(pending: PendingStore, data: Bytes) -> TextRequest {
        if data.len() > pending.length {
            return TextRequest::Malformed(ParseError::DataBlockTooLong);
        }
        let request = StoreRequest {
            key: pending.key,
            flags: pending.flags,
            exptime: pending.exptime,
            length: pending.length,
            cas: pending.cas,
            data,
        };
        match pending.cmd {
            StoreCommand::Set => TextRequest::Set(request),
            StoreCommand::Cas => TextRequest::Cas(request),
        }
    }
}

impl Default for MemcacheTextCodec {
    fn default() -> Self {
        MemcacheTextCodec::new()
    }
}

impl Decoder for MemcacheTextCodec {
    type Item = TextRequest;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TextRequest>, io::Error> {
        loop {
            let line = match take_line(src)? {
                Some(line) => line,
                None => return Ok(None),
            };
            if let Some(pending) = self.pending.take() {
                return Ok(Some(Self::finish_store(pending, line)));
            }
            match parse_command_line(&line) {
                ParsedLine::Complete(request) => return Ok(Some(request)),
                ParsedLine::NeedsData(pending) => {
                    self.pending = Some(pending);
                    // the data block may already be buffered
                }
            }
        }
    }
}

impl Encoder<TextResponse> for MemcacheTextCodec {
    type Error = io::Error;

    fn encode(&mut self, response: TextResponse, dst: &mut BytesMut) -> Result<(), io::Error> {
        match response {
            TextResponse::Stored => dst.extend_from_slice(b"STORED\r\n"),
            TextResponse::NotStored => dst.extend_from_slice(b"NOT_STORED\r\n"),
            TextResponse::Exists => dst.extend_from_slice(b"EXISTS\r\n"),
            TextResponse::NotFound => dst.extend_from_slice(b"NOT_FOUND\r\n"),
            TextResponse::Deleted => dst.extend_from_slice(b"DELETED\r\n"),
            TextResponse::Error => dst.extend_from_slice(b"ERROR\r\n"),
            TextResponse::ClientError(message) => {
                dst.extend_from_slice(b"CLIENT_ERROR ");
                dst.extend_from_slice(message.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            TextResponse::Values(values) => {
                for value in values {
                    dst.extend_from_slice(b"VALUE ");
                    dst.extend_from_slice(&value.key);
                    match value.cas {
                        Some(cas) => dst.extend_from_slice(
                            format!(" {} {} {}", value.flags, value.data.len(), cas).as_bytes(),
                        ),
                        None => dst.extend_from_slice(
                            format!(" {} {}", value.flags, value.data.len()).as_bytes(),
                        ),
                    }
                    dst.extend_from_slice(CRLF);
                    dst.extend_from_slice(&value.data);
                    dst.extend_from_slice(CRLF);
                }
                dst.extend_from_slice(b"END\r\n");
            }
        }
        Ok(())
    }
}

/// Splits one LF-terminated line off the buffer, stripping the terminator
/// and an optional preceding CR. Returns `Ok(None)` until a full line is
/// buffered.
fn take_line(src: &mut BytesMut) -> Result<Option<Bytes>, io::Error> {
    let pos = match src.iter().position(|byte| *byte == b'\n') {
        Some(pos) => pos,
        None => {
            if src.len() > MAX_LINE_BYTES {
                return Err(Error::new(ErrorKind::InvalidData, "protocol line too long"));
            }
            return Ok(None);
        }
    };
    let mut line = src.split_to(pos + 1);
    line.truncate(pos);
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    Ok(Some(line.freeze()))
}

fn parse_command_line(line: &Bytes) -> ParsedLine {
    let mut tokens = line
        .split(|byte| *byte == b' ')
        .filter(|token| !token.is_empty());
    let cmd = match tokens.next() {
        Some(cmd) => cmd,
        None => return ParsedLine::Complete(TextRequest::Malformed(ParseError::NoCommand)),
    };
    let args: Vec<&[u8]> = tokens.collect();

    match cmd {
        b"get" => parse_retrieval(&args, false),
        b"gets" => parse_retrieval(&args, true),
        b"delete" => match args.first() {
            Some(key) => ParsedLine::Complete(TextRequest::Delete {
                key: Bytes::copy_from_slice(key),
            }),
            None => ParsedLine::Complete(TextRequest::Malformed(ParseError::InsufficientArgs)),
        },
        b"set" => parse_store(&args, StoreCommand::Set),
        b"cas" => parse_store(&args, StoreCommand::Cas),
        b"quit" => ParsedLine::Complete(TextRequest::Quit),
        _ => ParsedLine::Complete(TextRequest::Unsupported {
            cmd: Bytes::copy_from_slice(cmd),
        }),
    }
}

fn parse_retrieval(args: &[&[u8]], with_cas: bool) -> ParsedLine {
    if args.is_empty() {
        return ParsedLine::Complete(TextRequest::Malformed(ParseError::InsufficientArgs));
    }
    let keys = args.iter().map(|key| Bytes::copy_from_slice(key)).collect();
    ParsedLine::Complete(if with_cas {
        TextRequest::Gets { keys }
    } else {
        TextRequest::Get { keys }
    })
}

/// Parses `<key> <flags> <exptime> <bytes> [<cas>]`; the data block is
/// read from the next line by the decoder.
fn parse_store(args: &[&[u8]], cmd: StoreCommand) -> ParsedLine {
    let expected_args = match cmd {
        StoreCommand::Set => 4,
        StoreCommand::Cas => 5,
    };
    if args.len() < expected_args {
        return ParsedLine::Complete(TextRequest::Malformed(ParseError::InsufficientArgs));
    }

    let flags = match parse_number::<u32>(args[1], "flags") {
        Ok(flags) => flags,
        Err(err) => return ParsedLine::Complete(TextRequest::Malformed(err)),
    };
    let exptime = match parse_number::<i32>(args[2], "exptime") {
        Ok(exptime) => exptime,
        Err(err) => return ParsedLine::Complete(TextRequest::Malformed(err)),
    };
    let length = match parse_number::<usize>(args[3], "bytes") {
        Ok(length) => length,
        Err(err) => return ParsedLine::Complete(TextRequest::Malformed(err)),
    };
    let cas = match cmd {
        StoreCommand::Set => 0,
        StoreCommand::Cas => match parse_number::<u64>(args[4], "cas") {
            Ok(cas) => cas,
            Err(err) => return ParsedLine::Complete(TextRequest::Malformed(err)),
        },
    };

    ParsedLine::NeedsData(PendingStore {
        cmd,
        key: Bytes::copy_from_slice(args[0]),
        flags,
        exptime,
        length,
        cas,
    })
}

fn parse_number<T: std::str::FromStr>(token: &[u8], what: &'static str) -> Result<T, ParseError> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|token| token.parse().ok())
        .ok_or(ParseError::InvalidNumber(what))
}
