//! Version 1 of the HAProxy protocol (text version).
//!
//! See <https://haproxy.org/download/1.8/doc/proxy-protocol.txt>

mod error;
mod model;

pub use crate::protocol::ip::{IPv4, IPv6};
pub use error::{BinaryParseError, ParseError};
pub use model::{Addresses, Header, SEPARATOR, TCP4, TCP6, UNKNOWN};
pub use model::{PROTOCOL_PREFIX, PROTOCOL_SUFFIX};
use std::borrow::Cow;
use std::net::{AddrParseError, Ipv4Addr, Ipv6Addr};
use std::str::{FromStr, from_utf8};

const ZERO: &str = "0";
const NEWLINE: &str = "\n";
const CARRIAGE_RETURN: char = '\r';

/// The maximum length of a header in bytes.
const MAX_LENGTH: usize = 107;
/// The total number of parts in the header.
const PARTS: usize = 7;

/// Parses a text PROXY protocol header.
/// The given string is expected to only include the header and to end in \r\n.
fn parse_header(header: &str) -> Result<Header<'_>, ParseError> {
    if header.is_empty() {
        return Err(ParseError::MissingPrefix);
    } else if header.len() > MAX_LENGTH {
        return Err(ParseError::HeaderTooLong);
    }

    let mut iterator = header
        .splitn(PARTS, [SEPARATOR, CARRIAGE_RETURN])
        .peekable();

    let prefix = iterator.next().ok_or(ParseError::MissingPrefix)?;

    if !prefix.is_empty() && PROTOCOL_PREFIX.starts_with(prefix) && header.ends_with(prefix) {
        return Err(ParseError::Partial);
    } else if prefix != PROTOCOL_PREFIX {
        return Err(ParseError::InvalidPrefix);
    }

    let addresses = match iterator.next() {
        Some(TCP4) => {
            let (source_address, destination_address, source_port, destination_port) =
                parse_addresses::<Ipv4Addr, _>(&mut iterator)?;

            Addresses::Tcp4(IPv4 {
                source_address,
                source_port,
                destination_address,
                destination_port,
            })
        }
        Some(TCP6) => {
            let (source_address, destination_address, source_port, destination_port) =
                parse_addresses::<Ipv6Addr, _>(&mut iterator)?;

            Addresses::Tcp6(IPv6 {
                source_address,
                source_port,
                destination_address,
                destination_port,
            })
        }
        Some(UNKNOWN) => {
            while iterator.next_if(|&s| s != NEWLINE).is_some() {}

            Addresses::Unknown
        }
        Some(protocol) if protocol.is_empty() && iterator.peek().is_none() => {
            return Err(ParseError::MissingProtocol);
        }
        Some(protocol)
            if !protocol.is_empty()
                && header.ends_with(protocol)
                && (TCP4.starts_with(protocol) || UNKNOWN.starts_with(protocol)) =>
        {
            return Err(ParseError::Partial);
        }
        Some(_) => return Err(ParseError::InvalidProtocol),
        None => return Err(ParseError::MissingProtocol),
    };

    let newline = iterator
        .next()
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingNewLine)?;

    if newline != NEWLINE {
        return Err(ParseError::InvalidSuffix);
    }

    Ok(Header {
        header: Cow::Borrowed(header),
        addresses,
    })
}

/// Parses the addresses and ports from a PROXY protocol header for IPv4 and IPv6.
fn parse_addresses<'a, T: FromStr<Err = AddrParseError>, I: Iterator<Item = &'a str>>(
    iterator: &mut I,
) -> Result<(T, T, u16, u16), ParseError> {
    let source_address = iterator.next().ok_or(ParseError::MissingSourceAddress)?;
    let destination_address = iterator
        .next()
        .ok_or(ParseError::MissingDestinationAddress)?;
    let source_port = iterator.next().ok_or(ParseError::MissingSourcePort)?;
    let destination_port = iterator.next().ok_or(ParseError::MissingDestinationPort)?;

    let source_address = source_address
        .parse::<T>()
        .map_err(ParseError::InvalidSourceAddress)?;
    let destination_address = destination_address
        .parse::<T>()
        .map_err(ParseError::InvalidDestinationAddress)?;

    if source_port.starts_with(ZERO) && source_port != ZERO {
        return Err(ParseError::InvalidSourcePort(None));
    }

    let source_port = source_port
        .parse::<u16>()
        .map_err(|e| ParseError::InvalidSourcePort(Some(e)))?;

    if destination_port.starts_with(ZERO) && destination_port != ZERO {
        return Err(ParseError::InvalidDestinationPort(None));
    }

    let destination_port = destination_port
        .parse::<u16>()
        .map_err(|e| ParseError::InvalidDestinationPort(Some(e)))?;

    Ok((
        source_address,
        destination_address,
        source_port,
        destination_port,
    ))
}

impl<'a> TryFrom<&'a str> for Header<'a> {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        let length = match input.find(CARRIAGE_RETURN) {
            Some(suffix) => suffix + PROTOCOL_SUFFIX.len(),
            None if input.len() >= MAX_LENGTH => return Err(ParseError::HeaderTooLong),
            None => input.len(),
        };

        parse_header(&input[..length])
    }
}

impl<'a> TryFrom<&'a [u8]> for Header<'a> {
    type Error = BinaryParseError;

    fn try_from(input: &'a [u8]) -> Result<Self, Self::Error> {
        let length = match input.iter().position(|&c| CARRIAGE_RETURN == (c as char)) {
            Some(suffix) => suffix + PROTOCOL_SUFFIX.len(),
            None if input.len() >= MAX_LENGTH => return Err(ParseError::HeaderTooLong.into()),
            None => input.len(),
        };
        let header = from_utf8(&input[..length])?;

        parse_header(header).map_err(BinaryParseError::Parse)
    }
}

impl FromStr for Addresses {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Header::try_from(s)?.addresses)
    }
}

impl FromStr for Header<'static> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Header::try_from(s)?.to_owned())
    }
}
