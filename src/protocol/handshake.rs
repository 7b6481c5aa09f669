//! Client side of the opening handshake (RFC 6455 Section 4.1).
//!
//! [`build_request`] produces the upgrade request bytes and
//! [`parse_response`] validates the server's answer, given as the lines
//! read up to the blank line that ends the header block.

use crate::error::{Error, Result};

const CRLF: &str = "\r\n";

/// Headers that must appear at most once in the server's response.
const SINGLE_VALUE_HEADERS: &[&str] = &[
    "upgrade",
    "connection",
    "sec-websocket-accept",
    "sec-websocket-protocol",
];

/// Outcome of a successful opening handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedHandshake {
    /// Sub-protocols both sides speak, in the order the server listed them.
    pub subprotocols: Vec<String>,
}

/// Reject values that would break the request framing or cannot be
/// encoded one byte per character.
fn validate_header_value(header: &str, value: &str) -> Result<()> {
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidHeaderValue {
            header: header.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    if value.chars().any(|c| u32::from(c) > 0xFF) {
        return Err(Error::InvalidHeaderValue {
            header: header.to_string(),
            reason: "contains characters outside ISO-8859-1".to_string(),
        });
    }
    Ok(())
}

/// Build the upgrade request.
///
/// `target` is the request target (path plus optional query), `host` the
/// value of the `Host` header. The protocols are sent comma-joined in one
/// `Sec-WebSocket-Protocol` header, omitted when the list is empty. The
/// result is ISO-8859-1 encoded.
///
/// # Errors
///
/// Returns [`Error::InvalidHeaderValue`] if any value contains CR/LF or a
/// character outside ISO-8859-1, or if a protocol name is empty or contains
/// a comma.
pub fn build_request(
    target: &str,
    host: &str,
    client_key: &str,
    protocols: &[String],
) -> Result<Vec<u8>> {
    validate_header_value("Request-Target", target)?;
    validate_header_value("Host", host)?;
    validate_header_value("Sec-WebSocket-Key", client_key)?;
    for protocol in protocols {
        validate_header_value("Sec-WebSocket-Protocol", protocol)?;
        if protocol.trim().is_empty() || protocol.contains(',') {
            return Err(Error::InvalidHeaderValue {
                header: "Sec-WebSocket-Protocol".to_string(),
                reason: format!("invalid sub-protocol name {protocol:?}"),
            });
        }
    }

    let mut request = String::with_capacity(160);
    request.push_str("GET ");
    request.push_str(target);
    request.push_str(" HTTP/1.1");
    request.push_str(CRLF);
    request.push_str("Host: ");
    request.push_str(host);
    request.push_str(CRLF);
    request.push_str("Upgrade: websocket");
    request.push_str(CRLF);
    request.push_str("Connection: Upgrade");
    request.push_str(CRLF);
    request.push_str("Sec-WebSocket-Key: ");
    request.push_str(client_key);
    request.push_str(CRLF);
    if !protocols.is_empty() {
        request.push_str("Sec-WebSocket-Protocol: ");
        request.push_str(&protocols.join(", "));
        request.push_str(CRLF);
    }
    request.push_str("Sec-WebSocket-Version: 13");
    request.push_str(CRLF);
    request.push_str(CRLF);

    // Every char was checked to be <= U+00FF above.
    Ok(request.chars().map(|c| c as u8).collect())
}

/// Validate the server's response lines.
///
/// Checks run in this order: status code, `Upgrade` and `Connection`
/// headers, `Sec-WebSocket-Accept`, then sub-protocol negotiation.
///
/// # Errors
///
/// Returns [`Error::Handshake`] with the specific reason for the first
/// failed check.
pub fn parse_response(
    lines: &[String],
    expected_accept: &str,
    offered: &[String],
) -> Result<ValidatedHandshake> {
    let (status_line, header_lines) = lines.split_first().ok_or_else(|| {
        Error::Handshake(
            "connection couldn't be established due to an invalid server opening handshake".into(),
        )
    })?;

    check_status_line(status_line)?;
    let headers = parse_headers(header_lines)?;

    let upgrade = header(&headers, "upgrade").ok_or_else(|| {
        Error::Handshake("missing header field in server opening handshake: Upgrade".into())
    })?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(Error::Handshake(
            "'Upgrade' header in server opening handshake does not match 'websocket'".into(),
        ));
    }

    let connection = header(&headers, "connection").ok_or_else(|| {
        Error::Handshake("missing header field in server opening handshake: Connection".into())
    })?;
    if !connection.eq_ignore_ascii_case("upgrade") {
        return Err(Error::Handshake(
            "'Connection' header in server opening handshake does not match 'Upgrade'".into(),
        ));
    }

    let accept = header(&headers, "sec-websocket-accept").ok_or_else(|| {
        Error::Handshake(
            "response header 'sec-websocket-accept' is missing in the server opening handshake"
                .into(),
        )
    })?;
    if accept != expected_accept {
        return Err(Error::Handshake(format!(
            "unexpected 'sec-websocket-accept' header value (got: {accept} expected: {expected_accept})"
        )));
    }

    let subprotocols = negotiate_subprotocols(offered, header(&headers, "sec-websocket-protocol"))?;
    Ok(ValidatedHandshake { subprotocols })
}

/// The status code sits at a fixed offset: `HTTP/1.1 101 ...`.
fn check_status_line(line: &str) -> Result<()> {
    let code: u16 = line
        .get(9..12)
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| Error::Handshake(format!("malformed status line: {line:?}")))?;

    match code {
        101 => Ok(()),
        404 => Err(Error::Handshake("connection failed: 404 not found".into())),
        407 => Err(Error::Handshake(
            "connection failed: proxy authentication not supported".into(),
        )),
        other => Err(Error::Handshake(format!(
            "connection failed: unknown status code {other}"
        ))),
    }
}

/// Split header lines on the first `:` into lowercase names and trimmed values.
fn parse_headers(lines: &[String]) -> Result<Vec<(String, String)>> {
    let mut headers: Vec<(String, String)> = Vec::with_capacity(lines.len());

    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::Handshake(format!("malformed header line: {line:?}")))?;
        let name = name.trim().to_ascii_lowercase();

        if SINGLE_VALUE_HEADERS.contains(&name.as_str())
            && headers.iter().any(|(existing, _)| *existing == name)
        {
            return Err(Error::Handshake(format!(
                "duplicate header in server opening handshake: {name}"
            )));
        }

        headers.push((name, value.trim().to_string()));
    }

    Ok(headers)
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Intersect the offered protocols with the server's list, keeping server order.
fn negotiate_subprotocols(offered: &[String], server_value: Option<&str>) -> Result<Vec<String>> {
    let server_value = server_value.unwrap_or_default();

    if offered.is_empty() {
        if server_value.is_empty() {
            return Ok(Vec::new());
        }
        return Err(Error::Handshake(format!(
            "cannot talk any of the sub protocols the server has provided: {server_value}"
        )));
    }

    if server_value.is_empty() {
        return Err(Error::Handshake(format!(
            "server cannot talk any of the sub protocols the client has provided: [{}]",
            offered.join(", ")
        )));
    }

    let negotiated: Vec<String> = server_value
        .split(',')
        .map(str::trim)
        .filter(|candidate| offered.iter().any(|o| o == candidate))
        .map(str::to_string)
        .collect();

    if negotiated.is_empty() {
        return Err(Error::Handshake(
            "couldn't find a sub protocol that both parties are speaking".into(),
        ));
    }
    Ok(negotiated)
}
