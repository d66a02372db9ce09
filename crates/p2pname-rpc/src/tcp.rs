//! Plain-TCP transport: one request, one reply, one connection.
//!
//! Every RPC dials a fresh [`TcpStream`] to the target's `(ip, port)`. The
//! receiver closes the connection after writing its reply; there is no
//! connection pooling and no multi-RPC session.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use p2pname_types::{Contact, Id};

use crate::codec::{self, LookupReply, Request, MAX_FRAME};
use crate::{RpcError, Result};

/// Dial `(ip, port)`, send `request`, and return the raw reply bytes (bounded
/// to [`MAX_FRAME`] bytes, per the spec's fixed-buffer framing).
async fn call(ip: &str, port: u16, request: &Request) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect((ip, port))
        .await
        .map_err(|e| RpcError::Io(e.to_string()))?;
    stream
        .write_all(&request.encode())
        .await
        .map_err(|e| RpcError::Io(e.to_string()))?;

    let mut buf = vec![0u8; MAX_FRAME];
    let n = stream
        .read(&mut buf)
        .await
        .map_err(|e| RpcError::Io(e.to_string()))?;
    buf.truncate(n);
    Ok(buf)
}

/// Send a `PING` and report whether the exact `PONG` reply was received.
pub async fn ping(ip: &str, port: u16) -> Result<bool> {
    let reply = call(ip, port, &Request::Ping).await?;
    Ok(reply == b"PONG")
}

/// Send a `STOR` request and report whether the exact `OK` reply was
/// received.
pub async fn store(ip: &str, port: u16, key: Id, value: String) -> Result<bool> {
    let reply = call(ip, port, &Request::Store { key, value }).await?;
    Ok(reply == b"OK")
}

/// Send a `FIND_NODE` request and decode the returned contact list.
pub async fn find_node(ip: &str, port: u16, target: Id) -> Result<Vec<Contact>> {
    let reply = call(ip, port, &Request::FindNode { target }).await?;
    codec::decode_nodes_reply(&reply)
}

/// Send a `FIND_VALUE` request and decode the polymorphic reply.
pub async fn find_value(ip: &str, port: u16, key: Id) -> Result<LookupReply> {
    let reply = call(ip, port, &Request::FindValue { key }).await?;
    codec::decode_lookup_reply(&reply)
}

/// Bind a listener at `(ip, port)` for the connection-accept server loop.
pub async fn bind(ip: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((ip, port))
        .await
        .map_err(|e| RpcError::Io(e.to_string()))
}

/// Read one inbound request from an accepted stream, following the exact
/// multi-step read protocol of spec §4.E: 4 bytes to pick the tag, then
/// (for `STOR`/`FIND`) enough more bytes to determine the sub-op and decode
/// the body.
pub async fn read_request(stream: &mut TcpStream) -> Result<Request> {
    let mut tag = [0u8; 4];
    stream
        .read_exact(&mut tag)
        .await
        .map_err(|e| RpcError::Io(e.to_string()))?;

    match &tag {
        b"PING" => Ok(Request::Ping),
        b"STOR" => {
            let body = read_remainder(stream).await?;
            Request::decode_store_body(&body)
        }
        b"FIND" => {
            let mut discriminator = [0u8; 5];
            stream
                .read_exact(&mut discriminator)
                .await
                .map_err(|e| RpcError::Io(e.to_string()))?;
            let rest = read_remainder(stream).await?;
            let mut after_find = Vec::with_capacity(discriminator.len() + rest.len());
            after_find.extend_from_slice(&discriminator);
            after_find.extend_from_slice(&rest);
            let after_find = std::str::from_utf8(&after_find)
                .map_err(|e| RpcError::Decode(e.to_string()))?;

            if after_find.starts_with("_NODE") {
                Request::decode_find_node_body(after_find)
            } else if after_find.starts_with("_VALU") {
                // `_VALUE` — the 5-byte discriminator window only guarantees
                // `_VALU`; the trailing `E` arrives with the remainder.
                Request::decode_find_value_body(after_find)
            } else {
                Err(RpcError::Protocol(format!(
                    "unknown FIND sub-op: {after_find:?}"
                )))
            }
        }
        other => Err(RpcError::Protocol(format!(
            "unknown opcode tag: {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Read up to `MAX_FRAME - 4` remaining bytes of a request body.
async fn read_remainder(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; MAX_FRAME - 4];
    let n = stream
        .read(&mut buf)
        .await
        .map_err(|e| RpcError::Io(e.to_string()))?;
    buf.truncate(n);
    Ok(buf)
}

/// Write `reply` and close the stream, per the connection-per-RPC discipline.
pub async fn reply(stream: &mut TcpStream, reply: &[u8]) -> Result<()> {
    stream
        .write_all(reply)
        .await
        .map_err(|e| RpcError::Io(e.to_string()))?;
    stream.shutdown().await.map_err(|e| RpcError::Io(e.to_string()))
}
