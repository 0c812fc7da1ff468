//! The two message shapes a lookup touches: the outgoing `get_peers`
//! query and the response envelope it expects back.

use super::error::LookupError;
use super::id::{InfoHash, NodeId};
use crate::bencode::{decode, encode, Dict, Value};
use bytes::Bytes;

/// Builds an encoded `get_peers` query:
/// `{t: tid, y: "q", q: "get_peers", a: {id, info_hash}}`.
pub(crate) fn encode_get_peers(
    transaction_id: &Bytes,
    node_id: &NodeId,
    info_hash: &InfoHash,
) -> Vec<u8> {
    let mut args = Dict::new();
    args.insert(Bytes::from_static(b"id"), Value::bytes(node_id.as_bytes()));
    args.insert(
        Bytes::from_static(b"info_hash"),
        Value::bytes(info_hash.as_bytes()),
    );

    let mut dict = Dict::new();
    dict.insert(
        Bytes::from_static(b"t"),
        Value::Bytes(transaction_id.clone()),
    );
    dict.insert(Bytes::from_static(b"y"), Value::string("q"));
    dict.insert(Bytes::from_static(b"q"), Value::string("get_peers"));
    dict.insert(Bytes::from_static(b"a"), Value::Dict(args));

    encode(&Value::Dict(dict))
}

/// The parts of a response a lookup consumes. Both lists may legitimately
/// be absent; absence is an empty list, never an error.
pub(crate) struct Reply {
    pub transaction_id: Bytes,
    /// Raw concatenation of 26-byte compact node records.
    pub compact_nodes: Bytes,
    /// Raw 6-byte compact peer addresses.
    pub compact_peers: Vec<Bytes>,
}

/// Parses a response envelope: `{t, y: "r", r: {nodes?, values?}}`.
///
/// Queries and error messages from other nodes share the socket; anything
/// that is not a response is rejected here and dropped by the caller.
pub(crate) fn parse_reply(data: &[u8]) -> Result<Reply, LookupError> {
    let value = decode(data)?;
    let dict = value
        .as_dict()
        .ok_or_else(|| LookupError::InvalidMessage("expected dict".into()))?;

    let transaction_id = dict
        .get(b"t".as_slice())
        .and_then(|v| v.as_bytes())
        .cloned()
        .ok_or_else(|| LookupError::InvalidMessage("missing transaction id".into()))?;

    let msg_type = dict
        .get(b"y".as_slice())
        .and_then(|v| v.as_str())
        .ok_or_else(|| LookupError::InvalidMessage("missing message type".into()))?;

    if msg_type != "r" {
        return Err(LookupError::InvalidMessage(format!(
            "not a response: {}",
            msg_type
        )));
    }

    let body = dict.get(b"r".as_slice()).and_then(|v| v.as_dict());

    let compact_nodes = body
        .and_then(|r| r.get(b"nodes".as_slice()))
        .and_then(|v| v.as_bytes())
        .cloned()
        .unwrap_or_default();

    let compact_peers = body
        .and_then(|r| r.get(b"values".as_slice()))
        .and_then(|v| v.as_list())
        .map(|list| list.iter().filter_map(|v| v.as_bytes().cloned()).collect())
        .unwrap_or_default();

    Ok(Reply {
        transaction_id,
        compact_nodes,
        compact_peers,
    })
}
