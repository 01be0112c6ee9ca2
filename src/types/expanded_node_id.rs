// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `ExpandedNodeId`.

use std::{
    self, fmt,
    io::{Read, Write},
    str::FromStr,
};

use crate::types::{
    encoding::*,
    error::{EncodingError, EncodingResult},
    node_id::{Identifier, NodeId},
    string::*,
};

const NAMESPACE_URI_FLAG: u8 = 0x80;
const SERVER_INDEX_FLAG: u8 = 0x40;

/// A NodeId that allows the namespace URI to be specified instead of an index.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct ExpandedNodeId {
    pub node_id: NodeId,
    pub namespace_uri: UAString,
    pub server_index: u32,
}

impl BinaryEncoder<ExpandedNodeId> for ExpandedNodeId {
    fn byte_len(&self) -> usize {
        let mut size = self.node_id.byte_len();
        if !self.namespace_uri.is_null() {
            size += self.namespace_uri.byte_len();
        }
        if self.server_index != 0 {
            size += self.server_index.byte_len();
        }
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut flags = 0;
        if !self.namespace_uri.is_null() {
            flags |= NAMESPACE_URI_FLAG;
        }
        if self.server_index != 0 {
            flags |= SERVER_INDEX_FLAG;
        }
        let mut size = self.node_id.encode_with_flags(stream, flags)?;
        if !self.namespace_uri.is_null() {
            size += self.namespace_uri.encode(stream)?;
        }
        if self.server_index != 0 {
            size += self.server_index.encode(stream)?;
        }
        debug_assert_eq!(size, self.byte_len());
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let encoding_byte = read_u8(stream)?;
        let node_id = NodeId::decode_body(stream, encoding_byte, decoding_options)?;

        // Optional stuff
        let namespace_uri = if encoding_byte & NAMESPACE_URI_FLAG != 0 {
            UAString::decode(stream, decoding_options)?
        } else {
            UAString::null()
        };
        let server_index = if encoding_byte & SERVER_INDEX_FLAG != 0 {
            u32::decode(stream, decoding_options)?
        } else {
            0
        };

        Ok(ExpandedNodeId {
            node_id,
            namespace_uri,
            server_index,
        })
    }
}

impl<'a> From<&'a NodeId> for ExpandedNodeId {
    fn from(v: &'a NodeId) -> Self {
        v.clone().into()
    }
}

impl From<(NodeId, u32)> for ExpandedNodeId {
    fn from(v: (NodeId, u32)) -> Self {
        ExpandedNodeId {
            node_id: v.0,
            namespace_uri: UAString::null(),
            server_index: v.1,
        }
    }
}

impl From<(NodeId, &str)> for ExpandedNodeId {
    fn from(v: (NodeId, &str)) -> Self {
        ExpandedNodeId {
            node_id: v.0,
            namespace_uri: v.1.into(),
            server_index: 0,
        }
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(v: NodeId) -> Self {
        ExpandedNodeId {
            node_id: v,
            namespace_uri: UAString::null(),
            server_index: 0,
        }
    }
}

impl Default for ExpandedNodeId {
    fn default() -> Self {
        ExpandedNodeId::null()
    }
}

/// The string form names the namespace by uri when the uri has text, dropping the index, and by
/// index otherwise. An empty uri is written like a null one.
impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Formatted depending on the namespace uri being empty or not.
        if self.namespace_uri.is_empty() {
            // svr=<serverindex>;ns=<namespaceindex>;<type>=<value>
            write!(f, "svr={};{}", self.server_index, self.node_id)
        } else {
            // The % and ; chars have to be escaped out in the uri
            let namespace_uri = self
                .namespace_uri
                .as_ref()
                .replace('%', "%25")
                .replace(';', "%3b");
            // svr=<serverindex>;nsu=<uri>;<type>=<value>
            write!(
                f,
                "svr={};nsu={};{}",
                self.server_index, namespace_uri, self.node_id.identifier
            )
        }
    }
}

impl FromStr for ExpandedNodeId {
    type Err = EncodingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use regex::Regex;

        // svr=<serverindex>;ns=<namespaceindex>;<type>=<value>
        // or
        // svr=<serverindex>;nsu=<uri>;<type>=<value>
        //
        // A plain node id is accepted too, as an expanded node id on server 0.

        lazy_static! {
            // Contains capture groups "svr", either "ns" or "nsu" and then "t" for type
            static ref RE: Regex = Regex::new(r"^svr=(?P<svr>[0-9]+);(ns=(?P<ns>[0-9]+);|nsu=(?P<nsu>[^;]+);)?(?P<t>[isgb]=.+)$").unwrap();
        }

        let invalid = || EncodingError::InvalidIdentifier(s.to_string());
        let captures = match RE.captures(s) {
            Some(captures) => captures,
            None => return NodeId::from_str(s).map(ExpandedNodeId::from),
        };

        let server_index = captures
            .name("svr")
            .ok_or_else(invalid)?
            .as_str()
            .parse::<u32>()
            .map_err(|_| invalid())?;

        // The % and ; chars need to be unescaped
        let namespace_uri = captures.name("nsu").map_or_else(UAString::null, |nsu| {
            UAString::from(nsu.as_str().replace("%3b", ";").replace("%25", "%"))
        });

        let namespace = match captures.name("ns") {
            Some(ns) => ns.as_str().parse::<u16>().map_err(|_| invalid())?,
            None => 0,
        };

        let t = captures.name("t").ok_or_else(invalid)?;
        let identifier = Identifier::from_str(t.as_str())?;
        Ok(ExpandedNodeId {
            server_index,
            namespace_uri,
            node_id: NodeId::new(namespace, identifier),
        })
    }
}

impl ExpandedNodeId {
    /// Creates an expanded node id from a node id
    pub fn new<T>(value: T) -> ExpandedNodeId
    where
        T: Into<ExpandedNodeId>,
    {
        value.into()
    }

    pub fn null() -> ExpandedNodeId {
        Self::new(NodeId::null())
    }

    pub fn is_null(&self) -> bool {
        self.node_id.is_null() && self.namespace_uri.is_null() && self.server_index == 0
    }
}
