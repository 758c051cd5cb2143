// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Response decoder.
//!
//! Daemon responses come in two historical record layouts:
//!
//! - **legacy**: endpoint fields sit directly on the record (`addr`, `port`)
//! - **current**: endpoints are nested, either under
//!   `internal_addresses[0].public[0]` as an `[addr, port]` pair or under
//!   `host_info.addresses.ipv4` + `host_info.port`
//!
//! [`RecordShape::classify`] picks the layout from the record structure, then
//! the matching accessor resolves fields. A required field that resolves in
//! neither layout is a [`DecodeError`]; nothing is zero-filled.
//!
//! Collections are decoded element by element. A broken element is skipped and
//! reported in [`Decoded::skipped`] without affecting its siblings.

mod segment;
mod topology;

pub use segment::{decode_interfaces, decode_path, decode_paths, decode_segment, decode_segments};
pub use topology::{decode_element, decode_interface, decode_topology, decode_topology_file};

use crate::error::DecodeError;
use crate::ia::IsdAs;
use crate::model::HostEndpoint;
use serde_json::{Map, Value};
use std::net::Ipv4Addr;

/// A decoded value plus the elements that had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub skipped: Vec<DecodeError>,
}

impl<T> Decoded<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            skipped: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            skipped: self.skipped,
        }
    }
}

/// Structural layout of a record carrying an endpoint.
#[derive(Debug, Clone, Copy)]
pub enum RecordShape<'a> {
    Legacy(&'a Map<String, Value>),
    Current(&'a Map<String, Value>),
}

impl<'a> RecordShape<'a> {
    pub fn classify(record: &'a Value) -> Result<Self, DecodeError> {
        let map = as_object(record, "record")?;
        let present = |field: &str| required(map, field).is_ok();
        if present("addr") {
            Ok(Self::Legacy(map))
        } else if present("internal_addresses") || present("host_info") {
            Ok(Self::Current(map))
        } else {
            Err(DecodeError::missing("addr"))
        }
    }

    pub fn fields(&self) -> &'a Map<String, Value> {
        match self {
            Self::Legacy(map) | Self::Current(map) => map,
        }
    }

    pub fn endpoint(&self) -> Result<HostEndpoint, DecodeError> {
        match self {
            Self::Legacy(map) => {
                let addr = ipv4(required(map, "addr")?, "addr")?;
                let port = port(required(map, "port")?, "port")?;
                Ok(HostEndpoint::new(addr, port))
            }
            Self::Current(map) => match map.get("internal_addresses").filter(|v| !v.is_null()) {
                Some(internal) => {
                    let pair = internal
                        .get(0)
                        .and_then(|a| a.get("public"))
                        .and_then(|p| p.get(0))
                        .ok_or_else(|| DecodeError::missing("internal_addresses[0].public[0]"))?;
                    let addr = pair
                        .get(0)
                        .ok_or_else(|| DecodeError::missing("internal_addresses[0].public[0][0]"))
                        .and_then(|v| ipv4(v, "internal_addresses[0].public[0][0]"))?;
                    let port = pair
                        .get(1)
                        .ok_or_else(|| DecodeError::missing("internal_addresses[0].public[0][1]"))
                        .and_then(|v| port(v, "internal_addresses[0].public[0][1]"))?;
                    Ok(HostEndpoint::new(addr, port))
                }
                None => {
                    let host = as_object(required(map, "host_info")?, "host_info")?;
                    let ipv4_field = host
                        .get("addresses")
                        .and_then(|a| a.get("ipv4"))
                        .ok_or_else(|| DecodeError::missing("host_info.addresses.ipv4"))?;
                    // A single address or a list of them.
                    let first = match ipv4_field {
                        Value::Array(list) => list
                            .first()
                            .ok_or_else(|| DecodeError::missing("host_info.addresses.ipv4[0]"))?,
                        other => other,
                    };
                    let addr = ipv4(first, "host_info.addresses.ipv4")?;
                    let port = port(required(host, "port")?, "host_info.port")?;
                    Ok(HostEndpoint::new(addr, port))
                }
            },
        }
    }
}

/// Decode the endpoint of any record, whatever its layout.
pub fn decode_endpoint(record: &Value) -> Result<HostEndpoint, DecodeError> {
    RecordShape::classify(record)?.endpoint()
}

pub(crate) fn as_object<'a>(
    value: &'a Value,
    field: &str,
) -> Result<&'a Map<String, Value>, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::invalid(field, "expected an object"))
}

pub(crate) fn as_array<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>, DecodeError> {
    value
        .as_array()
        .ok_or_else(|| DecodeError::invalid(field, "expected a list"))
}

pub(crate) fn required<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a Value, DecodeError> {
    map.get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| DecodeError::missing(field))
}

/// First present field among historical aliases, with the alias that matched.
pub(crate) fn first_of<'a>(
    map: &'a Map<String, Value>,
    aliases: &[&'static str],
) -> Result<(&'static str, &'a Value), DecodeError> {
    aliases
        .iter()
        .find_map(|name| map.get(*name).filter(|v| !v.is_null()).map(|v| (*name, v)))
        .ok_or_else(|| DecodeError::missing(aliases.first().copied().unwrap_or("field")))
}

pub(crate) fn u64_of(value: &Value, field: &str) -> Result<u64, DecodeError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| DecodeError::invalid(field, format!("{} is not a non-negative integer", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| DecodeError::invalid(field, format!("'{}' is not a number", s))),
        _ => Err(DecodeError::invalid(field, "expected a number")),
    }
}

pub(crate) fn u32_of(value: &Value, field: &str) -> Result<u32, DecodeError> {
    let v = u64_of(value, field)?;
    u32::try_from(v).map_err(|_| DecodeError::invalid(field, format!("{} out of range", v)))
}

pub(crate) fn port(value: &Value, field: &str) -> Result<u16, DecodeError> {
    let v = u64_of(value, field)?;
    u16::try_from(v).map_err(|_| DecodeError::invalid(field, format!("port {} out of range", v)))
}

pub(crate) fn bool_of(value: &Value, field: &str) -> Result<bool, DecodeError> {
    value
        .as_bool()
        .ok_or_else(|| DecodeError::invalid(field, "expected a boolean"))
}

pub(crate) fn str_of<'a>(value: &'a Value, field: &str) -> Result<&'a str, DecodeError> {
    value
        .as_str()
        .ok_or_else(|| DecodeError::invalid(field, "expected a string"))
}

/// Dotted-quad string or a host-order `u32`.
pub(crate) fn ipv4(value: &Value, field: &str) -> Result<Ipv4Addr, DecodeError> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| DecodeError::invalid(field, format!("'{}' is not an IPv4 address", s))),
        Value::Number(_) => {
            let raw = u32_of(value, field)?;
            Ok(Ipv4Addr::from(raw))
        }
        _ => Err(DecodeError::invalid(field, "expected an IPv4 address")),
    }
}

/// `"isd-as"` string, or the legacy packed integer (12-bit ISD, 20-bit AS).
pub(crate) fn isd_as(value: &Value, field: &str) -> Result<IsdAs, DecodeError> {
    match value {
        Value::String(s) => s.parse().map_err(|e| DecodeError::invalid(field, e)),
        Value::Number(_) => {
            let packed = u32_of(value, field)?;
            Ok(IsdAs::new((packed >> 20) as u16, u64::from(packed & 0x000F_FFFF)))
        }
        _ => Err(DecodeError::invalid(field, "expected an ISD-AS")),
    }
}
