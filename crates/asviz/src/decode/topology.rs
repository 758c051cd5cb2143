// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AS topology decoding: daemon responses and on-disk `topology.json` files.

use super::{
    as_array, as_object, bool_of, decode_endpoint, first_of, ipv4, isd_as, port, required,
    str_of, u32_of, u64_of, Decoded, RecordShape,
};
use crate::error::DecodeError;
use crate::model::{
    AsTopology, HostEndpoint, InterfaceDescriptor, LinkType, ServerKind, TopologyNode,
};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Decode a daemon topology response.
///
/// Header fields (`isd_as`, `is_core_as`, `mtu`) are required. Entries of
/// `elements` that fail to decode are skipped and reported.
pub fn decode_topology(response: &Value) -> Result<Decoded<AsTopology>, DecodeError> {
    let map = as_object(response, "topology")?;
    let ia = isd_as(required(map, "isd_as")?, "isd_as")?;
    let is_core = bool_of(required(map, "is_core_as")?, "is_core_as")?;
    let mtu = u32_of(required(map, "mtu")?, "mtu")?;

    let mut nodes = Vec::new();
    let mut skipped = Vec::new();
    let mut zk_index = 0usize;

    let elements = match map.get("elements") {
        Some(v) => as_array(v, "elements")?.as_slice(),
        None => &[],
    };

    for (idx, element) in elements.iter().enumerate() {
        let is_zk = role_of(element) == Some("zookeeper");
        if is_zk {
            zk_index += 1;
        }
        match decode_element(element, zk_index) {
            Ok(node) => nodes.push(node),
            Err(e) => {
                warn!("Skipping topology element #{} of {}: {}", idx, ia, e);
                skipped.push(e);
            }
        }
    }

    Ok(Decoded {
        value: AsTopology {
            isd_as: ia,
            is_core,
            mtu,
            nodes,
        },
        skipped,
    })
}

fn role_of(element: &Value) -> Option<&str> {
    element
        .get("role")
        .and_then(Value::as_str)
        .map(|r| r.strip_suffix("_server").unwrap_or(r))
}

/// Decode one tagged topology element.
///
/// `zk_index` is the 1-based position among zookeepers, used to name
/// zookeeper entries that carry no name of their own (`zk-<n>`).
pub fn decode_element(element: &Value, zk_index: usize) -> Result<TopologyNode, DecodeError> {
    let role = role_of(element).ok_or_else(|| DecodeError::missing("role"))?;
    let shape = RecordShape::classify(element)?;
    let fields = shape.fields();

    match role {
        "beacon" | "certificate" | "path" | "sibra" => {
            let kind = match role {
                "beacon" => ServerKind::Beacon,
                "certificate" => ServerKind::Certificate,
                "path" => ServerKind::Path,
                _ => ServerKind::Sibra,
            };
            Ok(TopologyNode::Server {
                kind,
                name: str_of(required(fields, "name")?, "name")?.to_string(),
                endpoint: shape.endpoint()?,
            })
        }
        "router" | "border_router" => {
            let name = str_of(required(fields, "name")?, "name")?.to_string();
            let endpoint = shape.endpoint()?;

            let interfaces = match (fields.get("interfaces"), fields.get("interface")) {
                (Some(list), _) => as_array(list, "interfaces")?
                    .iter()
                    .map(decode_interface)
                    .collect::<Result<Vec<_>, _>>()?,
                (None, Some(single)) => vec![decode_interface(single)?],
                (None, None) => return Err(DecodeError::missing("interfaces")),
            };

            let class = match fields.get("class") {
                Some(v) => link_type(v, "class")?,
                None => interfaces
                    .first()
                    .map(|i| i.link_type)
                    .ok_or_else(|| DecodeError::missing("class"))?,
            };

            Ok(TopologyNode::Router {
                class,
                name,
                endpoint,
                interfaces,
            })
        }
        "zookeeper" => {
            let name = match fields.get("name") {
                Some(v) => str_of(v, "name")?.to_string(),
                None => format!("zk-{}", zk_index),
            };
            Ok(TopologyNode::Zookeeper {
                name,
                endpoint: shape.endpoint()?,
            })
        }
        other => Err(DecodeError::invalid("role", format!("unknown role '{}'", other))),
    }
}

/// Decode a border-router interface record.
pub fn decode_interface(record: &Value) -> Result<InterfaceDescriptor, DecodeError> {
    let map = as_object(record, "interface")?;

    let (name, v) = first_of(map, &["if_id", "ifid", "ifID"])?;
    let if_id = u64_of(v, name)?;
    let bandwidth = u64_of(required(map, "bandwidth")?, "bandwidth")?;
    let mtu = u32_of(required(map, "mtu")?, "mtu")?;
    let (name, v) = first_of(map, &["link_type", "link_to"])?;
    let link_type = link_type(v, name)?;

    let (remote_ia, remote_if_id, remote) = match map.get("remote") {
        Some(remote) => {
            let remote_map = as_object(remote, "remote")?;
            let ia = isd_as(required(remote_map, "isd_as")?, "remote.isd_as")?;
            let ifid = match remote_map.get("ifid") {
                Some(v) => Some(u64_of(v, "remote.ifid")?),
                None => None,
            };
            (ia, ifid, decode_endpoint(remote)?)
        }
        None => {
            let ia = isd_as(required(map, "isd_as")?, "isd_as")?;
            let ifid = match map.get("to_if_id") {
                Some(v) => Some(u64_of(v, "to_if_id")?),
                None => None,
            };
            let addr = ipv4(required(map, "to_addr")?, "to_addr")?;
            let (name, v) = first_of(map, &["to_udp_port", "to_port"])?;
            let to_port = port(v, name)?;
            (ia, ifid, HostEndpoint::new(addr, to_port))
        }
    };

    // The local side is optional; when present it must be well formed.
    let local = match RecordShape::classify(record) {
        Ok(shape) => Some(shape.endpoint()?),
        Err(_) => None,
    };

    Ok(InterfaceDescriptor {
        if_id,
        bandwidth,
        mtu,
        link_type,
        remote_ia,
        remote_if_id,
        local,
        remote,
    })
}

fn link_type(value: &Value, field: &str) -> Result<LinkType, DecodeError> {
    str_of(value, field)?
        .parse()
        .map_err(|e: String| DecodeError::invalid(field, e))
}

// ============================================================================
// topology.json
// ============================================================================

const FILE_SERVER_SECTIONS: [(&str, &str, &str); 4] = [
    ("BeaconService", "BeaconServers", "beacon"),
    ("CertificateService", "CertificateServers", "certificate"),
    ("PathService", "PathServers", "path"),
    ("SibraService", "SibraServers", "sibra"),
];

/// Decode a generated `topology.json`.
///
/// Both the older flat layout (`Addr`/`Port`, one `Interface` per router) and
/// the newer layout (`Public` address lists, an `Interfaces` map) are turned
/// into daemon-style records and run through [`decode_topology`].
pub fn decode_topology_file(file: &Value) -> Result<Decoded<AsTopology>, DecodeError> {
    let map = as_object(file, "topology file")?;
    let mut elements = Vec::new();

    for (current, legacy, role) in FILE_SERVER_SECTIONS {
        for (name, entry) in section(map, current, legacy) {
            let mut record = endpoint_record(entry);
            record.insert("role".into(), json!(role));
            record.insert("name".into(), json!(name));
            elements.push(Value::Object(record));
        }
    }

    for (name, entry) in section(map, "BorderRouters", "BorderRouters") {
        let mut record = match entry.get("InternalAddrs").and_then(|a| a.get(0)) {
            Some(internal) => endpoint_record(internal),
            None => endpoint_record(entry),
        };
        record.insert("role".into(), json!("router"));
        record.insert("name".into(), json!(name));

        if let Some(interfaces) = entry.get("Interfaces").and_then(Value::as_object) {
            let list: Vec<Value> = interfaces
                .iter()
                .map(|(ifid, i)| current_file_interface(ifid, i))
                .collect();
            record.insert("interfaces".into(), Value::Array(list));
        } else if let Some(interface) = entry.get("Interface") {
            record.insert("interface".into(), legacy_file_interface(interface));
        }
        elements.push(Value::Object(record));
    }

    for (name, entry) in section(map, "ZookeeperService", "Zookeepers") {
        let mut record = endpoint_record(entry);
        record.insert("role".into(), json!("zookeeper"));
        record.insert("name".into(), json!(format!("zk-{}", name)));
        elements.push(Value::Object(record));
    }

    let mut normalized = Map::new();
    if let Some(v) = map.get("ISD_AS") {
        normalized.insert("isd_as".into(), v.clone());
    }
    if let Some(v) = map.get("Core") {
        normalized.insert("is_core_as".into(), v.clone());
    }
    if let Some(v) = map.get("MTU") {
        normalized.insert("mtu".into(), v.clone());
    }
    normalized.insert("elements".into(), Value::Array(elements));

    decode_topology(&Value::Object(normalized))
}

fn section<'a>(
    map: &'a Map<String, Value>,
    current: &str,
    legacy: &str,
) -> impl Iterator<Item = (&'a String, &'a Value)> {
    map.get(current)
        .or_else(|| map.get(legacy))
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|m| m.iter())
}

/// Map a file address entry onto the legacy or current record shape.
fn endpoint_record(entry: &Value) -> Map<String, Value> {
    let mut record = Map::new();
    if let Some(addr) = entry.get("Addr") {
        record.insert("addr".into(), addr.clone());
        if let Some(port) = entry.get("Port").or_else(|| entry.get("L4Port")) {
            record.insert("port".into(), port.clone());
        }
    } else if let Some(public) = entry.get("Public").and_then(|p| p.get(0)) {
        let addr = public.get("Addr").cloned().unwrap_or(Value::Null);
        let port = public.get("L4Port").cloned().unwrap_or(Value::Null);
        record.insert(
            "internal_addresses".into(),
            json!([{ "public": [[addr, port]] }]),
        );
    }
    record
}

fn host_info(entry: Option<&Value>) -> Value {
    let entry = entry.unwrap_or(&Value::Null);
    json!({
        "addresses": { "ipv4": [entry.get("Addr").cloned().unwrap_or(Value::Null)] },
        "port": entry.get("L4Port").cloned().unwrap_or(Value::Null),
    })
}

fn current_file_interface(ifid: &str, entry: &Value) -> Value {
    json!({
        "ifid": ifid,
        "bandwidth": entry.get("Bandwidth").cloned().unwrap_or(Value::Null),
        "mtu": entry.get("MTU").cloned().unwrap_or(Value::Null),
        "link_to": entry.get("LinkTo").cloned().unwrap_or(Value::Null),
        "host_info": host_info(entry.get("Public")),
        "remote": {
            "isd_as": entry.get("ISD_AS").cloned().unwrap_or(Value::Null),
            "host_info": host_info(entry.get("Remote")),
        },
    })
}

fn legacy_file_interface(entry: &Value) -> Value {
    let field = |name: &str| entry.get(name).cloned().unwrap_or(Value::Null);
    let mut record = json!({
        "if_id": field("IFID"),
        "bandwidth": field("Bandwidth"),
        "mtu": field("MTU"),
        "link_type": field("LinkType"),
        "isd_as": field("ISD_AS"),
        "to_addr": field("ToAddr"),
        "to_udp_port": field("ToUdpPort"),
        "addr": field("Addr"),
        "port": field("UdpPort"),
    });
    if let (Some(obj), Some(to_if)) = (record.as_object_mut(), entry.get("ToIFID")) {
        obj.insert("to_if_id".into(), to_if.clone());
    }
    record
}
