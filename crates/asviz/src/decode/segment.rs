// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Path segment and announced path decoding.

use super::{
    as_array, as_object, decode_endpoint, first_of, isd_as, required, u32_of, u64_of, Decoded,
};
use crate::error::DecodeError;
use crate::model::{AnnouncedPath, AsMarking, PathInterface, PathSegment, PcbMarking, SegmentKind};
use serde_json::Value;
use tracing::warn;

/// Decode an interface list (`[{isd_as, ifid}, ...]`).
pub fn decode_interfaces(list: &Value) -> Result<Vec<PathInterface>, DecodeError> {
    as_array(list, "interfaces")?
        .iter()
        .map(|entry| {
            let map = as_object(entry, "interfaces[]")?;
            let (name, v) = first_of(map, &["isd_as", "isdas"])?;
            let ia = isd_as(v, name)?;
            let (name, v) = first_of(map, &["ifid", "ifID", "if_id"])?;
            Ok(PathInterface::new(ia, u64_of(v, name)?))
        })
        .collect()
}

fn decode_pcb_marking(record: &Value) -> Result<PcbMarking, DecodeError> {
    let map = as_object(record, "pcb_markings[]")?;

    let (n, v) = first_of(map, &["in_ia", "inIA"])?;
    let in_ia = isd_as(v, n)?;
    let (n, v) = first_of(map, &["in_if", "inIF"])?;
    let in_if = u64_of(v, n)?;
    let (n, v) = first_of(map, &["out_ia", "outIA"])?;
    let out_ia = isd_as(v, n)?;
    let (n, v) = first_of(map, &["out_if", "outIF"])?;
    let out_if = u64_of(v, n)?;

    Ok(PcbMarking {
        in_ia,
        in_if,
        out_ia,
        out_if,
    })
}

fn decode_as_marking(record: &Value) -> Result<AsMarking, DecodeError> {
    let map = as_object(record, "markings[]")?;

    let (n, v) = first_of(map, &["isd_as", "isdas"])?;
    let ia = isd_as(v, n)?;
    let (n, v) = first_of(map, &["trc_version", "trcVer"])?;
    let trc_version = u64_of(v, n)?;
    let (n, v) = first_of(map, &["cert_version", "certVer"])?;
    let cert_version = u64_of(v, n)?;
    let mtu = u32_of(required(map, "mtu")?, "mtu")?;

    let pcb_markings = match map.get("pcb_markings").or_else(|| map.get("pcbms")) {
        Some(list) => as_array(list, "pcb_markings")?
            .iter()
            .map(decode_pcb_marking)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(AsMarking {
        isd_as: ia,
        trc_version,
        cert_version,
        mtu,
        pcb_markings,
    })
}

/// Decode a single segment record of the given kind.
pub fn decode_segment(kind: SegmentKind, record: &Value) -> Result<PathSegment, DecodeError> {
    let map = as_object(record, "segment")?;

    let (n, v) = first_of(map, &["timestamp", "created"])?;
    let created = u64_of(v, n)?;
    let (n, v) = first_of(map, &["expiration", "min_exp", "exp_time"])?;
    let expires = u64_of(v, n)?;
    if expires <= created {
        return Err(DecodeError::invalid(
            n,
            format!("expires at {} but was created at {}", expires, created),
        ));
    }

    let interfaces = decode_interfaces(required(map, "interfaces")?)?;

    let markings = match map.get("markings").or_else(|| map.get("asms")) {
        Some(list) => as_array(list, "markings")?
            .iter()
            .map(decode_as_marking)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(PathSegment {
        kind,
        created,
        expires,
        interfaces,
        markings,
    })
}

/// Decode a `{"segments": [...]}` response. Broken segments are skipped.
pub fn decode_segments(
    kind: SegmentKind,
    response: &Value,
) -> Result<Decoded<Vec<PathSegment>>, DecodeError> {
    let map = as_object(response, "segments response")?;
    let list = as_array(required(map, "segments")?, "segments")?;

    let mut segments = Vec::with_capacity(list.len());
    let mut skipped = Vec::new();
    for (idx, record) in list.iter().enumerate() {
        match decode_segment(kind, record) {
            Ok(seg) => segments.push(seg),
            Err(e) => {
                warn!("Skipping {} segment #{}: {}", kind, idx + 1, e);
                skipped.push(e);
            }
        }
    }

    Ok(Decoded {
        value: segments,
        skipped,
    })
}

/// Decode one announced path.
pub fn decode_path(record: &Value) -> Result<AnnouncedPath, DecodeError> {
    let map = as_object(record, "path")?;
    let mtu = u32_of(required(map, "mtu")?, "mtu")?;
    let interfaces = decode_interfaces(required(map, "interfaces")?)?;
    let first_hop = match map.get("first_hop") {
        Some(hop) if !hop.is_null() => Some(decode_endpoint(hop)?),
        _ => None,
    };

    Ok(AnnouncedPath {
        mtu,
        interfaces,
        first_hop,
    })
}

/// Decode a `{"paths": [...]}` response. Broken paths are skipped.
pub fn decode_paths(response: &Value) -> Result<Decoded<Vec<AnnouncedPath>>, DecodeError> {
    let map = as_object(response, "paths response")?;
    let list = as_array(required(map, "paths")?, "paths")?;

    let mut paths = Vec::with_capacity(list.len());
    let mut skipped = Vec::new();
    for (idx, record) in list.iter().enumerate() {
        match decode_path(record) {
            Ok(p) => paths.push(p),
            Err(e) => {
                warn!("Skipping path #{}: {}", idx + 1, e);
                skipped.push(e);
            }
        }
    }

    Ok(Decoded {
        value: paths,
        skipped,
    })
}
