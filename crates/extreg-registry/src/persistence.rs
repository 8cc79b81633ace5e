//! Profile persistence codec.
//!
//! Frames opaque per-module payloads as
//!
//! ```text
//! count: u32
//! repeated count times:
//!     name_len: u32, name: [u8; name_len]
//!     payload_len: u32, payload: [u8; payload_len]
//! ```
//!
//! All integers are little-endian. Payload bytes are never interpreted here,
//! only framed and routed to the module that owns them.

use std::io::{Read, Write};

use tracing::{debug, info};

use extreg_core::error::{ErrorKind, RegistryError};
use extreg_core::result::RegistryResult;

use crate::catalog::Catalog;

/// Writes every non-empty profile payload in the catalog.
///
/// Returns the number of records written.
pub fn serialize<W: Write>(catalog: &Catalog, writer: &mut W) -> RegistryResult<usize> {
    let records: Vec<(&str, Vec<u8>)> = catalog
        .iter()
        .map(|descriptor| (descriptor.name(), descriptor.profile_payload()))
        .filter(|(_, payload)| !payload.is_empty())
        .collect();

    write_len(writer, records.len())?;
    for (name, payload) in &records {
        write_len(writer, name.len())?;
        writer.write_all(name.as_bytes())?;
        write_len(writer, payload.len())?;
        writer.write_all(payload)?;
        debug!(module = %name, bytes = payload.len(), "Serialized module profile");
    }

    info!(records = records.len(), "Module profiles serialized");
    Ok(records.len())
}

/// Reads profile records and hands each payload to its module.
///
/// Modules are looked up regardless of their enabled flag. A record naming a
/// module absent from the catalog is fatal. Returns the number of records
/// read.
pub fn deserialize<R: Read>(catalog: &Catalog, reader: &mut R) -> RegistryResult<usize> {
    let count = read_u32(reader)?;

    for _ in 0..count {
        let name_len = read_u32(reader)?;
        let name = String::from_utf8(read_bytes(reader, name_len)?).map_err(|e| {
            RegistryError::with_source(
                ErrorKind::Serialization,
                "Persisted module name is not valid UTF-8",
                e,
            )
        })?;

        let descriptor = catalog
            .lookup(&name, false)
            .ok_or_else(|| RegistryError::unknown_module(&name))?;

        let payload_len = read_u32(reader)?;
        let payload = read_bytes(reader, payload_len)?;
        debug!(module = %name, bytes = payload.len(), "Restoring module profile");
        descriptor.module().deserialize_profile(payload).map_err(|e| {
            RegistryError::with_source(
                e.kind,
                format!("Module '{}' failed to restore its profile: {}", descriptor.name(), e.message),
                e,
            )
        })?;
    }

    info!(records = count, "Module profiles deserialized");
    Ok(count as usize)
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> RegistryResult<()> {
    let len = u32::try_from(len)
        .map_err(|_| RegistryError::serialization(format!("Frame of {len} bytes exceeds u32 length prefix")))?;
    writer.write_all(&len.to_le_bytes())?;
    Ok(())
}

fn read_u32<R: Read>(reader: &mut R) -> RegistryResult<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes).map_err(truncated)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_bytes<R: Read>(reader: &mut R, len: u32) -> RegistryResult<Vec<u8>> {
    // Bounded by what the stream actually holds, not by the prefix.
    let mut bytes = Vec::new();
    reader.take(u64::from(len)).read_to_end(&mut bytes)?;
    if bytes.len() != len as usize {
        return Err(RegistryError::serialization(format!(
            "Truncated profile stream: expected {len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn truncated(err: std::io::Error) -> RegistryError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        RegistryError::with_source(ErrorKind::Serialization, "Truncated profile stream", err)
    } else {
        err.into()
    }
}
