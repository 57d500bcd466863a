//! Word-size detection from a portable-executable header.
//!
//! Only the two fields needed are read: the PE header offset stored at byte
//! 60 of the DOS header, and the COFF machine type 4 bytes past the PE
//! signature. Magic numbers are not checked; unknown machine types fail.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use goblin::pe::header::{COFF_MACHINE_X86, COFF_MACHINE_X86_64};
use log::debug;

use crate::error::PygetError;
use crate::runtime::Runtime;
use crate::target::Bitness;

/// Number of leading bytes read from the executable.
pub const HEADER_READ_SIZE: u64 = 4096;

const PE_POINTER_OFFSET: usize = 60;
const MACHINE_OFFSET: usize = 4;

/// Determine the word size from the leading bytes of an executable.
pub fn word_size_from_header(header: &[u8]) -> Result<Bitness, PygetError> {
    let pe_offset = read_u32_le(header, PE_POINTER_OFFSET)
        .ok_or_else(|| PygetError::Format("header is too short for a PE pointer".into()))?;
    let machine_at = (pe_offset as usize)
        .checked_add(MACHINE_OFFSET)
        .ok_or_else(|| PygetError::Format("PE pointer overflows".into()))?;
    let machine = read_u16_le(header, machine_at).ok_or_else(|| {
        PygetError::Format(format!(
            "PE header at offset {} lies outside the first {} bytes",
            pe_offset,
            header.len()
        ))
    })?;

    match machine {
        COFF_MACHINE_X86 => Ok(Bitness::X86),
        COFF_MACHINE_X86_64 => Ok(Bitness::X64),
        other => Err(PygetError::UnrecognizedFormat { machine: other }),
    }
}

/// Read an executable's header and determine its word size.
#[tracing::instrument(skip(runtime))]
pub fn detect_word_size<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<Bitness> {
    let file = runtime
        .open(path)
        .with_context(|| format!("Failed to open executable {:?}", path))?;

    let mut header = Vec::with_capacity(HEADER_READ_SIZE as usize);
    file.take(HEADER_READ_SIZE)
        .read_to_end(&mut header)
        .with_context(|| format!("Failed to read header of {:?}", path))?;

    let bitness = word_size_from_header(&header)?;
    debug!("{:?} is a {} executable", path, bitness);
    Ok(bitness)
}

fn read_u32_le(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(slice.try_into().ok()?))
}

fn read_u16_le(bytes: &[u8], at: usize) -> Option<u16> {
    let slice = bytes.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes(slice.try_into().ok()?))
}
