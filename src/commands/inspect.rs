use anyhow::Result;
use std::path::Path;

use crate::{pe::detect_word_size, runtime::Runtime, target::Bitness};

/// Print whether an executable is 32-bit or 64-bit.
#[tracing::instrument(skip(runtime))]
pub fn inspect<R: Runtime>(runtime: R, executable: &Path) -> Result<Bitness> {
    let bitness = detect_word_size(&runtime, executable)?;
    println!("{}", bitness);
    Ok(bitness)
}
