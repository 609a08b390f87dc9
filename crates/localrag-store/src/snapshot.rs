//! JSON-lines persistence of stored passages, one record per line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use localrag_core::error::{Error, Result};
use localrag_core::types::Passage;

/// Write `passages` to `path`, replacing any previous file atomically.
pub fn write<'a>(path: &Path, passages: impl IntoIterator<Item = &'a Passage>) -> Result<usize> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    let mut count = 0usize;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        for passage in passages {
            serde_json::to_writer(&mut w, passage)?;
            w.write_all(b"\n")?;
            count += 1;
        }
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Persistence(e.error))?;
    tracing::info!(path = %path.display(), passages = count, "snapshot written");
    Ok(count)
}

/// Read every record of the snapshot at `path`, in file order.
pub fn read(path: &Path) -> Result<Vec<Passage>> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    tracing::debug!(path = %path.display(), passages = out.len(), "snapshot read");
    Ok(out)
}
