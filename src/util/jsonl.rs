use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read one JSON value per non-blank line.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() { continue; }
        let value = serde_json::from_str(&line)
            .with_context(|| format!("parse {} line {}", path.display(), i + 1))?;
        out.push(value);
    }
    Ok(out)
}

pub fn write_jsonl<T: Serialize>(path: &Path, values: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for value in values {
        serde_json::to_writer(&mut w, value)?;
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}
