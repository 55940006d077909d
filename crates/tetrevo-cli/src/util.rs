use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write as _},
    path::Path,
};

use anyhow::Context as _;

/// Writes a value as pretty JSON to the given path, or to stdout when no
/// path is given.
pub fn save_json<T>(value: &T, output_path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)
                .with_context(|| format!("failed to write JSON to {}", path.display()))?;
            writeln!(writer)?;
            writer
                .flush()
                .with_context(|| format!("failed to flush output to {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value)
                .context("failed to write JSON to stdout")?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Reads a JSON value from a file, labeling errors with `file_kind`.
pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open {} file: {}", file_kind, path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file)).with_context(|| {
        format!("failed to parse {} JSON file: {}", file_kind, path.display())
    })?;
    Ok(value)
}
