//! CSV output.

use std::{fs, path::Path};

use serde::Serialize;

use crate::error::SinkError;

/// Write `rows` to `path` as CSV with a header row, replacing any existing
/// file and creating missing parent directories.
pub fn write_csv<T, I>(path: &Path, rows: I) -> Result<usize, SinkError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    let mut written = 0;
    for row in rows {
        writer.serialize(row)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        hour: u8,
        transactions: usize,
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/hourly.csv");

        let written = write_csv(
            &path,
            [
                Row {
                    hour: 0,
                    transactions: 3,
                },
                Row {
                    hour: 1,
                    transactions: 5,
                },
            ],
        )
        .unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "hour,transactions\n0,3\n1,5\n"
        );
    }
}
