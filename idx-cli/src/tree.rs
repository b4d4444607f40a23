use std::path::Path;

use futures_util::StreamExt;
use idx_error::IdxResult;
use idx_format::{RangeReader, Values};

/// Print the first `count` records of `file` as typed values, one row per line of the innermost
/// dimension.
pub async fn exec_tree(file: impl AsRef<Path>, count: u64) -> IdxResult<()> {
    let mut reader = RangeReader::open_path(file.as_ref()).await?;
    let geometry = reader.geometry().clone();
    println!("{}: {geometry}", file.as_ref().display());
    if geometry.is_empty() {
        return Ok(());
    }

    let row_len = match geometry.element_shape() {
        [] => 1,
        [.., last] => usize::try_from(*last)
            .unwrap_or(usize::MAX)
            .max(1),
    };
    let count = count.min(geometry.len()).max(1);
    let mut records = reader.open_records(0, Some(count))?;
    let mut index = 0u64;
    while let Some(record) = records.next().await {
        let record = record?.check()?;
        let values = Values::decode(geometry.dtype(), record.bytes())?;
        println!("record {index}");
        for row in rows(&values, row_len) {
            println!("  {row}");
        }
        index += 1;
    }

    Ok(())
}

fn rows(values: &Values, row_len: usize) -> Vec<String> {
    (0..values.len())
        .step_by(row_len)
        .map(|start| {
            (start..(start + row_len).min(values.len()))
                .filter_map(|i| values.display_at(i))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
