use std::path::PathBuf;

use futures_util::StreamExt;
use idx_error::IdxResult;
use idx_format::{Database, DatabaseOptions, DatasetBinding};

/// The number of values shown from the middle of each record.
const PREVIEW_LEN: usize = 5;

pub struct DumpArgs {
    pub root: PathBuf,
    pub dataset: DatasetBinding,
    pub begin: u64,
    pub count: Option<u64>,
    pub chunk_size: u64,
}

/// Stream a window of `(image, label)` pairs, printing a preview of every step and the number
/// of records received per slot.
pub async fn exec_dump(args: DumpArgs) -> IdxResult<()> {
    let options = DatabaseOptions::new(&args.root)
        .with_bindings([args.dataset])
        .with_chunk_size(args.chunk_size)?;
    let mut db = Database::open(options).await?;
    let sizes: Vec<u64> = db
        .geometries(args.dataset)?
        .iter()
        .map(|g| g.element_size())
        .collect();

    let mut totals = vec![0u64; sizes.len()];
    let mut window = db.open_window(args.dataset, args.begin, args.count)?;
    while let Some(step) = window.next().await {
        let step = step?;
        let previews: Vec<String> = step
            .iter()
            .map(|slot| preview(slot.as_ref().map(|r| r.as_ref()), PREVIEW_LEN))
            .collect();
        for (total, slot) in totals.iter_mut().zip(&step) {
            *total += slot.as_ref().map_or(0, |r| r.len() as u64);
        }
        println!("received {}", previews.join(", "));
    }

    let summary: Vec<String> = totals
        .iter()
        .zip(&sizes)
        .map(|(&total, &size)| record_total(total, size))
        .collect();
    println!("total bytes received = [{}]", summary.join(", "));
    log::debug!("finished {} window at {}", args.dataset, args.begin);

    Ok(())
}

/// Render up to `window` values from the middle of `bytes`, eliding anything outside.
fn preview(bytes: Option<&[u8]>, window: usize) -> String {
    let Some(bytes) = bytes else {
        return "none".to_string();
    };
    if bytes.is_empty() {
        return String::new();
    }

    let start = bytes.len().saturating_sub(window) / 2;
    let end = (start + window).min(bytes.len());
    let peek = bytes[start..end]
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",");
    if bytes.len() > window {
        format!("[...,{peek},...]")
    } else {
        format!("[{peek}]")
    }
}

/// `total` bytes as `records x size`, with any trailing partial record as a remainder.
fn record_total(total: u64, size: u64) -> String {
    if size == 0 {
        return format!("{total} bytes");
    }
    match total % size {
        0 => format!("{} x {size}", total / size),
        rem => format!("{} x {size} + {rem}", total / size),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{preview, record_total};

    #[rstest]
    #[case(None, "none")]
    #[case(Some(&[][..]), "")]
    #[case(Some(&[7][..]), "[7]")]
    #[case(Some(&[1, 2, 3, 4, 5][..]), "[1,2,3,4,5]")]
    #[case(Some(&[1, 2, 3, 4, 5, 6, 7, 8, 9][..]), "[...,3,4,5,6,7,...]")]
    #[case(Some(&[1, 2, 3, 4, 5, 6][..]), "[...,1,2,3,4,5,...]")]
    fn previews(#[case] bytes: Option<&[u8]>, #[case] expected: &str) {
        assert_eq!(preview(bytes, 5), expected);
    }

    #[rstest]
    #[case(7840, 784, "10 x 784")]
    #[case(10, 1, "10 x 1")]
    #[case(5, 2, "2 x 2 + 1")]
    #[case(0, 784, "0 x 784")]
    fn totals(#[case] total: u64, #[case] size: u64, #[case] expected: &str) {
        assert_eq!(record_total(total, size), expected);
    }
}
