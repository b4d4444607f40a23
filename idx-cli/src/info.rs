use std::path::Path;

use idx_error::IdxResult;
use idx_format::RangeReader;

pub async fn exec_info(file: impl AsRef<Path>) -> IdxResult<()> {
    let reader = RangeReader::open_path(file.as_ref()).await?;
    let geometry = reader.geometry();

    println!("file:         {}", file.as_ref().display());
    println!("dtype:        {} (0x{:02X})", geometry.dtype(), geometry.dtype().code());
    println!("dims:         {}", geometry.dim_string());
    println!("records:      {}", geometry.len());
    println!("header size:  {}", geometry.header_size());
    println!("element size: {}", geometry.element_size());
    println!("body size:    {}", geometry.body_size());
    if geometry.dtype().is_narrowed() {
        println!("note:         values decode as f32");
    }

    Ok(())
}
