pub mod backend;
pub mod camera;
pub mod common;
pub mod decode;
pub mod error;
pub mod fields;
pub mod header;
pub mod postprocess;
pub mod preview;
pub mod structures;
pub mod transform;

pub use backend::{ComputeBackend, SplatRenderer};
pub use camera::{Camera, CameraInput};
pub use error::SplatError;
pub use preview::PreviewBackend;
pub use structures::{FrameTransform, RenderOutput, SceneColumns};

use common::is_zstd;
use decode::{decode_records, RecordTable};
use fields::ResolvedFields;
use header::parse_header;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};
use zstd::stream::decode_all;

/// Parses the header and decodes every record of an uncompressed scene.
#[inline(never)]
pub fn load_scene(raw_data: &[u8]) -> Result<SceneColumns, SplatError> {
    let header = parse_header(raw_data)?;
    if header.num_records == 0 {
        warn!("Scene declares no vertex records");
    }

    let fields = ResolvedFields::resolve(&header.fields);
    debug!(
        "Header: {} records, {} properties, {} splat fields resolved",
        header.num_records,
        header.num_fields,
        fields.resolved_count()
    );

    let expected = header.body_len()?;
    header.decoded_len()?;
    let body = &raw_data[header.body_offset..];
    let records = RecordTable::new(body, header.stride(), header.num_records, header.byte_order);
    if records.complete_records() < records.len() {
        warn!(
            "Binary data is too short, need {} bytes, have {}; {} of {} records complete, the rest read as zero",
            expected,
            body.len(),
            records.complete_records(),
            records.len()
        );
    }

    info!("Loading {} splats...", header.num_records);
    Ok(decode_records(&records, &fields))
}

#[inline(never)]
fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>, SplatError> {
    decode_all(Cursor::new(data))
        .map_err(|e| SplatError::ZstdDecompress(format!("Decompression failed: {}", e)))
}

/// Reads a scene file, inflating it first if it is a zstd stream.
pub fn read_scene_file(path: impl AsRef<Path>) -> Result<Vec<u8>, SplatError> {
    let raw_data = fs::read(path)?;
    if is_zstd(&raw_data) {
        debug!("Input is zstd-compressed ({} bytes)", raw_data.len());
        return decompress_zstd(&raw_data);
    }
    Ok(raw_data)
}

/// Reads a scene file and decodes it into columns.
pub fn load_scene_file(path: impl AsRef<Path>) -> Result<SceneColumns, SplatError> {
    let raw_data = read_scene_file(path)?;
    load_scene(&raw_data)
}

cfg_if::cfg_if! {
if #[cfg(feature = "async")] {
    use tokio::io::{AsyncReadExt, BufReader};
    use async_compression::tokio::bufread::ZstdDecoder;

    #[inline(never)]
    async fn decompress_zstd_async(data: &[u8]) -> Result<Vec<u8>, SplatError> {
        let reader = BufReader::new(Cursor::new(data));
        let mut decoder = ZstdDecoder::new(reader);
        let mut decompressed = Vec::new();

        decoder.read_to_end(&mut decompressed)
            .await
            .map_err(|e| SplatError::ZstdDecompress(e.to_string()))?;

        Ok(decompressed)
    }

    /// Async counterpart of [`read_scene_file`].
    pub async fn read_scene_file_async(path: impl AsRef<Path>) -> Result<Vec<u8>, SplatError> {
        let raw_data = tokio::fs::read(path).await?;
        if is_zstd(&raw_data) {
            debug!("Input is zstd-compressed ({} bytes)", raw_data.len());
            return decompress_zstd_async(&raw_data).await;
        }
        Ok(raw_data)
    }

    /// Async counterpart of [`load_scene_file`].
    pub async fn load_scene_file_async(path: impl AsRef<Path>) -> Result<SceneColumns, SplatError> {
        let raw_data = read_scene_file_async(path).await?;
        load_scene(&raw_data)
    }
}
}
