use crate::common::{FIELD_SIZE, SH_CHANNELS, SH_COEFFS_PER_CHANNEL};
use crate::fields::{FieldSlot, ResolvedFields};
use crate::header::ByteOrder;
use crate::structures::SceneColumns;
use rayon::prelude::*;
use zerocopy::byteorder::{BigEndian, LittleEndian, F32};
use zerocopy::FromBytes;

/// Fixed-stride view over the binary body. The body may be shorter than
/// `count * stride`; reads past its end yield zero.
#[derive(Debug, Clone, Copy)]
pub struct RecordTable<'a> {
    body: &'a [u8],
    stride: usize,
    count: usize,
    byte_order: ByteOrder,
}

/// One record's bytes. Possibly truncated, possibly empty.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    bytes: &'a [u8],
    byte_order: ByteOrder,
}

impl<'a> RecordTable<'a> {
    pub fn new(body: &'a [u8], stride: usize, count: usize, byte_order: ByteOrder) -> Self {
        let expected = count.saturating_mul(stride);
        RecordTable {
            body: &body[..body.len().min(expected)],
            stride,
            count,
            byte_order,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of records whose bytes are entirely present.
    pub fn complete_records(&self) -> usize {
        if self.stride == 0 {
            self.count
        } else {
            (self.body.len() / self.stride).min(self.count)
        }
    }

    pub fn record(&self, i: usize) -> RecordView<'a> {
        let start = (i * self.stride).min(self.body.len());
        let end = (start + self.stride).min(self.body.len());
        RecordView {
            bytes: &self.body[start..end],
            byte_order: self.byte_order,
        }
    }
}

impl RecordView<'_> {
    #[inline]
    pub fn get(&self, slot: FieldSlot) -> f32 {
        let Some(p) = slot else {
            return 0.0;
        };
        let Some(bytes) = self.bytes.get(p * FIELD_SIZE..(p + 1) * FIELD_SIZE) else {
            return 0.0;
        };
        match self.byte_order {
            ByteOrder::LittleEndian => F32::<LittleEndian>::read_from_bytes(bytes)
                .ok()
                .map(|v| v.get()),
            ByteOrder::BigEndian => F32::<BigEndian>::read_from_bytes(bytes)
                .ok()
                .map(|v| v.get()),
        }
        .unwrap_or(0.0)
    }
}

fn decode_column(records: &RecordTable<'_>, slot: FieldSlot) -> Vec<f32> {
    if slot.is_none() {
        return vec![0.0; records.len()];
    }
    (0..records.len())
        .into_par_iter()
        .map(|i| records.record(i).get(slot))
        .collect()
}

/// De-interleaves one colour channel of the harmonic coefficients: file field
/// `f_rest_{3*j + channel}` lands at `[i * 15 + j]`.
fn decode_sh_channel(records: &RecordTable<'_>, fields: &ResolvedFields, channel: usize) -> Vec<f32> {
    let mut out = vec![0.0; records.len() * SH_COEFFS_PER_CHANNEL];
    let slots: [FieldSlot; SH_COEFFS_PER_CHANNEL] =
        std::array::from_fn(|j| fields.sh_slot(j, channel));
    if slots.iter().all(Option::is_none) {
        return out;
    }
    out.par_chunks_mut(SH_COEFFS_PER_CHANNEL)
        .enumerate()
        .for_each(|(i, row)| {
            let record = records.record(i);
            for (dst, &slot) in row.iter_mut().zip(&slots) {
                *dst = record.get(slot);
            }
        });
    out
}

pub fn decode_records(records: &RecordTable<'_>, fields: &ResolvedFields) -> SceneColumns {
    let [sh_r, sh_g, sh_b]: [Vec<f32>; SH_CHANNELS] =
        std::array::from_fn(|channel| decode_sh_channel(records, fields, channel));

    SceneColumns {
        num_splats: records.len(),
        xyz_x: decode_column(records, fields.position[0]),
        xyz_y: decode_column(records, fields.position[1]),
        xyz_z: decode_column(records, fields.position[2]),
        opacity: decode_column(records, fields.opacity),
        scale_x: decode_column(records, fields.scale[0]),
        scale_y: decode_column(records, fields.scale[1]),
        scale_z: decode_column(records, fields.scale[2]),
        rot_w: decode_column(records, fields.rotation[0]),
        rot_x: decode_column(records, fields.rotation[1]),
        rot_y: decode_column(records, fields.rotation[2]),
        rot_z: decode_column(records, fields.rotation[3]),
        color_r: decode_column(records, fields.color[0]),
        color_g: decode_column(records, fields.color[1]),
        color_b: decode_column(records, fields.color[2]),
        sh_r,
        sh_g,
        sh_b,
    }
}
