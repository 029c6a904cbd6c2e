use crate::common::SH_REST_FIELDS;
use crate::header::FieldOffsetMap;

/// Field index within a record, or `None` when the file doesn't declare it.
pub type FieldSlot = Option<usize>;

/// Offsets of every attribute the renderer consumes. None of them is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFields {
    pub position: [FieldSlot; 3],
    pub opacity: FieldSlot,
    pub scale: [FieldSlot; 3],
    /// `rot_0..rot_3`, stored as (w, x, y, z).
    pub rotation: [FieldSlot; 4],
    pub color: [FieldSlot; 3],
    /// `f_rest_0..f_rest_44`, in file (interleaved) order.
    pub sh_rest: [FieldSlot; SH_REST_FIELDS],
}

impl ResolvedFields {
    pub fn resolve(fields: &FieldOffsetMap<'_>) -> Self {
        let idx = |name: &str| fields.get(name).copied();

        ResolvedFields {
            position: [idx("x"), idx("y"), idx("z")],
            opacity: idx("opacity"),
            scale: [idx("scale_0"), idx("scale_1"), idx("scale_2")],
            rotation: [idx("rot_0"), idx("rot_1"), idx("rot_2"), idx("rot_3")],
            color: [idx("f_dc_0"), idx("f_dc_1"), idx("f_dc_2")],
            sh_rest: std::array::from_fn(|i| idx(&format!("f_rest_{}", i))),
        }
    }

    /// Slot of harmonic basis `j` for `channel` (R=0, G=1, B=2).
    #[inline]
    pub fn sh_slot(&self, j: usize, channel: usize) -> FieldSlot {
        self.sh_rest[j * 3 + channel]
    }

    pub fn resolved_count(&self) -> usize {
        self.position
            .iter()
            .chain(std::iter::once(&self.opacity))
            .chain(&self.scale)
            .chain(&self.rotation)
            .chain(&self.color)
            .chain(&self.sh_rest)
            .filter(|slot| slot.is_some())
            .count()
    }
}
