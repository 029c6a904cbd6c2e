use crate::common::{FIELD_SIZE, SCALAR_FIELDS, SH_REST_FIELDS};
use crate::error::SplatError;
use foldhash::HashMap;
use foldhash::HashMapExt;

/// Vertex property name to its index within a record.
pub type FieldOffsetMap<'a> = HashMap<&'a str, usize>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Clone)]
pub struct PlyHeader<'a> {
    pub num_records: usize,
    /// Number of properties declared in the vertex element, named or not.
    pub num_fields: usize,
    pub fields: FieldOffsetMap<'a>,
    pub byte_order: ByteOrder,
    /// Offset of the first body byte, just past the `end_header` line.
    pub body_offset: usize,
}

impl PlyHeader<'_> {
    pub fn stride(&self) -> usize {
        self.num_fields * FIELD_SIZE
    }

    pub fn body_len(&self) -> Result<usize, SplatError> {
        self.num_records
            .checked_mul(self.stride())
            .ok_or_else(overflow)
    }

    /// Bytes the decoded columns occupy, independent of how many properties the file declares.
    pub fn decoded_len(&self) -> Result<usize, SplatError> {
        self.num_records
            .checked_mul((SCALAR_FIELDS + SH_REST_FIELDS) * FIELD_SIZE)
            .ok_or_else(overflow)
    }
}

fn overflow() -> SplatError {
    SplatError::ParseHeader("Overflow in byte calculation".to_string())
}

#[inline]
fn next_line<'b>(buffer: &'b [u8], offset: &mut usize) -> Option<&'b [u8]> {
    if *offset >= buffer.len() {
        return None;
    }
    let start = *offset;

    match memchr::memchr(b'\n', &buffer[*offset..]) {
        Some(pos) => {
            *offset = start + pos + 1;
            Some(&buffer[start..start + pos])
        }
        None => {
            *offset = buffer.len();
            Some(&buffer[start..])
        }
    }
}

#[inline]
fn is_vertex_element(name: &str) -> bool {
    name == "vertex" || name == "point"
}

/// Reads header lines up to `end_header`. Unknown or malformed lines are skipped;
/// only properties of the vertex element are numbered.
pub fn parse_header(raw_data: &[u8]) -> Result<PlyHeader<'_>, SplatError> {
    let mut offset = 0;
    let mut num_records = 0;
    let mut num_fields = 0;
    let mut fields = FieldOffsetMap::new();
    let mut byte_order = ByteOrder::default();
    let mut in_vertex = false;

    loop {
        let line = next_line(raw_data, &mut offset).ok_or(SplatError::MissingEndHeader)?;
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line == b"end_header" {
            break;
        }

        let Ok(text) = std::str::from_utf8(line) else {
            continue;
        };
        let mut tokens = text.split_ascii_whitespace();

        match tokens.next() {
            Some("element") => {
                in_vertex = tokens.next().is_some_and(is_vertex_element);
                if in_vertex {
                    num_records = tokens.next().and_then(|c| c.parse().ok()).unwrap_or(0);
                }
            }
            Some("property") if in_vertex => {
                let (Some(ty), Some(name)) = (tokens.next(), tokens.next()) else {
                    continue;
                };
                if ty != "list" {
                    fields.insert(name, num_fields);
                }
                num_fields += 1;
            }
            Some("format") => match tokens.next() {
                Some("binary_little_endian") => byte_order = ByteOrder::LittleEndian,
                Some("binary_big_endian") => byte_order = ByteOrder::BigEndian,
                Some("ascii") => {
                    return Err(SplatError::UnsupportedFormat(
                        "ascii bodies are not supported".to_string(),
                    ))
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(PlyHeader {
        num_records,
        num_fields,
        fields,
        byte_order,
        body_offset: offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_offsets_ignore_other_elements() {
        let data = b"ply
format binary_little_endian 1.0
element camera 1
property float fx
property float fy
element vertex 3
property float x
property float y
property float opacity
element face 2
property list uchar int vertex_indices
property float area
end_header
";
        let header = parse_header(data).unwrap();
        assert_eq!(header.num_records, 3);
        assert_eq!(header.num_fields, 3);
        assert_eq!(header.fields.len(), 3);
        assert_eq!(header.fields["x"], 0);
        assert_eq!(header.fields["y"], 1);
        assert_eq!(header.fields["opacity"], 2);
        assert!(!header.fields.contains_key("fx"));
        assert!(!header.fields.contains_key("area"));
        assert_eq!(header.stride(), 12);
        assert_eq!(header.body_offset, data.len());
    }

    #[test]
    fn test_no_vertex_element_is_empty_scene() {
        let data = b"ply\nformat binary_little_endian 1.0\nelement face 4\nproperty float a\nend_header\n";
        let header = parse_header(data).unwrap();
        assert_eq!(header.num_records, 0);
        assert_eq!(header.num_fields, 0);
        assert!(header.fields.is_empty());
        assert_eq!(header.body_len().unwrap(), 0);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let data = b"ply\nelement vertex many\nproperty float\ngarbage here\n\nproperty float z\nend_header";
        let header = parse_header(data).unwrap();
        assert_eq!(header.num_records, 0);
        assert_eq!(header.num_fields, 1);
        assert_eq!(header.fields["z"], 0);
        assert_eq!(header.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn test_crlf_header_and_big_endian() {
        let data = b"ply\r\nformat binary_big_endian 1.0\r\nelement vertex 2\r\nproperty float x\r\nend_header\r\nBODY";
        let header = parse_header(data).unwrap();
        assert_eq!(header.byte_order, ByteOrder::BigEndian);
        assert_eq!(header.num_records, 2);
        assert_eq!(header.fields["x"], 0);
        assert_eq!(&data[header.body_offset..], b"BODY");
    }

    #[test]
    fn test_list_property_is_counted_but_unnamed() {
        let data = b"element vertex 1\nproperty list uchar float extra\nproperty float x\nend_header\n";
        let header = parse_header(data).unwrap();
        assert_eq!(header.num_fields, 2);
        assert_eq!(header.fields["x"], 1);
        assert!(!header.fields.contains_key("uchar"));
    }

    #[test]
    fn test_ascii_format_rejected() {
        let data = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n0.0\n";
        assert!(matches!(
            parse_header(data),
            Err(SplatError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_end_header() {
        let data = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty float x\n";
        assert!(matches!(
            parse_header(data),
            Err(SplatError::MissingEndHeader)
        ));
        assert!(matches!(parse_header(b""), Err(SplatError::MissingEndHeader)));
    }
}
