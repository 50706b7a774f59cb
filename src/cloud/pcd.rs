//! Minimal PCD (point cloud data) codec.
//!
//! Reads `ascii` and `binary` PCD payloads and keeps only the `x`, `y`, `z`
//! fields, which must be 4-byte floats; every other field is skipped. Writes
//! binary PCD with exactly those three fields. `binary_compressed` payloads
//! are rejected.

use crate::cloud::{PointCloud, PointXyz};
use crate::util::{LinemodError, LinemodResult};

fn malformed(reason: impl Into<String>) -> LinemodError {
    LinemodError::MalformedCloud {
        reason: reason.into(),
    }
}

#[derive(Debug, Default)]
struct PcdHeader {
    fields: Vec<String>,
    sizes: Vec<usize>,
    types: Vec<char>,
    counts: Vec<usize>,
    width: usize,
    height: usize,
    points: Option<usize>,
}

/// Byte and token positions of the coordinate fields within one record.
struct Layout {
    record_size: usize,
    tokens_per_record: usize,
    byte_offsets: [usize; 3],
    token_offsets: [usize; 3],
}

impl PcdHeader {
    fn num_points(&self) -> LinemodResult<usize> {
        match self.points {
            Some(points) => Ok(points),
            None => self
                .width
                .checked_mul(self.height)
                .ok_or_else(|| malformed("WIDTH x HEIGHT overflows")),
        }
    }

    fn layout(&self) -> LinemodResult<Layout> {
        let n = self.fields.len();
        if n == 0 {
            return Err(malformed("missing FIELDS"));
        }
        if self.sizes.len() != n || self.types.len() != n {
            return Err(malformed("SIZE/TYPE do not match FIELDS"));
        }
        let counts = if self.counts.is_empty() {
            vec![1; n]
        } else if self.counts.len() == n {
            self.counts.clone()
        } else {
            return Err(malformed("COUNT does not match FIELDS"));
        };

        let mut byte_offsets = [usize::MAX; 3];
        let mut token_offsets = [usize::MAX; 3];
        let mut byte = 0;
        let mut token = 0;
        for (idx, name) in self.fields.iter().enumerate() {
            let axis = match name.as_str() {
                "x" => Some(0),
                "y" => Some(1),
                "z" => Some(2),
                _ => None,
            };
            if let Some(axis) = axis {
                if self.types[idx] != 'F' || self.sizes[idx] != 4 || counts[idx] == 0 {
                    return Err(malformed(format!("field {name} must be a 4-byte float")));
                }
                byte_offsets[axis] = byte;
                token_offsets[axis] = token;
            }
            byte = self.sizes[idx]
                .checked_mul(counts[idx])
                .and_then(|field| byte.checked_add(field))
                .ok_or_else(|| malformed("record size overflows"))?;
            token = token
                .checked_add(counts[idx])
                .ok_or_else(|| malformed("record size overflows"))?;
        }
        if byte_offsets.contains(&usize::MAX) {
            return Err(malformed("x, y and z fields are required"));
        }
        if byte == 0 {
            return Err(malformed("empty record"));
        }

        Ok(Layout {
            record_size: byte,
            tokens_per_record: token,
            byte_offsets,
            token_offsets,
        })
    }
}

fn parse_one(values: &[&str], key: &str) -> LinemodResult<usize> {
    values
        .first()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| malformed(format!("invalid {key}")))
}

fn parse_list(values: &[&str], key: &str) -> LinemodResult<Vec<usize>> {
    values
        .iter()
        .map(|v| v.parse().map_err(|_| malformed(format!("invalid {key}"))))
        .collect()
}

/// Decodes a PCD payload into an xyz cloud.
///
/// The cloud is organized as `WIDTH x HEIGHT` when that matches `POINTS`,
/// otherwise it is returned unorganized.
pub fn read_pcd(bytes: &[u8]) -> LinemodResult<PointCloud<PointXyz>> {
    let mut header = PcdHeader::default();
    let mut pos = 0usize;

    loop {
        let rest = &bytes[pos..];
        let Some(newline) = rest.iter().position(|&b| b == b'\n') else {
            return Err(malformed("header ended before DATA"));
        };
        let line = std::str::from_utf8(&rest[..newline])
            .map_err(|_| malformed("header is not valid utf-8"))?
            .trim();
        pos += newline + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        let values: Vec<&str> = tokens.collect();
        match key.to_ascii_uppercase().as_str() {
            "FIELDS" => header.fields = values.iter().map(|v| v.to_string()).collect(),
            "SIZE" => header.sizes = parse_list(&values, "SIZE")?,
            "TYPE" => {
                header.types = values
                    .iter()
                    .map(|v| v.chars().next().unwrap_or('?').to_ascii_uppercase())
                    .collect()
            }
            "COUNT" => header.counts = parse_list(&values, "COUNT")?,
            "WIDTH" => header.width = parse_one(&values, "WIDTH")?,
            "HEIGHT" => header.height = parse_one(&values, "HEIGHT")?,
            "POINTS" => header.points = Some(parse_one(&values, "POINTS")?),
            "DATA" => {
                let format = values.first().copied().unwrap_or("");
                let points = match format {
                    "ascii" => decode_ascii(&header, &bytes[pos..])?,
                    "binary" => decode_binary(&header, &bytes[pos..])?,
                    other => return Err(malformed(format!("unsupported DATA format '{other}'"))),
                };
                return Ok(organize(&header, points));
            }
            _ => {}
        }
    }
}

fn organize(header: &PcdHeader, points: Vec<PointXyz>) -> PointCloud<PointXyz> {
    let organized = header.width.checked_mul(header.height) == Some(points.len());
    if organized && header.height > 0 {
        PointCloud {
            points,
            width: header.width,
            height: header.height,
        }
    } else {
        PointCloud::unorganized(points)
    }
}

fn decode_ascii(header: &PcdHeader, body: &[u8]) -> LinemodResult<Vec<PointXyz>> {
    let layout = header.layout()?;
    let expected = header.num_points()?;
    let text = std::str::from_utf8(body).map_err(|_| malformed("ascii data is not valid utf-8"))?;

    // Not presized from POINTS.
    let mut points = Vec::new();
    for line in text.lines() {
        if points.len() == expected {
            break;
        }
        let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < layout.tokens_per_record {
            return Err(malformed(format!("short record at point {}", points.len())));
        }
        let mut coords = [0.0f32; 3];
        for (axis, coord) in coords.iter_mut().enumerate() {
            let token = tokens[layout.token_offsets[axis]];
            *coord = token
                .parse()
                .map_err(|_| malformed(format!("invalid coordinate '{token}'")))?;
        }
        points.push(PointXyz::new(coords[0], coords[1], coords[2]));
    }

    if points.len() != expected {
        return Err(malformed(format!(
            "expected {expected} points, found {}",
            points.len()
        )));
    }
    Ok(points)
}

fn decode_binary(header: &PcdHeader, body: &[u8]) -> LinemodResult<Vec<PointXyz>> {
    let layout = header.layout()?;
    let expected = header.num_points()?;
    let needed = expected
        .checked_mul(layout.record_size)
        .ok_or_else(|| malformed(format!("{expected} points overflow the payload size")))?;
    if body.len() < needed {
        return Err(malformed(format!(
            "binary data holds {} bytes, {needed} needed",
            body.len()
        )));
    }

    let read_f32 = |record: &[u8], offset: usize| {
        f32::from_le_bytes([
            record[offset],
            record[offset + 1],
            record[offset + 2],
            record[offset + 3],
        ])
    };

    let points = body[..needed]
        .chunks_exact(layout.record_size)
        .map(|record| {
            PointXyz::new(
                read_f32(record, layout.byte_offsets[0]),
                read_f32(record, layout.byte_offsets[1]),
                read_f32(record, layout.byte_offsets[2]),
            )
        })
        .collect();
    Ok(points)
}

/// Encodes a cloud as binary PCD with `x y z` float fields.
pub fn write_pcd_binary(cloud: &PointCloud<PointXyz>) -> Vec<u8> {
    let header = format!(
        "# .PCD v0.7 - Point Cloud Data file format\n\
         VERSION 0.7\n\
         FIELDS x y z\n\
         SIZE 4 4 4\n\
         TYPE F F F\n\
         COUNT 1 1 1\n\
         WIDTH {}\n\
         HEIGHT {}\n\
         VIEWPOINT 0 0 0 1 0 0 0\n\
         POINTS {}\n\
         DATA binary\n",
        cloud.width(),
        cloud.height(),
        cloud.len()
    );

    let mut out = Vec::with_capacity(header.len() + cloud.len() * 12);
    out.extend_from_slice(header.as_bytes());
    for p in cloud.points() {
        out.extend_from_slice(&p.x.to_le_bytes());
        out.extend_from_slice(&p.y.to_le_bytes());
        out.extend_from_slice(&p.z.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{read_pcd, write_pcd_binary};
    use crate::cloud::{PointCloud, PointXyz};
    use crate::util::LinemodError;

    fn assert_malformed(text: &str) {
        match read_pcd(text.as_bytes()) {
            Err(LinemodError::MalformedCloud { .. }) => {}
            other => panic!("expected malformed cloud, got {other:?}"),
        }
    }

    #[test]
    fn reads_ascii_with_extra_fields() {
        let text = "# comment\n\
                    VERSION 0.7\n\
                    FIELDS x y z rgb\n\
                    SIZE 4 4 4 4\n\
                    TYPE F F F U\n\
                    COUNT 1 1 1 1\n\
                    WIDTH 2\n\
                    HEIGHT 1\n\
                    POINTS 2\n\
                    DATA ascii\n\
                    1.0 2.0 3.0 0\n\
                    nan nan nan 0\n";
        let cloud = read_pcd(text.as_bytes()).unwrap();
        assert_eq!((cloud.width(), cloud.height()), (2, 1));
        assert_eq!(cloud.points()[0], PointXyz::new(1.0, 2.0, 3.0));
        assert!(!cloud.points()[1].is_finite());
    }

    #[test]
    fn binary_round_trip_keeps_organization_and_nans() {
        let points = vec![
            PointXyz::new(0.5, -1.0, 2.0),
            PointXyz::NAN,
            PointXyz::new(3.0, 4.0, 5.0),
            PointXyz::new(-2.0, 0.0, 1.25),
        ];
        let cloud = PointCloud::new(points.clone(), 2, 2).unwrap();
        let decoded = read_pcd(&write_pcd_binary(&cloud)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
        assert_eq!(decoded.points()[0], points[0]);
        assert!(decoded.points()[1].x.is_nan());
        assert_eq!(decoded.points()[3], points[3]);
    }

    #[test]
    fn rejects_missing_axis_and_short_binary() {
        let no_z = "FIELDS x y\nSIZE 4 4\nTYPE F F\nWIDTH 1\nHEIGHT 1\nDATA ascii\n1 2\n";
        assert!(read_pcd(no_z.as_bytes()).is_err());

        let short = "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 2\nHEIGHT 1\nDATA binary\n\0\0\0\0";
        assert!(read_pcd(short.as_bytes()).is_err());

        assert!(read_pcd(b"VERSION 0.7\n").is_err());
    }

    #[test]
    fn oversized_point_counts_are_malformed() {
        assert_malformed(
            "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 1\nHEIGHT 1\n\
             POINTS 18446744073709551615\nDATA ascii\n1 2 3\n",
        );
        assert_malformed(
            "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 1\nHEIGHT 1\n\
             POINTS 4611686018427387904\nDATA binary\n\0\0\0\0",
        );
        assert_malformed(
            "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 4294967296\n\
             HEIGHT 4294967296\nDATA binary\n\0\0\0\0",
        );
    }

    #[test]
    fn zero_counts_and_huge_sizes_are_malformed() {
        assert_malformed(
            "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 0 0 0\nWIDTH 1\nHEIGHT 1\n\
             DATA binary\n\0\0\0\0",
        );
        assert_malformed(
            "FIELDS x y z pad\nSIZE 4 4 4 18446744073709551615\nTYPE F F F U\n\
             COUNT 1 1 1 2\nWIDTH 1\nHEIGHT 1\nDATA binary\n\0\0\0\0",
        );
    }
}
