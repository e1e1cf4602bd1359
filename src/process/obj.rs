//! Wavefront OBJ reader producing a flat, non-indexed triangle list.
//!
//! Supports 3d positions (`v`), 3d normals (`vn`), 2d texture coordinates
//! (`vt`) and triangular faces (`f`). Every face corner becomes its own
//! `Vertex`; attribute data is duplicated instead of shared through an index
//! buffer. Only the first three groups of a face are read, so quads and
//! n-gons are truncated rather than rejected.

use std::error::Error;
use std::fmt;
use std::str::SplitWhitespace;

use log::warn;

use crate::primitives::vertex::Vertex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TextureCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::TextureCoord => "texture coordinate",
            Attribute::Normal => "normal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjError {
    /// A face group with no usable index at all, e.g. `/`, `//` or a missing group.
    EmptyIndexGroup { line: usize },
    /// A face group that has texture or normal indices but no position.
    MissingPosition { line: usize },
    InvalidIndex { line: usize, token: String },
    IndexOutOfRange {
        line: usize,
        attribute: Attribute,
        index: i64,
        len: usize,
    },
    InvalidNumber { line: usize, token: String },
    MissingComponent {
        line: usize,
        command: &'static str,
        expected: usize,
        found: usize,
    },
}

impl ObjError {
    pub fn line(&self) -> usize {
        match self {
            ObjError::EmptyIndexGroup { line }
            | ObjError::MissingPosition { line }
            | ObjError::InvalidIndex { line, .. }
            | ObjError::IndexOutOfRange { line, .. }
            | ObjError::InvalidNumber { line, .. }
            | ObjError::MissingComponent { line, .. } => *line,
        }
    }
}

impl fmt::Display for ObjError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjError::EmptyIndexGroup { line } => write!(
                f,
                "invalid vertex index format in face definition on line {}",
                line
            ),
            ObjError::MissingPosition { line } => {
                write!(f, "face corner without a position index on line {}", line)
            }
            ObjError::InvalidIndex { line, token } => {
                write!(f, "vertex index {:?} does not fit on line {}", token, line)
            }
            ObjError::IndexOutOfRange {
                line,
                attribute,
                index,
                len,
            } => write!(
                f,
                "{} index {} is out of range ({} defined) on line {}",
                attribute, index, len, line
            ),
            ObjError::InvalidNumber { line, token } => {
                write!(f, "invalid number {:?} on line {}", token, line)
            }
            ObjError::MissingComponent {
                line,
                command,
                expected,
                found,
            } => write!(
                f,
                "`{}` expects {} components but got {} on line {}",
                command, expected, found, line
            ),
        }
    }
}

impl Error for ObjError {}

/// A non-blank, non-comment line split into its command keyword and arguments.
#[derive(Debug, Clone)]
pub struct ObjLine<'a> {
    pub number: usize,
    pub command: &'a str,
    pub args: SplitWhitespace<'a>,
}

pub struct ObjLines<'a> {
    lines: std::str::Lines<'a>,
    number: usize,
}

impl<'a> Iterator for ObjLines<'a> {
    type Item = ObjLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.lines.next()?;
            self.number += 1;

            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }

            let mut args = raw.split_whitespace();
            if let Some(command) = args.next() {
                return Some(ObjLine {
                    number: self.number,
                    command,
                    args,
                });
            }
        }
    }
}

pub fn lines(input: &str) -> ObjLines<'_> {
    ObjLines {
        lines: input.lines(),
        number: 0,
    }
}

#[derive(Debug, Default, Clone)]
pub struct AttributeTables {
    positions: Vec<[f32; 3]>,
    texture_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

impl AttributeTables {
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn texture_coords(&self) -> &[[f32; 2]] {
        &self.texture_coords
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn expand(&self, group: &IndexGroup, line: usize) -> Result<Vertex, ObjError> {
        let position = match group.position {
            Some(index) => resolve(&self.positions, Attribute::Position, index, line)?,
            None => return Err(ObjError::MissingPosition { line }),
        };
        let texture_coord = group
            .texture_coord
            .map(|index| resolve(&self.texture_coords, Attribute::TextureCoord, index, line))
            .transpose()?
            .unwrap_or_default();
        let normal = group
            .normal
            .map(|index| resolve(&self.normals, Attribute::Normal, index, line))
            .transpose()?
            .unwrap_or_default();

        Ok(Vertex::new(position, texture_coord, normal))
    }
}

// Positive indices are 1-based, negative ones count back from the current end.
fn resolve<T: Copy>(
    table: &[T],
    attribute: Attribute,
    index: i64,
    line: usize,
) -> Result<T, ObjError> {
    let len = table.len();
    let slot = if index > 0 {
        usize::try_from(index - 1).ok()
    } else {
        usize::try_from(index.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back))
    };

    slot.and_then(|i| table.get(i).copied())
        .ok_or(ObjError::IndexOutOfRange {
            line,
            attribute,
            index,
            len,
        })
}

/// The `p[/t[/n]]` indices of one face corner; `None` marks an empty slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexGroup {
    pub position: Option<i64>,
    pub texture_coord: Option<i64>,
    pub normal: Option<i64>,
}

pub fn parse_index_group(group: &str, line: usize) -> Result<IndexGroup, ObjError> {
    let mut indices = [None; 3];

    for (slot, token) in group.split('/').enumerate() {
        if slot >= indices.len() {
            warn!(
                "Ignoring extra index {:?} in face group {:?} on line {}",
                token, group, line
            );
            continue;
        }
        indices[slot] = parse_index(token, line)?;
    }

    if indices.iter().all(Option::is_none) {
        return Err(ObjError::EmptyIndexGroup { line });
    }

    let [position, texture_coord, normal] = indices;
    if position.is_none() {
        return Err(ObjError::MissingPosition { line });
    }

    Ok(IndexGroup {
        position,
        texture_coord,
        normal,
    })
}

fn parse_index(token: &str, line: usize) -> Result<Option<i64>, ObjError> {
    let mut value: i64 = 0;
    let mut sign = 1;
    let mut has_digits = false;

    for c in token.chars() {
        match c {
            '-' => sign = -sign,
            '0'..='9' => {
                let digit = i64::from(c as u8 - b'0');
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(|| ObjError::InvalidIndex {
                        line,
                        token: token.to_string(),
                    })?;
                has_digits = true;
            }
            _ => warn!(
                "Unsupported character {:?} in vertex index on line {}",
                c, line
            ),
        }
    }

    Ok(if has_digits { Some(sign * value) } else { None })
}

fn parse_components<const N: usize>(
    args: &mut SplitWhitespace<'_>,
    command: &'static str,
    line: usize,
) -> Result<[f32; N], ObjError> {
    let mut out = [0.0; N];

    for (found, slot) in out.iter_mut().enumerate() {
        let token = args.next().ok_or(ObjError::MissingComponent {
            line,
            command,
            expected: N,
            found,
        })?;
        *slot = token.parse::<f32>().map_err(|_| ObjError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
    }

    Ok(out)
}

#[derive(Debug, Default)]
pub struct ObjReader {
    tables: AttributeTables,
    vertices: Vec<Vertex>,
    skipped_lines: usize,
}

impl ObjReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_line(&mut self, line: ObjLine<'_>) -> Result<(), ObjError> {
        let ObjLine {
            number,
            command,
            mut args,
        } = line;

        match command {
            "v" => {
                let position = parse_components::<3>(&mut args, "v", number)?;
                self.tables.positions.push(position);
            }
            "vn" => {
                let normal = parse_components::<3>(&mut args, "vn", number)?;
                self.tables.normals.push(normal);
            }
            "vt" => {
                let texture_coord = parse_components::<2>(&mut args, "vt", number)?;
                self.tables.texture_coords.push(texture_coord);
            }
            "f" => self.read_face(args, number)?,
            _ => {
                warn!("OBJ parser does not support `{}` (line {})", command, number);
                self.skipped_lines += 1;
            }
        }

        Ok(())
    }

    fn read_face(&mut self, mut groups: SplitWhitespace<'_>, line: usize) -> Result<(), ObjError> {
        let mut corners = [Vertex::default(); 3];

        for corner in corners.iter_mut() {
            let group = groups.next().unwrap_or("");
            let indices = parse_index_group(group, line)?;
            *corner = self.tables.expand(&indices, line)?;
        }

        self.vertices.extend_from_slice(&corners);
        Ok(())
    }

    pub fn tables(&self) -> &AttributeTables {
        &self.tables
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn finish(self) -> Vec<Vertex> {
        self.vertices
    }
}

pub fn parse_obj(input: &str) -> Result<Vec<Vertex>, ObjError> {
    let mut reader = ObjReader::new();
    for line in lines(input) {
        reader.read_line(line)?;
    }
    Ok(reader.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> Result<ObjReader, ObjError> {
        let mut reader = ObjReader::new();
        for line in lines(input) {
            reader.read_line(line)?;
        }
        Ok(reader)
    }

    const SQUARE: &str = "\
# unit square
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0

vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";

    #[test]
    fn scanner_skips_blank_and_comment_lines_but_keeps_numbers() {
        let input = "# header\n\nv 1 2 3\n   \nf 1 1 1\n";
        let found: Vec<(usize, &str)> = lines(input).map(|l| (l.number, l.command)).collect();
        assert_eq!(found, vec![(3, "v"), (5, "f")]);
    }

    #[test]
    fn scanner_handles_crlf() {
        let input = "v 1 2 3\r\nvt 0.5 0.25\r\n";
        let reader = read(input).unwrap();
        assert_eq!(reader.tables().positions(), &[[1.0, 2.0, 3.0]]);
        assert_eq!(reader.tables().texture_coords(), &[[0.5, 0.25]]);
    }

    #[test]
    fn attributes_fill_tables_in_file_order() {
        let input = "v 1 0 0\nvn 0 1 0\nv 2 0 0\nvt 0.5 0.5\nv 3 0 0\nvn 0 0 1\n";
        let reader = read(input).unwrap();
        let tables = reader.tables();
        assert_eq!(
            tables.positions(),
            &[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]]
        );
        assert_eq!(tables.normals(), &[[0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(tables.texture_coords(), &[[0.5, 0.5]]);
    }

    #[test]
    fn extra_components_are_ignored() {
        let reader = read("v 1 2 3 1.0\nvt 0.1 0.2 0.0\n").unwrap();
        assert_eq!(reader.tables().positions(), &[[1.0, 2.0, 3.0]]);
        assert_eq!(reader.tables().texture_coords(), &[[0.1, 0.2]]);
    }

    #[test]
    fn positive_and_negative_indices_resolve_against_table() {
        let input = "v 1 0 0\nv 2 0 0\nv 3 0 0\nf 1 -1 -3\nf 2 -2 3\n";
        let vertices = parse_obj(input).unwrap();
        let xs: Vec<f32> = vertices.iter().map(|v| v.position[0]).collect();
        assert_eq!(xs, vec![1.0, 3.0, 1.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn negative_index_counts_from_current_table_end() {
        // `-1` on the first face refers to the second position, the last defined so far.
        let input = "v 1 0 0\nv 2 0 0\nf -1 -1 -1\nv 3 0 0\nf -1 1 2\n";
        let vertices = parse_obj(input).unwrap();
        let xs: Vec<f32> = vertices.iter().map(|v| v.position[0]).collect();
        assert_eq!(xs, vec![2.0, 2.0, 2.0, 3.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_texcoord_slot_keeps_normal() {
        let input = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nvt 0.3 0.7\nvn 1 0 0\nvn 0 1 0\nf 4//2 1//1 2//2\n";
        let vertices = parse_obj(input).unwrap();
        assert_eq!(vertices[0].position, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[0].texture_coord, [0.0, 0.0]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].normal, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn position_only_faces_have_zero_texcoord_and_normal() {
        let vertices = parse_obj("v 1 2 3\nv 4 5 6\nv 7 8 9\nf 1 2 3\n").unwrap();
        assert_eq!(vertices.len(), 3);
        for (vertex, x) in vertices.iter().zip([1.0, 4.0, 7.0]) {
            assert_eq!(vertex.position[0], x);
            assert_eq!(vertex.texture_coord, [0.0, 0.0]);
            assert_eq!(vertex.normal, [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn full_triplets_resolve_every_attribute() {
        let input = "v 1 1 1\nvt 0.25 0.75\nvn 0 0 -1\nf 1/1/1 1/1/1 -1/-1/-1\n";
        let vertices = parse_obj(input).unwrap();
        let expected = Vertex::new([1.0, 1.0, 1.0], [0.25, 0.75], [0.0, 0.0, -1.0]);
        assert_eq!(vertices, vec![expected; 3]);
    }

    #[test]
    fn unit_square_expands_to_six_vertices() {
        let vertices = parse_obj(SQUARE).unwrap();
        assert_eq!(vertices.len(), 6);

        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ]
        );
        for vertex in &vertices {
            assert_eq!(vertex.texture_coord[0], vertex.position[0]);
            assert_eq!(vertex.texture_coord[1], vertex.position[1]);
            assert_eq!(vertex.normal, [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn fourth_face_group_is_ignored() {
        let input = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        assert_eq!(parse_obj(input).unwrap().len(), 3);
    }

    #[test]
    fn unknown_commands_are_skipped() {
        let input = "mtllib wand.mtl\no Wand\nv 0 0 0\ns off\nusemtl palette\nf 1 1 1\n";
        let reader = read(input).unwrap();
        assert_eq!(reader.skipped_lines(), 4);
        assert_eq!(reader.vertices().len(), 3);
    }

    #[test]
    fn stray_characters_warn_but_keep_digits() {
        let group = parse_index_group("1a2/x/3", 9).unwrap();
        assert_eq!(
            group,
            IndexGroup {
                position: Some(12),
                texture_coord: None,
                normal: Some(3),
            }
        );
    }

    #[test]
    fn slash_only_group_is_fatal_with_line_number() {
        let input = "v 0 0 0\nv 1 0 0\n\nf 1 / 2\n";
        assert_eq!(
            parse_obj(input).unwrap_err(),
            ObjError::EmptyIndexGroup { line: 4 }
        );
    }

    #[test]
    fn missing_group_is_fatal() {
        let err = parse_obj("v 0 0 0\nf 1 1\n").unwrap_err();
        assert_eq!(err, ObjError::EmptyIndexGroup { line: 2 });
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn group_without_position_is_fatal() {
        let err = parse_obj("v 0 0 0\nvt 0 0\nf /1 1 1\n").unwrap_err();
        assert_eq!(err, ObjError::MissingPosition { line: 3 });
    }

    #[test]
    fn out_of_range_index_is_fatal() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 3\n").unwrap_err();
        assert_eq!(
            err,
            ObjError::IndexOutOfRange {
                line: 3,
                attribute: Attribute::Position,
                index: 3,
                len: 2,
            }
        );

        let err = parse_obj("v 0 0 0\nf 1 -2 1\n").unwrap_err();
        assert!(matches!(err, ObjError::IndexOutOfRange { index: -2, .. }));

        let err = parse_obj("v 0 0 0\nf 1/1 1 1\n").unwrap_err();
        assert!(matches!(
            err,
            ObjError::IndexOutOfRange {
                attribute: Attribute::TextureCoord,
                len: 0,
                ..
            }
        ));
    }

    #[test]
    fn explicit_zero_index_is_rejected() {
        let err = parse_obj("v 0 0 0\nf 0 1 1\n").unwrap_err();
        assert!(matches!(err, ObjError::IndexOutOfRange { index: 0, .. }));
    }

    #[test]
    fn huge_index_is_rejected() {
        let err = parse_obj("v 0 0 0\nf 99999999999999999999 1 1\n").unwrap_err();
        assert!(matches!(err, ObjError::InvalidIndex { line: 2, .. }));
    }

    #[test]
    fn malformed_numbers_are_fatal() {
        assert_eq!(
            parse_obj("v 1 two 3\n").unwrap_err(),
            ObjError::InvalidNumber {
                line: 1,
                token: "two".to_string(),
            }
        );
        assert_eq!(
            parse_obj("\nvt 0.5\n").unwrap_err(),
            ObjError::MissingComponent {
                line: 2,
                command: "vt",
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn error_messages_name_the_line() {
        let err = ObjError::EmptyIndexGroup { line: 17 };
        assert!(err.to_string().contains("line 17"));
    }
}
