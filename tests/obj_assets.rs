use objlit::process::obj::{lines, parse_obj, ObjError, ObjReader};

const WAND: &str = include_str!("../assets/wand.obj");
const SHOTGUN: &str = include_str!("../assets/shotgun.obj");

fn face_count(source: &str) -> usize {
    source.lines().filter(|line| line.starts_with("f ")).count()
}

#[test]
fn wand_relative_indices_resolve_per_part() {
    let vertices = parse_obj(WAND).unwrap();
    assert_eq!(vertices.len(), 3 * face_count(WAND));

    // every part is a box, so its first face lies on the -x side
    let handle = &vertices[0];
    assert_eq!(handle.position, [-0.06, 0.0, -0.06]);
    assert_eq!(handle.normal, [-1.0, 0.0, 0.0]);
    assert_eq!(handle.texture_coord, [0.125, 0.5]);

    let tip = &vertices[vertices.len() - 36];
    assert_eq!(tip.position, [-0.08, 1.4, -0.08]);
    assert_eq!(tip.texture_coord, [0.625, 0.5]);
}

#[test]
fn shotgun_absolute_indices_resolve() {
    let vertices = parse_obj(SHOTGUN).unwrap();
    assert_eq!(vertices.len(), 108);

    let top = vertices
        .iter()
        .map(|v| v.position[1])
        .fold(f32::MIN, f32::max);
    assert_eq!(top, 1.1);
    assert!(vertices.iter().all(|v| v.normal != [0.0; 3]));
}

#[test]
fn unsupported_commands_are_counted_not_fatal() {
    let mut reader = ObjReader::new();
    for line in lines(WAND) {
        reader.read_line(line).unwrap();
    }
    // mtllib plus one `o` per part
    assert_eq!(reader.skipped_lines(), 4);
    assert_eq!(reader.tables().positions().len(), 24);
    assert_eq!(reader.tables().normals().len(), 18);
    assert_eq!(reader.tables().texture_coords().len(), 3);
}

#[test]
fn truncated_asset_reports_offending_line() {
    let mut broken = String::from(SHOTGUN);
    broken.push_str("f 1/1/1 2/1/1 99/1/1\n");
    let line = broken.lines().count();

    match parse_obj(&broken) {
        Err(err @ ObjError::IndexOutOfRange { .. }) => assert_eq!(err.line(), line),
        other => panic!("unexpected result: {:?}", other),
    }
}
