#![allow(dead_code)]

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::MeshError;
use crate::math::{Normal, Point, Vector};
use crate::primitive::curve::Curve;
use crate::primitive::mesh::Mesh;
use crate::primitive::point_cloud::PointCloud;

const MAX_ATTR_NAME: usize = 32;

fn write_attr_name<W: Write>(w: &mut W, name: &str) -> Result<(), MeshError> {
    debug_assert!(name.len() <= MAX_ATTR_NAME);
    w.write_u8(name.len() as u8)?;
    w.write_all(name.as_bytes())?;
    Ok(())
}

fn read_attr_name<R: Read>(r: &mut R) -> Result<String, MeshError> {
    let len = r.read_u8()? as usize;
    if len > MAX_ATTR_NAME {
        return Err(MeshError::Malformed);
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| MeshError::Malformed)
}

/// Writes the binary `.mesh` format: magic `"MESH"`, version, vertex count,
/// vertex-attribute count, face count, face-attribute count, then each
/// attribute as a length-prefixed name followed by its data.
pub fn write_mesh(mesh: &Mesh, path: &Path) -> Result<(), MeshError> {
    let mut f = BufWriter::new(File::create(path)?);

    let nverts = mesh.points().len() as u32;
    let nfaces = mesh.faces().len() as u32;

    let mut vert_attrs: Vec<&str> = vec!["P"];
    if mesh.normals().is_some() {
        vert_attrs.push("N");
    }
    if mesh.uvs().is_some() {
        vert_attrs.push("uv");
    }
    if mesh.velocities().is_some() {
        vert_attrs.push("velocity");
    }

    let mut face_attrs: Vec<&str> = vec!["indices"];
    if mesh.group_ids().is_some() {
        face_attrs.push("group_id");
    }

    f.write_all(b"MESH")?;
    f.write_u32::<LittleEndian>(1)?;
    f.write_u32::<LittleEndian>(nverts)?;
    f.write_u32::<LittleEndian>(vert_attrs.len() as u32)?;
    f.write_u32::<LittleEndian>(nfaces)?;
    f.write_u32::<LittleEndian>(face_attrs.len() as u32)?;

    for name in &vert_attrs {
        write_attr_name(&mut f, name)?;
        match *name {
            "P" => {
                for p in mesh.points() {
                    f.write_f64::<LittleEndian>(p[0] as f64)?;
                    f.write_f64::<LittleEndian>(p[1] as f64)?;
                    f.write_f64::<LittleEndian>(p[2] as f64)?;
                }
            }
            "N" => {
                for n in mesh.normals().unwrap() {
                    f.write_f64::<LittleEndian>(n[0] as f64)?;
                    f.write_f64::<LittleEndian>(n[1] as f64)?;
                    f.write_f64::<LittleEndian>(n[2] as f64)?;
                }
            }
            "uv" => {
                for (u, v) in mesh.uvs().unwrap() {
                    f.write_f32::<LittleEndian>(*u)?;
                    f.write_f32::<LittleEndian>(*v)?;
                }
            }
            "velocity" => {
                for v in mesh.velocities().unwrap() {
                    f.write_f64::<LittleEndian>(v[0] as f64)?;
                    f.write_f64::<LittleEndian>(v[1] as f64)?;
                    f.write_f64::<LittleEndian>(v[2] as f64)?;
                }
            }
            _ => unreachable!(),
        }
    }

    for name in &face_attrs {
        write_attr_name(&mut f, name)?;
        match *name {
            "indices" => {
                for face in mesh.faces() {
                    f.write_i32::<LittleEndian>(face[0] as i32)?;
                    f.write_i32::<LittleEndian>(face[1] as i32)?;
                    f.write_i32::<LittleEndian>(face[2] as i32)?;
                }
            }
            "group_id" => {
                for g in mesh.group_ids().unwrap() {
                    f.write_i32::<LittleEndian>(*g as i32)?;
                }
            }
            _ => unreachable!(),
        }
    }

    Ok(())
}

pub fn read_mesh(path: &Path) -> Result<Mesh, MeshError> {
    let mut f = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    f.read_exact(&mut magic)?;
    if &magic != b"MESH" {
        return Err(MeshError::BadMagic);
    }

    let version = f.read_u32::<LittleEndian>()?;
    if version != 1 {
        return Err(MeshError::UnsupportedVersion(version));
    }

    let nverts = f.read_u32::<LittleEndian>()? as usize;
    let n_vert_attrs = f.read_u32::<LittleEndian>()?;
    let nfaces = f.read_u32::<LittleEndian>()? as usize;
    let n_face_attrs = f.read_u32::<LittleEndian>()?;

    let mut points: Option<Vec<Point>> = None;
    let mut normals: Option<Vec<Normal>> = None;
    let mut uvs: Option<Vec<(f32, f32)>> = None;
    let mut velocities: Option<Vec<Vector>> = None;

    for _ in 0..n_vert_attrs {
        let name = read_attr_name(&mut f)?;
        match name.as_str() {
            "P" => {
                let mut v = Vec::with_capacity(nverts);
                for _ in 0..nverts {
                    let x = f.read_f64::<LittleEndian>()? as f32;
                    let y = f.read_f64::<LittleEndian>()? as f32;
                    let z = f.read_f64::<LittleEndian>()? as f32;
                    v.push(Point::new(x, y, z));
                }
                points = Some(v);
            }
            "N" => {
                let mut v = Vec::with_capacity(nverts);
                for _ in 0..nverts {
                    let x = f.read_f64::<LittleEndian>()? as f32;
                    let y = f.read_f64::<LittleEndian>()? as f32;
                    let z = f.read_f64::<LittleEndian>()? as f32;
                    v.push(Normal::new(x, y, z));
                }
                normals = Some(v);
            }
            "uv" => {
                let mut v = Vec::with_capacity(nverts);
                for _ in 0..nverts {
                    let u = f.read_f32::<LittleEndian>()?;
                    let vv = f.read_f32::<LittleEndian>()?;
                    v.push((u, vv));
                }
                uvs = Some(v);
            }
            "velocity" => {
                let mut v = Vec::with_capacity(nverts);
                for _ in 0..nverts {
                    let x = f.read_f64::<LittleEndian>()? as f32;
                    let y = f.read_f64::<LittleEndian>()? as f32;
                    let z = f.read_f64::<LittleEndian>()? as f32;
                    v.push(Vector::new(x, y, z));
                }
                velocities = Some(v);
            }
            _ => return Err(MeshError::UnknownAttribute(name)),
        }
    }

    let mut faces: Option<Vec<[u32; 3]>> = None;
    let mut group_ids: Option<Vec<u32>> = None;

    for _ in 0..n_face_attrs {
        let name = read_attr_name(&mut f)?;
        match name.as_str() {
            "indices" => {
                let mut v = Vec::with_capacity(nfaces);
                for _ in 0..nfaces {
                    let a = f.read_i32::<LittleEndian>()? as u32;
                    let b = f.read_i32::<LittleEndian>()? as u32;
                    let c = f.read_i32::<LittleEndian>()? as u32;
                    v.push([a, b, c]);
                }
                faces = Some(v);
            }
            "group_id" => {
                let mut v = Vec::with_capacity(nfaces);
                for _ in 0..nfaces {
                    v.push(f.read_i32::<LittleEndian>()? as u32);
                }
                group_ids = Some(v);
            }
            _ => return Err(MeshError::UnknownAttribute(name)),
        }
    }

    let points = points.ok_or(MeshError::Malformed)?;
    let faces = faces.ok_or(MeshError::Malformed)?;
    let mut mesh = Mesh::new(points, faces);
    if let Some(n) = normals {
        mesh.set_normals(n);
    }
    if let Some(uv) = uvs {
        mesh.set_uvs(uv);
    }
    if let Some(v) = velocities {
        mesh.set_velocities(v);
    }
    if let Some(g) = group_ids {
        mesh.set_group_ids(g);
    }

    Ok(mesh)
}

/// Writes the `.crv` format. Follows the mesh file's attribute-list
/// framing: "vertex" attributes are per-control-point (`P`, `velocity`,
/// flattened 4-per-strand), "face" attributes are per-strand (`width`).
pub fn write_curve(curve: &Curve, path: &Path) -> Result<(), MeshError> {
    let mut f = BufWriter::new(File::create(path)?);

    let nstrands = curve.control_points().len() as u32;
    let nverts = nstrands * 4;

    let mut vert_attrs: Vec<&str> = vec!["P"];
    if curve.velocities().is_some() {
        vert_attrs.push("velocity");
    }
    let face_attrs: Vec<&str> = vec!["width"];

    f.write_all(b"CURV")?;
    f.write_u32::<LittleEndian>(1)?;
    f.write_u32::<LittleEndian>(nverts)?;
    f.write_u32::<LittleEndian>(vert_attrs.len() as u32)?;
    f.write_u32::<LittleEndian>(nstrands)?;
    f.write_u32::<LittleEndian>(face_attrs.len() as u32)?;

    for name in &vert_attrs {
        write_attr_name(&mut f, name)?;
        match *name {
            "P" => {
                for cp in curve.control_points() {
                    for p in cp {
                        f.write_f64::<LittleEndian>(p[0] as f64)?;
                        f.write_f64::<LittleEndian>(p[1] as f64)?;
                        f.write_f64::<LittleEndian>(p[2] as f64)?;
                    }
                }
            }
            "velocity" => {
                for vel in curve.velocities().unwrap() {
                    for v in vel {
                        f.write_f64::<LittleEndian>(v[0] as f64)?;
                        f.write_f64::<LittleEndian>(v[1] as f64)?;
                        f.write_f64::<LittleEndian>(v[2] as f64)?;
                    }
                }
            }
            _ => unreachable!(),
        }
    }

    for name in &face_attrs {
        write_attr_name(&mut f, name)?;
        for (w0, w1) in curve.widths() {
            f.write_f32::<LittleEndian>(*w0)?;
            f.write_f32::<LittleEndian>(*w1)?;
        }
    }

    Ok(())
}

pub fn read_curve(path: &Path) -> Result<Curve, MeshError> {
    let mut f = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    f.read_exact(&mut magic)?;
    if &magic != b"CURV" {
        return Err(MeshError::BadMagic);
    }

    let version = f.read_u32::<LittleEndian>()?;
    if version != 1 {
        return Err(MeshError::UnsupportedVersion(version));
    }

    let nverts = f.read_u32::<LittleEndian>()? as usize;
    let n_vert_attrs = f.read_u32::<LittleEndian>()?;
    let nstrands = f.read_u32::<LittleEndian>()? as usize;
    let n_face_attrs = f.read_u32::<LittleEndian>()?;

    if nverts != nstrands * 4 {
        return Err(MeshError::Malformed);
    }

    let mut control_points: Option<Vec<[Point; 4]>> = None;
    let mut velocities: Option<Vec<[Vector; 4]>> = None;

    for _ in 0..n_vert_attrs {
        let name = read_attr_name(&mut f)?;
        match name.as_str() {
            "P" => {
                let mut v = Vec::with_capacity(nstrands);
                for _ in 0..nstrands {
                    let mut cp = [Point::new(0.0, 0.0, 0.0); 4];
                    for c in cp.iter_mut() {
                        let x = f.read_f64::<LittleEndian>()? as f32;
                        let y = f.read_f64::<LittleEndian>()? as f32;
                        let z = f.read_f64::<LittleEndian>()? as f32;
                        *c = Point::new(x, y, z);
                    }
                    v.push(cp);
                }
                control_points = Some(v);
            }
            "velocity" => {
                let mut v = Vec::with_capacity(nstrands);
                for _ in 0..nstrands {
                    let mut vel = [Vector::new(0.0, 0.0, 0.0); 4];
                    for c in vel.iter_mut() {
                        let x = f.read_f64::<LittleEndian>()? as f32;
                        let y = f.read_f64::<LittleEndian>()? as f32;
                        let z = f.read_f64::<LittleEndian>()? as f32;
                        *c = Vector::new(x, y, z);
                    }
                    v.push(vel);
                }
                velocities = Some(v);
            }
            _ => return Err(MeshError::UnknownAttribute(name)),
        }
    }

    let mut widths: Option<Vec<(f32, f32)>> = None;
    for _ in 0..n_face_attrs {
        let name = read_attr_name(&mut f)?;
        match name.as_str() {
            "width" => {
                let mut v = Vec::with_capacity(nstrands);
                for _ in 0..nstrands {
                    let w0 = f.read_f32::<LittleEndian>()?;
                    let w1 = f.read_f32::<LittleEndian>()?;
                    v.push((w0, w1));
                }
                widths = Some(v);
            }
            _ => return Err(MeshError::UnknownAttribute(name)),
        }
    }

    let control_points = control_points.ok_or(MeshError::Malformed)?;
    let widths = widths.ok_or(MeshError::Malformed)?;
    let mut curve = Curve::new(control_points, widths);
    if let Some(v) = velocities {
        curve.set_velocities(v);
    }

    Ok(curve)
}

/// Writes the `.ptc` format. Points are the "vertex" list (`P`, `radius`,
/// `velocity`); there is no "face" list.
pub fn write_point_cloud(cloud: &PointCloud, path: &Path) -> Result<(), MeshError> {
    let mut f = BufWriter::new(File::create(path)?);

    let npoints = cloud.points().len() as u32;
    let mut vert_attrs: Vec<&str> = vec!["P", "radius"];
    if cloud.velocities().is_some() {
        vert_attrs.push("velocity");
    }

    f.write_all(b"PTCL")?;
    f.write_u32::<LittleEndian>(1)?;
    f.write_u32::<LittleEndian>(npoints)?;
    f.write_u32::<LittleEndian>(vert_attrs.len() as u32)?;
    f.write_u32::<LittleEndian>(0)?;
    f.write_u32::<LittleEndian>(0)?;

    for name in &vert_attrs {
        write_attr_name(&mut f, name)?;
        match *name {
            "P" => {
                for p in cloud.points() {
                    f.write_f64::<LittleEndian>(p[0] as f64)?;
                    f.write_f64::<LittleEndian>(p[1] as f64)?;
                    f.write_f64::<LittleEndian>(p[2] as f64)?;
                }
            }
            "radius" => {
                for r in cloud.radii() {
                    f.write_f32::<LittleEndian>(*r)?;
                }
            }
            "velocity" => {
                for v in cloud.velocities().unwrap() {
                    f.write_f64::<LittleEndian>(v[0] as f64)?;
                    f.write_f64::<LittleEndian>(v[1] as f64)?;
                    f.write_f64::<LittleEndian>(v[2] as f64)?;
                }
            }
            _ => unreachable!(),
        }
    }

    Ok(())
}

pub fn read_point_cloud(path: &Path) -> Result<PointCloud, MeshError> {
    let mut f = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    f.read_exact(&mut magic)?;
    if &magic != b"PTCL" {
        return Err(MeshError::BadMagic);
    }

    let version = f.read_u32::<LittleEndian>()?;
    if version != 1 {
        return Err(MeshError::UnsupportedVersion(version));
    }

    let npoints = f.read_u32::<LittleEndian>()? as usize;
    let n_vert_attrs = f.read_u32::<LittleEndian>()?;
    let _nfaces = f.read_u32::<LittleEndian>()?;
    let _n_face_attrs = f.read_u32::<LittleEndian>()?;

    let mut points: Option<Vec<Point>> = None;
    let mut radii: Option<Vec<f32>> = None;
    let mut velocities: Option<Vec<Vector>> = None;

    for _ in 0..n_vert_attrs {
        let name = read_attr_name(&mut f)?;
        match name.as_str() {
            "P" => {
                let mut v = Vec::with_capacity(npoints);
                for _ in 0..npoints {
                    let x = f.read_f64::<LittleEndian>()? as f32;
                    let y = f.read_f64::<LittleEndian>()? as f32;
                    let z = f.read_f64::<LittleEndian>()? as f32;
                    v.push(Point::new(x, y, z));
                }
                points = Some(v);
            }
            "radius" => {
                let mut v = Vec::with_capacity(npoints);
                for _ in 0..npoints {
                    v.push(f.read_f32::<LittleEndian>()?);
                }
                radii = Some(v);
            }
            "velocity" => {
                let mut v = Vec::with_capacity(npoints);
                for _ in 0..npoints {
                    let x = f.read_f64::<LittleEndian>()? as f32;
                    let y = f.read_f64::<LittleEndian>()? as f32;
                    let z = f.read_f64::<LittleEndian>()? as f32;
                    v.push(Vector::new(x, y, z));
                }
                velocities = Some(v);
            }
            _ => return Err(MeshError::UnknownAttribute(name)),
        }
    }

    let points = points.ok_or(MeshError::Malformed)?;
    let radii = radii.ok_or(MeshError::Malformed)?;
    let mut cloud = PointCloud::new(points, radii);
    if let Some(v) = velocities {
        cloud.set_velocities(v);
    }

    Ok(cloud)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let mut p = temp_dir();
        p.push(format!("raycore_test_{}_{}", std::process::id(), name));
        p
    }

    #[test]
    fn mesh_round_trip() {
        let path = tmp_path("mesh.mesh");
        let mut mesh = Mesh::new(
            vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        );
        mesh.set_uvs(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        mesh.set_group_ids(vec![7]);

        write_mesh(&mesh, &path).unwrap();
        let loaded = read_mesh(&path).unwrap();

        assert_eq!(loaded.points().len(), 3);
        assert_eq!(loaded.faces(), &[[0, 1, 2]]);
        assert_eq!(loaded.group_ids(), Some(&[7][..]));
        let uv = loaded.uvs().unwrap();
        assert!((uv[1].0 - 1.0).abs() < 1e-6);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn mesh_bad_magic_is_rejected() {
        let path = tmp_path("bad.mesh");
        std::fs::write(&path, b"NOPE____").unwrap();
        let result = read_mesh(&path);
        assert!(matches!(result, Err(MeshError::BadMagic)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn curve_round_trip() {
        let path = tmp_path("strand.crv");
        let cps = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
            Point::new(0.0, 3.0, 0.0),
        ];
        let curve = Curve::new(vec![cps], vec![(0.1, 0.01)]);

        write_curve(&curve, &path).unwrap();
        let loaded = read_curve(&path).unwrap();

        assert_eq!(loaded.control_points().len(), 1);
        assert_eq!(loaded.widths(), &[(0.1, 0.01)]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn point_cloud_round_trip() {
        let path = tmp_path("dust.ptc");
        let cloud = PointCloud::new(
            vec![Point::new(0.0, 0.0, 0.0), Point::new(2.0, 0.0, 0.0)],
            vec![0.1, 0.2],
        );

        write_point_cloud(&cloud, &path).unwrap();
        let loaded = read_point_cloud(&path).unwrap();

        assert_eq!(loaded.points().len(), 2);
        assert_eq!(loaded.radii(), &[0.1, 0.2]);

        std::fs::remove_file(&path).ok();
    }
}
