use std::collections::HashSet;

use terrain_mesher::{
    covered_cells, mesh_region, ChunkCoord, ChunkRegion, ColumnEntry, ColumnStore, EdgeBehavior,
    FaceNormal, MeshOutput, MesherConfig, Square, WorldDims, CHUNK_SIZE,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Store holding exactly `voxels` as `(x, y, z, material)`.
fn store_from(horizontal_chunks: u32, voxels: &[(u32, i32, u32, u8)]) -> ColumnStore {
    let dims = WorldDims::new(horizontal_chunks).unwrap();
    ColumnStore::from_fn(dims, |x, z| {
        let mut column: Vec<ColumnEntry> = voxels
            .iter()
            .filter(|v| (v.0, v.2) == (x, z))
            .map(|v| ColumnEntry::new(v.1, v.3))
            .collect();
        column.sort_by_key(|e| e.y);
        column
    })
    .unwrap()
}

fn mesh_all(store: &ColumnStore, edge: EdgeBehavior) -> MeshOutput {
    let config = MesherConfig { edge_behavior: edge, parallel: false };
    mesh_region(store, ChunkRegion::whole_world(store.dims()), &config).unwrap()
}

fn with_normal(output: &MeshOutput, normal: FaceNormal) -> Vec<Square> {
    output.squares.iter().copied().filter(|s| s.normal() == normal).collect()
}

fn sine_heights(dims: WorldDims) -> (Vec<i32>, Vec<u8>) {
    let size = dims.horizontal_size();
    let mut heights = Vec::with_capacity(size * size);
    let mut materials = Vec::with_capacity(size * size);
    for z in 0..size {
        for x in 0..size {
            let wave = (x as f64 / 40.0).sin() * (z as f64 / 40.0).sin() + 1.0;
            let height = 1 + (30.0 * wave) as i32;
            heights.push(height);
            materials.push((height / 18 + 1) as u8);
        }
    }
    (heights, materials)
}

#[test]
fn two_voxel_slab_open_edges() {
    init_logging();
    let store = store_from(1, &[(0, 0, 0, 5), (1, 0, 0, 5)]);
    let output = mesh_all(&store, EdgeBehavior::Open);

    assert_eq!(output.squares.len(), 6);
    assert!(output.squares.iter().all(|s| s.color() == 5));

    for normal in FaceNormal::ALL {
        let squares = with_normal(&output, normal);
        assert_eq!(squares.len(), 1, "{normal:?}");
        let f = squares[0].decode();
        match normal {
            FaceNormal::PosX | FaceNormal::NegX => assert_eq!((f.width, f.height), (1, 1)),
            FaceNormal::PosY | FaceNormal::NegY => assert_eq!((f.width, f.height), (2, 1)),
            // Z faces run along y then x.
            FaceNormal::PosZ | FaceNormal::NegZ => assert_eq!((f.width, f.height), (1, 2)),
        }
    }

    let pos_x = with_normal(&output, FaceNormal::PosX)[0].decode();
    let neg_x = with_normal(&output, FaceNormal::NegX)[0].decode();
    assert_eq!(pos_x.position, [2, 0, 0]);
    assert_eq!(neg_x.position, [0, 0, 0]);
    assert_eq!(with_normal(&output, FaceNormal::PosY)[0].decode().position, [0, 1, 0]);
}

#[test]
fn two_voxel_slab_solid_edges_hide_map_border() {
    let store = store_from(1, &[(0, 0, 0, 5), (1, 0, 0, 5)]);
    let output = mesh_all(&store, EdgeBehavior::Solid);

    assert_eq!(output.squares.len(), 4);
    assert!(with_normal(&output, FaceNormal::NegX).is_empty());
    assert!(with_normal(&output, FaceNormal::NegZ).is_empty());
}

#[test]
fn all_air_chunks_emit_nothing() {
    let empty = store_from(2, &[]);
    let output = mesh_all(&empty, EdgeBehavior::Open);
    assert!(output.is_empty());
    assert!(output.meshes.is_empty());
    assert_eq!(output.stats.chunks_meshed, 0);

    // Only chunk (1, 1) holds a voxel.
    let store = store_from(2, &[(100, 7, 100, 1)]);
    let output = mesh_all(&store, EdgeBehavior::Open);
    assert_eq!(output.stats.chunks_meshed, 1);
    let origin = ChunkCoord::new(1, 1).origin_world(7);
    assert!(output.meshes.iter().all(|m| m.origin() == origin));
}

#[test]
fn full_slab_merges_top_and_bottom() {
    let mut voxels = Vec::new();
    for z in 0..CHUNK_SIZE as u32 {
        for x in 0..CHUNK_SIZE as u32 {
            voxels.push((x, 3, z, 9));
        }
    }
    let store = store_from(1, &voxels);
    let output = mesh_all(&store, EdgeBehavior::Solid);

    for normal in [FaceNormal::PosY, FaceNormal::NegY] {
        let squares = with_normal(&output, normal);
        assert_eq!(squares.len(), 1);
        let f = squares[0].decode();
        assert_eq!((f.width, f.height), (64, 64));
    }
    assert_eq!(output.squares.len(), 2);
}

#[test]
fn partial_slab_merges_into_one_rect() {
    let mut voxels = Vec::new();
    for z in 10..20 {
        for x in 5..15 {
            voxels.push((x, 0, z, 2));
        }
    }
    let store = store_from(1, &voxels);
    let output = mesh_all(&store, EdgeBehavior::Open);

    let top = with_normal(&output, FaceNormal::PosY);
    assert_eq!(top.len(), 1);
    let f = top[0].decode();
    assert_eq!(f.position, [5, 1, 10]);
    assert_eq!((f.width, f.height), (10, 10));
    // Each side is a single 1×10 strip.
    assert_eq!(output.squares.len(), 6);
}

#[test]
fn chunk_seam_has_no_interior_faces() {
    init_logging();
    // A bar crossing the seam between chunks (0, 0) and (1, 0).
    let voxels: Vec<_> = (60..68).map(|x| (x, 0, 5, 1)).collect();
    let store = store_from(2, &voxels);
    let output = mesh_all(&store, EdgeBehavior::Open);

    let seam = |normal| {
        with_normal(&output, normal)
            .iter()
            .filter(|s| s.decode().position[0] == 64)
            .count()
    };
    assert_eq!(seam(FaceNormal::PosX), 0);
    assert_eq!(seam(FaceNormal::NegX), 0);
    assert_eq!(with_normal(&output, FaceNormal::PosX)[0].decode().position, [68, 0, 5]);
    assert_eq!(with_normal(&output, FaceNormal::NegX)[0].decode().position, [60, 0, 5]);
}

#[test]
fn chunk_seam_exposes_face_when_neighbor_absent() {
    // Voxel on the +x edge of chunk (0, 0) and a gap on the other side.
    let store = store_from(2, &[(63, 0, 5, 1), (65, 0, 5, 1)]);
    let output = mesh_all(&store, EdgeBehavior::Solid);

    let pos_x: Vec<_> = with_normal(&output, FaceNormal::PosX).iter().map(|s| s.decode().position).collect();
    assert!(pos_x.contains(&[64, 0, 5]));
    let neg_x: Vec<_> = with_normal(&output, FaceNormal::NegX).iter().map(|s| s.decode().position).collect();
    assert!(neg_x.contains(&[65, 0, 5]));
}

#[test]
fn z_seam_stitching() {
    let voxels: Vec<_> = (62..66).map(|z| (3, 0, z, 1)).collect();
    let store = store_from(2, &voxels);
    let output = mesh_all(&store, EdgeBehavior::Open);

    assert_eq!(with_normal(&output, FaceNormal::PosZ).len(), 1);
    assert_eq!(with_normal(&output, FaceNormal::NegZ).len(), 1);
    assert_eq!(with_normal(&output, FaceNormal::PosZ)[0].decode().position, [3, 0, 66]);
}

#[test]
fn invisible_material_hides_faces() {
    let dims = WorldDims::new(1).unwrap();
    // Column 0 holds (0, 0) and (1, 4); all others are empty.
    let words = [0, 0, 1, 4];
    let mut index = vec![4u32; dims.column_count() + 1];
    index[0] = 0;
    let store = ColumnStore::from_interleaved(dims, &words, &index).unwrap();

    let output = mesh_all(&store, EdgeBehavior::Solid);
    assert!(output.squares.iter().all(|s| s.color() == 4));
    assert!(with_normal(&output, FaceNormal::NegY).is_empty());
    assert_eq!(with_normal(&output, FaceNormal::PosY).len(), 1);
    // +x and +z sides of the visible voxel.
    assert_eq!(output.squares.len(), 3);
}

#[test]
fn tall_terrain_uses_several_windows() {
    let store = store_from(1, &[(2, 0, 2, 1), (2, 300, 2, 3)]);
    let output = mesh_all(&store, EdgeBehavior::Open);

    assert_eq!(output.stats.windows_meshed, 5);
    assert_eq!(output.squares.len(), 12);
    let top = with_normal(&output, FaceNormal::PosY);
    let ys: HashSet<u32> = top.iter().map(|s| s.decode().position[1]).collect();
    assert_eq!(ys, HashSet::from([1, 301]));
}

#[test]
fn parallel_matches_sequential() {
    init_logging();
    let dims = WorldDims::new(3).unwrap();
    let (heights, materials) = sine_heights(dims);
    let store = ColumnStore::from_heightmap(dims, &heights, &materials).unwrap();
    let region = ChunkRegion::whole_world(dims);

    let sequential = mesh_region(&store, region, &MesherConfig::sequential()).unwrap();
    let parallel = mesh_region(&store, region, &MesherConfig::default()).unwrap();

    assert!(!sequential.is_empty());
    assert_eq!(sequential.squares, parallel.squares);
    assert_eq!(sequential.meshes, parallel.meshes);
    assert_eq!(sequential.stats.visible_faces, parallel.stats.visible_faces);
    assert!(sequential.stats.merge_efficiency() > 0.3);
}

#[test]
fn region_subset_matches_whole_world_meshes() {
    let dims = WorldDims::new(2).unwrap();
    let (heights, materials) = sine_heights(dims);
    let store = ColumnStore::from_heightmap(dims, &heights, &materials).unwrap();
    let config = MesherConfig::sequential();

    let whole = mesh_region(&store, ChunkRegion::whole_world(dims), &config).unwrap();
    let corner = mesh_region(&store, ChunkRegion::new(1, 1, 1, 1), &config).unwrap();

    let origin = ChunkCoord::new(1, 1);
    let expected: Vec<Square> = whole
        .meshes
        .iter()
        .filter(|m| m.origin().x == origin.x * 64 && m.origin().z == origin.z * 64)
        .flat_map(|m| whole.squares_of(m).iter().copied())
        .collect();
    assert_eq!(corner.squares, expected);
}

#[test]
fn heightmap_terrain_has_no_duplicate_faces() {
    let dims = WorldDims::new(1).unwrap();
    let (heights, materials) = sine_heights(dims);
    let store = ColumnStore::from_heightmap(dims, &heights, &materials).unwrap();
    let output = mesh_all(&store, EdgeBehavior::Solid);

    let mut seen = HashSet::new();
    for &square in &output.squares {
        for cell in covered_cells(square) {
            assert!(seen.insert((cell, square.normal())), "{cell} {:?}", square.normal());
        }
    }
    // Every top face is drawn exactly once.
    let tops = seen.iter().filter(|(_, n)| *n == FaceNormal::PosY).count();
    assert_eq!(tops, CHUNK_SIZE * CHUNK_SIZE);
}

#[test]
fn mesh_data_matches_meshes() {
    let store = store_from(1, &[(1, 1, 1, 1), (2, 1, 1, 2)]);
    let output = mesh_all(&store, EdgeBehavior::Open);
    let data = output.padded_mesh_data(64).unwrap();

    assert_eq!(data.len(), 64);
    for (record, mesh) in data.iter().zip(&output.meshes) {
        assert_eq!(record.normal(), Some(mesh.normal()));
        assert_eq!(record.square_count(), mesh.square_count());
        assert_eq!(record.start_square, mesh.start_square());
    }
    assert!(data[output.meshes.len()..].iter().all(|d| d.square_count() == 0));
    assert_eq!(output.square_words().len(), output.squares.len() * 2);
}

#[test]
fn config_from_toml_drives_meshing() {
    let store = store_from(1, &[(0, 0, 0, 1)]);
    let open = MesherConfig::from_toml_str("edge_behavior = \"open\"\nparallel = false").unwrap();
    let solid = MesherConfig::from_toml_str("parallel = false").unwrap();
    let region = ChunkRegion::whole_world(store.dims());

    assert_eq!(mesh_region(&store, region, &open).unwrap().squares.len(), 6);
    assert_eq!(mesh_region(&store, region, &solid).unwrap().squares.len(), 4);
}
