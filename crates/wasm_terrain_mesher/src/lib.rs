//! WASM bindings for the terrain mesher.
//!
//! Provides JavaScript-accessible functions that mesh sparse column terrain
//! into GPU-ready square and mesh-record buffers.

use wasm_bindgen::prelude::*;
use terrain_mesher::{
    mesh_region, ChunkRegion, ColumnStore, EdgeBehavior, MeshError, MeshOutput, MesherConfig,
    WorldDims,
};

fn to_js_error(err: MeshError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Meshing result returned to JavaScript.
///
/// Both buffers are raw `u32` words, ready for `GPUQueue.writeBuffer`.
#[wasm_bindgen]
pub struct TerrainMeshResult {
    square_words: Vec<u32>,
    mesh_words: Vec<u32>,
    square_count: usize,
    mesh_count: usize,
    visible_faces: usize,
    squares_per_normal: [usize; 6],
    merge_efficiency: f32,
    elapsed_ms: f64,
}

#[wasm_bindgen]
impl TerrainMeshResult {
    /// Packed squares, 2 words each.
    #[wasm_bindgen(getter)]
    pub fn squares(&self) -> Vec<u32> {
        self.square_words.clone()
    }

    /// Mesh culling records, 8 words each (center, normal|count, half size, start).
    #[wasm_bindgen(getter)]
    pub fn mesh_data(&self) -> Vec<u32> {
        self.mesh_words.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn square_count(&self) -> usize {
        self.square_count
    }

    /// Number of real meshes, not counting padding records.
    #[wasm_bindgen(getter)]
    pub fn mesh_count(&self) -> usize {
        self.mesh_count
    }

    /// Unit faces before merging.
    #[wasm_bindgen(getter)]
    pub fn visible_faces(&self) -> usize {
        self.visible_faces
    }

    #[wasm_bindgen(getter)]
    pub fn merge_efficiency(&self) -> f32 {
        self.merge_efficiency
    }

    #[wasm_bindgen(getter)]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Squares per normal id (+x, -x, +y, -y, +z, -z).
    pub fn squares_per_normal(&self) -> js_sys::Array {
        self.squares_per_normal
            .iter()
            .map(|&n| JsValue::from_f64(n as f64))
            .collect()
    }

    #[wasm_bindgen(getter)]
    pub fn is_empty(&self) -> bool {
        self.square_count == 0
    }
}

impl TerrainMeshResult {
    fn from_output(output: MeshOutput, group_size: usize) -> Result<Self, MeshError> {
        let mesh_data = output.padded_mesh_data(group_size)?;
        Ok(Self {
            square_words: output.square_words().to_vec(),
            mesh_words: bytemuck::cast_slice(&mesh_data).to_vec(),
            square_count: output.squares.len(),
            mesh_count: output.meshes.len(),
            visible_faces: output.stats.visible_faces,
            squares_per_normal: output.stats.squares_per_normal,
            merge_efficiency: output.stats.merge_efficiency(),
            elapsed_ms: output.stats.elapsed_ms,
        })
    }
}

/// Mesh a region of column terrain.
///
/// # Arguments
/// * `ids` - Interleaved `(y, material)` words for all columns
/// * `index` - Word offset of each column, plus the total length
/// * `horizontal_chunks` - World size in chunks per side
/// * `start_x`, `start_z`, `size_x`, `size_z` - Chunk region to mesh
/// * `open_edges` - Emit faces on the world boundary
/// * `group_size` - Pad mesh records to a multiple of this (compute workgroup size)
///
/// # Example (JavaScript)
/// ```javascript
/// const result = mesh_terrain(ids, index, 4, 0, 0, 4, 4, false, 64);
/// device.queue.writeBuffer(squareBuffer, 0, new Uint32Array(result.squares));
/// ```
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn mesh_terrain(
    ids: &[i32],
    index: &[u32],
    horizontal_chunks: u32,
    start_x: u32,
    start_z: u32,
    size_x: u32,
    size_z: u32,
    open_edges: bool,
    group_size: usize,
) -> Result<TerrainMeshResult, JsValue> {
    let dims = WorldDims::new(horizontal_chunks).map_err(to_js_error)?;
    let store = ColumnStore::from_interleaved(dims, ids, index).map_err(to_js_error)?;

    let config = MesherConfig {
        edge_behavior: if open_edges { EdgeBehavior::Open } else { EdgeBehavior::Solid },
        ..MesherConfig::sequential()
    };
    let region = ChunkRegion::new(start_x, start_z, size_x, size_z);
    let output = mesh_region(&store, region, &config).map_err(to_js_error)?;

    log(&format!(
        "mesh_terrain: {} squares, {} meshes, {:.1}% merged",
        output.squares.len(),
        output.meshes.len(),
        output.stats.merge_efficiency() * 100.0
    ));

    TerrainMeshResult::from_output(output, group_size).map_err(to_js_error)
}

/// Mesh a heightmap world (`x + z * size` row-major heights and materials).
#[wasm_bindgen]
pub fn mesh_heightmap(
    heights: &[i32],
    materials: &[u8],
    horizontal_chunks: u32,
    open_edges: bool,
    group_size: usize,
) -> Result<TerrainMeshResult, JsValue> {
    let dims = WorldDims::new(horizontal_chunks).map_err(to_js_error)?;
    let store = ColumnStore::from_heightmap(dims, heights, materials).map_err(to_js_error)?;

    let config = MesherConfig {
        edge_behavior: if open_edges { EdgeBehavior::Open } else { EdgeBehavior::Solid },
        ..MesherConfig::sequential()
    };
    let output = mesh_region(&store, ChunkRegion::whole_world(dims), &config).map_err(to_js_error)?;

    log(&format!(
        "mesh_heightmap: {} columns, {} squares",
        dims.column_count(),
        output.squares.len()
    ));

    TerrainMeshResult::from_output(output, group_size).map_err(to_js_error)
}

/// Route Rust panics to the browser console.
#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

// Logging support

thread_local! {
    static LOG_ENABLED: std::cell::Cell<bool> = std::cell::Cell::new(false);
}

/// Enable or disable console logging.
#[wasm_bindgen]
pub fn set_log_enabled(enabled: bool) {
    LOG_ENABLED.with(|flag| flag.set(enabled));
}

fn log(message: &str) {
    if LOG_ENABLED.with(|enabled| enabled.get()) {
        web_sys::console::log_1(&message.into());
    }
}

/// Get the version of the mesher library.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
