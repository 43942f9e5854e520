#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use std::fmt;

use geom::{BevelDiagnostics, BevelOptions, BevelOutput, PolyMesh, bevel_mesh};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Mesh zoals de host hem aanlevert: posities en per face de hoekindices.
#[derive(Debug, Clone, Default, Deserialize)]
struct MeshInput {
    vertices: Vec<[f64; 3]>,
    faces: Vec<Vec<usize>>,
    #[serde(default)]
    uvs: Option<Vec<Vec<[f64; 2]>>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct MeshExport {
    vertices: Vec<[f64; 3]>,
    faces: Vec<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uvs: Option<Vec<Vec<[f64; 2]>>>,
    materials: Vec<u32>,
}

impl MeshExport {
    fn from_mesh(mesh: &PolyMesh) -> Self {
        let mesh = mesh.compacted();
        let vertices = mesh.vertices.iter().map(|v| v.position.to_array()).collect();
        let faces = mesh.faces.iter().map(|f| f.verts.clone()).collect();
        let uvs = if mesh.faces.iter().all(|f| f.uvs.is_some()) && !mesh.faces.is_empty() {
            Some(mesh.faces.iter().map(|f| f.uvs.clone().unwrap_or_default()).collect())
        } else {
            None
        };
        let materials = mesh.faces.iter().map(|f| f.material).collect();
        Self { vertices, faces, uvs, materials }
    }
}

#[derive(Debug, Serialize)]
struct BevelReport<'a> {
    summary: String,
    clean: bool,
    warnings: &'a [String],
    new_faces: usize,
    removed_vertices: usize,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct BevelEngine {
    initialized: bool,
    mesh: Option<PolyMesh>,
    options: BevelOptions,
    last_output: Option<BevelOutput>,
    last_diagnostics: Option<BevelDiagnostics>,
}

impl Default for BevelEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl BevelEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> BevelEngine {
        BevelEngine {
            initialized: true,
            mesh: None,
            options: BevelOptions::default(),
            last_output: None,
            last_diagnostics: None,
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Laad een mesh (`{ vertices, faces, uvs? }`) en wis de vorige bevel-resultaten.
    #[wasm_bindgen]
    pub fn load_mesh(&mut self, mesh: JsValue) -> Result<(), JsValue> {
        let input: MeshInput = serde_wasm_bindgen::from_value(mesh).map_err(to_js_error)?;
        self.load_input(input).map_err(|err| js_error(&err))
    }

    /// Selecteer edges als platte lijst van vertexparen `[a0, b0, a1, b1, ...]`.
    #[wasm_bindgen]
    pub fn select_edges(&mut self, pairs: &[u32]) -> Result<(), JsValue> {
        self.select_edge_pairs(pairs).map_err(|err| js_error(&err))
    }

    /// Selecteer vertices voor een bevel in vertexmodus.
    #[wasm_bindgen]
    pub fn select_vertices(&mut self, ids: &[u32]) -> Result<(), JsValue> {
        self.select_vertex_ids(ids).map_err(|err| js_error(&err))
    }

    /// Stel de bevel-opties in; ontbrekende velden krijgen hun standaardwaarde.
    #[wasm_bindgen]
    pub fn set_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: BevelOptions = serde_wasm_bindgen::from_value(options).map_err(to_js_error)?;
        options.validate().map_err(to_js_error)?;
        self.options = options;
        Ok(())
    }

    /// Voer de bevel uit op de geladen mesh met de huidige selectie.
    #[wasm_bindgen]
    pub fn bevel(&mut self) -> Result<(), JsValue> {
        self.run_bevel().map_err(|err| js_error(&err))
    }

    /// Haalt de huidige mesh op, zonder verwijderde elementen.
    #[wasm_bindgen]
    pub fn get_mesh(&self) -> Result<JsValue, JsValue> {
        let Some(mesh) = self.mesh.as_ref() else {
            return Err(js_error("er is geen mesh geladen"));
        };
        serde_wasm_bindgen::to_value(&MeshExport::from_mesh(mesh))
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Haalt een samenvatting van de laatste bevel op.
    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let report = self.report().ok_or_else(|| js_error("er is nog geen bevel uitgevoerd"))?;
        serde_wasm_bindgen::to_value(&report).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl BevelEngine {
    fn load_input(&mut self, input: MeshInput) -> Result<(), String> {
        let mut mesh = PolyMesh::from_vertices_faces(&input.vertices, &input.faces).map_err(|e| e.to_string())?;
        if let Some(uvs) = input.uvs {
            if uvs.len() != mesh.faces.len() {
                return Err(format!("{} uv-lijsten voor {} faces", uvs.len(), mesh.faces.len()));
            }
            for (face, corners) in mesh.faces.iter_mut().zip(uvs) {
                if corners.len() != face.verts.len() {
                    return Err("uv-lijst past niet bij het aantal hoeken van de face".to_string());
                }
                face.uvs = Some(corners);
            }
        }
        debug_log!("mesh geladen: {} vertices, {} faces", mesh.vertex_count(), mesh.face_count());
        self.mesh = Some(mesh);
        self.last_output = None;
        self.last_diagnostics = None;
        Ok(())
    }

    fn loaded_mesh(&mut self) -> Result<&mut PolyMesh, String> {
        self.mesh.as_mut().ok_or_else(|| "er is geen mesh geladen".to_string())
    }

    fn select_edge_pairs(&mut self, pairs: &[u32]) -> Result<(), String> {
        if pairs.len() % 2 != 0 {
            return Err("edge-selectie moet uit vertexparen bestaan".to_string());
        }
        let mesh = self.loaded_mesh()?;
        for edge in &mut mesh.edges {
            edge.selected = false;
        }
        for pair in pairs.chunks_exact(2) {
            let (a, b) = (pair[0] as usize, pair[1] as usize);
            let e = mesh.edge_between(a, b).ok_or_else(|| format!("geen edge tussen {a} en {b}"))?;
            mesh.edges[e].selected = true;
        }
        Ok(())
    }

    fn select_vertex_ids(&mut self, ids: &[u32]) -> Result<(), String> {
        let mesh = self.loaded_mesh()?;
        for vertex in &mut mesh.vertices {
            vertex.selected = false;
        }
        for &id in ids {
            let v = id as usize;
            mesh.validate_vertex(v).map_err(|e| e.to_string())?;
            mesh.vertices[v].selected = true;
        }
        Ok(())
    }

    fn run_bevel(&mut self) -> Result<(), String> {
        let options = self.options.clone();
        let mesh = self.loaded_mesh()?;
        let (output, diagnostics) = bevel_mesh(mesh, &options).map_err(|e| e.to_string())?;
        *mesh = mesh.compacted();
        debug_log!("bevel klaar: {}", diagnostics.summary());
        self.last_output = Some(output);
        self.last_diagnostics = Some(diagnostics);
        Ok(())
    }

    fn report(&self) -> Option<BevelReport<'_>> {
        let diagnostics = self.last_diagnostics.as_ref()?;
        let output = self.last_output.as_ref()?;
        Some(BevelReport {
            summary: diagnostics.summary(),
            clean: diagnostics.is_clean(),
            warnings: &diagnostics.warnings,
            new_faces: output.new_faces().len(),
            removed_vertices: output.removed_vertices.len(),
        })
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_input() -> MeshInput {
        let cube = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        MeshInput {
            vertices: cube.vertices.iter().map(|v| v.position.to_array()).collect(),
            faces: cube.faces.iter().map(|f| f.verts.clone()).collect(),
            uvs: None,
        }
    }

    #[test]
    fn bevel_without_mesh_is_an_error() {
        let mut engine = BevelEngine::new();
        assert!(engine.run_bevel().is_err());
        assert!(engine.report().is_none());
    }

    #[test]
    fn edge_selection_must_name_existing_edges() {
        let mut engine = BevelEngine::new();
        engine.load_input(cube_input()).expect("cube");
        assert!(engine.select_edge_pairs(&[0, 6]).is_err());
        assert!(engine.select_edge_pairs(&[0]).is_err());
        assert!(engine.select_edge_pairs(&[0, 1]).is_ok());
    }

    #[test]
    fn mismatched_uvs_are_rejected() {
        let mut engine = BevelEngine::new();
        let mut input = cube_input();
        input.uvs = Some(vec![vec![[0.0, 0.0]; 4]]);
        assert!(engine.load_input(input).is_err());
    }

    #[test]
    fn chamfered_cube_is_exported_compact() {
        let mut engine = BevelEngine::new();
        engine.load_input(cube_input()).expect("cube");
        engine.select_edge_pairs(&[0, 1]).expect("select");
        engine.options = BevelOptions::new(0.1, 2);
        engine.run_bevel().expect("bevel");

        let mesh = engine.mesh.as_ref().expect("mesh");
        let export = MeshExport::from_mesh(mesh);
        assert_eq!(export.vertices.len(), 12);
        assert_eq!(export.faces.len(), 8);
        assert!(export.faces.iter().flatten().all(|&v| v < export.vertices.len()));
        assert!(export.uvs.is_none());

        let report = engine.report().expect("report");
        assert_eq!(report.removed_vertices, 2);
        assert!(report.summary.contains("BE:1"));
    }
}
