#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use std::fmt;

use geom::{PushDiagnostics, PushOptions, SurfaceMesh, Tolerance, Transform, WeightMap, push_mesh};
use serde::Serialize;
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
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    log::set_logger(&DEFAULT_LOGGER).expect("error initializing logger");
    log::set_max_level(LevelFilter::Debug);
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

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

/// Host-attribute range for amplitude and displace radius. The kernel itself
/// accepts any finite value; the clamp lives at this boundary only.
const ATTRIBUTE_LIMIT: f64 = 10.0;

fn clamp_attribute(value: f64) -> f64 {
    value.clamp(-ATTRIBUTE_LIMIT, ATTRIBUTE_LIMIT)
}

#[derive(Debug, Serialize)]
struct DiagnosticsExport {
    vertex_count: usize,
    influenced_vertex_count: usize,
    degenerate_normal_count: usize,
    min_displacement: f64,
    max_displacement: f64,
    avg_displacement: f64,
    warnings: Vec<String>,
}

impl From<&PushDiagnostics> for DiagnosticsExport {
    fn from(diag: &PushDiagnostics) -> Self {
        Self {
            vertex_count: diag.vertex_count,
            influenced_vertex_count: diag.influenced_vertex_count,
            degenerate_normal_count: diag.degenerate_normal_count,
            min_displacement: diag.min_displacement,
            max_displacement: diag.max_displacement,
            avg_displacement: diag.avg_displacement,
            warnings: diag.warnings.clone(),
        }
    }
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    mesh: Option<SurfaceMesh>,
    weights: WeightMap,
    influence: Transform,
    world: Option<Transform>,
    last_diagnostics: Option<PushDiagnostics>,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            mesh: None,
            weights: WeightMap::default(),
            influence: Transform::identity(),
            world: None,
            last_diagnostics: None,
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Laad een mesh in de engine: posities als `[[x, y, z], ...]` en
    /// driehoeksindices als platte lijst.
    #[wasm_bindgen]
    pub fn load_mesh(&mut self, positions: JsValue, indices: JsValue) -> Result<(), JsValue> {
        let positions: Vec<[f64; 3]> = serde_wasm_bindgen::from_value(positions)
            .map_err(|_| js_error("posities konden niet worden gedecodeerd"))?;
        let indices: Vec<u32> = serde_wasm_bindgen::from_value(indices)
            .map_err(|_| js_error("indices konden niet worden gedecodeerd"))?;

        let mesh = SurfaceMesh::new(positions, indices);
        mesh.validate().map_err(to_js_error)?;

        debug_log!(
            "mesh geladen: {} vertices, {} driehoeken",
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        self.mesh = Some(mesh);
        self.weights = WeightMap::default();
        self.last_diagnostics = None;
        Ok(())
    }

    /// Stel expliciete per-vertex normalen in. Zonder deze stap berekent de
    /// engine zelf gladde normalen uit de driehoeken.
    #[wasm_bindgen]
    pub fn set_normals(&mut self, normals: JsValue) -> Result<(), JsValue> {
        let normals: Vec<[f64; 3]> = serde_wasm_bindgen::from_value(normals)
            .map_err(|_| js_error("normalen konden niet worden gedecodeerd"))?;

        let mesh = match self.mesh.as_mut() {
            Some(mesh) => mesh,
            None => return Err(js_error("er is geen mesh geladen")),
        };

        if normals.len() != mesh.vertex_count() {
            return Err(js_error(
                "normalen hebben niet dezelfde lengte als de posities",
            ));
        }

        mesh.normals = Some(normals);
        self.last_diagnostics = None;
        Ok(())
    }

    /// Stel per-vertex gewichten in (één waarde per vertex).
    #[wasm_bindgen]
    pub fn set_weights(&mut self, weights: JsValue) -> Result<(), JsValue> {
        let values: Vec<f64> = serde_wasm_bindgen::from_value(weights)
            .map_err(|_| js_error("gewichten konden niet worden gedecodeerd"))?;

        let map = WeightMap::per_vertex(values);
        if let Some(mesh) = self.mesh.as_ref() {
            map.validate(mesh.vertex_count()).map_err(to_js_error)?;
        }

        self.weights = map;
        self.last_diagnostics = None;
        Ok(())
    }

    /// Zet de gewichten terug naar volledige invloed (1.0) voor elke vertex.
    #[wasm_bindgen]
    pub fn clear_weights(&mut self) {
        self.weights = WeightMap::default();
        self.last_diagnostics = None;
    }

    /// Stel de invloedstransformatie in: 16 getallen, rij-hoofdvolgorde.
    /// Alleen de translatiekolom bereikt de kernel.
    #[wasm_bindgen]
    pub fn set_influence(&mut self, matrix: JsValue) -> Result<(), JsValue> {
        self.influence = decode_matrix(matrix)?;
        self.last_diagnostics = None;
        Ok(())
    }

    /// Stel een optionele wereldtransformatie in die vóór de deformatie op de
    /// posities wordt toegepast.
    #[wasm_bindgen]
    pub fn set_world_matrix(&mut self, matrix: JsValue) -> Result<(), JsValue> {
        self.world = Some(decode_matrix(matrix)?);
        self.last_diagnostics = None;
        Ok(())
    }

    /// Verwijder de wereldtransformatie weer.
    #[wasm_bindgen]
    pub fn clear_world_matrix(&mut self) {
        self.world = None;
        self.last_diagnostics = None;
    }

    /// Evalueer de push-deformatie en geef de nieuwe posities terug als
    /// `[[x, y, z], ...]`, in dezelfde volgorde als de invoer.
    ///
    /// Amplitude en verplaatsingsstraal worden hier op het bereik
    /// `[-10, 10]` geklemd; de envelope gaat ongewijzigd door.
    #[wasm_bindgen]
    pub fn evaluate(
        &mut self,
        amplitude: f64,
        displace_radius: f64,
        envelope: f64,
    ) -> Result<JsValue, JsValue> {
        let mesh = match self.mesh.as_ref() {
            Some(mesh) => mesh,
            None => return Err(js_error("er is geen mesh geladen")),
        };

        let working;
        let input = match self.world {
            Some(world) => {
                let mut transformed = mesh.clone();
                for p in &mut transformed.positions {
                    let moved = world.apply_point(geom::Point3::from_array(*p));
                    *p = moved.to_array();
                }
                working = transformed;
                &working
            }
            None => mesh,
        };

        let options = PushOptions::from_influence(
            self.influence,
            clamp_attribute(amplitude),
            clamp_attribute(displace_radius),
        )
        .envelope(envelope);

        let (pushed, diagnostics) = push_mesh(
            input,
            &self.weights,
            options,
            Tolerance::default_geom(),
        )
        .map_err(to_js_error)?;

        debug_log!(
            "push geëvalueerd: {} van {} vertices verplaatst",
            diagnostics.influenced_vertex_count,
            diagnostics.vertex_count
        );

        self.last_diagnostics = Some(diagnostics);

        serde_wasm_bindgen::to_value(&pushed.positions)
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Haal de diagnostiek van de laatste evaluatie op.
    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let diagnostics = match self.last_diagnostics.as_ref() {
            Some(diagnostics) => diagnostics,
            None => return Err(js_error("er is nog geen evaluatie uitgevoerd")),
        };

        serde_wasm_bindgen::to_value(&DiagnosticsExport::from(diagnostics))
            .map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_matrix(matrix: JsValue) -> Result<Transform, JsValue> {
    let values: Vec<f64> = serde_wasm_bindgen::from_value(matrix)
        .map_err(|_| js_error("matrix kon niet worden gedecodeerd"))?;

    let transform = Transform::from_flat(&values)
        .ok_or_else(|| js_error("matrix moet 16 getallen bevatten (rij-hoofdvolgorde)"))?;

    if !transform.is_finite() {
        return Err(js_error("matrixwaarden moeten eindig zijn"));
    }

    Ok(transform)
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
