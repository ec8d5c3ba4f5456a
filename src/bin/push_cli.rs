#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("push_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use push_engine::geom::{
        AngleBlend, Point3, PushDiagnostics, PushOptions, SurfaceMesh, Tolerance, Transform,
        Vec3, WeightMap, push_mesh, push_mesh_from,
    };
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"push_cli (push-engine)

USAGE:
  push_cli list
  push_cli run <scenario|all> [options]

SCENARIOS:
  push_plane_center
  push_plane_weighted
  push_plane_cosine
  pull_plane_negative
  push_sphere_radial

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write golden-style snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario = Scenario::from_str(scenario_name.as_str())
            .ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    fn print_summary(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} triangles={} influenced={} max_disp={:.4}",
            output.name,
            output.mesh.vertex_count(),
            output.mesh.triangle_count(),
            output.diag.influenced_vertex_count,
            output.diag.max_displacement
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        msg.push_str(&format!("unknown scenario `{name}`\n\navailable scenarios:\n"));
        for scenario in Scenario::ALL {
            msg.push_str(&format!("  {}\n", scenario.name()));
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text))
            .map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(
        path: &Path,
        mesh: &SurfaceMesh,
        name: &str,
        overwrite: bool,
    ) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# push-engine push_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        if let Some(normals) = mesh.normals.as_ref() {
            for n in normals.iter().copied() {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2])
                    .map_err(|e| format!("write obj: {e}"))?;
            }
        }

        let has_normals = mesh.normals.is_some();
        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + 1;
            let b = tri[1] + 1;
            let c = tri[2] + 1;

            if has_normals {
                writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")
            } else {
                writeln!(w, "f {a} {b} {c}")
            }
            .map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let value = if value == -0.0 { 0.0 } else { value };
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == -0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_push_diagnostics(out: &mut String, diag: &PushDiagnostics) {
        let _ = writeln!(out, "push_diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(
            out,
            "push_diag.influenced_vertex_count {}",
            diag.influenced_vertex_count
        );
        let _ = writeln!(
            out,
            "push_diag.degenerate_normal_count {}",
            diag.degenerate_normal_count
        );
        let _ = write!(out, "push_diag.min_displacement ");
        write_f64(out, diag.min_displacement);
        out.push('\n');
        let _ = write!(out, "push_diag.max_displacement ");
        write_f64(out, diag.max_displacement);
        out.push('\n');
        let _ = write!(out, "push_diag.avg_displacement ");
        write_f64(out, diag.avg_displacement);
        out.push('\n');
        let _ = writeln!(out, "push_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "push_diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, mesh: &SurfaceMesh) {
        mesh.validate().expect("mesh should be internally consistent");

        let _ = writeln!(out, "mesh.vertex_count {}", mesh.positions.len());
        let _ = writeln!(out, "mesh.triangle_count {}", mesh.indices.len() / 3);
        let _ = writeln!(out, "mesh.has_normals {}", mesh.normals.is_some());

        let _ = writeln!(out, "mesh.positions {}", mesh.positions.len());
        for p in mesh.positions.iter().copied() {
            write_vec3_line(out, "p", p);
        }

        let _ = writeln!(out, "mesh.indices {}", mesh.indices.len());
        for tri in mesh.indices.chunks_exact(3) {
            let _ = writeln!(out, "i {} {} {}", tri[0], tri[1], tri[2]);
        }

        if let Some(normals) = mesh.normals.as_ref() {
            let _ = writeln!(out, "mesh.normals {}", normals.len());
            for n in normals.iter().copied() {
                write_vec3_line(out, "n", n);
            }
        } else {
            let _ = writeln!(out, "mesh.normals none");
        }
    }

    fn snapshot(op: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# push-engine golden v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        PushPlaneCenter,
        PushPlaneWeighted,
        PushPlaneCosine,
        PullPlaneNegative,
        PushSphereRadial,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::PushPlaneCenter,
            Scenario::PushPlaneWeighted,
            Scenario::PushPlaneCosine,
            Scenario::PullPlaneNegative,
            Scenario::PushSphereRadial,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::PushPlaneCenter => "push_plane_center",
                Scenario::PushPlaneWeighted => "push_plane_weighted",
                Scenario::PushPlaneCosine => "push_plane_cosine",
                Scenario::PullPlaneNegative => "pull_plane_negative",
                Scenario::PushSphereRadial => "push_sphere_radial",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            match name {
                "push_plane_center" => Some(Scenario::PushPlaneCenter),
                "push_plane_weighted" => Some(Scenario::PushPlaneWeighted),
                "push_plane_cosine" => Some(Scenario::PushPlaneCosine),
                "pull_plane_negative" => Some(Scenario::PullPlaneNegative),
                "push_sphere_radial" => Some(Scenario::PushSphereRadial),
                _ => None,
            }
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: SurfaceMesh,
        diag: PushDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        match scenario {
            Scenario::PushPlaneCenter => scenario_push_plane_center(),
            Scenario::PushPlaneWeighted => scenario_push_plane_weighted(),
            Scenario::PushPlaneCosine => scenario_push_plane_cosine(),
            Scenario::PullPlaneNegative => scenario_pull_plane_negative(),
            Scenario::PushSphereRadial => scenario_push_sphere_radial(),
        }
    }

    fn scenario_push_plane_center() -> Result<ScenarioOutput, String> {
        let mesh = make_grid_plane(8, 8, 4.0);
        let influence = Transform::translate(Vec3::new(0.0, 0.0, -1.0));

        let (pushed, diag) = push_mesh_from(
            &mesh,
            &WeightMap::default(),
            influence,
            0.25,
            4.0,
            Tolerance::default_geom(),
        )
        .map_err(|e| e.to_string())?;

        let snap = snapshot("push_plane_center", |out| {
            write_push_diagnostics(out, &diag);
            write_mesh(out, &pushed);
        });

        Ok(ScenarioOutput {
            name: "push_plane_center",
            mesh: pushed,
            diag,
            snapshot: snap,
        })
    }

    fn scenario_push_plane_weighted() -> Result<ScenarioOutput, String> {
        let mesh = make_grid_plane(8, 8, 4.0);
        // Weight ramp from 0 on the -X edge to 1 on the +X edge.
        let weights: Vec<f64> = mesh
            .positions
            .iter()
            .map(|p| ((p[0] + 2.0) / 4.0).clamp(0.0, 1.0))
            .collect();

        let options = PushOptions::new(Point3::new(0.0, 0.0, -1.0), 0.25, 4.0);
        let (pushed, diag) = push_mesh(
            &mesh,
            &WeightMap::per_vertex(weights),
            options,
            Tolerance::default_geom(),
        )
        .map_err(|e| e.to_string())?;

        let snap = snapshot("push_plane_weighted", |out| {
            write_push_diagnostics(out, &diag);
            write_mesh(out, &pushed);
        });

        Ok(ScenarioOutput {
            name: "push_plane_weighted",
            mesh: pushed,
            diag,
            snapshot: snap,
        })
    }

    fn scenario_push_plane_cosine() -> Result<ScenarioOutput, String> {
        let mesh = make_grid_plane(8, 8, 4.0);
        let options = PushOptions::new(Point3::new(0.0, 0.0, -1.0), 0.25, 4.0)
            .blend(AngleBlend::Cosine);

        let (pushed, diag) = push_mesh(
            &mesh,
            &WeightMap::default(),
            options,
            Tolerance::default_geom(),
        )
        .map_err(|e| e.to_string())?;

        let snap = snapshot("push_plane_cosine", |out| {
            write_push_diagnostics(out, &diag);
            write_mesh(out, &pushed);
        });

        Ok(ScenarioOutput {
            name: "push_plane_cosine",
            mesh: pushed,
            diag,
            snapshot: snap,
        })
    }

    fn scenario_pull_plane_negative() -> Result<ScenarioOutput, String> {
        let mesh = make_grid_plane(8, 8, 4.0);
        let options = PushOptions::new(Point3::new(0.0, 0.0, -1.0), -0.25, 4.0);

        let (pushed, diag) = push_mesh(
            &mesh,
            &WeightMap::default(),
            options,
            Tolerance::default_geom(),
        )
        .map_err(|e| e.to_string())?;

        let snap = snapshot("pull_plane_negative", |out| {
            write_push_diagnostics(out, &diag);
            write_mesh(out, &pushed);
        });

        Ok(ScenarioOutput {
            name: "pull_plane_negative",
            mesh: pushed,
            diag,
            snapshot: snap,
        })
    }

    fn scenario_push_sphere_radial() -> Result<ScenarioOutput, String> {
        let mesh = make_uv_sphere(12, 16, 1.0);
        let options = PushOptions::new(Point3::ORIGIN, 0.5, 2.0);

        let (pushed, diag) = push_mesh(
            &mesh,
            &WeightMap::default(),
            options,
            Tolerance::default_geom(),
        )
        .map_err(|e| e.to_string())?;

        let snap = snapshot("push_sphere_radial", |out| {
            write_push_diagnostics(out, &diag);
            write_mesh(out, &pushed);
        });

        Ok(ScenarioOutput {
            name: "push_sphere_radial",
            mesh: pushed,
            diag,
            snapshot: snap,
        })
    }

    /// Square grid plane in the XY plane centered at the origin.
    fn make_grid_plane(nx: usize, ny: usize, extent: f64) -> SurfaceMesh {
        let mut positions = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                let x = (i as f64 / nx as f64 - 0.5) * extent;
                let y = (j as f64 / ny as f64 - 0.5) * extent;
                positions.push([x, y, 0.0]);
            }
        }

        let mut indices = Vec::with_capacity(nx * ny * 6);
        let stride = (nx + 1) as u32;
        for j in 0..ny as u32 {
            for i in 0..nx as u32 {
                let a = j * stride + i;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;
                indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }

        SurfaceMesh::new(positions, indices)
    }

    /// UV sphere centered at the origin.
    fn make_uv_sphere(stacks: usize, slices: usize, radius: f64) -> SurfaceMesh {
        let mut positions = Vec::new();
        for j in 0..=stacks {
            let phi = std::f64::consts::PI * j as f64 / stacks as f64;
            for i in 0..slices {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / slices as f64;
                positions.push([
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                ]);
            }
        }

        let stride = slices as u32;
        let mut indices = Vec::new();
        for j in 0..stacks as u32 {
            for i in 0..slices as u32 {
                let next_i = (i + 1) % stride;
                let a = j * stride + i;
                let b = j * stride + next_i;
                let c = (j + 1) * stride + i;
                let d = (j + 1) * stride + next_i;
                // Skip degenerate pole caps where a ring collapses.
                if j > 0 {
                    indices.extend_from_slice(&[a, b, c]);
                }
                if j + 1 < stacks as u32 {
                    indices.extend_from_slice(&[b, d, c]);
                }
            }
        }

        SurfaceMesh::new(positions, indices)
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
