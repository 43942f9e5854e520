#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(all(not(target_arch = "wasm32"), not(feature = "mesh_cli")))]
fn main() {
    eprintln!(
        "mesh_cli is a native-only tool and requires `--features mesh_cli`.\n\
         Example: cargo run -p bevel-engine --bin mesh_cli --features mesh_cli -- list"
    );
    std::process::exit(1);
}

#[cfg(all(not(target_arch = "wasm32"), feature = "mesh_cli"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("mesh_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(all(not(target_arch = "wasm32"), feature = "mesh_cli"))]
mod native {
    use bevel_engine::geom::{
        AffectType, BevelDiagnostics, BevelOptions, BevelOutput, OuterMiter, InnerMiter, PolyMesh, VMeshMethod,
        Vec3, bevel_mesh,
    };
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"mesh_cli (bevel-engine)

USAGE:
  mesh_cli list
  mesh_cli run <scenario|all> [options]

SCENARIOS:
  cube_edge_chamfer
  cube_edge_round
  cube_corner_round
  cube_corner_cutoff
  cube_all_edges
  cube_vertex_round
  notched_block_miter

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

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
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

        report(&output);
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

        report(&output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} faces={} | {}",
            output.name,
            output.mesh.vertex_count(),
            output.mesh.face_count(),
            output.diag.summary()
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
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    /// OBJ with one polygon per face; `mesh` must already be compacted.
    fn write_obj_file(path: &Path, mesh: &PolyMesh, name: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# bevel-engine mesh_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for v in &mesh.vertices {
            let p = v.position;
            writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(|e| format!("write obj: {e}"))?;
        }
        for face in &mesh.faces {
            let corners: Vec<String> = face.verts.iter().map(|v| (v + 1).to_string()).collect();
            writeln!(w, "f {}", corners.join(" ")).map_err(|e| format!("write obj: {e}"))?;
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

    fn write_vec3_line(out: &mut String, prefix: &str, v: Vec3) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v.x);
        out.push(' ');
        write_f64(out, v.y);
        out.push(' ');
        write_f64(out, v.z);
        out.push('\n');
    }

    fn write_bevel_diagnostics(out: &mut String, diag: &BevelDiagnostics) {
        let _ = writeln!(out, "diag.analyzed_vertex_count {}", diag.analyzed_vertex_count);
        let _ = writeln!(out, "diag.beveled_vertex_count {}", diag.beveled_vertex_count);
        let _ = writeln!(out, "diag.skipped_vertex_count {}", diag.skipped_vertex_count);
        let _ = writeln!(out, "diag.beveled_edge_count {}", diag.beveled_edge_count);
        let _ = writeln!(out, "diag.skipped_corridor_count {}", diag.skipped_corridor_count);
        let _ = writeln!(out, "diag.miter_count {}", diag.miter_count);
        let _ = writeln!(out, "diag.adjusted_chain_count {}", diag.adjusted_chain_count);
        let _ = writeln!(out, "diag.adjusted_cycle_count {}", diag.adjusted_cycle_count);
        match diag.offset_limit_factor {
            Some(factor) => {
                let _ = write!(out, "diag.offset_limit_factor ");
                write_f64(out, factor);
                out.push('\n');
            }
            None => {
                let _ = writeln!(out, "diag.offset_limit_factor none");
            }
        }
        let _ = writeln!(
            out,
            "diag.patches none={} poly={} fan={} rings={} pipe={} cutoff={}",
            diag.empty_patch_count,
            diag.poly_patch_count,
            diag.fan_patch_count,
            diag.ring_patch_count,
            diag.pipe_patch_count,
            diag.cutoff_patch_count
        );
        let _ = writeln!(out, "diag.rebuilt_face_count {}", diag.rebuilt_face_count);
        let _ = writeln!(out, "diag.warnings {}", diag.warnings.len());
        for w in &diag.warnings {
            let _ = writeln!(out, "warning {w}");
        }
    }

    fn write_output(out: &mut String, output: &BevelOutput) {
        let _ = writeln!(out, "out.patch_faces {}", output.patch_faces.len());
        let _ = writeln!(out, "out.corridor_faces {}", output.corridor_faces.len());
        let _ = writeln!(out, "out.rebuilt_faces {}", output.rebuilt_faces.len());
        let _ = writeln!(out, "out.removed_vertices {}", output.removed_vertices.len());
    }

    fn write_mesh(out: &mut String, mesh: &PolyMesh) {
        let _ = writeln!(out, "mesh.vertex_count {}", mesh.vertex_count());
        let _ = writeln!(out, "mesh.edge_count {}", mesh.edge_count());
        let _ = writeln!(out, "mesh.face_count {}", mesh.face_count());
        let _ = writeln!(out, "mesh.closed {}", mesh.is_closed());

        let _ = writeln!(out, "mesh.positions {}", mesh.vertices.len());
        for v in &mesh.vertices {
            write_vec3_line(out, "p", v.position);
        }

        let _ = writeln!(out, "mesh.faces {}", mesh.faces.len());
        for face in &mesh.faces {
            let corners: Vec<String> = face.verts.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "f {}", corners.join(" "));
        }
    }

    fn snapshot(op: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# bevel-engine golden v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        CubeEdgeChamfer,
        CubeEdgeRound,
        CubeCornerRound,
        CubeCornerCutoff,
        CubeAllEdges,
        CubeVertexRound,
        NotchedBlockMiter,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::CubeEdgeChamfer,
            Scenario::CubeEdgeRound,
            Scenario::CubeCornerRound,
            Scenario::CubeCornerCutoff,
            Scenario::CubeAllEdges,
            Scenario::CubeVertexRound,
            Scenario::NotchedBlockMiter,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::CubeEdgeChamfer => "cube_edge_chamfer",
                Scenario::CubeEdgeRound => "cube_edge_round",
                Scenario::CubeCornerRound => "cube_corner_round",
                Scenario::CubeCornerCutoff => "cube_corner_cutoff",
                Scenario::CubeAllEdges => "cube_all_edges",
                Scenario::CubeVertexRound => "cube_vertex_round",
                Scenario::NotchedBlockMiter => "notched_block_miter",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|s| s.name() == name)
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: PolyMesh,
        diag: BevelDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        let name = scenario.name();
        let (mut mesh, options) = match scenario {
            Scenario::CubeEdgeChamfer => (cube_with_edges(&[(0, 1)]), BevelOptions::new(0.1, 1)),
            Scenario::CubeEdgeRound => (cube_with_edges(&[(0, 1)]), BevelOptions::new(0.2, 4)),
            Scenario::CubeCornerRound => (cube_with_edges(&[(0, 1), (0, 3), (0, 4)]), BevelOptions::new(0.2, 3)),
            Scenario::CubeCornerCutoff => (
                cube_with_edges(&[(0, 1), (0, 3), (0, 4)]),
                BevelOptions::new(0.2, 3).with_vmesh_method(VMeshMethod::Cutoff),
            ),
            Scenario::CubeAllEdges => {
                let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
                for edge in &mut mesh.edges {
                    edge.selected = true;
                }
                (mesh, BevelOptions::new(0.1, 2))
            }
            Scenario::CubeVertexRound => {
                let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
                mesh.vertices[6].selected = true;
                (mesh, BevelOptions::new(0.25, 2).with_affect(AffectType::Vertices))
            }
            Scenario::NotchedBlockMiter => (
                notched_block(),
                BevelOptions::new(0.1, 2).with_miters(OuterMiter::Arc, InnerMiter::Arc).with_spread(0.05),
            ),
        };

        let (output, diag) = bevel_mesh(&mut mesh, &options).map_err(|e| e.to_string())?;
        let mesh = mesh.compacted();

        let snap = snapshot(name, |out| {
            write_bevel_diagnostics(out, &diag);
            write_output(out, &output);
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput { name, mesh, diag, snapshot: snap })
    }

    fn cube_with_edges(edges: &[(usize, usize)]) -> PolyMesh {
        let mut mesh = PolyMesh::box_from_bounds([0.0; 3], [1.0; 3]);
        for &(a, b) in edges {
            if let Some(e) = mesh.edge_between(a, b) {
                mesh.edges[e].selected = true;
            }
        }
        mesh
    }

    /// An L-shaped block; the inner vertical edge and the two top edges meeting it are
    /// selected, giving one reflex corner.
    fn notched_block() -> PolyMesh {
        let footprint = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0]];
        let n = footprint.len();
        let mut positions = Vec::with_capacity(2 * n);
        for z in [0.0, 1.0] {
            for p in footprint {
                positions.push([p[0], p[1], z]);
            }
        }
        let mut faces: Vec<Vec<usize>> = vec![(0..n).rev().collect(), (n..2 * n).collect()];
        for i in 0..n {
            let j = (i + 1) % n;
            faces.push(vec![i, j, j + n, i + n]);
        }
        let Ok(mut mesh) = PolyMesh::from_vertices_faces(&positions, &faces) else {
            return PolyMesh::new();
        };
        for (a, b) in [(3, 9), (8, 9), (9, 10)] {
            if let Some(e) = mesh.edge_between(a, b) {
                mesh.edges[e].selected = true;
            }
        }
        mesh
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
