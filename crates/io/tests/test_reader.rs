//! Integration tests: reading vector history files built on the fly.

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use mecgrid_io::{
    DEFAULT_TOPOGRAPHY_VAR, IoError, ReaderConfig, read_topography_history, read_vector_variable,
};
use mecgrid_regrid::{RegridError, ScatterConfig, SeriesData, VariableKind};
use tempfile::tempdir;

// ---------------------------------------------------------------------------
// Helper: programmatic vector-file fixture builder
// ---------------------------------------------------------------------------

const LATS: [f64; 2] = [60.0, 70.0];
const LONS: [f64; 3] = [300.0, 310.0, 320.0];

/// Column records: (ixy, jxy, itype_col, itype_lunit), all 1-based.
///
/// Records 0 and 1 are classes 1 and 2 at (lat 0, lon 0), record 2 is a
/// vegetated column, record 3 is class 10 at (lat 1, lon 2) and record 4 the
/// tundra column next to it.
const COLUMNS: [(i32, i32, i32, i32); 5] = [
    (1, 1, 401, 4),
    (1, 1, 402, 4),
    (2, 1, 1, 1),
    (3, 2, 410, 4),
    (3, 2, 400, 4),
];

/// Builds a minimal CLM vector history file.
struct VectorFixture {
    nt: usize,
    with_grid: bool,
    with_index: bool,
    with_time: bool,
}

impl VectorFixture {
    fn new(nt: usize) -> Self {
        Self {
            nt,
            with_grid: true,
            with_index: true,
            with_time: true,
        }
    }

    /// Drop `lat`/`lon` and the `cols1d_*` variables, as after processing
    /// with tools that strip them.
    fn stripped(mut self) -> Self {
        self.with_grid = false;
        self.with_index = false;
        self
    }

    fn without_time(mut self) -> Self {
        self.with_time = false;
        self
    }

    /// `QICE` value of record `r` at step `t`.
    fn value(t: usize, r: usize) -> f64 {
        10.0 * t as f64 + r as f64
    }

    fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let ncol = COLUMNS.len();
        let mut file = netcdf::create(&path).expect("create fixture");

        file.add_dimension("time", self.nt).expect("dim time");
        file.add_dimension("lat", LATS.len()).expect("dim lat");
        file.add_dimension("lon", LONS.len()).expect("dim lon");
        file.add_dimension("column", ncol).expect("dim column");
        file.add_dimension("levsno", 3).expect("dim levsno");

        if self.with_time {
            let values: Vec<f64> = (0..self.nt).map(|t| 31.0 * t as f64).collect();
            let mut var = file.add_variable::<f64>("time", &["time"]).expect("var time");
            var.put_attribute("units", "days since 2000-01-01 00:00:00")
                .expect("time units");
            var.put_values(&values, ..).expect("time values");
        }

        if self.with_grid {
            let mut lat = file.add_variable::<f64>("lat", &["lat"]).expect("var lat");
            lat.put_values(&LATS, ..).expect("lat values");
            let mut lon = file.add_variable::<f64>("lon", &["lon"]).expect("var lon");
            lon.put_values(&LONS, ..).expect("lon values");
        }

        if self.with_index {
            let columns: [(&str, fn(&(i32, i32, i32, i32)) -> i32); 4] = [
                ("cols1d_ixy", |c| c.0),
                ("cols1d_jxy", |c| c.1),
                ("cols1d_itype_col", |c| c.2),
                ("cols1d_itype_lunit", |c| c.3),
            ];
            for (name, field) in columns {
                let values: Vec<i32> = COLUMNS.iter().map(field).collect();
                let mut var = file.add_variable::<i32>(name, &["column"]).expect("index var");
                var.put_values(&values, ..).expect("index values");
            }
        }

        // Column variable.
        {
            let time_dims: &[&str] = if self.with_time {
                &["time", "column"]
            } else {
                &["column"]
            };
            let nt = if self.with_time { self.nt } else { 1 };
            let values: Vec<f64> = (0..nt)
                .flat_map(|t| (0..ncol).map(move |r| Self::value(t, r)))
                .collect();
            let mut var = file.add_variable::<f64>("QICE", time_dims).expect("var QICE");
            var.put_attribute("long_name", "ice growth/melt").expect("long_name");
            var.put_attribute("units", "mm/s").expect("units");
            var.put_values(&values, ..).expect("QICE values");
        }

        if self.with_time {
            // Layered column variable: layer l holds 100 * l + record.
            let values: Vec<f64> = (0..self.nt)
                .flat_map(|_| (0..3).flat_map(move |l| (0..ncol).map(move |r| (100 * l + r) as f64)))
                .collect();
            let mut var = file
                .add_variable::<f64>("SNO_T", &["time", "levsno", "column"])
                .expect("var SNO_T");
            var.put_values(&values, ..).expect("SNO_T values");

            // Structured variable.
            let n = self.nt * LATS.len() * LONS.len();
            let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let mut var = file
                .add_variable::<f64>("TSA", &["time", "lat", "lon"])
                .expect("var TSA");
            var.put_attribute("units", "K").expect("units");
            var.put_values(&values, ..).expect("TSA values");

            // Class heights.
            let heights: Vec<f64> = (0..self.nt)
                .flat_map(|_| [500.0, 900.0, 0.0, 2600.0, 80.0])
                .collect();
            let mut var = file
                .add_variable::<f64>(DEFAULT_TOPOGRAPHY_VAR, &["time", "column"])
                .expect("var TOPO_COL");
            var.put_values(&heights, ..).expect("TOPO_COL values");

            // Unsupported layout.
            let mut var = file
                .add_variable::<f64>("LEVELS", &["time", "levsno"])
                .expect("var LEVELS");
            var.put_values(&vec![0.0; self.nt * 3], ..).expect("LEVELS values");
        }

        path
    }
}

// ---------------------------------------------------------------------------
// Column variables
// ---------------------------------------------------------------------------

#[test]
fn column_variable_round_trip() {
    let dir = tempdir().unwrap();
    let path = VectorFixture::new(2).write(dir.path(), "h2.nc");

    let var = read_vector_variable(&path, "QICE", &ReaderConfig::default()).unwrap();
    assert_eq!(var.kind(), VariableKind::Column);
    assert_eq!(var.meta().long_name, "ice growth/melt");
    assert_eq!(var.meta().units, "mm/s");
    assert_eq!(var.time().values, vec![0.0, 31.0]);
    assert_eq!(var.time().units, "days since 2000-01-01 00:00:00");
    assert_eq!(var.grid().shape(), (2, 3));
    assert_eq!(var.index().map(|i| i.len()), Some(COLUMNS.len()));

    let field = var.gridded_3d(&ScatterConfig::default()).unwrap();
    assert_eq!(field.dim(), (2, 2, 3, 10));
    assert_relative_eq!(field.get(1, 0, 0, 0).unwrap(), VectorFixture::value(1, 0));
    assert_relative_eq!(field.get(1, 0, 0, 1).unwrap(), VectorFixture::value(1, 1));
    assert_relative_eq!(field.get(0, 1, 2, 9).unwrap(), VectorFixture::value(0, 3));
    // Vegetated and tundra columns are not placed.
    assert_eq!(field.get(0, 0, 1, 0), None);
    assert_eq!(field.count_valid(), 2 * 3);
}

#[test]
fn layered_variable_keeps_top_layer() {
    let dir = tempdir().unwrap();
    let path = VectorFixture::new(2).write(dir.path(), "h2.nc");

    let var = read_vector_variable(&path, "SNO_T", &ReaderConfig::default()).unwrap();
    match var.data() {
        SeriesData::Vector(a) => {
            assert_eq!(a.dim(), (2, COLUMNS.len()));
            assert_eq!(a[[1, 3]], 3.0);
        }
        other => panic!("expected vector data, got {other:?}"),
    }
    // Units default to a placeholder.
    assert_eq!(var.meta().units, "-");
    assert_eq!(var.meta().long_name, "");
}

#[test]
fn layered_variable_without_rule_is_rejected() {
    let dir = tempdir().unwrap();
    let path = VectorFixture::new(1).write(dir.path(), "h2.nc");

    let config = ReaderConfig::default().with_layered_prefixes(vec![]);
    let err = read_vector_variable(&path, "SNO_T", &config).unwrap_err();
    assert!(
        matches!(err, IoError::Regrid(RegridError::UnsupportedVariableKind { .. })),
        "got {err:?}"
    );
}

#[test]
fn variable_without_time_is_single_step() {
    let dir = tempdir().unwrap();
    let path = VectorFixture::new(1).without_time().write(dir.path(), "h2.nc");

    let var = read_vector_variable(&path, "QICE", &ReaderConfig::default()).unwrap();
    assert_eq!(var.time().values, vec![0.0]);
    assert_eq!(var.data().ntime(), 1);
}

// ---------------------------------------------------------------------------
// Structured and unsupported variables
// ---------------------------------------------------------------------------

#[test]
fn structured_variable_has_no_index() {
    let dir = tempdir().unwrap();
    let path = VectorFixture::new(2).write(dir.path(), "h2.nc");

    let var = read_vector_variable(&path, "TSA", &ReaderConfig::default()).unwrap();
    assert_eq!(var.kind(), VariableKind::Structured);
    assert!(var.index().is_none());

    let field = var.gridded_3d(&ScatterConfig::default()).unwrap();
    // Replicated across every class slot.
    assert_relative_eq!(field.get(1, 1, 2, 0).unwrap(), 11.0);
    assert_relative_eq!(field.get(1, 1, 2, 9).unwrap(), 11.0);
}

#[test]
fn unknown_last_dimension_rejected() {
    let dir = tempdir().unwrap();
    let path = VectorFixture::new(1).write(dir.path(), "h2.nc");

    let err = read_vector_variable(&path, "LEVELS", &ReaderConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        IoError::Regrid(RegridError::UnsupportedVariableKind { .. })
    ));
}

// ---------------------------------------------------------------------------
// Grid metadata fallback
// ---------------------------------------------------------------------------

#[test]
fn grid_info_file_supplies_index() {
    let dir = tempdir().unwrap();
    let stripped = VectorFixture::new(2).stripped().write(dir.path(), "processed.nc");
    let info = VectorFixture::new(1).write(dir.path(), "grid_info.nc");

    let config = ReaderConfig::default().with_grid_info(&info);
    let var = read_vector_variable(&stripped, "QICE", &config).unwrap();
    assert_eq!(var.grid().lats(), &LATS);
    assert_eq!(var.index().map(|i| i.n_mec_records()), Some(3));
}

#[test]
fn missing_index_lists_searched_files() {
    let dir = tempdir().unwrap();
    let stripped = VectorFixture::new(1).stripped().write(dir.path(), "a.nc");
    let other = VectorFixture::new(1).stripped().write(dir.path(), "b.nc");
    // Axes are present in neither file.
    let err = read_vector_variable(&stripped, "QICE", &ReaderConfig::default().with_grid_info(&other))
        .unwrap_err();
    assert!(matches!(err, IoError::MissingVariable { .. }), "got {err:?}");

    let with_axes = VectorFixture {
        with_index: false,
        ..VectorFixture::new(1)
    }
    .write(dir.path(), "c.nc");
    let err = read_vector_variable(&with_axes, "QICE", &ReaderConfig::default().with_grid_info(&other))
        .unwrap_err();
    match err {
        IoError::MissingGridMetadata {
            variable,
            missing,
            searched,
        } => {
            assert_eq!(variable, "QICE");
            assert!(missing.contains("cols1d_ixy"));
            assert_eq!(searched, vec![with_axes, other]);
        }
        other => panic!("expected MissingGridMetadata, got {other:?}"),
    }
}

#[test]
fn file_not_found() {
    let err = read_vector_variable(
        Path::new("/tmp/mecgrid_test_nonexistent.nc"),
        "QICE",
        &ReaderConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }), "got {err:?}");
}

#[test]
fn invalid_config_rejects_early() {
    let config = ReaderConfig::default().with_time_var("");
    let err = read_vector_variable(Path::new("/tmp/mecgrid_test_nonexistent.nc"), "QICE", &config)
        .unwrap_err();
    assert!(matches!(err, IoError::Validation { .. }), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Topography from a history file
// ---------------------------------------------------------------------------

#[test]
fn topography_from_history_variable() {
    let dir = tempdir().unwrap();
    let path = VectorFixture::new(2).write(dir.path(), "h2.nc");

    let topo = read_topography_history(
        &path,
        DEFAULT_TOPOGRAPHY_VAR,
        &ReaderConfig::default(),
        &ScatterConfig::default(),
        1,
    )
    .unwrap();
    assert_eq!(topo.grid_shape(), (2, 3));
    assert_eq!(topo.nodes(0, 0), vec![(0, 500.0), (1, 900.0)]);
    assert_eq!(topo.nodes(1, 2), vec![(9, 2600.0)]);
    assert!(topo.nodes(0, 1).is_empty());
    // The class-0 column at (1, 2) sits at 80 m.
    assert!(topo.has_tundra(1, 2));
    assert!(!topo.has_tundra(0, 0));
}
