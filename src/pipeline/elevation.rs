use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use image::{Rgb, RgbImage};
use itertools::Itertools;
use tracing::warn;

use crate::pipeline::raycast::CastingResult;
use crate::pipeline::{IoKind, Task, TaskIo};

/// Reserved sentinel for cells with no recorded elevation.
pub const NO_VALUE: f64 = -9999.0;

/// Dense elevation grid with running max/min tracked as cells are written.
pub struct ElevationMap {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    max_elevation: f64,
    min_elevation: f64,
}

impl ElevationMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![NO_VALUE; width * height],
            max_elevation: NO_VALUE,
            min_elevation: NO_VALUE,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.cells[row * self.width + col] = value;
        if self.max_elevation == NO_VALUE || value > self.max_elevation {
            self.max_elevation = value;
        }
        if self.min_elevation == NO_VALUE || value < self.min_elevation {
            self.min_elevation = value;
        }
    }
}

/// Stage 3A: copies hit altitudes out of the casting grid one row per call.
pub struct ElevationMapGenerator {
    input: Option<CastingResult>,
    map: Option<ElevationMap>,
    rows_mapped: usize,
}

impl ElevationMapGenerator {
    pub fn new() -> Self {
        Self { input: None, map: None, rows_mapped: 0 }
    }
}

impl Default for ElevationMapGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for ElevationMapGenerator {
    fn description(&self) -> String {
        "Creating elevation map based on the casting results...".to_string()
    }

    fn input_kind(&self) -> IoKind {
        IoKind::Casting
    }

    fn output_kind(&self) -> IoKind {
        IoKind::Elevation
    }

    fn take_input(&mut self, input: TaskIo) {
        let TaskIo::Casting(casting) = input else {
            panic!("elevation generator fed a non-casting input");
        };
        self.map = Some(ElevationMap::new(casting.width(), casting.height()));
        self.input = Some(casting);
        self.rows_mapped = 0;
    }

    fn continue_processing(&mut self) -> f64 {
        let casting = self.input.as_ref().expect("generator polled before input");
        let map = self.map.as_mut().expect("generator polled before input");
        if map.height() == 0 {
            return 1.0;
        }

        let row = self.rows_mapped;
        for col in 0..map.width() {
            if let Some(result) = casting.get(row, col) {
                map.set(row, col, result.hit_point.y);
            }
        }
        self.rows_mapped += 1;
        self.rows_mapped as f64 / map.height() as f64
    }

    fn take_result(&mut self) -> TaskIo {
        TaskIo::Elevation(self.map.take().expect("elevation map already taken"))
    }
}

/// Terminal stage: renders the greyscale raster and the XML dump.
/// No-data cells come out pure black; everything else is normalized against
/// the map's own running maximum.
pub struct ElevationMapExporter {
    gsd: f64,
    export_array: bool,
    folder_path: PathBuf,
    map: Option<ElevationMap>,
    step: usize,
    error: Option<String>,
}

const IMAGE_NAME: &str = "elevation_map.jpg";
const XML_NAME: &str = "elevation_map.xml";

impl ElevationMapExporter {
    pub fn new(gsd: f64, export_array: bool, folder_path: PathBuf) -> Self {
        Self { gsd, export_array, folder_path, map: None, step: 0, error: None }
    }

    /// Errors raised while writing output files, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn export_greyscale_image(&self) -> Result<()> {
        let map = self.map.as_ref().expect("exporter polled before input");
        let width = map.width().max(1) as u32;
        let height = map.height().max(1) as u32;
        let mut image = RgbImage::new(width, height);
        for row in 0..map.height() {
            for col in 0..map.width() {
                let elevation = map.get(row, col);
                let color = if elevation == NO_VALUE {
                    Rgb([0, 0, 0])
                } else {
                    let adjusted = (elevation / map.max_elevation()).clamp(0.0, 1.0);
                    let level = (adjusted * 255.0).round() as u8;
                    Rgb([level, level, level])
                };
                // Grid row 0 is the bottom row of the exported image.
                image.put_pixel(col as u32, (map.height() - 1 - row) as u32, color);
            }
        }
        image.save(self.folder_path.join(IMAGE_NAME))?;
        Ok(())
    }

    fn export_xml(&self) -> Result<()> {
        let map = self.map.as_ref().expect("exporter polled before input");
        let file = File::create(self.folder_path.join(XML_NAME))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        writeln!(writer, "<ElevationMap>")?;
        writeln!(writer, "  <Properties>")?;
        writeln!(writer, "    <GSD>{}</GSD>", self.gsd)?;
        writeln!(writer, "    <Width>{}</Width>", map.width())?;
        writeln!(writer, "    <Height>{}</Height>", map.height())?;
        writeln!(writer, "    <MaxElevation>{}</MaxElevation>", map.max_elevation())?;
        writeln!(writer, "    <MinElevation>{}</MinElevation>", map.min_elevation())?;
        writeln!(writer, "    <NoValue>{NO_VALUE}</NoValue>")?;
        writeln!(writer, "  </Properties>")?;
        if self.export_array {
            let rows = (0..map.height())
                .rev()
                .map(|row| (0..map.width()).map(|col| map.get(row, col).to_string()).join(","))
                .join("\n");
            writeln!(writer, "  <ArrayInNumpyFormat>{rows}</ArrayInNumpyFormat>")?;
        }
        writeln!(writer, "</ElevationMap>")?;
        Ok(())
    }
}

impl Task for ElevationMapExporter {
    fn description(&self) -> String {
        "Exporting the elevation map as XML and JPG...".to_string()
    }

    fn input_kind(&self) -> IoKind {
        IoKind::Elevation
    }

    fn output_kind(&self) -> IoKind {
        IoKind::Empty
    }

    fn take_input(&mut self, input: TaskIo) {
        let TaskIo::Elevation(map) = input else {
            panic!("elevation exporter fed a non-elevation input");
        };
        self.map = Some(map);
        self.step = 0;
    }

    fn continue_processing(&mut self) -> f64 {
        if self.step == 0 {
            if let Err(err) = self.export_greyscale_image() {
                warn!(error = %err, "elevation map image export failed");
                self.error = Some(err.to_string());
            }
            self.step += 1;
            0.5
        } else {
            if let Err(err) = self.export_xml() {
                warn!(error = %err, "elevation map XML export failed");
                self.error = Some(err.to_string());
            }
            1.0
        }
    }

    fn take_result(&mut self) -> TaskIo {
        TaskIo::Empty
    }
}
