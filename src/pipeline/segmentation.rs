use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use image::{Rgb, RgbImage};
use itertools::Itertools;
use tracing::warn;

use crate::pipeline::raycast::{CastingResult, EntityType};
use crate::pipeline::{IoKind, Task, TaskIo};

/// Class code for cells where no probe intersection was recorded.
pub const NOTHING: i32 = -1;

/// Legend colors for the rendered class raster.
#[derive(Debug, Clone, Copy)]
pub struct SegmentationColors {
    pub terrain: [u8; 3],
    pub tree: [u8; 3],
    pub no_hit: [u8; 3],
}

impl Default for SegmentationColors {
    fn default() -> Self {
        Self {
            terrain: [174, 144, 107],
            tree: [34, 139, 34],
            no_hit: [0, 0, 0],
        }
    }
}

/// Terminal stage: converts the casting grid into a per-cell class raster
/// plus an XML dump of the class codes, in one call.
///
/// Both outputs are north-up: casting row 0 becomes the bottom row of the
/// image and the last row of the exported array.
pub struct Segmentation {
    gsd: f64,
    export_array: bool,
    folder_path: PathBuf,
    colors: SegmentationColors,
    input: Option<CastingResult>,
    error: Option<String>,
}

const IMAGE_NAME: &str = "segmentation.jpg";
const XML_NAME: &str = "segmentation.xml";

impl Segmentation {
    pub fn new(gsd: f64, export_array: bool, folder_path: PathBuf) -> Self {
        Self {
            gsd,
            export_array,
            folder_path,
            colors: SegmentationColors::default(),
            input: None,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Class codes with the row order inverted so that index [0][0] is the
    /// north-west corner of the covered area.
    fn classify(&self) -> Vec<Vec<i32>> {
        let casting = self.input.as_ref().expect("segmentation polled before input");
        let mut array = vec![vec![NOTHING; casting.width()]; casting.height()];
        for row in 0..casting.height() {
            for col in 0..casting.width() {
                if let Some(result) = casting.get(row, col) {
                    array[casting.height() - 1 - row][col] = result.entity_type.code();
                }
            }
        }
        array
    }

    fn export(&self, array: &[Vec<i32>]) -> Result<()> {
        let casting = self.input.as_ref().expect("segmentation polled before input");
        let width = casting.width().max(1) as u32;
        let height = casting.height().max(1) as u32;
        let mut image = RgbImage::new(width, height);
        for (y, row) in array.iter().enumerate() {
            for (x, &code) in row.iter().enumerate() {
                let color = if code == EntityType::Terrain.code() {
                    self.colors.terrain
                } else if code == EntityType::Tree.code() {
                    self.colors.tree
                } else {
                    self.colors.no_hit
                };
                image.put_pixel(x as u32, y as u32, Rgb(color));
            }
        }
        image.save(self.folder_path.join(IMAGE_NAME))?;

        let file = File::create(self.folder_path.join(XML_NAME))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        writeln!(writer, "<Segmentation>")?;
        writeln!(writer, "  <Properties>")?;
        writeln!(writer, "    <GSD>{}</GSD>", self.gsd)?;
        writeln!(writer, "    <Width>{}</Width>", casting.width())?;
        writeln!(writer, "    <Height>{}</Height>", casting.height())?;
        writeln!(writer, "  </Properties>")?;
        writeln!(writer, "  <Values>")?;
        writeln!(writer, "    <Nothing>{NOTHING}</Nothing>")?;
        writeln!(
            writer,
            "    <{0}>{1}</{0}>",
            EntityType::Terrain.label(),
            EntityType::Terrain.code()
        )?;
        writeln!(
            writer,
            "    <{0}>{1}</{0}>",
            EntityType::Tree.label(),
            EntityType::Tree.code()
        )?;
        writeln!(writer, "  </Values>")?;
        if self.export_array {
            let rows = array
                .iter()
                .map(|row| row.iter().map(|code| code.to_string()).join(","))
                .join("\n");
            writeln!(writer, "  <ArrayInNumpyFormat>{rows}</ArrayInNumpyFormat>")?;
        }
        writeln!(writer, "</Segmentation>")?;
        Ok(())
    }
}

impl Task for Segmentation {
    fn description(&self) -> String {
        "Segmenting the covered area...".to_string()
    }

    fn input_kind(&self) -> IoKind {
        IoKind::Casting
    }

    fn output_kind(&self) -> IoKind {
        IoKind::Empty
    }

    fn take_input(&mut self, input: TaskIo) {
        let TaskIo::Casting(casting) = input else {
            panic!("segmentation fed a non-casting input");
        };
        self.input = Some(casting);
    }

    fn continue_processing(&mut self) -> f64 {
        let array = self.classify();
        if let Err(err) = self.export(&array) {
            warn!(error = %err, "segmentation export failed");
            self.error = Some(err.to_string());
        }
        self.input = None;
        1.0
    }

    fn take_result(&mut self) -> TaskIo {
        TaskIo::Empty
    }
}
