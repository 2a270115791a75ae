use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use anyhow::Result;
use image::{Rgb, RgbImage};
use tracing::warn;

use crate::pipeline::raycast::{CastingResult, EntityType};
use crate::pipeline::{IoKind, Task, TaskIo};

/// Casting rows scanned per processing increment.
const ROWS_PER_STEP: usize = 4;

/// Side of the square patch marking a crown's highest point, in pixels.
const TOP_SIZE: i64 = 10;

const FLOOR_COLOR: [u8; 3] = [174, 144, 107];
const TREE_COLOR: [u8; 3] = [34, 139, 34];
const BORDER_COLOR: [u8; 3] = [0, 0, 0];
const TOP_COLOR: [u8; 3] = [255, 0, 0];

const IMAGE_NAME: &str = "tree_crowns.jpg";

/// Grid cells assigned to one detected crown, keyed by casting grid row and
/// column, plus the cell where the crown reached its highest altitude.
pub struct Tree {
    highest_altitude: f64,
    highest_row: usize,
    highest_col: usize,
    assigned: HashSet<(usize, usize)>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            highest_altitude: f64::NEG_INFINITY,
            highest_row: 0,
            highest_col: 0,
            assigned: HashSet::new(),
        }
    }

    pub fn assign_pixel(&mut self, row: usize, col: usize, altitude: f64) {
        self.assigned.insert((row, col));
        if altitude > self.highest_altitude {
            self.highest_altitude = altitude;
            self.highest_row = row;
            self.highest_col = col;
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.assigned.len()
    }

    pub fn highest_pixel(&self) -> (usize, usize) {
        (self.highest_row, self.highest_col)
    }

    pub fn contains_pixel(&self, row: usize, col: usize) -> bool {
        self.assigned.contains(&(row, col))
    }

    /// A pixel is on the crown's border if any of its eight neighbors is
    /// not assigned to this crown.
    pub fn is_pixel_border(&self, row: usize, col: usize) -> bool {
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let nr = row as i64 + dr;
                let nc = col as i64 + dc;
                if nr < 0 || nc < 0 {
                    return true;
                }
                if !self.assigned.contains(&(nr as usize, nc as usize)) {
                    return true;
                }
            }
        }
        false
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Detected crowns keyed by instance name. The map is ordered so that a
/// repeated run over the same casting grid draws crowns identically.
pub struct DetectionResult {
    pub width: usize,
    pub height: usize,
    pub trees: BTreeMap<String, Tree>,
}

/// Stage 3B: groups vegetation-classified cells by the struck instance,
/// a few casting rows per call.
pub struct TreeCrownDetection {
    input: Option<CastingResult>,
    rows_scanned: usize,
    result: Option<DetectionResult>,
}

impl TreeCrownDetection {
    pub fn new() -> Self {
        Self { input: None, rows_scanned: 0, result: None }
    }
}

impl Default for TreeCrownDetection {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for TreeCrownDetection {
    fn description(&self) -> String {
        "Detecting tree crowns in the casting results...".to_string()
    }

    fn input_kind(&self) -> IoKind {
        IoKind::Casting
    }

    fn output_kind(&self) -> IoKind {
        IoKind::Detection
    }

    fn take_input(&mut self, input: TaskIo) {
        let TaskIo::Casting(casting) = input else {
            panic!("crown detection fed a non-casting input");
        };
        self.result = Some(DetectionResult {
            width: casting.width(),
            height: casting.height(),
            trees: BTreeMap::new(),
        });
        self.input = Some(casting);
        self.rows_scanned = 0;
    }

    fn continue_processing(&mut self) -> f64 {
        let casting = self.input.as_ref().expect("crown detection polled before input");
        let result = self.result.as_mut().expect("crown detection polled before input");
        let height = casting.height();
        if height == 0 {
            return 1.0;
        }

        let last_row = (self.rows_scanned + ROWS_PER_STEP).min(height);
        for row in self.rows_scanned..last_row {
            for col in 0..casting.width() {
                let Some(hit) = casting.get(row, col) else {
                    continue;
                };
                if hit.entity_type != EntityType::Tree {
                    continue;
                }
                result
                    .trees
                    .entry(hit.entity_name.clone())
                    .or_default()
                    .assign_pixel(row, col, hit.hit_point.y);
            }
        }
        self.rows_scanned = last_row;
        if self.rows_scanned == height {
            self.input = None;
        }

        self.rows_scanned as f64 / height as f64
    }

    fn take_result(&mut self) -> TaskIo {
        TaskIo::Detection(self.result.take().expect("detection result already taken"))
    }
}

/// Terminal stage: paints the detected crowns over a bare-ground backdrop,
/// one crown per call, and saves the raster once the last crown is drawn.
///
/// Casting row 0 maps to the bottom row of the image.
pub struct TreeCrownDrawing {
    folder_path: PathBuf,
    input: Option<DetectionResult>,
    image: Option<RgbImage>,
    names: Vec<String>,
    trees_drawn: usize,
    error: Option<String>,
}

impl TreeCrownDrawing {
    pub fn new(folder_path: PathBuf) -> Self {
        Self {
            folder_path,
            input: None,
            image: None,
            names: Vec::new(),
            trees_drawn: 0,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn draw_tree(&mut self, name: &str) {
        let detection = self.input.as_ref().expect("crown drawing polled before input");
        let tree = &detection.trees[name];
        let image = self.image.as_mut().expect("crown drawing polled before input");
        let height = detection.height;

        for &(row, col) in &tree.assigned {
            let color = if tree.is_pixel_border(row, col) { BORDER_COLOR } else { TREE_COLOR };
            image.put_pixel(col as u32, (height - 1 - row) as u32, Rgb(color));
        }

        let (top_row, top_col) = tree.highest_pixel();
        let top_y = height as i64 - 1 - top_row as i64;
        for dy in -TOP_SIZE / 2..TOP_SIZE / 2 {
            for dx in -TOP_SIZE / 2..TOP_SIZE / 2 {
                let x = top_col as i64 + dx;
                let y = top_y + dy;
                if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
                    continue;
                }
                image.put_pixel(x as u32, y as u32, Rgb(TOP_COLOR));
            }
        }
    }

    fn save_image(&self) -> Result<()> {
        let image = self.image.as_ref().expect("crown drawing polled before input");
        image.save(self.folder_path.join(IMAGE_NAME))?;
        Ok(())
    }
}

impl Task for TreeCrownDrawing {
    fn description(&self) -> String {
        "Drawing the detected tree crowns...".to_string()
    }

    fn input_kind(&self) -> IoKind {
        IoKind::Detection
    }

    fn output_kind(&self) -> IoKind {
        IoKind::Empty
    }

    fn take_input(&mut self, input: TaskIo) {
        let TaskIo::Detection(detection) = input else {
            panic!("crown drawing fed a non-detection input");
        };
        let width = detection.width.max(1) as u32;
        let height = detection.height.max(1) as u32;
        self.image = Some(RgbImage::from_pixel(width, height, Rgb(FLOOR_COLOR)));
        self.names = detection.trees.keys().cloned().collect();
        self.input = Some(detection);
        self.trees_drawn = 0;
    }

    fn continue_processing(&mut self) -> f64 {
        if self.names.is_empty() {
            if let Err(err) = self.save_image() {
                warn!(error = %err, "tree crown raster save failed");
                self.error = Some(err.to_string());
            }
            return 1.0;
        }

        let name = self.names[self.trees_drawn].clone();
        self.draw_tree(&name);
        self.trees_drawn += 1;
        if self.trees_drawn == self.names.len() {
            if let Err(err) = self.save_image() {
                warn!(error = %err, "tree crown raster save failed");
                self.error = Some(err.to_string());
            }
        }

        self.trees_drawn as f64 / self.names.len() as f64
    }

    fn take_result(&mut self) -> TaskIo {
        TaskIo::Empty
    }
}
