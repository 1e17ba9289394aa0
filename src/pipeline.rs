use anyhow::Result;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::detection::ocr::TextToken;
use crate::models::BoundingRect;

/// One frame on its way through the pipeline
#[derive(Clone, Debug)]
pub struct PipelineData {
    /// Normalized frame, then rotated frame, then card crop
    pub image: DynamicImage,
    /// Frame exactly as loaded, restored when rectification falls back
    pub original: Arc<DynamicImage>,
    /// Card box within the rotated frame, set by the crop step
    pub bbox: Option<BoundingRect>,
    pub metadata: BTreeMap<&'static str, MetadataValue>,
    pub tokens: Vec<TextToken>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Flag(bool),
    Number(f32),
    Text(String),
    Count(u32),
}

impl MetadataValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            MetadataValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            MetadataValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Flag(v)
    }
}

impl From<f32> for MetadataValue {
    fn from(v: f32) -> Self {
        MetadataValue::Number(v)
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        MetadataValue::Count(v)
    }
}

impl PipelineData {
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            original: Arc::new(image.clone()),
            image,
            bbox: None,
            metadata: BTreeMap::new(),
            tokens: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: &'static str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(MetadataValue::as_flag)
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.metadata.get(key).and_then(MetadataValue::as_number)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_text)
    }

    /// Rectification gave up and the frame was passed through as is
    pub fn is_fallback(&self) -> bool {
        self.get_bool("card_detected") == Some(false)
    }
}

/// Shared, read-only state handed to every step
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    /// Where per-step images go, when debugging
    pub debug_dir: Option<PathBuf>,
}

pub trait PipelineStep: Send + Sync {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Shown in logs; lowercased with underscores it also names the debug folder
    fn name(&self) -> &str;
}

/// Ordered chain of steps run one after another on a single frame
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

fn debug_folder(index: usize, step_name: &str) -> String {
    format!("{:02}_{}", index, step_name.to_lowercase().replace(' ', "_"))
}

fn dump_images(dir: &Path, data: &[PipelineData]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for (idx, item) in data.iter().enumerate() {
        let path = dir.join(format!("{:02}.png", idx + 1));
        item.image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
    }
    Ok(())
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every intermediate image below `output_dir`.
    ///
    /// Refuses a directory that already has content so earlier runs are
    /// never mixed in.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                anyhow::bail!("Debug directory is not empty: {}", output_dir.display());
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug_dir = Some(output_dir);
        Ok(self)
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn snapshot(&self, folder: &str, data: &[PipelineData]) -> Result<()> {
        if let Some(root) = &self.context.debug_dir {
            dump_images(&root.join(folder), data)?;
            debug!(folder, images = data.len(), "Debug images written");
        }
        Ok(())
    }

    pub fn run(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        let mut data = vec![PipelineData::from_image(input)];
        self.snapshot("00_input", &data)?;

        for (idx, step) in self.steps.iter().enumerate() {
            let started = Instant::now();
            data = step.process(data, &self.context)?;
            debug!(
                step = step.name(),
                items = data.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Step finished"
            );

            self.snapshot(&debug_folder(idx + 1, step.name()), &data)?;
        }

        Ok(data)
    }
}
