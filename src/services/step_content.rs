use crate::domain::step_image::{Step, StepImage, detail_image_url};
use crate::domain::task::TaskDescriptor;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

static IMAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[IMAGE:([^\[\]]+)\]").expect("image tag pattern is valid"));

pub const STEP_IMAGE_DIR: &str = "/media/task_step_images/";

/// A piece of step content after `[IMAGE:...]` tags are expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSegment {
    Text(String),
    Image { src: String },
}

/// Splits step content into text runs and inline images. Tags whose name
/// is blank stay as text.
pub fn expand_image_tags(content: &str) -> Vec<ContentSegment> {
    let mut segments = Vec::new();
    let mut rest_start = 0;

    for captures in IMAGE_TAG.captures_iter(content) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let file_name: String = name.as_str().trim().chars().filter(|c| *c != '[' && *c != ']').collect();
        if file_name.is_empty() {
            continue;
        }
        if whole.start() > rest_start {
            segments.push(ContentSegment::Text(content[rest_start..whole.start()].to_string()));
        }
        segments.push(ContentSegment::Image {
            src: format!("{}{}", STEP_IMAGE_DIR, file_name),
        });
        rest_start = whole.end();
    }

    if rest_start < content.len() {
        segments.push(ContentSegment::Text(content[rest_start..].to_string()));
    }
    segments
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepThumbnail {
    pub url: String,
    pub label: String,
    pub alt: String,
    pub description: Option<String>,
}

/// One process step as shown on the task detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessStepView {
    pub step: Step,
    pub content: Vec<ContentSegment>,
    pub thumbnails: Vec<StepThumbnail>,
}

impl ProcessStepView {
    /// "N images" under the thumbnail row, absent when the step has none.
    pub fn image_hint(&self) -> Option<String> {
        match self.thumbnails.len() {
            0 => None,
            1 => Some("1 image".to_string()),
            n => Some(format!("{} images", n)),
        }
    }
}

fn thumbnails_for(step: Step, images: &[&StepImage], origin: &str) -> Vec<StepThumbnail> {
    images
        .iter()
        .filter(|image| {
            let has_url = !image.url.trim().is_empty();
            if !has_url {
                warn!(step = %step, id = %image.id, "Step image has no URL; skipped");
            }
            has_url
        })
        .enumerate()
        .map(|(index, image)| StepThumbnail {
            url: detail_image_url(&image.url, origin),
            label: format!("Image {}", index + 1),
            alt: format!("Step {} image {}", step, index + 1),
            description: Some(image.description.trim())
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
        .collect()
}

/// Builds the read-only step list: one entry per non-blank process line,
/// each with its images in their original order.
pub fn build_process_steps(task: &TaskDescriptor, origin: &str) -> Vec<ProcessStepView> {
    let lines = task.process_lines();

    let mut by_step: BTreeMap<Step, Vec<&StepImage>> = BTreeMap::new();
    for image in &task.step_images {
        by_step.entry(image.step).or_default().push(image);
    }

    for (step, images) in by_step.range(Step::from_index(lines.len())..) {
        warn!(step = %step, images = images.len(), "Images reference a step with no process line");
    }

    let steps: Vec<ProcessStepView> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let step = Step::from_index(index);
            let images = by_step.get(&step).map(Vec::as_slice).unwrap_or(&[]);
            ProcessStepView {
                step,
                content: expand_image_tags(line),
                thumbnails: thumbnails_for(step, images, origin),
            }
        })
        .collect();

    debug!(steps = steps.len(), "Built process step views");
    steps
}
