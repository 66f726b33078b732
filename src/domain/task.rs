use crate::domain::step_image::{Step, StepImage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// A malformed piece of the injected page data. Never fatal: the offending
/// value degrades to an empty/default one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataShapeWarning {
    pub field: String,
    pub detail: String,
}

impl DataShapeWarning {
    pub fn new(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DataShapeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: Option<i64>,
    pub title: String,
    /// Newline-delimited step text.
    pub process: String,
    pub step_images: Vec<StepImage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub id: Option<i64>,
    pub title: String,
}

/// Everything the hosting page hands to the client layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageContext {
    pub task: Option<TaskDescriptor>,
    pub project: Option<ProjectDescriptor>,
    pub csrf_token: Option<String>,
    pub origin: String,
    /// Options for the project list filter selects.
    pub categories: Vec<String>,
    pub technologies: Vec<String>,
}

impl TaskDescriptor {
    pub fn new(id: i64, process: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            title: String::new(),
            process: process.into(),
            step_images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<StepImage>) -> Self {
        self.step_images = images;
        self
    }

    /// Parses the page-injected task object. Malformed parts are dropped and
    /// reported as warnings; this never fails.
    pub fn from_value(value: &Value) -> (Self, Vec<DataShapeWarning>) {
        let mut warnings = Vec::new();
        let Some(object) = value.as_object() else {
            warnings.push(DataShapeWarning::new("task", "not an object"));
            return (Self::default(), warnings);
        };

        let id = parse_record_id(object.get("id"), "task.id", &mut warnings);
        let title = object
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let process = parse_process(object.get("process"), &mut warnings);
        let step_images = parse_step_images(object.get("step_images"), &mut warnings);

        (
            Self {
                id,
                title,
                process,
                step_images,
            },
            warnings,
        )
    }

    /// Non-blank lines of the process text, trimmed.
    pub fn process_lines(&self) -> Vec<&str> {
        process_lines(&self.process)
    }
}

impl ProjectDescriptor {
    pub fn new(id: i64) -> Self {
        Self {
            id: Some(id),
            title: String::new(),
        }
    }

    pub fn from_value(value: &Value) -> (Self, Vec<DataShapeWarning>) {
        let mut warnings = Vec::new();
        let Some(object) = value.as_object() else {
            warnings.push(DataShapeWarning::new("project", "not an object"));
            return (Self::default(), warnings);
        };
        let id = parse_record_id(object.get("id"), "project.id", &mut warnings);
        let title = object
            .get("title")
            .or_else(|| object.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        (Self { id, title }, warnings)
    }
}

pub fn process_lines(process: &str) -> Vec<&str> {
    process
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// One step per non-blank process line; an empty process still offers step 1.
pub fn step_options(process: &str) -> Vec<Step> {
    let count = process_lines(process).len().max(1);
    (0..count).map(Step::from_index).collect()
}

fn parse_record_id(value: Option<&Value>, field: &str, warnings: &mut Vec<DataShapeWarning>) -> Option<i64> {
    let id = match value {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    match id {
        Some(id) if id > 0 => Some(id),
        _ => {
            warnings.push(DataShapeWarning::new(field, "not a positive integer id"));
            None
        }
    }
}

fn parse_process(value: Option<&Value>, warnings: &mut Vec<DataShapeWarning>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(steps)) => steps
            .iter()
            .filter_map(|step| match step {
                Value::String(text) => Some(text.clone()),
                Value::Object(fields) => fields
                    .get("title")
                    .or_else(|| fields.get("content"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(_) => {
            warnings.push(DataShapeWarning::new("task.process", "neither text nor a list of steps"));
            String::new()
        }
    }
}

const URL_FIELDS: [&str; 5] = ["url", "image_url", "file_url", "path", "file"];

fn parse_step_images(value: Option<&Value>, warnings: &mut Vec<DataShapeWarning>) -> Vec<StepImage> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warnings.push(DataShapeWarning::new("task.step_images", "not an array"));
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut images = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let field = format!("task.step_images[{}]", index);
        let Some(fields) = item.as_object() else {
            warnings.push(DataShapeWarning::new(field, "not an object"));
            continue;
        };

        let Some(step) = fields.get("step").and_then(parse_step) else {
            warnings.push(DataShapeWarning::new(field, "missing or non-numeric step"));
            continue;
        };

        let id = match fields.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                warnings.push(DataShapeWarning::new(field, "missing id"));
                continue;
            }
        };

        if !seen.insert((step, id.clone())) {
            warnings.push(DataShapeWarning::new(field, format!("duplicate image {} for step {}", id, step)));
            continue;
        }

        let url = URL_FIELDS
            .iter()
            .filter_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or_default()
            .to_string();
        let description = fields
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        images.push(StepImage {
            id,
            step,
            url,
            description,
        });
    }
    images
}

fn parse_step(value: &Value) -> Option<Step> {
    match value {
        Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                u32::try_from(n).ok().and_then(Step::new)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 1.0 && *f < u32::MAX as f64)
                    .and_then(|f| Step::new(f.trunc() as u32))
            }
        }
        Value::String(text) => Step::parse_lenient(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_well_formed_task() {
        let (task, warnings) = TaskDescriptor::from_value(&json!({
            "id": 7,
            "title": "Wiring",
            "process": "cut\nstrip\n\nsolder",
            "step_images": [
                {"id": "5", "step": 2, "url": "a.png", "description": "stripped"},
                {"id": 9, "step": "1", "image_url": "/media/b.png"}
            ]
        }));

        assert!(warnings.is_empty());
        assert_eq!(task.id, Some(7));
        assert_eq!(task.process_lines(), vec!["cut", "strip", "solder"]);
        assert_eq!(task.step_images.len(), 2);
        assert_eq!(task.step_images[0].description, "stripped");
        assert_eq!(task.step_images[1].id, "9");
        assert_eq!(task.step_images[1].url, "/media/b.png");
    }

    #[test]
    fn test_malformed_images_degrade() {
        let (task, warnings) = TaskDescriptor::from_value(&json!({
            "id": "3",
            "process": "a",
            "step_images": {"not": "an array"}
        }));
        assert_eq!(task.id, Some(3));
        assert!(task.step_images.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "task.step_images");
    }

    #[test]
    fn test_bad_steps_are_dropped_with_warning() {
        let (task, warnings) = TaskDescriptor::from_value(&json!({
            "step_images": [
                {"id": "1", "step": "x"},
                {"id": "2"},
                {"id": "3", "step": 0},
                {"id": "4", "step": 2.7, "url": "ok.png"},
                "garbage"
            ]
        }));
        assert_eq!(task.step_images.len(), 1);
        assert_eq!(task.step_images[0].step, Step::new(2).unwrap());
        assert_eq!(warnings.len(), 4);
    }

    #[test]
    fn test_duplicate_images_keep_first() {
        let (task, warnings) = TaskDescriptor::from_value(&json!({
            "step_images": [
                {"id": "1", "step": 1, "url": "first.png"},
                {"id": "1", "step": "1", "url": "second.png"}
            ]
        }));
        assert_eq!(task.step_images.len(), 1);
        assert_eq!(task.step_images[0].url, "first.png");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_process_as_step_objects() {
        let (task, _) = TaskDescriptor::from_value(&json!({
            "process": [{"title": "measure", "content": ""}, {"title": "cut"}]
        }));
        assert_eq!(task.process, "measure\ncut");
    }

    #[test]
    fn test_non_object_task() {
        let (task, warnings) = TaskDescriptor::from_value(&json!(null));
        assert_eq!(task, TaskDescriptor::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_step_options_empty_process() {
        assert_eq!(step_options(""), vec![Step::first()]);
        assert_eq!(step_options("  \n\n "), vec![Step::first()]);
    }

    #[test]
    fn test_project_from_value() {
        let (project, warnings) = ProjectDescriptor::from_value(&json!({"id": 0, "name": "Lab"}));
        assert_eq!(project.id, None);
        assert_eq!(project.title, "Lab");
        assert_eq!(warnings.len(), 1);
    }
}
