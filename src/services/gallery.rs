use crate::domain::step_image::{
    DeletionKey, ImageRef, PendingUpload, Step, StepImage, editor_image_url,
};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::debug;

/// Identifies the delete button of one card.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteTarget {
    pub step: Step,
    pub image: ImageRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailCard {
    pub target: DeleteTarget,
    pub image_url: String,
    pub alt: String,
    pub step_badge: String,
    pub pending: bool,
    /// Shortened file name, pending uploads only.
    pub file_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepGroup {
    pub step: Step,
    pub header: String,
    pub cards: Vec<ThumbnailCard>,
}

/// Everything the image container shows for one editor state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GalleryView {
    pub groups: Vec<StepGroup>,
    pub image_count: usize,
}

impl GalleryView {
    /// True when the container should show the empty-state placeholder.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn count_label(&self) -> String {
        match self.image_count {
            1 => "1 image".to_string(),
            n => format!("{} images", n),
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &ThumbnailCard> {
        self.groups.iter().flat_map(|group| group.cards.iter())
    }

    pub fn contains(&self, target: &DeleteTarget) -> bool {
        self.cards().any(|card| &card.target == target)
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub media_prefix: String,
    pub file_label_max_chars: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            media_prefix: "/media/".to_string(),
            file_label_max_chars: 15,
        }
    }
}

/// Cuts a file name to `max_chars` characters, adding "..." when cut.
pub fn truncate_file_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let mut short: String = name.chars().take(max_chars).collect();
        short.push_str("...");
        short
    } else {
        name.to_string()
    }
}

/// Pure projection of the staged state onto the gallery: existing images
/// minus deletion marks, plus pending uploads, grouped by ascending step.
/// Within a step, existing images come first, then pending ones, each in
/// insertion order.
pub fn render_gallery(
    existing: &[StepImage],
    pending: &[PendingUpload],
    deletion_marks: &BTreeSet<DeletionKey>,
    options: &RenderOptions,
) -> GalleryView {
    let mut by_step: BTreeMap<Step, Vec<ThumbnailCard>> = BTreeMap::new();

    for image in existing {
        if deletion_marks.contains(&image.deletion_key()) {
            continue;
        }
        by_step.entry(image.step).or_default().push(ThumbnailCard {
            target: DeleteTarget {
                step: image.step,
                image: ImageRef::Existing(image.id.clone()),
            },
            image_url: editor_image_url(&image.url, &options.media_prefix),
            alt: format!("Step {} image", image.step),
            step_badge: format!("Step {}", image.step),
            pending: false,
            file_label: None,
        });
    }

    for upload in pending {
        by_step.entry(upload.step).or_default().push(ThumbnailCard {
            target: DeleteTarget {
                step: upload.step,
                image: ImageRef::Pending(upload.id),
            },
            image_url: upload.preview_data_url.clone(),
            alt: format!("Step {} image", upload.step),
            step_badge: format!("Step {}", upload.step),
            pending: true,
            file_label: Some(truncate_file_name(&upload.file.name, options.file_label_max_chars)),
        });
    }

    let image_count = by_step.values().map(Vec::len).sum();
    let groups = by_step
        .into_iter()
        .map(|(step, cards)| StepGroup {
            step,
            header: format!("Step {}", step),
            cards,
        })
        .collect();

    GalleryView { groups, image_count }
}

pub type DeleteHandler = Rc<dyn Fn(&DeleteTarget)>;
pub type RenderSink = Rc<dyn Fn(&GalleryView)>;

/// The editor's image container. Only `paint` rewrites its contents, and
/// delete clicks from every card go through one delegated handler.
#[derive(Default)]
pub struct GalleryContainer {
    view: GalleryView,
    delete_handler: Option<DeleteHandler>,
    sink: Option<RenderSink>,
    paint_count: usize,
}

impl GalleryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: RenderSink) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    pub fn paint(&mut self, view: GalleryView) {
        self.paint_count += 1;
        self.view = view;
        if let Some(sink) = &self.sink {
            sink(&self.view);
        }
    }

    /// Removes any previous handler before adding this one, so repeated
    /// binding never stacks handlers.
    pub fn bind_delete(&mut self, handler: DeleteHandler) {
        self.delete_handler.take();
        self.delete_handler = Some(handler);
    }

    pub fn has_delete_handler(&self) -> bool {
        self.delete_handler.is_some()
    }

    pub fn view(&self) -> &GalleryView {
        &self.view
    }

    pub fn paint_count(&self) -> usize {
        self.paint_count
    }

    /// Resolves a click to the handler to run. Clicks on cards that are no
    /// longer shown resolve to nothing. The handler is returned rather than
    /// called so the caller can release its borrow of the container first.
    pub fn resolve_delete(&self, target: &DeleteTarget) -> Option<DeleteHandler> {
        if !self.view.contains(target) {
            debug!(step = %target.step, image = %target.image, "Delete click on a card that is not shown");
            return None;
        }
        self.delete_handler.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::step_image::{PendingId, SelectedFile};
    use std::cell::RefCell;

    fn step(n: u32) -> Step {
        Step::new(n).unwrap()
    }

    fn pending(n: u32, name: &str) -> PendingUpload {
        PendingUpload {
            id: PendingId::generate(),
            step: step(n),
            file: SelectedFile::new(name, "image/png", vec![0]),
            preview_data_url: "data:image/png;base64,AA==".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_groups_sorted_numerically() {
        let existing = vec![
            StepImage::new("a", step(10), "a.png"),
            StepImage::new("b", step(2), "b.png"),
            StepImage::new("c", step(2), "c.png"),
        ];
        let view = render_gallery(&existing, &[], &BTreeSet::new(), &RenderOptions::default());

        let steps: Vec<u32> = view.groups.iter().map(|g| g.step.get()).collect();
        assert_eq!(steps, vec![2, 10]);
        assert_eq!(view.groups[0].header, "Step 2");
        assert_eq!(view.groups[0].cards[0].target.image, ImageRef::Existing("b".into()));
        assert_eq!(view.groups[0].cards[1].target.image, ImageRef::Existing("c".into()));
        assert_eq!(view.image_count, 3);
    }

    #[test]
    fn test_pending_cards_after_existing() {
        let existing = vec![StepImage::new("a", step(1), "task_step_images/a.png")];
        let uploads = vec![pending(1, "a_really_long_filename.png")];
        let view = render_gallery(&existing, &uploads, &BTreeSet::new(), &RenderOptions::default());

        let cards = &view.groups[0].cards;
        assert!(!cards[0].pending);
        assert_eq!(cards[0].image_url, "/media/task_step_images/a.png");
        assert_eq!(cards[0].file_label, None);
        assert!(cards[1].pending);
        assert_eq!(cards[1].file_label.as_deref(), Some("a_really_long_f..."));
    }

    #[test]
    fn test_marked_images_hidden() {
        let existing = vec![StepImage::new("5", step(2), "a.png")];
        let marks = BTreeSet::from([DeletionKey::new(step(2), "5")]);
        let view = render_gallery(&existing, &[], &marks, &RenderOptions::default());
        assert!(view.is_empty());
        assert_eq!(view.count_label(), "0 images");
    }

    #[test]
    fn test_truncate_file_name() {
        assert_eq!(truncate_file_name("short.png", 15), "short.png");
        assert_eq!(truncate_file_name("exactly15chars_", 15), "exactly15chars_");
        assert_eq!(truncate_file_name("步骤图片步骤图片步骤图片步骤图片.png", 15), "步骤图片步骤图片步骤图片步骤图...");
    }

    #[test]
    fn test_rebinding_keeps_single_handler() {
        let calls = Rc::new(RefCell::new(0));
        let mut container = GalleryContainer::new();
        let existing = vec![StepImage::new("5", step(2), "a.png")];
        let view = render_gallery(&existing, &[], &BTreeSet::new(), &RenderOptions::default());

        for _ in 0..3 {
            let counter = calls.clone();
            container.bind_delete(Rc::new(move |_target: &DeleteTarget| *counter.borrow_mut() += 1));
            container.paint(view.clone());
        }

        let target = DeleteTarget { step: step(2), image: ImageRef::Existing("5".into()) };
        if let Some(handler) = container.resolve_delete(&target) {
            handler(&target);
        }
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(container.paint_count(), 3);
    }

    #[test]
    fn test_click_on_missing_card_ignored() {
        let mut container = GalleryContainer::new();
        container.bind_delete(Rc::new(|_target: &DeleteTarget| panic!("must not run")));
        container.paint(GalleryView::default());

        let target = DeleteTarget { step: step(1), image: ImageRef::Existing("x".into()) };
        assert!(container.resolve_delete(&target).is_none());
    }
}
