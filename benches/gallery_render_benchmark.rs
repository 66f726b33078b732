use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use portfolio_web::domain::step_image::{DeletionKey, PendingId, PendingUpload, SelectedFile, Step, StepImage};
use portfolio_web::services::gallery::{render_gallery, RenderOptions};
use portfolio_web::services::step_content::expand_image_tags;
use std::collections::BTreeSet;
use std::time::Duration;

const STEPS: usize = 12;

fn existing_images(count: usize) -> Vec<StepImage> {
    (0..count)
        .map(|i| {
            StepImage::new(
                i.to_string(),
                Step::from_index(i % STEPS),
                format!("task_step_images/photo_{}.jpg", i),
            )
        })
        .collect()
}

fn pending_uploads(count: usize) -> Vec<PendingUpload> {
    (0..count)
        .map(|i| PendingUpload {
            id: PendingId::generate(),
            step: Step::from_index(i % STEPS),
            file: SelectedFile::new(format!("a_rather_long_camera_name_{}.jpg", i), "image/jpeg", vec![0; 64]),
            preview_data_url: "data:image/jpeg;base64,AAAA".to_string(),
            description: String::new(),
        })
        .collect()
}

fn bench_render_gallery(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_gallery");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));
    let options = RenderOptions::default();

    for count in [10, 100, 500, 2000].iter() {
        let existing = existing_images(*count);
        let pending = pending_uploads(*count / 2);
        // Every third existing image is marked for deletion.
        let marks: BTreeSet<DeletionKey> = existing.iter().step_by(3).map(StepImage::deletion_key).collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| black_box(render_gallery(&existing, &pending, &marks, &options)));
        });
    }
    group.finish();
}

fn bench_expand_image_tags(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_image_tags");

    for tags in [0, 5, 50].iter() {
        let content: String = (0..*tags)
            .map(|i| format!("Sand the edge until smooth [IMAGE:edge_{}.png] ", i))
            .chain(std::iter::once("then apply the finish".to_string()))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(tags), &content, |b, content| {
            b.iter(|| black_box(expand_image_tags(content)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render_gallery, bench_expand_image_tags);

criterion_main!(benches);
