//! Dataset driver: one synthesized invoice per annotation file.
//!
//! Documents are independent. Each runs on its own RNG and surface; fonts,
//! configuration and the content catalog are shared read-only between workers.
//! A failing document is reported and never stops the rest of the batch.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::compose::DocumentComposer;
use crate::error::Error;

const TEMPLATE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub struct BatchOptions {
    pub annotations_dir: PathBuf,
    /// Directory holding the template image of each annotation (`<stem>.jpg`).
    pub images_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Base seed; document `i` uses `seed + i`. OS entropy when unset.
    pub seed: Option<u64>,
    pub jobs: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentJob {
    pub index: usize,
    pub stem: String,
    pub annotation: PathBuf,
    pub template: Option<PathBuf>,
    pub output_image: PathBuf,
    pub output_annotation: PathBuf,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, Error)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Num(u64),
    Text(String),
}

fn natural_key(s: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        let is_digit = c.is_ascii_digit();
        let end = rest
            .find(|ch: char| ch.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        chunks.push(match head.parse::<u64>() {
            Ok(n) if is_digit => Chunk::Num(n),
            _ => Chunk::Text(head.to_string()),
        });
        rest = tail;
    }
    chunks
}

/// `Template2_Instance9` sorts before `Template2_Instance10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b)).then_with(|| a.cmp(b))
}

fn find_template(images_dir: &Path, stem: &str) -> Option<PathBuf> {
    TEMPLATE_EXTENSIONS
        .iter()
        .map(|ext| images_dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}

/// List the documents of a dataset directory in natural order.
pub fn discover_jobs(opts: &BatchOptions) -> Result<Vec<DocumentJob>, Error> {
    let mut annotations: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(&opts.annotations_dir)? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json || !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        annotations.push((stem.to_string(), path));
    }
    annotations.sort_by(|a, b| natural_cmp(&a.0, &b.0));
    if let Some(limit) = opts.limit {
        annotations.truncate(limit);
    }

    let images_out = opts.output_dir.join("images");
    let annotations_out = opts.output_dir.join("annotations");
    Ok(annotations
        .into_iter()
        .enumerate()
        .map(|(index, (stem, annotation))| DocumentJob {
            index,
            template: opts
                .images_dir
                .as_deref()
                .and_then(|dir| find_template(dir, &stem)),
            output_image: images_out.join(format!("{stem}.jpeg")),
            output_annotation: annotations_out.join(format!("{stem}.json")),
            stem,
            annotation,
        })
        .collect())
}

fn job_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(index as u64)),
        None => StdRng::from_os_rng(),
    }
}

pub fn run_batch(opts: &BatchOptions, composer: &DocumentComposer) -> Result<BatchReport, Error> {
    let t0 = std::time::Instant::now();
    let jobs = discover_jobs(opts)?;
    log::info!(
        "Batch: {} documents in {}",
        jobs.len(),
        opts.annotations_dir.display()
    );

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = opts.jobs {
        builder = builder.num_threads(n);
    }
    let pool = builder
        .build()
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;

    let results: Vec<(String, Result<(), Error>)> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let mut rng = job_rng(opts.seed, job.index);
                let result = crate::synthesize_file(
                    &job.annotation,
                    job.template.as_deref(),
                    &job.output_image,
                    &job.output_annotation,
                    composer,
                    &mut rng,
                )
                .map(|_| ());
                (job.stem.clone(), result)
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for (stem, result) in results {
        match result {
            Ok(()) => report.succeeded.push(stem),
            Err(e) => {
                log::error!("{stem}: {e}");
                report.failed.push((stem, e));
            }
        }
    }

    log::info!(
        "Batch done: {} ok, {} failed in {:.1}s",
        report.succeeded.len(),
        report.failed.len(),
        t0.elapsed().as_secs_f64(),
    );
    Ok(report)
}
