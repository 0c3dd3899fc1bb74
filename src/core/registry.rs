// reframe/src/core/registry.rs
use crate::core::{EncoderConfig, EngineError, Result};
use crate::entity::{Image, SourceFormat};
use crate::processors::{Encoder, Loader};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const INPUT_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Name-keyed collection of decoded [`Image`] entities.
///
/// The registry only decodes and hands out unique mutable borrows; geometry
/// operations go through [`crate::geometry`] on the borrowed entity. Loader
/// failures surface as typed errors; deciding whether to skip or abort is
/// the caller's business (the batch runner below skips).
#[derive(Default)]
pub struct ImageRegistry {
    images: HashMap<String, Image>,
    loader: Loader,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            loader: Loader::new(),
        }
    }

    pub fn with_loader(loader: Loader) -> Self {
        Self {
            images: HashMap::new(),
            loader,
        }
    }

    /// Decode a file and store the entity keyed by its file name. Returns the
    /// key; an existing entity under the same name is replaced.
    pub fn insert_from_path(&mut self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| EngineError::UnreadableFile(path.to_path_buf()))?;

        let image = self.loader.load_path(path)?;
        self.images.insert(name.clone(), image);
        Ok(name)
    }

    /// Decode an in-memory buffer and store the entity under `name`.
    pub fn insert_from_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let image = self.loader.load_bytes(data)?;
        self.images.insert(name.to_string(), image);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Image> {
        self.images.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Image> {
        self.images.get_mut(name)
    }

    /// Remove and return an entity, releasing its buffer when dropped.
    pub fn remove(&mut self, name: &str) -> Option<Image> {
        self.images.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct BatchStats {
    pub processed: usize,
    pub errors: Vec<(PathBuf, String)>,
}

/// Applies one geometry operation to every image under a directory,
/// re-encoding the results into an output directory.
///
/// Entities are independent, so files are processed in parallel; a failed
/// file is logged and skipped rather than aborting the batch.
pub struct BatchRunner {
    loader: Loader,
    encoder: Encoder,
    thread_pool: Option<rayon::ThreadPool>,
}

impl BatchRunner {
    pub fn new(config: EncoderConfig, max_threads: usize) -> Result<Self> {
        let encoder = Encoder::new(config)?;

        let thread_pool = if max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .map_err(|e| {
                    EngineError::InvalidParameter(format!("failed to create thread pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            loader: Loader::new(),
            encoder,
            thread_pool,
        })
    }

    pub fn run<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        recursive: bool,
        format: Option<SourceFormat>,
        op: F,
    ) -> Result<BatchStats>
    where
        F: Fn(&mut Image) -> Result<()> + Sync,
    {
        self.validate_dirs(input_dir, output_dir)?;

        let paths = collect_image_paths(input_dir, recursive);
        if paths.is_empty() {
            log::warn!("no image files found in {}", input_dir.display());
            return Ok(BatchStats::default());
        }

        log::info!(
            "processing {} images from {}",
            paths.len(),
            input_dir.display()
        );
        std::fs::create_dir_all(output_dir)?;

        let pb = progress_bar(paths.len());
        let process = |path: &PathBuf| -> Result<()> {
            let mut image = self.loader.load_path(path)?;
            op(&mut image)?;

            let file_name = path
                .file_name()
                .ok_or_else(|| EngineError::UnreadableFile(path.clone()))?;
            let mut output_path = output_dir.join(file_name);
            if let Some(target) = format {
                output_path.set_extension(target.extension());
            }

            self.encoder.save(&image, &output_path, format, None, None)
        };

        let results: Vec<(PathBuf, Result<()>)> = if let Some(pool) = &self.thread_pool {
            pool.install(|| {
                paths
                    .par_iter()
                    .progress_with(pb.clone())
                    .map(|path| (path.clone(), process(path)))
                    .collect()
            })
        } else {
            paths
                .par_iter()
                .progress_with(pb.clone())
                .map(|path| (path.clone(), process(path)))
                .collect()
        };

        let mut stats = BatchStats::default();
        for (path, result) in results {
            match result {
                Ok(()) => stats.processed += 1,
                Err(e) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    stats.errors.push((path, e.to_string()));
                }
            }
        }

        pb.finish_with_message(format!(
            "processed {} images, {} failed",
            stats.processed,
            stats.errors.len()
        ));

        Ok(stats)
    }

    fn validate_dirs(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if !input_dir.is_dir() {
            return Err(EngineError::InvalidParameter(format!(
                "input path is not a directory: {}",
                input_dir.display()
            )));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(EngineError::InvalidParameter(format!(
                "output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        if input_dir == output_dir {
            return Err(EngineError::InvalidParameter(
                "input and output directories cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}

fn collect_image_paths(input_dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = if recursive {
        WalkDir::new(input_dir)
    } else {
        WalkDir::new(input_dir).max_depth(1)
    };

    walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| INPUT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
