use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use anyhow::{Context, Result};
use regex::Regex;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

static MODEL_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^train_(\d{8}_\d{6})_HR([\d.]+)_NDCG([\d.]+)\.model")
        .expect("model file pattern is valid")
});

const TRAINED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// A trained model artifact found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    pub path: PathBuf,
    pub file_name: String,
    pub trained_at: PrimitiveDateTime,
    pub hr: Option<f64>,
    pub ndcg: Option<f64>,
}

impl ModelFile {
    /// Names only need to start with the convention; trailing suffixes are allowed.
    pub fn parse(dir: &Path, file_name: &str) -> Option<Self> {
        let caps = MODEL_FILE_PATTERN.captures(file_name)?;
        let trained_at = match PrimitiveDateTime::parse(&caps[1], TRAINED_AT_FORMAT) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!("[ModelFile::parse] invalid timestamp, skipped. file = {}, err = {}", file_name, e);
                return None;
            }
        };
        Some(ModelFile {
            path: dir.join(file_name),
            file_name: file_name.to_string(),
            trained_at,
            hr: caps[2].parse().ok(),
            ndcg: caps[3].parse().ok(),
        })
    }

    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        self.trained_at
            .cmp(&other.trained_at)
            .then_with(|| self.file_name.cmp(&other.file_name))
    }
}

/// All model artifacts directly inside `dir`, oldest first.
pub async fn scan_models(dir: &Path) -> Result<Vec<ModelFile>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("[scan_models] read_dir err. dir = {}", dir.display()))?;
    let mut models = Vec::new();
    loop {
        let next = entries
            .next_entry()
            .await
            .with_context(|| format!("[scan_models] next_entry err. dir = {}", dir.display()))?;
        let Some(entry) = next else {
            break;
        };
        let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Some(model) = ModelFile::parse(dir, &file_name) else {
            continue;
        };
        // metadata follows symlinks, so linked artifacts count as files
        match tokio::fs::metadata(&model.path).await {
            Ok(meta) if meta.is_file() => models.push(model),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("[scan_models] unreadable entry, skipped. path = {}, err = {}", model.path.display(), e);
            }
        }
    }
    models.sort_by(ModelFile::recency_cmp);
    Ok(models)
}

pub async fn find_latest(dir: &Path) -> Result<Option<PathBuf>> {
    let models = scan_models(dir).await
        .context("[find_latest] scan_models err.")?;
    Ok(models.into_iter().last().map(|m| m.path))
}
