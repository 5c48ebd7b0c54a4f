use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;
use zip::ZipArchive;
use zip::write::SimpleFileOptions;

use crate::domain::{GeneSymbol, NarrativeResult, RelevantPathway};
use crate::error::DiscoError;

pub const RELEVANT_PATHWAYS_PREFIX: &str = "relevant_pathways_";
pub const DETAILED_PATHWAYS_PREFIX: &str = "detailed_pathways_";
pub const ALL_RELEVANT_PATHWAYS: &str = "all_relevant_pathways.txt";
pub const ALL_RELEVANT_GENES: &str = "all_relevant_genes.txt";
pub const ALL_DETAILED_PATHWAYS: &str = "all_detailed_pathways.txt";
pub const RUN_LOG: &str = "normal_output.log";
pub const ERROR_LOG: &str = "error_output.log";
pub const DEFAULT_ARCHIVE: &str = "results.zip";

#[derive(Debug)]
pub struct BatchWorkspace {
    root: Utf8PathBuf,
    output_lock: Mutex<()>,
}

impl BatchWorkspace {
    pub fn create(base: &Utf8Path) -> Result<Self, DiscoError> {
        fs::create_dir_all(base.as_std_path())
            .map_err(|err| DiscoError::Filesystem(format!("create {base}: {err}")))?;
        let dir = Builder::new()
            .prefix("batch-")
            .tempdir_in(base.as_std_path())
            .map_err(|err| DiscoError::Filesystem(format!("create batch dir in {base}: {err}")))?;
        let root = Utf8PathBuf::from_path_buf(dir.keep())
            .map_err(|_| DiscoError::Filesystem("invalid batch path".to_string()))?;
        Ok(Self::at(root))
    }

    pub fn at(root: Utf8PathBuf) -> Self {
        Self {
            root,
            output_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn relevant_pathways_path(&self, gene: &GeneSymbol) -> Utf8PathBuf {
        self.root
            .join(format!("{RELEVANT_PATHWAYS_PREFIX}{}.txt", gene.file_stem()))
    }

    pub fn detailed_pathways_path(&self, gene: &GeneSymbol) -> Utf8PathBuf {
        self.root
            .join(format!("{DETAILED_PATHWAYS_PREFIX}{}.txt", gene.file_stem()))
    }

    pub fn run_log_path(&self) -> Utf8PathBuf {
        self.root.join(RUN_LOG)
    }

    pub fn error_log_path(&self) -> Utf8PathBuf {
        self.root.join(ERROR_LOG)
    }

    pub fn append_relevant_pathways(
        &self,
        gene: &GeneSymbol,
        records: &[RelevantPathway],
    ) -> Result<(), DiscoError> {
        let mut content = String::new();
        for record in records {
            content.push_str(&record.to_record_line());
            content.push('\n');
        }
        self.append(&self.relevant_pathways_path(gene), &content)
    }

    pub fn append_narrative(&self, result: &NarrativeResult) -> Result<(), DiscoError> {
        self.append(
            &self.detailed_pathways_path(&result.gene),
            &result.to_report_block(),
        )
    }

    fn append(&self, path: &Utf8Path, content: &str) -> Result<(), DiscoError> {
        let _guard = self
            .output_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_std_path())
            .map_err(|err| DiscoError::Filesystem(format!("open {path}: {err}")))?;
        file.write_all(content.as_bytes())
            .map_err(|err| DiscoError::Filesystem(format!("write {path}: {err}")))
    }

    pub fn files_with_prefix(&self, prefix: &str) -> Result<Vec<Utf8PathBuf>, DiscoError> {
        let mut files = Vec::new();
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| DiscoError::Filesystem(format!("read {}: {err}", self.root)))?;
        for entry in entries {
            let entry = entry.map_err(|err| DiscoError::Filesystem(err.to_string()))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_file = entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
            if is_file && name.starts_with(prefix) && name.ends_with(".txt") {
                files.push(self.root.join(name));
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn concatenate(&self, output_name: &str, prefix: &str) -> Result<Utf8PathBuf, DiscoError> {
        let output = self.root.join(output_name);
        let mut content = String::new();
        for path in self.files_with_prefix(prefix)? {
            content.push_str(&read_file(&path)?);
        }
        fs::write(output.as_std_path(), content)
            .map_err(|err| DiscoError::Filesystem(format!("write {output}: {err}")))?;
        Ok(output)
    }

    pub fn concatenate_first_column(
        &self,
        output_name: &str,
        prefix: &str,
    ) -> Result<Utf8PathBuf, DiscoError> {
        let output = self.root.join(output_name);
        let mut seen = HashSet::new();
        let mut content = String::new();
        for path in self.files_with_prefix(prefix)? {
            for line in read_file(&path)?.lines() {
                let first = line.split(',').next().unwrap_or_default();
                if first.is_empty() {
                    continue;
                }
                if seen.insert(first.to_string()) {
                    content.push_str(first);
                    content.push('\n');
                }
            }
        }
        fs::write(output.as_std_path(), content)
            .map_err(|err| DiscoError::Filesystem(format!("write {output}: {err}")))?;
        Ok(output)
    }

    pub fn package(&self, archive_name: &str) -> Result<Utf8PathBuf, DiscoError> {
        let archive_path = self.root.join(archive_name);
        let mut members = Vec::new();
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| DiscoError::Filesystem(format!("read {}: {err}", self.root)))?;
        for entry in entries {
            let entry = entry.map_err(|err| DiscoError::Filesystem(err.to_string()))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_file = entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
            if is_file && (name.ends_with(".txt") || name.ends_with(".log")) {
                members.push(name);
            }
        }
        members.sort();

        let file = fs::File::create(archive_path.as_std_path())
            .map_err(|err| DiscoError::Filesystem(format!("create {archive_path}: {err}")))?;
        let mut writer = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for name in &members {
            writer
                .start_file(name.as_str(), options)
                .map_err(|err| DiscoError::Filesystem(err.to_string()))?;
            let mut source = fs::File::open(self.root.join(name).as_std_path())
                .map_err(|err| DiscoError::Filesystem(format!("open {name}: {err}")))?;
            io::copy(&mut source, &mut writer)
                .map_err(|err| DiscoError::Filesystem(err.to_string()))?;
        }
        writer
            .finish()
            .map_err(|err| DiscoError::Filesystem(err.to_string()))?;
        Ok(archive_path)
    }
}

pub fn archive_entries(zip_path: &Utf8Path) -> Result<Vec<String>, DiscoError> {
    let file = fs::File::open(zip_path.as_std_path())
        .map_err(|err| DiscoError::Filesystem(format!("open zip {zip_path}: {err}")))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| DiscoError::Filesystem(err.to_string()))?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| DiscoError::Filesystem(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        io::copy(&mut entry, &mut io::sink())
            .map_err(|err| DiscoError::Filesystem(err.to_string()))?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}

fn read_file(path: &Utf8Path) -> Result<String, DiscoError> {
    fs::read_to_string(path.as_std_path())
        .map_err(|err| DiscoError::Filesystem(format!("read {path}: {err}")))
}
