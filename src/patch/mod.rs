//! Applies edit requests to source files: line ranges, or whole method and
//! type declarations matched by text or by declaration id.

pub mod apply;
pub mod locate;

use crate::error::PatchError;
use crate::frontend::CSharpParser;
use crate::model::{ChangeKind, ChangeOutcome, ChangeStatus, EditRequest};
use crate::util;
use anyhow::Result;
use locate::DeclarationKind;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ChangeApplier {
    base_dir: PathBuf,
    parser: CSharpParser,
}

impl ChangeApplier {
    /// Relative file names in requests resolve against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            base_dir: base_dir.into(),
            parser: CSharpParser::new()?,
        })
    }

    /// Applies every request in order. A failed request is reported in its
    /// outcome and the next one is still attempted; only an empty batch is
    /// rejected as a whole.
    pub fn apply_changes(&mut self, batch: &[EditRequest]) -> Result<Vec<ChangeOutcome>, PatchError> {
        if batch.is_empty() {
            return Err(PatchError::invalid_request("batch contains no changes"));
        }
        let mut outcomes = Vec::with_capacity(batch.len());
        for (index, request) in batch.iter().enumerate() {
            let status = match self.apply_one(request) {
                Ok(bytes_written) => {
                    debug!(index, file = %request.file_name, bytes_written, "change applied");
                    ChangeStatus::Applied { bytes_written }
                }
                Err(err) => {
                    warn!(index, file = %request.file_name, "change failed: {err}");
                    ChangeStatus::Failed {
                        kind: err.kind(),
                        message: err.to_string(),
                    }
                }
            };
            outcomes.push(ChangeOutcome {
                index,
                file: request.file_name.clone(),
                change_type: request.change_type.clone(),
                status,
            });
        }
        Ok(outcomes)
    }

    /// Applies one request and returns the size of the written file.
    pub fn apply_one(&mut self, request: &EditRequest) -> Result<usize, PatchError> {
        let kind = ChangeKind::parse(&request.change_type)?;
        check_required_text(kind, request)?;

        let file = request.file_name.as_str();
        let path = self.resolve(file);
        if !path.is_file() {
            return Err(PatchError::FileNotFound(file.to_string()));
        }
        let text = std::fs::read_to_string(&path).map_err(|err| PatchError::io(file, err))?;
        let new_code = request.new_code.as_deref().unwrap_or_default();

        let updated = match kind {
            ChangeKind::Range => {
                let target = locate::locate_range(file, &text, request.start_line, request.end_line)?;
                apply::splice(&text, target, new_code)
            }
            ChangeKind::Method => self.replace(file, &text, DeclarationKind::Method, request)?,
            ChangeKind::Class => self.replace(file, &text, DeclarationKind::Type, request)?,
        };
        apply::write_atomic(&path, &updated).map_err(|err| PatchError::io(file, err))?;
        Ok(updated.len())
    }

    fn replace(
        &mut self,
        file: &str,
        text: &str,
        kind: DeclarationKind,
        request: &EditRequest,
    ) -> Result<String, PatchError> {
        let new_code = request.new_code.as_deref().unwrap_or_default();
        let code = apply::validate_replacement(&mut self.parser, kind, new_code, file)?;
        let tree = self.parser.parse_tree(text).ok_or_else(|| {
            PatchError::io(file, io::Error::new(io::ErrorKind::InvalidData, "file could not be parsed"))
        })?;
        let root = tree.root_node();
        let node = locate::locate_declaration(
            file,
            text,
            root,
            kind,
            request.original_code.as_deref(),
            request.target_id.as_deref(),
        )?;
        apply::replace_declaration(&mut self.parser, file, text, root.has_error(), node, kind, &code)
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Range edits need replacement text; declaration edits need replacement
/// text and something to find the declaration by.
fn check_required_text(kind: ChangeKind, request: &EditRequest) -> Result<(), PatchError> {
    if util::is_blank(request.new_code.as_deref()) {
        return Err(PatchError::invalid_request("new code is blank"));
    }
    let has_target = request
        .target_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    if kind != ChangeKind::Range && util::is_blank(request.original_code.as_deref()) && !has_target {
        return Err(PatchError::invalid_request("original code is blank"));
    }
    if request.file_name.trim().is_empty() {
        return Err(PatchError::invalid_request("file name is blank"));
    }
    Ok(())
}

/// Applies `batch` with relative paths resolved against `base_dir`.
pub fn apply_changes(base_dir: &Path, batch: &[EditRequest]) -> Result<Vec<ChangeOutcome>> {
    let mut applier = ChangeApplier::new(base_dir)?;
    Ok(applier.apply_changes(batch)?)
}
