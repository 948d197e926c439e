// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Zip extraction into a build workspace.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use pf_core::ExtractionMode;
use zip::ZipArchive;

use crate::workspace::WorkspaceError;

/// Unpack a zip archive held in memory into `dest`.
///
/// Entries whose names would escape `dest` are rejected outright rather
/// than skipped. Returns the number of files written.
pub fn unpack_zip(bytes: &[u8], mode: ExtractionMode, dest: &Path) -> Result<usize, WorkspaceError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| WorkspaceError::Archive(e.to_string()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| WorkspaceError::Archive(e.to_string()))?;
        let rel = entry
            .enclosed_name()
            .map(|p| normalize(&p))
            .ok_or_else(|| WorkspaceError::UnsafeEntry(entry.name().to_string()))?;
        entries.push((i, rel, entry.is_dir()));
    }

    let strip = match mode {
        ExtractionMode::Preserve => None,
        ExtractionMode::StripRoot => common_root(&entries),
    };

    let mut written = 0;
    for (i, rel, is_dir) in entries {
        let rel = if strip.is_some() { rel.components().skip(1).collect::<PathBuf>() } else { rel };
        if rel.as_os_str().is_empty() {
            continue;
        }
        let out = dest.join(&rel);
        if is_dir {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut entry = archive.by_index(i).map_err(|e| WorkspaceError::Archive(e.to_string()))?;
        let mut file = File::create(&out)?;
        std::io::copy(&mut entry, &mut file)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out, fs::Permissions::from_mode(mode & 0o777))?;
            }
        }
        written += 1;
    }
    Ok(written)
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// The single top-level directory every entry lives under, if there is one
/// and at least one entry sits below it.
fn common_root(entries: &[(usize, PathBuf, bool)]) -> Option<OsString> {
    let mut root: Option<OsString> = None;
    let mut nested = false;
    for (_, rel, is_dir) in entries {
        let mut components = rel.components();
        let first = match components.next() {
            Some(Component::Normal(first)) => first.to_os_string(),
            _ => continue,
        };
        let has_more = components.next().is_some();
        if !has_more && !is_dir {
            // A file at the top level means there is no wrapper directory
            return None;
        }
        nested |= has_more;
        match &root {
            Some(existing) if existing != &first => return None,
            Some(_) => {}
            None => root = Some(first),
        }
    }
    if nested {
        root
    } else {
        None
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
