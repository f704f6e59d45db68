//! Filename template resolution and collision-safe uniquification
//!
//! Local filenames are derived in two steps: [`resolve`] expands a template
//! (`%org`, `%company`, chrono date directives) against one filing's
//! metadata, and [`uniquify`] turns the result into a path no existing file
//! occupies, appending an alphabetic disambiguator on collision.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::FilingReference;

/// Maximum number of suffix attempts before giving up
const MAX_SUFFIX_ATTEMPTS: u32 = 9999;

/// How [`uniquify`] decides whether a candidate path is taken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniquifyMode {
    /// The literal file must not exist
    Exact,
    /// No file matching `<candidate>*` may exist
    ///
    /// Used when the caller appends a suffix afterward, so only the shared
    /// prefix can be checked — the decomposer derives several sibling files
    /// from one resolved prefix.
    Pattern,
}

/// Expand a filename template against one filing's metadata
///
/// Tokens:
/// - `%org` — `<segment 2>_<segment 3 without extension>` of the identifier
///   split on `/` (e.g. `edgar/data/1645148/0001213900-15-004775.txt` yields
///   `1645148_0001213900-15-004775`)
/// - `%company` — company name lowercased, with spaces, commas, periods, and
///   both slash characters stripped
/// - any other `%<char>` — a chrono date directive applied to the filing date
///
/// The template is scanned once left to right; directive output is never
/// re-scanned. Invalid date directives surface as [`Error::Filename`].
pub fn resolve(template: &str, filing: &FilingReference) -> Result<String> {
    let parts: Vec<&str> = filing.identifier.split('/').collect();
    let (dir_part, file_part) = match (parts.get(2), parts.get(3)) {
        (Some(dir), Some(file)) => (*dir, *file),
        _ => {
            return Err(Error::Filename {
                message: format!(
                    "identifier '{}' has too few path segments for %org",
                    filing.identifier
                ),
            });
        }
    };
    let org = format!(
        "{}_{}",
        dir_part,
        file_part.split('.').next().unwrap_or(file_part)
    );

    let company: String = filing
        .company_name
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | '.' | '/' | '\\'))
        .collect::<String>()
        .to_lowercase();

    let mut out = String::with_capacity(template.len() + company.len());
    let mut rest = template;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix("org") {
            out.push_str(&org);
            rest = tail;
        } else if let Some(tail) = after.strip_prefix("company") {
            out.push_str(&company);
            rest = tail;
        } else if let Some(c) = after.chars().next() {
            let directive = format!("%{c}");
            write!(out, "{}", filing.date_filed.format(&directive)).map_err(|_| {
                Error::Filename {
                    message: format!("invalid date directive %{c} in template '{template}'"),
                }
            })?;
            rest = &after[c.len_utf8()..];
        } else {
            return Err(Error::Filename {
                message: format!("template '{template}' ends with a bare %"),
            });
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Return a path no existing file occupies, starting from `base`
///
/// On collision, a bijective base-26 alphabetic disambiguator (0→A, 1→B, …,
/// 26→AA) is inserted before the extension and the check repeats with the
/// next counter value. Idempotent as long as no new files appear between
/// calls.
///
/// The existence check polls the filesystem, so the check-then-create gap is
/// only safe while decomposition runs sequentially; a parallel decomposer
/// would need a single in-process name registry instead.
pub fn uniquify(base: impl AsRef<Path>, mode: UniquifyMode) -> Result<PathBuf> {
    let base_str = base.as_ref().to_string_lossy().into_owned();
    let (pre, suf) = split_extension(&base_str);

    let mut candidate = base_str.clone();
    let mut counter: u32 = 0;
    while is_taken(&candidate, mode)? {
        if counter >= MAX_SUFFIX_ATTEMPTS {
            return Err(Error::Filename {
                message: format!(
                    "could not find a unique name for '{base_str}' after {MAX_SUFFIX_ATTEMPTS} attempts"
                ),
            });
        }
        candidate = format!("{pre}{}{suf}", alpha_suffix(counter));
        counter += 1;
    }
    Ok(PathBuf::from(candidate))
}

fn is_taken(candidate: &str, mode: UniquifyMode) -> Result<bool> {
    match mode {
        UniquifyMode::Exact => Ok(Path::new(candidate).is_file()),
        UniquifyMode::Pattern => {
            let pattern = format!("{}*", glob::Pattern::escape(candidate));
            let mut matches = glob::glob(&pattern).map_err(|e| Error::Filename {
                message: format!("invalid uniquify pattern '{pattern}': {e}"),
            })?;
            // An unreadable entry still counts as taken
            Ok(matches.next().is_some())
        }
    }
}

/// Split a path string into (everything before the extension, ".ext")
///
/// Only the final path component is inspected; a leading dot does not count
/// as an extension.
fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map(|p| p + 1).unwrap_or(0);
    let name = &path[name_start..];
    match name.rfind('.') {
        Some(dot) if dot > 0 => path.split_at(name_start + dot),
        _ => (path, ""),
    }
}

/// Encode a counter as a bijective base-26 alphabetic string
///
/// 0→"A", 25→"Z", 26→"AA", 27→"AB", …
fn alpha_suffix(n: u32) -> String {
    let mut digits = Vec::new();
    let mut x = n;
    loop {
        digits.push(b'A' + (x % 26) as u8);
        if x / 26 == 0 {
            break;
        }
        x = x / 26 - 1;
    }
    digits.reverse();
    // Always A-Z bytes
    String::from_utf8_lossy(&digits).into_owned()
}
