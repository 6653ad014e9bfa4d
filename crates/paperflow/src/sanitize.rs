//! Log-safe rendering of document paths.

use std::path::Path;

/// The file name alone, for log lines and span fields. Scanner output
/// often carries non-UTF-8 names; those are shown lossily rather than
/// dropped.
pub fn redact_path(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => "<no file name>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_file_name_is_kept() {
        assert_eq!(
            redact_path(Path::new("/home/user/scans/input/letter1.pdf")),
            "letter1.pdf"
        );
    }

    #[test]
    fn test_root_has_no_file_name() {
        assert_eq!(redact_path(Path::new("/")), "<no file name>");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_shown_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"Rechnung_M\xfcller.pdf");
        assert_eq!(
            redact_path(&Path::new("/in").join(name)),
            "Rechnung_M\u{fffd}ller.pdf"
        );
    }
}
