use flanker_core::Result;
use std::path::Path;

pub const INSERT_MARKER: &str = "<--insert-->";

/// Reads an instruction file: UTF-8, `#` lines are comments, and a line
/// starting with [`INSERT_MARKER`] is replaced by `insert` (or dropped).
pub fn read_message(path: impl AsRef<Path>, insert: Option<&str>) -> Result<String> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Ok(render_message(&text, insert))
}

pub fn render_message(text: &str, insert: Option<&str>) -> String {
    let mut msg = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.starts_with('#') {
            continue;
        }
        if line.starts_with(INSERT_MARKER) {
            if let Some(insert) = insert.filter(|s| !s.is_empty()) {
                msg.push_str(insert);
            }
            continue;
        }
        msg.push_str(line);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_fills_insert() {
        let text = "# header\nHello\n<--insert-->\nPress space.\n";
        assert_eq!(
            render_message(text, Some("Block 1 of 2\n")),
            "Hello\nBlock 1 of 2\nPress space.\n"
        );
        assert_eq!(render_message(text, None), "Hello\nPress space.\n");
        assert_eq!(render_message(text, Some("")), "Hello\nPress space.\n");
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "#c\nWitaj \u{1F600}\n").unwrap();
        assert_eq!(read_message(&path, None).unwrap(), "Witaj \u{1F600}\n");
        assert!(read_message(dir.path().join("missing.txt"), None).is_err());
    }
}
