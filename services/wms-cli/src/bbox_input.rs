//! Bounding boxes from the command line or a file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use wms_common::BoundingBox;

/// Parse `minx,miny,maxx,maxy`. Whitespace around the numbers is ignored.
pub fn parse_bbox(text: &str) -> Result<BoundingBox> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    BoundingBox::from_wms_string(&compact).with_context(|| format!("invalid bbox '{}'", text))
}

/// One box per line; blank lines are skipped.
pub fn parse_bbox_lines(contents: &str) -> Result<Vec<BoundingBox>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| parse_bbox(line).with_context(|| format!("line {}", n + 1)))
        .collect()
}

pub fn read_bbox_file(path: &Path) -> Result<Vec<BoundingBox>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bbox file {}", path.display()))?;
    parse_bbox_lines(&contents).with_context(|| format!("bbox file {}", path.display()))
}

/// Boxes requested by `--bbox` or `--bbox-file`; one of them is required.
pub fn collect(bbox: Option<&str>, bbox_file: Option<&Path>) -> Result<Vec<BoundingBox>> {
    match (bbox, bbox_file) {
        (Some(text), _) => Ok(vec![parse_bbox(text)?]),
        (None, Some(path)) => read_bbox_file(path),
        (None, None) => bail!("no bounding box given: use --bbox or --bbox-file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("365000, 5620000, 370000, 5625000").unwrap();
        assert_eq!(bbox, BoundingBox::new(365000.0, 5620000.0, 370000.0, 5625000.0));
        assert_eq!(
            parse_bbox("-10.5,-5,10,5").unwrap(),
            BoundingBox::new(-10.5, -5.0, 10.0, 5.0)
        );
    }

    #[test]
    fn test_wrong_arity() {
        let err = parse_bbox("1,2,3").unwrap_err();
        assert!(err.to_string().contains("invalid bbox"));
        assert!(parse_bbox("1,2,3,4,5").is_err());
        assert!(parse_bbox("1,2,x,4").is_err());
    }

    #[test]
    fn test_lines_skip_blanks() {
        let boxes = parse_bbox_lines("0,0,1,1\n\n  \n1,1,2,2\n").unwrap();
        assert_eq!(
            boxes,
            vec![BoundingBox::new(0.0, 0.0, 1.0, 1.0), BoundingBox::new(1.0, 1.0, 2.0, 2.0)]
        );
    }

    #[test]
    fn test_bad_line_names_line_number() {
        let err = parse_bbox_lines("0,0,1,1\n1,1,2\n").unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("line 2"));
        assert!(message.contains("invalid bbox"));
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boxes.txt");
        fs::write(&path, "0,0,1,1\n2,2,3,3\n").unwrap();
        assert_eq!(read_bbox_file(&path).unwrap().len(), 2);
        assert!(read_bbox_file(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_collect_requires_a_box() {
        assert!(collect(None, None).is_err());
        assert_eq!(collect(Some("0,0,1,1"), None).unwrap().len(), 1);
    }
}
