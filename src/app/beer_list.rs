use crate::error::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Beer names from newline-delimited text. Blank lines and `#` comments are
/// ignored; repeated names keep their first position.
pub fn parse_beer_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

pub fn read_beer_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_beer_list(&content))
}

/// Venue label for a beer file: the part of the file stem after its last
/// underscore, e.g. `beers_monks.txt` -> `monks`.
pub fn venue_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.rsplit('_').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn skips_blanks_comments_and_duplicates() {
        let beers = parse_beer_list("Heady Topper\n\n  # on deck\nJulius  \nHeady Topper\n   \n");
        assert_eq!(beers, vec!["Heady Topper".to_string(), "Julius".to_string()]);
    }

    #[test]
    fn venue_label_uses_last_underscore_part() {
        assert_eq!(venue_label(&PathBuf::from("lists/beers_monks.txt")), "monks");
        assert_eq!(venue_label(&PathBuf::from("fridge")), "fridge");
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tonight_home.txt");
        std::fs::write(&path, "Test Beer\n").unwrap();
        assert_eq!(read_beer_file(&path).unwrap(), vec!["Test Beer".to_string()]);
    }
}
