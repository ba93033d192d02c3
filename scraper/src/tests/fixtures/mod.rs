use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/tests/fixtures")
}

/// Load a saved OddsPark page by name
pub fn load_html_fixture(fixture_name: &str) -> String {
    let path = fixtures_dir().join(format!("{}.html", fixture_name));
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", path.display(), e))
}
