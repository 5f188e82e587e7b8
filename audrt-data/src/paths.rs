use std::path::{Path, PathBuf};

/// CSV and JSON output paths for one session, timestamped so repeated runs
/// for the same participant never collide.
pub fn session_paths(data_dir: &Path, participant: &str) -> (PathBuf, PathBuf) {
    let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let stem = format!("{}_categorization_{}", sanitize(participant), stamp);
    (
        data_dir.join(format!("{stem}.csv")),
        data_dir.join(format!("{stem}.json")),
    )
}

/// Participant ids end up in filenames; keep only characters every
/// filesystem accepts.
fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_owned()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_share_a_stem_and_differ_by_extension() {
        let (csv, json) = session_paths(Path::new("data"), "p01");
        assert_eq!(csv.extension().unwrap(), "csv");
        assert_eq!(json.extension().unwrap(), "json");
        assert_eq!(csv.file_stem(), json.file_stem());
        assert!(csv.file_name().unwrap().to_str().unwrap().starts_with("p01_categorization_"));
    }

    #[test]
    fn hostile_participant_ids_are_sanitized() {
        assert_eq!(sanitize("p/0:1*"), "p-0-1-");
        assert_eq!(sanitize("  "), "anonymous");
        assert_eq!(sanitize("ok_id-3"), "ok_id-3");
    }
}
