use std::path::PathBuf;

/// A fresh directory under the system temp dir, unique per process and call.
pub(crate) fn create_temp_dir(prefix: &str) -> PathBuf {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), stamp));
    std::fs::create_dir_all(&path).unwrap();
    path
}
