use std::{env, io, path::PathBuf};

use anyhow::Result;

/// Resolves the directory timewise keeps its data in. `TIMEWISE_DIR` wins,
/// then the platform state directory.
pub fn create_application_default_path() -> Result<PathBuf> {
    if let Ok(dir) = env::var("TIMEWISE_DIR") {
        let path = PathBuf::from(dir);
        ensure_dir(path.clone())?;
        return Ok(path);
    }

    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push("timewise");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("timewise");
            path
        }
    };

    ensure_dir(path)
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
