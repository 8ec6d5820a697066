use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "vcalendar";
const CONFIG_FILE: &str = "config.toml";
const LOG_DIR: &str = "logs";

/// Picks the config file: CLI flag, then `VCALENDAR_CONFIG`, then the
/// platform config directory.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return absolutize(path);
	}

	if let Some(path) = env::var_os("VCALENDAR_CONFIG") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return absolutize(path);
		}
	}

	match config_dir() {
		Some(dir) => dir.join(CONFIG_FILE),
		None => absolutize(PathBuf::from("vcalendar.toml")),
	}
}

pub fn log_dir() -> PathBuf {
	state_dir().join(LOG_DIR)
}

fn config_dir() -> Option<PathBuf> {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return Some(PathBuf::from(path).join(APP_DIR));
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return Some(PathBuf::from(path).join(APP_DIR));
	}

	env::var_os("HOME").map(|path| PathBuf::from(path).join(".config").join(APP_DIR))
}

fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("VCALENDAR_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("state")
			.join(APP_DIR);
	}

	env::temp_dir().join(APP_DIR)
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use super::resolve_config_path;

	#[test]
	fn cli_path_wins_and_is_made_absolute() {
		let resolved = resolve_config_path(Some(PathBuf::from("some/dir/calendar.toml")));
		assert!(resolved.is_absolute());
		assert!(resolved.ends_with("some/dir/calendar.toml"));
	}
}
