use std::{collections::HashMap, path::PathBuf};


/// Name of the settings file inside the base data directory.
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "locker.toml";


/// Returns the root of the per-user storage layout:
/// `C:/utilities` on Windows, `~/utilities` everywhere else.
///
/// Falls back to `./utilities` when no home directory can be determined.
pub fn default_base_data_directory() -> PathBuf {
    if cfg!(windows) {
        return PathBuf::from("C:/utilities");
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("utilities")
}


/// Returns the default configuration filepath, which is at
/// `{base data directory}/locker.toml`. The file does not have to exist.
pub fn get_default_configuration_file_path() -> PathBuf {
    default_base_data_directory().join(DEFAULT_CONFIGURATION_FILE_NAME)
}


#[must_use = "function returns the modified path"]
pub fn replace_placeholders_in_path<S>(
    original_path: S,
    placeholders: HashMap<&'static str, String>,
) -> PathBuf
where
    S: Into<String>,
{
    let mut path_string: String = original_path.into();

    for (key, value) in placeholders.into_iter() {
        path_string = path_string.replace(key, &value);
    }

    PathBuf::from(path_string)
}
