use crate::api::FomApi;
use crate::commands::FomPaths;
use crate::config::FomConfig;
use crate::error::{FomError, Result};
use crate::store::fs::FsSource;
use directories::ProjectDirs;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

pub const FOM_HOME_ENV: &str = "FOM_HOME";
pub const FOM_PATH_ENV: &str = "FOM_PATH";

pub struct FomContext {
    pub api: FomApi<FsSource>,
}

/// Effective model search path.
///
/// Directories given on the command line replace the configured ones.
/// Otherwise `$FOM_PATH` entries come first, then `fom_path` from the
/// config, and `default` when both are empty.
pub fn resolve_search_path(
    cli: &[PathBuf],
    env_path: Option<OsString>,
    config: &FomConfig,
    default: PathBuf,
) -> Vec<PathBuf> {
    if !cli.is_empty() {
        return cli.to_vec();
    }
    let mut search_path: Vec<PathBuf> = env_path
        .map(|value| env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default();
    search_path.extend(config.fom_path.iter().cloned());
    if search_path.is_empty() {
        search_path.push(default);
    }
    search_path
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "fom", "fom")
        .ok_or_else(|| FomError::Config("Could not determine config dir".to_string()))
}

pub fn config_dir() -> Result<PathBuf> {
    match env::var_os(FOM_HOME_ENV) {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => Ok(project_dirs()?.config_dir().to_path_buf()),
    }
}

pub fn initialize(cli_search_path: &[PathBuf]) -> Result<FomContext> {
    let config_dir = config_dir()?;
    let config = FomConfig::load(&config_dir)?;
    let default = match env::var_os(FOM_HOME_ENV) {
        Some(home) if !home.is_empty() => PathBuf::from(home).join("foms"),
        _ => project_dirs()?.data_dir().join("foms"),
    };
    let search_path =
        resolve_search_path(cli_search_path, env::var_os(FOM_PATH_ENV), &config, default);

    let source = FsSource::new(search_path.clone());
    let paths = FomPaths {
        config_dir,
        search_path,
    };
    let api = FomApi::new(source, config, paths);
    Ok(FomContext { api })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(paths: &[&str]) -> FomConfig {
        FomConfig {
            fom_path: paths.iter().map(PathBuf::from).collect(),
            ..FomConfig::default()
        }
    }

    #[test]
    fn test_cli_overrides_everything() {
        let resolved = resolve_search_path(
            &[PathBuf::from("/cli")],
            Some(OsString::from("/env")),
            &config_with(&["/conf"]),
            PathBuf::from("/default"),
        );
        assert_eq!(resolved, vec![PathBuf::from("/cli")]);
    }

    #[test]
    fn test_env_is_prepended_to_config() {
        let env_value = env::join_paths(["/env1", "/env2"]).unwrap();
        let resolved = resolve_search_path(
            &[],
            Some(env_value),
            &config_with(&["/conf"]),
            PathBuf::from("/default"),
        );
        assert_eq!(
            resolved,
            vec![
                PathBuf::from("/env1"),
                PathBuf::from("/env2"),
                PathBuf::from("/conf")
            ]
        );
    }

    #[test]
    fn test_default_when_nothing_configured() {
        let resolved = resolve_search_path(
            &[],
            Some(OsString::new()),
            &FomConfig::default(),
            PathBuf::from("/default"),
        );
        assert_eq!(resolved, vec![PathBuf::from("/default")]);
    }
}
