use crate::commands::{CmdMessage, CmdResult, FomPaths};
use crate::config::FomConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(paths: &FomPaths, action: ConfigAction) -> Result<CmdResult> {
    let dir = &paths.config_dir;
    match action {
        ConfigAction::ShowAll => {
            let config = FomConfig::load(dir)?;
            Ok(CmdResult::default()
                .with_config(config)
                .with_search_path(paths.search_path.clone()))
        }
        ConfigAction::ShowKey(key) => {
            let config = FomConfig::load(dir)?;
            let mut result = CmdResult::default();
            match config.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(val)),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = FomConfig::load(dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut result = CmdResult::default();
                result.add_message(CmdMessage::error(e));
                return Ok(result);
            }
            config.save(dir)?;
            let display_val = config.get(&key).unwrap_or_else(|| value.clone());
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!(
                "{} set to {}",
                key, display_val
            )));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> FomPaths {
        FomPaths {
            config_dir: temp.path().to_path_buf(),
            search_path: vec![PathBuf::from("/opt/foms")],
        }
    }

    #[test]
    fn test_show_all_includes_search_path() {
        let temp = TempDir::new().unwrap();
        let res = run(&paths(&temp), ConfigAction::ShowAll).unwrap();
        assert_eq!(res.config, Some(FomConfig::default()));
        assert_eq!(res.search_path, vec![PathBuf::from("/opt/foms")]);
    }

    #[test]
    fn test_set_then_show_key() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);

        let res = run(
            &paths,
            ConfigAction::Set("roots.output".into(), "/data/out".into()),
        )
        .unwrap();
        assert_eq!(res.messages[0].level, MessageLevel::Success);

        let res = run(&paths, ConfigAction::ShowKey("roots.output".into())).unwrap();
        assert_eq!(res.messages[0].content, "/data/out");
    }

    #[test]
    fn test_unknown_key() {
        let temp = TempDir::new().unwrap();
        let res = run(&paths(&temp), ConfigAction::Set("nope".into(), "x".into())).unwrap();
        assert_eq!(res.messages[0].level, MessageLevel::Error);
        assert!(!temp.path().join("config.json").exists());
    }
}
