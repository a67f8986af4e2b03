use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::model::config::SyncConfig;

pub fn cmd_init(vault: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_io::write_default_config(vault, args.force)?;
    let defaults = SyncConfig::default();

    println!("Wrote {}", path.display());
    println!(
        "  aggregator: {}/{}.md, section \"{}\"",
        defaults.aggregator.folder, defaults.aggregator.format, defaults.aggregator.heading
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_writes_config_once() {
        let tmp = TempDir::new().unwrap();
        cmd_init(tmp.path(), InitArgs { force: false }).unwrap();
        assert!(tmp.path().join(config_io::CONFIG_FILE).is_file());

        let err = cmd_init(tmp.path(), InitArgs { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        cmd_init(tmp.path(), InitArgs { force: true }).unwrap();
    }
}
