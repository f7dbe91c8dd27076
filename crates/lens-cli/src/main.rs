mod config;

use tracing::{info, warn};

use lens_db::Database;
use lens_db::diagram;

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lens=debug,lens_db=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    run(&config)
}

fn run(config: &Config) -> anyhow::Result<()> {
    // Init database (creates the schema on first run)
    let db = Database::open(&config.db_path)?;

    if config.render_diagram {
        render_diagram_best_effort(&db, config);
    }

    let users: i64 = db.with_conn(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0))?)
    })?;
    info!("Schema ready at {} ({} users)", config.db_path.display(), users);

    Ok(())
}

/// A missing Graphviz install must not stop start-up: failures are logged and dropped.
fn render_diagram_best_effort(db: &Database, config: &Config) {
    if let Err(e) = diagram::render_er(db, &config.diagram_path, &config.dot_bin) {
        warn!("Could not render ER diagram: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path, dot_bin: &str) -> Config {
        Config {
            db_path: dir.join("lens.db"),
            diagram_path: dir.join("diagram.png"),
            dot_bin: dot_bin.to_string(),
            render_diagram: true,
        }
    }

    #[test]
    fn startup_survives_missing_diagram_tool() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "lens-no-such-binary");

        run(&config).unwrap();

        assert!(config.db_path.exists());
        assert!(!config.diagram_path.exists());
        // The DOT source is written before the tool is invoked.
        assert!(dir.path().join("diagram.dot").exists());
    }

    #[test]
    fn startup_skips_diagram_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            render_diagram: false,
            ..config_in(dir.path(), "lens-no-such-binary")
        };

        run(&config).unwrap();

        assert!(config.db_path.exists());
        assert!(!dir.path().join("diagram.dot").exists());
    }
}
