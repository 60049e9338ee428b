use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Bus {
    pub upstream_url: String,
    pub snapshot_path: String,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Media {
    pub dir: String,
    pub public_base_url: String,
    pub max_upload_bytes: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub bus: Bus,
    pub media: Media,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Optional settings.toml, checked in the working directory and the
        // crate directory for development runs
        let config_file_name = "settings.toml";
        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }
        let dev_path = PathBuf::from("sirius-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "sirius.db")?
            .set_default(
                "bus.upstream_url",
                "https://api2.gpsmobile.net/api/rep-actual/ultimo-avl/d6871041==",
            )?
            .set_default("bus.snapshot_path", "bus-snapshot.xml")?
            .set_default("bus.poll_interval_secs", 15)?
            .set_default("media.dir", "media")?
            .set_default("media.public_base_url", "/media")?
            .set_default("media.max_upload_bytes", 10 * 1024 * 1024)?;

        // Environment variables take highest priority
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(url) = std::env::var("BUS_UPSTREAM_URL") {
            builder = builder.set_override("bus.upstream_url", url)?;
        }
        if let Ok(path) = std::env::var("BUS_SNAPSHOT_PATH") {
            builder = builder.set_override("bus.snapshot_path", path)?;
        }
        if let Ok(dir) = std::env::var("MEDIA_DIR") {
            builder = builder.set_override("media.dir", dir)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }
}
