//! `cap` and `map` command handlers.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;
use url::Url;

use wms_client::{
    fetch_capabilities, BatchOptions, BatchOrchestrator, ClientConfig, Credentials, HttpTransport,
    MapTransport, Service,
};

use crate::bbox_input;
use crate::profiles::{Profile, ProfileStore, DEFAULT_PROFILE};
use crate::{CapArgs, ConnectionArgs, MapArgs};

const DEFAULT_FILE_NAME: &str = "example";

fn client_config(connection: &ConnectionArgs) -> ClientConfig {
    let config = ClientConfig::default();
    match &connection.user {
        Some(user) => config.with_credentials(Credentials::new(
            user.as_str(),
            connection.password.clone().unwrap_or_default(),
        )),
        None => config,
    }
}

fn transport(config: &ClientConfig) -> Result<Arc<dyn MapTransport>> {
    let transport = HttpTransport::new(config).context("Failed to create HTTP client")?;
    Ok(Arc::new(transport))
}

/// Split `layer/style` entries into layer names and style assignments.
fn split_layer_entries(entries: &[String]) -> (Vec<&str>, Vec<(&str, &str)>) {
    let mut layers = Vec::with_capacity(entries.len());
    let mut styles = Vec::new();
    for entry in entries {
        match entry.split_once('/') {
            Some((layer, style)) => {
                layers.push(layer);
                styles.push((layer, style));
            }
            None => layers.push(entry.as_str()),
        }
    }
    (layers, styles)
}

/// Stored profile overridden by whatever was given on the command line.
fn effective_profile(stored: Profile, args: &MapArgs) -> Profile {
    let connection = &args.connection;
    let mut profile = Profile {
        url: connection.url.clone().unwrap_or(stored.url),
        version: connection.version.clone().unwrap_or(stored.version),
        format: args.format.clone().unwrap_or(stored.format),
        layers: args.layers.clone().unwrap_or(stored.layers),
        epsg: args.epsg.unwrap_or(stored.epsg),
        file_name: args.file_name.clone().unwrap_or(stored.file_name),
    };
    if profile.file_name.is_empty() {
        profile.file_name = DEFAULT_FILE_NAME.to_string();
    }
    profile
}

pub async fn cap(args: CapArgs, store: &ProfileStore) -> Result<()> {
    let stored = store.get(args.profile.as_deref().unwrap_or(DEFAULT_PROFILE));
    let url = args.connection.url.clone().unwrap_or(stored.url);
    let version = args.connection.version.clone().unwrap_or(stored.version);
    if url.is_empty() {
        bail!("url is empty");
    }
    let url = Url::parse(&url).with_context(|| format!("Invalid URL '{}'", url))?;

    let config = client_config(&args.connection);
    let transport = transport(&config)?;
    let capabilities = fetch_capabilities(transport.as_ref(), &url, &version)
        .await
        .context("Failed to get capabilities")?;

    let selected = args.formats || args.layers || args.epsg;
    if args.json {
        let value = if selected {
            let mut object = serde_json::Map::new();
            if args.formats {
                object.insert("formats".into(), json!(capabilities.formats()));
            }
            if args.layers {
                object.insert("layers".into(), json!(capabilities.layer_names()));
            }
            if args.epsg {
                object.insert("epsg".into(), json!(capabilities.epsg_codes()));
            }
            serde_json::Value::Object(object)
        } else {
            serde_json::to_value(&capabilities)?
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if !selected {
        println!("{}", capabilities);
    }
    if args.formats {
        for format in capabilities.formats() {
            println!("{}", format);
        }
    }
    if args.layers {
        for layer in capabilities.layer_names() {
            println!("{}", layer);
        }
    }
    if args.epsg {
        for code in capabilities.epsg_codes() {
            println!("{}", code);
        }
    }
    Ok(())
}

pub async fn map(args: MapArgs, store: &mut ProfileStore) -> Result<()> {
    let stored = store.get(args.profile.as_deref().unwrap_or(DEFAULT_PROFILE));
    let profile = effective_profile(stored, &args);
    if profile.url.is_empty() {
        bail!("url is empty");
    }

    let config = client_config(&args.connection)
        .with_output_dir(&args.output_dir)
        .with_max_concurrent_fetches(args.max_concurrent);
    let transport = transport(&config)?;

    let mut service = Service::new(Arc::clone(&transport));
    service.set_version(&profile.version).await?;
    service
        .set_url(&profile.url)
        .await
        .context("Failed to set URL")?;
    if !profile.format.is_empty() {
        service.set_format(&profile.format).context("Failed to set format")?;
    }
    let (layers, styles) = split_layer_entries(&profile.layers);
    if !layers.is_empty() {
        service.set_layers(&layers).context("Failed to set layers")?;
    }
    for (layer, style) in styles {
        service
            .set_style(layer, style)
            .context("Failed to set style")?;
    }
    if profile.epsg != 0 {
        service.set_epsg(profile.epsg).context("Failed to set EPSG")?;
    }

    if let Some(name) = &args.save {
        store.set(name, profile.clone());
        store.save()?;
        println!("Saving service: {}", name);
    }

    if args.dry_run {
        println!("{}", service);
        println!("File name: {}", profile.file_name);
        return Ok(());
    }

    let boxes = bbox_input::collect(args.bbox.as_deref(), args.bbox_file.as_deref())?;
    let options = BatchOptions {
        expand_percent: args.expand,
        cut: args.cut,
        width: args.width,
        height: args.height,
        scale: args.scale,
        dpi: args.dpi,
        file_name: profile.file_name.clone(),
    };

    let session = Arc::new(service.snapshot()?);
    let batch = BatchOrchestrator::new(transport, &config);
    let report = batch.run(session, &boxes, &options).await?;
    info!(files = report.files.len(), "Download finished");

    let output_dir = std::env::current_dir()
        .map(|dir| dir.join(&config.output_dir))
        .unwrap_or(config.output_dir);
    println!("Done. Your requested file is here: {}", output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Command};
    use clap::Parser;

    fn map_args(argv: &[&str]) -> MapArgs {
        let argv = ["wms", "map"].iter().chain(argv).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Map(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn stored() -> Profile {
        Profile {
            url: "http://stored.example/wms".into(),
            version: "1.1.1".into(),
            format: "image/png".into(),
            layers: vec!["base".into()],
            epsg: 4326,
            file_name: String::new(),
        }
    }

    #[test]
    fn test_split_layer_entries() {
        let entries = vec!["a/x".to_string(), "b".to_string(), "a/y".to_string()];
        let (layers, styles) = split_layer_entries(&entries);
        assert_eq!(layers, vec!["a", "b", "a"]);
        assert_eq!(styles, vec![("a", "x"), ("a", "y")]);
    }

    #[test]
    fn test_profile_values_are_used_without_flags() {
        let args = map_args(&["-u", "http://flag.example/wms"]);
        let profile = effective_profile(stored(), &args);
        assert_eq!(profile.url, "http://flag.example/wms");
        assert_eq!(profile.version, "1.1.1");
        assert_eq!(profile.layers, vec!["base"]);
        assert_eq!(profile.epsg, 4326);
        assert_eq!(profile.file_name, DEFAULT_FILE_NAME);
    }

    #[test]
    fn test_flags_override_profile() {
        let args = map_args(&[
            "-f",
            "image/jpeg",
            "-l",
            "roads/night",
            "-e",
            "3857",
            "-n",
            "out",
        ]);
        let profile = effective_profile(stored(), &args);
        assert_eq!(profile.format, "image/jpeg");
        assert_eq!(profile.layers, vec!["roads/night"]);
        assert_eq!(profile.epsg, 3857);
        assert_eq!(profile.file_name, "out");
    }

    #[test]
    fn test_client_config_credentials() {
        let args = map_args(&["--user", "u", "--password", "p"]);
        let config = client_config(&args.connection);
        let credentials = config.credentials.expect("credentials set");
        assert_eq!(credentials.user, "u");
        assert_eq!(credentials.password, "p");
    }
}
