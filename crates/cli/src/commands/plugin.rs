// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf plugin` - Plugin registration commands

use anyhow::Result;
use clap::{Args, Subcommand};
use pf_core::{Language, PluginId, PluginRecord};

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, format_time_ago, handle_list, write_table, OutputFormat};

#[derive(Args)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommand,
}

#[derive(Subcommand)]
pub enum PluginCommand {
    /// Register a new plugin
    Add {
        /// Display name of the plugin
        filename: String,
        /// Source language: rust or js
        #[arg(short, long, default_value = "rust")]
        language: Language,
    },
    /// List registered plugins
    List,
    /// Forget a plugin and delete its stored build products
    Rm {
        /// Plugin ID
        id: String,
    },
    /// Change the display name of a plugin
    Rename {
        /// Plugin ID
        id: String,
        /// New display name
        filename: String,
    },
}

pub async fn handle(
    command: PluginCommand,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        PluginCommand::Add { filename, language } => {
            let plugin = client.add_plugin(&filename, language).await?;
            format_or_json(format, &plugin, || {
                println!("Plugin '{}' registered: {}", plugin.filename, plugin.plugin_id);
            })?;
        }
        PluginCommand::List => {
            let mut plugins = client.list_plugins().await?;
            plugins.sort_by(|a, b| a.filename.cmp(&b.filename));
            handle_list(format, &plugins, "No plugins", |items, out| {
                let rows: Vec<Vec<String>> = items.iter().map(plugin_row).collect();
                write_table(out, &["ID", "NAME", "LANG", "LAST BUILD", "UPDATED"], &rows);
            })?;
        }
        PluginCommand::Rm { id } => {
            let plugin = client.remove_plugin(&PluginId::from(id)).await?;
            format_or_json(format, &plugin, || {
                println!("Plugin '{}' removed", plugin.filename);
            })?;
        }
        PluginCommand::Rename { id, filename } => {
            let plugin = client.rename_plugin(&PluginId::from(id), &filename).await?;
            format_or_json(format, &plugin, || {
                println!("Plugin {} renamed to '{}'", plugin.plugin_id, plugin.filename);
            })?;
        }
    }
    Ok(())
}

fn plugin_row(plugin: &PluginRecord) -> Vec<String> {
    let last = match &plugin.last_artifact_name {
        Some(name) => name.clone(),
        None => color::muted("-"),
    };
    vec![
        plugin.plugin_id.to_string(),
        plugin.filename.clone(),
        plugin.language.to_string(),
        last,
        format_time_ago(plugin.updated_at_ms),
    ]
}
