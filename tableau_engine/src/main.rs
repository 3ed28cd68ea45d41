#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Tableau **
//! Console front end for the verb/action scene runtime

use tableau_engine::config::CONFIG_FILE;
use tableau_engine::data_paths::data_path;
use tableau_engine::style::GameStyle;
use tableau_engine::{load_config, load_world, run_repl};

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

use std::io::Write;

fn main() -> Result<()> {
    env_logger::init();
    let config = load_config(&data_path(CONFIG_FILE));
    info!("Start: loading world from '{}'...", config.world_file);
    let mut world = load_world(&config).context("while loading World")?;
    info!("World loaded successfully.");

    // clear the screen
    print!("\x1B[2J\x1B[H");
    std::io::stdout().flush()?;

    println!("{:^84}", world.title.to_uppercase().bright_yellow().underline());
    if let Some(player) = world.player_actor() {
        let desc = if player.desc.is_empty() { "yourself" } else { &player.desc };
        println!("\nYou are {}, {}\n", player.id.bold().bright_blue(), desc.description_style());
    }
    println!("{}", "Type 'help' for commands.".dimmed_style());

    info!("Starting the game!");
    world.start().context("while entering the initial scene")?;
    run_repl(&mut world, &config)
}
