//! Binary entrypoint for the RedMUD world tool.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `area create|show|set|delete` - manage areas
//! - `room add|show|set|delete` - manage rooms
//! - `connect`, `disconnect`, `unlink` - manage exits
//! - `seed <file>` - load areas, rooms and exits from JSON
//! - `flush` - wipe the world store
//!
//! See the library crate docs for module-level details: `redmud::`.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use redmud::config::Config;
use redmud::world::keys::parse_room_number;
use redmud::world::{
    apply_seed, load_seed_from_json, AreaRecord, AreaUpdate, Exit, NewRoom, RoomDeletion, RoomId,
    RoomUpdate, SledStore, SledStoreBuilder, World,
};

#[derive(Parser)]
#[command(name = "redmud")]
#[command(about = "Manage the areas and rooms of a RedMUD world")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Area records
    #[command(subcommand)]
    Area(AreaCommand),
    /// Room records
    #[command(subcommand)]
    Room(RoomCommand),
    /// Connect two rooms both ways
    Connect {
        /// Source room as AREA:NUMBER
        from: String,
        /// Command leading from the source to the destination
        command: String,
        /// Destination room as AREA:NUMBER
        to: String,
        /// Command leading back; one-way exit when omitted
        #[arg(long)]
        back: Option<String>,
    },
    /// Remove every exit between two rooms
    Disconnect { first: String, second: String },
    /// Remove a single exit from a room
    Unlink { room: String, command: String },
    /// Load a JSON world seed
    Seed { file: String },
    /// Delete every record in the world store
    Flush {
        /// Required to actually flush
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AreaCommand {
    Create {
        code: String,
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    Show { code: String },
    Set {
        code: String,
        #[command(flatten)]
        fields: TextFields,
    },
    Delete { code: String },
}

#[derive(Subcommand)]
enum RoomCommand {
    Add {
        area: String,
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    Show { area: String, number: String },
    Set {
        area: String,
        number: String,
        #[command(flatten)]
        fields: TextFields,
    },
    Delete { area: String, number: String },
}

#[derive(Args)]
struct TextFields {
    #[arg(short, long)]
    name: Option<String>,
    #[arg(short, long)]
    description: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            println!("Wrote default configuration to {}", cli.config);
            return Ok(());
        }
        command => command,
    };

    let config = Config::load_optional(&cli.config).await?;
    init_logging(&config, cli.verbose);
    if config.is_none() {
        info!("No config file at {}; using defaults", cli.config);
    }
    let config = config.unwrap_or_default();
    info!("Starting redmud v{}", env!("CARGO_PKG_VERSION"));

    let world = open_world(&config)?;
    run(&world, command).await
}

fn open_world(config: &Config) -> Result<World<SledStore>> {
    let mut builder = SledStoreBuilder::new(&config.storage.data_dir);
    if !config.storage.flush_writes {
        builder = builder.without_flush();
    }
    let store = builder
        .open()
        .with_context(|| format!("opening world store in {}", config.storage.data_dir))?;
    Ok(World::new(store, config.world.empty_area_policy))
}

async fn run(world: &World<SledStore>, command: Commands) -> Result<()> {
    match command {
        Commands::Init => Ok(()),
        Commands::Area(cmd) => run_area(world, cmd).await,
        Commands::Room(cmd) => run_room(world, cmd).await,
        Commands::Connect {
            from,
            command,
            to,
            back,
        } => {
            let from = parse_room_id(&from)?;
            let to = parse_room_id(&to)?;
            match back {
                Some(back) => {
                    world
                        .rooms()
                        .connect_rooms(&Exit::new(from, &command), &Exit::new(to, &back))
                        .await?
                }
                None => world.rooms().set_connection(&command, &from, &to).await?,
            }
            println!("Connected");
            Ok(())
        }
        Commands::Disconnect { first, second } => {
            let removed = world
                .rooms()
                .disconnect_rooms(&parse_room_id(&first)?, &parse_room_id(&second)?)
                .await?;
            println!("Removed {removed} exit(s)");
            Ok(())
        }
        Commands::Unlink { room, command } => {
            let room = parse_room_id(&room)?;
            if world.rooms().unset_connection(&command, &room).await? {
                println!("Removed exit {command} from {room}");
            } else {
                println!("{room} has no exit {command}");
            }
            Ok(())
        }
        Commands::Seed { file } => {
            let seed = load_seed_from_json(&file)?;
            let report = apply_seed(world.rooms(), &seed).await?;
            println!(
                "Seeded {} area(s), {} room(s), {} exit(s)",
                report.areas, report.rooms, report.exits
            );
            Ok(())
        }
        Commands::Flush { yes } => {
            if !yes {
                warn!("Flush requested without --yes; nothing done");
                println!("Refusing to flush without --yes");
                return Ok(());
            }
            world.flush_all().await?;
            println!("World store flushed");
            Ok(())
        }
    }
}

async fn run_area(world: &World<SledStore>, cmd: AreaCommand) -> Result<()> {
    let areas = world.areas();
    match cmd {
        AreaCommand::Create {
            code,
            name,
            description,
        } => {
            areas
                .create_area(&code, &AreaRecord::new(&name, &description))
                .await?;
            println!("Created area {code}");
        }
        AreaCommand::Show { code } => match areas.get_area(&code).await? {
            Some(area) => println!("{}", serde_json::to_string_pretty(&area)?),
            None => println!("No area {code}"),
        },
        AreaCommand::Set { code, fields } => {
            let update = AreaUpdate {
                name: fields.name,
                description: fields.description,
            };
            areas.set_area(&code, &update).await?;
            println!("Updated area {code}");
        }
        AreaCommand::Delete { code } => {
            if areas.delete_area(&code).await? {
                println!("Deleted area {code}");
            } else {
                println!("No area {code}");
            }
        }
    }
    Ok(())
}

async fn run_room(world: &World<SledStore>, cmd: RoomCommand) -> Result<()> {
    let rooms = world.rooms();
    match cmd {
        RoomCommand::Add {
            area,
            name,
            description,
        } => {
            let room = rooms
                .add_room(&area, &NewRoom::new(&name, &description))
                .await?;
            println!("Added room {}", room.id());
        }
        RoomCommand::Show { area, number } => {
            let number = parse_room_number(&number)?;
            match rooms.get_room(&area, number).await? {
                Some(room) => println!("{}", serde_json::to_string_pretty(&room)?),
                None => println!("No room {area}:{number}"),
            }
        }
        RoomCommand::Set {
            area,
            number,
            fields,
        } => {
            let number = parse_room_number(&number)?;
            let update = RoomUpdate {
                name: fields.name,
                description: fields.description,
            };
            if rooms.set_room(&area, number, &update).await? {
                println!("Updated room {area}:{number}");
            } else {
                println!("No room {area}:{number}");
            }
        }
        RoomCommand::Delete { area, number } => {
            let number = parse_room_number(&number)?;
            match rooms.delete_room(&area, number).await? {
                RoomDeletion::NotFound => println!("No room {area}:{number}"),
                RoomDeletion::Deleted { area_size } => {
                    println!("Deleted room {area}:{number} ({area_size} left in area)")
                }
                RoomDeletion::DeletedWithArea => {
                    println!("Deleted room {area}:{number}; area {area} was empty and removed")
                }
                RoomDeletion::DeletedWithoutArea => {
                    println!("Deleted room {area}:{number}; area {area} has no record")
                }
            }
        }
    }
    Ok(())
}

/// Parse `AREA:NUMBER` as typed on the command line.
fn parse_room_id(raw: &str) -> Result<RoomId> {
    Ok(raw.parse::<RoomId>()?)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map_or(log::LevelFilter::Info, Config::log_level),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when a person is watching
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let line = format!(
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            );
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
